use bytemuck::{Pod, Zeroable};

/// Linear-light colour with channels in `0.0..=1.0`.
pub type Rgb = [f32; 3];

pub const BLACK: Rgb = [0.0, 0.0, 0.0];
pub const WHITE: Rgb = [1.0, 1.0, 1.0];

/// Builds an [`Rgb`] from 8-bit channel values.
pub fn rgb8(r: u8, g: u8, b: u8) -> Rgb {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Compositing operators used across the pipeline.
///
/// All destination surfaces are opaque, so each operator reduces to
/// `dst' = (1 - a) * dst + a * B(dst, src)` except `Lighter`, which adds the
/// alpha-scaled source and saturates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    SourceOver,
    Lighter,
    Screen,
    Overlay,
}

impl BlendMode {
    #[inline]
    pub fn apply(self, dst: f32, src: f32, alpha: f32) -> f32 {
        match self {
            BlendMode::SourceOver => dst + (src - dst) * alpha,
            BlendMode::Lighter => (dst + src * alpha).min(1.0),
            BlendMode::Screen => {
                let mixed = dst + src - dst * src;
                dst + (mixed - dst) * alpha
            }
            BlendMode::Overlay => {
                let mixed = if dst <= 0.5 {
                    2.0 * dst * src
                } else {
                    1.0 - 2.0 * (1.0 - dst) * (1.0 - src)
                };
                dst + (mixed - dst) * alpha
            }
        }
    }

    #[inline]
    pub fn apply_rgb(self, dst: &mut Rgb, src: Rgb, alpha: f32) {
        for c in 0..3 {
            dst[c] = self.apply(dst[c], src[c], alpha);
        }
    }
}

/// Owned, opaque pixel surface. Row-major, one [`Rgb`] per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, BLACK)
    }

    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    /// Reallocates to the new size and clears to black when the size changes.
    /// Returns `true` if a reallocation happened.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, BLACK);
        true
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Blends `color` over every pixel.
    pub fn fill_blend(&mut self, color: Rgb, alpha: f32, mode: BlendMode) {
        if alpha <= 0.0 {
            return;
        }
        let alpha = alpha.min(1.0);
        for px in &mut self.pixels {
            mode.apply_rgb(px, color, alpha);
        }
    }

    /// Blends `color` over the rectangle `[x, x+w) x [y, y+h)`, clipped to the surface.
    pub fn fill_rect(
        &mut self,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        color: Rgb,
        alpha: f32,
        mode: BlendMode,
    ) {
        if alpha <= 0.0 {
            return;
        }
        let alpha = alpha.min(1.0);
        let x1 = (x + w).min(self.width);
        let y1 = (y + h).min(self.height);
        for row in y.min(y1)..y1 {
            let start = row * self.width;
            for px in &mut self.pixels[start + x.min(x1)..start + x1] {
                mode.apply_rgb(px, color, alpha);
            }
        }
    }

    #[inline]
    pub fn blend_pixel(&mut self, x: usize, y: usize, color: Rgb, alpha: f32, mode: BlendMode) {
        let idx = y * self.width + x;
        mode.apply_rgb(&mut self.pixels[idx], color, alpha);
    }

    /// Composites a same-sized surface onto this one.
    pub fn draw_surface(&mut self, src: &Surface, alpha: f32, mode: BlendMode) {
        debug_assert_eq!((self.width, self.height), (src.width, src.height));
        if alpha <= 0.0 {
            return;
        }
        let alpha = alpha.min(1.0);
        for (d, s) in self.pixels.iter_mut().zip(src.pixels.iter()) {
            mode.apply_rgb(d, *s, alpha);
        }
    }

    pub fn copy_from(&mut self, src: &Surface) {
        self.resize(src.width, src.height);
        self.pixels.copy_from_slice(&src.pixels);
    }

    /// Mean Rec. 709 luminance over all pixels.
    pub fn mean_luminance(&self) -> f32 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.pixels.iter().map(|p| luminance(*p) as f64).sum();
        (sum / self.pixels.len() as f64) as f32
    }

    /// Quantizes into `out` as opaque 8-bit RGBA, reusing its allocation.
    pub fn write_rgba8(&self, out: &mut Vec<Rgba8>) {
        out.clear();
        out.extend(self.pixels.iter().map(|p| Rgba8 {
            r: to_u8(p[0]),
            g: to_u8(p[1]),
            b: to_u8(p[2]),
            a: 255,
        }));
    }

    pub fn to_rgba8(&self) -> Vec<Rgba8> {
        let mut out = Vec::with_capacity(self.pixels.len());
        self.write_rgba8(&mut out);
        out
    }

    /// Samples with bilinear filtering; coordinates outside the surface read black.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> Rgb {
        let x = x - 0.5;
        let y = y - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let fetch = |xi: i64, yi: i64| -> Rgb {
            if xi < 0 || yi < 0 || xi >= self.width as i64 || yi >= self.height as i64 {
                BLACK
            } else {
                self.pixels[yi as usize * self.width + xi as usize]
            }
        };

        let p00 = fetch(x0, y0);
        let p10 = fetch(x0 + 1, y0);
        let p01 = fetch(x0, y0 + 1);
        let p11 = fetch(x0 + 1, y0 + 1);
        let mut out = BLACK;
        for c in 0..3 {
            let top = p00[c] + (p10[c] - p00[c]) * fx;
            let bottom = p01[c] + (p11[c] - p01[c]) * fx;
            out[c] = top + (bottom - top) * fy;
        }
        out
    }
}

#[inline]
pub fn luminance(p: Rgb) -> f32 {
    0.2126 * p[0] + 0.7152 * p[1] + 0.0722 * p[2]
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
