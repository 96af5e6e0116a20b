//! Path rasterization through `vello_cpu`.
//!
//! Geometry is built as `kurbo` paths and rendered in opaque white into a
//! scratch [`Pixmap`], whose alpha channel then serves as a coverage mask.
//! A whole path is filled in one pass, so a stroke that overlaps itself is
//! composited exactly once. Compositing onto the f32 [`Surface`] goes
//! through our own [`BlendMode`] operators, limited to the path's bounds.

use vello_cpu::kurbo::{BezPath, Cap, Ellipse, Join, Rect, Shape, Stroke};
use vello_cpu::peniko::Color;
use vello_cpu::{Pixmap, RenderContext};

use super::surface::{BlendMode, Rgb, Surface};

pub type Point = (f32, f32);

/// Flattening tolerance for ellipses, in pixels.
const TOLERANCE: f64 = 0.1;

/// Builds an open polyline. Non-finite points are dropped; fewer than two
/// remaining points give `None`.
pub fn polyline<I>(points: I) -> Option<BezPath>
where
    I: IntoIterator<Item = Point>,
{
    let mut path = BezPath::new();
    let mut count = 0usize;
    for (x, y) in points {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let p = (f64::from(x), f64::from(y));
        if count == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
        count += 1;
    }
    (count >= 2).then_some(path)
}

fn round_stroke(width: f32) -> Stroke {
    Stroke::new(f64::from(width))
        .with_join(Join::Round)
        .with_caps(Cap::Round)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Bounds {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

/// Reusable coverage layer the size of its target surface.
pub struct Mask {
    width: u16,
    height: u16,
    ctx: Option<RenderContext>,
    pixmap: Option<Pixmap>,
    dirty: Option<Bounds>,
}

impl Default for Mask {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Clone for Mask {
    /// Coverage is transient, so a clone starts blank.
    fn clone(&self) -> Self {
        Self::new(self.width as usize, self.height as usize)
    }
}

impl std::fmt::Debug for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn pixmap_dim(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: pixmap_dim(width),
            height: pixmap_dim(height),
            ctx: None,
            pixmap: None,
            dirty: None,
        }
    }

    /// Drops the render context and pixmap when the size changes; both are
    /// rebuilt lazily on the next draw.
    pub fn resize(&mut self, width: usize, height: usize) {
        let (w, h) = (pixmap_dim(width), pixmap_dim(height));
        if self.width == w && self.height == h {
            return;
        }
        self.width = w;
        self.height = h;
        self.ctx = None;
        self.pixmap = None;
        self.dirty = None;
    }

    pub fn is_blank(&self) -> bool {
        self.dirty.is_none()
    }

    /// Coverage in `[0, 1]` at a pixel.
    pub fn coverage(&self, x: usize, y: usize) -> f32 {
        match &self.pixmap {
            Some(pixmap) if x < self.width as usize && y < self.height as usize => {
                let i = (y * self.width as usize + x) * 4 + 3;
                f32::from(pixmap.data_as_u8_slice()[i]) / 255.0
            }
            _ => 0.0,
        }
    }

    pub fn clear(&mut self) {
        if self.dirty.take().is_some() {
            if let Some(pixmap) = self.pixmap.as_mut() {
                pixmap.data_as_u8_slice_mut().fill(0);
            }
        }
    }

    /// Pixel bounds of `rect` clipped to the mask, or `None` if nothing is visible.
    fn clip(&self, rect: Rect) -> Option<Bounds> {
        if !(rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()) {
            return None;
        }
        let x0 = rect.x0.floor().max(0.0) as usize;
        let y0 = rect.y0.floor().max(0.0) as usize;
        let x1 = (rect.x1.ceil().max(0.0) as usize).min(self.width as usize);
        let y1 = (rect.y1.ceil().max(0.0) as usize).min(self.height as usize);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Bounds { x0, y0, x1, y1 })
    }

    fn mark(&mut self, b: Bounds) {
        self.dirty = Some(match self.dirty {
            None => b,
            Some(d) => Bounds {
                x0: d.x0.min(b.x0),
                y0: d.y0.min(b.y0),
                x1: d.x1.max(b.x1),
                y1: d.y1.max(b.y1),
            },
        });
    }

    /// Renders whatever `draw` issues in opaque white into the pixmap.
    fn rasterize(&mut self, bounds: Bounds, draw: impl FnOnce(&mut RenderContext)) {
        let (w, h) = (self.width, self.height);
        let ctx = self.ctx.get_or_insert_with(|| RenderContext::new(w, h));
        let pixmap = self.pixmap.get_or_insert_with(|| Pixmap::new(w, h));

        ctx.reset();
        ctx.set_paint(Color::from_rgba8(255, 255, 255, 255));
        draw(ctx);
        ctx.flush();
        ctx.render_to_pixmap(pixmap);
        self.mark(bounds);
    }

    /// Strokes `path` with round joins and caps.
    pub fn stroke_path(&mut self, path: &BezPath, line_width: f32) {
        if line_width <= 0.0 || !line_width.is_finite() {
            return;
        }
        let pad = f64::from(line_width) * 0.5 + 1.0;
        let Some(bounds) = self.clip(path.bounding_box().inflate(pad, pad)) else {
            return;
        };
        let stroke = round_stroke(line_width);
        self.rasterize(bounds, |ctx| {
            ctx.set_stroke(stroke);
            ctx.stroke_path(path);
        });
    }

    pub fn stroke_polyline<I>(&mut self, points: I, line_width: f32)
    where
        I: IntoIterator<Item = Point>,
    {
        if let Some(path) = polyline(points) {
            self.stroke_path(&path, line_width);
        }
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32) {
        self.fill_ellipse(center, radius, radius, 0.0);
    }

    /// Fills an ellipse with radii `rx`, `ry`, rotated by `rotation` radians.
    pub fn fill_ellipse(&mut self, center: Point, rx: f32, ry: f32, rotation: f32) {
        if !(rx > 0.0 && ry > 0.0) {
            return;
        }
        let ellipse = Ellipse::new(
            (f64::from(center.0), f64::from(center.1)),
            (f64::from(rx), f64::from(ry)),
            f64::from(rotation),
        );
        let Some(bounds) = self.clip(ellipse.bounding_box().inflate(1.0, 1.0)) else {
            return;
        };
        let path = ellipse.to_path(TOLERANCE);
        self.rasterize(bounds, |ctx| ctx.fill_path(&path));
    }

    /// Composites `color` through the mask onto `surface`, then clears the mask.
    pub fn composite(&mut self, surface: &mut Surface, color: Rgb, alpha: f32, mode: BlendMode) {
        if let (Some(b), Some(pixmap)) = (self.dirty, self.pixmap.as_ref()) {
            if alpha > 0.0 {
                let alpha = alpha.min(1.0);
                let data = pixmap.data_as_u8_slice();
                let stride = self.width as usize;
                let x1 = b.x1.min(surface.width());
                let y1 = b.y1.min(surface.height());
                for y in b.y0..y1 {
                    for x in b.x0..x1 {
                        let c = data[(y * stride + x) * 4 + 3];
                        if c > 0 {
                            surface.blend_pixel(x, y, color, alpha * f32::from(c) / 255.0, mode);
                        }
                    }
                }
            }
        }
        self.clear();
    }
}

/// A drawing target pairing a surface with a reusable coverage mask and a
/// fixed compositing operator, in the manner of a 2D context.
pub struct Canvas<'a> {
    pub surface: &'a mut Surface,
    mask: &'a mut Mask,
    pub blend: BlendMode,
}

impl<'a> Canvas<'a> {
    pub fn new(surface: &'a mut Surface, mask: &'a mut Mask, blend: BlendMode) -> Self {
        mask.resize(surface.width(), surface.height());
        Self {
            surface,
            mask,
            blend,
        }
    }

    pub fn width(&self) -> usize {
        self.surface.width()
    }

    pub fn height(&self) -> usize {
        self.surface.height()
    }

    pub fn stroke_path(&mut self, path: &BezPath, line_width: f32, color: Rgb, alpha: f32) {
        self.mask.stroke_path(path, line_width);
        self.mask.composite(self.surface, color, alpha, self.blend);
    }

    pub fn stroke<I>(&mut self, points: I, line_width: f32, color: Rgb, alpha: f32)
    where
        I: IntoIterator<Item = Point>,
    {
        if let Some(path) = polyline(points) {
            self.stroke_path(&path, line_width, color, alpha);
        }
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Rgb, alpha: f32) {
        self.mask.fill_circle(center, radius);
        self.mask.composite(self.surface, color, alpha, self.blend);
    }

    pub fn fill_ellipse(
        &mut self,
        center: Point,
        rx: f32,
        ry: f32,
        rotation: f32,
        color: Rgb,
        alpha: f32,
    ) {
        self.mask.fill_ellipse(center, rx, ry, rotation);
        self.mask.composite(self.surface, color, alpha, self.blend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::WHITE;

    #[test]
    fn single_point_draws_nothing() {
        assert!(polyline([(4.0, 4.0)]).is_none());
        let mut m = Mask::new(8, 8);
        m.stroke_polyline([(4.0, 4.0)], 2.0);
        assert!(m.is_blank());
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let path = polyline([(0.0, 0.0), (f32::NAN, 1.0), (3.0, 3.0)]).unwrap();
        assert_eq!(path.elements().len(), 2);
    }

    #[test]
    fn horizontal_stroke_covers_its_row() {
        let mut m = Mask::new(16, 16);
        m.stroke_polyline([(0.0, 8.0), (16.0, 8.0)], 2.0);
        assert!(m.coverage(8, 7) > 0.99);
        assert!(m.coverage(8, 8) > 0.99);
        assert_eq!(m.coverage(8, 2), 0.0);
    }

    #[test]
    fn self_overlap_is_composited_once() {
        let mut s = Surface::new(16, 16);
        let mut m = Mask::new(16, 16);
        let mut canvas = Canvas::new(&mut s, &mut m, BlendMode::Lighter);
        canvas.stroke([(2.0, 8.0), (14.0, 8.0), (2.0, 8.0)], 2.0, [0.5, 0.5, 0.5], 1.0);
        assert!((s.get(8, 8)[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn clear_resets_coverage() {
        let mut m = Mask::new(8, 8);
        m.fill_circle((4.0, 4.0), 2.0);
        assert!(m.coverage(4, 4) > 0.0);
        m.clear();
        assert_eq!(m.coverage(4, 4), 0.0);
        assert!(m.is_blank());
    }

    #[test]
    fn rotated_ellipse_follows_its_major_axis() {
        let mut m = Mask::new(32, 32);
        m.fill_ellipse((16.0, 16.0), 10.0, 2.0, std::f32::consts::FRAC_PI_2);
        // Rotated a quarter turn the long axis is vertical.
        assert!(m.coverage(15, 8) > 0.9);
        assert_eq!(m.coverage(8, 15), 0.0);
    }

    #[test]
    fn offscreen_shapes_are_ignored() {
        let mut s = Surface::new(8, 8);
        let mut m = Mask::new(8, 8);
        let mut canvas = Canvas::new(&mut s, &mut m, BlendMode::SourceOver);
        canvas.fill_ellipse((-50.0, -50.0), 3.0, 2.0, 0.4, WHITE, 1.0);
        canvas.stroke([(f32::NAN, 0.0), (3.0, 3.0)], 1.0, WHITE, 1.0);
        assert_eq!(s.mean_luminance(), 0.0);
    }

    #[test]
    fn zero_sized_mask_draws_nothing() {
        let mut s = Surface::new(0, 0);
        let mut m = Mask::default();
        let mut canvas = Canvas::new(&mut s, &mut m, BlendMode::Lighter);
        canvas.stroke([(0.0, 0.0), (5.0, 5.0)], 2.0, WHITE, 1.0);
        assert!(m.is_blank());
    }
}
