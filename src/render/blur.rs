use rayon::prelude::*;

use super::surface::{Rgb, Surface, BLACK};

/// Separable Gaussian blur with `sigma = radius`, matching a CSS
/// `blur(<radius>px)` filter. Pixels outside the surface count as black.
///
/// `tmp` and `dst` are resized to match `src`.
pub fn gaussian_blur(src: &Surface, tmp: &mut Surface, dst: &mut Surface, radius: f32) {
    dst.resize(src.width(), src.height());
    if radius <= 0.0 || !radius.is_finite() || src.is_empty() {
        dst.copy_from(src);
        return;
    }
    tmp.resize(src.width(), src.height());

    let kernel = gaussian_kernel(radius);
    horizontal_pass(src, tmp, &kernel);
    vertical_pass(tmp, dst, &kernel);
}

/// Normalized kernel spanning `ceil(3 * sigma)` taps on each side.
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let r = (sigma * 3.0).ceil().max(1.0) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (-r..=r)
        .map(|i| {
            let x = i as f32;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

fn horizontal_pass(src: &Surface, dst: &mut Surface, k: &[f32]) {
    let width = src.width();
    let radius = (k.len() / 2) as isize;
    let src_px = src.pixels();
    dst.pixels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            let row = &src_px[y * width..(y + 1) * width];
            for (x, out) in out_row.iter_mut().enumerate() {
                let mut acc: Rgb = BLACK;
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = x as isize + ki as isize - radius;
                    if sx < 0 || sx >= width as isize {
                        continue;
                    }
                    let p = row[sx as usize];
                    acc[0] += p[0] * kw;
                    acc[1] += p[1] * kw;
                    acc[2] += p[2] * kw;
                }
                *out = acc;
            }
        });
}

fn vertical_pass(src: &Surface, dst: &mut Surface, k: &[f32]) {
    let width = src.width();
    let height = src.height() as isize;
    let radius = (k.len() / 2) as isize;
    let src_px = src.pixels();
    dst.pixels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            out_row.fill(BLACK);
            for (ki, &kw) in k.iter().enumerate() {
                let sy = y as isize + ki as isize - radius;
                if sy < 0 || sy >= height {
                    continue;
                }
                let row = &src_px[sy as usize * width..(sy as usize + 1) * width];
                for (out, p) in out_row.iter_mut().zip(row) {
                    out[0] += p[0] * kw;
                    out[1] += p[1] * kw;
                    out[2] += p[2] * kw;
                }
            }
        });
}
