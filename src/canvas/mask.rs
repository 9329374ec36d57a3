//! Coverage masks: the intermediate between rasterized glyphs and pixels.
//!
//! Each fill or stroke is first accumulated into a mask covering only its
//! own bounding box. The mask is then composited once for the shadow
//! (offset, optionally blurred) and once for the fill itself.

use image::{Rgba, RgbaImage};

/// Largest blur kernel radius, in pixels.
const MAX_BLUR_RADIUS: i32 = 2048;

/// Anti-aliased coverage over a rectangular pixel window.
#[derive(Debug, Clone)]
pub struct CoverageMask {
    x0: i32,
    y0: i32,
    width: usize,
    height: usize,
    /// 0.0 = untouched, 1.0 = fully covered.
    data: Vec<f32>,
}

impl CoverageMask {
    /// Empty mask over `[x0, x1) × [y0, y1)`.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let width = (x1 - x0).max(0) as usize;
        let height = (y1 - y0).max(0) as usize;
        Self {
            x0,
            y0,
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Absolute pixel position of the window's top-left corner.
    pub fn origin(&self) -> (i32, i32) {
        (self.x0, self.y0)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Coverage at absolute pixel `(x, y)`; zero outside the window.
    pub fn get(&self, x: i32, y: i32) -> f32 {
        match self.index(x, y) {
            Some(idx) => self.data[idx],
            None => 0.0,
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let lx = x - self.x0;
        let ly = y - self.y0;
        if lx < 0 || ly < 0 || lx as usize >= self.width || ly as usize >= self.height {
            return None;
        }
        Some(ly as usize * self.width + lx as usize)
    }

    /// Accumulate coverage at an absolute pixel (clamped to 1.0).
    pub fn add(&mut self, x: i32, y: i32, coverage: f32) {
        if let Some(idx) = self.index(x, y) {
            self.data[idx] = (self.data[idx] + coverage).min(1.0);
        }
    }

    /// Fill an axis-aligned rectangle with fractional edge coverage.
    pub fn fill_rect(&mut self, left: f32, top: f32, right: f32, bottom: f32) {
        if right <= left || bottom <= top {
            return;
        }
        let px0 = left.floor() as i32;
        let px1 = right.ceil() as i32;
        let py0 = top.floor() as i32;
        let py1 = bottom.ceil() as i32;
        for py in py0..py1 {
            let cover_y = overlap(py as f32, top, bottom);
            if cover_y <= 0.0 {
                continue;
            }
            for px in px0..px1 {
                let cover_x = overlap(px as f32, left, right);
                if cover_x > 0.0 {
                    self.add(px, py, cover_x * cover_y);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }

    /// Gaussian blur with standard deviation `sigma`, kept inside `clip`.
    ///
    /// The result grows by the kernel radius on every side, then is cut to
    /// `clip` (absolute `(x0, y0, x1, y1)`, exclusive end), so no coverage
    /// that could land inside `clip` is lost and nothing outside it is
    /// allocated.
    pub fn blurred(&self, sigma: f32, clip: (i32, i32, i32, i32)) -> CoverageMask {
        if sigma.is_nan() || sigma <= 0.0 || self.data.is_empty() {
            return self.clone();
        }
        let kernel = gaussian_kernel(sigma);
        let radius = (kernel.len() / 2) as i32;

        let (clip_x0, clip_y0, clip_x1, clip_y1) = clip;
        let mut out = CoverageMask::new(
            self.x0.saturating_sub(radius).max(clip_x0),
            self.y0.saturating_sub(radius).max(clip_y0),
            (self.x0 + self.width as i32).saturating_add(radius).min(clip_x1),
            (self.y0 + self.height as i32).saturating_add(radius).min(clip_y1),
        );
        if out.data.is_empty() {
            return out;
        }

        // Horizontal pass into a buffer with the output's columns, source rows
        let mut horizontal = vec![0.0f32; out.width * self.height];
        for y in 0..self.height {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            for ox in 0..out.width {
                let center = out.x0 + ox as i32;
                horizontal[y * out.width + ox] = taps(self.x0, self.width, center, radius)
                    .map(|(sx, k)| row[sx] * kernel[k])
                    .sum();
            }
        }

        // Vertical pass into the output
        for oy in 0..out.height {
            let center = out.y0 + oy as i32;
            for x in 0..out.width {
                let sum: f32 = taps(self.y0, self.height, center, radius)
                    .map(|(sy, k)| horizontal[sy * out.width + x] * kernel[k])
                    .sum();
                out.data[oy * out.width + x] = sum.min(1.0);
            }
        }

        out
    }

    /// Source-over composite of `color` onto `image`, shifted by `(dx, dy)`.
    ///
    /// Effective alpha per pixel is `color.a × coverage × alpha`.
    pub fn composite(&self, image: &mut RgbaImage, color: Rgba<u8>, alpha: f32, dx: i32, dy: i32) {
        let base_alpha = (color[3] as f32 / 255.0) * alpha.clamp(0.0, 1.0);
        if base_alpha <= 0.0 {
            return;
        }
        let (img_w, img_h) = (image.width() as i32, image.height() as i32);

        for ly in 0..self.height {
            let y = self.y0 + ly as i32 + dy;
            if y < 0 || y >= img_h {
                continue;
            }
            for lx in 0..self.width {
                let coverage = self.data[ly * self.width + lx];
                if coverage <= 0.0 {
                    continue;
                }
                let x = self.x0 + lx as i32 + dx;
                if x < 0 || x >= img_w {
                    continue;
                }
                let src_a = base_alpha * coverage;
                let dst = image.get_pixel_mut(x as u32, y as u32);
                *dst = blend_over(*dst, color, src_a);
            }
        }
    }
}

/// Fraction of the unit pixel starting at `p` covered by `[start, end)`.
fn overlap(p: f32, start: f32, end: f32) -> f32 {
    ((p + 1.0).min(end) - p.max(start)).max(0.0)
}

/// Normalized 1D Gaussian kernel spanning ±3σ, at most
/// `MAX_BLUR_RADIUS` pixels each side.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil().clamp(1.0, MAX_BLUR_RADIUS as f32) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| {
            let d = i as f32;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Source indices within `radius` of `center`, paired with kernel indices.
///
/// The source span starts at absolute `start` and is `len` pixels long.
fn taps(start: i32, len: usize, center: i32, radius: i32) -> impl Iterator<Item = (usize, usize)> {
    let lo = center.saturating_sub(radius).saturating_sub(start).max(0);
    let hi = center
        .saturating_add(radius)
        .saturating_sub(start)
        .saturating_add(1)
        .min(len as i32);
    (lo..hi.max(lo)).map(move |s| (s as usize, (start + s - center + radius) as usize))
}

/// Porter-Duff source-over with straight (non-premultiplied) alpha.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>, src_a: f32) -> Rgba<u8> {
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let s = src[i] as f32;
        let d = dst[i] as f32;
        ((s * src_a + d * dst_a * (1.0 - src_a)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNCLIPPED: (i32, i32, i32, i32) = (i32::MIN, i32::MIN, i32::MAX, i32::MAX);

    #[test]
    fn test_fill_rect_fractional_edges() {
        let mut mask = CoverageMask::new(0, 0, 10, 10);
        mask.fill_rect(1.5, 2.0, 4.0, 3.0);
        assert!((mask.get(1, 2) - 0.5).abs() < 1e-6);
        assert!((mask.get(2, 2) - 1.0).abs() < 1e-6);
        assert!((mask.get(3, 2) - 1.0).abs() < 1e-6);
        assert_eq!(mask.get(4, 2), 0.0);
        assert_eq!(mask.get(2, 3), 0.0);
    }

    #[test]
    fn test_add_clamps_and_clips() {
        let mut mask = CoverageMask::new(5, 5, 7, 7);
        mask.add(5, 5, 0.7);
        mask.add(5, 5, 0.7);
        mask.add(100, 100, 1.0);
        assert_eq!(mask.get(5, 5), 1.0);
        assert_eq!(mask.get(100, 100), 0.0);
    }

    #[test]
    fn test_blur_preserves_mass_and_spreads() {
        let mut mask = CoverageMask::new(0, 0, 3, 3);
        mask.add(1, 1, 1.0);
        let blurred = mask.blurred(1.0, UNCLIPPED);
        assert!(blurred.width() > mask.width());
        let total: f32 = blurred.data.iter().sum();
        assert!((total - 1.0).abs() < 1e-3, "mass was {}", total);
        assert!(blurred.get(1, 1) < 1.0);
        assert!(blurred.get(0, 1) > 0.0);
        assert!(blurred.get(-1, 1) > 0.0);
    }

    #[test]
    fn test_composite_source_over() {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let mut mask = CoverageMask::new(0, 0, 4, 4);
        mask.fill_rect(0.0, 0.0, 2.0, 1.0);
        mask.composite(&mut image, Rgba([0, 0, 0, 255]), 0.5, 0, 0);
        assert_eq!(*image.get_pixel(0, 0), Rgba([128, 128, 128, 255]));
        assert_eq!(*image.get_pixel(2, 0), Rgba([255, 255, 255, 255]));

        // Offset composite lands one row down
        mask.composite(&mut image, Rgba([255, 0, 0, 255]), 1.0, 0, 1);
        assert_eq!(*image.get_pixel(0, 1), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        let kernel = gaussian_kernel(2.0);
        assert_eq!(kernel.len(), 13);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_gaussian_kernel_huge_sigma_is_bounded() {
        for sigma in [1.0e5, 1.0e30, f32::INFINITY] {
            let kernel = gaussian_kernel(sigma);
            assert_eq!(kernel.len(), 2 * MAX_BLUR_RADIUS as usize + 1);
            assert!(kernel.iter().all(|w| w.is_finite() && *w > 0.0));
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-3, "sum was {}", sum);
        }
    }

    #[test]
    fn test_blur_is_clipped_to_bounds() {
        let mut mask = CoverageMask::new(10, 10, 20, 20);
        mask.fill_rect(10.0, 10.0, 20.0, 20.0);

        let blurred = mask.blurred(1.0e5, (0, 0, 40, 30));
        assert_eq!(blurred.origin(), (0, 0));
        assert_eq!((blurred.width(), blurred.height()), (40, 30));
        assert!(blurred.get(15, 15) > 0.0);

        // Entirely outside the clip: nothing left to paint
        let gone = mask.blurred(2.0, (100, 100, 200, 200));
        assert_eq!((gone.width(), gone.height()), (0, 0));
        assert!(gone.is_empty());
    }

    #[test]
    fn test_blur_degenerate_sigma_is_identity() {
        let mut mask = CoverageMask::new(0, 0, 2, 2);
        mask.add(0, 0, 1.0);
        for sigma in [0.0, -3.0, f32::NAN] {
            let same = mask.blurred(sigma, (0, 0, 1, 1));
            assert_eq!(same.origin(), (0, 0));
            assert_eq!(same.get(0, 0), 1.0);
            assert_eq!(same.width(), 2);
        }
    }
}
