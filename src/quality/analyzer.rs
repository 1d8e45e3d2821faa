//! Brightness and sharpness estimation.
//!
//! Brightness is mean luma over a strided sample of the region. Sharpness is
//! the mean of local horizontal+vertical luma gradients, scaled and clamped
//! to [0,100] — a cheap edge-energy proxy, not a true Laplacian. Both stay
//! O(n) over the sampled pixels so they can run every tick without drops.

use crate::types::FrameBuffer;
use serde::{Deserialize, Serialize};

/// Per-tick quality stats for one analyzed region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameQualityStats {
    /// Mean luma, 0-255.
    pub brightness: f32,
    /// Edge energy, clamped to [0,100].
    pub sharpness: f32,
}

impl FrameQualityStats {
    pub fn zero() -> Self {
        Self {
            brightness: 0.0,
            sharpness: 0.0,
        }
    }
}

/// A requested analysis region in frame coordinates. May extend outside the
/// frame; it is clamped before sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Region {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Centered square covering `fraction` of the shorter frame dimension.
    pub fn centered(frame: &FrameBuffer, fraction: f32) -> Self {
        let side = (frame.width.min(frame.height) as f32 * fraction) as i64;
        Self {
            x: (frame.width as i64 - side) / 2,
            y: (frame.height as i64 - side) / 2,
            width: side,
            height: side,
        }
    }

    /// Intersect with the frame bounds. Returns None when nothing remains.
    fn clamp_to(&self, frame: &FrameBuffer) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(frame.width as i64);
        let y1 = (self.y + self.height).min(frame.height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// Computes brightness and sharpness over a frame region.
#[derive(Debug, Clone)]
pub struct QualityAnalyzer {
    stride: u32,
    sharpness_scale: f32,
    region_fraction: f32,
}

impl QualityAnalyzer {
    pub fn new(stride: u32, sharpness_scale: f32, region_fraction: f32) -> Self {
        Self {
            stride: stride.max(1),
            sharpness_scale,
            region_fraction,
        }
    }

    /// Analyze `region` of the frame, or the default centered region when
    /// unspecified. A zero-area or fully out-of-bounds region yields `{0,0}`.
    pub fn analyze(&self, frame: &FrameBuffer, region: Option<Region>) -> FrameQualityStats {
        if frame.width == 0 || frame.height == 0 {
            return FrameQualityStats::zero();
        }

        let region = region.unwrap_or_else(|| Region::centered(frame, self.region_fraction));
        let (x0, y0, x1, y1) = match region.clamp_to(frame) {
            Some(bounds) => bounds,
            None => return FrameQualityStats::zero(),
        };

        let mut luma_sum = 0.0f64;
        let mut luma_count = 0u64;
        let mut grad_sum = 0.0f64;
        let mut grad_count = 0u64;

        let mut y = y0;
        while y < y1 {
            let mut x = x0;
            while x < x1 {
                let l = frame.luma(x, y);
                luma_sum += l as f64;
                luma_count += 1;

                if x + 1 < x1 && y + 1 < y1 {
                    let gx = (frame.luma(x + 1, y) - l).abs();
                    let gy = (frame.luma(x, y + 1) - l).abs();
                    grad_sum += (gx + gy) as f64;
                    grad_count += 1;
                }

                x += self.stride;
            }
            y += self.stride;
        }

        if luma_count == 0 {
            return FrameQualityStats::zero();
        }

        let brightness = (luma_sum / luma_count as f64) as f32;
        let sharpness = if grad_count == 0 {
            0.0
        } else {
            ((grad_sum / grad_count as f64) as f32 * self.sharpness_scale).clamp(0.0, 100.0)
        };

        FrameQualityStats {
            brightness,
            sharpness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, value: u8) -> FrameBuffer {
        FrameBuffer::new(vec![value; (width * height * 3) as usize], width, height)
    }

    fn checker(width: u32, height: u32, cell: u32) -> FrameBuffer {
        let mut data = vec![0u8; (width * height * 3) as usize];
        for y in 0..height {
            for x in 0..width {
                let white = ((x / cell) + (y / cell)) % 2 == 0;
                let v = if white { 255 } else { 0 };
                let idx = ((y * width + x) * 3) as usize;
                data[idx] = v;
                data[idx + 1] = v;
                data[idx + 2] = v;
            }
        }
        FrameBuffer::new(data, width, height)
    }

    fn analyzer() -> QualityAnalyzer {
        QualityAnalyzer::new(1, 4.0, 0.5)
    }

    #[test]
    fn test_flat_frame_brightness() {
        let frame = flat(64, 64, 128);
        let stats = analyzer().analyze(&frame, None);
        assert!((stats.brightness - 128.0).abs() < 1.0);
        assert_eq!(stats.sharpness, 0.0);
    }

    #[test]
    fn test_checker_sharper_than_flat() {
        let sharp = analyzer().analyze(&checker(64, 64, 2), None);
        let blurry = analyzer().analyze(&flat(64, 64, 128), None);
        assert!(sharp.sharpness > blurry.sharpness);
        assert!(sharp.sharpness > 50.0);
    }

    #[test]
    fn test_zero_area_region() {
        let frame = flat(32, 32, 100);
        let stats = analyzer().analyze(&frame, Some(Region::new(4, 4, 0, 0)));
        assert_eq!(stats, FrameQualityStats::zero());
    }

    #[test]
    fn test_fully_out_of_bounds_region() {
        let frame = flat(32, 32, 100);
        let stats = analyzer().analyze(&frame, Some(Region::new(100, 100, 10, 10)));
        assert_eq!(stats, FrameQualityStats::zero());

        let stats = analyzer().analyze(&frame, Some(Region::new(-50, -50, 10, 10)));
        assert_eq!(stats, FrameQualityStats::zero());
    }

    #[test]
    fn test_partially_out_of_bounds_region_clamped() {
        let frame = flat(32, 32, 90);
        let stats = analyzer().analyze(&frame, Some(Region::new(-10, -10, 20, 20)));
        assert!((stats.brightness - 90.0).abs() < 1.0);
    }

    #[test]
    fn test_strided_sampling_close_to_dense() {
        let frame = checker(64, 64, 4);
        let dense = QualityAnalyzer::new(1, 4.0, 0.5).analyze(&frame, None);
        let strided = QualityAnalyzer::new(2, 4.0, 0.5).analyze(&frame, None);
        assert!((dense.brightness - strided.brightness).abs() < 20.0);
    }
}
