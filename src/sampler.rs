//! Frame downsampling for per-tick analysis.
//!
//! Quality heuristics run every ~500 ms; to keep them cheap they operate on
//! a small nearest-neighbor downsample of the native frame rather than the
//! full buffer.

use crate::types::FrameBuffer;

/// Downsamples native frames into a small analysis buffer.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    target_width: u32,
}

impl FrameSampler {
    pub fn new(target_width: u32) -> Self {
        Self {
            target_width: target_width.max(16),
        }
    }

    /// Produce a downsampled copy of `frame` with width close to the target,
    /// preserving aspect ratio. Frames already at or below the target are
    /// returned as-is.
    pub fn sample(&self, frame: &FrameBuffer) -> FrameBuffer {
        if frame.width <= self.target_width || frame.width == 0 || frame.height == 0 {
            return frame.clone();
        }

        let scale = frame.width as f32 / self.target_width as f32;
        let out_w = self.target_width;
        let out_h = ((frame.height as f32 / scale).round() as u32).max(1);

        let mut data = vec![0u8; (out_w * out_h * 3) as usize];
        for y in 0..out_h {
            let src_y = ((y as f32 * scale) as u32).min(frame.height - 1);
            for x in 0..out_w {
                let src_x = ((x as f32 * scale) as u32).min(frame.width - 1);
                let (r, g, b) = frame.pixel(src_x, src_y);
                let idx = ((y * out_w + x) * 3) as usize;
                data[idx] = r;
                data[idx + 1] = g;
                data[idx + 2] = b;
            }
        }

        FrameBuffer::new(data, out_w, out_h)
    }
}
