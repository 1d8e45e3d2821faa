//! Capture transform: view-space framing rectangle to native-frame crop.
//!
//! The displayed video is letterboxed (`Contain`) or cropped (`Cover`)
//! relative to its native resolution. The transform recovers the rendered
//! scale and offset, maps the on-screen framing rectangle into native pixel
//! coordinates, mirrors it for front-camera face steps, crops, applies the
//! eye-band privacy blur when landmarks are available, and scores the
//! cropped output. Getting the mapping wrong silently miscrops photos, so
//! it is kept as one pure function with direct test coverage.

use crate::config::CaptureConfig;
use crate::errors::ScanError;
use crate::pose::LandmarkFrame;
use crate::quality::{score_capture, QualityAnalyzer, Region};
use crate::types::{
    CameraFacing, CapturedPhoto, CaptureStep, FitMode, FrameBuffer, PixelRect, Rect, StepMode,
};
use chrono::Utc;

/// The display region the shell renders the video into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub fit: FitMode,
}

impl Viewport {
    pub fn new(width: f32, height: f32, fit: FitMode) -> Self {
        Self { width, height, fit }
    }
}

/// Minimum crop edge in native pixels; anything smaller is degenerate.
const MIN_CROP_EDGE: u32 = 8;

/// Map an on-screen framing rectangle into native frame pixel coordinates.
///
/// `mirrored` reflects the rectangle horizontally, matching a front-camera
/// preview the user sees flipped.
pub fn view_to_native(
    view: Rect,
    viewport: &Viewport,
    native_width: u32,
    native_height: u32,
    mirrored: bool,
) -> Result<PixelRect, ScanError> {
    if native_width == 0 || native_height == 0 {
        return Err(ScanError::CaptureError("empty native frame".to_string()));
    }
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return Err(ScanError::CaptureError("empty viewport".to_string()));
    }

    let sx = viewport.width / native_width as f32;
    let sy = viewport.height / native_height as f32;
    let scale = match viewport.fit {
        FitMode::Contain => sx.min(sy),
        FitMode::Cover => sx.max(sy),
    };

    // Rendered offset of the frame inside the display region; negative for
    // Cover, where the frame edges fall outside the region.
    let offset_x = (viewport.width - native_width as f32 * scale) / 2.0;
    let offset_y = (viewport.height - native_height as f32 * scale) / 2.0;

    let mut x = (view.x - offset_x) / scale;
    let y = (view.y - offset_y) / scale;
    let w = view.width / scale;
    let h = view.height / scale;

    if mirrored {
        x = native_width as f32 - (x + w);
    }

    // Clamp to the frame before rounding.
    let x0 = x.max(0.0).round() as u32;
    let y0 = y.max(0.0).round() as u32;
    let x1 = ((x + w).min(native_width as f32).round() as u32).min(native_width);
    let y1 = ((y + h).min(native_height as f32).round() as u32).min(native_height);

    let width = x1.saturating_sub(x0);
    let height = y1.saturating_sub(y0);
    if width < MIN_CROP_EDGE || height < MIN_CROP_EDGE {
        return Err(ScanError::CaptureError(format!(
            "degenerate crop rect: {}x{}",
            width, height
        )));
    }

    Ok(PixelRect {
        x: x0,
        y: y0,
        width,
        height,
    })
}

/// The staged, unconfirmed output of a capture attempt.
#[derive(Debug, Clone)]
pub struct PendingCapture {
    pub step_id: String,
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// JPEG-encoded crop.
    pub image_data: Vec<u8>,
    pub quality_score: f32,
}

impl PendingCapture {
    pub fn into_photo(self) -> CapturedPhoto {
        CapturedPhoto {
            step_id: self.step_id,
            label: self.label,
            width: self.width,
            height: self.height,
            image_data: self.image_data,
            quality_score: self.quality_score,
            captured_at: Utc::now(),
        }
    }
}

pub struct CaptureTransformer {
    cfg: CaptureConfig,
    analyzer: QualityAnalyzer,
}

impl CaptureTransformer {
    pub fn new(cfg: CaptureConfig) -> Self {
        // Dense sampling: capture-time scoring runs once per shot, not per tick.
        let analyzer = QualityAnalyzer::new(1, 4.0, 1.0);
        Self { cfg, analyzer }
    }

    /// Run the full capture transform and stage a review artifact.
    pub fn capture(
        &self,
        frame: &FrameBuffer,
        step: &CaptureStep,
        view: Rect,
        viewport: &Viewport,
        facing: CameraFacing,
        landmarks: Option<&LandmarkFrame>,
    ) -> Result<PendingCapture, ScanError> {
        let mirrored = facing == CameraFacing::Front && step.mode == StepMode::Pose;

        let rect = view_to_native(view, viewport, frame.width, frame.height, mirrored)?;
        let mut crop = crop_frame(frame, rect);

        if mirrored {
            // Match what the user saw in the preview.
            mirror_horizontal(&mut crop);
        }

        if step.mode == StepMode::Pose {
            // Best-effort privacy measure; absent landmarks never block capture.
            if let Some(lm) = landmarks.filter(|lm| lm.is_usable()) {
                if let Some(band) = self.eye_band(lm, frame, rect, mirrored) {
                    box_blur_region(&mut crop, band, self.cfg.blur_radius);
                }
            } else {
                log::debug!("no landmarks at capture time, emitting without privacy blur");
            }
        }

        let stats = self.analyzer.analyze(
            &crop,
            Some(Region::new(0, 0, crop.width as i64, crop.height as i64)),
        );
        let quality_score = score_capture(&stats, &self.cfg);

        let image_data = encode_jpeg(&crop, self.cfg.jpeg_quality)?;

        log::debug!(
            "staged capture for step {}: {}x{} score {:.1}",
            step.id,
            crop.width,
            crop.height,
            quality_score
        );

        Ok(PendingCapture {
            step_id: step.id.clone(),
            label: step.label.clone(),
            width: crop.width,
            height: crop.height,
            image_data,
            quality_score,
        })
    }

    /// Horizontal band spanning the eye line, in crop coordinates.
    fn eye_band(
        &self,
        landmarks: &LandmarkFrame,
        frame: &FrameBuffer,
        crop_rect: PixelRect,
        mirrored: bool,
    ) -> Option<PixelRect> {
        let eye_mid = landmarks.eye_midpoint()?;
        let face_w = landmarks.face_width()? * frame.width as f32;
        let face_h = landmarks.face_height()? * frame.height as f32;

        let pad = self.cfg.eye_band_padding_px as f32;
        let band_w = face_w * self.cfg.eye_band_width_factor + 2.0 * pad;
        let band_h = face_h * self.cfg.eye_band_height_factor + 2.0 * pad;

        // Landmark coordinates are in unmirrored native space; the crop may
        // have been flipped to match the preview.
        let cx_native = eye_mid.x * frame.width as f32;
        let cx = if mirrored {
            crop_rect.width as f32 - (cx_native - crop_rect.x as f32)
        } else {
            cx_native - crop_rect.x as f32
        };
        let cy = eye_mid.y * frame.height as f32 - crop_rect.y as f32;

        let x0 = (cx - band_w / 2.0).max(0.0) as u32;
        let y0 = (cy - band_h / 2.0).max(0.0) as u32;
        let x1 = ((cx + band_w / 2.0) as u32).min(crop_rect.width);
        let y1 = ((cy + band_h / 2.0) as u32).min(crop_rect.height);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

fn crop_frame(frame: &FrameBuffer, rect: PixelRect) -> FrameBuffer {
    let mut data = Vec::with_capacity((rect.width * rect.height * 3) as usize);
    for y in rect.y..rect.y + rect.height {
        let row_start = ((y * frame.width + rect.x) * 3) as usize;
        let row_end = row_start + (rect.width * 3) as usize;
        data.extend_from_slice(&frame.data[row_start..row_end]);
    }
    FrameBuffer::new(data, rect.width, rect.height)
}

fn mirror_horizontal(frame: &mut FrameBuffer) {
    let w = frame.width as usize;
    for y in 0..frame.height as usize {
        let row = &mut frame.data[y * w * 3..(y + 1) * w * 3];
        for x in 0..w / 2 {
            let a = x * 3;
            let b = (w - 1 - x) * 3;
            for c in 0..3 {
                row.swap(a + c, b + c);
            }
        }
    }
}

/// Separable box blur limited to `band`, clamped at the band edges.
fn box_blur_region(frame: &mut FrameBuffer, band: PixelRect, radius: u32) {
    if radius == 0 || band.width == 0 || band.height == 0 {
        return;
    }
    let r = radius as i64;
    let (bx, by) = (band.x as i64, band.y as i64);
    let (bw, bh) = (band.width as i64, band.height as i64);
    let stride = frame.width as usize * 3;

    // Horizontal pass.
    let src = frame.data.clone();
    for y in by..by + bh {
        for x in bx..bx + bw {
            for c in 0..3usize {
                let mut sum = 0u32;
                let mut count = 0u32;
                for dx in -r..=r {
                    let sx = x + dx;
                    if sx < bx || sx >= bx + bw {
                        continue;
                    }
                    sum += src[y as usize * stride + sx as usize * 3 + c] as u32;
                    count += 1;
                }
                frame.data[y as usize * stride + x as usize * 3 + c] = (sum / count.max(1)) as u8;
            }
        }
    }

    // Vertical pass.
    let src = frame.data.clone();
    for y in by..by + bh {
        for x in bx..bx + bw {
            for c in 0..3usize {
                let mut sum = 0u32;
                let mut count = 0u32;
                for dy in -r..=r {
                    let sy = y + dy;
                    if sy < by || sy >= by + bh {
                        continue;
                    }
                    sum += src[sy as usize * stride + x as usize * 3 + c] as u32;
                    count += 1;
                }
                frame.data[y as usize * stride + x as usize * 3 + c] = (sum / count.max(1)) as u8;
            }
        }
    }
}

fn encode_jpeg(frame: &FrameBuffer, quality: u8) -> Result<Vec<u8>, ScanError> {
    let mut buf = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode(
            &frame.data,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ScanError::CaptureError(format!("jpeg encode failed: {}", e)))?;
    Ok(buf)
}
