//! Core data types shared across the capture pipeline.
//!
//! Frames are raw RGB24 buffers; all landmark coordinates arriving from the
//! pose provider are normalized to [0,1] and converted to pixel space only
//! at capture time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw RGB24 pixel buffer with dimensions.
///
/// `data` is tightly packed, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether `data` holds exactly `width * height` RGB triples.
    ///
    /// Frames built by serde bypass [`FrameBuffer::new`], so anything
    /// crossing the IPC boundary must be checked before pixel access.
    pub fn is_well_formed(&self) -> bool {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(3))
            .is_some_and(|n| n == self.data.len())
    }

    /// RGB triple at (x, y). Caller must stay in bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let idx = ((y * self.width + x) * 3) as usize;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    /// Luma at (x, y) using the BT.601 weights.
    #[inline]
    pub fn luma(&self, x: u32, y: u32) -> f32 {
        let (r, g, b) = self.pixel(x, y);
        0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
    }
}

/// A rectangle in on-screen display coordinates (logical pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A rectangle in native frame pixel coordinates, already clamped to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Which physical camera the step wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    Front,
    Rear,
}

/// How the shell renders the video inside its display region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Letterboxed: the whole frame is visible, bars on the short axis.
    Contain,
    /// Cropped: the frame fills the region, edges fall outside.
    Cover,
}

/// Overlay guide shape rendered by the shell for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideShape {
    FaceOval,
    Circle,
    Frame,
}

/// What signal drives a step's auto-capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Face pose within a yaw/pitch window, hold to confirm.
    Pose,
    /// Sharpness and brightness minimums, dwell then countdown.
    FocusLock,
    /// Sharpness bands with incremental progress, immediate shot at 100.
    Macro,
    /// User-initiated shutter with a countdown for feedback consistency.
    Manual,
}

/// Target pose window for a pose-driven step. Ignored for other modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseWindow {
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub yaw_tolerance_deg: f32,
    pub pitch_tolerance_deg: f32,
}

impl Default for PoseWindow {
    fn default() -> Self {
        Self {
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            yaw_tolerance_deg: 8.0,
            pitch_tolerance_deg: 8.0,
        }
    }
}

/// Static descriptor for one capture step. Immutable for the session's life.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureStep {
    pub id: String,
    pub label: String,
    pub instruction: String,
    pub mode: StepMode,
    pub pose_window: PoseWindow,
    pub guide_shape: GuideShape,
    /// Forced camera facing, if the step needs a specific one.
    pub facing: Option<CameraFacing>,
    /// Digital zoom factor requested for this step.
    pub zoom: Option<f32>,
}

/// A confirmed photo, owned by the session accumulator. One per step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedPhoto {
    pub step_id: String,
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// JPEG-encoded image bytes.
    pub image_data: Vec<u8>,
    pub quality_score: f32,
    pub captured_at: DateTime<Utc>,
}

/// Final contract with the downstream consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: uuid::Uuid,
    /// Ordered by step declaration order.
    pub photos: Vec<CapturedPhoto>,
    /// False when the session finished through the debug short-circuit.
    pub completed_normally: bool,
}
