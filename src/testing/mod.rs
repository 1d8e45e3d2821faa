//! Synthetic frames and landmark sets for offline testing.
//!
//! Landmark geometry matches the evaluator's conventions, so tests can
//! synthesize an exact target yaw/pitch and assert the evaluator recovers
//! it without any tracker in the loop.

use crate::config::PoseConfig;
use crate::pose::landmarks::{
    CHIN, FOREHEAD, LEFT_CHEEK, LEFT_EYE_OUTER, NOSE_TIP, RIGHT_CHEEK, RIGHT_EYE_OUTER,
};
use crate::pose::{LandmarkFrame, Point2};
use crate::types::FrameBuffer;

/// Dense face-mesh point count; indices above the named ones must exist.
const MESH_POINTS: usize = 478;

/// Uniform frame at one luma value.
pub fn flat_frame(width: u32, height: u32, value: u8) -> FrameBuffer {
    FrameBuffer::new(vec![value; (width * height * 3) as usize], width, height)
}

/// Horizontal gradient, useful for exposure and crop tests.
pub fn gradient_frame(width: u32, height: u32) -> FrameBuffer {
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let v = (x * 255 / width.max(1)) as u8;
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = v;
            data[idx + 1] = v;
            data[idx + 2] = v;
        }
    }
    FrameBuffer::new(data, width, height)
}

/// Checkerboard, the sharpest pattern the analyzer sees.
pub fn checker_frame(width: u32, height: u32, cell: u32) -> FrameBuffer {
    let cell = cell.max(1);
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

/// A neutral frontal face: eyes at y 0.45, nose centered, face spanning
/// 0.3 of the frame horizontally and 0.4 vertically.
pub fn frontal_landmarks() -> LandmarkFrame {
    let mut points = vec![Point2::new(0.5, 0.5); MESH_POINTS];
    points[LEFT_EYE_OUTER] = Point2::new(0.42, 0.45);
    points[RIGHT_EYE_OUTER] = Point2::new(0.58, 0.45);
    points[LEFT_CHEEK] = Point2::new(0.35, 0.5);
    points[RIGHT_CHEEK] = Point2::new(0.65, 0.5);
    points[FOREHEAD] = Point2::new(0.5, 0.3);
    points[CHIN] = Point2::new(0.5, 0.7);
    // Nose placed so raw pitch equals the configured baseline, i.e. a
    // frontal face evaluates to pitch 0 under default config.
    points[NOSE_TIP] = Point2::new(0.5, 0.55);
    LandmarkFrame::new(points)
}

/// Landmarks whose nose tip is displaced to produce exactly the requested
/// yaw and pitch under the given pose config.
pub fn landmarks_with_pose(cfg: &PoseConfig, yaw_deg: f32, pitch_deg: f32) -> LandmarkFrame {
    let mut frame = frontal_landmarks();
    let eye_mid = frame.eye_midpoint().expect("synthetic eyes present");
    let face_width = frame.face_width().expect("synthetic cheeks present");
    let face_height = frame.face_height().expect("synthetic outline present");

    let x = eye_mid.x + yaw_deg / cfg.yaw_scale_deg * face_width;
    let y = eye_mid.y
        + (pitch_deg + cfg.pitch_baseline_deg) / cfg.pitch_scale_deg * face_height;
    frame.points[NOSE_TIP] = Point2::new(x, y);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;

    #[test]
    fn test_frontal_landmarks_usable() {
        assert!(frontal_landmarks().is_usable());
    }

    #[test]
    fn test_frame_generators_sized() {
        assert_eq!(flat_frame(10, 10, 5).size_bytes(), 300);
        assert_eq!(gradient_frame(8, 4).size_bytes(), 96);
        assert_eq!(checker_frame(8, 8, 2).size_bytes(), 192);
    }

    #[test]
    fn test_landmarks_with_pose_round_trip() {
        use crate::pose::PoseEvaluator;
        use crate::types::PoseWindow;

        let cfg = ScanConfig::default().pose;
        let evaluator = PoseEvaluator::new(cfg.clone());
        let frame = landmarks_with_pose(&cfg, -18.0, 12.0);
        let est = evaluator.evaluate(&frame, &PoseWindow::default()).unwrap();
        assert!((est.yaw_deg - -18.0).abs() < 0.5);
        assert!((est.pitch_deg - 12.0).abs() < 0.5);
    }
}
