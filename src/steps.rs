//! The production step catalog.
//!
//! Six steps: four pose-driven head orientations, one macro hairline shot,
//! and one focus-locked donor-area shot. Pose windows are in the evaluator's
//! degree-like space.

use crate::types::{CameraFacing, CaptureStep, GuideShape, PoseWindow, StepMode};

fn pose_window(yaw: f32, pitch: f32, yaw_tol: f32, pitch_tol: f32) -> PoseWindow {
    PoseWindow {
        yaw_deg: yaw,
        pitch_deg: pitch,
        yaw_tolerance_deg: yaw_tol,
        pitch_tolerance_deg: pitch_tol,
    }
}

/// Default scanning sequence, in capture order.
pub fn default_steps() -> Vec<CaptureStep> {
    vec![
        CaptureStep {
            id: "front_portrait".to_string(),
            label: "Front portrait".to_string(),
            instruction: "Look straight at the camera and hold still".to_string(),
            mode: StepMode::Pose,
            pose_window: pose_window(0.0, 0.0, 8.0, 8.0),
            guide_shape: GuideShape::FaceOval,
            facing: Some(CameraFacing::Front),
            zoom: None,
        },
        CaptureStep {
            id: "left_profile".to_string(),
            label: "Left profile".to_string(),
            instruction: "Turn your head to the left".to_string(),
            mode: StepMode::Pose,
            pose_window: pose_window(-35.0, 0.0, 10.0, 12.0),
            guide_shape: GuideShape::FaceOval,
            facing: Some(CameraFacing::Front),
            zoom: None,
        },
        CaptureStep {
            id: "right_profile".to_string(),
            label: "Right profile".to_string(),
            instruction: "Turn your head to the right".to_string(),
            mode: StepMode::Pose,
            pose_window: pose_window(35.0, 0.0, 10.0, 12.0),
            guide_shape: GuideShape::FaceOval,
            facing: Some(CameraFacing::Front),
            zoom: None,
        },
        CaptureStep {
            id: "crown".to_string(),
            label: "Crown".to_string(),
            instruction: "Tilt your head down so the top is visible".to_string(),
            mode: StepMode::Pose,
            pose_window: pose_window(0.0, 25.0, 12.0, 10.0),
            guide_shape: GuideShape::Circle,
            facing: Some(CameraFacing::Front),
            zoom: None,
        },
        CaptureStep {
            id: "hairline_macro".to_string(),
            label: "Hairline close-up".to_string(),
            instruction: "Move the camera close to your hairline".to_string(),
            mode: StepMode::Macro,
            pose_window: PoseWindow::default(),
            guide_shape: GuideShape::Frame,
            facing: Some(CameraFacing::Front),
            zoom: Some(2.0),
        },
        CaptureStep {
            id: "donor_area".to_string(),
            label: "Donor area".to_string(),
            instruction: "Point the camera at the back of your head".to_string(),
            mode: StepMode::FocusLock,
            pose_window: PoseWindow::default(),
            guide_shape: GuideShape::Frame,
            facing: Some(CameraFacing::Rear),
            zoom: Some(1.5),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_shape() {
        let steps = default_steps();
        assert_eq!(steps.len(), 6);

        // Unique ids.
        let mut ids: Vec<_> = steps.iter().map(|s| s.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);

        // Pose steps come first, texture steps last.
        assert!(steps[..4].iter().all(|s| s.mode == StepMode::Pose));
        assert_eq!(steps[4].mode, StepMode::Macro);
        assert_eq!(steps[5].mode, StepMode::FocusLock);
    }

    #[test]
    fn test_profiles_are_mirrored_targets() {
        let steps = default_steps();
        let left = steps.iter().find(|s| s.id == "left_profile").unwrap();
        let right = steps.iter().find(|s| s.id == "right_profile").unwrap();
        assert_eq!(left.pose_window.yaw_deg, -right.pose_window.yaw_deg);
    }

    #[test]
    fn test_donor_step_uses_rear_camera() {
        let steps = default_steps();
        let donor = steps.iter().find(|s| s.id == "donor_area").unwrap();
        assert_eq!(donor.facing, Some(CameraFacing::Rear));
        assert!(donor.zoom.unwrap() > 1.0);
    }
}
