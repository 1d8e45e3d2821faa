//! Yaw/pitch estimation and tolerance checks.
//!
//! Yaw comes from the horizontal offset of the nose tip relative to the
//! outer-eye midpoint, normalized by inter-cheek distance. Pitch comes from
//! the vertical offset normalized by face height, with a fixed baseline
//! subtracted since default camera framing is not level. Both are scaled to
//! a degree-like range; the exact scale is a tuned constant, not a measured
//! rotation.

use crate::config::PoseConfig;
use crate::pose::landmarks::LandmarkFrame;
use crate::types::PoseWindow;
use serde::{Deserialize, Serialize};

/// Signed pose estimate plus per-axis tolerance verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub yaw_within: bool,
    pub pitch_within: bool,
}

impl PoseEstimate {
    pub fn within_tolerance(&self) -> bool {
        self.yaw_within && self.pitch_within
    }
}

/// Directional guidance toward the target window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionHint {
    TurnLeft,
    TurnRight,
    TiltUp,
    TiltDown,
}

#[derive(Debug, Clone)]
pub struct PoseEvaluator {
    config: PoseConfig,
}

impl PoseEvaluator {
    pub fn new(config: PoseConfig) -> Self {
        Self { config }
    }

    /// Evaluate one landmark frame against a step's target window.
    ///
    /// Returns None when the frame carries no usable face signal; the state
    /// machine treats that as leaving tolerance, never as an error.
    pub fn evaluate(&self, frame: &LandmarkFrame, window: &PoseWindow) -> Option<PoseEstimate> {
        if !frame.is_usable() {
            return None;
        }

        let nose = frame.nose_tip()?;
        let eye_mid = frame.eye_midpoint()?;
        let face_width = frame.face_width()?;
        let face_height = frame.face_height()?;

        let yaw_deg = (nose.x - eye_mid.x) / face_width * self.config.yaw_scale_deg;
        let pitch_deg = (nose.y - eye_mid.y) / face_height * self.config.pitch_scale_deg
            - self.config.pitch_baseline_deg;

        // Boundary counts as within, so an exact-tolerance pose draws no hint.
        let yaw_within = (yaw_deg - window.yaw_deg).abs() <= window.yaw_tolerance_deg;
        let pitch_within = (pitch_deg - window.pitch_deg).abs() <= window.pitch_tolerance_deg;

        Some(PoseEstimate {
            yaw_deg,
            pitch_deg,
            yaw_within,
            pitch_within,
        })
    }

    /// Pick the hint that reduces the dominant out-of-tolerance axis.
    ///
    /// `mirrored` flips left/right labels so the hint matches the mirrored
    /// preview the user is looking at. Yaw wins ties with pitch since
    /// horizontal correction is the common case.
    pub fn hint(
        &self,
        estimate: &PoseEstimate,
        window: &PoseWindow,
        mirrored: bool,
    ) -> Option<DirectionHint> {
        if !estimate.yaw_within {
            let raw = if estimate.yaw_deg > window.yaw_deg {
                DirectionHint::TurnLeft
            } else {
                DirectionHint::TurnRight
            };
            return Some(if mirrored { flip(raw) } else { raw });
        }

        if !estimate.pitch_within {
            // Positive pitch means the nose sits low in the frame: chin down.
            return Some(if estimate.pitch_deg > window.pitch_deg {
                DirectionHint::TiltUp
            } else {
                DirectionHint::TiltDown
            });
        }

        None
    }
}

fn flip(hint: DirectionHint) -> DirectionHint {
    match hint {
        DirectionHint::TurnLeft => DirectionHint::TurnRight,
        DirectionHint::TurnRight => DirectionHint::TurnLeft,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::testing::{landmarks_with_pose, frontal_landmarks};

    fn evaluator() -> PoseEvaluator {
        PoseEvaluator::new(ScanConfig::default().pose)
    }

    #[test]
    fn test_frontal_face_centered() {
        let est = evaluator()
            .evaluate(&frontal_landmarks(), &PoseWindow::default())
            .unwrap();
        assert!(est.yaw_deg.abs() < 0.5);
        assert!(est.pitch_deg.abs() < 0.5);
        assert!(est.within_tolerance());
    }

    #[test]
    fn test_synthesized_yaw_recovered() {
        let cfg = ScanConfig::default().pose;
        let est = evaluator()
            .evaluate(&landmarks_with_pose(&cfg, 20.0, 0.0), &PoseWindow::default())
            .unwrap();
        assert!((est.yaw_deg - 20.0).abs() < 0.5);
        assert!(!est.yaw_within);
    }

    #[test]
    fn test_no_face_is_no_signal() {
        let empty = LandmarkFrame::new(vec![]);
        assert!(evaluator().evaluate(&empty, &PoseWindow::default()).is_none());
    }

    #[test]
    fn test_exact_boundary_is_within() {
        let cfg = ScanConfig::default().pose;
        let window = PoseWindow::default();
        let est = evaluator()
            .evaluate(
                &landmarks_with_pose(&cfg, window.yaw_tolerance_deg, 0.0),
                &window,
            )
            .unwrap();
        assert!(est.yaw_within, "boundary pose must count as within");
        assert_eq!(evaluator().hint(&est, &window, false), None);
    }

    #[test]
    fn test_hint_direction_and_mirroring() {
        let cfg = ScanConfig::default().pose;
        let window = PoseWindow::default();
        let est = evaluator()
            .evaluate(&landmarks_with_pose(&cfg, 25.0, 0.0), &window)
            .unwrap();

        assert_eq!(
            evaluator().hint(&est, &window, false),
            Some(DirectionHint::TurnLeft)
        );
        assert_eq!(
            evaluator().hint(&est, &window, true),
            Some(DirectionHint::TurnRight)
        );
    }

    #[test]
    fn test_pitch_hint_not_mirrored() {
        let cfg = ScanConfig::default().pose;
        let window = PoseWindow::default();
        let est = evaluator()
            .evaluate(&landmarks_with_pose(&cfg, 0.0, 30.0), &window)
            .unwrap();
        assert_eq!(
            evaluator().hint(&est, &window, true),
            Some(DirectionHint::TiltUp)
        );
    }
}
