//! The guidance state machine.
//!
//! States: `Searching -> Aligning -> Holding -> Capturing -> Review`, with
//! `Review` resolving back to `Searching` (retake) or a fresh machine for
//! the next step (confirm). Every transition funnels through
//! [`GuidanceMachine::handle`]; the capture lock makes trigger emission
//! one-shot per cycle, and the countdown flag freezes evaluation once a
//! countdown has started so live quality cannot restart it.

use crate::config::GuidanceConfig;
use crate::pose::PoseEstimate;
use crate::quality::FrameQualityStats;
use crate::types::StepMode;
use serde::{Deserialize, Serialize};

/// The one authoritative guidance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceStatus {
    Searching,
    Aligning,
    Holding,
    Capturing,
    Review,
}

/// Inputs driving the machine.
#[derive(Debug, Clone)]
pub enum GuidanceEvent {
    /// One pose-tracker tick. `None` means no face in this frame.
    Pose {
        estimate: Option<PoseEstimate>,
        now: f64,
    },
    /// One ~2 Hz texture-analysis tick.
    Texture { stats: FrameQualityStats },
    /// Explicit user shutter on a manual step.
    ManualShutter,
    /// The scheduled countdown ran to completion.
    CountdownFinished,
    /// The transformer produced a pending review artifact.
    CaptureStaged,
    /// The transformer failed; abort the attempt and resume guidance.
    CaptureFailed,
    /// User discarded the pending artifact.
    Retake,
}

/// Side effects the orchestrator must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Run the capture transform now.
    TriggerCapture,
    /// Schedule the 3-2-1 countdown; emit `CountdownFinished` when it ends.
    StartCountdown,
}

#[derive(Debug, Clone)]
pub struct GuidanceMachine {
    mode: StepMode,
    status: GuidanceStatus,
    /// Hold progress in [0,100].
    progress: f32,
    /// Timestamp when the pose entered tolerance, seconds.
    hold_started: Option<f64>,
    /// Consecutive passing focus-lock ticks.
    dwell_ticks: u32,
    capture_lock: bool,
    countdown_pending: bool,
    cfg: GuidanceConfig,
}

impl GuidanceMachine {
    pub fn new(mode: StepMode, cfg: GuidanceConfig) -> Self {
        Self {
            mode,
            status: GuidanceStatus::Searching,
            progress: 0.0,
            hold_started: None,
            dwell_ticks: 0,
            capture_lock: false,
            countdown_pending: false,
            cfg,
        }
    }

    pub fn status(&self) -> GuidanceStatus {
        self.status
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    pub fn locked(&self) -> bool {
        self.capture_lock
    }

    pub fn countdown_pending(&self) -> bool {
        self.countdown_pending
    }

    /// Fresh machine for the next step. Confirm is handled here: the session
    /// advances the step index and resets the machine in one motion.
    pub fn reset_for_step(&mut self, mode: StepMode) {
        *self = Self::new(mode, self.cfg.clone());
    }

    /// The single transition function.
    pub fn handle(&mut self, event: GuidanceEvent) -> Vec<Effect> {
        match event {
            GuidanceEvent::Pose { estimate, now } => self.on_pose(estimate, now),
            GuidanceEvent::Texture { stats } => self.on_texture(stats),
            GuidanceEvent::ManualShutter => self.on_manual_shutter(),
            GuidanceEvent::CountdownFinished => self.on_countdown_finished(),
            GuidanceEvent::CaptureStaged => self.on_capture_staged(),
            GuidanceEvent::CaptureFailed => self.on_capture_failed(),
            GuidanceEvent::Retake => self.on_retake(),
        }
    }

    /// Evaluator ticks are ignored from `Capturing` until the session
    /// returns to `Searching` or advances. This is the capture lock.
    fn ticks_frozen(&self) -> bool {
        self.capture_lock || self.countdown_pending
    }

    fn on_pose(&mut self, estimate: Option<PoseEstimate>, now: f64) -> Vec<Effect> {
        if self.mode != StepMode::Pose || self.ticks_frozen() {
            return vec![];
        }

        let estimate = match estimate {
            Some(e) => e,
            None => {
                // No signal: equivalent to leaving tolerance, not an error.
                self.status = GuidanceStatus::Searching;
                self.progress = 0.0;
                self.hold_started = None;
                return vec![];
            }
        };

        if !estimate.within_tolerance() {
            // No partial credit carries over.
            self.status = GuidanceStatus::Aligning;
            self.progress = 0.0;
            self.hold_started = None;
            return vec![];
        }

        let started = *self.hold_started.get_or_insert(now);
        self.status = GuidanceStatus::Holding;
        let elapsed = (now - started).max(0.0) as f32;
        self.progress = (elapsed / self.cfg.hold_duration_s * 100.0).min(100.0);

        if self.progress >= 100.0 {
            self.capture_lock = true;
            self.status = GuidanceStatus::Capturing;
            return vec![Effect::TriggerCapture];
        }

        vec![]
    }

    fn on_texture(&mut self, stats: FrameQualityStats) -> Vec<Effect> {
        if self.ticks_frozen() {
            return vec![];
        }

        match self.mode {
            StepMode::FocusLock => self.on_focus_tick(stats),
            StepMode::Macro => self.on_macro_tick(stats),
            // Pose and manual steps carry texture ticks only for frame
            // bookkeeping at the session level.
            StepMode::Pose | StepMode::Manual => vec![],
        }
    }

    fn on_focus_tick(&mut self, stats: FrameQualityStats) -> Vec<Effect> {
        let passing = stats.sharpness >= self.cfg.focus_min_sharpness
            && stats.brightness >= self.cfg.focus_min_brightness;

        if !passing {
            // One failing tick resets the cumulative dwell.
            self.status = GuidanceStatus::Searching;
            self.dwell_ticks = 0;
            self.progress = 0.0;
            return vec![];
        }

        self.status = GuidanceStatus::Holding;
        self.dwell_ticks += 1;
        self.progress =
            (self.dwell_ticks as f32 / self.cfg.focus_dwell_ticks as f32 * 100.0).min(100.0);

        if self.dwell_ticks >= self.cfg.focus_dwell_ticks {
            // Buffer against one-tick false positives with a countdown
            // instead of an instant shot.
            self.countdown_pending = true;
            return vec![Effect::StartCountdown];
        }

        vec![]
    }

    fn on_macro_tick(&mut self, stats: FrameQualityStats) -> Vec<Effect> {
        if stats.sharpness < self.cfg.macro_blurry_max {
            // Too blurry: hint to move back. Accumulated progress is kept;
            // macro progress is cumulative across bands.
            self.status = GuidanceStatus::Searching;
            return vec![];
        }

        if stats.sharpness < self.cfg.macro_good_min {
            self.status = GuidanceStatus::Aligning;
            self.progress = (self.progress + self.cfg.macro_align_increment).min(100.0);
        } else {
            self.status = GuidanceStatus::Holding;
            self.progress = (self.progress + self.cfg.macro_hold_increment).min(100.0);
        }

        if self.progress >= 100.0 {
            // Macro framing is static; no countdown before the shot.
            self.capture_lock = true;
            self.status = GuidanceStatus::Capturing;
            return vec![Effect::TriggerCapture];
        }

        vec![]
    }

    fn on_manual_shutter(&mut self) -> Vec<Effect> {
        if self.mode != StepMode::Manual || self.ticks_frozen() {
            return vec![];
        }
        self.countdown_pending = true;
        self.status = GuidanceStatus::Holding;
        vec![Effect::StartCountdown]
    }

    fn on_countdown_finished(&mut self) -> Vec<Effect> {
        if !self.countdown_pending || self.capture_lock {
            return vec![];
        }
        self.countdown_pending = false;
        self.capture_lock = true;
        self.status = GuidanceStatus::Capturing;
        vec![Effect::TriggerCapture]
    }

    fn on_capture_staged(&mut self) -> Vec<Effect> {
        if self.status == GuidanceStatus::Capturing {
            self.status = GuidanceStatus::Review;
        }
        vec![]
    }

    fn on_capture_failed(&mut self) -> Vec<Effect> {
        // Abort the attempt: clear the lock and resume guidance.
        self.capture_lock = false;
        self.countdown_pending = false;
        self.status = GuidanceStatus::Searching;
        self.progress = 0.0;
        self.hold_started = None;
        self.dwell_ticks = 0;
        vec![]
    }

    fn on_retake(&mut self) -> Vec<Effect> {
        self.capture_lock = false;
        self.countdown_pending = false;
        self.status = GuidanceStatus::Searching;
        self.progress = 0.0;
        self.hold_started = None;
        self.dwell_ticks = 0;
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;

    fn machine(mode: StepMode) -> GuidanceMachine {
        GuidanceMachine::new(mode, ScanConfig::default().guidance)
    }

    fn within() -> Option<PoseEstimate> {
        Some(PoseEstimate {
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            yaw_within: true,
            pitch_within: true,
        })
    }

    fn outside() -> Option<PoseEstimate> {
        Some(PoseEstimate {
            yaw_deg: 30.0,
            pitch_deg: 0.0,
            yaw_within: false,
            pitch_within: true,
        })
    }

    fn pose(estimate: Option<PoseEstimate>, now: f64) -> GuidanceEvent {
        GuidanceEvent::Pose { estimate, now }
    }

    fn texture(brightness: f32, sharpness: f32) -> GuidanceEvent {
        GuidanceEvent::Texture {
            stats: FrameQualityStats {
                brightness,
                sharpness,
            },
        }
    }

    #[test]
    fn test_pose_hold_completes_and_triggers_once() {
        let mut m = machine(StepMode::Pose);
        assert!(m.handle(pose(within(), 0.0)).is_empty());
        assert_eq!(m.status(), GuidanceStatus::Holding);

        assert!(m.handle(pose(within(), 0.6)).is_empty());
        assert!(m.progress() > 0.0 && m.progress() < 100.0);

        let effects = m.handle(pose(within(), 1.3));
        assert_eq!(effects, vec![Effect::TriggerCapture]);
        assert_eq!(m.status(), GuidanceStatus::Capturing);
        assert!(m.locked());

        // Further ticks are frozen by the capture lock.
        assert!(m.handle(pose(within(), 1.4)).is_empty());
        assert!(m.handle(pose(within(), 2.6)).is_empty());
        assert_eq!(m.status(), GuidanceStatus::Capturing);
    }

    #[test]
    fn test_leaving_tolerance_resets_progress_hard() {
        let mut m = machine(StepMode::Pose);
        m.handle(pose(within(), 0.0));
        m.handle(pose(within(), 0.96)); // 80% of the 1.2 s hold
        assert!(m.progress() > 75.0);

        m.handle(pose(outside(), 1.0));
        assert_eq!(m.status(), GuidanceStatus::Aligning);
        assert_eq!(m.progress(), 0.0);

        // Re-entering starts a fresh dwell, no partial credit.
        m.handle(pose(within(), 1.1));
        assert!(m.progress() < 5.0);
    }

    #[test]
    fn test_no_face_goes_to_searching() {
        let mut m = machine(StepMode::Pose);
        m.handle(pose(within(), 0.0));
        m.handle(pose(within(), 0.5));
        m.handle(pose(None, 0.6));
        assert_eq!(m.status(), GuidanceStatus::Searching);
        assert_eq!(m.progress(), 0.0);
    }

    #[test]
    fn test_progress_monotonic_while_within() {
        let mut m = machine(StepMode::Pose);
        let mut last = 0.0f32;
        for i in 0..20 {
            m.handle(pose(within(), i as f64 * 0.05));
            assert!(m.progress() >= last);
            last = m.progress();
        }
    }

    #[test]
    fn test_focus_lock_dwell_then_countdown() {
        let mut m = machine(StepMode::FocusLock);

        assert!(m.handle(texture(100.0, 70.0)).is_empty());
        assert_eq!(m.status(), GuidanceStatus::Holding);

        let effects = m.handle(texture(100.0, 70.0));
        assert_eq!(effects, vec![Effect::StartCountdown]);
        assert!(m.countdown_pending());

        // Quality dropping mid-countdown does not restart it.
        assert!(m.handle(texture(10.0, 5.0)).is_empty());
        assert!(m.countdown_pending());

        let effects = m.handle(GuidanceEvent::CountdownFinished);
        assert_eq!(effects, vec![Effect::TriggerCapture]);
        assert_eq!(m.status(), GuidanceStatus::Capturing);
    }

    #[test]
    fn test_focus_lock_failing_tick_resets_dwell() {
        let mut m = machine(StepMode::FocusLock);
        m.handle(texture(100.0, 70.0));
        assert!(m.progress() > 0.0);

        m.handle(texture(100.0, 10.0)); // sharpness below minimum
        assert_eq!(m.status(), GuidanceStatus::Searching);
        assert_eq!(m.progress(), 0.0);

        // Needs the full dwell again from scratch.
        assert!(m.handle(texture(100.0, 70.0)).is_empty());
        assert_eq!(m.handle(texture(100.0, 70.0)), vec![Effect::StartCountdown]);
    }

    #[test]
    fn test_macro_bands_and_cumulative_progress() {
        let mut m = machine(StepMode::Macro);

        m.handle(texture(100.0, 10.0)); // too blurry
        assert_eq!(m.status(), GuidanceStatus::Searching);

        m.handle(texture(100.0, 40.0)); // borderline
        assert_eq!(m.status(), GuidanceStatus::Aligning);
        assert_eq!(m.progress(), 8.0);

        m.handle(texture(100.0, 80.0)); // good
        assert_eq!(m.status(), GuidanceStatus::Holding);
        assert_eq!(m.progress(), 42.0);

        m.handle(texture(100.0, 80.0));
        assert_eq!(m.progress(), 76.0);

        let effects = m.handle(texture(100.0, 80.0));
        assert_eq!(effects, vec![Effect::TriggerCapture]);
        assert_eq!(m.status(), GuidanceStatus::Capturing);
    }

    #[test]
    fn test_macro_oscillation_triggers_on_exact_tick() {
        let mut m = machine(StepMode::Macro);

        // Five ticks oscillating between too-blurry and borderline.
        for sharpness in [10.0, 40.0, 10.0, 40.0, 10.0] {
            assert!(m.handle(texture(100.0, sharpness)).is_empty());
        }
        assert_eq!(m.progress(), 16.0);

        // Good ticks accumulate 34 each; the third crosses 100.
        assert!(m.handle(texture(100.0, 80.0)).is_empty());
        assert!(m.handle(texture(100.0, 80.0)).is_empty());
        assert_eq!(m.progress(), 84.0);
        assert_eq!(m.handle(texture(100.0, 80.0)), vec![Effect::TriggerCapture]);
    }

    #[test]
    fn test_macro_cannot_complete_in_one_tick_from_cold() {
        let mut m = machine(StepMode::Macro);
        let effects = m.handle(texture(100.0, 95.0));
        assert!(effects.is_empty());
        assert!(m.progress() < 100.0);
    }

    #[test]
    fn test_manual_shutter_countdown() {
        let mut m = machine(StepMode::Manual);
        assert_eq!(m.handle(GuidanceEvent::ManualShutter), vec![Effect::StartCountdown]);
        // A second shutter press while the countdown runs is ignored.
        assert!(m.handle(GuidanceEvent::ManualShutter).is_empty());
        assert_eq!(
            m.handle(GuidanceEvent::CountdownFinished),
            vec![Effect::TriggerCapture]
        );
    }

    #[test]
    fn test_manual_ignores_evaluator_ticks() {
        let mut m = machine(StepMode::Manual);
        assert!(m.handle(texture(100.0, 90.0)).is_empty());
        assert!(m.handle(pose(within(), 1.0)).is_empty());
        assert_eq!(m.status(), GuidanceStatus::Searching);
    }

    #[test]
    fn test_capture_staged_and_retake() {
        let mut m = machine(StepMode::Pose);
        m.handle(pose(within(), 0.0));
        m.handle(pose(within(), 1.3));
        assert_eq!(m.status(), GuidanceStatus::Capturing);

        m.handle(GuidanceEvent::CaptureStaged);
        assert_eq!(m.status(), GuidanceStatus::Review);
        assert!(m.locked());

        m.handle(GuidanceEvent::Retake);
        assert_eq!(m.status(), GuidanceStatus::Searching);
        assert_eq!(m.progress(), 0.0);
        assert!(!m.locked());
    }

    #[test]
    fn test_capture_failed_clears_lock() {
        let mut m = machine(StepMode::Pose);
        m.handle(pose(within(), 0.0));
        m.handle(pose(within(), 1.3));
        assert!(m.locked());

        m.handle(GuidanceEvent::CaptureFailed);
        assert!(!m.locked());
        assert_eq!(m.status(), GuidanceStatus::Searching);

        // Guidance resumes normally afterwards.
        m.handle(pose(within(), 2.0));
        assert_eq!(m.status(), GuidanceStatus::Holding);
    }

    #[test]
    fn test_reset_for_step() {
        let mut m = machine(StepMode::Pose);
        m.handle(pose(within(), 0.0));
        m.handle(pose(within(), 1.3));
        m.reset_for_step(StepMode::Macro);
        assert_eq!(m.status(), GuidanceStatus::Searching);
        assert_eq!(m.mode(), StepMode::Macro);
        assert!(!m.locked());
    }
}
