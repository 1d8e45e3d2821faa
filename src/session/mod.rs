//! The capture session orchestrator.
//!
//! Owns the step sequence and wires the sampler, analyzers, guidance
//! machine, transformer, and feedback together. The host drives it with
//! pose ticks (per tracker result) and texture ticks (~2 Hz); all state
//! transitions funnel through the guidance machine, and the single capture
//! lock plus the processing guard are the only synchronization in play.

pub mod accumulator;
pub mod camera;

pub use accumulator::SessionAccumulator;
pub use camera::{CameraControl, NullCamera};

use crate::config::ScanConfig;
use crate::errors::ScanError;
use crate::feedback::{FeedbackCoordinator, FeedbackSinks, Tone};
use crate::guidance::{Effect, GuidanceEvent, GuidanceMachine, GuidanceStatus};
use crate::pose::{DirectionHint, LandmarkFrame, PoseEvaluator};
use crate::quality::{FrameQualityStats, QualityAnalyzer};
use crate::sampler::FrameSampler;
use crate::timing::ScanClock;
use crate::transform::{CaptureTransformer, PendingCapture, Viewport};
use crate::types::{
    CameraFacing, CaptureStep, FrameBuffer, Rect, SessionOutcome, StepMode,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// What one tick produced, for the shell's overlay.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub status: GuidanceStatus,
    pub progress: f32,
    pub hint: Option<DirectionHint>,
    pub stats: Option<FrameQualityStats>,
    /// The caller must schedule a countdown and deliver
    /// `countdown_finished` when it completes.
    pub countdown_started: bool,
    /// True when the tick was dropped because another was in flight.
    pub skipped: bool,
}

pub struct CaptureSession {
    id: Uuid,
    steps: Vec<CaptureStep>,
    current: usize,
    machine: GuidanceMachine,
    accumulator: SessionAccumulator,
    pending: Option<PendingCapture>,
    last_landmarks: Option<LandmarkFrame>,
    /// Latest frame seen by a texture tick; the countdown captures from it.
    last_frame: Option<FrameBuffer>,
    framing: Option<(Rect, Viewport)>,
    processing: bool,
    closed: bool,
    clock: ScanClock,
    config: ScanConfig,
    camera: Box<dyn CameraControl>,
    feedback: FeedbackCoordinator,
    transformer: CaptureTransformer,
    evaluator: PoseEvaluator,
    analyzer: QualityAnalyzer,
    sampler: FrameSampler,
    cancel: CancellationToken,
    facing: CameraFacing,
    zoom: f32,
}

impl CaptureSession {
    /// Build and start a session. Setup failures here are terminal; the
    /// caller may re-invoke after fixing the cause.
    pub fn open(
        steps: Vec<CaptureStep>,
        config: ScanConfig,
        camera: Box<dyn CameraControl>,
        sinks: FeedbackSinks,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        if steps.is_empty() {
            return Err(ScanError::InvalidConfig(
                "session needs at least one step".to_string(),
            ));
        }

        let first_mode = steps[0].mode;
        let mut session = Self {
            id: Uuid::new_v4(),
            machine: GuidanceMachine::new(first_mode, config.guidance.clone()),
            accumulator: SessionAccumulator::new(),
            pending: None,
            last_landmarks: None,
            last_frame: None,
            framing: None,
            processing: false,
            closed: false,
            clock: ScanClock::new(),
            camera,
            feedback: FeedbackCoordinator::new(sinks),
            transformer: CaptureTransformer::new(config.capture.clone()),
            evaluator: PoseEvaluator::new(config.pose.clone()),
            analyzer: QualityAnalyzer::new(
                config.analysis.sample_stride,
                config.analysis.sharpness_scale,
                config.analysis.region_fraction,
            ),
            sampler: FrameSampler::new(config.analysis.analysis_width),
            cancel: CancellationToken::new(),
            facing: CameraFacing::Front,
            zoom: 1.0,
            current: 0,
            steps,
            config,
        };

        log::info!(
            "opened capture session {} with {} steps",
            session.id,
            session.steps.len()
        );
        session.apply_step_camera();
        session.announce_step();
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> GuidanceStatus {
        self.machine.status()
    }

    pub fn progress(&self) -> f32 {
        self.machine.progress()
    }

    pub fn current_step(&self) -> &CaptureStep {
        &self.steps[self.current]
    }

    pub fn confirmed_count(&self) -> usize {
        self.accumulator.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_pending_review(&self) -> bool {
        self.pending.is_some()
    }

    /// Token countdown tasks must respect; canceled at teardown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn texture_interval(&self) -> Duration {
        Duration::from_millis(self.config.analysis.texture_interval_ms)
    }

    /// The shell reports where the framing guide sits on screen.
    pub fn set_framing(&mut self, rect: Rect, viewport: Viewport) {
        self.framing = Some((rect, viewport));
    }

    pub fn set_muted(&self, muted: bool) {
        self.feedback.set_muted(muted);
    }

    /// Session-scoped camera adjustments; unsupported requests soft-fail.
    pub fn set_zoom(&mut self, factor: f32) {
        self.zoom = factor;
        let result = self.camera.set_zoom(factor);
        soft_apply("zoom", result);
    }

    pub fn set_torch(&mut self, on: bool) {
        let result = self.camera.set_torch(on);
        soft_apply("torch", result);
    }

    pub fn set_adjustments(&mut self, brightness: f32, contrast: f32) {
        let result = self.camera.set_adjustments(brightness, contrast);
        soft_apply("adjustments", result);
    }

    /// One pose-tracker tick. `landmarks` is `None` when the tracker saw no
    /// face. Skipped (never queued) while a previous tick is in flight.
    pub fn pose_tick(
        &mut self,
        landmarks: Option<LandmarkFrame>,
        frame: &FrameBuffer,
    ) -> Result<TickReport, ScanError> {
        self.ensure_open()?;
        if self.processing {
            return Ok(self.skipped_report());
        }
        self.processing = true;

        let estimate = landmarks
            .as_ref()
            .and_then(|lm| self.evaluator.evaluate(lm, &self.current_step().pose_window));
        // Retain only the most recent frame, for the privacy blur.
        if landmarks.is_some() {
            self.last_landmarks = landmarks;
        }

        let prev = self.machine.status();
        let effects = self.machine.handle(GuidanceEvent::Pose {
            estimate,
            now: self.clock.now(),
        });
        self.emit_transition_feedback(prev, self.machine.status());
        let countdown_started = self.run_effects(&effects, Some(frame));

        let hint = match (&estimate, self.machine.status()) {
            (Some(est), GuidanceStatus::Aligning) => self.evaluator.hint(
                est,
                &self.current_step().pose_window,
                self.mirrored(),
            ),
            _ => None,
        };

        self.processing = false;
        Ok(TickReport {
            status: self.machine.status(),
            progress: self.machine.progress(),
            hint,
            stats: None,
            countdown_started,
            skipped: false,
        })
    }

    /// One ~2 Hz texture-analysis tick. Also records the frame so a later
    /// countdown completion has something to capture from.
    pub fn texture_tick(&mut self, frame: &FrameBuffer) -> Result<TickReport, ScanError> {
        self.ensure_open()?;
        if self.processing {
            return Ok(self.skipped_report());
        }
        self.processing = true;

        self.last_frame = Some(frame.clone());
        let analysis = self.sampler.sample(frame);
        let stats = self.analyzer.analyze(&analysis, None);

        let prev = self.machine.status();
        let effects = self.machine.handle(GuidanceEvent::Texture { stats });
        self.emit_transition_feedback(prev, self.machine.status());
        let countdown_started = self.run_effects(&effects, Some(frame));

        self.processing = false;
        Ok(TickReport {
            status: self.machine.status(),
            progress: self.machine.progress(),
            hint: None,
            stats: Some(stats),
            countdown_started,
            skipped: false,
        })
    }

    /// Explicit shutter on a manual step.
    pub fn manual_shutter(&mut self) -> Result<TickReport, ScanError> {
        self.ensure_open()?;
        let prev = self.machine.status();
        let effects = self.machine.handle(GuidanceEvent::ManualShutter);
        self.emit_transition_feedback(prev, self.machine.status());
        let countdown_started = self.run_effects(&effects, None);
        Ok(TickReport {
            status: self.machine.status(),
            progress: self.machine.progress(),
            hint: None,
            stats: None,
            countdown_started,
            skipped: false,
        })
    }

    /// Deliver countdown completion. Captures from the most recent frame.
    pub fn countdown_finished(&mut self) -> Result<TickReport, ScanError> {
        self.ensure_open()?;
        let prev = self.machine.status();
        let effects = self.machine.handle(GuidanceEvent::CountdownFinished);
        self.emit_transition_feedback(prev, self.machine.status());
        self.run_effects(&effects, None);
        Ok(TickReport {
            status: self.machine.status(),
            progress: self.machine.progress(),
            hint: None,
            stats: None,
            countdown_started: false,
            skipped: false,
        })
    }

    /// Accept the pending review artifact and advance. Returns the outcome
    /// when the final step was just confirmed.
    pub fn confirm(&mut self) -> Result<Option<SessionOutcome>, ScanError> {
        self.ensure_open()?;
        let pending = self.pending.take().ok_or_else(|| {
            ScanError::CaptureError("no pending review artifact to confirm".to_string())
        })?;

        self.accumulator.confirm(pending.into_photo());
        self.feedback.tone(Tone::Success);
        self.feedback.pulse(40);

        if self.current + 1 >= self.steps.len() {
            log::info!("session {} complete: {} photos", self.id, self.accumulator.len());
            let outcome = self.build_outcome(true);
            self.teardown();
            return Ok(Some(outcome));
        }

        self.current += 1;
        let mode = self.current_step().mode;
        self.machine.reset_for_step(mode);
        self.last_landmarks = None;
        self.last_frame = None;
        self.apply_step_camera();
        self.announce_step();
        Ok(None)
    }

    /// Discard the pending artifact and resume guidance. Already-confirmed
    /// photos are untouched.
    pub fn retake(&mut self) -> Result<TickReport, ScanError> {
        self.ensure_open()?;
        self.pending = None;
        self.machine.handle(GuidanceEvent::Retake);
        self.feedback.tone(Tone::Beep);
        log::debug!("retake on step {}", self.current_step().id);
        Ok(TickReport {
            status: self.machine.status(),
            progress: self.machine.progress(),
            hint: None,
            stats: None,
            countdown_started: false,
            skipped: false,
        })
    }

    /// Terminal: release the camera, cancel speech and timers. No further
    /// transitions are accepted afterwards.
    pub fn exit(&mut self) -> Result<(), ScanError> {
        self.ensure_open()?;
        log::info!("session {} exited at step {}", self.id, self.current_step().id);
        self.teardown();
        Ok(())
    }

    /// Debug short-circuit: finish now with whatever is confirmed. The
    /// outcome records that the normal flow was bypassed.
    pub fn debug_complete(&mut self) -> Result<SessionOutcome, ScanError> {
        self.ensure_open()?;
        log::warn!("session {} completed via debug short-circuit", self.id);
        let outcome = self.build_outcome(false);
        self.teardown();
        Ok(outcome)
    }

    fn ensure_open(&self) -> Result<(), ScanError> {
        if self.closed {
            return Err(ScanError::SessionClosed("session is closed".to_string()));
        }
        Ok(())
    }

    fn mirrored(&self) -> bool {
        self.facing == CameraFacing::Front && self.current_step().mode == StepMode::Pose
    }

    fn skipped_report(&self) -> TickReport {
        TickReport {
            status: self.machine.status(),
            progress: self.machine.progress(),
            hint: None,
            stats: None,
            countdown_started: false,
            skipped: true,
        }
    }

    /// Carry out machine effects. Returns whether a countdown must be
    /// scheduled by the caller.
    fn run_effects(&mut self, effects: &[Effect], frame: Option<&FrameBuffer>) -> bool {
        let mut countdown_started = false;
        for effect in effects {
            match effect {
                Effect::StartCountdown => countdown_started = true,
                Effect::TriggerCapture => {
                    let frame = frame.cloned().or_else(|| self.last_frame.clone());
                    match frame {
                        Some(f) => self.do_capture(&f),
                        None => {
                            log::warn!("capture triggered with no frame available");
                            self.machine.handle(GuidanceEvent::CaptureFailed);
                            self.feedback.tone(Tone::Error);
                        }
                    }
                }
            }
        }
        countdown_started
    }

    fn do_capture(&mut self, frame: &FrameBuffer) {
        let (rect, viewport) = match self.framing {
            Some(f) => f,
            None => {
                log::warn!("capture triggered before framing was set");
                self.machine.handle(GuidanceEvent::CaptureFailed);
                self.feedback.tone(Tone::Error);
                return;
            }
        };

        let step = self.current_step().clone();
        match self.transformer.capture(
            frame,
            &step,
            rect,
            &viewport,
            self.facing,
            self.last_landmarks.as_ref(),
        ) {
            Ok(pending) => {
                self.pending = Some(pending);
                self.machine.handle(GuidanceEvent::CaptureStaged);
                self.feedback.tone(Tone::Lock);
            }
            Err(e) => {
                // Abort the attempt; guidance resumes without surfacing an
                // error to the user.
                log::warn!("capture transform failed: {}", e);
                self.machine.handle(GuidanceEvent::CaptureFailed);
                self.feedback.tone(Tone::Error);
            }
        }
    }

    fn emit_transition_feedback(&self, prev: GuidanceStatus, next: GuidanceStatus) {
        if prev == next {
            return;
        }
        match next {
            GuidanceStatus::Holding => {
                self.feedback.tone(Tone::Focus);
                self.feedback.pulse(20);
            }
            GuidanceStatus::Capturing => {
                self.feedback.tone(Tone::Beep);
                self.feedback.pulse(60);
            }
            _ => {}
        }
    }

    fn apply_step_camera(&mut self) {
        let step = &self.steps[self.current];
        if let Some(facing) = step.facing {
            self.facing = facing;
            let result = self.camera.set_facing(facing);
            soft_apply("facing", result);
        }
        let zoom = step.zoom.unwrap_or(1.0);
        self.zoom = zoom;
        let result = self.camera.set_zoom(zoom);
        soft_apply("zoom", result);
    }

    fn announce_step(&self) {
        let step = self.current_step();
        log::debug!("step {}/{}: {}", self.current + 1, self.steps.len(), step.id);
        self.feedback.say(&step.instruction);
    }

    fn build_outcome(&mut self, completed_normally: bool) -> SessionOutcome {
        SessionOutcome {
            session_id: self.id,
            photos: std::mem::take(&mut self.accumulator).into_photos(),
            completed_normally,
        }
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.cancel.cancel();
        if let Err(e) = self.camera.stop() {
            log::warn!("camera stop failed during teardown: {}", e);
        }
        self.feedback.shutdown();
        self.pending = None;
        self.closed = true;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if !self.closed {
            log::debug!("session {} dropped without explicit exit", self.id);
            self.teardown();
        }
    }
}

fn soft_apply(what: &str, result: Result<(), ScanError>) {
    if let Err(e) = result {
        // Unsupported capability requests are soft failures by contract.
        log::warn!("camera {} request not applied: {}", what, e);
    }
}

/// Drive the 3-2-1 countdown for a shared session, then deliver completion.
///
/// Cancelable at every second boundary via the session's token; a canceled
/// countdown delivers nothing, matching teardown semantics.
pub async fn run_countdown(session: Arc<Mutex<CaptureSession>>, cancel: CancellationToken) {
    let steps = {
        let Some(guard) = lock_countdown_session(&session) else {
            return;
        };
        if guard.is_closed() {
            return;
        }
        guard.config.guidance.countdown_steps
    };

    for remaining in (1..=steps).rev() {
        {
            let Some(guard) = lock_countdown_session(&session) else {
                return;
            };
            if guard.is_closed() {
                return;
            }
            guard.feedback.tone(Tone::Beep);
            guard.feedback.say(&remaining.to_string());
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }
    }

    let Some(mut guard) = lock_countdown_session(&session) else {
        return;
    };
    if !guard.is_closed() {
        let _ = guard.countdown_finished();
    }
}

/// A poisoned lock means a tick panicked; the countdown abandons itself
/// instead of propagating the panic out of a detached task.
fn lock_countdown_session(
    session: &Arc<Mutex<CaptureSession>>,
) -> Option<std::sync::MutexGuard<'_, CaptureSession>> {
    match session.lock() {
        Ok(guard) => Some(guard),
        Err(_) => {
            log::warn!("countdown abandoned: session lock poisoned");
            None
        }
    }
}
