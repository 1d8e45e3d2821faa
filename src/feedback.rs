//! Multi-modal feedback: tones, speech, haptics.
//!
//! Emission must never block the capture loop, so everything is queued to a
//! dedicated worker thread and forgotten. Sink failures are logged and
//! swallowed; a missing speech engine or unsupported vibration motor is a
//! soft condition, never a pipeline error. A session-scoped mute flag
//! suppresses tones and speech but not haptics.

use crate::errors::ScanError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Short feedback tones keyed to state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Beep,
    Success,
    Error,
    Focus,
    Lock,
}

pub trait ToneSink: Send + Sync {
    fn play(&self, tone: Tone) -> Result<(), ScanError>;
}

pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str) -> Result<(), ScanError>;
    /// Cancel any in-flight utterance. Called synchronously at teardown.
    fn cancel(&self);
}

pub trait HapticSink: Send + Sync {
    fn pulse(&self, duration_ms: u64) -> Result<(), ScanError>;
}

enum FeedbackJob {
    Tone(Tone),
    Speak(String),
    Pulse(u64),
}

/// Collects the output sinks; all optional, absent sinks degrade silently.
#[derive(Default)]
pub struct FeedbackSinks {
    pub tones: Option<Arc<dyn ToneSink>>,
    pub speech: Option<Arc<dyn SpeechSink>>,
    pub haptics: Option<Arc<dyn HapticSink>>,
}

pub struct FeedbackCoordinator {
    tx: Option<Sender<FeedbackJob>>,
    worker: Option<JoinHandle<()>>,
    speech: Option<Arc<dyn SpeechSink>>,
    muted: Arc<AtomicBool>,
}

impl FeedbackCoordinator {
    pub fn new(sinks: FeedbackSinks) -> Self {
        let (tx, rx) = mpsc::channel::<FeedbackJob>();
        let tones = sinks.tones;
        let speech_worker = sinks.speech.clone();
        let haptics = sinks.haptics;

        let worker = std::thread::Builder::new()
            .name("scanguide-feedback".to_string())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    let result = match job {
                        FeedbackJob::Tone(tone) => {
                            tones.as_ref().map(|s| s.play(tone)).unwrap_or(Ok(()))
                        }
                        FeedbackJob::Speak(text) => speech_worker
                            .as_ref()
                            .map(|s| s.speak(&text))
                            .unwrap_or(Ok(())),
                        FeedbackJob::Pulse(ms) => {
                            haptics.as_ref().map(|s| s.pulse(ms)).unwrap_or(Ok(()))
                        }
                    };
                    if let Err(e) = result {
                        log::warn!("feedback sink failed: {}", e);
                    }
                }
            })
            .ok();

        if worker.is_none() {
            log::warn!("feedback worker could not be spawned, feedback disabled");
        }

        Self {
            tx: worker.as_ref().map(|_| tx),
            worker,
            speech: sinks.speech,
            muted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn tone(&self, tone: Tone) {
        if self.muted() {
            return;
        }
        self.enqueue(FeedbackJob::Tone(tone));
    }

    pub fn say(&self, text: &str) {
        if self.muted() {
            return;
        }
        self.enqueue(FeedbackJob::Speak(text.to_string()));
    }

    /// Haptics ignore the mute flag.
    pub fn pulse(&self, duration_ms: u64) {
        self.enqueue(FeedbackJob::Pulse(duration_ms));
    }

    /// Synchronously cancel in-flight speech. Part of session teardown.
    pub fn cancel_speech(&self) {
        if let Some(speech) = &self.speech {
            speech.cancel();
        }
    }

    /// Stop the worker and drain. Called once at teardown.
    pub fn shutdown(&mut self) {
        self.cancel_speech();
        self.tx = None; // Closing the channel ends the worker loop.
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    fn enqueue(&self, job: FeedbackJob) {
        if let Some(tx) = &self.tx {
            // A closed channel just means teardown already happened.
            let _ = tx.send(job);
        }
    }
}

impl Drop for FeedbackCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
