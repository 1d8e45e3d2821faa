//! Tauri command surface.
//!
//! Thin IPC layer over a registry of active capture sessions. Tick commands
//! use `try_lock` so a tick arriving while the previous one is still being
//! processed is skipped, never queued.

use crate::config::ScanConfig;
use crate::feedback::FeedbackSinks;
use crate::pose::LandmarkFrame;
use crate::session::{run_countdown, CaptureSession, NullCamera, TickReport};
use crate::steps::default_steps;
use crate::transform::Viewport;
use crate::types::{CaptureStep, FitMode, FrameBuffer, Rect, SessionOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex};
use tauri::command;
use tokio::sync::RwLock;

// Global session registry: async-friendly locking for the map, sync locking
// for each session.
lazy_static::lazy_static! {
    static ref SESSION_REGISTRY: Arc<RwLock<HashMap<String, Arc<SyncMutex<CaptureSession>>>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

/// Frames cross the IPC boundary as plain structs, bypassing the
/// `FrameBuffer` constructor; reject mismatched buffers before any pixel
/// access can go out of bounds.
fn check_frame(frame: &FrameBuffer) -> Result<(), String> {
    if !frame.is_well_formed() {
        return Err(format!(
            "Malformed frame: {}x{} with {} bytes",
            frame.width,
            frame.height,
            frame.data.len()
        ));
    }
    Ok(())
}

async fn get_session(session_id: &str) -> Result<Arc<SyncMutex<CaptureSession>>, String> {
    let registry = SESSION_REGISTRY.read().await;
    registry
        .get(session_id)
        .cloned()
        .ok_or_else(|| format!("Session not found: {}", session_id))
}

/// Open a new capture session with the given steps, or the default catalog.
#[command]
pub async fn open_scan_session(steps: Option<Vec<CaptureStep>>) -> Result<String, String> {
    let steps = steps.unwrap_or_else(default_steps);
    let config = ScanConfig::load_or_default();

    let session = CaptureSession::open(
        steps,
        config,
        Box::new(NullCamera),
        FeedbackSinks::default(),
    )
    .map_err(|e| format!("Failed to open session: {}", e))?;

    let id = session.id().to_string();
    log::info!("Opened scan session {}", id);

    let mut registry = SESSION_REGISTRY.write().await;
    registry.insert(id.clone(), Arc::new(SyncMutex::new(session)));
    Ok(id)
}

/// Report where the shell renders the framing guide.
#[command]
pub async fn set_scan_framing(
    session_id: String,
    rect: Rect,
    display_width: f32,
    display_height: f32,
    fit: FitMode,
) -> Result<(), String> {
    let session = get_session(&session_id).await?;
    let mut guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
    guard.set_framing(rect, Viewport::new(display_width, display_height, fit));
    Ok(())
}

/// One pose-tracker tick. Returns None when the tick was skipped because a
/// previous one is still in flight.
#[command]
pub async fn scan_pose_tick(
    session_id: String,
    landmarks: Option<LandmarkFrame>,
    frame: FrameBuffer,
) -> Result<Option<TickReport>, String> {
    check_frame(&frame)?;
    let session = get_session(&session_id).await?;

    let guard = session.try_lock();
    let mut guard = match guard {
        Ok(guard) => guard,
        // Busy: skip rather than queue.
        Err(std::sync::TryLockError::WouldBlock) => return Ok(None),
        Err(_) => return Err("lock poisoned".to_string()),
    };

    let report = guard
        .pose_tick(landmarks, &frame)
        .map_err(|e| e.to_string())?;
    maybe_spawn_countdown(&session, &guard, &report);
    Ok(Some(report))
}

/// One texture-analysis tick, ~2 Hz.
#[command]
pub async fn scan_texture_tick(
    session_id: String,
    frame: FrameBuffer,
) -> Result<Option<TickReport>, String> {
    check_frame(&frame)?;
    let session = get_session(&session_id).await?;

    let guard = session.try_lock();
    let mut guard = match guard {
        Ok(guard) => guard,
        Err(std::sync::TryLockError::WouldBlock) => return Ok(None),
        Err(_) => return Err("lock poisoned".to_string()),
    };

    let report = guard.texture_tick(&frame).map_err(|e| e.to_string())?;
    maybe_spawn_countdown(&session, &guard, &report);
    Ok(Some(report))
}

/// Explicit shutter for manual steps.
#[command]
pub async fn scan_manual_shutter(session_id: String) -> Result<TickReport, String> {
    let session = get_session(&session_id).await?;
    let mut guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
    let report = guard.manual_shutter().map_err(|e| e.to_string())?;
    maybe_spawn_countdown(&session, &guard, &report);
    Ok(report)
}

/// Confirm the pending review artifact. Returns the session outcome when
/// the final step was confirmed; the session is closed and removed then.
#[command]
pub async fn scan_confirm_step(session_id: String) -> Result<Option<SessionOutcome>, String> {
    let session = get_session(&session_id).await?;
    let outcome = {
        let mut guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
        guard.confirm().map_err(|e| e.to_string())?
    };

    if outcome.is_some() {
        let mut registry = SESSION_REGISTRY.write().await;
        registry.remove(&session_id);
    }
    Ok(outcome)
}

/// Discard the pending review artifact and resume guidance.
#[command]
pub async fn scan_retake_step(session_id: String) -> Result<TickReport, String> {
    let session = get_session(&session_id).await?;
    let mut guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
    guard.retake().map_err(|e| e.to_string())
}

/// Tear the session down and remove it from the registry.
#[command]
pub async fn exit_scan_session(session_id: String) -> Result<(), String> {
    let session = {
        let mut registry = SESSION_REGISTRY.write().await;
        registry.remove(&session_id)
    };

    match session {
        Some(session) => {
            let mut guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
            guard.exit().map_err(|e| e.to_string())
        }
        None => Err(format!("Session not found: {}", session_id)),
    }
}

/// Debug short-circuit: finish immediately with whatever is confirmed.
#[command]
pub async fn scan_debug_complete(session_id: String) -> Result<SessionOutcome, String> {
    let session = {
        let mut registry = SESSION_REGISTRY.write().await;
        registry.remove(&session_id)
    };

    match session {
        Some(session) => {
            let mut guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
            guard.debug_complete().map_err(|e| e.to_string())
        }
        None => Err(format!("Session not found: {}", session_id)),
    }
}

/// Session-scoped mute for tones and speech; haptics stay on.
#[command]
pub async fn set_scan_muted(session_id: String, muted: bool) -> Result<(), String> {
    let session = get_session(&session_id).await?;
    let guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
    guard.set_muted(muted);
    Ok(())
}

/// Digital zoom; unsupported factors soft-fail on the camera side.
#[command]
pub async fn set_scan_zoom(session_id: String, factor: f32) -> Result<(), String> {
    let session = get_session(&session_id).await?;
    let mut guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
    guard.set_zoom(factor);
    Ok(())
}

/// Torch toggle for dark donor-area shots.
#[command]
pub async fn set_scan_torch(session_id: String, on: bool) -> Result<(), String> {
    let session = get_session(&session_id).await?;
    let mut guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
    guard.set_torch(on);
    Ok(())
}

/// Brightness/contrast adjustment applied to the active camera track.
#[command]
pub async fn set_scan_adjustments(
    session_id: String,
    brightness: f32,
    contrast: f32,
) -> Result<(), String> {
    let session = get_session(&session_id).await?;
    let mut guard = session.lock().map_err(|_| "lock poisoned".to_string())?;
    guard.set_adjustments(brightness, contrast);
    Ok(())
}

fn maybe_spawn_countdown(
    session: &Arc<SyncMutex<CaptureSession>>,
    guard: &CaptureSession,
    report: &TickReport,
) {
    if report.countdown_started {
        let cancel = guard.cancel_token();
        tokio::spawn(run_countdown(Arc::clone(session), cancel));
    }
}
