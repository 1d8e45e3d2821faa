//! ScanGuide: guided biometric photo capture for Tauri applications
//!
//! This crate walks a user through a fixed sequence of capture steps
//! (frontal portrait, profiles, crown, close-ups), evaluating head pose and
//! image texture on live frames and coaching the user into position before
//! capturing, blurring, and accumulating one photo per step.
//!
//! # Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! scanguide = "0.3"
//! tauri = "2.0"
//! ```
//!
//! Then in your Tauri app:
//! ```rust,ignore
//! use scanguide;
//!
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(scanguide::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! The host shell owns the camera and the pose tracker; it feeds frames and
//! landmark sets in through the tick commands and renders the guidance
//! status, hold progress, and direction hints each tick returns.
pub mod commands;
pub mod config;
pub mod errors;
pub mod feedback;
pub mod guidance;
pub mod pose;
pub mod quality;
pub mod sampler;
pub mod session;
pub mod steps;
pub mod timing;
pub mod transform;
pub mod types;

// Testing utilities - synthetic frames and landmarks for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::ScanConfig;
pub use errors::ScanError;
pub use guidance::{GuidanceMachine, GuidanceStatus};
pub use pose::{DirectionHint, LandmarkFrame, PoseEstimate, PoseEvaluator};
pub use quality::{FrameQualityStats, QualityAnalyzer};
pub use session::{CameraControl, CaptureSession, NullCamera, TickReport};
pub use steps::default_steps;
pub use types::{
    CameraFacing, CaptureStep, CapturedPhoto, FitMode, FrameBuffer, GuideShape, PoseWindow,
    SessionOutcome, StepMode,
};

use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the ScanGuide plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("scanguide")
        .invoke_handler(tauri::generate_handler![
            // Session lifecycle
            commands::open_scan_session,
            commands::exit_scan_session,
            commands::scan_debug_complete,
            // Tick loop
            commands::set_scan_framing,
            commands::scan_pose_tick,
            commands::scan_texture_tick,
            // Capture flow
            commands::scan_manual_shutter,
            commands::scan_confirm_step,
            commands::scan_retake_step,
            // Session controls
            commands::set_scan_muted,
            commands::set_scan_zoom,
            commands::set_scan_torch,
            commands::set_scan_adjustments,
        ])
        .build()
}

/// Initialize logging for the capture pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "scanguide=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        step_count: default_steps().len(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub step_count: usize,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "scanguide");
        assert!(!info.version.is_empty());
        assert_eq!(info.step_count, default_steps().len());
    }

    #[test]
    fn test_default_steps_nonempty() {
        assert!(!default_steps().is_empty());
    }
}
