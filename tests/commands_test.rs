//! Command Surface Testing
//!
//! Exercises the IPC layer directly: session lifecycle through the
//! registry, frame validation at the boundary, and error strings for
//! unknown sessions. Frames arrive over IPC as plain structs, so the
//! buffer/dimension agreement enforced by the constructor has to be
//! re-checked here.

use scanguide::commands::{
    exit_scan_session, open_scan_session, scan_pose_tick, scan_texture_tick, set_scan_framing,
};
use scanguide::testing::flat_frame;
use scanguide::types::{FitMode, FrameBuffer, Rect};

#[tokio::test]
async fn test_session_lifecycle_and_ticks() {
    let id = open_scan_session(None).await.unwrap();

    set_scan_framing(
        id.clone(),
        Rect::new(80.0, 60.0, 160.0, 120.0),
        320.0,
        240.0,
        FitMode::Contain,
    )
    .await
    .unwrap();

    let report = scan_texture_tick(id.clone(), flat_frame(160, 120, 128))
        .await
        .unwrap()
        .expect("uncontended tick is processed");
    assert!(!report.skipped);

    exit_scan_session(id.clone()).await.unwrap();
    // The session is gone from the registry afterwards.
    assert!(exit_scan_session(id).await.is_err());
}

#[tokio::test]
async fn test_malformed_frames_rejected_at_boundary() {
    let id = open_scan_session(None).await.unwrap();

    // Buffer shorter than the claimed dimensions; deserialization would
    // happily produce this, so the command must refuse it.
    let short = FrameBuffer {
        width: 64,
        height: 64,
        data: vec![0u8; 10],
    };

    let err = scan_texture_tick(id.clone(), short.clone())
        .await
        .unwrap_err();
    assert!(err.contains("Malformed frame"));

    let err = scan_pose_tick(id.clone(), None, short).await.unwrap_err();
    assert!(err.contains("Malformed frame"));

    // The session survives the rejection and keeps accepting good frames.
    let report = scan_texture_tick(id.clone(), flat_frame(160, 120, 128))
        .await
        .unwrap();
    assert!(report.is_some());

    exit_scan_session(id).await.unwrap();
}

#[tokio::test]
async fn test_unknown_session_reported() {
    let err = scan_texture_tick("not-a-session".to_string(), flat_frame(16, 16, 0))
        .await
        .unwrap_err();
    assert!(err.contains("Session not found"));
}
