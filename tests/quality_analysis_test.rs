//! Quality Analysis Testing
//!
//! Test suite for frame quality estimation covering:
//! - Brightness and sharpness calculations on known patterns
//! - Region clamping and degenerate-region behavior
//! - Capture scoring and exposure penalties
//! - Property-based bounds and no-panic guarantees

use proptest::prelude::*;
use scanguide::config::ScanConfig;
use scanguide::quality::{score_capture, FrameQualityStats, QualityAnalyzer, Region};
use scanguide::testing::{checker_frame, flat_frame, gradient_frame};
use scanguide::types::FrameBuffer;

fn analyzer() -> QualityAnalyzer {
    QualityAnalyzer::new(1, 4.0, 0.5)
}

#[test]
fn test_flat_frame_has_no_edge_energy() {
    let stats = analyzer().analyze(&flat_frame(64, 64, 128), None);
    assert!((stats.brightness - 128.0).abs() < 1.0);
    assert_eq!(stats.sharpness, 0.0);
}

#[test]
fn test_checker_saturates_sharpness() {
    let stats = analyzer().analyze(&checker_frame(64, 64, 1), None);
    assert_eq!(stats.sharpness, 100.0);
}

#[test]
fn test_gradient_frame_is_mostly_smooth() {
    // A slow horizontal ramp has tiny per-pixel gradients.
    let stats = analyzer().analyze(&gradient_frame(256, 64), None);
    assert!(stats.sharpness < 30.0);
    assert!(stats.sharpness > 0.0);
}

#[test]
fn test_zero_area_and_out_of_bounds_regions() {
    let frame = flat_frame(32, 32, 100);
    let a = analyzer();

    assert_eq!(
        a.analyze(&frame, Some(Region::new(4, 4, 0, 0))),
        FrameQualityStats::zero()
    );
    assert_eq!(
        a.analyze(&frame, Some(Region::new(64, 64, 16, 16))),
        FrameQualityStats::zero()
    );
    assert_eq!(
        a.analyze(&frame, Some(Region::new(-64, -64, 16, 16))),
        FrameQualityStats::zero()
    );
}

#[test]
fn test_partial_region_clamped_not_rejected() {
    let frame = flat_frame(32, 32, 90);
    let stats = analyzer().analyze(&frame, Some(Region::new(-8, -8, 16, 16)));
    assert!((stats.brightness - 90.0).abs() < 1.0);
}

#[test]
fn test_empty_frame_yields_zero() {
    let frame = FrameBuffer::new(vec![], 0, 0);
    assert_eq!(analyzer().analyze(&frame, None), FrameQualityStats::zero());
}

#[test]
fn test_score_passes_sharpness_through_at_good_exposure() {
    let cfg = ScanConfig::default().capture;
    let stats = FrameQualityStats {
        brightness: 128.0,
        sharpness: 72.0,
    };
    assert_eq!(score_capture(&stats, &cfg), 72.0);
}

#[test]
fn test_score_penalizes_dark_and_blown_frames() {
    let cfg = ScanConfig::default().capture;
    let base = FrameQualityStats {
        brightness: 128.0,
        sharpness: 80.0,
    };
    let dark = FrameQualityStats {
        brightness: 10.0,
        ..base
    };
    let blown = FrameQualityStats {
        brightness: 250.0,
        ..base
    };

    assert!(score_capture(&dark, &cfg) < score_capture(&base, &cfg));
    assert!(score_capture(&blown, &cfg) < score_capture(&base, &cfg));
}

proptest! {
    /// Stats stay inside their documented ranges for any frame content.
    #[test]
    fn analysis_is_bounded(
        width in 1u32..64,
        height in 1u32..64,
        seed in any::<u64>(),
        stride in 1u32..4,
    ) {
        let mut state = seed;
        let data: Vec<u8> = (0..(width * height * 3))
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 56) as u8
            })
            .collect();
        let frame = FrameBuffer::new(data, width, height);

        let stats = QualityAnalyzer::new(stride, 4.0, 0.5).analyze(&frame, None);
        prop_assert!((0.0..=255.0).contains(&stats.brightness));
        prop_assert!((0.0..=100.0).contains(&stats.sharpness));
    }

    /// Arbitrary regions, including hostile ones, never panic.
    #[test]
    fn arbitrary_regions_never_panic(
        x in -200i64..200,
        y in -200i64..200,
        w in -10i64..200,
        h in -10i64..200,
    ) {
        let frame = flat_frame(48, 48, 120);
        let stats = analyzer().analyze(&frame, Some(Region::new(x, y, w, h)));
        prop_assert!(stats.brightness >= 0.0);
    }

    /// Scores are clamped to [0,100] no matter the input stats.
    #[test]
    fn scores_are_clamped(
        brightness in 0.0f32..255.0,
        sharpness in 0.0f32..100.0,
    ) {
        let cfg = ScanConfig::default().capture;
        let score = score_capture(
            &FrameQualityStats { brightness, sharpness },
            &cfg,
        );
        prop_assert!((0.0..=100.0).contains(&score));
    }
}
