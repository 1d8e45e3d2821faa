//! Capture-time quality scoring.
//!
//! Recomputed on the cropped output rather than the coarse analysis buffer.
//! The score is bounded to [0,100]: sharpness forms the base, under- and
//! over-exposed results are penalized proportionally to how far the mean
//! luma sits outside the configured knees.

use crate::config::CaptureConfig;
use crate::quality::analyzer::FrameQualityStats;

/// Derive a bounded quality score from crop stats.
pub fn score_capture(stats: &FrameQualityStats, cfg: &CaptureConfig) -> f32 {
    let base = stats.sharpness.clamp(0.0, 100.0);

    let penalty = if stats.brightness < cfg.low_brightness_knee {
        // Scale up to a 50-point penalty at pitch black.
        let deficit = (cfg.low_brightness_knee - stats.brightness) / cfg.low_brightness_knee;
        deficit.clamp(0.0, 1.0) * 50.0
    } else if stats.brightness > cfg.high_brightness_knee {
        let headroom = 255.0 - cfg.high_brightness_knee;
        let excess = (stats.brightness - cfg.high_brightness_knee) / headroom.max(1.0);
        excess.clamp(0.0, 1.0) * 50.0
    } else {
        0.0
    };

    (base - penalty).clamp(0.0, 100.0)
}
