/// Frame quality heuristics
///
/// Cheap per-tick brightness and sharpness estimation over a sampled
/// sub-region, plus the capture-time scoring applied to the cropped output.
/// All functions here are pure over the pixel input.
pub mod analyzer;
pub mod score;

pub use analyzer::{FrameQualityStats, QualityAnalyzer, Region};
pub use score::score_capture;
