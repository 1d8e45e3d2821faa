/// Face pose estimation from landmark geometry
///
/// Converts one landmark frame from the external tracker into degree-like
/// yaw/pitch estimates and compares them against a step's target window.
/// The tracker itself is a black box; only the normalized 2D point set and
/// a handful of well-known indices are assumed here.
pub mod evaluator;
pub mod landmarks;

pub use evaluator::{DirectionHint, PoseEstimate, PoseEvaluator};
pub use landmarks::{LandmarkFrame, Point2};
