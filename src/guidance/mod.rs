/// Per-step guidance state machine
///
/// One authoritative status value per session, advanced only through the
/// single transition function in [`machine`]. The machine is pure over its
/// inputs: evaluator output, texture stats, explicit timestamps, and the
/// UI-facing confirm/retake/shutter actions. Timers, feedback, and the
/// capture transform live in the session orchestrator.
pub mod machine;

pub use machine::{Effect, GuidanceEvent, GuidanceMachine, GuidanceStatus};
