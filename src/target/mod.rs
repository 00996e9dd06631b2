//! Target side: per-target bookkeeping and the apply engine.

pub mod apply;
pub mod state;

pub use apply::{ApplyEngine, ApplyOptions, ApplyOutcome};
pub use state::{TargetState, TARGET_LOCK_FILE, VERSION_FILE};
