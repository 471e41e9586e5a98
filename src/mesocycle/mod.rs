//! Mesocycle tracking - block rotation and progress
//!
//! Features:
//! - Routine sequence per mesocycle (creation order)
//! - Progress snapshot: current week, done/pending routines, completion flags
//! - Block lifecycle: configure, close a week, roll over to a new block

pub mod lifecycle;
pub mod progress;
pub mod sequence;

pub use lifecycle::{
    BlockCompleteNotice, ConfigUpdate, Notifier, complete_week, ensure_config,
    record_workout_side_effects, reset_block,
};
pub use progress::{MesocycleProgress, compute_progress};
pub use sequence::sequence;
