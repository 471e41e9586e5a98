//! mesotrack - Personal gym tracker
//!
//! Routines rotate inside named mesocycles (multi-week training blocks);
//! logged workouts drive per-block week and routine progress.

pub mod db;
pub mod format;
pub mod mesocycle;
pub mod models;
pub mod tracker;
pub mod tui;

pub use db::Database;
pub use tracker::Tracker;
