//! Block lifecycle - the only writer of `MesocycleConfig`
//!
//! Completion is detected automatically when a workout is saved, but a new
//! block only starts on an explicit `reset_block`.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::models::{MesocycleConfig, MesocycleConfigs, Routine, Workout};

use super::progress::compute_progress;

/// Partial config update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
    /// Zero is ignored
    pub duration_weeks: Option<u32>,
    /// `Some(None)` clears the start date
    pub start_date: Option<Option<String>>,
    pub completed_cycle_count: Option<u32>,
    pub week_offset: Option<u32>,
}

impl ConfigUpdate {
    pub fn start_at(date: impl Into<String>) -> Self {
        Self {
            start_date: Some(Some(date.into())),
            ..Default::default()
        }
    }

    pub fn duration(weeks: u32) -> Self {
        Self {
            duration_weeks: Some(weeks),
            ..Default::default()
        }
    }
}

/// Raised when a saved workout closes the final week of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCompleteNotice {
    pub mesocycle: String,
    pub duration_weeks: u32,
    pub display_total_weeks: u32,
}

impl BlockCompleteNotice {
    pub fn message(&self) -> String {
        format!(
            "Mesocycle '{}' complete: all {} weeks done. Start a new block when ready.",
            self.mesocycle, self.duration_weeks
        )
    }
}

/// Notification collaborator (CLI output, TUI status line...)
pub trait Notifier {
    fn block_complete(&self, notice: &BlockCompleteNotice);
}

fn config_key(mesocycle: &str) -> Option<&str> {
    let name = mesocycle.trim();
    if name.is_empty() { None } else { Some(name) }
}

/// Merge `update` into the named config, creating it with defaults if absent.
///
/// Returns `None` (and changes nothing) for a blank name.
pub fn ensure_config<'a>(
    configs: &'a mut MesocycleConfigs,
    mesocycle: &str,
    update: ConfigUpdate,
) -> Option<&'a MesocycleConfig> {
    let Some(name) = config_key(mesocycle) else {
        warn!("Ignoring config update for blank mesocycle name");
        return None;
    };

    let config = configs.entry(name.to_string()).or_insert_with(|| {
        info!(mesocycle = name, "Creating mesocycle config");
        MesocycleConfig::default()
    });

    if let Some(weeks) = update.duration_weeks.filter(|w| *w > 0) {
        config.duration_weeks = weeks;
    }
    if let Some(start_date) = update.start_date {
        config.start_date = start_date;
    }
    if let Some(count) = update.completed_cycle_count {
        config.completed_cycle_count = count;
    }
    if let Some(offset) = update.week_offset {
        config.week_offset = offset;
    }

    debug!(mesocycle = name, ?config, "Config updated");
    Some(config)
}

/// Close the current week: bump the in-block week counter and re-anchor the
/// start date so the next pass through the rotation starts empty.
pub fn complete_week<'a>(
    configs: &'a mut MesocycleConfigs,
    mesocycle: &str,
    now: DateTime<Utc>,
) -> Option<&'a MesocycleConfig> {
    let name = config_key(mesocycle)?;
    let config = configs.entry(name.to_string()).or_default();

    config.completed_weeks_in_cycle = config.completed_weeks_in_cycle.saturating_add(1);
    config.start_date = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));

    info!(
        mesocycle = name,
        weeks = config.completed_weeks_in_cycle,
        of = config.duration_weeks,
        "Week completed"
    );
    Some(config)
}

/// Start a new block. Folds the finished block's length into the week
/// offset, counts the cycle, and clears the start date until the next
/// workout is logged. A zero or missing `new_duration` keeps the old one.
pub fn reset_block<'a>(
    configs: &'a mut MesocycleConfigs,
    mesocycle: &str,
    new_duration: Option<u32>,
) -> Option<&'a MesocycleConfig> {
    let name = config_key(mesocycle)?;
    let config = configs.entry(name.to_string()).or_default();

    config.week_offset = config.week_offset.saturating_add(config.duration_weeks);
    config.completed_cycle_count = config.completed_cycle_count.saturating_add(1);
    config.completed_weeks_in_cycle = 0;
    config.start_date = None;
    if let Some(weeks) = new_duration.filter(|w| *w > 0) {
        config.duration_weeks = weeks;
    }

    info!(
        mesocycle = name,
        cycle = config.completed_cycle_count,
        week_offset = config.week_offset,
        duration_weeks = config.duration_weeks,
        "New block started"
    );
    Some(config)
}

/// Config bookkeeping after `workout` has been persisted.
///
/// `workouts` is the full log including `workout`. Anchors the block's start
/// date to the workout when tracking hasn't started, then returns a notice if
/// this workout is the one that completed the block.
pub fn record_workout_side_effects(
    configs: &mut MesocycleConfigs,
    workout: &Workout,
    routine: &Routine,
    routines: &[Routine],
    workouts: &[Workout],
) -> Option<BlockCompleteNotice> {
    let name = config_key(&routine.mesocycle)?;

    let needs_anchor = configs.get(name).is_none_or(|c| c.start_date().is_none());
    if needs_anchor {
        debug!(mesocycle = name, date = %workout.date, "Anchoring block start to workout");
        ensure_config(configs, name, ConfigUpdate::start_at(workout.date.clone()));
    }

    let config = configs.get(name)?;
    let earlier: Vec<Workout> = workouts
        .iter()
        .filter(|w| w.id != workout.id)
        .cloned()
        .collect();

    let before = compute_progress(name, routines, &earlier, Some(config));
    let after = compute_progress(name, routines, workouts, Some(config));

    let just_completed = after.is_week_complete
        && after.is_mesocycle_complete
        && !before.is_week_complete
        && !before.is_mesocycle_complete;

    if !just_completed {
        return None;
    }

    info!(mesocycle = name, "Block complete");
    Some(BlockCompleteNotice {
        mesocycle: name.to_string(),
        duration_weeks: config.duration_weeks,
        display_total_weeks: after.display_total_weeks,
    })
}
