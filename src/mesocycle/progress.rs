//! Mesocycle progress snapshot
//!
//! A "week" is one pass through the mesocycle's routine sequence, not a
//! calendar week. Every routine logged at least once since the block's
//! start date counts as done for the current week, regardless of order or
//! repetition. Weeks are closed explicitly (see `lifecycle::complete_week`).

use std::collections::HashSet;

use crate::models::{MesocycleConfig, Routine, Workout};

use super::sequence::sequence;

/// Derived, read-only view of a mesocycle. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MesocycleProgress {
    /// Weeks closed inside the current block
    pub weeks_completed: u32,
    /// 1-based, continuous across blocks
    pub current_week_number: u32,
    /// Denominator for "week X of Y"
    pub display_total_weeks: u32,
    pub total_routines: usize,
    /// In sequence order
    pub completed_routine_ids: Vec<String>,
    /// In sequence order
    pub remaining_routine_ids: Vec<String>,
    pub last_routine_id: Option<String>,
    pub is_week_complete: bool,
    pub is_mesocycle_complete: bool,
}

impl MesocycleProgress {
    /// Routine to suggest next: first pending one in the rotation
    pub fn next_routine_id(&self) -> Option<&str> {
        self.remaining_routine_ids.first().map(String::as_str)
    }

    pub fn completed_count(&self) -> usize {
        self.completed_routine_ids.len()
    }
}

/// Compute the progress snapshot for `mesocycle`.
///
/// Never fails: a missing config, a missing or malformed start date, or a
/// block with no qualifying workouts all yield the "not started" snapshot.
pub fn compute_progress(
    mesocycle: &str,
    routines: &[Routine],
    workouts: &[Workout],
    config: Option<&MesocycleConfig>,
) -> MesocycleProgress {
    let seq = sequence(mesocycle, routines);
    let base = base_progress(&seq, config);

    let Some(config) = config else {
        return base;
    };
    if seq.is_empty() {
        return base;
    }
    let Some(start) = config.start_date() else {
        return base;
    };

    let in_sequence: HashSet<&str> = seq.iter().map(|r| r.id.as_str()).collect();

    let mut relevant: Vec<_> = workouts
        .iter()
        .filter(|w| in_sequence.contains(w.routine_id.as_str()))
        .filter_map(|w| w.date().filter(|d| *d >= start).map(|d| (d, w)))
        .collect();

    if relevant.is_empty() {
        return base;
    }
    relevant.sort_by_key(|(date, _)| *date);

    let done: HashSet<&str> = relevant.iter().map(|(_, w)| w.routine_id.as_str()).collect();
    let last_routine_id = relevant.last().map(|(_, w)| w.routine_id.clone());

    let (completed, remaining): (Vec<&Routine>, Vec<&Routine>) =
        seq.iter().copied().partition(|r| done.contains(r.id.as_str()));

    let is_week_complete = remaining.is_empty();
    let planned = config.duration_weeks;
    let is_mesocycle_complete = base.is_mesocycle_complete
        || (planned > 0 && is_week_complete && config.completed_weeks_in_cycle.saturating_add(1) >= planned);

    MesocycleProgress {
        completed_routine_ids: completed.iter().map(|r| r.id.clone()).collect(),
        remaining_routine_ids: remaining.iter().map(|r| r.id.clone()).collect(),
        last_routine_id,
        is_week_complete,
        is_mesocycle_complete,
        ..base
    }
}

/// Snapshot for a block that hasn't accrued any workouts yet
fn base_progress(seq: &[&Routine], config: Option<&MesocycleConfig>) -> MesocycleProgress {
    let weeks_completed = config.map_or(0, |c| c.completed_weeks_in_cycle);
    let week_offset = config.map_or(0, |c| c.week_offset);
    let planned = config.map_or(0, |c| c.duration_weeks);
    let display_total_weeks = planned.saturating_add(week_offset);

    let in_progress = u32::from(!seq.is_empty());
    let mut current_week_number = week_offset
        .saturating_add(weeks_completed)
        .saturating_add(in_progress);
    if planned > 0 {
        current_week_number = current_week_number.min(display_total_weeks);
    }

    MesocycleProgress {
        weeks_completed,
        current_week_number,
        display_total_weeks,
        total_routines: seq.len(),
        completed_routine_ids: Vec::new(),
        remaining_routine_ids: seq.iter().map(|r| r.id.clone()).collect(),
        last_routine_id: None,
        is_week_complete: false,
        is_mesocycle_complete: planned > 0 && weeks_completed >= planned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: &str = "2024-03-04T06:00:00Z";

    fn routine(id: &str, created_at: &str) -> Routine {
        Routine {
            id: id.to_string(),
            name: id.to_uppercase(),
            mesocycle: "Hypertrophy".to_string(),
            exercises: vec![],
            created_at: created_at.to_string(),
        }
    }

    /// A, B, C created in that order
    fn abc() -> Vec<Routine> {
        vec![
            routine("c", "2024-01-01T10:00:00Z"),
            routine("a", "2024-01-01T08:00:00Z"),
            routine("b", "2024-01-01T09:00:00Z"),
        ]
    }

    fn workout(routine_id: &str, date: &str) -> Workout {
        Workout {
            id: format!("{}-{}", routine_id, date),
            routine_id: routine_id.to_string(),
            routine_name: routine_id.to_uppercase(),
            date: date.to_string(),
            duration: 3600,
            exercises: vec![],
        }
    }

    fn started(weeks_done: u32) -> MesocycleConfig {
        MesocycleConfig {
            duration_weeks: 4,
            start_date: Some(T0.to_string()),
            completed_weeks_in_cycle: weeks_done,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_routines() {
        let workouts = vec![workout("a", "2024-03-05T06:00:00Z")];
        let p = compute_progress("Hypertrophy", &[], &workouts, Some(&started(0)));
        assert_eq!(p.total_routines, 0);
        assert!(!p.is_week_complete);
        assert!(!p.is_mesocycle_complete);
        assert_eq!(p.current_week_number, 0);
    }

    #[test]
    fn test_no_config_is_not_started() {
        let workouts = vec![workout("a", "2024-03-05T06:00:00Z")];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, None);
        assert_eq!(p.current_week_number, 1);
        assert_eq!(p.display_total_weeks, 0);
        assert_eq!(p.remaining_routine_ids, vec!["a", "b", "c"]);
        assert!(p.completed_routine_ids.is_empty());
        assert!(p.last_routine_id.is_none());
    }

    #[test]
    fn test_no_start_date_ignores_history() {
        let config = MesocycleConfig::default();
        let workouts = vec![
            workout("a", "2024-03-05T06:00:00Z"),
            workout("b", "2024-03-06T06:00:00Z"),
            workout("c", "2024-03-07T06:00:00Z"),
        ];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&config));
        assert!(p.completed_routine_ids.is_empty());
        assert!(!p.is_week_complete);
        assert_eq!(p.display_total_weeks, 4);
    }

    #[test]
    fn test_malformed_start_date_is_not_started() {
        let config = MesocycleConfig {
            start_date: Some("03/04/2024".to_string()),
            ..Default::default()
        };
        let workouts = vec![workout("a", "2024-03-05T06:00:00Z")];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&config));
        assert!(p.completed_routine_ids.is_empty());
        assert_eq!(p.remaining_routine_ids.len(), 3);
    }

    #[test]
    fn test_workouts_before_start_are_ignored() {
        let workouts = vec![
            workout("a", "2024-03-01T06:00:00Z"),
            workout("b", "2024-03-04T06:00:00Z"), // exactly at start counts
        ];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&started(0)));
        assert_eq!(p.completed_routine_ids, vec!["b"]);
        assert_eq!(p.remaining_routine_ids, vec!["a", "c"]);
    }

    #[test]
    fn test_skipping_a_routine() {
        let workouts = vec![
            workout("a", "2024-03-05T06:00:00Z"),
            workout("c", "2024-03-06T06:00:00Z"),
        ];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&started(0)));
        assert_eq!(p.completed_routine_ids, vec!["a", "c"]);
        assert_eq!(p.remaining_routine_ids, vec!["b"]);
        assert_eq!(p.next_routine_id(), Some("b"));
        assert_eq!(p.last_routine_id.as_deref(), Some("c"));
        assert!(!p.is_week_complete);
        assert!(!p.is_mesocycle_complete);
    }

    #[test]
    fn test_out_of_order_completion_finishes_week() {
        let workouts = vec![
            workout("a", "2024-03-05T06:00:00Z"),
            workout("c", "2024-03-06T06:00:00Z"),
            workout("b", "2024-03-07T06:00:00Z"),
        ];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&started(0)));
        assert!(p.remaining_routine_ids.is_empty());
        assert!(p.is_week_complete);
        assert!(!p.is_mesocycle_complete);
        assert_eq!(p.current_week_number, 1);
        assert!(p.next_routine_id().is_none());
    }

    #[test]
    fn test_final_week_completes_mesocycle() {
        let workouts = vec![
            workout("a", "2024-03-05T06:00:00Z"),
            workout("c", "2024-03-06T06:00:00Z"),
            workout("b", "2024-03-07T06:00:00Z"),
        ];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&started(3)));
        assert_eq!(p.current_week_number, 4);
        assert!(p.is_week_complete);
        assert!(p.is_mesocycle_complete);
    }

    #[test]
    fn test_repeating_a_routine_is_counted_once() {
        let workouts = vec![
            workout("a", "2024-03-05T06:00:00Z"),
            workout("a", "2024-03-06T06:00:00Z"),
        ];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&started(0)));
        assert_eq!(p.completed_routine_ids, vec!["a"]);
        assert_eq!(p.remaining_routine_ids, vec!["b", "c"]);
        assert!(!p.is_week_complete);
    }

    #[test]
    fn test_last_routine_uses_workout_time_not_input_order() {
        let workouts = vec![
            workout("b", "2024-03-07T06:00:00Z"),
            workout("a", "2024-03-05T06:00:00Z"),
        ];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&started(0)));
        assert_eq!(p.last_routine_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_foreign_and_undated_workouts_are_ignored() {
        let workouts = vec![
            workout("deleted-routine", "2024-03-05T06:00:00Z"),
            workout("a", "sometime"),
        ];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&started(0)));
        assert!(p.completed_routine_ids.is_empty());
        assert!(p.last_routine_id.is_none());
    }

    #[test]
    fn test_week_number_continues_across_blocks() {
        let config = MesocycleConfig {
            duration_weeks: 6,
            start_date: None,
            completed_cycle_count: 1,
            week_offset: 4,
            completed_weeks_in_cycle: 0,
        };
        let p = compute_progress("Hypertrophy", &abc(), &[], Some(&config));
        assert_eq!(p.current_week_number, 5);
        assert_eq!(p.display_total_weeks, 10);
    }

    #[test]
    fn test_week_number_is_clamped() {
        let config = MesocycleConfig {
            completed_weeks_in_cycle: 5,
            ..started(0)
        };
        let p = compute_progress("Hypertrophy", &abc(), &[], Some(&config));
        assert_eq!(p.current_week_number, 4);
        assert!(p.is_mesocycle_complete);
    }

    #[test]
    fn test_huge_counters_saturate() {
        let config = MesocycleConfig {
            duration_weeks: 3_000_000_000,
            week_offset: 3_000_000_000,
            completed_weeks_in_cycle: u32::MAX,
            ..started(0)
        };
        let workouts = vec![
            workout("a", "2024-03-05T06:00:00Z"),
            workout("b", "2024-03-06T06:00:00Z"),
            workout("c", "2024-03-07T06:00:00Z"),
        ];
        let p = compute_progress("Hypertrophy", &abc(), &workouts, Some(&config));
        assert_eq!(p.display_total_weeks, u32::MAX);
        assert_eq!(p.current_week_number, u32::MAX);
        assert!(p.is_week_complete);
        assert!(p.is_mesocycle_complete);
    }

    #[test]
    fn test_idempotent() {
        let routines = abc();
        let workouts = vec![
            workout("c", "2024-03-06T06:00:00Z"),
            workout("a", "2024-03-05T06:00:00Z"),
        ];
        let config = started(1);
        let first = compute_progress("Hypertrophy", &routines, &workouts, Some(&config));
        let second = compute_progress("Hypertrophy", &routines, &workouts, Some(&config));
        assert_eq!(first, second);
    }
}
