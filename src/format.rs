//! Display helpers

use chrono::Local;

use crate::mesocycle::MesocycleProgress;
use crate::models::parse_timestamp;

/// Format duration in seconds to human-readable string
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// "2024-03-04 07:00" in local time, raw input if unparseable
pub fn format_date(date: &str) -> String {
    parse_timestamp(date)
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// "Mar 04"
pub fn format_date_short(date: &str) -> String {
    parse_timestamp(date)
        .map(|d| d.with_timezone(&Local).format("%b %d").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// "week 5 of 10", or "week 1" when no block length is configured
pub fn format_week(progress: &MesocycleProgress) -> String {
    if progress.display_total_weeks > 0 {
        format!("week {} of {}", progress.current_week_number, progress.display_total_weeks)
    } else {
        format!("week {}", progress.current_week_number)
    }
}

pub fn format_status(progress: &MesocycleProgress) -> &'static str {
    if progress.is_mesocycle_complete {
        "block complete"
    } else if progress.is_week_complete {
        "week complete"
    } else if progress.completed_routine_ids.is_empty() {
        "not started"
    } else {
        "in progress"
    }
}
