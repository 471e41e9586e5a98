//! Records persisted by the tracker: routines, workouts, mesocycle configs

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mesocycle assigned to routines that never had one
pub const DEFAULT_MESOCYCLE: &str = "General";

/// Block length used when a config is created implicitly
pub const DEFAULT_DURATION_WEEKS: u32 = 4;

/// Mesocycle name -> config. Ordered so stored snapshots are stable.
pub type MesocycleConfigs = BTreeMap<String, MesocycleConfig>;

/// Stored form of a mesocycle name: trimmed, "General" when blank
pub fn mesocycle_name(raw: &str) -> &str {
    let name = raw.trim();
    if name.is_empty() { DEFAULT_MESOCYCLE } else { name }
}

fn default_duration_weeks() -> u32 {
    DEFAULT_DURATION_WEEKS
}

/// Parse an RFC 3339 timestamp, `None` when malformed
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

/// One target (or performed) set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetTarget {
    pub weight: f64,
    pub reps: u32,
}

impl FromStr for SetTarget {
    type Err = anyhow::Error;

    /// `60x8`, `62.5x6`
    fn from_str(s: &str) -> Result<Self> {
        let (weight, reps) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow!("expected WEIGHTxREPS, got '{}'", s))?;
        Ok(Self {
            weight: weight.trim().parse().with_context(|| format!("bad weight in '{}'", s))?,
            reps: reps.trim().parse().with_context(|| format!("bad reps in '{}'", s))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<SetTarget>,
    /// Technique for the last set (drop set, rest-pause...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,
    /// Expected rep range, e.g. "8-12"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl FromStr for Exercise {
    type Err = anyhow::Error;

    /// `Bench Press=60x8,62.5x6@8-12`. The id is left empty for the caller to assign.
    fn from_str(s: &str) -> Result<Self> {
        let (name, rest) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected NAME=WxR,..., got '{}'", s))?;
        let name = name.trim();
        if name.is_empty() {
            bail!("exercise name is empty in '{}'", s);
        }

        let (sets, rep_range) = match rest.split_once('@') {
            Some((sets, range)) => (sets, Some(range.trim().to_string())),
            None => (rest, None),
        };

        let sets = sets
            .split(',')
            .filter(|p| !p.trim().is_empty())
            .map(SetTarget::from_str)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: String::new(),
            name: name.to_string(),
            sets,
            technique: None,
            rep_range: rep_range.filter(|r| !r.is_empty()),
            notes: None,
            video_url: None,
        })
    }
}

/// Reusable workout template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    /// Blank in legacy data, normalized on load
    #[serde(default)]
    pub mesocycle: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    pub created_at: String,
}

impl Routine {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// Frozen copy of an exercise as performed in a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<SetTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&Exercise> for WorkoutExercise {
    fn from(exercise: &Exercise) -> Self {
        Self {
            id: exercise.id.clone(),
            name: exercise.name.clone(),
            sets: exercise.sets.clone(),
            technique: exercise.technique.clone(),
            rep_range: exercise.rep_range.clone(),
            notes: exercise.notes.clone(),
        }
    }
}

/// Immutable log entry of one completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub routine_id: String,
    /// Survives routine rename/deletion
    pub routine_name: String,
    pub date: String,
    /// Seconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
}

impl Workout {
    pub fn date(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }

    /// Total volume (weight * reps) across all sets
    pub fn volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .map(|s| s.weight * s.reps as f64)
            .sum()
    }
}

/// Persisted state of one mesocycle's current block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MesocycleConfig {
    #[serde(default = "default_duration_weeks")]
    pub duration_weeks: u32,
    /// When the active block began counting workouts. `None` = not started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default)]
    pub completed_cycle_count: u32,
    /// Weeks finished in all prior blocks, keeps week numbers continuous
    #[serde(default)]
    pub week_offset: u32,
    /// Weeks explicitly closed inside the current block
    #[serde(default)]
    pub completed_weeks_in_cycle: u32,
}

impl Default for MesocycleConfig {
    fn default() -> Self {
        Self {
            duration_weeks: DEFAULT_DURATION_WEEKS,
            start_date: None,
            completed_cycle_count: 0,
            week_offset: 0,
            completed_weeks_in_cycle: 0,
        }
    }
}

impl MesocycleConfig {
    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date.as_deref().and_then(parse_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_target() {
        let set: SetTarget = "62.5x6".parse().unwrap();
        assert_eq!(set, SetTarget { weight: 62.5, reps: 6 });
    }

    #[test]
    fn test_parse_set_target_invalid() {
        assert!("60-8".parse::<SetTarget>().is_err());
        assert!("abcx8".parse::<SetTarget>().is_err());
    }

    #[test]
    fn test_parse_exercise_with_rep_range() {
        let ex: Exercise = "Bench Press=60x8, 62.5x6@8-12".parse().unwrap();
        assert_eq!(ex.name, "Bench Press");
        assert_eq!(ex.sets.len(), 2);
        assert_eq!(ex.sets[1].weight, 62.5);
        assert_eq!(ex.rep_range.as_deref(), Some("8-12"));
    }

    #[test]
    fn test_parse_exercise_without_name() {
        assert!("=60x8".parse::<Exercise>().is_err());
        assert!("Squat".parse::<Exercise>().is_err());
    }

    #[test]
    fn test_routine_json_uses_camel_case() {
        let routine = Routine {
            id: "r1".to_string(),
            name: "Push".to_string(),
            mesocycle: "Hypertrophy".to_string(),
            exercises: vec![],
            created_at: "2024-01-01T08:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&routine).unwrap();
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn test_legacy_routine_without_mesocycle() {
        let json = r#"{"id":"r1","name":"Push","exercises":[],"createdAt":"2024-01-01T08:00:00Z"}"#;
        let routine: Routine = serde_json::from_str(json).unwrap();
        assert!(routine.mesocycle.is_empty());
    }

    #[test]
    fn test_config_defaults_for_missing_fields() {
        let config: MesocycleConfig = serde_json::from_str(r#"{"durationWeeks":6}"#).unwrap();
        assert_eq!(config.duration_weeks, 6);
        assert_eq!(config.week_offset, 0);
        assert!(config.start_date.is_none());
    }

    #[test]
    fn test_config_without_duration_uses_default() {
        let config: MesocycleConfig =
            serde_json::from_str(r#"{"startDate":"2024-03-04T06:00:00Z","weekOffset":4}"#).unwrap();
        assert_eq!(config.duration_weeks, DEFAULT_DURATION_WEEKS);
        assert_eq!(config.week_offset, 4);
    }

    #[test]
    fn test_mesocycle_name() {
        assert_eq!(mesocycle_name(" Strength "), "Strength");
        assert_eq!(mesocycle_name("   "), "General");
        assert_eq!(mesocycle_name("Hypertrophy"), "Hypertrophy");
    }

    #[test]
    fn test_unparseable_start_date() {
        let config = MesocycleConfig {
            start_date: Some("not a date".to_string()),
            ..Default::default()
        };
        assert!(config.start_date().is_none());
    }

    #[test]
    fn test_workout_volume() {
        let workout = Workout {
            id: "w1".to_string(),
            routine_id: "r1".to_string(),
            routine_name: "Push".to_string(),
            date: "2024-01-01T08:00:00Z".to_string(),
            duration: 3600,
            exercises: vec![WorkoutExercise {
                id: "e1".to_string(),
                name: "Bench".to_string(),
                sets: vec![SetTarget { weight: 60.0, reps: 8 }, SetTarget { weight: 50.0, reps: 10 }],
                technique: None,
                rep_range: None,
                notes: None,
            }],
        };
        assert_eq!(workout.volume(), 980.0);
    }
}
