//! Tracker - routines, workout logging and mesocycle bookkeeping over a store

use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use tracing::info;

use crate::db::{KeyValueStore, Repository};
use crate::mesocycle::lifecycle;
use crate::mesocycle::{
    BlockCompleteNotice, ConfigUpdate, MesocycleProgress, Notifier, compute_progress, sequence,
};
use crate::models::{
    Exercise, MesocycleConfig, MesocycleConfigs, Routine, Workout, WorkoutExercise,
    mesocycle_name,
};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Millisecond timestamp + random suffix, both base 36
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: u64 = rand::thread_rng().r#gen();
    format!("{}{}", to_base36(millis), to_base36(suffix))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Frozen copy of a routine's exercises, with performed sets overridden by
/// name where given
pub fn performed_from(routine: &Routine, overrides: &[Exercise]) -> Vec<WorkoutExercise> {
    routine
        .exercises
        .iter()
        .map(|exercise| {
            let mut performed = WorkoutExercise::from(exercise);
            if let Some(actual) = overrides.iter().find(|o| o.name == exercise.name) {
                performed.sets = actual.sets.clone();
                if actual.notes.is_some() {
                    performed.notes = actual.notes.clone();
                }
            }
            performed
        })
        .collect()
}

/// Notifier that only logs
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn block_complete(&self, notice: &BlockCompleteNotice) {
        info!("{}", notice.message());
    }
}

pub struct Tracker<S> {
    repo: Repository<S>,
    notifier: Box<dyn Notifier>,
}

impl<S: KeyValueStore> Tracker<S> {
    pub fn new(store: S, notifier: Box<dyn Notifier>) -> Self {
        Self {
            repo: Repository::new(store),
            notifier,
        }
    }

    // --- routines ---

    pub fn routines(&self) -> Result<Vec<Routine>> {
        self.repo.load_routines()
    }

    pub fn routine(&self, id: &str) -> Result<Routine> {
        self.routines()?
            .into_iter()
            .find(|r| r.id == id)
            .with_context(|| format!("routine '{}' not found", id))
    }

    /// Routines of one mesocycle in rotation order
    pub fn routines_in(&self, mesocycle: &str) -> Result<Vec<Routine>> {
        let routines = self.routines()?;
        Ok(sequence(mesocycle.trim(), &routines).into_iter().cloned().collect())
    }

    /// Unique mesocycle names, in first-seen order
    pub fn mesocycle_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for routine in self.routines()? {
            if !names.contains(&routine.mesocycle) {
                names.push(routine.mesocycle);
            }
        }
        Ok(names)
    }

    pub fn create_routine(
        &self,
        name: &str,
        mesocycle: Option<&str>,
        exercises: Vec<Exercise>,
        at: DateTime<Utc>,
    ) -> Result<Routine> {
        let name = name.trim();
        if name.is_empty() {
            bail!("routine name is empty");
        }
        let mesocycle = mesocycle_name(mesocycle.unwrap_or_default());

        let exercises = exercises
            .into_iter()
            .map(|mut e| {
                if e.id.is_empty() {
                    e.id = generate_id();
                }
                e
            })
            .collect();

        let routine = Routine {
            id: generate_id(),
            name: name.to_string(),
            mesocycle: mesocycle.to_string(),
            exercises,
            created_at: timestamp(at),
        };

        let mut routines = self.routines()?;
        routines.push(routine.clone());
        self.repo.save_routines(&routines)?;

        info!(id = %routine.id, name = %routine.name, mesocycle = %routine.mesocycle, "Routine created");
        Ok(routine)
    }

    /// Replace a stored routine (matched by id)
    pub fn update_routine(&self, mut routine: Routine) -> Result<()> {
        routine.mesocycle = mesocycle_name(&routine.mesocycle).to_string();
        let mut routines = self.routines()?;
        let slot = routines
            .iter_mut()
            .find(|r| r.id == routine.id)
            .with_context(|| format!("routine '{}' not found", routine.id))?;
        *slot = routine;
        self.repo.save_routines(&routines)
    }

    /// Remove a routine. Its workouts stay in the history.
    pub fn delete_routine(&self, id: &str) -> Result<Routine> {
        let mut routines = self.routines()?;
        let pos = routines
            .iter()
            .position(|r| r.id == id)
            .with_context(|| format!("routine '{}' not found", id))?;
        let removed = routines.remove(pos);
        self.repo.save_routines(&routines)?;

        info!(id, name = %removed.name, "Routine deleted");
        Ok(removed)
    }

    // --- workouts ---

    /// All workouts, newest first
    pub fn workouts(&self) -> Result<Vec<Workout>> {
        let mut workouts = self.repo.load_workouts()?;
        workouts.sort_by_key(|w| std::cmp::Reverse(w.date()));
        Ok(workouts)
    }

    pub fn workout(&self, id: &str) -> Result<Workout> {
        self.repo
            .load_workouts()?
            .into_iter()
            .find(|w| w.id == id)
            .with_context(|| format!("workout '{}' not found", id))
    }

    /// Most recent workout for a routine, used to prefill the next session
    pub fn last_workout_for(&self, routine_id: &str) -> Result<Option<Workout>> {
        Ok(self
            .workouts()?
            .into_iter()
            .find(|w| w.routine_id == routine_id))
    }

    /// Persist a workout against a routine, then update the mesocycle config.
    ///
    /// `performed` defaults to the routine's targets.
    pub fn log_workout(
        &self,
        routine_id: &str,
        at: DateTime<Utc>,
        duration_secs: u64,
        performed: Option<Vec<WorkoutExercise>>,
    ) -> Result<Workout> {
        let routines = self.routines()?;
        let routine = routines
            .iter()
            .find(|r| r.id == routine_id)
            .with_context(|| format!("routine '{}' not found", routine_id))?;

        let workout = Workout {
            id: generate_id(),
            routine_id: routine.id.clone(),
            routine_name: routine.name.clone(),
            date: timestamp(at),
            duration: duration_secs,
            exercises: performed.unwrap_or_else(|| performed_from(routine, &[])),
        };

        let mut workouts = self.repo.load_workouts()?;
        workouts.push(workout.clone());
        self.repo.save_workouts(&workouts)?;
        info!(id = %workout.id, routine = %workout.routine_name, "Workout saved");

        let mut configs = self.repo.load_configs()?;
        let notice = lifecycle::record_workout_side_effects(
            &mut configs,
            &workout,
            routine,
            &routines,
            &workouts,
        );
        self.repo.save_configs(&configs)?;

        if let Some(notice) = notice {
            self.notifier.block_complete(&notice);
        }

        Ok(workout)
    }

    // --- mesocycles ---

    /// Names are looked up trimmed, the same key the lifecycle writes under
    pub fn config(&self, mesocycle: &str) -> Result<Option<MesocycleConfig>> {
        Ok(self.repo.load_configs()?.remove(mesocycle.trim()))
    }

    pub fn progress(&self, mesocycle: &str) -> Result<MesocycleProgress> {
        let mesocycle = mesocycle.trim();
        let routines = self.routines()?;
        let workouts = self.repo.load_workouts()?;
        let config = self.config(mesocycle)?;
        Ok(compute_progress(mesocycle, &routines, &workouts, config.as_ref()))
    }

    pub fn configure(&self, mesocycle: &str, update: ConfigUpdate) -> Result<MesocycleConfig> {
        self.mutate_config(mesocycle, |configs| {
            lifecycle::ensure_config(configs, mesocycle, update).cloned()
        })
    }

    pub fn complete_week(&self, mesocycle: &str, now: DateTime<Utc>) -> Result<MesocycleConfig> {
        self.mutate_config(mesocycle, |configs| {
            lifecycle::complete_week(configs, mesocycle, now).cloned()
        })
    }

    pub fn reset_block(&self, mesocycle: &str, new_duration: Option<u32>) -> Result<MesocycleConfig> {
        self.mutate_config(mesocycle, |configs| {
            lifecycle::reset_block(configs, mesocycle, new_duration).cloned()
        })
    }

    /// Load, mutate and write back the config map; returns the written config
    fn mutate_config<F>(&self, mesocycle: &str, f: F) -> Result<MesocycleConfig>
    where
        F: FnOnce(&mut MesocycleConfigs) -> Option<MesocycleConfig>,
    {
        let mut configs = self.repo.load_configs()?;
        let Some(config) = f(&mut configs) else {
            bail!("mesocycle name '{}' is empty", mesocycle);
        };
        self.repo.save_configs(&configs)?;
        Ok(config)
    }
}
