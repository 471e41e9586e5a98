//! mesotrack - Personal gym tracker with mesocycle progress

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use mesotrack::db::Database;
use mesotrack::format::{format_date, format_date_short, format_duration, format_status, format_week};
use mesotrack::mesocycle::{BlockCompleteNotice, ConfigUpdate, Notifier};
use mesotrack::models::{Exercise, parse_timestamp};
use mesotrack::tracker::{LogNotifier, Tracker, performed_from};
use mesotrack::tui::App;

#[derive(Parser)]
#[command(name = "mesotrack")]
#[command(author, version, about = "Gym tracker with mesocycle progress")]
struct Cli {
    /// SQLite database path
    #[arg(long, env = "MESOTRACK_DB", default_value = "mesotrack.db", global = true)]
    db: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Manage routines
    #[command(subcommand)]
    Routine(RoutineCommand),

    /// Log a workout against a routine
    Log {
        /// Routine id
        routine: String,

        /// Session duration in minutes
        #[arg(short, long, default_value = "60")]
        minutes: u64,

        /// Performed sets that differ from the targets, e.g. "Bench=62.5x6,60x8"
        #[arg(short, long = "set")]
        sets: Vec<Exercise>,

        /// When the workout happened (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_date)]
        at: Option<DateTime<Utc>>,
    },

    /// List workout history
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show one workout
    Show {
        /// Workout id
        workout: String,
    },

    /// Mesocycle progress and block lifecycle
    #[command(subcommand)]
    Meso(MesoCommand),
}

#[derive(Subcommand)]
enum RoutineCommand {
    /// Create a routine
    Add {
        name: String,

        /// Mesocycle the routine rotates in
        #[arg(short, long)]
        mesocycle: Option<String>,

        /// Exercise with target sets, e.g. "Bench=60x8,60x8@8-12" (repeatable)
        #[arg(short, long = "exercise")]
        exercises: Vec<Exercise>,
    },

    /// List routines
    List {
        /// Only routines of this mesocycle, in rotation order
        #[arg(short, long)]
        mesocycle: Option<String>,
    },

    /// Delete a routine (its workouts stay in the history)
    Delete { id: String },
}

#[derive(Subcommand)]
enum MesoCommand {
    /// Progress of every mesocycle
    List,

    /// Detailed progress of one mesocycle
    Status { name: String },

    /// Set block length or start date
    Config {
        name: String,

        /// Planned block length in weeks
        #[arg(short, long)]
        weeks: Option<u32>,

        /// Start counting workouts from this instant (RFC 3339, or "now")
        #[arg(long)]
        start: Option<String>,

        /// Clear the start date
        #[arg(long, conflicts_with = "start")]
        clear_start: bool,
    },

    /// Close the current week
    CompleteWeek { name: String },

    /// Finish the block and start a new one
    Reset {
        name: String,

        /// Length of the new block, defaults to the current one
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        weeks: Option<u32>,
    },
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(s).ok_or_else(|| format!("'{}' is not an RFC 3339 timestamp", s))
}

/// Prints block completion to the terminal
struct PrintNotifier;

impl Notifier for PrintNotifier {
    fn block_complete(&self, notice: &BlockCompleteNotice) {
        println!();
        println!("*** {}", notice.message());
        println!("    Run `mesotrack meso reset \"{}\"` to begin the next block.", notice.mesocycle);
    }
}

fn print_progress(tracker: &Tracker<Database>, name: &str, detailed: bool) -> Result<()> {
    let progress = tracker.progress(name)?;
    println!(
        "{:20} | {:14} | {}/{} routines | {}",
        name,
        format_week(&progress),
        progress.completed_count(),
        progress.total_routines,
        format_status(&progress)
    );

    if detailed {
        let routines = tracker.routines_in(name)?;
        for routine in &routines {
            let mark = if progress.completed_routine_ids.contains(&routine.id) { "x" } else { " " };
            let next = if progress.next_routine_id() == Some(routine.id.as_str()) { " <- next" } else { "" };
            println!("  [{}] {} ({}){}", mark, routine.name, routine.id, next);
        }
        if let Some(config) = tracker.config(name)? {
            println!(
                "  block {} | started: {}",
                config.completed_cycle_count.saturating_add(1),
                config.start_date.as_deref().map(format_date).unwrap_or_else(|| "not yet".to_string())
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let db = Database::open(&cli.db)?;
    // Printing would corrupt the TUI screen
    let notifier: Box<dyn Notifier> = match cli.command {
        Some(Commands::Tui) | None => Box::new(LogNotifier),
        _ => Box::new(PrintNotifier),
    };
    let tracker = Tracker::new(db, notifier);

    match cli.command {
        Some(Commands::Tui) | None => {
            let mut app = App::new(tracker)?;
            app.run()?;
        }

        Some(Commands::Routine(RoutineCommand::Add { name, mesocycle, exercises })) => {
            let routine = tracker.create_routine(&name, mesocycle.as_deref(), exercises, Utc::now())?;
            println!(
                "Created: {} [{}] - {} exercises (id: {})",
                routine.name,
                routine.mesocycle,
                routine.exercises.len(),
                routine.id
            );
        }

        Some(Commands::Routine(RoutineCommand::List { mesocycle })) => {
            let routines = match mesocycle {
                Some(m) => tracker.routines_in(&m)?,
                None => tracker.routines()?,
            };
            println!("{:-<60}", "");
            for r in &routines {
                println!("{:20} | {:15} | {:2} exercises | {}", r.name, r.mesocycle, r.exercises.len(), r.id);
                if let Some(last) = tracker.last_workout_for(&r.id)? {
                    println!("{:20}   last: {}", "", format_date_short(&last.date));
                }
            }
        }

        Some(Commands::Routine(RoutineCommand::Delete { id })) => {
            let removed = tracker.delete_routine(&id)?;
            println!("Deleted: {} (history kept)", removed.name);
        }

        Some(Commands::Log { routine, minutes, sets, at }) => {
            let target = tracker.routine(&routine)?;
            let performed = (!sets.is_empty()).then(|| performed_from(&target, &sets));
            let workout = tracker.log_workout(
                &routine,
                at.unwrap_or_else(Utc::now),
                minutes * 60,
                performed,
            )?;
            println!("Logged: {} - {} (id: {})", workout.routine_name, format_duration(workout.duration), workout.id);
            print_progress(&tracker, &target.mesocycle, false)?;
        }

        Some(Commands::History { limit }) => {
            let workouts = tracker.workouts()?;
            println!("Recent workouts:");
            println!("{:-<60}", "");
            for w in workouts.iter().take(limit) {
                println!(
                    "{} | {:20} | {:>8} | {:>8.0} kg | {}",
                    format_date(&w.date),
                    w.routine_name,
                    format_duration(w.duration),
                    w.volume(),
                    w.id
                );
            }
        }

        Some(Commands::Show { workout }) => {
            let w = tracker.workout(&workout)?;
            println!("{} - {}", w.routine_name, format_date(&w.date));
            println!("Duration: {}", format_duration(w.duration));
            println!("{:-<40}", "");
            for ex in &w.exercises {
                let sets: Vec<String> = ex.sets.iter().map(|s| format!("{}x{}", s.weight, s.reps)).collect();
                println!("{:20} {}", ex.name, sets.join(", "));
                if let Some(range) = &ex.rep_range {
                    println!("{:20} reps: {}", "", range);
                }
                if let Some(technique) = &ex.technique {
                    println!("{:20} technique: {}", "", technique);
                }
                if let Some(notes) = &ex.notes {
                    println!("{:20} notes: {}", "", notes);
                }
            }
        }

        Some(Commands::Meso(MesoCommand::List)) => {
            println!("Mesocycles");
            println!("{:-<60}", "");
            for name in tracker.mesocycle_names()? {
                print_progress(&tracker, &name, false)?;
            }
        }

        Some(Commands::Meso(MesoCommand::Status { name })) => {
            print_progress(&tracker, &name, true)?;
        }

        Some(Commands::Meso(MesoCommand::Config { name, weeks, start, clear_start })) => {
            let start_date = match (start.as_deref(), clear_start) {
                (_, true) => Some(None),
                (Some("now"), false) => Some(Some(Utc::now().to_rfc3339())),
                (Some(s), false) => {
                    parse_date(s).map_err(anyhow::Error::msg).context("invalid --start")?;
                    Some(Some(s.to_string()))
                }
                (None, false) => None,
            };
            let update = ConfigUpdate {
                duration_weeks: weeks,
                start_date,
                ..Default::default()
            };
            let config = tracker.configure(&name, update)?;
            println!("{}: {} weeks, started: {}", name, config.duration_weeks, config.start_date.as_deref().unwrap_or("not yet"));
        }

        Some(Commands::Meso(MesoCommand::CompleteWeek { name })) => {
            let config = tracker.complete_week(&name, Utc::now())?;
            println!("{}: week {} of {} closed", name, config.completed_weeks_in_cycle, config.duration_weeks);
            print_progress(&tracker, &name, false)?;
        }

        Some(Commands::Meso(MesoCommand::Reset { name, weeks })) => {
            let config = tracker.reset_block(&name, weeks)?;
            println!(
                "{}: block {} starts with the next workout ({} weeks)",
                name,
                config.completed_cycle_count.saturating_add(1),
                config.duration_weeks
            );
        }
    }

    Ok(())
}
