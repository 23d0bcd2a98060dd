use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use liftlog_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Personal workout tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a set against the open workout (starting one if needed)
    Log {
        /// Exercise id
        exercise: String,
        reps: u32,
        weight: f64,
    },

    /// Mark the open workout complete
    Finish,

    /// List exercises, optionally filtered by location
    Exercises {
        #[arg(long)]
        location: Option<String>,
    },

    /// Show weekly volume per muscle group
    Volume {
        /// Number of weeks of history to show
        #[arg(long, default_value_t = 1)]
        weeks: usize,
    },

    /// Show this week's training score
    Score,

    /// Show personal records for an exercise
    Records {
        /// Exercise id
        exercise: String,
    },

    /// Show week-over-week volume trends
    Trends,

    /// Suggest exercises that close this week's shortfalls
    Suggest {
        /// Location to pick exercises for
        #[arg(long, default_value = "gym")]
        location: String,
    },

    /// Export data to stdout or a file
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Import a previously exported JSON document (overwrites collections)
    Import { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    liftlog_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = Store::open(&data_dir)?;

    // Bring the store to the current schema version before anything reads it.
    let outcome = Migrator::new(&store).run()?;
    tracing::debug!("Migration pass finished: {:?}", outcome);

    match cli.command {
        Commands::Log {
            exercise,
            reps,
            weight,
        } => cmd_log(&store, &exercise, reps, weight),
        Commands::Finish => cmd_finish(&store),
        Commands::Exercises { location } => cmd_exercises(&store, location.as_deref()),
        Commands::Volume { weeks } => cmd_volume(&store, weeks),
        Commands::Score => cmd_score(&store),
        Commands::Records { exercise } => cmd_records(&store, &exercise),
        Commands::Trends => cmd_trends(&store),
        Commands::Suggest { location } => cmd_suggest(&store, &location),
        Commands::Export { format, output } => cmd_export(&store, format, output),
        Commands::Import { file } => cmd_import(&store, &file),
    }
}

/// The most recent workout that has not been finished, or a fresh one.
fn open_workout(repos: &Repositories) -> Result<Workout> {
    let mut open: Vec<Workout> = repos
        .workouts()
        .list()
        .into_iter()
        .filter(|w| w.completed_at.is_none())
        .collect();
    open.sort_by_key(|w| w.started_at);

    match open.pop() {
        Some(workout) => Ok(workout),
        None => {
            let workout = repos.start_workout(None, Utc::now())?;
            println!("Started workout {}", workout.id);
            Ok(workout)
        }
    }
}

fn cmd_log(store: &Store, exercise_id: &str, reps: u32, weight: f64) -> Result<()> {
    let repos = Repositories::new(store);

    let name = repos
        .exercises()
        .find(exercise_id)
        .map(|e| e.name)
        .unwrap_or_else(|| format!("unknown exercise '{}'", exercise_id));

    let workout = open_workout(&repos)?;
    repos.log_set(&workout.id, exercise_id, reps, weight, Utc::now())?;

    println!("✓ Logged {} × {} lb for {}", reps, weight, name);
    Ok(())
}

fn cmd_finish(store: &Store) -> Result<()> {
    let repos = Repositories::new(store);

    let open: Vec<Workout> = repos
        .workouts()
        .list()
        .into_iter()
        .filter(|w| w.completed_at.is_none())
        .collect();

    if open.is_empty() {
        println!("No open workout to finish.");
        return Ok(());
    }
    for workout in open {
        repos.finish_workout(&workout.id, Utc::now())?;
        println!("✓ Finished workout {}", workout.id);
    }
    Ok(())
}

fn cmd_exercises(store: &Store, location: Option<&str>) -> Result<()> {
    let repos = Repositories::new(store);

    let mut exercises = repos.exercises().list();
    if let Some(location) = location {
        exercises.retain(|e| e.location_ids.iter().any(|l| l == location));
    }
    exercises.sort_by(|a, b| a.name.cmp(&b.name));

    for exercise in exercises {
        let groups: Vec<&str> = exercise
            .effective_primary_groups()
            .iter()
            .map(|g| g.key())
            .collect();
        println!("  {:<24} {:<20} [{}]", exercise.id, exercise.name, groups.join(", "));
    }
    Ok(())
}

fn cmd_volume(store: &Store, weeks: usize) -> Result<()> {
    let repos = Repositories::new(store);
    let sets = repos.sets().list();
    let exercises = repos.exercises().list();
    let settings = repos.settings();
    let today = Utc::now().date_naive();

    let workouts = repos.workouts().list();

    for week in volume_history(&sets, &exercises, &workouts, &settings, today, weeks.max(1)) {
        println!("Week {} – {}", week.week_start, week.week_end);
        for volume in week.volumes.iter().filter(|v| v.sets > 0 || v.target > 0) {
            let marker = if volume.target == 0 { " (untargeted)" } else { "" };
            println!(
                "  {:<12} {:>3} / {:<3}{}",
                volume.muscle.key(),
                volume.sets,
                volume.target,
                marker
            );
        }
        println!("  total: {} / {}", week.total_sets, week.target_sets);
    }
    Ok(())
}

fn cmd_score(store: &Store) -> Result<()> {
    let repos = Repositories::new(store);
    let week = weekly_volume(
        &repos.sets().list(),
        &repos.exercises().list(),
        &repos.workouts().list(),
        &repos.settings(),
        Utc::now().date_naive(),
    );

    println!("Training score: {}", training_score(&week.volumes));
    Ok(())
}

fn cmd_records(store: &Store, exercise_id: &str) -> Result<()> {
    let repos = Repositories::new(store);

    match personal_records(exercise_id, &repos.sets().list()) {
        Some(records) => {
            println!("Records for {}:", exercise_id);
            println!("  max weight:  {} lb", records.max_weight);
            println!("  max reps:    {}", records.max_reps);
            println!(
                "  best set:    {} (weight × reps) on {}",
                records.best_volume,
                records.best_volume_at.date_naive()
            );
        }
        None => println!("No sets logged for {}.", exercise_id),
    }
    Ok(())
}

fn cmd_trends(store: &Store) -> Result<()> {
    let repos = Repositories::new(store);
    let trends = volume_trends(
        &repos.sets().list(),
        &repos.exercises().list(),
        &repos.workouts().list(),
        &repos.settings(),
        Utc::now().date_naive(),
    );

    for trend in trends.iter().filter(|t| t.current_sets > 0 || t.previous_sets > 0) {
        println!(
            "  {:<12} {:>3} → {:<3} {:+.0}% {:?}",
            trend.muscle.key(),
            trend.previous_sets,
            trend.current_sets,
            trend.percent_change,
            trend.direction
        );
    }
    Ok(())
}

fn cmd_suggest(store: &Store, location: &str) -> Result<()> {
    let repos = Repositories::new(store);
    let exercises = repos.exercises().list();
    let week = weekly_volume(
        &repos.sets().list(),
        &exercises,
        &repos.workouts().list(),
        &repos.settings(),
        Utc::now().date_naive(),
    );

    let behind = shortfalls(&week.volumes);
    if behind.is_empty() {
        println!("All weekly targets met. Nothing to suggest.");
        return Ok(());
    }

    println!("Behind this week:");
    for shortfall in &behind {
        println!(
            "  {:<12} {} / {} ({} to go)",
            shortfall.muscle.key(),
            shortfall.current,
            shortfall.target,
            shortfall.amount()
        );
    }

    println!("\nSuggestions for {}:", location);
    for suggestion in suggest_exercises(&exercises, location, &behind) {
        let mark = if suggestion.preselected { "▸" } else { " " };
        println!(
            "{} {:<24} {} sets",
            mark, suggestion.name, suggestion.suggested_sets
        );
    }
    Ok(())
}

fn cmd_export(store: &Store, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    let contents = match format {
        ExportFormat::Json => {
            let document = export_document(store, Utc::now());
            serde_json::to_string_pretty(&document).map_err(Error::from)?
        }
        ExportFormat::Csv => {
            let repos = Repositories::new(store);
            let mut buf = Vec::new();
            export_sets_csv(&repos.sets().list(), &repos.exercises().list(), &mut buf)?;
            String::from_utf8(buf).map_err(|e| Error::Other(e.to_string()))?
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, contents)?;
            println!("✓ Exported to {}", path.display());
        }
        None => print!("{}", contents),
    }
    Ok(())
}

fn cmd_import(store: &Store, file: &PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(file)?;
    let document: ExportDocument = serde_json::from_str(&contents)?;
    import_document(store, &document)?;

    println!(
        "✓ Imported {} exercises, {} workouts, {} sets",
        document.exercises.len(),
        document.workouts.len(),
        document.sets.len()
    );
    Ok(())
}
