use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use gym_core::calendar::parse_date;
use gym_core::catalog::find_exercise;
use gym_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gymlog")]
#[command(about = "Gym content planner and workout log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress at info level (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as the coach
    Login {
        #[arg(long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Show the month calendar (default: current month)
    Month {
        /// Month as YYYY-MM
        month: Option<String>,
    },

    /// Show one day with its logged sets
    Day {
        /// Date as YYYY-MM-DD, or today/yesterday/tomorrow
        date: String,
    },

    /// Set muscle groups, topic or notes for a day
    Plan {
        date: String,

        /// Target muscle group (repeatable)
        #[arg(long = "group", short = 'g')]
        groups: Vec<String>,

        #[arg(long)]
        topic: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Gear to bring for filming or training
        #[arg(long)]
        equipment_needed: Option<String>,
    },

    /// Toggle the rest-day flag
    Rest { date: String },

    /// Toggle the training-completed flag
    Done { date: String },

    /// Attach a progress photo to a day
    Photo { date: String, file: PathBuf },

    /// Log one set
    Log {
        date: String,

        #[arg(long, short = 'e')]
        exercise: String,

        #[arg(long)]
        equipment: Option<String>,

        #[arg(long)]
        grip: Option<String>,

        /// Laterality mode (Both or Single)
        #[arg(long)]
        mode: Option<String>,

        /// Side for single-limb work (left or right)
        #[arg(long)]
        side: Option<String>,

        /// Weight in kg, or speed for cardio
        #[arg(long, short = 'w')]
        weight: f64,

        /// Repetitions, or minutes for cardio
        #[arg(long, short = 'r')]
        reps: f64,
    },

    /// Change a logged set; `--exercise` re-labels it
    UpdateLog {
        date: String,
        id: Uuid,

        #[arg(long, short = 'w')]
        weight: f64,

        #[arg(long, short = 'r')]
        reps: f64,

        #[arg(long, short = 'e')]
        exercise: Option<String>,

        #[arg(long)]
        equipment: Option<String>,

        #[arg(long)]
        grip: Option<String>,

        #[arg(long)]
        mode: Option<String>,

        #[arg(long)]
        side: Option<String>,
    },

    /// Delete a logged set
    DeleteLog { id: Uuid },

    /// List exercises offered for muscle groups
    Catalog {
        #[arg(long = "group", short = 'g')]
        groups: Vec<String>,

        /// Show the variant options of one exercise
        #[arg(long, short = 'e')]
        exercise: Option<String>,
    },

    /// List days with progress photos, newest first
    Gallery,

    /// List logged sets across all days, newest first
    History {
        #[arg(long, short = 'e')]
        exercise: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Export all logged sets to CSV
    Export { file: PathBuf },

    /// Show the effective configuration
    Config {
        /// Write it to the config file instead
        #[arg(long)]
        write: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    gym_core::logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    get_default_catalog().ensure_valid()?;

    let config_path = cli.config.clone().unwrap_or_else(Config::default_config_path);
    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    std::fs::create_dir_all(&data_dir)?;

    let mut backend = gym_core::backend::open(&config, &data_dir)?;
    let today = Local::now().date_naive();

    let command = cli.command.unwrap_or(Commands::Month { month: None });

    // Screens other than login and the static catalog need a session.
    match &command {
        Commands::Login { email, password } => return cmd_login(backend.as_mut(), email, password.clone()),
        Commands::Logout => {
            backend.sign_out()?;
            println!("Signed out.");
            return Ok(());
        }
        Commands::Catalog { groups, exercise } => {
            return cmd_catalog(groups, exercise.as_deref(), config.catalog.empty_selection)
        }
        Commands::Config { write } => return cmd_config(&config, &config_path, *write),
        _ => {}
    }
    let session = backend.require_session()?;

    let month = YearMonth::of(today);
    let mut planner = Planner::new(backend, month)
        .with_empty_selection(config.catalog.empty_selection)
        .with_week_start(config.calendar.week_start);

    match command {
        Commands::Whoami => {
            println!("{}", session.email);
            if let Some(expires) = session.expires_at {
                println!("  session expires {}", expires.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
            }
            Ok(())
        }
        Commands::Month { month } => {
            let month = match month {
                Some(m) => m.parse::<YearMonth>()?,
                None => YearMonth::of(today),
            };
            planner.open_month(month)?;
            print_month(&planner.grid(), today);
            println!("  ideas drafted {}", count_drafted_ideas(planner.backend())?);
            Ok(())
        }
        Commands::Day { date } => {
            let date = parse_date(&date, today)?;
            planner.select_date(date)?;
            print_day(&planner, date);
            Ok(())
        }
        Commands::Plan {
            date,
            groups,
            topic,
            notes,
            equipment_needed,
        } => {
            let date = parse_date(&date, today)?;
            let catalog = get_default_catalog();
            for group in &groups {
                if catalog.canonical_group(group).is_none() {
                    tracing::warn!("Muscle group {:?} has no catalog exercises", group);
                }
            }
            if !groups.is_empty() {
                planner.set_muscle_groups(date, &groups)?;
            }
            if topic.is_some() {
                planner.set_topic(date, topic)?;
            }
            if notes.is_some() {
                planner.set_notes(date, notes)?;
            }
            if equipment_needed.is_some() {
                planner.set_equipment_needed(date, equipment_needed)?;
            }
            let day = planner.ensure_day(date)?;
            println!("✓ Planned {}: {}", date, groups_label(&day));
            Ok(())
        }
        Commands::Rest { date } => {
            let date = parse_date(&date, today)?;
            let day = planner.toggle_rest(date)?;
            println!(
                "✓ {} is {}",
                date,
                if day.is_rest_day { "a rest day" } else { "a training day" }
            );
            Ok(())
        }
        Commands::Done { date } => {
            let date = parse_date(&date, today)?;
            let day = planner.toggle_completed(date)?;
            println!(
                "✓ {} training {}",
                date,
                if day.training_completed { "completed" } else { "not completed" }
            );
            Ok(())
        }
        Commands::Photo { date, file } => {
            let date = parse_date(&date, today)?;
            cmd_photo(&mut planner, date, &file)
        }
        Commands::Log {
            date,
            exercise,
            equipment,
            grip,
            mode,
            side,
            weight,
            reps,
        } => {
            let date = parse_date(&date, today)?;
            let side = side.map(|s| s.parse::<Side>()).transpose()?;
            let entry = LogEntry {
                exercise,
                choice: VariantChoice {
                    equipment,
                    grip,
                    mode,
                    side,
                },
                weight,
                reps,
            };
            let log = planner.add_log(date, &entry)?;
            println!("✓ Logged {} on {}", log.exercise_name, date);
            println!("  id: {}", log.id);
            Ok(())
        }
        Commands::UpdateLog {
            date,
            id,
            weight,
            reps,
            exercise,
            equipment,
            grip,
            mode,
            side,
        } => {
            let date = parse_date(&date, today)?;
            let side = side.map(|s| s.parse::<Side>()).transpose()?;
            let edit = LogEdit {
                exercise,
                choice: VariantChoice {
                    equipment,
                    grip,
                    mode,
                    side,
                },
                weight,
                reps,
            };
            planner.select_date(date)?;
            let log = planner.update_log(id, &edit)?;
            println!("✓ Updated {}: {} x {}", log.exercise_name, log.weight, log.reps);
            Ok(())
        }
        Commands::DeleteLog { id } => {
            planner.delete_log(id)?;
            println!("✓ Deleted log {}", id);
            Ok(())
        }
        Commands::Gallery => {
            let days = load_gallery(planner.backend())?;
            if days.is_empty() {
                println!("No progress photos yet. Attach one with `gymlog photo <date> <file>`.");
            }
            for day in days {
                println!(
                    "{}  {:<24} {}",
                    day.schedule_date,
                    groups_label(&day),
                    day.photo_url.as_deref().unwrap_or_default()
                );
            }
            Ok(())
        }
        Commands::History { exercise, limit } => {
            let entries = load_history(planner.backend(), exercise.as_deref(), Some(limit))?;
            if entries.is_empty() {
                println!("No sets logged yet.");
            }
            for entry in entries {
                let date = entry.date.map(|d| d.to_string()).unwrap_or_else(|| "----------".into());
                println!(
                    "{}  {:<40} {:>7} x {}",
                    date, entry.log.exercise_name, entry.log.weight, entry.log.reps
                );
            }
            Ok(())
        }
        Commands::Export { file } => {
            let backend = planner.backend();
            let schedules = backend.list_schedules(&ScheduleQuery::default())?;
            let logs = backend.list_logs(&LogQuery::default())?;
            let count = gym_core::export::write_logs_csv(&file, &schedules, &logs)?;
            println!("✓ Exported {} sets", count);
            println!("  CSV: {}", file.display());
            Ok(())
        }
        Commands::Login { .. } | Commands::Logout | Commands::Catalog { .. } | Commands::Config { .. } => Ok(()),
    }
}

fn cmd_login(backend: &mut dyn Backend, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };
    let session = backend.sign_in(email, &password)?;
    println!("✓ Signed in as {}", session.email);
    Ok(())
}

fn prompt_password() -> Result<String> {
    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn cmd_catalog(groups: &[String], exercise: Option<&str>, policy: EmptySelection) -> Result<()> {
    let catalog = get_default_catalog();
    let groups: Vec<String> = groups
        .iter()
        .map(|g| catalog.canonical_group(g).map(str::to_string).unwrap_or_else(|| g.clone()))
        .collect();

    if groups.is_empty() && exercise.is_none() {
        println!("Muscle groups: {}", catalog.groups().collect::<Vec<_>>().join(", "));
        if policy == EmptySelection::Nothing {
            return Ok(());
        }
    }

    let merged = catalog.exercises_for(&groups, policy);
    if let Some(name) = exercise {
        let (name, variants) = find_exercise(&merged, name)
            .ok_or_else(|| Error::NotFound(format!("exercise '{}' for the selected groups", name)))?;
        println!("{}", name);
        print_axis("equipment", &variants.equipment);
        print_axis("grip", &variants.grips);
        print_axis("mode", &variants.modes);
        let (weight_unit, reps_unit) = variants.metric.units();
        println!("  logs {} x {}", weight_unit, reps_unit);
        return Ok(());
    }

    for (name, variants) in &merged {
        let mut axes = Vec::new();
        for values in [&variants.equipment, &variants.grips, &variants.modes] {
            if !values.is_empty() {
                axes.push(values.join("/"));
            }
        }
        if axes.is_empty() {
            println!("{}", name);
        } else {
            println!("{:<20} {}", name, axes.join("  "));
        }
    }
    Ok(())
}

fn cmd_config(config: &Config, path: &Path, write: bool) -> Result<()> {
    if write {
        config.save_to(path)?;
        println!("✓ Wrote {}", path.display());
    } else {
        println!("# {}", path.display());
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

fn print_axis(label: &str, values: &[String]) {
    if !values.is_empty() {
        println!("  {:<10} {}", label, values.join(", "));
    }
}

fn cmd_photo<B: Backend>(planner: &mut Planner<B>, date: NaiveDate, file: &Path) -> Result<()> {
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::Validation(format!("{} has no file extension", file.display())))?;
    let bytes = std::fs::read(file)?;
    let day = planner.attach_photo(date, &bytes, extension)?;
    println!("✓ Photo attached to {}", date);
    if let Some(url) = day.photo_url {
        println!("  {}", url);
    }
    Ok(())
}

fn groups_label(day: &ScheduleDay) -> String {
    if day.is_rest_day {
        "Rest".to_string()
    } else if day.muscle_groups.is_empty() {
        "-".to_string()
    } else {
        day.muscle_groups.join(", ")
    }
}

fn print_month(grid: &MonthGrid, today: NaiveDate) {
    println!();
    println!("  {}", grid.month.first_day().format("%B %Y"));
    println!("  {}", grid.weekday_labels().map(|l| format!("{:<4}", l)).concat());

    for week in grid.weeks() {
        let line: String = week
            .iter()
            .map(|slot| match slot {
                None => "    ".to_string(),
                Some(cell) => {
                    let marker = cell.status().map_or(' ', DayStatus::marker);
                    let day = cell.date.format("%e").to_string();
                    if cell.date == today {
                        format!("{}{}<", day, marker)
                    } else {
                        format!("{}{} ", day, marker)
                    }
                }
            })
            .collect();
        println!("  {}", line.trim_end());
    }

    let summary = grid.summary();
    println!();
    println!(
        "  planned {}  complete {}  partial {}  rest {}  photos {}",
        summary.planned, summary.complete, summary.partial, summary.rest, summary.photos
    );
    println!("  ● complete  ◐ partial  · no activity  R rest");
}

fn print_day<B: Backend>(planner: &Planner<B>, date: NaiveDate) {
    println!();
    println!("  {}", date.format("%A, %d %B %Y"));

    let Some(day) = planner.schedule_for(date) else {
        println!("  Nothing planned. Use `gymlog plan {} --group <name>` to start.", date);
        return;
    };

    println!("  Status:  {}", day.status());
    println!("  Groups:  {}", groups_label(day));
    if let Some(topic) = &day.topic {
        println!("  Topic:   {}", topic);
    }
    if let Some(notes) = &day.notes {
        println!("  Notes:   {}", notes);
    }
    if let Some(equipment) = &day.equipment_needed {
        println!("  Gear:    {}", equipment);
    }
    if let Some(url) = &day.photo_url {
        println!("  Photo:   {}", url);
    }

    println!();
    if planner.logs().is_empty() {
        println!("  No sets logged.");
    }
    for (i, log) in planner.logs().iter().enumerate() {
        println!(
            "  {:>2}. {:<40} {:>7} x {:<5} {}",
            i + 1,
            log.exercise_name,
            log.weight,
            log.reps,
            log.id
        );
    }

    let offered = planner.exercises_for(date);
    if !offered.is_empty() {
        println!();
        println!("  Exercises: {}", offered.keys().cloned().collect::<Vec<_>>().join(", "));
    }
}
