#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use roulement::{
    config::{load_generation_config, GenerationConfig, ShiftLength},
    engine::PatternEngine,
    io,
    model::CrewRoster,
    storage::{JsonScheduleStore, ReplacePolicy, ScheduleStore},
    validation::{validate, ValidationOptions, ValidationResult},
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de génération de roulements d'équipes (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lister les motifs disponibles
    Patterns,

    /// Générer un planning sur une plage de dates
    Generate {
        /// pitman, dupont, southern_swing, fixed_fixed, five_and_two, four_on_four_off, panama, continental
        #[arg(long)]
        pattern: String,
        /// YYYY-MM-DD
        #[arg(long)]
        start: NaiveDate,
        /// YYYY-MM-DD (inclus)
        #[arg(long)]
        end: NaiveDate,
        /// CSV `employee_id,crew,position_id`
        #[arg(long)]
        employees: String,
        /// fixed, rotating, rapid (selon le motif)
        #[arg(long)]
        variation: Option<String>,
        /// 12-hour, 8-hour, custom
        #[arg(long)]
        shift_length: Option<String>,
        /// Config JSON (horaires personnalisés, limite de plage)
        #[arg(long)]
        config: Option<String>,
        #[arg(long, default_value_t = 1)]
        min_per_shift: u32,
        #[arg(long)]
        out_csv: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
        /// Planning JSON persistant (remplace la plage)
        #[arg(long)]
        store: Option<String>,
        /// Garde les affectations déjà stockées dans la plage
        #[arg(long, requires = "store")]
        keep_existing: bool,
    },

    /// Valider un planning stocké
    Validate {
        #[arg(long)]
        schedule: String,
        #[arg(long, default_value_t = 1)]
        min_per_shift: u32,
        /// Export CSV du rapport (optionnel)
        #[arg(long)]
        report: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let code = match cli.cmd {
        Commands::Patterns => {
            let engine = PatternEngine::standard()?;
            for p in engine.catalog().iter() {
                let variations: Vec<&str> =
                    p.variations.iter().map(|v| v.variation.as_str()).collect();
                println!(
                    "{} | {} | cycle {} days | {} | {}",
                    p.name,
                    p.name.label(),
                    p.cycle_length(),
                    p.default_length,
                    variations.join(",")
                );
            }
            0
        }
        Commands::Generate {
            pattern,
            start,
            end,
            employees,
            variation,
            shift_length,
            config,
            min_per_shift,
            out_csv,
            out_json,
            store,
            keep_existing,
        } => {
            let mut gen_config = match config {
                Some(path) => load_generation_config(path)?,
                None => GenerationConfig::default(),
            };
            if let Some(v) = variation {
                gen_config.variation = Some(v);
            }
            if let Some(raw) = shift_length {
                gen_config.shift_length = Some(raw.parse::<ShiftLength>()?);
            }

            let people = io::import_roster_csv(employees)?;
            let excluded = people.iter().filter(|p| p.crew.is_none()).count();
            let roster = CrewRoster::from_employees(&people);
            if roster.is_empty() {
                bail!("no employee with a crew in roster");
            }

            let engine = PatternEngine::standard()?;
            let schedule = engine.generate(&pattern, start, end, &roster, &gen_config)?;

            if let Some(path) = out_csv {
                io::export_assignments_csv(path, &schedule.assignments)?;
            }
            if let Some(path) = out_json {
                io::export_schedule_json(path, &schedule)?;
            }
            if let Some(path) = store {
                let policy = if keep_existing {
                    ReplacePolicy::KeepExisting
                } else {
                    ReplacePolicy::Replace
                };
                let store = JsonScheduleStore::open(path)?;
                let outcome = store.record(&schedule, policy)?;
                println!(
                    "Stored: {} inserted, {} deleted, {} skipped ({})",
                    outcome.inserted,
                    outcome.deleted,
                    outcome.skipped,
                    store.path().display()
                );
            }

            println!(
                "Generated {} assignment(s) for {} employee(s) ({} {}, {} → {}, {}h)",
                schedule.assignments.len(),
                roster.employee_count(),
                schedule.pattern,
                schedule.variation,
                schedule.start,
                schedule.end,
                schedule.total_hours()
            );
            if excluded > 0 {
                println!("Skipped {excluded} employee(s) without crew");
            }

            let opts = ValidationOptions {
                min_per_shift,
                ..ValidationOptions::default()
            };
            report(&schedule.validate(&opts))
        }
        Commands::Validate {
            schedule,
            min_per_shift,
            report: out,
        } => {
            let book = JsonScheduleStore::open(&schedule)?.load()?;
            let opts = ValidationOptions {
                min_per_shift,
                ..ValidationOptions::default()
            };
            let result = validate(&book.assignments, &opts);
            if let Some(path) = out {
                io::export_validation_csv(path, &result)?;
            }
            report(&result)
        }
    };

    std::process::exit(code);
}

/// Affiche le résumé ; code 2 = WARNING/INCOMPLETE.
fn report(result: &ValidationResult) -> i32 {
    if !result.has_findings() {
        println!("OK: no conflicts, no coverage gaps, no warnings");
        return 0;
    }
    if !result.is_valid {
        eprintln!("Found {} conflict(s)", result.conflicts.len());
        for c in &result.conflicts {
            eprintln!("  employee {} on {}: {} assignments", c.employee_id, c.date, c.occurrences);
        }
    }
    if !result.coverage_gaps.is_empty() {
        eprintln!("Found {} coverage gap(s)", result.coverage_gaps.len());
    }
    if !result.warnings.is_empty() {
        eprintln!("Found {} warning(s)", result.warnings.len());
    }
    2
}
