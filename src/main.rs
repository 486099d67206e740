//! devplan
//!
//! Development needs and site-allocation reports for urban master plans.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::info;

use devplan::logging::{self, LoggingConfig};
use devplan::planner::report::validate_top_level;
use devplan::{db, import, sample};
use devplan::{Assumptions, CancelToken, MasterPlanContext, ObjectRecord, Planner, Report};

#[derive(Parser)]
#[command(name = "devplan")]
#[command(about = "15-year development needs and site allocation for master plans")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "devplan.db")]
    database: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides DEVPLAN_LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ReportOptions {
    /// TOML file overriding planning assumptions
    #[arg(short, long)]
    assumptions: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Abort report generation after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Register a new master plan
    CreatePlan {
        name: String,

        /// Plan area in square metres
        #[arg(long)]
        area_m2: Option<f64>,
    },

    /// List master plans and their object counts
    ListPlans,

    /// Delete a master plan together with its objects
    DeletePlan {
        plan: i64,
    },

    /// Import objects from a seed JSON file or directory into a plan
    Import {
        /// Master plan id
        plan: i64,

        /// JSON file or directory of JSON files
        path: PathBuf,

        /// Remove the plan's existing objects first
        #[arg(long)]
        clear: bool,
    },

    /// List the objects stored for a plan
    ListObjects {
        plan: i64,
    },

    /// Generate the development report for a stored plan
    Report {
        plan: i64,

        #[command(flatten)]
        options: ReportOptions,
    },

    /// Generate a report straight from an objects JSON file
    Evaluate {
        objects: PathBuf,

        /// Master plan name used in the report
        #[arg(long, default_value = "Unnamed master plan")]
        name: String,

        #[arg(long)]
        area_m2: Option<f64>,

        #[command(flatten)]
        options: ReportOptions,
    },

    /// Print the effective planning assumptions as TOML
    Assumptions {
        /// TOML file to merge over the defaults
        path: Option<PathBuf>,
    },

    /// Create a plan filled with demo objects
    LoadSample {
        #[arg(default_value = "Sample quarter")]
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = logging::config_from_env();
    if let Some(level) = &cli.log_level {
        log_config = LoggingConfig {
            level: logging::parse_level(level),
            ..log_config
        };
    }
    log_config.use_json |= cli.log_json;
    logging::init_logging(log_config);

    match cli.command {
        Commands::Evaluate {
            objects,
            name,
            area_m2,
            options,
        } => {
            let parsed = import::parse_object_file(&objects)?;
            if parsed.skipped > 0 {
                eprintln!("Skipped {} object(s) without coordinates", parsed.skipped);
            }
            let plan = MasterPlanContext {
                id: 0,
                name,
                area_m2,
            };
            run_report(&plan, &parsed.objects, &options)?;
        }

        Commands::Assumptions { path } => {
            let assumptions = Assumptions::load_or_default(path.as_deref())?;
            print!("{}", assumptions.to_toml_string()?);
        }

        command => {
            let conn = Connection::open(&cli.database)
                .with_context(|| format!("Failed to open {}", cli.database.display()))?;
            db::init_schema(&conn)?;
            run_store_command(&conn, &cli.database, command)?;
        }
    }

    Ok(())
}

fn run_store_command(conn: &Connection, database: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            println!("Database initialized at: {}", database.display());
        }

        Commands::CreatePlan { name, area_m2 } => {
            let id = db::create_master_plan(conn, &name, area_m2)?;
            println!("Created master plan {} ({})", id, name);
        }

        Commands::ListPlans => {
            let plans = db::list_master_plans(conn)?;
            if plans.is_empty() {
                println!("No master plans. Run 'create-plan' or 'load-sample' first.");
            } else {
                println!("{:>5} {:<40} {:>14} {:>8}", "ID", "Name", "Area (m2)", "Objects");
                println!("{}", "-".repeat(70));
                for (plan, count) in plans {
                    let area = plan.area_m2.map_or("-".to_string(), |a| format!("{:.0}", a));
                    println!("{:>5} {:<40} {:>14} {:>8}", plan.id, plan.name, area, count);
                }
            }
        }

        Commands::DeletePlan { plan } => {
            if db::delete_master_plan(conn, plan)? {
                println!("Deleted master plan {}", plan);
            } else {
                println!("Master plan {} not found", plan);
            }
        }

        Commands::Import { plan, path, clear } => {
            require_plan(conn, plan)?;
            if clear {
                let removed = db::clear_plan_objects(conn, plan)?;
                println!("Removed {} existing object(s)", removed);
            }
            let stats = import::import_to_database(conn, plan, &path)?;
            println!("\n{}", stats);
        }

        Commands::ListObjects { plan } => {
            require_plan(conn, plan)?;
            let objects = db::list_objects_in_plan(conn, plan)?;
            if objects.is_empty() {
                println!("No objects in plan {}. Run 'import' first.", plan);
            } else {
                println!("{:<14} {:<16} {:<28} {}", "Object", "Type", "Function", "Name");
                println!("{}", "-".repeat(80));
                for obj in objects {
                    println!(
                        "{:<14} {:<16} {:<28} {}",
                        obj.object_id,
                        obj.object_type,
                        obj.function_type.as_deref().unwrap_or("-"),
                        obj.name.as_deref().unwrap_or("")
                    );
                }
            }
        }

        Commands::Report { plan, options } => {
            let context = require_plan(conn, plan)?;
            let objects = db::list_objects_in_plan(conn, plan)?;
            run_report(&context, &objects, &options)?;
        }

        Commands::LoadSample { name } => {
            let (id, count) = sample::load_sample(conn, &name)?;
            println!("Loaded {} sample objects into plan {} ({})", count, id, name);
        }

        Commands::Evaluate { .. } | Commands::Assumptions { .. } => {}
    }
    Ok(())
}

fn require_plan(conn: &Connection, id: i64) -> Result<MasterPlanContext> {
    db::get_master_plan(conn, id)?.with_context(|| format!("Master plan {} not found", id))
}

fn run_report(plan: &MasterPlanContext, objects: &[ObjectRecord], options: &ReportOptions) -> Result<()> {
    let assumptions = Assumptions::load_or_default(options.assumptions.as_deref())?;
    let cancel = options
        .timeout_secs
        .map(|s| CancelToken::with_timeout(Duration::from_secs(s)))
        .unwrap_or_default();

    let planner = Planner::new(assumptions)?.with_cancel(cancel);
    let report = planner.generate(plan, objects, chrono::Local::now().date_naive())?;

    let value = serde_json::to_value(&report)?;
    validate_top_level(&value)?;
    let json = serde_json::to_string_pretty(&value)?;

    match &options.output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "report written");
            eprint!("{}", summarize(&report));
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn summarize(report: &Report) -> String {
    let mut out = format!("Report for {}\n", report.masterplan_name);
    match report.baseline.population_estimated {
        Some(pop) => out.push_str(&format!("  Estimated population: {}\n", pop)),
        None => out.push_str("  Estimated population: unknown\n"),
    }
    for phase in &report.phases {
        out.push_str(&format!(
            "  Years {:<5} {} project(s)\n",
            phase.phase.label(),
            phase.projects.len()
        ));
    }
    out.push_str(&format!("  Open questions: {}\n", report.questions.len()));
    out
}
