use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use club_pricing::logging::init_logging;
use club_pricing::workflow::stage_date;
use club_pricing::{PricingConfig, RunOptions, Workflow, WorkflowPaths, VERSION};

#[derive(Parser)]
#[command(name = "club-pricing")]
#[command(about = "Club pricing pipeline: CSV export → club files → updated location documents")]
#[command(version)]
struct Cli {
    /// JSON file overriding the built-in tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write daily JSON logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage 1: CSV → formatted multi-club text
    Format {
        #[arg(long)]
        csv: PathBuf,
        /// Default: pricing_formatted_<DD-MM-YY>.txt
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Stage 2: formatted text → one text file per club
    Split {
        #[arg(long)]
        input: PathBuf,
        /// Default: club_files_<DD-MM-YY>/
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Stage 3: splice pricing and fee disclaimer into location documents
    Update {
        #[arg(long)]
        club_dir: PathBuf,
        #[arg(long)]
        docs: PathBuf,
        /// Pricing CSV; club text files are the fallback source
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Default: updated_locations_<DD-MM-YY>/
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Write the run summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
    /// All three stages in order
    Run {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        docs: PathBuf,
        /// Date stamp for generated names (DD-MM-YY, default today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = ".")]
        work_dir: PathBuf,
        #[arg(long)]
        skip_format: bool,
        #[arg(long)]
        skip_split: bool,
        #[arg(long)]
        skip_update: bool,
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    let config = load_config(cli.config.as_deref())?;
    let workflow = Workflow::new(config);
    info!(version = VERSION, "club-pricing starting");

    let today = stage_date(None)?;
    let dated = WorkflowPaths::for_date(Path::new("."), &today);

    match cli.command {
        Commands::Format { csv, output } => {
            let output = output.unwrap_or(dated.formatted_text);
            println!("🧾 Formatting {}", csv.display());
            let formatted = workflow.format_stage(&csv, &output)?;
            println!("✓ {} clubs written to {}", formatted.clubs.len(), output.display());
        }
        Commands::Split { input, output_dir } => {
            let output_dir = output_dir.unwrap_or(dated.club_dir);
            println!("✂️  Splitting {}", input.display());
            let report = workflow.split_stage(&input, &output_dir)?;
            println!("✓ {} club files written to {}", report.written.len(), output_dir.display());
            if !report.failed.is_empty() {
                println!("✗ {} club files failed", report.failed.len());
            }
        }
        Commands::Update {
            club_dir,
            docs,
            csv,
            output_dir,
            summary_json,
        } => {
            let output_dir = output_dir.unwrap_or(dated.updated_dir);
            println!("🧩 Updating documents from {}", docs.display());
            let summary = workflow.update_stage(&club_dir, &docs, &output_dir, csv.as_deref())?;
            summary.print();
            if let Some(path) = summary_json {
                summary.write_json(&path)?;
            }
        }
        Commands::Run {
            csv,
            docs,
            date,
            work_dir,
            skip_format,
            skip_split,
            skip_update,
            summary_json,
        } => {
            let options = RunOptions {
                csv,
                docs_dir: docs,
                work_dir,
                date,
                skip_format,
                skip_split,
                skip_update,
            };
            if let Some(summary) = workflow.run(&options)? {
                summary.print();
                if let Some(path) = summary_json {
                    summary.write_json(&path)?;
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PricingConfig> {
    match path {
        Some(path) => PricingConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(PricingConfig::default()),
    }
}
