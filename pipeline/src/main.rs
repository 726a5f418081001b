//! Heartprep CLI - Preprocess heart-disease CSV datasets
//!
//! # Commands
//!
//! ```bash
//! heartprep run                                  # data/heart_disease_data.csv → output/
//! heartprep run -i raw.csv -o out/clean.csv      # explicit paths
//! heartprep run --json                           # print the run summary as JSON
//! heartprep inspect -i raw.csv                   # show columns and cp categories
//! ```
//!
//! Environment variables (`HEARTPREP_INPUT`, `HEARTPREP_OUTPUT`,
//! `HEARTPREP_PARTITIONS`) and a `.env` file provide defaults; flags win.

use clap::{Parser, Subcommand};
use heartprep::logs;
use heartprep::{inspect, run, PipelineConfig, PipelineError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "heartprep")]
#[command(about = "Preprocess heart-disease CSV datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: load → encode → filter → bucketize → count → stamp → export
    Run {
        /// Input CSV file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Number of partitions processed concurrently
        #[arg(short, long)]
        partitions: Option<usize>,

        /// Give every cp category its own one-hot column instead of dropping the last
        #[arg(long)]
        keep_all_categories: bool,

        /// Print the run summary as JSON on stdout (progress stays on stderr)
        #[arg(long)]
        json: bool,
    },

    /// Load a dataset and show its columns and cp categories
    Inspect {
        /// Input CSV file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = PipelineConfig::from_env();

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            delimiter,
            partitions,
            keep_all_categories,
            json,
        } => {
            if let Some(input) = input {
                config.input = input;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(partitions) = partitions {
                config.partitions = partitions.max(1);
            }
            config.delimiter = delimiter.or(config.delimiter);
            config.drop_last = !keep_all_categories;
            cmd_run(&config, json).await
        }

        Commands::Inspect {
            input,
            delimiter,
            json,
        } => {
            if let Some(input) = input {
                config.input = input;
            }
            config.delimiter = delimiter.or(config.delimiter);
            cmd_inspect(&config, json)
        }
    };

    if let Err(e) = result {
        match e.downcast_ref::<PipelineError>() {
            Some(err) => logs::failed(err),
            None => eprintln!("❌ Error: {}", e),
        }
        std::process::exit(1);
    }
}

async fn cmd_run(config: &PipelineConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", config.input.display());

    let summary = run(config).await?;

    // the High count line is reported by the aggregate stage on stderr
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    eprintln!(
        "\n✨ Done! {} of {} rows written to {}",
        summary.exported_rows,
        summary.input_rows,
        summary.output.display()
    );
    Ok(())
}

fn cmd_inspect(config: &PipelineConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let report = inspect(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("📄 {}", config.input.display());
    println!("   Encoding: {}", report.encoding);
    println!("   Delimiter: '{}'", format_delimiter(report.delimiter));
    println!("   Rows: {}", report.rows);
    println!("   Columns: {}", report.headers.join(", "));
    println!("\n🗂  Categories of '{}':", report.categories.column());
    for entry in report.categories.entries() {
        println!("   [{}] cp={} ({} rows)", entry.index, entry.value, entry.count);
    }
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
