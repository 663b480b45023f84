//! Yolomerge: combine YOLO-format detection datasets into one.
//!
//! Yolomerge merges multiple independently-labeled YOLO datasets (each with
//! its own class vocabulary and a train/valid/test folder layout) into a
//! single dataset with one deduplicated vocabulary, validated annotations,
//! and collision-free filenames.
//!
//! # Modules
//!
//! - [`vocab`]: class-list reading, synonym normalization, vocabulary
//!   unification
//! - [`annotation`]: per-line label validation
//! - [`combine`]: the combination pass and its summary report
//! - [`error`]: error types for yolomerge operations

pub mod annotation;
pub mod combine;
pub mod error;
pub mod vocab;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::MergeError;

/// The yolomerge CLI application.
#[derive(Parser)]
#[command(name = "yolomerge")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Combine multiple YOLO datasets into one unified dataset.
    Combine(CombineArgs),
}

/// Arguments for the combine subcommand.
#[derive(clap::Args)]
struct CombineArgs {
    /// Source dataset roots, in vocabulary-assignment order.
    #[arg(required = true)]
    datasets: Vec<PathBuf>,

    /// Output root for the combined dataset.
    #[arg(short, long)]
    output: PathBuf,

    /// YAML file with a raw-name to canonical-name mapping, replacing the
    /// built-in synonym table.
    #[arg(long)]
    synonyms: Option<PathBuf>,

    /// Output format for the summary ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Run the yolomerge CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), MergeError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Combine(args)) => run_combine(args),
        None => {
            println!("yolomerge {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Combine YOLO-format detection datasets into one.");
            println!();
            println!("Run 'yolomerge --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the combine subcommand.
fn run_combine(args: CombineArgs) -> Result<(), MergeError> {
    match args.report.as_str() {
        "text" | "json" => {}
        other => {
            return Err(MergeError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            )));
        }
    }

    let synonyms = match &args.synonyms {
        Some(path) => vocab::SynonymTable::from_yaml_file(path)?,
        None => vocab::SynonymTable::default(),
    };

    let opts = combine::CombineOptions { synonyms };
    let summary = combine::combine_datasets(&args.datasets, &args.output, &opts)?;

    match args.report.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            println!();
            print!("{}", summary);
            println!();
            println!(
                "Datasets combined successfully into '{}'",
                args.output.display()
            );
        }
    }

    Ok(())
}
