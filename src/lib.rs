//! Aihubconv: convert AIHub OCR datasets into flat training layouts.
//!
//! The input is a JSON label manifest plus per-group directories of image
//! files; the output is a mirrored tree of renamed or cropped images with
//! one tab-separated `labels.txt` manifest per output directory.
//!
//! # Modules
//!
//! - [`manifest`]: manifest schema, loading, bbox type
//! - [`scan`]: group and file enumeration
//! - [`validate`]: per-annotation validation and issue reporting
//! - [`index`]: label lookup structures (linear, sorted, region-grouping)
//! - [`convert`]: the conversion pipeline and run summaries
//! - [`error`]: error types for aihubconv operations

pub mod convert;
pub mod error;
pub mod index;
pub mod manifest;
pub mod scan;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use convert::{run_convert, ConvertOptions, ConvertSummary, Strategy};
pub use error::ConvertError;

/// The aihubconv CLI application.
#[derive(Parser)]
#[command(name = "aihubconv")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert an input tree into a flat image + label-file layout.
    Convert(ConvertArgs),

    /// Check the annotations in a label manifest without writing output.
    Validate(ValidateArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Root directory of the input data, one subdirectory per group.
    #[arg(long)]
    input_path: PathBuf,

    /// Path of the JSON label manifest.
    #[arg(long)]
    label_file: PathBuf,

    /// Destination directory; must not exist yet.
    #[arg(long)]
    output_path: PathBuf,

    /// Conversion strategy.
    #[arg(long, value_enum)]
    strategy: Strategy,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Path of the JSON label manifest to check.
    label_file: PathBuf,
}

/// Run the aihubconv CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ConvertError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert_cmd(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            // No subcommand: print a usage hint and exit successfully.
            println!("aihubconv {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Convert AIHub OCR datasets into flat training layouts.");
            println!();
            println!("Run 'aihubconv --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the convert subcommand.
fn run_convert_cmd(args: ConvertArgs) -> Result<(), ConvertError> {
    let opts = ConvertOptions {
        input_path: args.input_path,
        label_file: args.label_file,
        output_path: args.output_path,
        strategy: args.strategy,
    };

    let summary = convert::run_convert(&opts)?;
    print!("{}", summary);
    Ok(())
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), ConvertError> {
    if !args.label_file.is_file() {
        return Err(ConvertError::LabelFileMissing(args.label_file));
    }

    let manifest = manifest::read_manifest(&args.label_file)?;
    let index = index::RegionIndex::build(&manifest);

    if index.issues().is_empty() {
        println!(
            "Validation passed: {} image(s), {} annotation(s), no issues found",
            manifest.images.len(),
            manifest.annotations.len()
        );
        return Ok(());
    }

    for record in index.issues() {
        println!("{}", record);
    }

    Err(ConvertError::ValidationFailed {
        invalid: index.issues().len(),
    })
}
