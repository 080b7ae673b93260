//! Pack Schema CLI
//!
//! Validates intelligence pack manifests and roadmap documents against their
//! JSON Schemas, and generates markdown schema references.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pack_schema::{
    load_schema, render, validate_dir, validate_file, write_reference, BatchReport, DocOptions,
    RecordResult, RecordStatus, ValidateOptions,
};

#[derive(Parser)]
#[command(name = "pack-schema")]
#[command(about = "Validate pack manifests and generate schema references")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every pack manifest in a directory against the pack schema
    Validate {
        /// Schema file
        #[arg(long, default_value = "data/packs/schema.json")]
        schema: PathBuf,

        /// Directory of manifest records (the schema file is skipped by name)
        #[arg(long, default_value = "data/packs")]
        dir: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Reject fields not declared in the schema
        #[arg(long)]
        strict: bool,

        /// Only show failing records
        #[arg(long, short)]
        quiet: bool,
    },

    /// Validate a single document (e.g. the roadmap) against its schema
    ValidateDoc {
        /// Schema file
        #[arg(long, default_value = "data/roadmap/schema.json")]
        schema: PathBuf,

        /// Document file
        #[arg(long, default_value = "data/roadmap/roadmap.json")]
        file: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Reject fields not declared in the schema
        #[arg(long)]
        strict: bool,
    },

    /// Generate a markdown reference document from a schema
    Docs {
        /// Schema file
        #[arg(long, default_value = "data/packs/schema.json")]
        schema: PathBuf,

        /// Output file
        #[arg(long, default_value = "docs/schema-reference.md")]
        output: PathBuf,

        /// Document title
        #[arg(long, default_value = "Pack Schema Reference")]
        title: String,

        /// Print to stdout instead of writing the output file
        #[arg(long)]
        stdout: bool,

        /// Omit the trailing "Last generated" line (diffable output)
        #[arg(long)]
        no_timestamp: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            schema,
            dir,
            json,
            strict,
            quiet,
        } => run_validate(&schema, &dir, json, strict, quiet),

        Commands::ValidateDoc {
            schema,
            file,
            json,
            strict,
        } => run_validate_doc(&schema, &file, json, strict),

        Commands::Docs {
            schema,
            output,
            title,
            stdout,
            no_timestamp,
        } => run_docs(&schema, &output, title, stdout, no_timestamp),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_validate(
    schema_path: &Path,
    dir: &Path,
    json: bool,
    strict: bool,
    quiet: bool,
) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        report_error(json, &e.to_string());
        1u8
    })?;

    let options = ValidateOptions::new().deny_unknown(strict);
    // Skip the schema file by name, but only when it lives inside the record
    // directory; a record elsewhere may legitimately share the base name.
    let exclude = if schema_in_dir(schema_path, dir) {
        schema_path.file_name()
    } else {
        None
    };
    let report = validate_dir(&schema, dir, exclude, &options).map_err(|e| {
        report_error(json, &e.to_string());
        1u8
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
    } else {
        print_batch_report(&report, quiet);
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_validate_doc(schema_path: &Path, file: &Path, json: bool, strict: bool) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        report_error(json, &e.to_string());
        1u8
    })?;

    let options = ValidateOptions::new().deny_unknown(strict);
    let result = validate_file(&schema, file, &options);

    if json {
        println!("{}", serde_json::to_string_pretty(&result).unwrap());
    } else {
        print_record_result(&result, false);
    }

    if result.passed() {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_docs(
    schema_path: &Path,
    output: &Path,
    title: String,
    to_stdout: bool,
    no_timestamp: bool,
) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        eprintln!("Error: {e}");
        1u8
    })?;

    let mut options = DocOptions::new(title);
    if !no_timestamp {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        options = options.generated_at(timestamp);
    }

    if to_stdout {
        print!("{}", render(&schema, &options));
        return Ok(());
    }

    write_reference(&schema, &options, output).map_err(|e| {
        eprintln!("Error: {e}");
        1u8
    })?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn print_batch_report(report: &BatchReport, quiet: bool) {
    for record in &report.results {
        print_record_result(record, quiet);
    }

    println!();
    if report.is_ok() {
        println!(
            "\x1b[32m✓ {} records checked, all passed\x1b[0m",
            report.records_checked
        );
    } else {
        println!(
            "\x1b[31m✗ {} records checked: {} passed, {} failed ({} errors)\x1b[0m",
            report.records_checked, report.passed, report.failed, report.errors
        );
    }
}

fn print_record_result(record: &RecordResult, quiet: bool) {
    match record.status {
        RecordStatus::Passed => {
            if !quiet {
                println!("  \x1b[32m✓\x1b[0m {}", record.name);
            }
        }
        RecordStatus::Failed => {
            println!("  \x1b[31m✗\x1b[0m {}", record.name);
            for error in &record.errors {
                println!("    \x1b[31m[{}]\x1b[0m {}", error.kind, error);
            }
        }
    }
}

/// Returns true if the schema file's parent directory is the record
/// directory. Paths are canonicalized so spellings like `./data/packs` and
/// `data/packs/` compare equal.
fn schema_in_dir(schema_path: &Path, dir: &Path) -> bool {
    let Some(parent) = schema_path.parent() else {
        return false;
    };
    // A bare file name has an empty parent, meaning the current directory.
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let parent = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    parent == dir
}

/// Output an error message in plain text or JSON format.
fn report_error(json: bool, msg: &str) {
    if json {
        // Messages can embed quotes and newlines (regex errors do); let the
        // serializer escape them.
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
