use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the identity verification workspace",
    long_about = "A unified CLI for CI checks and for building sample\n\
                  application archives for manual end-to-end runs."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci,
    /// Build an upload archive `<uuid>.zip` from a selfie, a license and a details CSV
    SampleArchive {
        /// Application identifier; names the archive and its members
        #[arg(long)]
        uuid: String,
        /// Selfie image (PNG)
        #[arg(long)]
        selfie: PathBuf,
        /// Driver license image (PNG)
        #[arg(long)]
        license: PathBuf,
        /// Details CSV: header plus one data row
        #[arg(long)]
        details: PathBuf,
        /// Directory the archive is written to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

/// Writes `<output_dir>/<uuid>.zip` with members named the way the ingest
/// stage expects: `<uuid>_selfie.png`, `<uuid>_license.png`, `<uuid>_details.csv`.
fn build_sample_archive(
    uuid: &str,
    selfie: &Path,
    license: &Path,
    details: &Path,
    output_dir: &Path,
) -> PathBuf {
    fs::create_dir_all(output_dir).expect("failed to create output directory");
    let archive_path = output_dir.join(format!("{uuid}.zip"));
    let file = fs::File::create(&archive_path).expect("failed to create sample archive");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (suffix, source) in [
        ("selfie.png", selfie),
        ("license.png", license),
        ("details.csv", details),
    ] {
        let contents = fs::read(source)
            .unwrap_or_else(|error| panic!("failed to read '{}': {error}", source.display()));
        zip.start_file(format!("{uuid}_{suffix}"), options)
            .expect("failed to start archive entry");
        zip.write_all(&contents)
            .expect("failed to write archive entry");
    }
    zip.finish().expect("failed to finish sample archive");
    archive_path
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test idv_core");
    run_cargo(&["test", "-p", "idv_core"]);

    step("Test idv_lambda");
    run_cargo(&["test", "-p", "idv_lambda"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => {
            ci_check();
            eprintln!("\nCI job passed.");
        }
        Commands::SampleArchive {
            uuid,
            selfie,
            license,
            details,
            output_dir,
        } => {
            let archive = build_sample_archive(&uuid, &selfie, &license, &details, &output_dir);
            eprintln!(
                "Wrote {}. Upload it under any prefix to start a run.",
                archive.display()
            );
        }
    }
}
