//! SqPack CLI - Command-line tool for verifying and inspecting SqPack archives.
//!
//! This is the main entry point for the `sqpack` command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use sqpack::prelude::*;

/// SqPack - game archive verification tool
#[derive(Parser)]
#[command(name = "sqpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open archives with full hash and coverage verification
    Verify {
        /// An `.index` file or a directory searched for them
        #[arg(env = "SQPACK_PATH")]
        path: PathBuf,

        /// Skip hash and coverage checks
        #[arg(long)]
        fast: bool,
    },

    /// List the resolved file table of an archive
    List {
        /// Path to the `.index` file
        #[arg(env = "SQPACK_PATH")]
        index: PathBuf,

        /// Only show entries stored in this data file
        #[arg(short, long)]
        dat: Option<u32>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Skip hash and coverage checks
        #[arg(long)]
        fast: bool,
    },

    /// Write the raw stored bytes of one entry
    DumpRaw {
        /// Path to the `.index` file
        #[arg(short, long, env = "SQPACK_PATH")]
        index: PathBuf,

        /// Game path of the entry, e.g. `exd/root.exl`
        #[arg(short, long, conflicts_with = "entry")]
        path: Option<String>,

        /// Position of the entry in the resolved table
        #[arg(short, long)]
        entry: Option<usize>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Verify { path, fast } => {
            cmd_verify(&path, !fast)?;
        }
        Commands::List {
            index,
            dat,
            json,
            fast,
        } => {
            cmd_list(&index, dat, json, !fast)?;
        }
        Commands::DumpRaw {
            index,
            path,
            entry,
            output,
        } => {
            cmd_dump_raw(&index, path.as_deref(), entry, &output)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_verify(path: &Path, strict: bool) -> Result<()> {
    let archives = discover_archives(path)?;
    if archives.is_empty() {
        bail!("no .index files found under {}", path.display());
    }

    println!("Verifying {} archives...", archives.len());

    let pb = ProgressBar::new(archives.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let options = OpenOptions::new().strict(strict);
    let start = Instant::now();
    let results: Vec<(PathBuf, Result<usize, String>)> = archives
        .par_iter()
        .map(|archive| {
            let result = options
                .open(archive)
                .map(|reader| reader.entry_count())
                .map_err(|e| e.to_string());
            pb.inc(1);
            (archive.clone(), result)
        })
        .collect();
    pb.finish_and_clear();

    let mut failures = 0;
    for (archive, result) in &results {
        match result {
            Ok(count) => println!("OK    {} ({} entries)", archive.display(), count),
            Err(e) => {
                println!("FAIL  {}: {}", archive.display(), e);
                failures += 1;
            }
        }
    }

    println!(
        "\n{} verified, {} failed in {:?}",
        results.len() - failures,
        failures,
        start.elapsed()
    );

    if failures > 0 {
        bail!("{failures} archives failed verification");
    }

    Ok(())
}

fn cmd_list(index: &Path, dat: Option<u32>, json: bool, strict: bool) -> Result<()> {
    let archive = SqpackReader::open(index, strict).context("Failed to open SqPack archive")?;

    let entries: Vec<&ResolvedEntry> = archive
        .iter()
        .filter(|e| dat.map_or(true, |d| e.data_file_index() == d))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        println!(
            "dat{} {:>12x} {:>10} {} {} {}",
            entry.data_file_index(),
            entry.offset(),
            entry.size().map_or_else(|| "?".to_string(), |s| s.to_string()),
            format_hash(entry.path_hash()),
            format_hash(entry.name_hash()),
            format_hash(entry.full_path_hash()),
        );
    }

    println!("\nTotal: {} entries", entries.len());

    Ok(())
}

fn cmd_dump_raw(index: &Path, path: Option<&str>, entry: Option<usize>, output: &Path) -> Result<()> {
    let archive = SqpackReader::open(index, false).context("Failed to open SqPack archive")?;

    let resolved = match (path, entry) {
        (Some(path), _) => archive
            .find(path)
            .with_context(|| format!("no entry for {path}"))?,
        (None, Some(i)) => archive
            .get(i)
            .with_context(|| format!("entry {i} out of range ({} entries)", archive.entry_count()))?,
        (None, None) => bail!("either --path or --entry is required"),
    };

    let range = archive.resolve(resolved)?;
    fs::write(output, range.as_bytes()).context("Failed to write output file")?;

    println!(
        "Wrote {} bytes from dat{} at {:#x} to {}",
        range.len(),
        range.data_file_index(),
        range.offset(),
        output.display()
    );

    Ok(())
}

/// A single `.index` file, or every `.index` file below a directory.
fn discover_archives(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut archives = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("index")
        {
            archives.push(entry.into_path());
        }
    }
    archives.sort();

    Ok(archives)
}

fn format_hash(hash: Option<u32>) -> String {
    hash.map_or_else(|| "--------".to_string(), |h| format!("{h:08x}"))
}
