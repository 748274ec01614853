//! Uepak CLI - Command-line tool for decoding Unreal Engine pak assets.
//!
//! This is the main entry point for the uepak command-line application.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use uepak::asset::property::DEFAULT_MAX_DEPTH;
use uepak::prelude::*;

/// Uepak - Unreal Engine pak asset extraction tool
#[derive(Parser)]
#[command(name = "uepak")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode assets from pak archives into JSON
    Extract {
        /// Pak archive path (glob-style)
        #[arg(short, long, env = "UEPAK_PAK")]
        pak: String,

        /// Comma-separated asset paths to extract (glob-style)
        #[arg(short, long, value_delimiter = ',', required = true)]
        assets: Vec<String>,

        /// Output file
        #[arg(short, long, default_value = "extracted.json")]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Indent the output
        #[arg(long)]
        pretty: bool,

        /// Write the compact projection instead of the full decode
        #[arg(long)]
        compact: bool,

        /// Write one file per asset under this directory instead of one output file
        #[arg(long)]
        split: Option<PathBuf>,

        /// AES-256 key for encrypted archives (hex)
        #[arg(long, env = "UEPAK_AES_KEY", hide_env_values = true)]
        aes_key: Option<String>,

        /// Maximum struct nesting depth
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Decode entries one at a time
        #[arg(long)]
        sequential: bool,
    },

    /// List contents of pak archives
    List {
        /// Pak archive path (glob-style)
        #[arg(short, long, env = "UEPAK_PAK")]
        pak: String,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,

        /// AES-256 key for encrypted indices (hex)
        #[arg(long, env = "UEPAK_AES_KEY", hide_env_values = true)]
        aes_key: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
}

/// Settings of one `extract` run.
struct ExtractOptions {
    pretty: bool,
    compact: bool,
    parallel: bool,
    process: ProcessOptions,
}

/// One decoded asset, tagged with where it came from.
struct Extracted {
    entry: String,
    value: serde_json::Value,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            pak,
            assets,
            output,
            format,
            pretty,
            compact,
            split,
            aes_key,
            max_depth,
            sequential,
        } => {
            let Format::Json = format;
            let options = ExtractOptions {
                pretty,
                compact,
                parallel: !sequential,
                process: ProcessOptions::new().with_max_depth(max_depth),
            };
            cmd_extract(&pak, &assets, &output, split.as_deref(), aes_key.as_deref(), &options)?;
        }
        Commands::List {
            pak,
            filter,
            detailed,
            aes_key,
        } => {
            cmd_list(&pak, filter.as_deref(), detailed, aes_key.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("uepak=info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_extract(
    pak: &str,
    assets: &[String],
    output: &Path,
    split: Option<&Path>,
    aes_key: Option<&str>,
    options: &ExtractOptions,
) -> Result<()> {
    let patterns = compile_patterns(assets)?;
    let transform = make_transform(aes_key)?;
    let archives = find_archives(pak)?;

    let start = Instant::now();
    let mut results = Vec::new();
    let mut report = ProcessReport::default();
    let mut failed_archives = 0;

    for path in &archives {
        info!("Parsing file: {}", path.display());

        let archive = match PakArchive::open_with(path, transform.clone()) {
            Ok(archive) => archive,
            Err(e) => {
                eprintln!("Error opening {}: {}", path.display(), e);
                failed_archives += 1;
                continue;
            }
        };

        match extract_archive(&archive, &patterns, options, &mut results) {
            Ok(archive_report) => report.merge(archive_report),
            Err(e) => {
                eprintln!("Error processing {}: {:#}", path.display(), e);
                failed_archives += 1;
            }
        }
    }

    match split {
        Some(dir) => write_split(dir, &results, options.pretty)?,
        None => write_combined(output, &results, options.pretty)?,
    }

    println!(
        "Extracted {} assets from {} archives in {:?} ({} failed, {} skipped)",
        report.processed,
        archives.len() - failed_archives,
        start.elapsed(),
        report.failed,
        report.skipped
    );
    if failed_archives > 0 {
        eprintln!("{} archives could not be read", failed_archives);
    }

    Ok(())
}

/// Decode the matching entries of one archive into `results`.
fn extract_archive(
    archive: &PakArchive,
    patterns: &[Pattern],
    options: &ExtractOptions,
    results: &mut Vec<Extracted>,
) -> Result<ProcessReport> {
    let selected = archive
        .iter()
        .filter(|e| !uepak::is_companion(e.name()) && matches_any(patterns, e.name()))
        .count();

    let pb = ProgressBar::new(selected as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut decoded = Vec::new();
    let sink = |_: &str, result: std::result::Result<PakEntrySet, EntryFailure>, _: &PakArchive| {
        match result {
            Ok(entry) => decoded.push(entry),
            Err(failure) => {
                pb.suspend(|| eprintln!("Error decoding {}", failure));
            }
        }
        pb.inc(1);
    };

    let processor = PakProcessor::new(archive).with_options(options.process);
    let predicate = |name: &str| matches_any(patterns, name);
    let report = if options.parallel {
        processor.process_parallel(predicate, sink)
    } else {
        processor.process(predicate, sink)
    };
    pb.finish_and_clear();

    // Parallel decoding completes out of order
    decoded.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    for entry in decoded {
        let value = if options.compact {
            let compact = CompactEntry::new(&entry)
                .with_context(|| format!("Failed to compact {}", entry.file_name))?;
            serde_json::to_value(compact)?
        } else {
            serde_json::to_value(&entry)?
        };
        results.push(Extracted {
            entry: entry.file_name,
            value,
        });
    }

    Ok(report)
}

fn write_combined(output: &Path, results: &[Extracted], pretty: bool) -> Result<()> {
    let values: Vec<&serde_json::Value> = results.iter().map(|r| &r.value).collect();
    write_json(output, &values, pretty)?;
    println!("Wrote {} assets to {}", results.len(), output.display());
    Ok(())
}

fn write_split(dir: &Path, results: &[Extracted], pretty: bool) -> Result<()> {
    for result in results {
        let output_path = split_output_path(dir, &result.entry);

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_json(&output_path, &result.value, pretty)?;
    }
    println!("Wrote {} assets under {}", results.len(), dir.display());
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.flush()?;
    Ok(())
}

fn cmd_list(pak: &str, filter: Option<&str>, detailed: bool, aes_key: Option<&str>) -> Result<()> {
    let pattern = filter
        .map(Pattern::new)
        .transpose()
        .context("Invalid filter pattern")?;
    let transform = make_transform(aes_key)?;

    let mut count = 0;
    for path in find_archives(pak)? {
        let archive = match PakArchive::open_with(&path, transform.clone()) {
            Ok(archive) => archive,
            Err(e) => {
                eprintln!("Error opening {}: {}", path.display(), e);
                continue;
            }
        };

        if detailed {
            println!(
                "{} (version {}, mount point {})",
                path.display(),
                archive.version() as u32,
                archive.mount_point()
            );
        }

        for entry in archive.iter() {
            if let Some(pattern) = &pattern {
                if !pattern.matches(entry.name()) {
                    continue;
                }
            }

            if detailed {
                println!(
                    "{:>12} {:>12} {:<6} {} {}",
                    entry.compressed_size(),
                    entry.uncompressed_size(),
                    entry.compression_method().name(),
                    if entry.is_encrypted() { "E" } else { " " },
                    entry.name()
                );
            } else {
                println!("{}", entry.name());
            }
            count += 1;
        }
    }

    println!("\nTotal: {} entries", count);

    Ok(())
}

fn make_transform(aes_key: Option<&str>) -> Result<StandardTransform> {
    match aes_key {
        Some(key) => StandardTransform::with_hex_key(key).context("Invalid AES key"),
        None => Ok(StandardTransform::new()),
    }
}

fn find_archives(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for path in glob::glob(pattern).context("Invalid pak pattern")? {
        paths.push(path?);
    }
    if paths.is_empty() {
        anyhow::bail!("No pak archives match {}", pattern);
    }
    Ok(paths)
}

fn compile_patterns(assets: &[String]) -> Result<Vec<Pattern>> {
    assets
        .iter()
        .map(|asset| Pattern::new(asset).with_context(|| format!("Invalid asset pattern {}", asset)))
        .collect()
}

fn matches_any(patterns: &[Pattern], name: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(name))
}

/// Entry name as a path confined to the output directory.
fn relative_output_path(entry: &str) -> PathBuf {
    Path::new(entry)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// Output file for one entry under `dir`: the entry path with `.json` appended,
/// so `X.uasset` and `X.umap` stay apart.
fn split_output_path(dir: &Path, entry: &str) -> PathBuf {
    let mut path = relative_output_path(entry).into_os_string();
    path.push(".json");
    dir.join(path)
}
