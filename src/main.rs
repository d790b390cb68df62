use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use codemap::config::DEFAULT_EXCLUDE_PATTERNS;
use codemap::core::NeverCancel;
use codemap::formatters::{HtmlFormatter, JsonFormatter};
use codemap::parsers::store::FileStore;
use codemap::{AnalysisConfig, Pipeline};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "codemap",
    version,
    about = "Builds a dependency graph of a JavaScript/TypeScript workspace"
)]
struct Cli {
    /// Workspace root to analyze
    #[arg(value_name = "PATH")]
    input: PathBuf,

    /// Output file path
    #[arg(short, long, value_name = "FILE", default_value = "code-map.json")]
    output: PathBuf,

    /// Export format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
    format: ExportFormat,

    /// Comma-separated substrings; matching relative paths are skipped
    #[arg(
        short,
        long,
        value_name = "PATTERNS",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXCLUDE_PATTERNS.map(String::from)
    )]
    exclude: Vec<String>,

    /// Parse every file, ignoring and not updating the cache
    #[arg(long)]
    no_cache: bool,

    /// Directory holding the cache snapshot
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Erase the cache snapshot before analyzing
    #[arg(long)]
    clear_cache: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum ExportFormat {
    Json,
    Html,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CODEMAP_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "codemap=debug,info" } else { "codemap=info,warn" })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        input,
        output,
        format,
        exclude,
        no_cache,
        cache_dir,
        clear_cache,
        verbose: _,
    } = cli;

    let start_time = Instant::now();

    let exclude: Vec<String> = exclude
        .into_iter()
        .map(|pattern| pattern.trim().to_string())
        .filter(|pattern| !pattern.is_empty())
        .collect();

    let config = AnalysisConfig::new()
        .with_exclude_patterns(exclude)
        .with_cache_enabled(!no_cache);

    let store = match cache_dir {
        Some(dir) => FileStore::new(dir),
        None => FileStore::default_location(),
    }
    .context("failed to open cache directory")?;

    let mut pipeline = Pipeline::new(config, Box::new(store))?;
    if clear_cache {
        pipeline.clear_cache(&input).context("failed to clear cache")?;
    }

    let result = pipeline.run(&input, &NeverCancel)?;

    match format {
        ExportFormat::Json => JsonFormatter::new().format_to_file(&result.graph, &output)?,
        ExportFormat::Html => HtmlFormatter::new().format_to_file(&result.graph, &output)?,
    }

    let analysis = &result.analysis;
    println!("Workspace: {}", result.graph.metadata.workspace_path);
    println!(
        "Files: {} ({} from cache)",
        analysis.files.len(),
        result.cache_hits
    );
    println!("Dependencies: {}", analysis.dependencies.len());
    println!("Circular dependencies: {}", analysis.circular_dependencies.len());
    println!("Orphaned files: {}", analysis.orphaned_files.len());
    println!("Entry points: {}", analysis.entry_points.len());
    println!("Code map written to {}", output.display());
    println!(
        "Total execution time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
