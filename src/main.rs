// src/main.rs

mod cli;
mod collector;
mod config;
mod dataset;
mod error;
mod files;
mod github;
mod model;
mod progress;
mod renderer;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use collector::Collector;
use config::Config;
use github::GithubClient;
use indicatif::{ProgressBar, ProgressStyle};
use progress::SuspendingWriter;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log lines go through the spinner so its redraws never overwrite them
    let bar = ProgressBar::new_spinner();
    let log_bar = bar.clone();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(move || SuspendingWriter::new(log_bar.clone())))
        .with(filter)
        .init();

    let start_time = Instant::now();
    let mut config = Config::discover(cli.config.as_deref())?;
    config.merge(cli.config_overrides());

    match cli.command {
        Command::Files { path, output } => run_files(&config, path, output)?,
        Command::Collect(args) => run_collect(&config, args.input, args.output, &bar)?,
        Command::Plot {
            input,
            output,
            width,
            height,
        } => run_plot(&config, input, output, width, height)?,
    }

    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn run_files(config: &Config, path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let repo = config.repo()?;
    let output = output.unwrap_or_else(|| dataset::file_list_path(&config.data_dir(), &repo));

    let files = files::source_files(&path)
        .with_context(|| format!("Failed to list files of {}", path.display()))?;
    let count = dataset::write_file_list(&output, &files)?;
    println!("Wrote {} source files to {}", count, output.display());
    Ok(())
}

fn run_collect(
    config: &Config,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    bar: &ProgressBar,
) -> Result<()> {
    let settings = config.collect_settings()?;
    let repo = settings.collector.repo.clone();
    let data_dir = config.data_dir();
    let input = input.unwrap_or_else(|| dataset::file_list_path(&data_dir, &repo));
    let output = output.unwrap_or_else(|| dataset::authors_path(&data_dir, &repo));

    let allow_list = dataset::load_allow_list(&input)
        .inspect_err(|e| error!(error = %e, "Cannot collect without a file list"))?;

    let client = GithubClient::new(settings.tokens, settings.api_base);
    let mut collector = Collector::new(client, settings.collector, allow_list);

    bar.set_style(
        ProgressStyle::with_template("{spinner} {pos} commits {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let collect_start = Instant::now();
    let report = collector.collect_with_progress(bar);
    println!(
        "Collection finished in {:.2?}. {} pages, {} commits, {} touches, {} skipped; {}.",
        collect_start.elapsed(),
        report.pages,
        report.commits_recorded,
        report.touches,
        report.skipped.len(),
        report.stop
    );
    for skip in &report.skipped {
        debug!(page = skip.page, sha = ?skip.sha, reason = %skip.reason, "Skipped commit");
    }
    if report.authors.is_empty() {
        warn!("No allow-listed source file was touched");
    }

    let rows = dataset::write_authors(&output, &report.authors)?;
    println!(
        "Author data for {} files ({} rows) saved to {}",
        report.authors.len(),
        rows,
        output.display()
    );
    Ok(())
}

fn run_plot(
    config: &Config,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    width: u32,
    height: u32,
) -> Result<()> {
    let data_dir = config.data_dir();
    let (input, output) = match (input, output) {
        (Some(input), Some(output)) => (input, output),
        (input, output) => {
            let repo = config.repo()?;
            (
                input.unwrap_or_else(|| dataset::authors_path(&data_dir, &repo)),
                output.unwrap_or_else(|| dataset::scatter_path(&data_dir, &repo)),
            )
        }
    };

    let records = dataset::read_touches(&input)?;
    let data = renderer::ScatterData::from_records(&records)?;
    let opts = renderer::PlotOptions {
        width,
        height,
        ..Default::default()
    };
    renderer::render_to_file(&data, &opts, &output)?;
    println!(
        "Plotted {} touches of {} files by {} authors to {}",
        data.points.len(),
        data.files.len(),
        data.authors.len(),
        output.display()
    );
    Ok(())
}
