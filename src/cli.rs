// src/cli.rs

use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to work on, as owner/name
    #[arg(short, long, global = true, env = "GITHUB_REPOSITORY")]
    pub repo: Option<String>,

    /// Directory holding the CSV and PNG files [default: data]
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML config file [default: ./file-touches.toml if present]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the source files of a local clone as the allow-list CSV
    Files {
        /// Path to the local git checkout
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Output CSV [default: <data-dir>/file_<name>.csv]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch per-file author history from the GitHub API
    Collect(CollectArgs),

    /// Render the author history as a scatterplot PNG
    Plot {
        /// Authors CSV [default: <data-dir>/authors_<name>.csv]
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output PNG [default: <data-dir>/scatter_<name>.png]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Width of the output image in pixels
        #[arg(long, default_value_t = 1000)]
        width: u32,

        /// Height of the output image in pixels
        #[arg(long, default_value_t = 700)]
        height: u32,
    },
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// GitHub token; repeat or comma-separate to rotate across several
    #[arg(long = "token", env = "GITHUB_TOKENS", value_delimiter = ',', hide_env_values = true)]
    pub tokens: Vec<String>,

    /// File list CSV [default: <data-dir>/file_<name>.csv]
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output CSV [default: <data-dir>/authors_<name>.csv]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// API root, for GitHub Enterprise
    #[arg(long)]
    pub api_base: Option<String>,

    /// Commits per listing page (1-100)
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<u32>,
}

impl Cli {
    /// Command-line values as a config layer to merge over the file
    pub fn config_overrides(&self) -> Config {
        let mut config = Config {
            repo: self.repo.clone(),
            data_dir: self.data_dir.clone(),
            ..Default::default()
        };
        if let Command::Collect(args) = &self.command {
            config.tokens = args.tokens.clone();
            config.api_base = args.api_base.clone();
            config.per_page = args.per_page;
            config.max_pages = args.max_pages;
        }
        config
    }
}
