// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Why a single authenticated request produced no data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("GitHub API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON in response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid repository '{0}', expected owner/name")]
    InvalidRepo(String),

    #[error("no repository configured")]
    MissingRepo,

    #[error("no GitHub tokens configured (use --token, GITHUB_TOKENS or the config file)")]
    NoTokens,

    #[error("per_page must be between 1 and 100, got {0}")]
    InvalidPerPage(u32),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("{0} not found; generate the file list first")]
    InputMissing(PathBuf),

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("no plottable rows in dataset")]
    Empty,

    #[error("failed to save image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
