// src/dataset.rs

//! CSV files exchanged between the pipeline steps.
//!
//! * `file_{name}.csv` lists the repository's files, first column `Filename`.
//! * `authors_{name}.csv` holds one `Filename,Author,Date` row per touch.

use crate::error::DatasetError;
use crate::model::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub fn file_list_path(data_dir: &Path, repo: &RepoId) -> PathBuf {
    data_dir.join(format!("file_{}.csv", repo.name))
}

pub fn authors_path(data_dir: &Path, repo: &RepoId) -> PathBuf {
    data_dir.join(format!("authors_{}.csv", repo.name))
}

pub fn scatter_path(data_dir: &Path, repo: &RepoId) -> PathBuf {
    data_dir.join(format!("scatter_{}.png", repo.name))
}

/// A row of the authors file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TouchRecord {
    pub filename: String,
    pub author: String,
    pub date: String,
}

/// Reads the allow-list from the first column of `path`, keeping source
/// files only.
pub fn load_allow_list(path: &Path) -> Result<AllowList, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::InputMissing(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;

    let mut files = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|source| csv_error(path, source))?;
        match record.get(0) {
            Some(filename) if !filename.is_empty() => {
                if is_source_file(filename) {
                    files.push(filename.to_string());
                } else {
                    debug!(filename, "Not a source file");
                }
            }
            _ => warn!(row = line + 2, ?record, "Skipping malformed row"),
        }
    }

    info!(path = %path.display(), files = files.len(), "Loaded file list");
    Ok(AllowList::new(files))
}

/// Writes a single-column `Filename` file.
pub fn write_file_list(path: &Path, files: &[String]) -> Result<usize, DatasetError> {
    let mut writer = create_writer(path)?;
    writer
        .write_record(["Filename"])
        .map_err(|source| csv_error(path, source))?;
    for filename in files {
        writer
            .write_record([filename])
            .map_err(|source| csv_error(path, source))?;
    }
    finish(writer, path)?;
    Ok(files.len())
}

/// Writes every touch in discovery order and returns the row count.
pub fn write_authors(path: &Path, authors: &AuthorsMap) -> Result<usize, DatasetError> {
    let mut writer = create_writer(path)?;
    writer
        .write_record(["Filename", "Author", "Date"])
        .map_err(|source| csv_error(path, source))?;

    let mut rows = 0;
    for (filename, touch) in authors.rows() {
        writer
            .write_record([filename, touch.author.as_str(), touch.date.as_str()])
            .map_err(|source| csv_error(path, source))?;
        rows += 1;
    }
    finish(writer, path)?;
    Ok(rows)
}

pub fn read_touches(path: &Path) -> Result<Vec<TouchRecord>, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::InputMissing(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path).map_err(|source| csv_error(path, source))?;
    reader
        .deserialize()
        .collect::<Result<Vec<TouchRecord>, _>>()
        .map_err(|source| csv_error(path, source))
}

fn create_writer(path: &Path) -> Result<csv::Writer<fs::File>, DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DatasetError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    csv::Writer::from_path(path).map_err(|source| csv_error(path, source))
}

fn finish(mut writer: csv::Writer<fs::File>, path: &Path) -> Result<(), DatasetError> {
    writer.flush().map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_error(path: &Path, source: csv::Error) -> DatasetError {
    DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
