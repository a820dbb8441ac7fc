// src/collector.rs

use crate::error::FetchError;
use crate::github::{GithubClient, Transport};
use crate::model::*;
use indicatif::ProgressBar;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// GitHub's maximum page size for the commit listing
pub const MAX_PER_PAGE: u32 = 100;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub repo: RepoId,
    pub per_page: u32,
    /// Stop after this many pages; `None` pages until GitHub runs out
    pub max_pages: Option<u32>,
}

impl CollectorConfig {
    pub fn new(repo: RepoId) -> Self {
        CollectorConfig {
            repo,
            per_page: MAX_PER_PAGE,
            max_pages: None,
        }
    }
}

/// Why the paging loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The page request itself failed
    FetchFailed(FetchError),
    /// The page decoded to something other than an array, usually an error object
    NotAList,
    /// An empty array, past the last page
    Exhausted,
    /// `max_pages` reached
    PageLimit,
}

/// Why a single commit contributed nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingSha,
    FetchFailed(FetchError),
    NotAnObject,
    /// Detail lacks the `commit` section or a `files` list
    MissingSections,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::FetchFailed(e) => write!(f, "page request failed ({})", e),
            StopReason::NotAList => f.write_str("listing was not a list"),
            StopReason::Exhausted => f.write_str("no more commits"),
            StopReason::PageLimit => f.write_str("page limit reached"),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSha => f.write_str("no sha in listing"),
            SkipReason::FetchFailed(e) => write!(f, "detail request failed ({})", e),
            SkipReason::NotAnObject => f.write_str("detail is not an object"),
            SkipReason::MissingSections => f.write_str("detail lacks commit or files"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Detail processed; `touches` allow-listed files were recorded
    Recorded { touches: usize },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Commits(Vec<Value>),
    Stop(StopReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCommit {
    pub page: u32,
    pub sha: Option<String>,
    pub reason: SkipReason,
}

/// Everything a collection run produced
#[derive(Debug)]
pub struct CollectionReport {
    pub authors: AuthorsMap,
    /// Pages that yielded commits
    pub pages: u32,
    pub commits_recorded: usize,
    /// Touches recorded across all commits
    pub touches: usize,
    pub skipped: Vec<SkippedCommit>,
    pub stop: StopReason,
}

/// Walks a repository's commit history and attributes allow-listed files
/// to commit authors.
pub struct Collector<T: Transport> {
    client: GithubClient<T>,
    config: CollectorConfig,
    allow_list: AllowList,
}

impl<T: Transport> Collector<T> {
    pub fn new(client: GithubClient<T>, config: CollectorConfig, allow_list: AllowList) -> Self {
        Collector {
            client,
            config,
            allow_list,
        }
    }

    #[cfg(test)]
    pub fn client(&self) -> &GithubClient<T> {
        &self.client
    }

    #[cfg(test)]
    pub fn collect(&mut self) -> CollectionReport {
        self.collect_with_progress(&ProgressBar::hidden())
    }

    /// Runs the paging loop to completion, ticking `bar` once per commit.
    pub fn collect_with_progress(&mut self, bar: &ProgressBar) -> CollectionReport {
        info!(repo = %self.config.repo, allowed = self.allow_list.len(), "Collecting commit history");

        let mut authors = AuthorsMap::new();
        let mut skipped = Vec::new();
        let mut commits_recorded = 0;
        let mut touches_recorded = 0;
        let mut pages = 0;
        let mut page = 1;

        let stop = loop {
            if self.config.max_pages.is_some_and(|max| pages >= max) {
                break StopReason::PageLimit;
            }

            let summaries = match self.fetch_page(page) {
                PageOutcome::Commits(summaries) => summaries,
                PageOutcome::Stop(reason) => break reason,
            };
            pages += 1;
            bar.set_message(format!("page {}", page));

            for summary in &summaries {
                match self.process_commit(summary, &mut authors) {
                    CommitOutcome::Recorded { touches } => {
                        commits_recorded += 1;
                        touches_recorded += touches;
                    }
                    CommitOutcome::Skipped(reason) => skipped.push(SkippedCommit {
                        page,
                        sha: sha_of(summary).map(String::from),
                        reason,
                    }),
                }
                bar.inc(1);
            }

            page += 1;
        };

        info!(%stop, pages, commits_recorded, skipped = skipped.len(), "No more commits or error in response");
        bar.finish_with_message("Collection complete");

        CollectionReport {
            authors,
            pages,
            commits_recorded,
            touches: touches_recorded,
            skipped,
            stop,
        }
    }

    /// Requests one listing page and decides whether paging continues.
    pub fn fetch_page(&mut self, page: u32) -> PageOutcome {
        let url = self
            .client
            .commits_page_url(&self.config.repo, page, self.config.per_page);
        match self.client.get_json(&url) {
            Err(e) => PageOutcome::Stop(StopReason::FetchFailed(e)),
            Ok(Value::Array(summaries)) if summaries.is_empty() => {
                PageOutcome::Stop(StopReason::Exhausted)
            }
            Ok(Value::Array(summaries)) => {
                debug!(page, commits = summaries.len(), "Fetched commit page");
                PageOutcome::Commits(summaries)
            }
            Ok(other) => {
                warn!(page, payload = %other, "Commit listing is not a list");
                PageOutcome::Stop(StopReason::NotAList)
            }
        }
    }

    /// Fetches the detail for one listing entry and records its allow-listed
    /// files into `authors`.
    pub fn process_commit(&mut self, summary: &Value, authors: &mut AuthorsMap) -> CommitOutcome {
        let Some(sha) = sha_of(summary) else {
            debug!("Commit summary without sha");
            return CommitOutcome::Skipped(SkipReason::MissingSha);
        };

        let url = self.client.commit_url(&self.config.repo, sha);
        let detail = match self.client.get_json(&url) {
            Ok(detail) => detail,
            Err(e) => {
                warn!(%sha, "Unexpected response for commit");
                return CommitOutcome::Skipped(SkipReason::FetchFailed(e));
            }
        };

        let Some(detail) = detail.as_object() else {
            warn!(%sha, "Unexpected response for commit");
            return CommitOutcome::Skipped(SkipReason::NotAnObject);
        };

        let (Some(commit), Some(files)) = (
            detail.get("commit"),
            detail.get("files").and_then(Value::as_array),
        ) else {
            warn!(%sha, "Skipping commit: missing expected data");
            return CommitOutcome::Skipped(SkipReason::MissingSections);
        };

        let author = &commit["author"];
        let name = author["name"].as_str().unwrap_or(UNKNOWN);
        let date = author["date"].as_str().unwrap_or(UNKNOWN);

        let mut touches = 0;
        for filename in files.iter().filter_map(|f| f["filename"].as_str()) {
            if !filename.is_empty() && is_source_file(filename) && self.allow_list.contains(filename) {
                authors.record(filename, FileTouch::new(name, date));
                touches += 1;
            }
        }

        debug!(%sha, author = name, touches, "Processed commit");
        CommitOutcome::Recorded { touches }
    }
}

fn sha_of(summary: &Value) -> Option<&str> {
    summary
        .get("sha")
        .and_then(Value::as_str)
        .filter(|sha| !sha.is_empty())
}
