// src/model.rs

use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// File suffixes counted as source code
pub const SOURCE_EXTENSIONS: [&str; 7] = [".py", ".java", ".cpp", ".c", ".h", ".js", ".ts"];

/// Suffix test against [`SOURCE_EXTENSIONS`]
pub fn is_source_file(filename: &str) -> bool {
    SOURCE_EXTENSIONS.iter().any(|ext| filename.ends_with(ext))
}

/// A GitHub repository in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRepo(s.to_string());
        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(RepoId {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One commit touching one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTouch {
    pub author: String,
    /// ISO-8601 author timestamp exactly as GitHub reported it
    pub date: String,
}

impl FileTouch {
    pub fn new(author: impl Into<String>, date: impl Into<String>) -> Self {
        FileTouch {
            author: author.into(),
            date: date.into(),
        }
    }
}

/// Touch history of a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHistory {
    pub filename: String,
    pub touches: Vec<FileTouch>,
}

/// Maps filenames to their touches.
///
/// Files keep the order in which they were first seen and touches keep
/// commit discovery order, so iterating reproduces the collection order.
#[derive(Debug, Default, Clone)]
pub struct AuthorsMap {
    index: HashMap<String, usize>,
    files: Vec<FileHistory>,
}

impl AuthorsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a touch to `filename`, creating its entry on first sight
    pub fn record(&mut self, filename: &str, touch: FileTouch) {
        let id = match self.index.get(filename) {
            Some(&id) => id,
            None => {
                let id = self.files.len();
                self.index.insert(filename.to_string(), id);
                self.files.push(FileHistory {
                    filename: filename.to_string(),
                    touches: Vec::new(),
                });
                id
            }
        };
        self.files[id].touches.push(touch);
    }

    #[cfg(test)]
    pub fn get(&self, filename: &str) -> Option<&[FileTouch]> {
        self.index
            .get(filename)
            .map(|&id| self.files[id].touches.as_slice())
    }

    #[cfg(test)]
    pub fn contains(&self, filename: &str) -> bool {
        self.index.contains_key(filename)
    }

    /// Number of distinct files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of (filename, touch) pairs
    #[cfg(test)]
    pub fn touch_count(&self) -> usize {
        self.files.iter().map(|f| f.touches.len()).sum()
    }

    #[cfg(test)]
    pub fn files(&self) -> impl Iterator<Item = &FileHistory> {
        self.files.iter()
    }

    /// Flattened (filename, touch) pairs in discovery order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &FileTouch)> {
        self.files
            .iter()
            .flat_map(|f| f.touches.iter().map(move |t| (f.filename.as_str(), t)))
    }
}

/// The set of filenames whose touches are recorded
#[derive(Debug, Default, Clone)]
pub struct AllowList {
    files: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowList {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains(filename)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_source_suffixes() {
        assert!(is_source_file("src/main.py"));
        assert!(is_source_file("lib/Foo.java"));
        assert!(is_source_file("include/x.h"));
        assert!(is_source_file("web/app.ts"));
        assert!(!is_source_file("README.md"));
        assert!(!is_source_file("b.txt"));
        assert!(!is_source_file(""));
    }

    #[test]
    fn parses_repo_id() {
        let repo: RepoId = "scottyab/rootbeer".parse().unwrap();
        assert_eq!(repo.owner, "scottyab");
        assert_eq!(repo.name, "rootbeer");
        assert_eq!(repo.to_string(), "scottyab/rootbeer");

        assert!("rootbeer".parse::<RepoId>().is_err());
        assert!("/rootbeer".parse::<RepoId>().is_err());
        assert!("a/b/c".parse::<RepoId>().is_err());
    }

    #[test]
    fn authors_map_keeps_discovery_order() {
        let mut map = AuthorsMap::new();
        map.record("b.py", FileTouch::new("Bob", "2024-01-02T00:00:00Z"));
        map.record("a.py", FileTouch::new("Alice", "2024-01-01T00:00:00Z"));
        map.record("b.py", FileTouch::new("Alice", "2024-01-03T00:00:00Z"));

        let order: Vec<&str> = map.files().map(|f| f.filename.as_str()).collect();
        assert_eq!(order, vec!["b.py", "a.py"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.touch_count(), 3);
        assert_eq!(
            map.get("b.py").unwrap(),
            &[
                FileTouch::new("Bob", "2024-01-02T00:00:00Z"),
                FileTouch::new("Alice", "2024-01-03T00:00:00Z"),
            ]
        );

        let rows: Vec<(&str, &str)> = map.rows().map(|(f, t)| (f, t.author.as_str())).collect();
        assert_eq!(rows, vec![("b.py", "Bob"), ("b.py", "Alice"), ("a.py", "Alice")]);
    }
}
