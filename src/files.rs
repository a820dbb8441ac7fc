// src/files.rs

use crate::model::is_source_file;
use git2::{ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use std::path::Path;
use tracing::debug;

/// Source files present in the HEAD tree of the repository containing
/// `repo_path`, sorted by path.
pub fn source_files(repo_path: &Path) -> Result<Vec<String>, git2::Error> {
    let repo = Repository::discover(repo_path)?;
    debug!(path = %repo.path().display(), "Opened git repository");

    let tree = repo.head()?.peel_to_tree()?;
    let mut files = Vec::new();
    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() == Some(ObjectType::Blob) {
            if let Some(name) = entry.name() {
                let path = format!("{}{}", root, name);
                if is_source_file(&path) {
                    files.push(path);
                }
            }
        }
        TreeWalkResult::Ok
    })?;

    files.sort();
    Ok(files)
}
