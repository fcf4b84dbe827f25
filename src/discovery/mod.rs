use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::DiscoveryError;

/// Single pass over an input tree yielding the absolute paths of regular
/// files whose extension matches, compared case-insensitively.
///
/// An unreadable directory yields one `Err` and its subtree is skipped;
/// siblings are still visited. Once exhausted the walk is over, nothing is
/// rescanned.
pub struct Discovery {
    walker: walkdir::IntoIter,
    extension: String,
}

impl Discovery {
    pub fn new(root: &Path, extension: &str) -> Result<Self, DiscoveryError> {
        let root = std::fs::canonicalize(root)
            .map_err(|e| DiscoveryError::Root(root.to_path_buf(), e))?;
        Ok(Self {
            walker: WalkDir::new(root).sort_by_file_name().into_iter(),
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

impl Iterator for Discovery {
    type Item = Result<PathBuf, DiscoveryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(DiscoveryError::Walk(e))),
            };
            if entry.file_type().is_file() && self.matches(entry.path()) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}

/// Runs a whole walk, keeping every match alongside the errors for the
/// subtrees that could not be read. Only an unreadable root fails outright.
pub fn discover(
    root: &Path,
    extension: &str,
) -> Result<(Vec<PathBuf>, Vec<DiscoveryError>), DiscoveryError> {
    let mut found = Vec::new();
    let mut errors = Vec::new();
    for item in Discovery::new(root, extension)? {
        match item {
            Ok(path) => found.push(path),
            Err(e) => errors.push(e),
        }
    }
    Ok((found, errors))
}
