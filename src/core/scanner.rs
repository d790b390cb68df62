use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::config::AnalysisConfig;
use crate::parsers::is_source_file;

/// Enumerates candidate source files beneath a workspace root.
pub struct FileScanner {
    config: AnalysisConfig,
}

impl FileScanner {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Recognised source files under `root_path`, in walk order (entries
    /// sorted by file name within each directory). Excluded directories are
    /// not descended into.
    pub fn scan_directory(&self, root_path: &Path) -> Vec<PathBuf> {
        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(root_path, entry));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_source_file(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(err) => {
                    warn!("Skipping unreadable directory entry: {err}");
                }
            }
        }

        files
    }

    fn is_excluded(&self, root_path: &Path, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }

        let relative = entry
            .path()
            .strip_prefix(root_path)
            .unwrap_or_else(|_| entry.path());
        self.config.is_excluded(&relative.to_string_lossy())
    }
}
