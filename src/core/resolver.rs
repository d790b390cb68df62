use path_clean::PathClean;
use std::collections::HashSet;
use std::path::Path;

/// Suffixes tried, in order, when mapping a relative specifier to a file.
pub const RESOLUTION_SUFFIXES: [&str; 9] = [
    "",
    ".ts",
    ".tsx",
    ".js",
    ".jsx",
    "/index.ts",
    "/index.tsx",
    "/index.js",
    "/index.jsx",
];

/// Resolves relative module specifiers against the set of discovered files.
///
/// Purely lexical: candidates are normalised with `path-clean` and looked up
/// in memory, the filesystem is never consulted. Bare specifiers (packages)
/// never resolve.
#[derive(Debug, Clone)]
pub struct ImportResolver<'a> {
    known_files: HashSet<&'a Path>,
}

impl<'a> ImportResolver<'a> {
    pub fn new<I>(files: I) -> Self
    where
        I: IntoIterator<Item = &'a Path>,
    {
        Self {
            known_files: files.into_iter().collect(),
        }
    }

    pub fn resolve(&self, specifier: &str, source_dir: &Path) -> Option<&'a Path> {
        if !specifier.starts_with('.') {
            return None;
        }

        RESOLUTION_SUFFIXES.iter().find_map(|suffix| {
            let candidate = source_dir.join(format!("{specifier}{suffix}")).clean();
            self.known_files.get(candidate.as_path()).copied()
        })
    }

    pub fn len(&self) -> usize {
        self.known_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_files.is_empty()
    }
}
