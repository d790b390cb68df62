//! One analysis pass: extract, analyze, project.

use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::core::{AnalysisResult, CancellationToken, DependencyAnalyzer, Extractor};
use crate::error::PipelineError;
use crate::formatters::{GraphModel, GraphProjector};
use crate::parsers::cache::{workspace_key, ContentCache};
use crate::parsers::store::SnapshotStore;
use crate::parsers::SourceRecord;

/// Process-wide locks, one per canonical workspace root that has a run in
/// flight or waiting.
static WORKSPACE_LOCKS: OnceLock<DashMap<PathBuf, Arc<Mutex<()>>>> = OnceLock::new();

fn workspace_locks() -> &'static DashMap<PathBuf, Arc<Mutex<()>>> {
    WORKSPACE_LOCKS.get_or_init(DashMap::new)
}

/// Runs `f` while holding the lock for `root`. The last holder removes the
/// registry entry, so the registry only grows with concurrent roots.
fn with_workspace_lock<T>(root: &Path, f: impl FnOnce() -> T) -> T {
    let locks = workspace_locks();
    let lock = locks.entry(root.to_path_buf()).or_default().clone();
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

    let result = f();
    // Registry plus our clone: nobody else is waiting on this root.
    locks.remove_if(root, |_, registered| Arc::strong_count(registered) == 2);
    result
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<SourceRecord>,
    pub analysis: AnalysisResult,
    pub graph: GraphModel,
    pub cache_hits: usize,
    /// Extraction stopped early; the outputs cover the files done so far.
    pub cancelled: bool,
}

pub struct Pipeline {
    extractor: Extractor,
    analyzer: DependencyAnalyzer,
    projector: GraphProjector,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig, store: Box<dyn SnapshotStore>) -> Result<Self, PipelineError> {
        let cache = ContentCache::new(&config, store);
        let extractor = Extractor::new(&config, cache).map_err(PipelineError::ParserInit)?;
        Ok(Self {
            extractor,
            analyzer: DependencyAnalyzer::new(),
            projector: GraphProjector::new(),
        })
    }

    /// Runs Extractor → Analyzer → Projector over `root`.
    ///
    /// Runs for the same workspace are serialised: a second caller blocks
    /// until the first pass releases the workspace. The cache reads and
    /// writes the snapshot kept for this root.
    pub fn run(
        &mut self,
        root: &Path,
        cancel: &dyn CancellationToken,
    ) -> Result<PipelineOutput, PipelineError> {
        let root = canonical_root(root)?;
        Ok(with_workspace_lock(&root, || self.run_locked(&root, cancel)))
    }

    /// Drops every cached record for `root` and erases its snapshot.
    pub fn clear_cache(&mut self, root: &Path) -> Result<(), PipelineError> {
        let root = canonical_root(root)?;
        with_workspace_lock(&root, || {
            let cache = self.extractor.cache_mut();
            cache.bind(&workspace_key(&root));
            cache.clear()
        })?;
        Ok(())
    }

    fn run_locked(&mut self, root: &Path, cancel: &dyn CancellationToken) -> PipelineOutput {
        let started = Instant::now();
        info!("Analyzing workspace {}", root.display());

        self.extractor.cache_mut().bind(&workspace_key(root));
        let extraction = self.extractor.extract(root, cancel);
        let analysis = self.analyzer.analyze(&extraction.records);
        let graph = self
            .projector
            .project_with_records(&analysis, &extraction.records);

        info!(
            files = analysis.files.len(),
            dependencies = analysis.dependencies.len(),
            cycles = analysis.circular_dependencies.len(),
            orphans = analysis.orphaned_files.len(),
            "Code map generated in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        PipelineOutput {
            records: extraction.records,
            analysis,
            graph,
            cache_hits: extraction.cache_hits,
            cancelled: extraction.cancelled,
        }
    }

    pub fn cache(&self) -> &ContentCache {
        self.extractor.cache()
    }

    pub fn cache_mut(&mut self) -> &mut ContentCache {
        self.extractor.cache_mut()
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf, PipelineError> {
    let invalid = |reason: String| PipelineError::InvalidRoot {
        path: root.to_path_buf(),
        reason,
    };

    let canonical = fs::canonicalize(root).map_err(|err| invalid(err.to_string()))?;
    if !canonical.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NeverCancel;
    use crate::parsers::store::MemoryStore;

    #[test]
    fn lock_entry_is_released_after_run() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "export {};\n").unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();

        let mut pipeline =
            Pipeline::new(AnalysisConfig::default(), Box::new(MemoryStore::new())).unwrap();
        pipeline.run(&root, &NeverCancel).unwrap();

        assert!(!workspace_locks().contains_key(&root));
    }

    #[test]
    fn cache_snapshot_is_keyed_by_root() {
        let first = tempfile::TempDir::new().unwrap();
        let second = tempfile::TempDir::new().unwrap();
        fs::write(first.path().join("a.ts"), "export {};\n").unwrap();
        fs::write(second.path().join("b.ts"), "export {};\n").unwrap();

        let store = MemoryStore::new();
        let mut pipeline =
            Pipeline::new(AnalysisConfig::default(), Box::new(store.clone())).unwrap();
        pipeline.run(first.path(), &NeverCancel).unwrap();
        pipeline.run(second.path(), &NeverCancel).unwrap();

        let first_key = workspace_key(&fs::canonicalize(first.path()).unwrap());
        let second_key = workspace_key(&fs::canonicalize(second.path()).unwrap());
        assert_ne!(first_key, second_key);
        assert!(store.contains(&first_key));
        assert!(store.contains(&second_key));
        assert_eq!(pipeline.cache().key(), second_key);

        pipeline.clear_cache(first.path()).unwrap();
        assert!(!store.contains(&first_key));
        assert!(store.contains(&second_key));
    }
}
