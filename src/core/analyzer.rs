use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

use super::graph::{ModuleGraph, ModuleGraphBuilder};
use super::resolver::ImportResolver;
use crate::parsers::{ImportKind, SourceRecord};

/// One (source, target) pair. `kind` is that of the first import seen between
/// the pair; `count` is how many import statements were collapsed into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: PathBuf,
    pub target: PathBuf,
    pub kind: ImportKind,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub dependencies: Vec<DependencyEdge>,
    /// Every analysed file, in discovery order.
    pub files: Vec<PathBuf>,
    pub orphaned_files: Vec<PathBuf>,
    pub circular_dependencies: Vec<Vec<PathBuf>>,
    pub entry_points: Vec<PathBuf>,
}

/// Resolves intra-workspace imports and derives the structural properties of
/// the resulting file graph. Performs no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyAnalyzer;

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, records: &[SourceRecord]) -> AnalysisResult {
        info!("Starting dependency analysis");

        let files: Vec<PathBuf> = records.iter().map(|record| record.path.clone()).collect();
        let (dependencies, graph) = self.build_graph(records);

        let orphaned_files = find_orphaned_files(&graph);
        let circular_dependencies = graph.find_cycles();
        let entry_points = find_entry_points(&files, &dependencies);

        info!(
            "Analysis complete: {} dependencies found, {} circular",
            dependencies.len(),
            circular_dependencies.len()
        );

        AnalysisResult {
            dependencies,
            files,
            orphaned_files,
            circular_dependencies,
            entry_points,
        }
    }

    /// Resolves every import in one pass, merging repeats of the same pair.
    pub fn build_graph(&self, records: &[SourceRecord]) -> (Vec<DependencyEdge>, ModuleGraph) {
        let resolver = ImportResolver::new(records.iter().map(|record| record.path.as_path()));
        let mut builder = ModuleGraphBuilder::new();
        for record in records {
            builder.add_file(&record.path);
        }

        let mut dependencies: Vec<DependencyEdge> = Vec::new();

        for record in records {
            let source_path = record.path.as_path();
            let source_dir = source_path.parent().unwrap_or_else(|| Path::new(""));

            for import in &record.imports {
                let Some(target) = resolver.resolve(&import.module_specifier, source_dir) else {
                    continue;
                };
                if target == source_path {
                    continue;
                }

                match builder.edge_between(source_path, target) {
                    Some(existing) => dependencies[existing].count += 1,
                    None => {
                        builder.add_dependency(source_path, target, dependencies.len());
                        dependencies.push(DependencyEdge {
                            source: source_path.to_path_buf(),
                            target: target.to_path_buf(),
                            kind: import.kind,
                            count: 1,
                        });
                    }
                }
            }
        }

        (dependencies, builder.build())
    }
}

/// Files that are never the target of a resolved edge.
pub fn find_entry_points(files: &[PathBuf], dependencies: &[DependencyEdge]) -> Vec<PathBuf> {
    let imported: HashSet<&Path> = dependencies.iter().map(|dep| dep.target.as_path()).collect();
    files
        .iter()
        .filter(|file| !imported.contains(file.as_path()))
        .cloned()
        .collect()
}

/// Files with no outgoing edges that nothing imports either.
pub fn find_orphaned_files(graph: &ModuleGraph) -> Vec<PathBuf> {
    graph
        .files()
        .filter(|file| graph.out_degree(file) == 0 && graph.in_degree(file) == 0)
        .map(Path::to_path_buf)
        .collect()
}
