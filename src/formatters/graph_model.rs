use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::info;

use crate::core::{AnalysisResult, DependencyEdge};
use crate::parsers::{ImportKind, SourceRecord};

pub const ORPHANED_COLOR: &str = "#ff6b6b";
pub const ENTRY_COLOR: &str = "#51cf66";
pub const DEFAULT_COLOR: &str = "#868e96";

const EXTENSION_COLORS: [(&str, &str); 4] = [
    ("ts", "#3178c6"),
    ("tsx", "#61dafb"),
    ("js", "#f7df1e"),
    ("jsx", "#61dafb"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Directory,
    External,
    Entry,
    Orphaned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    Import,
    Export,
    Dynamic,
    Require,
    TypeOnly,
}

impl From<ImportKind> for EdgeType {
    fn from(kind: ImportKind) -> Self {
        match kind {
            ImportKind::Dynamic => EdgeType::Dynamic,
            ImportKind::Commonjs => EdgeType::Require,
            ImportKind::TypeOnly => EdgeType::TypeOnly,
            ImportKind::Static => EdgeType::Import,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetrics {
    pub imports: usize,
    pub exports: usize,
    pub lines_of_code: usize,
    pub complexity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Path relative to the computed workspace root.
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub group: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<NodeMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub weight: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub total_files: usize,
    pub total_dependencies: usize,
    pub circular_dependencies: usize,
    pub orphaned_files: usize,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub workspace_path: String,
}

/// The structure handed to the visualization layer. Field names are a wire
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub metadata: GraphMetadata,
}

impl GraphModel {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// Projects an [`AnalysisResult`] into a [`GraphModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphProjector;

impl GraphProjector {
    pub fn new() -> Self {
        Self
    }

    pub fn project(&self, analysis: &AnalysisResult) -> GraphModel {
        self.build(analysis, &HashMap::new())
    }

    /// Like [`project`](Self::project), attaching per-file metrics from the
    /// records the analysis was computed from.
    pub fn project_with_records(
        &self,
        analysis: &AnalysisResult,
        records: &[SourceRecord],
    ) -> GraphModel {
        let metrics: HashMap<&Path, NodeMetrics> = records
            .iter()
            .map(|record| {
                (
                    record.path.as_path(),
                    NodeMetrics {
                        imports: record.metrics.import_count,
                        exports: record.metrics.export_count,
                        lines_of_code: record.metrics.lines_of_code,
                        complexity: record.metrics.complexity,
                    },
                )
            })
            .collect();
        self.build(analysis, &metrics)
    }

    fn build(&self, analysis: &AnalysisResult, metrics: &HashMap<&Path, NodeMetrics>) -> GraphModel {
        info!("Generating graph data");

        let workspace_root = common_root(&analysis.files);
        let nodes = create_nodes(analysis, &workspace_root, metrics);
        let edges: Vec<GraphEdge> = analysis.dependencies.iter().map(create_edge).collect();

        let metadata = GraphMetadata {
            total_files: analysis.files.len(),
            total_dependencies: analysis.dependencies.len(),
            circular_dependencies: analysis.circular_dependencies.len(),
            orphaned_files: analysis.orphaned_files.len(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            workspace_path: workspace_root.to_string_lossy().into_owned(),
        };

        info!(
            "Generated graph with {} nodes and {} edges",
            nodes.len(),
            edges.len()
        );

        GraphModel {
            nodes,
            edges,
            metadata,
        }
    }
}

fn create_nodes(
    analysis: &AnalysisResult,
    workspace_root: &Path,
    metrics: &HashMap<&Path, NodeMetrics>,
) -> Vec<GraphNode> {
    let orphaned: HashSet<&Path> = analysis.orphaned_files.iter().map(PathBuf::as_path).collect();
    let entries: HashSet<&Path> = analysis.entry_points.iter().map(PathBuf::as_path).collect();

    analysis
        .files
        .iter()
        .map(|file| {
            let relative = file.strip_prefix(workspace_root).unwrap_or(file);
            let group = match relative.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    parent.to_string_lossy().into_owned()
                }
                _ => ".".to_string(),
            };

            let node_type = if orphaned.contains(file.as_path()) {
                NodeType::Orphaned
            } else if entries.contains(file.as_path()) {
                NodeType::Entry
            } else {
                NodeType::File
            };

            GraphNode {
                id: file.to_string_lossy().into_owned(),
                label: file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: relative.to_string_lossy().into_owned(),
                node_type,
                group,
                color: node_color(node_type, file).to_string(),
                metrics: metrics.get(file.as_path()).copied(),
            }
        })
        .collect()
}

fn create_edge(dep: &DependencyEdge) -> GraphEdge {
    let source = dep.source.to_string_lossy().into_owned();
    let target = dep.target.to_string_lossy().into_owned();
    GraphEdge {
        id: edge_id(&source, &target),
        source,
        target,
        edge_type: dep.kind.into(),
        weight: dep.count,
    }
}

/// Unique only while the analyzer keeps one edge per (source, target) pair.
pub fn edge_id(source: &str, target: &str) -> String {
    format!("{source}-{target}")
}

pub fn node_color(node_type: NodeType, file: &Path) -> &'static str {
    match node_type {
        NodeType::Orphaned => ORPHANED_COLOR,
        NodeType::Entry => ENTRY_COLOR,
        _ => {
            let extension = file.extension().and_then(|ext| ext.to_str());
            EXTENSION_COLORS
                .iter()
                .find(|(ext, _)| Some(*ext) == extension)
                .map(|(_, color)| *color)
                .unwrap_or(DEFAULT_COLOR)
        }
    }
}

/// Longest directory prefix shared by every file. No files gives an empty
/// path; a single file gives its parent directory.
pub fn common_root(files: &[PathBuf]) -> PathBuf {
    let Some(first) = files.first() else {
        return PathBuf::new();
    };
    if files.len() == 1 {
        return first.parent().map(Path::to_path_buf).unwrap_or_default();
    }

    let mut shared: Vec<Component> = first.components().collect();
    for file in &files[1..] {
        let matching = shared
            .iter()
            .zip(file.components())
            .take_while(|(a, b)| *a == b)
            .count();
        shared.truncate(matching);
    }

    shared.iter().collect()
}
