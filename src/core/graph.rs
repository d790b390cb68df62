use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File-level dependency graph. Nodes are files in discovery order; each
/// edge carries the index of the dependency it was created for, which is
/// also its insertion rank.
pub type ModuleDiGraph = DiGraph<PathBuf, usize>;

pub struct ModuleGraphBuilder {
    graph: ModuleDiGraph,
    node_map: HashMap<PathBuf, NodeIndex>,
}

impl ModuleGraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    pub fn add_file(&mut self, path: &Path) -> NodeIndex {
        if let Some(&index) = self.node_map.get(path) {
            return index;
        }
        let index = self.graph.add_node(path.to_path_buf());
        self.node_map.insert(path.to_path_buf(), index);
        index
    }

    pub fn edge_between(&self, source: &Path, target: &Path) -> Option<usize> {
        let source_idx = self.node_map.get(source)?;
        let target_idx = self.node_map.get(target)?;
        self.graph
            .find_edge(*source_idx, *target_idx)
            .and_then(|edge| self.graph.edge_weight(edge).copied())
    }

    /// Adds `source -> target` unless that pair already has an edge or either
    /// end is unknown.
    pub fn add_dependency(&mut self, source: &Path, target: &Path, rank: usize) -> Option<EdgeIndex> {
        let source_idx = *self.node_map.get(source)?;
        let target_idx = *self.node_map.get(target)?;
        if self.graph.find_edge(source_idx, target_idx).is_some() {
            return None;
        }
        Some(self.graph.add_edge(source_idx, target_idx, rank))
    }

    pub fn build(self) -> ModuleGraph {
        ModuleGraph {
            graph: self.graph,
            node_map: self.node_map,
        }
    }
}

impl Default for ModuleGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable adjacency handed to the structural checks.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    graph: ModuleDiGraph,
    node_map: HashMap<PathBuf, NodeIndex>,
}

impl ModuleGraph {
    pub fn file_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.graph.node_indices().map(move |idx| self.graph[idx].as_path())
    }

    /// Resolved targets of `path`, in the order they were first resolved.
    pub fn targets(&self, path: &Path) -> Vec<&Path> {
        match self.node_map.get(path) {
            Some(&idx) => self
                .ordered_targets(idx)
                .into_iter()
                .map(|target| self.graph[target].as_path())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn out_degree(&self, path: &Path) -> usize {
        self.degree(path, Direction::Outgoing)
    }

    pub fn in_degree(&self, path: &Path) -> usize {
        self.degree(path, Direction::Incoming)
    }

    pub fn inner(&self) -> &ModuleDiGraph {
        &self.graph
    }

    fn degree(&self, path: &Path, direction: Direction) -> usize {
        self.node_map
            .get(path)
            .map(|&idx| self.graph.edges_directed(idx, direction).count())
            .unwrap_or(0)
    }

    fn ordered_targets(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<(usize, NodeIndex)> = self
            .graph
            .edges(idx)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        edges.sort_unstable_by_key(|(rank, _)| *rank);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Closed walks found by a depth-first traversal, each ending with the
    /// file it started at.
    ///
    /// Roots are taken in discovery order and children in resolution order.
    /// Whenever an edge reaches a file still on the current path, the path
    /// from that file onward is reported. Nothing is de-duplicated, so one
    /// underlying cycle can appear more than once.
    pub fn find_cycles(&self) -> Vec<Vec<PathBuf>> {
        let node_count = self.graph.node_count();
        let adjacency: Vec<Vec<NodeIndex>> = self
            .graph
            .node_indices()
            .map(|idx| self.ordered_targets(idx))
            .collect();

        let mut visited = vec![false; node_count];
        // Position of each node on the current path, if it is on it.
        let mut path_position: Vec<Option<usize>> = vec![None; node_count];
        let mut path: Vec<NodeIndex> = Vec::new();
        // (node, index of the next child to visit)
        let mut frames: Vec<(NodeIndex, usize)> = Vec::new();
        let mut cycles = Vec::new();

        for root in self.graph.node_indices() {
            if visited[root.index()] {
                continue;
            }

            visited[root.index()] = true;
            path_position[root.index()] = Some(path.len());
            path.push(root);
            frames.push((root, 0));

            while let Some(frame) = frames.last_mut() {
                let (node, next_child) = *frame;

                let Some(&dep) = adjacency[node.index()].get(next_child) else {
                    frames.pop();
                    path.pop();
                    path_position[node.index()] = None;
                    continue;
                };
                frame.1 += 1;

                if !visited[dep.index()] {
                    visited[dep.index()] = true;
                    path_position[dep.index()] = Some(path.len());
                    path.push(dep);
                    frames.push((dep, 0));
                } else if let Some(start) = path_position[dep.index()] {
                    let mut cycle: Vec<PathBuf> = path[start..]
                        .iter()
                        .map(|&idx| self.graph[idx].clone())
                        .collect();
                    cycle.push(self.graph[dep].clone());
                    cycles.push(cycle);
                }
            }
        }

        cycles
    }
}
