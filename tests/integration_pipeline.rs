use codemap::core::{CancellationFlag, NeverCancel};
use codemap::error::PipelineError;
use codemap::formatters::NodeType;
use codemap::parsers::store::MemoryStore;
use codemap::{AnalysisConfig, Pipeline};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_workspace() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::TempDir::new().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();

    write(
        &root,
        "src/index.ts",
        "import { helper } from './lib/helper';\nimport type { Opts } from './types';\n",
    );
    write(
        &root,
        "src/lib/helper.js",
        "const fmt = require('../fmt');\nexport function helper() { return fmt(); }\n",
    );
    write(&root, "src/fmt.js", "module.exports = () => 'x';\n");
    write(&root, "src/types.ts", "export interface Opts { n: number }\n");
    write(&root, "src/unused.tsx", "export default () => null;\n");
    write(&root, "node_modules/pkg/index.js", "require('./index');\n");

    (dir, root)
}

fn pipeline(store: &MemoryStore) -> Pipeline {
    Pipeline::new(AnalysisConfig::default(), Box::new(store.clone())).unwrap()
}

#[test]
fn analyzes_a_workspace_end_to_end() {
    let (_dir, root) = sample_workspace();
    let output = pipeline(&MemoryStore::new())
        .run(&root, &NeverCancel)
        .unwrap();

    assert!(!output.cancelled);
    assert_eq!(output.cache_hits, 0);
    // node_modules is excluded by default.
    assert_eq!(output.analysis.files.len(), 5);
    assert_eq!(output.analysis.dependencies.len(), 3);

    // Discovery is name-sorted, depth first; unreferenced files are entries too.
    let index = root.join("src/index.ts");
    assert_eq!(
        output.analysis.entry_points,
        vec![index.clone(), root.join("src/unused.tsx")]
    );
    assert_eq!(output.analysis.orphaned_files, vec![root.join("src/unused.tsx")]);
    assert!(output.analysis.circular_dependencies.is_empty());

    let graph = &output.graph;
    assert_eq!(graph.metadata.workspace_path, root.join("src").to_string_lossy());
    let index_node = graph.node(&index.to_string_lossy()).unwrap();
    assert_eq!(index_node.node_type, NodeType::Entry);
    assert_eq!(index_node.metrics.unwrap().imports, 2);

    let helper_node = graph
        .node(&root.join("src/lib/helper.js").to_string_lossy())
        .unwrap();
    assert_eq!(helper_node.group, "lib");
    assert_eq!(helper_node.node_type, NodeType::File);
}

#[test]
fn second_run_is_served_from_cache_and_identical() {
    let (_dir, root) = sample_workspace();
    let store = MemoryStore::new();

    let first = pipeline(&store).run(&root, &NeverCancel).unwrap();
    // A fresh pipeline over the same store sees the persisted snapshot.
    let second = pipeline(&store).run(&root, &NeverCancel).unwrap();

    assert_eq!(second.cache_hits, first.analysis.files.len());
    assert_eq!(second.records, first.records);
    assert_eq!(second.analysis, first.analysis);
    assert_eq!(second.graph.nodes, first.graph.nodes);
    assert_eq!(second.graph.edges, first.graph.edges);
    assert_eq!(
        second.graph.metadata.workspace_path,
        first.graph.metadata.workspace_path
    );
}

#[test]
fn edited_file_is_reparsed() {
    let (_dir, root) = sample_workspace();
    let store = MemoryStore::new();
    let mut pipeline = pipeline(&store);

    pipeline.run(&root, &NeverCancel).unwrap();
    write(&root, "src/unused.tsx", "import './types';\n");
    let output = pipeline.run(&root, &NeverCancel).unwrap();

    assert_eq!(output.cache_hits, 4);
    assert!(output.analysis.orphaned_files.is_empty());
    assert_eq!(output.analysis.dependencies.len(), 4);
}

#[test]
fn disabled_cache_parses_every_run() {
    let (_dir, root) = sample_workspace();
    let store = MemoryStore::new();
    let config = AnalysisConfig::default().with_cache_enabled(false);
    let mut pipeline = Pipeline::new(config, Box::new(store.clone())).unwrap();

    pipeline.run(&root, &NeverCancel).unwrap();
    let output = pipeline.run(&root, &NeverCancel).unwrap();

    assert_eq!(output.cache_hits, 0);
    assert!(pipeline.cache().is_empty());
}

#[test]
fn cancelled_run_returns_partial_results() {
    let (_dir, root) = sample_workspace();

    let flag = CancellationFlag::new();
    flag.cancel();
    let output = pipeline(&MemoryStore::new()).run(&root, &flag).unwrap();
    assert!(output.cancelled);
    assert!(output.analysis.files.is_empty());
    assert!(output.graph.nodes.is_empty());

    let polls = Cell::new(0);
    let after_two = || {
        polls.set(polls.get() + 1);
        polls.get() > 2
    };
    let output = pipeline(&MemoryStore::new()).run(&root, &after_two).unwrap();
    assert!(output.cancelled);
    assert_eq!(output.analysis.files.len(), 2);
    assert_eq!(output.graph.metadata.total_files, 2);
}

#[test]
fn unparseable_files_are_dropped() {
    let (_dir, root) = sample_workspace();
    fs::write(root.join("src/broken.js"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

    let output = pipeline(&MemoryStore::new())
        .run(&root, &NeverCancel)
        .unwrap();

    assert_eq!(output.analysis.files.len(), 5);
    assert!(!output
        .analysis
        .files
        .contains(&root.join("src/broken.js")));
}

#[test]
fn empty_workspace_yields_empty_graph() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(dir.path().join("README.md"), "# nothing here").unwrap();

    let output = pipeline(&MemoryStore::new())
        .run(dir.path(), &NeverCancel)
        .unwrap();

    assert!(output.records.is_empty());
    assert!(output.graph.nodes.is_empty());
    assert!(output.graph.edges.is_empty());
    assert_eq!(output.graph.metadata.total_files, 0);
}

#[test]
fn invalid_root_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("file.ts");
    fs::write(&file, "export {};\n").unwrap();

    let mut pipeline = pipeline(&MemoryStore::new());

    let missing = pipeline.run(&dir.path().join("missing"), &NeverCancel);
    assert!(matches!(missing, Err(PipelineError::InvalidRoot { .. })));

    let not_dir = pipeline.run(&file, &NeverCancel);
    assert!(matches!(not_dir, Err(PipelineError::InvalidRoot { .. })));
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_file_name_does_not_stop_later_files_from_caching() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::TempDir::new().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write(&root, "a.ts", "export const a = 1;\n");
    fs::write(root.join(OsStr::from_bytes(b"b\xff.ts")), "export {};\n").unwrap();
    write(&root, "c.ts", "export const c = 1;\n");

    let store = MemoryStore::new();
    let first = pipeline(&store).run(&root, &NeverCancel).unwrap();
    let second = pipeline(&store).run(&root, &NeverCancel).unwrap();

    assert_eq!(first.analysis.files.len(), 3);
    // Only the file with the undecodable name is parsed again.
    assert_eq!(second.cache_hits, 2);
}

#[test]
fn clearing_the_cache_forces_a_cold_run() {
    let (_dir, root) = sample_workspace();
    let store = MemoryStore::new();
    let mut pipeline = pipeline(&store);

    pipeline.run(&root, &NeverCancel).unwrap();
    pipeline.clear_cache(&root).unwrap();
    let output = pipeline.run(&root, &NeverCancel).unwrap();

    assert_eq!(output.cache_hits, 0);
}
