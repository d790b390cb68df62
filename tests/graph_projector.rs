use codemap::core::{AnalysisResult, DependencyEdge};
use codemap::formatters::{
    EdgeType, GraphProjector, HtmlFormatter, JsonFormatter, NodeType,
};
use codemap::parsers::ImportKind;
use std::path::PathBuf;

fn sample_analysis() -> AnalysisResult {
    let main = PathBuf::from("/ws/src/main.ts");
    let util = PathBuf::from("/ws/src/lib/util.js");
    let lone = PathBuf::from("/ws/lone.tsx");

    AnalysisResult {
        dependencies: vec![DependencyEdge {
            source: main.clone(),
            target: util.clone(),
            kind: ImportKind::Commonjs,
            count: 3,
        }],
        files: vec![main.clone(), util, lone.clone()],
        orphaned_files: vec![lone.clone()],
        circular_dependencies: Vec::new(),
        // An isolated file is also an entry point; orphaned wins.
        entry_points: vec![main, lone],
    }
}

#[test]
fn nodes_carry_type_group_and_relative_path() {
    let graph = GraphProjector::new().project(&sample_analysis());
    assert_eq!(graph.nodes.len(), 3);

    let main = graph.node("/ws/src/main.ts").unwrap();
    assert_eq!(main.node_type, NodeType::Entry);
    assert_eq!(main.label, "main.ts");
    assert_eq!(main.path, "src/main.ts");
    assert_eq!(main.group, "src");
    assert_eq!(main.color, "#51cf66");
    assert!(main.metrics.is_none());

    let util = graph.node("/ws/src/lib/util.js").unwrap();
    assert_eq!(util.node_type, NodeType::File);
    assert_eq!(util.group, "src/lib");
    assert_eq!(util.color, "#f7df1e");

    let lone = graph.node("/ws/lone.tsx").unwrap();
    assert_eq!(lone.node_type, NodeType::Orphaned);
    assert_eq!(lone.group, ".");
    assert_eq!(lone.color, "#ff6b6b");
}

#[test]
fn edges_and_metadata_mirror_the_analysis() {
    let graph = GraphProjector::new().project(&sample_analysis());

    assert_eq!(graph.edges.len(), 1);
    let edge = &graph.edges[0];
    assert_eq!(edge.id, "/ws/src/main.ts-/ws/src/lib/util.js");
    assert_eq!(edge.source, "/ws/src/main.ts");
    assert_eq!(edge.target, "/ws/src/lib/util.js");
    assert_eq!(edge.edge_type, EdgeType::Require);
    assert_eq!(edge.weight, 3);

    let metadata = &graph.metadata;
    assert_eq!(metadata.total_files, 3);
    assert_eq!(metadata.total_dependencies, 1);
    assert_eq!(metadata.circular_dependencies, 0);
    assert_eq!(metadata.orphaned_files, 1);
    assert_eq!(metadata.workspace_path, "/ws");
    assert!(chrono::DateTime::parse_from_rfc3339(&metadata.timestamp).is_ok());
}

#[test]
fn empty_analysis_projects_an_empty_graph() {
    let graph = GraphProjector::new().project(&AnalysisResult::default());

    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
    assert_eq!(graph.metadata.total_files, 0);
    assert_eq!(graph.metadata.total_dependencies, 0);
    assert_eq!(graph.metadata.workspace_path, "");
}

#[test]
fn json_export_uses_wire_field_names() {
    let graph = GraphProjector::new().project(&sample_analysis());
    let json = JsonFormatter::compact().format_graph(&graph).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["nodes"][0]["type"], "entry");
    assert_eq!(value["edges"][0]["type"], "require");
    assert_eq!(value["metadata"]["workspacePath"], "/ws");
    assert_eq!(value["metadata"]["totalFiles"], 3);
    assert_eq!(value["metadata"]["orphanedFiles"], 1);
    assert!(value["nodes"][0].get("metrics").is_none());

    let pretty = JsonFormatter::new().format_graph(&graph).unwrap();
    assert!(pretty.contains('\n'));
    let reparsed: codemap::formatters::GraphModel = serde_json::from_str(&pretty).unwrap();
    assert_eq!(reparsed, graph);
}

#[test]
fn html_export_embeds_graph_data() {
    let graph = GraphProjector::new().project(&sample_analysis());
    let html = HtmlFormatter::new()
        .with_title("Deps <ws>")
        .format_graph(&graph)
        .unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Deps &lt;ws&gt;</title>"));
    assert!(html.contains(r#"<script id="graph-data" type="application/json">"#));
    assert!(html.contains(r#""workspacePath":"/ws""#));
    assert!(html.contains("3 files, 1 dependencies, 0 circular, 1 orphaned"));
}
