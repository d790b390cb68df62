use anyhow::Result;
use std::fs;
use std::path::Path;

use super::graph_model::GraphModel;

/// Standalone HTML page embedding the graph as JSON for a browser-side viewer.
pub struct HtmlFormatter {
    title: String,
}

impl HtmlFormatter {
    pub fn new() -> Self {
        Self {
            title: "Code Map".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn format_to_file(&self, graph: &GraphModel, output_path: &Path) -> Result<()> {
        let html_content = self.format_graph(graph)?;
        fs::write(output_path, html_content)?;
        Ok(())
    }

    pub fn format_graph(&self, graph: &GraphModel) -> Result<String> {
        // `</` inside a script block would end it early.
        let data = serde_json::to_string(graph)?.replace("</", "<\\/");
        let title = escape_html(&self.title);

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        #graph {{ width: 100%; height: 800px; border: 1px solid #ccc; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <p>{files} files, {deps} dependencies, {cycles} circular, {orphans} orphaned</p>
    <div id="graph"></div>
    <script id="graph-data" type="application/json">{data}</script>
    <script>
        const graphData = JSON.parse(document.getElementById('graph-data').textContent);
        console.log('Graph data:', graphData);
    </script>
</body>
</html>
"#,
            files = graph.metadata.total_files,
            deps = graph.metadata.total_dependencies,
            cycles = graph.metadata.circular_dependencies,
            orphans = graph.metadata.orphaned_files,
        ))
    }
}

impl Default for HtmlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
