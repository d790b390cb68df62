use anyhow::Result;
use std::fs;
use std::path::Path;

use super::graph_model::GraphModel;

/// Lossless JSON export of a [`GraphModel`].
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn format_to_file(&self, graph: &GraphModel, output_path: &Path) -> Result<()> {
        let json_content = self.format_graph(graph)?;
        fs::write(output_path, json_content)?;
        Ok(())
    }

    pub fn format_graph(&self, graph: &GraphModel) -> Result<String> {
        let content = if self.pretty {
            serde_json::to_string_pretty(graph)?
        } else {
            serde_json::to_string(graph)?
        };
        Ok(content)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}
