use std::path::Path;
use tracing::debug;

use super::common::{ModuleSyntaxExtractor, TreeSitterParser};
use super::{LanguageParser, SourceRecord};
use crate::error::ExtractError;

/// Parser for `.js`, `.jsx` and `.mjs` files. The JavaScript grammar covers JSX.
pub struct JavaScriptParser {
    parser: TreeSitterParser,
}

impl JavaScriptParser {
    pub fn new() -> anyhow::Result<Self> {
        let language = tree_sitter_javascript::language();
        let parser = TreeSitterParser::new(language)?;
        Ok(Self { parser })
    }
}

impl LanguageParser for JavaScriptParser {
    fn parse_source(&mut self, file_path: &Path, source: &str) -> Result<SourceRecord, ExtractError> {
        let tree = self.parser.parse(file_path, source)?;
        let root_node = tree.root_node();

        if root_node.has_error() {
            debug!(path = %file_path.display(), "recovered from syntax errors");
        }

        let (imports, exports) = ModuleSyntaxExtractor::new(source.as_bytes()).extract(&root_node);

        Ok(SourceRecord::new(
            file_path.to_path_buf(),
            source,
            imports,
            exports,
        ))
    }

    fn language_name(&self) -> &str {
        "javascript"
    }
}
