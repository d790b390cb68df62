use std::path::Path;
use tracing::debug;

use super::common::{ModuleSyntaxExtractor, TreeSitterParser};
use super::{LanguageParser, SourceRecord};
use crate::error::ExtractError;

/// Parser for `.ts` and `.tsx` files. TSX needs its own grammar because
/// `<T>expr` casts and JSX elements are ambiguous otherwise.
pub struct TypeScriptParser {
    parser: TreeSitterParser,
    jsx: bool,
}

impl TypeScriptParser {
    pub fn new() -> anyhow::Result<Self> {
        let language = tree_sitter_typescript::language_typescript();
        let parser = TreeSitterParser::new(language)?;
        Ok(Self { parser, jsx: false })
    }

    pub fn tsx() -> anyhow::Result<Self> {
        let language = tree_sitter_typescript::language_tsx();
        let parser = TreeSitterParser::new(language)?;
        Ok(Self { parser, jsx: true })
    }
}

impl LanguageParser for TypeScriptParser {
    fn parse_source(&mut self, file_path: &Path, source: &str) -> Result<SourceRecord, ExtractError> {
        let tree = self.parser.parse(file_path, source)?;
        let root_node = tree.root_node();

        if root_node.has_error() {
            debug!(
                path = %file_path.display(),
                tsx = self.jsx,
                "recovered from syntax errors"
            );
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
        if self.jsx {
            "tsx"
        } else {
            "typescript"
        }
    }
}
