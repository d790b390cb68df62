pub mod cache;
pub mod common;
pub mod javascript;
pub mod store;
pub mod typescript;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ExtractError;

/// Extensions the extractor picks up. Anything else is invisible to the graph.
pub const SOURCE_EXTENSIONS: [&str; 5] = ["ts", "tsx", "js", "jsx", "mjs"];

/// How an import was written. Determined syntactically, never semantically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    Static,
    Dynamic,
    Commonjs,
    TypeOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    Named,
    Default,
    Namespace,
    ReExport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpecifier {
    pub name: String,
    pub alias: Option<String>,
    pub is_default: bool,
    pub is_namespace: bool,
}

impl ImportSpecifier {
    pub fn named(name: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            name: name.into(),
            alias,
            is_default: false,
            is_namespace: false,
        }
    }

    pub fn default_binding(name: impl Into<String>) -> Self {
        Self {
            is_default: true,
            ..Self::named(name, None)
        }
    }

    pub fn namespace(name: impl Into<String>) -> Self {
        Self {
            is_namespace: true,
            ..Self::named(name, None)
        }
    }
}

/// One import statement (or require/import() call). The statement is the unit
/// of dependency; individual bindings ride along as specifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub module_specifier: String,
    pub kind: ImportKind,
    pub specifiers: Vec<ImportSpecifier>,
    pub line: usize,
    pub column: usize,
}

impl ImportRecord {
    pub fn new(module_specifier: impl Into<String>, kind: ImportKind, line: usize, column: usize) -> Self {
        Self {
            module_specifier: module_specifier.into(),
            kind,
            specifiers: Vec::new(),
            line,
            column,
        }
    }

    pub fn with_specifiers(mut self, specifiers: Vec<ImportSpecifier>) -> Self {
        self.specifiers = specifiers;
        self
    }

    pub fn is_relative(&self) -> bool {
        self.module_specifier.starts_with('.')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub name: String,
    pub kind: ExportKind,
    pub source: Option<String>,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetrics {
    pub lines_of_code: usize,
    pub lines_of_comments: usize,
    pub complexity: usize,
    pub import_count: usize,
    pub export_count: usize,
}

/// Everything the analyzer needs to know about one file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub path: PathBuf,
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
    pub metrics: FileMetrics,
}

impl SourceRecord {
    /// Builds a record for `path` with metrics derived from `content`.
    pub fn new(
        path: PathBuf,
        content: &str,
        imports: Vec<ImportRecord>,
        exports: Vec<ExportRecord>,
    ) -> Self {
        let metrics = common::line_metrics(content, imports.len(), exports.len());
        Self {
            path,
            imports,
            exports,
            metrics,
        }
    }
}

pub trait LanguageParser {
    fn parse_source(&mut self, file_path: &Path, source: &str) -> Result<SourceRecord, ExtractError>;

    fn parse_file(&mut self, file_path: &Path) -> Result<SourceRecord, ExtractError> {
        let source = common::read_source(file_path)?;
        self.parse_source(file_path, &source)
    }

    fn language_name(&self) -> &str;
}

/// One parser per grammar, built once and reused for every file.
pub struct ParserFactory {
    javascript: javascript::JavaScriptParser,
    typescript: typescript::TypeScriptParser,
    tsx: typescript::TypeScriptParser,
}

impl ParserFactory {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            javascript: javascript::JavaScriptParser::new()?,
            typescript: typescript::TypeScriptParser::new()?,
            tsx: typescript::TypeScriptParser::tsx()?,
        })
    }

    pub fn get_parser(&mut self, file_path: &Path) -> Result<&mut dyn LanguageParser, ExtractError> {
        let extension = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        let parser: &mut dyn LanguageParser = match extension {
            "ts" => &mut self.typescript,
            "tsx" => &mut self.tsx,
            "js" | "jsx" | "mjs" => &mut self.javascript,
            _ => {
                return Err(ExtractError::Unsupported {
                    path: file_path.to_path_buf(),
                })
            }
        };
        Ok(parser)
    }
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}
