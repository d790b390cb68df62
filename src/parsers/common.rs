use std::fs;
use std::path::Path;
use tree_sitter::{Language, Node as TSNode, Parser, Tree, TreeCursor};

use super::{
    ExportKind, ExportRecord, FileMetrics, ImportKind, ImportRecord, ImportSpecifier,
};
use crate::error::ExtractError;

/// Complexity is not measured; every file reports this placeholder.
pub const COMPLEXITY_PLACEHOLDER: usize = 1;

pub struct TreeSitterParser {
    parser: Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> anyhow::Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(Self { parser })
    }

    /// The parser is reused across files; each call starts from a clean state.
    pub fn parse(&mut self, file_path: &Path, source: &str) -> Result<Tree, ExtractError> {
        self.parser.reset();
        self.parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::Parse {
                path: file_path.to_path_buf(),
                message: "tree-sitter produced no tree".to_string(),
            })
    }
}

/// Reads a file as UTF-8. Non-UTF-8 content surfaces as an I/O error.
pub fn read_source(file_path: &Path) -> Result<String, ExtractError> {
    fs::read_to_string(file_path).map_err(|source| ExtractError::Io {
        path: file_path.to_path_buf(),
        source,
    })
}

/// Line-based metrics: code lines are non-blank and not `//` comments;
/// everything else counts as comment lines.
pub fn line_metrics(content: &str, import_count: usize, export_count: usize) -> FileMetrics {
    let total_lines = content.split('\n').count();
    let lines_of_code = content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .count();

    FileMetrics {
        lines_of_code,
        lines_of_comments: total_lines - lines_of_code,
        complexity: COMPLEXITY_PLACEHOLDER,
        import_count,
        export_count,
    }
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

pub fn find_child_by_kind<'a>(node: &TSNode<'a>, kind: &str) -> Option<TSNode<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

pub fn find_children_by_kind<'a>(node: &TSNode<'a>, kind: &str) -> Vec<TSNode<'a>> {
    let mut cursor = node.walk();
    let results = node
        .children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect();
    results
}

fn has_token(node: &TSNode, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

/// Value of a quoted string literal node, without the quotes.
pub fn string_literal(node: &TSNode, source: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = extract_text(node, source);
    let inner = text
        .strip_prefix(&['"', '\''][..])
        .and_then(|rest| rest.strip_suffix(&['"', '\''][..]))?;
    Some(inner.to_string())
}

fn position(node: &TSNode) -> (usize, usize) {
    let start = node.start_position();
    (start.row + 1, start.column)
}

/// Pulls import and export records out of an ECMAScript-family syntax tree.
///
/// The JavaScript, TypeScript and TSX grammars share the node kinds used here,
/// so one walker serves all of them.
pub struct ModuleSyntaxExtractor<'s> {
    source: &'s [u8],
    imports: Vec<ImportRecord>,
    exports: Vec<ExportRecord>,
}

impl<'s> ModuleSyntaxExtractor<'s> {
    pub fn new(source: &'s [u8]) -> Self {
        Self {
            source,
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn extract(mut self, root: &TSNode) -> (Vec<ImportRecord>, Vec<ExportRecord>) {
        let mut cursor = root.walk();
        self.walk(&mut cursor);
        (self.imports, self.exports)
    }

    // Pre-order walk with an explicit cursor so deeply nested files don't
    // grow the call stack.
    fn walk(&mut self, cursor: &mut TreeCursor) {
        loop {
            let node = cursor.node();
            let descend = self.visit(&node);

            if descend && cursor.goto_first_child() {
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    fn visit(&mut self, node: &TSNode) -> bool {
        match node.kind() {
            "import_statement" => {
                if let Some(record) = self.process_import(node) {
                    self.imports.push(record);
                }
                false
            }
            "export_statement" => {
                self.process_export(node);
                true
            }
            "call_expression" => {
                if let Some(record) = self.process_call(node) {
                    self.imports.push(record);
                }
                true
            }
            _ => true,
        }
    }

    fn process_import(&self, import_node: &TSNode) -> Option<ImportRecord> {
        let (line, column) = position(import_node);

        // TypeScript `import x = require('y')`
        if let Some(require_clause) = find_child_by_kind(import_node, "import_require_clause") {
            let source_node = require_clause
                .child_by_field_name("source")
                .or_else(|| find_child_by_kind(&require_clause, "string"))?;
            let specifier = string_literal(&source_node, self.source)?;
            let mut record = ImportRecord::new(specifier, ImportKind::Commonjs, line, column);
            if let Some(binding) = find_child_by_kind(&require_clause, "identifier") {
                record.specifiers = vec![ImportSpecifier::default_binding(extract_text(
                    &binding,
                    self.source,
                ))];
            }
            return Some(record);
        }

        let source_node = import_node.child_by_field_name("source")?;
        let specifier = string_literal(&source_node, self.source)?;
        let kind = if has_token(import_node, "type") || has_token(import_node, "typeof") {
            ImportKind::TypeOnly
        } else {
            ImportKind::Static
        };

        let specifiers = find_child_by_kind(import_node, "import_clause")
            .map(|clause| self.import_specifiers(&clause))
            .unwrap_or_default();

        Some(ImportRecord::new(specifier, kind, line, column).with_specifiers(specifiers))
    }

    fn import_specifiers(&self, clause: &TSNode) -> Vec<ImportSpecifier> {
        let mut specifiers = Vec::new();
        let mut cursor = clause.walk();

        for child in clause.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    specifiers.push(ImportSpecifier::default_binding(extract_text(
                        &child,
                        self.source,
                    )));
                }
                "namespace_import" => {
                    if let Some(name) = find_child_by_kind(&child, "identifier") {
                        specifiers.push(ImportSpecifier::namespace(extract_text(
                            &name,
                            self.source,
                        )));
                    }
                }
                "named_imports" => {
                    for spec in find_children_by_kind(&child, "import_specifier") {
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let alias = spec
                            .child_by_field_name("alias")
                            .map(|alias| extract_text(&alias, self.source).to_string());
                        specifiers.push(ImportSpecifier::named(
                            extract_text(&name, self.source),
                            alias,
                        ));
                    }
                }
                _ => {}
            }
        }

        specifiers
    }

    fn process_call(&self, call_node: &TSNode) -> Option<ImportRecord> {
        let function = call_node.child_by_field_name("function")?;
        let kind = match function.kind() {
            "import" => ImportKind::Dynamic,
            "identifier" if extract_text(&function, self.source) == "require" => {
                ImportKind::Commonjs
            }
            _ => return None,
        };

        // Only literal specifiers can be resolved statically.
        let arguments = call_node.child_by_field_name("arguments")?;
        let first_arg = arguments.named_child(0)?;
        let specifier = string_literal(&first_arg, self.source)?;

        let (line, column) = position(call_node);
        Some(ImportRecord::new(specifier, kind, line, column))
    }

    fn process_export(&mut self, export_node: &TSNode) {
        let (line, column) = position(export_node);
        let source = export_node
            .child_by_field_name("source")
            .and_then(|node| string_literal(&node, self.source));

        if has_token(export_node, "default") {
            self.exports.push(ExportRecord {
                name: "default".to_string(),
                kind: ExportKind::Default,
                source: None,
                line,
                column,
            });
            return;
        }

        if let Some(declaration) = export_node.child_by_field_name("declaration") {
            for name in self.declared_names(&declaration) {
                self.exports.push(ExportRecord {
                    name,
                    kind: ExportKind::Named,
                    source: None,
                    line,
                    column,
                });
            }
            return;
        }

        if let Some(clause) = find_child_by_kind(export_node, "export_clause") {
            let kind = if source.is_some() {
                ExportKind::ReExport
            } else {
                ExportKind::Named
            };
            for spec in find_children_by_kind(&clause, "export_specifier") {
                let exported = spec
                    .child_by_field_name("alias")
                    .or_else(|| spec.child_by_field_name("name"));
                if let Some(exported) = exported {
                    self.exports.push(ExportRecord {
                        name: extract_text(&exported, self.source).to_string(),
                        kind,
                        source: source.clone(),
                        line,
                        column,
                    });
                }
            }
            return;
        }

        let namespace_export = find_child_by_kind(export_node, "namespace_export");
        if namespace_export.is_some() || has_token(export_node, "*") {
            let name = namespace_export
                .and_then(|ns| find_child_by_kind(&ns, "identifier"))
                .or_else(|| find_child_by_kind(export_node, "identifier"))
                .map(|ident| extract_text(&ident, self.source).to_string())
                .unwrap_or_else(|| "*".to_string());
            self.exports.push(ExportRecord {
                name,
                kind: ExportKind::Namespace,
                source,
                line,
                column,
            });
        }
    }

    fn declared_names(&self, declaration: &TSNode) -> Vec<String> {
        match declaration.kind() {
            "lexical_declaration" | "variable_declaration" => {
                find_children_by_kind(declaration, "variable_declarator")
                    .iter()
                    .filter_map(|declarator| declarator.child_by_field_name("name"))
                    .map(|name| extract_text(&name, self.source).to_string())
                    .collect()
            }
            _ => declaration
                .child_by_field_name("name")
                .map(|name| vec![extract_text(&name, self.source).to_string()])
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_count_blank_and_line_comments_as_comment_lines() {
        let content = "// header\nimport a from './a';\n\n  // note\nconst x = 1;\n";
        let metrics = line_metrics(content, 1, 0);
        // Six lines once the trailing newline is split off.
        assert_eq!(metrics.lines_of_code, 2);
        assert_eq!(metrics.lines_of_comments, 4);
        assert_eq!(metrics.complexity, COMPLEXITY_PLACEHOLDER);
        assert_eq!(metrics.import_count, 1);
    }

    #[test]
    fn block_comment_lines_count_as_code() {
        let metrics = line_metrics("/* a */\nlet b;", 0, 0);
        assert_eq!(metrics.lines_of_code, 2);
        assert_eq!(metrics.lines_of_comments, 0);
    }
}
