//! # CODEMAP
//!
//! Dependency graphs for JavaScript and TypeScript source trees.
//!
//! A pass walks the workspace, extracts import/export records from each
//! `.ts .tsx .js .jsx .mjs` file with tree-sitter, resolves relative imports
//! to files, detects cycles, orphans and entry points, and projects the
//! result into a node/edge model ready for a graph viewer.
//!
//! ## Pipeline
//!
//! - **Extractor**: file discovery and parsing, backed by a content-hash cache
//! - **Analyzer**: import resolution, edge aggregation, structural checks
//! - **Projector**: the `GraphModel` wire format (JSON or HTML export)

pub mod config;
pub mod core;
pub mod error;
pub mod formatters;
pub mod parsers;
pub mod pipeline;

pub use config::AnalysisConfig;
pub use pipeline::{Pipeline, PipelineOutput};
