pub mod analyzer;
pub mod cancel;
pub mod extractor;
pub mod graph;
pub mod resolver;
pub mod scanner;

pub use analyzer::{AnalysisResult, DependencyAnalyzer, DependencyEdge};
pub use cancel::{CancellationFlag, CancellationToken, NeverCancel};
pub use extractor::{Extraction, Extractor};
pub use graph::{ModuleGraph, ModuleGraphBuilder};
pub use resolver::ImportResolver;
pub use scanner::FileScanner;
