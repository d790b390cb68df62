use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn one source file into a `SourceRecord`.
///
/// Never fatal for a pipeline run: the extractor logs it and drops the file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("no parser registered for {}", path.display())]
    Unsupported { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("snapshot store I/O failed for key `{key}`: {source}")]
    Store {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cache snapshot: {0}")]
    Encode(#[from] bincode::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("workspace root {} is not a readable directory: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("failed to initialise parsers: {0}")]
    ParserInit(#[source] anyhow::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
