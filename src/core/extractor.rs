use std::path::Path;
use tracing::{debug, info, warn};

use super::cancel::CancellationToken;
use super::FileScanner;
use crate::config::AnalysisConfig;
use crate::parsers::cache::{hash_bytes, ContentCache};
use crate::parsers::common::read_source;
use crate::parsers::{ParserFactory, SourceRecord};

/// Records produced by one extraction pass plus bookkeeping for logs.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<SourceRecord>,
    pub cache_hits: usize,
    pub parsed: usize,
    pub failed: usize,
    /// True when the pass stopped early; `records` holds what was done so far.
    pub cancelled: bool,
}

/// Walks a workspace and turns each recognised source file into a
/// [`SourceRecord`], reusing cached records for unchanged files.
pub struct Extractor {
    file_scanner: FileScanner,
    parser_factory: ParserFactory,
    cache: ContentCache,
}

impl Extractor {
    pub fn new(config: &AnalysisConfig, cache: ContentCache) -> anyhow::Result<Self> {
        Ok(Self {
            file_scanner: FileScanner::new(config.clone()),
            parser_factory: ParserFactory::new()?,
            cache,
        })
    }

    pub fn extract(&mut self, root_path: &Path, cancel: &dyn CancellationToken) -> Extraction {
        info!("Starting workspace parse: {}", root_path.display());

        let files = self.file_scanner.scan_directory(root_path);
        debug!(files = files.len(), "scan complete");

        let mut extraction = Extraction {
            records: Vec::with_capacity(files.len()),
            ..Extraction::default()
        };

        for file_path in &files {
            if cancel.is_cancellation_requested() {
                info!(
                    "Extraction cancelled after {} of {} files",
                    extraction.records.len(),
                    files.len()
                );
                extraction.cancelled = true;
                break;
            }

            if let Some(cached) = self.cache.get(file_path) {
                extraction.records.push(cached);
                extraction.cache_hits += 1;
                continue;
            }

            // The record is cached under the hash of the bytes it was parsed
            // from, not of whatever is on disk afterwards.
            let parsed = self.parser_factory.get_parser(file_path).and_then(|parser| {
                let source = read_source(file_path)?;
                let record = parser.parse_source(file_path, &source)?;
                Ok((hash_bytes(source.as_bytes()), record))
            });

            match parsed {
                Ok((content_hash, record)) => {
                    if let Err(err) = self
                        .cache
                        .set_with_hash(file_path, content_hash, record.clone())
                    {
                        warn!("Failed to cache {}: {err}", file_path.display());
                    }
                    extraction.records.push(record);
                    extraction.parsed += 1;
                }
                Err(err) => {
                    warn!("Failed to parse {}: {err}", file_path.display());
                    extraction.failed += 1;
                }
            }
        }

        info!(
            "Parsed {} files (cache hits: {}, parsed: {}, failed: {})",
            extraction.records.len(),
            extraction.cache_hits,
            extraction.parsed,
            extraction.failed
        );

        extraction
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ContentCache {
        &mut self.cache
    }
}
