/// Source readers.
///
/// Each reader comes in two layers:
/// - `parse_*` takes raw text and returns `Result<Parsed<T>, LoadError>`,
///   with row accounting for verification and tests.
/// - `load_*` takes a source location and never fails: any `LoadError` is
///   logged at the reader boundary and an empty, well-typed value returned.
///
/// Submodules:
/// - `transport` : file / HTTP retrieval.
/// - `delimited` : CSV-style line parsing.
/// - `geojson`   : feature collection envelope and geometry conversion.
/// - `citizen`, `occurrence`, `grid`, `cameras`: one per source format.

pub mod cameras;
pub mod citizen;
pub mod delimited;
pub mod geojson;
pub mod grid;
pub mod occurrence;
pub mod transport;

use crate::logging::{self, SourceKind};
use crate::model::LoadError;

/// A successfully parsed source plus its row accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub rows_read: usize,
    pub rows_kept: usize,
}

impl<T> Parsed<T> {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read.saturating_sub(self.rows_kept)
    }
}

/// Reads `location` and parses it, absorbing every failure into `empty()`.
pub(crate) fn load_or_empty<T>(
    kind: SourceKind,
    location: &str,
    empty: impl FnOnce() -> T,
    parse: impl FnOnce(&str) -> Result<Parsed<T>, LoadError>,
) -> T {
    match read_and_parse(location, parse) {
        Ok(parsed) => {
            logging::log_load_summary(kind, location, parsed.rows_read, parsed.rows_kept);
            parsed.value
        }
        Err(err) => {
            logging::log_load_failure(kind, location, &err);
            empty()
        }
    }
}

/// Reads `location` and parses it, keeping the error for callers that
/// report on it (verification).
pub fn read_and_parse<T>(
    location: &str,
    parse: impl FnOnce(&str) -> Result<Parsed<T>, LoadError>,
) -> Result<Parsed<T>, LoadError> {
    let text = transport::read_source(location)?;
    parse(&text)
}
