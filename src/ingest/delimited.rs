/// Line-oriented delimited text parsing shared by the tabular readers.
///
/// Handles a header row, double-quoted fields (which may contain the
/// delimiter, with `""` as an escaped quote) and blank lines. Quoted
/// fields spanning several lines are not supported; none of the source
/// exports produce them.

use crate::model::LoadError;

/// A parsed header plus raw string rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DelimitedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DelimitedTable {
    /// Index of the first header matching any of `names`, ignoring case
    /// and surrounding whitespace.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| {
            self.headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
        })
    }

    /// Resolves each required column to an index, or reports every
    /// missing one by its primary name.
    pub fn require_columns(&self, required: &[&[&str]]) -> Result<Vec<usize>, LoadError> {
        let mut indices = Vec::with_capacity(required.len());
        let mut missing = Vec::new();
        for aliases in required {
            match self.column(aliases) {
                Some(i) => indices.push(i),
                None => missing.push(aliases.first().copied().unwrap_or_default().to_string()),
            }
        }
        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(LoadError::MissingColumns(missing))
        }
    }
}

/// Splits one record into fields.
pub fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parses delimited text with a header row.
pub fn parse_delimited(text: &str, delimiter: char) -> Result<DelimitedTable, LoadError> {
    let mut lines = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| LoadError::Parse("file is empty".to_string()))?;
    let headers: Vec<String> = split_record(header_line, delimiter)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows = lines.map(|l| split_record(l, delimiter)).collect();
    Ok(DelimitedTable { headers, rows })
}

/// Returns the trimmed cell at `index`, or `None` when the row is short
/// or the cell is blank.
pub fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("NA") && !s.eq_ignore_ascii_case("null"))
}

/// Coerces a present count cell to a non-negative integer.
///
/// Anything that is not a finite, non-negative number below 2^64 becomes
/// 0; fractional values are truncated toward zero.
pub fn coerce_count(raw: &str) -> u64 {
    // u64::MAX as f64 rounds up to exactly 2^64
    const LIMIT: f64 = u64::MAX as f64;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v < LIMIT => v.trunc() as u64,
        _ => 0,
    }
}

/// Parses a coordinate, accepting a decimal comma (`37,85`).
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
