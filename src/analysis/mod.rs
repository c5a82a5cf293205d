/// Analytics over the canonical model.
///
/// Every function here is total over well-typed input: an empty view is a
/// valid degenerate case and produces empty or zero results, never an
/// error. Inputs are only read; each call builds a fresh result.
///
/// Submodules:
/// - `filter`     : conjunctive predicates producing a derived view.
/// - `aggregate`  : group-by totals, distinct counts, rankings, cross tabs.
/// - `correlation`: per-entity category correlation and outlier sensitivity.
/// - `summary`    : dashboard metrics composed from the aggregations.
/// - `temporal`   : per-year and per-taxon breakdowns of occurrences.

pub mod aggregate;
pub mod correlation;
pub mod filter;
pub mod summary;
pub mod temporal;
