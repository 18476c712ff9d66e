//! Statement chunk planning for bounded-parameter upserts.

use std::ops::Range;

/// Columns written per participation row.
pub const COLUMNS_PER_ROW: usize = 6;

/// Largest row count a single statement can carry.
pub fn max_rows_per_statement(max_bind_params: usize) -> usize {
    max_bind_params / COLUMNS_PER_ROW
}

/// Index ranges of each statement for a batch of `rows` rows.
///
/// Boundaries depend only on the row count. Returns nothing when `rows` is 0
/// or `max_rows` is 0.
pub fn chunk_bounds(rows: usize, max_rows: usize) -> Vec<Range<usize>> {
    if max_rows == 0 {
        return Vec::new();
    }
    (0..rows)
        .step_by(max_rows)
        .map(|start| start..(start + max_rows).min(rows))
        .collect()
}
