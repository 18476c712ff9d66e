//! Daily summary text.

use chrono::NaiveDate;
use std::fmt::Write;
use vw_02_moniker_resolver::MonikerBook;
use vw_03_participation_store::{HeightRange, ValidatorRate};

/// Rates at or above this are marked healthy.
pub const LOW_RATE_THRESHOLD: f64 = 95.0;

/// Render one day's participation, lowest rate first.
///
/// Monikers come from the live book, not the stored rows.
pub fn format_daily_report(
    date: NaiveDate,
    blocks: Option<HeightRange>,
    rates: &[ValidatorRate],
    monikers: &MonikerBook,
    threshold: f64,
) -> String {
    let (Some(range), false) = (blocks, rates.is_empty()) else {
        return format!("📊 Daily Summary for {date}: no participation data");
    };

    let mut sorted: Vec<&ValidatorRate> = rates.iter().collect();
    sorted.sort_by(|a, b| a.rate.total_cmp(&b.rate).then_with(|| a.address.cmp(&b.address)));

    let mut out = format!(
        "📊 Daily Summary for {date} (Blocks {} → {}):\n\n",
        range.min, range.max
    );
    for rate in sorted {
        let marker = if rate.rate >= threshold { "🟢" } else { "🔴" };
        let _ = writeln!(
            out,
            "  {marker} Validator: {} addr: ({}) rate: {:.2}%",
            monikers.moniker_of(&rate.address),
            rate.address,
            rate.rate
        );
    }
    out
}
