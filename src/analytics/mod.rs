//! Analytics transformer — reshapes the backend's flat aggregate rows.
//!
//! The backend returns `{_id: {month, type}, count}` rows. Two views are
//! derived:
//! - **Monthly series**: one bucket per distinct month, ascending, each
//!   carrying a count per observed type.
//! - **Type distribution**: type → total count across all months.
//!
//! Months and types are discovered dynamically from the input — there is
//! no fixed enumeration. A (month, type) pair absent from the input gets
//! no key at all (absent, not zero); renderers treat unset as zero.

use std::collections::BTreeMap;

use crate::api::AnalyticsRow;

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

/// One month's aggregate: a count per type observed in that month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthBucket {
    pub month: u32,
    /// Only types that actually occurred in this month are present.
    pub counts: BTreeMap<String, u64>,
}

/// Build the per-month stacked series, sorted ascending by month.
///
/// Repeated (month, type) rows accumulate into one count.
pub fn monthly_series(rows: &[AnalyticsRow]) -> Vec<MonthBucket> {
    let mut by_month: BTreeMap<u32, BTreeMap<String, u64>> = BTreeMap::new();
    for row in rows {
        *by_month
            .entry(row.group.month)
            .or_default()
            .entry(row.group.kind.clone())
            .or_default() += row.count;
    }

    by_month
        .into_iter()
        .map(|(month, counts)| MonthBucket { month, counts })
        .collect()
}

// ---------------------------------------------------------------------------
// Type distribution
// ---------------------------------------------------------------------------

/// Total count per type across the whole series.
pub fn type_distribution(rows: &[AnalyticsRow]) -> BTreeMap<String, u64> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.group.kind.clone()).or_default() += row.count;
    }
    totals
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
