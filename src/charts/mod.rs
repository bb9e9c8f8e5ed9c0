//! Terminal renderers for the analytics views.
//!
//! Renders the transformer's output as a stacked per-month bar chart
//! (one colored segment per observed type) and a type-distribution
//! summary. A (month, type) key absent from a bucket contributes a
//! zero-width segment — unset reads as zero here, the transformer never
//! fabricates keys.

use std::collections::BTreeMap;

use colored::{Color, Colorize};

use crate::analytics::MonthBucket;

/// Segment colors, cycled per type in display order.
const PALETTE: [Color; 6] = [
    Color::Blue,
    Color::Green,
    Color::Cyan,
    Color::Yellow,
    Color::Red,
    Color::Magenta,
];

/// Maximum bar width in character cells.
const BAR_WIDTH: usize = 40;

/// Color assigned to the type at `index` in display order.
pub fn type_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

// ---------------------------------------------------------------------------
// Monthly stacked chart
// ---------------------------------------------------------------------------

/// Print the per-month stacked bar chart.
///
/// `types` fixes the segment order and coloring; it is the distribution
/// key list so both charts color a type identically.
pub fn print_monthly(series: &[MonthBucket], types: &[String]) {
    println!("{}", "Monthly by type".bold().cyan());
    println!("{}", "=".repeat(56));

    if series.is_empty() {
        println!("  {}", "No analytics data.".yellow());
        return;
    }

    // Legend
    let legend: Vec<String> = types
        .iter()
        .enumerate()
        .map(|(i, kind)| format!("{} {}", "■".color(type_color(i)), kind))
        .collect();
    println!("  {}", legend.join("  "));
    println!();

    let max_total = series
        .iter()
        .map(|bucket| bucket.counts.values().sum::<u64>())
        .max()
        .unwrap_or(0);

    for bucket in series {
        let mut bar = String::new();
        for (i, kind) in types.iter().enumerate() {
            let count = bucket.counts.get(kind).copied().unwrap_or(0);
            let width = scaled(count, max_total, BAR_WIDTH);
            if width > 0 {
                bar.push_str(&"█".repeat(width).color(type_color(i)).to_string());
            }
        }
        let total: u64 = bucket.counts.values().sum();
        println!("  {:>5} │{} {}", bucket.month, bar, total);
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// Print the type-distribution summary.
pub fn print_distribution(distribution: &BTreeMap<String, u64>) {
    println!("{}", "Distribution".bold().cyan());
    println!("{}", "=".repeat(56));

    if distribution.is_empty() {
        println!("  {}", "No analytics data.".yellow());
        return;
    }

    let total: u64 = distribution.values().sum();
    let max_count = distribution.values().copied().max().unwrap_or(0);

    for (i, (kind, count)) in distribution.iter().enumerate() {
        let pct = if total == 0 {
            0.0
        } else {
            (*count as f64 / total as f64) * 100.0
        };
        let bar = "█".repeat(scaled(*count, max_count, BAR_WIDTH));
        println!(
            "  {:<16} {:>6} {:>5.1}% {}",
            kind,
            count,
            pct,
            bar.color(type_color(i)),
        );
    }
}

/// Scale a count to a bar width against the chart's maximum.
fn scaled(count: u64, max: u64, width: usize) -> usize {
    if max == 0 {
        0
    } else {
        ((count as u128 * width as u128) / max as u128) as usize
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_is_proportional() {
        assert_eq!(scaled(0, 10, 40), 0);
        assert_eq!(scaled(5, 10, 40), 20);
        assert_eq!(scaled(10, 10, 40), 40);
    }

    #[test]
    fn scaled_handles_zero_max() {
        assert_eq!(scaled(0, 0, 40), 0);
        assert_eq!(scaled(7, 0, 40), 0);
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(type_color(0), type_color(PALETTE.len()));
        assert_eq!(type_color(1), type_color(PALETTE.len() + 1));
    }
}
