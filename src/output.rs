//! Output formatting for overview results.
//!
//! Supports pretty-printing, JSON serialization, and a plain-text summary.

use anyhow::Result;
use std::fmt::Write;

use crate::delta::DerivedMetric;
use crate::overview::metrics::OverviewMetrics;

/// Prints the overview using Rust's debug pretty-print format.
pub fn print_pretty(metrics: &OverviewMetrics) {
    println!("{:#?}", metrics);
}

/// Serializes the overview as pretty-printed JSON.
pub fn to_json(metrics: &OverviewMetrics) -> Result<String> {
    Ok(serde_json::to_string_pretty(metrics)?)
}

/// Formats an amount in Vietnamese đồng: rounded, `.` as thousands
/// separator, ` ₫` suffix. `1500000.4` becomes `1.500.000 ₫`.
pub fn format_vnd(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped} ₫")
    } else {
        format!("{grouped} ₫")
    }
}

fn change_line(label: &str, metric: &DerivedMetric, baseline: &str) -> String {
    let arrow = match metric.trend {
        crate::delta::Trend::Up => "▲",
        crate::delta::Trend::Down => "▼",
    };
    format!("{label:<22}{arrow} {} {baseline}", metric.percent_change)
}

/// Renders the overview as a human-readable text block.
pub fn render_text(metrics: &OverviewMetrics) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Overview at {}", metrics.generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(
        out,
        "  Total users           {} ({} new)",
        metrics.total_users, metrics.new_users_count
    );
    let _ = writeln!(out, "  Bookings today        {}", metrics.today_bookings);
    let _ = writeln!(out, "  Revenue this month    {}", metrics.current_month_revenue_display);
    let _ = writeln!(out, "  Pending maintenance   {}", metrics.pending_maintenance);
    let _ = writeln!(out, "  {}", change_line("Users", &metrics.users_change, "vs last month"));
    let _ = writeln!(
        out,
        "  {}",
        change_line("Bookings", &metrics.bookings_change, "vs yesterday")
    );
    let _ = writeln!(out, "  {}", change_line("Revenue", &metrics.revenue_change, "vs last month"));

    let _ = writeln!(out, "Top courts");
    for (rank, court) in metrics.top_courts.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<24} {:>5} bookings  {:>5.1}%  {:?}",
            rank + 1,
            court.court_name,
            court.booking_count,
            court.utilization_rate,
            court.status
        );
    }

    let _ = writeln!(out, "Top users");
    for (rank, user) in metrics.top_users.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<24} {:>5} bookings  {}",
            rank + 1,
            user.user.name,
            user.booking_count,
            format_vnd(user.total_revenue)
        );
    }

    let _ = writeln!(out, "Newest users");
    for user in &metrics.newest_users {
        let _ = writeln!(
            out,
            "  {:<28} {}{}",
            user.user.name,
            user.user.created_at.format("%Y-%m-%d"),
            if user.is_new { "  [new]" } else { "" }
        );
    }

    if metrics.is_degraded() {
        let _ = writeln!(out, "Unavailable sources");
        for failure in &metrics.degraded {
            let _ = writeln!(out, "  {}: {}", failure.source, failure.reason);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overview::{PassData, aggregate};
    use crate::period::{current_window, previous_window};
    use chrono::NaiveDate;

    fn empty_metrics() -> OverviewMetrics {
        let now = NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        aggregate(
            PassData::default(),
            now,
            current_window(now),
            previous_window(now),
            vec![],
        )
    }

    #[test]
    fn test_format_vnd_grouping() {
        assert_eq!(format_vnd(0.0), "0 ₫");
        assert_eq!(format_vnd(999.0), "999 ₫");
        assert_eq!(format_vnd(1000.0), "1.000 ₫");
        assert_eq!(format_vnd(1_500_000.4), "1.500.000 ₫");
        assert_eq!(format_vnd(-25_000.0), "-25.000 ₫");
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&empty_metrics());
    }

    #[test]
    fn test_json_uses_lowercase_trend() {
        let json = to_json(&empty_metrics()).unwrap();
        assert!(json.contains("\"trend\": \"up\""));
        assert!(json.contains("\"percent_change\": \"0%\""));
    }

    #[test]
    fn test_render_text_headlines() {
        let text = render_text(&empty_metrics());
        assert!(text.contains("Revenue this month    0 ₫"));
        assert!(text.contains("vs yesterday"));
        assert!(!text.contains("Unavailable sources"));
    }
}
