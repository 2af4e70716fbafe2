use serde::Serialize;

/// Sign classification of a percentage delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

/// A headline value compared against its baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetric {
    pub current_value: f64,
    pub previous_value: f64,
    pub percent_change: String,
    pub trend: Trend,
}

/// Computes `((current - previous) / previous) * 100` rendered with one
/// decimal digit and a `+` prefix when non-negative.
///
/// A zero baseline is capped: `"0%"` when `current` is also zero, otherwise
/// `"+100%"`, both trending up. An unchanged value also renders as `"0%"`.
/// Inputs are not validated.
pub fn percent_change(current: f64, previous: f64) -> DerivedMetric {
    let (percent_change, trend) = if previous == 0.0 {
        let label = if current == 0.0 { "0%" } else { "+100%" };
        (label.to_string(), Trend::Up)
    } else if current == previous {
        ("0%".to_string(), Trend::Up)
    } else {
        let pct = ((current - previous) / previous) * 100.0;
        if pct < 0.0 {
            (format!("{pct:.1}%"), Trend::Down)
        } else {
            (format!("+{pct:.1}%"), Trend::Up)
        }
    };

    DerivedMetric {
        current_value: current,
        previous_value: previous,
        percent_change,
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_baseline_zero_current() {
        let m = percent_change(0.0, 0.0);
        assert_eq!(m.percent_change, "0%");
        assert_eq!(m.trend, Trend::Up);
    }

    #[test]
    fn test_zero_baseline_is_capped() {
        let m = percent_change(1_000_000.0, 0.0);
        assert_eq!(m.percent_change, "+100%");
        assert_eq!(m.trend, Trend::Up);
    }

    #[test]
    fn test_one_decimal_formatting() {
        assert_eq!(percent_change(150.0, 100.0).percent_change, "+50.0%");
        assert_eq!(percent_change(2.0, 3.0).percent_change, "-33.3%");
        assert_eq!(percent_change(100.0, 99.99).percent_change, "+0.0%");
    }

    #[test]
    fn test_unchanged_value_is_zero_percent() {
        let m = percent_change(5.0, 5.0);
        assert_eq!(m.percent_change, "0%");
        assert_eq!(m.trend, Trend::Up);
    }

    #[test]
    fn test_negative_inputs_use_formula() {
        let m = percent_change(-5.0, 10.0);
        assert_eq!(m.percent_change, "-150.0%");
        assert_eq!(m.trend, Trend::Down);
    }

    #[test]
    fn test_trend_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Trend::Down).unwrap(), "\"down\"");
    }

    proptest! {
        #[test]
        fn prop_zero_baseline_always_up(current in 0.0f64..1e12) {
            let m = percent_change(current, 0.0);
            prop_assert_eq!(m.trend, Trend::Up);
            if current == 0.0 {
                prop_assert_eq!(m.percent_change, "0%");
            } else {
                prop_assert_eq!(m.percent_change, "+100%");
            }
        }

        #[test]
        fn prop_down_iff_current_below_previous(
            current in 0u32..100_000,
            previous in 1u32..100_000,
        ) {
            let m = percent_change(current as f64, previous as f64);
            prop_assert_eq!(m.trend == Trend::Down, current < previous);
        }
    }
}
