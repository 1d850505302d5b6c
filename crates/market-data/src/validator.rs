//! Hard sanity checks on vendor bars.
//!
//! Runs at the router boundary: bars that violate an OHLC invariant never
//! reach the caller or the cache. Violations are vendor data bugs, not
//! request failures, so offending bars are dropped with a warning instead
//! of failing the whole fetch.

use log::warn;
use rust_decimal::Decimal;

use crate::models::Bar;

/// Returns the violated invariant, if any.
fn hard_violation(bar: &Bar) -> Option<&'static str> {
    if bar.open <= Decimal::ZERO {
        return Some("non-positive open");
    }
    if bar.high < bar.open.max(bar.close) {
        return Some("high below open/close");
    }
    if bar.low > bar.open.min(bar.close) {
        return Some("low above open/close");
    }
    if bar.volume < 0 {
        return Some("negative volume");
    }
    None
}

/// Drop bars failing a hard check, keeping the rest in order.
pub fn validate_bars(provider: &str, bars: Vec<Bar>) -> Vec<Bar> {
    bars.into_iter()
        .filter(|bar| match hard_violation(bar) {
            Some(reason) => {
                warn!(
                    "Dropping invalid bar from {} for {} at {}: {}",
                    provider, bar.symbol, bar.timestamp, reason
                );
                false
            }
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Granularity;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn valid_bar() -> Bar {
        Bar::ohlcv(
            "AAPL",
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
            Granularity::Daily,
            dec!(190.10),
            dec!(193.55),
            dec!(189.80),
            dec!(192.25),
            44_532_100,
        )
    }

    #[test]
    fn test_valid_bar_passes() {
        assert_eq!(validate_bars("TEST", vec![valid_bar()]).len(), 1);
    }

    #[test]
    fn test_non_positive_open_is_dropped() {
        let mut bar = valid_bar();
        bar.open = Decimal::ZERO;
        assert!(validate_bars("TEST", vec![bar]).is_empty());
    }

    #[test]
    fn test_high_below_close_is_dropped() {
        let mut bar = valid_bar();
        bar.high = dec!(191.00);
        assert!(validate_bars("TEST", vec![bar]).is_empty());
    }

    #[test]
    fn test_low_above_open_is_dropped() {
        let mut bar = valid_bar();
        bar.low = dec!(191.00);
        assert!(validate_bars("TEST", vec![bar]).is_empty());
    }

    #[test]
    fn test_negative_volume_is_dropped() {
        let mut bar = valid_bar();
        bar.volume = -1;
        assert!(validate_bars("TEST", vec![bar]).is_empty());
    }

    #[test]
    fn test_only_offending_bars_are_dropped() {
        let mut bad = valid_bar();
        bad.open = dec!(-1);
        let kept = validate_bars("TEST", vec![valid_bar(), bad, valid_bar()]);
        assert_eq!(kept.len(), 2);
    }
}
