//! Periodic performance report.

use crate::lifecycle::AggregateStats;
use dlmm_lp_domain::value_objects::BalanceSnapshot;
use rust_decimal::Decimal;
use std::fmt;

/// Comparison of two balance valuations plus activity since startup.
#[derive(Debug, Clone)]
pub struct PerformanceReport {
    /// Older valuation.
    pub from: BalanceSnapshot,
    /// Newer valuation.
    pub to: BalanceSnapshot,
    pub stats: AggregateStats,
}

impl PerformanceReport {
    pub fn new(from: BalanceSnapshot, to: BalanceSnapshot, stats: AggregateStats) -> Self {
        Self { from, to, stats }
    }

    /// Change in total value, denominated in asset B.
    pub fn change(&self) -> Decimal {
        self.to.total_value - self.from.total_value
    }

    /// Change in percent of the older valuation, if it is non-zero.
    pub fn change_pct(&self) -> Option<Decimal> {
        if self.from.total_value.is_zero() {
            return None;
        }
        Some(self.change() / self.from.total_value * Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol_b = &self.to.symbol_b;
        write!(
            f,
            "Value {} -> {} {}",
            self.from.total_value.round_dp(6).normalize(),
            self.to.total_value.round_dp(6).normalize(),
            symbol_b
        )?;
        if let Some(pct) = self.change_pct() {
            write!(f, " ({:+}%)", pct.round_dp(2).normalize())?;
        }
        write!(
            f,
            " since {}; {} positions opened, {} relocations, {} swaps, fees {} {} + {} {}",
            self.from.recorded_at.format("%Y-%m-%d %H:%M UTC"),
            self.stats.positions_opened,
            self.stats.relocations,
            self.stats.swaps,
            self.stats.fees_a.normalize(),
            self.to.symbol_a,
            self.stats.fees_b.normalize(),
            symbol_b
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn snapshot(total: Decimal) -> BalanceSnapshot {
        BalanceSnapshot {
            recorded_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            symbol_a: "SOL".to_string(),
            symbol_b: "USDC".to_string(),
            amount_a: dec!(1),
            amount_b: total - dec!(100),
            price: dec!(100),
            total_value: total,
        }
    }

    #[test]
    fn test_change() {
        let stats = AggregateStats {
            relocations: 2,
            swaps: 3,
            fees_b: dec!(1.25),
            ..AggregateStats::default()
        };
        let report = PerformanceReport::new(snapshot(dec!(300)), snapshot(dec!(330)), stats);

        assert_eq!(report.change(), dec!(30));
        assert_eq!(report.change_pct(), Some(dec!(10)));
        assert_eq!(
            report.to_string(),
            "Value 300 -> 330 USDC (+10%) since 2024-03-01 12:00 UTC; \
             0 positions opened, 2 relocations, 3 swaps, fees 0 SOL + 1.25 USDC"
        );
    }

    #[test]
    fn test_zero_baseline_has_no_percentage() {
        let report = PerformanceReport::new(
            snapshot(dec!(0)),
            snapshot(dec!(50)),
            AggregateStats::default(),
        );
        assert!(report.change_pct().is_none());
        assert!(report.to_string().starts_with("Value 0 -> 50 USDC since"));
    }
}
