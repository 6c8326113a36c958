//! Lifecycle events for position tracking.

use dlmm_lp_domain::entities::PositionRange;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEventType {
    /// Position was opened.
    PositionOpened,
    /// Liquidity was withdrawn and the position closed.
    LiquidityRemoved,
    /// Swap fees were claimed.
    FeesClaimed,
    /// Assets were swapped toward a 50/50 split.
    Swapped,
    /// Position was moved to a new range.
    Relocated,
}

/// A lifecycle event for the managed pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Event ID.
    pub id: String,
    /// Event type.
    pub event_type: LifecycleEventType,
    /// Pool address.
    pub pool: String,
    /// Timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl LifecycleEvent {
    /// Creates a new lifecycle event; the type follows from `data`.
    pub fn new(pool: impl Into<String>, data: EventData) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: data.event_type(),
            pool: pool.into(),
            timestamp: chrono::Utc::now(),
            data,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data, f)
    }
}

/// Event-specific data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventData {
    PositionOpened(PositionOpenedData),
    LiquidityRemoved(AmountsData),
    FeesClaimed(AmountsData),
    Swapped(SwapData),
    Relocated(RelocationData),
}

impl EventData {
    /// Type tag of this payload.
    pub fn event_type(&self) -> LifecycleEventType {
        match self {
            Self::PositionOpened(_) => LifecycleEventType::PositionOpened,
            Self::LiquidityRemoved(_) => LifecycleEventType::LiquidityRemoved,
            Self::FeesClaimed(_) => LifecycleEventType::FeesClaimed,
            Self::Swapped(_) => LifecycleEventType::Swapped,
            Self::Relocated(_) => LifecycleEventType::Relocated,
        }
    }
}

impl fmt::Display for EventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionOpened(d) => write!(
                f,
                "Position created over bins {} around active bin {} with {} {} and {} {}",
                d.range,
                d.active_bin,
                d.amounts.amount_a.normalize(),
                d.amounts.symbol_a,
                d.amounts.amount_b.normalize(),
                d.amounts.symbol_b
            ),
            Self::LiquidityRemoved(d) => write!(f, "Liquidity removed: {d}"),
            Self::FeesClaimed(d) => write!(f, "Rewards claimed: {d}"),
            Self::Swapped(d) => write!(
                f,
                "Swapped {} {} for {} {}",
                d.amount_in.normalize(),
                d.input_symbol,
                d.amount_out.normalize(),
                d.output_symbol
            ),
            Self::Relocated(d) => write!(
                f,
                "Position relocated from {} to {} (active bin {})",
                d.old_range, d.new_range, d.active_bin
            ),
        }
    }
}

/// A pair of per-asset amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountsData {
    pub symbol_a: String,
    pub symbol_b: String,
    pub amount_a: Decimal,
    pub amount_b: Decimal,
}

impl fmt::Display for AmountsData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} {}",
            self.amount_a.normalize(),
            self.symbol_a,
            self.amount_b.normalize(),
            self.symbol_b
        )
    }
}

/// Data for position opened event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedData {
    /// Bounds reported by the ledger after creation.
    pub range: PositionRange,
    /// Active bin when the deposit was sized.
    pub active_bin: i32,
    /// Amounts deposited.
    pub amounts: AmountsData,
    /// Price of A in B at deposit time.
    pub entry_price: Decimal,
}

/// Data for swap event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapData {
    pub input_symbol: String,
    pub output_symbol: String,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
}

/// Data for relocation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationData {
    pub old_range: PositionRange,
    pub new_range: PositionRange,
    /// Active bin that triggered the relocation.
    pub active_bin: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amounts(a: Decimal, b: Decimal) -> AmountsData {
        AmountsData {
            symbol_a: "SOL".into(),
            symbol_b: "USDC".into(),
            amount_a: a,
            amount_b: b,
        }
    }

    #[test]
    fn test_event_type_follows_data() {
        let event = LifecycleEvent::new(
            "pool",
            EventData::FeesClaimed(amounts(dec!(0.01), dec!(1.5))),
        );
        assert_eq!(event.event_type, LifecycleEventType::FeesClaimed);
        assert_eq!(event.to_string(), "Rewards claimed: 0.01 SOL, 1.5 USDC");
    }

    #[test]
    fn test_event_lines() {
        let removed = EventData::LiquidityRemoved(amounts(dec!(5.00), dec!(500)));
        assert_eq!(removed.to_string(), "Liquidity removed: 5 SOL, 500 USDC");

        let swap = EventData::Swapped(SwapData {
            input_symbol: "SOL".into(),
            output_symbol: "USDC".into(),
            amount_in: dec!(5),
            amount_out: dec!(742.113),
        });
        assert_eq!(swap.to_string(), "Swapped 5 SOL for 742.113 USDC");

        let relocated = EventData::Relocated(RelocationData {
            old_range: PositionRange::new(100, 120),
            new_range: PositionRange::new(110, 150),
            active_bin: 130,
        });
        assert_eq!(
            relocated.to_string(),
            "Position relocated from [100, 120] to [110, 150] (active bin 130)"
        );
    }
}
