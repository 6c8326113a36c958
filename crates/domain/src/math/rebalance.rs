//! Sizing of the swap that brings two balances to an equal value split.

use crate::error::MathError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a rebalancing swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Sell asset A for asset B.
    AToB,
    /// Sell asset B for asset A.
    BToA,
}

/// A single swap that restores the 50/50 value split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPlan {
    pub direction: SwapDirection,
    /// Amount of the input asset to sell.
    pub amount_in: Decimal,
    /// Total value of both balances in B.
    pub total_value: Decimal,
}

/// Plans the swap that equalizes the value of `amount_a` and `amount_b`.
///
/// `price` is A denominated in B. Returns `None` when the excess on either
/// side is worth no more than `tolerance * total_value`. At most one
/// direction can fire: both targets sum to the actual total value.
pub fn plan_rebalance_swap(
    amount_a: Decimal,
    amount_b: Decimal,
    price: Decimal,
    tolerance: Decimal,
) -> Result<Option<SwapPlan>, MathError> {
    if price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(price));
    }
    if amount_a < Decimal::ZERO {
        return Err(MathError::NegativeBalance(amount_a));
    }
    if amount_b < Decimal::ZERO {
        return Err(MathError::NegativeBalance(amount_b));
    }

    let total_value = amount_a * price + amount_b;
    if total_value.is_zero() {
        return Ok(None);
    }

    let target_value = total_value / Decimal::TWO;
    let target_a = target_value / price;
    let target_b = target_value;
    let min_excess_value = total_value * tolerance;

    let plan = if amount_a > target_a && (amount_a - target_a) * price > min_excess_value {
        Some(SwapPlan {
            direction: SwapDirection::AToB,
            amount_in: amount_a - target_a,
            total_value,
        })
    } else if amount_b > target_b && amount_b - target_b > min_excess_value {
        Some(SwapPlan {
            direction: SwapDirection::BToA,
            amount_in: amount_b - target_b,
            total_value,
        })
    } else {
        None
    };

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_all_in_a_sells_half() {
        let plan = plan_rebalance_swap(dec!(10), dec!(0), dec!(2), dec!(0.005))
            .unwrap()
            .unwrap();
        assert_eq!(plan.direction, SwapDirection::AToB);
        assert_eq!(plan.amount_in, dec!(5));
        assert_eq!(plan.total_value, dec!(20));
    }

    #[test]
    fn test_all_in_b_buys_a() {
        let plan = plan_rebalance_swap(dec!(0), dec!(300), dec!(150), dec!(0.005))
            .unwrap()
            .unwrap();
        assert_eq!(plan.direction, SwapDirection::BToA);
        assert_eq!(plan.amount_in, dec!(150));
    }

    #[test]
    fn test_balanced_within_tolerance_is_noop() {
        // 1.001 SOL @ 150 vs 150 USDC: excess worth ~0.075, well under 0.5%
        let plan = plan_rebalance_swap(dec!(1.001), dec!(150), dec!(150), dec!(0.005)).unwrap();
        assert!(plan.is_none());

        let exact = plan_rebalance_swap(dec!(1), dec!(150), dec!(150), Decimal::ZERO).unwrap();
        assert!(exact.is_none());
    }

    #[test]
    fn test_empty_wallet_is_noop() {
        let plan = plan_rebalance_swap(dec!(0), dec!(0), dec!(3), dec!(0.005)).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(plan_rebalance_swap(dec!(1), dec!(1), dec!(0), dec!(0)).is_err());
        assert!(plan_rebalance_swap(dec!(-1), dec!(1), dec!(1), dec!(0)).is_err());
    }
}
