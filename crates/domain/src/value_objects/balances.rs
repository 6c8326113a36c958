use crate::entities::PoolDetails;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spendable holdings keyed by asset symbol, after the native fee buffer.
///
/// Always a fresh read; never cached across operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsableBalances {
    amounts: BTreeMap<String, Decimal>,
}

impl UsableBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the amount for `symbol`, flooring negative values at zero.
    pub fn insert(&mut self, symbol: impl Into<String>, amount: Decimal) {
        self.amounts.insert(symbol.into(), amount.max(Decimal::ZERO));
    }

    /// Amount held for `symbol`, zero when unknown.
    pub fn get(&self, symbol: &str) -> Decimal {
        self.amounts.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.amounts.iter()
    }

    /// Total value of both pool assets expressed in asset B.
    pub fn total_value(&self, pool: &PoolDetails, price_a_in_b: Decimal) -> Decimal {
        self.get(&pool.token_a.symbol) * price_a_in_b + self.get(&pool.token_b.symbol)
    }
}

impl std::fmt::Display for UsableBalances {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .amounts
            .iter()
            .map(|(symbol, amount)| format!("{} {}", amount.normalize(), symbol))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Structured record of the total usable balance at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub recorded_at: DateTime<Utc>,
    pub symbol_a: String,
    pub symbol_b: String,
    pub amount_a: Decimal,
    pub amount_b: Decimal,
    /// Price of A in B used for the valuation.
    pub price: Decimal,
    /// `amount_a * price + amount_b`.
    pub total_value: Decimal,
}

impl BalanceSnapshot {
    /// Values `balances` at `price` and stamps the snapshot with the current time.
    pub fn capture(pool: &PoolDetails, balances: &UsableBalances, price: Decimal) -> Self {
        let amount_a = balances.get(&pool.token_a.symbol);
        let amount_b = balances.get(&pool.token_b.symbol);
        Self {
            recorded_at: Utc::now(),
            symbol_a: pool.token_a.symbol.clone(),
            symbol_b: pool.token_b.symbol.clone(),
            amount_a,
            amount_b,
            price,
            total_value: amount_a * price + amount_b,
        }
    }
}
