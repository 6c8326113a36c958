pub mod active_bin;
pub mod balances;

pub use active_bin::ActiveBin;
pub use balances::{BalanceSnapshot, UsableBalances};
