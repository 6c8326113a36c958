//! Pool facts and wallet holdings as the engine sees them.

mod balances;
mod resolver;

pub use balances::BalanceAccessor;
pub use resolver::{PoolResolver, parse_pair_name, pool_details_from_metadata};
