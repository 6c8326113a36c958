pub mod bin_price;
pub mod bin_range;
pub mod rebalance;

pub use bin_price::{bin_array_index, bin_id_to_price};
pub use bin_range::{RangeWidth, range_width};
pub use rebalance::{SwapDirection, SwapPlan, plan_rebalance_swap};
