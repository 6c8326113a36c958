pub mod pool;
pub mod position;
pub mod token;

// Re-export for easier access
pub use pool::PoolDetails;
pub use position::{PositionInfo, PositionRange};
pub use token::TokenInfo;
