pub mod pair;
pub mod pool;
pub mod position;
pub mod token;

// Re-export for easier access
pub use pair::PairConfig;
pub use pool::PoolSnapshot;
pub use position::PositionSnapshot;
pub use token::{Token, TokenId};
