mod cache;
mod engine;

pub use cache::TransactionCache;
pub use engine::{FetchOptions, TransactionEngine};
