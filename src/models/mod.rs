pub mod account;
pub mod feed;
pub mod pagination;
pub mod pot;
pub mod transaction;
pub mod webhook;

pub use account::{Account, AccountType, Balance, Whoami};
pub use feed::{FeedItem, FeedItemParams};
pub use pagination::Pagination;
pub use pot::{Pot, PotTransfer};
pub use transaction::{Merchant, Transaction, TransactionList};
pub use webhook::Webhook;
