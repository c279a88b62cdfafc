// Service exports
pub mod export;
pub mod listings;
pub mod query_log;
pub mod rules;
pub mod store;

pub use export::{queries_to_csv, CSV_HEADER};
pub use listings::{ListingsClient, ListingsError, ListingsLookup};
pub use query_log::{AppendOutcome, QueryLog};
pub use rules::RuleStore;
pub use store::{SqliteStore, StoreError};
