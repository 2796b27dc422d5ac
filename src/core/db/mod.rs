/// Database Module
///
/// This module provides the data-access core of sqlbridge, organized into
/// focused submodules.
///
/// ## Architecture
///
/// - **Driver seams** (`driver.rs`): connection, statement, cursor and row traits
/// - **SQLite driver** (`sqlite.rs`): the traits implemented for `rusqlite`
/// - **Values and type tags** (`types.rs`): argument coercion and column types
/// - **Query Execution** (`query.rs`): reads, writes and row decoding
/// - **Transactions** (`transaction.rs`): commit and rollback
///
/// ## Error Handling
///
/// Every operation takes an `ErrorFactory` and returns failures as
/// `AccessError<F::Error>`, so callers receive their own error type.
pub mod driver;
pub mod query;
pub mod sqlite;
pub mod transaction;
pub mod types;

pub use driver::*;
pub use query::*;
pub use sqlite::SqliteCursor;
pub use transaction::*;
pub use types::*;
