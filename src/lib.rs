//! sqlbridge
//!
//! Runs parameterized SQL against a caller-owned connection, decodes rows by
//! declared column types, and reports every failure as the caller's own
//! error type.
//!
//! ```
//! use sqlbridge::core::db::{execute_query, ColumnType, Query, SqlType, Value};
//! use sqlbridge::core::DriverError;
//!
//! #[derive(Debug)]
//! struct RepoError(String);
//!
//! let conn = rusqlite::Connection::open_in_memory().unwrap();
//! conn.execute_batch("CREATE TABLE t (id INTEGER, name TEXT); INSERT INTO t VALUES (1, 'a');")
//!     .unwrap();
//!
//! let factory = |message: String, _cause: Option<DriverError>| RepoError(message);
//! let rows = execute_query(
//!     &conn,
//!     &Query::new("SELECT id, name FROM t WHERE id = ?").arg(SqlType::BigInt, 1_i64),
//!     &[ColumnType::Int64, ColumnType::Text],
//!     &factory,
//! )
//! .unwrap();
//! assert_eq!(rows, vec![vec![Value::BigInt(1), Value::from("a")]]);
//! ```

// Core infrastructure modules
pub mod core;

pub mod catalog;
pub mod config;
pub mod logging;

pub use catalog::Catalog;
pub use config::{load_config, Config};
pub use crate::core::db::{commit, execute_query, execute_update, rollback};
