/// Driver Module
///
/// The seams between sqlbridge and a concrete database driver. A driver
/// supplies a connection that prepares statements, statements that bind and
/// execute, and cursors that hand out rows. Statements borrow their
/// connection and cursors borrow their statement, so neither can outlive
/// the call that opened it.
use crate::core::db::types::Value;
use crate::core::error::DriverResult;
use chrono::NaiveDateTime;

/// An open database session owned by the caller.
pub trait Connection {
    type Statement<'c>: Statement
    where
        Self: 'c;

    fn prepare(&self, sql: &str) -> DriverResult<Self::Statement<'_>>;

    /// Commits the current transaction.
    fn commit(&self) -> DriverResult<()>;

    /// Rolls back the current transaction.
    fn rollback(&self) -> DriverResult<()>;
}

/// A prepared statement.
pub trait Statement {
    type Cursor<'s>: Cursor
    where
        Self: 's;

    /// Binds an already-coerced value at a 1-based position.
    fn bind(&mut self, position: usize, value: &Value) -> DriverResult<()>;

    /// Runs the statement as a read and opens a cursor over its rows.
    fn query(&mut self) -> DriverResult<Self::Cursor<'_>>;

    /// Runs the statement as a mutation and returns the affected row count.
    fn execute(&mut self) -> DriverResult<u64>;

    /// Releases the statement.
    fn close(self) -> DriverResult<()>;
}

/// A live result cursor.
pub trait Cursor {
    type Row: RowAccess + ?Sized;

    fn column_count(&self) -> usize;

    /// Advances to the next row; `None` once the rows are exhausted.
    fn next_row(&mut self) -> DriverResult<Option<&Self::Row>>;

    /// Releases the cursor.
    fn close(self) -> DriverResult<()>;
}

/// Typed access to the current row. Column indexes are 0-based.
///
/// The primitive readers never report an absent value: a null column reads
/// as zero or `false`, matching what JDBC-style drivers do.
pub trait RowAccess {
    fn get_timestamp(&self, index: usize) -> DriverResult<Option<NaiveDateTime>>;

    fn get_f64(&self, index: usize) -> DriverResult<f64>;

    fn get_f32(&self, index: usize) -> DriverResult<f32>;

    fn get_i64(&self, index: usize) -> DriverResult<i64>;

    fn get_i32(&self, index: usize) -> DriverResult<i32>;

    fn get_bool(&self, index: usize) -> DriverResult<bool>;

    fn get_string(&self, index: usize) -> DriverResult<Option<String>>;

    /// The driver's native value, unconverted.
    fn get_value(&self, index: usize) -> DriverResult<Value>;
}
