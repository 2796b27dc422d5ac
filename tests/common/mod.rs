//! Test doubles shared by the integration tests.
//!
//! `MockConnection` is a scripted driver that records every statement and
//! cursor it opens and closes, so tests can check that nothing is left open.
#![allow(dead_code)]

use chrono::NaiveDateTime;
use sqlbridge::core::db::{Connection, Cursor, RowAccess, Statement, Value};
use sqlbridge::core::{DriverError, DriverResult};
use std::cell::{Cell, RefCell};
use thiserror::Error;

/// The caller-defined error kind used throughout the tests.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct PersistenceError {
    pub message: String,
    #[source]
    pub cause: Option<DriverError>,
}

pub fn persistence(message: String, cause: Option<DriverError>) -> PersistenceError {
    PersistenceError { message, cause }
}

/// What the mock connection does when asked.
#[derive(Debug, Default, Clone)]
pub struct Script {
    pub column_count: usize,
    pub rows: Vec<Vec<Value>>,
    pub affected: u64,
    pub fail_prepare: Option<String>,
    pub fail_bind: Option<String>,
    pub fail_query: Option<String>,
    pub fail_execute: Option<String>,
    /// Fails when fetching the row at this index
    pub fail_fetch_at: Option<usize>,
    pub fail_close_statement: Option<String>,
    pub fail_close_cursor: Option<String>,
    pub fail_commit: Option<String>,
    pub fail_rollback: Option<String>,
}

#[derive(Debug, Default)]
pub struct Ledger {
    pub statements_opened: Cell<usize>,
    pub statements_closed: Cell<usize>,
    pub cursors_opened: Cell<usize>,
    pub cursors_closed: Cell<usize>,
    pub bound: RefCell<Vec<(usize, Value)>>,
    pub commits: Cell<usize>,
    pub rollbacks: Cell<usize>,
}

impl Ledger {
    /// True when every opened statement and cursor was closed.
    pub fn all_released(&self) -> bool {
        self.statements_opened.get() == self.statements_closed.get()
            && self.cursors_opened.get() == self.cursors_closed.get()
    }
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

fn scripted(failure: &Option<String>) -> DriverResult<()> {
    match failure {
        Some(message) => Err(DriverError::driver(message.clone())),
        None => Ok(()),
    }
}

#[derive(Debug, Default)]
pub struct MockConnection {
    pub script: Script,
    pub ledger: Ledger,
}

impl MockConnection {
    pub fn new(script: Script) -> Self {
        MockConnection {
            script,
            ledger: Ledger::default(),
        }
    }

    /// A connection whose reads return `rows` with `column_count` columns.
    pub fn returning(column_count: usize, rows: Vec<Vec<Value>>) -> Self {
        Self::new(Script {
            column_count,
            rows,
            ..Script::default()
        })
    }
}

impl Connection for MockConnection {
    type Statement<'c> = MockStatement<'c>;

    fn prepare(&self, _sql: &str) -> DriverResult<MockStatement<'_>> {
        scripted(&self.script.fail_prepare)?;
        bump(&self.ledger.statements_opened);
        Ok(MockStatement { conn: self })
    }

    fn commit(&self) -> DriverResult<()> {
        scripted(&self.script.fail_commit)?;
        bump(&self.ledger.commits);
        Ok(())
    }

    fn rollback(&self) -> DriverResult<()> {
        scripted(&self.script.fail_rollback)?;
        bump(&self.ledger.rollbacks);
        Ok(())
    }
}

pub struct MockStatement<'c> {
    conn: &'c MockConnection,
}

impl<'c> Statement for MockStatement<'c> {
    type Cursor<'s> = MockCursor<'s> where Self: 's;

    fn bind(&mut self, position: usize, value: &Value) -> DriverResult<()> {
        scripted(&self.conn.script.fail_bind)?;
        self.conn.ledger.bound.borrow_mut().push((position, value.clone()));
        Ok(())
    }

    fn query(&mut self) -> DriverResult<MockCursor<'_>> {
        scripted(&self.conn.script.fail_query)?;
        bump(&self.conn.ledger.cursors_opened);
        Ok(MockCursor {
            conn: self.conn,
            rows: self.conn.script.rows.iter().cloned().map(MockRow).collect(),
            next: 0,
        })
    }

    fn execute(&mut self) -> DriverResult<u64> {
        scripted(&self.conn.script.fail_execute)?;
        Ok(self.conn.script.affected)
    }

    fn close(self) -> DriverResult<()> {
        bump(&self.conn.ledger.statements_closed);
        scripted(&self.conn.script.fail_close_statement)
    }
}

pub struct MockCursor<'s> {
    conn: &'s MockConnection,
    rows: Vec<MockRow>,
    next: usize,
}

impl Cursor for MockCursor<'_> {
    type Row = MockRow;

    fn column_count(&self) -> usize {
        self.conn.script.column_count
    }

    fn next_row(&mut self) -> DriverResult<Option<&MockRow>> {
        if self.conn.script.fail_fetch_at == Some(self.next) {
            return Err(DriverError::driver(format!("fetch failed at row {}", self.next)));
        }
        let row = self.rows.get(self.next);
        self.next += 1;
        Ok(row)
    }

    fn close(self) -> DriverResult<()> {
        bump(&self.conn.ledger.cursors_closed);
        scripted(&self.conn.script.fail_close_cursor)
    }
}

/// A row of native values; nulls read as zero through the primitive getters.
pub struct MockRow(Vec<Value>);

impl MockRow {
    fn cell(&self, index: usize) -> DriverResult<&Value> {
        self.0
            .get(index)
            .ok_or_else(|| DriverError::driver(format!("no column {index}")))
    }

    fn number(&self, index: usize) -> DriverResult<f64> {
        match self.cell(index)? {
            Value::Null => Ok(0.0),
            Value::Bool(b) => Ok(f64::from(u8::from(*b))),
            Value::Int(i) => Ok(f64::from(*i)),
            Value::BigInt(i) => Ok(*i as f64),
            Value::Float(f) => Ok(f64::from(*f)),
            Value::Double(f) => Ok(*f),
            other => Err(DriverError::driver(format!("{other} is not numeric"))),
        }
    }
}

impl RowAccess for MockRow {
    fn get_timestamp(&self, index: usize) -> DriverResult<Option<NaiveDateTime>> {
        match self.cell(index)? {
            Value::Null => Ok(None),
            Value::Timestamp(ts) => Ok(Some(*ts)),
            Value::Date(d) => Ok(Some(d.and_time(chrono::NaiveTime::MIN))),
            other => Err(DriverError::driver(format!("{other} is not a timestamp"))),
        }
    }

    fn get_f64(&self, index: usize) -> DriverResult<f64> {
        self.number(index)
    }

    fn get_f32(&self, index: usize) -> DriverResult<f32> {
        Ok(self.number(index)? as f32)
    }

    fn get_i64(&self, index: usize) -> DriverResult<i64> {
        match self.cell(index)? {
            Value::BigInt(i) => Ok(*i),
            _ => Ok(self.number(index)? as i64),
        }
    }

    fn get_i32(&self, index: usize) -> DriverResult<i32> {
        Ok(self.get_i64(index)? as i32)
    }

    fn get_bool(&self, index: usize) -> DriverResult<bool> {
        match self.cell(index)? {
            Value::Bool(b) => Ok(*b),
            _ => Ok(self.number(index)? != 0.0),
        }
    }

    fn get_string(&self, index: usize) -> DriverResult<Option<String>> {
        match self.cell(index)? {
            Value::Null => Ok(None),
            other => Ok(Some(other.to_string())),
        }
    }

    fn get_value(&self, index: usize) -> DriverResult<Value> {
        self.cell(index).cloned()
    }
}
