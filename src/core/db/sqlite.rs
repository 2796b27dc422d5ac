/// SQLite Driver Module
///
/// Implements the driver traits for `rusqlite`, so a plain
/// `rusqlite::Connection` can be handed to the executor directly.
use crate::core::db::driver::{Connection, Cursor, RowAccess, Statement};
use crate::core::db::types::{parse_bool, parse_timestamp, Value};
use crate::core::error::{DriverError, DriverResult};
use chrono::{DateTime, NaiveDateTime};
use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};
use rusqlite::{Row, Rows, ToSql};

/// Julian day number of 1970-01-01T00:00:00Z.
const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;

impl Connection for rusqlite::Connection {
    type Statement<'c> = rusqlite::Statement<'c>;

    fn prepare(&self, sql: &str) -> DriverResult<rusqlite::Statement<'_>> {
        Ok(rusqlite::Connection::prepare(self, sql)?)
    }

    fn commit(&self) -> DriverResult<()> {
        Ok(self.execute_batch("COMMIT")?)
    }

    fn rollback(&self) -> DriverResult<()> {
        Ok(self.execute_batch("ROLLBACK")?)
    }
}

impl<'conn> Statement for rusqlite::Statement<'conn> {
    type Cursor<'s> = SqliteCursor<'s> where Self: 's;

    fn bind(&mut self, position: usize, value: &Value) -> DriverResult<()> {
        Ok(self.raw_bind_parameter(position, value)?)
    }

    fn query(&mut self) -> DriverResult<SqliteCursor<'_>> {
        let column_count = self.column_count();
        Ok(SqliteCursor {
            rows: self.raw_query(),
            column_count,
        })
    }

    fn execute(&mut self) -> DriverResult<u64> {
        Ok(self.raw_execute()? as u64)
    }

    fn close(self) -> DriverResult<()> {
        Ok(self.finalize()?)
    }
}

/// Cursor over the rows of a SQLite statement.
pub struct SqliteCursor<'stmt> {
    rows: Rows<'stmt>,
    column_count: usize,
}

impl<'stmt> Cursor for SqliteCursor<'stmt> {
    type Row = Row<'stmt>;

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn next_row(&mut self) -> DriverResult<Option<&Row<'stmt>>> {
        Ok(self.rows.next()?)
    }

    fn close(self) -> DriverResult<()> {
        // Dropping the rows resets the statement.
        drop(self.rows);
        Ok(())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => SqliteValue::Null,
            Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
            Value::Int(i) => SqliteValue::Integer(i64::from(*i)),
            Value::BigInt(i) => SqliteValue::Integer(*i),
            Value::Float(f) => SqliteValue::Real(f64::from(*f)),
            Value::Double(f) => SqliteValue::Real(*f),
            Value::Text(s) => return Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
            Value::Bytes(b) => return Ok(ToSqlOutput::Borrowed(ValueRef::Blob(b.as_slice()))),
            Value::Date(d) => SqliteValue::Text(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => SqliteValue::Text(t.format("%H:%M:%S%.f").to_string()),
            Value::Timestamp(ts) => {
                SqliteValue::Text(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

fn text<'a>(index: usize, expected: &'static str, bytes: &'a [u8]) -> DriverResult<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| DriverError::decode(index, expected, e.to_string()))
}

fn parse_number<T: std::str::FromStr>(
    index: usize,
    expected: &'static str,
    s: &str,
) -> DriverResult<T> {
    s.trim()
        .parse()
        .map_err(|_| DriverError::decode(index, expected, format!("'{s}' is not numeric")))
}

impl RowAccess for Row<'_> {
    fn get_timestamp(&self, index: usize) -> DriverResult<Option<NaiveDateTime>> {
        const EXPECTED: &str = "timestamp";
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            ValueRef::Text(bytes) => {
                let s = text(index, EXPECTED, bytes)?;
                parse_timestamp(s).map(Some).ok_or_else(|| {
                    DriverError::decode(index, EXPECTED, format!("'{s}' is not a timestamp"))
                })
            }
            ValueRef::Integer(secs) => DateTime::from_timestamp(secs, 0)
                .map(|dt| Some(dt.naive_utc()))
                .ok_or_else(|| {
                    DriverError::decode(index, EXPECTED, format!("{secs} s is out of range"))
                }),
            ValueRef::Real(julian) => {
                let millis = ((julian - UNIX_EPOCH_JULIAN_DAY) * 86_400_000.0).round() as i64;
                DateTime::from_timestamp_millis(millis)
                    .map(|dt| Some(dt.naive_utc()))
                    .ok_or_else(|| {
                        let reason = format!("julian day {julian} is out of range");
                        DriverError::decode(index, EXPECTED, reason)
                    })
            }
            ValueRef::Blob(_) => {
                Err(DriverError::decode(index, EXPECTED, "blob is not a timestamp"))
            }
        }
    }

    fn get_f64(&self, index: usize) -> DriverResult<f64> {
        match self.get_ref(index)? {
            ValueRef::Null => Ok(0.0),
            ValueRef::Integer(i) => Ok(i as f64),
            ValueRef::Real(f) => Ok(f),
            ValueRef::Text(bytes) => parse_number(index, "double", text(index, "double", bytes)?),
            ValueRef::Blob(_) => Err(DriverError::decode(index, "double", "blob is not numeric")),
        }
    }

    fn get_f32(&self, index: usize) -> DriverResult<f32> {
        Ok(self.get_f64(index)? as f32)
    }

    fn get_i64(&self, index: usize) -> DriverResult<i64> {
        match self.get_ref(index)? {
            ValueRef::Null => Ok(0),
            ValueRef::Integer(i) => Ok(i),
            ValueRef::Real(f) => Ok(f as i64),
            ValueRef::Text(bytes) => parse_number(index, "int64", text(index, "int64", bytes)?),
            ValueRef::Blob(_) => Err(DriverError::decode(index, "int64", "blob is not numeric")),
        }
    }

    fn get_i32(&self, index: usize) -> DriverResult<i32> {
        let wide = self.get_i64(index)?;
        i32::try_from(wide).map_err(|_| {
            DriverError::decode(index, "int32", format!("{wide} overflows a 32-bit integer"))
        })
    }

    fn get_bool(&self, index: usize) -> DriverResult<bool> {
        match self.get_ref(index)? {
            ValueRef::Null => Ok(false),
            ValueRef::Integer(i) => Ok(i != 0),
            ValueRef::Real(f) => Ok(f != 0.0),
            ValueRef::Text(bytes) => {
                let s = text(index, "boolean", bytes)?;
                parse_bool(s).ok_or_else(|| {
                    DriverError::decode(index, "boolean", format!("'{s}' is not a boolean"))
                })
            }
            ValueRef::Blob(_) => {
                Err(DriverError::decode(index, "boolean", "blob is not a boolean"))
            }
        }
    }

    fn get_string(&self, index: usize) -> DriverResult<Option<String>> {
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            ValueRef::Integer(i) => Ok(Some(i.to_string())),
            ValueRef::Real(f) => Ok(Some(f.to_string())),
            ValueRef::Text(bytes) => Ok(Some(text(index, "text", bytes)?.to_string())),
            ValueRef::Blob(bytes) => Ok(Some(String::from_utf8_lossy(bytes).into_owned())),
        }
    }

    fn get_value(&self, index: usize) -> DriverResult<Value> {
        Ok(match self.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::BigInt(i),
            ValueRef::Real(f) => Value::Double(f),
            // text that is not valid UTF-8 is passed on as raw bytes
            ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => Value::Text(s.to_string()),
                Err(_) => Value::Bytes(bytes.to_vec()),
            },
            ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup() -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE cells (
                id INTEGER PRIMARY KEY,
                n INTEGER,
                r REAL,
                t TEXT,
                b BLOB
            );
            INSERT INTO cells (id, n, r, t, b) VALUES (1, 42, 2.5, '2024-03-05 10:20:30', X'0102');
            INSERT INTO cells (id, n, r, t, b) VALUES (2, NULL, NULL, NULL, NULL);
            INSERT INTO cells (id, n, r, t, b) VALUES (3, 1709634030, 2460374.5, 'true', NULL);
        ",
        )
        .unwrap();
        conn
    }

    fn with_row<T>(conn: &rusqlite::Connection, id: i64, f: impl FnOnce(&Row<'_>) -> T) -> T {
        let mut stmt =
            Connection::prepare(conn, "SELECT n, r, t, b FROM cells WHERE id = ?").unwrap();
        stmt.bind(1, &Value::BigInt(id)).unwrap();
        let mut cursor = Statement::query(&mut stmt).unwrap();
        assert_eq!(cursor.column_count(), 4);
        let row = cursor.next_row().unwrap().expect("row exists");
        f(row)
    }

    #[test]
    fn test_nulls_read_as_zero_for_primitives() {
        let conn = setup();
        with_row(&conn, 2, |row| {
            assert_eq!(row.get_i64(0).unwrap(), 0);
            assert_eq!(row.get_i32(0).unwrap(), 0);
            assert_eq!(row.get_f64(1).unwrap(), 0.0);
            assert!(!row.get_bool(0).unwrap());
            assert_eq!(row.get_string(2).unwrap(), None);
            assert_eq!(row.get_timestamp(2).unwrap(), None);
            assert_eq!(row.get_value(3).unwrap(), Value::Null);
        });
    }

    #[test]
    fn test_timestamp_sources() {
        let conn = setup();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(10, 20, 30)
            .unwrap();

        with_row(&conn, 1, |row| {
            assert_eq!(row.get_timestamp(2).unwrap(), Some(expected));
        });
        with_row(&conn, 3, |row| {
            // unix seconds
            assert_eq!(row.get_timestamp(0).unwrap(), Some(expected));
            // julian day of 2024-03-05T00:00:00
            assert_eq!(
                row.get_timestamp(1).unwrap().map(|ts| ts.date()),
                Some(expected.date())
            );
            assert!(row.get_bool(2).unwrap());
        });
    }

    #[test]
    fn test_native_values() {
        let conn = setup();
        with_row(&conn, 1, |row| {
            assert_eq!(row.get_value(0).unwrap(), Value::BigInt(42));
            assert_eq!(row.get_value(1).unwrap(), Value::Double(2.5));
            assert_eq!(row.get_value(3).unwrap(), Value::Bytes(vec![1, 2]));
            assert!(row.get_i64(3).is_err());
        });
    }

    #[test]
    fn test_native_text_keeps_invalid_utf8_bytes() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut stmt =
            Connection::prepare(&conn, "SELECT CAST(X'FF41' AS TEXT), 'ok'").unwrap();
        let mut cursor = Statement::query(&mut stmt).unwrap();
        let row = cursor.next_row().unwrap().expect("row exists");

        assert_eq!(row.get_value(0).unwrap(), Value::Bytes(vec![0xFF, b'A']));
        assert!(row.get_string(0).is_err());
        assert_eq!(row.get_value(1).unwrap(), Value::from("ok"));
    }

    #[test]
    fn test_boolean_text_matches_binding_spellings() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut stmt = Connection::prepare(&conn, "SELECT 'yes', 't', 'No', 'maybe'").unwrap();
        let mut cursor = Statement::query(&mut stmt).unwrap();
        let row = cursor.next_row().unwrap().expect("row exists");

        assert!(row.get_bool(0).unwrap());
        assert!(row.get_bool(1).unwrap());
        assert!(!row.get_bool(2).unwrap());
        assert!(row.get_bool(3).is_err());
        assert_eq!(
            Value::from("yes").coerce(crate::core::db::SqlType::Boolean, 1).unwrap(),
            Value::Bool(row.get_bool(0).unwrap())
        );
    }

    #[test]
    fn test_bound_values_round_trip_through_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let ts = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 600)
            .unwrap();
        let stored: String = conn
            .query_row("SELECT ?", [&Value::Timestamp(ts)], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "2020-01-02 03:04:05.600");
    }

    #[test]
    fn test_commit_without_transaction_fails() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        assert!(Connection::commit(&conn).is_err());

        conn.execute_batch("BEGIN").unwrap();
        Connection::rollback(&conn).unwrap();
    }
}
