/// Query Execution Module
///
/// Binds arguments into prepared statements, runs reads and writes, and
/// decodes result rows according to a declared list of column types. Every
/// failure is translated into the caller's error kind; statements and
/// cursors are closed on every path once opened.
use crate::config::Config;
use crate::core::db::driver::{Connection, Cursor, RowAccess, Statement};
use crate::core::db::types::{ColumnType, SqlType, Value};
use crate::core::error::{AccessError, DescriptorError, DriverError, DriverResult};
use crate::core::translate::{translate, translate_with_cause, ErrorFactory};
use tracing::{debug, warn};

/// One decoded result row, positionally aligned with the column types.
pub type Row = Vec<Value>;

/// A bound argument and the type it is bound as.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub value: Value,
    pub sql_type: SqlType,
}

/// Query text with its ordered, typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: String,
    params: Vec<Param>,
}

impl Query {
    /// Creates a query without arguments.
    pub fn new(sql: impl Into<String>) -> Self {
        Query {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Appends an argument bound as `sql_type`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlbridge::core::db::{Query, SqlType};
    ///
    /// let query = Query::new("SELECT name FROM users WHERE id = ? AND active = ?")
    ///     .arg(SqlType::BigInt, 7_i64)
    ///     .arg(SqlType::Boolean, true);
    /// assert_eq!(query.len(), 2);
    /// ```
    pub fn arg(mut self, sql_type: SqlType, value: impl Into<Value>) -> Self {
        self.params.push(Param {
            value: value.into(),
            sql_type,
        });
        self
    }

    /// Builds a query from parallel argument and type lists, which must have
    /// the same length.
    pub fn with_arguments(
        sql: impl Into<String>,
        arguments: Vec<Value>,
        types: Vec<SqlType>,
    ) -> Result<Self, DescriptorError> {
        if arguments.len() != types.len() {
            return Err(DescriptorError {
                arguments: arguments.len(),
                types: types.len(),
            });
        }
        let params = arguments
            .into_iter()
            .zip(types)
            .map(|(value, sql_type)| Param { value, sql_type })
            .collect();
        Ok(Query {
            sql: sql.into(),
            params,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Renders the arguments as `[a, b, c]`.
    pub fn describe_arguments(&self) -> String {
        let values: Vec<String> = self.params.iter().map(|p| p.value.to_string()).collect();
        format!("[{}]", values.join(", "))
    }

    fn failure_message(&self) -> String {
        format!(
            "Error occurred while executing query [{}] using the query arguments {}.",
            self.sql,
            self.describe_arguments()
        )
    }
}

/// Why a read or write did not complete, before translation.
enum Failure {
    Driver(DriverError),
    Contract(String),
}

impl From<DriverError> for Failure {
    fn from(err: DriverError) -> Self {
        Failure::Driver(err)
    }
}

/// Query execution service that operates on a caller-owned connection
pub struct QueryExecutor<'a, C> {
    connection: &'a C,
    log_arguments: bool,
}

impl<'a, C: Connection> QueryExecutor<'a, C> {
    /// Creates a new QueryExecutor for the given connection
    pub fn new(connection: &'a C) -> Self {
        QueryExecutor {
            connection,
            log_arguments: false,
        }
    }

    /// Creates a QueryExecutor using the logging options from `config`
    pub fn with_config(connection: &'a C, config: &Config) -> Self {
        Self::new(connection).log_arguments(config.log_arguments())
    }

    /// Whether bound argument values are included in debug logs
    pub fn log_arguments(mut self, enabled: bool) -> Self {
        self.log_arguments = enabled;
        self
    }

    /// Executes a read and decodes every row by `columns`.
    ///
    /// # Errors
    ///
    /// Fails if the statement cannot be prepared, bound or executed, if a
    /// value cannot be read as its declared column type, or if the number of
    /// declared column types differs from the number of result columns. All
    /// failures are built by `factory`.
    pub fn query<F: ErrorFactory>(
        &self,
        query: &Query,
        columns: &[ColumnType],
        factory: &F,
    ) -> Result<Vec<Row>, AccessError<F::Error>> {
        self.trace("Executing query", query);

        let mut statement = self
            .connection
            .prepare(query.sql())
            .map_err(|e| translate_with_cause(factory, query.failure_message(), e))?;
        let outcome = read_rows(&mut statement, query, columns);
        release("statement", statement.close());

        match outcome {
            Ok(rows) => {
                debug!(rows = rows.len(), "Query completed");
                Ok(rows)
            }
            Err(Failure::Driver(err)) => {
                Err(translate_with_cause(factory, query.failure_message(), err))
            }
            Err(Failure::Contract(message)) => Err(translate(factory, message)),
        }
    }

    /// Executes a mutation and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Fails if the statement cannot be prepared, bound or executed. A
    /// factory that cannot build the caller's error yields
    /// `AccessError::Untranslated`; no row count is ever returned for a
    /// failed statement.
    pub fn update<F: ErrorFactory>(
        &self,
        query: &Query,
        factory: &F,
    ) -> Result<u64, AccessError<F::Error>> {
        self.trace("Executing update", query);

        let mut statement = self
            .connection
            .prepare(query.sql())
            .map_err(|e| translate_with_cause(factory, query.failure_message(), e))?;
        let outcome = write(&mut statement, query);
        release("statement", statement.close());

        let affected =
            outcome.map_err(|e| translate_with_cause(factory, query.failure_message(), e))?;
        debug!(affected, "Update completed");
        Ok(affected)
    }

    fn trace(&self, what: &str, query: &Query) {
        if self.log_arguments {
            debug!(sql = %query.sql(), arguments = %query.describe_arguments(), "{what}");
        } else {
            debug!(sql = %query.sql(), arguments = query.len(), "{what}");
        }
    }
}

/// Convenience function to run a read on a connection
pub fn execute_query<C, F>(
    connection: &C,
    query: &Query,
    columns: &[ColumnType],
    factory: &F,
) -> Result<Vec<Row>, AccessError<F::Error>>
where
    C: Connection,
    F: ErrorFactory,
{
    QueryExecutor::new(connection).query(query, columns, factory)
}

/// Convenience function to run a mutation on a connection
pub fn execute_update<C, F>(
    connection: &C,
    query: &Query,
    factory: &F,
) -> Result<u64, AccessError<F::Error>>
where
    C: Connection,
    F: ErrorFactory,
{
    QueryExecutor::new(connection).update(query, factory)
}

fn bind_all<S: Statement>(statement: &mut S, query: &Query) -> DriverResult<()> {
    for (offset, param) in query.params().iter().enumerate() {
        let position = offset + 1;
        let value = param.value.coerce(param.sql_type, position)?;
        statement.bind(position, &value)?;
    }
    Ok(())
}

fn write<S: Statement>(statement: &mut S, query: &Query) -> DriverResult<u64> {
    bind_all(statement, query)?;
    statement.execute()
}

fn read_rows<S: Statement>(
    statement: &mut S,
    query: &Query,
    columns: &[ColumnType],
) -> Result<Vec<Row>, Failure> {
    bind_all(statement, query)?;
    let mut cursor = statement.query()?;
    let outcome = decode_rows(&mut cursor, columns);
    release("cursor", cursor.close());
    outcome
}

fn decode_rows<K: Cursor>(cursor: &mut K, columns: &[ColumnType]) -> Result<Vec<Row>, Failure> {
    let column_count = cursor.column_count();
    if columns.len() != column_count {
        return Err(Failure::Contract(format!(
            "The column types length [{}] does not match the result set column count [{}].",
            columns.len(),
            column_count
        )));
    }

    let mut rows = Vec::new();
    while let Some(row) = cursor.next_row()? {
        let decoded = columns
            .iter()
            .enumerate()
            .map(|(index, column)| decode_cell(row, index, *column))
            .collect::<DriverResult<Row>>()?;
        rows.push(decoded);
    }
    Ok(rows)
}

fn decode_cell<R: RowAccess + ?Sized>(
    row: &R,
    index: usize,
    column: ColumnType,
) -> DriverResult<Value> {
    let value = match column {
        ColumnType::Temporal => row
            .get_timestamp(index)?
            .map_or(Value::Null, |ts| Value::Date(ts.date())),
        ColumnType::Double => Value::Double(row.get_f64(index)?),
        ColumnType::Float => Value::Float(row.get_f32(index)?),
        ColumnType::Int64 => Value::BigInt(row.get_i64(index)?),
        ColumnType::Int32 => Value::Int(row.get_i32(index)?),
        ColumnType::Text => row.get_string(index)?.map_or(Value::Null, Value::Text),
        ColumnType::Boolean => Value::Bool(row.get_bool(index)?),
        ColumnType::Any => row.get_value(index)?,
    };
    Ok(value)
}

/// Close failures are logged and never replace the outcome of the call.
fn release(resource: &'static str, result: DriverResult<()>) {
    if let Err(err) = result {
        warn!(resource, error = %err, "Failed to release resource");
    }
}
