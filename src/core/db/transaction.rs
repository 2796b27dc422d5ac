/// Transaction Module
///
/// Commits and rolls back the caller's current unit of work.
use crate::core::db::driver::Connection;
use crate::core::error::AccessError;
use crate::core::translate::{translate_with_cause, ErrorFactory};
use tracing::debug;

const COMMIT_FAILED: &str = "Error occurred when committing the transaction.";
const ROLLBACK_FAILED: &str = "Error occurred when rolling back the transaction.";

/// Commits the current transaction on `connection`.
///
/// # Errors
///
/// Driver failures are translated by `factory`, with the driver error as cause.
pub fn commit<C, F>(connection: &C, factory: &F) -> Result<(), AccessError<F::Error>>
where
    C: Connection,
    F: ErrorFactory,
{
    debug!("Committing transaction");
    connection
        .commit()
        .map_err(|e| translate_with_cause(factory, COMMIT_FAILED, e))
}

/// Rolls back the current transaction. Does nothing without a connection.
///
/// # Errors
///
/// Driver failures are translated by `factory`, with the driver error as cause.
pub fn rollback<C, F>(connection: Option<&C>, factory: &F) -> Result<(), AccessError<F::Error>>
where
    C: Connection,
    F: ErrorFactory,
{
    let Some(connection) = connection else {
        return Ok(());
    };

    debug!("Rolling back transaction");
    connection
        .rollback()
        .map_err(|e| translate_with_cause(factory, ROLLBACK_FAILED, e))
}
