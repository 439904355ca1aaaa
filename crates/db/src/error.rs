//! Mapping of database failures onto the ledger error taxonomy.

use sea_orm::{DbErr, RuntimeErr, SqlErr};
use tally_core::LedgerError;

/// SQLSTATE codes meaning "lost a race, try again": serialization failure,
/// deadlock and lock timeout on PostgreSQL, busy and locked on SQLite.
const RETRYABLE_CODES: [&str; 5] = ["40001", "40P01", "55P03", "5", "6"];

/// Converts a `DbErr` into a [`LedgerError`].
///
/// Unique violations and lock contention become
/// [`LedgerError::ConcurrencyConflict`]; everything else is a
/// [`LedgerError::Database`].
pub fn db_err(err: DbErr) -> LedgerError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return LedgerError::ConcurrencyConflict(err.to_string());
    }

    match sqlstate(&err) {
        Some(code) if RETRYABLE_CODES.contains(&code.as_str()) => {
            LedgerError::ConcurrencyConflict(err.to_string())
        }
        _ => LedgerError::Database(err.to_string()),
    }
}

fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(e) => e
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned()),
        RuntimeErr::Internal(_) => None,
    }
}
