//! Classification of driver errors returned by catalog queries.

/// SQLSTATE raised by Postgres when a unique constraint is violated.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

/// SQLSTATE raised by Postgres when a foreign key constraint is violated.
pub const FOREIGN_KEY_VIOLATION_CODE: &str = "23503";

/// Returns the SQLSTATE code carried by a database error, if any.
pub fn sql_state(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code.into_owned())
}

/// Returns `true` when the error is a unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    sql_state(err).as_deref() == Some(UNIQUE_VIOLATION_CODE)
}

/// Returns `true` when the error is a foreign key violation.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sql_state(err).as_deref() == Some(FOREIGN_KEY_VIOLATION_CODE)
}
