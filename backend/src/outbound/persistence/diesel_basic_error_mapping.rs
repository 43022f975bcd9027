//! Diesel and pool error translation shared by the scheduling repositories.
//!
//! Each repository passes its own port error constructors, so a closed
//! connection becomes `Connection` and everything else becomes `Query`.
//! Unique violations are inspected separately where a constraint doubles as
//! a domain guard.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;
use super::models::RowMappingError;

/// Map a pool failure onto a repository's connection constructor.
pub(crate) fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map a Diesel failure onto query or connection constructors.
///
/// `operation` names the port call in the log line and the error message.
pub(crate) fn map_basic_diesel_error<E, Q, C>(
    error: DieselError,
    operation: &'static str,
    query: Q,
    connection: C,
) -> E
where
    Q: FnOnce(String) -> E,
    C: FnOnce(String) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), operation, "diesel operation failed");
        }
        other => debug!(error = %other, operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection(format!("{operation}: connection closed"))
        }
        DieselError::DatabaseError(_, info) => query(format!("{operation}: {}", info.message())),
        other => query(format!("{operation}: {other}")),
    }
}

/// Map a row that failed to rehydrate onto a query constructor.
pub(crate) fn map_basic_row_error<E, Q>(error: RowMappingError, query: Q) -> E
where
    Q: FnOnce(String) -> E,
{
    debug!(%error, "stored row failed domain validation");
    query(error.to_string())
}

/// Constraint name of a unique violation, if `error` is one.
///
/// Falls back to the server message when the constraint is not reported.
pub(crate) fn unique_violation(error: &DieselError) -> Option<String> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => Some(
            info.constraint_name()
                .map_or_else(|| info.message().to_owned(), str::to_owned),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use diesel::result::DatabaseErrorInformation;
    use rstest::rstest;

    use super::*;

    #[derive(Debug)]
    struct Info {
        message: &'static str,
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            self.message
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(Info {
                message: "duplicate key value",
                constraint,
            }),
        )
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(String),
        Connection(String),
    }

    #[rstest]
    fn closed_connection_maps_to_connection() {
        let mapped = map_basic_diesel_error(
            database_error(DatabaseErrorKind::ClosedConnection, None),
            "find shift",
            Mapped::Query,
            Mapped::Connection,
        );

        assert_eq!(mapped, Mapped::Connection("find shift: connection closed".to_owned()));
    }

    #[rstest]
    fn other_failures_map_to_query_with_operation() {
        let mapped =
            map_basic_diesel_error(DieselError::NotFound, "find swap", Mapped::Query, Mapped::Connection);

        assert!(matches!(mapped, Mapped::Query(message) if message.starts_with("find swap: ")));
    }

    #[rstest]
    fn pool_failures_keep_their_message() {
        let mapped: Mapped = map_basic_pool_error(PoolError::checkout("timed out"), Mapped::Connection);

        assert_eq!(mapped, Mapped::Connection("timed out".to_owned()));
    }

    #[rstest]
    #[case(Some("shift_swap_locks_pkey"), Some("shift_swap_locks_pkey"))]
    #[case(None, Some("duplicate key value"))]
    fn unique_violation_reports_constraint(
        #[case] constraint: Option<&'static str>,
        #[case] expected: Option<&str>,
    ) {
        let error = database_error(DatabaseErrorKind::UniqueViolation, constraint);

        assert_eq!(unique_violation(&error).as_deref(), expected);
    }

    #[rstest]
    fn non_unique_errors_are_not_violations() {
        assert_eq!(unique_violation(&DieselError::NotFound), None);
    }
}
