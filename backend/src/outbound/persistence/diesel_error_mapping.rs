//! Shared Diesel error mapping for the user and picture adapters.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use crate::domain::UniqueField;

use super::pool::PoolError;

/// Map pool errors into a port's connection error constructor.
pub(super) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    connection(error.into_message())
}

/// Map Diesel failures into a port's query and connection constructors.
///
/// Closed connections are connection errors so the retry loop treats them as
/// transient. Everything else is a query error.
pub(super) fn map_diesel_error<E>(
    error: DieselError,
    query: impl FnOnce(&'static str) -> E,
    connection: impl FnOnce(&'static str) -> E,
) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        _ => query("database error"),
    }
}

/// Identify which `users` unique constraint rejected an insert.
///
/// Returns `None` for anything other than a unique violation on one of the
/// three identity columns.
pub(super) fn unique_violation_field(error: &DieselError) -> Option<UniqueField> {
    let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = error else {
        return None;
    };
    let field = info
        .constraint_name()
        .and_then(field_for_constraint)
        .or_else(|| field_for_constraint(info.message()));
    if field.is_none() {
        warn!(
            message = info.message(),
            constraint_name = ?info.constraint_name(),
            "unrecognised unique violation on users"
        );
    }
    field
}

fn field_for_constraint(name: &str) -> Option<UniqueField> {
    if name.contains("users_email_key") {
        Some(UniqueField::Email)
    } else if name.contains("users_phone_key") {
        Some(UniqueField::Phone)
    } else if name.contains("users_first_name_key") {
        Some(UniqueField::FirstName)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::DatabaseErrorInformation;
    use rstest::rstest;

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
            Some("users")
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

    fn database_error(
        kind: DatabaseErrorKind,
        message: &'static str,
        constraint: Option<&'static str>,
    ) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info { message, constraint }))
    }

    #[rstest]
    #[case(Some("users_email_key"), "", Some(UniqueField::Email))]
    #[case(Some("users_phone_key"), "", Some(UniqueField::Phone))]
    #[case(Some("users_first_name_key"), "", Some(UniqueField::FirstName))]
    #[case(
        None,
        "duplicate key value violates unique constraint \"users_phone_key\"",
        Some(UniqueField::Phone)
    )]
    #[case(Some("users_pkey"), "", None)]
    fn unique_violations_name_the_field(
        #[case] constraint: Option<&'static str>,
        #[case] message: &'static str,
        #[case] expected: Option<UniqueField>,
    ) {
        let error = database_error(DatabaseErrorKind::UniqueViolation, message, constraint);
        assert_eq!(unique_violation_field(&error), expected);
    }

    #[rstest]
    fn other_errors_are_not_duplicates() {
        let error = database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "fk",
            Some("users_email_key"),
        );
        assert_eq!(unique_violation_field(&error), None);
        assert_eq!(unique_violation_field(&DieselError::NotFound), None);
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(&'static str),
        Connection(&'static str),
    }

    #[rstest]
    #[case(DieselError::NotFound, Mapped::Query("record not found"))]
    #[case(
        database_error(DatabaseErrorKind::ClosedConnection, "gone", None),
        Mapped::Connection("database connection error")
    )]
    #[case(
        database_error(DatabaseErrorKind::CheckViolation, "check", None),
        Mapped::Query("database error")
    )]
    fn diesel_errors_map_to_query_or_connection(
        #[case] error: DieselError,
        #[case] expected: Mapped,
    ) {
        assert_eq!(
            map_diesel_error(error, Mapped::Query, Mapped::Connection),
            expected
        );
    }

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let mapped = map_pool_error(PoolError::checkout("refused"), |message| message);
        assert_eq!(mapped, "refused");
    }
}
