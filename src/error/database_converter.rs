use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::error::AppError;

/// Converts Diesel database errors into structured [`AppError`] variants.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Maps a Diesel error to the matching `AppError`.
    ///
    /// `operation` names the database operation for the error context
    /// (e.g. "create job").
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AppError::Duplicate {
                    entity: info.table_name().unwrap_or("resource").to_string(),
                    field: info.column_name().unwrap_or("id").to_string(),
                    value: info.details().unwrap_or(info.message()).to_string(),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                AppError::Validation {
                    field: info.constraint_name().unwrap_or("row").to_string(),
                    reason: info.message().to_string(),
                }
            }
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_app_not_found() {
        let result = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "get job");
        assert!(matches!(result, AppError::NotFound { .. }));
    }

    #[test]
    fn rollback_maps_to_database_error() {
        let result = DatabaseErrorConverter::convert_diesel_error(
            DieselError::RollbackTransaction,
            "claim jobs",
        );
        match result {
            AppError::Database { operation, .. } => assert_eq!(operation, "claim jobs"),
            other => panic!("expected Database error, got {other:?}"),
        }
    }
}
