//! # Database Error Types
//!
//! Error taxonomy for the storage layer.
//!
//! ## Outcome or Fault?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Anticipated outcomes (callers branch on these)                         │
//! │    NotFound        workflow/organization id no longer exists           │
//! │    TenantMismatch  workflow belongs to a different organization        │
//! │    WorkflowInUse   delete refused while an active pointer remains      │
//! │                                                                         │
//! │  Persistence faults (logged, surfaced as a generic retry-later         │
//! │  message, never retried automatically: workflow mutations are not      │
//! │  idempotent, a re-run create would duplicate the workflow)             │
//! │    UniqueViolation / ForeignKeyViolation / ConnectionFailed /          │
//! │    MigrationFailed / QueryFailed / TransactionFailed /                 │
//! │    PoolExhausted / Internal                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Storage-layer errors for workflow and organization operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// The referenced record does not exist.
    ///
    /// Returned by mutations against a missing id; reads report absence as
    /// `Ok(None)` instead.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE constraint fired.
    ///
    /// For workflow writes this means duplicate step numbers reached the
    /// database, which validation normally prevents; the schema's
    /// `UNIQUE (workflow_id, step_number)` is the backstop.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A FOREIGN KEY constraint fired, e.g. creating a workflow under an
    /// organization id that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Cross-tenant reference: the workflow exists but belongs to another
    /// organization. Shown to users as a generic authorization failure.
    #[error("workflow {workflow_id} does not belong to organization {organization_id}")]
    TenantMismatch {
        workflow_id: String,
        organization_id: String,
    },

    /// The workflow is still some organization's active workflow; the
    /// pointer must be cleared before it can be deleted.
    #[error("workflow {id} is currently active and cannot be deleted")]
    WorkflowInUse { id: String },

    /// The pool could not be opened or a connection was lost.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A migration failed to apply (bad SQL, checksum mismatch).
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A statement failed for a reason other than the constraints above.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN or COMMIT failed; the transaction rolled back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every pooled connection was busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Anything sqlx reports that has no mapping above.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Shorthand for [`DbError::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Classifies a SQLite constraint message.
///
/// SQLite reports constraints as text:
///   `UNIQUE constraint failed: workflow_steps.workflow_id, workflow_steps.step_number`
///   `FOREIGN KEY constraint failed`
fn classify_database_error(message: &str) -> DbError {
    if let Some(columns) = message.strip_prefix("UNIQUE constraint failed: ") {
        DbError::UniqueViolation {
            field: columns.to_string(),
            value: "unknown".to_string(),
        }
    } else if message.contains("FOREIGN KEY constraint failed") {
        DbError::ForeignKeyViolation {
            message: message.to_string(),
        }
    } else {
        DbError::QueryFailed(message.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => classify_database_error(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unique_violation() {
        let err = classify_database_error(
            "UNIQUE constraint failed: workflow_steps.workflow_id, workflow_steps.step_number",
        );
        match err {
            DbError::UniqueViolation { field, .. } => {
                assert!(field.contains("step_number"));
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_foreign_key_violation() {
        assert!(matches!(
            classify_database_error("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
    }

    #[test]
    fn test_classify_other_database_error() {
        assert!(matches!(
            classify_database_error("no such table: approval_workflows"),
            DbError::QueryFailed(_)
        ));
    }
}
