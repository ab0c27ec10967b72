//! Database-specific error types and conversions.

use subtrack_core::error::SubtrackError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// A stored row could not be turned back into a domain value.
    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A unique index rejected the write.
    #[error("Duplicate {entity}")]
    Duplicate { entity: String },
}

impl DbError {
    /// Classify a failed statement. SurrealDB reports unique index
    /// violations as "Database index `...` already contains ...".
    pub(crate) fn from_statement(err: impl ToString, entity: &str) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for SubtrackError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SubtrackError::NotFound { entity, id },
            DbError::Duplicate { entity } => SubtrackError::AlreadyExists { entity },
            other => SubtrackError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_already_exists() {
        let err = DbError::from_statement(
            "Database index `idx_user_email` already contains 'a@b.c', with record `user:x`",
            "user",
        );
        assert!(matches!(
            SubtrackError::from(err),
            SubtrackError::AlreadyExists { entity } if entity == "user"
        ));
    }

    #[test]
    fn other_failures_are_database_errors() {
        let err = DbError::from_statement("Found 'x' for field `amount`", "subscription");
        assert!(matches!(SubtrackError::from(err), SubtrackError::Database(_)));

        let err = DbError::NotFound {
            entity: "subscription".into(),
            id: "42".into(),
        };
        assert!(matches!(SubtrackError::from(err), SubtrackError::NotFound { .. }));
    }
}
