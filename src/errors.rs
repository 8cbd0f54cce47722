//! Unified error type for the travel desk.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants are
//! grouped by [`ErrorCategory`] so that callers presenting notifications can
//! tell a validation problem apart from a rejected save or a store outage.

use crate::core::record::BookingKind;
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or was malformed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// The underlying store rejected a read or write
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A required field was missing or blank on create
    #[error("{field} is required")]
    MissingField {
        /// Storage key of the field
        field: &'static str,
    },

    /// A form value could not be parsed into the field's type
    #[error("Invalid value {value:?} for {field}")]
    InvalidField {
        /// Storage key of the field
        field: String,
        /// Raw text that was entered
        value: String,
    },

    /// The field name is not part of the record's schema
    #[error("Unknown field: {field}")]
    UnknownField {
        /// Field name as given
        field: String,
    },

    /// The field exists but cannot be edited (identity, owner, derived)
    #[error("Field {field} is read-only")]
    ReadOnlyField {
        /// Storage key of the field
        field: String,
    },

    /// A date window was selected that the page does not offer
    #[error("Date window {window} is not available on this page")]
    UnsupportedWindow {
        /// Window name
        window: String,
    },

    /// The record does not exist in the store
    #[error("{kind} booking {id} not found")]
    RecordNotFound {
        /// Collection the lookup ran against
        kind: BookingKind,
        /// Record identifier
        id: i64,
    },

    /// The acting staff member does not own the record
    #[error("{actor} is not allowed to modify {kind} booking {id}")]
    NotOwner {
        /// Collection of the record
        kind: BookingKind,
        /// Record identifier
        id: i64,
        /// Identity of the actor attempting the write
        actor: String,
    },

    /// A save for this record is already in flight
    #[error("A save for booking {id} is already in progress")]
    SaveInProgress {
        /// Record identifier
        id: i64,
    },

    /// An editor operation was requested while no draft exists
    #[error("No booking is being edited")]
    NotEditing,

    /// The live subscription failed or was closed
    #[error("Subscription error: {message}")]
    Subscription {
        /// Description of the failure
        message: String,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// JSON encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of failures as presented to staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing input; nothing reached the store
    Validation,
    /// The actor may not perform the operation
    Authorization,
    /// The store, filesystem or environment failed
    Transport,
}

impl Error {
    /// Returns the category this error is reported under.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingField { .. }
            | Self::InvalidField { .. }
            | Self::UnknownField { .. }
            | Self::ReadOnlyField { .. }
            | Self::UnsupportedWindow { .. }
            | Self::NotEditing
            | Self::SaveInProgress { .. } => ErrorCategory::Validation,
            Self::NotOwner { .. } => ErrorCategory::Authorization,
            Self::Config { .. }
            | Self::Database(_)
            | Self::RecordNotFound { .. }
            | Self::Subscription { .. }
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Serialization(_) => ErrorCategory::Transport,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_owner_is_authorization() {
        let err = Error::NotOwner {
            kind: BookingKind::Visa,
            id: 7,
            actor: "staff-2".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Authorization);
        assert_eq!(
            err.to_string(),
            "staff-2 is not allowed to modify visa booking 7"
        );
    }

    #[test]
    fn test_missing_field_is_validation() {
        let err = Error::MissingField { field: "passport" };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.to_string(), "passport is required");
    }

    #[test]
    fn test_database_error_is_transport() {
        let err = Error::from(sea_orm::DbErr::Custom("connection reset".to_string()));
        assert_eq!(err.category(), ErrorCategory::Transport);
    }
}
