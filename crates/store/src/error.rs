//! Store error types and result alias.
//!
//! Every collection trait in this crate returns [`StoreResult`]. Backends map
//! their internal failures onto these variants so callers can classify
//! outcomes without knowing which backend is in play.

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`: new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The requested record was not found.
    #[error("Record not found: {key}")]
    NotFound {
        /// Identifier of the record that was not found.
        key: String,
    },

    /// An identity with this email already exists.
    ///
    /// Email uniqueness is enforced by the store itself, inside the same
    /// critical section as the insert, so two concurrent registrations for
    /// the same address cannot both succeed.
    #[error("Email already in use: {email}")]
    EmailTaken {
        /// The conflicting email address.
        email: String,
    },

    /// Another identity already holds this username.
    #[error("Username already in use: {username}")]
    UsernameTaken {
        /// The conflicting username.
        username: String,
    },

    /// A client-supplied id could not be parsed.
    #[error("Invalid id: {value}")]
    InvalidId {
        /// The raw value that failed to parse.
        value: String,
    },

    /// The requested state change is not allowed for this record.
    ///
    /// Raised for transitions the data model forbids, such as verifying a
    /// banned identity.
    #[error("Invalid transition: {message}")]
    InvalidTransition {
        /// Description of the rejected transition.
        message: String,
    },

    /// Connection or availability error from the backing database.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Catch-all for backend failures that fit no other category.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error for the given record key.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a new `EmailTaken` error.
    #[must_use]
    pub fn email_taken(email: impl Into<String>) -> Self {
        Self::EmailTaken { email: email.into() }
    }

    /// Creates a new `UsernameTaken` error.
    #[must_use]
    pub fn username_taken(username: impl Into<String>) -> Self {
        Self::UsernameTaken { username: username.into() }
    }

    /// Creates a new `InvalidId` error for the given raw value.
    #[must_use]
    pub fn invalid_id(value: impl Into<String>) -> Self {
        Self::InvalidId { value: value.into() }
    }

    /// Creates a new `InvalidTransition` error.
    #[must_use]
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition { message: message.into() }
    }

    /// Creates a new `Connection` error with the given message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with a message and source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }
}
