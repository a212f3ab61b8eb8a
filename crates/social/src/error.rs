//! Content layer errors.

use std::collections::BTreeMap;

use thiserror::Error;

use chirp_auth::{AuthError, ErrorBody};
use chirp_store::StoreError;

use crate::messages;

/// Result type alias for content operations.
pub type Result<T> = std::result::Result<T, SocialError>;

/// Errors surfaced by the content layer.
///
/// Authorization failures delegate to [`AuthError`] so the status mapping
/// stays in one place; the variants here cover what is specific to content.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SocialError {
    /// Aggregated draft validation failures, one message per field.
    #[error("{}", messages::VALIDATION_ERROR)]
    Validation {
        /// Field name to first failure message.
        errors: BTreeMap<String, String>,
    },

    /// No tweet matches the supplied id, or its author is gone or banned.
    #[error("{}", messages::TWEET_NOT_FOUND)]
    TweetNotFound,

    /// Supplied tweet id does not parse.
    #[error("{}", messages::INVALID_TWEET_ID)]
    InvalidTweetId,

    /// The viewer is neither the author nor in the author's circle.
    #[error("{}", messages::TWEET_IS_NOT_PUBLIC)]
    AudienceRestricted,

    /// An authentication or authorization failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Persistence failure. Displayed generically.
    #[error("{}", messages::INTERNAL_SERVER_ERROR)]
    Store(#[source] StoreError),
}

impl SocialError {
    /// HTTP-class status code for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            SocialError::Validation { .. } => 422,
            SocialError::TweetNotFound | SocialError::InvalidTweetId => 404,
            SocialError::AudienceRestricted => 403,
            SocialError::Auth(err) => err.status(),
            SocialError::Store(_) => 500,
        }
    }

    /// Wire-facing body for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        match self {
            SocialError::Validation { errors } => {
                ErrorBody { message: self.to_string(), errors: Some(errors.clone()) }
            },
            SocialError::Auth(err) => err.body(),
            other => ErrorBody { message: other.to_string(), errors: None },
        }
    }
}

impl From<StoreError> for SocialError {
    fn from(err: StoreError) -> Self {
        SocialError::Store(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(SocialError::TweetNotFound.status(), 404);
        assert_eq!(SocialError::AudienceRestricted.status(), 403);
        assert_eq!(SocialError::Auth(AuthError::AccessTokenRequired).status(), 401);
        assert_eq!(SocialError::from(StoreError::connection("down")).status(), 500);
    }

    #[test]
    fn test_auth_body_passthrough() {
        let body = SocialError::Auth(AuthError::AccessTokenRequired).body();
        assert_eq!(body.message, "Access token is required");
        assert!(body.errors.is_none());
    }
}
