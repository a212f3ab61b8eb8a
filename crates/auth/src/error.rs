//! Authentication error taxonomy.
//!
//! Every failure a request can surface maps onto one of these variants, and
//! every variant maps onto an HTTP-class status via [`AuthError::status`].
//! The aggregated validation case is the only one that carries a per-field
//! error map; everything else is a single message.
//!
//! Classification happens by error kind, never by message text: the
//! validation pipeline inspects which variant it is holding to decide
//! between aggregating (422) and short-circuiting (401/403/404/500).

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use chirp_store::StoreError;

use crate::{codec::CodecError, messages};

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Authentication and authorization errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`: new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Aggregated recoverable validation failures, one message per field.
    #[error("{}", messages::VALIDATION_ERROR)]
    Validation {
        /// Field name to first failure message.
        errors: BTreeMap<String, String>,
    },

    /// Bearer header absent or structurally unusable.
    #[error("{}", messages::ACCESS_TOKEN_IS_REQUIRED)]
    AccessTokenRequired,

    /// A token failed signature, expiry, or kind checks. Carries the
    /// capitalized codec message shown to the client.
    #[error("{message}")]
    TokenRejected {
        /// Human-readable rejection reason.
        message: String,
    },

    /// Refresh token is signature-valid but absent from the token store.
    #[error("{}", messages::USED_REFRESH_TOKEN_OR_NOT_EXIST)]
    UsedOrNonexistentToken,

    /// Forgot-password token missing from the request.
    #[error("{}", messages::FORGOT_PASSWORD_TOKEN_IS_REQUIRED)]
    ForgotPasswordTokenRequired,

    /// Forgot-password token no longer matches the stored live value.
    #[error("{}", messages::FORGOT_PASSWORD_TOKEN_IS_INVALID)]
    ForgotPasswordTokenInvalid,

    /// Email-verify token no longer matches the stored live value.
    #[error("{}", messages::EMAIL_VERIFY_TOKEN_IS_INVALID)]
    EmailVerifyTokenInvalid,

    /// Supplied old password does not match the stored hash.
    #[error("{}", messages::OLD_PASSWORD_IS_INCORRECT)]
    OldPasswordIncorrect,

    /// Account exists but has not completed email verification.
    #[error("{}", messages::USER_NOT_VERIFIED)]
    UserNotVerified,

    /// No account matches the supplied id, email, or username.
    #[error("{}", messages::USER_NOT_FOUND)]
    UserNotFound,

    /// Supplied user id does not parse.
    #[error("{}", messages::INVALID_USER_ID)]
    InvalidUserId,

    /// Verification already happened; the flow is not repeatable.
    #[error("{}", messages::EMAIL_ALREADY_VERIFIED)]
    EmailAlreadyVerified,

    /// Persistence failure. Displayed generically; the source chain is for
    /// logs only.
    #[error("{}", messages::INTERNAL_SERVER_ERROR)]
    Store(#[source] StoreError),

    /// Any other internal failure.
    #[error("{}", messages::INTERNAL_SERVER_ERROR)]
    Internal {
        /// Description for logs. Not sent to clients.
        message: String,
    },
}

impl AuthError {
    /// Creates a single-field validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), message.into());
        Self::Validation { errors }
    }

    /// Creates an `Internal` error with the given log message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// HTTP-class status code for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            AuthError::Validation { .. } => 422,
            AuthError::AccessTokenRequired
            | AuthError::TokenRejected { .. }
            | AuthError::UsedOrNonexistentToken
            | AuthError::ForgotPasswordTokenRequired
            | AuthError::ForgotPasswordTokenInvalid
            | AuthError::EmailVerifyTokenInvalid
            | AuthError::OldPasswordIncorrect => 401,
            AuthError::UserNotVerified => 403,
            AuthError::UserNotFound | AuthError::InvalidUserId => 404,
            AuthError::EmailAlreadyVerified => 400,
            AuthError::Store(_) | AuthError::Internal { .. } => 500,
        }
    }

    /// Wire-facing body for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let errors = match self {
            AuthError::Validation { errors } => Some(errors.clone()),
            _ => None,
        };
        ErrorBody { message: self.to_string(), errors }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err)
    }
}

impl From<CodecError> for AuthError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Signing(message) => AuthError::Internal { message },
            other => AuthError::TokenRejected { message: capitalize(&other.to_string()) },
        }
    }
}

/// Response body shape shared by every error status.
///
/// `errors` is present only for the aggregated 422 case.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    /// Top-level message.
    pub message: String,
    /// Field name to first failure message, for 422 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

/// Uppercases the first character, the way token-library messages are
/// rendered to clients.
pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::validation("email", "bad").status(), 422);
        assert_eq!(AuthError::AccessTokenRequired.status(), 401);
        assert_eq!(AuthError::UserNotVerified.status(), 403);
        assert_eq!(AuthError::UserNotFound.status(), 404);
        assert_eq!(AuthError::internal("boom").status(), 500);
    }

    #[test]
    fn test_body_includes_field_map_only_for_validation() {
        let err = AuthError::validation("password", messages::PASSWORD_MUST_BE_STRONG);
        let body = err.body();
        assert_eq!(body.message, messages::VALIDATION_ERROR);
        assert_eq!(
            body.errors.unwrap().get("password").map(String::as_str),
            Some(messages::PASSWORD_MUST_BE_STRONG)
        );

        let body = AuthError::UserNotFound.body();
        assert_eq!(body.message, messages::USER_NOT_FOUND);
        assert!(body.errors.is_none());

        let json = serde_json::to_value(AuthError::UserNotFound.body()).unwrap();
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_store_errors_never_leak_detail() {
        let err = AuthError::from(StoreError::connection("db 10.0.0.3 unreachable"));
        assert_eq!(err.to_string(), messages::INTERNAL_SERVER_ERROR);
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_codec_errors_become_capitalized_401s() {
        let err = AuthError::from(CodecError::Expired);
        assert_eq!(err.status(), 401);
        assert_eq!(err.to_string(), "Token has expired");

        let err = AuthError::from(CodecError::InvalidSignature);
        assert_eq!(err.to_string(), "Invalid token signature");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("jwt expired"), "Jwt expired");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("X"), "X");
    }
}
