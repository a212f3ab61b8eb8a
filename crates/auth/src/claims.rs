//! Signed token claims.
//!
//! Every credential this system mints carries the same claim shape: subject
//! id, verification status, token kind, and an issued-at/expiry window. The
//! kind is part of the signed payload and is checked at decode time, so a
//! token of one kind can never be redeemed where another kind is required,
//! even though all kinds share one signing secret.

use chirp_store::{UserId, VerifyStatus};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of credential kinds.
///
/// Serialized as an integer tag inside the signed claims.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TokenKind {
    /// Short-lived credential authorizing API calls.
    Access,
    /// Longer-lived credential exchanged for a new pair; revocable by
    /// deleting its store record.
    Refresh,
    /// One-time credential for the password reset flow.
    ForgotPassword,
    /// One-time credential for the email verification flow.
    EmailVerify,
}

impl From<TokenKind> for u8 {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Access => 0,
            TokenKind::Refresh => 1,
            TokenKind::ForgotPassword => 2,
            TokenKind::EmailVerify => 3,
        }
    }
}

impl TryFrom<u8> for TokenKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TokenKind::Access),
            1 => Ok(TokenKind::Refresh),
            2 => Ok(TokenKind::ForgotPassword),
            3 => Ok(TokenKind::EmailVerify),
            other => Err(format!("unknown token kind tag: {other}")),
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::ForgotPassword => "forgot-password",
            TokenKind::EmailVerify => "email-verify",
        };
        write!(f, "{name}")
    }
}

/// Decoded payload of a signed token.
///
/// Produced by the codec, attached to request context by the validation
/// pipeline and the gates, consumed by handlers. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identity id.
    pub sub: UserId,
    /// Verification status at signing time.
    pub verify: VerifyStatus,
    /// Which credential kind this token is.
    pub kind: TokenKind,
    /// Unique token id. Timestamps have second granularity, so without this
    /// two tokens minted back-to-back for the same subject would be
    /// byte-identical, and the raw token string is the token store's key.
    pub jti: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiration time (seconds since epoch).
    pub exp: i64,
}

impl TokenClaims {
    /// Builds claims expiring `ttl` from now.
    #[must_use]
    pub fn new(sub: UserId, verify: VerifyStatus, kind: TokenKind, ttl: std::time::Duration) -> Self {
        let now = Utc::now();
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(i64::MAX / 2));
        Self {
            sub,
            verify,
            kind,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Whether the expiry horizon has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}
