//! Token signing and verification.
//!
//! The codec turns [`TokenClaims`] into compact, expiring, tamper-evident
//! strings and back. All four token kinds share one HS256 deployment secret;
//! what keeps them apart is the kind tag inside the signed payload, which
//! [`TokenCodec::verify_kind`] checks after signature verification.
//!
//! Failure kinds are deliberately distinct: an expired token and a tampered
//! token produce different variants because callers render different
//! user-facing messages for them.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;

use chirp_store::{UserId, VerifyStatus};

use crate::{
    claims::{TokenClaims, TokenKind},
    config::AuthConfig,
};

/// Errors produced while signing or verifying tokens.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// The token's expiry horizon has passed.
    #[error("token has expired")]
    Expired,

    /// The signature does not match the deployment secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token is structurally broken: wrong segment count, bad base64,
    /// claims that fail to parse.
    #[error("malformed token")]
    Malformed(String),

    /// The token verified but is of the wrong kind for this call site.
    #[error("unexpected token kind: expected {expected}, got {actual}")]
    WrongKind {
        /// Kind the call site requires.
        expected: TokenKind,
        /// Kind found inside the claims.
        actual: TokenKind,
    },

    /// Signing failed. Indicates a broken secret or claims that cannot be
    /// serialized, both deployment faults.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for CodecError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => CodecError::Expired,
            ErrorKind::InvalidSignature => CodecError::InvalidSignature,
            _ => CodecError::Malformed(err.to_string()),
        }
    }
}

/// Signs and verifies the system's credentials.
///
/// Cheap to clone; holds the derived keys and the per-kind expiry horizons
/// from [`AuthConfig`].
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: std::time::Duration,
    refresh_ttl: std::time::Duration,
    forgot_password_ttl: std::time::Duration,
    email_verify_ttl: std::time::Duration,
}

impl TokenCodec {
    /// Builds a codec from deployment configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Exact expiry semantics; the default 60s leeway would let a token
        // outlive its configured TTL.
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
            forgot_password_ttl: config.forgot_password_token_ttl,
            email_verify_ttl: config.email_verify_token_ttl,
        }
    }

    fn ttl_for(&self, kind: TokenKind) -> std::time::Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::ForgotPassword => self.forgot_password_ttl,
            TokenKind::EmailVerify => self.email_verify_ttl,
        }
    }

    /// Mints a token of the given kind for a subject.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Signing`] when the claims cannot be encoded.
    pub fn sign(
        &self,
        kind: TokenKind,
        sub: UserId,
        verify: VerifyStatus,
    ) -> Result<String, CodecError> {
        let claims = TokenClaims::new(sub, verify, kind, self.ttl_for(kind));
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| CodecError::Signing(e.to_string()))
    }

    /// Verifies signature and expiry and returns the decoded claims.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Expired`] when the expiry horizon has passed
    /// - [`CodecError::InvalidSignature`] when the signature does not match
    /// - [`CodecError::Malformed`] for anything structurally broken
    pub fn verify(&self, token: &str) -> Result<TokenClaims, CodecError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Verifies the token and additionally requires it to be of `expected`
    /// kind.
    ///
    /// # Errors
    ///
    /// All of [`verify`](Self::verify)'s errors, plus
    /// [`CodecError::WrongKind`] when the kind tag does not match.
    pub fn verify_kind(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> Result<TokenClaims, CodecError> {
        let claims = self.verify(token)?;
        if claims.kind != expected {
            return Err(CodecError::WrongKind { expected, actual: claims.kind });
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of debug output.
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
