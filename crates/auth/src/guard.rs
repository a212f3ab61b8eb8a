//! Authorization gates.
//!
//! Gates consume decoded claims to admit or reject a request before the
//! handler runs. They sit between the validation pipeline and the handler:
//! the bearer gate produces claims, the verified-only gate inspects them,
//! and the optional wrapper lets guest traffic through untouched.

use chirp_store::{RefreshTokenStore, VerifyStatus};

use crate::{
    claims::{TokenClaims, TokenKind},
    codec::TokenCodec,
    error::AuthError,
};

/// Extracts and verifies the bearer access token from an `Authorization`
/// header value.
///
/// # Errors
///
/// - [`AuthError::AccessTokenRequired`] when the header is absent, blank, or not `Bearer <token>`
/// - [`AuthError::TokenRejected`] for signature/expiry/kind failures, carrying the capitalized
///   codec message
pub fn bearer_claims(
    codec: &TokenCodec,
    authorization: Option<&str>,
) -> Result<TokenClaims, AuthError> {
    let header = authorization
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::AccessTokenRequired)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::AccessTokenRequired)?;

    Ok(codec.verify_kind(token, TokenKind::Access)?)
}

/// Verifies a refresh token's signature and its liveness in the token store
/// concurrently.
///
/// A store miss wins over any signature outcome: codec validity is
/// necessary but not sufficient, and a rotated-away token must read as
/// consumed rather than as whatever the codec happens to say about it.
///
/// # Errors
///
/// - [`AuthError::UsedOrNonexistentToken`] when no store record exists
/// - [`AuthError::TokenRejected`] for signature/expiry/kind failures
/// - [`AuthError::Store`] when the liveness lookup itself fails
pub async fn refresh_claims(
    codec: &TokenCodec,
    refresh_tokens: &dyn RefreshTokenStore,
    token: &str,
) -> Result<TokenClaims, AuthError> {
    let (live, decoded) = tokio::join!(
        refresh_tokens.exists(token),
        std::future::ready(codec.verify_kind(token, TokenKind::Refresh)),
    );

    if !live? {
        return Err(AuthError::UsedOrNonexistentToken);
    }
    Ok(decoded?)
}

/// Rejects claims that do not carry verified status.
///
/// # Errors
///
/// Returns [`AuthError::UserNotVerified`] unless the claims say `Verified`.
pub fn require_verified(claims: &TokenClaims) -> Result<(), AuthError> {
    if claims.verify != VerifyStatus::Verified {
        return Err(AuthError::UserNotVerified);
    }
    Ok(())
}

/// Runs the bearer gate only when an `Authorization` value is present.
///
/// Endpoints that behave differently for guests and authenticated users
/// (view counting, audience checks) use this: an absent header passes
/// through as anonymous, a present header must still verify.
///
/// # Errors
///
/// Same as [`bearer_claims`], but only when a header value is present.
pub fn optional_bearer(
    codec: &TokenCodec,
    authorization: Option<&str>,
) -> Result<Option<TokenClaims>, AuthError> {
    match authorization.map(str::trim).filter(|value| !value.is_empty()) {
        Some(header) => bearer_claims(codec, Some(header)).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chirp_store::{MemoryRefreshTokenStore, UserId};

    use super::*;
    use crate::config::AuthConfig;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::new("guard-test-secret"))
    }

    #[test]
    fn test_bearer_missing_header() {
        let codec = codec();

        assert!(matches!(bearer_claims(&codec, None), Err(AuthError::AccessTokenRequired)));
        assert!(matches!(bearer_claims(&codec, Some("")), Err(AuthError::AccessTokenRequired)));
        assert!(matches!(
            bearer_claims(&codec, Some("Bearer ")),
            Err(AuthError::AccessTokenRequired)
        ));
        assert!(matches!(
            bearer_claims(&codec, Some("Basic abc")),
            Err(AuthError::AccessTokenRequired)
        ));
    }

    #[test]
    fn test_bearer_accepts_access_token_only() {
        let codec = codec();
        let user = UserId::new();

        let access = codec.sign(TokenKind::Access, user, VerifyStatus::Verified).unwrap();
        let claims = bearer_claims(&codec, Some(&format!("Bearer {access}"))).unwrap();
        assert_eq!(claims.sub, user);

        let refresh = codec.sign(TokenKind::Refresh, user, VerifyStatus::Verified).unwrap();
        let result = bearer_claims(&codec, Some(&format!("Bearer {refresh}")));
        assert!(matches!(result, Err(AuthError::TokenRejected { .. })));
    }

    #[tokio::test]
    async fn test_refresh_store_miss_wins() {
        let codec = codec();
        let store = MemoryRefreshTokenStore::new();
        let token =
            codec.sign(TokenKind::Refresh, UserId::new(), VerifyStatus::Verified).unwrap();

        // Signature-valid but never stored.
        let result = refresh_claims(&codec, &store, &token).await;

        assert!(matches!(result, Err(AuthError::UsedOrNonexistentToken)));
    }

    #[tokio::test]
    async fn test_refresh_live_token_decodes() {
        let codec = codec();
        let store = MemoryRefreshTokenStore::new();
        let user = UserId::new();
        let token = codec.sign(TokenKind::Refresh, user, VerifyStatus::Unverified).unwrap();
        store.put(user, &token).await.unwrap();

        let claims = refresh_claims(&codec, &store, &token).await.unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_require_verified() {
        let codec = codec();
        let token = codec.sign(TokenKind::Access, UserId::new(), VerifyStatus::Unverified).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert!(matches!(require_verified(&claims), Err(AuthError::UserNotVerified)));
    }

    #[test]
    fn test_optional_bearer_passes_anonymous_through() {
        let codec = codec();

        assert!(optional_bearer(&codec, None).unwrap().is_none());
        assert!(optional_bearer(&codec, Some("  ")).unwrap().is_none());

        // A present but bogus header must still fail.
        let result = optional_bearer(&codec, Some("Bearer bogus"));
        assert!(result.is_err());
    }
}
