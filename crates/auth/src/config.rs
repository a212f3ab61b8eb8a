//! Deployment configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default access token lifetime (15 minutes).
const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Default refresh token lifetime (100 days).
const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(100 * 24 * 60 * 60);

/// Default one-time token lifetime (7 days), shared by the email-verify and
/// forgot-password flows.
const DEFAULT_ONE_TIME_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration for the authentication core.
///
/// Expiry horizons are deployment configuration, never hardcoded at call
/// sites: access tokens are short-lived, everything else longer-lived.
///
/// # Example
///
/// ```
/// use chirp_auth::AuthConfig;
///
/// let config: chirp_auth::AuthConfig = serde_json::from_str(
///     r#"{ "secret": "change-me", "access_token_ttl": "15m" }"#,
/// ).unwrap();
/// assert_eq!(config.access_token_ttl.as_secs(), 900);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HS256 signing secret shared by all token kinds.
    pub secret: String,

    /// Access token lifetime.
    #[serde(with = "humantime_serde", default = "default_access_token_ttl")]
    pub access_token_ttl: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde", default = "default_refresh_token_ttl")]
    pub refresh_token_ttl: Duration,

    /// Email-verify token lifetime.
    #[serde(with = "humantime_serde", default = "default_one_time_token_ttl")]
    pub email_verify_token_ttl: Duration,

    /// Forgot-password token lifetime.
    #[serde(with = "humantime_serde", default = "default_one_time_token_ttl")]
    pub forgot_password_token_ttl: Duration,

    /// Base URL the verification and reset links in outbound email point at.
    #[serde(default = "default_client_url")]
    pub client_url: String,

    /// Sender address for outbound email.
    #[serde(default = "default_email_from")]
    pub email_from: String,
}

fn default_access_token_ttl() -> Duration {
    DEFAULT_ACCESS_TOKEN_TTL
}

fn default_refresh_token_ttl() -> Duration {
    DEFAULT_REFRESH_TOKEN_TTL
}

fn default_one_time_token_ttl() -> Duration {
    DEFAULT_ONE_TIME_TOKEN_TTL
}

fn default_client_url() -> String {
    "http://localhost:3000".to_owned()
}

fn default_email_from() -> String {
    "no-reply@chirp.example".to_owned()
}

impl AuthConfig {
    /// Builds a config with the given secret and default lifetimes.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            email_verify_token_ttl: DEFAULT_ONE_TIME_TOKEN_TTL,
            forgot_password_token_ttl: DEFAULT_ONE_TIME_TOKEN_TTL,
            client_url: default_client_url(),
            email_from: default_email_from(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new("s");
        assert_eq!(config.access_token_ttl, DEFAULT_ACCESS_TOKEN_TTL);
        assert_eq!(config.refresh_token_ttl, DEFAULT_REFRESH_TOKEN_TTL);
    }

    #[test]
    fn test_deserialize_with_humantime_durations() {
        let config: AuthConfig = serde_json::from_str(
            r#"{ "secret": "s", "access_token_ttl": "30m", "refresh_token_ttl": "30days" }"#,
        )
        .unwrap();

        assert_eq!(config.access_token_ttl.as_secs(), 30 * 60);
        assert_eq!(config.refresh_token_ttl.as_secs(), 30 * 24 * 60 * 60);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.email_verify_token_ttl, DEFAULT_ONE_TIME_TOKEN_TTL);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<AuthConfig, _> =
            serde_json::from_str(r#"{ "secret": "s", "tken_ttl": "1m" }"#);
        assert!(result.is_err());
    }
}
