//! Declarative request validation.
//!
//! A [`Pipeline`] is schema-as-data: an ordered list of [`Field`] chains,
//! each chain an ordered list of [`Check`]s. Checks are either syntactic
//! (length, format, cross-field equality) or database-aware (credential
//! match, token liveness); the database-aware ones attach what they decoded
//! or fetched to the [`Validated`] output so handlers reuse it instead of
//! re-reading.
//!
//! # Execution semantics
//!
//! - Checks for one field run in declared order and stop at that field's first failure.
//! - Field chains are independent predicates and run concurrently; there is no ordering guarantee
//!   between fields.
//! - Failures are classified by kind, not by message or position. A recoverable violation lands in
//!   the per-field error map and the request fails 422 once every chain has reported. A halt (a
//!   tagged [`AuthError`]: bad bearer token, store outage, missing record) wins over aggregation
//!   and propagates as the terminal error.
//! - An `optional` field skips its chain when the input lacks the field but runs it in full when a
//!   value is present.

use std::collections::BTreeMap;

use chrono::DateTime;
use futures::future::join_all;

use chirp_store::{Identity, IdentityStore, RefreshTokenStore, UserId};

use crate::{
    claims::{TokenClaims, TokenKind},
    codec::TokenCodec,
    error::AuthError,
    guard, messages, password,
};

/// The validatable slice of one request: body/param fields plus the
/// `Authorization` header value.
#[derive(Clone, Debug, Default)]
pub struct RequestInput {
    fields: BTreeMap<String, String>,
    authorization: Option<String>,
}

impl RequestInput {
    /// Creates an empty input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body or path field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets the raw `Authorization` header value.
    #[must_use]
    pub fn authorization(mut self, header: impl Into<String>) -> Self {
        self.authorization = Some(header.into());
        self
    }

    /// Fetches a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The raw `Authorization` header value, when present.
    #[must_use]
    pub fn bearer_header(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}

/// Context attached by database-aware checks for downstream reuse.
#[derive(Clone, Debug, Default)]
pub struct Validated {
    /// Claims decoded from a live refresh token.
    pub refresh: Option<TokenClaims>,
    /// Claims decoded from an email-verify token.
    pub email_verify: Option<TokenClaims>,
    /// Claims decoded from a forgot-password token that matched the stored
    /// live value.
    pub forgot_password: Option<TokenClaims>,
    /// Identity record matched while validating (by credentials, email, or
    /// token subject).
    pub identity: Option<Identity>,
}

/// Shared collaborators the database-aware checks run against.
pub struct PipelineDeps<'a> {
    /// Token codec.
    pub codec: &'a TokenCodec,
    /// Identity collection.
    pub identities: &'a dyn IdentityStore,
    /// Refresh credential collection.
    pub refresh_tokens: &'a dyn RefreshTokenStore,
    /// Claims attached by an earlier bearer gate, for checks that need the
    /// calling subject (old-password verification).
    pub authorization: Option<&'a TokenClaims>,
}

/// Outcome of one check. Private to the executor.
enum RuleError {
    /// Recoverable; aggregated per field into a 422.
    Violation(String),
    /// Non-recoverable; short-circuits the request with this exact error.
    Halt(AuthError),
}

impl From<AuthError> for RuleError {
    fn from(err: AuthError) -> Self {
        RuleError::Halt(err)
    }
}

impl From<chirp_store::StoreError> for RuleError {
    fn from(err: chirp_store::StoreError) -> Self {
        RuleError::Halt(AuthError::from(err))
    }
}

/// Side effect produced by a check.
enum Attach {
    Refresh(TokenClaims),
    EmailVerify {
        claims: TokenClaims,
        identity: Identity,
    },
    ForgotPassword(TokenClaims),
    Identity(Identity),
}

/// One validation rule: a predicate plus its fixed failure message.
#[derive(Clone, Debug)]
pub enum Check {
    /// Value must be present and non-blank.
    Required {
        /// Failure message.
        message: &'static str,
    },
    /// Trimmed length must fall within `min..=max` characters.
    Length {
        /// Minimum length, inclusive.
        min: usize,
        /// Maximum length, inclusive.
        max: usize,
        /// Failure message.
        message: &'static str,
    },
    /// Value must look like an email address.
    Email {
        /// Failure message.
        message: &'static str,
    },
    /// Value must be an http(s) URL.
    Url {
        /// Failure message.
        message: &'static str,
    },
    /// Value must parse as a strict ISO-8601 datetime.
    IsoDate {
        /// Failure message.
        message: &'static str,
    },
    /// Value must satisfy the password strength policy.
    StrongPassword {
        /// Failure message.
        message: &'static str,
    },
    /// Value must equal another field's raw value. This is how
    /// confirm-password rules are parameterized.
    Matches {
        /// Field the value must equal.
        other: &'static str,
        /// Failure message.
        message: &'static str,
    },
    /// Value must be a well-formed handle.
    Username,
    /// No identity may already hold this email.
    EmailAvailable,
    /// An identity must hold this email; attaches it.
    KnownEmail,
    /// Email plus the `password` field must match a stored credential;
    /// attaches the identity. The failure message never reveals which of
    /// the two was wrong.
    Credentials,
    /// Value must be a signature-valid refresh token; attaches its claims.
    /// Liveness is deliberately not checked: the logout flow stays
    /// idempotent by accepting already-consumed tokens.
    RefreshTokenSigned,
    /// Value must be a signature-valid refresh token that is also live in
    /// the token store; attaches its claims.
    RefreshTokenLive,
    /// Value must be a signature-valid email-verify token whose subject
    /// exists; attaches claims and the subject identity.
    EmailVerifyToken,
    /// Value must be a signature-valid forgot-password token that matches
    /// the subject's stored live value; attaches its claims.
    ForgotPasswordToken,
    /// Value must parse as a user id naming an existing identity.
    ExistingUserId,
    /// No identity may already hold this username.
    UsernameAvailable,
    /// Value must match the calling subject's stored password hash.
    OldPassword,
}

impl Check {
    /// Presence rule.
    #[must_use]
    pub fn required(message: &'static str) -> Self {
        Check::Required { message }
    }

    /// Length rule over trimmed character count.
    #[must_use]
    pub fn length(min: usize, max: usize, message: &'static str) -> Self {
        Check::Length { min, max, message }
    }

    /// Email format rule.
    #[must_use]
    pub fn email(message: &'static str) -> Self {
        Check::Email { message }
    }

    /// URL format rule.
    #[must_use]
    pub fn url(message: &'static str) -> Self {
        Check::Url { message }
    }

    /// Strict ISO-8601 rule.
    #[must_use]
    pub fn iso_date(message: &'static str) -> Self {
        Check::IsoDate { message }
    }

    /// Password strength rule.
    #[must_use]
    pub fn strong_password(message: &'static str) -> Self {
        Check::StrongPassword { message }
    }

    /// Cross-field equality rule.
    #[must_use]
    pub fn matches(other: &'static str, message: &'static str) -> Self {
        Check::Matches { other, message }
    }

    async fn apply(
        &self,
        value: Option<&str>,
        input: &RequestInput,
        deps: &PipelineDeps<'_>,
    ) -> Result<Option<Attach>, RuleError> {
        let raw = value.unwrap_or("");
        let trimmed = raw.trim();

        match self {
            Check::Required { message } => {
                if trimmed.is_empty() {
                    return Err(RuleError::Violation((*message).to_owned()));
                }
                Ok(None)
            },
            Check::Length { min, max, message } => {
                let count = trimmed.chars().count();
                if count < *min || count > *max {
                    return Err(RuleError::Violation((*message).to_owned()));
                }
                Ok(None)
            },
            Check::Email { message } => {
                if !is_email(trimmed) {
                    return Err(RuleError::Violation((*message).to_owned()));
                }
                Ok(None)
            },
            Check::Url { message } => {
                if !is_url(trimmed) {
                    return Err(RuleError::Violation((*message).to_owned()));
                }
                Ok(None)
            },
            Check::IsoDate { message } => {
                if DateTime::parse_from_rfc3339(trimmed).is_err() {
                    return Err(RuleError::Violation((*message).to_owned()));
                }
                Ok(None)
            },
            Check::StrongPassword { message } => {
                if !is_strong_password(raw) {
                    return Err(RuleError::Violation((*message).to_owned()));
                }
                Ok(None)
            },
            Check::Matches { other, message } => {
                if raw != input.get(other).unwrap_or("") {
                    return Err(RuleError::Violation((*message).to_owned()));
                }
                Ok(None)
            },
            Check::Username => {
                if !is_valid_username(trimmed) {
                    return Err(RuleError::Violation(messages::USERNAME_INVALID.to_owned()));
                }
                Ok(None)
            },
            Check::EmailAvailable => {
                if deps.identities.find_by_email(trimmed).await?.is_some() {
                    return Err(RuleError::Violation(messages::EMAIL_ALREADY_EXISTS.to_owned()));
                }
                Ok(None)
            },
            Check::KnownEmail => match deps.identities.find_by_email(trimmed).await? {
                Some(identity) => Ok(Some(Attach::Identity(identity))),
                None => Err(RuleError::Violation(messages::USER_NOT_FOUND.to_owned())),
            },
            Check::Credentials => {
                let supplied = input.get("password").unwrap_or("");
                let matched = deps
                    .identities
                    .find_by_email(trimmed)
                    .await?
                    .filter(|identity| password::verify_password(&identity.password_hash, supplied));
                match matched {
                    Some(identity) => Ok(Some(Attach::Identity(identity))),
                    None => Err(RuleError::Violation(
                        messages::EMAIL_OR_PASSWORD_IS_INCORRECT.to_owned(),
                    )),
                }
            },
            Check::RefreshTokenSigned => {
                if trimmed.is_empty() {
                    return Err(RuleError::Violation(
                        messages::REFRESH_TOKEN_IS_REQUIRED.to_owned(),
                    ));
                }
                let claims = deps
                    .codec
                    .verify_kind(trimmed, TokenKind::Refresh)
                    .map_err(AuthError::from)?;
                Ok(Some(Attach::Refresh(claims)))
            },
            Check::RefreshTokenLive => {
                if trimmed.is_empty() {
                    return Err(RuleError::Violation(
                        messages::REFRESH_TOKEN_IS_REQUIRED.to_owned(),
                    ));
                }
                let claims =
                    guard::refresh_claims(deps.codec, deps.refresh_tokens, trimmed).await?;
                Ok(Some(Attach::Refresh(claims)))
            },
            Check::EmailVerifyToken => {
                if trimmed.is_empty() {
                    return Err(RuleError::Violation(
                        messages::EMAIL_VERIFY_TOKEN_IS_REQUIRED.to_owned(),
                    ));
                }
                let claims = deps
                    .codec
                    .verify_kind(trimmed, TokenKind::EmailVerify)
                    .map_err(AuthError::from)?;
                let identity = deps
                    .identities
                    .find_by_id(claims.sub)
                    .await?
                    .ok_or(AuthError::UserNotFound)?;
                Ok(Some(Attach::EmailVerify { claims, identity }))
            },
            Check::ForgotPasswordToken => {
                if trimmed.is_empty() {
                    return Err(RuleError::Halt(AuthError::ForgotPasswordTokenRequired));
                }
                let claims = deps
                    .codec
                    .verify_kind(trimmed, TokenKind::ForgotPassword)
                    .map_err(AuthError::from)?;
                let identity = deps
                    .identities
                    .find_by_id(claims.sub)
                    .await?
                    .ok_or(AuthError::UserNotFound)?;
                if identity.forgot_password_token != trimmed {
                    return Err(RuleError::Halt(AuthError::ForgotPasswordTokenInvalid));
                }
                Ok(Some(Attach::ForgotPassword(claims)))
            },
            Check::ExistingUserId => {
                let id =
                    UserId::parse(trimmed).map_err(|_| AuthError::InvalidUserId)?;
                if deps.identities.find_by_id(id).await?.is_none() {
                    return Err(RuleError::Halt(AuthError::UserNotFound));
                }
                Ok(None)
            },
            Check::UsernameAvailable => {
                if deps.identities.find_by_username(trimmed).await?.is_some() {
                    return Err(RuleError::Violation(messages::USERNAME_EXISTS.to_owned()));
                }
                Ok(None)
            },
            Check::OldPassword => {
                let claims =
                    deps.authorization.ok_or(AuthError::AccessTokenRequired)?;
                let identity = deps
                    .identities
                    .find_by_id(claims.sub)
                    .await?
                    .ok_or(AuthError::UserNotFound)?;
                if !password::verify_password(&identity.password_hash, raw) {
                    return Err(RuleError::Halt(AuthError::OldPasswordIncorrect));
                }
                Ok(None)
            },
        }
    }
}

/// One field's ordered rule chain.
#[derive(Clone, Debug)]
pub struct Field {
    name: &'static str,
    optional: bool,
    checks: Vec<Check>,
}

impl Field {
    /// Starts an empty chain for a field.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name, optional: false, checks: Vec::new() }
    }

    /// Marks the field optional: the chain is skipped when the input has no
    /// value for it, and runs in full when it does.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Appends a check to the chain.
    #[must_use]
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    async fn run_chain(
        &self,
        deps: &PipelineDeps<'_>,
        input: &RequestInput,
    ) -> Result<Vec<Attach>, RuleError> {
        let value = input.get(self.name);
        if self.optional && value.is_none_or(|v| v.trim().is_empty()) {
            return Ok(Vec::new());
        }

        let mut attaches = Vec::new();
        for check in &self.checks {
            if let Some(attach) = check.apply(value, input, deps).await? {
                attaches.push(attach);
            }
        }
        Ok(attaches)
    }
}

/// A complete per-request rule set.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    fields: Vec<Field>,
}

impl Pipeline {
    /// Starts an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field chain.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Runs every chain and classifies the outcome.
    ///
    /// # Errors
    ///
    /// - The first halt, in field declaration order, when any chain raised one
    /// - [`AuthError::Validation`] aggregating each failed field's first violation otherwise
    #[tracing::instrument(skip_all)]
    pub async fn run(
        &self,
        deps: &PipelineDeps<'_>,
        input: &RequestInput,
    ) -> Result<Validated, AuthError> {
        let chains = self.fields.iter().map(|field| field.run_chain(deps, input));
        let results = join_all(chains).await;

        let mut violations: BTreeMap<String, String> = BTreeMap::new();
        let mut halt: Option<AuthError> = None;
        let mut validated = Validated::default();

        for (field, result) in self.fields.iter().zip(results) {
            match result {
                Ok(attaches) => {
                    for attach in attaches {
                        match attach {
                            Attach::Refresh(claims) => validated.refresh = Some(claims),
                            Attach::EmailVerify { claims, identity } => {
                                validated.email_verify = Some(claims);
                                validated.identity = Some(identity);
                            },
                            Attach::ForgotPassword(claims) => {
                                validated.forgot_password = Some(claims);
                            },
                            Attach::Identity(identity) => validated.identity = Some(identity),
                        }
                    }
                },
                Err(RuleError::Violation(message)) => {
                    violations.entry(field.name.to_owned()).or_insert(message);
                },
                Err(RuleError::Halt(error)) => {
                    if halt.is_none() {
                        halt = Some(error);
                    }
                },
            }
        }

        if let Some(error) = halt {
            return Err(error);
        }
        if !violations.is_empty() {
            return Err(AuthError::Validation { errors: violations });
        }
        Ok(validated)
    }
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
        && !domain.contains('@')
}

fn is_url(value: &str) -> bool {
    let rest = value.strip_prefix("https://").or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => !rest.is_empty() && !rest.contains(char::is_whitespace),
        None => false,
    }
}

fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= 6
        && value.chars().any(|c| c.is_lowercase())
        && value.chars().any(|c| c.is_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

fn is_valid_username(value: &str) -> bool {
    let count = value.chars().count();
    (4..=15).contains(&count)
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chirp_store::{
        MemoryIdentityStore, MemoryRefreshTokenStore, NewIdentity, VerifyStatus,
    };
    use chrono::Utc;

    use super::*;
    use crate::config::AuthConfig;

    struct Fixture {
        codec: TokenCodec,
        identities: MemoryIdentityStore,
        refresh_tokens: MemoryRefreshTokenStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                codec: TokenCodec::new(&AuthConfig::new("pipeline-test-secret")),
                identities: MemoryIdentityStore::new(),
                refresh_tokens: MemoryRefreshTokenStore::new(),
            }
        }

        fn deps(&self) -> PipelineDeps<'_> {
            PipelineDeps {
                codec: &self.codec,
                identities: &self.identities,
                refresh_tokens: &self.refresh_tokens,
                authorization: None,
            }
        }

        async fn seed_identity(&self, email: &str, password: &str) -> Identity {
            let identity = Identity::new(NewIdentity {
                name: "Seed User".into(),
                email: email.into(),
                password_hash: password::hash_password(password).unwrap(),
                date_of_birth: Utc::now(),
            });
            self.identities.insert(identity.clone()).await.unwrap();
            identity
        }
    }

    fn password_field(name: &'static str) -> Field {
        Field::new(name)
            .check(Check::required(messages::PASSWORD_IS_REQUIRED))
            .check(Check::length(6, 50, messages::PASSWORD_LENGTH_MUST_BE_FROM_6_TO_50))
            .check(Check::strong_password(messages::PASSWORD_MUST_BE_STRONG))
    }

    #[tokio::test]
    async fn test_violations_aggregate_across_fields() {
        let fixture = Fixture::new();
        let pipeline = Pipeline::new()
            .field(Field::new("name").check(Check::required(messages::NAME_IS_REQUIRED)))
            .field(password_field("password"));

        let input = RequestInput::new().field("password", "short");
        let result = pipeline.run(&fixture.deps(), &input).await;

        let Err(AuthError::Validation { errors }) = result else {
            panic!("expected aggregated validation error, got {result:?}");
        };
        assert_eq!(errors.get("name").map(String::as_str), Some(messages::NAME_IS_REQUIRED));
        // First failure for the field, not the last: 5 chars fails the
        // length rule before the strength rule is consulted.
        assert_eq!(
            errors.get("password").map(String::as_str),
            Some(messages::PASSWORD_LENGTH_MUST_BE_FROM_6_TO_50)
        );
    }

    #[tokio::test]
    async fn test_halt_wins_over_aggregation() {
        let fixture = Fixture::new();
        let pipeline = Pipeline::new()
            .field(Field::new("name").check(Check::required(messages::NAME_IS_REQUIRED)))
            .field(Field::new("forgot_password_token").check(Check::ForgotPasswordToken));

        // The name violation alone would be a 422; the missing forgot-token
        // halt must replace the whole aggregate.
        let input = RequestInput::new();
        let result = pipeline.run(&fixture.deps(), &input).await;

        assert!(matches!(result, Err(AuthError::ForgotPasswordTokenRequired)));
    }

    #[tokio::test]
    async fn test_optional_field_skipped_when_absent() {
        let fixture = Fixture::new();
        let pipeline = Pipeline::new().field(
            Field::new("bio")
                .optional()
                .check(Check::length(1, 200, messages::BIO_LENGTH_MUST_BE_FROM_1_TO_200)),
        );

        // Absent: chain skipped entirely.
        assert!(pipeline.run(&fixture.deps(), &RequestInput::new()).await.is_ok());

        // Present: chain runs and can fail.
        let long_bio = "x".repeat(300);
        let result = pipeline
            .run(&fixture.deps(), &RequestInput::new().field("bio", long_bio))
            .await;
        assert!(matches!(result, Err(AuthError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_matches_is_parameterized_by_field_name() {
        let fixture = Fixture::new();
        let pipeline = Pipeline::new().field(Field::new("confirm_new_password").check(
            Check::matches("new_password", messages::CONFIRM_PASSWORD_MUST_BE_THE_SAME_AS_PASSWORD),
        ));

        let good = RequestInput::new()
            .field("new_password", "Abcdef1!")
            .field("confirm_new_password", "Abcdef1!");
        assert!(pipeline.run(&fixture.deps(), &good).await.is_ok());

        let bad = RequestInput::new()
            .field("new_password", "Abcdef1!")
            .field("confirm_new_password", "Abcdef1?");
        assert!(matches!(
            pipeline.run(&fixture.deps(), &bad).await,
            Err(AuthError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_credentials_attach_identity_without_leaking_which_was_wrong() {
        let fixture = Fixture::new();
        let seeded = fixture.seed_identity("login@x.com", "Abcdef1!").await;

        let pipeline =
            Pipeline::new().field(Field::new("email").check(Check::Credentials));

        let good = RequestInput::new()
            .field("email", "login@x.com")
            .field("password", "Abcdef1!");
        let validated = pipeline.run(&fixture.deps(), &good).await.unwrap();
        assert_eq!(validated.identity.unwrap().id, seeded.id);

        // Wrong password and unknown email produce the identical message.
        let wrong_password = RequestInput::new()
            .field("email", "login@x.com")
            .field("password", "Wrong1!x");
        let unknown_email = RequestInput::new()
            .field("email", "ghost@x.com")
            .field("password", "Abcdef1!");

        for input in [wrong_password, unknown_email] {
            let Err(AuthError::Validation { errors }) =
                pipeline.run(&fixture.deps(), &input).await
            else {
                panic!("expected validation error");
            };
            assert_eq!(
                errors.get("email").map(String::as_str),
                Some(messages::EMAIL_OR_PASSWORD_IS_INCORRECT)
            );
        }
    }

    #[tokio::test]
    async fn test_forgot_password_token_must_match_stored_value() {
        let fixture = Fixture::new();
        let seeded = fixture.seed_identity("reset@x.com", "Abcdef1!").await;

        let stored = fixture
            .codec
            .sign(TokenKind::ForgotPassword, seeded.id, VerifyStatus::Verified)
            .unwrap();
        fixture.identities.set_forgot_password_token(seeded.id, &stored).await.unwrap();

        let pipeline = Pipeline::new()
            .field(Field::new("forgot_password_token").check(Check::ForgotPasswordToken));

        let validated = pipeline
            .run(&fixture.deps(), &RequestInput::new().field("forgot_password_token", &stored))
            .await
            .unwrap();
        assert_eq!(validated.forgot_password.unwrap().sub, seeded.id);

        // A second, superseding token invalidates the first even though the
        // first still carries a valid signature.
        let superseding = fixture
            .codec
            .sign(TokenKind::ForgotPassword, seeded.id, VerifyStatus::Verified)
            .unwrap();
        fixture
            .identities
            .set_forgot_password_token(seeded.id, &superseding)
            .await
            .unwrap();

        let result = pipeline
            .run(&fixture.deps(), &RequestInput::new().field("forgot_password_token", &stored))
            .await;
        assert!(matches!(result, Err(AuthError::ForgotPasswordTokenInvalid)));
    }

    #[tokio::test]
    async fn test_wrong_kind_token_is_halted() {
        let fixture = Fixture::new();
        let seeded = fixture.seed_identity("kind@x.com", "Abcdef1!").await;

        // An access token presented where a refresh token is required.
        let access =
            fixture.codec.sign(TokenKind::Access, seeded.id, VerifyStatus::Verified).unwrap();
        fixture.refresh_tokens.put(seeded.id, &access).await.unwrap();

        let pipeline =
            Pipeline::new().field(Field::new("refresh_token").check(Check::RefreshTokenLive));
        let result = pipeline
            .run(&fixture.deps(), &RequestInput::new().field("refresh_token", &access))
            .await;

        assert!(matches!(result, Err(AuthError::TokenRejected { .. })));
    }

    #[tokio::test]
    async fn test_existing_user_id_halts_on_bad_or_unknown_id() {
        let fixture = Fixture::new();
        let pipeline =
            Pipeline::new().field(Field::new("followed_user_id").check(Check::ExistingUserId));

        let garbled = RequestInput::new().field("followed_user_id", "not-an-id");
        assert!(matches!(
            pipeline.run(&fixture.deps(), &garbled).await,
            Err(AuthError::InvalidUserId)
        ));

        let unknown =
            RequestInput::new().field("followed_user_id", UserId::new().to_string());
        assert!(matches!(
            pipeline.run(&fixture.deps(), &unknown).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[test]
    fn test_format_helpers() {
        assert!(is_email("a@x.com"));
        assert!(!is_email("ax.com"));
        assert!(!is_email("a@x"));
        assert!(!is_email("a @x.com"));

        assert!(is_url("https://example.com/a"));
        assert!(is_url("http://example.com"));
        assert!(!is_url("ftp://example.com"));
        assert!(!is_url("https://"));

        assert!(is_strong_password("Abcdef1!"));
        assert!(!is_strong_password("abcdef1!"));
        assert!(!is_strong_password("ABCDEF1!"));
        assert!(!is_strong_password("Abcdefg!"));
        assert!(!is_strong_password("Abcdefg1"));
        assert!(!is_strong_password("Ab1!"));

        assert!(is_valid_username("alice_99"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("12345678"));
        assert!(!is_valid_username("has space"));
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn run_blocking(pipeline: &Pipeline, fixture: &Fixture, input: &RequestInput) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");
            let _ = runtime.block_on(pipeline.run(&fixture.deps(), input));
        }

        proptest! {
            /// Arbitrary field input must never panic the executor,
            /// whatever mix of violations and halts it produces.
            #[test]
            fn pipeline_never_panics_on_arbitrary_input(
                name in ".{0,40}",
                email in ".{0,40}",
                password in ".{0,40}",
                token in "[ -~]{0,80}",
            ) {
                let fixture = Fixture::new();
                let pipeline = Pipeline::new()
                    .field(Field::new("name").check(Check::required(messages::NAME_IS_REQUIRED)))
                    .field(
                        Field::new("email")
                            .check(Check::email(messages::EMAIL_IS_INVALID))
                            .check(Check::EmailAvailable),
                    )
                    .field(super::password_field("password"))
                    .field(Field::new("refresh_token").check(Check::RefreshTokenSigned))
                    .field(Field::new("user_id").check(Check::ExistingUserId));

                let input = RequestInput::new()
                    .field("name", name)
                    .field("email", email)
                    .field("password", password)
                    .field("refresh_token", token.clone())
                    .field("user_id", token);

                run_blocking(&pipeline, &fixture, &input);
            }
        }
    }
}
