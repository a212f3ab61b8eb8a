//! Endpoint-shaped surface over the authentication core.
//!
//! Each method mirrors one route: run the route's validation pipeline (and
//! gates, where the route is authenticated), then hand the validated
//! context to the session manager. The handlers themselves stay thin; all
//! decisions happen in the pipeline, the gates, and the session manager.
//!
//! The pipelines here are the declarative route schemas. They are built
//! once at construction and are plain data after that.

use chirp_store::{ProfileChanges, UserId, VerifyStatus};
use chrono::{DateTime, Utc};

use crate::{
    claims::TokenClaims,
    error::AuthError,
    guard, messages,
    pipeline::{Check, Field, Pipeline, PipelineDeps, RequestInput},
    session::{
        FollowOutcome, RegisterRequest, RegisteredTokens, ResendOutcome, SessionManager,
        TokenPair, UnfollowOutcome,
    },
};

/// Simple acknowledgement payload.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Ack {
    /// Human-readable acknowledgement.
    pub message: &'static str,
}

/// The authentication API: one method per route.
pub struct AuthApi {
    session: SessionManager,
    pipelines: Pipelines,
}

struct Pipelines {
    register: Pipeline,
    login: Pipeline,
    logout: Pipeline,
    refresh: Pipeline,
    verify_email: Pipeline,
    forgot_password: Pipeline,
    verify_forgot_password: Pipeline,
    reset_password: Pipeline,
    update_me: Pipeline,
    follow: Pipeline,
    unfollow: Pipeline,
    change_password: Pipeline,
}

fn password_field(name: &'static str) -> Field {
    Field::new(name)
        .check(Check::required(messages::PASSWORD_IS_REQUIRED))
        .check(Check::length(6, 50, messages::PASSWORD_LENGTH_MUST_BE_FROM_6_TO_50))
        .check(Check::strong_password(messages::PASSWORD_MUST_BE_STRONG))
}

fn confirm_password_field(name: &'static str, confirms: &'static str) -> Field {
    Field::new(name)
        .check(Check::required(messages::CONFIRM_PASSWORD_IS_REQUIRED))
        .check(Check::length(6, 50, messages::PASSWORD_LENGTH_MUST_BE_FROM_6_TO_50))
        .check(Check::strong_password(messages::PASSWORD_MUST_BE_STRONG))
        .check(Check::matches(confirms, messages::CONFIRM_PASSWORD_MUST_BE_THE_SAME_AS_PASSWORD))
}

impl Pipelines {
    fn build() -> Self {
        Self {
            register: Pipeline::new()
                .field(
                    Field::new("name")
                        .check(Check::required(messages::NAME_IS_REQUIRED))
                        .check(Check::length(1, 100, messages::NAME_LENGTH_MUST_BE_FROM_1_TO_100)),
                )
                .field(
                    Field::new("email")
                        .check(Check::required(messages::EMAIL_IS_REQUIRED))
                        .check(Check::email(messages::EMAIL_IS_INVALID))
                        .check(Check::EmailAvailable),
                )
                .field(password_field("password"))
                .field(confirm_password_field("confirm_password", "password"))
                .field(
                    Field::new("date_of_birth")
                        .check(Check::iso_date(messages::DATE_OF_BIRTH_MUST_BE_ISO8601)),
                ),
            login: Pipeline::new()
                .field(
                    Field::new("email")
                        .check(Check::required(messages::EMAIL_IS_REQUIRED))
                        .check(Check::email(messages::EMAIL_IS_INVALID))
                        .check(Check::Credentials),
                )
                .field(password_field("password")),
            logout: Pipeline::new()
                .field(Field::new("refresh_token").check(Check::RefreshTokenSigned)),
            refresh: Pipeline::new()
                .field(Field::new("refresh_token").check(Check::RefreshTokenLive)),
            verify_email: Pipeline::new()
                .field(Field::new("email_verify_token").check(Check::EmailVerifyToken)),
            forgot_password: Pipeline::new().field(
                Field::new("email")
                    .check(Check::required(messages::EMAIL_IS_REQUIRED))
                    .check(Check::email(messages::EMAIL_IS_INVALID))
                    .check(Check::KnownEmail),
            ),
            verify_forgot_password: Pipeline::new()
                .field(Field::new("forgot_password_token").check(Check::ForgotPasswordToken)),
            reset_password: Pipeline::new()
                .field(password_field("password"))
                .field(confirm_password_field("confirm_password", "password"))
                .field(Field::new("forgot_password_token").check(Check::ForgotPasswordToken)),
            update_me: Pipeline::new()
                .field(
                    Field::new("name")
                        .optional()
                        .check(Check::length(1, 100, messages::NAME_LENGTH_MUST_BE_FROM_1_TO_100)),
                )
                .field(
                    Field::new("date_of_birth")
                        .optional()
                        .check(Check::iso_date(messages::DATE_OF_BIRTH_MUST_BE_ISO8601)),
                )
                .field(
                    Field::new("bio")
                        .optional()
                        .check(Check::length(1, 200, messages::BIO_LENGTH_MUST_BE_FROM_1_TO_200)),
                )
                .field(Field::new("location").optional().check(Check::length(
                    1,
                    200,
                    messages::LOCATION_LENGTH_MUST_BE_FROM_1_TO_200,
                )))
                .field(
                    Field::new("website")
                        .optional()
                        .check(Check::url(messages::WEBSITE_MUST_BE_URL)),
                )
                .field(
                    Field::new("username")
                        .optional()
                        .check(Check::Username)
                        .check(Check::UsernameAvailable),
                )
                .field(
                    Field::new("avatar")
                        .optional()
                        .check(Check::url(messages::AVATAR_MUST_BE_URL)),
                )
                .field(
                    Field::new("cover_photo")
                        .optional()
                        .check(Check::url(messages::COVER_PHOTO_MUST_BE_URL)),
                ),
            follow: Pipeline::new()
                .field(Field::new("followed_user_id").check(Check::ExistingUserId)),
            unfollow: Pipeline::new().field(Field::new("user_id").check(Check::ExistingUserId)),
            change_password: Pipeline::new()
                .field(
                    Field::new("old_password")
                        .check(Check::required(messages::PASSWORD_IS_REQUIRED))
                        .check(Check::OldPassword),
                )
                .field(password_field("new_password"))
                .field(confirm_password_field("confirm_new_password", "new_password")),
        }
    }
}

impl AuthApi {
    /// Wraps a session manager in the route surface.
    #[must_use]
    pub fn new(session: SessionManager) -> Self {
        Self { session, pipelines: Pipelines::build() }
    }

    /// The underlying session manager.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn deps(&self) -> PipelineDeps<'_> {
        PipelineDeps {
            codec: self.session.codec(),
            identities: self.session.identities(),
            refresh_tokens: self.session.refresh_tokens(),
            authorization: None,
        }
    }

    fn deps_as<'a>(&'a self, claims: &'a TokenClaims) -> PipelineDeps<'a> {
        PipelineDeps { authorization: Some(claims), ..self.deps() }
    }

    fn bearer(&self, input: &RequestInput) -> Result<TokenClaims, AuthError> {
        guard::bearer_claims(self.session.codec(), input.bearer_header())
    }

    /// `POST /register`
    pub async fn register(&self, input: &RequestInput) -> Result<RegisteredTokens, AuthError> {
        self.pipelines.register.run(&self.deps(), input).await?;

        let date_of_birth = parse_iso_field(input, "date_of_birth")?;
        self.session
            .register(RegisterRequest {
                name: input.get("name").unwrap_or_default().trim().to_owned(),
                email: input.get("email").unwrap_or_default().trim().to_owned(),
                password: input.get("password").unwrap_or_default().to_owned(),
                date_of_birth,
            })
            .await
    }

    /// `POST /login`
    pub async fn login(&self, input: &RequestInput) -> Result<TokenPair, AuthError> {
        let validated = self.pipelines.login.run(&self.deps(), input).await?;
        let identity = validated.identity.ok_or_else(context_missing)?;
        self.session.login(identity.id, identity.verify).await
    }

    /// `POST /logout` (access token + signature-valid refresh token in body)
    pub async fn logout(&self, input: &RequestInput) -> Result<Ack, AuthError> {
        self.bearer(input)?;
        self.pipelines.logout.run(&self.deps(), input).await?;

        let token = input.get("refresh_token").unwrap_or_default().trim();
        self.session.logout(token).await?;
        Ok(Ack { message: messages::LOGOUT_SUCCESSFUL })
    }

    /// `POST /refresh-token`
    pub async fn refresh_token(&self, input: &RequestInput) -> Result<TokenPair, AuthError> {
        let validated = self.pipelines.refresh.run(&self.deps(), input).await?;
        let claims = validated.refresh.ok_or_else(context_missing)?;

        let token = input.get("refresh_token").unwrap_or_default().trim();
        self.session.refresh_token(token, &claims).await
    }

    /// `POST /verify-email`
    pub async fn verify_email(&self, input: &RequestInput) -> Result<TokenPair, AuthError> {
        let validated = self.pipelines.verify_email.run(&self.deps(), input).await?;
        let identity = validated.identity.ok_or_else(context_missing)?;

        if identity.verify == VerifyStatus::Verified {
            return Err(AuthError::EmailAlreadyVerified);
        }
        let supplied = input.get("email_verify_token").unwrap_or_default().trim();
        if identity.email_verify_token != supplied {
            // A superseding resend invalidated this token.
            return Err(AuthError::EmailVerifyTokenInvalid);
        }

        self.session.verify_email(identity.id).await
    }

    /// `POST /resend-verify-email` (access token)
    pub async fn resend_verify_email(
        &self,
        input: &RequestInput,
    ) -> Result<ResendOutcome, AuthError> {
        let claims = self.bearer(input)?;
        let identity = self
            .session
            .identities()
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if identity.verify == VerifyStatus::Verified {
            return Ok(ResendOutcome::AlreadyVerified);
        }
        self.session.resend_verify_email(identity.id, &identity.email).await?;
        Ok(ResendOutcome::Sent)
    }

    /// `POST /forgot-password`
    pub async fn forgot_password(&self, input: &RequestInput) -> Result<Ack, AuthError> {
        let validated = self.pipelines.forgot_password.run(&self.deps(), input).await?;
        let identity = validated.identity.ok_or_else(context_missing)?;

        self.session.forgot_password(identity.id, identity.verify, &identity.email).await?;
        Ok(Ack { message: messages::CHECK_EMAIL_TO_RESET_PASSWORD })
    }

    /// `POST /verify-forgot-password`: validates the reset token without
    /// consuming it.
    pub async fn verify_forgot_password(&self, input: &RequestInput) -> Result<Ack, AuthError> {
        self.pipelines.verify_forgot_password.run(&self.deps(), input).await?;
        Ok(Ack { message: messages::VERIFY_FORGOT_PASSWORD_TOKEN_SUCCESSFUL })
    }

    /// `POST /reset-password`
    pub async fn reset_password(&self, input: &RequestInput) -> Result<Ack, AuthError> {
        let validated = self.pipelines.reset_password.run(&self.deps(), input).await?;
        let claims = validated.forgot_password.ok_or_else(context_missing)?;

        let password = input.get("password").unwrap_or_default();
        self.session.reset_password(claims.sub, password).await?;
        Ok(Ack { message: messages::RESET_PASSWORD_SUCCESSFUL })
    }

    /// `GET /me` (access token)
    pub async fn me(&self, input: &RequestInput) -> Result<chirp_store::Profile, AuthError> {
        let claims = self.bearer(input)?;
        self.session.get_me(claims.sub).await
    }

    /// `GET /:username`
    pub async fn get_profile(&self, username: &str) -> Result<chirp_store::Profile, AuthError> {
        self.session.get_profile(username).await
    }

    /// `PATCH /me` (access token, verified)
    pub async fn update_me(
        &self,
        input: &RequestInput,
    ) -> Result<chirp_store::Profile, AuthError> {
        let claims = self.bearer(input)?;
        guard::require_verified(&claims)?;
        self.pipelines.update_me.run(&self.deps(), input).await?;

        let date_of_birth = match input.get("date_of_birth") {
            Some(value) if !value.trim().is_empty() => Some(parse_iso_field(input, "date_of_birth")?),
            _ => None,
        };
        let changes = ProfileChanges {
            name: owned_field(input, "name"),
            date_of_birth,
            bio: owned_field(input, "bio"),
            location: owned_field(input, "location"),
            website: owned_field(input, "website"),
            username: owned_field(input, "username"),
            avatar: owned_field(input, "avatar"),
            cover_photo: owned_field(input, "cover_photo"),
        };
        self.session.update_me(claims.sub, &changes).await
    }

    /// `POST /follow` (access token, verified)
    pub async fn follow(&self, input: &RequestInput) -> Result<FollowOutcome, AuthError> {
        let claims = self.bearer(input)?;
        guard::require_verified(&claims)?;
        self.pipelines.follow.run(&self.deps(), input).await?;

        let followed = parse_user_id_field(input, "followed_user_id")?;
        self.session.follow(claims.sub, followed).await
    }

    /// `DELETE /follow/:user_id` (access token, verified)
    pub async fn unfollow(&self, input: &RequestInput) -> Result<UnfollowOutcome, AuthError> {
        let claims = self.bearer(input)?;
        guard::require_verified(&claims)?;
        self.pipelines.unfollow.run(&self.deps(), input).await?;

        let followed = parse_user_id_field(input, "user_id")?;
        self.session.unfollow(claims.sub, followed).await
    }

    /// `PUT /change-password` (access token, verified)
    pub async fn change_password(&self, input: &RequestInput) -> Result<Ack, AuthError> {
        let claims = self.bearer(input)?;
        guard::require_verified(&claims)?;
        self.pipelines.change_password.run(&self.deps_as(&claims), input).await?;

        let new_password = input.get("new_password").unwrap_or_default();
        self.session.change_password(claims.sub, new_password).await?;
        Ok(Ack { message: messages::CHANGE_PASSWORD_SUCCESSFUL })
    }
}

/// A pipeline accepted the request but did not attach the context its
/// endpoint depends on. That is a wiring bug, not a client error.
fn context_missing() -> AuthError {
    AuthError::internal("validated context missing an expected attachment")
}

fn owned_field(input: &RequestInput, name: &str) -> Option<String> {
    input.get(name).map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

fn parse_iso_field(input: &RequestInput, name: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::parse_from_rfc3339(input.get(name).unwrap_or_default().trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AuthError::validation(name, messages::DATE_OF_BIRTH_MUST_BE_ISO8601))
}

fn parse_user_id_field(input: &RequestInput, name: &str) -> Result<UserId, AuthError> {
    UserId::parse(input.get(name).unwrap_or_default().trim())
        .map_err(|_| AuthError::InvalidUserId)
}
