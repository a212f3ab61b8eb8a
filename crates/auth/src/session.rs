//! Session lifecycle orchestration.
//!
//! The session manager owns issuance, rotation, and invalidation of every
//! credential kind, plus the verification-state transitions on identity
//! records. It does not authenticate: by the time one of these operations
//! runs, the validation pipeline and gates have already established who is
//! calling. It only issues, persists, and revokes.
//!
//! # Rotation ordering
//!
//! [`SessionManager::refresh_token`] persists the new refresh record before
//! deleting the old one. The two effects are separate single-document
//! operations, so a crash between them must leave a recoverable state: with
//! this order the worst case is a transient extra live session, where the
//! opposite order could lock the user out entirely. The delete side is
//! idempotent, so replaying it is harmless.

use std::sync::Arc;

use serde::Serialize;

use chirp_store::{
    FollowStore, Identity, IdentityStore, NewIdentity, Profile, ProfileChanges,
    RefreshTokenStore, StoreError, UserId, VerifyStatus,
};
use chrono::{DateTime, Utc};

use crate::{
    claims::{TokenClaims, TokenKind},
    codec::TokenCodec,
    config::AuthConfig,
    error::AuthError,
    mailer::{self, Mailer},
    messages, password,
};

/// A freshly minted access/refresh pair.
#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    /// Short-lived API credential.
    pub access_token: String,
    /// Store-backed rotation credential.
    pub refresh_token: String,
}

/// Registration result: the token pair plus the email-verify token that was
/// also embedded in the outbound verification link.
#[derive(Clone, Debug, Serialize)]
pub struct RegisteredTokens {
    /// Short-lived API credential.
    pub access_token: String,
    /// Store-backed rotation credential.
    pub refresh_token: String,
    /// One-time email verification credential.
    pub email_verify_token: String,
}

/// Validated registration data.
#[derive(Clone, Debug)]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Cleartext password; hashed before anything is persisted.
    pub password: String,
    /// Date of birth.
    pub date_of_birth: DateTime<Utc>,
}

/// Outcome of a follow request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    /// A new edge was created.
    Followed,
    /// The edge already existed; nothing changed.
    AlreadyFollowed,
}

impl FollowOutcome {
    /// User-facing acknowledgement.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            FollowOutcome::Followed => messages::FOLLOW_SUCCESSFUL,
            FollowOutcome::AlreadyFollowed => messages::ALREADY_FOLLOWED,
        }
    }
}

/// Outcome of an unfollow request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnfollowOutcome {
    /// An edge was removed.
    Unfollowed,
    /// No edge existed; nothing changed.
    AlreadyUnfollowed,
}

impl UnfollowOutcome {
    /// User-facing acknowledgement.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            UnfollowOutcome::Unfollowed => messages::UNFOLLOW_SUCCESSFUL,
            UnfollowOutcome::AlreadyUnfollowed => messages::ALREADY_UNFOLLOWED,
        }
    }
}

/// Outcome of a resend-verification request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResendOutcome {
    /// A fresh token was issued and mailed.
    Sent,
    /// The account was already verified; nothing was sent.
    AlreadyVerified,
}

impl ResendOutcome {
    /// User-facing acknowledgement.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ResendOutcome::Sent => messages::RESEND_VERIFY_EMAIL_SUCCESSFUL,
            ResendOutcome::AlreadyVerified => messages::EMAIL_ALREADY_VERIFIED,
        }
    }
}

/// Orchestrates the credential lifecycle over the codec, the stores, and the
/// mailer.
pub struct SessionManager {
    codec: TokenCodec,
    identities: Arc<dyn IdentityStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    follows: Arc<dyn FollowStore>,
    mailer: Arc<dyn Mailer>,
    config: AuthConfig,
}

impl SessionManager {
    /// Wires a session manager from deployment configuration and the
    /// collaborating stores.
    #[must_use]
    pub fn new(
        config: AuthConfig,
        identities: Arc<dyn IdentityStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        follows: Arc<dyn FollowStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            codec: TokenCodec::new(&config),
            identities,
            refresh_tokens,
            follows,
            mailer,
            config,
        }
    }

    pub(crate) fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub(crate) fn identities(&self) -> &dyn IdentityStore {
        &*self.identities
    }

    pub(crate) fn refresh_tokens(&self) -> &dyn RefreshTokenStore {
        &*self.refresh_tokens
    }

    fn sign_pair(&self, user: UserId, verify: VerifyStatus) -> Result<TokenPair, AuthError> {
        let access_token = self.codec.sign(TokenKind::Access, user, verify)?;
        let refresh_token = self.codec.sign(TokenKind::Refresh, user, verify)?;
        Ok(TokenPair { access_token, refresh_token })
    }

    /// Creates an unverified identity, mints all three registration tokens,
    /// persists the refresh record and the verify token, and dispatches the
    /// verification email.
    ///
    /// # Errors
    ///
    /// A duplicate email surfaces as the aggregated field error on `email`.
    /// The store enforces uniqueness inside the insert itself, so the
    /// pipeline-level availability check losing a race still cannot produce
    /// two records.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisteredTokens, AuthError> {
        let password_hash = password::hash_password(&request.password)?;
        let mut identity = Identity::new(NewIdentity {
            name: request.name,
            email: request.email,
            password_hash,
            date_of_birth: request.date_of_birth,
        });
        identity.username = self.default_username(&identity.email, identity.id).await?;
        let user = identity.id;
        let email = identity.email.clone();

        match self.identities.insert(identity).await {
            Ok(()) => {},
            Err(StoreError::EmailTaken { .. }) => {
                return Err(AuthError::validation("email", messages::EMAIL_ALREADY_EXISTS));
            },
            Err(other) => return Err(other.into()),
        }

        let pair = self.sign_pair(user, VerifyStatus::Unverified)?;
        let email_verify_token =
            self.codec.sign(TokenKind::EmailVerify, user, VerifyStatus::Unverified)?;

        self.identities.set_email_verify_token(user, &email_verify_token).await?;
        self.refresh_tokens.put(user, &pair.refresh_token).await?;

        self.dispatch_email(
            &email,
            "Verify your email",
            mailer::verify_email_body(&self.config.client_url, &email_verify_token),
        )
        .await;

        tracing::debug!(%user, "registered new identity");
        Ok(RegisteredTokens {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            email_verify_token,
        })
    }

    /// Mints a pair for an already-authenticated subject and persists the
    /// refresh record. Credential checking happened in the pipeline.
    #[tracing::instrument(skip(self))]
    pub async fn login(
        &self,
        user: UserId,
        verify: VerifyStatus,
    ) -> Result<TokenPair, AuthError> {
        let pair = self.sign_pair(user, verify)?;
        self.refresh_tokens.put(user, &pair.refresh_token).await?;
        Ok(pair)
    }

    /// Revokes a refresh token. Idempotent: revoking an absent token is a
    /// success, which is what keeps repeated logouts clean.
    #[tracing::instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let removed = self.refresh_tokens.remove(refresh_token).await?;
        tracing::debug!(removed, "logout processed");
        Ok(())
    }

    /// Exchanges a live refresh token for a new pair, consuming the old one.
    ///
    /// New record first, then the delete; see the module docs for why this
    /// order.
    #[tracing::instrument(skip(self, old_token, claims), fields(user = %claims.sub))]
    pub async fn refresh_token(
        &self,
        old_token: &str,
        claims: &TokenClaims,
    ) -> Result<TokenPair, AuthError> {
        let pair = self.sign_pair(claims.sub, claims.verify)?;
        self.refresh_tokens.put(claims.sub, &pair.refresh_token).await?;
        self.refresh_tokens.remove(old_token).await?;
        Ok(pair)
    }

    /// Completes email verification: advances the record to `Verified`,
    /// clears the one-time token, and mints a fresh pair. The status
    /// transition is a single atomic update; the pair is minted concurrently
    /// with it.
    ///
    /// Callers short-circuit with [`AuthError::EmailAlreadyVerified`] before
    /// getting here; the store-level transition also refuses to resurrect a
    /// banned record.
    #[tracing::instrument(skip(self))]
    pub async fn verify_email(&self, user: UserId) -> Result<TokenPair, AuthError> {
        let (pair, updated) = tokio::join!(
            std::future::ready(self.sign_pair(user, VerifyStatus::Verified)),
            self.identities.mark_verified(user),
        );
        updated?;
        let pair = pair?;

        self.refresh_tokens.put(user, &pair.refresh_token).await?;
        tracing::debug!(%user, "email verified");
        Ok(pair)
    }

    /// Issues a fresh email-verify token, overwriting (and thereby
    /// invalidating) the previous one, and dispatches the email again.
    #[tracing::instrument(skip(self, email))]
    pub async fn resend_verify_email(&self, user: UserId, email: &str) -> Result<(), AuthError> {
        let email_verify_token =
            self.codec.sign(TokenKind::EmailVerify, user, VerifyStatus::Unverified)?;
        self.identities.set_email_verify_token(user, &email_verify_token).await?;

        self.dispatch_email(
            email,
            "Verify your email",
            mailer::verify_email_body(&self.config.client_url, &email_verify_token),
        )
        .await;
        Ok(())
    }

    /// Issues a forgot-password token, persists it as the live value, and
    /// dispatches the reset email.
    #[tracing::instrument(skip(self, email))]
    pub async fn forgot_password(
        &self,
        user: UserId,
        verify: VerifyStatus,
        email: &str,
    ) -> Result<(), AuthError> {
        let forgot_password_token =
            self.codec.sign(TokenKind::ForgotPassword, user, verify)?;
        self.identities.set_forgot_password_token(user, &forgot_password_token).await?;

        self.dispatch_email(
            email,
            "Forgot password",
            mailer::forgot_password_body(&self.config.client_url, &forgot_password_token),
        )
        .await;
        Ok(())
    }

    /// Sets the new password hash and consumes the forgot-password token in
    /// one atomic update. Only reachable after the pipeline matched the
    /// supplied token against the stored value.
    #[tracing::instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        user: UserId,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let password_hash = password::hash_password(new_password)?;
        self.identities.reset_password(user, &password_hash).await?;
        Ok(())
    }

    /// Replaces the password hash. The old-password check happened in the
    /// pipeline.
    #[tracing::instrument(skip(self, new_password))]
    pub async fn change_password(
        &self,
        user: UserId,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let password_hash = password::hash_password(new_password)?;
        self.identities.set_password(user, &password_hash).await?;
        Ok(())
    }

    /// Creates a follow edge if absent. Re-following is a status signal,
    /// not an error.
    #[tracing::instrument(skip(self))]
    pub async fn follow(
        &self,
        follower: UserId,
        followed: UserId,
    ) -> Result<FollowOutcome, AuthError> {
        let created = self.follows.insert_if_absent(follower, followed).await?;
        Ok(if created { FollowOutcome::Followed } else { FollowOutcome::AlreadyFollowed })
    }

    /// Removes a follow edge if present. Re-unfollowing is a status signal,
    /// not an error.
    #[tracing::instrument(skip(self))]
    pub async fn unfollow(
        &self,
        follower: UserId,
        followed: UserId,
    ) -> Result<UnfollowOutcome, AuthError> {
        let removed = self.follows.remove(follower, followed).await?;
        Ok(if removed { UnfollowOutcome::Unfollowed } else { UnfollowOutcome::AlreadyUnfollowed })
    }

    /// Sanitized self view.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] when the subject no longer exists.
    pub async fn get_me(&self, user: UserId) -> Result<Profile, AuthError> {
        let identity =
            self.identities.find_by_id(user).await?.ok_or(AuthError::UserNotFound)?;
        Ok(identity.profile())
    }

    /// Public profile lookup by username.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] when no account holds the handle.
    pub async fn get_profile(&self, username: &str) -> Result<Profile, AuthError> {
        let identity = self
            .identities
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(identity.profile())
    }

    /// Applies a partial profile update and returns the new view.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update_me(
        &self,
        user: UserId,
        changes: &ProfileChanges,
    ) -> Result<Profile, AuthError> {
        match self.identities.update_profile(user, changes).await {
            Ok(identity) => Ok(identity.profile()),
            Err(StoreError::UsernameTaken { .. }) => {
                Err(AuthError::validation("username", messages::USERNAME_EXISTS))
            },
            Err(StoreError::NotFound { .. }) => Err(AuthError::UserNotFound),
            Err(other) => Err(other.into()),
        }
    }

    /// Derives the starting username for a new account: the email local
    /// part, suffixed with a fragment of the record id when the local part
    /// is already claimed. The account owner can change it later through
    /// the profile update flow.
    async fn default_username(&self, email: &str, user: UserId) -> Result<String, AuthError> {
        let local = email.split('@').next().unwrap_or_default();
        if self.identities.find_by_username(local).await?.is_none() {
            return Ok(local.to_owned());
        }
        let suffix: String = user.to_string().chars().take(8).collect();
        Ok(format!("{local}_{suffix}"))
    }

    /// Sends one email, best-effort. A failed dispatch is logged and never
    /// fails the operation that triggered it.
    async fn dispatch_email(&self, to: &str, subject: &str, html_body: String) {
        if let Err(error) = self.mailer.send(to, subject, &html_body).await {
            tracing::warn!(%error, to, subject, "email dispatch failed");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").field("codec", &self.codec).finish_non_exhaustive()
    }
}
