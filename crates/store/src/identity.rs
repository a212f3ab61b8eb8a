//! Identity records and their persistence trait.
//!
//! An [`Identity`] is one account: credentials, verification state, the live
//! one-time tokens, and the public profile fields. The [`IdentityStore`]
//! trait exposes every mutation the rest of the system needs as a single
//! atomic operation per document, so callers never read-modify-write.
//!
//! # One-time token fields
//!
//! `email_verify_token` and `forgot_password_token` hold the latest issued
//! value for their flow, or the empty string when unused or consumed. Only
//! the stored value is redeemable; re-issuing overwrites (and thereby
//! invalidates) the previous one.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    error::{StoreError, StoreResult},
    types::{UserId, VerifyStatus},
};

/// One account record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Record id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address; globally unique.
    pub email: String,
    /// PHC-format password hash. Never the cleartext password.
    pub password_hash: String,
    /// Date of birth supplied at registration.
    pub date_of_birth: DateTime<Utc>,
    /// Verification status.
    pub verify: VerifyStatus,
    /// Live email-verification token; empty when unused or consumed.
    pub email_verify_token: String,
    /// Live forgot-password token; empty when unused or consumed.
    pub forgot_password_token: String,
    /// Profile biography.
    pub bio: String,
    /// Profile location.
    pub location: String,
    /// Profile website URL.
    pub website: String,
    /// Unique handle used for public profile lookup.
    pub username: String,
    /// Avatar image URL.
    pub avatar: String,
    /// Cover photo URL.
    pub cover_photo: String,
    /// Members allowed to see circle-scoped content from this account.
    pub circle: Vec<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Builds a fresh record from registration data.
    ///
    /// The account starts `Unverified` with empty one-time token fields and
    /// empty profile fields.
    #[must_use]
    pub fn new(new: NewIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            date_of_birth: new.date_of_birth,
            verify: VerifyStatus::Unverified,
            email_verify_token: String::new(),
            forgot_password_token: String::new(),
            bio: String::new(),
            location: String::new(),
            website: String::new(),
            username: String::new(),
            avatar: String::new(),
            cover_photo: String::new(),
            circle: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Public projection of this record.
    ///
    /// Strips the password hash and both one-time token fields. This is the
    /// only shape that should ever leave the service.
    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            date_of_birth: self.date_of_birth,
            verify: self.verify,
            bio: self.bio.clone(),
            location: self.location.clone(),
            website: self.website.clone(),
            username: self.username.clone(),
            avatar: self.avatar.clone(),
            cover_photo: self.cover_photo.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Registration data for a new [`Identity`].
#[derive(Clone, Debug)]
pub struct NewIdentity {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Already-hashed password.
    pub password_hash: String,
    /// Date of birth.
    pub date_of_birth: DateTime<Utc>,
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct ProfileChanges {
    /// New display name.
    pub name: Option<String>,
    /// New date of birth.
    pub date_of_birth: Option<DateTime<Utc>>,
    /// New biography.
    pub bio: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New website URL.
    pub website: Option<String>,
    /// New username.
    pub username: Option<String>,
    /// New avatar URL.
    pub avatar: Option<String>,
    /// New cover photo URL.
    pub cover_photo: Option<String>,
}

/// Sanitized view of an [`Identity`], safe to return to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Record id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Date of birth.
    pub date_of_birth: DateTime<Utc>,
    /// Verification status.
    pub verify: VerifyStatus,
    /// Biography.
    pub bio: String,
    /// Location.
    pub location: String,
    /// Website URL.
    pub website: String,
    /// Username.
    pub username: String,
    /// Avatar URL.
    pub avatar: String,
    /// Cover photo URL.
    pub cover_photo: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Persistence operations over identity records.
///
/// Every mutation is a single atomic update scoped to one document. The
/// methods that represent state-machine transitions (`mark_verified`,
/// `reset_password`) combine their field changes into one update so a
/// concurrent reader never observes a half-applied transition.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Inserts a new identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmailTaken`] when another record already holds
    /// the email. Uniqueness is checked inside the insert's critical
    /// section, closing the window a separate lookup would leave open.
    async fn insert(&self, identity: Identity) -> StoreResult<()>;

    /// Looks up an identity by id.
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<Identity>>;

    /// Looks up an identity by email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Looks up an identity by username.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>>;

    /// Overwrites the live email-verification token.
    ///
    /// Issuing a new token invalidates whatever value was stored before,
    /// since only the stored value is accepted at redemption time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the identity does not exist.
    async fn set_email_verify_token(&self, id: UserId, token: &str) -> StoreResult<()>;

    /// Marks the account verified: clears the email-verify token, advances
    /// the status to [`VerifyStatus::Verified`], and bumps `updated_at`, all
    /// in one update. Returns the post-update record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the identity does not exist
    /// - [`StoreError::InvalidTransition`] if the account is banned
    async fn mark_verified(&self, id: UserId) -> StoreResult<Identity>;

    /// Overwrites the live forgot-password token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the identity does not exist.
    async fn set_forgot_password_token(&self, id: UserId, token: &str) -> StoreResult<()>;

    /// Sets a new password hash and clears the forgot-password token in one
    /// update, consuming the token so it cannot be redeemed again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the identity does not exist.
    async fn reset_password(&self, id: UserId, password_hash: &str) -> StoreResult<()>;

    /// Sets a new password hash without touching the one-time token fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the identity does not exist.
    async fn set_password(&self, id: UserId, password_hash: &str) -> StoreResult<()>;

    /// Applies a partial profile update and returns the post-update record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the identity does not exist
    /// - [`StoreError::UsernameTaken`] if the requested username belongs to another record
    async fn update_profile(&self, id: UserId, changes: &ProfileChanges) -> StoreResult<Identity>;

    /// Replaces the circle membership list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the identity does not exist.
    async fn set_circle(&self, id: UserId, circle: &[UserId]) -> StoreResult<()>;
}

/// In-memory [`IdentityStore`] for tests and development.
///
/// All clones share the same underlying map. Single-document atomicity comes
/// from performing each operation under one [`parking_lot::RwLock`] write
/// guard.
#[derive(Debug, Default, Clone)]
pub struct MemoryIdentityStore {
    records: Arc<RwLock<HashMap<UserId, Identity>>>,
}

impl MemoryIdentityStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    #[tracing::instrument(skip(self, identity), fields(id = %identity.id))]
    async fn insert(&self, identity: Identity) -> StoreResult<()> {
        let mut records = self.records.write();

        if records.values().any(|existing| existing.email == identity.email) {
            return Err(StoreError::email_taken(&identity.email));
        }

        records.insert(identity.id, identity);
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<Identity>> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        Ok(self.records.read().values().find(|r| r.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>> {
        Ok(self
            .records
            .read()
            .values()
            .find(|r| !r.username.is_empty() && r.username == username)
            .cloned())
    }

    #[tracing::instrument(skip(self, token))]
    async fn set_email_verify_token(&self, id: UserId, token: &str) -> StoreResult<()> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or_else(|| StoreError::not_found(id.to_string()))?;

        record.email_verify_token = token.to_owned();
        record.updated_at = Utc::now();
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_verified(&self, id: UserId) -> StoreResult<Identity> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or_else(|| StoreError::not_found(id.to_string()))?;

        if record.verify == VerifyStatus::Banned {
            return Err(StoreError::invalid_transition("cannot verify a banned account"));
        }

        record.email_verify_token.clear();
        record.verify = VerifyStatus::Verified;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    #[tracing::instrument(skip(self, token))]
    async fn set_forgot_password_token(&self, id: UserId, token: &str) -> StoreResult<()> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or_else(|| StoreError::not_found(id.to_string()))?;

        record.forgot_password_token = token.to_owned();
        record.updated_at = Utc::now();
        Ok(())
    }

    #[tracing::instrument(skip(self, password_hash))]
    async fn reset_password(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or_else(|| StoreError::not_found(id.to_string()))?;

        record.password_hash = password_hash.to_owned();
        record.forgot_password_token.clear();
        record.updated_at = Utc::now();
        Ok(())
    }

    #[tracing::instrument(skip(self, password_hash))]
    async fn set_password(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or_else(|| StoreError::not_found(id.to_string()))?;

        record.password_hash = password_hash.to_owned();
        record.updated_at = Utc::now();
        Ok(())
    }

    #[tracing::instrument(skip(self, changes))]
    async fn update_profile(&self, id: UserId, changes: &ProfileChanges) -> StoreResult<Identity> {
        let mut records = self.records.write();

        if let Some(username) = &changes.username
            && records.values().any(|r| r.id != id && r.username == *username)
        {
            return Err(StoreError::username_taken(username));
        }

        let record = records.get_mut(&id).ok_or_else(|| StoreError::not_found(id.to_string()))?;

        if let Some(name) = &changes.name {
            record.name = name.clone();
        }
        if let Some(date_of_birth) = changes.date_of_birth {
            record.date_of_birth = date_of_birth;
        }
        if let Some(bio) = &changes.bio {
            record.bio = bio.clone();
        }
        if let Some(location) = &changes.location {
            record.location = location.clone();
        }
        if let Some(website) = &changes.website {
            record.website = website.clone();
        }
        if let Some(username) = &changes.username {
            record.username = username.clone();
        }
        if let Some(avatar) = &changes.avatar {
            record.avatar = avatar.clone();
        }
        if let Some(cover_photo) = &changes.cover_photo {
            record.cover_photo = cover_photo.clone();
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    #[tracing::instrument(skip(self, circle))]
    async fn set_circle(&self, id: UserId, circle: &[UserId]) -> StoreResult<()> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or_else(|| StoreError::not_found(id.to_string()))?;

        record.circle = circle.to_vec();
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn make_identity(email: &str) -> Identity {
        Identity::new(NewIdentity {
            name: "Test User".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            date_of_birth: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryIdentityStore::new();
        let identity = make_identity("a@x.com");
        let id = identity.id;

        store.insert(identity).await.expect("insert should succeed");

        let by_id = store.find_by_id(id).await.unwrap();
        assert_eq!(by_id.unwrap().email, "a@x.com");

        let by_email = store.find_by_email("a@x.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_insert_duplicate_email_fails() {
        let store = MemoryIdentityStore::new();
        store.insert(make_identity("dup@x.com")).await.expect("first insert");

        let result = store.insert(make_identity("dup@x.com")).await;

        assert!(matches!(result, Err(StoreError::EmailTaken { .. })));
    }

    #[tokio::test]
    async fn test_empty_username_is_not_matchable() {
        let store = MemoryIdentityStore::new();
        store.insert(make_identity("a@x.com")).await.unwrap();
        store.insert(make_identity("b@x.com")).await.unwrap();

        // Both records have an empty username; lookup must not match either.
        let result = store.find_by_username("").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_mark_verified_clears_token_and_advances_status() {
        let store = MemoryIdentityStore::new();
        let identity = make_identity("v@x.com");
        let id = identity.id;
        store.insert(identity).await.unwrap();
        store.set_email_verify_token(id, "verify-token").await.unwrap();

        let updated = store.mark_verified(id).await.expect("mark_verified");

        assert_eq!(updated.verify, VerifyStatus::Verified);
        assert!(updated.email_verify_token.is_empty());
    }

    #[tokio::test]
    async fn test_mark_verified_rejects_banned() {
        let store = MemoryIdentityStore::new();
        let mut identity = make_identity("banned@x.com");
        identity.verify = VerifyStatus::Banned;
        let id = identity.id;
        store.insert(identity).await.unwrap();

        let result = store.mark_verified(id).await;

        assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_reset_password_consumes_forgot_token() {
        let store = MemoryIdentityStore::new();
        let identity = make_identity("r@x.com");
        let id = identity.id;
        store.insert(identity).await.unwrap();
        store.set_forgot_password_token(id, "reset-token").await.unwrap();

        store.reset_password(id, "$argon2id$new").await.expect("reset_password");

        let record = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.password_hash, "$argon2id$new");
        assert!(record.forgot_password_token.is_empty());
    }

    #[tokio::test]
    async fn test_update_profile_partial() {
        let store = MemoryIdentityStore::new();
        let identity = make_identity("p@x.com");
        let id = identity.id;
        let original_name = identity.name.clone();
        store.insert(identity).await.unwrap();

        let changes =
            ProfileChanges { bio: Some("hello".into()), ..ProfileChanges::default() };
        let updated = store.update_profile(id, &changes).await.expect("update_profile");

        assert_eq!(updated.bio, "hello");
        assert_eq!(updated.name, original_name);
    }

    #[tokio::test]
    async fn test_update_profile_username_conflict() {
        let store = MemoryIdentityStore::new();
        let first = make_identity("one@x.com");
        let second = make_identity("two@x.com");
        let first_id = first.id;
        let second_id = second.id;
        store.insert(first).await.unwrap();
        store.insert(second).await.unwrap();

        let take_handle =
            ProfileChanges { username: Some("handle".into()), ..ProfileChanges::default() };
        store.update_profile(first_id, &take_handle).await.expect("first claim");

        let result = store.update_profile(second_id, &take_handle).await;
        assert!(matches!(result, Err(StoreError::UsernameTaken { .. })));
    }

    #[tokio::test]
    async fn test_profile_projection_hides_secrets() {
        let identity = make_identity("secret@x.com");
        let json = serde_json::to_value(identity.profile()).unwrap();

        assert!(json.get("password_hash").is_none());
        assert!(json.get("email_verify_token").is_none());
        assert!(json.get("forgot_password_token").is_none());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let store = MemoryIdentityStore::new();
        let cloned = store.clone();
        let identity = make_identity("shared@x.com");
        let id = identity.id;

        store.insert(identity).await.unwrap();

        assert!(cloned.find_by_id(id).await.unwrap().is_some());
    }
}
