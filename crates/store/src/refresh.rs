//! Refresh credential records and their persistence trait.
//!
//! A [`RefreshTokenRecord`] exists if and only if the corresponding refresh
//! token is currently redeemable. Deleting the record is the sole revocation
//! mechanism; there is no denylist. Signature validity alone is therefore
//! necessary but not sufficient to accept a refresh token.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{error::StoreResult, types::UserId};

/// One outstanding refresh credential.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Owning identity.
    pub user_id: UserId,
    /// Raw token string, the lookup key.
    pub token: String,
    /// Issue timestamp.
    pub created_at: DateTime<Utc>,
}

/// Persistence operations over refresh credentials.
///
/// The store is the source of truth for refresh-token liveness. Removal is
/// idempotent by design: rotation and logout may race, and replaying a
/// delete must not fail.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Records a newly issued refresh token for an identity.
    async fn put(&self, user_id: UserId, token: &str) -> StoreResult<()>;

    /// Reports whether the token is currently redeemable.
    async fn exists(&self, token: &str) -> StoreResult<bool>;

    /// Revokes a token. Returns `true` when a record was removed, `false`
    /// when nothing was stored under this token. Never an error on a miss.
    async fn remove(&self, token: &str) -> StoreResult<bool>;

    /// Revokes every outstanding token for an identity, returning how many
    /// records were removed. Used for fleet-wide invalidation.
    async fn remove_all_for_user(&self, user_id: UserId) -> StoreResult<usize>;
}

/// In-memory [`RefreshTokenStore`] keyed by raw token value.
#[derive(Debug, Default, Clone)]
pub struct MemoryRefreshTokenStore {
    records: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
}

impl MemoryRefreshTokenStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding records. Test helper.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    #[tracing::instrument(skip(self, token))]
    async fn put(&self, user_id: UserId, token: &str) -> StoreResult<()> {
        let record =
            RefreshTokenRecord { user_id, token: token.to_owned(), created_at: Utc::now() };
        self.records.write().insert(token.to_owned(), record);
        Ok(())
    }

    async fn exists(&self, token: &str) -> StoreResult<bool> {
        Ok(self.records.read().contains_key(token))
    }

    #[tracing::instrument(skip(self, token))]
    async fn remove(&self, token: &str) -> StoreResult<bool> {
        Ok(self.records.write().remove(token).is_some())
    }

    #[tracing::instrument(skip(self))]
    async fn remove_all_for_user(&self, user_id: UserId) -> StoreResult<usize> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, record| record.user_id != user_id);
        Ok(before - records.len())
    }
}
