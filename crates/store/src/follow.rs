//! Follow edges between identities.
//!
//! Follows are set membership: the pair `(follower, followed)` either exists
//! or it does not. Both mutations report whether they changed anything so
//! callers can answer "already in the desired state" without a second read.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{error::StoreResult, types::UserId};

/// One follow edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FollowEdge {
    /// The account doing the following.
    pub follower: UserId,
    /// The account being followed.
    pub followed: UserId,
    /// When the edge was created.
    pub created_at: DateTime<Utc>,
}

/// Persistence operations over follow edges.
#[async_trait]
pub trait FollowStore: Send + Sync {
    /// Creates the edge if absent. Returns `true` when the edge was created,
    /// `false` when it already existed. Never creates a duplicate.
    async fn insert_if_absent(&self, follower: UserId, followed: UserId) -> StoreResult<bool>;

    /// Deletes the edge if present. Returns `true` when an edge was removed.
    async fn remove(&self, follower: UserId, followed: UserId) -> StoreResult<bool>;

    /// Reports whether the edge exists.
    async fn exists(&self, follower: UserId, followed: UserId) -> StoreResult<bool>;
}

/// In-memory [`FollowStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryFollowStore {
    edges: Arc<RwLock<HashMap<(UserId, UserId), FollowEdge>>>,
}

impl MemoryFollowStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FollowStore for MemoryFollowStore {
    #[tracing::instrument(skip(self))]
    async fn insert_if_absent(&self, follower: UserId, followed: UserId) -> StoreResult<bool> {
        let mut edges = self.edges.write();
        match edges.entry((follower, followed)) {
            std::collections::hash_map::Entry::Occupied(_) => Ok(false),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(FollowEdge { follower, followed, created_at: Utc::now() });
                Ok(true)
            },
        }
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, follower: UserId, followed: UserId) -> StoreResult<bool> {
        Ok(self.edges.write().remove(&(follower, followed)).is_some())
    }

    async fn exists(&self, follower: UserId, followed: UserId) -> StoreResult<bool> {
        Ok(self.edges.read().contains_key(&(follower, followed)))
    }
}
