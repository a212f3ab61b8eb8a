//! Direct message records.
//!
//! Only the history side of messaging lives here; real-time delivery is the
//! relay's problem. The store answers paginated "conversation between A and
//! B" queries in newest-first order.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    error::StoreResult,
    types::{MessageId, UserId},
};

/// One direct message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    /// Record id.
    pub id: MessageId,
    /// Sending account.
    pub sender: UserId,
    /// Receiving account.
    pub receiver: UserId,
    /// Message body.
    pub body: String,
    /// Send timestamp.
    pub created_at: DateTime<Utc>,
}

/// One page of conversation history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationPage {
    /// Messages in this page, newest first.
    pub messages: Vec<DirectMessage>,
    /// Total messages in the conversation, across all pages.
    pub total: u64,
}

/// Persistence operations over direct messages.
#[async_trait]
pub trait DirectMessageStore: Send + Sync {
    /// Appends a message to the conversation history.
    async fn insert(&self, message: DirectMessage) -> StoreResult<()>;

    /// Returns one page of the conversation between two accounts, in either
    /// direction, newest first. `page` is 1-based.
    async fn between(
        &self,
        a: UserId,
        b: UserId,
        page: u64,
        limit: u64,
    ) -> StoreResult<ConversationPage>;
}

/// In-memory [`DirectMessageStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectMessageStore {
    records: Arc<RwLock<Vec<DirectMessage>>>,
}

impl MemoryDirectMessageStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectMessageStore for MemoryDirectMessageStore {
    #[tracing::instrument(skip(self, message), fields(id = %message.id))]
    async fn insert(&self, message: DirectMessage) -> StoreResult<()> {
        self.records.write().push(message);
        Ok(())
    }

    async fn between(
        &self,
        a: UserId,
        b: UserId,
        page: u64,
        limit: u64,
    ) -> StoreResult<ConversationPage> {
        let records = self.records.read();

        let mut matching: Vec<DirectMessage> = records
            .iter()
            .filter(|m| {
                (m.sender == a && m.receiver == b) || (m.sender == b && m.receiver == a)
            })
            .cloned()
            .collect();
        matching.sort_by(|x, y| y.created_at.cmp(&x.created_at));

        let total = matching.len() as u64;
        let start = page.saturating_sub(1).saturating_mul(limit) as usize;
        let messages =
            matching.into_iter().skip(start).take(limit as usize).collect();

        Ok(ConversationPage { messages, total })
    }
}
