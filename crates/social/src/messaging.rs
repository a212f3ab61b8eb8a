//! Messaging support: the connection registry and conversation history.
//!
//! The relay that pushes messages over live connections is an external
//! collaborator. What the core owns is a process-scoped registry mapping an
//! identity to its live connection handle, behind an explicit interface
//! instead of a bare shared map, plus paginated history reads.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use chirp_auth::AuthError;
use chirp_store::{ConversationPage, DirectMessageStore, UserId};

use crate::error::{Result, SocialError};

/// Opaque handle naming one live connection (a socket id, a channel key).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionHandle(pub String);

/// Process-scoped registry of live messaging connections.
///
/// One handle per identity: a reconnect overwrites the previous handle,
/// matching last-writer-wins delivery.
pub trait SessionRegistry: Send + Sync {
    /// Associates an identity with a live connection handle.
    fn register(&self, user: UserId, handle: SessionHandle);

    /// Current handle for an identity, when connected.
    fn lookup(&self, user: UserId) -> Option<SessionHandle>;

    /// Drops an identity's handle. A no-op when not connected.
    fn remove(&self, user: UserId);
}

/// In-memory [`SessionRegistry`].
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionRegistry {
    handles: Arc<RwLock<HashMap<UserId, SessionHandle>>>,
}

impl InMemorySessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRegistry for InMemorySessionRegistry {
    fn register(&self, user: UserId, handle: SessionHandle) {
        self.handles.write().insert(user, handle);
    }

    fn lookup(&self, user: UserId) -> Option<SessionHandle> {
        self.handles.read().get(&user).cloned()
    }

    fn remove(&self, user: UserId) {
        self.handles.write().remove(&user);
    }
}

/// Conversation history reads.
pub struct ConversationService {
    messages: Arc<dyn DirectMessageStore>,
}

impl ConversationService {
    /// Wires the service over the message store.
    #[must_use]
    pub fn new(messages: Arc<dyn DirectMessageStore>) -> Self {
        Self { messages }
    }

    /// One page of the conversation between the authenticated sender and a
    /// receiver named by raw id.
    ///
    /// # Errors
    ///
    /// Returns the user-not-found taxonomy when the receiver id does not
    /// parse.
    pub async fn get_conversation(
        &self,
        sender: UserId,
        receiver: &str,
        page: u64,
        limit: u64,
    ) -> Result<ConversationPage> {
        let receiver =
            UserId::parse(receiver).map_err(|_| SocialError::Auth(AuthError::InvalidUserId))?;
        Ok(self.messages.between(sender, receiver, page.max(1), limit).await?)
    }
}
