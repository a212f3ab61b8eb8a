//! Persistence abstraction for the chirp backend.
//!
//! This crate defines the record types and per-collection store traits the
//! rest of the system is built on, plus in-memory reference implementations
//! for tests and development.
//!
//! # Collections
//!
//! | Collection | Trait | Records |
//! |------------|-------|---------|
//! | identities | [`IdentityStore`] | [`Identity`] |
//! | refresh credentials | [`RefreshTokenStore`] | [`RefreshTokenRecord`] |
//! | follow edges | [`FollowStore`] | [`FollowEdge`] |
//! | tweets / hashtags / bookmarks | [`TweetStore`] / [`HashtagStore`] / [`BookmarkStore`] | [`Tweet`], [`Hashtag`], [`Bookmark`] |
//! | direct messages | [`DirectMessageStore`] | [`DirectMessage`] |
//!
//! # Design
//!
//! Each trait method is one atomic operation scoped to one document. There
//! are no multi-document transactions; cross-record invariants are handled
//! by operation ordering at the call site, which is why deletes are
//! idempotent and state transitions like [`IdentityStore::mark_verified`]
//! fold all their field changes into a single update.
//!
//! # Example
//!
//! ```
//! use chirp_store::{IdentityStore, MemoryIdentityStore, Identity, NewIdentity};
//! use chrono::Utc;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = MemoryIdentityStore::new();
//! let identity = Identity::new(NewIdentity {
//!     name: "Alice Smith".into(),
//!     email: "a@x.com".into(),
//!     password_hash: "$argon2id$...".into(),
//!     date_of_birth: Utc::now(),
//! });
//! let id = identity.id;
//!
//! store.insert(identity).await.unwrap();
//! assert!(store.find_by_id(id).await.unwrap().is_some());
//! # });
//! ```

#![deny(unsafe_code)]

pub mod content;
pub mod error;
pub mod follow;
pub mod identity;
pub mod message;
pub mod refresh;
pub mod types;

pub use content::{
    Bookmark, BookmarkStore, Hashtag, HashtagStore, Media, MediaKind, MemoryBookmarkStore,
    MemoryHashtagStore, MemoryTweetStore, Tweet, TweetAudience, TweetKind, TweetStore, ViewCounts,
};
pub use error::{BoxError, StoreError, StoreResult};
pub use follow::{FollowEdge, FollowStore, MemoryFollowStore};
pub use identity::{
    Identity, IdentityStore, MemoryIdentityStore, NewIdentity, Profile, ProfileChanges,
};
pub use message::{
    ConversationPage, DirectMessage, DirectMessageStore, MemoryDirectMessageStore,
};
pub use refresh::{MemoryRefreshTokenStore, RefreshTokenRecord, RefreshTokenStore};
pub use types::{HashtagId, MessageId, TweetId, UserId, VerifyStatus};
