//! Content layer for the chirp backend.
//!
//! Builds on `chirp-store` and `chirp-auth` to provide:
//!
//! - tweet creation with hashtag/mention resolution ([`tweet`])
//! - circle-audience gating and guest/user view counting ([`tweet`])
//! - idempotent bookmarking ([`bookmark`])
//! - the messaging connection registry and conversation history ([`messaging`])
//! - object-storage and transcoding seams ([`media`])
//!
//! Authorization decisions reuse the auth crate's claims and gates; this
//! crate never decodes tokens itself.

#![deny(unsafe_code)]

pub mod bookmark;
pub mod error;
pub mod media;
pub mod messages;
pub mod messaging;
pub mod tweet;

pub use bookmark::{BookmarkOutcome, BookmarkService, UnbookmarkOutcome};
pub use error::{Result, SocialError};
pub use media::{
    MediaService, MemoryObjectStorage, ObjectStorage, PassthroughTranscoder, Transcoder,
};
pub use messaging::{
    ConversationService, InMemorySessionRegistry, SessionHandle, SessionRegistry,
};
pub use tweet::{TweetDraft, TweetService};
