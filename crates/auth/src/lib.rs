//! Authentication core for the chirp backend.
//!
//! This crate owns the credential lifecycle and the request-validation
//! machinery that gates every mutating route:
//!
//! - **Token codec** ([`codec`]): signs and verifies the four credential kinds over one HS256
//!   deployment secret, with the kind tagged inside the signed claims.
//! - **Session manager** ([`session`]): issuance pairs, refresh rotation, logout invalidation, and
//!   the verification-state transitions.
//! - **Validation pipeline** ([`pipeline`]): declarative per-field rule chains, concurrent across
//!   fields, aggregating recoverable failures into one 422 and short-circuiting on tagged errors.
//! - **Authorization gates** ([`guard`]): bearer extraction, refresh liveness, verified-only and
//!   optional-auth checks.
//! - **Route surface** ([`api`]): one method per endpoint, composing the above.
//!
//! Persistence lives behind the `chirp-store` traits; email delivery behind
//! [`mailer::Mailer`]. Neither is assumed to be anything more than the
//! contract its trait states.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chirp_auth::{AuthApi, AuthConfig, RequestInput, SessionManager};
//! use chirp_auth::mailer::RecordingMailer;
//! use chirp_store::{MemoryFollowStore, MemoryIdentityStore, MemoryRefreshTokenStore};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let api = AuthApi::new(SessionManager::new(
//!     AuthConfig::new("change-me"),
//!     Arc::new(MemoryIdentityStore::new()),
//!     Arc::new(MemoryRefreshTokenStore::new()),
//!     Arc::new(MemoryFollowStore::new()),
//!     Arc::new(RecordingMailer::new()),
//! ));
//!
//! let input = RequestInput::new()
//!     .field("name", "Alice Smith")
//!     .field("email", "a@x.com")
//!     .field("password", "Abcdef1!")
//!     .field("confirm_password", "Abcdef1!")
//!     .field("date_of_birth", "1990-01-01T00:00:00.000Z");
//!
//! let tokens = api.register(&input).await.unwrap();
//! assert!(!tokens.access_token.is_empty());
//! # });
//! ```

#![deny(unsafe_code)]

pub mod api;
pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod guard;
pub mod mailer;
pub mod messages;
pub mod password;
pub mod pipeline;
pub mod session;

pub use api::{Ack, AuthApi};
pub use claims::{TokenClaims, TokenKind};
pub use codec::{CodecError, TokenCodec};
pub use config::AuthConfig;
pub use error::{AuthError, ErrorBody, Result};
pub use pipeline::{Check, Field, Pipeline, PipelineDeps, RequestInput, Validated};
pub use session::{
    FollowOutcome, RegisterRequest, RegisteredTokens, ResendOutcome, SessionManager, TokenPair,
    UnfollowOutcome,
};
