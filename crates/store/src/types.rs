//! Common types shared across collections.
//!
//! This module defines the id newtypes used to key records and the account
//! verification status carried both on identity records and inside signed
//! token claims.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Macro to define a newtype wrapper around [`Uuid`] with standard trait
/// implementations.
///
/// Each generated type:
/// - Is a transparent wrapper around `Uuid` (zero runtime cost)
/// - Derives `Copy`, `Clone`, `Debug`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Derives `Serialize` and `Deserialize` (transparent)
/// - Provides `new()` (random v4) and `parse()` for client-supplied values
/// - Implements `Display` that outputs the hyphenated form
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parses a client-supplied id string.
            ///
            /// # Errors
            ///
            /// Returns [`StoreError::InvalidId`] when the value is not a
            /// well-formed UUID. Callers surface this as a not-found class
            /// failure rather than echoing parser detail to the client.
            pub fn parse(value: &str) -> Result<Self, StoreError> {
                Uuid::parse_str(value)
                    .map(Self)
                    .map_err(|_| StoreError::invalid_id(value))
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identity record id.
    ///
    /// Wraps a raw `Uuid` so an id from one collection cannot be passed
    /// where another collection's id is expected.
    UserId
);

define_id!(
    /// Tweet record id.
    TweetId
);

define_id!(
    /// Hashtag record id.
    HashtagId
);

define_id!(
    /// Direct message record id.
    MessageId
);

/// Account verification status.
///
/// Serialized as an integer tag. The status only ever advances:
/// `Unverified` moves to `Verified` on successful email verification, and
/// either state can move to `Banned` through an administrative process. No
/// transition leaves `Banned`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum VerifyStatus {
    /// Account created, email not yet confirmed.
    Unverified,
    /// Email confirmed.
    Verified,
    /// Administratively banned; terminal.
    Banned,
}

impl From<VerifyStatus> for u8 {
    fn from(status: VerifyStatus) -> Self {
        match status {
            VerifyStatus::Unverified => 0,
            VerifyStatus::Verified => 1,
            VerifyStatus::Banned => 2,
        }
    }
}

impl TryFrom<u8> for VerifyStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VerifyStatus::Unverified),
            1 => Ok(VerifyStatus::Verified),
            2 => Ok(VerifyStatus::Banned),
            other => Err(format!("unknown verify status tag: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_round_trip() {
        let id = UserId::new();
        let parsed = UserId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_user_id_parse_rejects_garbage() {
        let result = UserId::parse("definitely-not-a-uuid");
        assert!(matches!(result, Err(StoreError::InvalidId { .. })));
    }

    #[test]
    fn test_verify_status_integer_tags() {
        let json = serde_json::to_string(&VerifyStatus::Verified).unwrap();
        assert_eq!(json, "1");

        let status: VerifyStatus = serde_json::from_str("0").unwrap();
        assert_eq!(status, VerifyStatus::Unverified);
    }

    #[test]
    fn test_verify_status_rejects_unknown_tag() {
        let result: Result<VerifyStatus, _> = serde_json::from_str("7");
        assert!(result.is_err());
    }
}
