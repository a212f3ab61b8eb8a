//! Tweets, hashtags, and bookmarks.
//!
//! Content collections follow the same shape as the identity collection:
//! typed records, one async trait per collection, and an in-memory reference
//! implementation whose mutations each run under a single write guard.
//!
//! The hashtag collection exposes a find-or-create upsert that returns the
//! post-operation record, so concurrent tweets naming the same tag always
//! converge on one id. The tweet collection exposes an atomic view-counter
//! bump that distinguishes authenticated and guest viewers.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    error::{StoreError, StoreResult},
    types::{HashtagId, TweetId, UserId},
};

/// Tweet flavor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TweetKind {
    /// A standalone post.
    Original,
    /// A share of another tweet with no added content.
    Retweet,
    /// A reply to another tweet.
    Comment,
    /// A share of another tweet with added content.
    Quote,
}

impl From<TweetKind> for u8 {
    fn from(kind: TweetKind) -> Self {
        match kind {
            TweetKind::Original => 0,
            TweetKind::Retweet => 1,
            TweetKind::Comment => 2,
            TweetKind::Quote => 3,
        }
    }
}

impl TryFrom<u8> for TweetKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TweetKind::Original),
            1 => Ok(TweetKind::Retweet),
            2 => Ok(TweetKind::Comment),
            3 => Ok(TweetKind::Quote),
            other => Err(format!("unknown tweet kind tag: {other}")),
        }
    }
}

/// Who may see a tweet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TweetAudience {
    /// Visible to anyone, including guests.
    Everyone,
    /// Visible only to the author and the author's circle.
    Circle,
}

impl From<TweetAudience> for u8 {
    fn from(audience: TweetAudience) -> Self {
        match audience {
            TweetAudience::Everyone => 0,
            TweetAudience::Circle => 1,
        }
    }
}

impl TryFrom<u8> for TweetAudience {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TweetAudience::Everyone),
            1 => Ok(TweetAudience::Circle),
            other => Err(format!("unknown audience tag: {other}")),
        }
    }
}

/// Kind of an attached media object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video.
    Video,
}

impl From<MediaKind> for u8 {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => 0,
            MediaKind::Video => 1,
        }
    }
}

impl TryFrom<u8> for MediaKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MediaKind::Image),
            1 => Ok(MediaKind::Video),
            other => Err(format!("unknown media kind tag: {other}")),
        }
    }
}

/// An uploaded media object attached to a tweet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// Public URL of the stored object.
    pub url: String,
    /// Media kind.
    pub kind: MediaKind,
}

/// One tweet record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    /// Record id.
    pub id: TweetId,
    /// Author.
    pub author: UserId,
    /// Tweet flavor.
    pub kind: TweetKind,
    /// Visibility scope.
    pub audience: TweetAudience,
    /// Body text. Empty for retweets.
    pub content: String,
    /// Parent tweet for retweets, comments, and quotes.
    pub parent_id: Option<TweetId>,
    /// Resolved hashtag ids.
    pub hashtags: Vec<HashtagId>,
    /// Mentioned identity ids.
    pub mentions: Vec<UserId>,
    /// Attached media.
    pub media: Vec<Media>,
    /// Views by anonymous clients.
    pub guest_views: u64,
    /// Views by authenticated clients.
    pub user_views: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// One hashtag record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hashtag {
    /// Record id.
    pub id: HashtagId,
    /// Tag text without the leading `#`.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Post-update view counters returned by [`TweetStore::increase_view`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCounts {
    /// Views by anonymous clients.
    pub guest_views: u64,
    /// Views by authenticated clients.
    pub user_views: u64,
}

/// Persistence operations over tweets.
#[async_trait]
pub trait TweetStore: Send + Sync {
    /// Inserts a new tweet.
    async fn insert(&self, tweet: Tweet) -> StoreResult<()>;

    /// Looks up a tweet by id.
    async fn find_by_id(&self, id: TweetId) -> StoreResult<Option<Tweet>>;

    /// Atomically bumps one view counter and returns the post-update
    /// counters. `authenticated` selects which counter is incremented.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the tweet does not exist.
    async fn increase_view(&self, id: TweetId, authenticated: bool) -> StoreResult<ViewCounts>;
}

/// Persistence operations over hashtags.
#[async_trait]
pub trait HashtagStore: Send + Sync {
    /// Finds the hashtag with this name, creating it when absent, and
    /// returns the resulting record. The same name always resolves to the
    /// same id, regardless of how many callers race on first use.
    async fn find_or_create(&self, name: &str) -> StoreResult<Hashtag>;

    /// Looks up a hashtag by name.
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Hashtag>>;
}

/// One bookmark edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Bookmarking account.
    pub user_id: UserId,
    /// Bookmarked tweet.
    pub tweet_id: TweetId,
    /// When the bookmark was created.
    pub created_at: DateTime<Utc>,
}

/// Persistence operations over bookmarks. Same set-membership contract as
/// follows: mutations report whether they changed anything.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Creates the bookmark if absent. Returns `true` when created.
    async fn insert_if_absent(&self, user_id: UserId, tweet_id: TweetId) -> StoreResult<bool>;

    /// Deletes the bookmark if present. Returns `true` when removed.
    async fn remove(&self, user_id: UserId, tweet_id: TweetId) -> StoreResult<bool>;

    /// Reports whether the bookmark exists.
    async fn exists(&self, user_id: UserId, tweet_id: TweetId) -> StoreResult<bool>;
}

/// In-memory [`TweetStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryTweetStore {
    records: Arc<RwLock<HashMap<TweetId, Tweet>>>,
}

impl MemoryTweetStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TweetStore for MemoryTweetStore {
    #[tracing::instrument(skip(self, tweet), fields(id = %tweet.id))]
    async fn insert(&self, tweet: Tweet) -> StoreResult<()> {
        self.records.write().insert(tweet.id, tweet);
        Ok(())
    }

    async fn find_by_id(&self, id: TweetId) -> StoreResult<Option<Tweet>> {
        Ok(self.records.read().get(&id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn increase_view(&self, id: TweetId, authenticated: bool) -> StoreResult<ViewCounts> {
        let mut records = self.records.write();
        let tweet = records.get_mut(&id).ok_or_else(|| StoreError::not_found(id.to_string()))?;

        if authenticated {
            tweet.user_views += 1;
        } else {
            tweet.guest_views += 1;
        }
        tweet.updated_at = Utc::now();

        Ok(ViewCounts { guest_views: tweet.guest_views, user_views: tweet.user_views })
    }
}

/// In-memory [`HashtagStore`] keyed by tag name.
#[derive(Debug, Default, Clone)]
pub struct MemoryHashtagStore {
    records: Arc<RwLock<HashMap<String, Hashtag>>>,
}

impl MemoryHashtagStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HashtagStore for MemoryHashtagStore {
    #[tracing::instrument(skip(self))]
    async fn find_or_create(&self, name: &str) -> StoreResult<Hashtag> {
        let mut records = self.records.write();
        let record = records.entry(name.to_owned()).or_insert_with(|| Hashtag {
            id: HashtagId::new(),
            name: name.to_owned(),
            created_at: Utc::now(),
        });
        Ok(record.clone())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Hashtag>> {
        Ok(self.records.read().get(name).cloned())
    }
}

/// In-memory [`BookmarkStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryBookmarkStore {
    edges: Arc<RwLock<HashMap<(UserId, TweetId), Bookmark>>>,
}

impl MemoryBookmarkStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookmarkStore for MemoryBookmarkStore {
    #[tracing::instrument(skip(self))]
    async fn insert_if_absent(&self, user_id: UserId, tweet_id: TweetId) -> StoreResult<bool> {
        let mut edges = self.edges.write();
        match edges.entry((user_id, tweet_id)) {
            std::collections::hash_map::Entry::Occupied(_) => Ok(false),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(Bookmark { user_id, tweet_id, created_at: Utc::now() });
                Ok(true)
            },
        }
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, user_id: UserId, tweet_id: TweetId) -> StoreResult<bool> {
        Ok(self.edges.write().remove(&(user_id, tweet_id)).is_some())
    }

    async fn exists(&self, user_id: UserId, tweet_id: TweetId) -> StoreResult<bool> {
        Ok(self.edges.read().contains_key(&(user_id, tweet_id)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn make_tweet(author: UserId) -> Tweet {
        let now = Utc::now();
        Tweet {
            id: TweetId::new(),
            author,
            kind: TweetKind::Original,
            audience: TweetAudience::Everyone,
            content: "hello world".into(),
            parent_id: None,
            hashtags: Vec::new(),
            mentions: Vec::new(),
            media: Vec::new(),
            guest_views: 0,
            user_views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_increase_view_selects_counter() {
        let store = MemoryTweetStore::new();
        let tweet = make_tweet(UserId::new());
        let id = tweet.id;
        store.insert(tweet).await.unwrap();

        let counts = store.increase_view(id, false).await.unwrap();
        assert_eq!(counts, ViewCounts { guest_views: 1, user_views: 0 });

        let counts = store.increase_view(id, true).await.unwrap();
        assert_eq!(counts, ViewCounts { guest_views: 1, user_views: 1 });
    }

    #[tokio::test]
    async fn test_increase_view_missing_tweet() {
        let store = MemoryTweetStore::new();

        let result = store.increase_view(TweetId::new(), true).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_hashtag_upsert_converges_on_one_id() {
        let store = MemoryHashtagStore::new();

        let first = store.find_or_create("rustlang").await.unwrap();
        let second = store.find_or_create("rustlang").await.unwrap();
        let other = store.find_or_create("async").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn test_bookmark_round_trip() {
        let store = MemoryBookmarkStore::new();
        let user = UserId::new();
        let tweet = TweetId::new();

        assert!(store.insert_if_absent(user, tweet).await.unwrap());
        assert!(!store.insert_if_absent(user, tweet).await.unwrap());
        assert!(store.exists(user, tweet).await.unwrap());

        assert!(store.remove(user, tweet).await.unwrap());
        assert!(!store.remove(user, tweet).await.unwrap());
    }

    #[test]
    fn test_enum_tags_round_trip() {
        let json = serde_json::to_string(&TweetKind::Quote).unwrap();
        assert_eq!(json, "3");

        let audience: TweetAudience = serde_json::from_str("1").unwrap();
        assert_eq!(audience, TweetAudience::Circle);

        let kind: MediaKind = serde_json::from_str("0").unwrap();
        assert_eq!(kind, MediaKind::Image);
    }
}
