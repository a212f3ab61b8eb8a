//! Bookmarking.
//!
//! Same set-membership contract as following: toggling toward the state you
//! are already in is a status signal, never an error, and never creates a
//! duplicate edge.

use std::sync::Arc;

use chirp_store::{BookmarkStore, TweetId, TweetStore, UserId};

use crate::{
    error::{Result, SocialError},
    messages,
};

/// Outcome of a bookmark request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BookmarkOutcome {
    /// A new edge was created.
    Bookmarked,
    /// The edge already existed; nothing changed.
    AlreadyBookmarked,
}

impl BookmarkOutcome {
    /// User-facing acknowledgement.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            BookmarkOutcome::Bookmarked => messages::BOOKMARK_SUCCESSFUL,
            BookmarkOutcome::AlreadyBookmarked => messages::ALREADY_BOOKMARKED,
        }
    }
}

/// Outcome of an unbookmark request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnbookmarkOutcome {
    /// An edge was removed.
    Unbookmarked,
    /// No edge existed; nothing changed.
    AlreadyUnbookmarked,
}

impl UnbookmarkOutcome {
    /// User-facing acknowledgement.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            UnbookmarkOutcome::Unbookmarked => messages::UNBOOKMARK_SUCCESSFUL,
            UnbookmarkOutcome::AlreadyUnbookmarked => messages::ALREADY_UNBOOKMARKED,
        }
    }
}

/// Bookmark operations.
pub struct BookmarkService {
    bookmarks: Arc<dyn BookmarkStore>,
    tweets: Arc<dyn TweetStore>,
}

impl BookmarkService {
    /// Wires the service from its collaborating stores.
    #[must_use]
    pub fn new(bookmarks: Arc<dyn BookmarkStore>, tweets: Arc<dyn TweetStore>) -> Self {
        Self { bookmarks, tweets }
    }

    /// Bookmarks a tweet for a user.
    ///
    /// # Errors
    ///
    /// - [`SocialError::InvalidTweetId`] when the id does not parse
    /// - [`SocialError::TweetNotFound`] when no tweet holds it
    #[tracing::instrument(skip(self))]
    pub async fn bookmark(&self, user: UserId, tweet_id: &str) -> Result<BookmarkOutcome> {
        let id = self.resolve(tweet_id).await?;
        let created = self.bookmarks.insert_if_absent(user, id).await?;
        Ok(if created { BookmarkOutcome::Bookmarked } else { BookmarkOutcome::AlreadyBookmarked })
    }

    /// Removes a bookmark.
    ///
    /// # Errors
    ///
    /// Same resolution failures as [`bookmark`](Self::bookmark).
    #[tracing::instrument(skip(self))]
    pub async fn unbookmark(&self, user: UserId, tweet_id: &str) -> Result<UnbookmarkOutcome> {
        let id = self.resolve(tweet_id).await?;
        let removed = self.bookmarks.remove(user, id).await?;
        Ok(if removed {
            UnbookmarkOutcome::Unbookmarked
        } else {
            UnbookmarkOutcome::AlreadyUnbookmarked
        })
    }

    async fn resolve(&self, tweet_id: &str) -> Result<TweetId> {
        let id = TweetId::parse(tweet_id).map_err(|_| SocialError::InvalidTweetId)?;
        if self.tweets.find_by_id(id).await?.is_none() {
            return Err(SocialError::TweetNotFound);
        }
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chirp_store::{
        MemoryBookmarkStore, MemoryTweetStore, Tweet, TweetAudience, TweetKind,
    };
    use chrono::Utc;

    use super::*;

    async fn seeded() -> (BookmarkService, TweetId) {
        let tweets = MemoryTweetStore::new();
        let now = Utc::now();
        let tweet = Tweet {
            id: TweetId::new(),
            author: UserId::new(),
            kind: TweetKind::Original,
            audience: TweetAudience::Everyone,
            content: "bookmarkable".into(),
            parent_id: None,
            hashtags: Vec::new(),
            mentions: Vec::new(),
            media: Vec::new(),
            guest_views: 0,
            user_views: 0,
            created_at: now,
            updated_at: now,
        };
        let id = tweet.id;
        tweets.insert(tweet).await.unwrap();
        (BookmarkService::new(Arc::new(MemoryBookmarkStore::new()), Arc::new(tweets)), id)
    }

    #[tokio::test]
    async fn test_bookmark_toggle_outcomes() {
        let (service, tweet) = seeded().await;
        let user = UserId::new();
        let id = tweet.to_string();

        assert_eq!(service.bookmark(user, &id).await.unwrap(), BookmarkOutcome::Bookmarked);
        assert_eq!(
            service.bookmark(user, &id).await.unwrap(),
            BookmarkOutcome::AlreadyBookmarked
        );
        assert_eq!(
            service.unbookmark(user, &id).await.unwrap(),
            UnbookmarkOutcome::Unbookmarked
        );
        assert_eq!(
            service.unbookmark(user, &id).await.unwrap(),
            UnbookmarkOutcome::AlreadyUnbookmarked
        );
    }

    #[tokio::test]
    async fn test_unknown_tweet_rejected() {
        let (service, _) = seeded().await;
        let user = UserId::new();

        assert!(matches!(
            service.bookmark(user, "garbled").await,
            Err(SocialError::InvalidTweetId)
        ));
        assert!(matches!(
            service.bookmark(user, &TweetId::new().to_string()).await,
            Err(SocialError::TweetNotFound)
        ));
    }
}
