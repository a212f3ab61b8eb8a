//! Tweet creation, audience gating, and view counting.
//!
//! Creation resolves hashtags through the store's find-or-create upsert, so
//! every tag name maps to exactly one id no matter how many tweets race on
//! it. The audience gate decides circle visibility: anonymous viewers are
//! turned away, a missing or banned author makes the tweet unresolvable,
//! and everyone else must be the author or in the author's circle.

use std::sync::Arc;

use futures::future::join_all;

use chirp_auth::{AuthError, TokenClaims};
use chirp_store::{
    HashtagId, HashtagStore, IdentityStore, Media, Tweet, TweetAudience, TweetId, TweetKind,
    TweetStore, UserId, VerifyStatus, ViewCounts,
};
use chrono::Utc;

use crate::{
    error::{Result, SocialError},
    messages,
};

/// Client-supplied tweet payload, before resolution.
#[derive(Clone, Debug)]
pub struct TweetDraft {
    /// Tweet flavor.
    pub kind: TweetKind,
    /// Visibility scope.
    pub audience: TweetAudience,
    /// Raw parent tweet id, where the flavor calls for one.
    pub parent_id: Option<String>,
    /// Body text.
    pub content: String,
    /// Hashtag names without the leading `#`.
    pub hashtags: Vec<String>,
    /// Raw mentioned user ids.
    pub mentions: Vec<String>,
    /// Already-uploaded media attachments.
    pub media: Vec<Media>,
}

/// Tweet operations over the content stores.
pub struct TweetService {
    tweets: Arc<dyn TweetStore>,
    hashtags: Arc<dyn HashtagStore>,
    identities: Arc<dyn IdentityStore>,
}

impl TweetService {
    /// Wires the service from its collaborating stores.
    #[must_use]
    pub fn new(
        tweets: Arc<dyn TweetStore>,
        hashtags: Arc<dyn HashtagStore>,
        identities: Arc<dyn IdentityStore>,
    ) -> Self {
        Self { tweets, hashtags, identities }
    }

    /// Validates a draft and creates the tweet, resolving hashtags and
    /// mentions to record ids.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::Validation`] aggregating per-field draft
    /// violations, or a store error if persistence fails.
    #[tracing::instrument(skip(self, draft), fields(author = %author))]
    pub async fn create(&self, author: UserId, draft: TweetDraft) -> Result<Tweet> {
        let (parent_id, mentions) = validate_draft(&draft)?;
        let hashtags = self.resolve_hashtags(&draft.hashtags).await?;

        let now = Utc::now();
        let tweet = Tweet {
            id: TweetId::new(),
            author,
            kind: draft.kind,
            audience: draft.audience,
            content: draft.content,
            parent_id,
            hashtags,
            mentions,
            media: draft.media,
            guest_views: 0,
            user_views: 0,
            created_at: now,
            updated_at: now,
        };
        self.tweets.insert(tweet.clone()).await?;

        tracing::debug!(tweet = %tweet.id, "tweet created");
        Ok(tweet)
    }

    /// Fetches a tweet, enforcing the audience gate for the viewer.
    ///
    /// # Errors
    ///
    /// - [`SocialError::InvalidTweetId`] / [`SocialError::TweetNotFound`] for unresolvable ids
    /// - the audience gate's failures for circle-scoped tweets
    pub async fn get(&self, tweet_id: &str, viewer: Option<&TokenClaims>) -> Result<Tweet> {
        let id = TweetId::parse(tweet_id).map_err(|_| SocialError::InvalidTweetId)?;
        let tweet =
            self.tweets.find_by_id(id).await?.ok_or(SocialError::TweetNotFound)?;
        self.audience_gate(&tweet, viewer).await?;
        Ok(tweet)
    }

    /// Records a view and returns the post-update counters. Which counter
    /// moves depends on whether the viewer is authenticated, which is why
    /// this endpoint runs behind the optional bearer gate.
    #[tracing::instrument(skip(self, viewer))]
    pub async fn view(
        &self,
        tweet_id: &str,
        viewer: Option<&TokenClaims>,
    ) -> Result<ViewCounts> {
        let tweet = self.get(tweet_id, viewer).await?;
        Ok(self.tweets.increase_view(tweet.id, viewer.is_some()).await?)
    }

    /// Admits or rejects a viewer for one tweet.
    ///
    /// Everyone passes for public tweets. For circle-scoped tweets: an
    /// anonymous viewer gets the 401-class failure, an unresolvable or
    /// banned author makes the tweet read as missing, and any other viewer
    /// must be the author or a circle member.
    pub async fn audience_gate(
        &self,
        tweet: &Tweet,
        viewer: Option<&TokenClaims>,
    ) -> Result<()> {
        if tweet.audience == TweetAudience::Everyone {
            return Ok(());
        }

        let claims = viewer.ok_or(SocialError::Auth(AuthError::AccessTokenRequired))?;
        let author = self
            .identities
            .find_by_id(tweet.author)
            .await?
            .filter(|identity| identity.verify != VerifyStatus::Banned)
            .ok_or(SocialError::TweetNotFound)?;

        if claims.sub == tweet.author || author.circle.contains(&claims.sub) {
            Ok(())
        } else {
            Err(SocialError::AudienceRestricted)
        }
    }

    async fn resolve_hashtags(&self, names: &[String]) -> Result<Vec<HashtagId>> {
        let lookups = names.iter().map(|name| self.hashtags.find_or_create(name.trim()));
        join_all(lookups)
            .await
            .into_iter()
            .map(|result| result.map(|tag| tag.id).map_err(SocialError::from))
            .collect()
    }
}

/// Structural draft rules. Violations aggregate per field, mirroring the
/// request-validation pipeline's 422 contract.
fn validate_draft(draft: &TweetDraft) -> Result<(Option<TweetId>, Vec<UserId>)> {
    let mut errors = std::collections::BTreeMap::new();

    let parent_id = match (draft.kind, &draft.parent_id) {
        (TweetKind::Original, None) => None,
        (TweetKind::Original, Some(_)) => {
            errors.insert("parent_id".to_owned(), messages::PARENT_ID_MUST_BE_NULL.to_owned());
            None
        },
        (_, raw) => match raw.as_deref().map(TweetId::parse) {
            Some(Ok(id)) => Some(id),
            _ => {
                errors.insert(
                    "parent_id".to_owned(),
                    messages::PARENT_ID_MUST_BE_A_VALID_TWEET_ID.to_owned(),
                );
                None
            },
        },
    };

    let carries_anything = !draft.hashtags.is_empty()
        || !draft.mentions.is_empty()
        || !draft.media.is_empty()
        || !draft.content.trim().is_empty();
    match draft.kind {
        TweetKind::Retweet => {
            if !draft.content.is_empty() {
                errors.insert("content".to_owned(), messages::CONTENT_MUST_BE_EMPTY.to_owned());
            }
        },
        _ => {
            if !carries_anything {
                errors
                    .insert("content".to_owned(), messages::CONTENT_MUST_NOT_BE_EMPTY.to_owned());
            }
        },
    }

    let mut mentions = Vec::with_capacity(draft.mentions.len());
    for raw in &draft.mentions {
        match UserId::parse(raw) {
            Ok(id) => mentions.push(id),
            Err(_) => {
                errors.insert(
                    "mentions".to_owned(),
                    messages::MENTIONS_MUST_BE_USER_IDS.to_owned(),
                );
                break;
            },
        }
    }

    if errors.is_empty() {
        Ok((parent_id, mentions))
    } else {
        Err(SocialError::Validation { errors })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chirp_auth::{AuthConfig, TokenCodec, TokenKind};
    use chirp_store::{
        Identity, MemoryHashtagStore, MemoryIdentityStore, MemoryTweetStore, NewIdentity,
    };

    use super::*;

    struct Fixture {
        service: TweetService,
        identities: MemoryIdentityStore,
        hashtags: MemoryHashtagStore,
        codec: TokenCodec,
    }

    fn fixture() -> Fixture {
        let identities = MemoryIdentityStore::new();
        let hashtags = MemoryHashtagStore::new();
        let service = TweetService::new(
            Arc::new(MemoryTweetStore::new()),
            Arc::new(hashtags.clone()),
            Arc::new(identities.clone()),
        );
        Fixture {
            service,
            identities,
            hashtags,
            codec: TokenCodec::new(&AuthConfig::new("tweet-test-secret")),
        }
    }

    async fn seed_user(fx: &Fixture, email: &str) -> Identity {
        let identity = Identity::new(NewIdentity {
            name: "Author".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            date_of_birth: Utc::now(),
        });
        fx.identities.insert(identity.clone()).await.unwrap();
        identity
    }

    fn claims_for(fx: &Fixture, user: UserId) -> TokenClaims {
        let token = fx.codec.sign(TokenKind::Access, user, VerifyStatus::Verified).unwrap();
        fx.codec.verify(&token).unwrap()
    }

    fn draft(content: &str) -> TweetDraft {
        TweetDraft {
            kind: TweetKind::Original,
            audience: TweetAudience::Everyone,
            parent_id: None,
            content: content.into(),
            hashtags: Vec::new(),
            mentions: Vec::new(),
            media: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_resolves_hashtags_to_shared_ids() {
        let fx = fixture();
        let author = seed_user(&fx, "t@x.com").await;

        let mut first = draft("hello");
        first.hashtags = vec!["rustlang".into(), "async".into()];
        let mut second = draft("again");
        second.hashtags = vec!["rustlang".into()];

        let a = fx.service.create(author.id, first).await.unwrap();
        let b = fx.service.create(author.id, second).await.unwrap();

        assert_eq!(a.hashtags.len(), 2);
        assert_eq!(b.hashtags.len(), 1);
        assert_eq!(a.hashtags[0], b.hashtags[0]);
        assert!(fx.hashtags.find_by_name("rustlang").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_draft_rules_aggregate() {
        let fx = fixture();
        let author = seed_user(&fx, "d@x.com").await;

        let mut bad = draft("");
        bad.kind = TweetKind::Comment;
        bad.parent_id = None;
        bad.mentions = vec!["not-an-id".into()];

        let result = fx.service.create(author.id, bad).await;

        let Err(SocialError::Validation { errors }) = result else {
            panic!("expected draft validation failure");
        };
        assert_eq!(
            errors.get("parent_id").map(String::as_str),
            Some(messages::PARENT_ID_MUST_BE_A_VALID_TWEET_ID)
        );
        assert_eq!(
            errors.get("content").map(String::as_str),
            Some(messages::CONTENT_MUST_NOT_BE_EMPTY)
        );
        assert_eq!(
            errors.get("mentions").map(String::as_str),
            Some(messages::MENTIONS_MUST_BE_USER_IDS)
        );
    }

    #[tokio::test]
    async fn test_retweet_must_be_empty_and_original_must_not_have_parent() {
        let fx = fixture();
        let author = seed_user(&fx, "r@x.com").await;

        let mut retweet = draft("added text");
        retweet.kind = TweetKind::Retweet;
        retweet.parent_id = Some(TweetId::new().to_string());
        let result = fx.service.create(author.id, retweet).await;
        let Err(SocialError::Validation { errors }) = result else {
            panic!("expected failure");
        };
        assert_eq!(
            errors.get("content").map(String::as_str),
            Some(messages::CONTENT_MUST_BE_EMPTY)
        );

        let mut with_parent = draft("hello");
        with_parent.parent_id = Some(TweetId::new().to_string());
        let result = fx.service.create(author.id, with_parent).await;
        let Err(SocialError::Validation { errors }) = result else {
            panic!("expected failure");
        };
        assert_eq!(
            errors.get("parent_id").map(String::as_str),
            Some(messages::PARENT_ID_MUST_BE_NULL)
        );
    }

    #[tokio::test]
    async fn test_audience_gate_for_circle_tweets() {
        let fx = fixture();
        let author = seed_user(&fx, "circle@x.com").await;
        let member = seed_user(&fx, "member@x.com").await;
        let outsider = seed_user(&fx, "outsider@x.com").await;
        fx.identities.set_circle(author.id, &[member.id]).await.unwrap();

        let mut scoped = draft("inner thoughts");
        scoped.audience = TweetAudience::Circle;
        let tweet = fx.service.create(author.id, scoped).await.unwrap();
        let id = tweet.id.to_string();

        // Anonymous viewers are rejected outright.
        let result = fx.service.get(&id, None).await;
        assert!(matches!(result, Err(SocialError::Auth(AuthError::AccessTokenRequired))));

        // The author and circle members pass.
        assert!(fx.service.get(&id, Some(&claims_for(&fx, author.id))).await.is_ok());
        assert!(fx.service.get(&id, Some(&claims_for(&fx, member.id))).await.is_ok());

        // Everyone else is restricted.
        let result = fx.service.get(&id, Some(&claims_for(&fx, outsider.id))).await;
        assert!(matches!(result, Err(SocialError::AudienceRestricted)));
    }

    #[tokio::test]
    async fn test_view_counting_behind_the_optional_bearer_gate() {
        let fx = fixture();
        let author = seed_user(&fx, "views@x.com").await;
        let tweet = fx.service.create(author.id, draft("count me")).await.unwrap();
        let id = tweet.id.to_string();

        // No Authorization header: anonymous pass-through, guest counter.
        let viewer = chirp_auth::guard::optional_bearer(&fx.codec, None).unwrap();
        let counts = fx.service.view(&id, viewer.as_ref()).await.unwrap();
        assert_eq!(counts, ViewCounts { guest_views: 1, user_views: 0 });

        // A real bearer header: decoded claims, user counter.
        let token =
            fx.codec.sign(TokenKind::Access, author.id, VerifyStatus::Verified).unwrap();
        let viewer = chirp_auth::guard::optional_bearer(
            &fx.codec,
            Some(&format!("Bearer {token}")),
        )
        .unwrap();
        let counts = fx.service.view(&id, viewer.as_ref()).await.unwrap();
        assert_eq!(counts, ViewCounts { guest_views: 1, user_views: 1 });

        // A present-but-bogus header still fails the gate.
        assert!(chirp_auth::guard::optional_bearer(&fx.codec, Some("Bearer junk")).is_err());
    }

    #[tokio::test]
    async fn test_banned_author_makes_circle_tweet_unresolvable() {
        let fx = fixture();
        let mut banned = Identity::new(NewIdentity {
            name: "Banned Author".into(),
            email: "banned@x.com".into(),
            password_hash: "$argon2id$fake".into(),
            date_of_birth: Utc::now(),
        });
        banned.verify = VerifyStatus::Banned;
        let author_id = banned.id;
        fx.identities.insert(banned).await.unwrap();
        let viewer = seed_user(&fx, "viewer@x.com").await;

        let mut scoped = draft("should vanish");
        scoped.audience = TweetAudience::Circle;
        let tweet = fx.service.create(author_id, scoped).await.unwrap();

        let result = fx
            .service
            .get(&tweet.id.to_string(), Some(&claims_for(&fx, viewer.id)))
            .await;

        assert!(matches!(result, Err(SocialError::TweetNotFound)));
    }

    #[tokio::test]
    async fn test_unresolvable_ids() {
        let fx = fixture();

        assert!(matches!(
            fx.service.get("garbled", None).await,
            Err(SocialError::InvalidTweetId)
        ));
        assert!(matches!(
            fx.service.get(&TweetId::new().to_string(), None).await,
            Err(SocialError::TweetNotFound)
        ));
    }
}
