//! User-facing message strings for the content layer.

/// Top-level message for an aggregated 422 response.
pub const VALIDATION_ERROR: &str = "Validation error";
/// Generic message for internal failures.
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// No tweet matches the supplied id.
pub const TWEET_NOT_FOUND: &str = "Tweet not found";
/// Supplied tweet id does not parse.
pub const INVALID_TWEET_ID: &str = "Invalid tweet id";
/// The tweet is scoped to the author's circle.
pub const TWEET_IS_NOT_PUBLIC: &str = "Tweet is not public";

/// Tweet kind tag out of range.
pub const INVALID_TYPE: &str = "Invalid type";
/// Audience tag out of range.
pub const INVALID_AUDIENCE: &str = "Invalid audience";
/// Retweets, comments, and quotes need a valid parent id.
pub const PARENT_ID_MUST_BE_A_VALID_TWEET_ID: &str = "Parent id must be a valid tweet id";
/// Standalone tweets must not carry a parent id.
pub const PARENT_ID_MUST_BE_NULL: &str = "Parent id must be null";
/// Non-retweets need content unless hashtags, mentions, or media carry it.
pub const CONTENT_MUST_NOT_BE_EMPTY: &str = "Content must not be empty";
/// Retweets carry no content of their own.
pub const CONTENT_MUST_BE_EMPTY: &str = "Content must be empty";
/// Every mention must be a parseable user id.
pub const MENTIONS_MUST_BE_USER_IDS: &str = "Mentions must be an array of user ids";

/// A bookmark edge was created.
pub const BOOKMARK_SUCCESSFUL: &str = "Bookmark tweet successful";
/// The bookmark edge already existed.
pub const ALREADY_BOOKMARKED: &str = "Tweet already bookmarked";
/// A bookmark edge was removed.
pub const UNBOOKMARK_SUCCESSFUL: &str = "Unbookmark tweet successful";
/// The bookmark edge was already absent.
pub const ALREADY_UNBOOKMARKED: &str = "Tweet already unbookmarked";
