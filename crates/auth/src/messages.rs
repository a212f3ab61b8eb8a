//! User-facing message strings.
//!
//! Validation rules, gates, and the session manager all reference this table
//! so responses and tests agree on a single source of truth for wording.

/// Top-level message for an aggregated 422 response.
pub const VALIDATION_ERROR: &str = "Validation error";
/// Generic message for internal failures. Nothing else is leaked.
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

// ── name ─────────────────────────────────────────────────────────
/// Name field missing or blank.
pub const NAME_IS_REQUIRED: &str = "Name is required";
/// Name length out of range.
pub const NAME_LENGTH_MUST_BE_FROM_1_TO_100: &str = "Name length must be from 1 to 100";

// ── email ────────────────────────────────────────────────────────
/// Email field missing or blank.
pub const EMAIL_IS_REQUIRED: &str = "Email is required";
/// Email fails the format check.
pub const EMAIL_IS_INVALID: &str = "Email is invalid";
/// Another account already holds this email.
pub const EMAIL_ALREADY_EXISTS: &str = "Email already exists";
/// Login failed. Deliberately does not say which of the two was wrong.
pub const EMAIL_OR_PASSWORD_IS_INCORRECT: &str = "Email or password is incorrect";

// ── password ─────────────────────────────────────────────────────
/// Password field missing or blank.
pub const PASSWORD_IS_REQUIRED: &str = "Password is required";
/// Password length out of range.
pub const PASSWORD_LENGTH_MUST_BE_FROM_6_TO_50: &str = "Password length must be from 6 to 50";
/// Password fails the strength policy.
pub const PASSWORD_MUST_BE_STRONG: &str =
    "Password must be at least 6 characters long and contain at least 1 lowercase letter, 1 uppercase letter, 1 number and 1 symbol";
/// Confirm password field missing or blank.
pub const CONFIRM_PASSWORD_IS_REQUIRED: &str = "Confirm password is required";
/// Confirm password does not equal the field it confirms.
pub const CONFIRM_PASSWORD_MUST_BE_THE_SAME_AS_PASSWORD: &str =
    "Confirm password must be the same as password";
/// Old password does not match the stored hash.
pub const OLD_PASSWORD_IS_INCORRECT: &str = "Old password is incorrect";

// ── date of birth ────────────────────────────────────────────────
/// Date of birth is not a strict ISO-8601 datetime.
pub const DATE_OF_BIRTH_MUST_BE_ISO8601: &str = "Date of birth must be ISO8601";

// ── tokens ───────────────────────────────────────────────────────
/// Bearer header missing or malformed.
pub const ACCESS_TOKEN_IS_REQUIRED: &str = "Access token is required";
/// Refresh token body field missing or blank.
pub const REFRESH_TOKEN_IS_REQUIRED: &str = "Refresh token is required";
/// Refresh token is signature-valid but not in the store.
pub const USED_REFRESH_TOKEN_OR_NOT_EXIST: &str = "Used refresh token or not exist";
/// Email verify token body field missing or blank.
pub const EMAIL_VERIFY_TOKEN_IS_REQUIRED: &str = "Email verify token is required";
/// Supplied email verify token does not match the stored live value.
pub const EMAIL_VERIFY_TOKEN_IS_INVALID: &str = "Email verify token is invalid";
/// Forgot password token missing.
pub const FORGOT_PASSWORD_TOKEN_IS_REQUIRED: &str = "Forgot password token is required";
/// Supplied forgot password token does not match the stored live value.
pub const FORGOT_PASSWORD_TOKEN_IS_INVALID: &str = "Forgot password token is invalid";

// ── account state ────────────────────────────────────────────────
/// No account matches the supplied id or email.
pub const USER_NOT_FOUND: &str = "User not found";
/// Supplied user id is not parseable.
pub const INVALID_USER_ID: &str = "Invalid user id";
/// Account has not completed email verification.
pub const USER_NOT_VERIFIED: &str = "User not verified";
/// Verification was already completed.
pub const EMAIL_ALREADY_VERIFIED: &str = "Email already verified before";

// ── profile fields ───────────────────────────────────────────────
/// Bio length out of range.
pub const BIO_LENGTH_MUST_BE_FROM_1_TO_200: &str = "Bio length must be from 1 to 200";
/// Location length out of range.
pub const LOCATION_LENGTH_MUST_BE_FROM_1_TO_200: &str = "Location length must be from 1 to 200";
/// Website is not a URL.
pub const WEBSITE_MUST_BE_URL: &str = "Website must be a valid URL";
/// Username fails the handle format rule.
pub const USERNAME_INVALID: &str =
    "Username must be 4 to 15 characters long and contain only letters, numbers and underscores";
/// Another account already holds this username.
pub const USERNAME_EXISTS: &str = "Username already exists";
/// Avatar is not a URL.
pub const AVATAR_MUST_BE_URL: &str = "Avatar must be a valid URL";
/// Cover photo is not a URL.
pub const COVER_PHOTO_MUST_BE_URL: &str = "Cover photo must be a valid URL";

// ── acknowledgements ─────────────────────────────────────────────
/// Register succeeded.
pub const REGISTER_SUCCESSFUL: &str = "Register successful";
/// Login succeeded.
pub const LOGIN_SUCCESSFUL: &str = "Login successful";
/// Logout succeeded.
pub const LOGOUT_SUCCESSFUL: &str = "Logout successful";
/// Refresh token rotation succeeded.
pub const REFRESH_TOKEN_SUCCESSFUL: &str = "Refresh token successful";
/// Email verification succeeded.
pub const VERIFY_EMAIL_SUCCESSFUL: &str = "Verify email successful";
/// A new verification email is on its way.
pub const RESEND_VERIFY_EMAIL_SUCCESSFUL: &str = "Resend verify email successful";
/// A reset email is on its way.
pub const CHECK_EMAIL_TO_RESET_PASSWORD: &str = "Check email to reset password";
/// Reset token is valid and unconsumed.
pub const VERIFY_FORGOT_PASSWORD_TOKEN_SUCCESSFUL: &str = "Verify forgot password token successful";
/// Password reset succeeded.
pub const RESET_PASSWORD_SUCCESSFUL: &str = "Reset password successful";
/// Password change succeeded.
pub const CHANGE_PASSWORD_SUCCESSFUL: &str = "Change password successful";
/// Profile fetch succeeded.
pub const GET_PROFILE_SUCCESSFUL: &str = "Get profile successful";
/// Profile update succeeded.
pub const UPDATE_ME_SUCCESSFUL: &str = "Update me successful";
/// A follow edge was created.
pub const FOLLOW_SUCCESSFUL: &str = "Follow successful";
/// The follow edge already existed.
pub const ALREADY_FOLLOWED: &str = "Already followed";
/// A follow edge was removed.
pub const UNFOLLOW_SUCCESSFUL: &str = "Unfollow successful";
/// The follow edge was already absent.
pub const ALREADY_UNFOLLOWED: &str = "Already unfollowed";
