//! Outbound email collaborator.
//!
//! Delivery itself is an external concern behind the [`Mailer`] trait; this
//! module owns only the template and the link construction. Dispatch is
//! best-effort: the session manager logs failures and never lets them block
//! the triggering operation's success response.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

/// Error from an email dispatch attempt.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MailError {
    /// The provider rejected or failed the send.
    #[error("email dispatch failed: {0}")]
    Dispatch(String),
}

/// Sends one HTML email. Implemented by the deployment's provider adapter.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends `html_body` to `to` with the given subject.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}

/// Built-in HTML template used for both verification and reset email.
pub const EMAIL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif">
    <h1>{{title}}</h1>
    <p>{{content}}</p>
    <p><a href="{{link}}">{{titleLink}}</a></p>
  </body>
</html>
"#;

/// Substitutes the template placeholders.
#[must_use]
pub fn render_template(title: &str, content: &str, title_link: &str, link: &str) -> String {
    EMAIL_TEMPLATE
        .replace("{{title}}", title)
        .replace("{{content}}", content)
        .replace("{{titleLink}}", title_link)
        .replace("{{link}}", link)
}

/// Body of the account verification email.
#[must_use]
pub fn verify_email_body(client_url: &str, email_verify_token: &str) -> String {
    render_template(
        "Verify your email",
        "Click the link below to verify your email address.",
        "Verify",
        &format!("{client_url}/verify-email?token={email_verify_token}"),
    )
}

/// Body of the password reset email.
#[must_use]
pub fn forgot_password_body(client_url: &str, forgot_password_token: &str) -> String {
    render_template(
        "You are receiving this email because you have requested to reset your password.",
        "Click the link below to reset your password.",
        "Reset password",
        &format!("{client_url}/reset-password?token={forgot_password_token}"),
    )
}

/// One captured outbound email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Rendered HTML body.
    pub html_body: String,
}

/// Test double that records every send instead of delivering it.
#[derive(Clone, Debug, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail_sends: Arc<Mutex<bool>>,
}

impl RecordingMailer {
    /// Creates a mailer that records and succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything captured so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().clone()
    }

    /// Makes every subsequent send fail. The attempt is still recorded.
    pub fn fail_sends(&self, fail: bool) {
        *self.fail_sends.lock() = fail;
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        self.sent.lock().push(SentEmail {
            to: to.to_owned(),
            subject: subject.to_owned(),
            html_body: html_body.to_owned(),
        });
        if *self.fail_sends.lock() {
            return Err(MailError::Dispatch("recording mailer configured to fail".into()));
        }
        Ok(())
    }
}
