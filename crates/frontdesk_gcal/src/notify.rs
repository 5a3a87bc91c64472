// --- File: crates/frontdesk_gcal/src/notify.rs ---
//! Confirmation mail through the tenant's own credential.
//!
//! The booking confirmation must originate from the tenant's identity, not
//! a shared system mailbox, so the sender reuses the same OAuth credential
//! the calendar hub was built from and posts the message to the Gmail send
//! endpoint directly.

use crate::auth::TenantAuth;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as base64_engine, Engine};
use frontdesk_common::services::{BoxFuture, MailSender};
use reqwest::{header, Client};
use thiserror::Error;

const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";
const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// Errors that can occur when sending mail through the Gmail API
#[derive(Error, Debug)]
pub enum MailError {
    /// Error obtaining an access token for the tenant credential
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error during HTTP request to the Gmail API
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the Gmail API
    #[error("Gmail API error: {0}")]
    ApiError(String),
}

/// Mail sender backed by the Gmail API and a tenant authenticator.
pub struct GmailMailSender {
    client: Client,
    auth: TenantAuth,
}

impl GmailMailSender {
    pub fn new(client: Client, auth: TenantAuth) -> Self {
        Self { client, auth }
    }

    /// Gmail wants the whole RFC 2822 message base64url-encoded in `raw`.
    fn raw_message(to: &str, subject: &str, body: &str) -> String {
        let message = format!(
            "To: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
            to, subject, body
        );
        base64_engine.encode(message)
    }
}

impl MailSender for GmailMailSender {
    type Error = MailError;

    fn send_email(&self, to: &str, subject: &str, body: &str) -> BoxFuture<'_, (), Self::Error> {
        let to = to.to_string();
        let subject = subject.to_string();
        let body = body.to_string();

        Box::pin(async move {
            let access_token = self
                .auth
                .token(&[GMAIL_SEND_SCOPE])
                .await
                .map_err(|e| MailError::AuthError(e.to_string()))?;
            let token = access_token
                .token()
                .ok_or_else(|| MailError::AuthError("authenticator returned no token".to_string()))?;

            let response = self
                .client
                .post(GMAIL_SEND_URL)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .json(&serde_json::json!({
                    "raw": Self::raw_message(&to, &subject, &body),
                }))
                .send()
                .await?;

            if !response.status().is_success() {
                let error_text = response.text().await?;
                return Err(MailError::ApiError(error_text));
            }

            Ok(())
        })
    }
}
