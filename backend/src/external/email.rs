//! Transactional email client
//!
//! Sends account and inventory notification emails through an HTTP email
//! API. Delivery is best effort: every send returns a bool and failures are
//! logged, never surfaced to the caller as errors.

use reqwest::Client;
use serde_json::json;

use crate::models::ExpiringItemEntry;

/// Client for a transactional email HTTP API
#[derive(Clone)]
pub struct EmailClient {
    api_endpoint: String,
    api_key: String,
    sender: String,
    app_url: String,
    http_client: Client,
}

impl EmailClient {
    /// Create a new email client. An empty endpoint disables sending.
    pub fn new(api_endpoint: String, api_key: String, sender: String, app_url: String) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_endpoint,
            api_key,
            sender,
            app_url,
            http_client,
        }
    }

    /// Invite someone without an account to join an inventory
    pub async fn send_invite_email(&self, to: &str, inventory_name: &str) -> bool {
        let subject = format!("You've been invited to join {}", inventory_name);
        let body = format!(
            "<p>You've been invited to join the shared inventory <strong>{}</strong>.</p>\
             <p><a href=\"{}/register\">Create an account</a> to accept the invitation.</p>",
            inventory_name, self.app_url
        );
        self.send(to, &subject, &body).await
    }

    /// Notify an existing user they were added to an inventory
    pub async fn send_added_email(&self, to: &str, inventory_name: &str) -> bool {
        let subject = format!("You've been added to {}", inventory_name);
        let body = format!(
            "<p>You now have access to the shared inventory <strong>{}</strong>.</p>\
             <p><a href=\"{}\">Open the app</a> to take a look.</p>",
            inventory_name, self.app_url
        );
        self.send(to, &subject, &body).await
    }

    /// Send a password reset link
    pub async fn send_password_reset_email(&self, to: &str, reset_token: &str) -> bool {
        let subject = "Reset your password".to_string();
        let body = format!(
            "<p>A password reset was requested for your account.</p>\
             <p><a href=\"{}/reset-password?token={}\">Reset your password</a>. \
             The link expires shortly. If you didn't request this, ignore this email.</p>",
            self.app_url, reset_token
        );
        self.send(to, &subject, &body).await
    }

    /// Send a digest of lots expiring soon
    pub async fn send_expiration_digest(&self, to: &str, entries: &[ExpiringItemEntry]) -> bool {
        if entries.is_empty() {
            return false;
        }

        let mut rows = String::new();
        for entry in entries {
            rows.push_str(&format!(
                "<li>{} ({}x) expires in {} day{}</li>",
                entry.name,
                entry.lot_quantity,
                entry.days_until_expiry,
                if entry.days_until_expiry == 1 { "" } else { "s" }
            ));
        }

        let subject = format!("{} items expiring soon", entries.len());
        let body = format!(
            "<p>The following items are expiring soon:</p><ul>{}</ul>\
             <p><a href=\"{}\">Open the app</a> to use them up first.</p>",
            rows, self.app_url
        );
        self.send(to, &subject, &body).await
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> bool {
        if self.api_endpoint.is_empty() {
            tracing::debug!("Email sending disabled, skipping '{}' to {}", subject, to);
            return false;
        }

        let result = self
            .http_client
            .post(&self.api_endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "from": self.sender,
                "to": to,
                "subject": subject,
                "html": html_body,
            }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Sent email '{}' to {}", subject, to);
                true
            }
            Ok(response) => {
                tracing::warn!(
                    "Email API rejected '{}' to {}: {}",
                    subject,
                    to,
                    response.status()
                );
                false
            }
            Err(e) => {
                tracing::warn!("Email send failed for {}: {}", to, e);
                false
            }
        }
    }
}
