//! Delivery of full-screen captures to a Discord-compatible webhook.

use chrono::{DateTime, Local};
use image::{ImageFormat, RgbaImage};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::StatusCode;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("No webhook URL provided")]
    NotConfigured,
    #[error("Webhook error: {status}")]
    Rejected { status: u16 },
    #[error("Error sending: {0}")]
    Transport(String),
}

/// Sends a capture plus the triggering value somewhere a human will see it.
pub trait Notifier: Send + Sync {
    fn send(&self, screenshot: &RgbaImage, value: &str) -> Result<(), NotifyError>;
}

/// Builds the message body posted alongside the screenshot.
pub fn format_message(value: &str, at: DateTime<Local>) -> String {
    format!(
        "📸 **Screen Capture**\n🔢 Detected Value: **{}**\n⏰ Time: {}",
        value,
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Posts `content` + `file` multipart forms to a webhook URL.
pub struct DiscordWebhook {
    url: String,
    client: reqwest::blocking::Client,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::blocking::Client::new()
            });
        Self {
            url: url.into().trim().to_string(),
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}

impl Notifier for DiscordWebhook {
    fn send(&self, screenshot: &RgbaImage, value: &str) -> Result<(), NotifyError> {
        if !self.is_configured() {
            return Err(NotifyError::NotConfigured);
        }

        let mut png = Vec::new();
        screenshot
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| NotifyError::Transport(format!("PNG encoding failed: {}", e)))?;
        let png_len = png.len();

        let file = Part::bytes(png)
            .file_name("screenshot.png")
            .mime_str("image/png")
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let form = Form::new()
            .text("content", format_message(value, Local::now()))
            .part("file", file);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                info!("Webhook accepted capture ({} bytes) for value {}", png_len, value);
                Ok(())
            }
            status => Err(NotifyError::Rejected {
                status: status.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_message() {
        let at = Local.with_ymd_and_hms(2026, 3, 14, 9, 5, 7).unwrap();
        assert_eq!(
            format_message("8192", at),
            "📸 **Screen Capture**\n🔢 Detected Value: **8192**\n⏰ Time: 2026-03-14 09:05:07"
        );
    }

    #[test]
    fn test_blank_url_is_not_configured() {
        let webhook = DiscordWebhook::new("   ");
        assert!(!webhook.is_configured());

        let result = webhook.send(&RgbaImage::new(2, 2), "1");
        assert!(matches!(result, Err(NotifyError::NotConfigured)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(NotifyError::NotConfigured.to_string(), "No webhook URL provided");
        assert_eq!(
            NotifyError::Rejected { status: 404 }.to_string(),
            "Webhook error: 404"
        );
        assert_eq!(
            NotifyError::Transport("connection refused".into()).to_string(),
            "Error sending: connection refused"
        );
    }
}
