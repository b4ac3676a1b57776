use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct MailReceipt {
    pub message_id: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport failed: {0}")]
    Transport(String),
}

/// Outbound email. Delivery providers plug in here.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<MailReceipt, MailError>;
}

/// Writes mail to the log instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<MailReceipt, MailError> {
        let message_id = Uuid::new_v4().to_string();
        tracing::info!(to = %email.to, subject = %email.subject, %message_id, "email dispatched");
        tracing::debug!(body = %email.html, "email body");
        Ok(MailReceipt { message_id })
    }
}

/// Keeps every message in memory so callers can inspect what was sent.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Email>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Email> {
        self.sent.lock().await.clone()
    }

    pub async fn last_to(&self, to: &str) -> Option<Email> {
        self.sent.lock().await.iter().rev().find(|e| e.to == to).cloned()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: Email) -> Result<MailReceipt, MailError> {
        self.sent.lock().await.push(email);
        Ok(MailReceipt {
            message_id: Uuid::new_v4().to_string(),
        })
    }
}

pub fn kyc_otp_email(to: &str, name: &str, otp: &str, ttl_minutes: i64) -> Email {
    Email {
        to: to.to_string(),
        subject: "Your KYC verification code".to_string(),
        html: format!(
            "<p>Hi {},</p><p>Your KYC documents were accepted. Enter this code to finish verification:</p>\
             <h2>{}</h2><p>The code expires in {} minutes.</p>",
            name, otp, ttl_minutes
        ),
    }
}
