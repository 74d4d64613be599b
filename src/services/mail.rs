//! Outbound mail. Delivery itself belongs to whatever transport the host
//! provides; the application only needs somewhere to hand messages to.

use anyhow::Result;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Writes each message to the log instead of delivering it.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }

    /// What gets logged for a message. Bodies can carry credentials and are
    /// left out.
    fn envelope(&self, message: &MailMessage) -> String {
        format!(
            "from={} to={} subject={:?} body_len={}",
            self.from,
            message.to,
            message.subject,
            message.body.len()
        )
    }
}

impl Mailer for LogMailer {
    fn send(&self, message: &MailMessage) -> Result<()> {
        tracing::info!("Outgoing mail {}", self.envelope(message));
        Ok(())
    }
}

/// Keeps sent messages in memory.
#[derive(Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<MailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, message: &MailMessage) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mail outbox lock poisoned"))?
            .push(message.clone());
        Ok(())
    }
}
