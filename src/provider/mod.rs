//! The delivery provider capability.
//!
//! A provider is anything that can attempt to hand a message to a
//! recipient: an HTTP email API, an SMTP relay, a test double. The
//! orchestrator only needs its name and a single send operation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderResult;

/// A delivery provider.
///
/// `send_email` returns `Ok(true)` when the message was accepted,
/// `Ok(false)` when the provider ran but reported non-delivery, and
/// `Err(_)` when the attempt itself failed.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Stable name used in status records and logs.
    fn name(&self) -> &str;

    /// Attempts delivery of one message to one recipient.
    async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> ProviderResult<bool>;
}

/// A message addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    /// Recipient identifier, usually an address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
}

impl OutgoingEmail {
    /// Creates a new message.
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}
