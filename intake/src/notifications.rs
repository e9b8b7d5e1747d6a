//! Operator notifications for new submissions.
//!
//! Notifications are fire-and-forget: [`dispatch`] spawns the send on the runtime and the
//! request that triggered it never waits for, or fails because of, the outcome. Delivery
//! problems are logged and otherwise dropped.

pub mod messages;
pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;

pub use telegram::TelegramNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport failure, including timeouts
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream API answered with a non-success status
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

/// Delivers a preformatted (HTML) message to the operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `text`. Returns `Ok(())` without sending when notifications are not configured.
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Send `text` in the background and log the outcome.
pub fn dispatch(notifier: Arc<dyn Notifier>, text: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        match notifier.notify(&text).await {
            Ok(()) => tracing::info!("Notification dispatched"),
            Err(e) => tracing::warn!(error = %e, "Failed to deliver notification"),
        }
    })
}

#[cfg(test)]
pub use mock::MockNotifier;
