//! Outbound fire-and-forget notifications.

use std::fmt;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default destination host for notifications.
pub const DEFAULT_NOTIFY_HOST: &str = "127.0.0.1";
/// Default destination port for notifications.
pub const DEFAULT_NOTIFY_PORT: u16 = 5000;

/// Sends one-shot text messages over TCP.
///
/// Every message gets its own connection: connect, write everything, close.
/// Delivery is best effort. Nothing is retried or queued and the caller is
/// never told whether the message arrived.
#[derive(Debug, Clone)]
pub struct Notifier {
    host: String,
    port: u16,
}

impl Notifier {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Destination as `host:port`.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Dispatch `message` on a background task and return immediately.
    ///
    /// Failures are logged and dropped. Callers that do not care about
    /// completion simply drop the returned handle.
    pub fn notify(&self, message: impl Into<String>) -> JoinHandle<()> {
        let notifier = self.clone();
        let message = message.into();

        tokio::spawn(async move {
            match notifier.send(&message).await {
                Ok(()) => debug!(dest = %notifier, bytes = message.len(), "notification sent"),
                Err(e) => warn!(dest = %notifier, "failed to send notification: {e}"),
            }
        })
    }

    /// Make a single delivery attempt and report the outcome.
    pub async fn send(&self, message: &str) -> std::io::Result<()> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        stream.write_all(message.as_bytes()).await?;
        stream.shutdown().await
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFY_HOST, DEFAULT_NOTIFY_PORT)
    }
}

impl fmt::Display for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
