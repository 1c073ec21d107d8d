//! Connection-health tracking and auto-reconnect for an [`McpClient`].

use crate::client::McpClient;
use crate::error::McpError;
use reactor_tool::ToolDyn;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

/// Health status of a managed MCP server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionHealth {
    /// Not yet connected.
    Pending = 0,
    /// Connected and serving.
    Connected = 1,
    /// The most recent connection attempt failed.
    Failed = 2,
    /// Explicitly disconnected by the caller.
    Disconnected = 3,
}

impl ConnectionHealth {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionHealth::Connected,
            2 => ConnectionHealth::Failed,
            3 => ConnectionHealth::Disconnected,
            _ => ConnectionHealth::Pending,
        }
    }
}

/// Exponential backoff schedule for reconnect attempts.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
    /// Ceiling on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { initial_delay: Duration::from_millis(1000), multiplier: 2.0, max_delay: Duration::from_secs(30) }
    }
}

/// A connect function invoked on initial connect and every reconnect
/// attempt. Boxed since the concrete future (stdio vs HTTP transport)
/// differs per call site.
pub type Connector = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<McpClient, McpError>> + Send>> + Send + Sync>;

/// Wraps an [`McpClient`] with health tracking and reconnect-with-backoff.
pub struct ManagedMcpClient {
    name: String,
    connector: Connector,
    policy: ReconnectPolicy,
    client: Mutex<Option<McpClient>>,
    health: AtomicU8,
    consecutive_failures: AtomicU32,
}

impl ManagedMcpClient {
    /// Construct a managed connection, not yet connected.
    pub fn new(name: impl Into<String>, connector: Connector, policy: ReconnectPolicy) -> Self {
        Self {
            name: name.into(),
            connector,
            policy,
            client: Mutex::new(None),
            health: AtomicU8::new(ConnectionHealth::Pending as u8),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Current health status.
    pub fn health(&self) -> ConnectionHealth {
        ConnectionHealth::from_u8(self.health.load(Ordering::Relaxed))
    }

    /// Name of the MCP server this connection targets, for logging and
    /// health-transition metric events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connect (or reconnect) now, bypassing the backoff schedule.
    pub async fn connect(&self) -> Result<(), McpError> {
        match (self.connector)().await {
            Ok(client) => {
                *self.client.lock().await = Some(client);
                self.health.store(ConnectionHealth::Connected as u8, Ordering::Relaxed);
                self.consecutive_failures.store(0, Ordering::Relaxed);
                Ok(())
            }
            Err(err) => {
                self.health.store(ConnectionHealth::Failed as u8, Ordering::Relaxed);
                self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    /// Connect, retrying with exponential backoff until it succeeds or
    /// `max_attempts` is exhausted.
    pub async fn connect_with_retry(&self, max_attempts: u32) -> Result<(), McpError> {
        let mut delay = self.policy.initial_delay;
        let mut last_err = None;
        for attempt in 0..max_attempts.max(1) {
            match self.connect().await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(server = %self.name, attempt, error = %err, "mcp connect attempt failed");
                    last_err = Some(err);
                    if attempt + 1 < max_attempts {
                        tokio::time::sleep(delay).await;
                        delay = Duration::from_secs_f64((delay.as_secs_f64() * self.policy.multiplier).min(self.policy.max_delay.as_secs_f64()));
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| McpError::Connection("no attempts made".into())))
    }

    /// Discover tools from the current connection, if connected.
    pub async fn discover_tools(&self) -> Result<Vec<Arc<dyn ToolDyn>>, McpError> {
        let guard = self.client.lock().await;
        match guard.as_ref() {
            Some(client) => client.discover_tools().await,
            None => Err(McpError::Connection(format!("'{}' is not connected", self.name))),
        }
    }

    /// Mark the connection disconnected and drop the underlying client.
    pub async fn disconnect(&self) {
        *self.client.lock().await = None;
        self.health.store(ConnectionHealth::Disconnected as u8, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn failing_connector(attempts: Arc<AtomicUsize>) -> Connector {
        Arc::new(move || {
            let attempts = attempts.clone();
            Box::pin(async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(McpError::Connection("refused".into()))
            })
        })
    }

    #[tokio::test]
    async fn starts_pending() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let managed = ManagedMcpClient::new("srv", failing_connector(attempts), ReconnectPolicy::default());
        assert_eq!(managed.health(), ConnectionHealth::Pending);
    }

    #[tokio::test]
    async fn retries_up_to_max_attempts_then_fails() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = ReconnectPolicy { initial_delay: Duration::from_millis(1), multiplier: 1.0, max_delay: Duration::from_millis(1) };
        let managed = ManagedMcpClient::new("srv", failing_connector(attempts.clone()), policy);
        let result = managed.connect_with_retry(3).await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(managed.health(), ConnectionHealth::Failed);
    }

    #[tokio::test]
    async fn discover_without_connecting_errors() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let managed = ManagedMcpClient::new("srv", failing_connector(attempts), ReconnectPolicy::default());
        let result = managed.discover_tools().await;
        assert!(result.is_err());
    }
}
