// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background connection management for the gateway link.
//!
//! The manager connects with exponential backoff, hands the transport to the
//! [`GatewayClient`] (which flips connectivity online and so fires the
//! auto-sync drivers), then watches the link with heartbeats and reconnects
//! when it drops.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::RemoteConfig;

use super::client::GatewayClient;
use super::transport::Transport;

/// Configuration for the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub url: String,
    /// Maximum attempts per round (0 = unlimited).
    pub max_retries: u32,
    /// Maximum delay between attempts (seconds). Also the pause between rounds.
    pub max_delay_secs: u64,
    /// Initial delay for exponential backoff (milliseconds).
    pub initial_delay_ms: u64,
    /// Keepalive period (milliseconds). 0 disables heartbeats.
    pub heartbeat_interval_ms: u64,
}

impl From<&RemoteConfig> for ConnectionConfig {
    fn from(remote: &RemoteConfig) -> Self {
        ConnectionConfig {
            url: remote.url.clone(),
            max_retries: remote.reconnect_max_retries,
            max_delay_secs: remote.reconnect_max_delay_secs,
            initial_delay_ms: remote.reconnect_initial_delay_ms,
            heartbeat_interval_ms: remote.heartbeat_interval_ms,
        }
    }
}

/// Result of one round of connection attempts.
pub enum ConnectOutcome<T> {
    Connected(T),
    Failed { attempts: u32, error: String },
    Cancelled,
}

impl<T> std::fmt::Debug for ConnectOutcome<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(_) => f.debug_tuple("Connected").field(&"<transport>").finish(),
            Self::Failed { attempts, error } => f
                .debug_struct("Failed")
                .field("attempts", attempts)
                .field("error", error)
                .finish(),
            Self::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Owns the reconnect task for one gateway client.
pub struct ConnectionManager<T, F> {
    config: ConnectionConfig,
    client: Arc<GatewayClient<T>>,
    make_transport: Arc<F>,
    cancel_token: CancellationToken,
}

impl<T, F> ConnectionManager<T, F>
where
    T: Transport + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    pub fn new(config: ConnectionConfig, client: Arc<GatewayClient<T>>, make_transport: F) -> Self {
        ConnectionManager {
            config,
            client,
            make_transport: Arc::new(make_transport),
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn client(&self) -> &Arc<GatewayClient<T>> {
        &self.client
    }

    /// Run one round of attempts in the foreground and install the link.
    pub async fn connect_once(&self) -> ConnectOutcome<()> {
        match connect_with_retry(&self.config, &*self.make_transport, &self.cancel_token).await {
            ConnectOutcome::Connected(transport) => {
                self.client.install(transport).await;
                ConnectOutcome::Connected(())
            }
            ConnectOutcome::Failed { attempts, error } => ConnectOutcome::Failed { attempts, error },
            ConnectOutcome::Cancelled => ConnectOutcome::Cancelled,
        }
    }

    /// Keep the link up in the background until cancelled.
    pub fn spawn(&self) -> JoinHandle<()> {
        let config = self.config.clone();
        let client = Arc::clone(&self.client);
        let make_transport = Arc::clone(&self.make_transport);
        let cancel_token = self.cancel_token.clone();

        tokio::spawn(async move {
            supervise(config, client, make_transport, cancel_token).await;
        })
    }

    /// Stop reconnecting and drop the link.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

async fn supervise<T, F>(
    config: ConnectionConfig,
    client: Arc<GatewayClient<T>>,
    make_transport: Arc<F>,
    cancel_token: CancellationToken,
) where
    T: Transport,
    F: Fn() -> T,
{
    loop {
        match connect_with_retry(&config, &*make_transport, &cancel_token).await {
            ConnectOutcome::Cancelled => break,
            ConnectOutcome::Failed { attempts, error } => {
                tracing::warn!(url = %config.url, attempts, %error, "gateway unreachable");
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(config.max_delay_secs)) => {}
                }
            }
            ConnectOutcome::Connected(transport) => {
                tracing::info!(url = %config.url, "gateway connected");
                client.install(transport).await;
                if !watch_link(&config, &client, &cancel_token).await {
                    break;
                }
                tracing::info!(url = %config.url, "gateway link lost, reconnecting");
            }
        }
    }
    client.close().await;
}

/// Wait until the link drops (true) or the manager is cancelled (false).
async fn watch_link<T: Transport>(
    config: &ConnectionConfig,
    client: &GatewayClient<T>,
    cancel_token: &CancellationToken,
) -> bool {
    let mut online_rx = client.connectivity().subscribe();
    if !*online_rx.borrow_and_update() {
        return true;
    }

    let heartbeat = config.heartbeat_interval_ms > 0;
    let period = Duration::from_millis(config.heartbeat_interval_ms.max(1));
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => return false,
            changed = online_rx.changed() => {
                if changed.is_err() {
                    return false;
                }
                if !*online_rx.borrow_and_update() {
                    return true;
                }
            }
            _ = ticker.tick(), if heartbeat => {
                if let Err(e) = client.ping().await {
                    tracing::warn!(error = %e, "gateway heartbeat failed");
                    client.close().await;
                    return true;
                }
            }
        }
    }
}

/// One round of connection attempts with exponential backoff.
pub async fn connect_with_retry<T, F>(
    config: &ConnectionConfig,
    make_transport: &F,
    cancel_token: &CancellationToken,
) -> ConnectOutcome<T>
where
    T: Transport,
    F: Fn() -> T + ?Sized,
{
    let mut attempt = 0u32;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        if cancel_token.is_cancelled() {
            return ConnectOutcome::Cancelled;
        }
        attempt = attempt.saturating_add(1);

        // Fresh transport per attempt
        let mut transport = make_transport();
        let result = tokio::select! {
            _ = cancel_token.cancelled() => return ConnectOutcome::Cancelled,
            result = transport.connect(&config.url) => result,
        };

        match result {
            Ok(()) => return ConnectOutcome::Connected(transport),
            Err(e) => {
                tracing::debug!(url = %config.url, attempt, error = %e, "gateway connect failed");
                if config.max_retries > 0 && attempt >= config.max_retries {
                    return ConnectOutcome::Failed {
                        attempts: attempt,
                        error: e.to_string(),
                    };
                }
                tokio::select! {
                    _ = cancel_token.cancelled() => return ConnectOutcome::Cancelled,
                    _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                }
                delay_ms = std::cmp::min(
                    delay_ms.saturating_mul(2),
                    config.max_delay_secs.saturating_mul(1000),
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
