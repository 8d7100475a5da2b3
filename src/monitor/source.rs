//! # Connectivity Sources
//!
//! The monitor does not talk to any platform API directly; it consumes a
//! [`ConnectivitySource`]. The embedding shell bridges whatever signal the
//! host OS offers (mobile connectivity callbacks, desktop interface events)
//! into a [`ChannelSource`], and hosts with no signal at all can fall back
//! to [`ProbeSource`], which infers state by polling a reachability URL.
//!
//! Tests drive a `ChannelSource` handle to simulate connect/disconnect
//! sequences without a network.

use crate::error::NetworkError;
use crate::types::{ConnectionType, RawConnectivity};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// A feed of raw connectivity state.
///
/// `fetch` is the one-shot read used at startup; `recv` yields pushed
/// state changes until the source is closed.
#[async_trait]
pub trait ConnectivitySource: Send + Sync {
    /// Read the current state once
    async fn fetch(&self) -> Result<RawConnectivity, NetworkError>;

    /// Wait for the next state change. `None` means the source is closed
    /// and no further changes will arrive.
    async fn recv(&self) -> Option<RawConnectivity>;
}

/// Source fed by the embedding platform glue through a [`ConnectivityHandle`].
pub struct ChannelSource {
    current: Arc<RwLock<RawConnectivity>>,
    events: Mutex<mpsc::UnboundedReceiver<RawConnectivity>>,
}

/// Cloneable writer side of a [`ChannelSource`]
#[derive(Clone)]
pub struct ConnectivityHandle {
    current: Arc<RwLock<RawConnectivity>>,
    sender: mpsc::UnboundedSender<RawConnectivity>,
}

impl ChannelSource {
    /// Create a source seeded with `initial`, plus the handle that pushes
    /// subsequent state changes into it.
    pub fn new(initial: RawConnectivity) -> (Self, ConnectivityHandle) {
        let current = Arc::new(RwLock::new(initial));
        let (sender, receiver) = mpsc::unbounded_channel();
        let source = Self {
            current: Arc::clone(&current),
            events: Mutex::new(receiver),
        };
        let handle = ConnectivityHandle { current, sender };
        (source, handle)
    }
}

impl ConnectivityHandle {
    /// Push a new raw state. Updates what `fetch` reports and queues the
    /// change for `recv`.
    pub fn emit(&self, state: RawConnectivity) {
        if let Ok(mut current) = self.current.write() {
            *current = state;
        }
        // A closed receiver just means the monitor is gone; nothing to do.
        let _ = self.sender.send(state);
    }
}

#[async_trait]
impl ConnectivitySource for ChannelSource {
    async fn fetch(&self) -> Result<RawConnectivity, NetworkError> {
        self.current
            .read()
            .map(|state| *state)
            .map_err(|_| NetworkError::transport("connectivity state poisoned"))
    }

    async fn recv(&self) -> Option<RawConnectivity> {
        self.events.lock().await.recv().await
    }
}

/// Default polling cadence for [`ProbeSource`]
const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Source that infers connectivity by polling a reachability URL.
///
/// Any completed HTTP exchange counts as reachable regardless of status
/// code; only a transport failure reads as offline. The medium is always
/// reported as unknown since a probe cannot see the interface.
pub struct ProbeSource {
    client: reqwest::Client,
    url: String,
    interval: Duration,
    last: Mutex<Option<RawConnectivity>>,
}

impl ProbeSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_interval(url, DEFAULT_PROBE_INTERVAL)
    }

    pub fn with_interval(url: impl Into<String>, interval: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            interval,
            last: Mutex::new(None),
        }
    }

    async fn probe(&self) -> RawConnectivity {
        match self.client.head(&self.url).send().await {
            Ok(_) => RawConnectivity {
                is_connected: Some(true),
                connection_type: ConnectionType::Unknown,
                is_internet_reachable: Some(true),
            },
            Err(err) => {
                tracing::debug!(url = %self.url, error = %err, "reachability probe failed");
                RawConnectivity {
                    is_connected: Some(false),
                    connection_type: ConnectionType::Unknown,
                    is_internet_reachable: Some(false),
                }
            }
        }
    }
}

#[async_trait]
impl ConnectivitySource for ProbeSource {
    async fn fetch(&self) -> Result<RawConnectivity, NetworkError> {
        let state = self.probe().await;
        *self.last.lock().await = Some(state);
        Ok(state)
    }

    async fn recv(&self) -> Option<RawConnectivity> {
        loop {
            tokio::time::sleep(self.interval).await;
            let state = self.probe().await;
            let mut last = self.last.lock().await;
            if last.as_ref() != Some(&state) {
                *last = Some(state);
                return Some(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_fetch_reflects_latest_emit() {
        let (source, handle) = ChannelSource::new(RawConnectivity::indeterminate());
        assert_eq!(
            source.fetch().await.unwrap(),
            RawConnectivity::indeterminate()
        );

        handle.emit(RawConnectivity::online(ConnectionType::Wifi));
        assert_eq!(
            source.fetch().await.unwrap(),
            RawConnectivity::online(ConnectionType::Wifi)
        );
    }

    #[tokio::test]
    async fn test_channel_source_delivers_events_in_order() {
        let (source, handle) = ChannelSource::new(RawConnectivity::offline());
        handle.emit(RawConnectivity::online(ConnectionType::Cellular));
        handle.emit(RawConnectivity::offline());

        assert_eq!(
            source.recv().await,
            Some(RawConnectivity::online(ConnectionType::Cellular))
        );
        assert_eq!(source.recv().await, Some(RawConnectivity::offline()));
    }

    #[tokio::test]
    async fn test_channel_source_recv_none_after_handle_drop() {
        let (source, handle) = ChannelSource::new(RawConnectivity::offline());
        drop(handle);
        assert_eq!(source.recv().await, None);
    }

    #[tokio::test]
    async fn test_probe_source_reports_offline_when_unreachable() {
        // Nothing listens on this port.
        let source = ProbeSource::new("http://127.0.0.1:1/health");
        let state = source.fetch().await.unwrap();
        assert_eq!(state.is_connected, Some(false));
        assert_eq!(state.is_internet_reachable, Some(false));
    }
}
