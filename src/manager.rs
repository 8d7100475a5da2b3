//! # Network Manager
//!
//! The single entry point the rest of the client talks to. Owns the
//! connectivity monitor and the offline queue, and wires the monitor's
//! typed online event to a queue drain through a separate observer task,
//! keeping the state machine itself free of draining policy.
//!
//! Constructed once at startup and passed by reference to consumers; there
//! is deliberately no module-level global.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stride_net::{ChannelSource, NetworkConfig, NetworkManager, RawConnectivity};
//!
//! # async fn example() -> Result<(), stride_net::NetworkError> {
//! let (source, handle) = ChannelSource::new(RawConnectivity::indeterminate());
//! let manager = NetworkManager::start(NetworkConfig::new(), Arc::new(source))?;
//!
//! // Platform glue pushes connectivity changes through `handle`;
//! // queued writes replay on their own when the device comes online.
//! let sub = manager.subscribe(|info| println!("network: {:?}", info.status));
//! # sub.unsubscribe();
//! # Ok(())
//! # }
//! ```

use crate::config::NetworkConfig;
use crate::error::NetworkError;
use crate::monitor::source::ConnectivitySource;
use crate::monitor::{MonitorEvent, NetworkMonitor, Subscription};
use crate::queue::store::{FileStore, QueueStore};
use crate::queue::OfflineQueue;
use crate::types::{
    HttpMethod, NetworkInfo, Priority, ProcessOutcome, QueueStats, QueuedRequest,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Options for [`NetworkManager::check_network_and_queue`]
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Park the request when offline instead of just reporting the status
    pub queue_if_offline: bool,
    pub priority: Priority,
    pub headers: Option<HashMap<String, String>>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            queue_if_offline: true,
            priority: Priority::Normal,
            headers: None,
        }
    }
}

/// Result of [`NetworkManager::check_network_and_queue`]
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub online: bool,
    /// Set only when the request was parked for later delivery
    pub queued_id: Option<String>,
}

/// Facade over the connectivity monitor and the offline queue.
pub struct NetworkManager {
    monitor: Arc<NetworkMonitor>,
    queue: Arc<OfflineQueue>,
    observer_task: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkManager {
    /// Start a manager persisting through the default file store.
    pub fn start(
        config: NetworkConfig,
        source: Arc<dyn ConnectivitySource>,
    ) -> Result<Arc<Self>, NetworkError> {
        let store = FileStore::open(config.storage_dir.clone())?;
        Ok(Self::with_store(config, source, Box::new(store)))
    }

    /// Start a manager with an explicit storage backend.
    pub fn with_store(
        config: NetworkConfig,
        source: Arc<dyn ConnectivitySource>,
        store: Box<dyn QueueStore>,
    ) -> Arc<Self> {
        let monitor = NetworkMonitor::start(source);
        let queue = Arc::new(OfflineQueue::new(store, &config));
        let manager = Arc::new(Self {
            monitor,
            queue,
            observer_task: Mutex::new(None),
        });

        // The drain observer: reacts to the monitor's online event by
        // kicking off a drain it neither awaits nor retries. Holding only
        // a weak reference lets the manager drop while the task lives.
        if let Some(mut events) = manager.monitor.take_events() {
            let weak = Arc::downgrade(&manager);
            let task = tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    match event {
                        MonitorEvent::OnlineTransition => {
                            let Some(manager) = weak.upgrade() else { break };
                            tokio::spawn(async move {
                                manager.process_queue().await;
                            });
                        }
                    }
                }
            });
            if let Ok(mut slot) = manager.observer_task.lock() {
                *slot = Some(task);
            }
        }

        manager
    }

    /// Current connectivity snapshot
    pub fn status(&self) -> NetworkInfo {
        self.monitor.status()
    }

    /// Whether the device is definitively online
    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// Subscribe to connectivity changes. The listener fires immediately
    /// with the current snapshot, then on every update.
    pub fn subscribe(
        &self,
        listener: impl Fn(&NetworkInfo) + Send + Sync + 'static,
    ) -> Subscription {
        self.monitor.subscribe(listener)
    }

    /// Park a write request for deferred delivery; returns its id.
    pub async fn queue_request(
        &self,
        url: impl Into<String>,
        method: HttpMethod,
        body: Option<serde_json::Value>,
        headers: Option<HashMap<String, String>>,
        priority: Priority,
    ) -> String {
        self.queue.enqueue(url, method, body, headers, priority).await
    }

    /// The queued requests, in stored order
    pub async fn requests(&self) -> Vec<QueuedRequest> {
        self.queue.requests().await
    }

    /// Aggregate queue diagnostics
    pub async fn queue_stats(&self) -> QueueStats {
        self.queue.stats().await
    }

    /// Drop a queued request by id; unknown ids are a no-op
    pub async fn remove_from_queue(&self, id: &str) {
        self.queue.remove(id).await
    }

    /// Wipe the queue
    pub async fn clear_queue(&self) {
        self.queue.clear().await
    }

    /// Replay the queue if currently online. Offline (or unknown) status
    /// short-circuits with zero counts and no network activity.
    pub async fn process_queue(&self) -> ProcessOutcome {
        if !self.is_online() {
            tracing::debug!("skipping queue drain, not online");
            return ProcessOutcome::default();
        }
        self.queue.drain().await
    }

    /// Send-or-queue helper for callers about to issue a write.
    ///
    /// Online: reports `online: true` and does nothing — the caller sends
    /// directly. Offline with `queue_if_offline`: parks the request and
    /// returns its id. Offline otherwise: reports the status with no side
    /// effect.
    pub async fn check_network_and_queue(
        &self,
        url: impl Into<String>,
        method: HttpMethod,
        body: Option<serde_json::Value>,
        options: QueueOptions,
    ) -> CheckOutcome {
        if self.is_online() {
            return CheckOutcome {
                online: true,
                queued_id: None,
            };
        }
        if !options.queue_if_offline {
            return CheckOutcome {
                online: false,
                queued_id: None,
            };
        }
        let id = self
            .queue
            .enqueue(url, method, body, options.headers, options.priority)
            .await;
        CheckOutcome {
            online: false,
            queued_id: Some(id),
        }
    }

    /// Tear down the observer task and the monitor. Idempotent.
    pub fn destroy(&self) {
        if let Ok(mut slot) = self.observer_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
        self.monitor.destroy();
    }
}

impl Drop for NetworkManager {
    fn drop(&mut self) {
        self.destroy();
    }
}
