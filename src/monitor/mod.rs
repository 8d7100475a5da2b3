//! # Connectivity Monitor
//!
//! Maintains one authoritative [`NetworkInfo`] snapshot and notifies
//! observers of every change.
//!
//! ## Features
//!
//! - **Normalized status**: raw platform signals become the tri-state
//!   online / offline / unknown reading
//! - **Synchronous fan-out**: every listener sees every update, and a new
//!   listener is called immediately with the current snapshot
//! - **Typed drain signal**: updates that land online emit
//!   [`MonitorEvent::OnlineTransition`] on a channel; the monitor itself
//!   never touches the queue
//!
//! The monitor stays usable even when the initial state fetch fails — it
//! just keeps reporting indeterminate defaults until the source speaks.

pub mod source;

use crate::types::{NetworkInfo, RawConnectivity};
use source::ConnectivitySource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events emitted by the monitor for out-of-band observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A state update resulted in online status. Offline and unknown
    /// updates never emit.
    OnlineTransition,
}

type Listener = Arc<dyn Fn(&NetworkInfo) + Send + Sync>;

/// Tracks connectivity and fans out snapshots to subscribers.
pub struct NetworkMonitor {
    snapshot: RwLock<NetworkInfo>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    events: mpsc::UnboundedSender<MonitorEvent>,
    event_receiver: Mutex<Option<mpsc::UnboundedReceiver<MonitorEvent>>>,
    source_task: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkMonitor {
    /// Start monitoring the given source.
    ///
    /// One explicit fetch seeds the snapshot, then pushed changes are
    /// applied as they arrive. Both happen on a background task, so there
    /// is a brief window where [`status`](Self::status) still reports
    /// indeterminate defaults. A failed fetch is absorbed: the monitor
    /// stays usable at those defaults.
    pub fn start(source: Arc<dyn ConnectivitySource>) -> Arc<Self> {
        let (events, event_receiver) = mpsc::unbounded_channel();
        let monitor = Arc::new(Self {
            snapshot: RwLock::new(NetworkInfo::disconnected_defaults()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            events,
            event_receiver: Mutex::new(Some(event_receiver)),
            source_task: Mutex::new(None),
        });

        let task_monitor = Arc::clone(&monitor);
        let task = tokio::spawn(async move {
            match source.fetch().await {
                Ok(raw) => task_monitor.apply(raw),
                Err(err) => {
                    tracing::warn!(error = %err, "initial connectivity fetch failed");
                }
            }
            while let Some(raw) = source.recv().await {
                task_monitor.apply(raw);
            }
        });
        if let Ok(mut slot) = monitor.source_task.lock() {
            *slot = Some(task);
        }

        monitor
    }

    /// Current snapshot. Never blocks on IO, never fails.
    pub fn status(&self) -> NetworkInfo {
        self.snapshot
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| NetworkInfo::disconnected_defaults())
    }

    /// Whether the current status is definitively online
    pub fn is_online(&self) -> bool {
        self.status().is_online()
    }

    /// Register a listener.
    ///
    /// The listener is invoked synchronously once with the current
    /// snapshot, then once per subsequent update until unsubscribed.
    /// Listeners are independent: removing one never affects the others.
    pub fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&NetworkInfo) + Send + Sync + 'static,
    ) -> Subscription {
        let listener: Listener = Arc::new(listener);
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::clone(&listener)));
        }

        let current = self.status();
        listener(&current);

        Subscription {
            id,
            monitor: Arc::downgrade(self),
        }
    }

    /// Hand over the event channel. The first caller gets it; the monitor
    /// keeps emitting whether or not anyone listens.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<MonitorEvent>> {
        self.event_receiver.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Stop consuming the source and drop all listeners. Safe to call
    /// repeatedly, or on a monitor that never finished starting.
    pub fn destroy(&self) {
        if let Ok(mut slot) = self.source_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.clear();
        }
    }

    /// Apply a raw signal: recompute the snapshot, fan out, and emit the
    /// drain event when the result is online.
    fn apply(&self, raw: RawConnectivity) {
        let info = NetworkInfo::from_signal(&raw);
        tracing::debug!(
            status = ?info.status,
            connection_type = ?info.connection_type,
            reachable = ?info.is_internet_reachable,
            "connectivity update"
        );

        if let Ok(mut snapshot) = self.snapshot.write() {
            *snapshot = info.clone();
        }

        // Snapshot the listener list, then invoke outside the lock so a
        // listener may subscribe or unsubscribe without deadlocking.
        let current: Vec<Listener> = self
            .listeners
            .lock()
            .map(|listeners| listeners.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        for listener in current {
            listener(&info);
        }

        if info.is_online() {
            let _ = self.events.send(MonitorEvent::OnlineTransition);
        }
    }

    fn remove_listener(&self, id: u64) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.retain(|(listener_id, _)| *listener_id != id);
        }
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Handle to a registered listener
#[must_use = "dropping a Subscription without unsubscribing leaves the listener registered"]
pub struct Subscription {
    id: u64,
    monitor: Weak<NetworkMonitor>,
}

impl Subscription {
    /// Remove the listener. A subscription whose monitor is already gone
    /// unsubscribes trivially.
    pub fn unsubscribe(self) {
        if let Some(monitor) = self.monitor.upgrade() {
            monitor.remove_listener(self.id);
        }
    }
}
