//! Stride Networking Core
//!
//! The offline-aware networking layer of the Stride mobile client. The
//! screens above it are thin consumers of a remote HTTP API; this crate is
//! the part that keeps them honest when the network is not there:
//!
//! - **Connectivity monitor** — normalizes the platform connectivity
//!   signal into an online / offline / unknown reading and fans it out to
//!   subscribers synchronously.
//! - **Offline request queue** — a durable, bounded, priority-ordered
//!   queue of pending writes, replayed sequentially with capped retries
//!   whenever connectivity returns.
//! - **Network manager** — the facade tying the two together; constructed
//!   once at app start and handed to consumers by reference.
//!
//! # Module Structure
//!
//! - **`types`** - Connectivity snapshots, queued request records, stats
//! - **`monitor`** - Status tracking, listener fan-out, drain events
//! - **`queue`** - Persistence backends and the drain state machine
//! - **`manager`** - The public facade
//!
//! # Error Handling
//!
//! Expected operational failures never surface as errors: a broken store
//! reads as an empty queue, send failures become drain counts, a failed
//! startup fetch leaves the monitor at indeterminate defaults. The
//! [`NetworkError`] type covers the construction-time surfaces only.

pub mod config;
pub mod error;
pub mod manager;
pub mod monitor;
pub mod queue;
pub mod types;

pub use config::NetworkConfig;
pub use error::NetworkError;
pub use manager::{CheckOutcome, NetworkManager, QueueOptions};
pub use monitor::source::{ChannelSource, ConnectivityHandle, ConnectivitySource, ProbeSource};
pub use monitor::{MonitorEvent, NetworkMonitor, Subscription};
pub use queue::store::{FileStore, MemoryStore, QueueStore};
pub use queue::OfflineQueue;
pub use types::{
    ConnectionStatus, ConnectionType, HttpMethod, NetworkInfo, Priority, PriorityCounts,
    ProcessOutcome, QueueStats, QueuedRequest, RawConnectivity,
};
