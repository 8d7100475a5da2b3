//! # Core Types
//!
//! Value types shared by the connectivity monitor and the offline queue:
//! the normalized connectivity snapshot, the persisted request record, and
//! the aggregate shapes surfaced to callers.
//!
//! ## Persisted layout
//!
//! `QueuedRequest` serializes with camelCase keys. The on-disk queue layout
//! predates this crate and records written by earlier client builds must
//! stay readable, so field renames here are not free.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized tri-state connectivity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// The underlying signal reports connected
    Online,
    /// The underlying signal reports disconnected
    Offline,
    /// The underlying signal is indeterminate
    Unknown,
}

/// Connectivity medium reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Ethernet,
    /// No transport at all
    None,
    /// The platform did not say
    Unknown,
}

/// The raw connectivity signal as delivered by the platform.
///
/// `is_connected` is tri-state on purpose: `None` means the signal itself
/// was indeterminate, which is distinct from a definite disconnect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawConnectivity {
    /// Whether a network transport is up, if known
    pub is_connected: Option<bool>,
    /// Transport medium
    pub connection_type: ConnectionType,
    /// Whether the internet is actually reachable over that transport.
    /// A device can sit on a LAN with no egress, so this is separate from
    /// `is_connected` and may be unknown.
    pub is_internet_reachable: Option<bool>,
}

impl RawConnectivity {
    /// A signal with nothing known about it
    pub fn indeterminate() -> Self {
        Self {
            is_connected: None,
            connection_type: ConnectionType::Unknown,
            is_internet_reachable: None,
        }
    }

    /// A definite online signal over the given medium
    pub fn online(connection_type: ConnectionType) -> Self {
        Self {
            is_connected: Some(true),
            connection_type,
            is_internet_reachable: Some(true),
        }
    }

    /// A definite offline signal
    pub fn offline() -> Self {
        Self {
            is_connected: Some(false),
            connection_type: ConnectionType::None,
            is_internet_reachable: Some(false),
        }
    }
}

/// Current connectivity snapshot, recomputed on every signal change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// Normalized status derived from the raw signal
    pub status: ConnectionStatus,
    /// Transport medium
    pub connection_type: ConnectionType,
    /// `false` whenever the raw signal is absent or indeterminate
    pub is_connected: bool,
    /// Internet reachability, when the platform can tell
    pub is_internet_reachable: Option<bool>,
}

impl NetworkInfo {
    /// Derive a snapshot from the raw signal.
    ///
    /// Status maps strictly: `Some(true)` is online, `Some(false)` is
    /// offline, `None` is unknown. Nothing else promotes to online.
    pub fn from_signal(signal: &RawConnectivity) -> Self {
        let status = match signal.is_connected {
            Some(true) => ConnectionStatus::Online,
            Some(false) => ConnectionStatus::Offline,
            None => ConnectionStatus::Unknown,
        };
        Self {
            status,
            connection_type: signal.connection_type,
            is_connected: signal.is_connected.unwrap_or(false),
            is_internet_reachable: signal.is_internet_reachable,
        }
    }

    /// The startup snapshot, before the first signal fetch resolves
    pub fn disconnected_defaults() -> Self {
        Self {
            status: ConnectionStatus::Unknown,
            connection_type: ConnectionType::Unknown,
            is_connected: false,
            is_internet_reachable: None,
        }
    }

    /// Whether the status is definitively online
    pub fn is_online(&self) -> bool {
        self.status == ConnectionStatus::Online
    }
}

/// HTTP method of a queued write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a queued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Sent first, evicted last
    High,
    #[default]
    Normal,
    /// First in line when the queue overflows
    Low,
}

impl Priority {
    /// Sort rank: high sorts before normal before low
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
        }
    }
}

/// A write request parked in the offline queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    /// Unique id (`req_<millis>_<random>`), assigned at enqueue time
    pub id: String,
    pub url: String,
    pub method: HttpMethod,
    /// Pre-serialized JSON body, when the request has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Enqueue time, epoch millis. Orders same-priority requests and
    /// feeds the age diagnostics.
    pub timestamp: i64,
    /// Replay attempts so far. Never persisted above the retry cap.
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub priority: Priority,
}

/// Per-priority breakdown of queue contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub normal: usize,
    pub low: usize,
}

/// Aggregate view of the queue, for status surfaces and diagnostics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Total queued requests
    pub total: usize,
    pub by_priority: PriorityCounts,
    /// Enqueue time of the oldest entry, or `None` when empty
    pub oldest_timestamp: Option<i64>,
}

impl QueueStats {
    /// Age of the oldest queued request relative to `now` (epoch millis)
    pub fn age_of_oldest(&self, now: i64) -> Option<i64> {
        self.oldest_timestamp.map(|ts| now - ts)
    }
}

/// Result of one drain pass over the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    /// Requests delivered and dropped from the queue
    pub success: usize,
    /// Requests terminally failed and dropped from the queue
    pub failed: usize,
}
