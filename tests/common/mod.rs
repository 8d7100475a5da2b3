//! Shared fixtures for the integration suites.

use std::collections::HashMap;
use stride_net::{HttpMethod, Priority, QueuedRequest};

/// A parked request with explicit ordering fields, for seeding stores.
pub fn parked(id: &str, url: String, priority: Priority, timestamp: i64) -> QueuedRequest {
    QueuedRequest {
        id: id.to_string(),
        url,
        method: HttpMethod::Post,
        body: None,
        headers: None,
        timestamp,
        retry_count: 0,
        priority,
    }
}

/// Same, with a starting retry count.
pub fn parked_with_retries(
    id: &str,
    url: String,
    priority: Priority,
    timestamp: i64,
    retry_count: u32,
) -> QueuedRequest {
    QueuedRequest {
        retry_count,
        ..parked(id, url, priority, timestamp)
    }
}

/// Headers literal helper.
pub fn headers(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}
