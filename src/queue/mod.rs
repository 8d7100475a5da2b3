//! # Offline Request Queue
//!
//! Durably holds write requests that could not or should not be sent
//! immediately, and replays them when connectivity returns.
//!
//! ## Features
//!
//! - **Durable**: every mutation is a full read-modify-write of the
//!   persisted collection; nothing lives only in memory
//! - **Bounded**: at most `max_queue_size` entries, enforced at insertion
//! - **Priority-ordered**: one comparator (priority, then age) governs both
//!   overflow eviction and send order
//! - **Retry-aware**: transient failures replay up to `max_retries`, then
//!   the request is terminally failed and dropped
//!
//! Callers read drain outcomes and stats; expected operational failures
//! (storage flake, network down) never surface as errors here.

pub mod store;

use crate::config::NetworkConfig;
use crate::types::{
    HttpMethod, Priority, PriorityCounts, ProcessOutcome, QueueStats, QueuedRequest,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::cmp::Ordering;
use std::collections::HashMap;
use store::QueueStore;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Ordering shared by eviction and send: high priority first, then oldest
/// first. Stable sorts keep insertion order between full ties.
fn queue_order(a: &QueuedRequest, b: &QueuedRequest) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then(a.timestamp.cmp(&b.timestamp))
}

/// How a single send attempt resolved
enum SendResult {
    /// 2xx response; the request leaves the queue
    Delivered,
    /// 5xx or transport failure; eligible for retry under the cap
    Transient(String),
    /// Any other status; the request is dropped and counted failed
    Terminal(String),
}

/// Durable, bounded, priority-ordered queue of pending write requests.
pub struct OfflineQueue {
    store: Box<dyn QueueStore>,
    client: reqwest::Client,
    max_queue_size: usize,
    max_retries: u32,
    /// Serializes every read-modify-write of the persisted collection,
    /// including the whole drain pass. Keeps an enqueue issued mid-drain
    /// from being clobbered by the end-of-pass persist.
    mutation: Mutex<()>,
}

impl OfflineQueue {
    pub fn new(store: Box<dyn QueueStore>, config: &NetworkConfig) -> Self {
        Self {
            store,
            client: reqwest::Client::new(),
            max_queue_size: config.max_queue_size,
            max_retries: config.max_retries,
            mutation: Mutex::new(()),
        }
    }

    /// Park a write request for later delivery. Returns the new id
    /// immediately; no network activity happens here.
    ///
    /// When the queue is full, the existing entries are sorted by
    /// [`queue_order`] and the tail is trimmed to make room, so the
    /// lowest-priority newest entries go first and the result holds
    /// exactly `max_queue_size` entries including the new one.
    pub async fn enqueue(
        &self,
        url: impl Into<String>,
        method: HttpMethod,
        body: Option<serde_json::Value>,
        headers: Option<HashMap<String, String>>,
        priority: Priority,
    ) -> String {
        let timestamp = now_millis();
        let request = QueuedRequest {
            id: fresh_id(timestamp),
            url: url.into(),
            method,
            body: body.map(|value| value.to_string()),
            headers,
            timestamp,
            retry_count: 0,
            priority,
        };
        let id = request.id.clone();

        let _guard = self.mutation.lock().await;
        let mut queue = self.load_or_empty().await;
        if queue.len() >= self.max_queue_size {
            let dropped = queue.len() + 1 - self.max_queue_size;
            queue.sort_by(queue_order);
            queue.truncate(self.max_queue_size.saturating_sub(1));
            tracing::warn!(dropped, "offline queue at capacity, trimmed tail");
        }
        queue.push(request);
        if let Err(err) = self.store.save(&queue).await {
            tracing::error!(error = %err, id = %id, "failed to persist offline queue");
        }
        id
    }

    /// The persisted collection, in stored order. Storage trouble reads as
    /// an empty queue rather than an error.
    pub async fn requests(&self) -> Vec<QueuedRequest> {
        self.load_or_empty().await
    }

    /// Aggregate view over the persisted collection
    pub async fn stats(&self) -> QueueStats {
        let queue = self.load_or_empty().await;
        let mut by_priority = PriorityCounts::default();
        for request in &queue {
            match request.priority {
                Priority::High => by_priority.high += 1,
                Priority::Normal => by_priority.normal += 1,
                Priority::Low => by_priority.low += 1,
            }
        }
        QueueStats {
            total: queue.len(),
            by_priority,
            oldest_timestamp: queue.iter().map(|request| request.timestamp).min(),
        }
    }

    /// Drop a parked request by id. Unknown ids are a no-op.
    pub async fn remove(&self, id: &str) {
        let _guard = self.mutation.lock().await;
        let mut queue = self.load_or_empty().await;
        let before = queue.len();
        queue.retain(|request| request.id != id);
        if queue.len() == before {
            return;
        }
        if let Err(err) = self.store.save(&queue).await {
            tracing::error!(error = %err, id, "failed to persist offline queue");
        }
    }

    /// Wipe the persisted collection
    pub async fn clear(&self) {
        let _guard = self.mutation.lock().await;
        if let Err(err) = self.store.clear().await {
            tracing::error!(error = %err, "failed to clear offline queue");
        }
    }

    /// Replay the queue once: send each entry in [`queue_order`], strictly
    /// sequentially, then persist the survivors in a single write.
    ///
    /// Delivered and terminally failed entries leave the queue; transient
    /// failures under the retry cap stay with `retry_count` bumped and
    /// count toward neither bucket this pass.
    pub async fn drain(&self) -> ProcessOutcome {
        let _guard = self.mutation.lock().await;
        let mut queue = self.load_or_empty().await;
        if queue.is_empty() {
            return ProcessOutcome::default();
        }
        queue.sort_by(queue_order);

        let mut outcome = ProcessOutcome::default();
        let mut kept = Vec::new();
        for mut request in queue {
            match self.send(&request).await {
                SendResult::Delivered => {
                    outcome.success += 1;
                    tracing::info!(id = %request.id, url = %request.url, "queued request delivered");
                }
                SendResult::Transient(reason) => {
                    if request.retry_count < self.max_retries {
                        request.retry_count += 1;
                        tracing::warn!(
                            id = %request.id,
                            attempt = request.retry_count,
                            max = self.max_retries,
                            reason = %reason,
                            "queued request failed, will retry"
                        );
                        kept.push(request);
                    } else {
                        outcome.failed += 1;
                        tracing::error!(
                            id = %request.id,
                            reason = %reason,
                            "queued request dropped after retry cap"
                        );
                    }
                }
                SendResult::Terminal(reason) => {
                    outcome.failed += 1;
                    tracing::error!(id = %request.id, reason = %reason, "queued request rejected");
                }
            }
        }

        if let Err(err) = self.store.save(&kept).await {
            tracing::error!(error = %err, "failed to persist offline queue after drain");
        }
        tracing::info!(
            success = outcome.success,
            failed = outcome.failed,
            remaining = kept.len(),
            "offline queue drain finished"
        );
        outcome
    }

    /// One send attempt. The JSON content type is the default; a header
    /// stored on the request replaces it.
    async fn send(&self, request: &QueuedRequest) -> SendResult {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(custom) = &request.headers {
            for (name, value) in custom {
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => {
                        tracing::warn!(id = %request.id, header = %name, "skipping malformed header");
                    }
                }
            }
        }

        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    SendResult::Delivered
                } else if status.is_server_error() {
                    SendResult::Transient(format!("HTTP {}", status.as_u16()))
                } else {
                    SendResult::Terminal(format!("HTTP {}", status.as_u16()))
                }
            }
            Err(err) => SendResult::Transient(err.to_string()),
        }
    }

    async fn load_or_empty(&self) -> Vec<QueuedRequest> {
        match self.store.load().await {
            Ok(queue) => queue,
            Err(err) => {
                tracing::warn!(error = %err, "offline queue unreadable, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Current time as epoch millis
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `req_<millis>_<random>` — sortable-ish and unique enough for removal
fn fresh_id(timestamp: i64) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("req_{}_{}", timestamp, &random[..9])
}

#[cfg(test)]
mod tests {
    use super::store::MemoryStore;
    use super::*;
    use pretty_assertions::assert_eq;

    fn queue_with(config: NetworkConfig) -> OfflineQueue {
        OfflineQueue::new(Box::new(MemoryStore::new()), &config)
    }

    fn parked(id: &str, priority: Priority, timestamp: i64) -> QueuedRequest {
        QueuedRequest {
            id: id.to_string(),
            url: "https://api.stride.app/v1/events".to_string(),
            method: HttpMethod::Post,
            body: None,
            headers: None,
            timestamp,
            retry_count: 0,
            priority,
        }
    }

    #[tokio::test]
    async fn test_enqueue_round_trip() {
        let queue = queue_with(NetworkConfig::new());
        let id = queue
            .enqueue(
                "https://api.stride.app/v1/profile",
                HttpMethod::Put,
                Some(serde_json::json!({"headline": "Staff Engineer"})),
                Some(HashMap::from([(
                    "Authorization".to_string(),
                    "Bearer t0ken".to_string(),
                )])),
                Priority::High,
            )
            .await;

        let requests = queue.requests().await;
        assert_eq!(requests.len(), 1);
        let stored = &requests[0];
        assert_eq!(stored.id, id);
        assert!(stored.id.starts_with("req_"));
        assert_eq!(stored.url, "https://api.stride.app/v1/profile");
        assert_eq!(stored.method, HttpMethod::Put);
        assert_eq!(
            stored.body.as_deref(),
            Some(r#"{"headline":"Staff Engineer"}"#)
        );
        assert_eq!(stored.priority, Priority::High);
        assert_eq!(stored.retry_count, 0);
        assert_eq!(
            stored.headers.as_ref().unwrap().get("Authorization").unwrap(),
            "Bearer t0ken"
        );
    }

    #[tokio::test]
    async fn test_queue_never_exceeds_bound() {
        let queue = queue_with(NetworkConfig::new());
        let mut last_id = String::new();
        for i in 0..55 {
            last_id = queue
                .enqueue(
                    format!("https://api.stride.app/v1/events/{i}"),
                    HttpMethod::Post,
                    None,
                    None,
                    Priority::Normal,
                )
                .await;
            assert!(queue.requests().await.len() <= 50);
        }

        let requests = queue.requests().await;
        assert_eq!(requests.len(), 50);
        // The just-enqueued request is always retained.
        assert!(requests.iter().any(|r| r.id == last_id));
    }

    #[tokio::test]
    async fn test_eviction_keeps_head_of_priority_age_sort() {
        let config = NetworkConfig::new().with_max_queue_size(4);
        let queue = queue_with(config);
        queue
            .store
            .save(&[
                parked("low_new", Priority::Low, 40),
                parked("high_mid", Priority::High, 30),
                parked("normal_old", Priority::Normal, 10),
                parked("normal_mid", Priority::Normal, 20),
            ])
            .await
            .unwrap();

        let id = queue
            .enqueue(
                "https://api.stride.app/v1/events",
                HttpMethod::Post,
                None,
                None,
                Priority::Low,
            )
            .await;

        // Sorted view was [high_mid, normal_old, normal_mid, low_new];
        // the head survives, low_new is trimmed, the new entry appends.
        let ids: Vec<String> = queue.requests().await.into_iter().map(|r| r.id).collect();
        let expected = vec![
            "high_mid".to_string(),
            "normal_old".to_string(),
            "normal_mid".to_string(),
            id,
        ];
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_stats_counts_and_oldest() {
        let queue = queue_with(NetworkConfig::new());
        queue
            .store
            .save(&[
                parked("a", Priority::High, 1_000),
                parked("b", Priority::Normal, 2_000),
                parked("c", Priority::Low, 3_000),
            ])
            .await
            .unwrap();

        let stats = queue.stats().await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_priority.high, 1);
        assert_eq!(stats.by_priority.normal, 1);
        assert_eq!(stats.by_priority.low, 1);
        assert_eq!(stats.oldest_timestamp, Some(1_000));

        // Aggregation without mutation is idempotent.
        let again = queue.stats().await;
        assert_eq!(again.total, stats.total);
        assert_eq!(again.oldest_timestamp, stats.oldest_timestamp);
    }

    #[tokio::test]
    async fn test_stats_empty_queue() {
        let queue = queue_with(NetworkConfig::new());
        let stats = queue.stats().await;
        assert_eq!(stats.total, 0);
        assert_eq!(stats.oldest_timestamp, None);
    }

    #[tokio::test]
    async fn test_remove_by_id_and_absent_noop() {
        let queue = queue_with(NetworkConfig::new());
        queue
            .store
            .save(&[
                parked("keep", Priority::Normal, 1),
                parked("drop", Priority::Normal, 2),
            ])
            .await
            .unwrap();

        queue.remove("drop").await;
        let ids: Vec<String> = queue.requests().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["keep"]);

        queue.remove("never_existed").await;
        assert_eq!(queue.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_queue() {
        let queue = queue_with(NetworkConfig::new());
        queue
            .enqueue(
                "https://api.stride.app/v1/events",
                HttpMethod::Post,
                None,
                None,
                Priority::Normal,
            )
            .await;
        queue.clear().await;
        assert!(queue.requests().await.is_empty());
        let stats = queue.stats().await;
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn test_send_order_comparator() {
        let mut entries = vec![
            parked("normal_new", Priority::Normal, 300),
            parked("low_old", Priority::Low, 100),
            parked("high_new", Priority::High, 200),
            parked("normal_old", Priority::Normal, 100),
        ];
        entries.sort_by(queue_order);
        let ids: Vec<&str> = entries.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["high_new", "normal_old", "normal_new", "low_old"]);
    }

    #[test]
    fn test_fresh_id_shape() {
        let id = fresh_id(1_700_000_000_000);
        assert!(id.starts_with("req_1700000000000_"));
        assert_eq!(id.len(), "req_1700000000000_".len() + 9);
        assert_ne!(fresh_id(1), fresh_id(1));
    }
}
