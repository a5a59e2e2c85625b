//! Bounded per-service probe history.
//!
//! Each service keeps at most `capacity` results, oldest first. The history
//! and the latest-result snapshot live behind one lock, so an append, its
//! eviction and the snapshot update are observed together.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::monitoring::ProbeResult;
use crate::registry::ServiceId;

#[derive(Default)]
struct HistoryState {
    entries: HashMap<ServiceId, VecDeque<ProbeResult>>,
    latest: HashMap<ServiceId, ProbeResult>,
}

/// Store of recent probe results per service
pub struct HistoryStore {
    capacity: usize,
    state: RwLock<HistoryState>,
}

impl HistoryStore {
    /// Create a store keeping at most `capacity` results per service
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), state: RwLock::new(HistoryState::default()) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a result, evicting the oldest entry once the cap is reached
    pub async fn append(&self, result: ProbeResult) {
        let service_id = result.service_id;
        let mut state = self.state.write().await;

        let entries = state
            .entries
            .entry(service_id)
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(result.clone());

        state.latest.insert(service_id, result);
    }

    /// Full history of a service, oldest first
    pub async fn all(&self, service_id: ServiceId) -> Vec<ProbeResult> {
        self.state
            .read()
            .await
            .entries
            .get(&service_id)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The `count` most recent results, oldest first
    pub async fn recent(&self, service_id: ServiceId, count: usize) -> Vec<ProbeResult> {
        let state = self.state.read().await;
        let Some(entries) = state.entries.get(&service_id) else {
            return Vec::new();
        };

        let skip = entries.len().saturating_sub(count);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Most recent result of a service
    pub async fn latest(&self, service_id: ServiceId) -> Option<ProbeResult> {
        self.state.read().await.latest.get(&service_id).cloned()
    }

    /// (successes, total) among results completed at or after `since`
    pub async fn counts_since(&self, service_id: ServiceId, since: DateTime<Utc>) -> (usize, usize) {
        let state = self.state.read().await;
        let Some(entries) = state.entries.get(&service_id) else {
            return (0, 0);
        };

        entries
            .iter()
            .filter(|result| result.timestamp >= since)
            .fold((0, 0), |(successes, total), result| (successes + usize::from(result.success), total + 1))
    }

    pub async fn len(&self, service_id: ServiceId) -> usize {
        self.state.read().await.entries.get(&service_id).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::{CheckKind, ProbeOutcome};
    use crate::registry::Service;
    use chrono::TimeDelta;

    fn result_at(service: &Service, success: bool, timestamp: DateTime<Utc>) -> ProbeResult {
        let outcome = if success { ProbeOutcome::up() } else { ProbeOutcome::down() };
        ProbeResult::from_outcome(service, outcome.with_duration(10), timestamp)
    }

    fn service() -> Service {
        Service::new("queue-4".into(), "queue-4.backend".into(), 6379, CheckKind::Tcp)
    }

    #[tokio::test]
    async fn test_cap_keeps_most_recent_in_order() {
        let store = HistoryStore::new(100);
        let service = service();
        let start = Utc::now();

        for i in 0..150 {
            store.append(result_at(&service, i % 3 != 0, start + TimeDelta::seconds(i))).await;
        }

        let history = store.all(service.id).await;
        assert_eq!(history.len(), 100);
        assert_eq!(history.first().unwrap().timestamp, start + TimeDelta::seconds(50));
        assert_eq!(history.last().unwrap().timestamp, start + TimeDelta::seconds(149));
        assert!(history.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
    }

    #[tokio::test]
    async fn test_latest_tracks_last_append() {
        let store = HistoryStore::new(5);
        let service = service();
        let now = Utc::now();

        assert!(store.latest(service.id).await.is_none());

        store.append(result_at(&service, true, now)).await;
        store.append(result_at(&service, false, now + TimeDelta::seconds(1))).await;

        let latest = store.latest(service.id).await.unwrap();
        assert!(!latest.success);
        assert_eq!(latest.timestamp, now + TimeDelta::seconds(1));
    }

    #[tokio::test]
    async fn test_recent_returns_tail() {
        let store = HistoryStore::new(100);
        let service = service();
        let now = Utc::now();

        for i in 0..4 {
            store.append(result_at(&service, true, now + TimeDelta::seconds(i))).await;
        }

        let recent = store.recent(service.id, 10).await;
        assert_eq!(recent.len(), 4);

        let recent = store.recent(service.id, 2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, now + TimeDelta::seconds(2));
        assert_eq!(recent[1].timestamp, now + TimeDelta::seconds(3));
    }

    #[tokio::test]
    async fn test_counts_since() {
        let store = HistoryStore::new(100);
        let service = service();
        let now = Utc::now();

        store.append(result_at(&service, true, now - TimeDelta::seconds(7200))).await;
        store.append(result_at(&service, true, now - TimeDelta::seconds(3600))).await;
        store.append(result_at(&service, false, now - TimeDelta::seconds(100))).await;

        assert_eq!(store.counts_since(service.id, now - TimeDelta::hours(1)).await, (1, 2));
        assert_eq!(store.counts_since(service.id, now).await, (0, 0));
    }

    #[tokio::test]
    async fn test_unknown_service_is_empty() {
        let store = HistoryStore::new(10);
        let id = ServiceId::derive("missing", "missing.local", 80);

        assert!(store.all(id).await.is_empty());
        assert!(store.recent(id, 3).await.is_empty());
        assert_eq!(store.len(id).await, 0);
    }
}
