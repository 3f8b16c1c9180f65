//! Traffic counters shown next to the map.
//!
//! Counters live in an explicit [`StatsStore`] that views receive by reference; there is no
//! process-wide state. Subscribers are notified synchronously after every change.

use std::collections::HashSet;

use crate::data::event::ArcEvent;
use crate::foundation::core::LngLat;

/// Counters displayed alongside the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrafficStats {
    /// Total well-formed events seen across all batches.
    pub requests: u64,
    /// Distinct source -> target pairs in the latest batch.
    pub connections: u64,
    /// Distinct endpoints in the latest batch.
    pub servers: u64,
}

impl TrafficStats {
    /// Counters contributed by a single batch, ignoring events without both endpoints.
    pub fn for_batch(events: &[ArcEvent]) -> Self {
        let mut pairs = HashSet::new();
        let mut endpoints = HashSet::new();
        let mut requests = 0u64;
        for e in events {
            let (Some(source), Some(target)) = (e.source, e.target) else {
                continue;
            };
            requests += 1;
            pairs.insert((coord_key(source), coord_key(target)));
            endpoints.insert(coord_key(source));
            endpoints.insert(coord_key(target));
        }
        Self {
            requests,
            connections: pairs.len() as u64,
            servers: endpoints.len() as u64,
        }
    }
}

fn coord_key(p: LngLat) -> (u64, u64) {
    (p.lng.to_bits(), p.lat.to_bits())
}

/// Opaque subscription token returned by [`StatsStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&TrafficStats)>;

/// Observable holder of the current [`TrafficStats`].
#[derive(Default)]
pub struct StatsStore {
    stats: TrafficStats,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for StatsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsStore")
            .field("stats", &self.stats)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl StatsStore {
    /// Store with zeroed counters and no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counters.
    pub fn get(&self) -> TrafficStats {
        self.stats
    }

    /// Register `listener`; it runs after every change until unsubscribed.
    pub fn subscribe(&mut self, listener: impl FnMut(&TrafficStats) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Accumulate requests and replace the per-batch gauges.
    pub fn record_batch(&mut self, events: &[ArcEvent]) {
        let batch = TrafficStats::for_batch(events);
        self.set(TrafficStats {
            requests: self.stats.requests + batch.requests,
            connections: batch.connections,
            servers: batch.servers,
        });
    }

    /// Replace the counters, notifying subscribers only when they differ.
    pub fn set(&mut self, stats: TrafficStats) {
        if stats == self.stats {
            return;
        }
        self.stats = stats;
        for (_, listener) in &mut self.listeners {
            listener(&self.stats);
        }
    }

    /// Zero every counter.
    pub fn reset(&mut self) {
        self.set(TrafficStats::default());
    }
}
