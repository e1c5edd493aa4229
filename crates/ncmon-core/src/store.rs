//! # Rolling Sample Store
//!
//! Fixed-capacity sample buffers and monotonic counters for one monitored
//! peer. Every quantity a device log reports (sequence numbers, offsets,
//! byte counts) lands in a [`SampleBuffer`]; tallies land in a counter.
//!
//! The store is owned by exactly one node and mutated only by that node's
//! dispatch, so it carries no synchronisation of its own.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

// ── SampleBuffer<T> ──────────────────────────────────────────────────────────

/// A fixed-capacity FIFO buffer that evicts the oldest entry when full.
///
/// Order is arrival order and doubles as the x-axis of time-series charts.
#[derive(Debug, Clone)]
pub struct SampleBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> SampleBuffer<T> {
    /// Create a new buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, evicting the oldest if at capacity.
    ///
    /// A zero-capacity buffer stays empty.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(value);
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

}

impl<T: PartialEq> SampleBuffer<T> {
    /// Whether `value` is currently retained.
    pub fn contains(&self, value: &T) -> bool {
        self.buf.contains(value)
    }

    /// Remove the oldest occurrence of `value`. Returns whether one was found.
    pub fn remove_first(&mut self, value: &T) -> bool {
        match self.buf.iter().position(|v| v == value) {
            Some(idx) => {
                self.buf.remove(idx);
                true
            }
            None => false,
        }
    }
}

impl<T: Clone> SampleBuffer<T> {
    /// Copy the contents out in arrival order.
    pub fn to_vec(&self) -> Vec<T> {
        self.buf.iter().cloned().collect()
    }
}

// ── Quantity / Counter names ─────────────────────────────────────────────────

/// Buffered quantities observed on a peer's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Relay: sequence numbers of native packets received from peers.
    ReceivedNative,
    /// Relay: received native packets not yet part of any encoded broadcast.
    Unencoded,
    /// Relay: distinct native sequence numbers that went into a broadcast.
    EncodedNative,
    /// Relay: broadcast count at the moment each native packet was first encoded.
    TransmissionsPerNative,
    /// Relay: distinct encoded natives after each broadcast.
    EncodedPerBroadcast,
    /// Relay: bytes saved by bloom-filter reception reports.
    ReportSavings,
    /// Native: sequence numbers of commissioned native packets.
    SentNative,
    /// Native: sequence numbers of successfully decoded packets.
    DecodedNative,
    /// Observer: spread between first and last rising edge of a cycle (µs).
    EdgeDeltas,
    /// Sync peer: computed system-time offset to the master (µs).
    MasterOffsets,
    /// Sync peer: per-cycle average send offset (µs).
    SendOffsets,
    /// Sync peer: per-cycle average receive offset (µs).
    RecvOffsets,
}

/// Tallies kept per peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    /// Relay: encoded broadcasts sent.
    EncodedBroadcasts,
    /// Relay: retransmissions reported.
    Retransmissions,
    /// Native: encoded broadcasts received.
    EncodedReceived,
    /// Native: packets decoded immediately.
    DecodedInstant,
    /// Native: packets decoded from the cache.
    DecodedCached,
    /// Native: decodes that produced an already-known packet.
    DecodedRedundant,
    /// Native: encoded packets parked in the cache waiting for a missing native.
    /// The only counter that may move down.
    PendingInCache,
}

// ── SampleStore ──────────────────────────────────────────────────────────────

/// Named sample buffers plus named counters for one peer.
///
/// Buffers are created lazily on first append, all with the store's window
/// capacity. Unknown counters read as zero.
#[derive(Debug, Clone)]
pub struct SampleStore {
    window: usize,
    buffers: HashMap<Quantity, SampleBuffer<i64>>,
    counters: HashMap<Counter, i64>,
}

impl SampleStore {
    /// Create a store whose buffers hold at most `window` samples each.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buffers: HashMap::new(),
            counters: HashMap::new(),
        }
    }

    /// Append a sample, evicting the oldest one if the buffer is full.
    pub fn append(&mut self, quantity: Quantity, value: i64) {
        let window = self.window;
        self.buffers
            .entry(quantity)
            .or_insert_with(|| SampleBuffer::new(window))
            .push(value);
    }

    /// Add `delta` (possibly negative) to a counter. Returns the new value.
    pub fn counter_increment(&mut self, counter: Counter, delta: i64) -> i64 {
        let slot = self.counters.entry(counter).or_insert(0);
        *slot = slot.saturating_add(delta);
        *slot
    }

    /// Current counter value.
    pub fn counter(&self, counter: Counter) -> i64 {
        self.counters.get(&counter).copied().unwrap_or(0)
    }

    /// Owned copy of a buffer's contents in arrival order.
    ///
    /// The copy is detached from the store, so it stays valid while later
    /// cycles keep appending.
    pub fn snapshot(&self, quantity: Quantity) -> Vec<i64> {
        self.buffers
            .get(&quantity)
            .map(SampleBuffer::to_vec)
            .unwrap_or_default()
    }

    /// Number of samples currently held for `quantity`.
    pub fn len(&self, quantity: Quantity) -> usize {
        self.buffers.get(&quantity).map_or(0, SampleBuffer::len)
    }

    /// Whether `value` is currently held for `quantity`.
    pub fn contains(&self, quantity: Quantity, value: i64) -> bool {
        self.buffers
            .get(&quantity)
            .is_some_and(|b| b.contains(&value))
    }

    /// Remove the oldest occurrence of `value` from `quantity`.
    pub fn remove_first(&mut self, quantity: Quantity, value: i64) -> bool {
        self.buffers
            .get_mut(&quantity)
            .is_some_and(|b| b.remove_first(&value))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── SampleBuffer ────────────────────────────────
    #[test]
    fn test_sample_buffer_basic() {
        let mut buf = SampleBuffer::new(3);
        buf.push(1);
        buf.push(2);
        buf.push(3);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_sample_buffer_overflow_keeps_last_n_in_order() {
        let capacity = 5;
        let extra = 7;
        let mut buf = SampleBuffer::new(capacity);
        for v in 0..(capacity + extra) as i64 {
            buf.push(v);
        }
        assert_eq!(buf.len(), capacity);
        assert_eq!(buf.to_vec(), vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_sample_buffer_zero_capacity_stays_empty() {
        let mut buf = SampleBuffer::new(0);
        buf.push(42);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_sample_buffer_remove_first_only_removes_oldest_match() {
        let mut buf = SampleBuffer::new(10);
        for v in [4, 7, 4, 9] {
            buf.push(v);
        }
        assert!(buf.remove_first(&4));
        assert_eq!(buf.to_vec(), vec![7, 4, 9]);
        assert!(!buf.remove_first(&100));
    }

    #[test]
    fn test_sample_buffer_empty() {
        let buf: SampleBuffer<i64> = SampleBuffer::new(5);
        assert!(buf.is_empty());
        assert!(buf.to_vec().is_empty());
        assert!(!buf.contains(&1));
    }

    // ── SampleStore ─────────────────────────────────
    #[test]
    fn test_store_append_and_snapshot() {
        let mut store = SampleStore::new(100);
        store.append(Quantity::ReceivedNative, 17);
        store.append(Quantity::ReceivedNative, 18);
        assert_eq!(store.snapshot(Quantity::ReceivedNative), vec![17, 18]);
        assert!(store.snapshot(Quantity::DecodedNative).is_empty());
    }

    #[test]
    fn test_store_snapshot_is_detached() {
        let mut store = SampleStore::new(3);
        store.append(Quantity::EdgeDeltas, 1);
        let snap = store.snapshot(Quantity::EdgeDeltas);
        store.append(Quantity::EdgeDeltas, 2);
        assert_eq!(snap, vec![1]);
        assert_eq!(store.len(Quantity::EdgeDeltas), 2);
    }

    #[test]
    fn test_store_buffers_share_window() {
        let mut store = SampleStore::new(2);
        for v in 0..10 {
            store.append(Quantity::MasterOffsets, v);
        }
        assert_eq!(store.snapshot(Quantity::MasterOffsets), vec![8, 9]);
        assert_eq!(store.len(Quantity::MasterOffsets), 2);
    }

    #[test]
    fn test_store_counters_default_to_zero_and_accumulate() {
        let mut store = SampleStore::new(10);
        assert_eq!(store.counter(Counter::Retransmissions), 0);
        store.counter_increment(Counter::Retransmissions, 4);
        store.counter_increment(Counter::Retransmissions, 4);
        assert_eq!(store.counter(Counter::Retransmissions), 8);
    }

    #[test]
    fn test_store_counter_compensating_decrement() {
        let mut store = SampleStore::new(10);
        store.counter_increment(Counter::PendingInCache, 1);
        let now = store.counter_increment(Counter::PendingInCache, -1);
        assert_eq!(now, 0);
    }

    #[test]
    fn test_store_contains_and_remove() {
        let mut store = SampleStore::new(10);
        store.append(Quantity::Unencoded, 5);
        assert!(store.contains(Quantity::Unencoded, 5));
        assert!(store.remove_first(Quantity::Unencoded, 5));
        assert!(!store.contains(Quantity::Unencoded, 5));
        assert!(!store.remove_first(Quantity::SentNative, 5));
    }
}
