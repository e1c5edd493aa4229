//! Per-peer state and line dispatch
//!
//! A [`NodeState`] owns the sample store of one monitored board. It is
//! mutated only through [`NodeState::apply`], which classifies the line with
//! the node's role table and updates buffers and counters. A line that does
//! not classify cleanly leaves the state untouched.

use serde::Serialize;

use ncmon_core::prelude::*;
use ncmon_core::{classify, Classification, Counter, LineEvent, Quantity, SampleStore};

use crate::role::{PatternId, Role};

/// What applying one line did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No message of this role's table.
    NoMatch,
    /// A known message whose fields could not be read; dropped.
    Malformed(PatternId),
    /// State was updated.
    Applied {
        pattern: PatternId,
        /// The line should trigger a redraw.
        render: bool,
        /// The peer reported its shutdown.
        terminal: bool,
    },
}

impl Dispatch {
    pub fn wants_render(&self) -> bool {
        matches!(self, Dispatch::Applied { render: true, .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Dispatch::Applied { terminal: true, .. })
    }
}

/// Rising-edge bookkeeping for the observer.
///
/// The first rising edge after a falling edge opens a cycle; later rising
/// edges in the same cycle move `last`. When the next cycle opens, the spread
/// `|last - first|` of the previous one is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeCycle {
    pub first: i64,
    pub last: i64,
    /// The next rising edge opens a new cycle.
    pub awaiting_first: bool,
    /// Cycles opened so far.
    pub cycles: u64,
}

impl Default for EdgeCycle {
    fn default() -> Self {
        Self {
            first: 0,
            last: 0,
            awaiting_first: true,
            cycles: 0,
        }
    }
}

impl EdgeCycle {
    /// Record a rising edge. Returns the closed cycle's spread when this edge
    /// opens a new cycle and the spread is non-zero.
    fn rising(&mut self, timestamp: i64) -> Option<i64> {
        if self.awaiting_first {
            let spread = self.last.abs_diff(self.first);
            self.first = timestamp;
            self.awaiting_first = false;
            self.cycles += 1;
            (spread != 0).then(|| i64::try_from(spread).unwrap_or(i64::MAX))
        } else {
            self.last = timestamp;
            None
        }
    }

    fn falling(&mut self) {
        self.awaiting_first = true;
    }
}

/// State of one monitored peer.
#[derive(Debug, Clone)]
pub struct NodeState {
    label: String,
    role: Role,
    store: SampleStore,
    cycle: EdgeCycle,
    terminated: bool,
    detached: bool,
    lines_applied: u64,
    lines_dropped: u64,
}

impl NodeState {
    pub fn new(label: impl Into<String>, role: Role, window: usize) -> Self {
        Self {
            label: label.into(),
            role,
            store: SampleStore::new(window),
            cycle: EdgeCycle::default(),
            terminated: false,
            detached: false,
            lines_applied: 0,
            lines_dropped: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn edge_cycle(&self) -> EdgeCycle {
        self.cycle
    }

    /// The peer reported its shutdown message.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The peer's line source has closed.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn detach(&mut self) {
        self.detached = true;
    }

    /// Lines that updated state, and lines dropped as malformed.
    pub fn line_counts(&self) -> (u64, u64) {
        (self.lines_applied, self.lines_dropped)
    }

    /// Classify `line` and update the store.
    pub fn apply(&mut self, line: &str) -> Dispatch {
        match classify(line, self.role.patterns()) {
            Classification::NoMatch => Dispatch::NoMatch,
            Classification::Malformed { pattern, reason } => {
                trace!("{}: dropping {:?} line {:?}: {}", self.label, pattern, line, reason);
                self.lines_dropped += 1;
                Dispatch::Malformed(pattern)
            }
            Classification::Matched(event) => {
                self.lines_applied += 1;
                self.dispatch(&event)
            }
        }
    }

    fn dispatch(&mut self, event: &LineEvent<PatternId>) -> Dispatch {
        let store = &mut self.store;
        let mut render = true;
        let mut terminal = false;

        match event.pattern {
            // ── Relay ───────────────────────────────────
            PatternId::ReceivedNative => {
                let seq = event.field(0);
                store.append(Quantity::ReceivedNative, seq);
                store.append(Quantity::Unencoded, seq);
            }
            PatternId::EncodedPair => {
                let broadcasts = store.counter_increment(Counter::EncodedBroadcasts, 1);
                for seq in [event.field(0), event.field(1)] {
                    if !store.contains(Quantity::EncodedNative, seq) {
                        store.append(Quantity::EncodedNative, seq);
                        store.append(Quantity::TransmissionsPerNative, broadcasts);
                    }
                    store.remove_first(Quantity::Unencoded, seq);
                }
                let distinct = store.len(Quantity::EncodedNative) as i64;
                store.append(Quantity::EncodedPerBroadcast, distinct);
            }
            PatternId::Retransmissions => {
                store.counter_increment(Counter::Retransmissions, event.field(0));
            }
            PatternId::ReportSavings => {
                store.append(Quantity::ReportSavings, event.field(0));
            }

            // ── Native ──────────────────────────────────
            PatternId::ReceivedEncoded => {
                store.counter_increment(Counter::EncodedReceived, 1);
            }
            PatternId::CommissionedNative => {
                store.append(Quantity::SentNative, event.field(0));
            }
            PatternId::DecodedCached => {
                store.append(Quantity::DecodedNative, event.field(0));
                store.counter_increment(Counter::DecodedCached, 1);
                store.counter_increment(Counter::PendingInCache, -1);
            }
            PatternId::Decoded => {
                store.append(Quantity::DecodedNative, event.field(0));
                store.counter_increment(Counter::DecodedInstant, 1);
            }
            PatternId::DecodingRedundant => {
                store.counter_increment(Counter::DecodedRedundant, 1);
            }
            PatternId::DecodingFailed => {
                store.counter_increment(Counter::PendingInCache, 1);
            }

            // ── Observer ────────────────────────────────
            PatternId::RisingEdge => {
                if let Some(spread) = self.cycle.rising(event.field(0)) {
                    debug!("{}: edge spread {} us", self.label, spread);
                    store.append(Quantity::EdgeDeltas, spread);
                }
                render = false;
            }
            PatternId::FallingEdge => {
                self.cycle.falling();
            }

            // ── Sync peer ───────────────────────────────
            PatternId::MasterOffset => {
                store.append(Quantity::MasterOffsets, event.field(0));
                render = false;
            }
            PatternId::AvgSendOffset => {
                store.append(Quantity::SendOffsets, event.field(0));
                render = false;
            }
            PatternId::AvgRecvOffset => {
                store.append(Quantity::RecvOffsets, event.field(0));
                render = false;
            }

            PatternId::Shutdown => {
                if !self.terminated {
                    info!("{} ({}) reported shutdown", self.label, self.role);
                }
                self.terminated = true;
                terminal = true;
            }
        }

        Dispatch::Applied {
            pattern: event.pattern,
            render,
            terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> NodeState {
        NodeState::new("/dev/ttyUSB0", Role::Relay, 100)
    }

    fn native() -> NodeState {
        NodeState::new("/dev/ttyUSB1", Role::Native, 100)
    }

    #[test]
    fn test_received_native_appends_sequence() {
        let mut node = relay();
        let outcome = node.apply("Received native packet 17");
        assert!(outcome.wants_render());
        assert_eq!(node.store().snapshot(Quantity::ReceivedNative), vec![17]);
        assert_eq!(node.store().snapshot(Quantity::Unencoded), vec![17]);
    }

    #[test]
    fn test_retransmissions_accumulate() {
        let mut node = relay();
        node.apply("Number of retransmissions: 4");
        node.apply("Number of retransmissions: 4");
        assert_eq!(node.store().counter(Counter::Retransmissions), 8);
    }

    #[test]
    fn test_encoded_pair_tracks_distinct_natives() {
        let mut node = relay();
        for line in [
            "Received native packet 1",
            "Received native packet 2",
            "Received native packet 3",
            "Encoded packets [ 1 2 ]",
            "Encoded packets [ 2 3 ]",
        ] {
            node.apply(line);
        }
        let store = node.store();
        assert_eq!(store.counter(Counter::EncodedBroadcasts), 2);
        assert_eq!(store.snapshot(Quantity::EncodedNative), vec![1, 2, 3]);
        // natives 1 and 2 first went out in broadcast 1, native 3 in broadcast 2
        assert_eq!(store.snapshot(Quantity::TransmissionsPerNative), vec![1, 1, 2]);
        assert_eq!(store.snapshot(Quantity::EncodedPerBroadcast), vec![2, 3]);
        assert!(store.snapshot(Quantity::Unencoded).is_empty());
    }

    #[test]
    fn test_malformed_line_leaves_state_unchanged() {
        let mut node = relay();
        node.apply("Received native packet 5");
        let before = node.store().snapshot(Quantity::ReceivedNative);

        let outcome = node.apply("Received native packet xyz");
        assert_eq!(outcome, Dispatch::Malformed(PatternId::ReceivedNative));
        assert!(!outcome.wants_render());
        assert_eq!(node.store().snapshot(Quantity::ReceivedNative), before);

        // second field missing: first field must not be applied either
        node.apply("Encoded packets [ 5");
        assert_eq!(node.store().counter(Counter::EncodedBroadcasts), 0);
        assert!(node.store().snapshot(Quantity::EncodedNative).is_empty());
        assert_eq!(node.line_counts(), (1, 2));
    }

    #[test]
    fn test_native_counters() {
        let mut node = native();
        for line in [
            "Received encoded packet",
            "Received encoded packet",
            "Commissioned native packet 7",
            "Decoding failed - missing packets",
            "Decoded cashed packet 4",
            "Decoded packet 5",
            "Decoding redundant",
        ] {
            node.apply(line);
        }
        let store = node.store();
        assert_eq!(store.counter(Counter::EncodedReceived), 2);
        assert_eq!(store.counter(Counter::DecodedCached), 1);
        assert_eq!(store.counter(Counter::DecodedInstant), 1);
        assert_eq!(store.counter(Counter::DecodedRedundant), 1);
        assert_eq!(store.counter(Counter::PendingInCache), 0);
        assert_eq!(store.snapshot(Quantity::SentNative), vec![7]);
        assert_eq!(store.snapshot(Quantity::DecodedNative), vec![4, 5]);
    }

    #[test]
    fn test_shutdown_is_terminal() {
        let mut node = native();
        assert!(!node.is_terminated());
        let outcome = node.apply("I (9) main: initiating shutdown task");
        assert!(outcome.is_terminal());
        assert!(outcome.wants_render());
        assert!(node.is_terminated());
    }

    #[test]
    fn test_edge_cycles_record_spread() {
        let mut node = NodeState::new("obsv", Role::Observer, 100);
        // first cycle: nothing to close yet
        node.apply("EDGE RISING 1000");
        node.apply("EDGE RISING 1030");
        assert!(node.apply("EDGE FALLING 1100").wants_render());
        // second cycle opens, closing the first with spread 30
        node.apply("EDGE RISING 2000");
        node.apply("EDGE RISING 2012");
        node.apply("EDGE FALLING 2100");
        node.apply("EDGE RISING 3000");

        assert_eq!(node.store().snapshot(Quantity::EdgeDeltas), vec![30, 12]);
        assert_eq!(node.edge_cycle().cycles, 3);
    }

    #[test]
    fn test_single_edge_cycle_measures_against_previous_last() {
        let mut node = NodeState::new("obsv", Role::Observer, 100);
        node.apply("EDGE RISING 500");
        node.apply("EDGE FALLING 600");
        node.apply("EDGE RISING 700");
        // a cycle with one edge never moves `last`
        assert_eq!(node.store().snapshot(Quantity::EdgeDeltas), vec![500]);
    }

    #[test]
    fn test_sync_peer_offsets() {
        let mut node = NodeState::new("peer1", Role::SyncPeer, 100);
        assert!(!node.apply("Offset to master with -120 us").wants_render());
        node.apply("avg_send_offset = 15");
        node.apply("avg_recv_offset = -9");
        assert_eq!(node.store().snapshot(Quantity::MasterOffsets), vec![-120]);
        assert_eq!(node.store().snapshot(Quantity::SendOffsets), vec![15]);
        assert_eq!(node.store().snapshot(Quantity::RecvOffsets), vec![-9]);
    }

    #[test]
    fn test_unrelated_line_is_no_match() {
        let mut node = relay();
        assert_eq!(node.apply("wifi: connected"), Dispatch::NoMatch);
        assert_eq!(node.line_counts(), (0, 0));
    }
}
