//! Reports: derived statistics computed from node snapshots
//!
//! Reports are built fresh for every render from the current store contents
//! and never cached. Everything a renderer draws lives in a [`Snapshot`].

use serde::Serialize;

use ncmon_core::prelude::*;
use ncmon_core::{
    histogram, ideal_coding_gain, indexed, linear_trend, mean, ratio_series, Counter,
    HistogramBin, Quantity, Trend,
};

use crate::config::SyncSettings;
use crate::export::ExportBlock;
use crate::node::NodeState;

fn to_f64(values: &[i64]) -> Vec<f64> {
    values.iter().map(|v| *v as f64).collect()
}

fn skip_warmup(values: Vec<i64>, warmup: usize) -> Vec<i64> {
    values.into_iter().skip(warmup).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Coding experiment
// ─────────────────────────────────────────────────────────────────────────────

/// Relay-side coding statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodingReport {
    pub relay: String,
    pub native_count: usize,
    /// Broadcast count at which each native packet was first encoded.
    pub transmissions: Vec<i64>,
    /// Distinct natives per broadcast, divided by the broadcast index.
    pub coding_gain: Vec<f64>,
    /// Mean of `coding_gain`; 0 before the first broadcast.
    pub average_gain: f64,
    /// `None` when there are fewer than two native peers.
    pub ideal_gain: Option<f64>,
    pub encoded_broadcasts: i64,
    pub retransmissions: i64,
    pub received_native: usize,
    /// Received natives not yet part of any broadcast.
    pub unencoded_backlog: usize,
    pub report_savings_mean: f64,
    pub terminated: bool,
}

impl CodingReport {
    pub fn from_relay(relay: &NodeState, native_count: usize) -> Self {
        let store = relay.store();
        let coding_gain = ratio_series(&store.snapshot(Quantity::EncodedPerBroadcast));
        let ideal_gain = match ideal_coding_gain(native_count) {
            Ok(gain) => Some(gain),
            Err(e) => {
                trace!("{}", e);
                None
            }
        };

        Self {
            relay: relay.label().to_string(),
            native_count,
            transmissions: store.snapshot(Quantity::TransmissionsPerNative),
            average_gain: mean(&coding_gain),
            coding_gain,
            ideal_gain,
            encoded_broadcasts: store.counter(Counter::EncodedBroadcasts),
            retransmissions: store.counter(Counter::Retransmissions),
            received_native: store.len(Quantity::ReceivedNative),
            unencoded_backlog: store.len(Quantity::Unencoded),
            report_savings_mean: mean(&to_f64(&store.snapshot(Quantity::ReportSavings))),
            terminated: relay.is_terminated(),
        }
    }

    /// Measured transmissions as chart points.
    pub fn transmission_points(&self) -> Vec<(f64, f64)> {
        indexed(&to_f64(&self.transmissions))
    }

    /// Transmissions an ideal coder would need for the same natives.
    pub fn ideal_transmission_points(&self) -> Vec<(f64, f64)> {
        match self.ideal_gain {
            Some(gain) => (1..=self.transmissions.len())
                .map(|x| (x as f64, x as f64 / gain))
                .collect(),
            None => Vec::new(),
        }
    }

    /// One broadcast per native packet.
    pub fn uncoded_transmission_points(&self) -> Vec<(f64, f64)> {
        (1..=self.transmissions.len())
            .map(|x| (x as f64, x as f64))
            .collect()
    }

    pub fn coding_gain_points(&self) -> Vec<(f64, f64)> {
        indexed(&self.coding_gain)
    }

    /// Values written to the export file.
    pub fn export_block(&self) -> ExportBlock {
        ExportBlock {
            native_count: self.native_count,
            transmissions: self.transmissions.clone(),
            coding_gain: self.coding_gain.clone(),
            average_gain: self.average_gain,
            ideal_gain: self.ideal_gain,
        }
    }
}

/// Reception statistics of one native peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeReport {
    pub label: String,
    pub encoded_received: i64,
    pub decoded_instant: i64,
    pub decoded_cached: i64,
    pub decoded_redundant: i64,
    pub pending_in_cache: i64,
    pub sent_native: usize,
    pub decoded_native: usize,
    pub terminated: bool,
}

impl NativeReport {
    pub fn from_native(native: &NodeState) -> Self {
        let store = native.store();
        Self {
            label: native.label().to_string(),
            encoded_received: store.counter(Counter::EncodedReceived),
            decoded_instant: store.counter(Counter::DecodedInstant),
            decoded_cached: store.counter(Counter::DecodedCached),
            decoded_redundant: store.counter(Counter::DecodedRedundant),
            pending_in_cache: store.counter(Counter::PendingInCache),
            sent_native: store.len(Quantity::SentNative),
            decoded_native: store.len(Quantity::DecodedNative),
            terminated: native.is_terminated(),
        }
    }

    /// Names of the bar-chart series, in display order.
    pub const BAR_LABELS: [&'static str; 5] = [
        "received encoded",
        "instant decoding",
        "cached decoding",
        "redundant decoding",
        "waiting in cache",
    ];

    /// The five bar-chart series, in display order.
    pub fn bars(&self) -> [(&'static str, i64); 5] {
        let [a, b, c, d, e] = Self::BAR_LABELS;
        [
            (a, self.encoded_received),
            (b, self.decoded_instant),
            (c, self.decoded_cached),
            (d, self.decoded_redundant),
            (e, self.pending_in_cache),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodingView {
    pub relay: CodingReport,
    pub natives: Vec<NativeReport>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Clock-sync experiment
// ─────────────────────────────────────────────────────────────────────────────

/// Offsets reported by one sync peer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerOffsets {
    pub label: String,
    /// Master offsets after warm-up.
    pub master_offsets: Vec<f64>,
    /// Drift of the master offset; `None` with fewer than two usable points.
    pub trend: Option<Trend>,
    pub send_offsets: Vec<i64>,
    pub recv_offsets: Vec<i64>,
}

impl PeerOffsets {
    pub fn from_peer(peer: &NodeState, settings: &SyncSettings) -> Self {
        let store = peer.store();
        let master_offsets = to_f64(&skip_warmup(
            store.snapshot(Quantity::MasterOffsets),
            settings.offset_warmup,
        ));
        let trend = match linear_trend(&indexed(&master_offsets)) {
            Ok(trend) => Some(trend),
            Err(e) => {
                trace!("{}: no drift trend: {}", peer.label(), e);
                None
            }
        };

        Self {
            label: peer.label().to_string(),
            master_offsets,
            trend,
            send_offsets: store.snapshot(Quantity::SendOffsets),
            recv_offsets: store.snapshot(Quantity::RecvOffsets),
        }
    }
}

/// Edge-timing statistics from the observer plus per-peer offsets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub observer: String,
    /// Edge spreads after warm-up, in µs.
    pub edge_deltas: Vec<f64>,
    pub delta_mean: f64,
    pub histogram: Vec<HistogramBin>,
    pub cycles: u64,
    pub peers: Vec<PeerOffsets>,
}

impl SyncReport {
    pub fn build(observer: &NodeState, peers: &[&NodeState], settings: &SyncSettings) -> Self {
        let edge_deltas = to_f64(&skip_warmup(
            observer.store().snapshot(Quantity::EdgeDeltas),
            settings.delta_warmup,
        ));

        Self {
            observer: observer.label().to_string(),
            delta_mean: mean(&edge_deltas),
            histogram: histogram(&edge_deltas, settings.histogram_bins),
            edge_deltas,
            cycles: observer.edge_cycle().cycles,
            peers: peers
                .iter()
                .map(|p| PeerOffsets::from_peer(p, settings))
                .collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Replay of saved blocks
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayView {
    pub source: String,
    /// Blocks truncated to the first `range` values.
    pub blocks: Vec<ExportBlock>,
    pub range: usize,
}

impl ReplayView {
    pub fn new(source: impl Into<String>, blocks: Vec<ExportBlock>, range: usize) -> Self {
        let blocks = blocks
            .into_iter()
            .map(|mut b| {
                b.transmissions.truncate(range);
                b.coding_gain.truncate(range);
                b
            })
            .collect();
        Self {
            source: source.into(),
            blocks,
            range,
        }
    }

    /// Longest series across all blocks, for the "no coding" reference line.
    pub fn max_len(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.transmissions.len().max(b.coding_gain.len()))
            .max()
            .unwrap_or(0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Everything one render needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Snapshot {
    Coding(CodingView),
    Sync(SyncReport),
    Replay(ReplayView),
}

impl Snapshot {
    pub fn kind(&self) -> &'static str {
        match self {
            Snapshot::Coding(_) => "coding",
            Snapshot::Sync(_) => "sync",
            Snapshot::Replay(_) => "replay",
        }
    }
}
