//! Peer roles and their message tables
//!
//! Each role watches for a fixed, ordered list of log messages. Order matters
//! only where needles could overlap; the first match wins.

use std::fmt;

use serde::Serialize;

use ncmon_core::{FieldSpec, MessagePattern};

/// What a monitored board does in the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Network-coding relay: receives natives, broadcasts encoded pairs.
    Relay,
    /// Native node: originates packets and decodes relay broadcasts.
    Native,
    /// Edge observer timing GPIO edges of the synchronised peers.
    Observer,
    /// Clock-sync peer reporting its offset to the master.
    SyncPeer,
}

/// Identifier of every message the monitor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternId {
    // Relay
    ReceivedNative,
    EncodedPair,
    Retransmissions,
    ReportSavings,
    // Native
    ReceivedEncoded,
    CommissionedNative,
    DecodedCached,
    Decoded,
    DecodingRedundant,
    DecodingFailed,
    // Observer
    RisingEdge,
    FallingEdge,
    // Sync peer
    MasterOffset,
    AvgSendOffset,
    AvgRecvOffset,
    // Relay + native
    Shutdown,
}

const SHUTDOWN_NEEDLE: &str = "initiating shutdown task";

static RELAY_PATTERNS: &[MessagePattern<PatternId>] = &[
    MessagePattern {
        id: PatternId::ReceivedNative,
        needle: "Received native packet",
        fields: &[FieldSpec::after_abs("packet", 1)],
    },
    MessagePattern {
        id: PatternId::EncodedPair,
        needle: "Encoded packets [",
        fields: &[FieldSpec::after_abs("[", 1), FieldSpec::after_abs("[", 2)],
    },
    MessagePattern {
        id: PatternId::Retransmissions,
        needle: "Number of retransmissions:",
        fields: &[FieldSpec::after_abs("retransmissions:", 1)],
    },
    MessagePattern {
        id: PatternId::ReportSavings,
        needle: "Reception report savings:",
        fields: &[FieldSpec::after_abs("savings:", 1)],
    },
    MessagePattern {
        id: PatternId::Shutdown,
        needle: SHUTDOWN_NEEDLE,
        fields: &[],
    },
];

// "cashed" is spelled the way the firmware prints it.
static NATIVE_PATTERNS: &[MessagePattern<PatternId>] = &[
    MessagePattern {
        id: PatternId::ReceivedEncoded,
        needle: "Received encoded packet",
        fields: &[],
    },
    MessagePattern {
        id: PatternId::CommissionedNative,
        needle: "Commissioned native packet",
        fields: &[FieldSpec::after_abs("packet", 1)],
    },
    MessagePattern {
        id: PatternId::DecodedCached,
        needle: "Decoded cashed packet",
        fields: &[FieldSpec::after_abs("packet", 1)],
    },
    MessagePattern {
        id: PatternId::Decoded,
        needle: "Decoded packet",
        fields: &[FieldSpec::after_abs("packet", 1)],
    },
    MessagePattern {
        id: PatternId::DecodingRedundant,
        needle: "Decoding redundant",
        fields: &[],
    },
    MessagePattern {
        id: PatternId::DecodingFailed,
        needle: "Decoding failed - missing packets",
        fields: &[],
    },
    MessagePattern {
        id: PatternId::Shutdown,
        needle: SHUTDOWN_NEEDLE,
        fields: &[],
    },
];

static OBSERVER_PATTERNS: &[MessagePattern<PatternId>] = &[
    MessagePattern {
        id: PatternId::RisingEdge,
        needle: "RISING",
        fields: &[FieldSpec::last()],
    },
    MessagePattern {
        id: PatternId::FallingEdge,
        needle: "FALLING",
        fields: &[],
    },
];

static SYNC_PEER_PATTERNS: &[MessagePattern<PatternId>] = &[
    MessagePattern {
        id: PatternId::MasterOffset,
        needle: "Offset to master with",
        fields: &[FieldSpec::after("with", 1)],
    },
    MessagePattern {
        id: PatternId::AvgSendOffset,
        needle: "avg_send_offset = ",
        fields: &[FieldSpec::after("=", 1)],
    },
    MessagePattern {
        id: PatternId::AvgRecvOffset,
        needle: "avg_recv_offset = ",
        fields: &[FieldSpec::after("=", 1)],
    },
];

impl Role {
    /// The ordered message table for this role.
    pub fn patterns(&self) -> &'static [MessagePattern<PatternId>] {
        match self {
            Role::Relay => RELAY_PATTERNS,
            Role::Native => NATIVE_PATTERNS,
            Role::Observer => OBSERVER_PATTERNS,
            Role::SyncPeer => SYNC_PEER_PATTERNS,
        }
    }

    /// Whether this role ever reports a terminal ("shutdown") event.
    pub fn has_terminal_event(&self) -> bool {
        self.patterns().iter().any(|p| p.id == PatternId::Shutdown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Relay => "relay",
            Role::Native => "native",
            Role::Observer => "observer",
            Role::SyncPeer => "sync-peer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
