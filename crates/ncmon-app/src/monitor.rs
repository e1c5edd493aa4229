//! The cycle/event driver
//!
//! [`Monitor`] owns every [`NodeState`] together with the line source feeding
//! it, so dispatch needs no locking. Each pass reads at most one line per
//! source, round-robin, and renders when a render was requested and the
//! throttle interval has elapsed.
//!
//! The loop ends when the shutdown flag is raised, when the renderer asks to
//! quit, when every peer that can report a shutdown has done so, or when all
//! sources are closed. Teardown (close sources, final render) always runs.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;

use ncmon_core::prelude::*;
use ncmon_source::{LineRead, LineSource};

use crate::config::{RenderSettings, SyncSettings};
use crate::node::NodeState;
use crate::report::{CodingReport, CodingView, NativeReport, Snapshot, SyncReport};
use crate::role::Role;

/// Downstream consumer of snapshots (terminal charts, JSON lines).
///
/// Render failures never stop the monitor; they are logged and the next
/// render is attempted as usual.
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()>;

    /// Whether the user asked to quit. Polled once per pass.
    fn poll_quit(&mut self) -> bool {
        false
    }
}

/// Which experiment is being monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Node 0 is the relay, the rest are native peers.
    Coding,
    /// Node 0 is the edge observer, the rest are sync peers.
    Sync,
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Shutdown flag raised (SIGINT/SIGTERM).
    Interrupted,
    /// The renderer reported a quit key.
    RendererQuit,
    /// Every peer able to report a shutdown did so.
    AllTerminated,
    /// Every line source closed.
    SourcesClosed,
}

/// Result of one round-robin pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pass {
    /// Lines read across all sources.
    pub lines: usize,
    /// At least one line asked for a redraw.
    pub render_requested: bool,
    /// Sources that closed during this pass.
    pub closed: usize,
}

/// What the run did.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSummary {
    pub reason: StopReason,
    pub lines_applied: u64,
    pub lines_dropped: u64,
    pub renders: u64,
    pub render_failures: u64,
    /// State at teardown, also handed to the renderer one last time.
    pub snapshot: Snapshot,
}

/// Owns the peers of one experiment and drives them.
pub struct Monitor {
    mode: Mode,
    nodes: Vec<NodeState>,
    sources: Vec<Box<dyn LineSource>>,
    render: RenderSettings,
    sync: SyncSettings,
    shutdown_rx: Option<watch::Receiver<bool>>,
    render_pending: bool,
    last_render: Option<Instant>,
    renders: u64,
    render_failures: u64,
}

impl Monitor {
    /// Coding experiment: one relay and its native peers.
    pub fn coding(
        relay: Box<dyn LineSource>,
        natives: Vec<Box<dyn LineSource>>,
        window: usize,
    ) -> Self {
        let mut pairs = vec![(Role::Relay, relay)];
        pairs.extend(natives.into_iter().map(|s| (Role::Native, s)));
        Self::with_nodes(Mode::Coding, pairs, window)
    }

    /// Clock-sync experiment: the edge observer and the sync peers.
    pub fn sync(
        observer: Box<dyn LineSource>,
        peers: Vec<Box<dyn LineSource>>,
        window: usize,
    ) -> Self {
        let mut pairs = vec![(Role::Observer, observer)];
        pairs.extend(peers.into_iter().map(|s| (Role::SyncPeer, s)));
        Self::with_nodes(Mode::Sync, pairs, window)
    }

    fn with_nodes(mode: Mode, pairs: Vec<(Role, Box<dyn LineSource>)>, window: usize) -> Self {
        let (nodes, sources): (Vec<_>, Vec<_>) = pairs
            .into_iter()
            .map(|(role, source)| {
                info!("Attached {} as {}", source.label(), role);
                (NodeState::new(source.label(), role, window), source)
            })
            .unzip();

        Self {
            mode,
            nodes,
            sources,
            render: RenderSettings::default(),
            sync: SyncSettings::default(),
            shutdown_rx: None,
            // Draw the empty charts right away
            render_pending: true,
            last_render: None,
            renders: 0,
            render_failures: 0,
        }
    }

    pub fn with_render_settings(mut self, render: RenderSettings) -> Self {
        self.render = render;
        self
    }

    pub fn with_sync_settings(mut self, sync: SyncSettings) -> Self {
        self.sync = sync;
        self
    }

    /// Stop the loop when this flag turns `true`.
    pub fn with_shutdown(mut self, rx: watch::Receiver<bool>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    /// Read at most one line from every attached source and dispatch it.
    pub fn poll_once(&mut self) -> Pass {
        let mut pass = Pass::default();

        for (node, source) in self.nodes.iter_mut().zip(self.sources.iter_mut()) {
            if node.is_detached() {
                continue;
            }
            match source.read_line() {
                LineRead::Line(line) => {
                    pass.lines += 1;
                    if node.apply(&line).wants_render() {
                        pass.render_requested = true;
                    }
                }
                LineRead::Idle => {}
                LineRead::Closed => {
                    info!("Line source {} closed", node.label());
                    node.detach();
                    pass.closed += 1;
                }
            }
        }

        if pass.render_requested {
            self.render_pending = true;
        }
        pass
    }

    /// Whether the run is over on its own (not counting interrupts).
    pub fn stop_reason(&self) -> Option<StopReason> {
        let mut capable = self
            .nodes
            .iter()
            .filter(|n| n.role().has_terminal_event())
            .peekable();

        if capable.peek().is_some() {
            let (mut any_terminated, mut all_done) = (false, true);
            for node in capable {
                any_terminated |= node.is_terminated();
                all_done &= node.is_terminated() || node.is_detached();
            }
            if any_terminated && all_done {
                return Some(StopReason::AllTerminated);
            }
        }

        if self.nodes.iter().all(NodeState::is_detached) {
            return Some(StopReason::SourcesClosed);
        }
        None
    }

    fn interrupted(&self) -> bool {
        self.shutdown_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Build the current snapshot from all nodes.
    pub fn snapshot(&self) -> Snapshot {
        // constructors always attach the relay or observer first
        let Some((first, rest)) = self.nodes.split_first() else {
            unreachable!("monitor without nodes");
        };
        match self.mode {
            Mode::Coding => Snapshot::Coding(CodingView {
                relay: CodingReport::from_relay(first, rest.len()),
                natives: rest.iter().map(NativeReport::from_native).collect(),
            }),
            Mode::Sync => {
                let peers: Vec<&NodeState> = rest.iter().collect();
                Snapshot::Sync(SyncReport::build(first, &peers, &self.sync))
            }
        }
    }

    fn render_now(&mut self, renderer: &mut dyn Renderer) -> Snapshot {
        let snapshot = self.snapshot();
        match renderer.render(&snapshot) {
            Ok(()) => self.renders += 1,
            Err(e) => {
                self.render_failures += 1;
                warn!("Render failed: {}", e);
            }
        }
        self.render_pending = false;
        self.last_render = Some(Instant::now());
        snapshot
    }

    fn render_due(&self) -> bool {
        self.render_pending
            && self
                .last_render
                .map_or(true, |at| at.elapsed() >= self.render.interval())
    }

    /// Run until a stop condition, then tear down.
    pub async fn run(&mut self, renderer: &mut dyn Renderer) -> MonitorSummary {
        info!(
            "Monitoring {} source(s) in {:?} mode",
            self.sources.len(),
            self.mode
        );

        let reason = loop {
            if self.interrupted() {
                break StopReason::Interrupted;
            }
            if renderer.poll_quit() {
                break StopReason::RendererQuit;
            }

            let pass = self.poll_once();

            if let Some(reason) = self.stop_reason() {
                break reason;
            }

            if self.render_due() {
                self.render_now(renderer);
            }

            if pass.lines == 0 {
                tokio::time::sleep(self.render.idle_backoff().max(Duration::from_millis(1))).await;
            } else {
                tokio::task::yield_now().await;
            }
        };

        info!("Monitor stopping: {:?}", reason);
        self.teardown(renderer, reason)
    }

    fn teardown(&mut self, renderer: &mut dyn Renderer, reason: StopReason) -> MonitorSummary {
        for source in &mut self.sources {
            debug!("Closing line source {}", source.label());
            source.close();
        }

        let snapshot = self.render_now(renderer);

        let (lines_applied, lines_dropped) = self
            .nodes
            .iter()
            .map(NodeState::line_counts)
            .fold((0, 0), |(a, d), (na, nd)| (a + na, d + nd));

        MonitorSummary {
            reason,
            lines_applied,
            lines_dropped,
            renders: self.renders,
            render_failures: self.render_failures,
            snapshot,
        }
    }
}
