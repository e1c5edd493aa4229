//! Entry points for each subcommand
//!
//! Opens the sources, runs the [`Monitor`] against the chosen frontend and
//! performs the end-of-run actions (hold the final charts, save, summarise).

use std::io::Write;
use std::path::Path;

use tokio::sync::watch;

use ncmon_app::config::Settings;
use ncmon_app::export;
use ncmon_app::signals;
use ncmon_app::{Mode, Monitor, MonitorSummary, ReplayView, Snapshot, StopReason};
use ncmon_core::prelude::*;
use ncmon_source::{list_ports, LineSource, SerialOptions, SourceSpec};
use ncmon_tui::TerminalRenderer;

use crate::cli::{CodingArgs, ReplayArgs, SyncArgs};
use crate::headless::{HeadlessEvent, HeadlessRenderer};

/// Where snapshots go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontend {
    Terminal,
    Headless,
}

impl Frontend {
    pub fn from_flag(headless: bool) -> Self {
        if headless {
            Frontend::Headless
        } else {
            Frontend::Terminal
        }
    }
}

/// Open every source, failing on the first that cannot be opened.
///
/// Stdin can feed only one peer.
pub fn open_sources(
    specs: &[SourceSpec],
    serial: SerialOptions,
) -> Result<Vec<Box<dyn LineSource>>> {
    if specs.iter().filter(|s| s.is_stdin()).count() > 1 {
        return Err(Error::invalid_source("- (stdin can only be used once)"));
    }

    specs
        .iter()
        .map(|spec| {
            info!("Opening line source {}", spec);
            spec.open(serial)
        })
        .collect()
}

/// Run `monitor` to completion on `frontend`.
///
/// Only opening the terminal can fail. Once the monitor has run, frontend
/// errors are logged so the end-of-run actions still happen.
pub async fn run_monitor(
    monitor: &mut Monitor,
    frontend: Frontend,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<MonitorSummary> {
    match frontend {
        Frontend::Headless => Ok(run_headless(monitor, &mut HeadlessRenderer::stdout()).await),
        Frontend::Terminal => {
            let mut renderer = TerminalRenderer::init()?;
            let summary = monitor.run(&mut renderer).await;

            // the user already asked to leave in these cases
            if !matches!(
                summary.reason,
                StopReason::RendererQuit | StopReason::Interrupted
            ) {
                let held = tokio::task::block_in_place(|| {
                    renderer.hold(&summary.snapshot, || *shutdown_rx.borrow())
                });
                if let Err(e) = held {
                    warn!("Showing the final view failed: {}", e);
                }
            }
            renderer.restore();
            Ok(summary)
        }
    }
}

/// Run `monitor` with JSON-lines output, bracketed by start and finish events.
pub async fn run_headless<W: Write>(
    monitor: &mut Monitor,
    renderer: &mut HeadlessRenderer<W>,
) -> MonitorSummary {
    let labels: Vec<String> = monitor.nodes().iter().map(|n| n.label().to_string()).collect();
    if let Err(e) = renderer.emit(&HeadlessEvent::started(monitor.mode(), labels)) {
        warn!("Failed to emit start event: {}", e);
    }

    let summary = monitor.run(renderer).await;

    if let Err(e) = renderer.emit(&HeadlessEvent::finished(&summary)) {
        warn!("Failed to emit finish event: {}", e);
    }
    summary
}

/// Write the coding values of a finished run to `path`.
///
/// Returns the native count of the saved block, or `None` for a run that
/// was not a coding run.
pub fn save_coding(summary: &MonitorSummary, path: &Path) -> Result<Option<usize>> {
    let Snapshot::Coding(view) = &summary.snapshot else {
        return Ok(None);
    };
    let block = view.relay.export_block();
    export::write_block(path, &block)?;
    Ok(Some(block.native_count))
}

/// Write the sync statistics of a finished run to `path`.
///
/// Returns whether anything was written.
pub fn save_sync(summary: &MonitorSummary, path: &Path) -> Result<bool> {
    let Snapshot::Sync(report) = &summary.snapshot else {
        return Ok(false);
    };
    export::write_sync_report(path, report)?;
    Ok(true)
}

fn report_saved(frontend: Frontend, mode: Mode, path: &Path, native_count: Option<usize>) {
    match frontend {
        Frontend::Headless => {
            let event = HeadlessEvent::saved(mode, path.display().to_string(), native_count);
            if let Err(e) = HeadlessRenderer::stdout().emit(&event) {
                warn!("Failed to emit save event: {}", e);
            }
        }
        Frontend::Terminal => eprintln!("Saved {:?} results to {}", mode, path.display()),
    }
}

fn print_summary(summary: &MonitorSummary) {
    eprintln!(
        "Stopped ({:?}): {} lines applied, {} dropped, {} renders ({} failed)",
        summary.reason,
        summary.lines_applied,
        summary.lines_dropped,
        summary.renders,
        summary.render_failures
    );
}

/// `ncmon coding`
pub async fn run_coding(args: CodingArgs, settings: &Settings) -> Result<()> {
    let frontend = Frontend::from_flag(args.headless);
    let window = args.window.unwrap_or(settings.window.size);
    if window == 0 {
        return Err(Error::config_invalid("window must be at least 1"));
    }

    let mut sources = open_sources(&args.ports, settings.serial.options())?.into_iter();
    let Some(relay) = sources.next() else {
        return Err(Error::config_invalid("coding needs a relay source"));
    };

    let (shutdown_tx, shutdown_rx) = signals::shutdown_channel();
    signals::spawn_signal_handler(shutdown_tx);

    let mut monitor = Monitor::coding(relay, sources.collect(), window)
        .with_render_settings(settings.render.clone())
        .with_shutdown(shutdown_rx.clone());
    let summary = run_monitor(&mut monitor, frontend, shutdown_rx).await?;

    if args.save {
        let path = &settings.export.path;
        if let Some(native_count) = save_coding(&summary, path)? {
            report_saved(frontend, Mode::Coding, path, Some(native_count));
        }
    }

    if frontend == Frontend::Terminal {
        print_summary(&summary);
    }
    Ok(())
}

/// `ncmon sync`
pub async fn run_sync(args: SyncArgs, settings: &Settings) -> Result<()> {
    let frontend = Frontend::from_flag(args.headless);
    if args.measure == 0 {
        return Err(Error::config_invalid("--measure must be at least 1"));
    }

    let mut specs = vec![args.observer.clone()];
    specs.extend(args.peers());
    let mut sources = open_sources(&specs, settings.serial.options())?.into_iter();
    let Some(observer) = sources.next() else {
        return Err(Error::config_invalid("sync needs an observer source"));
    };

    let (shutdown_tx, shutdown_rx) = signals::shutdown_channel();
    signals::spawn_signal_handler(shutdown_tx);

    let mut monitor = Monitor::sync(observer, sources.collect(), args.measure)
        .with_render_settings(settings.render.clone())
        .with_sync_settings(settings.sync.clone())
        .with_shutdown(shutdown_rx.clone());
    let summary = run_monitor(&mut monitor, frontend, shutdown_rx).await?;

    if args.save {
        let path = &settings.export.sync_path;
        if save_sync(&summary, path)? {
            report_saved(frontend, Mode::Sync, path, None);
        }
    }

    if frontend == Frontend::Terminal {
        print_summary(&summary);
    }
    Ok(())
}

/// `ncmon replay`
pub async fn run_replay(args: ReplayArgs, settings: &Settings) -> Result<()> {
    let path = args.file.as_deref().unwrap_or(&settings.export.path);
    let view = load_replay(path, args.range)?;
    let snapshot = Snapshot::Replay(view);

    if args.headless {
        return HeadlessRenderer::stdout().emit(&HeadlessEvent::snapshot(&snapshot));
    }

    let (shutdown_tx, shutdown_rx) = signals::shutdown_channel();
    signals::spawn_signal_handler(shutdown_tx);

    let mut renderer = TerminalRenderer::init()?;
    tokio::task::block_in_place(|| renderer.hold(&snapshot, || *shutdown_rx.borrow()))?;
    renderer.restore();
    Ok(())
}

/// Read the saved blocks at `path` into a replay view.
pub fn load_replay(path: &Path, range: usize) -> Result<ReplayView> {
    let blocks = export::read_blocks(path)?;
    info!("Loaded {} saved block(s) from {}", blocks.len(), path.display());
    Ok(ReplayView::new(path.display().to_string(), blocks, range))
}

/// `ncmon ports`
pub fn print_ports() -> Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }
    for port in ports {
        println!("{:<24} {}", port.name, port.description());
    }
    Ok(())
}
