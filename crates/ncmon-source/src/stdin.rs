//! Standard-input line source, for piping another tool's output in
//! (`some-monitor | ncmon sync --observer -`).

use std::io::BufRead;

use tokio::sync::mpsc;

use ncmon_core::prelude::*;

use crate::line::{decode_line, ChannelSource, LineRead, LineSource};

/// Label used for the stdin source.
pub const STDIN_LABEL: &str = "stdin";

pub struct StdinSource {
    lines: ChannelSource,
}

impl StdinSource {
    /// Start reading this process's stdin on a background thread.
    pub fn open() -> Result<Self> {
        let (tx, lines) = ChannelSource::channel(STDIN_LABEL);
        std::thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                pump_lines(stdin.lock(), &tx);
            })?;
        Ok(Self { lines })
    }
}

/// Forward every decodable line of `reader` until EOF or until the
/// receiving side goes away.
pub(crate) fn pump_lines<R: BufRead>(mut reader: R, tx: &mpsc::Sender<String>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if let Some(line) = decode_line(&buf) {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                warn!("Reading stdin failed: {}", e);
                break;
            }
        }
    }
    debug!("stdin reader finished");
}

impl LineSource for StdinSource {
    fn label(&self) -> &str {
        self.lines.label()
    }

    fn read_line(&mut self) -> LineRead {
        self.lines.read_line()
    }

    /// The blocked reader thread cannot be interrupted; it exits on the next
    /// line or at EOF once the channel is closed.
    fn close(&mut self) {
        self.lines.close();
    }
}
