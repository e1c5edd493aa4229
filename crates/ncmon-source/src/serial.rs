//! Serial-port line source
//!
//! The port is opened with a short read timeout and read on a dedicated OS
//! thread. Timeouts are not errors: the thread just checks its stop flag and
//! reads again, so partially received lines survive across timeouts.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use tokio::sync::mpsc;

use ncmon_core::prelude::*;

use crate::line::{decode_line, ChannelSource, LineRead, LineSource};

/// A line longer than this without a newline is flushed as-is.
const MAX_PENDING_BYTES: usize = 8 * 1024;

/// Port parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialOptions {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for SerialOptions {
    fn default() -> Self {
        Self {
            baud_rate: 921_600,
            read_timeout: Duration::from_millis(10),
        }
    }
}

/// Length of `bytes` minus a trailing multi-byte UTF-8 sequence that is not
/// complete yet.
fn flush_point(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for i in (len.saturating_sub(4)..len).rev() {
        let width = match bytes[i] {
            0x80..=0xBF => continue,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if i + width > len { i } else { len };
    }
    len
}

/// Splits a byte stream into newline-terminated lines.
#[derive(Debug, Default)]
pub(crate) struct LineAssembler {
    pending: Vec<u8>,
}

impl LineAssembler {
    /// Feed raw bytes; returns every complete, decodable line.
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == b'\n' {
                lines.extend(decode_line(&self.pending));
                self.pending.clear();
            } else {
                self.pending.push(b);
                if self.pending.len() >= MAX_PENDING_BYTES {
                    let cut = flush_point(&self.pending);
                    lines.extend(decode_line(&self.pending[..cut]));
                    self.pending.drain(..cut);
                }
            }
        }
        lines
    }

    /// Whatever is left after the stream ended.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = decode_line(&self.pending);
        self.pending.clear();
        rest
    }
}

/// A serial port read on a background thread.
pub struct SerialSource {
    lines: ChannelSource,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl SerialSource {
    /// Open `path`, discard anything already buffered, and start reading.
    pub fn open(path: &str, options: SerialOptions) -> Result<Self> {
        info!(
            "Opening serial port {} at {} baud",
            path, options.baud_rate
        );

        let port = serialport::new(path, options.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(options.read_timeout)
            .open()
            .map_err(|e| Error::source_open(path, e.to_string()))?;

        // Boards dump boot chatter on reset; start from a clean slate
        if let Err(e) = port.clear(ClearBuffer::Input) {
            warn!("Could not clear input buffer of {}: {}", path, e);
        }

        let (tx, lines) = ChannelSource::channel(path);
        let stop = Arc::new(AtomicBool::new(false));

        let reader = std::thread::Builder::new()
            .name(format!("serial-{}", path))
            .spawn({
                let stop = Arc::clone(&stop);
                let label = path.to_string();
                move || Self::reader_loop(port, tx, stop, label)
            })?;

        Ok(Self {
            lines,
            stop,
            reader: Some(reader),
        })
    }

    fn reader_loop(
        mut port: Box<dyn SerialPort>,
        tx: mpsc::Sender<String>,
        stop: Arc<AtomicBool>,
        label: String,
    ) {
        let mut assembler = LineAssembler::default();
        let mut buf = [0u8; 1024];

        while !stop.load(Ordering::Acquire) {
            match port.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    for line in assembler.feed(&buf[..n]) {
                        trace!("{}: {}", label, line);
                        if tx.blocking_send(line).is_err() {
                            debug!("Serial line channel for {} closed", label);
                            return;
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => continue,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Serial port {} failed: {}", label, e);
                    break;
                }
            }
        }

        if let Some(rest) = assembler.finish() {
            let _ = tx.blocking_send(rest);
        }
        info!("Serial reader for {} finished", label);
    }
}

impl LineSource for SerialSource {
    fn label(&self) -> &str {
        self.lines.label()
    }

    fn read_line(&mut self) -> LineRead {
        self.lines.read_line()
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.lines.close();
        // The reader wakes within one read timeout
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                error!("Serial reader thread for {} panicked", self.lines.label());
            }
        }
    }
}

impl Drop for SerialSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}
