//! Line sources
//!
//! A source hands the ingestion loop one newline-terminated line at a time,
//! reports `Idle` when the read timeout passed with no complete line, and
//! fails with a [`TransportError`] when the link is gone.
//!
//! The serial port is a blocking reader. Each line is read on tokio's
//! blocking pool and the port handle comes back with the result, so there is
//! never more than one read in flight and nothing queues between the port and
//! the sink.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use async_trait::async_trait;
use log::{debug, info, warn};
use serialport::SerialPort;

use crate::config::BridgeConfig;
use crate::error::TransportError;

/// Longest line kept before it is handed on unterminated
pub const MAX_LINE_LEN: usize = 4096;

/// What one read produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// One line, terminator included when present
    Line(Vec<u8>),
    /// Read timed out with no complete line
    Idle,
}

/// Async producer of raw lines
#[async_trait]
pub trait LineSource: Send {
    /// Wait for the next line or the read timeout
    async fn next_line(&mut self) -> Result<LineEvent, TransportError>;
}

/// Pull one line out of `reader`, keeping any partial tail in `pending`
fn read_line<R: Read + ?Sized>(
    reader: &mut R,
    pending: &mut Vec<u8>,
) -> Result<LineEvent, TransportError> {
    let mut chunk = [0u8; 256];
    loop {
        if let Some(end) = pending.iter().position(|&b| b == b'\n') {
            return Ok(LineEvent::Line(pending.drain(..=end).collect()));
        }
        if pending.len() >= MAX_LINE_LEN {
            warn!("{} bytes without a newline, flushing", pending.len());
            return Ok(LineEvent::Line(std::mem::take(pending)));
        }

        match reader.read(&mut chunk) {
            Ok(0) => {
                if pending.is_empty() {
                    return Err(TransportError::Closed);
                }
                return Ok(LineEvent::Line(std::mem::take(pending)));
            }
            Ok(n) => pending.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                return Ok(LineEvent::Idle);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::Io(e)),
        }
    }
}

/// Any blocking reader (serial port, pipe, file) read line by line
pub struct BlockingLineSource<R> {
    reader: Option<R>,
    pending: Vec<u8>,
}

impl<R: Read + Send + 'static> BlockingLineSource<R> {
    /// Take ownership of `reader`; its read timeout becomes the idle tick
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            pending: Vec::new(),
        }
    }
}

#[async_trait]
impl<R: Read + Send + 'static> LineSource for BlockingLineSource<R> {
    async fn next_line(&mut self) -> Result<LineEvent, TransportError> {
        let mut reader = self.reader.take().ok_or(TransportError::Closed)?;
        let mut pending = std::mem::take(&mut self.pending);

        let (reader, pending, result) = tokio::task::spawn_blocking(move || {
            let result = read_line(&mut reader, &mut pending);
            (reader, pending, result)
        })
        .await
        .map_err(|e| TransportError::Task(e.to_string()))?;

        self.reader = Some(reader);
        self.pending = pending;
        result
    }
}

/// Serial port source
pub type SerialLineSource = BlockingLineSource<Box<dyn SerialPort>>;

/// Open the configured serial port
pub fn open_serial(config: &BridgeConfig) -> Result<SerialLineSource, TransportError> {
    let port = serialport::new(config.port.as_str(), config.baud_rate)
        .timeout(config.read_timeout())
        .open()
        .map_err(|source| TransportError::Open {
            port: config.port.clone(),
            source,
        })?;

    info!("listening on {} at {} baud", config.port, config.baud_rate);
    Ok(BlockingLineSource::new(port))
}

/// Scripted source for tests and replays; closes when exhausted
#[derive(Debug, Default)]
pub struct MemoryLineSource {
    events: VecDeque<LineEvent>,
}

impl MemoryLineSource {
    /// Empty source, closed on the first read
    pub fn new() -> Self {
        Self::default()
    }

    /// One line per item, newline appended
    pub fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut source = Self::new();
        for line in lines {
            source.push_line(line);
        }
        source
    }

    /// Queue `line` plus a trailing newline
    pub fn push_line(&mut self, line: impl AsRef<[u8]>) {
        let mut bytes = line.as_ref().to_vec();
        bytes.push(b'\n');
        self.events.push_back(LineEvent::Line(bytes));
    }

    /// Queue one read timeout
    pub fn push_idle(&mut self) {
        self.events.push_back(LineEvent::Idle);
    }

    /// Events not yet handed out
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl LineSource for MemoryLineSource {
    async fn next_line(&mut self) -> Result<LineEvent, TransportError> {
        match self.events.pop_front() {
            Some(event) => Ok(event),
            None => {
                debug!("memory source exhausted");
                Err(TransportError::Closed)
            }
        }
    }
}
