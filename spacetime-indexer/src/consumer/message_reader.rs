//! Newline-delimited JSON message input.

use std::io::BufRead;
use std::thread;

use spacetime_indexer_shared::Message;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::errors::IngestError;

/// Default number of messages read ahead of the pipeline.
pub const DEFAULT_READ_AHEAD: usize = 1000;

/// Reads one message envelope per line.
///
/// Blank lines are skipped. Lines that are not valid UTF-8 or not valid
/// envelopes are logged and skipped; envelopes of types other than `object`
/// or `dataset` are dropped. A read error is yielded once and ends the input.
pub struct MessageReader<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
    skipped: usize,
    failed: bool,
}

impl<R: BufRead> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
            skipped: 0,
            failed: false,
        }
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn skip(&mut self, error: &dyn std::fmt::Display) {
        self.skipped += 1;
        warn!(line = self.line_number, error = %error, "Skipping malformed message");
    }
}

impl<R: BufRead + Send + 'static> MessageReader<R> {
    /// Read on a dedicated thread and hand messages over through a bounded
    /// channel.
    ///
    /// Reading stops once the returned stream is dropped.
    pub fn spawn(
        self,
        read_ahead: usize,
    ) -> Result<ReceiverStream<Result<Message, IngestError>>, IngestError> {
        let (sender, receiver) = mpsc::channel(read_ahead.max(1));

        thread::Builder::new()
            .name("message-reader".to_string())
            .spawn(move || {
                for message in self {
                    if sender.blocking_send(message).is_err() {
                        debug!("Message receiver dropped, stopping reader");
                        break;
                    }
                }
            })
            .map_err(|e| {
                IngestError::consumer(format!("Failed to start reader thread: {}", e))
            })?;

        Ok(ReceiverStream::new(receiver))
    }
}

impl<R: BufRead> Iterator for MessageReader<R> {
    type Item = Result<Message, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(IngestError::consumer(format!(
                        "Failed to read line {}: {}",
                        self.line_number + 1,
                        e
                    ))));
                }
            }
            self.line_number += 1;

            let line = match std::str::from_utf8(&self.buffer) {
                Ok(line) => line.trim(),
                Err(e) => {
                    self.skip(&e);
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            match Message::from_line(line) {
                Ok(Some(message)) => return Some(Ok(message)),
                Ok(None) => {
                    debug!(line = self.line_number, "Dropping message of unhandled type");
                }
                Err(e) => self.skip(&e),
            }
        }
    }
}
