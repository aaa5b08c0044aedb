//! Stream server: line-framed s-expression requests in, responses out.
//!
//! The landmark detector writes one request per line; each non-blank
//! line is answered with exactly one response line, in order. A line
//! is never buffered past `MAX_MESSAGE_SIZE + 1` bytes.

use std::io::{self, BufRead, Read, Write};

use anyhow::Context;
use tracing::{debug, info, warn};

use super::dispatch;
use crate::state::SessionState;

/// Maximum request line size (1 MiB).
const MAX_MESSAGE_SIZE: usize = 1_048_576;

/// Counters for one served stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub requests: u64,
    pub oversized: u64,
    pub invalid_utf8: u64,
}

/// Result of reading one request line.
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    Eof,
    Line,
    /// The line exceeded the cap; `discarded` bytes past the buffered
    /// prefix were skipped up to and including the newline.
    Oversized { discarded: u64 },
}

/// Serves one request stream against a session.
pub struct StreamServer {
    /// Log every request and response at debug level.
    pub trace: bool,
    pub stats: StreamStats,
}

impl StreamServer {
    pub fn new(trace: bool) -> Self {
        Self {
            trace,
            stats: StreamStats::default(),
        }
    }

    /// Read requests until end of input, writing one response per request.
    pub fn serve<R: BufRead, W: Write>(
        &mut self,
        state: &mut SessionState,
        mut reader: R,
        mut writer: W,
    ) -> anyhow::Result<StreamStats> {
        let mut buf = Vec::with_capacity(4096);
        loop {
            let read = read_request(&mut reader, &mut buf)
                .context("failed to read request stream")?;

            let response = match read {
                LineRead::Eof => break,
                LineRead::Oversized { discarded } => {
                    self.stats.requests += 1;
                    self.stats.oversized += 1;
                    warn!(
                        len = buf.len() as u64 + discarded,
                        "request exceeds maximum size"
                    );
                    format!(
                        "(:type :response :id 0 :status :error :reason \"request exceeds {} bytes\")",
                        MAX_MESSAGE_SIZE
                    )
                }
                LineRead::Line => {
                    let text = String::from_utf8_lossy(&buf);
                    let request = text.trim();
                    if request.is_empty() {
                        continue;
                    }
                    self.stats.requests += 1;
                    if self.trace {
                        debug!(direction = "in", "{}", request);
                    }
                    if std::str::from_utf8(&buf).is_err() {
                        self.stats.invalid_utf8 += 1;
                        warn!(len = buf.len(), "request is not valid UTF-8");
                        "(:type :response :id 0 :status :error :reason \"request is not valid UTF-8\")"
                            .to_string()
                    } else {
                        dispatch::handle_message(state, request)
                    }
                }
            };

            if self.trace {
                debug!(direction = "out", "{}", response);
            }
            writeln!(writer, "{}", response).context("failed to write response")?;
            writer.flush().context("failed to flush response")?;
        }

        info!(
            requests = self.stats.requests,
            frames = state.frames,
            "request stream closed"
        );
        Ok(self.stats)
    }
}

/// Read one line into `buf`, holding at most `MAX_MESSAGE_SIZE + 1` bytes.
fn read_request<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<LineRead> {
    buf.clear();
    let n = reader
        .by_ref()
        .take(MAX_MESSAGE_SIZE as u64 + 1)
        .read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(LineRead::Eof);
    }
    if buf.last() != Some(&b'\n') && buf.len() > MAX_MESSAGE_SIZE {
        let discarded = discard_line(reader)?;
        return Ok(LineRead::Oversized { discarded });
    }
    Ok(LineRead::Line)
}

/// Skip input up to and including the next newline without buffering it.
fn discard_line<R: BufRead>(reader: &mut R) -> io::Result<u64> {
    let mut discarded = 0;
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(discarded);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(discarded + pos as u64 + 1);
            }
            None => {
                let len = available.len();
                reader.consume(len);
                discarded += len as u64;
            }
        }
    }
}
