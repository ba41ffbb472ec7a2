//! The client transport: one shared connection, wait-for-ready
//! reconnection, per-attempt deadlines, and bounded retry with backoff.

use std::io::{self, Cursor};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time;
use tokio::time::error::Elapsed;

use crate::config::ClientConfig;
use crate::frame;
use crate::parser::{self, primitive};
use crate::vfs::{DirEntry, FileAttr, WatError, WatResult};

/// Failure of one RPC attempt.
///
/// `Transport` failures reset the connection and feed the retry loop;
/// `App` carries a server errno through unchanged; `Protocol` poisons the
/// connection and surfaces immediately, never retried.
enum AttemptError {
    Transport(io::Error),
    App(WatError),
    Protocol,
}

impl From<io::Error> for AttemptError {
    fn from(err: io::Error) -> Self {
        AttemptError::Transport(err)
    }
}

impl From<parser::Error> for AttemptError {
    fn from(_: parser::Error) -> Self {
        AttemptError::Protocol
    }
}

enum Settled<T> {
    Done(WatResult<T>),
    Retry,
}

/// Shared transport for all stubs of one mount.
///
/// An RPC exchange holds the connection for its whole duration (streams
/// included), so frames of distinct calls never interleave.
pub struct Channel {
    addr: String,
    deadline: Duration,
    retry_limit: u32,
    backoff_start: Duration,
    backoff_cap: Duration,
    conn: Mutex<Option<TcpStream>>,
    xid: AtomicU32,
}

impl Channel {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            addr: config.server.clone(),
            deadline: Duration::from_secs(config.deadline_secs),
            retry_limit: config.retry_limit.max(1),
            backoff_start: Duration::from_millis(config.backoff_start_ms),
            backoff_cap: Duration::from_millis(config.backoff_cap_ms),
            conn: Mutex::new(None),
            xid: AtomicU32::new(1),
        }
    }

    fn next_xid(&self) -> u32 {
        self.xid.fetch_add(1, Ordering::Relaxed)
    }

    /// One frame out, one frame in. Returns the reply body after the
    /// transaction id.
    pub async fn unary<F>(&self, build: F) -> WatResult<Vec<u8>>
    where
        F: Fn(u32) -> io::Result<Vec<u8>>,
    {
        let mut backoff = self.backoff_start;
        for attempt in 0..self.retry_limit {
            let xid = self.next_xid();
            let call = build(xid).map_err(|_| WatError::Protocol)?;

            let mut conn = self.conn.lock().await;
            let outcome = time::timeout(self.deadline, async {
                let stream = ready(&self.addr, &mut *conn).await?;
                frame::write_frame(stream, &call).await?;
                recv_reply(stream, xid).await
            })
            .await;
            match settle(&mut *conn, outcome) {
                Settled::Done(result) => return result,
                Settled::Retry => {}
            }
            drop(conn);
            backoff = self.pause(attempt, backoff).await;
        }
        Err(WatError::TimedOut)
    }

    /// One frame out, a chunk stream in. Accumulates up to `want` bytes;
    /// a transport failure mid-stream discards the partial buffer and
    /// restarts the stream from scratch.
    pub async fn read_stream<F>(&self, build: F, want: u32) -> WatResult<Vec<u8>>
    where
        F: Fn(u32) -> io::Result<Vec<u8>>,
    {
        let mut backoff = self.backoff_start;
        for attempt in 0..self.retry_limit {
            let xid = self.next_xid();
            let call = build(xid).map_err(|_| WatError::Protocol)?;

            let mut conn = self.conn.lock().await;
            let outcome = time::timeout(self.deadline, async {
                let stream = ready(&self.addr, &mut *conn).await?;
                frame::write_frame(stream, &call).await?;

                let mut data = Vec::with_capacity(want as usize);
                loop {
                    let body = recv_reply(stream, xid).await?;
                    let chunk = parser::reply::read_chunk(&mut Cursor::new(body.as_slice()))?;
                    if chunk.err != 0 || chunk.count < 0 {
                        let errno = if chunk.err != 0 { chunk.err as i32 } else { libc::EIO };
                        return Err(AttemptError::App(WatError::Os(errno)));
                    }
                    if chunk.data.len() != chunk.count as usize {
                        return Err(AttemptError::Protocol);
                    }
                    data.extend_from_slice(&chunk.data);
                    if data.len() > want as usize {
                        return Err(AttemptError::Protocol);
                    }
                    if chunk.eof || data.len() == want as usize {
                        return Ok(data);
                    }
                }
            })
            .await;
            match settle(&mut *conn, outcome) {
                Settled::Done(result) => return result,
                Settled::Retry => {}
            }
            drop(conn);
            backoff = self.pause(attempt, backoff).await;
        }
        Err(WatError::TimedOut)
    }

    /// A chunk stream out, one frame in. The whole stream is the retry
    /// boundary: any transport failure resends every chunk.
    pub async fn write_stream<F>(&self, build: F) -> WatResult<Vec<u8>>
    where
        F: Fn(u32) -> io::Result<Vec<Vec<u8>>>,
    {
        let mut backoff = self.backoff_start;
        for attempt in 0..self.retry_limit {
            let xid = self.next_xid();
            let chunks = build(xid).map_err(|_| WatError::Protocol)?;

            let mut conn = self.conn.lock().await;
            let outcome = time::timeout(self.deadline, async {
                let stream = ready(&self.addr, &mut *conn).await?;
                for chunk in &chunks {
                    frame::write_frame(stream, chunk).await?;
                }
                recv_reply(stream, xid).await
            })
            .await;
            match settle(&mut *conn, outcome) {
                Settled::Done(result) => return result,
                Settled::Retry => {}
            }
            drop(conn);
            backoff = self.pause(attempt, backoff).await;
        }
        Err(WatError::TimedOut)
    }

    /// One frame out, an entry stream in, terminated by the `last` frame.
    pub async fn dir_stream<F>(&self, build: F) -> WatResult<Vec<(DirEntry, FileAttr)>>
    where
        F: Fn(u32) -> io::Result<Vec<u8>>,
    {
        let mut backoff = self.backoff_start;
        for attempt in 0..self.retry_limit {
            let xid = self.next_xid();
            let call = build(xid).map_err(|_| WatError::Protocol)?;

            let mut conn = self.conn.lock().await;
            let outcome = time::timeout(self.deadline, async {
                let stream = ready(&self.addr, &mut *conn).await?;
                frame::write_frame(stream, &call).await?;

                let mut entries = Vec::new();
                loop {
                    let body = recv_reply(stream, xid).await?;
                    let frame = parser::reply::readdir_entry(&mut Cursor::new(body.as_slice()))?;
                    if frame.err != 0 {
                        return Err(AttemptError::App(WatError::Os(frame.err as i32)));
                    }
                    if let Some(entry) = frame.entry {
                        entries.push(entry);
                    }
                    if frame.last {
                        return Ok(entries);
                    }
                }
            })
            .await;
            match settle(&mut *conn, outcome) {
                Settled::Done(result) => return result,
                Settled::Retry => {}
            }
            drop(conn);
            backoff = self.pause(attempt, backoff).await;
        }
        Err(WatError::TimedOut)
    }

    /// Sleeps the current backoff (unless the budget is spent) and returns
    /// the next one, doubled up to the cap.
    async fn pause(&self, attempt: u32, backoff: Duration) -> Duration {
        if attempt + 1 < self.retry_limit {
            tracing::debug!(attempt, ?backoff, "transport failure; backing off");
            time::sleep(backoff).await;
        }
        (backoff * 2).min(self.backoff_cap)
    }
}

/// Ensures a live connection, dialing the server if necessary.
async fn ready<'a>(
    addr: &str,
    conn: &'a mut Option<TcpStream>,
) -> Result<&'a mut TcpStream, AttemptError> {
    if conn.is_none() {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        *conn = Some(stream);
    }
    match conn {
        Some(stream) => Ok(stream),
        None => Err(AttemptError::Transport(io::Error::other("connection unavailable"))),
    }
}

/// Receives one reply frame, checks its transaction id, and returns the
/// body that follows it.
async fn recv_reply(stream: &mut TcpStream, xid: u32) -> Result<Vec<u8>, AttemptError> {
    let body = frame::read_frame(stream).await?.ok_or_else(|| {
        AttemptError::Transport(io::Error::new(
            io::ErrorKind::ConnectionAborted,
            "server closed the connection",
        ))
    })?;
    let mut src = Cursor::new(body.as_slice());
    if primitive::u32(&mut src)? != xid {
        return Err(AttemptError::Protocol);
    }
    Ok(body[4..].to_vec())
}

fn settle<T>(
    conn: &mut Option<TcpStream>,
    outcome: Result<Result<T, AttemptError>, Elapsed>,
) -> Settled<T> {
    match outcome {
        Ok(Ok(value)) => Settled::Done(Ok(value)),
        Ok(Err(AttemptError::App(err))) => Settled::Done(Err(err)),
        Ok(Err(AttemptError::Protocol)) => {
            *conn = None;
            Settled::Done(Err(WatError::Protocol))
        }
        Ok(Err(AttemptError::Transport(err))) => {
            tracing::debug!(%err, "transport error");
            *conn = None;
            Settled::Retry
        }
        Err(_elapsed) => {
            tracing::debug!("attempt deadline expired");
            *conn = None;
            Settled::Retry
        }
    }
}
