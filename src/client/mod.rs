//! The WatFS client: per-mount handle and one stub per RPC.
//!
//! Every stub builds its call, hands it to the [`channel::Channel`] retry
//! loop, and converts the reply's error field into a [`WatError`]. The
//! write path additionally feeds the cache in [`cache`].

mod cache;
mod channel;
mod mount;

pub use mount::Mount;

use std::io::{self, Cursor};

use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::parser;
use crate::serializer;
use crate::vfs::{DirEntry, FileAttr, FileTime, WatError, WatResult};
use crate::wire::{Procedure, MSG};

use cache::CommitState;
use channel::Channel;

/// Per-mount client state: the shared transport, the last known server
/// verifier, and the buffered writes awaiting commit.
pub struct WatClient {
    channel: Channel,
    state: Mutex<CommitState>,
    commit_gate: Mutex<()>,
}

impl WatClient {
    /// Connects and seeds the stored verifier with a Null probe.
    pub async fn init(config: ClientConfig) -> WatResult<Self> {
        let client = Self {
            channel: Channel::new(&config),
            state: Mutex::new(CommitState::new()),
            commit_gate: Mutex::new(()),
        };
        let verf = client.null(0).await?;
        client.state.lock().await.verf = verf;
        tracing::debug!(verf, "mount initialised");
        Ok(client)
    }

    /// Pings the server; returns its verifier.
    pub async fn null(&self, probe: u64) -> WatResult<u64> {
        let body =
            self.channel.unary(|xid| build(|buf| serializer::args::null(buf, xid, probe))).await?;
        Ok(parser::reply::verf(&mut Cursor::new(body.as_slice()))?.verf)
    }

    /// The verifier stored by the last successful commit (or by init).
    pub async fn last_verifier(&self) -> u64 {
        self.state.lock().await.verf
    }

    /// Number of writes currently buffered for replay.
    pub async fn cached_write_count(&self) -> usize {
        self.state.lock().await.writes.len()
    }

    pub async fn get_attr(&self, path: &str) -> WatResult<FileAttr> {
        let body = self
            .channel
            .unary(|xid| build(|buf| serializer::args::path_call(buf, xid, Procedure::GetAttr, path)))
            .await?;
        let reply = parser::reply::get_attr(&mut Cursor::new(body.as_slice()))?;
        match (reply.err, reply.attr) {
            (0, Some(attr)) => Ok(attr),
            (0, None) => Err(WatError::Protocol),
            (err, _) => Err(WatError::Os(err as i32)),
        }
    }

    pub async fn lookup(&self, path: &str) -> WatResult<()> {
        self.status_call(Procedure::Lookup, path).await
    }

    /// Reads up to `count` bytes at `offset`; a short result means the
    /// file ended first.
    pub async fn read(&self, path: &str, offset: u64, count: u32) -> WatResult<Vec<u8>> {
        self.channel
            .read_stream(
                |xid| build(|buf| serializer::args::read(buf, xid, path, offset, count)),
                count,
            )
            .await
    }

    pub(crate) async fn write_rpc(&self, path: &str, offset: u64, data: &[u8]) -> WatResult<u64> {
        let body = self.channel.write_stream(|xid| write_frames(xid, path, offset, data)).await?;
        let reply = parser::reply::write(&mut Cursor::new(body.as_slice()))?;
        if reply.err != 0 {
            return Err(WatError::Os(reply.err as i32));
        }
        u64::try_from(reply.size).map_err(|_| WatError::Protocol)
    }

    pub async fn truncate(&self, path: &str, size: u64) -> WatResult<()> {
        let body = self
            .channel
            .unary(|xid| build(|buf| serializer::args::truncate(buf, xid, path, size)))
            .await?;
        status(&body)
    }

    pub async fn read_dir(&self, path: &str) -> WatResult<Vec<(DirEntry, FileAttr)>> {
        self.channel
            .dir_stream(|xid| build(|buf| serializer::args::path_call(buf, xid, Procedure::Readdir, path)))
            .await
    }

    pub async fn mknod(&self, path: &str, mode: u32, rdev: u64) -> WatResult<()> {
        let body = self
            .channel
            .unary(|xid| build(|buf| serializer::args::mknod(buf, xid, path, mode, rdev)))
            .await?;
        status(&body)
    }

    pub async fn unlink(&self, path: &str) -> WatResult<()> {
        self.status_call(Procedure::Unlink, path).await
    }

    pub async fn rename(&self, source: &str, dest: &str) -> WatResult<()> {
        let body = self
            .channel
            .unary(|xid| build(|buf| serializer::args::rename(buf, xid, source, dest)))
            .await?;
        status(&body)
    }

    pub async fn mkdir(&self, path: &str, mode: u32) -> WatResult<()> {
        let body = self
            .channel
            .unary(|xid| build(|buf| serializer::args::mkdir(buf, xid, path, mode)))
            .await?;
        status(&body)
    }

    pub async fn rmdir(&self, path: &str) -> WatResult<()> {
        self.status_call(Procedure::Rmdir, path).await
    }

    pub async fn utimens(&self, path: &str, atime: FileTime, mtime: FileTime) -> WatResult<()> {
        let body = self
            .channel
            .unary(|xid| build(|buf| serializer::args::utimens(buf, xid, path, atime, mtime)))
            .await?;
        status(&body)
    }

    /// COMMIT: sends the client's stored verifier, returns the server's.
    pub async fn commit(&self, verf: u64) -> WatResult<u64> {
        let body =
            self.channel.unary(|xid| build(|buf| serializer::args::commit(buf, xid, verf))).await?;
        Ok(parser::reply::verf(&mut Cursor::new(body.as_slice()))?.verf)
    }

    async fn status_call(&self, procedure: Procedure, path: &str) -> WatResult<()> {
        let body = self
            .channel
            .unary(|xid| build(|buf| serializer::args::path_call(buf, xid, procedure, path)))
            .await?;
        status(&body)
    }
}

fn status(body: &[u8]) -> WatResult<()> {
    let reply = parser::reply::status(&mut Cursor::new(body))?;
    match reply.err {
        0 => Ok(()),
        err => Err(WatError::Os(err as i32)),
    }
}

fn build(fill: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    fill(&mut buf)?;
    Ok(buf)
}

/// Slices a write buffer into `MSG`-sized chunk frames sharing one
/// transaction id; the final chunk is flagged `last`.
fn write_frames(xid: u32, path: &str, offset: u64, data: &[u8]) -> io::Result<Vec<Vec<u8>>> {
    let total = data.len() as u64;
    if data.is_empty() {
        let frame = build(|buf| serializer::args::write_chunk(buf, xid, path, offset, 0, true, &[]))?;
        return Ok(vec![frame]);
    }

    let pieces = data.chunks(MSG).count();
    let mut frames = Vec::with_capacity(pieces);
    for (index, piece) in data.chunks(MSG).enumerate() {
        frames.push(build(|buf| {
            serializer::args::write_chunk(buf, xid, path, offset, total, index + 1 == pieces, piece)
        })?);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::parser;
    use crate::wire::{Command, MSG};

    fn decode_chunks(frames: Vec<Vec<u8>>) -> Vec<crate::wire::WriteChunk> {
        frames
            .into_iter()
            .map(|frame| match parser::call(&mut Cursor::new(frame)).unwrap() {
                (9, Command::Write(chunk)) => chunk,
                other => panic!("unexpected call: {other:?}"),
            })
            .collect()
    }

    #[test]
    fn write_frames_cover_the_buffer_exactly() {
        let data = vec![0x5a; 20000];
        let chunks = decode_chunks(super::write_frames(9, "/big", 0, &data).unwrap());

        assert_eq!(chunks.len(), 3);
        let total: usize = chunks.iter().map(|chunk| chunk.data.len()).sum();
        assert_eq!(total, 20000);
        assert!(chunks.iter().all(|chunk| chunk.data.len() <= MSG));
        assert!(chunks.iter().all(|chunk| chunk.total_size == 20000));
        assert!(chunks.iter().all(|chunk| chunk.path == "/big"));
        assert!(chunks.iter().take(2).all(|chunk| !chunk.last));
        assert!(chunks[2].last);
    }

    #[test]
    fn empty_write_is_a_single_last_chunk() {
        let chunks = decode_chunks(super::write_frames(9, "/empty", 4, &[]).unwrap());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].last);
        assert_eq!(chunks[0].total_size, 0);
        assert_eq!(chunks[0].offset, 4);
        assert!(chunks[0].data.is_empty());
    }
}
