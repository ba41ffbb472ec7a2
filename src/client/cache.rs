//! The client write cache and the commit/replay engine.

use crate::vfs::WatResult;

use super::WatClient;

/// One buffered write, kept until a commit confirms the server held its
/// verifier since the write was acknowledged.
#[derive(Debug, Clone)]
pub(crate) struct CachedWrite {
    pub path: String,
    pub offset: u64,
    pub data: Vec<u8>,
}

/// The stored verifier and the ordered buffered writes, guarded by the
/// handle's mutex.
pub(crate) struct CommitState {
    pub verf: u64,
    pub writes: Vec<CachedWrite>,
}

impl CommitState {
    pub fn new() -> Self {
        Self { verf: 0, writes: Vec::new() }
    }
}

impl WatClient {
    /// Buffers the write, then forwards it. The cached record is retained
    /// whether or not the RPC succeeds, so a later commit can replay it.
    pub async fn write(&self, path: &str, data: &[u8], offset: u64) -> WatResult<u64> {
        {
            let mut state = self.state.lock().await;
            state.writes.push(CachedWrite {
                path: path.to_owned(),
                offset,
                data: data.to_vec(),
            });
        }
        self.write_rpc(path, offset, data).await
    }

    /// Commits the buffered writes.
    ///
    /// If the server's verifier matches the stored one, the buffered
    /// writes are known durable and are dropped. If it changed, the server
    /// restarted since they were acknowledged: every buffered write is
    /// replayed in order and committed again, until two consecutive
    /// commits agree.
    ///
    /// The state mutex is not held across the replay RPCs; the cache is
    /// snapshotted first and only the snapshotted prefix is drained at the
    /// end, so writes that arrive concurrently survive for the next
    /// commit.
    pub async fn commit_cached(&self) -> WatResult<()> {
        let _gate = self.commit_gate.lock().await;

        let (stored, snapshot) = {
            let state = self.state.lock().await;
            (state.verf, state.writes.clone())
        };

        let mut current = self.commit(stored).await?;
        if current != stored {
            tracing::warn!(
                stored,
                current,
                buffered = snapshot.len(),
                "server verifier changed; replaying buffered writes"
            );
            loop {
                for write in &snapshot {
                    self.write_rpc(&write.path, write.offset, &write.data).await?;
                }
                let next = self.commit(current).await?;
                if next == current {
                    break;
                }
                current = next;
            }
        }

        let mut state = self.state.lock().await;
        state.verf = current;
        let drained = snapshot.len().min(state.writes.len());
        state.writes.drain(..drained);
        Ok(())
    }
}
