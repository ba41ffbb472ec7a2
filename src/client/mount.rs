//! The upper-layer adapter: VFS callbacks mapped onto the RPC stubs.

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::vfs::{DirEntry, FileAttr, FileTime, MountOps, WatResult};

use super::WatClient;

/// The per-mount context handed to the kernel bridge.
pub struct Mount {
    client: WatClient,
}

impl Mount {
    /// Builds the per-mount client and seeds the verifier from the server.
    pub async fn init(config: ClientConfig) -> WatResult<Self> {
        Ok(Self { client: WatClient::init(config).await? })
    }

    /// The underlying client handle.
    pub fn client(&self) -> &WatClient {
        &self.client
    }
}

#[async_trait]
impl MountOps for Mount {
    async fn getattr(&self, path: &str) -> WatResult<FileAttr> {
        self.client.get_attr(path).await
    }

    async fn opendir(&self, path: &str) -> WatResult<()> {
        self.client.lookup(path).await
    }

    async fn readdir(&self, path: &str) -> WatResult<Vec<(DirEntry, FileAttr)>> {
        self.client.read_dir(path).await
    }

    async fn open(&self, path: &str) -> WatResult<()> {
        self.client.lookup(path).await
    }

    async fn read(&self, path: &str, offset: u64, count: u32) -> WatResult<Vec<u8>> {
        self.client.read(path, offset, count).await
    }

    async fn write(&self, path: &str, data: &[u8], offset: u64) -> WatResult<u64> {
        self.client.write(path, data, offset).await
    }

    async fn flush(&self, path: &str) {
        if let Err(err) = self.client.commit_cached().await {
            tracing::warn!(path, %err, "commit on flush failed; error absorbed");
        }
    }

    async fn release(&self, path: &str) {
        if let Err(err) = self.client.commit_cached().await {
            tracing::warn!(path, %err, "commit on release failed; error absorbed");
        }
    }

    async fn truncate(&self, path: &str, size: u64) -> WatResult<()> {
        self.client.truncate(path, size).await
    }

    async fn rename(&self, from: &str, to: &str) -> WatResult<()> {
        self.client.rename(from, to).await
    }

    async fn mknod(&self, path: &str, mode: u32, rdev: u64) -> WatResult<()> {
        self.client.mknod(path, mode, rdev).await
    }

    async fn unlink(&self, path: &str) -> WatResult<()> {
        self.client.unlink(path).await
    }

    async fn mkdir(&self, path: &str, mode: u32) -> WatResult<()> {
        self.client.mkdir(path, mode).await
    }

    async fn rmdir(&self, path: &str) -> WatResult<()> {
        self.client.rmdir(path).await
    }

    async fn utimens(&self, path: &str, atime: FileTime, mtime: FileTime) -> WatResult<()> {
        self.client.utimens(path, atime, mtime).await
    }
}
