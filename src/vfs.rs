//! Shared WatFS domain types and the mount-side callback contract.
//!
//! The types here travel in both directions: the server derives them from
//! host metadata and the wire layer marshals them field by field, so both
//! endpoints agree on the schema regardless of the host ABI.

use async_trait::async_trait;

/// Convenient result alias used by all client-facing operations.
pub type WatResult<T> = Result<T, WatError>;

/// Maximum number of bytes allowed in a file path on the wire.
pub const MAX_PATH_LEN: usize = 1024;

/// Maximum number of bytes allowed in a single directory entry name.
pub const MAX_NAME_LEN: usize = 255;

/// Error reported by a client operation.
///
/// The three categories are disjoint: `Os` carries an errno captured by the
/// server's syscall, `TimedOut` means the transport retry budget was
/// exhausted, and `Protocol` marks a malformed reply (never retried).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WatError {
    /// The RPC completed but the server's syscall failed with this errno.
    Os(i32),
    /// The transport never produced a reply within the retry budget.
    TimedOut,
    /// The reply violated the wire schema.
    Protocol,
}

impl WatError {
    /// The errno equivalent of this error. The kernel bridge returns the
    /// negation of this value to userspace.
    pub fn errno(&self) -> i32 {
        match self {
            WatError::Os(err) => *err,
            WatError::TimedOut => libc::ETIMEDOUT,
            WatError::Protocol => libc::EIO,
        }
    }
}

impl std::fmt::Display for WatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatError::Os(err) => write!(f, "server errno {err}"),
            WatError::TimedOut => write!(f, "transport timed out"),
            WatError::Protocol => write!(f, "protocol violation"),
        }
    }
}

impl std::error::Error for WatError {}

/// POSIX file types carried in attribute and directory records.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, num_derive::FromPrimitive, num_derive::ToPrimitive,
)]
pub enum FileType {
    Regular = 0,
    Directory = 1,
    Symlink = 2,
    CharacterDevice = 3,
    BlockDevice = 4,
    Fifo = 5,
    Socket = 6,
}

/// Timestamp with nanosecond precision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct FileTime {
    pub seconds: i64,
    pub nanos: u32,
}

/// File attributes as marshalled on the wire.
///
/// This replaces the host's `struct stat`: every field is explicit so the
/// two endpoints do not need to share an ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttr {
    pub file_type: FileType,
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub used: u64,
    pub rdev: u64,
    pub fileid: u64,
    pub atime: FileTime,
    pub mtime: FileTime,
    pub ctime: FileTime,
}

/// One directory entry as marshalled on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub fileid: u64,
    pub file_type: FileType,
    pub name: String,
}

/// The set of callbacks the userspace-filesystem bridge delivers to a mount.
///
/// Every operation takes the textual absolute path the kernel presented.
/// The bridge maps `Ok` to `0` (or the byte count for read/write) and
/// `Err(e)` to `-e.errno()`. `flush` and `release` cannot surface errors,
/// so they are infallible here; failures are logged and absorbed.
#[async_trait]
pub trait MountOps: Send + Sync {
    async fn getattr(&self, path: &str) -> WatResult<FileAttr>;

    /// Surfaces ENOENT early; creates no server-side state.
    async fn opendir(&self, path: &str) -> WatResult<()>;

    async fn readdir(&self, path: &str) -> WatResult<Vec<(DirEntry, FileAttr)>>;

    /// Surfaces ENOENT early; creates no server-side state.
    async fn open(&self, path: &str) -> WatResult<()>;

    async fn read(&self, path: &str, offset: u64, count: u32) -> WatResult<Vec<u8>>;

    async fn write(&self, path: &str, data: &[u8], offset: u64) -> WatResult<u64>;

    async fn flush(&self, path: &str);

    async fn release(&self, path: &str);

    async fn truncate(&self, path: &str, size: u64) -> WatResult<()>;

    async fn rename(&self, from: &str, to: &str) -> WatResult<()>;

    async fn mknod(&self, path: &str, mode: u32, rdev: u64) -> WatResult<()>;

    async fn unlink(&self, path: &str) -> WatResult<()>;

    async fn mkdir(&self, path: &str, mode: u32) -> WatResult<()>;

    async fn rmdir(&self, path: &str) -> WatResult<()>;

    async fn utimens(&self, path: &str, atime: FileTime, mtime: FileTime) -> WatResult<()>;
}
