//! The exported directory tree a WatFS server serves from.
//!
//! Every operation resolves the client-supplied absolute path under the
//! export root, performs the one syscall the procedure names, and captures
//! the errno on failure. No open-file state survives between requests.

use std::ffi::CString;
use std::io::{self, SeekFrom};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs::{self, DirBuilder, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::task;

use crate::vfs::{DirEntry, FileAttr, FileTime, FileType};

/// Per-instance server state: the sandboxed root and the startup verifier.
pub struct Export {
    root: PathBuf,
    verifier: u64,
}

impl Export {
    /// Opens an export rooted at `root`, seeding the verifier from the
    /// startup clock so that a restarted server is distinguishable.
    pub fn new(root: PathBuf) -> io::Result<Self> {
        let seed =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as u64;
        Self::with_verifier(root, seed)
    }

    /// Opens an export with an explicit verifier.
    pub fn with_verifier(root: PathBuf, verifier: u64) -> io::Result<Self> {
        let canonical = root.canonicalize()?;
        if !std::fs::metadata(&canonical)?.is_dir() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "export root is not a directory"));
        }
        Ok(Self { root: canonical, verifier })
    }

    /// The verifier chosen at startup, reported by Null and Commit.
    pub fn verifier(&self) -> u64 {
        self.verifier
    }

    /// Borrow the canonical root path.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Resolves a client path under the root.
    ///
    /// The path is normalised lexically; a `..` that would climb above the
    /// root is rejected with `EACCES` before any filesystem access happens.
    fn resolve(&self, path: &str) -> Result<PathBuf, i32> {
        if !path.starts_with('/') {
            return Err(libc::EINVAL);
        }
        let mut rel = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(name) => rel.push(name),
                Component::ParentDir => {
                    if !rel.pop() {
                        return Err(libc::EACCES);
                    }
                }
                Component::Prefix(_) => return Err(libc::EINVAL),
            }
        }
        Ok(self.root.join(rel))
    }

    pub async fn get_attr(&self, path: &str) -> Result<FileAttr, i32> {
        let abs = self.resolve(path)?;
        let meta = fs::symlink_metadata(&abs).await.map_err(errno_of)?;
        Ok(metadata_to_attr(&meta))
    }

    pub async fn lookup(&self, path: &str) -> Result<(), i32> {
        let abs = self.resolve(path)?;
        fs::symlink_metadata(&abs).await.map_err(errno_of)?;
        Ok(())
    }

    /// Reads up to `count` bytes at `offset`. The boolean is true when the
    /// file ended before `count` bytes could be produced.
    pub async fn read(&self, path: &str, offset: u64, count: u32) -> Result<(Vec<u8>, bool), i32> {
        let abs = self.resolve(path)?;
        let mut file = File::open(&abs).await.map_err(errno_of)?;
        file.seek(SeekFrom::Start(offset)).await.map_err(errno_of)?;

        let mut buf = vec![0u8; count as usize];
        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..]).await.map_err(errno_of)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        let eof = filled < count as usize;
        buf.truncate(filled);
        Ok((buf, eof))
    }

    /// Writes the whole buffer at `offset` through an `O_SYNC` descriptor,
    /// so the data is durable before the reply leaves the server.
    pub async fn write(&self, path: &str, offset: u64, data: &[u8]) -> Result<u64, i32> {
        let abs = self.resolve(path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&abs)
            .await
            .map_err(errno_of)?;
        file.seek(SeekFrom::Start(offset)).await.map_err(errno_of)?;
        file.write_all(data).await.map_err(errno_of)?;
        Ok(data.len() as u64)
    }

    pub async fn truncate(&self, path: &str, size: u64) -> Result<(), i32> {
        let abs = self.resolve(path)?;
        blocking(move || {
            let c_path = cstring(&abs)?;
            check(unsafe { libc::truncate(c_path.as_ptr(), size as libc::off_t) })
        })
        .await
    }

    /// Lists a directory, synthesizing `.` and `..` (the parent is clamped
    /// to the export root) so each entry carries correct attributes.
    pub async fn read_dir(&self, path: &str) -> Result<Vec<(DirEntry, FileAttr)>, i32> {
        let abs = self.resolve(path)?;
        let dir_meta = fs::symlink_metadata(&abs).await.map_err(errno_of)?;
        if !dir_meta.is_dir() {
            return Err(libc::ENOTDIR);
        }

        let parent = if abs == self.root {
            self.root.clone()
        } else {
            abs.parent().unwrap_or(&self.root).to_path_buf()
        };
        let parent_meta = fs::symlink_metadata(&parent).await.map_err(errno_of)?;

        let mut entries = vec![
            (synthetic_entry(".", &dir_meta), metadata_to_attr(&dir_meta)),
            (synthetic_entry("..", &parent_meta), metadata_to_attr(&parent_meta)),
        ];

        let mut reader = fs::read_dir(&abs).await.map_err(errno_of)?;
        while let Some(entry) = reader.next_entry().await.map_err(errno_of)? {
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                // the entry vanished between listing and stat
                Err(err) => {
                    tracing::debug!(name = ?entry.file_name(), ?err, "skipping unstattable entry");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push((
                DirEntry { fileid: meta.ino(), file_type: type_of(&meta), name },
                metadata_to_attr(&meta),
            ));
        }
        Ok(entries)
    }

    /// Creates a FIFO when the mode says so, otherwise any other node kind
    /// (regular files included) through `mknod`.
    pub async fn mk_node(&self, path: &str, mode: u32, rdev: u64) -> Result<(), i32> {
        let abs = self.resolve(path)?;
        blocking(move || {
            let c_path = cstring(&abs)?;
            let mode = mode as libc::mode_t;
            let result = if mode & libc::S_IFMT == libc::S_IFIFO {
                unsafe { libc::mkfifo(c_path.as_ptr(), mode) }
            } else {
                unsafe { libc::mknod(c_path.as_ptr(), mode, rdev as libc::dev_t) }
            };
            check(result)
        })
        .await
    }

    pub async fn unlink(&self, path: &str) -> Result<(), i32> {
        let abs = self.resolve(path)?;
        fs::remove_file(&abs).await.map_err(errno_of)
    }

    pub async fn rename(&self, source: &str, dest: &str) -> Result<(), i32> {
        let from = self.resolve(source)?;
        let to = self.resolve(dest)?;
        fs::rename(&from, &to).await.map_err(errno_of)
    }

    pub async fn mk_dir(&self, path: &str, mode: u32) -> Result<(), i32> {
        let abs = self.resolve(path)?;
        DirBuilder::new().mode(mode).create(&abs).await.map_err(errno_of)
    }

    pub async fn rm_dir(&self, path: &str) -> Result<(), i32> {
        let abs = self.resolve(path)?;
        fs::remove_dir(&abs).await.map_err(errno_of)
    }

    pub async fn utimens(&self, path: &str, atime: FileTime, mtime: FileTime) -> Result<(), i32> {
        let abs = self.resolve(path)?;
        blocking(move || {
            let c_path = cstring(&abs)?;
            let times = [timespec(atime), timespec(mtime)];
            check(unsafe {
                libc::utimensat(libc::AT_FDCWD, c_path.as_ptr(), times.as_ptr(), libc::AT_SYMLINK_NOFOLLOW)
            })
        })
        .await
    }
}

/// Translate host metadata into the wire-facing attribute representation.
pub fn metadata_to_attr(meta: &std::fs::Metadata) -> FileAttr {
    FileAttr {
        file_type: type_of(meta),
        mode: meta.mode(),
        nlink: meta.nlink() as u32,
        uid: meta.uid(),
        gid: meta.gid(),
        size: meta.size(),
        used: meta.blocks().saturating_mul(512),
        rdev: meta.rdev(),
        fileid: meta.ino(),
        atime: FileTime { seconds: meta.atime(), nanos: meta.atime_nsec() as u32 },
        mtime: FileTime { seconds: meta.mtime(), nanos: meta.mtime_nsec() as u32 },
        ctime: FileTime { seconds: meta.ctime(), nanos: meta.ctime_nsec() as u32 },
    }
}

fn type_of(meta: &std::fs::Metadata) -> FileType {
    let file_type = meta.file_type();
    if file_type.is_dir() {
        FileType::Directory
    } else if file_type.is_file() {
        FileType::Regular
    } else if file_type.is_symlink() {
        FileType::Symlink
    } else if file_type.is_char_device() {
        FileType::CharacterDevice
    } else if file_type.is_block_device() {
        FileType::BlockDevice
    } else if file_type.is_fifo() {
        FileType::Fifo
    } else if file_type.is_socket() {
        FileType::Socket
    } else {
        FileType::Regular
    }
}

fn synthetic_entry(name: &str, meta: &std::fs::Metadata) -> DirEntry {
    DirEntry { fileid: meta.ino(), file_type: type_of(meta), name: name.to_owned() }
}

/// Map a host I/O error to the errno it carries.
fn errno_of(err: io::Error) -> i32 {
    err.raw_os_error().unwrap_or(libc::EIO)
}

fn check(result: libc::c_int) -> Result<(), i32> {
    if result == -1 {
        Err(io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO))
    } else {
        Ok(())
    }
}

fn cstring(path: &Path) -> Result<CString, i32> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| libc::EINVAL)
}

fn timespec(time: FileTime) -> libc::timespec {
    libc::timespec { tv_sec: time.seconds as libc::time_t, tv_nsec: time.nanos as libc::c_long }
}

async fn blocking<F>(op: F) -> Result<(), i32>
where
    F: FnOnce() -> Result<(), i32> + Send + 'static,
{
    task::spawn_blocking(op).await.map_err(|_| libc::EIO)?
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::Export;

    fn export() -> (TempDir, Export) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let export = Export::with_verifier(dir.path().to_path_buf(), 1).expect("open export");
        (dir, export)
    }

    #[test]
    fn resolve_strips_dot_components() {
        let (_dir, export) = export();
        let abs = export.resolve("/a/./b").unwrap();
        assert_eq!(abs, export.root_path().join("a/b"));
    }

    #[test]
    fn resolve_allows_interior_parent_components() {
        let (_dir, export) = export();
        let abs = export.resolve("/a/../b").unwrap();
        assert_eq!(abs, export.root_path().join("b"));
    }

    #[test]
    fn resolve_rejects_escape_above_root() {
        let (_dir, export) = export();
        assert_eq!(export.resolve("/../etc/passwd"), Err(libc::EACCES));
        assert_eq!(export.resolve("/a/../../etc"), Err(libc::EACCES));
    }

    #[test]
    fn resolve_rejects_relative_paths() {
        let (_dir, export) = export();
        assert_eq!(export.resolve("relative"), Err(libc::EINVAL));
    }

    #[tokio::test]
    async fn get_attr_matches_direct_stat() {
        use std::os::unix::fs::MetadataExt;

        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("probe"), b"12345").expect("write fixture");
        let export = Export::with_verifier(dir.path().to_path_buf(), 1).expect("open export");

        let attr = export.get_attr("/probe").await.expect("getattr succeeds");
        let meta = std::fs::symlink_metadata(dir.path().join("probe")).expect("stat fixture");

        assert_eq!(attr, super::metadata_to_attr(&meta));
        assert_eq!(attr.size, 5);
        assert_eq!(attr.fileid, meta.ino());
    }
}
