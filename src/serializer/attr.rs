//! Serialization of the shared attribute and directory-entry records.

use std::io::{self, Write};

use crate::serializer::{i64, string_max_size, u32, u64, variant};
use crate::vfs::{DirEntry, FileAttr, FileTime, MAX_NAME_LEN};

/// Serializes a timestamp: seconds followed by nanoseconds.
pub fn file_time(dest: &mut dyn Write, time: FileTime) -> io::Result<()> {
    i64(dest, time.seconds).and_then(|_| u32(dest, time.nanos))
}

/// Serializes a [`FileAttr`] record, field by field in schema order.
pub fn file_attr(dest: &mut impl Write, attr: &FileAttr) -> io::Result<()> {
    variant(dest, attr.file_type)?;
    u32(dest, attr.mode)?;
    u32(dest, attr.nlink)?;
    u32(dest, attr.uid)?;
    u32(dest, attr.gid)?;
    u64(dest, attr.size)?;
    u64(dest, attr.used)?;
    u64(dest, attr.rdev)?;
    u64(dest, attr.fileid)?;
    file_time(dest, attr.atime)?;
    file_time(dest, attr.mtime)?;
    file_time(dest, attr.ctime)
}

/// Serializes a [`DirEntry`] record.
pub fn dir_entry(dest: &mut impl Write, entry: &DirEntry) -> io::Result<()> {
    u64(dest, entry.fileid)?;
    variant(dest, entry.file_type)?;
    string_max_size(dest, &entry.name, MAX_NAME_LEN)
}
