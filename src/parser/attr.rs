//! Parsing of the shared attribute and directory-entry records.

use std::io::Read;

use crate::parser::primitive::{i64, string_max_size, u32, u64, variant};
use crate::parser::Result;
use crate::vfs::{DirEntry, FileAttr, FileTime, MAX_NAME_LEN};

/// Parses a timestamp: seconds followed by nanoseconds.
pub fn file_time(src: &mut impl Read) -> Result<FileTime> {
    Ok(FileTime { seconds: i64(src)?, nanos: u32(src)? })
}

/// Parses a [`FileAttr`] record, field by field in schema order.
pub fn file_attr(src: &mut impl Read) -> Result<FileAttr> {
    Ok(FileAttr {
        file_type: variant(src)?,
        mode: u32(src)?,
        nlink: u32(src)?,
        uid: u32(src)?,
        gid: u32(src)?,
        size: u64(src)?,
        used: u64(src)?,
        rdev: u64(src)?,
        fileid: u64(src)?,
        atime: file_time(src)?,
        mtime: file_time(src)?,
        ctime: file_time(src)?,
    })
}

/// Parses a [`DirEntry`] record.
pub fn dir_entry(src: &mut impl Read) -> Result<DirEntry> {
    Ok(DirEntry {
        fileid: u64(src)?,
        file_type: variant(src)?,
        name: string_max_size(src, MAX_NAME_LEN)?,
    })
}
