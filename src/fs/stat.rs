//! File metadata and stat synthesis.
//!
//! The persistent layer can usually produce complete native metadata; the
//! memory layer only knows an entry's type, size and timestamps. Each layer
//! therefore answers a stat with a [`StatResult`]:
//!
//! ```text
//! StatResult::Native(Metadata)         ── returned as-is
//! StatResult::Synthesized(PartialStats) ── filled in by synthesize()
//! ```
//!
//! Synthesis rules for unknown fields:
//!
//! | field            | default                          |
//! |------------------|----------------------------------|
//! | `dev`            | per-process [`DeviceId`]         |
//! | `ino`            | fresh random value on every call |
//! | `mode`           | `0o777`                          |
//! | `nlink`          | `1`                              |
//! | `uid/gid/rdev`   | `0`                              |
//! | `blksize`        | `512`                            |
//! | `blocks`         | `ceil(size / 512)`               |

use std::fs;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use rand::Rng;

/// Point in time carried by metadata.
pub type Timestamp = DateTime<Utc>;

/// Block size assumed for synthesized entries.
pub const DEFAULT_BLOCK_SIZE: u64 = 512;

/// Permission bits assumed for synthesized entries.
pub const DEFAULT_MODE: u32 = 0o777;

/// Upper bound (exclusive) for random device ids and inodes.
const DEVICE_ID_RANGE: u64 = 10_000;
const INODE_RANGE: u64 = 100_000;

// =============================================================================
// FileKind
// =============================================================================

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Block device.
    BlockDevice,
    /// Character device.
    CharDevice,
    /// Named pipe.
    Fifo,
    /// Unix socket.
    Socket,
}

impl FileKind {
    /// Classify a `std` file type.
    pub fn from_file_type(ft: fs::FileType) -> Self {
        if ft.is_dir() {
            return Self::Directory;
        }
        if ft.is_symlink() {
            return Self::Symlink;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_block_device() {
                return Self::BlockDevice;
            }
            if ft.is_char_device() {
                return Self::CharDevice;
            }
            if ft.is_fifo() {
                return Self::Fifo;
            }
            if ft.is_socket() {
                return Self::Socket;
            }
        }
        Self::File
    }
}

// =============================================================================
// DeviceId
// =============================================================================

/// Device id stamped on every synthesized entry.
///
/// Generated once and held by the overlay for its whole lifetime, so all
/// memory-layer entries report the same device within a run. Not meaningful
/// across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Use a fixed device id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Generate a random device id.
    pub fn random() -> Self {
        Self(rand::thread_rng().gen_range(0..DEVICE_ID_RANGE))
    }

    /// The raw id.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

// =============================================================================
// Metadata
// =============================================================================

/// Complete, native-shaped file metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Entry type.
    pub kind: FileKind,
    /// Device id.
    pub dev: u64,
    /// Inode number.
    pub ino: u64,
    /// Mode bits.
    pub mode: u32,
    /// Hard link count.
    pub nlink: u64,
    /// Owner user id.
    pub uid: u32,
    /// Owner group id.
    pub gid: u32,
    /// Device id for special files.
    pub rdev: u64,
    /// Size in bytes.
    pub size: u64,
    /// Preferred I/O block size.
    pub blksize: u64,
    /// Number of allocated blocks.
    pub blocks: u64,
    /// Last access time.
    pub atime: Timestamp,
    /// Last modification time.
    pub mtime: Timestamp,
    /// Last status change time.
    pub ctime: Timestamp,
    /// Creation time.
    pub birthtime: Timestamp,
}

impl Metadata {
    /// Whether this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// Whether this is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// Whether this is a symbolic link.
    pub fn is_symbolic_link(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// Whether this is a block device.
    pub fn is_block_device(&self) -> bool {
        self.kind == FileKind::BlockDevice
    }

    /// Whether this is a character device.
    pub fn is_character_device(&self) -> bool {
        self.kind == FileKind::CharDevice
    }

    /// Whether this is a named pipe.
    pub fn is_fifo(&self) -> bool {
        self.kind == FileKind::Fifo
    }

    /// Whether this is a socket.
    pub fn is_socket(&self) -> bool {
        self.kind == FileKind::Socket
    }

    /// Access time in milliseconds since the Unix epoch.
    pub fn atime_ms(&self) -> i64 {
        self.atime.timestamp_millis()
    }

    /// Modification time in milliseconds since the Unix epoch.
    pub fn mtime_ms(&self) -> i64 {
        self.mtime.timestamp_millis()
    }

    /// Status change time in milliseconds since the Unix epoch.
    pub fn ctime_ms(&self) -> i64 {
        self.ctime.timestamp_millis()
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn birthtime_ms(&self) -> i64 {
        self.birthtime.timestamp_millis()
    }

    /// Read native metadata from `std`.
    ///
    /// On Unix every field is known and the result is [`StatResult::Native`].
    /// Elsewhere only type, size and timestamps are available and the result
    /// needs synthesis.
    pub fn from_std(meta: &fs::Metadata) -> StatResult {
        let kind = FileKind::from_file_type(meta.file_type());
        let mtime = timestamp(meta.modified());
        let mut stats = PartialStats::new(kind, meta.len(), mtime);
        stats.atime = timestamp(meta.accessed());
        stats.birthtime = meta.created().map(Timestamp::from).unwrap_or(mtime);
        complete_from_os(stats, meta)
    }
}

#[cfg(unix)]
fn complete_from_os(stats: PartialStats, meta: &fs::Metadata) -> StatResult {
    use std::os::unix::fs::MetadataExt;

    let ctime = Timestamp::from_timestamp(meta.ctime(), meta.ctime_nsec() as u32)
        .unwrap_or(stats.mtime);
    StatResult::Native(Metadata {
        kind: stats.kind,
        dev: meta.dev(),
        ino: meta.ino(),
        mode: meta.mode(),
        nlink: meta.nlink(),
        uid: meta.uid(),
        gid: meta.gid(),
        rdev: meta.rdev(),
        size: meta.size(),
        blksize: meta.blksize(),
        blocks: meta.blocks(),
        atime: stats.atime,
        mtime: stats.mtime,
        ctime,
        birthtime: stats.birthtime,
    })
}

#[cfg(not(unix))]
fn complete_from_os(stats: PartialStats, _meta: &fs::Metadata) -> StatResult {
    StatResult::Synthesized(stats)
}

fn timestamp(time: std::io::Result<SystemTime>) -> Timestamp {
    time.map(Timestamp::from).unwrap_or_default()
}

// =============================================================================
// PartialStats / StatResult
// =============================================================================

/// Metadata with only type, size and timestamps guaranteed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialStats {
    /// Entry type.
    pub kind: FileKind,
    /// Size in bytes.
    pub size: u64,
    /// Device id, if known.
    pub dev: Option<u64>,
    /// Inode, if known.
    pub ino: Option<u64>,
    /// Mode bits, if known.
    pub mode: Option<u32>,
    /// Link count, if known.
    pub nlink: Option<u64>,
    /// Owner user id, if known.
    pub uid: Option<u32>,
    /// Owner group id, if known.
    pub gid: Option<u32>,
    /// Special-file device id, if known.
    pub rdev: Option<u64>,
    /// Block size, if known.
    pub blksize: Option<u64>,
    /// Block count, if known.
    pub blocks: Option<u64>,
    /// Last access time.
    pub atime: Timestamp,
    /// Last modification time.
    pub mtime: Timestamp,
    /// Last status change time.
    pub ctime: Timestamp,
    /// Creation time.
    pub birthtime: Timestamp,
}

impl PartialStats {
    /// Stats with all four timestamps set to `time` and nothing else known.
    pub fn new(kind: FileKind, size: u64, time: Timestamp) -> Self {
        Self {
            kind,
            size,
            dev: None,
            ino: None,
            mode: None,
            nlink: None,
            uid: None,
            gid: None,
            rdev: None,
            blksize: None,
            blocks: None,
            atime: time,
            mtime: time,
            ctime: time,
            birthtime: time,
        }
    }
}

/// A layer's answer to a stat query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatResult {
    /// Complete metadata, used as-is.
    Native(Metadata),
    /// Partial metadata that must go through [`synthesize`].
    Synthesized(PartialStats),
}

impl StatResult {
    /// Entry type.
    pub fn kind(&self) -> FileKind {
        match self {
            Self::Native(meta) => meta.kind,
            Self::Synthesized(stats) => stats.kind,
        }
    }

    /// Turn this into complete metadata, synthesizing missing fields.
    pub fn into_metadata(self, device: DeviceId) -> Metadata {
        match self {
            Self::Native(meta) => meta,
            Self::Synthesized(stats) => synthesize(stats, device),
        }
    }
}

/// Fill every unknown field of `stats` with its default.
pub fn synthesize(stats: PartialStats, device: DeviceId) -> Metadata {
    let PartialStats {
        kind,
        size,
        dev,
        ino,
        mode,
        nlink,
        uid,
        gid,
        rdev,
        blksize,
        blocks,
        atime,
        mtime,
        ctime,
        birthtime,
    } = stats;

    Metadata {
        kind,
        dev: dev.unwrap_or(device.get()),
        ino: ino.unwrap_or_else(|| rand::thread_rng().gen_range(0..INODE_RANGE)),
        mode: mode.unwrap_or(DEFAULT_MODE),
        nlink: nlink.unwrap_or(1),
        uid: uid.unwrap_or(0),
        gid: gid.unwrap_or(0),
        rdev: rdev.unwrap_or(0),
        size,
        blksize: blksize.unwrap_or(DEFAULT_BLOCK_SIZE),
        blocks: blocks.unwrap_or_else(|| size.div_ceil(DEFAULT_BLOCK_SIZE)),
        atime,
        mtime,
        ctime,
        birthtime,
    }
}
