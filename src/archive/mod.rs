//! Archive access for page viewing.
//!
//! The navigator only needs two things from an archive: the list of entries
//! with their directory/readable flags, and the bytes of one entry on demand.
//! That contract is the [`PageSource`] trait.
//!
//! [`ZipArchive`] implements it for ZIP-based comic archives (CBZ) on top of
//! any [`ReadAt`](crate::io::ReadAt) byte source:
//!
//! - [`structures`]: fixed-layout ZIP records (EOCD, ZIP64, entry metadata)
//! - [`parser`]: central directory decoding
//! - [`reader`]: entry lookup, decompression and CRC checking
//!
//! Supported: STORED and DEFLATE entries, ZIP64 archives, trailing comments.
//! Encrypted entries and other compression methods are listed as unreadable.

mod parser;
mod reader;
mod structures;

pub use parser::{DirectoryLocation, ZipParser};
pub use reader::ZipArchive;
pub use structures::*;

use anyhow::Result;
use async_trait::async_trait;

use crate::navigator::ArchiveRecord;

/// An opened archive that can list its entries and extract one by key.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// All entries in archive order, directories included.
    async fn records(&self) -> Result<Vec<ArchiveRecord>>;

    /// Raw bytes of the entry named `key`.
    async fn read(&self, key: &str) -> Result<Vec<u8>>;
}
