//! Central directory parsing for ZIP-based comic archives.
//!
//! The directory sits at the end of the archive, so listing pages needs only
//! the tail of the file:
//! 1. Locate the End of Central Directory (EOCD), skipping a trailing comment
//! 2. Follow the ZIP64 locator when the EOCD fields are saturated
//! 3. Fetch the whole central directory in one read and decode each header
//!
//! Page data is located later through the entry's Local File Header.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};
use tracing::debug;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format.
const MAX_COMMENT_SIZE: u64 = u16::MAX as u64;

/// Extra field id carrying 64-bit sizes and offsets.
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Location of the central directory within the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryLocation {
    pub offset: u64,
    pub size: u64,
    pub entries: u64,
}

/// Reads ZIP structures from any [`ReadAt`] source.
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find the EOCD record and return it with its offset.
    ///
    /// Archives without a comment are checked with a single 22 byte read;
    /// otherwise the last 64 KiB are scanned backwards for a signature whose
    /// comment length matches the bytes that follow it.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let record = EndOfCentralDirectory::SIZE as u64;
        if self.size < record {
            bail!("Not a valid ZIP file");
        }

        let offset = self.size - record;
        let mut tail = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_at(offset, &mut tail).await?;
        if tail.starts_with(EndOfCentralDirectory::SIGNATURE) && tail[20..22] == [0, 0] {
            return Ok((EndOfCentralDirectory::from_bytes(&tail)?, offset));
        }

        let window = (MAX_COMMENT_SIZE + record).min(self.size);
        let start = self.size - window;
        let mut buf = vec![0u8; window as usize];
        self.reader.read_at(start, &mut buf).await?;

        let last = buf.len() - EndOfCentralDirectory::SIZE;
        for i in (0..=last).rev() {
            if !buf[i..].starts_with(EndOfCentralDirectory::SIGNATURE) {
                continue;
            }
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == last - i {
                let eocd = EndOfCentralDirectory::from_bytes(&buf[i..])?;
                return Ok((eocd, start + i as u64));
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// Resolve where the central directory lives, following ZIP64 records.
    pub async fn locate_directory(&self) -> Result<DirectoryLocation> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let location = if eocd.is_zip64() {
            let Some(locator_offset) = eocd_offset.checked_sub(Zip64EOCDLocator::SIZE as u64)
            else {
                bail!("Invalid ZIP64 locator");
            };
            let mut buf = vec![0u8; Zip64EOCDLocator::SIZE];
            self.reader.read_at(locator_offset, &mut buf).await?;
            let locator = Zip64EOCDLocator::from_bytes(&buf)?;

            let mut buf = vec![0u8; Zip64EOCD::MIN_SIZE];
            self.reader.read_at(locator.eocd64_offset, &mut buf).await?;
            let eocd64 = Zip64EOCD::from_bytes(&buf)?;

            DirectoryLocation {
                offset: eocd64.cd_offset,
                size: eocd64.cd_size,
                entries: eocd64.total_entries,
            }
        } else {
            DirectoryLocation {
                offset: eocd.cd_offset as u64,
                size: eocd.cd_size as u64,
                entries: eocd.total_entries as u64,
            }
        };

        if location.offset.saturating_add(location.size) > self.size {
            bail!("Central directory lies outside the archive");
        }

        Ok(location)
    }

    /// Decode every central directory entry, in archive order.
    pub async fn list_entries(&self) -> Result<Vec<ZipEntry>> {
        let location = self.locate_directory().await?;
        debug!(
            entries = location.entries,
            offset = location.offset,
            "reading central directory"
        );

        let mut directory = vec![0u8; location.size as usize];
        self.reader.read_at(location.offset, &mut directory).await?;

        let mut cursor = Cursor::new(directory.as_slice());
        let capacity = location.entries.min(directory.len() as u64 / CDFH_MIN_SIZE as u64);
        let mut entries = Vec::with_capacity(capacity as usize);
        for _ in 0..location.entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Offset of the entry's data, just past its Local File Header.
    ///
    /// The local name and extra field lengths may differ from the central
    /// directory copy, so the header itself has to be read.
    pub async fn data_offset(&self, entry: &ZipEntry) -> Result<u64> {
        let mut header = vec![0u8; LFH_SIZE];
        self.reader.read_at(entry.lfh_offset, &mut header).await?;
        if !header.starts_with(LFH_SIGNATURE) {
            bail!("Invalid Local File Header for {}", entry.name);
        }

        let mut cursor = Cursor::new(&header[26..]);
        let name_len = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_len = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + name_len + extra_len)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

/// Decode one Central Directory File Header at the cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let method = cursor.read_u16::<LittleEndian>()?;
    let _mod_time = cursor.read_u16::<LittleEndian>()?;
    let _mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size = cursor.read_u32::<LittleEndian>()?;
    let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
    let name_len = cursor.read_u16::<LittleEndian>()?;
    let extra_len = cursor.read_u16::<LittleEndian>()?;
    let comment_len = cursor.read_u16::<LittleEndian>()?;
    let _disk_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset = cursor.read_u32::<LittleEndian>()?;

    let mut name = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name)?;
    let name = decode_name(&name, flags);

    let mut extra = vec![0u8; extra_len as usize];
    cursor.read_exact(&mut extra)?;

    let mut entry = ZipEntry {
        is_directory: name.ends_with('/'),
        name,
        flags,
        compression_method: CompressionMethod::from_u16(method),
        compressed_size: compressed_size as u64,
        uncompressed_size: uncompressed_size as u64,
        crc32,
        lfh_offset: lfh_offset as u64,
    };
    apply_zip64_extra(&mut entry, &extra)?;

    cursor.set_position(cursor.position() + comment_len as u64);

    Ok(entry)
}

/// Replace saturated 32-bit fields with the values from a ZIP64 extra field.
///
/// Values appear only for fields set to `0xFFFFFFFF`, in the order
/// uncompressed size, compressed size, local header offset.
fn apply_zip64_extra(entry: &mut ZipEntry, extra: &[u8]) -> Result<()> {
    const SATURATED: u64 = u32::MAX as u64;

    let mut cursor = Cursor::new(extra);
    while cursor.position() + 4 <= extra.len() as u64 {
        let id = cursor.read_u16::<LittleEndian>()?;
        let len = cursor.read_u16::<LittleEndian>()? as u64;
        let end = cursor.position() + len;

        if id == ZIP64_EXTRA_ID {
            for field in [
                &mut entry.uncompressed_size,
                &mut entry.compressed_size,
                &mut entry.lfh_offset,
            ] {
                if *field == SATURATED && cursor.position() + 8 <= end {
                    *field = cursor.read_u64::<LittleEndian>()?;
                }
            }
        }

        cursor.set_position(end);
    }

    Ok(())
}
