use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use flate2::Crc;
use flate2::read::DeflateDecoder;
use tracing::debug;

use crate::io::ReadAt;
use crate::navigator::ArchiveRecord;

use super::PageSource;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipEntry};

/// Upper bound of the DEFLATE expansion ratio.
const MAX_DEFLATE_RATIO: u64 = 1032;

/// Largest buffer reserved up front for an inflated entry.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// An opened ZIP archive with its central directory loaded.
///
/// The byte source is held for as long as the archive lives and released when
/// it is dropped.
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ZipEntry>,
    by_name: HashMap<String, usize>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Read the central directory of the archive behind `reader`.
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let mut entries = parser.list_entries().await?;
        let by_name = index_names(&mut entries);
        debug!(entries = entries.len(), "opened zip archive");
        Ok(Self {
            parser,
            entries,
            by_name,
        })
    }

    /// Entries in archive order.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Look up an entry by its full name.
    pub fn entry(&self, name: &str) -> Option<&ZipEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Extract and verify the data of `entry`.
    pub async fn extract(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("Entry is encrypted: {}", entry.name);
        }
        let deflated = match entry.compression_method {
            CompressionMethod::Stored => false,
            CompressionMethod::Deflate => true,
            CompressionMethod::Unknown(method) => {
                bail!("Unsupported compression method {method} for {}", entry.name)
            }
        };

        let offset = self.parser.data_offset(entry).await?;
        let end = offset
            .checked_add(entry.compressed_size)
            .filter(|&end| end <= self.parser.reader().size())
            .ok_or_else(|| anyhow!("Entry data runs past the end of the archive: {}", entry.name))?;

        let mut raw = vec![0u8; (end - offset) as usize];
        let n = self.parser.reader().read_at(offset, &mut raw).await?;
        if n != raw.len() {
            bail!("Unexpected end of archive while reading {}", entry.name);
        }

        let data = if deflated {
            inflate(&raw, entry)?
        } else {
            raw
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!("CRC mismatch for {}", entry.name);
        }

        Ok(data)
    }
}

/// Give every entry a distinct name and index the entries by it.
///
/// A repeated name, from a duplicate entry or from names that decode to the
/// same text, gets `~2`, `~3`, ... inserted before its extension.
fn index_names(entries: &mut [ZipEntry]) -> HashMap<String, usize> {
    let mut by_name = HashMap::with_capacity(entries.len());
    for (i, entry) in entries.iter_mut().enumerate() {
        let mut n = 2;
        while by_name.contains_key(&entry.name) {
            let renamed = numbered_name(&entry.name, n);
            if !by_name.contains_key(&renamed) {
                debug!(from = %entry.name, to = %renamed, "renamed duplicate entry");
                entry.name = renamed;
            }
            n += 1;
        }
        by_name.insert(entry.name.clone(), i);
    }
    by_name
}

fn numbered_name(name: &str, n: usize) -> String {
    let base = name.rfind('/').map_or(0, |i| i + 1);
    let split = match name[base..].rfind('.') {
        Some(dot) if dot > 0 => base + dot,
        _ => name.len(),
    };
    format!("{}~{n}{}", &name[..split], &name[split..])
}

/// Inflate `raw`, stopping one byte past the declared size.
///
/// The declared size comes from the archive and is not trusted for
/// allocation.
fn inflate(raw: &[u8], entry: &ZipEntry) -> Result<Vec<u8>> {
    let limit = entry.uncompressed_size.saturating_add(1);
    let capacity = (raw.len() as u64)
        .saturating_mul(MAX_DEFLATE_RATIO)
        .min(entry.uncompressed_size)
        .min(MAX_PREALLOC);

    let mut out = Vec::with_capacity(capacity as usize);
    DeflateDecoder::new(raw)
        .take(limit)
        .read_to_end(&mut out)
        .with_context(|| format!("Corrupt deflate data in {}", entry.name))?;

    if out.len() as u64 > entry.uncompressed_size {
        bail!(
            "Entry inflates past its declared size of {} bytes: {}",
            entry.uncompressed_size,
            entry.name
        );
    }

    Ok(out)
}

#[async_trait]
impl<R: ReadAt + 'static> PageSource for ZipArchive<R> {
    async fn records(&self) -> Result<Vec<ArchiveRecord>> {
        Ok(self.entries.iter().map(ZipEntry::record).collect())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let entry = self
            .entry(key)
            .ok_or_else(|| anyhow!("No such entry in archive: {key}"))?;
        self.extract(entry).await
    }
}
