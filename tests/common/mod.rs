//! Builds small ZIP archives in memory for tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Crc;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

struct Entry {
    name: Vec<u8>,
    data: Vec<u8>,
    method: u16,
    flags: u16,
    bad_crc: bool,
    declared_size: Option<u64>,
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Entry>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, data: &[u8], method: u16, flags: u16, bad_crc: bool) -> Self {
        self.entries.push(Entry {
            name: name.as_bytes().to_vec(),
            data: data.to_vec(),
            method,
            flags,
            bad_crc,
            declared_size: None,
        });
        self
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.push(name, data, 0, 0, false)
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.push(name, data, 8, 0, false)
    }

    /// Stored entry flagged as encrypted.
    pub fn encrypted(self, name: &str, data: &[u8]) -> Self {
        self.push(name, data, 0, 0x0001, false)
    }

    /// Entry with a compression method the reader does not know. Data is stored as is.
    pub fn with_method(self, name: &str, data: &[u8], method: u16) -> Self {
        self.push(name, data, method, 0, false)
    }

    pub fn corrupted(self, name: &str, data: &[u8]) -> Self {
        self.push(name, data, 0, 0, true)
    }

    /// Stored entry whose name is written as the given bytes.
    pub fn raw_name(mut self, name: &[u8], flags: u16, data: &[u8]) -> Self {
        self = self.stored("", data);
        if let Some(entry) = self.entries.last_mut() {
            entry.name = name.to_vec();
            entry.flags = flags;
        }
        self
    }

    /// Deflated entry whose central directory claims `size` uncompressed
    /// bytes through a ZIP64 extra field.
    pub fn declared_size(mut self, name: &str, data: &[u8], size: u64) -> Self {
        self = self.deflated(name, data);
        if let Some(entry) = self.entries.last_mut() {
            entry.declared_size = Some(size);
        }
        self
    }

    pub fn directory(self, name: &str) -> Self {
        self.push(name, b"", 0, 0, false)
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let payload = if entry.method == 8 {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&entry.data).unwrap();
                encoder.finish().unwrap()
            } else {
                entry.data.clone()
            };

            let mut crc = Crc::new();
            crc.update(&entry.data);
            let crc = if entry.bad_crc { crc.sum() ^ 0xFFFF } else { crc.sum() };

            let offset = out.len() as u32;
            out.write_all(b"PK\x03\x04").unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(entry.flags).unwrap();
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap(); // time
            out.write_u16::<LittleEndian>(0).unwrap(); // date
            out.write_u32::<LittleEndian>(crc).unwrap();
            out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(entry.data.len() as u32).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_all(&entry.name).unwrap();
            out.write_all(&payload).unwrap();

            central.write_all(b"PK\x01\x02").unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(entry.flags).unwrap();
            central.write_u16::<LittleEndian>(entry.method).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(crc).unwrap();
            central.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            let (uncompressed, extra_len) = match entry.declared_size {
                Some(_) => (u32::MAX, 12),
                None => (entry.data.len() as u32, 0),
            };
            central.write_u32::<LittleEndian>(uncompressed).unwrap();
            central.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(extra_len).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap(); // comment
            central.write_u16::<LittleEndian>(0).unwrap(); // disk
            central.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
            central.write_u32::<LittleEndian>(0).unwrap(); // external attrs
            central.write_u32::<LittleEndian>(offset).unwrap();
            central.write_all(&entry.name).unwrap();
            if let Some(size) = entry.declared_size {
                central.write_u16::<LittleEndian>(0x0001).unwrap();
                central.write_u16::<LittleEndian>(8).unwrap();
                central.write_u64::<LittleEndian>(size).unwrap();
            }
        }

        let cd_offset = out.len() as u32;
        out.write_all(&central).unwrap();

        let count = self.entries.len() as u16;
        out.write_all(b"PK\x05\x06").unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.write_all(&self.comment).unwrap();

        out
    }
}
