//! Minimal ZIP writer for building test archives in memory.
//!
//! Shared by the unit tests and, through `#[path]`, the integration tests.
#![allow(dead_code)]

use flate2::Crc;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

/// One entry exactly as it will be written.
pub struct RawEntry {
    pub name: Vec<u8>,
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub uncompressed_size: u32,
    pub payload: Vec<u8>,
}

impl RawEntry {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            flags: 0,
            method: 0,
            crc32: crc32(data),
            uncompressed_size: data.len() as u32,
            payload: data.to_vec(),
        }
    }

    pub fn deflated(name: &str, data: &[u8]) -> Self {
        Self {
            method: 8,
            payload: deflate(data),
            ..Self::stored(name, data)
        }
    }
}

#[derive(Default)]
pub struct ZipBuilder {
    body: Vec<u8>,
    central: Vec<u8>,
    count: u16,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(self, name: &str) -> Self {
        self.stored(name, b"")
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.raw(RawEntry::stored(name, data))
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.raw(RawEntry::deflated(name, data))
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn raw(mut self, entry: RawEntry) -> Self {
        let offset = self.body.len() as u32;

        put_header(&mut self.body, b"PK\x03\x04", &entry);
        self.body.extend_from_slice(&0u16.to_le_bytes()); // extra length
        self.body.extend_from_slice(&entry.name);
        self.body.extend_from_slice(&entry.payload);

        self.central.extend_from_slice(b"PK\x01\x02");
        self.central.extend_from_slice(&20u16.to_le_bytes()); // version made by
        put_header_fields(&mut self.central, &entry);
        self.central.extend_from_slice(&0u16.to_le_bytes()); // extra length
        self.central.extend_from_slice(&0u16.to_le_bytes()); // comment length
        self.central.extend_from_slice(&0u16.to_le_bytes()); // disk number start
        self.central.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
        self.central.extend_from_slice(&0u32.to_le_bytes()); // external attributes
        self.central.extend_from_slice(&offset.to_le_bytes());
        self.central.extend_from_slice(&entry.name);

        self.count += 1;
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.body;
        let cd_offset = out.len() as u32;
        out.extend_from_slice(&self.central);

        out.extend_from_slice(b"PK\x05\x06");
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.count.to_le_bytes());
        out.extend_from_slice(&self.count.to_le_bytes());
        out.extend_from_slice(&(self.central.len() as u32).to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.comment);
        out
    }
}

fn put_header(out: &mut Vec<u8>, signature: &[u8], entry: &RawEntry) {
    out.extend_from_slice(signature);
    put_header_fields(out, entry);
}

/// Fields shared by local and central headers, from "version needed" up to
/// and including the name length.
fn put_header_fields(out: &mut Vec<u8>, entry: &RawEntry) {
    out.extend_from_slice(&20u16.to_le_bytes()); // version needed
    out.extend_from_slice(&entry.flags.to_le_bytes());
    out.extend_from_slice(&entry.method.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // time
    out.extend_from_slice(&0x21u16.to_le_bytes()); // date: 1980-01-01
    out.extend_from_slice(&entry.crc32.to_le_bytes());
    out.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
    out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// The archive used by the end-to-end scenarios.
pub fn sample_archive() -> Vec<u8> {
    ZipBuilder::new()
        .dir("bios/")
        .stored("bios/hello.txt", b"hello from bios\n")
        .deflated("bios/hello2.txt", &b"hello again ".repeat(64))
        .dir("tmp/")
        .deflated("tmp/bright.tmp", b"bright and shiny temporary file")
        .stored("newfile.txt", b"new file\n")
        .finish()
}
