use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Cursor;

use crate::error::{Error, Result};

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag: entry is encrypted
pub const FLAG_ENCRYPTED: u16 = 0x0001;
/// General purpose flag: name and comment are UTF-8
pub const FLAG_UTF8: u16 = 0x0800;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionMethod::Stored => f.write_str("stored"),
            CompressionMethod::Deflate => f.write_str("deflate"),
            CompressionMethod::Unknown(v) => write!(f, "method {v}"),
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes plus comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
    /// Archive comment, when it was inside the fetched tail
    pub comment: Vec<u8>,
    /// Absolute offset of the record's signature
    pub offset: u64,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Parse the fixed record at the start of `data`. Bytes after the fixed
    /// record are taken as the comment, up to `comment_len`.
    pub fn from_bytes(data: &[u8], offset: u64) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::EocdNotFound);
        }

        let mut cursor = Cursor::new(&data[4..Self::SIZE]);
        let disk_number = cursor.read_u16::<LittleEndian>()?;
        let disk_with_cd = cursor.read_u16::<LittleEndian>()?;
        let disk_entries = cursor.read_u16::<LittleEndian>()?;
        let total_entries = cursor.read_u16::<LittleEndian>()?;
        let cd_size = cursor.read_u32::<LittleEndian>()?;
        let cd_offset = cursor.read_u32::<LittleEndian>()?;
        let comment_len = cursor.read_u16::<LittleEndian>()?;

        let tail = &data[Self::SIZE..];
        let comment = tail[..tail.len().min(comment_len as usize)].to_vec();

        Ok(Self {
            disk_number,
            disk_with_cd,
            disk_entries,
            total_entries,
            cd_size,
            cd_offset,
            comment_len,
            comment,
            offset,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }

    pub fn is_multi_disk(&self) -> bool {
        self.disk_number != 0 || self.disk_with_cd != 0 || self.disk_entries != self.total_entries
    }

    /// The central directory must sit entirely before the EOCD itself.
    pub fn cd_fits(&self) -> bool {
        self.cd_offset as u64 + self.cd_size as u64 <= self.offset
    }
}

/// One entry of the central directory.
///
/// `index` is the position of the header in the central directory and is the
/// identifier users pick entries by; it never changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryEntry {
    pub index: usize,
    pub name: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
}

impl CentralDirectoryEntry {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

/// Fixed part of a Local File Header.
///
/// Sizes and CRC are zero when the writer used a data descriptor, so only the
/// name/extra lengths and the method are relied on during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    /// Parse a header from at least [`LFH_SIZE`] bytes. `None` when the data
    /// is short or the signature is wrong.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < LFH_SIZE || &data[0..4] != LFH_SIGNATURE {
            return None;
        }

        let mut cursor = Cursor::new(&data[4..LFH_SIZE]);
        let _version_needed = cursor.read_u16::<LittleEndian>().ok()?;
        let flags = cursor.read_u16::<LittleEndian>().ok()?;
        let compression_method = cursor.read_u16::<LittleEndian>().ok()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>().ok()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>().ok()?;

        Some(Self {
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            crc32: cursor.read_u32::<LittleEndian>().ok()?,
            compressed_size: cursor.read_u32::<LittleEndian>().ok()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>().ok()?,
            file_name_length: cursor.read_u16::<LittleEndian>().ok()?,
            extra_field_length: cursor.read_u16::<LittleEndian>().ok()?,
        })
    }

    /// Absolute offset of the payload for a header located at `header_offset`.
    pub fn data_offset(&self, header_offset: u64) -> u64 {
        header_offset
            + LFH_SIZE as u64
            + self.file_name_length as u64
            + self.extra_field_length as u64
    }
}
