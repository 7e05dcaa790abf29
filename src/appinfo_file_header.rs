use crate::appinfo_parser::ReadSeek;
use crate::err::{AppInfoError, Result};
use crate::model::Universe;
use crate::string_table::StringTable;
use crate::utils::ReadExt;

use log::{debug, warn};
use std::io::SeekFrom;

pub const APPINFO_MAGIC: u32 = 0x07_56_44;
pub const MIN_SUPPORTED_VERSION: u8 = 39;
pub const MAX_SUPPORTED_VERSION: u8 = 41;

/// First version carrying a binary data hash in every entry header.
pub const BINARY_DATA_HASH_VERSION: u8 = 40;
/// First version storing key names in a shared string table.
pub const STRING_TABLE_VERSION: u8 = 41;

#[derive(Debug, Clone, PartialEq)]
pub struct AppInfoFileHeader {
    pub version: u8,
    pub universe: Universe,
    /// Absolute offset of the first entry.
    pub records_start: u64,
    pub string_table: Option<StringTable>,
}

impl AppInfoFileHeader {
    /// Reads the header (and, for version 41+, the string table it points to).
    ///
    /// On success the stream is positioned at `records_start`.
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> Result<AppInfoFileHeader> {
        let magic_and_version = stream.try_u32_named("magic")?;
        let version = (magic_and_version & 0xFF) as u8;
        let magic = magic_and_version >> 8;

        if magic != APPINFO_MAGIC {
            return Err(AppInfoError::InvalidMagic { magic });
        }

        if !(MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION).contains(&version) {
            return Err(AppInfoError::UnsupportedVersion { version });
        }

        let raw_universe = stream.try_u32_named("universe")?;
        let universe = Universe::from_u32(raw_universe).unwrap_or_else(|| {
            warn!(
                "Unknown universe value {}, treating as `Invalid`",
                raw_universe
            );
            Universe::Invalid
        });

        let (records_start, string_table) = if version >= STRING_TABLE_VERSION {
            let string_table_offset = stream.try_i64_named("string table offset")?;
            let records_start = stream.tell()?;
            let len = stream.seek(SeekFrom::End(0))?;

            if string_table_offset < 0 || string_table_offset as u64 >= len {
                return Err(AppInfoError::InvalidStringTableOffset {
                    offset: string_table_offset,
                    len,
                });
            }

            stream.seek(SeekFrom::Start(string_table_offset as u64))?;
            let string_table = StringTable::from_stream(stream)?;
            debug!(
                "Read {} strings from string table at offset {}",
                string_table.len(),
                string_table_offset
            );

            (records_start, Some(string_table))
        } else {
            let records_start = stream.tell()?;
            (records_start, None)
        };

        stream.seek(SeekFrom::Start(records_start))?;

        Ok(AppInfoFileHeader {
            version,
            universe,
            records_start,
            string_table,
        })
    }

    pub fn has_binary_data_hash(&self) -> bool {
        self.version >= BINARY_DATA_HASH_VERSION
    }
}
