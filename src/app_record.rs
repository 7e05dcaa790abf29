use crate::appinfo_file_header::BINARY_DATA_HASH_VERSION;
use crate::appinfo_parser::ReadSeek;
use crate::err::DeserializationResult;
use crate::keyvalues::KvNode;
use crate::model::{InfoState, Sha1Digest, HASH_SIZE};
use crate::utils::{timestamp_from_unix_seconds, ReadExt};

use jiff::Timestamp;

/// Fixed-size fields preceding every entry's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRecordHeader {
    pub app_id: u32,
    /// Bytes following the size field, up to the end of the entry.
    pub size: u32,
    pub info_state: InfoState,
    pub last_updated: Timestamp,
    pub token: u64,
    pub content_hash: Sha1Digest,
    pub change_number: u32,
    /// Only present in version 40+ containers.
    pub binary_data_hash: Option<Sha1Digest>,
}

impl AppRecordHeader {
    /// Reads the fields following `app_id` and `size`.
    pub fn from_stream<T: ReadSeek>(
        stream: &mut T,
        app_id: u32,
        size: u32,
        version: u8,
    ) -> DeserializationResult<AppRecordHeader> {
        let info_state = InfoState::from(stream.try_u32_named("info state")?);
        let last_updated = timestamp_from_unix_seconds(stream.try_u32_named("last updated")?);
        let token = stream.try_u64_named("token")?;
        let content_hash = stream.try_bytes_named::<HASH_SIZE>("content hash")?;
        let change_number = stream.try_u32_named("change number")?;

        let binary_data_hash = if version >= BINARY_DATA_HASH_VERSION {
            Some(stream.try_bytes_named::<HASH_SIZE>("binary data hash")?)
        } else {
            None
        };

        Ok(AppRecordHeader {
            app_id,
            size,
            info_state,
            last_updated,
            token,
            content_hash,
            change_number,
            binary_data_hash,
        })
    }
}

/// One decoded, well-framed entry, before any mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct AppRecord {
    /// Absolute offset of the entry's `app_id` field.
    pub offset: u64,
    pub header: AppRecordHeader,
    pub data: KvNode,
}

impl AppRecord {
    pub fn app_id(&self) -> u32 {
        self.header.app_id
    }

    /// Offset one past the entry, as declared by its size field.
    pub fn expected_end(&self) -> u64 {
        entry_end(self.offset, self.header.size)
    }
}

/// End of an entry starting at `offset` (its `app_id` field) whose size field reads `size`.
pub(crate) fn entry_end(offset: u64, size: u32) -> u64 {
    // app_id + size fields
    offset + 8 + u64::from(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn header_fields(with_binary_hash: bool) -> Vec<u8> {
        let mut buf = vec![];
        buf.extend_from_slice(&2_u32.to_le_bytes());
        buf.extend_from_slice(&1_700_000_000_u32.to_le_bytes());
        buf.extend_from_slice(&0xdead_beef_u64.to_le_bytes());
        buf.extend_from_slice(&[0x11; HASH_SIZE]);
        buf.extend_from_slice(&12345_u32.to_le_bytes());
        if with_binary_hash {
            buf.extend_from_slice(&[0x22; HASH_SIZE]);
        }
        buf
    }

    #[test]
    fn test_v39_header_has_no_binary_data_hash() {
        let mut cursor = Cursor::new(header_fields(false));
        let header = AppRecordHeader::from_stream(&mut cursor, 10, 100, 39).unwrap();

        assert_eq!(
            header,
            AppRecordHeader {
                app_id: 10,
                size: 100,
                info_state: InfoState::Normal,
                last_updated: Timestamp::from_second(1_700_000_000).unwrap(),
                token: 0xdead_beef,
                content_hash: [0x11; HASH_SIZE],
                change_number: 12345,
                binary_data_hash: None,
            }
        );
        assert_eq!(cursor.position(), 40);
    }

    #[test]
    fn test_v40_header_reads_binary_data_hash() {
        let mut cursor = Cursor::new(header_fields(true));
        let header = AppRecordHeader::from_stream(&mut cursor, 10, 100, 40).unwrap();

        assert_eq!(header.binary_data_hash, Some([0x22; HASH_SIZE]));
        assert_eq!(cursor.position(), 60);
    }
}
