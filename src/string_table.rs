use crate::appinfo_parser::ReadSeek;
use crate::err::DeserializationResult;
use crate::utils::ReadExt;

use log::trace;

/// Key names shared by every binary tree in a version 41+ container.
///
/// Binary nodes refer to their key by index into this table instead of storing the name inline.
/// The table is built once per container and never modified afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StringTable(Vec<String>);

impl StringTable {
    pub fn new(strings: Vec<String>) -> Self {
        StringTable(strings)
    }

    /// Reads a `u32` count followed by that many null-terminated UTF-8 strings.
    pub fn from_stream<T: ReadSeek>(stream: &mut T) -> DeserializationResult<Self> {
        let count = stream.try_u32_named("string table count")?;
        trace!("String table has {} entries", count);

        // The count comes straight from the file, so don't trust it for preallocation.
        let mut strings = Vec::with_capacity((count as usize).min(1 << 16));
        for _ in 0..count {
            strings.push(stream.try_null_terminated_utf8_string_named("string table entry")?);
        }

        Ok(StringTable(strings))
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.0.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_reads_string_table() {
        let mut data = 3_u32.to_le_bytes().to_vec();
        data.extend_from_slice(b"appinfo\0common\0\0");

        let table = StringTable::from_stream(&mut Cursor::new(data)).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), Some("appinfo"));
        assert_eq!(table.get(1), Some("common"));
        assert_eq!(table.get(2), Some(""));
        assert_eq!(table.get(3), None);
    }

    #[test]
    fn test_truncated_table_fails() {
        let mut data = 2_u32.to_le_bytes().to_vec();
        data.extend_from_slice(b"appinfo\0");

        assert!(StringTable::from_stream(&mut Cursor::new(data)).is_err());
    }
}
