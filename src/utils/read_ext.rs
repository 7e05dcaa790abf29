use std::io;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::appinfo_parser::ReadSeek;
use crate::err::{DeserializationError, DeserializationResult};

/// Initial capacity of the scratch buffer used for null-terminated strings.
const SCRATCH_INITIAL_CAPACITY: usize = 32;

pub(crate) trait ReadExt: ReadSeek + Sized {
    #[inline]
    fn failed_to_read(
        &mut self,
        t: &'static str,
        token_name: &'static str,
        source: io::Error,
    ) -> DeserializationError {
        DeserializationError::FailedToReadToken {
            t,
            token_name,
            offset: self.tell().unwrap_or_default(),
            source,
        }
    }

    #[inline]
    fn try_u8_named(&mut self, name: &'static str) -> DeserializationResult<u8> {
        self.read_u8()
            .map_err(|e| self.failed_to_read("u8", name, e))
    }

    #[inline]
    fn try_i32_named(&mut self, name: &'static str) -> DeserializationResult<i32> {
        self.read_i32::<LittleEndian>()
            .map_err(|e| self.failed_to_read("i32", name, e))
    }

    #[inline]
    fn try_u32_named(&mut self, name: &'static str) -> DeserializationResult<u32> {
        self.read_u32::<LittleEndian>()
            .map_err(|e| self.failed_to_read("u32", name, e))
    }

    #[inline]
    fn try_f32_named(&mut self, name: &'static str) -> DeserializationResult<f32> {
        self.read_f32::<LittleEndian>()
            .map_err(|e| self.failed_to_read("f32", name, e))
    }

    #[inline]
    fn try_i64_named(&mut self, name: &'static str) -> DeserializationResult<i64> {
        self.read_i64::<LittleEndian>()
            .map_err(|e| self.failed_to_read("i64", name, e))
    }

    #[inline]
    fn try_u64_named(&mut self, name: &'static str) -> DeserializationResult<u64> {
        self.read_u64::<LittleEndian>()
            .map_err(|e| self.failed_to_read("u64", name, e))
    }

    #[inline]
    fn try_bytes_named<const N: usize>(
        &mut self,
        name: &'static str,
    ) -> DeserializationResult<[u8; N]> {
        let mut bytes = [0_u8; N];
        match self.read_exact(&mut bytes) {
            Ok(()) => Ok(bytes),
            Err(e) => Err(self.failed_to_read("bytes", name, e)),
        }
    }

    /// Reads a null-terminated UTF-8 string.
    ///
    /// Bytes are collected into a scratch buffer which starts at 32 bytes and doubles when full.
    /// The buffer is owned by this call, so it is released on every return path.
    fn try_null_terminated_utf8_string_named(
        &mut self,
        name: &'static str,
    ) -> DeserializationResult<String> {
        let start = self.tell().unwrap_or_default();
        let mut scratch: Vec<u8> = Vec::with_capacity(SCRATCH_INITIAL_CAPACITY);

        loop {
            let b = match self.read_u8() {
                Ok(b) => b,
                Err(e) => return Err(self.failed_to_read("null_terminated_utf8_str", name, e)),
            };

            if b == 0 {
                break;
            }

            if scratch.len() == scratch.capacity() {
                scratch.reserve_exact(scratch.capacity());
            }
            scratch.push(b);
        }

        String::from_utf8(scratch)
            .map_err(|source| DeserializationError::InvalidUtf8 { offset: start, source })
    }
}

impl<T: ReadSeek> ReadExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_reads_consecutive_null_terminated_strings() {
        let mut cursor = Cursor::new(b"common\0name\0\0".to_vec());

        assert_eq!(
            cursor.try_null_terminated_utf8_string_named("first").unwrap(),
            "common"
        );
        assert_eq!(
            cursor.try_null_terminated_utf8_string_named("second").unwrap(),
            "name"
        );
        assert_eq!(
            cursor.try_null_terminated_utf8_string_named("third").unwrap(),
            ""
        );
        assert_eq!(cursor.position(), 13);
    }

    #[test]
    fn test_reads_strings_longer_than_the_initial_scratch_capacity() {
        let long = "x".repeat(SCRATCH_INITIAL_CAPACITY * 5 + 3);
        let mut data = long.clone().into_bytes();
        data.push(0);

        let mut cursor = Cursor::new(data);
        assert_eq!(
            cursor.try_null_terminated_utf8_string_named("long").unwrap(),
            long
        );
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let mut cursor = Cursor::new(b"dangling".to_vec());
        let err = cursor
            .try_null_terminated_utf8_string_named("dangling")
            .unwrap_err();

        assert!(matches!(
            err,
            DeserializationError::FailedToReadToken {
                token_name: "dangling",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_utf8_reports_string_start() {
        let mut cursor = Cursor::new(vec![0x41, 0xff, 0xfe, 0x00]);
        let err = cursor.try_null_terminated_utf8_string_named("bad").unwrap_err();

        assert!(matches!(err, DeserializationError::InvalidUtf8 { offset: 0, .. }));
    }

    #[test]
    fn test_primitives_are_little_endian() {
        let mut cursor = Cursor::new(vec![0x29, 0x44, 0x56, 0x07, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(cursor.try_u32_named("magic").unwrap(), 0x0756_4429);
        assert_eq!(cursor.try_i32_named("minus one").unwrap(), -1);
        assert!(cursor.try_u8_named("eof").is_err());
    }
}
