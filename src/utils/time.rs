use jiff::Timestamp;

/// Converts Unix seconds into a timestamp.
///
/// Every `u32` lies well within jiff's supported range, so this never fails.
#[inline]
pub fn timestamp_from_unix_seconds(seconds: u32) -> Timestamp {
    Timestamp::from_second(i64::from(seconds)).unwrap_or(Timestamp::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_unix_seconds() {
        let ts = timestamp_from_unix_seconds(1_700_000_000);
        assert_eq!(ts.as_second(), 1_700_000_000);
        assert_eq!(ts.to_string(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_zero_is_the_epoch() {
        assert_eq!(timestamp_from_unix_seconds(0), Timestamp::UNIX_EPOCH);
    }
}
