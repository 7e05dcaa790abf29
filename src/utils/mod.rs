mod read_ext;
mod time;

pub(crate) use self::read_ext::ReadExt;
pub use self::time::timestamp_from_unix_seconds;
