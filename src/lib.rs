#![deny(unused_must_use)]
#![forbid(unsafe_code)]
#![doc = "A parser for Steam's `appinfo.vdf` application metadata container."]

pub use app_record::{AppRecord, AppRecordHeader};
pub use appinfo_file_header::AppInfoFileHeader;
pub use appinfo_parser::{AppInfoParser, IterAppRecords, ParserSettings, ReadSeek};
pub use err::{AppInfoError, DeserializationError, LibraryFoldersError, Result};
pub use keyvalues::{KvNode, KvValue};
pub use library_folders::{InstallLayout, Library, LibraryFolders};
pub use model::{App, AppType, InfoState, Metadata, Soundtrack, Track, Universe};
pub use scanner::{ScannerSettings, SoundtrackScanner};
pub use steam_dir::SteamDir;
#[cfg(feature = "store")]
pub use store::StoreClient;
pub use store::{GenreLookup, GenreMap, NoGenreLookup};
pub use string_table::StringTable;

mod app_record;
mod appinfo_file_header;
mod appinfo_parser;
pub mod err;
pub mod keyvalues;
mod library_folders;
mod mapping;
pub mod model;
mod scanner;
mod steam_dir;
pub mod store;
mod string_table;
mod utils;

pub use utils::timestamp_from_unix_seconds;

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
