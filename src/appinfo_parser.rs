use crate::app_record::{entry_end, AppRecord, AppRecordHeader};
use crate::appinfo_file_header::AppInfoFileHeader;
use crate::err::{AppInfoError, DeserializationError, Result};
use crate::keyvalues::{binary, KvNode};
use crate::library_folders::LibraryFolders;
use crate::model::{App, Soundtrack};
use crate::store::GenreLookup;
use crate::utils::ReadExt;

use log::{debug, info, trace, warn};

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

// Inspired by https://github.com/mitsuhiko/unbox/src/formats/cab.rs
pub trait ReadSeek: Read + Seek {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

impl<T: Read + Seek> ReadSeek for T {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserSettings {
    /// Drop entries whose tree does not end where their size field says it should.
    validate_framing: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            validate_framing: true,
        }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    /// When disabled, misframed entries are still realigned, but are emitted instead of dropped.
    pub fn validate_framing(mut self, validate_framing: bool) -> Self {
        self.validate_framing = validate_framing;
        self
    }

    pub fn should_validate_framing(&self) -> bool {
        self.validate_framing
    }
}

/// Wraps a single `appinfo.vdf` container.
///
/// The envelope (and the string table of version 41+ files) is read eagerly when the parser is
/// created, so an unsupported file is rejected before any entry is touched.
pub struct AppInfoParser<T: ReadSeek> {
    data: T,
    header: AppInfoFileHeader,
    config: ParserSettings,
}

impl AppInfoParser<BufReader<File>> {
    /// Attempts to load a container from a given path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let f = File::open(path).map_err(|e| AppInfoError::FailedToOpenFile {
            source: e,
            path: path.to_path_buf(),
        })?;

        Self::from_read_seek(BufReader::new(f))
    }
}

impl AppInfoParser<Cursor<Vec<u8>>> {
    /// Attempts to load a container from an owned buffer.
    pub fn from_buffer(buffer: Vec<u8>) -> Result<Self> {
        Self::from_read_seek(Cursor::new(buffer))
    }
}

impl<T: ReadSeek> AppInfoParser<T> {
    pub fn from_read_seek(mut read_seek: T) -> Result<Self> {
        let header = AppInfoFileHeader::from_stream(&mut read_seek)?;

        debug!(
            "appinfo v{} ({:?}), records start at {}",
            header.version, header.universe, header.records_start
        );

        Ok(AppInfoParser {
            data: read_seek,
            header,
            config: ParserSettings::default(),
        })
    }

    pub fn with_configuration(mut self, configuration: ParserSettings) -> Self {
        self.config = configuration;
        self
    }

    pub fn header(&self) -> &AppInfoFileHeader {
        &self.header
    }

    /// Iterates the raw, well-framed entries of the container.
    ///
    /// Every call starts over from the first entry.
    pub fn records(&mut self) -> IterAppRecords<'_, T> {
        IterAppRecords {
            data: &mut self.data,
            header: &self.header,
            settings: &self.config,
            positioned: false,
            exhausted: false,
            scanned: 0,
            emitted: 0,
            misframed: 0,
        }
    }

    /// Iterates the entries which carry a `common` section, mapped to [`App`]s.
    pub fn apps<'a>(
        &'a mut self,
        libraries: &'a LibraryFolders,
    ) -> impl Iterator<Item = Result<App>> + 'a {
        self.records().filter_map(move |record| match record {
            Ok(record) => App::from_record(record, libraries).map(Ok),
            Err(e) => Some(Err(e)),
        })
    }

    /// Iterates the music entries, fully enriched into [`Soundtrack`]s.
    pub fn soundtracks<'a>(
        &'a mut self,
        libraries: &'a LibraryFolders,
        genres: &'a dyn GenreLookup,
    ) -> impl Iterator<Item = Result<Soundtrack>> + 'a {
        self.apps(libraries).filter_map(move |app| match app {
            Ok(app) if app.is_soundtrack() => {
                let genre_map = genres.genre_map(app.app_id);
                app.try_parse_soundtrack(&genre_map).map(Ok)
            }
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
    }
}

/// Sequentially decodes entries until the `app_id == 0` sentinel.
pub struct IterAppRecords<'a, T: ReadSeek> {
    data: &'a mut T,
    header: &'a AppInfoFileHeader,
    settings: &'a ParserSettings,
    positioned: bool,
    exhausted: bool,
    scanned: usize,
    emitted: usize,
    misframed: usize,
}

enum Step {
    Record(AppRecord),
    Skipped,
    End,
}

impl<T: ReadSeek> IterAppRecords<'_, T> {
    /// Entries read so far, including the ones which were dropped.
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Entries whose tree did not end at their declared size.
    pub fn misframed(&self) -> usize {
        self.misframed
    }

    fn realign(&mut self, app_id: u32, expected_end: u64) -> Result<()> {
        self.misframed += 1;
        self.data.seek(SeekFrom::Start(expected_end))?;
        debug!("Realigned to {} after app {}", expected_end, app_id);
        Ok(())
    }

    fn read_next(&mut self) -> Result<Step> {
        let offset = self.data.tell()?;

        let app_id = match self.data.try_u32_named("app id") {
            Ok(app_id) => app_id,
            Err(e) if e.is_eof() => {
                warn!(
                    "Record stream ended at offset {} without a terminating app id",
                    offset
                );
                return Ok(Step::End);
            }
            Err(e) => return Err(e.into()),
        };

        if app_id == 0 {
            return Ok(Step::End);
        }

        self.scanned += 1;

        let size = self
            .data
            .try_u32_named("entry size")
            .map_err(|source| AppInfoError::FailedToDeserializeApp { app_id, source })?;
        let expected_end = entry_end(offset, size);
        trace!("App {} at offset {}, ends at {}", app_id, offset, expected_end);

        let decoded = self.read_entry(app_id, size);

        let (header, data) = match decoded {
            Ok(decoded) => decoded,
            Err(source) if source.is_eof() => {
                return Err(AppInfoError::FailedToDeserializeApp { app_id, source });
            }
            Err(source) => {
                warn!(
                    "Failed to decode app {}, skipping to offset {}: {}",
                    app_id, expected_end, source
                );
                self.realign(app_id, expected_end)?;
                return Ok(Step::Skipped);
            }
        };

        let position = self.data.tell()?;
        if position != expected_end {
            warn!(
                "App {} declares an end of {} but its data ended at {}",
                app_id, expected_end, position
            );
            self.realign(app_id, expected_end)?;

            if self.settings.should_validate_framing() {
                return Ok(Step::Skipped);
            }
        }

        Ok(Step::Record(AppRecord {
            offset,
            header,
            data,
        }))
    }

    fn read_entry(
        &mut self,
        app_id: u32,
        size: u32,
    ) -> std::result::Result<(AppRecordHeader, KvNode), DeserializationError> {
        let header = AppRecordHeader::from_stream(&mut *self.data, app_id, size, self.header.version)?;
        let data = binary::from_reader(&mut *self.data, self.header.string_table.as_ref())?;

        Ok((header, data))
    }
}

impl<T: ReadSeek> Iterator for IterAppRecords<'_, T> {
    type Item = Result<AppRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        if !self.positioned {
            if let Err(e) = self.data.seek(SeekFrom::Start(self.header.records_start)) {
                self.exhausted = true;
                return Some(Err(e.into()));
            }
            self.positioned = true;
        }

        loop {
            match self.read_next() {
                Ok(Step::Record(record)) => {
                    self.emitted += 1;
                    return Some(Ok(record));
                }
                Ok(Step::Skipped) => continue,
                Ok(Step::End) => {
                    self.exhausted = true;
                    info!(
                        "Scanned {} apps, emitted {}, {} misframed",
                        self.scanned, self.emitted, self.misframed
                    );
                    return None;
                }
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
