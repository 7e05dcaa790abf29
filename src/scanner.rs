use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};

use crate::appinfo_parser::{AppInfoParser, ParserSettings};
use crate::err::{AppInfoError, LibraryFoldersError, Result};
use crate::library_folders::{InstallLayout, LibraryFolders};
use crate::model::Soundtrack;
use crate::steam_dir::SteamDir;
use crate::store::{GenreLookup, NoGenreLookup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerSettings {
    resolve_genres: bool,
    genre_timeout: Duration,
    parser: ParserSettings,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            resolve_genres: true,
            genre_timeout: Duration::from_secs(10),
            parser: ParserSettings::default(),
        }
    }
}

impl ScannerSettings {
    pub fn new() -> Self {
        ScannerSettings::default()
    }

    /// Query the store for genre names. Without this genres stay unresolved.
    pub fn resolve_genres(mut self, resolve_genres: bool) -> Self {
        self.resolve_genres = resolve_genres;
        self
    }

    pub fn genre_timeout(mut self, genre_timeout: Duration) -> Self {
        self.genre_timeout = genre_timeout;
        self
    }

    pub fn parser_settings(mut self, parser: ParserSettings) -> Self {
        self.parser = parser;
        self
    }

    pub fn should_resolve_genres(&self) -> bool {
        self.resolve_genres
    }

    pub fn get_genre_timeout(&self) -> Duration {
        self.genre_timeout
    }

    fn genre_lookup(&self) -> Box<dyn GenreLookup> {
        #[cfg(feature = "store")]
        {
            if self.resolve_genres {
                return Box::new(crate::store::StoreClient::new().timeout(self.genre_timeout));
            }
        }

        Box::new(NoGenreLookup)
    }
}

/// Finds every soundtrack of a Steam installation, given its container and library descriptor.
#[derive(Debug, Clone)]
pub struct SoundtrackScanner {
    appinfo_path: PathBuf,
    library_folders_path: PathBuf,
    layout: InstallLayout,
    settings: ScannerSettings,
}

impl SoundtrackScanner {
    pub fn new(appinfo_path: impl AsRef<Path>, library_folders_path: impl AsRef<Path>) -> Self {
        SoundtrackScanner {
            appinfo_path: appinfo_path.as_ref().to_path_buf(),
            library_folders_path: library_folders_path.as_ref().to_path_buf(),
            layout: InstallLayout::default(),
            settings: ScannerSettings::default(),
        }
    }

    /// Scans a Steam root, whose libraries use the `steamapps` layout.
    pub fn from_steam_dir(steam_dir: &SteamDir) -> Self {
        SoundtrackScanner::new(steam_dir.appinfo_path(), steam_dir.library_folders_path())
            .with_layout(InstallLayout::Steam)
    }

    pub fn with_layout(mut self, layout: InstallLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_configuration(mut self, settings: ScannerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn library_folders(&self) -> std::result::Result<LibraryFolders, LibraryFoldersError> {
        LibraryFolders::from_path(&self.library_folders_path)
            .map(|libraries| libraries.with_layout(self.layout))
    }

    /// Runs the scan, resolving genres according to the settings.
    ///
    /// The library descriptor is optional: if it cannot be read, no install dirs are resolved.
    pub fn scan(&self) -> Result<Vec<Soundtrack>> {
        let genres = self.settings.genre_lookup();
        self.scan_with(genres.as_ref())
    }

    pub fn scan_with(&self, genres: &dyn GenreLookup) -> Result<Vec<Soundtrack>> {
        let libraries = match self.library_folders() {
            Ok(libraries) => libraries,
            Err(e) => {
                warn!("Install dirs will not be resolved: {}", e);
                LibraryFolders::default().with_layout(self.layout)
            }
        };

        let mut parser = AppInfoParser::from_path(&self.appinfo_path)?
            .with_configuration(self.settings.parser.clone());

        let soundtracks = parser
            .soundtracks(&libraries, genres)
            .collect::<std::result::Result<Vec<Soundtrack>, AppInfoError>>()?;

        info!(
            "Found {} soundtracks in {}",
            soundtracks.len(),
            self.appinfo_path.display()
        );

        Ok(soundtracks)
    }
}
