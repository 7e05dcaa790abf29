use std::env;
use std::path::{Path, PathBuf};

use log::debug;

/// A Steam installation root, e.g. `~/.steam/steam`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteamDir {
    root: PathBuf,
}

impl SteamDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SteamDir { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn appinfo_path(&self) -> PathBuf {
        self.root.join("appcache").join("appinfo.vdf")
    }

    pub fn library_folders_path(&self) -> PathBuf {
        self.root.join("steamapps").join("libraryfolders.vdf")
    }

    /// Looks for an installation in the usual places below `$HOME`.
    ///
    /// Only roots which actually contain `appcache/appinfo.vdf` are accepted.
    pub fn detect() -> Option<SteamDir> {
        let home = env::var_os("HOME").map(PathBuf::from)?;
        Self::detect_in(&home)
    }

    pub fn detect_in(home: &Path) -> Option<SteamDir> {
        const CANDIDATES: [&str; 5] = [
            ".steam/steam",
            ".steam/root",
            ".steam",
            ".local/share/Steam",
            "Library/Application Support/Steam",
        ];

        CANDIDATES
            .iter()
            .map(|candidate| SteamDir::new(home.join(candidate)))
            .find(|dir| {
                let found = dir.appinfo_path().is_file();
                debug!("Probing {}: {}", dir.root.display(), found);
                found
            })
    }
}
