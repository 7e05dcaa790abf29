use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use hashbrown::HashSet;
use log::{debug, warn};

use crate::err::LibraryFoldersError;
use crate::keyvalues::text::{self, TextOptions};
use crate::keyvalues::KvNode;
use crate::model::AppType;

/// A library root folder and the apps installed under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub path: String,
    pub apps: HashSet<u32>,
}

/// How an app's install directory is laid out below its library root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstallLayout {
    /// `<root>/{music|common}/<installdir>`
    #[default]
    Flat,
    /// `<root>/steamapps/{music|common}/<installdir>`, the layout of a real Steam library.
    Steam,
}

/// Index of `libraryfolders.vdf`, answering which library owns an app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFolders {
    libraries: Vec<Library>,
    layout: InstallLayout,
}

impl LibraryFolders {
    pub fn new(libraries: Vec<Library>) -> Self {
        LibraryFolders {
            libraries,
            layout: InstallLayout::default(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LibraryFoldersError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LibraryFoldersError::FailedToOpenFile {
            source,
            path: path.to_path_buf(),
        })?;

        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LibraryFoldersError> {
        let root = text::from_reader(reader, TextOptions::default())?;
        Ok(Self::from_tree(&root))
    }

    pub fn from_text(input: &str) -> Result<Self, LibraryFoldersError> {
        let root = text::from_str(input)?;
        Ok(Self::from_tree(&root))
    }

    /// Builds the index from an already parsed descriptor.
    ///
    /// Libraries are taken in index order (`"0"`, `"1"`, ...). Libraries without a `path`,
    /// or without an `apps` object, are skipped.
    pub fn from_tree(root: &KvNode) -> Self {
        let mut entries: Vec<&KvNode> = root.children().collect();
        entries.sort_by_key(|entry| entry.name.trim().parse::<u64>().unwrap_or(u64::MAX));

        let mut libraries = Vec::new();

        for entry in entries {
            let path = entry.get("path").and_then(|p| p.to_string_value().ok());
            let apps = entry.get("apps").filter(|apps| apps.is_object());

            let (Some(path), Some(apps)) = (path, apps) else {
                warn!(
                    "Invalid library `{}` (path: {:?}), skipping",
                    entry.name,
                    entry.get("path").map(|p| p.value.to_string())
                );
                continue;
            };

            let apps = apps
                .children()
                .filter_map(|app| match app.name.trim().parse::<u32>() {
                    Ok(app_id) => Some(app_id),
                    Err(_) => {
                        warn!("Library `{}` lists invalid app id `{}`", path, app.name);
                        None
                    }
                })
                .collect::<HashSet<u32>>();

            let path = normalize_library_path(&path);
            debug!("Library `{}` owns {} apps", path, apps.len());

            libraries.push(Library { path, apps });
        }

        LibraryFolders::new(libraries)
    }

    pub fn with_layout(mut self, layout: InstallLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> InstallLayout {
        self.layout
    }

    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    /// The first library (in descriptor order) owning `app_id`.
    pub fn library_for_app(&self, app_id: u32) -> Option<&Library> {
        self.libraries
            .iter()
            .find(|library| library.apps.contains(&app_id))
    }

    /// Where `app_id` is installed, if some library owns it.
    ///
    /// `installdir` always lands below the library root: root, prefix and `..` components
    /// are dropped.
    pub fn install_dir(&self, app_id: u32, app_type: AppType, installdir: &str) -> Option<PathBuf> {
        let library = self.library_for_app(app_id)?;

        let mut path = PathBuf::from(&library.path);
        if self.layout == InstallLayout::Steam {
            path.push("steamapps");
        }
        path.push(if app_type == AppType::Music {
            "music"
        } else {
            "common"
        });
        path.extend(Path::new(installdir).components().filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        }));

        Some(path)
    }
}

/// Collapses the escaped `\\` separators of `libraryfolders.vdf` into single backslashes.
pub fn normalize_library_path(path: &str) -> String {
    path.replace(r"\\", r"\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const DESCRIPTOR: &str = r#"
"libraryfolders"
{
	"0"
	{
		"path"		"C:\\Program Files (x86)\\Steam"
		"apps"
		{
			"228980"		"1216489498"
			"100"		"1"
		}
	}
	"1"
	{
		"path"		"/games/Lib1"
		"apps"
		{
			"100"		"42"
			"200"		"42"
			"not-an-id"		"0"
		}
	}
	"2"
	{
		"apps"
		{
			"300"		"1"
		}
	}
	"3"
	{
		"path"		"/games/Lib3"
		"apps"		"broken"
	}
}
"#;

    #[test]
    fn test_skips_invalid_libraries_and_normalizes_paths() {
        let folders = LibraryFolders::from_text(DESCRIPTOR).unwrap();

        assert_eq!(folders.libraries().len(), 2);
        assert_eq!(
            folders.libraries()[0].path,
            r"C:\Program Files (x86)\Steam"
        );
        assert_eq!(
            folders.libraries()[1].apps,
            [100_u32, 200].into_iter().collect::<HashSet<u32>>()
        );
    }

    #[test]
    fn test_first_owning_library_wins() {
        let folders = LibraryFolders::from_text(DESCRIPTOR).unwrap();

        assert_eq!(
            folders.library_for_app(100).map(|l| l.path.as_str()),
            Some(r"C:\Program Files (x86)\Steam")
        );
        assert_eq!(
            folders.library_for_app(200).map(|l| l.path.as_str()),
            Some("/games/Lib1")
        );
        assert_eq!(folders.library_for_app(300), None);
    }

    #[test]
    fn test_install_dir_depends_on_app_type() {
        let folders = LibraryFolders::new(vec![Library {
            path: "/games/Lib1".to_string(),
            apps: [100].into_iter().collect(),
        }]);

        assert_eq!(
            folders.install_dir(100, AppType::Music, "Foo").as_deref(),
            Some(Path::new("/games/Lib1/music/Foo"))
        );
        assert_eq!(
            folders.install_dir(100, AppType::Game, "Foo").as_deref(),
            Some(Path::new("/games/Lib1/common/Foo"))
        );
        assert_eq!(folders.install_dir(101, AppType::Music, "Foo"), None);
    }

    #[test]
    fn test_install_dir_stays_below_library_root() {
        let folders = LibraryFolders::new(vec![Library {
            path: "/games/Lib1".to_string(),
            apps: [100].into_iter().collect(),
        }]);

        assert_eq!(
            folders.install_dir(100, AppType::Music, "/etc/Foo").as_deref(),
            Some(Path::new("/games/Lib1/music/etc/Foo"))
        );
        assert_eq!(
            folders.install_dir(100, AppType::Game, "../../Foo/./Bar").as_deref(),
            Some(Path::new("/games/Lib1/common/Foo/Bar"))
        );
    }

    #[test]
    fn test_libraries_keep_index_order() {
        let text = (0..12)
            .rev()
            .map(|i| format!("\"{i}\" {{ \"path\" \"/lib{i}\" \"apps\" {{ \"100\" \"1\" }} }}\n"))
            .collect::<String>();
        let folders = LibraryFolders::from_text(&format!("\"libraryfolders\" {{\n{text}}}")).unwrap();

        assert_eq!(
            folders.libraries().iter().map(|l| l.path.as_str()).collect::<Vec<_>>(),
            (0..12).map(|i| format!("/lib{i}")).collect::<Vec<_>>()
        );
        assert_eq!(folders.library_for_app(100).map(|l| l.path.as_str()), Some("/lib0"));
    }

    #[test]
    fn test_steam_layout_inserts_steamapps() {
        let folders = LibraryFolders::new(vec![Library {
            path: "/home/user/.steam/steam".to_string(),
            apps: [100].into_iter().collect(),
        }])
        .with_layout(InstallLayout::Steam);

        assert_eq!(
            folders.install_dir(100, AppType::Music, "Foo").as_deref(),
            Some(Path::new("/home/user/.steam/steam/steamapps/music/Foo"))
        );
    }

    #[test]
    fn test_normalizes_escaped_backslashes() {
        assert_eq!(normalize_library_path(r"D:\\SteamLibrary"), r"D:\SteamLibrary");
        assert_eq!(normalize_library_path("/plain/path"), "/plain/path");
    }

    #[test]
    fn test_unparsable_descriptor_is_an_error() {
        assert!(matches!(
            LibraryFolders::from_text("\"libraryfolders\" {"),
            Err(LibraryFoldersError::Deserialization(_))
        ));
    }
}
