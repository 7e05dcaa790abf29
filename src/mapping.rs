//! Turns raw entries into [`App`]s and music apps into [`Soundtrack`]s.
//!
//! Every optional field is soft: a missing node yields `None`, and a node which is present but
//! cannot be coerced is logged and treated as missing. Nothing here fails a whole scan.
use jiff::{SignedDuration, Timestamp};
use log::{trace, warn};

use crate::app_record::AppRecord;
use crate::err::{AppInfoError, CoercionError, Result};
use crate::keyvalues::KvNode;
use crate::library_folders::LibraryFolders;
use crate::model::{App, AppType, Metadata, Soundtrack, Track};
use crate::store::GenreMap;
use crate::utils::timestamp_from_unix_seconds;

/// Reads an optional field, logging (and dropping) values which are present but malformed.
fn soft<'a, T>(
    app_id: u32,
    node: Option<&'a KvNode>,
    coerce: impl FnOnce(&'a KvNode) -> std::result::Result<T, CoercionError>,
) -> Option<T> {
    let node = node?;
    match coerce(node) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("App {}: ignoring field, {}", app_id, e);
            None
        }
    }
}

fn soft_string(app_id: u32, node: Option<&KvNode>) -> Option<String> {
    soft(app_id, node, KvNode::to_string_value)
}

fn soft_timestamp(app_id: u32, node: Option<&KvNode>) -> Option<Timestamp> {
    soft(app_id, node, KvNode::to_u32).map(timestamp_from_unix_seconds)
}

impl App {
    /// Maps a raw entry. Entries without a `common` section carry nothing usable and yield `None`.
    pub fn from_record(record: AppRecord, libraries: &LibraryFolders) -> Option<App> {
        let app_id = record.app_id();

        let Some(common) = record.data.get("common") else {
            trace!("App {} has no `common` section, skipping", app_id);
            return None;
        };

        let name = soft_string(app_id, common.get("name")).unwrap_or_default();
        let app_type = soft_string(app_id, common.get("type"))
            .map(|t| AppType::from_name(&t))
            .unwrap_or_default();

        let install_dir = soft_string(app_id, record.data.path(&["config", "installdir"]))
            .and_then(|installdir| libraries.install_dir(app_id, app_type, &installdir));

        let AppRecord { header, data, .. } = record;

        Some(App {
            app_id,
            name,
            info_state: header.info_state,
            app_type,
            last_updated: header.last_updated,
            token: header.token,
            content_hash: header.content_hash,
            binary_data_hash: header.binary_data_hash,
            change_number: header.change_number,
            install_dir,
            data,
        })
    }

    pub fn is_soundtrack(&self) -> bool {
        self.app_type == AppType::Music
    }

    fn common(&self, name: &str) -> Option<&KvNode> {
        self.data.path(&["common", name])
    }

    /// Builds the soundtrack view of a music app, resolving genre ids through `genres`.
    pub fn parse_soundtrack(&self, genres: &GenreMap) -> Result<Soundtrack> {
        if !self.is_soundtrack() {
            return Err(AppInfoError::NotASoundtrack {
                app_id: self.app_id,
                app_type: self.app_type.to_string(),
            });
        }

        let app_id = self.app_id;

        let primary_genre = soft(app_id, self.common("primary_genre"), KvNode::to_i32)
            .and_then(|id| genres.get(&id).cloned())
            .unwrap_or_default();

        let genre_names = self
            .common("genres")
            .map(|list| {
                list.children()
                    .filter_map(|genre| soft(app_id, Some(genre), KvNode::to_i32))
                    .filter_map(|id| genres.get(&id).cloned())
                    .collect()
            })
            .unwrap_or_default();

        let album = self.data.get("albummetadata");

        Ok(Soundtrack {
            app_id,
            name: self.name.clone(),
            metacritic_name: soft_string(app_id, self.common("metacritic_name")),
            original_release_date: soft_timestamp(app_id, self.common("original_release_date")),
            steam_release_date: soft_timestamp(app_id, self.common("steam_release_date")),
            review_score: soft(app_id, self.common("review_score"), KvNode::to_i32),
            review_percentage: soft(app_id, self.common("review_percentage"), KvNode::to_i32),
            install_dir: self.install_dir.clone(),
            metadata: album
                .map(|album| parse_metadata(app_id, album))
                .unwrap_or_default(),
            tracks: album
                .and_then(|album| album.get("tracks"))
                .map(|tracks| tracks.children().filter_map(|t| parse_track(app_id, t)).collect())
                .unwrap_or_default(),
            primary_genre,
            genres: genre_names,
            data: self.data.clone(),
        })
    }

    /// Like [`App::parse_soundtrack`], but `None` for anything that is not a music app.
    pub fn try_parse_soundtrack(&self, genres: &GenreMap) -> Option<Soundtrack> {
        self.parse_soundtrack(genres).ok()
    }
}

fn parse_metadata(app_id: u32, album: &KvNode) -> Metadata {
    let english = |field: &str| soft_string(app_id, album.path(&["metadata", field, "english"]));

    Metadata {
        artist: english("artist"),
        composer: english("composer"),
        label: english("Label"),
        credits: english("othercredits"),
    }
}

/// A track needs its disc and track number, and a non-blank name. Anything else is dropped.
fn parse_track(app_id: u32, track: &KvNode) -> Option<Track> {
    let minutes = soft(app_id, track.get("m"), KvNode::to_i64);
    let seconds = soft(app_id, track.get("s"), KvNode::to_i64);

    let duration = match (minutes, seconds) {
        (None, None) => None,
        (m, s) => {
            let total = m.unwrap_or(0).saturating_mul(60).saturating_add(s.unwrap_or(0));
            Some(SignedDuration::from_secs(total.max(0)))
        }
    };

    let disc_number = soft(app_id, track.get("discnumber"), KvNode::to_u32)?;
    let track_number = soft(app_id, track.get("tracknumber"), KvNode::to_u32)?;
    let original_name = soft_string(app_id, track.get("originalname"))
        .filter(|name| !name.trim().is_empty())?;

    Some(Track {
        disc_number,
        track_number,
        original_name,
        duration,
    })
}
