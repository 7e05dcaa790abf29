//! Domain records produced from a decoded container.
use std::fmt;
use std::path::PathBuf;

use jiff::{SignedDuration, Timestamp};
use serde::{Serialize, Serializer};

use crate::keyvalues::KvNode;

/// Length of the SHA-1 digests stored in every entry header.
pub const HASH_SIZE: usize = 20;

pub type Sha1Digest = [u8; HASH_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Universe {
    Invalid = 0,
    Public = 1,
    Beta = 2,
    Internal = 3,
    Dev = 4,
    Max = 5,
}

impl Universe {
    pub fn from_u32(value: u32) -> Option<Universe> {
        match value {
            0 => Some(Universe::Invalid),
            1 => Some(Universe::Public),
            2 => Some(Universe::Beta),
            3 => Some(Universe::Internal),
            4 => Some(Universe::Dev),
            5 => Some(Universe::Max),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InfoState {
    NoInfo,
    Normal,
    /// A state this crate does not know about, kept as read.
    Unknown(u32),
}

impl From<u32> for InfoState {
    fn from(value: u32) -> Self {
        match value {
            1 => InfoState::NoInfo,
            2 => InfoState::Normal,
            other => InfoState::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum AppType {
    #[default]
    Unknown,
    Config,
    Game,
    Tool,
    Demo,
    #[serde(rename = "DLC")]
    Dlc,
    Application,
    Music,
    Beta,
    Video,
    Hardware,
}

const APP_TYPE_NAMES: [(&str, AppType); 11] = [
    ("unknown", AppType::Unknown),
    ("config", AppType::Config),
    ("game", AppType::Game),
    ("tool", AppType::Tool),
    ("demo", AppType::Demo),
    ("dlc", AppType::Dlc),
    ("application", AppType::Application),
    ("music", AppType::Music),
    ("beta", AppType::Beta),
    ("video", AppType::Video),
    ("hardware", AppType::Hardware),
];

impl AppType {
    /// Matches `common.type` case-insensitively. Anything unrecognized is [`AppType::Unknown`].
    pub fn from_name(name: &str) -> AppType {
        let name = name.trim();
        APP_TYPE_NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|&(_, app_type)| app_type)
            .unwrap_or_default()
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppType::Unknown => "Unknown",
            AppType::Config => "Config",
            AppType::Game => "Game",
            AppType::Tool => "Tool",
            AppType::Demo => "Demo",
            AppType::Dlc => "DLC",
            AppType::Application => "Application",
            AppType::Music => "Music",
            AppType::Beta => "Beta",
            AppType::Video => "Video",
            AppType::Hardware => "Hardware",
        };
        f.write_str(name)
    }
}

/// An application entry with its header, the fields every app shares, and its raw tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct App {
    pub app_id: u32,
    pub name: String,
    pub info_state: InfoState,
    pub app_type: AppType,
    pub last_updated: Timestamp,
    /// Product info change set token.
    pub token: u64,
    #[serde(serialize_with = "serialize_digest")]
    pub content_hash: Sha1Digest,
    /// Only present in version 40+ containers.
    #[serde(serialize_with = "serialize_optional_digest")]
    pub binary_data_hash: Option<Sha1Digest>,
    pub change_number: u32,
    pub install_dir: Option<PathBuf>,
    pub data: KvNode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub artist: Option<String>,
    pub composer: Option<String>,
    pub label: Option<String>,
    pub credits: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    pub disc_number: u32,
    pub track_number: u32,
    pub original_name: String,
    pub duration: Option<SignedDuration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Soundtrack {
    pub app_id: u32,
    pub name: String,
    pub metacritic_name: Option<String>,
    pub original_release_date: Option<Timestamp>,
    pub steam_release_date: Option<Timestamp>,
    pub review_score: Option<i32>,
    pub review_percentage: Option<i32>,
    pub install_dir: Option<PathBuf>,
    pub metadata: Metadata,
    pub tracks: Vec<Track>,
    /// Empty when the genre id could not be resolved.
    pub primary_genre: String,
    pub genres: Vec<String>,
    #[serde(skip)]
    pub data: KvNode,
}

pub(crate) fn digest_to_hex(digest: &Sha1Digest) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn serialize_digest<S: Serializer>(digest: &Sha1Digest, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&digest_to_hex(digest))
}

fn serialize_optional_digest<S: Serializer>(
    digest: &Option<Sha1Digest>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match digest {
        Some(digest) => serializer.serialize_some(&digest_to_hex(digest)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_app_type_matching_is_case_insensitive() {
        assert_eq!(AppType::from_name("Music"), AppType::Music);
        assert_eq!(AppType::from_name("music"), AppType::Music);
        assert_eq!(AppType::from_name("Config"), AppType::Config);
        assert_eq!(AppType::from_name("config"), AppType::Config);
        assert_eq!(AppType::from_name("DLC"), AppType::Dlc);
        assert_eq!(AppType::from_name("dlc"), AppType::Dlc);
    }

    #[test]
    fn test_unrecognized_app_type_is_unknown() {
        assert_eq!(AppType::from_name("Series"), AppType::Unknown);
        assert_eq!(AppType::from_name(""), AppType::Unknown);
        assert_eq!(AppType::from_name("7"), AppType::Unknown);
    }

    #[test]
    fn test_app_type_display_round_trips_through_from_name() {
        for (_, app_type) in APP_TYPE_NAMES {
            assert_eq!(AppType::from_name(&app_type.to_string()), app_type);
        }
    }

    #[test]
    fn test_info_state_keeps_unknown_values() {
        assert_eq!(InfoState::from(1), InfoState::NoInfo);
        assert_eq!(InfoState::from(2), InfoState::Normal);
        assert_eq!(InfoState::from(9), InfoState::Unknown(9));
    }

    #[test]
    fn test_universe_from_u32() {
        assert_eq!(Universe::from_u32(1), Some(Universe::Public));
        assert_eq!(Universe::from_u32(5), Some(Universe::Max));
        assert_eq!(Universe::from_u32(6), None);
    }

    #[test]
    fn test_digest_hex() {
        let mut digest = [0_u8; HASH_SIZE];
        digest[0] = 0xab;
        digest[19] = 0x01;
        assert_eq!(
            digest_to_hex(&digest),
            "ab00000000000000000000000000000000000001"
        );
    }
}
