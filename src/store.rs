//! Resolves numeric genre ids to their descriptions.
//!
//! Lookups never fail: whatever goes wrong (no network, a timeout, an unexpected payload) is
//! logged and turns into an empty [`GenreMap`], which simply leaves genres unresolved.
use hashbrown::HashMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Genre id to description, e.g. `23 => "Indie"`.
pub type GenreMap = HashMap<i32, String>;

pub trait GenreLookup {
    fn genre_map(&self, app_id: u32) -> GenreMap;
}

/// Resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGenreLookup;

impl GenreLookup for NoGenreLookup {
    fn genre_map(&self, _app_id: u32) -> GenreMap {
        GenreMap::new()
    }
}

/// The same genres for every app.
impl GenreLookup for GenreMap {
    fn genre_map(&self, _app_id: u32) -> GenreMap {
        self.clone()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "store")]
    #[error("Request failed: {0}")]
    Http(#[from] attohttpc::Error),

    #[error("Store responded with status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response has no genre list for app {0}")]
    MissingGenres(u32),

    #[error("Genre id `{0}` is not an integer")]
    InvalidGenreId(String),
}

#[derive(Debug, Deserialize)]
struct AppDetails {
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    genres: Option<Vec<Genre>>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    /// The store sends ids as strings, but numbers are accepted too.
    id: Value,
    description: String,
}

/// Parses an `appdetails` response, `{"<app id>": {"data": {"genres": [{"id", "description"}]}}}`.
pub fn parse_genre_map(app_id: u32, body: &[u8]) -> Result<GenreMap, StoreError> {
    let mut response: HashMap<String, AppDetails> = serde_json::from_slice(body)?;

    let genres = response
        .remove(&app_id.to_string())
        .and_then(|details| details.data)
        .and_then(|data| data.genres)
        .ok_or(StoreError::MissingGenres(app_id))?;

    genres
        .into_iter()
        .map(|genre| {
            let id = match &genre.id {
                Value::String(s) => s.trim().parse::<i32>().ok(),
                Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
                _ => None,
            }
            .ok_or_else(|| StoreError::InvalidGenreId(genre.id.to_string()))?;

            Ok((id, genre.description))
        })
        .collect()
}

#[cfg(feature = "store")]
pub use self::client::{StoreClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

#[cfg(feature = "store")]
mod client {
    use super::*;
    use log::{debug, warn};
    use std::time::Duration;

    pub const DEFAULT_BASE_URL: &str = "https://store.steampowered.com/api/";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Blocking client for the store's `appdetails` endpoint.
    #[derive(Debug, Clone)]
    pub struct StoreClient {
        base_url: String,
        timeout: Duration,
    }

    impl Default for StoreClient {
        fn default() -> Self {
            StoreClient {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: DEFAULT_TIMEOUT,
            }
        }
    }

    impl StoreClient {
        pub fn new() -> Self {
            StoreClient::default()
        }

        pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into();
            self
        }

        /// Upper bound for a whole request, including reading the body.
        pub fn timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        fn fetch(&self, app_id: u32) -> Result<GenreMap, StoreError> {
            let url = format!("{}/appdetails", self.base_url.trim_end_matches('/'));

            let response = attohttpc::get(url)
                .param("appids", app_id)
                .timeout(self.timeout)
                .send()?;

            if !response.is_success() {
                return Err(StoreError::Status(response.status().as_u16()));
            }

            parse_genre_map(app_id, &response.bytes()?)
        }
    }

    impl GenreLookup for StoreClient {
        fn genre_map(&self, app_id: u32) -> GenreMap {
            match self.fetch(app_id) {
                Ok(genres) => {
                    debug!("Resolved {} genres for app {}", genres.len(), app_id);
                    genres
                }
                Err(e) => {
                    warn!("Genre lookup for app {} failed: {}", app_id, e);
                    GenreMap::new()
                }
            }
        }
    }
}
