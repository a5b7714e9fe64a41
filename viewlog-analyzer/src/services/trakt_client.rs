//! Trakt API client
//!
//! Implements [`CatalogClient`] on top of the Trakt v2 REST API. Authentication is the
//! application client id sent as `trakt-api-key`; no user login is needed for the
//! read-only endpoints used here.
//!
//! Endpoints:
//! - `GET /search/{movie|show}?query=..&extended=full&limit=1`: entity lookup
//! - `GET /shows/{slug}/seasons?extended=episodes`: season and episode listing
//! - `GET /search/trakt/{id}?type=episode&extended=full`: single episode details
//!
//! API Documentation: https://trakt.docs.apiary.io/

use super::catalog_client::CatalogClient;
use crate::models::{CatalogEntity, CatalogEpisode, MediaKind, SeasonSummary};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

const TRAKT_BASE_URL: &str = "https://api.trakt.tv";
const TRAKT_API_VERSION: &str = "2";
const USER_AGENT: &str = concat!("viewlog/", env!("CARGO_PKG_VERSION"));

/// Search hits scoring below this are logged as doubtful
const LOW_SCORE_THRESHOLD: f64 = 1000.0;

/// Trakt client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid client id: {0}")]
    InvalidClientId(String),
}

#[derive(Debug, Deserialize)]
struct TraktIds {
    trakt: u64,
    #[serde(default)]
    slug: Option<String>,
}

/// Movie object of `extended=full` responses
#[derive(Debug, Deserialize)]
struct TraktMovie {
    title: String,
    #[serde(default)]
    year: Option<u32>,
    ids: TraktIds,
    #[serde(default)]
    released: Option<String>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    certification: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
}

/// Show object of `extended=full` responses
#[derive(Debug, Deserialize)]
struct TraktShow {
    title: String,
    #[serde(default)]
    year: Option<u32>,
    ids: TraktIds,
    #[serde(default)]
    first_aired: Option<String>,
    /// Average episode runtime
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    certification: Option<String>,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TraktEpisode {
    #[serde(default)]
    title: Option<String>,
    ids: TraktIds,
    #[serde(default)]
    runtime: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TraktSeason {
    number: u32,
    #[serde(default)]
    episodes: Vec<TraktEpisode>,
}

/// One hit of a search endpoint
#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    movie: Option<TraktMovie>,
    #[serde(default)]
    show: Option<TraktShow>,
    #[serde(default)]
    episode: Option<TraktEpisode>,
}

type DirectRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Trakt API client
pub struct TraktClient {
    /// HTTP client carrying the Trakt headers on every request
    client: Client,
    base_url: String,
    rate_limiter: DirectRateLimiter,
}

impl TraktClient {
    /// Create a client for the given application client id
    ///
    /// `requests_per_second` is clamped to at least one.
    pub fn new(client_id: &str, requests_per_second: u32) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("trakt-api-version", HeaderValue::from_static(TRAKT_API_VERSION));
        headers.insert(
            "trakt-api-key",
            HeaderValue::from_str(client_id)
                .map_err(|e| CatalogError::InvalidClientId(e.to_string()))?,
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url: TRAKT_BASE_URL.to_string(),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Point the client at another API root (staging or a local stub)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Search for a movie or show and return the top hit
    pub async fn search(
        &self,
        name: &str,
        kind: MediaKind,
    ) -> Result<Option<CatalogEntity>, CatalogError> {
        let url = format!("{}/search/{}", self.base_url, kind.as_str());
        let query = [
            ("query", name),
            ("extended", "full"),
            ("page", "1"),
            ("limit", "1"),
        ];

        tracing::debug!(name = %name, kind = %kind, "Searching Trakt");

        let hits: Vec<SearchHit> = self.get_json(&url, &query).await?;
        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };

        if let Some(score) = hit.score {
            if score < LOW_SCORE_THRESHOLD {
                tracing::warn!(
                    name = %name,
                    kind = %kind,
                    score,
                    "Low search score, catalog match may be wrong"
                );
            }
        }

        Ok(entity_from_hit(hit, kind))
    }

    /// Download all seasons of a show with their episode listings
    pub async fn seasons(&self, show: &CatalogEntity) -> Result<Vec<SeasonSummary>, CatalogError> {
        let id = show
            .slug
            .clone()
            .unwrap_or_else(|| show.catalog_id.to_string());
        let url = format!("{}/shows/{}/seasons", self.base_url, id);

        tracing::debug!(show = %show.title, id = %id, "Downloading seasons");

        let seasons: Vec<TraktSeason> = self.get_json(&url, &[("extended", "episodes")]).await?;
        Ok(seasons.into_iter().map(season_from_dto).collect())
    }

    /// Look up one episode by its Trakt id and return its runtime
    pub async fn episode_runtime(&self, trakt_id: &str) -> Result<Option<u32>, CatalogError> {
        let url = format!("{}/search/trakt/{}", self.base_url, trakt_id);
        let query = [("type", "episode"), ("extended", "full")];

        let hits: Vec<SearchHit> = self.get_json(&url, &query).await?;
        Ok(hits
            .into_iter()
            .find_map(|hit| hit.episode)
            .and_then(|episode| episode.runtime))
    }

    /// Rate-limited GET decoding a JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(url.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| CatalogError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl CatalogClient for TraktClient {
    async fn find_entity(&self, name: &str, kind: MediaKind) -> Option<CatalogEntity> {
        match self.search(name, kind).await {
            Ok(entity) => entity,
            Err(e) => {
                tracing::warn!(name = %name, kind = %kind, error = %e, "Catalog search failed");
                None
            }
        }
    }

    async fn fetch_seasons(&self, show: &CatalogEntity) -> Vec<SeasonSummary> {
        match self.seasons(show).await {
            Ok(seasons) => seasons,
            Err(e) => {
                tracing::warn!(show = %show.title, error = %e, "Season download failed");
                Vec::new()
            }
        }
    }

    async fn fetch_episode_runtime(&self, external_id: &str) -> Option<u32> {
        match self.episode_runtime(external_id).await {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(episode_id = %external_id, error = %e, "Episode lookup failed");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "trakt"
    }
}

fn entity_from_hit(hit: SearchHit, kind: MediaKind) -> Option<CatalogEntity> {
    match kind {
        MediaKind::Movie => hit.movie.map(entity_from_movie),
        MediaKind::Show => hit.show.map(entity_from_show),
    }
}

fn entity_from_movie(movie: TraktMovie) -> CatalogEntity {
    let released = movie.released.as_deref().and_then(|raw| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| {
                tracing::debug!(title = %movie.title, value = %raw, error = %e, "Unparseable release date");
            })
            .ok()
    });

    CatalogEntity {
        kind: MediaKind::Movie,
        title: movie.title,
        year: movie.year,
        catalog_id: movie.ids.trakt,
        slug: movie.ids.slug,
        genres: movie.genres,
        certification: movie.certification,
        runtime: movie.runtime,
        network: None,
        first_aired: None,
        released,
    }
}

fn entity_from_show(show: TraktShow) -> CatalogEntity {
    let first_aired = show.first_aired.as_deref().and_then(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                tracing::debug!(title = %show.title, value = %raw, error = %e, "Unparseable first air date");
            })
            .ok()
    });

    CatalogEntity {
        kind: MediaKind::Show,
        title: show.title,
        year: show.year,
        catalog_id: show.ids.trakt,
        slug: show.ids.slug,
        genres: show.genres,
        certification: show.certification,
        runtime: show.runtime,
        network: show.network,
        first_aired,
        released: None,
    }
}

fn season_from_dto(season: TraktSeason) -> SeasonSummary {
    SeasonSummary {
        season_number: season.number,
        episodes: season
            .episodes
            .into_iter()
            // Unannounced episodes come without a title and can not be matched
            .filter_map(|episode| {
                let title = episode.title.filter(|t| !t.is_empty())?;
                Some(CatalogEpisode {
                    title,
                    external_id: episode.ids.trakt.to_string(),
                    runtime: episode.runtime,
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const SHOW_SEARCH: &str = r#"[
        {
            "type": "show",
            "score": 1340.5,
            "show": {
                "title": "Breaking Bad",
                "year": 2008,
                "ids": { "trakt": 1388, "slug": "breaking-bad", "tvdb": 81189, "imdb": "tt0903747" },
                "first_aired": "2008-01-21T02:00:00.000Z",
                "runtime": 45,
                "certification": "TV-MA",
                "network": "AMC",
                "genres": ["drama", "crime"]
            }
        }
    ]"#;

    const MOVIE_SEARCH: &str = r#"[
        {
            "type": "movie",
            "score": 26.0,
            "movie": {
                "title": "The Legend of Tarzan",
                "year": 2016,
                "ids": { "trakt": 161380, "slug": "the-legend-of-tarzan-2016" },
                "released": "2016-07-01",
                "runtime": 110,
                "certification": "PG-13",
                "genres": ["action", "adventure"]
            }
        }
    ]"#;

    const SEASONS: &str = r#"[
        {
            "number": 0,
            "ids": { "trakt": 3949 },
            "episodes": [
                { "season": 0, "number": 1, "title": "Good Cop Bad Cop", "ids": { "trakt": 62137 } }
            ]
        },
        {
            "number": 1,
            "ids": { "trakt": 3950 },
            "episodes": [
                { "season": 1, "number": 1, "title": "Pilot", "ids": { "trakt": 73482 } },
                { "season": 1, "number": 2, "title": null, "ids": { "trakt": 73483 } }
            ]
        }
    ]"#;

    const EPISODE_LOOKUP: &str = r#"[
        {
            "type": "episode",
            "score": 1000,
            "episode": { "season": 1, "number": 1, "title": "Pilot", "ids": { "trakt": 73482 }, "runtime": 58 },
            "show": { "title": "Breaking Bad", "year": 2008, "ids": { "trakt": 1388, "slug": "breaking-bad" } }
        }
    ]"#;

    #[test]
    fn test_decode_show_search() {
        let hits: Vec<SearchHit> = serde_json::from_str(SHOW_SEARCH).unwrap();
        let entity = entity_from_hit(hits.into_iter().next().unwrap(), MediaKind::Show).unwrap();

        assert_eq!(entity.kind, MediaKind::Show);
        assert_eq!(entity.title, "Breaking Bad");
        assert_eq!(entity.catalog_id, 1388);
        assert_eq!(entity.slug.as_deref(), Some("breaking-bad"));
        assert_eq!(entity.runtime, Some(45));
        assert_eq!(entity.network.as_deref(), Some("AMC"));
        assert_eq!(entity.genres, vec!["drama", "crime"]);
        let aired = entity.first_aired.unwrap();
        assert_eq!((aired.year(), aired.month(), aired.day()), (2008, 1, 21));
        assert!(entity.released.is_none());
    }

    #[test]
    fn test_decode_movie_search() {
        let hits: Vec<SearchHit> = serde_json::from_str(MOVIE_SEARCH).unwrap();
        let entity = entity_from_hit(hits.into_iter().next().unwrap(), MediaKind::Movie).unwrap();

        assert_eq!(entity.kind, MediaKind::Movie);
        assert_eq!(entity.runtime, Some(110));
        assert_eq!(entity.certification.as_deref(), Some("PG-13"));
        assert_eq!(entity.released, NaiveDate::from_ymd_opt(2016, 7, 1));
        assert!(entity.network.is_none());
    }

    #[test]
    fn test_hit_of_wrong_kind_is_none() {
        let hits: Vec<SearchHit> = serde_json::from_str(MOVIE_SEARCH).unwrap();
        assert!(entity_from_hit(hits.into_iter().next().unwrap(), MediaKind::Show).is_none());
    }

    #[test]
    fn test_malformed_dates_are_dropped() {
        let show: TraktShow = serde_json::from_str(
            r#"{ "title": "X", "ids": { "trakt": 1 }, "first_aired": "yesterday" }"#,
        )
        .unwrap();
        let entity = entity_from_show(show);
        assert!(entity.first_aired.is_none());
        assert!(entity.genres.is_empty());
        assert!(entity.runtime.is_none());
    }

    #[test]
    fn test_decode_seasons_drops_untitled_episodes() {
        let seasons: Vec<TraktSeason> = serde_json::from_str(SEASONS).unwrap();
        let seasons: Vec<SeasonSummary> = seasons.into_iter().map(season_from_dto).collect();

        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[1].season_number, 1);
        assert_eq!(seasons[1].episodes.len(), 1);
        assert_eq!(seasons[1].episodes[0].title, "Pilot");
        assert_eq!(seasons[1].episodes[0].external_id, "73482");
        assert!(seasons[1].episodes[0].runtime.is_none());
    }

    #[test]
    fn test_decode_episode_lookup() {
        let hits: Vec<SearchHit> = serde_json::from_str(EPISODE_LOOKUP).unwrap();
        let runtime = hits.into_iter().find_map(|hit| hit.episode).and_then(|e| e.runtime);
        assert_eq!(runtime, Some(58));
    }

    #[test]
    fn test_client_rejects_header_unsafe_id() {
        let result = TraktClient::new("bad\nid", 3);
        assert!(matches!(result, Err(CatalogError::InvalidClientId(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = TraktClient::new(&"a".repeat(64), 0)
            .unwrap()
            .with_base_url("http://127.0.0.1:9/");
        assert_eq!(client.base_url, "http://127.0.0.1:9");
    }
}
