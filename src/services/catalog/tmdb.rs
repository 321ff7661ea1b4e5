/// TMDB (The Movie Database) v3 catalog provider
///
/// Endpoints used:
/// 1. Details: /movie/{movie_id} → full movie record
/// 2. Discovery: /discover/movie?page=N[&with_genres=G] → one page of partial records
///
/// Authentication is the v3 `api_key` query parameter.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{DiscoverPage, DiscoverQuery, EnrichedMovie},
    services::catalog::MovieCatalog,
};
use reqwest::{Client as HttpClient, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_CACHE_TTL: u64 = 86_400; // 1 day
const RETRY_BACKOFF_MS: u64 = 250;

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: Option<String>,
    cache: Option<Cache>,
    cache_ttl: u64,
    max_retries: u32,
}

impl TmdbCatalog {
    /// Creates a provider whose HTTP calls each time out after `timeout`
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            language: None,
            cache: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            max_retries: 0,
        })
    }

    /// Ask TMDB for localized records (e.g. "en-US")
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|l| !l.trim().is_empty());
        self
    }

    /// Read movie details through the Redis cache
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Retry transient failures up to `max_retries` extra times
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builds an endpoint URL, percent-encoding each path segment
    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| AppError::Internal(format!("Invalid TMDB API URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| AppError::Internal("TMDB API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Query parameters sent with every request
    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("api_key", self.api_key.clone())];
        if let Some(language) = &self.language {
            params.push(("language", language.clone()));
        }
        params
    }

    fn discover_params(&self, query: &DiscoverQuery) -> Vec<(&'static str, String)> {
        let mut params = self.base_params();
        params.push(("page", query.page.to_string()));
        if let Some(genre) = &query.genre {
            params.push(("with_genres", genre.clone()));
        }
        params
    }

    /// Single GET, mapping non-success statuses to `CatalogStatus`
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&'static str, String)],
    ) -> AppResult<T> {
        let response = self.http_client.get(url).query(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CatalogStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// GET with bounded retries on transient failures
    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&'static str, String)],
    ) -> AppResult<T> {
        let mut attempt = 0;
        loop {
            match self.get_json(url.clone(), params).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        url = %url.path(),
                        attempt,
                        error = %e,
                        "Transient TMDB failure, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64))
                        .await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbCatalog {
    async fn movie_details(&self, movie_id: &str) -> AppResult<EnrichedMovie> {
        let movie_id = movie_id.trim();
        if movie_id.is_empty() {
            return Err(AppError::InvalidInput("Movie id cannot be empty".to_string()));
        }

        cached!(
            self.cache.as_ref(),
            CacheKey::MovieDetails {
                movie_id: movie_id.to_string(),
                language: self.language.clone(),
            },
            self.cache_ttl,
            async move {
                let url = self.endpoint(&["movie", movie_id])?;
                let movie: EnrichedMovie = self.get_with_retry(url, &self.base_params()).await?;

                tracing::debug!(movie_id = %movie_id, title = %movie.title, "Movie details fetched");

                Ok::<_, AppError>(movie)
            }
        )
    }

    async fn discover(&self, query: &DiscoverQuery) -> AppResult<Vec<EnrichedMovie>> {
        let url = self.endpoint(&["discover", "movie"])?;
        let page: DiscoverPage = self
            .get_with_retry(url, &self.discover_params(query))
            .await?;

        tracing::info!(
            page = page.page,
            genre = ?query.genre,
            results = page.results.len(),
            total_pages = page.total_pages,
            provider = "tmdb",
            "Discovery page fetched"
        );

        Ok(page.results)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
