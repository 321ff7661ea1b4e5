use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Prefix shared by every reaction key in Redis
    #[serde(default = "default_reaction_namespace")]
    pub reaction_namespace: String,

    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Optional TMDB response language (e.g. "en-US")
    #[serde(default)]
    pub tmdb_language: Option<String>,

    /// Maximum number of catalog lookups in flight per enrichment batch
    #[serde(default = "default_catalog_concurrency")]
    pub catalog_concurrency: usize,

    /// Timeout for a single catalog call, in milliseconds
    #[serde(default = "default_catalog_timeout_ms")]
    pub catalog_timeout_ms: u64,

    /// Retries for a transient catalog failure
    #[serde(default = "default_catalog_max_retries")]
    pub catalog_max_retries: u32,

    /// TTL of cached movie details, in seconds
    #[serde(default = "default_catalog_cache_ttl_secs")]
    pub catalog_cache_ttl_secs: u64,

    /// Upper bound of the random discovery page
    #[serde(default = "default_discover_max_page")]
    pub discover_max_page: u32,

    /// Number of most-similar users feeding recommendations
    #[serde(default = "default_nearest_neighbors")]
    pub nearest_neighbors: usize,

    /// Maximum number of movies in a ranking response
    #[serde(default = "default_ranking_limit")]
    pub ranking_limit: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_reaction_namespace() -> String {
    "movie".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_catalog_concurrency() -> usize {
    8
}

fn default_catalog_timeout_ms() -> u64 {
    5_000
}

fn default_catalog_max_retries() -> u32 {
    2
}

fn default_catalog_cache_ttl_secs() -> u64 {
    86_400 // 1 day
}

fn default_discover_max_page() -> u32 {
    100
}

fn default_nearest_neighbors() -> usize {
    5
}

fn default_ranking_limit() -> usize {
    50
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_millis(self.catalog_timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let vars = vec![("TMDB_API_KEY".to_string(), "secret".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.tmdb_api_key, "secret");
        assert_eq!(config.redis_url, "redis://localhost:6379");
        assert_eq!(config.reaction_namespace, "movie");
        assert_eq!(config.tmdb_language, None);
        assert_eq!(config.catalog_concurrency, 8);
        assert_eq!(config.discover_max_page, 100);
        assert_eq!(config.nearest_neighbors, 5);
        assert_eq!(config.ranking_limit, 50);
        assert_eq!(config.catalog_timeout(), Duration::from_secs(5));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_api_key_fails() {
        let vars: Vec<(String, String)> = vec![];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars = vec![
            ("TMDB_API_KEY".to_string(), "secret".to_string()),
            ("REACTION_NAMESPACE".to_string(), "film".to_string()),
            ("CATALOG_CONCURRENCY".to_string(), "2".to_string()),
            ("TMDB_LANGUAGE".to_string(), "fr-FR".to_string()),
            ("PORT".to_string(), "8080".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.reaction_namespace, "film");
        assert_eq!(config.catalog_concurrency, 2);
        assert_eq!(config.tmdb_language.as_deref(), Some("fr-FR"));
        assert_eq!(config.port, 8080);
    }
}
