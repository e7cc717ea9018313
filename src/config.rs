use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the movie records (JSON array, corpus order)
    #[serde(default = "default_movies_path")]
    pub movies_path: String,

    /// Path to the feature matrix (JSON array of rows)
    #[serde(default = "default_vectors_path")]
    pub vectors_path: String,

    /// OMDb API key; posters fall back to the placeholder when absent
    #[serde(default)]
    pub omdb_api_key: Option<String>,

    /// OMDb API base URL
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Per-lookup timeout for poster requests, in seconds
    #[serde(default = "default_poster_timeout_secs")]
    pub poster_timeout_secs: u64,

    /// Maximum number of poster lookups in flight per request
    #[serde(default = "default_poster_concurrency")]
    pub poster_concurrency: usize,

    /// Redis connection URL; poster caching is disabled when absent
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Bound on a single Redis round trip, in milliseconds
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,

    /// Number of recommendations when the request does not ask for a count
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Upper bound on the requested recommendation count
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_movies_path() -> String {
    "model/movies.json".to_string()
}

fn default_vectors_path() -> String {
    "model/vectors.json".to_string()
}

fn default_omdb_api_url() -> String {
    "http://www.omdbapi.com".to_string()
}

fn default_poster_timeout_secs() -> u64 {
    5
}

fn default_poster_concurrency() -> usize {
    4
}

fn default_cache_timeout_ms() -> u64 {
    500
}

fn default_k() -> usize {
    10
}

fn default_max_k() -> usize {
    50
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            movies_path: default_movies_path(),
            vectors_path: default_vectors_path(),
            omdb_api_key: None,
            omdb_api_url: default_omdb_api_url(),
            poster_timeout_secs: default_poster_timeout_secs(),
            poster_concurrency: default_poster_concurrency(),
            redis_url: None,
            cache_timeout_ms: default_cache_timeout_ms(),
            default_k: default_k(),
            max_k: default_max_k(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.poster_concurrency == 0 {
            anyhow::bail!("POSTER_CONCURRENCY must be at least 1");
        }
        if self.cache_timeout_ms == 0 {
            anyhow::bail!("CACHE_TIMEOUT_MS must be at least 1");
        }
        if self.default_k == 0 || self.default_k > self.max_k {
            anyhow::bail!(
                "DEFAULT_K must be between 1 and MAX_K ({}), got {}",
                self.max_k,
                self.default_k
            );
        }
        Ok(())
    }

    pub fn poster_timeout(&self) -> Duration {
        Duration::from_secs(self.poster_timeout_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// The API key with blank values treated as unset
    pub fn omdb_api_key(&self) -> Option<&str> {
        self.omdb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_environment() {
        let vars: Vec<(String, String)> = Vec::new();
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.movies_path, "model/movies.json");
        assert_eq!(config.vectors_path, "model/vectors.json");
        assert_eq!(config.omdb_api_key, None);
        assert_eq!(config.poster_timeout(), Duration::from_secs(5));
        assert_eq!(config.cache_timeout(), Duration::from_millis(500));
        assert_eq!(config.default_k, 10);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_overrides_from_environment() {
        let vars = vec![
            ("OMDB_API_KEY".to_string(), "abc123".to_string()),
            ("POSTER_CONCURRENCY".to_string(), "8".to_string()),
            ("PORT".to_string(), "8080".to_string()),
            ("CACHE_TIMEOUT_MS".to_string(), "250".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.omdb_api_key(), Some("abc123"));
        assert_eq!(config.poster_concurrency, 8);
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = Config {
            omdb_api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.omdb_api_key(), None);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            poster_concurrency: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_default_k_above_max() {
        let config = Config {
            default_k: 60,
            max_k: 50,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_cache_timeout() {
        let config = Config {
            cache_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
