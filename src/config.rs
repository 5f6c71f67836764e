use std::env;

use anyhow::Result;

#[derive(Clone, Debug)]
pub struct TmdbConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub image_base_url: String,
    pub site_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub tmdb: TmdbConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment. A missing or blank
    /// `TMDB_API_KEY` is a startup error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("TMDB_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("TMDB_API_KEY is not set"))?;

        let port = lookup("PORT").unwrap_or_else(|| "5000".to_string());

        Ok(Self {
            bind_addr: lookup("MOVIECHAT_BIND").unwrap_or_else(|| format!("0.0.0.0:{port}")),
            tmdb: TmdbConfig {
                api_key,
                api_base_url: lookup("TMDB_API_BASE_URL")
                    .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string()),
                image_base_url: lookup("TMDB_IMAGE_BASE_URL")
                    .unwrap_or_else(|| "https://image.tmdb.org/t/p/w500".to_string()),
                site_base_url: lookup("TMDB_SITE_BASE_URL")
                    .unwrap_or_else(|| "https://www.themoviedb.org".to_string()),
                timeout_secs: lookup("TMDB_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
        })
    }
}
