use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::TmdbConfig;
use crate::provider::{
    DiscoverQuery, MovieCredits, MovieProvider, Paged, RawMovie, RawPerson,
};

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build TMDB http client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// The query string carries the API key, so reqwest errors are stripped
    /// of their URL before they can reach a reply or a log line.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!(path = %path, params = ?params, "TMDB request");

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("failed to call TMDB {path}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("TMDB {path} returned {status}: {}", normalize_err_body(&body));
        }

        response
            .json::<T>()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("failed to decode TMDB {path} response"))
    }
}

#[async_trait]
impl MovieProvider for TmdbClient {
    async fn search_movies(&self, query: &str) -> Result<Vec<RawMovie>> {
        let page: Paged<RawMovie> = self
            .get_json("/search/movie", &[("query", query.to_string())])
            .await?;
        Ok(page.results)
    }

    async fn search_people(&self, query: &str) -> Result<Vec<RawPerson>> {
        let page: Paged<RawPerson> = self
            .get_json("/search/person", &[("query", query.to_string())])
            .await?;
        Ok(page.results)
    }

    async fn discover(&self, query: &DiscoverQuery) -> Result<Vec<RawMovie>> {
        let page: Paged<RawMovie> = self
            .get_json("/discover/movie", &query.to_params())
            .await?;
        Ok(page.results)
    }

    async fn movie_credits(&self, person_id: u64) -> Result<MovieCredits> {
        self.get_json(&format!("/person/{person_id}/movie_credits"), &[])
            .await
    }

    async fn recommendations(&self, movie_id: u64) -> Result<Vec<RawMovie>> {
        let page: Paged<RawMovie> = self
            .get_json(&format!("/movie/{movie_id}/recommendations"), &[])
            .await?;
        Ok(page.results)
    }

    async fn top_rated(&self, page: u32) -> Result<Vec<RawMovie>> {
        let page: Paged<RawMovie> = self
            .get_json(
                "/movie/top_rated",
                &[
                    ("language", "en-US".to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;
        Ok(page.results)
    }
}

/// TMDB error bodies carry `status_message`; fall back to the raw text.
fn normalize_err_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(message) = json.get("status_message").and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }

    trimmed.to_string()
}
