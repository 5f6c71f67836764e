//! Provider seam between the catalog and the movie metadata API.
//!
//! Raw payload types mirror the TMDB v3 JSON shapes, with every field
//! optional so that sparse or partial records deserialize instead of failing
//! the whole batch.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMovie {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<serde_json::Number>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl RawMovie {
    /// Score used for filtering and sorting; an absent score counts as zero.
    pub fn score(&self) -> f64 {
        self.vote_average
            .as_ref()
            .and_then(serde_json::Number::as_f64)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPerson {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CrewCredit {
    #[serde(flatten)]
    pub movie: RawMovie,
    #[serde(default)]
    pub job: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovieCredits {
    #[serde(default)]
    pub cast: Vec<RawMovie>,
    #[serde(default)]
    pub crew: Vec<CrewCredit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    RatingDesc,
    PopularityDesc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::RatingDesc => "vote_average.desc",
            SortOrder::PopularityDesc => "popularity.desc",
        }
    }
}

/// Filter set for the discovery endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub sort_by: SortOrder,
    pub min_vote_count: Option<u32>,
    pub min_rating: Option<f64>,
    pub genre_id: Option<u32>,
    pub original_language: Option<String>,
    pub page: Option<u32>,
}

impl DiscoverQuery {
    pub fn sorted_by(sort_by: SortOrder) -> Self {
        Self {
            sort_by,
            min_vote_count: None,
            min_rating: None,
            genre_id: None,
            original_language: None,
            page: None,
        }
    }

    pub fn min_vote_count(mut self, count: u32) -> Self {
        self.min_vote_count = Some(count);
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn genre(mut self, genre_id: Option<u32>) -> Self {
        self.genre_id = genre_id;
        self
    }

    pub fn original_language(mut self, code: impl Into<String>) -> Self {
        self.original_language = Some(code.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("sort_by", self.sort_by.as_str().to_string())];
        if let Some(count) = self.min_vote_count {
            params.push(("vote_count.gte", count.to_string()));
        }
        if let Some(rating) = self.min_rating {
            params.push(("vote_average.gte", crate::normalize::format_threshold(rating)));
        }
        if let Some(genre_id) = self.genre_id {
            params.push(("with_genres", genre_id.to_string()));
        }
        if let Some(code) = &self.original_language {
            params.push(("with_original_language", code.clone()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        params
    }
}

/// Read-only access to a movie metadata service.
#[async_trait]
pub trait MovieProvider: Send + Sync {
    async fn search_movies(&self, query: &str) -> Result<Vec<RawMovie>>;

    async fn search_people(&self, query: &str) -> Result<Vec<RawPerson>>;

    async fn discover(&self, query: &DiscoverQuery) -> Result<Vec<RawMovie>>;

    async fn movie_credits(&self, person_id: u64) -> Result<MovieCredits>;

    async fn recommendations(&self, movie_id: u64) -> Result<Vec<RawMovie>>;

    async fn top_rated(&self, page: u32) -> Result<Vec<RawMovie>>;
}
