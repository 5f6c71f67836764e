//! Canned provider used by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::provider::{DiscoverQuery, MovieCredits, MovieProvider, RawMovie, RawPerson};

pub fn movie(id: u64, title: &str, score: f64) -> RawMovie {
    RawMovie {
        id: Some(id),
        title: Some(title.to_string()),
        vote_average: serde_json::Number::from_f64(score),
        ..RawMovie::default()
    }
}

pub fn person(id: u64, name: &str, popularity: f64) -> RawPerson {
    RawPerson {
        id,
        name: Some(name.to_string()),
        popularity: Some(popularity),
    }
}

/// Serves fixed payloads and records every call it receives. Discover
/// responses are matched on the full query; unmatched queries return
/// `default_discover`.
#[derive(Default)]
pub struct StubProvider {
    pub movie_search: HashMap<String, Vec<RawMovie>>,
    pub people: HashMap<String, Vec<RawPerson>>,
    pub credits: HashMap<u64, MovieCredits>,
    pub recommendations: HashMap<u64, Vec<RawMovie>>,
    pub discover: Vec<(DiscoverQuery, Vec<RawMovie>)>,
    pub default_discover: Vec<RawMovie>,
    pub top_rated: Vec<RawMovie>,
    pub fail: bool,
    pub calls: Mutex<Vec<String>>,
    pub discover_calls: Mutex<Vec<DiscoverQuery>>,
}

impl StubProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn recorded_discovers(&self) -> Vec<DiscoverQuery> {
        self.discover_calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: String) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.fail {
            anyhow::bail!("provider unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl MovieProvider for StubProvider {
    async fn search_movies(&self, query: &str) -> Result<Vec<RawMovie>> {
        self.record(format!("search_movies:{query}"))?;
        Ok(self.movie_search.get(query).cloned().unwrap_or_default())
    }

    async fn search_people(&self, query: &str) -> Result<Vec<RawPerson>> {
        self.record(format!("search_people:{query}"))?;
        Ok(self.people.get(query).cloned().unwrap_or_default())
    }

    async fn discover(&self, query: &DiscoverQuery) -> Result<Vec<RawMovie>> {
        if let Ok(mut calls) = self.discover_calls.lock() {
            calls.push(query.clone());
        }
        self.record("discover".to_string())?;
        Ok(self
            .discover
            .iter()
            .find(|(known, _)| known == query)
            .map(|(_, movies)| movies.clone())
            .unwrap_or_else(|| self.default_discover.clone()))
    }

    async fn movie_credits(&self, person_id: u64) -> Result<MovieCredits> {
        self.record(format!("movie_credits:{person_id}"))?;
        Ok(self.credits.get(&person_id).cloned().unwrap_or_default())
    }

    async fn recommendations(&self, movie_id: u64) -> Result<Vec<RawMovie>> {
        self.record(format!("recommendations:{movie_id}"))?;
        Ok(self
            .recommendations
            .get(&movie_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn top_rated(&self, page: u32) -> Result<Vec<RawMovie>> {
        self.record(format!("top_rated:{page}"))?;
        Ok(self.top_rated.clone())
    }
}
