use std::collections::HashSet;

use crate::models::{MovieRecord, Rating};
use crate::provider::RawMovie;

pub const DEFAULT_LIMIT: usize = 10;

/// Keep every record of a provider page.
pub const WHOLE_PAGE: usize = usize::MAX;

const UNKNOWN_TITLE: &str = "Unknown Title";
const NOT_AVAILABLE: &str = "N/A";

pub const FILM_BULLET: &str = "🎬";
pub const TROPHY_BULLET: &str = "🏆";

/// Turns raw provider movies into display records.
#[derive(Debug, Clone)]
pub struct MovieNormalizer {
    image_base_url: String,
    site_base_url: String,
}

impl MovieNormalizer {
    pub fn new(image_base_url: impl Into<String>, site_base_url: impl Into<String>) -> Self {
        Self {
            image_base_url: image_base_url.into(),
            site_base_url: site_base_url.into(),
        }
    }

    /// Records in provider order, first occurrence of an id wins, entries
    /// without an id are skipped, truncated to `limit`.
    pub fn normalize(&self, raw: &[RawMovie], limit: usize) -> Vec<MovieRecord> {
        let mut seen = HashSet::new();
        raw.iter()
            .filter_map(|movie| movie.id.map(|id| (id, movie)))
            .filter(|(id, _)| seen.insert(*id))
            .take(limit)
            .map(|(id, movie)| self.record(id, movie))
            .collect()
    }

    fn record(&self, id: u64, movie: &RawMovie) -> MovieRecord {
        MovieRecord {
            title: movie
                .title
                .clone()
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            year: release_year(movie.release_date.as_deref()),
            rating: movie
                .vote_average
                .clone()
                .map(Rating::Score)
                .unwrap_or(Rating::Unrated),
            poster: movie
                .poster_path
                .as_deref()
                .filter(|path| !path.is_empty())
                .map(|path| format!("{}{}", self.image_base_url, path)),
            link: format!("{}/movie/{}", self.site_base_url.trim_end_matches('/'), id),
        }
    }
}

fn release_year(date: Option<&str>) -> String {
    date.and_then(|d| d.get(..4))
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

pub fn movie_line(bullet: &str, movie: &MovieRecord) -> String {
    if bullet.is_empty() {
        format!("{} ({}) ⭐ {}", movie.title, movie.year, movie.rating)
    } else {
        format!("{bullet} {} ({}) ⭐ {}", movie.title, movie.year, movie.rating)
    }
}

pub fn movie_lines(bullet: &str, movies: &[MovieRecord]) -> String {
    movies
        .iter()
        .map(|movie| movie_line(bullet, movie))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn listing(header: &str, bullet: &str, movies: &[MovieRecord]) -> String {
    format!("{header}\n\n{}", movie_lines(bullet, movies))
}

/// Renders a rating threshold the way a float literal reads: `8` as `8.0`.
pub fn format_threshold(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Capitalises the first letter of every alphabetic run: `sci-fi` → `Sci-Fi`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
