use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;

use crate::models::{MovieRecord, PersonRole, DEFAULT_MIN_RATING};
use crate::normalize::{
    format_threshold, listing, movie_lines, title_case, MovieNormalizer, DEFAULT_LIMIT,
    FILM_BULLET, TROPHY_BULLET, WHOLE_PAGE,
};
use crate::provider::{DiscoverQuery, MovieProvider, RawMovie, RawPerson, SortOrder};
use crate::taxonomy::{self, GENRES};

const RATING_VOTE_FLOOR: u32 = 100;
const CROSS_GENRE_VOTE_FLOOR: u32 = 500;
const PER_GENRE_PICKS: usize = 2;
pub const DEFAULT_GENRE_COUNT: usize = 10;
pub const DEFAULT_CROSS_GENRE_MAX: usize = 20;

const GENRE_NOT_RECOGNIZED: &str =
    "Genre not recognized. Try something like 'action', 'romance', or 'comedy'.";

/// Result of one catalog query: reply text plus the records it lists.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub text: String,
    pub movies: Vec<MovieRecord>,
    pub has_more: bool,
}

impl QueryOutcome {
    fn listed(text: String, movies: Vec<MovieRecord>) -> Self {
        Self {
            text,
            movies,
            has_more: false,
        }
    }

    fn message(text: impl Into<String>) -> Self {
        Self::listed(text.into(), vec![])
    }

    fn failed(prefix: &str, err: anyhow::Error) -> Self {
        let text = format!("{prefix}: {err:#}");
        tracing::warn!("{}", text);
        Self::message(text)
    }
}

#[derive(Clone)]
pub struct Catalog {
    provider: Arc<dyn MovieProvider>,
    normalizer: MovieNormalizer,
}

impl Catalog {
    pub fn new(provider: Arc<dyn MovieProvider>, normalizer: MovieNormalizer) -> Self {
        Self {
            provider,
            normalizer,
        }
    }

    /// Highest-rated movies at or above `min_rating`, optionally within one
    /// genre. Keeps the whole provider page.
    pub async fn by_rating(
        &self,
        min_rating: f64,
        genre_id: Option<u32>,
        page: u32,
    ) -> QueryOutcome {
        let query = DiscoverQuery::sorted_by(SortOrder::RatingDesc)
            .min_vote_count(RATING_VOTE_FLOOR)
            .min_rating(min_rating)
            .genre(genre_id)
            .page(page);

        match self.provider.discover(&query).await {
            Ok(raw) => {
                let movies = self.normalizer.normalize(&raw, WHOLE_PAGE);
                QueryOutcome::listed(movie_lines(FILM_BULLET, &movies), movies)
            }
            Err(err) => QueryOutcome::failed("Error fetching movies by rating", err),
        }
    }

    pub async fn by_genre(
        &self,
        genre_name: &str,
        min_rating: f64,
        count: usize,
        page: u32,
    ) -> QueryOutcome {
        let name = genre_name.trim().to_lowercase();
        let Some(genre_id) = taxonomy::genre_id(&name) else {
            return QueryOutcome::message(GENRE_NOT_RECOGNIZED);
        };

        let mut movies = self.by_rating(min_rating, Some(genre_id), page).await.movies;
        movies.truncate(count);
        if movies.is_empty() {
            return QueryOutcome::message(format!(
                "Couldn't find high-rated movies in {name} genre."
            ));
        }

        let header = format!(
            "🎥 Top Rated {} Movies (Rating ≥{}):",
            title_case(&name),
            format_threshold(min_rating)
        );
        QueryOutcome {
            text: listing(&header, FILM_BULLET, &movies),
            has_more: movies.len() >= count,
            movies,
        }
    }

    pub async fn by_person(&self, person_name: &str, role: PersonRole) -> QueryOutcome {
        let person_id = match self.resolve_person(person_name).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                return QueryOutcome::message(format!("Couldn't find {role} named {person_name}."))
            }
            Err(err) => {
                tracing::warn!("failed to resolve {} {}: {:#}", role, person_name, err);
                return QueryOutcome::message(format!("Couldn't find {role} named {person_name}."));
            }
        };

        let credits = match self.provider.movie_credits(person_id).await {
            Ok(credits) => credits,
            Err(err) => return QueryOutcome::failed(&format!("Error fetching movies for {role}"), err),
        };

        let mut candidates: Vec<RawMovie> = match role {
            PersonRole::Actor => credits.cast,
            PersonRole::Director => credits
                .crew
                .into_iter()
                .filter(|credit| credit.job.as_deref() == Some("Director"))
                .map(|credit| credit.movie)
                .collect(),
        };
        candidates.retain(|movie| movie.score() >= DEFAULT_MIN_RATING);
        candidates.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));

        let movies = self.normalizer.normalize(&candidates, DEFAULT_LIMIT);
        if movies.is_empty() {
            return QueryOutcome::message(format!("No high-rated movies found for {person_name}."));
        }

        let header = format!(
            "🎥 Top Rated Movies by {} ({role}):",
            title_case(person_name)
        );
        QueryOutcome::listed(listing(&header, FILM_BULLET, &movies), movies)
    }

    /// Most popular search hit; the first of equally popular people wins.
    async fn resolve_person(&self, name: &str) -> Result<Option<u64>> {
        let people = self.provider.search_people(name).await?;
        Ok(most_popular(&people).map(|person| person.id))
    }

    pub async fn by_similar_to(&self, title: &str) -> QueryOutcome {
        match self.recommendations_for(title).await {
            Ok(Some(movies)) if movies.is_empty() => QueryOutcome::message("No similar movies found."),
            Ok(Some(movies)) => QueryOutcome::listed(movie_lines(FILM_BULLET, &movies), movies),
            Ok(None) => QueryOutcome::message("Movie not found. Try another title!"),
            Err(err) => QueryOutcome::failed("Error fetching recommendations", err),
        }
    }

    async fn recommendations_for(&self, title: &str) -> Result<Option<Vec<MovieRecord>>> {
        let hits = self.provider.search_movies(title).await?;
        let Some(movie_id) = hits.first().and_then(|hit| hit.id) else {
            return Ok(None);
        };

        let raw = self.provider.recommendations(movie_id).await?;
        Ok(Some(self.normalizer.normalize(&raw, WHOLE_PAGE)))
    }

    pub async fn by_same_genre_as(&self, title: &str) -> QueryOutcome {
        let hits = match self.provider.search_movies(title).await {
            Ok(hits) => hits,
            Err(err) => return QueryOutcome::failed("Error analyzing movie genre", err),
        };

        if let Some(&genre_id) = hits.first().and_then(|hit| hit.genre_ids.first()) {
            let mut movies = self
                .by_rating(DEFAULT_MIN_RATING, Some(genre_id), 1)
                .await
                .movies;
            movies.truncate(DEFAULT_LIMIT);
            if !movies.is_empty() {
                return QueryOutcome::listed(movie_lines(FILM_BULLET, &movies), movies);
            }
        }

        QueryOutcome::message("Couldn't identify the genre or find similar movies.")
    }

    pub async fn by_region(&self, region_label: &str) -> QueryOutcome {
        let label = region_label.trim().to_lowercase();
        let Some(codes) = taxonomy::region_codes(&label) else {
            return QueryOutcome::message(format!("Sorry, I don't have data for {label} movies."));
        };

        let mut raw = Vec::new();
        for code in codes.codes() {
            let query = DiscoverQuery::sorted_by(SortOrder::PopularityDesc).original_language(code);
            match self.provider.discover(&query).await {
                Ok(results) => raw.extend(results),
                Err(err) => return QueryOutcome::failed(&format!("Error fetching {label} movies"), err),
            }
        }

        let movies = self.normalizer.normalize(&raw, DEFAULT_LIMIT);
        if movies.is_empty() {
            return QueryOutcome::message(format!("Couldn't find popular {label} movies."));
        }

        let header = format!("🎥 Popular {} Movies:", title_case(&label));
        QueryOutcome::listed(listing(&header, FILM_BULLET, &movies), movies)
    }

    /// Popular Hindi-language releases.
    pub async fn popular_hindi(&self) -> QueryOutcome {
        let query = DiscoverQuery::sorted_by(SortOrder::PopularityDesc).original_language("hi");
        match self.provider.discover(&query).await {
            Ok(raw) => {
                let movies = self.normalizer.normalize(&raw, WHOLE_PAGE);
                if movies.is_empty() {
                    return QueryOutcome::message("Couldn't find popular Bollywood movies.");
                }
                let text = listing("🎥 Here are some popular Bollywood movies:", "", &movies);
                QueryOutcome::listed(text, movies)
            }
            Err(err) => QueryOutcome::failed("Error fetching Bollywood movies", err),
        }
    }

    pub async fn top_rated(&self) -> QueryOutcome {
        match self.provider.top_rated(1).await {
            Ok(raw) => {
                let movies = self.normalizer.normalize(&raw, WHOLE_PAGE);
                if movies.is_empty() {
                    return QueryOutcome::message("Couldn't fetch top-rated movies.");
                }
                QueryOutcome::listed(movie_lines(TROPHY_BULLET, &movies), movies)
            }
            Err(err) => QueryOutcome::failed("Error fetching top-rated movies", err),
        }
    }

    /// The two best-rated well-voted movies of every genre, deduplicated and
    /// capped at `max_movies`.
    pub async fn best_across_genres(&self, max_movies: usize) -> QueryOutcome {
        let mut raw = Vec::new();
        for (genre, genre_id) in GENRES {
            let query = DiscoverQuery::sorted_by(SortOrder::RatingDesc)
                .genre(Some(*genre_id))
                .min_vote_count(CROSS_GENRE_VOTE_FLOOR)
                .page(1);
            match self.provider.discover(&query).await {
                Ok(results) => raw.extend(results.into_iter().take(PER_GENRE_PICKS)),
                Err(err) => {
                    tracing::debug!("cross-genre fetch stopped at {}", genre);
                    return QueryOutcome::failed("Error fetching top movies across genres", err);
                }
            }
        }

        let movies = self.normalizer.normalize(&raw, max_movies);
        if movies.is_empty() {
            return QueryOutcome::message("Couldn't fetch top movies across genres.");
        }

        let text = listing("🎥 Top Rated Movies Across Genres:", FILM_BULLET, &movies);
        QueryOutcome::listed(text, movies)
    }
}

fn most_popular(people: &[RawPerson]) -> Option<&RawPerson> {
    let popularity = |person: &RawPerson| person.popularity.unwrap_or(0.0);
    people.iter().fold(None, |best, person| match best {
        Some(current) if popularity(person) <= popularity(current) => Some(current),
        _ => Some(person),
    })
}
