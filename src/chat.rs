use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;

use crate::catalog::{Catalog, QueryOutcome, DEFAULT_CROSS_GENRE_MAX, DEFAULT_GENRE_COUNT};
use crate::models::{
    ChatReply, ChatRequest, ContextKind, PersonRole, QueryContext, DEFAULT_MIN_RATING,
};
use crate::normalize::{format_threshold, listing, title_case, DEFAULT_LIMIT, FILM_BULLET};
use crate::taxonomy::{self, GENRES};

const EMPTY_MESSAGE_REPLY: &str = "Please enter a movie name or genre!";
const GREETING_REPLY: &str = "Hi there! 👋 Which movie recommendation are you looking for?";
const NO_MORE_REPLY: &str = "No more movies found.";
const CANNOT_LOAD_MORE_REPLY: &str = "Can't load more for this request type.";

const GREETINGS: &[&str] = &["hi", "hello", "hey"];
const GENRE_MENU_KEYWORDS: &[&str] = &["genre", "genera"];
const RATING_KEYWORDS: &[&str] = &["above", "rating", "rated", "at least"];
const PERSON_KEYWORDS: &[&str] = &["actor", "actress", "director", "starring", "by"];
const ACTOR_KEYWORDS: &[&str] = &["actor", "actress", "starring"];
const BEST_KEYWORDS: &[&str] = &["best movies", "good movies", "suggest me some good movies"];
const BOLLYWOOD_KEYWORDS: &[&str] = &["bollywood", "hindi movies", "top bollywood", "top hindi"];
const TOP_RATED_KEYWORDS: &[&str] = &["top 10 movies", "best top movies", "highest ranking movies"];

/// What a chat message asks for, decided before any provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Empty,
    Greeting,
    More,
    GenreMenu,
    Rating {
        min_rating: f64,
        genre: Option<&'static str>,
    },
    Person {
        name: String,
        role: PersonRole,
    },
    Genre(&'static str),
    BestAcrossGenres,
    Region(&'static str),
    Bollywood,
    TopRated,
    Fallback(String),
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Empty => "empty",
            Intent::Greeting => "greeting",
            Intent::More => "more",
            Intent::GenreMenu => "genre_menu",
            Intent::Rating { .. } => "rating",
            Intent::Person { .. } => "person",
            Intent::Genre(_) => "genre",
            Intent::BestAcrossGenres => "best_across_genres",
            Intent::Region(_) => "region",
            Intent::Bollywood => "bollywood",
            Intent::TopRated => "top_rated",
            Intent::Fallback(_) => "fallback",
        }
    }
}

struct Utterance {
    text: String,
    is_more: bool,
}

type Rule = fn(&Utterance) -> Option<Intent>;

/// Evaluated top to bottom; the first rule that yields an intent wins.
const RULES: &[(&str, Rule)] = &[
    ("empty", empty_rule),
    ("greeting", greeting_rule),
    ("more", more_rule),
    ("genre_menu", genre_menu_rule),
    ("rating", rating_rule),
    ("person", person_rule),
    ("genre", genre_rule),
    ("best_across_genres", best_rule),
    ("region", region_rule),
    ("bollywood", bollywood_rule),
    ("top_rated", top_rated_rule),
    ("fallback", fallback_rule),
];

pub fn classify(message: &str, is_more: bool) -> Intent {
    let utterance = Utterance {
        text: message.trim().to_lowercase(),
        is_more,
    };

    for (name, rule) in RULES {
        if let Some(intent) = rule(&utterance) {
            tracing::debug!(rule = %name, "matched chat rule");
            return intent;
        }
    }

    Intent::Fallback(utterance.text)
}

fn empty_rule(u: &Utterance) -> Option<Intent> {
    u.text.is_empty().then_some(Intent::Empty)
}

fn greeting_rule(u: &Utterance) -> Option<Intent> {
    GREETINGS.contains(&u.text.as_str()).then_some(Intent::Greeting)
}

fn more_rule(u: &Utterance) -> Option<Intent> {
    u.is_more.then_some(Intent::More)
}

fn genre_menu_rule(u: &Utterance) -> Option<Intent> {
    contains_any(&u.text, GENRE_MENU_KEYWORDS).then_some(Intent::GenreMenu)
}

fn rating_rule(u: &Utterance) -> Option<Intent> {
    if !contains_any(&u.text, RATING_KEYWORDS) {
        return None;
    }
    let min_rating = first_rating_token(&u.text)?;
    Some(Intent::Rating {
        min_rating,
        genre: taxonomy::genre_mentioned_in(&u.text),
    })
}

fn person_rule(u: &Utterance) -> Option<Intent> {
    if !contains_any(&u.text, PERSON_KEYWORDS) {
        return None;
    }
    let name = person_name_after_keyword(&u.text)?;
    let role = if contains_any(&u.text, ACTOR_KEYWORDS) {
        PersonRole::Actor
    } else {
        PersonRole::Director
    };
    Some(Intent::Person { name, role })
}

fn genre_rule(u: &Utterance) -> Option<Intent> {
    taxonomy::genre_mentioned_in(&u.text).map(Intent::Genre)
}

fn best_rule(u: &Utterance) -> Option<Intent> {
    contains_any(&u.text, BEST_KEYWORDS).then_some(Intent::BestAcrossGenres)
}

fn region_rule(u: &Utterance) -> Option<Intent> {
    taxonomy::region_mentioned_in(&u.text).map(Intent::Region)
}

fn bollywood_rule(u: &Utterance) -> Option<Intent> {
    contains_any(&u.text, BOLLYWOOD_KEYWORDS).then_some(Intent::Bollywood)
}

fn top_rated_rule(u: &Utterance) -> Option<Intent> {
    contains_any(&u.text, TOP_RATED_KEYWORDS).then_some(Intent::TopRated)
}

fn fallback_rule(u: &Utterance) -> Option<Intent> {
    Some(Intent::Fallback(u.text.clone()))
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

static RATING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9]+\.?[0-9]*|\.[0-9]+)$").expect("rating token pattern is valid")
});

/// First whitespace token made of digits with at most one `.`.
fn first_rating_token(text: &str) -> Option<f64> {
    text.split_whitespace()
        .filter(|token| RATING_TOKEN.is_match(token))
        .find_map(|token| match token.parse::<f64>() {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("could not read rating from {:?}: {}", token, err);
                None
            }
        })
}

fn person_name_after_keyword(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let index = tokens
        .iter()
        .position(|token| PERSON_KEYWORDS.contains(token))?;
    let rest = &tokens[index + 1..];
    if rest.is_empty() {
        return None;
    }
    Some(rest.join(" "))
}

fn genre_menu() -> String {
    let mut html = String::from("<strong>🎬 Tap a genre to explore:</strong><br><br>");
    for (genre, _) in GENRES {
        html.push_str(&format!(
            "<button onclick=\"selectGenre('{genre}')\" \
             style=\"margin:5px; padding:10px 15px; border-radius:8px; \
             border:1px solid #aaa; background:#E9ECEF; cursor:pointer;\">{}</button>",
            title_case(genre)
        ));
    }
    html
}

impl From<QueryOutcome> for ChatReply {
    fn from(outcome: QueryOutcome) -> Self {
        Self {
            response: outcome.text,
            movies: outcome.movies,
            page: None,
            context: None,
            has_more: None,
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    catalog: Catalog,
}

impl ChatService {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Answers one chat message. Never fails: every problem ends up as
    /// reply text with an empty movie list.
    pub async fn respond(&self, request: ChatRequest) -> ChatReply {
        let started = Instant::now();
        let intent = classify(&request.message, request.is_more);
        tracing::debug!(intent = ?intent, "classified chat message");

        let reply = self.dispatch(intent, &request).await;
        tracing::info!(
            movies = reply.movies.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "chat reply ready"
        );
        reply
    }

    async fn dispatch(&self, intent: Intent, request: &ChatRequest) -> ChatReply {
        match intent {
            Intent::Empty => ChatReply::text(EMPTY_MESSAGE_REPLY),
            Intent::Greeting => ChatReply::text(GREETING_REPLY),
            Intent::More => self.continue_query(request).await,
            Intent::GenreMenu => ChatReply::text(genre_menu()),
            Intent::Rating { min_rating, genre } => {
                self.rating_query(min_rating, genre, request.page).await
            }
            Intent::Person { name, role } => self.catalog.by_person(&name, role).await.into(),
            Intent::Genre(genre) => self
                .catalog
                .by_genre(genre, DEFAULT_MIN_RATING, DEFAULT_GENRE_COUNT, 1)
                .await
                .into(),
            Intent::BestAcrossGenres => self
                .catalog
                .best_across_genres(DEFAULT_CROSS_GENRE_MAX)
                .await
                .into(),
            Intent::Region(label) => self.catalog.by_region(label).await.into(),
            Intent::Bollywood => self.catalog.popular_hindi().await.into(),
            Intent::TopRated => self.catalog.top_rated().await.into(),
            Intent::Fallback(text) => {
                let same_genre = self.catalog.by_same_genre_as(&text).await;
                if !same_genre.movies.is_empty() {
                    return same_genre.into();
                }
                self.catalog.by_similar_to(&text).await.into()
            }
        }
    }

    async fn rating_query(&self, min_rating: f64, genre: Option<&str>, page: u32) -> ChatReply {
        let context = QueryContext::rating(min_rating, genre.map(str::to_string), page);

        if let Some(genre) = genre {
            let outcome = self
                .catalog
                .by_genre(genre, min_rating, DEFAULT_GENRE_COUNT, page)
                .await;
            return ChatReply {
                has_more: Some(outcome.has_more),
                context: Some(context),
                ..outcome.into()
            };
        }

        let mut movies = self.catalog.by_rating(min_rating, None, page).await.movies;
        movies.truncate(DEFAULT_LIMIT);
        let threshold = format_threshold(min_rating);
        if movies.is_empty() {
            return ChatReply::text(format!("No movies found with rating ≥{threshold}."));
        }

        let header = format!("🎥 Movies with Rating ≥{threshold}:");
        ChatReply {
            response: listing(&header, FILM_BULLET, &movies),
            movies,
            page: None,
            context: Some(context),
            has_more: None,
        }
    }

    /// Re-runs the stored query one page further on.
    async fn continue_query(&self, request: &ChatRequest) -> ChatReply {
        let context = request
            .context
            .clone()
            .map(serde_json::from_value::<QueryContext>)
            .transpose();
        let mut context = match context {
            Ok(Some(context)) => context,
            Ok(None) => return ChatReply::text(CANNOT_LOAD_MORE_REPLY),
            Err(err) => {
                tracing::debug!("unusable continuation context: {}", err);
                return ChatReply::text(CANNOT_LOAD_MORE_REPLY);
            }
        };

        match context.kind {
            ContextKind::Rating => {
                let next_page = context.page.max(request.page).saturating_add(1);
                context.page = next_page;
                let genre_id = context.genre.as_deref().and_then(taxonomy::genre_id);

                let outcome = self
                    .catalog
                    .by_rating(context.min_rating, genre_id, next_page)
                    .await;
                if outcome.movies.is_empty() {
                    return ChatReply::text(NO_MORE_REPLY);
                }

                ChatReply {
                    page: Some(next_page),
                    context: Some(context),
                    ..outcome.into()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fixtures::{movie, person, StubProvider};
    use crate::normalize::MovieNormalizer;
    use crate::provider::{MovieCredits, RawMovie};

    fn service(stub: StubProvider) -> (ChatService, Arc<StubProvider>) {
        let stub = Arc::new(stub);
        let catalog = Catalog::new(
            stub.clone(),
            MovieNormalizer::new("https://img.test/w500", "https://site.test"),
        );
        (ChatService::new(catalog), stub)
    }

    fn page_of(count: u64) -> Vec<RawMovie> {
        (1..=count).map(|id| movie(id, &format!("Movie {id}"), 8.2)).collect()
    }

    #[test]
    fn rating_with_genre_is_extracted() {
        assert_eq!(
            classify("action movies above 8", false),
            Intent::Rating {
                min_rating: 8.0,
                genre: Some("action"),
            }
        );
        assert_eq!(
            classify("Movies rated at least 7.5", false),
            Intent::Rating {
                min_rating: 7.5,
                genre: None,
            }
        );
    }

    #[test]
    fn rating_token_skips_malformed_numbers() {
        assert_eq!(first_rating_token("above 8.5.1 or 9"), Some(9.0));
        assert_eq!(first_rating_token("above 8."), Some(8.0));
        assert_eq!(first_rating_token("above -3"), None);
        assert_eq!(first_rating_token("rated highly"), None);
    }

    #[test]
    fn rating_keyword_without_number_falls_through() {
        assert_eq!(
            classify("above average comedy", false),
            Intent::Genre("comedy")
        );
    }

    #[test]
    fn person_name_follows_keyword() {
        assert_eq!(
            classify("director christopher nolan", false),
            Intent::Person {
                name: "christopher nolan".to_string(),
                role: PersonRole::Director,
            }
        );
        assert_eq!(
            classify("movies by tarantino", false),
            Intent::Person {
                name: "tarantino".to_string(),
                role: PersonRole::Director,
            }
        );
        assert_eq!(
            classify("movies starring tom hanks", false),
            Intent::Person {
                name: "tom hanks".to_string(),
                role: PersonRole::Actor,
            }
        );
    }

    #[test]
    fn person_keyword_as_substring_only_falls_through() {
        assert_eq!(
            classify("baby driver", false),
            Intent::Fallback("baby driver".to_string())
        );
        assert_eq!(
            classify("movies by", false),
            Intent::Fallback("movies by".to_string())
        );
    }

    #[test]
    fn rule_order_is_respected() {
        assert_eq!(classify("  ", true), Intent::Empty);
        assert_eq!(classify("Hello", true), Intent::Greeting);
        assert_eq!(classify("show more action", true), Intent::More);
        assert_eq!(classify("genre above 8", false), Intent::GenreMenu);
        assert_eq!(classify("which genera", false), Intent::GenreMenu);
        assert_eq!(classify("suggest me some good movies", false), Intent::BestAcrossGenres);
        assert_eq!(classify("south indian movies", false), Intent::Region("south"));
        assert_eq!(classify("top bollywood", false), Intent::Bollywood);
        assert_eq!(classify("hindi movies", false), Intent::Bollywood);
        assert_eq!(
            classify("movies by nolan rated above 8", false),
            Intent::Rating {
                min_rating: 8.0,
                genre: None
            }
        );
        assert_eq!(
            classify("action movies starring tom cruise", false),
            Intent::Person {
                name: "tom cruise".to_string(),
                role: PersonRole::Actor
            }
        );
        assert_eq!(classify("good comedy movies", false), Intent::Genre("comedy"));
        assert_eq!(classify("best movies from south", false), Intent::BestAcrossGenres);
        assert_eq!(classify("south hindi movies", false), Intent::Region("south"));
        assert_eq!(classify("top 10 movies", false), Intent::TopRated);
        assert_eq!(classify("best top movies", false), Intent::TopRated);
        assert_eq!(
            classify("Inception", false),
            Intent::Fallback("inception".to_string())
        );
    }

    #[test]
    fn intent_names_match_rule_names() {
        let samples = [
            classify("", false),
            classify("hi", false),
            classify("x", true),
            classify("genres", false),
            classify("rated above 8", false),
            classify("movies by nolan", false),
            classify("horror", false),
            classify("good movies", false),
            classify("tamil", false),
            classify("bollywood", false),
            classify("top 10 movies", false),
            classify("arrival", false),
        ];
        let names: Vec<&str> = samples.iter().map(Intent::name).collect();
        let rule_names: Vec<&str> = RULES.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, rule_names);
    }

    #[test]
    fn greeting_needs_exact_message() {
        assert_eq!(classify("hey", false), Intent::Greeting);
        assert_ne!(classify("hey action", false), Intent::Greeting);
    }

    #[test]
    fn genre_menu_lists_every_genre_in_order() {
        let menu = genre_menu();
        assert!(menu.starts_with("<strong>🎬 Tap a genre to explore:</strong><br><br>"));
        assert_eq!(menu.matches("<button").count(), GENRES.len());
        let action = menu.find("selectGenre('action')").unwrap();
        let western = menu.find("selectGenre('western')").unwrap();
        assert!(action < western);
        assert!(menu.contains(">Sci-Fi</button>"));
    }

    #[tokio::test]
    async fn hello_returns_greeting_without_provider_calls() {
        let (chat, stub) = service(StubProvider::default());
        let reply = chat.respond(ChatRequest::new("hello")).await;
        assert_eq!(reply.response, GREETING_REPLY);
        assert!(reply.movies.is_empty());
        assert!(stub.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn rating_context_resumes_on_next_page() {
        let (chat, stub) = service(StubProvider {
            default_discover: page_of(20),
            ..StubProvider::default()
        });

        let first = chat.respond(ChatRequest::new("action movies above 8")).await;
        let context = first.context.clone().unwrap();
        assert_eq!(context, QueryContext::rating(8.0, Some("action".to_string()), 1));
        assert_eq!(first.has_more, Some(true));
        assert_eq!(first.movies.len(), 10);
        assert!(first
            .response
            .starts_with("🎥 Top Rated Action Movies (Rating ≥8.0):"));

        let echoed = serde_json::to_value(&context).unwrap();
        let second = chat
            .respond(ChatRequest::more("more", Some(echoed)))
            .await;
        assert_eq!(second.page, Some(2));
        assert_eq!(second.context.as_ref().map(|c| c.page), Some(2));
        assert_eq!(second.movies.len(), 20);

        let issued = stub.recorded_discovers();
        assert_eq!(issued.len(), 2);
        assert_eq!(issued[1].page, Some(2));
        assert_eq!(issued[1].genre_id, Some(28));
        assert_eq!(issued[1].min_rating, Some(8.0));

        let third = chat
            .respond(ChatRequest::more(
                "more",
                second.context.map(|c| serde_json::to_value(c).unwrap()),
            ))
            .await;
        assert_eq!(third.page, Some(3));
    }

    #[tokio::test]
    async fn rating_without_genre_caps_and_carries_context() {
        let (chat, _) = service(StubProvider {
            default_discover: page_of(20),
            ..StubProvider::default()
        });

        let reply = chat.respond(ChatRequest::new("movies above 7.5 rating")).await;
        assert_eq!(reply.movies.len(), 10);
        assert!(reply
            .response
            .starts_with("🎥 Movies with Rating ≥7.5:\n\n🎬 Movie 1 (N/A) ⭐ 8.2"));
        assert_eq!(reply.context, Some(QueryContext::rating(7.5, None, 1)));
        assert_eq!(reply.has_more, None);
    }

    #[tokio::test]
    async fn rating_without_results_has_no_context() {
        let (chat, _) = service(StubProvider::default());
        let reply = chat.respond(ChatRequest::new("above 9")).await;
        assert_eq!(reply.response, "No movies found with rating ≥9.0.");
        assert!(reply.context.is_none());
    }

    #[tokio::test]
    async fn more_without_usable_context_is_soft() {
        let (chat, stub) = service(StubProvider::default());

        let missing = chat.respond(ChatRequest::more("more", None)).await;
        assert_eq!(missing.response, CANNOT_LOAD_MORE_REPLY);

        let other = chat
            .respond(ChatRequest::more(
                "more",
                Some(serde_json::json!({ "type": "region" })),
            ))
            .await;
        assert_eq!(other.response, CANNOT_LOAD_MORE_REPLY);
        assert!(stub.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn more_on_exhausted_query_says_so() {
        let (chat, _) = service(StubProvider::default());
        let reply = chat
            .respond(ChatRequest::more(
                "more",
                Some(serde_json::json!({ "type": "rating", "min_rating": 8.0 })),
            ))
            .await;
        assert_eq!(reply.response, NO_MORE_REPLY);
    }

    #[tokio::test]
    async fn unresolved_director_is_reported() {
        let (chat, _) = service(StubProvider::default());
        let reply = chat
            .respond(ChatRequest::new("director christopher nolan"))
            .await;
        assert_eq!(
            reply.response,
            "Couldn't find director named christopher nolan."
        );
    }

    #[tokio::test]
    async fn person_reply_lists_credits() {
        let mut stub = StubProvider::default();
        stub.people
            .insert("meryl streep".to_string(), vec![person(5064, "Meryl Streep", 30.0)]);
        stub.credits.insert(
            5064,
            MovieCredits {
                cast: vec![movie(1, "The Post", 7.1)],
                crew: vec![],
            },
        );
        let (chat, _) = service(stub);

        let reply = chat.respond(ChatRequest::new("actress meryl streep")).await;
        assert_eq!(
            reply.response,
            "🎥 Top Rated Movies by Meryl Streep (actor):\n\n🎬 The Post (N/A) ⭐ 7.1"
        );
    }

    #[tokio::test]
    async fn fallback_prefers_same_genre_then_recommendations() {
        let mut stub = StubProvider::default();
        stub.movie_search
            .insert("obscure film".to_string(), vec![movie(77, "Obscure Film", 6.0)]);
        stub.recommendations
            .insert(77, vec![movie(78, "Related Film", 6.5)]);
        let (chat, stub) = service(stub);

        // The search hit has no genre, so recommendations answer instead.
        let reply = chat.respond(ChatRequest::new("Obscure Film")).await;
        assert_eq!(reply.response, "🎬 Related Film (N/A) ⭐ 6.5");
        assert_eq!(
            stub.recorded_calls(),
            vec![
                "search_movies:obscure film".to_string(),
                "search_movies:obscure film".to_string(),
                "recommendations:77".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn provider_outage_still_replies() {
        let (chat, _) = service(StubProvider::failing());
        let reply = chat.respond(ChatRequest::new("top 10 movies")).await;
        assert!(reply.movies.is_empty());
        assert!(reply.response.starts_with("Error fetching top-rated movies"));
    }
}
