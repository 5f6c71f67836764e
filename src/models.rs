use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_MIN_RATING: f64 = 7.0;

/// Provider score as it arrived on the wire, or "N/A" when the provider
/// sent none.
#[derive(Debug, Clone, PartialEq)]
pub enum Rating {
    Score(serde_json::Number),
    Unrated,
}

impl Rating {
    pub fn value(&self) -> Option<f64> {
        match self {
            Rating::Score(number) => number.as_f64(),
            Rating::Unrated => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Score(number) => write!(f, "{number}"),
            Rating::Unrated => f.write_str("N/A"),
        }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rating::Score(number) => number.serialize(serializer),
            Rating::Unrated => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecord {
    pub title: String,
    pub year: String,
    pub rating: Rating,
    pub poster: Option<String>,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    Actor,
    Director,
}

impl PersonRole {
    pub fn as_str(self) -> &'static str {
        match self {
            PersonRole::Actor => "actor",
            PersonRole::Director => "director",
        }
    }
}

impl fmt::Display for PersonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Rating,
}

/// Continuation state handed to the client and echoed back on "more".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    #[serde(rename = "type")]
    pub kind: ContextKind,
    #[serde(default = "default_min_rating", alias = "minRating")]
    pub min_rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default = "first_page", deserialize_with = "page_at_least_one")]
    pub page: u32,
}

impl QueryContext {
    pub fn rating(min_rating: f64, genre: Option<String>, page: u32) -> Self {
        Self {
            kind: ContextKind::Rating,
            min_rating,
            genre,
            page,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, alias = "is_more", deserialize_with = "null_as_default")]
    pub is_more: bool,
    #[serde(default = "first_page", deserialize_with = "page_at_least_one")]
    pub page: u32,
    /// Kept raw so an unknown or malformed context degrades to a soft reply.
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_more: false,
            page: 1,
            context: None,
        }
    }

    pub fn more(message: impl Into<String>, context: Option<serde_json::Value>) -> Self {
        Self {
            is_more: true,
            context,
            ..Self::new(message)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub movies: Vec<MovieRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<QueryContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl ChatReply {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            movies: vec![],
            page: None,
            context: None,
            has_more: None,
        }
    }
}

fn default_min_rating() -> f64 {
    DEFAULT_MIN_RATING
}

fn first_page() -> u32 {
    1
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Pages are 1-based; `null` and `0` both mean the first page.
fn page_at_least_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?
        .unwrap_or(1)
        .max(1))
}
