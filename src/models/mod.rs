use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Opaque user identifier issued by the identity provider
pub type UserId = String;

/// Opaque movie identifier issued by the movie catalog
pub type MovieId = String;

/// Which reaction a user currently holds on a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Like,
    Dislike,
}

impl Polarity {
    pub fn opposite(self) -> Self {
        match self {
            Polarity::Like => Polarity::Dislike,
            Polarity::Dislike => Polarity::Like,
        }
    }
}

impl Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Like => write!(f, "liked"),
            Polarity::Dislike => write!(f, "disliked"),
        }
    }
}

/// Body of every reaction mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieReactionRequest {
    pub user_id: UserId,
    pub movie_id: MovieId,
}

/// Current like/dislike counters of one movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieTally {
    pub movie_id: MovieId,
    pub likes: u64,
    pub dislikes: u64,
}

impl MovieTally {
    /// Likes minus dislikes
    pub fn net_score(&self) -> i64 {
        self.likes as i64 - self.dislikes as i64
    }
}

/// A neighbour returned by the similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarUser {
    pub user_id: UserId,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Movie record as delivered by the external catalog
///
/// Only the commonly used fields are typed; everything else the catalog sends
/// is kept in `extra` and relayed untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMovie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<Genre>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genre_ids: Vec<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Query sent to the catalog's discovery endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverQuery {
    pub genre: Option<String>,
    pub page: u32,
}

/// One page of discovery results
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<EnrichedMovie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}
