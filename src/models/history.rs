use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GenreMovies, MovieId, MovieSummary};

/// A movie the user has opened, joined with its stored metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewHistoryEntry {
    pub movie_id: MovieId,
    pub title: String,
    pub poster_path: String,
    pub viewed_at: DateTime<Utc>,
}

/// Movie metadata kept locally so history can be rendered without the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovieRef {
    pub id: MovieId,
    pub title: String,
    pub poster_path: String,
}

/// Output of the recommendation aggregator
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub view_history: Vec<ViewHistoryEntry>,
    pub recommended: Vec<MovieSummary>,
}

/// Everything the home page renders, built fresh per request
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeedPayload {
    pub popular: Vec<MovieSummary>,
    pub top_rated: Vec<MovieSummary>,
    pub latest_release: Vec<MovieSummary>,
    pub genre_movies: Vec<GenreMovies>,
    pub recommended: Vec<MovieSummary>,
    pub view_history: Vec<ViewHistoryEntry>,
}
