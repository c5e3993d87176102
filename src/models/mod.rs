use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod history;
pub mod user;

pub use history::{HomeFeedPayload, MovieRef, Recommendation, ViewHistoryEntry};
pub use user::{NewUser, PublicUser, UserRecord};

/// Catalog identifier of a movie
pub type MovieId = i64;

/// Compact movie card as returned by listings, search and recommendations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

/// Full movie record returned by the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub id: MovieId,
    pub title: String,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime: Option<i64>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl MovieDetails {
    /// Metadata persisted alongside a user's visit
    pub fn as_movie_ref(&self) -> MovieRef {
        MovieRef {
            id: self.id,
            title: self.title.clone(),
            poster_path: self.poster_path.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// One genre row on the home page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreMovies {
    pub genre: Genre,
    pub movies: Vec<MovieSummary>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Paged list envelope used by every TMDB listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<T>,
}

/// Movie entry inside a TMDB listing
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: MovieId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

/// TMDB sends `""` for unknown release dates
fn parse_release_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

impl From<TmdbMovie> for MovieSummary {
    fn from(movie: TmdbMovie) -> Self {
        MovieSummary {
            id: movie.id,
            title: movie.title.or(movie.original_title).unwrap_or_default(),
            overview: movie.overview.filter(|o| !o.is_empty()),
            poster_path: movie.poster_path,
            backdrop_path: movie.backdrop_path,
            release_date: parse_release_date(movie.release_date),
            vote_average: movie.vote_average,
            genre_ids: movie.genre_ids,
        }
    }
}

/// Response of `GET /movie/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: MovieId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl From<TmdbMovieDetails> for MovieDetails {
    fn from(details: TmdbMovieDetails) -> Self {
        MovieDetails {
            id: details.id,
            title: details
                .title
                .or(details.original_title)
                .unwrap_or_default(),
            overview: details.overview.filter(|o| !o.is_empty()),
            tagline: details.tagline.filter(|t| !t.is_empty()),
            poster_path: details.poster_path,
            backdrop_path: details.backdrop_path,
            release_date: parse_release_date(details.release_date),
            runtime: details.runtime,
            vote_average: details.vote_average,
            genres: details.genres,
        }
    }
}

/// Response of `GET /genre/movie/list`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    pub genres: Vec<Genre>,
}
