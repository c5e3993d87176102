//! Movie catalog abstraction
//!
//! Every read the service makes against the third-party catalog goes through
//! [`MovieCatalog`], so handlers and aggregators can be exercised without the
//! network and the provider can be swapped.

use crate::{
    error::AppResult,
    models::{GenreMovies, MovieDetails, MovieId, MovieSummary},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for movie catalog providers
///
/// All operations are independent, read-only and order-insensitive. Failures
/// are returned as-is; providers do not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Free-text title search
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>>;

    async fn most_popular(&self) -> AppResult<Vec<MovieSummary>>;

    async fn top_rated(&self) -> AppResult<Vec<MovieSummary>>;

    /// Titles currently in theatres
    async fn latest_release(&self) -> AppResult<Vec<MovieSummary>>;

    /// One listing per catalog genre
    async fn all_genre_movies(&self) -> AppResult<Vec<GenreMovies>>;

    async fn movie_by_id(&self, movie_id: MovieId) -> AppResult<MovieDetails>;

    async fn similar_movies(&self, movie_id: MovieId) -> AppResult<Vec<MovieSummary>>;

    /// Titles the provider recommends for viewers of `seed_movie_id`
    async fn recommendations(&self, seed_movie_id: MovieId) -> AppResult<Vec<MovieSummary>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
