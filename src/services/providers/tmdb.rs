//! TMDB (The Movie Database) v3 provider
//!
//! Endpoints used:
//! - Listings: `/movie/popular`, `/movie/top_rated`, `/movie/now_playing`
//! - Genres: `/genre/movie/list`, then `/discover/movie?with_genres={id}` per genre
//! - Single title: `/movie/{id}`, `/movie/{id}/similar`, `/movie/{id}/recommendations`
//! - Search: `/search/movie?query=...`

use crate::{
    error::{AppError, AppResult},
    models::{
        GenreMovies, MovieDetails, MovieId, MovieSummary, TmdbGenreList, TmdbMovie,
        TmdbMovieDetails, TmdbPage,
    },
    services::providers::MovieCatalog,
};
use futures::future::try_join_all;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;

const PROVIDER_NAME: &str = "tmdb";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    /// Creates a provider whose every request is bounded by `timeout`
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Issues a GET and decodes the JSON body, turning non-2xx into `ExternalApi`
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = self.endpoint(path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                provider = PROVIDER_NAME,
                "Catalog request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                response = %response_text,
                "Failed to deserialize TMDB response"
            );
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }

    async fn listing(&self, path: &str, params: &[(&str, &str)]) -> AppResult<Vec<MovieSummary>> {
        let page: TmdbPage<TmdbMovie> = self.get_json(path, params).await?;

        tracing::debug!(
            path = %path,
            page = page.page,
            results = page.results.len(),
            provider = PROVIDER_NAME,
            "Listing fetched"
        );

        Ok(page.results.into_iter().map(MovieSummary::from).collect())
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbProvider {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Query is not available in request body".to_string(),
            ));
        }

        let movies = self
            .listing("search/movie", &[("query", query), ("include_adult", "false")])
            .await?;

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = PROVIDER_NAME,
            "Movie search completed"
        );

        Ok(movies)
    }

    async fn most_popular(&self) -> AppResult<Vec<MovieSummary>> {
        self.listing("movie/popular", &[]).await
    }

    async fn top_rated(&self) -> AppResult<Vec<MovieSummary>> {
        self.listing("movie/top_rated", &[]).await
    }

    async fn latest_release(&self) -> AppResult<Vec<MovieSummary>> {
        self.listing("movie/now_playing", &[]).await
    }

    async fn all_genre_movies(&self) -> AppResult<Vec<GenreMovies>> {
        let genre_list: TmdbGenreList = self.get_json("genre/movie/list", &[]).await?;

        // One discover call per genre; a single failure fails the whole set
        let rows = try_join_all(genre_list.genres.into_iter().map(|genre| async move {
            let genre_id = genre.id.to_string();
            let movies = self
                .listing(
                    "discover/movie",
                    &[
                        ("with_genres", genre_id.as_str()),
                        ("sort_by", "popularity.desc"),
                    ],
                )
                .await?;
            Ok::<_, AppError>(GenreMovies { genre, movies })
        }))
        .await?;

        tracing::info!(
            genres = rows.len(),
            provider = PROVIDER_NAME,
            "Genre listings fetched"
        );

        Ok(rows)
    }

    async fn movie_by_id(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        let details: TmdbMovieDetails = self
            .get_json(&format!("movie/{}", movie_id), &[])
            .await?;

        Ok(MovieDetails::from(details))
    }

    async fn similar_movies(&self, movie_id: MovieId) -> AppResult<Vec<MovieSummary>> {
        self.listing(&format!("movie/{}/similar", movie_id), &[])
            .await
    }

    async fn recommendations(&self, seed_movie_id: MovieId) -> AppResult<Vec<MovieSummary>> {
        let movies = self
            .listing(&format!("movie/{}/recommendations", seed_movie_id), &[])
            .await?;

        tracing::info!(
            seed_movie_id,
            results = movies.len(),
            provider = PROVIDER_NAME,
            "Recommendations fetched"
        );

        Ok(movies)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
