use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{MovieId, MovieRef, ViewHistoryEntry},
};

const MAX_TITLE_CHARS: usize = 150;

/// Per-user log of viewed movies
///
/// Rows are keyed by (user, movie): recording the same pair twice never
/// produces a second entry, and only `touch_visit` moves the timestamp.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// All history entries for the user, newest first
    async fn get_history(&self, user_id: Uuid) -> AppResult<Vec<ViewHistoryEntry>>;

    /// Stores movie metadata unless the movie is already known
    async fn upsert_movie(&self, movie: &MovieRef) -> AppResult<()>;

    /// Inserts a visit unless one already exists for the pair
    async fn record_visit(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Moves the timestamp of an existing visit; a missing visit is left alone
    async fn touch_visit(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        at: DateTime<Utc>,
    ) -> AppResult<()>;
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    movie_id: i64,
    movie_title: String,
    poster_url: String,
    time_stamp: DateTime<Utc>,
}

impl From<HistoryRow> for ViewHistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self {
            movie_id: row.movie_id,
            title: row.movie_title,
            poster_path: row.poster_url,
            viewed_at: row.time_stamp,
        }
    }
}

/// Postgres-backed history log
#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HistoryStore for PgHistoryStore {
    async fn get_history(&self, user_id: Uuid) -> AppResult<Vec<ViewHistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT movies.movie_id, movies.movie_title, movies.poster_url, visited_movies.time_stamp
            FROM movies
            INNER JOIN visited_movies ON movies.movie_id = visited_movies.movie_id
            WHERE visited_movies.user_id = $1
            ORDER BY visited_movies.time_stamp DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ViewHistoryEntry::from).collect())
    }

    async fn upsert_movie(&self, movie: &MovieRef) -> AppResult<()> {
        let title: String = movie.title.chars().take(MAX_TITLE_CHARS).collect();

        sqlx::query(
            r#"
            INSERT INTO movies (movie_id, movie_title, poster_url)
            VALUES ($1, $2, $3)
            ON CONFLICT (movie_id) DO NOTHING
            "#,
        )
        .bind(movie.id)
        .bind(title)
        .bind(&movie.poster_path)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_visit(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO visited_movies (visit_id, user_id, movie_id, time_stamp)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, movie_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(movie_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            user_id = %user_id,
            movie_id,
            inserted = result.rows_affected() > 0,
            "Visit recorded"
        );

        Ok(())
    }

    async fn touch_visit(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE visited_movies
            SET time_stamp = $1
            WHERE movie_id = $2 AND user_id = $3
            "#,
        )
        .bind(at)
        .bind(movie_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(user_id = %user_id, movie_id, "No visit to touch");
        }

        Ok(())
    }
}
