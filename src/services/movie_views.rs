use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::HistoryStore,
    error::AppResult,
    models::{MovieDetails, MovieId, MovieSummary, ViewHistoryEntry},
    services::providers::MovieCatalog,
};

/// Detail page payload: the movie plus titles similar to it
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieView {
    #[serde(flatten)]
    pub details: MovieDetails,
    pub similar_movies: Vec<MovieSummary>,
}

/// Fetches a movie's detail page and, for a signed-in viewer, records the visit.
///
/// Metadata is stored first since the visit row references it. Both writes are
/// insert-if-absent, so repeated views never duplicate history.
pub async fn view_movie(
    catalog: &dyn MovieCatalog,
    history_store: &dyn HistoryStore,
    movie_id: MovieId,
    viewer: Option<Uuid>,
) -> AppResult<MovieView> {
    let (details, similar_movies) = tokio::try_join!(
        catalog.movie_by_id(movie_id),
        catalog.similar_movies(movie_id),
    )?;

    if let Some(user_id) = viewer {
        history_store.upsert_movie(&details.as_movie_ref()).await?;
        history_store
            .record_visit(user_id, details.id, Utc::now())
            .await?;

        tracing::info!(user_id = %user_id, movie_id = details.id, "Movie view recorded");
    }

    Ok(MovieView {
        details,
        similar_movies,
    })
}

/// Refreshes the timestamp of an existing visit (last write wins)
pub async fn touch_history(
    history_store: &dyn HistoryStore,
    user_id: Uuid,
    movie_id: MovieId,
) -> AppResult<()> {
    history_store
        .touch_visit(user_id, movie_id, Utc::now())
        .await
}

/// The user's history, newest first
pub async fn view_history(
    history_store: &dyn HistoryStore,
    user_id: Uuid,
) -> AppResult<Vec<ViewHistoryEntry>> {
    history_store.get_history(user_id).await
}
