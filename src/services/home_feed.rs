use std::time::Instant;

use uuid::Uuid;

use crate::{
    db::HistoryStore,
    error::AppResult,
    models::{HomeFeedPayload, Recommendation},
    services::{providers::MovieCatalog, recommendations},
};

/// Assembles the home page payload.
///
/// The four catalog listings and, for a signed-in user, the personalized
/// recommendation are issued concurrently and joined before returning. Any
/// failure fails the whole feed; there is no partial payload.
pub async fn assemble_home_feed(
    catalog: &dyn MovieCatalog,
    history_store: &dyn HistoryStore,
    user_id: Option<Uuid>,
) -> AppResult<HomeFeedPayload> {
    let start = Instant::now();

    let personalized = async {
        match user_id {
            Some(user_id) => recommendations::recommend(history_store, catalog, user_id).await,
            None => Ok(Recommendation::default()),
        }
    };

    let (popular, top_rated, latest_release, genre_movies, personal) = tokio::try_join!(
        catalog.most_popular(),
        catalog.top_rated(),
        catalog.latest_release(),
        catalog.all_genre_movies(),
        personalized,
    )?;

    tracing::info!(
        provider = catalog.name(),
        authenticated = user_id.is_some(),
        recommended = personal.recommended.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Home feed assembled"
    );

    Ok(HomeFeedPayload {
        popular,
        top_rated,
        latest_release,
        genre_movies,
        recommended: personal.recommended,
        view_history: personal.view_history,
    })
}
