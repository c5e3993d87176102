use rand::Rng;
use uuid::Uuid;

use crate::{
    db::HistoryStore,
    error::AppResult,
    models::{MovieId, Recommendation, ViewHistoryEntry},
    services::providers::MovieCatalog,
};

/// Minimum number of viewed movies before recommendations are personalized
pub const HISTORY_GATE: usize = 5;

/// The seed is drawn from this many leading history entries
pub const SEED_WINDOW: usize = 5;

/// Picks the seed movie for a recommendation request.
///
/// Returns `None` below the history gate. Otherwise draws an index uniformly
/// from the first [`SEED_WINDOW`] entries, whatever the history's length.
pub fn pick_seed<R: Rng + ?Sized>(history: &[ViewHistoryEntry], rng: &mut R) -> Option<MovieId> {
    if history.len() < HISTORY_GATE {
        return None;
    }

    let index = rng.gen_range(0..SEED_WINDOW);
    history.get(index).map(|entry| entry.movie_id)
}

/// Builds the personalized half of the home feed for one user.
///
/// Fetches the full history, and when it clears the gate asks the catalog for
/// recommendations seeded by one of its first entries. No caching, no retry:
/// a store or provider failure is returned to the caller.
pub async fn recommend(
    history_store: &dyn HistoryStore,
    catalog: &dyn MovieCatalog,
    user_id: Uuid,
) -> AppResult<Recommendation> {
    let view_history = history_store.get_history(user_id).await?;

    let seed = pick_seed(&view_history, &mut rand::thread_rng());

    let recommended = match seed {
        Some(seed_movie_id) => {
            tracing::debug!(
                user_id = %user_id,
                history_len = view_history.len(),
                seed_movie_id,
                "Requesting recommendations"
            );
            catalog.recommendations(seed_movie_id).await?
        }
        None => {
            tracing::debug!(
                user_id = %user_id,
                history_len = view_history.len(),
                gate = HISTORY_GATE,
                "History below gate, skipping recommendations"
            );
            Vec::new()
        }
    };

    Ok(Recommendation {
        view_history,
        recommended,
    })
}
