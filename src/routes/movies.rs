use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::{AuthUser, MaybeAuthUser},
    models::MovieId,
    routes::AppState,
    services::{home_feed, movie_views, recommendations},
};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchHistoryRequest {
    movie_id: Option<MovieId>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<Value>> {
    let query = request
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            AppError::InvalidInput("Query is not available in request body".to_string())
        })?;

    let search_results = state.catalog.search_movies(query).await?;
    Ok(Json(json!({ "searchResults": search_results })))
}

pub async fn home(
    State(state): State<Arc<AppState>>,
    viewer: MaybeAuthUser,
) -> AppResult<Json<Value>> {
    let feed = home_feed::assemble_home_feed(
        state.catalog.as_ref(),
        state.history.as_ref(),
        viewer.user_id(),
    )
    .await?;

    Ok(Json(json!({
        "message": "Successfully fetched home page data",
        "moviesCollection": feed,
    })))
}

pub async fn movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<MovieId>,
    viewer: MaybeAuthUser,
) -> AppResult<Json<Value>> {
    let view = movie_views::view_movie(
        state.catalog.as_ref(),
        state.history.as_ref(),
        movie_id,
        viewer.user_id(),
    )
    .await?;

    Ok(Json(json!({
        "message": "Fetched movie information",
        "movieDetails": view,
    })))
}

pub async fn recommended(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    let result = recommendations::recommend(
        state.history.as_ref(),
        state.catalog.as_ref(),
        user.user_id(),
    )
    .await?;

    Ok(Json(json!({
        "message": "Got the recommendations",
        "recommended": result.recommended,
    })))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    let history = movie_views::view_history(state.history.as_ref(), user.user_id()).await?;

    Ok(Json(json!({
        "message": "Fetched movies history",
        "history": history,
    })))
}

pub async fn touch_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<TouchHistoryRequest>,
) -> AppResult<Json<Value>> {
    let movie_id = request.movie_id.ok_or_else(|| {
        AppError::InvalidInput("movieId is not available in request body".to_string())
    })?;

    movie_views::touch_history(state.history.as_ref(), user.user_id(), movie_id).await?;
    Ok(Json(json!({ "message": "Updated history" })))
}
