use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    models::{CatalogStats, FilmSummary},
    routes::AppState,
};

/// Catalog statistics
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<CatalogStats> {
    Json(state.recommender.catalog().stats())
}

/// Film summaries in catalog order
pub async fn films(State(state): State<Arc<AppState>>) -> Json<Vec<FilmSummary>> {
    Json(
        state
            .recommender
            .catalog()
            .films()
            .iter()
            .map(FilmSummary::from)
            .collect(),
    )
}
