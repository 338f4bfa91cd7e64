use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{RecommendationRequest, RecommendationResponse},
    routes::AppState,
};

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        period = %request.periode,
        language = %request.langue,
        rated_genres = request.preferences.len(),
        "Processing recommendation request"
    );

    let response = state.recommender.recommend(request).await?;

    tracing::info!(
        request_id = %request_id,
        returned = response.recommendations.len(),
        "Recommendation completed"
    );

    Ok(Json(response))
}
