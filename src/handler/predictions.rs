use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::predictiondb::PredictionExt,
    dtos::{predictiondtos::*, userdtos::RequestQueryDto},
    error::HttpError,
    middleware::PremiumAccess,
    AppState,
};

// The premium gate sits in front of this router; anything that reaches these
// handlers already resolved to active access.
pub fn predictions_handler() -> Router {
    Router::new()
        .route("/", get(get_predictions))
        .route("/:prediction_id", get(get_prediction))
}

pub async fn get_predictions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(access): Extension<PremiumAccess>,
    Query(query_params): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    tracing::debug!("serving predictions via {}", access.source.to_str());

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);

    let predictions = app_state
        .db_client
        .get_predictions(page as u32, limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(PredictionListResponseDto {
        status: "success".to_string(),
        results: predictions.len() as i64,
        predictions: PredictionDto::from_predictions(&predictions),
    }))
}

pub async fn get_prediction(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(prediction_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let prediction = app_state
        .db_client
        .get_prediction(&prediction_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Prediction not found"))?;

    Ok(Json(PredictionResponseDto {
        status: "success".to_string(),
        data: PredictionDto::from_prediction(&prediction),
    }))
}
