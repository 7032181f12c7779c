use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    dto::rfid::{RfidIngestRequest, RfidIngestResponse, TapRequest, TapResponse},
    error::{AppResult, ErrorResponse},
    response::ApiResponse,
    services::{booking_service, rfid_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(ingest))
        .route("/tap", post(tap))
}

#[utoipa::path(
    post,
    path = "/api/rfid",
    request_body = RfidIngestRequest,
    responses(
        (status = 200, description = "Card upserted and tap logged", body = ApiResponse<RfidIngestResponse>),
        (status = 400, description = "Invalid payload", body = ErrorResponse)
    ),
    tag = "RFID"
)]
pub async fn ingest(
    State(state): State<AppState>,
    payload: Result<Json<RfidIngestRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<RfidIngestResponse>>> {
    let Json(payload) = payload?;
    let resp = rfid_service::ingest(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/rfid/tap",
    request_body = TapRequest,
    responses(
        (status = 200, description = "Tap processed", body = ApiResponse<TapResponse>),
        (status = 404, description = "Unknown tag", body = ErrorResponse)
    ),
    tag = "RFID"
)]
pub async fn tap(
    State(state): State<AppState>,
    payload: Result<Json<TapRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<TapResponse>>> {
    let Json(payload) = payload?;
    let resp = booking_service::process_tap(&state, payload).await?;
    Ok(Json(resp))
}
