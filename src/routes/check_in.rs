use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    dto::check_in::{CheckInQuery, CheckInRequest, CheckInResponse, LatestRfidResponse},
    error::{AppError, AppResult, ErrorResponse},
    response::ApiResponse,
    services::{booking_service, rfid_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(check_in).get(latest_rfid))
}

#[utoipa::path(
    post,
    path = "/api/check-in",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Booking created", body = ApiResponse<CheckInResponse>),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 404, description = "Unknown or inactive card", body = ErrorResponse),
        (status = 409, description = "Card in use", body = ErrorResponse)
    ),
    tag = "Check-in"
)]
pub async fn check_in(
    State(state): State<AppState>,
    payload: Result<Json<CheckInRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<CheckInResponse>>> {
    let Json(payload) = payload?;
    let resp = booking_service::check_in(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/check-in",
    params(CheckInQuery),
    responses(
        (status = 200, description = "Latest tap on an active card", body = ApiResponse<LatestRfidResponse>),
        (status = 404, description = "No taps recorded", body = ErrorResponse)
    ),
    tag = "Check-in"
)]
pub async fn latest_rfid(
    State(state): State<AppState>,
    Query(query): Query<CheckInQuery>,
) -> AppResult<Json<ApiResponse<LatestRfidResponse>>> {
    match query.action.as_deref() {
        Some("get_latest_rfid") => Ok(Json(rfid_service::latest_tap(&state).await?)),
        other => Err(AppError::Validation(format!(
            "Invalid action: {}",
            other.unwrap_or_default()
        ))),
    }
}
