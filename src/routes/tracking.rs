use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::tracking::{GuestDashboardQuery, TrackingData, TrackingQuery},
    error::{AppResult, ErrorResponse},
    middleware::auth::AuthUser,
    models::BookingView,
    response::ApiResponse,
    services::tracking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(track))
}

pub fn guest_router() -> Router<AppState> {
    Router::new().route("/", get(guest_dashboard))
}

#[utoipa::path(
    get,
    path = "/api/tracking",
    params(TrackingQuery),
    responses(
        (status = 200, description = "Booking by RFID, or the caller's active bookings", body = ApiResponse<TrackingData>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "No visible booking for the tag", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tracking"
)]
pub async fn track(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TrackingQuery>,
) -> AppResult<Json<ApiResponse<TrackingData>>> {
    let resp = tracking_service::track(&state, &user, query.rfid).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/guest-dashboard",
    params(GuestDashboardQuery),
    responses(
        (status = 200, description = "Booking for the tracking token", body = ApiResponse<BookingView>),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    ),
    security(()),
    tag = "Tracking"
)]
pub async fn guest_dashboard(
    State(state): State<AppState>,
    Query(query): Query<GuestDashboardQuery>,
) -> AppResult<Json<ApiResponse<BookingView>>> {
    let resp = tracking_service::guest_dashboard(&state, query.token).await?;
    Ok(Json(resp))
}
