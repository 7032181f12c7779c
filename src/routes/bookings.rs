use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::bookings::StaffActionResponse,
    error::{AppResult, ErrorResponse},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/cancel", post(cancel_booking))
        .route("/{id}/advance", post(advance_booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = ApiResponse<StaffActionResponse>),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 409, description = "Booking already terminal", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<StaffActionResponse>>> {
    let resp = booking_service::cancel_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/advance",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking advanced one stage", body = ApiResponse<StaffActionResponse>),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 409, description = "No next stage", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn advance_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<StaffActionResponse>>> {
    let resp = booking_service::advance_booking(&state, &user, id).await?;
    Ok(Json(resp))
}
