use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod bookings;
pub mod check_in;
pub mod doc;
pub mod health;
pub mod rfid;
pub mod tracking;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/check-in", check_in::router())
        .nest("/rfid", rfid::router())
        .nest("/tracking", tracking::router())
        .nest("/guest-dashboard", tracking::guest_router())
        .nest("/bookings", bookings::router())
}
