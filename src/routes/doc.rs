use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            ForgotPasswordRequest, LoginRequest, ResendVerificationRequest, ResetPasswordRequest,
            SessionResponse, SignupRequest, SignupResponse, TokenIdentity, VerifyEmailRequest,
        },
        bookings::StaffActionResponse,
        check_in::{CheckInRequest, CheckInResponse, LatestRfidResponse, ServiceSelection},
        rfid::{RfidIngestRequest, RfidIngestResponse, TapOutcome, TapRequest, TapResponse},
        tracking::{ActiveBookings, TrackingData},
    },
    error::ErrorResponse,
    models::{BookedService, BookingView, StatusDisplay, StatusHistoryEntry, TapEvent, UserSummary},
    response::ApiResponse,
    routes::{auth, bookings, check_in, health, rfid, tracking},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::auth,
        check_in::check_in,
        check_in::latest_rfid,
        rfid::ingest,
        rfid::tap,
        tracking::track,
        tracking::guest_dashboard,
        bookings::cancel_booking,
        bookings::advance_booking
    ),
    components(
        schemas(
            LoginRequest,
            SignupRequest,
            VerifyEmailRequest,
            ResendVerificationRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            SessionResponse,
            SignupResponse,
            TokenIdentity,
            UserSummary,
            CheckInRequest,
            ServiceSelection,
            CheckInResponse,
            LatestRfidResponse,
            RfidIngestRequest,
            RfidIngestResponse,
            TapRequest,
            TapResponse,
            TapOutcome,
            TapEvent,
            BookingView,
            StatusDisplay,
            StatusHistoryEntry,
            BookedService,
            ActiveBookings,
            TrackingData,
            StaffActionResponse,
            ErrorResponse,
            ApiResponse<SessionResponse>,
            ApiResponse<CheckInResponse>,
            ApiResponse<TapResponse>,
            ApiResponse<BookingView>,
            ApiResponse<TrackingData>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Action-dispatched authentication"),
        (name = "Check-in", description = "Kiosk check-in and RFID polling"),
        (name = "RFID", description = "Reader ingestion and tap-driven status changes"),
        (name = "Tracking", description = "Customer tracking and guest dashboard"),
        (name = "Bookings", description = "Staff booking actions"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth",
            "/api/check-in",
            "/api/rfid",
            "/api/rfid/tap",
            "/api/tracking",
            "/api/guest-dashboard",
            "/api/bookings/{id}/cancel",
            "/api/bookings/{id}/advance",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn check_in_schema_carries_defaulted_fields() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.schemas.contains_key("CheckInRequest"));
        assert!(components.schemas.contains_key("ServiceSelection"));

        let json = serde_json::to_value(&components.schemas["CheckInRequest"]).expect("schema json");
        assert!(json["properties"]["services"].is_object());
        assert!(json["properties"]["customRFID"].is_object());
    }
}
