use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::Value;

use crate::{
    dto::auth::{AUTH_ACTIONS, AuthRequest, SessionResponse, SignupResponse, TokenIdentity},
    error::{AppError, AppResult, ErrorResponse},
    middleware::auth::bearer_token,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(auth))
}

/// Parses the `action` first so unknown actions get their own message.
pub fn parse_auth_request(body: Value) -> AppResult<AuthRequest> {
    let action = body
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if !AUTH_ACTIONS.contains(&action.as_str()) {
        return Err(AppError::Validation(format!("Invalid action: {action}")));
    }
    serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Invalid request for {action}: {e}")))
}

#[utoipa::path(
    post,
    path = "/api/auth",
    request_body(content = Object, description = "`{action, ...fields}` with action one of login, signup, verify_email, resend_verification, forgot_password, reset_password, verify_token"),
    responses(
        (status = 200, description = "login / verify_email", body = ApiResponse<SessionResponse>),
        (status = 200, description = "signup", body = ApiResponse<SignupResponse>),
        (status = 200, description = "verify_token", body = ApiResponse<TokenIdentity>),
        (status = 400, description = "Validation failure", body = ErrorResponse),
        (status = 401, description = "Bad credentials or token", body = ErrorResponse),
        (status = 409, description = "Duplicate email or phone", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    let response = match parse_auth_request(body)? {
        AuthRequest::Login(req) => Json(auth_service::login(&state, req).await?).into_response(),
        AuthRequest::Signup(req) => Json(auth_service::signup(&state, req).await?).into_response(),
        AuthRequest::VerifyEmail(req) => {
            Json(auth_service::verify_email(&state, req).await?).into_response()
        }
        AuthRequest::ResendVerification(req) => {
            Json(auth_service::resend_verification(&state, req).await?).into_response()
        }
        AuthRequest::ForgotPassword(req) => {
            Json(auth_service::forgot_password(&state, req).await?).into_response()
        }
        AuthRequest::ResetPassword(req) => {
            Json(auth_service::reset_password(&state, req).await?).into_response()
        }
        AuthRequest::VerifyToken => {
            Json(auth_service::verify_token(&state, bearer_token(&headers))?).into_response()
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_action_is_rejected_by_name() {
        let err = parse_auth_request(json!({ "action": "logout" })).unwrap_err();
        assert_eq!(err.to_string(), "Invalid action: logout");
    }

    #[test]
    fn signup_fields_are_camel_case() {
        let req = parse_auth_request(json!({
            "action": "signup",
            "firstName": "Ana",
            "emergencyContactNo": "0917",
            "password": "longenough"
        }))
        .unwrap();
        match req {
            AuthRequest::Signup(s) => {
                assert_eq!(s.first_name, "Ana");
                assert_eq!(s.emergency_contact_no, "0917");
                assert!(s.last_name.is_empty());
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn verify_token_needs_no_fields() {
        let req = parse_auth_request(json!({ "action": "verify_token" })).unwrap();
        assert!(matches!(req, AuthRequest::VerifyToken));
    }
}
