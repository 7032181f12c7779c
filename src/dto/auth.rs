use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::UserSummary;

/// Body of `POST /api/auth`, dispatched on the `action` field.
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuthRequest {
    Login(LoginRequest),
    Signup(SignupRequest),
    VerifyEmail(VerifyEmailRequest),
    ResendVerification(ResendVerificationRequest),
    ForgotPassword(ForgotPasswordRequest),
    ResetPassword(ResetPasswordRequest),
    VerifyToken,
}

pub const AUTH_ACTIONS: [&str; 7] = [
    "login",
    "signup",
    "verify_email",
    "resend_verification",
    "forgot_password",
    "reset_password",
    "verify_token",
];

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Default, Clone, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub emergency_contact_name: String,
    pub emergency_contact_no: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct VerifyEmailRequest {
    pub verification_token: String,
    pub verification_code: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct ResendVerificationRequest {
    pub verification_token: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: Uuid,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub verification_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}
