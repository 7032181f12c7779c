use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
    SqlErr, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    audit,
    dto::auth::{
        ForgotPasswordRequest, LoginRequest, ResendVerificationRequest, ResetPasswordRequest,
        SessionResponse, SignupRequest, SignupResponse, TokenIdentity, VerifyEmailRequest,
    },
    entity::{
        customers::Column as CustomerCol,
        users::{ActiveModel as UserActive, Column as UserCol, Model as UserModel},
        Customers, Users,
    },
    error::{AppError, AppResult},
    models::{UserRole, UserSummary},
    response::ApiResponse,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;
const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with this email exists, you will receive reset instructions.";

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<SessionResponse>> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }

    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => {
            tracing::debug!("login for unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "login with wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    if !user.email_verified {
        return Err(AppError::Unauthorized(
            "Please verify your email before signing in".into(),
        ));
    }

    if !user.is_active {
        return Err(AppError::Unauthorized(
            "Your account has been deactivated. Please contact support".into(),
        ));
    }

    let token = state.tokens.issue(user.id, &user.email)?;

    Users::update_many()
        .col_expr(UserCol::LastLogin, Expr::value(now_fixed()))
        .filter(UserCol::Id.eq(user.id))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("Logged in", session_for(&user, token)))
}

pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<ApiResponse<SignupResponse>> {
    let profile = validate_signup(payload)?;

    let email_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(profile.email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if email_taken.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".into(),
        ));
    }

    let phone_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE phone = $1")
        .bind(profile.phone.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if phone_taken.is_some() {
        return Err(AppError::Conflict(
            "An account with this phone number already exists".into(),
        ));
    }

    let password_hash = hash_password(&profile.password)?;
    let verification_code = generate_verification_code();
    let verification_token = generate_opaque_token();
    let expires = Utc::now() + Duration::minutes(state.config.verification_code_ttl_minutes);

    let txn = state.orm.begin().await?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set(profile.first_name.clone()),
        last_name: Set(profile.last_name.clone()),
        email: Set(profile.email.clone()),
        phone: Set(profile.phone.clone()),
        address: Set(profile.address.clone()),
        emergency_contact_name: Set(profile.emergency_contact_name.clone()),
        emergency_contact_no: Set(profile.emergency_contact_no.clone()),
        password_hash: Set(password_hash),
        role: Set(UserRole::Customer.as_str().to_string()),
        email_verified: Set(false),
        email_verified_at: Set(None),
        verification_code: Set(Some(verification_code.clone())),
        verification_token: Set(Some(verification_token.clone())),
        verification_code_expires: Set(Some(expires.into())),
        password_reset_token: Set(None),
        password_reset_expires: Set(None),
        is_active: Set(true),
        last_login: Set(None),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|e| conflict_on_unique(e, "An account with this email or phone number already exists"))?;

    txn.commit().await?;

    state.notifier.spawn_verification_email(
        user.email.clone(),
        user.first_name.clone(),
        verification_code,
    );

    audit::record(
        &state.pool,
        Some(user.id),
        "user_signup",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Account created successfully. Please check your email for verification code.",
        SignupResponse { verification_token },
    ))
}

pub async fn verify_email(
    state: &AppState,
    payload: VerifyEmailRequest,
) -> AppResult<ApiResponse<SessionResponse>> {
    if payload.verification_token.trim().is_empty() {
        return Err(AppError::Validation("Verification token is required".into()));
    }
    if payload.verification_code.trim().is_empty() {
        return Err(AppError::Validation("Verification code is required".into()));
    }

    let txn = state.orm.begin().await?;

    let user = Users::find()
        .filter(UserCol::VerificationToken.eq(payload.verification_token.trim()))
        .filter(UserCol::EmailVerified.eq(false))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::Validation(
                "Invalid verification token or email already verified".into(),
            ));
        }
    };

    check_code(&user, payload.verification_code.trim(), Utc::now())?;

    let mut active: UserActive = user.into();
    active.email_verified = Set(true);
    active.email_verified_at = Set(Some(now_fixed()));
    active.verification_code = Set(None);
    active.verification_token = Set(None);
    active.verification_code_expires = Set(None);
    let user = active.update(&txn).await?;

    // Walk-in records become visible to the account. Only the verified email links;
    // the phone number on the account is unverified.
    let linked = Customers::update_many()
        .col_expr(CustomerCol::UserId, Expr::value(user.id))
        .filter(CustomerCol::UserId.is_null())
        .filter(CustomerCol::Email.eq(user.email.clone()))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(user_id = %user.id, linked_customers = linked.rows_affected, "email verified");

    let token = state.tokens.issue(user.id, &user.email)?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_verify_email",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Email verified successfully!",
        session_for(&user, token),
    ))
}

pub async fn resend_verification(
    state: &AppState,
    payload: ResendVerificationRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.verification_token.trim().is_empty() {
        return Err(AppError::Validation("Verification token is required".into()));
    }

    let user = Users::find()
        .filter(UserCol::VerificationToken.eq(payload.verification_token.trim()))
        .filter(UserCol::EmailVerified.eq(false))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::Validation(
                "Invalid verification token or email already verified".into(),
            ));
        }
    };

    let code = generate_verification_code();
    let expires = Utc::now() + Duration::minutes(state.config.verification_code_ttl_minutes);

    let address = user.email.clone();
    let name = user.first_name.clone();
    let mut active: UserActive = user.into();
    active.verification_code = Set(Some(code.clone()));
    active.verification_code_expires = Set(Some(expires.into()));
    active.update(&state.orm).await?;

    state.notifier.spawn_verification_email(address, name, code);

    Ok(ApiResponse::message_only(
        "New verification code sent to your email",
    ))
}

/// Always succeeds so callers cannot probe which emails have accounts.
pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }

    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .filter(UserCol::EmailVerified.eq(true))
        .one(&state.orm)
        .await?;

    if let Some(user) = user {
        let reset_token = generate_opaque_token();
        let expires = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

        let address = user.email.clone();
        let name = user.first_name.clone();
        let mut active: UserActive = user.into();
        active.password_reset_token = Set(Some(reset_token.clone()));
        active.password_reset_expires = Set(Some(expires.into()));
        active.update(&state.orm).await?;

        state
            .notifier
            .spawn_password_reset_email(address, name, reset_token);
    } else {
        tracing::debug!("password reset requested for unknown or unverified email");
    }

    Ok(ApiResponse::message_only(FORGOT_PASSWORD_MESSAGE))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.token.trim().is_empty() {
        return Err(AppError::Validation("Reset token is required".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("New password is required".into()));
    }
    validate_password(&payload.password)?;

    let password_hash = hash_password(&payload.password)?;

    let txn = state.orm.begin().await?;

    let user = Users::find()
        .filter(UserCol::PasswordResetToken.eq(payload.token.trim()))
        .filter(UserCol::PasswordResetExpires.gt(now_fixed()))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Validation("Invalid or expired reset token".into())),
    };

    let user_id = user.id;
    let mut active: UserActive = user.into();
    active.password_hash = Set(password_hash);
    active.password_reset_token = Set(None);
    active.password_reset_expires = Set(None);
    active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user_id),
        "user_password_reset",
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    Ok(ApiResponse::message_only("Password reset successfully"))
}

pub fn verify_token(state: &AppState, bearer: Option<&str>) -> AppResult<ApiResponse<TokenIdentity>> {
    let token = bearer
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;
    let (user_id, email) = state.tokens.verify(token)?;
    Ok(ApiResponse::success(
        "Token is valid",
        TokenIdentity { user_id, email },
    ))
}

/// Trimmed, validated signup profile.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub emergency_contact_name: String,
    pub emergency_contact_no: String,
    pub password: String,
}

pub fn validate_signup(payload: SignupRequest) -> AppResult<ValidSignup> {
    let fields: [(&str, &str); 8] = [
        ("First name", &payload.first_name),
        ("Last name", &payload.last_name),
        ("Email", &payload.email),
        ("Phone", &payload.phone),
        ("Address", &payload.address),
        ("Emergency Contact Name", &payload.emergency_contact_name),
        ("Emergency Contact Number", &payload.emergency_contact_no),
        ("Password", &payload.password),
    ];
    for (label, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{label} is required")));
        }
    }

    let email = payload.email.trim().to_string();
    if !email.validate_email() {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    validate_password(&payload.password)?;

    Ok(ValidSignup {
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email,
        phone: payload.phone.trim().to_string(),
        address: payload.address.trim().to_string(),
        emergency_contact_name: payload.emergency_contact_name.trim().to_string(),
        emergency_contact_no: payload.emergency_contact_no.trim().to_string(),
        password: payload.password,
    })
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".into(),
        ));
    }
    Ok(())
}

/// Expiry is checked before the code itself.
pub fn check_code(user: &UserModel, code: &str, now: DateTime<Utc>) -> AppResult<()> {
    if let Some(expires) = user.verification_code_expires {
        if expires.with_timezone(&Utc) < now {
            return Err(AppError::Validation(
                "Verification code has expired. Please request a new one.".into(),
            ));
        }
    }
    if user.verification_code.as_deref() != Some(code) {
        return Err(AppError::Validation("Invalid verification code".into()));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Six decimal digits, uniformly distributed.
pub fn generate_verification_code() -> String {
    const RANGE: u32 = 1_000_000;
    let zone = u32::MAX - (u32::MAX % RANGE);
    loop {
        let value = OsRng.next_u32();
        if value < zone {
            return format!("{:06}", value % RANGE);
        }
    }
}

/// 32 random bytes, hex encoded.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.to_string()),
        _ => AppError::OrmError(err),
    }
}

fn session_for(user: &UserModel, token: String) -> SessionResponse {
    SessionResponse {
        token,
        user_id: user.id,
        user: UserSummary {
            name: format!("{} {}", user.first_name, user.last_name),
            email: user.email.clone(),
            role: UserRole::parse(&user.role),
        },
    }
}

fn now_fixed() -> sea_orm::prelude::DateTimeWithTimeZone {
    Utc::now().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_request() -> SignupRequest {
        SignupRequest {
            first_name: "Ana".into(),
            last_name: "Cruz".into(),
            email: "ana@example.com".into(),
            phone: "09171234567".into(),
            address: "123 Pet Street, Quezon City".into(),
            emergency_contact_name: "Ben Cruz".into(),
            emergency_contact_no: "09179876543".into(),
            password: "correct horse".into(),
        }
    }

    fn unverified_user(code: &str, expires: Option<DateTime<Utc>>) -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            first_name: "Ana".into(),
            last_name: "Cruz".into(),
            email: "ana@example.com".into(),
            phone: "09171234567".into(),
            address: "somewhere".into(),
            emergency_contact_name: "Ben".into(),
            emergency_contact_no: "0917".into(),
            password_hash: "x".into(),
            role: "customer".into(),
            email_verified: false,
            email_verified_at: None,
            verification_code: Some(code.into()),
            verification_token: Some("tok".into()),
            verification_code_expires: expires.map(Into::into),
            password_reset_token: None,
            password_reset_expires: None,
            is_active: true,
            last_login: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn short_password_is_rejected_with_message() {
        let mut req = signup_request();
        req.password = "short12".into();
        let err = validate_signup(req).unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters long");
    }

    #[test]
    fn missing_field_is_named() {
        let mut req = signup_request();
        req.emergency_contact_no = "   ".into();
        let err = validate_signup(req).unwrap_err();
        assert_eq!(err.to_string(), "Emergency Contact Number is required");
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut req = signup_request();
        req.email = "not-an-email".into();
        let err = validate_signup(req).unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
    }

    #[test]
    fn valid_signup_is_trimmed() {
        let mut req = signup_request();
        req.email = "  ana@example.com ".into();
        let profile = validate_signup(req).unwrap();
        assert_eq!(profile.email, "ana@example.com");
    }

    #[test]
    fn expired_code_is_reported_before_mismatch() {
        let user = unverified_user("123456", Some(Utc::now() - Duration::minutes(1)));
        let err = check_code(&user, "000000", Utc::now()).unwrap_err();
        assert!(err.to_string().starts_with("Verification code has expired"));
    }

    #[test]
    fn wrong_code_is_rejected() {
        let user = unverified_user("123456", Some(Utc::now() + Duration::minutes(10)));
        let err = check_code(&user, "654321", Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid verification code");
        assert!(check_code(&user, "123456", Utc::now()).is_ok());
    }

    #[test]
    fn verification_codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn opaque_tokens_are_unique_hex() {
        let a = generate_opaque_token();
        let b = generate_opaque_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("mysecret1").unwrap();
        assert!(verify_password("mysecret1", &hash).unwrap());
        assert!(!verify_password("wrongpassword", &hash).unwrap());
    }
}
