#![allow(dead_code)]

use std::sync::Arc;

use grooming_salon_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::check_in::{CheckInRequest, ServiceSelection},
    entity::users::ActiveModel as UserActive,
    notifications::LogMailer,
    services::{auth_service::hash_password, rfid_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// `None` when no database is configured; callers skip.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            None
        }
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    MIGRATED
        .get_or_try_init(|| async {
            let orm = create_orm_conn(database_url).await?;
            run_migrations(&orm).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    let url = database_url.to_string();
    let config = AppConfig::from_lookup(move |key| match key {
        "DATABASE_URL" => Some(url.clone()),
        "JWT_SECRET" => Some("integration-test-secret".to_string()),
        "MAIL_TRANSPORT" => Some("log".to_string()),
        _ => None,
    })?;

    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    Ok(AppState::new(pool, orm, config, Arc::new(LogMailer)))
}

/// Short random suffix so tests sharing a database never collide.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

pub fn unique_phone() -> String {
    let digits: String = Uuid::new_v4()
        .as_u128()
        .to_string()
        .chars()
        .take(9)
        .collect();
    format!("09{digits}")
}

/// Registers an active card with the given label and no taps.
pub async fn create_card(state: &AppState, custom_uid: &str) -> anyhow::Result<Uuid> {
    let card = rfid_service::upsert_card(
        &state.orm,
        &unique("UID"),
        custom_uid,
        0,
        None,
        Some("integration-test".into()),
    )
    .await?;
    Ok(card.id)
}

pub fn check_in_request(rfid: &str, owner_phone: &str, owner_email: &str) -> CheckInRequest {
    CheckInRequest {
        pet_name: unique("Mochi"),
        pet_type: "Dog".into(),
        pet_breed: "Shih Tzu".into(),
        pet_age: Some("young".into()),
        pet_size: Some("small".into()),
        special_notes: Some("Sensitive ears".into()),
        owner_name: "Ana Cruz".into(),
        owner_phone: owner_phone.into(),
        owner_email: owner_email.into(),
        services: vec![
            ServiceSelection {
                name: unique("Basic Bath"),
                price: Some(35_000),
            },
            ServiceSelection {
                name: unique("Paw Balm"),
                price: Some(5_000),
            },
        ],
        total_amount: None,
        custom_rfid: rfid.into(),
    }
}

pub async fn create_user(
    state: &AppState,
    role: &str,
    email: &str,
    phone: &str,
) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set("Test".into()),
        last_name: Set("User".into()),
        email: Set(email.to_string()),
        phone: Set(phone.to_string()),
        address: Set("Test Street".into()),
        emergency_contact_name: Set("Contact".into()),
        emergency_contact_no: Set("0917".into()),
        password_hash: Set(hash_password("password123").map_err(|e| anyhow::anyhow!("{e}"))?),
        role: Set(role.into()),
        email_verified: Set(true),
        email_verified_at: Set(None),
        verification_code: Set(None),
        verification_token: Set(None),
        verification_code_expires: Set(None),
        password_reset_token: Set(None),
        password_reset_expires: Set(None),
        is_active: Set(true),
        last_login: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
