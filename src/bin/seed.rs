use anyhow::Context;
use grooming_salon_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    models::{CardStatus, UserRole},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let staff_email =
        std::env::var("SEED_STAFF_EMAIL").unwrap_or_else(|_| "staff@8paws.local".to_string());
    let staff_password =
        std::env::var("SEED_STAFF_PASSWORD").context("SEED_STAFF_PASSWORD must be set")?;

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&database_url).await?;

    seed_services(&pool).await?;
    let staff_id = ensure_staff(&pool, &staff_email, &staff_password).await?;
    seed_cards(&pool).await?;

    println!("Seed completed. Staff ID: {staff_id}");
    Ok(())
}

async fn seed_services(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // Prices in centavos.
    let services = vec![
        ("Basic Bath", "Shampoo, rinse and blow dry", 35_000_i64),
        ("Full Grooming", "Bath, haircut and styling", 80_000),
        ("Nail Trim", "Nail clipping and filing", 15_000),
        ("Ear Cleaning", "Gentle ear cleaning", 10_000),
        ("Teeth Brushing", "Dental hygiene brushing", 12_000),
        ("De-shedding", "Undercoat removal treatment", 45_000),
    ];

    for (name, desc, price) in services {
        sqlx::query(
            r#"
            INSERT INTO services (id, name, description, price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .execute(pool)
        .await?;
    }

    println!("Seeded services");
    Ok(())
}

async fn ensure_staff(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (
            id, first_name, last_name, email, phone, address,
            emergency_contact_name, emergency_contact_no, password_hash,
            role, email_verified, email_verified_at
        )
        VALUES ($1, 'Salon', 'Staff', $2, $3, 'Salon front desk', 'Salon Manager', $3, $4, $5, TRUE, NOW())
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, password_hash = EXCLUDED.password_hash
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind("00000000000")
    .bind(password_hash)
    .bind(UserRole::Staff.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured staff user {email}");
    Ok(user_id)
}

async fn seed_cards(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let cards = [("DEMO0001", "PAW-001"), ("DEMO0002", "PAW-002"), ("DEMO0003", "PAW-003")];

    for (card_uid, custom_uid) in cards {
        sqlx::query(
            r#"
            INSERT INTO rfid_cards (id, card_uid, custom_uid, status, device_source)
            VALUES ($1, $2, $3, $4, 'seed')
            ON CONFLICT (card_uid) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(card_uid)
        .bind(custom_uid)
        .bind(CardStatus::Active.as_str())
        .execute(pool)
        .await?;
    }

    println!("Seeded demo RFID cards");
    Ok(())
}
