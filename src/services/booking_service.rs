use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        bookings::StaffActionResponse,
        check_in::{CheckInRequest, CheckInResponse},
        rfid::{TapOutcome, TapRequest, TapResponse},
    },
    entity::{
        booking_services::ActiveModel as BookingServiceActive,
        bookings::{ActiveModel as BookingActive, Column as BookingCol, Model as BookingModel},
        customers::{ActiveModel as CustomerActive, Column as CustomerCol, Model as CustomerModel},
        pets::ActiveModel as PetActive,
        rfid_cards::{Column as CardCol, Model as CardModel},
        services::{ActiveModel as ServiceActive, Column as ServiceCol},
        status_updates::ActiveModel as StatusUpdateActive,
        users::Column as UserCol,
        Bookings, Customers, RfidCards, Services, Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_staff},
    models::{AgeRange, BookingStatus, CardStatus, PetSize, Species, StatusDisplay},
    response::ApiResponse,
    services::{
        auth_service::{conflict_on_unique, generate_opaque_token},
        rfid_service::{self, TapMetadata},
        tracking_service,
    },
    state::AppState,
};

pub const CARD_IN_USE: &str = "RFID card is currently in use by another active booking";
const CHECK_IN_NOTE: &str = "Pet checked in successfully";
const TAP_NOTE: &str = "Status updated via RFID tap";

/// Creates customer, pet, booking, service lines and the first status row
/// as one unit, holding the card's row lock while availability is checked.
pub async fn check_in(
    state: &AppState,
    payload: CheckInRequest,
) -> AppResult<ApiResponse<CheckInResponse>> {
    validate_check_in(&payload)?;
    let rfid = payload.custom_rfid.trim().to_string();

    let txn = state.orm.begin().await?;

    let card = RfidCards::find()
        .filter(CardCol::CustomUid.eq(rfid.as_str()))
        .filter(CardCol::Status.eq(CardStatus::Active.as_str()))
        .order_by_desc(CardCol::UpdatedAt)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("RFID card not found or inactive: {rfid}")))?;

    if !rfid_service::is_available(&txn, &rfid, card.id).await? {
        tracing::info!(rfid = %rfid, card_id = %card.id, "check-in rejected, card in use");
        return Err(AppError::Conflict(CARD_IN_USE.into()));
    }

    let customer = upsert_customer(&txn, &payload).await?;

    let pet = PetActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.id),
        name: Set(payload.pet_name.trim().to_string()),
        species: Set(Species::from_input(&payload.pet_type).as_db()),
        breed: Set(payload.pet_breed.trim().to_string()),
        age_range: Set(payload
            .pet_age
            .as_deref()
            .and_then(AgeRange::from_description)
            .map(|a| a.as_str().to_string())),
        size: Set(payload
            .pet_size
            .as_deref()
            .and_then(PetSize::from_description)
            .map(|s| s.as_str().to_string())),
        special_notes: Set(payload
            .special_notes
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut lines: Vec<(Uuid, i64)> = Vec::with_capacity(payload.services.len());
    for selection in &payload.services {
        let name = selection.name.trim();
        if name.is_empty() {
            continue;
        }
        let existing = Services::find()
            .filter(ServiceCol::Name.eq(name))
            .one(&txn)
            .await?;
        let line = match existing {
            Some(service) => (service.id, selection.price.unwrap_or(service.price)),
            None => {
                let price = selection.price.ok_or_else(|| {
                    AppError::Validation(format!("Price is required for new service: {name}"))
                })?;
                Services::insert(ServiceActive {
                    id: Set(Uuid::new_v4()),
                    name: Set(name.to_string()),
                    description: Set(Some(name.to_string())),
                    price: Set(price),
                    created_at: NotSet,
                })
                .on_conflict(OnConflict::column(ServiceCol::Name).do_nothing().to_owned())
                .exec_without_returning(&txn)
                .await?;
                // Another check-in may have inserted it first.
                let service = Services::find()
                    .filter(ServiceCol::Name.eq(name))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!("service {name} missing after insert"))
                    })?;
                tracing::debug!(service = name, price, "service added to catalog");
                (service.id, price)
            }
        };
        lines.push(line);
    }

    let total = total_amount(payload.total_amount, lines.iter().map(|(_, p)| *p));
    let estimated = Utc::now() + Duration::minutes(state.config.estimated_service_minutes);

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        pet_id: Set(pet.id),
        rfid_card_id: Set(Some(card.id)),
        custom_rfid: Set(Some(rfid.clone())),
        status: Set(BookingStatus::INITIAL.as_str().to_string()),
        total_amount: Set(total),
        estimated_completion: Set(Some(estimated.into())),
        tracking_token: Set(generate_opaque_token()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|e| conflict_on_unique(e, CARD_IN_USE))?;

    for (service_id, price) in lines {
        BookingServiceActive {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking.id),
            service_id: Set(service_id),
            price: Set(price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    insert_status_update(&txn, booking.id, BookingStatus::INITIAL, CHECK_IN_NOTE).await?;

    txn.commit().await?;

    tracing::info!(booking_id = %booking.id, rfid = %rfid, status = %BookingStatus::INITIAL, "pet checked in");

    audit::record(
        &state.pool,
        customer.user_id,
        "booking_check_in",
        "bookings",
        serde_json::json!({ "booking_id": booking.id, "rfid": rfid }),
    )
    .await;

    state.notifier.spawn_booking_confirmation(booking.id);

    Ok(ApiResponse::success(
        "Check-in successful",
        CheckInResponse {
            booking_id: booking.id,
            rfid_tag: rfid,
            tracking_token: booking.tracking_token,
            estimated_completion: estimated,
        },
    ))
}

/// One reader tap: bump the card's counter, advance its active booking by one
/// stage if it has a successor, and log the tap. All under the card's row lock.
pub async fn process_tap(state: &AppState, payload: TapRequest) -> AppResult<ApiResponse<TapResponse>> {
    let tag = payload.rfid_tag.trim().to_string();
    if tag.is_empty() {
        return Err(AppError::Validation("rfid_tag is required".into()));
    }

    let txn = state.orm.begin().await?;

    let card = rfid_service::find_card_for_update(&txn, &tag)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("RFID tag not found: {tag}")))?;
    if card.status != CardStatus::Active.as_str() {
        return Err(AppError::Validation(format!("RFID card is inactive: {tag}")));
    }

    let previous_tap_count = card.tap_count;
    let tap_count = previous_tap_count
        .checked_add(1)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("tap counter overflow for {tag}")))?;

    RfidCards::update_many()
        .col_expr(CardCol::TapCount, Expr::value(tap_count))
        .col_expr(CardCol::UpdatedAt, Expr::value(now_fixed()))
        .filter(CardCol::Id.eq(card.id))
        .exec(&txn)
        .await?;

    let active = Bookings::find()
        .filter(
            Condition::any()
                .add(BookingCol::RfidCardId.eq(card.id))
                .add(BookingCol::CustomRfid.eq(card.custom_uid.as_str())),
        )
        .filter(BookingCol::Status.is_not_in(BookingStatus::TERMINAL_STR))
        .order_by_desc(BookingCol::CreatedAt)
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let (outcome, booking) = match active {
        None => (TapOutcome::AwaitingCheckIn, None),
        Some(booking) => match next_stage(&booking.status) {
            Some(next) => {
                let updated = apply_transition(&txn, booking, next, TAP_NOTE).await?;
                (TapOutcome::Advanced, Some(updated))
            }
            None => {
                tracing::warn!(booking_id = %booking.id, status = %booking.status, "tap has no next stage");
                (TapOutcome::NoChange, Some(booking))
            }
        },
    };

    let meta = TapMetadata {
        device_info: Some("rfid_tap".to_string()),
        validation_status: Some(outcome_label(outcome).to_string()),
        ..TapMetadata::default()
    };
    rfid_service::record_tap(&txn, &card, tap_count, meta).await?;

    txn.commit().await?;

    tracing::info!(
        rfid = %tag,
        tap_count,
        outcome = outcome_label(outcome),
        booking_id = ?booking.as_ref().map(|b| b.id),
        status = ?booking.as_ref().map(|b| b.status.as_str()),
        "rfid tap processed"
    );

    let mut response = TapResponse {
        rfid_tag: display_tag(&card),
        outcome,
        previous_tap_count,
        tap_count,
        booking_id: None,
        status: None,
        status_label: None,
        status_emoji: None,
        pet_name: None,
        pet_type: None,
        pet_breed: None,
        owner_name: None,
        owner_email: None,
        email_sent: false,
        email_error: None,
    };

    let Some(booking) = booking else {
        return Ok(ApiResponse::success(
            "RFID tap logged. No active booking for this card",
            response,
        ));
    };

    let booking_id = booking.id;
    let view = tracking_service::assemble_view(&state.orm, booking).await?;
    response.booking_id = Some(booking_id);
    response.status = Some(view.status.status.clone());
    response.status_label = Some(view.status.label.clone());
    response.status_emoji = Some(view.status.emoji.clone());
    response.pet_name = Some(view.pet_name);
    response.pet_type = Some(view.pet_type);
    response.pet_breed = Some(view.pet_breed);
    response.owner_name = Some(view.owner_name);
    response.owner_email = view.owner_email;

    if outcome != TapOutcome::Advanced {
        return Ok(ApiResponse::success("RFID tap logged. Status unchanged", response));
    }

    audit::record(
        &state.pool,
        None,
        "booking_tap_advance",
        "bookings",
        serde_json::json!({ "booking_id": booking_id, "status": response.status, "tap_count": tap_count }),
    )
    .await;

    let delivery = state
        .notifier
        .deliver_bounded("status_update", state.notifier.send_status_update(booking_id))
        .await;
    match delivery {
        Ok(()) => response.email_sent = true,
        Err(reason) => response.email_error = Some(reason),
    }

    Ok(ApiResponse::success("Status updated", response))
}

/// Staff override: move a booking one stage forward without a tap.
pub async fn advance_booking(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
) -> AppResult<ApiResponse<StaffActionResponse>> {
    require_staff(state, user).await?;

    let txn = state.orm.begin().await?;
    let booking = lock_booking(&txn, booking_id).await?;
    let previous_status = booking.status.clone();

    let next = next_stage(&booking.status).ok_or_else(|| {
        AppError::Conflict(format!("Booking cannot advance from status: {previous_status}"))
    })?;
    let booking = apply_transition(&txn, booking, next, "Status advanced by staff").await?;

    txn.commit().await?;

    finish_staff_action(state, user, "booking_staff_advance", booking, previous_status).await
}

/// Staff action: cancel a non-terminal booking, releasing its card.
pub async fn cancel_booking(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
) -> AppResult<ApiResponse<StaffActionResponse>> {
    require_staff(state, user).await?;

    let txn = state.orm.begin().await?;
    let booking = lock_booking(&txn, booking_id).await?;
    let previous_status = booking.status.clone();

    if BookingStatus::parse(&previous_status).is_some_and(|s| s.is_terminal()) {
        return Err(AppError::Conflict(format!("Booking is already {previous_status}")));
    }
    let booking =
        apply_transition(&txn, booking, BookingStatus::Cancelled, "Booking cancelled by staff").await?;

    txn.commit().await?;

    finish_staff_action(state, user, "booking_staff_cancel", booking, previous_status).await
}

async fn finish_staff_action(
    state: &AppState,
    user: &AuthUser,
    action: &str,
    booking: BookingModel,
    previous_status: String,
) -> AppResult<ApiResponse<StaffActionResponse>> {
    tracing::info!(
        booking_id = %booking.id,
        from = %previous_status,
        status = %booking.status,
        staff_id = %user.user_id,
        "booking changed by staff"
    );

    audit::record(
        &state.pool,
        Some(user.user_id),
        action,
        "bookings",
        serde_json::json!({ "booking_id": booking.id, "from": previous_status, "to": booking.status }),
    )
    .await;

    state.notifier.spawn_status_update(booking.id);

    Ok(ApiResponse::success(
        "Booking updated",
        StaffActionResponse {
            booking_id: booking.id,
            previous_status,
            status: StatusDisplay::from_raw(&booking.status),
        },
    ))
}

async fn lock_booking<C>(conn: &C, booking_id: Uuid) -> AppResult<BookingModel>
where
    C: ConnectionTrait,
{
    Bookings::find_by_id(booking_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))
}

/// Updates the cached status and appends the matching status row.
async fn apply_transition<C>(
    conn: &C,
    booking: BookingModel,
    to: BookingStatus,
    note: &str,
) -> AppResult<BookingModel>
where
    C: ConnectionTrait,
{
    let booking_id = booking.id;
    let mut active: BookingActive = booking.into();
    active.status = Set(to.as_str().to_string());
    active.updated_at = Set(now_fixed());
    let updated = active.update(conn).await?;

    insert_status_update(conn, booking_id, to, note).await?;
    Ok(updated)
}

async fn insert_status_update<C>(conn: &C, booking_id: Uuid, status: BookingStatus, note: &str) -> AppResult<()>
where
    C: ConnectionTrait,
{
    StatusUpdateActive {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking_id),
        status: Set(status.as_str().to_string()),
        notes: Set(Some(note.to_string())),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Inserts the customer keyed by phone, or refreshes name and email on the
/// existing row in the same statement. An unlinked record is then linked to the
/// verified user owning the same email. Phone numbers are never verified, so they
/// never drive the link.
async fn upsert_customer<C>(conn: &C, payload: &CheckInRequest) -> AppResult<CustomerModel>
where
    C: ConnectionTrait,
{
    let phone = payload.owner_phone.trim().to_string();
    let email = payload.owner_email.trim().to_string();
    let name = payload.owner_name.trim().to_string();

    let customer = Customers::insert(CustomerActive {
        id: Set(Uuid::new_v4()),
        user_id: NotSet,
        name: Set(name),
        phone: Set(phone),
        email: Set(Some(email.clone())),
        created_at: NotSet,
        updated_at: Set(now_fixed()),
    })
    .on_conflict(
        OnConflict::column(CustomerCol::Phone)
            .update_columns([CustomerCol::Name, CustomerCol::Email, CustomerCol::UpdatedAt])
            .to_owned(),
    )
    .exec_with_returning(conn)
    .await?;

    if customer.user_id.is_some() {
        return Ok(customer);
    }

    let owner = Users::find()
        .filter(UserCol::EmailVerified.eq(true))
        .filter(UserCol::Email.eq(email.as_str()))
        .one(conn)
        .await?;
    let Some(owner) = owner else {
        return Ok(customer);
    };

    let mut active: CustomerActive = customer.into();
    active.user_id = Set(Some(owner.id));
    Ok(active.update(conn).await?)
}

/// Label shown for a card: its custom UID, or the hardware UID when unlabelled.
fn display_tag(card: &CardModel) -> String {
    if card.custom_uid.trim().is_empty() {
        card.card_uid.clone()
    } else {
        card.custom_uid.clone()
    }
}

pub fn validate_check_in(payload: &CheckInRequest) -> AppResult<()> {
    let required: [(&str, &str); 7] = [
        ("petName", &payload.pet_name),
        ("petType", &payload.pet_type),
        ("petBreed", &payload.pet_breed),
        ("ownerName", &payload.owner_name),
        ("ownerPhone", &payload.owner_phone),
        ("ownerEmail", &payload.owner_email),
        ("customRFID", &payload.custom_rfid),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("Missing required field: {field}")));
        }
    }
    if payload.total_amount.is_some_and(|t| t < 0) {
        return Err(AppError::Validation("totalAmount must not be negative".into()));
    }
    if payload.services.iter().any(|s| s.price.is_some_and(|p| p < 0)) {
        return Err(AppError::Validation("Service price must not be negative".into()));
    }
    Ok(())
}

/// Successor of a stored status; `None` for terminal or unknown values.
pub fn next_stage(raw_status: &str) -> Option<BookingStatus> {
    BookingStatus::parse(raw_status)?.next()
}

pub fn total_amount(explicit: Option<i64>, prices: impl Iterator<Item = i64>) -> i64 {
    explicit.unwrap_or_else(|| prices.sum())
}

fn outcome_label(outcome: TapOutcome) -> &'static str {
    match outcome {
        TapOutcome::Advanced => "advanced",
        TapOutcome::AwaitingCheckIn => "awaiting_check_in",
        TapOutcome::NoChange => "no_change",
    }
}

fn now_fixed() -> sea_orm::prelude::DateTimeWithTimeZone {
    Utc::now().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::check_in::ServiceSelection;

    fn request() -> CheckInRequest {
        CheckInRequest {
            pet_name: "Mochi".into(),
            pet_type: "Dog".into(),
            pet_breed: "Shih Tzu".into(),
            pet_age: Some("senior".into()),
            pet_size: Some("small".into()),
            special_notes: None,
            owner_name: "Ana Cruz".into(),
            owner_phone: "09171234567".into(),
            owner_email: "ana@example.com".into(),
            services: vec![
                ServiceSelection { name: "Basic Bath".into(), price: Some(35_000) },
                ServiceSelection { name: "Nail Trim".into(), price: None },
            ],
            total_amount: None,
            custom_rfid: "PAW-001".into(),
        }
    }

    #[test]
    fn complete_request_passes_validation() {
        assert!(validate_check_in(&request()).is_ok());
    }

    #[test]
    fn missing_rfid_is_named() {
        let mut req = request();
        req.custom_rfid = " ".into();
        let err = validate_check_in(&req).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: customRFID");
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut req = request();
        req.services[0].price = Some(-1);
        assert!(matches!(validate_check_in(&req), Err(AppError::Validation(_))));
    }

    #[test]
    fn tap_stage_table() {
        assert_eq!(next_stage("checked-in"), Some(BookingStatus::Bathing));
        assert_eq!(next_stage("ready"), Some(BookingStatus::Completed));
        assert_eq!(next_stage("completed"), None);
        assert_eq!(next_stage("cancelled"), None);
        assert_eq!(next_stage("drying"), None);
    }

    #[test]
    fn total_defaults_to_sum_of_lines() {
        assert_eq!(total_amount(None, [35_000, 15_000].into_iter()), 50_000);
        assert_eq!(total_amount(Some(60_000), [35_000].into_iter()), 60_000);
        assert_eq!(total_amount(None, std::iter::empty()), 0);
    }

    #[test]
    fn outcome_labels_match_wire_names() {
        for outcome in [TapOutcome::Advanced, TapOutcome::AwaitingCheckIn, TapOutcome::NoChange] {
            let wire = serde_json::to_value(outcome).unwrap();
            assert_eq!(wire, serde_json::json!(outcome_label(outcome)));
        }
    }
}
