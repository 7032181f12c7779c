use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};

use crate::{
    dto::tracking::{ActiveBookings, TrackingData},
    entity::{
        booking_services::Column as BookingServiceCol,
        bookings::{self, Column as BookingCol, Model as BookingModel},
        customers::Column as CustomerCol,
        pets,
        status_updates::Column as StatusCol,
        BookingServices, Bookings, Customers, Pets, Services, StatusUpdates, Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{BookedService, BookingStatus, BookingView, StatusDisplay, StatusHistoryEntry, UserRole},
    response::ApiResponse,
    state::AppState,
};

/// Builds the read-side projection of one booking.
pub async fn assemble_view<C>(conn: &C, booking: BookingModel) -> AppResult<BookingView>
where
    C: ConnectionTrait,
{
    let (pet, customer) = Pets::find_by_id(booking.pet_id)
        .find_also_related(Customers)
        .one(conn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("booking {} references a missing pet", booking.id))
        })?;
    let customer = customer.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("pet {} references a missing customer", pet.id))
    })?;

    let status_history = StatusUpdates::find()
        .filter(StatusCol::BookingId.eq(booking.id))
        .order_by_asc(StatusCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(|row| StatusHistoryEntry {
            label: StatusDisplay::from_raw(&row.status).label,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at.with_timezone(&Utc),
        })
        .collect();

    let services = BookingServices::find()
        .filter(BookingServiceCol::BookingId.eq(booking.id))
        .order_by_asc(BookingServiceCol::CreatedAt)
        .find_also_related(Services)
        .all(conn)
        .await?
        .into_iter()
        .map(|(line, service)| BookedService {
            name: service.map(|s| s.name).unwrap_or_default(),
            price: line.price,
        })
        .collect();

    Ok(BookingView {
        booking_id: booking.id,
        rfid_tag: booking.custom_rfid,
        pet_name: pet.name,
        pet_type: pet.species,
        pet_breed: pet.breed,
        age_range: pet.age_range,
        size: pet.size,
        special_notes: pet.special_notes,
        owner_name: customer.name,
        owner_phone: customer.phone,
        owner_email: customer.email,
        status: StatusDisplay::from_raw(&booking.status),
        status_history,
        services,
        total_amount: booking.total_amount,
        check_in_time: booking.created_at.with_timezone(&Utc),
        estimated_completion: booking.estimated_completion.map(|t| t.with_timezone(&Utc)),
    })
}

/// `GET /api/tracking`: one booking by RFID label, or the caller's active bookings.
pub async fn track(
    state: &AppState,
    user: &AuthUser,
    rfid: Option<String>,
) -> AppResult<ApiResponse<TrackingData>> {
    match rfid.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(tag) => {
            let view = track_by_rfid(state, user, tag).await?;
            Ok(ApiResponse::success("Ok", TrackingData::Single(view)))
        }
        None => {
            let items = list_active_bookings_for_user(state, user).await?;
            Ok(ApiResponse::success(
                "Ok",
                TrackingData::Active(ActiveBookings { items }),
            ))
        }
    }
}

/// Customers only see bookings for their own linked customer records; staff see all.
/// A booking the caller may not view is reported exactly like a missing one.
pub async fn track_by_rfid(state: &AppState, user: &AuthUser, tag: &str) -> AppResult<BookingView> {
    let not_found = || AppError::NotFound(format!("No booking found for RFID: {tag}"));

    let role = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .map(|u| UserRole::parse(&u.role))
        .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))?;

    let mut finder = Bookings::find().filter(BookingCol::CustomRfid.eq(tag));
    if !role.is_staff() {
        finder = finder
            .join(JoinType::InnerJoin, bookings::Relation::Pets.def())
            .join(JoinType::InnerJoin, pets::Relation::Customers.def())
            .filter(CustomerCol::UserId.eq(user.user_id));
    }

    let booking = finder
        .order_by_desc(BookingCol::CreatedAt)
        .one(&state.orm)
        .await?
        .ok_or_else(not_found)?;

    tracing::debug!(booking_id = %booking.id, rfid = tag, "tracking lookup");
    assemble_view(&state.orm, booking).await
}

pub async fn list_active_bookings_for_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<Vec<BookingView>> {
    let bookings = Bookings::find()
        .join(JoinType::InnerJoin, bookings::Relation::Pets.def())
        .join(JoinType::InnerJoin, pets::Relation::Customers.def())
        .filter(CustomerCol::UserId.eq(user.user_id))
        .filter(BookingCol::Status.is_not_in(BookingStatus::TERMINAL_STR))
        .order_by_desc(BookingCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut views = Vec::with_capacity(bookings.len());
    for booking in bookings {
        views.push(assemble_view(&state.orm, booking).await?);
    }
    Ok(views)
}

/// Anonymous read keyed by the per-booking tracking token.
pub async fn guest_dashboard(
    state: &AppState,
    token: Option<String>,
) -> AppResult<ApiResponse<BookingView>> {
    let token = token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Tracking token is required".into()))?;

    let booking = Bookings::find()
        .filter(BookingCol::TrackingToken.eq(token.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;

    let view = assemble_view(&state.orm, booking).await?;
    Ok(ApiResponse::success("Ok", view))
}
