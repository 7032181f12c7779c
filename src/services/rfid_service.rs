use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    dto::{
        check_in::LatestRfidResponse,
        rfid::{RfidIngestRequest, RfidIngestResponse},
    },
    entity::{
        bookings::Column as BookingCol,
        rfid_cards::{ActiveModel as CardActive, Column as CardCol, Model as CardModel},
        rfid_tap_history::{ActiveModel as TapActive, Model as TapModel},
        Bookings, RfidCards,
    },
    error::{AppError, AppResult},
    models::{BookingStatus, CardStatus, TapEvent},
    response::ApiResponse,
    services::auth_service::conflict_on_unique,
    state::AppState,
};

pub const DEFAULT_MAX_TAPS: i32 = 5;

/// Environmental data the reader attaches to a tap.
#[derive(Debug, Clone, Default)]
pub struct TapMetadata {
    pub device_info: Option<String>,
    pub wifi_network: Option<String>,
    pub signal_strength: Option<i32>,
    pub validation_status: Option<String>,
    pub readable_time: Option<String>,
    pub timestamp_value: Option<i64>,
    pub rfid_scanner_status: Option<String>,
}

impl From<&RfidIngestRequest> for TapMetadata {
    fn from(req: &RfidIngestRequest) -> Self {
        Self {
            device_info: req.device_info.clone(),
            wifi_network: req.wifi_network.clone(),
            signal_strength: req.signal_strength,
            validation_status: req.validation_status.clone(),
            readable_time: req.readable_time.clone(),
            timestamp_value: req.timestamp_value,
            rfid_scanner_status: req.rfid_scanner_status.clone(),
        }
    }
}

impl From<TapModel> for TapEvent {
    fn from(row: TapModel) -> Self {
        TapEvent {
            id: row.id,
            rfid_card_id: row.rfid_card_id,
            card_uid: row.card_uid,
            custom_uid: row.custom_uid,
            tap_number: row.tap_number,
            tapped_at: row.tapped_at.with_timezone(&Utc),
            signal_strength: row.signal_strength,
            validation_status: row.validation_status,
        }
    }
}

/// Creates the card on first sight of `card_uid`, otherwise refreshes its label
/// and sync metadata. The stored tap count never goes down.
pub async fn upsert_card<C>(
    conn: &C,
    card_uid: &str,
    custom_uid: &str,
    tap_count: i32,
    max_taps: Option<i32>,
    device_info: Option<String>,
) -> AppResult<CardModel>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let existing = RfidCards::find()
        .filter(CardCol::CardUid.eq(card_uid))
        .lock(LockType::Update)
        .one(conn)
        .await?;

    let card = match existing {
        Some(card) => {
            let kept = merged_tap_count(card.tap_count, tap_count);
            let mut active: CardActive = card.into();
            active.custom_uid = Set(custom_uid.to_string());
            active.tap_count = Set(kept);
            if let Some(max) = max_taps {
                active.max_taps = Set(max);
            }
            active.device_source = Set(device_info);
            active.last_sync_at = Set(Some(now.into()));
            active.updated_at = Set(now.into());
            active.update(conn).await?
        }
        None => CardActive {
            id: Set(Uuid::new_v4()),
            card_uid: Set(card_uid.to_string()),
            custom_uid: Set(custom_uid.to_string()),
            tap_count: Set(tap_count),
            max_taps: Set(max_taps.unwrap_or(DEFAULT_MAX_TAPS)),
            status: Set(CardStatus::Active.as_str().to_string()),
            device_source: Set(device_info),
            last_sync_at: Set(Some(now.into())),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(conn)
        .await
        .map_err(|e| conflict_on_unique(e, "RFID card is being registered concurrently"))?,
    };

    Ok(card)
}

/// Reported counts that lag behind the stored value are ignored.
pub fn merged_tap_count(stored: i32, reported: i32) -> i32 {
    stored.max(reported)
}

/// Appends an immutable tap-history row for `card`.
pub async fn record_tap<C>(
    conn: &C,
    card: &CardModel,
    tap_number: i32,
    meta: TapMetadata,
) -> AppResult<TapEvent>
where
    C: ConnectionTrait,
{
    let row = TapActive {
        id: Set(Uuid::new_v4()),
        rfid_card_id: Set(card.id),
        card_uid: Set(card.card_uid.clone()),
        custom_uid: Set(card.custom_uid.clone()),
        tap_number: Set(tap_number),
        tapped_at: NotSet,
        device_info: Set(meta.device_info),
        wifi_network: Set(meta.wifi_network),
        signal_strength: Set(meta.signal_strength),
        validation_status: Set(meta.validation_status),
        readable_time: Set(meta.readable_time),
        timestamp_value: Set(meta.timestamp_value),
        rfid_scanner_status: Set(meta.rfid_scanner_status),
    }
    .insert(conn)
    .await?;

    Ok(row.into())
}

/// True when no non-terminal booking references the label or the card.
pub async fn is_available<C>(conn: &C, custom_uid: &str, card_id: Uuid) -> AppResult<bool>
where
    C: ConnectionTrait,
{
    let active = Bookings::find()
        .filter(
            Condition::any()
                .add(BookingCol::CustomRfid.eq(custom_uid))
                .add(BookingCol::RfidCardId.eq(card_id)),
        )
        .filter(BookingCol::Status.is_not_in(BookingStatus::TERMINAL_STR))
        .count(conn)
        .await?;
    Ok(active == 0)
}

/// Locks the card addressed by hardware UID or custom label.
pub async fn find_card_for_update<C>(conn: &C, tag: &str) -> AppResult<Option<CardModel>>
where
    C: ConnectionTrait,
{
    let card = RfidCards::find()
        .filter(
            Condition::any()
                .add(CardCol::CardUid.eq(tag))
                .add(CardCol::CustomUid.eq(tag)),
        )
        .order_by_desc(CardCol::UpdatedAt)
        .lock(LockType::Update)
        .one(conn)
        .await?;
    Ok(card)
}

/// `POST /api/rfid`: upsert the card and log the tap as one unit.
pub async fn ingest(
    state: &AppState,
    payload: RfidIngestRequest,
) -> AppResult<ApiResponse<RfidIngestResponse>> {
    let card_uid = payload.card_uid.trim().to_string();
    let custom_uid = payload.custom_uid.trim().to_string();
    if card_uid.is_empty() {
        return Err(AppError::Validation("card_uid is required".into()));
    }
    if custom_uid.is_empty() {
        return Err(AppError::Validation("custom_uid is required".into()));
    }
    if payload.tap_count < 0 {
        return Err(AppError::Validation("tap_count must not be negative".into()));
    }

    let meta = TapMetadata::from(&payload);
    let txn = state.orm.begin().await?;

    let card = upsert_card(
        &txn,
        &card_uid,
        &custom_uid,
        payload.tap_count,
        payload.max_taps,
        payload.device_info.clone(),
    )
    .await?;
    let tap_number = payload.tap_number.unwrap_or(card.tap_count);
    let tap = record_tap(&txn, &card, tap_number, meta).await?;

    txn.commit().await?;

    tracing::info!(
        card_id = %card.id,
        rfid = %card.custom_uid,
        tap_count = card.tap_count,
        tap_number,
        "rfid data ingested"
    );

    Ok(ApiResponse::success(
        "RFID data saved successfully",
        RfidIngestResponse {
            card_id: card.id,
            custom_uid: card.custom_uid,
            tap_count: card.tap_count,
            tap,
        },
    ))
}

#[derive(Debug, sqlx::FromRow)]
struct LatestTapRow {
    card_id: Uuid,
    card_uid: String,
    custom_uid: String,
    tap_number: i32,
    tapped_at: DateTime<Utc>,
}

/// Most recent tap on any active card. Read-only.
pub async fn latest_tap(state: &AppState) -> AppResult<ApiResponse<LatestRfidResponse>> {
    let row = sqlx::query_as::<_, LatestTapRow>(
        r#"
        SELECT rc.id AS card_id, rth.card_uid, rc.custom_uid, rth.tap_number, rth.tapped_at
        FROM rfid_tap_history rth
        JOIN rfid_cards rc ON rc.id = rth.rfid_card_id
        WHERE rc.status = $1
        ORDER BY rth.tapped_at DESC
        LIMIT 1
        "#,
    )
    .bind(CardStatus::Active.as_str())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No RFID data found".into()))?;

    let available = is_available(&state.orm, &row.custom_uid, row.card_id).await?;
    let is_first_tap = row.tap_number == 1;

    let message = match (is_first_tap, available) {
        (true, true) => "RFID card detected and ready for check-in",
        (_, false) => "RFID card is currently in use by another booking",
        (false, true) => "RFID tap logged",
    };

    Ok(ApiResponse::success(
        message,
        LatestRfidResponse {
            card_id: row.card_id,
            card_uid: row.card_uid,
            custom_uid: row.custom_uid,
            tap_count: row.tap_number,
            is_first_tap,
            available,
            tapped_at: row.tapped_at,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_count_never_lowers_stored_count() {
        assert_eq!(merged_tap_count(4, 2), 4);
        assert_eq!(merged_tap_count(4, 6), 6);
        assert_eq!(merged_tap_count(0, 0), 0);
    }

    #[test]
    fn ingest_payload_carries_tap_metadata() {
        let req = RfidIngestRequest {
            card_uid: "04A1B2C3".into(),
            custom_uid: "PAW-001".into(),
            tap_count: 1,
            signal_strength: Some(-61),
            wifi_network: Some("salon-iot".into()),
            validation_status: Some("valid".into()),
            ..Default::default()
        };
        let meta = TapMetadata::from(&req);
        assert_eq!(meta.signal_strength, Some(-61));
        assert_eq!(meta.wifi_network.as_deref(), Some("salon-iot"));
        assert_eq!(meta.validation_status.as_deref(), Some("valid"));
    }
}
