use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::TapEvent;

/// Raw reader payload relayed by the ingestion process.
#[derive(Deserialize, Debug, Default, Clone, ToSchema)]
#[serde(default)]
pub struct RfidIngestRequest {
    pub card_uid: String,
    pub custom_uid: String,
    pub tap_count: i32,
    pub max_taps: Option<i32>,
    pub tap_number: Option<i32>,
    pub device_info: Option<String>,
    pub wifi_network: Option<String>,
    pub signal_strength: Option<i32>,
    pub validation_status: Option<String>,
    pub readable_time: Option<String>,
    pub timestamp_value: Option<i64>,
    pub rfid_scanner_status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RfidIngestResponse {
    pub card_id: Uuid,
    pub custom_uid: String,
    pub tap_count: i32,
    pub tap: TapEvent,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct TapRequest {
    pub rfid_tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TapOutcome {
    /// The bound booking moved to its next stage.
    Advanced,
    /// No active booking holds the card yet.
    AwaitingCheckIn,
    /// A booking exists but has no next stage.
    NoChange,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TapResponse {
    pub rfid_tag: String,
    pub outcome: TapOutcome,
    pub previous_tap_count: i32,
    pub tap_count: i32,
    pub booking_id: Option<Uuid>,
    pub status: Option<String>,
    pub status_label: Option<String>,
    pub status_emoji: Option<String>,
    pub pet_name: Option<String>,
    pub pet_type: Option<String>,
    pub pet_breed: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub email_sent: bool,
    pub email_error: Option<String>,
}
