use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Kiosk check-in form.
#[derive(Deserialize, Debug, Default, Clone, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckInRequest {
    pub pet_name: String,
    pub pet_type: String,
    pub pet_breed: String,
    pub pet_age: Option<String>,
    pub pet_size: Option<String>,
    pub special_notes: Option<String>,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_email: String,
    pub services: Vec<ServiceSelection>,
    /// Minor units. Defaults to the sum of the selected service prices.
    pub total_amount: Option<i64>,
    #[serde(rename = "customRFID")]
    pub custom_rfid: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct ServiceSelection {
    pub name: String,
    #[serde(default)]
    pub price: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInResponse {
    pub booking_id: Uuid,
    pub rfid_tag: String,
    pub tracking_token: String,
    pub estimated_completion: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckInQuery {
    pub action: Option<String>,
}

/// Most recent tap on an active card, polled by the check-in form.
#[derive(Debug, Serialize, ToSchema)]
pub struct LatestRfidResponse {
    pub card_id: Uuid,
    pub card_uid: String,
    pub custom_uid: String,
    pub tap_count: i32,
    pub is_first_tap: bool,
    pub available: bool,
    pub tapped_at: DateTime<Utc>,
}
