use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::StatusDisplay;

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffActionResponse {
    pub booking_id: Uuid,
    pub previous_status: String,
    pub status: StatusDisplay,
}
