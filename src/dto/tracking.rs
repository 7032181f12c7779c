use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::BookingView;

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrackingQuery {
    pub rfid: Option<String>,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GuestDashboardQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveBookings {
    pub items: Vec<BookingView>,
}

/// A single booking when `?rfid=` is given, otherwise the caller's active list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum TrackingData {
    Single(BookingView),
    Active(ActiveBookings),
}
