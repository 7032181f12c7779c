use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Grooming stages a booking passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BookingStatus {
    #[serde(rename = "checked-in")]
    CheckedIn,
    #[serde(rename = "bathing")]
    Bathing,
    #[serde(rename = "grooming")]
    Grooming,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    pub const INITIAL: BookingStatus = BookingStatus::CheckedIn;
    pub const TERMINAL: [BookingStatus; 2] = [BookingStatus::Completed, BookingStatus::Cancelled];
    pub const TERMINAL_STR: [&'static str; 2] = ["completed", "cancelled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::CheckedIn => "checked-in",
            BookingStatus::Bathing => "bathing",
            BookingStatus::Grooming => "grooming",
            BookingStatus::Ready => "ready",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Returns `None` for values outside the stage set.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "checked-in" => Some(BookingStatus::CheckedIn),
            "bathing" => Some(BookingStatus::Bathing),
            "grooming" => Some(BookingStatus::Grooming),
            "ready" => Some(BookingStatus::Ready),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Tap-driven transition table. Terminal stages have no successor.
    pub fn next(&self) -> Option<Self> {
        match self {
            BookingStatus::CheckedIn => Some(BookingStatus::Bathing),
            BookingStatus::Bathing => Some(BookingStatus::Grooming),
            BookingStatus::Grooming => Some(BookingStatus::Ready),
            BookingStatus::Ready => Some(BookingStatus::Completed),
            BookingStatus::Completed | BookingStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::CheckedIn => "Checked In",
            BookingStatus::Bathing => "Bathing",
            BookingStatus::Grooming => "Grooming",
            BookingStatus::Ready => "Ready for Pickup",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn progress(&self) -> u8 {
        match self {
            BookingStatus::CheckedIn => 25,
            BookingStatus::Bathing => 50,
            BookingStatus::Grooming => 75,
            BookingStatus::Ready | BookingStatus::Completed => 100,
            BookingStatus::Cancelled => 0,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            BookingStatus::CheckedIn => "✅",
            BookingStatus::Bathing => "🛁",
            BookingStatus::Grooming => "✂️",
            BookingStatus::Ready => "🎉",
            BookingStatus::Completed => "🏁",
            BookingStatus::Cancelled => "❌",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human presentation of a stored status string, tolerant of unknown values.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusDisplay {
    pub status: String,
    pub label: String,
    pub progress: u8,
    pub emoji: String,
}

impl StatusDisplay {
    pub fn from_raw(raw: &str) -> Self {
        match BookingStatus::parse(raw) {
            Some(status) => Self {
                status: status.as_str().to_string(),
                label: status.label().to_string(),
                progress: status.progress(),
                emoji: status.emoji().to_string(),
            },
            None => Self {
                status: raw.to_string(),
                label: raw.to_string(),
                progress: 0,
                emoji: "📋".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Staff,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Staff => "staff",
            UserRole::Admin => "admin",
        }
    }

    /// Unknown role strings are treated as the least-privileged role.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "staff" => UserRole::Staff,
            "admin" => UserRole::Admin,
            _ => UserRole::Customer,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Staff | UserRole::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Dog,
    Cat,
    /// Free-text species that does not map to a known value.
    Other(String),
}

impl Species {
    pub fn from_input(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "dog" | "puppy" | "canine" => Species::Dog,
            "cat" | "kitten" | "feline" => Species::Cat,
            _ => Species::Other(value.trim().to_string()),
        }
    }

    pub fn as_db(&self) -> String {
        match self {
            Species::Dog => "dog".to_string(),
            Species::Cat => "cat".to_string(),
            Species::Other(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgeRange {
    Puppy,
    Young,
    Adult,
    Senior,
}

impl AgeRange {
    /// Maps a free-text age descriptor; unrecognized text yields `None`.
    pub fn from_description(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "puppy" | "kitten" | "baby" => Some(AgeRange::Puppy),
            "young" | "juvenile" => Some(AgeRange::Young),
            "adult" => Some(AgeRange::Adult),
            "senior" | "old" | "elderly" => Some(AgeRange::Senior),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRange::Puppy => "puppy",
            AgeRange::Young => "young",
            AgeRange::Adult => "adult",
            AgeRange::Senior => "senior",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PetSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl PetSize {
    /// Maps a free-text size; unrecognized text yields `None`.
    pub fn from_description(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "small" => Some(PetSize::Small),
            "medium" => Some(PetSize::Medium),
            "large" => Some(PetSize::Large),
            "extra_large" | "extra large" | "extra-large" | "xl" => Some(PetSize::ExtraLarge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PetSize::Small => "small",
            PetSize::Medium => "medium",
            PetSize::Large => "large",
            PetSize::ExtraLarge => "extra_large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    Active,
    Inactive,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "active",
            CardStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TapEvent {
    pub id: Uuid,
    pub rfid_card_id: Uuid,
    pub card_uid: String,
    pub custom_uid: String,
    pub tap_number: i32,
    pub tapped_at: DateTime<Utc>,
    pub signal_strength: Option<i32>,
    pub validation_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusHistoryEntry {
    pub status: String,
    pub label: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookedService {
    pub name: String,
    pub price: i64,
}

/// Read-side projection of one booking, shared by customers and guests.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingView {
    pub booking_id: Uuid,
    pub rfid_tag: Option<String>,
    pub pet_name: String,
    pub pet_type: String,
    pub pet_breed: String,
    pub age_range: Option<String>,
    pub size: Option<String>,
    pub special_notes: Option<String>,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_email: Option<String>,
    pub status: StatusDisplay,
    pub status_history: Vec<StatusHistoryEntry>,
    pub services: Vec<BookedService>,
    pub total_amount: i64,
    pub check_in_time: DateTime<Utc>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_taps_walk_the_stage_order() {
        let mut status = BookingStatus::CheckedIn;
        let mut seen = Vec::new();
        for _ in 0..4 {
            status = status.next().expect("non-terminal stage has a successor");
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                BookingStatus::Bathing,
                BookingStatus::Grooming,
                BookingStatus::Ready,
                BookingStatus::Completed,
            ]
        );
        assert_eq!(status.next(), None);
    }

    #[test]
    fn terminal_states_have_no_successor() {
        for status in BookingStatus::TERMINAL {
            assert!(status.is_terminal());
            assert_eq!(status.next(), None);
        }
        assert!(!BookingStatus::Ready.is_terminal());
    }

    #[test]
    fn terminal_strings_match_enum() {
        let from_enum: Vec<&str> = BookingStatus::TERMINAL.iter().map(|s| s.as_str()).collect();
        assert_eq!(from_enum, BookingStatus::TERMINAL_STR.to_vec());
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            BookingStatus::CheckedIn,
            BookingStatus::Bathing,
            BookingStatus::Grooming,
            BookingStatus::Ready,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("ready for pickup"), None);
    }

    #[test]
    fn unknown_status_display_falls_back_to_raw_text() {
        let display = StatusDisplay::from_raw("drying");
        assert_eq!(display.label, "drying");
        assert_eq!(display.progress, 0);

        let display = StatusDisplay::from_raw("ready");
        assert_eq!(display.label, "Ready for Pickup");
        assert_eq!(display.progress, 100);
    }

    #[test]
    fn age_descriptions_map_with_graceful_fallback() {
        assert_eq!(AgeRange::from_description("Kitten"), Some(AgeRange::Puppy));
        assert_eq!(AgeRange::from_description(" juvenile "), Some(AgeRange::Young));
        assert_eq!(AgeRange::from_description("elderly"), Some(AgeRange::Senior));
        assert_eq!(AgeRange::from_description("about 3 years"), None);
    }

    #[test]
    fn sizes_map_with_graceful_fallback() {
        assert_eq!(PetSize::from_description("LARGE"), Some(PetSize::Large));
        assert_eq!(PetSize::from_description("extra large"), Some(PetSize::ExtraLarge));
        assert_eq!(PetSize::from_description("chonky"), None);
    }

    #[test]
    fn species_keeps_free_text() {
        assert_eq!(Species::from_input("Dog"), Species::Dog);
        assert_eq!(
            Species::from_input("Rabbit"),
            Species::Other("Rabbit".to_string())
        );
        assert_eq!(Species::from_input("Rabbit").as_db(), "Rabbit");
    }

    #[test]
    fn unknown_roles_are_customers() {
        assert_eq!(UserRole::parse("superuser"), UserRole::Customer);
        assert!(UserRole::parse("staff").is_staff());
        assert!(!UserRole::parse("customer").is_staff());
    }
}
