pub mod audit_logs;
pub mod booking_services;
pub mod bookings;
pub mod customers;
pub mod pets;
pub mod rfid_cards;
pub mod rfid_tap_history;
pub mod services;
pub mod status_updates;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use booking_services::Entity as BookingServices;
pub use bookings::Entity as Bookings;
pub use customers::Entity as Customers;
pub use pets::Entity as Pets;
pub use rfid_cards::Entity as RfidCards;
pub use rfid_tap_history::Entity as RfidTapHistory;
pub use services::Entity as Services;
pub use status_updates::Entity as StatusUpdates;
pub use users::Entity as Users;
