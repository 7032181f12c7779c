pub mod auth;
pub mod bookings;
pub mod check_in;
pub mod rfid;
pub mod tracking;
