pub mod auth_service;
pub mod booking_service;
pub mod rfid_service;
pub mod token_service;
pub mod tracking_service;
