//! Transactional email.
//!
//! - [`Mailer`] is the delivery seam; [`HttpMailer`] and [`LogMailer`] implement it.
//! - [`Notifier`] composes salon messages and delivers them without holding up
//!   the state change that triggered them.

pub mod mailer;
pub mod messages;
pub mod notifier;

use async_trait::async_trait;

pub use mailer::{HttpMailer, LogMailer};
pub use notifier::Notifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("mail request error: {0}")]
    Request(String),

    #[error("mail API error (status {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("no recipient address for booking {0}")]
    NoRecipient(uuid::Uuid),

    #[error("booking {0} not found")]
    BookingNotFound(uuid::Uuid),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for NotificationError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<crate::error::AppError> for NotificationError {
    fn from(e: crate::error::AppError) -> Self {
        Self::Database(e.to_string())
    }
}
