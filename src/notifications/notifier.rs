use std::{future::Future, sync::Arc, time::Duration};

use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{db::OrmConn, entity::Bookings, services::tracking_service};

use super::{Mailer, NotificationError, messages};

/// Salon-level email operations on top of a [`Mailer`].
///
/// Every send happens after the triggering transaction has committed. Callers
/// either spawn the send or await it under `timeout`; failures are logged and
/// reported as a `false` delivery flag, never as a request error.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    orm: OrmConn,
    public_base_url: String,
    timeout: Duration,
    verification_ttl_minutes: i64,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        orm: OrmConn,
        public_base_url: impl Into<String>,
        timeout: Duration,
        verification_ttl_minutes: i64,
    ) -> Self {
        Self {
            mailer,
            orm,
            public_base_url: public_base_url.into(),
            timeout,
            verification_ttl_minutes,
        }
    }

    pub fn dashboard_url(&self, tracking_token: &str) -> String {
        format!("{}/guest-dashboard?token={}", self.public_base_url, tracking_token)
    }

    pub fn reset_url(&self, reset_token: &str) -> String {
        format!("{}/reset-password?token={}", self.public_base_url, reset_token)
    }

    pub async fn send_verification_email(
        &self,
        address: &str,
        name: &str,
        code: &str,
    ) -> Result<(), NotificationError> {
        let email = messages::verification(address, name, code, self.verification_ttl_minutes);
        self.mailer.send(&email).await
    }

    pub async fn send_password_reset_email(
        &self,
        address: &str,
        name: &str,
        reset_token: &str,
    ) -> Result<(), NotificationError> {
        let email = messages::password_reset(address, name, &self.reset_url(reset_token));
        self.mailer.send(&email).await
    }

    pub async fn send_booking_confirmation(&self, booking_id: Uuid) -> Result<(), NotificationError> {
        let (address, view, token) = self.load_recipient(booking_id).await?;
        let email = messages::booking_confirmation(&address, &view, &self.dashboard_url(&token));
        self.mailer.send(&email).await
    }

    pub async fn send_status_update(&self, booking_id: Uuid) -> Result<(), NotificationError> {
        let (address, view, token) = self.load_recipient(booking_id).await?;
        let email = messages::status_update(&address, &view, &self.dashboard_url(&token));
        self.mailer.send(&email).await
    }

    async fn load_recipient(
        &self,
        booking_id: Uuid,
    ) -> Result<(String, crate::models::BookingView, String), NotificationError> {
        let booking = Bookings::find_by_id(booking_id)
            .one(&self.orm)
            .await?
            .ok_or(NotificationError::BookingNotFound(booking_id))?;
        let token = booking.tracking_token.clone();
        let view = tracking_service::assemble_view(&self.orm, booking).await?;
        let address = view
            .owner_email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or(NotificationError::NoRecipient(booking_id))?;
        Ok((address, view, token))
    }

    /// Awaits a send for at most `timeout`. The error is the reason it was not delivered.
    pub async fn deliver_bounded<F>(&self, kind: &'static str, send: F) -> Result<(), String>
    where
        F: Future<Output = Result<(), NotificationError>>,
    {
        match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                tracing::warn!(kind, error = %err, "email delivery failed");
                Err(err.to_string())
            }
            Err(_) => {
                tracing::warn!(kind, timeout_secs = self.timeout.as_secs(), "email delivery timed out");
                Err("email delivery timed out".to_string())
            }
        }
    }

    /// Fire-and-forget: the request does not wait for delivery.
    pub fn spawn<F>(&self, kind: &'static str, send: F)
    where
        F: Future<Output = Result<(), NotificationError>> + Send + 'static,
    {
        let notifier = self.clone();
        tokio::spawn(async move {
            if notifier.deliver_bounded(kind, send).await.is_ok() {
                tracing::debug!(kind, "email delivered");
            }
        });
    }

    pub fn spawn_verification_email(&self, address: String, name: String, code: String) {
        let notifier = self.clone();
        self.spawn("verification", async move {
            notifier.send_verification_email(&address, &name, &code).await
        });
    }

    pub fn spawn_password_reset_email(&self, address: String, name: String, reset_token: String) {
        let notifier = self.clone();
        self.spawn("password_reset", async move {
            notifier
                .send_password_reset_email(&address, &name, &reset_token)
                .await
        });
    }

    pub fn spawn_booking_confirmation(&self, booking_id: Uuid) {
        let notifier = self.clone();
        self.spawn("booking_confirmation", async move {
            notifier.send_booking_confirmation(booking_id).await
        });
    }

    pub fn spawn_status_update(&self, booking_id: Uuid) {
        let notifier = self.clone();
        self.spawn("status_update", async move {
            notifier.send_status_update(booking_id).await
        });
    }
}
