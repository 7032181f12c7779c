use std::{sync::Arc, time::Duration};

use crate::{
    config::{AppConfig, MailTransport},
    db::{DbPool, OrmConn},
    notifications::{HttpMailer, LogMailer, Mailer, Notifier},
    services::token_service::TokenService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenService::new(config.jwt_secret.as_bytes());
        let notifier = Notifier::new(
            mailer,
            orm.clone(),
            config.public_base_url.clone(),
            Duration::from_secs(config.mail_timeout_secs),
            config.verification_code_ttl_minutes,
        );
        Self {
            pool,
            orm,
            config: Arc::new(config),
            tokens,
            notifier,
        }
    }
}

/// Picks the mail transport named by the config.
pub fn mailer_from_config(config: &AppConfig) -> Arc<dyn Mailer> {
    match &config.mail_transport {
        MailTransport::Http { api_url, api_key } => Arc::new(HttpMailer::new(
            api_url.clone(),
            api_key.clone(),
            config.mail_from.clone(),
        )),
        MailTransport::Log => Arc::new(LogMailer),
    }
}
