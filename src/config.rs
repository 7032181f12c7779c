use std::env;

use anyhow::{Context, anyhow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTransport {
    /// POST each message to a transactional email HTTP API.
    Http { api_url: String, api_key: String },
    /// Write messages to the log instead of delivering them.
    Log,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub public_base_url: String,
    pub mail_transport: MailTransport,
    pub mail_from: String,
    pub mail_timeout_secs: u64,
    pub verification_code_ttl_minutes: i64,
    pub estimated_service_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Secrets have no default.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{key} must be set"))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let mail_transport = match lookup("MAIL_TRANSPORT").as_deref().map(str::trim) {
            Some("log") => MailTransport::Log,
            Some("http") | None => MailTransport::Http {
                api_url: required("MAIL_API_URL")?,
                api_key: required("MAIL_API_KEY")?,
            },
            Some(other) => return Err(anyhow!("unknown MAIL_TRANSPORT {other:?}")),
        };
        let mail_from = lookup("MAIL_FROM")
            .unwrap_or_else(|| "8Paws Pet Boutique <no-reply@localhost>".to_string());

        let mail_timeout_secs = parse_or("MAIL_TIMEOUT_SECS", lookup("MAIL_TIMEOUT_SECS"), 5)?;
        let verification_code_ttl_minutes = parse_or(
            "VERIFICATION_CODE_TTL_MINUTES",
            lookup("VERIFICATION_CODE_TTL_MINUTES"),
            30,
        )?;
        let estimated_service_minutes = parse_or(
            "ESTIMATED_SERVICE_MINUTES",
            lookup("ESTIMATED_SERVICE_MINUTES"),
            120,
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            public_base_url,
            mail_transport,
            mail_from,
            mail_timeout_secs,
            verification_code_ttl_minutes,
            estimated_service_minutes,
        })
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.trim().parse::<T>().with_context(|| format!("invalid {key}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_jwt_secret_fails() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/salon"),
            ("MAIL_TRANSPORT", "log"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn blank_jwt_secret_fails() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/salon"),
            ("JWT_SECRET", "   "),
            ("MAIL_TRANSPORT", "log"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn http_transport_requires_credentials() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/salon"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MAIL_API_URL"));
    }

    #[test]
    fn defaults_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/salon"),
            ("JWT_SECRET", "s3cret"),
            ("MAIL_TRANSPORT", "log"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.public_base_url, "http://localhost:3000");
        assert_eq!(config.mail_transport, MailTransport::Log);
        assert_eq!(config.mail_timeout_secs, 5);
        assert_eq!(config.verification_code_ttl_minutes, 30);
        assert_eq!(config.estimated_service_minutes, 120);
    }

    #[test]
    fn invalid_number_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/salon"),
            ("JWT_SECRET", "s3cret"),
            ("MAIL_TRANSPORT", "log"),
            ("MAIL_TIMEOUT_SECS", "soon"),
        ]));
        assert!(result.is_err());
    }
}
