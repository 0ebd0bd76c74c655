// Configuration chargée depuis les variables d'environnement (.env en dev)

use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET must be at least 32 characters long")]
    WeakJwtSecret,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MailBackend {
    /// Les emails sont seulement écrits dans les logs
    Console,
    /// Les emails sont envoyés à une API HTTP (MAIL_API_URL)
    Http { api_url: String, api_key: Option<String> },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    /// Préfixe des liens d'activation et de reset envoyés par email
    pub public_base_url: String,
    pub mail_backend: MailBackend,
    pub mail_from: String,
    /// Crée les tables au démarrage (dev / premier déploiement)
    pub sync_schema: bool,
    pub seed_categories: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < 32 {
            return Err(ConfigError::WeakJwtSecret);
        }

        let port_raw = env::var("API_PORT").unwrap_or_else(|_| "8080".to_string());
        let port = port_raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
            name: "API_PORT",
            value: port_raw.clone(),
        })?;

        let mail_backend = match env::var("MAIL_BACKEND").unwrap_or_else(|_| "console".to_string()).as_str() {
            "console" => MailBackend::Console,
            "http" => MailBackend::Http {
                api_url: env::var("MAIL_API_URL").map_err(|_| ConfigError::Missing("MAIL_API_URL"))?,
                api_key: env::var("MAIL_API_KEY").ok(),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "MAIL_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            database_url,
            jwt_secret,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://127.0.0.1:{}", port))
                .trim_end_matches('/')
                .to_string(),
            mail_backend,
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@crowdfund.local".to_string()),
            sync_schema: parse_flag("SYNC_SCHEMA")?,
            seed_categories: parse_flag("SEED_CATEGORIES")?,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_flag(name: &'static str) -> Result<bool, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(false),
        Ok(value) => parse_bool(&value).ok_or(ConfigError::Invalid { name, value }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
