//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::game::combat::CollisionPolicy;
use crate::util::rate_limit::DEFAULT_INPUT_RATE_LIMIT;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// World RNG seed; random when unset
    pub world_seed: Option<u64>,
    /// Allowed client origins for CORS; empty allows any
    pub client_origins: Vec<String>,
    /// Max input frames per second per connection
    pub input_rate_limit: u32,
    /// Let projectiles hit teammates
    pub friendly_fire: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// How projectiles treat teammates
    pub fn collision_policy(&self) -> CollisionPolicy {
        if self.friendly_fire {
            CollisionPolicy::TeamAgnostic
        } else {
            CollisionPolicy::TeamAware
        }
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Hosts like Render provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match var("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        let world_seed = var("WORLD_SEED")
            .map(|s| s.parse().map_err(|_| ConfigError::Invalid("WORLD_SEED")))
            .transpose()?;

        let input_rate_limit = match var("INPUT_RATE_LIMIT") {
            Some(s) => s
                .parse()
                .map_err(|_| ConfigError::Invalid("INPUT_RATE_LIMIT"))?,
            None => DEFAULT_INPUT_RATE_LIMIT,
        };

        let friendly_fire = match var("FRIENDLY_FIRE").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(_) => return Err(ConfigError::Invalid("FRIENDLY_FIRE")),
        };

        let client_origins = var("CLIENT_ORIGIN")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            world_seed,
            client_origins,
            input_rate_limit,
            friendly_fire,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
