//! Configuration loading from environment.

use std::env;

use fundilink_daraja::DarajaConfig;

const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub daraja: DarajaConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let database_url = require("DATABASE_URL")?;

        let base_url =
            env::var("MPESA_BASE_URL").unwrap_or_else(|_| SANDBOX_BASE_URL.to_string());

        // The gateway posts its result to this address, so it must be a
        // publicly reachable URL, not localhost.
        let callback_base = require("CALLBACK_BASE_URL")?;
        let callback_url = format!(
            "{}/api/payments/callback",
            callback_base.trim_end_matches('/')
        );

        let daraja = DarajaConfig {
            base_url,
            consumer_key: require("MPESA_CONSUMER_KEY")?,
            consumer_secret: require("MPESA_CONSUMER_SECRET")?,
            shortcode: require("MPESA_SHORTCODE")?,
            passkey: require("MPESA_PASSKEY")?,
            callback_url,
        };

        Ok(Self {
            port,
            database_url,
            daraja,
        })
    }
}

fn require(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{name} environment variable is required"))
}
