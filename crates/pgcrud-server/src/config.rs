//! Server configuration.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port
    pub port: u16,

    /// Postgres connection string
    pub database_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: env::var("PGCRUD_PORT")
                .unwrap_or_else(|_| "8002".to_string())
                .parse()?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://postgres@localhost:5432/postgres".to_string()),
        })
    }
}
