//! Server configuration read from the environment

use std::net::SocketAddr;
use std::str::FromStr;

/// Which task store backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Mongo,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "memory" | "mem" => Ok(Self::Memory),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            other => Err(format!("unknown task store backend: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub backend: StoreBackend,
    pub port: u16,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 8081;

    /// Read `DAYPLAN_BACKEND` and `DAYPLAN_PORT`
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(
            std::env::var("DAYPLAN_BACKEND").ok(),
            std::env::var("DAYPLAN_PORT").ok(),
        )
    }

    pub fn from_vars(backend: Option<String>, port: Option<String>) -> Result<Self, String> {
        let backend = match backend {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Memory,
        };
        let port = match port {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| format!("invalid DAYPLAN_PORT: {raw}"))?,
            None => Self::DEFAULT_PORT,
        };
        Ok(Self { backend, port })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
