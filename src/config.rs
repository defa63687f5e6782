use std::{
    fs,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
};

use meetings_lib::db::SurrealDBConnection;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::constants::{
    MEETINGS_CONFIG, MEETINGS_CORS_ORIGIN, MEETINGS_DB_ADDRESS, MEETINGS_DB_NAME,
    MEETINGS_DB_NAMESPACE, MEETINGS_DB_PSWD, MEETINGS_DB_USER, MEETINGS_HOST, MEETINGS_PORT,
};
use crate::utils::get_env;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 52001,
            cors_origin: String::from("http://localhost:9000"),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Defaults, then the TOML file named by `MEETINGS_CONFIG`, then env vars.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeetingsConfig {
    pub server: ServerConfig,
    pub database: SurrealDBConnection,
}

impl MeetingsConfig {
    #[instrument]
    pub fn load() -> Result<Self, ConfigError> {
        let config = match get_env(MEETINGS_CONFIG) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.with_overrides(get_env)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        debug!("reading config from {}", path);
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;

        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup(MEETINGS_HOST) {
            self.server.host = parse_env(MEETINGS_HOST, host)?;
        }
        if let Some(port) = lookup(MEETINGS_PORT) {
            self.server.port = parse_env(MEETINGS_PORT, port)?;
        }
        if let Some(origin) = lookup(MEETINGS_CORS_ORIGIN) {
            self.server.cors_origin = origin;
        }

        let database = &mut self.database;
        if let Some(address) = lookup(MEETINGS_DB_ADDRESS) {
            database.address = address;
        }
        if let Some(user) = lookup(MEETINGS_DB_USER) {
            database.username = Some(user);
        }
        if let Some(pswd) = lookup(MEETINGS_DB_PSWD) {
            database.password = Some(pswd);
        }
        if let Some(namespace) = lookup(MEETINGS_DB_NAMESPACE) {
            database.namespace = namespace;
        }
        if let Some(name) = lookup(MEETINGS_DB_NAME) {
            database.database = name;
        }

        Ok(self)
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
