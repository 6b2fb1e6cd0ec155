use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Credentials for the super-admin created on an empty store.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `None` leaves the store unconfigured; handlers then answer 500.
    pub db_path: Option<PathBuf>,
    pub admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HIMO_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env::var("HIMO_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("HIMO_PORT must be a port number")?;
        let db_path = non_empty("HIMO_DB_PATH").map(PathBuf::from);

        let admin = match (non_empty("HIMO_ADMIN_USERNAME"), non_empty("HIMO_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            _ => None,
        };

        Ok(Self {
            host,
            port,
            db_path,
            admin,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> Config {
        Config {
            host: host.into(),
            port,
            db_path: None,
            admin: None,
        }
    }

    #[test]
    fn addr_joins_host_and_port() {
        let addr = config("127.0.0.1", 3000).addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn hostname_is_not_an_addr() {
        assert!(config("localhost", 3000).addr().is_err());
    }
}
