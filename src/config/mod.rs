use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Seconds to wait for a connection from the pool
    pub acquire_timeout_secs: u64,
    /// Upper bound on any single gateway database call
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Inline credentials, "user:bcrypt-hash" pairs separated by commas
    pub users: Option<String>,
    /// Path to a credentials file, one "user:bcrypt-hash" per line
    pub users_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Tables the dynamic gateway may touch
    pub allowed_tables: Vec<String>,
    /// Stored procedures the gateway may call
    pub allowed_procedures: Vec<String>,
}

/// Tables the gateway accepts out of the box. The set covers the inventory
/// schema: per-engine version/server tables, database and user registries,
/// recap storage, and the sniffer feeds.
const DEFAULT_TABLES: &[&str] = &[
    "mysql_version",
    "postgres_version",
    "oracle_version",
    "software_version",
    "servers",
    "db_servers",
    "db_users",
    "server_recap",
    "recap_values",
    "dbai_feed",
    "sniffer_queries",
    "sniffer_hosts",
];

const DEFAULT_PROCEDURES: &[&str] = &[
    "get_recap_values",
    "feed_dbai",
    "mysql_sniffer",
    "mysql_sniffer_hosts",
];

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides. DBMON_PORT wins over the generic PORT.
        if let Ok(v) = env::var("DBMON_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(v) = env::var("DBMON_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs =
                v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_QUERY_TIMEOUT_SECS") {
            self.database.query_timeout_secs =
                v.parse().unwrap_or(self.database.query_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("DBMON_USERS") {
            self.security.users = Some(v);
        }
        if let Ok(v) = env::var("DBMON_USERS_FILE") {
            self.security.users_file = Some(v);
        }

        // Gateway overrides
        if let Ok(v) = env::var("DBMON_ALLOWED_TABLES") {
            self.gateway.allowed_tables = split_csv(&v);
        }
        if let Ok(v) = env::var("DBMON_ALLOWED_PROCEDURES") {
            self.gateway.allowed_procedures = split_csv(&v);
        }

        self
    }

    fn base(environment: Environment, max_connections: u32, query_timeout_secs: u64) -> Self {
        Self {
            environment,
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                max_connections,
                acquire_timeout_secs: 5,
                query_timeout_secs,
            },
            security: SecurityConfig {
                users: None,
                users_file: None,
            },
            gateway: GatewayConfig {
                allowed_tables: DEFAULT_TABLES.iter().map(|s| s.to_string()).collect(),
                allowed_procedures: DEFAULT_PROCEDURES.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn development() -> Self {
        Self::base(Environment::Development, 10, 30)
    }

    fn staging() -> Self {
        Self::base(Environment::Staging, 20, 15)
    }

    fn production() -> Self {
        Self::base(Environment::Production, 50, 10)
    }
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.gateway.allowed_tables.contains(&"server_recap".to_string()));
        assert!(config.gateway.allowed_procedures.contains(&"feed_dbai".to_string()));
    }

    #[test]
    fn default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.database.query_timeout_secs, 10);
    }

    #[test]
    fn split_csv_trims_and_drops_empties() {
        assert_eq!(split_csv("a, b ,,c"), vec!["a", "b", "c"]);
    }
}
