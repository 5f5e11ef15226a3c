use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const SERVICE_NAME: &str = "blog";
pub const ENVIRONMENT_VARIABLE: &str = "APP_ENV";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MongoConfig {
    #[serde(default = "default_mongo_uri")]
    pub uri: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: default_mongo_uri(),
            database: default_database(),
            collection: default_collection(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub db: MongoConfig,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            service_name: default_service_name(),
            storage: StorageBackend::default(),
            db: MongoConfig::default(),
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Loads `.env`, then reads `config/blog/server_<APP_ENV>.json` when
    /// `APP_ENV` is set, or plain environment variables otherwise.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        match std::env::var(ENVIRONMENT_VARIABLE) {
            Ok(env) if !env.trim().is_empty() => Self::from_file(Self::environment_file(&env)),
            _ => Self::from_env(),
        }
    }

    pub fn environment_file(env: &str) -> PathBuf {
        PathBuf::from(format!("config/{}/server_{}.json", SERVICE_NAME, env.trim()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config file {}: {}", path.display(), e))?;
        Self::from_json(&raw)
            .map_err(|e| anyhow::anyhow!("invalid config file {}: {}", path.display(), e))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Unset variables
    /// fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(default_host);
        let port = match lookup("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?,
            None => default_port(),
        };
        let service_name = lookup("SERVICE_NAME").unwrap_or_else(default_service_name);
        let storage = match lookup("STORAGE") {
            Some(storage) => storage.parse()?,
            None => StorageBackend::default(),
        };
        let db = MongoConfig {
            uri: lookup("MONGO_URI").unwrap_or_else(default_mongo_uri),
            database: lookup("MONGO_DATABASE").unwrap_or_else(default_database),
            collection: lookup("MONGO_COLLECTION").unwrap_or_else(default_collection),
        };
        let request_timeout_secs = lookup("REQUEST_TIMEOUT_SECS")
            .map(|secs| {
                secs.parse::<u64>()
                    .map_err(|e| anyhow::anyhow!("invalid REQUEST_TIMEOUT_SECS: {}", e))
            })
            .transpose()?;

        Ok(Self {
            host,
            port,
            service_name,
            storage,
            db,
            request_timeout_secs,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address {}:{}: {}", self.host, self.port, e))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    50051
}

fn default_service_name() -> String {
    SERVICE_NAME.into()
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".into()
}

fn default_database() -> String {
    "blog".into()
}

fn default_collection() -> String {
    "posts".into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), 50051);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "6000"),
            ("STORAGE", "memory"),
            ("MONGO_COLLECTION", "tasks"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:6000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.db.collection, "tasks");
        assert_eq!(config.db.database, "blog");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("PORT", "http")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("STORAGE", "sqlite")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("REQUEST_TIMEOUT_SECS", "-1")])).is_err());
    }

    #[test]
    fn test_json_config_file_shape() {
        let config = AppConfig::from_json(
            r#"{
                "port": 7000,
                "serviceName": "blog",
                "storage": "mongo",
                "db": { "uri": "mongodb://db:27017", "collection": "blogs" },
                "requestTimeoutSecs": 0
            }"#,
        )
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7000);
        assert_eq!(config.db.uri, "mongodb://db:27017");
        assert_eq!(config.db.database, "blog");
        assert_eq!(config.db.collection, "blogs");
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_environment_file_path() {
        assert_eq!(
            AppConfig::environment_file("dev"),
            PathBuf::from("config/blog/server_dev.json")
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::from_file("config/blog/server_does_not_exist.json").is_err());
    }
}
