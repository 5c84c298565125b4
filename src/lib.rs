use std::path::Path;

use config::{Config, ConfigError};
use serde::Deserialize;

pub mod domain;
pub mod infrastructure;

#[derive(Clone, Debug, Deserialize)]
pub struct KaigiConfig {
    pub server: Server,
    pub storage: Storage,
    pub logger: Logger,
    pub tls: Option<Tls>,
}

impl KaigiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder(config::File::with_name("kaigi.toml").required(false))?
            .build()?
            .try_deserialize::<KaigiConfig>()
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::builder(config::File::from(path.as_ref()))?
            .build()?
            .try_deserialize::<KaigiConfig>()
    }

    fn builder(
        file: config::File<config::FileSourceFile, config::FileFormat>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.address", "0.0.0.0:8080")?
            .set_default("storage.path", "reservations.json")?
            .set_default("logger.level", "INFO")?
            .add_source(file)
            .add_source(config::Environment::with_prefix("KAIGI").separator("_")))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub address: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
    pub path: String,
}

/// HTTPS用の証明書と秘密鍵
#[derive(Clone, Debug, Deserialize)]
pub struct Tls {
    pub cert: String,
    pub key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\naddress = \"127.0.0.1:3000\"\n\n[storage]\npath = \"data/rooms.json\"\n\n[logger]\nlevel = \"DEBUG\"\n\n[tls]\ncert = \"localhost.pem\"\nkey = \"localhost.key\""
        )
        .unwrap();

        let config = KaigiConfig::load_from(file.path()).unwrap();
        assert_eq!(config.server.address, "127.0.0.1:3000");
        assert_eq!(config.storage.path, "data/rooms.json");
        assert_eq!(tracing::Level::from(&config.logger.level), tracing::Level::DEBUG);
        let tls = config.tls.unwrap();
        assert_eq!(tls.cert, "localhost.pem");
        assert_eq!(tls.key, "localhost.key");
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[storage]\npath = \"other.json\"").unwrap();

        let config = KaigiConfig::load_from(file.path()).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8080");
        assert_eq!(config.storage.path, "other.json");
        assert_eq!(tracing::Level::from(&config.logger.level), tracing::Level::INFO);
        assert!(config.tls.is_none());
    }
}
