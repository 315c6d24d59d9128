use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;
use ipnet::IpNet;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "ADDRESS", default = "127.0.0.1:8080")]
    pub address: String,

    #[envconfig(from = "GRPC_ADDRESS", default = "127.0.0.1:8081")]
    pub grpc_address: String,

    #[envconfig(from = "KEY", default = "")]
    pub hmac_key: String,

    #[envconfig(from = "CRYPTO_KEY", default = "")]
    pub crypto_key: String,

    #[envconfig(from = "RESTORE", default = "true")]
    pub restore: bool,

    #[envconfig(from = "STORE_INTERVAL", default = "300000")]
    pub store_interval: EnvMsDuration,

    #[envconfig(from = "STORE_FILE", default = "./metrics-backup.json")]
    pub store_file: String,

    #[envconfig(from = "DATABASE_DSN", default = "")]
    pub database_dsn: String,

    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    #[envconfig(from = "TRUSTED_SUBNET")]
    pub trusted_subnet: Option<IpNet>,
}

impl Config {
    pub fn backend(&self) -> RepositoryBackend {
        if self.database_dsn.is_empty() {
            RepositoryBackend::Memory
        } else {
            RepositoryBackend::Relational
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryBackend {
    Memory,
    Relational,
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;
        Ok(EnvMsDuration(Duration::from_millis(ms)))
    }
}
