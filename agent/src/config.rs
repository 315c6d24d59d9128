use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "ADDRESS", default = "127.0.0.1:8080")]
    pub address: String,

    #[envconfig(from = "TRANSPORT", default = "http")]
    pub transport: Transport,

    #[envconfig(from = "POLL_INTERVAL", default = "2000")]
    pub poll_interval: EnvMsDuration,

    #[envconfig(from = "REPORT_INTERVAL", default = "10000")]
    pub report_interval: EnvMsDuration,

    #[envconfig(from = "RATE_LIMIT", default = "1")]
    pub rate_tokens_count: u32,

    #[envconfig(from = "KEY", default = "")]
    pub hmac_key: String,

    #[envconfig(from = "CRYPTO_KEY", default = "")]
    pub crypto_key: String,

    #[envconfig(from = "CLIENT_TIMEOUT", default = "10000")]
    pub client_timeout: EnvMsDuration,

    #[envconfig(from = "REPORT_TIMEOUT", default = "10000")]
    pub report_timeout: EnvMsDuration,

    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Grpc,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseTransportError(String);

impl FromStr for Transport {
    type Err = ParseTransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Transport::Http),
            "grpc" => Ok(Transport::Grpc),
            other => Err(ParseTransportError(other.to_owned())),
        }
    }
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
