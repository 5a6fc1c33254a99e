use serde::Deserialize;
use staylane_booking::RefundPolicy;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub policy: RefundPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Config {
    /// Layered load: `config/default`, then an optional `config/{RUN_MODE}`
    /// file, then an optional `config/local` override, then `STAYLANE__`
    /// environment variables (e.g. `STAYLANE__SERVER__PORT=8080`).
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("STAYLANE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
