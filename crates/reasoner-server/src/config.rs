//! Server configuration

use reasoner_core::EngineConfig;

/// Settings read once at startup
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Model used when a request doesn't name one
    pub model: String,

    pub engine: EngineConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            model: std::env::var("REASONER_MODEL").unwrap_or_else(|_| "llama3.2".into()),
            engine: EngineConfig::from_env()?,
        })
    }
}
