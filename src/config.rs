use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::gateway::Replies;
use crate::session::SessionConfig;

/// Prefix for environment overrides, e.g. `VOICE_STITCH__SESSION__MAX_SECONDS=30`
const ENV_PREFIX: &str = "VOICE_STITCH";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub session: SessionSection,
    pub nats: NatsConfig,
    #[serde(default)]
    pub replies: Replies,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Largest accepted fragment upload
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-user storage; `~` is expanded
    pub root: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionSection {
    pub max_seconds: u32,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct NatsConfig {
    /// NATS bridge is disabled when unset
    pub url: Option<String>,
    pub inbound_subject: String,
    pub outbound_prefix: String,
}

impl Config {
    /// Load from `path` (extension optional, file optional) layered with the environment
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "voice-stitch")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080)?
            .set_default("service.http.max_body_bytes", 32 * 1024 * 1024)?
            .set_default("storage.root", "audio_files")?
            .set_default("session.max_seconds", 60)?
            .set_default("session.idle_timeout_secs", 300)?
            .set_default("nats.inbound_subject", "voice.inbound.>")?
            .set_default("nats.outbound_prefix", "voice.outbound")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Settings for the session pipeline
    pub fn session_config(&self) -> SessionConfig {
        let root = shellexpand::tilde(&self.storage.root).into_owned();

        SessionConfig {
            storage_root: root.into(),
            max_seconds: self.session.max_seconds,
            idle_timeout: Duration::from_secs(self.session.idle_timeout_secs),
        }
    }
}
