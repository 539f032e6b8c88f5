//! Service configuration.
//!
//! Settings are layered: built-in defaults, an optional TOML file, then
//! `SSE_BRIDGE__`-prefixed environment variables.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "SSE_BRIDGE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Path announced to clients for out-of-band message delivery.
    pub message_endpoint: String,
    /// Seconds a session may stay idle before the reaper removes it.
    pub session_ttl_secs: u64,
    /// Seconds between reaper sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            message_endpoint: "/messages".to_string(),
            session_ttl_secs: 300,
            sweep_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins; empty means permissive.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub bridge: BridgeSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

impl Settings {
    /// Load settings from defaults, an optional TOML file, and the
    /// environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("server.host", ServerSettings::default().host)?
            .set_default("server.port", i64::from(ServerSettings::default().port))?
            .set_default(
                "bridge.message_endpoint",
                BridgeSettings::default().message_endpoint,
            )?
            .set_default(
                "bridge.session_ttl_secs",
                BridgeSettings::default().session_ttl_secs as i64,
            )?
            .set_default(
                "bridge.sweep_interval_secs",
                BridgeSettings::default().sweep_interval_secs as i64,
            )?;

        if let Some(path) = config_file {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let built = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("building configuration")?;

        built
            .try_deserialize()
            .context("deserializing configuration")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.bridge.message_endpoint, "/messages");
        assert_eq!(settings.bridge.session_ttl_secs, 300);
        assert!(settings.cors.allowed_origins.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[bridge]\nmessage_endpoint = \"/deliver\"\n\n[cors]\nallowed_origins = [\"http://localhost:3000\"]"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.bridge.message_endpoint, "/deliver");
        assert_eq!(
            settings.cors.allowed_origins,
            vec!["http://localhost:3000".to_string()]
        );
        // Untouched sections keep their defaults.
        assert_eq!(settings.bridge.sweep_interval_secs, 30);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = Settings::load(Some(Path::new("/nonexistent/sse-bridge.toml"))).unwrap();
        assert_eq!(settings.server.port, 8080);
    }
}
