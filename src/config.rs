use serde::Deserialize;
use std::path::PathBuf;

use crate::persistence::DecodeOptions;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub codec: CodecSettings,
    /// Remote project hosting; disabled when absent.
    #[serde(default)]
    pub remote: Option<RemoteSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// SQLite file for project records; in-memory store when unset.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            database_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodecSettings {
    #[serde(default = "default_strict")]
    pub strict_numeric_fields: bool,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            strict_numeric_fields: default_strict(),
        }
    }
}

impl CodecSettings {
    pub fn decode_options(&self) -> DecodeOptions {
        if self.strict_numeric_fields {
            DecodeOptions::strict()
        } else {
            DecodeOptions::lenient()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSettings {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_base_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_strict() -> bool {
    true
}

fn default_scope() -> String {
    "https://graph.microsoft.com/.default".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Reads `config/planner.*` (optional) and `PLANNER_*` environment variables,
/// e.g. `PLANNER_STORAGE__OUTPUT_DIR`.
pub fn read_config() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/planner").required(false))
        .add_source(
            config::Environment::with_prefix("PLANNER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::NumericFieldPolicy;

    #[test]
    fn empty_sources_yield_defaults() {
        let settings: Settings = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.application.port, 3000);
        assert_eq!(settings.storage.output_dir, PathBuf::from("generated"));
        assert!(settings.storage.database_path.is_none());
        assert!(settings.remote.is_none());
        assert_eq!(
            settings.codec.decode_options().numeric_fields,
            NumericFieldPolicy::Strict
        );
    }

    #[test]
    fn remote_section_fills_optional_fields() {
        let settings: Settings = config::Config::builder()
            .set_override("remote.client_id", "id")
            .unwrap()
            .set_override("remote.client_secret", "secret")
            .unwrap()
            .set_override("remote.token_url", "http://localhost/token")
            .unwrap()
            .set_override("remote.api_base_url", "http://localhost/api")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let remote = settings.remote.unwrap();
        assert_eq!(remote.timeout_secs, 30);
        assert!(remote.scope.ends_with(".default"));
    }
}
