use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Names the TOML file to load, if any.
pub const CONFIG_ENV: &str = "SHELFCHECK_CONFIG";
/// Overrides `bind` from the file.
pub const BIND_ENV: &str = "SHELFCHECK_BIND";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid bind address '{0}'")]
    Bind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    /// Bunyan-style JSON lines.
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Upper bound for a `/scan` request body (base64 image included).
    pub max_body_bytes: usize,
    pub log_format: LogFormat,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub lang: String,
    /// Directory holding `*.traineddata`; the engine default when unset.
    pub data_path: Option<String>,
    pub page_seg_mode: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".into(),
            max_body_bytes: 10 * 1024 * 1024,
            log_format: LogFormat::Pretty,
            ocr: OcrConfig::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self { lang: "eng".into(), data_path: None, page_seg_mode: 6 }
    }
}

impl ServerConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    /// Defaults, then the file named by `SHELFCHECK_CONFIG`, then `SHELFCHECK_BIND`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let bind = std::env::var(BIND_ENV).ok().filter(|b| !b.is_empty());
        Self::load_from(path.as_deref(), bind)
    }

    pub fn load_from(path: Option<&Path>, bind_override: Option<String>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        if let Some(bind) = bind_override {
            config.bind = bind;
        }
        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|_| ConfigError::Bind(self.bind.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        assert_eq!(ServerConfig::from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            log_format = "json"

            [ocr]
            data_path = "/usr/share/tessdata"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind, "127.0.0.1:5000");
        assert_eq!(config.ocr.data_path.as_deref(), Some("/usr/share/tessdata"));
        assert_eq!(config.ocr.lang, "eng");
        assert_eq!(config.ocr.page_seg_mode, 6);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        assert!(matches!(ServerConfig::from_toml("bind = "), Err(ConfigError::Parse(_))));
        assert!(matches!(ServerConfig::from_toml("log_format = \"xml\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_from_file_then_bind_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfcheck.toml");
        std::fs::write(&path, "bind = \"0.0.0.0:8080\"\nmax_body_bytes = 1024\n").unwrap();

        let config = ServerConfig::load_from(Some(&path), None).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.max_body_bytes, 1024);

        let config = ServerConfig::load_from(Some(&path), Some("127.0.0.1:9000".into())).unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn load_from_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load_from(Some(&dir.path().join("nope.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn socket_addr_validation() {
        let mut config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 5000);
        config.bind = "not an address".into();
        assert!(matches!(config.socket_addr(), Err(ConfigError::Bind(_))));
    }
}
