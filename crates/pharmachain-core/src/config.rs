use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const ENV_PREFIX: &str = "PHARMACHAIN_";
/// Env var naming the config file when no explicit path is given.
pub const CONFIG_PATH_ENV: &str = "PHARMACHAIN_CONFIG";

/// Top-level config (pharmachain.toml + PHARMACHAIN_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PharmaConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Remote prescription store and ledger verification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL without trailing slash, e.g. `https://api.example/api`.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Optional bearer token forwarded on every request.
    /// Override with env var: PHARMACHAIN_API__TOKEN=...
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public origin used when building share links for QR codes.
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

/// How the console notifier answers a permission request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionMode {
    /// Ask the user on stdin the first time a schedule starts.
    #[default]
    Prompt,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    #[serde(default)]
    pub permission: PermissionMode,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}
fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

impl PharmaConfig {
    /// Load config from a TOML file with PHARMACHAIN_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. PHARMACHAIN_CONFIG env var
    ///   3. ~/.pharmachain/pharmachain.toml
    ///
    /// Nested keys use a double underscore: `PHARMACHAIN_API__BASE_URL`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = resolve_config_path(config_path, std::env::var(CONFIG_PATH_ENV).ok());

        Self::from_figment(
            Figment::new()
                .merge(Toml::file(&path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Extract from an already assembled figment (used by `load` and tests).
    pub fn from_figment(figment: Figment) -> crate::error::Result<Self> {
        figment
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))
    }
}

fn resolve_config_path(explicit: Option<&str>, from_env: Option<String>) -> String {
    explicit
        .map(String::from)
        .or(from_env.filter(|p| !p.is_empty()))
        .unwrap_or_else(default_config_path)
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.pharmachain/pharmachain.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_figment_gives_defaults() {
        let config = PharmaConfig::from_figment(Figment::new()).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert!(config.api.token.is_none());
        assert_eq!(config.app.origin, DEFAULT_ORIGIN);
        assert_eq!(config.notify.permission, PermissionMode::Prompt);
    }

    #[test]
    fn toml_overrides_sections() {
        let toml = r#"
            [api]
            base_url = "https://rx.example/api"
            token = "secret"

            [notify]
            permission = "denied"
        "#;
        let config = PharmaConfig::from_figment(Figment::new().merge(Toml::string(toml))).unwrap();
        assert_eq!(config.api.base_url, "https://rx.example/api");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.notify.permission, PermissionMode::Denied);
        assert_eq!(config.app.origin, DEFAULT_ORIGIN);
    }

    #[test]
    fn unknown_permission_mode_is_a_config_error() {
        let toml = "[notify]\npermission = \"maybe\"";
        let err = PharmaConfig::from_figment(Figment::new().merge(Toml::string(toml))).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn config_path_precedence() {
        let env = Some("/etc/pharmachain.toml".to_string());
        assert_eq!(resolve_config_path(Some("./local.toml"), env.clone()), "./local.toml");
        assert_eq!(resolve_config_path(None, env), "/etc/pharmachain.toml");
        assert!(resolve_config_path(None, Some(String::new()))
            .ends_with("/.pharmachain/pharmachain.toml"));
        assert!(resolve_config_path(None, None).ends_with("/.pharmachain/pharmachain.toml"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = PharmaConfig::load(Some("/nonexistent/pharmachain.toml")).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
    }
}
