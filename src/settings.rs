use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

const SETTINGS_FILE: &str = "Settings.toml";
const SECRETS_DIR_ENV: &str = "WEB3INSIGHTS_SECRETS_DIR";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Toml(#[from] basic_toml::Error),

    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Session secret is not configured; set SESSION_SECRET or session.session_secret")]
    MissingSessionSecret,

    #[error("Invalid URL for {field}: '{value}'")]
    InvalidUrl { field: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Web3InsightsSettings {
    pub application: ApplicationSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub strapi: StrapiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Base URL the self-API backend calls back into
    pub public_base_url: String,
    pub cors_origins: String,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub session_secret: String,
    pub session_duration_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CookieSettings {
    /// Unset means secure cookies in production only
    pub secure: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrapiSettings {
    pub api_url: String,
    /// Admin token for user-management calls
    pub api_token: Option<String>,
    pub requires_email_verification: bool,
    pub default_role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_base_url: "http://localhost:8080".to_string(),
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            session_duration_hours: 168,
        }
    }
}

impl Default for StrapiSettings {
    fn default() -> Self {
        Self {
            api_url: "https://cms.web3insights.app".to_string(),
            api_token: None,
            requires_email_verification: true,
            default_role: "authenticated".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Web3InsightsSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A settings file cannot be read or parsed
    /// - The logger is already initialized
    /// - The session secret is missing or a configured URL is invalid
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings(Path::new("."))?;
        Self::apply_env_overrides(&mut settings);

        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(settings.logging.level.as_str()),
        )
        .try_init()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Priority, highest first:
    /// 1. Environment variables (applied separately)
    /// 2. Settings.toml in `WEB3INSIGHTS_SECRETS_DIR`
    /// 3. Settings.toml in `base_dir`
    /// 4. Defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or parsed
    pub fn load_base_settings(base_dir: &Path) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        let default_config_path = base_dir.join(SETTINGS_FILE);
        if default_config_path.exists() {
            settings = basic_toml::from_str(&fs::read_to_string(&default_config_path)?)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var(SECRETS_DIR_ENV) {
            let secrets_path = Path::new(&secrets_dir).join(SETTINGS_FILE);
            if secrets_path.exists() {
                settings = basic_toml::from_str(&fs::read_to_string(&secrets_path)?)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ {SECRETS_DIR_ENV} set but no {SETTINGS_FILE} found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_strapi_env_overrides(&mut settings.strapi);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(public_base_url) = std::env::var("PUBLIC_BASE_URL") {
            app_settings.public_base_url = public_base_url;
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
        if let Ok(environment) = std::env::var("APP_ENV").or_else(|_| std::env::var("NODE_ENV")) {
            app_settings.environment = environment;
        }
    }

    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        Self::apply_numeric_env_override(
            "SESSION_DURATION_HOURS",
            &mut session_settings.session_duration_hours,
        );
        if let Ok(secret) = std::env::var("SESSION_SECRET") {
            if !secret.is_empty() {
                session_settings.session_secret = secret;
            }
        }
    }

    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    fn apply_bool_env_override(env_var: &str, target: &mut bool) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<bool>() {
                *target = value;
            }
        }
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = Some(cookie_secure);
            }
        }
    }

    fn apply_strapi_env_overrides(strapi_settings: &mut StrapiSettings) {
        if let Ok(api_url) = std::env::var("STRAPI_API_URL") {
            strapi_settings.api_url = api_url;
        }
        if let Ok(api_token) = std::env::var("STRAPI_API_TOKEN") {
            strapi_settings.api_token = Some(api_token).filter(|token| !token.is_empty());
        }
        if let Ok(default_role) = std::env::var("STRAPI_DEFAULT_ROLE") {
            strapi_settings.default_role = default_role;
        }
        Self::apply_bool_env_override(
            "REQUIRES_EMAIL_VERIFICATION",
            &mut strapi_settings.requires_email_verification,
        );
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Refuse to start without the values every flow depends on
    ///
    /// # Errors
    ///
    /// Returns an error for an empty session secret or an unparsable URL
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.session.session_secret.is_empty() {
            return Err(SettingsError::MissingSessionSecret);
        }
        Self::validate_url("strapi.api_url", &self.strapi.api_url)?;
        Self::validate_url("application.public_base_url", &self.application.public_base_url)
    }

    fn validate_url(field: &'static str, value: &str) -> Result<(), SettingsError> {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(SettingsError::InvalidUrl {
                field,
                value: value.to_string(),
            }),
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.application.environment.eq_ignore_ascii_case("production")
    }

    /// Whether the session cookie carries the `Secure` attribute
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookies.secure.unwrap_or_else(|| self.is_production())
    }

    /// Browser-facing URL that starts GitHub OAuth at the identity service
    #[must_use]
    pub fn github_auth_url(&self) -> String {
        format!(
            "{}/api/connect/github",
            self.strapi.api_url.trim_end_matches('/')
        )
    }
}
