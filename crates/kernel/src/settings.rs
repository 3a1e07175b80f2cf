use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use orioz_db::AppUser;
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "ORIOZ_ENV";
const CONFIG_DIR_ENV: &str = "ORIOZ_CONFIG_DIR";
const ENV_PREFIX: &str = "ORIOZ";

/// Deployment environment the bootstrap is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(name: &str) -> anyhow::Result<Self> {
        match name {
            "local" => Ok(Self::Local),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub app_user: AppUserSettings,
    #[serde(default)]
    pub admin: AdminSeedSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir)
    }

    /// Load from an explicit config directory; `ORIOZ_ENV` still selects the overlay.
    pub fn load_from(config_dir: &Path) -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        Self::load_layers(config_dir, &environment)
    }

    fn load_layers(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let parsed = Environment::parse(environment)?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_uri")]
    pub uri: String,
    /// Database that receives the user, the collections and the seed.
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
    #[serde(default = "DatabaseSettings::default_server_selection_timeout_ms")]
    pub server_selection_timeout_ms: u64,
}

impl DatabaseSettings {
    fn default_uri() -> String {
        "mongodb://localhost:27017".to_string()
    }

    fn default_name() -> String {
        "orioz-community".to_string()
    }

    fn default_server_selection_timeout_ms() -> u64 {
        3000
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.server_selection_timeout_ms)
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
            name: Self::default_name(),
            server_selection_timeout_ms: Self::default_server_selection_timeout_ms(),
        }
    }
}

/// Principal the application connects as.
#[derive(Debug, Clone, Deserialize)]
pub struct AppUserSettings {
    #[serde(default = "AppUserSettings::default_enabled")]
    pub enabled: bool,
    #[serde(default = "AppUserSettings::default_name")]
    pub name: String,
    #[serde(default = "AppUserSettings::default_password")]
    pub password: String,
    #[serde(default = "AppUserSettings::default_role")]
    pub role: String,
}

impl AppUserSettings {
    fn default_enabled() -> bool {
        true
    }

    fn default_name() -> String {
        "oriozapp".to_string()
    }

    fn default_password() -> String {
        "oriozappsecret".to_string()
    }

    fn default_role() -> String {
        "readWrite".to_string()
    }

    pub fn app_user(&self) -> AppUser {
        AppUser {
            name: self.name.clone(),
            password: self.password.clone(),
            role: self.role.clone(),
        }
    }
}

impl Default for AppUserSettings {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            name: Self::default_name(),
            password: Self::default_password(),
            role: Self::default_role(),
        }
    }
}

/// How the administrator seed is written.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Look for an ADMIN document, insert when none is found. Not atomic.
    #[default]
    CheckThenInsert,
    /// Upsert keyed by a unique email index, safe under concurrent runs.
    InsertIfAbsent,
}

/// Identity of the administrator seeded on first run.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedSettings {
    #[serde(default = "AdminSeedSettings::default_email")]
    pub email: String,
    #[serde(default = "AdminSeedSettings::default_first_name")]
    pub first_name: String,
    #[serde(default = "AdminSeedSettings::default_last_name")]
    pub last_name: String,
    /// Bcrypt hash stored as-is in the `password` field.
    #[serde(default = "AdminSeedSettings::default_password_hash")]
    pub password_hash: String,
    /// Calendar date, written as `"YYYY-MM-DD"`.
    #[serde(default = "AdminSeedSettings::default_date_of_birth")]
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub strategy: SeedStrategy,
}

impl AdminSeedSettings {
    fn default_email() -> String {
        "admin@orioz.org".to_string()
    }

    fn default_first_name() -> String {
        "Super".to_string()
    }

    fn default_last_name() -> String {
        "Admin".to_string()
    }

    fn default_password_hash() -> String {
        "$2a$10$X6KMEGgkjr6vXrg4XBZKy.CVqTwXABPZ1fyfFd1/FGXkqgW3QqL8K".to_string()
    }

    fn default_date_of_birth() -> NaiveDate {
        NaiveDate::from_ymd_opt(1980, 1, 1).unwrap_or_default()
    }
}

impl Default for AdminSeedSettings {
    fn default() -> Self {
        Self {
            email: Self::default_email(),
            first_name: Self::default_first_name(),
            last_name: Self::default_last_name(),
            password_hash: Self::default_password_hash(),
            date_of_birth: Self::default_date_of_birth(),
            strategy: SeedStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn defaults_target_the_community_database() {
        let settings = Settings::default();
        assert_eq!(settings.database.name, "orioz-community");
        assert_eq!(settings.database.uri, "mongodb://localhost:27017");
        assert_eq!(settings.database.timeout(), Duration::from_secs(3));
        assert_eq!(settings.app_user.name, "oriozapp");
        assert_eq!(settings.app_user.role, "readWrite");
        assert_eq!(settings.admin.email, "admin@orioz.org");
        assert_eq!(settings.admin.strategy, SeedStrategy::CheckThenInsert);
        assert_eq!(
            settings.admin.date_of_birth,
            NaiveDate::from_ymd_opt(1980, 1, 1).unwrap()
        );
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_layers(dir.path(), "local").unwrap();
        assert_eq!(settings.database.name, "orioz-community");
        assert!(settings.app_user.enabled);
    }

    #[test]
    fn environment_file_overrides_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.toml"),
            r#"
[database]
uri = "mongodb://mongo:27017"
name = "base-db"

[admin]
email = "root@orioz.org"
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("staging.toml"),
            r#"
[database]
name = "staging-db"

[admin]
strategy = "insert_if_absent"
date_of_birth = "1975-06-30"

[telemetry]
log_format = "json"
"#,
        )
        .unwrap();

        let settings = Settings::load_layers(dir.path(), "staging").unwrap();
        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.database.uri, "mongodb://mongo:27017");
        assert_eq!(settings.database.name, "staging-db");
        assert_eq!(settings.admin.email, "root@orioz.org");
        assert_eq!(settings.admin.strategy, SeedStrategy::InsertIfAbsent);
        assert_eq!(
            settings.admin.date_of_birth,
            NaiveDate::from_ymd_opt(1975, 6, 30).unwrap()
        );
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_layers(dir.path(), "qa").unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }

    #[test]
    fn app_user_carries_configured_role() {
        let settings = AppUserSettings {
            role: "dbOwner".to_string(),
            ..AppUserSettings::default()
        };
        let user = settings.app_user();
        assert_eq!(user.name, "oriozapp");
        assert_eq!(user.role, "dbOwner");
    }
}
