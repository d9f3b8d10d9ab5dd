use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    #[serde(default)]
    pub tables: TableSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub url: String,
    pub service_role_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    #[serde(default = "default_tenders_table")]
    pub tenders: String,
    #[serde(default = "default_change_logs_table")]
    pub change_logs: String,
    #[serde(default = "default_activity_logs_table")]
    pub activity_logs: String,
    #[serde(default = "default_people_table")]
    pub people: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            tenders: default_tenders_table(),
            change_logs: default_change_logs_table(),
            activity_logs: default_activity_logs_table(),
            people: default_people_table(),
        }
    }
}

fn default_tenders_table() -> String { "tenders".to_string() }
fn default_change_logs_table() -> String { "tender_change_logs".to_string() }
fn default_activity_logs_table() -> String { "tender_activity_logs".to_string() }
fn default_people_table() -> String { "people".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with TENDER_)
    /// 4. The standard SUPABASE_* variables
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., TENDER__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("TENDER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_supabase_env(settings)?.try_deserialize()
    }
}

/// Let the variables Supabase tooling already exports override the file
fn apply_supabase_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("supabase.url", "SUPABASE_URL"),
        ("supabase.service_role_key", "SUPABASE_SERVICE_ROLE_KEY"),
        ("supabase.jwt_secret", "SUPABASE_JWT_SECRET"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (key, var) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let tables = TableSettings::default();
        assert_eq!(tables.tenders, "tenders");
        assert_eq!(tables.change_logs, "tender_change_logs");
        assert_eq!(tables.activity_logs, "tender_activity_logs");
        assert_eq!(tables.people, "people");
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_minimal_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [supabase]
            url = "https://project.supabase.co"
            service_role_key = "key"
            jwt_secret = "secret"

            [tables]
            people = "staff"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.tables.people, "staff");
        assert_eq!(settings.tables.tenders, "tenders");
        assert_eq!(settings.logging.format, "json");
    }
}
