use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub nutrition: NutritionConfig,

    pub data: DataConfig,

    pub scheduler: SchedulerConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Emit log lines as JSON objects instead of the human readable format.
    pub json_logs: bool,

    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/fittrack.db".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Mark the session cookie `Secure`. Disable only for plain-http development.
    pub secure_cookies: bool,

    /// Minutes of inactivity after which a session expires.
    pub session_idle_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            secure_cookies: true,
            session_idle_minutes: 60,
        }
    }
}

/// Connection settings for the external food/nutrition microservice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionConfig {
    pub base_url: String,

    pub timeout_seconds: u64,

    /// Retry a request once after a transport error or a 5xx response.
    pub retry: bool,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            timeout_seconds: 10,
            retry: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Seed the demo accounts and their history on startup.
    pub initialize: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { initialize: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Six-field cron expression (with seconds) for the daily log retention job.
    pub cleanup_cron: String,

    pub cache_flush_cron: String,

    pub retention_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cleanup_cron: "0 0 2 * * *".to_string(),
            cache_flush_cron: "0 0 * * * *".to_string(),
            retention_days: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub min_password_length: usize,

    /// Argon2 memory cost in KiB.
    pub argon2_memory_cost_kib: u32,

    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "fittrack".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        let config = Self::default();
        let path = Self::default_config_path();
        if let Err(e) = config.save_to_path(&path) {
            warn!("No config file found and defaults could not be written: {e}");
        } else {
            info!("No config file found, wrote defaults to {}", path.display());
        }
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        if let Ok(explicit) = std::env::var("FITTRACK_CONFIG") {
            paths.push(PathBuf::from(explicit));
        }

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fittrack").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        let base_url = url::Url::parse(&self.nutrition.base_url)
            .with_context(|| format!("Invalid nutrition base_url: {}", self.nutrition.base_url))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("Nutrition base_url must use http or https");
        }

        if self.nutrition.timeout_seconds == 0 {
            anyhow::bail!("Nutrition timeout must be > 0");
        }

        if self.scheduler.enabled {
            if self.scheduler.cleanup_cron.trim().is_empty()
                || self.scheduler.cache_flush_cron.trim().is_empty()
            {
                anyhow::bail!("Scheduler cron expressions cannot be empty when enabled");
            }
            if self.scheduler.retention_days == 0 {
                anyhow::bail!("Retention must keep at least one day of logs");
            }
        }

        if self.security.min_password_length == 0 {
            anyhow::bail!("Minimum password length must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.nutrition.base_url, "http://localhost:8081");
        assert!(config.data.initialize);
        assert_eq!(config.scheduler.retention_days, 90);
        assert_eq!(config.scheduler.cleanup_cron, "0 0 2 * * *");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[nutrition]"));
        assert!(toml_str.contains("[scheduler]"));
        assert!(toml_str.contains("[data]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [nutrition]
            base_url = "http://foods.internal:9000"

            [data]
            initialize = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.nutrition.base_url, "http://foods.internal:9000");
        assert!(!config.data.initialize);

        assert_eq!(config.nutrition.timeout_seconds, 10);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.nutrition.base_url = "ftp://foods".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.retention_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.enabled = false;
        config.scheduler.retention_days = 0;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.nutrition.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
