use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    /// Batch job schedules and payment policy
    #[serde(default)]
    pub jobs: JobsConfig,
    /// PostgreSQL connection URL
    #[serde(default)]
    pub postgres_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Schedule and policy knobs for the settlement jobs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobsConfig {
    /// Finalization sweep interval (previously cron: every 10 minutes)
    pub finalize_interval_secs: u64,
    /// Daily suspension sweep hour, UTC (previously cron: 02:00 UTC)
    pub suspension_hour_utc: u32,
    /// Days until a buy-now-pay-later order falls due
    pub pay_later_due_days: i64,
    /// Minimum vendor rating required for pay-later eligibility
    pub pay_later_min_rating: f64,
    /// Shared secret for internal endpoints (job triggers, top-up credit)
    pub internal_secret: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            finalize_interval_secs: 600,
            suspension_hour_utc: 2,
            pay_later_due_days: 5,
            pay_later_min_rating: 4.5,
            internal_secret: "dev-secret".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_defaults() {
        let jobs = JobsConfig::default();
        assert_eq!(jobs.finalize_interval_secs, 600);
        assert_eq!(jobs.suspension_hour_utc, 2);
        assert_eq!(jobs.pay_later_due_days, 5);
        assert!(jobs.pay_later_min_rating > 4.0);
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
log_level: "info"
log_dir: "logs"
log_file: "ustaadcart.log"
use_json: false
rotation: "daily"
enable_tracing: true
gateway:
  host: "127.0.0.1"
  port: 8080
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gateway.port, 8080);
        // jobs section falls back to defaults
        assert_eq!(config.jobs.suspension_hour_utc, 2);
        assert!(config.postgres_url.is_none());
    }

    #[test]
    fn test_parse_jobs_override() {
        let yaml = r#"
log_level: "debug"
log_dir: "logs"
log_file: "test.log"
use_json: true
rotation: "hourly"
enable_tracing: true
gateway:
  host: "0.0.0.0"
  port: 9000
jobs:
  finalize_interval_secs: 60
  suspension_hour_utc: 3
  pay_later_due_days: 7
  pay_later_min_rating: 4.0
  internal_secret: "s3cret"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.jobs.finalize_interval_secs, 60);
        assert_eq!(config.jobs.pay_later_due_days, 7);
        assert_eq!(config.jobs.internal_secret, "s3cret");
    }
}
