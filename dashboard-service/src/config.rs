use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub path: String,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    pub bind_addr: String,
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub default_interval_hours: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub directory: String,
    pub interval_hours: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub ingest: IngestConfig,
    pub api: ApiConfig,
    pub export: ExportConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| "dashboard-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_sample_config_shape_parses() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [store]
            path = "data/readings.csv"
            max_retries = 2
            retry_backoff_ms = 200

            [ingest]
            bind_addr = "127.0.0.1:8080"
            channel_capacity = 256

            [api]
            bind_addr = "127.0.0.1:8081"
            default_interval_hours = 12

            [export]
            directory = "exports"
            interval_hours = [12, 24]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.store.path, "data/readings.csv");
        assert_eq!(cfg.store.max_retries, 2);
        assert_eq!(cfg.ingest.channel_capacity, 256);
        assert_eq!(cfg.api.default_interval_hours, 12);
        assert_eq!(cfg.export.interval_hours, vec![12, 24]);
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn the_metrics_section_is_optional_but_parsed_when_present() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [store]
            path = "readings.csv"
            max_retries = 0
            retry_backoff_ms = 0

            [ingest]
            bind_addr = "127.0.0.1:8080"
            channel_capacity = 16

            [api]
            bind_addr = "127.0.0.1:8081"
            default_interval_hours = 24

            [export]
            directory = "exports"
            interval_hours = [24]

            [metrics]
            bind_addr = "127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.metrics.unwrap().bind_addr, "127.0.0.1:9000");
    }
}
