use serde::Deserialize;
use std::time::Duration;

/// The core's own tunables. Provider/model/rule data is never configuration
/// here — it comes from `ModelRepo`/`ProviderRepo`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen_address: String,
    pub request_timeout_ms: u64,
    pub default_max_retries: u32,
    pub default_retry_delay_ms: u64,
    pub kv_entry_ttl_days: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 30_000,
            default_max_retries: 3,
            default_retry_delay_ms: 200,
            kv_entry_ttl_days: 30,
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn default_retry_delay(&self) -> Duration {
        Duration::from_millis(self.default_retry_delay_ms)
    }
}
