use async_trait::async_trait;
use executor::{ProviderResponse, ResponseBody};
use routing::{ModelMapping, Provider, ProviderMapping, ProxyConfig};
use serde_json::Value;
use std::collections::HashMap;

#[async_trait]
pub trait ModelRepo: Send + Sync {
    async fn get_mapping(&self, requested_model: &str) -> Option<ModelMapping>;
    async fn get_provider_mappings(&self, requested_model: &str, is_active: bool) -> Vec<ProviderMapping>;
}

#[async_trait]
pub trait ProviderRepo: Send + Sync {
    async fn get_by_id(&self, id: u64) -> Option<Provider>;
}

/// `parsed` asks the client to decode the body as JSON before returning it
/// (used for unary calls so the orchestrator can translate it); `raw` asks
/// for untouched bytes (used when the orchestrator will stream them through
/// a translator chunk by chunk instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Parsed,
    Raw,
}

#[async_trait]
pub trait SupplierClient: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn forward(
        &self,
        base_url: &str,
        api_key: &str,
        path: &str,
        method: &str,
        headers: &HashMap<String, String>,
        body: &Value,
        target_model: &str,
        response_mode: ResponseMode,
        extra_headers: &[(String, String)],
        proxy_config: Option<&ProxyConfig>,
    ) -> ProviderResponse;

    /// Streaming variant. The returned `ProviderResponse` carries the
    /// status/headers known before any body bytes. The stream yields one
    /// already-parsed JSON event per upstream SSE frame — SSE framing is
    /// the HTTP client's concern, not the orchestrator's; only called when
    /// the orchestrator has already committed to this candidate (see
    /// executor streaming semantics): a non-success `ProviderResponse`
    /// here means the connection never produced any bytes.
    #[allow(clippy::too_many_arguments)]
    async fn forward_stream(
        &self,
        base_url: &str,
        api_key: &str,
        path: &str,
        method: &str,
        headers: &HashMap<String, String>,
        body: &Value,
        target_model: &str,
        extra_headers: &[(String, String)],
        proxy_config: Option<&ProxyConfig>,
    ) -> (ProviderResponse, Option<futures::stream::BoxStream<'static, Value>>);
}

/// Minimum request-log record per §6.
#[derive(Debug, Clone)]
pub struct RequestLog {
    pub request_time: i64,
    pub api_key_id: String,
    pub requested_model: String,
    pub target_model: String,
    pub provider_id: Option<u64>,
    pub provider_name: Option<String>,
    pub retry_count: u32,
    pub matched_provider_count: usize,
    pub first_byte_delay_ms: u64,
    pub total_time_ms: u64,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub request_headers: HashMap<String, String>,
    pub request_body: Value,
    pub response_status: u16,
    pub response_body: Option<ResponseBody>,
    pub error_info: Option<String>,
    pub trace_id: String,
    pub is_stream: bool,
}

#[async_trait]
pub trait LogRepo: Send + Sync {
    async fn create(&self, log: RequestLog);
}
