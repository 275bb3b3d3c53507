use serde_json::Value;
use std::collections::HashMap;

/// Either a parsed JSON body or an opaque byte blob, depending on the
/// `response_mode` the supplier client was asked to forward with.
#[derive(Debug, Clone)]
pub enum ResponseBody {
    Json(Value),
    Raw(Vec<u8>),
}

/// What a `SupplierClient` returns for one upstream call. Mirrors §6's
/// `ProviderResponse` record exactly.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<ResponseBody>,
    pub error: Option<String>,
    pub first_byte_delay_ms: u64,
    pub total_time_ms: u64,
}

impl ProviderResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code >= 500
    }

    pub fn synthetic(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: None,
            error: Some(message.into()),
            first_byte_delay_ms: 0,
            total_time_ms: 0,
        }
    }
}

/// Bookkeeping returned alongside a successful or exhausted execution, for
/// the orchestrator's request log record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionStats {
    pub retry_count: u32,
    pub matched_provider_count: usize,
}
