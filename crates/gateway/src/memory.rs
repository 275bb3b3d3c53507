//! In-memory reference implementations of the four repository/client
//! traits, so the crate runs end to end without a database or network.
//! A real deployment swaps these out without touching the orchestrator.

use crate::traits::{LogRepo, ModelRepo, ProviderRepo, RequestLog, ResponseMode, SupplierClient};
use async_trait::async_trait;
use executor::{ProviderResponse, ResponseBody};
use futures::stream::{self, BoxStream, StreamExt};
use routing::{ModelMapping, Provider, ProviderMapping};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemoryModelRepo {
    mappings: HashMap<String, ModelMapping>,
    provider_mappings: HashMap<String, Vec<ProviderMapping>>,
}

impl InMemoryModelRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mut self, mapping: ModelMapping, provider_mappings: Vec<ProviderMapping>) -> Self {
        self.provider_mappings.insert(mapping.requested_model.clone(), provider_mappings);
        self.mappings.insert(mapping.requested_model.clone(), mapping);
        self
    }
}

#[async_trait]
impl ModelRepo for InMemoryModelRepo {
    async fn get_mapping(&self, requested_model: &str) -> Option<ModelMapping> {
        self.mappings.get(requested_model).cloned()
    }

    async fn get_provider_mappings(&self, requested_model: &str, is_active: bool) -> Vec<ProviderMapping> {
        self.provider_mappings
            .get(requested_model)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|m| !is_active || m.is_active)
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProviderRepo {
    providers: HashMap<u64, Provider>,
}

impl InMemoryProviderRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.providers.insert(provider.id, provider);
        self
    }
}

#[async_trait]
impl ProviderRepo for InMemoryProviderRepo {
    async fn get_by_id(&self, id: u64) -> Option<Provider> {
        self.providers.get(&id).cloned()
    }
}

/// Logs to the `log` crate and keeps the last entries in memory so a demo
/// binary has something to inspect; never the right choice for production,
/// where `LogRepo` belongs to a real store.
#[derive(Default)]
pub struct InMemoryLogRepo {
    entries: Mutex<Vec<RequestLog>>,
}

impl InMemoryLogRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RequestLog> {
        self.entries.lock().expect("log repo mutex poisoned").clone()
    }
}

impl Clone for RequestLog {
    fn clone(&self) -> Self {
        Self {
            request_time: self.request_time,
            api_key_id: self.api_key_id.clone(),
            requested_model: self.requested_model.clone(),
            target_model: self.target_model.clone(),
            provider_id: self.provider_id,
            provider_name: self.provider_name.clone(),
            retry_count: self.retry_count,
            matched_provider_count: self.matched_provider_count,
            first_byte_delay_ms: self.first_byte_delay_ms,
            total_time_ms: self.total_time_ms,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            request_headers: self.request_headers.clone(),
            request_body: self.request_body.clone(),
            response_status: self.response_status,
            response_body: self.response_body.clone(),
            error_info: self.error_info.clone(),
            trace_id: self.trace_id.clone(),
            is_stream: self.is_stream,
        }
    }
}

#[async_trait]
impl LogRepo for InMemoryLogRepo {
    async fn create(&self, log: RequestLog) {
        log::info!(
            "request log: model={} target_model={} status={} retry_count={} is_stream={}",
            log.requested_model,
            log.target_model,
            log.response_status,
            log.retry_count,
            log.is_stream
        );
        self.entries.lock().expect("log repo mutex poisoned").push(log);
    }
}

/// Echoes a synthetic, well-formed response in the candidate's protocol
/// instead of calling out to the network. Lets the gateway be exercised
/// end to end (routing, retries, translation, SSE framing) without real
/// provider credentials.
#[derive(Debug, Default)]
pub struct EchoSupplierClient;

impl EchoSupplierClient {
    pub fn new() -> Self {
        Self
    }

    fn synthesize_body(path: &str, model: &str) -> Value {
        if path == "/v1/messages" {
            json!({
                "id": "msg_echo",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "ok"}],
                "model": model,
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 1, "output_tokens": 1},
            })
        } else {
            json!({
                "id": "chatcmpl-echo",
                "object": "chat.completion",
                "created": 0,
                "model": model,
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "ok"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2},
            })
        }
    }
}

#[async_trait]
impl SupplierClient for EchoSupplierClient {
    async fn forward(
        &self,
        _base_url: &str,
        _api_key: &str,
        path: &str,
        _method: &str,
        _headers: &HashMap<String, String>,
        _body: &Value,
        target_model: &str,
        _response_mode: ResponseMode,
        _extra_headers: &[(String, String)],
        _proxy_config: Option<&routing::ProxyConfig>,
    ) -> ProviderResponse {
        ProviderResponse {
            status_code: 200,
            headers: HashMap::new(),
            body: Some(ResponseBody::Json(Self::synthesize_body(path, target_model))),
            error: None,
            first_byte_delay_ms: 1,
            total_time_ms: 2,
        }
    }

    async fn forward_stream(
        &self,
        _base_url: &str,
        _api_key: &str,
        path: &str,
        _method: &str,
        _headers: &HashMap<String, String>,
        _body: &Value,
        target_model: &str,
        _extra_headers: &[(String, String)],
        _proxy_config: Option<&routing::ProxyConfig>,
    ) -> (ProviderResponse, Option<BoxStream<'static, Value>>) {
        let model = target_model.to_string();
        let response = ProviderResponse {
            status_code: 200,
            headers: HashMap::new(),
            body: None,
            error: None,
            first_byte_delay_ms: 1,
            total_time_ms: 2,
        };

        let events: Vec<Value> = if path == "/v1/messages" {
            vec![
                json!({"type": "message_start", "message": {"id": "msg_echo", "type": "message", "role": "assistant", "content": [], "model": model, "usage": {"input_tokens": 1, "output_tokens": 0}}}),
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "ok"}}),
                json!({"type": "content_block_stop", "index": 0}),
                json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"input_tokens": 1, "output_tokens": 1}}),
                json!({"type": "message_stop"}),
            ]
        } else {
            vec![
                json!({"id": "chatcmpl-echo", "object": "chat.completion.chunk", "created": 0, "model": model, "choices": [{"index": 0, "delta": {"role": "assistant"}, "finish_reason": null}]}),
                json!({"id": "chatcmpl-echo", "object": "chat.completion.chunk", "created": 0, "model": model, "choices": [{"index": 0, "delta": {"content": "ok"}, "finish_reason": null}]}),
                json!({"id": "chatcmpl-echo", "object": "chat.completion.chunk", "created": 0, "model": model, "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}], "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}}),
            ]
        };

        (response, Some(stream::iter(events).boxed()))
    }
}
