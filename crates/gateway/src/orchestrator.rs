use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::stream_translate::{ClientStreamEncoder, UpstreamStreamDecoder};
use crate::traits::{LogRepo, ModelRepo, ProviderRepo, RequestLog, ResponseMode, SupplierClient};
use crate::translate;
use executor::ProviderResponse;
use futures::stream::{BoxStream, StreamExt};
use ir::IRRequest;
use protocol::ProtocolTag;
use routing::{CandidateProvider, Provider, RuleContext, RuleEngine, SelectionExtras, Strategy};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Redacts sensitive header values before they land in a request log.
fn redact_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| {
            let redacted = matches!(key.to_ascii_lowercase().as_str(), "authorization" | "x-api-key" | "cookie");
            (key.clone(), if redacted { "[redacted]".to_string() } else { value.clone() })
        })
        .collect()
}

pub struct Orchestrator {
    model_repo: Arc<dyn ModelRepo>,
    provider_repo: Arc<dyn ProviderRepo>,
    log_repo: Arc<dyn LogRepo>,
    supplier: Arc<dyn SupplierClient>,
    config: GatewayConfig,
    /// One long-lived strategy per requested model, so a `RoundRobinStrategy`'s
    /// atomic counters survive across requests instead of resetting on every
    /// dispatch — required for round-robin fairness to hold over a run of
    /// requests, not just within one request's own failover loop.
    strategies: Mutex<HashMap<String, Arc<dyn Strategy>>>,
}

impl Orchestrator {
    pub fn new(
        model_repo: Arc<dyn ModelRepo>,
        provider_repo: Arc<dyn ProviderRepo>,
        log_repo: Arc<dyn LogRepo>,
        supplier: Arc<dyn SupplierClient>,
        config: GatewayConfig,
    ) -> Self {
        Self { model_repo, provider_repo, log_repo, supplier, config, strategies: Mutex::new(HashMap::new()) }
    }

    fn strategy_for_model(&self, model: &str, selection: routing::SelectionStrategy) -> Arc<dyn Strategy> {
        let mut strategies = self.strategies.lock().unwrap();
        strategies.entry(model.to_string()).or_insert_with(|| Arc::from(routing::strategy_for(selection))).clone()
    }

    async fn resolve_candidates(
        &self,
        model: &str,
        raw_body: &Value,
        input_tokens: u32,
    ) -> Result<(Vec<CandidateProvider>, routing::SelectionStrategy), GatewayError> {
        let mapping = self.model_repo.get_mapping(model).await.filter(|m| m.is_active).ok_or(GatewayError::ModelNotFound)?;
        let provider_mappings = self.model_repo.get_provider_mappings(model, true).await;

        let mut providers: HashMap<u64, Provider> = HashMap::new();
        for provider_mapping in &provider_mappings {
            if let std::collections::hash_map::Entry::Vacant(slot) = providers.entry(provider_mapping.provider_id) {
                if let Some(provider) = self.provider_repo.get_by_id(provider_mapping.provider_id).await {
                    slot.insert(provider);
                }
            }
        }

        let mut ctx = RuleContext::new(model, raw_body.clone());
        ctx.input_tokens = Some(input_tokens as u64);

        let engine = RuleEngine::default();
        let candidates = engine.evaluate(&mapping, &provider_mappings, &providers, &ctx);
        if candidates.is_empty() {
            return Err(GatewayError::NoAvailableProvider);
        }
        Ok((candidates, mapping.strategy))
    }

    fn extract_model(raw_body: &Value) -> Result<String, GatewayError> {
        raw_body
            .get("model")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::ClientValidation("missing model field".into()))
    }

    async fn forward_unary(
        &self,
        tag: ProtocolTag,
        candidate: &CandidateProvider,
        ir_request: &IRRequest,
        client_headers: &HashMap<String, String>,
    ) -> ProviderResponse {
        let body = match translate::encode_upstream_request(candidate.protocol, ir_request, tag, &candidate.target_model) {
            Ok(body) => body,
            Err(err) => return ProviderResponse::synthetic(502, err.client_message()),
        };
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), format!("Bearer {}", candidate.api_key));
        if candidate.protocol == routing::ProviderProtocol::Anthropic {
            if let Some(version) = client_headers.get("anthropic-version") {
                headers.insert("anthropic-version".to_string(), version.clone());
            }
        }
        for (key, value) in &candidate.extra_headers {
            headers.insert(key.clone(), value.clone());
        }
        let path = translate::upstream_path(candidate.protocol);
        self.supplier
            .forward(
                &candidate.base_url,
                &candidate.api_key,
                path,
                "POST",
                &headers,
                &body,
                &candidate.target_model,
                ResponseMode::Parsed,
                &candidate.extra_headers,
                candidate.proxy_config.as_ref(),
            )
            .await
    }

    /// Drives one unary request end to end: decode, route, select, forward
    /// with retry/failover, translate the response back, log.
    pub async fn handle_unary(
        &self,
        tag: ProtocolTag,
        api_key_id: &str,
        raw_body: Value,
        client_headers: HashMap<String, String>,
    ) -> Result<(u16, Value), GatewayError> {
        let model = Self::extract_model(&raw_body)?;
        let ir_request = translate::decode_client_request(tag, raw_body.clone())?;
        let input_tokens: u32 = ir_request.messages.iter().map(|m| protocol::approximate_token_count(&m.text_content())).sum();
        let redacted_headers = redact_headers(&client_headers);

        let (candidates, strategy_kind) = self.resolve_candidates(&model, &raw_body, input_tokens).await?;
        let strategy = self.strategy_for_model(&model, strategy_kind);
        let extras = SelectionExtras { input_tokens: Some(input_tokens as u64), image_count: 0 };
        let matched_provider_count = candidates.len();

        let execution = executor::execute(
            &candidates,
            &model,
            strategy.as_ref(),
            extras,
            self.config.default_max_retries,
            self.config.default_retry_delay(),
            |candidate| async move { self.forward_unary(tag, candidate, &ir_request, &client_headers).await },
        )
        .await;

        let (candidate, response, stats) = match execution {
            Ok(triple) => triple,
            Err(err) => {
                self.log_repo
                    .create(RequestLog {
                        request_time: 0,
                        api_key_id: api_key_id.to_string(),
                        requested_model: model.clone(),
                        target_model: model.clone(),
                        provider_id: None,
                        provider_name: None,
                        retry_count: 0,
                        matched_provider_count,
                        first_byte_delay_ms: 0,
                        total_time_ms: 0,
                        input_tokens,
                        output_tokens: 0,
                        request_headers: redacted_headers.clone(),
                        request_body: raw_body,
                        response_status: err.status_code(),
                        response_body: None,
                        error_info: Some(err.client_message()),
                        trace_id: uuid::Uuid::new_v4().to_string(),
                        is_stream: false,
                    })
                    .await;
                return Err(GatewayError::AllProvidersFailed(err));
            }
        };

        let upstream_value = match &response.body {
            Some(executor::ResponseBody::Json(value)) => value.clone(),
            _ => Value::Null,
        };
        let ir_response = translate::decode_upstream_response(candidate.protocol, upstream_value)?;
        let client_body = translate::encode_client_response(tag, &ir_response)?;
        let output_tokens = ir_response.usage.as_ref().map(|u| u.output_tokens).unwrap_or(0);

        self.log_repo
            .create(RequestLog {
                request_time: 0,
                api_key_id: api_key_id.to_string(),
                requested_model: model.clone(),
                target_model: candidate.target_model.clone(),
                provider_id: Some(candidate.provider_id),
                provider_name: Some(candidate.provider_name.clone()),
                retry_count: stats.retry_count,
                matched_provider_count: stats.matched_provider_count,
                first_byte_delay_ms: response.first_byte_delay_ms,
                total_time_ms: response.total_time_ms,
                input_tokens,
                output_tokens,
                request_headers: redacted_headers.clone(),
                request_body: raw_body,
                response_status: response.status_code,
                response_body: response.body.clone(),
                error_info: None,
                trace_id: uuid::Uuid::new_v4().to_string(),
                is_stream: false,
            })
            .await;

        Ok((response.status_code, client_body))
    }

    /// Drives one streaming request. Returns the status code to respond
    /// with and a stream of already-framed SSE byte lines; errors after
    /// the first chunk are not retried, per executor streaming semantics —
    /// they are rendered as a protocol-appropriate error frame instead.
    pub async fn handle_stream(
        &self,
        tag: ProtocolTag,
        api_key_id: &str,
        raw_body: Value,
        client_headers: HashMap<String, String>,
    ) -> Result<(u16, BoxStream<'static, Vec<u8>>), GatewayError> {
        let model = Self::extract_model(&raw_body)?;
        let ir_request = translate::decode_client_request(tag, raw_body.clone())?;
        let input_tokens: u32 = ir_request.messages.iter().map(|m| protocol::approximate_token_count(&m.text_content())).sum();
        let redacted_headers = redact_headers(&client_headers);

        let (candidates, strategy_kind) = self.resolve_candidates(&model, &raw_body, input_tokens).await?;
        let strategy = self.strategy_for_model(&model, strategy_kind);
        let extras = SelectionExtras { input_tokens: Some(input_tokens as u64), image_count: 0 };

        let execution = executor::execute_stream(
            &candidates,
            &model,
            strategy.as_ref(),
            extras,
            self.config.default_max_retries,
            self.config.default_retry_delay(),
            |candidate| {
                let ir_request = &ir_request;
                let client_headers = &client_headers;
                async move {
                    let body = match translate::encode_upstream_request(candidate.protocol, ir_request, tag, &candidate.target_model) {
                        Ok(body) => body,
                        Err(err) => return (ProviderResponse::synthetic(502, err.client_message()), None),
                    };
                    let mut headers = HashMap::new();
                    headers.insert("authorization".to_string(), format!("Bearer {}", candidate.api_key));
                    if candidate.protocol == routing::ProviderProtocol::Anthropic {
                        if let Some(version) = client_headers.get("anthropic-version") {
                            headers.insert("anthropic-version".to_string(), version.clone());
                        }
                    }
                    for (key, value) in &candidate.extra_headers {
                        headers.insert(key.clone(), value.clone());
                    }
                    let path = translate::upstream_path(candidate.protocol);
                    let (response, upstream_stream) = self
                        .supplier
                        .forward_stream(
                            &candidate.base_url,
                            &candidate.api_key,
                            path,
                            "POST",
                            &headers,
                            &body,
                            &candidate.target_model,
                            &candidate.extra_headers,
                            candidate.proxy_config.as_ref(),
                        )
                        .await;
                    (response, upstream_stream)
                }
            },
        )
        .await;

        let (candidate, response, upstream_stream, stats) = match execution {
            Ok(quad) => quad,
            Err(err) => {
                self.log_repo
                    .create(RequestLog {
                        request_time: 0,
                        api_key_id: api_key_id.to_string(),
                        requested_model: model.clone(),
                        target_model: model.clone(),
                        provider_id: None,
                        provider_name: None,
                        retry_count: 0,
                        matched_provider_count: candidates.len(),
                        first_byte_delay_ms: 0,
                        total_time_ms: 0,
                        input_tokens,
                        output_tokens: 0,
                        request_headers: redacted_headers.clone(),
                        request_body: raw_body,
                        response_status: err.status_code(),
                        response_body: None,
                        error_info: Some(err.client_message()),
                        trace_id: uuid::Uuid::new_v4().to_string(),
                        is_stream: true,
                    })
                    .await;
                return Err(GatewayError::AllProvidersFailed(err));
            }
        };

        let mut upstream_decoder = UpstreamStreamDecoder::new(candidate.protocol)?;
        let mut client_encoder = ClientStreamEncoder::new(tag, uuid::Uuid::new_v4().to_string(), candidate.target_model.clone(), 0);
        let log_repo = self.log_repo.clone();
        let api_key_id = api_key_id.to_string();
        let requested_model = model.clone();
        let target_model = candidate.target_model.clone();
        let provider_id = candidate.provider_id;
        let provider_name = candidate.provider_name.clone();
        let retry_count = stats.retry_count;
        let matched_provider_count = stats.matched_provider_count;
        let first_byte_delay_ms = response.first_byte_delay_ms;
        let status_code = response.status_code;

        let mut accumulated_text = String::new();
        let mut accumulated_output_tokens: Option<u32> = None;

        // The frame-forwarding and log-write work runs on its own task rather
        // than inline in the body stream: axum drops the stream future the
        // moment a client disconnects, and without this the `log_repo.create`
        // call below would never run, silently losing the request log row.
        // Forwarding over an unbounded channel instead lets this task run to
        // completion regardless of whether anything is still receiving.
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Vec<u8>>();

        tokio::spawn(async move {
            let mut events = upstream_stream;
            let mut errored = false;
            let mut client_disconnected = false;

            while let Some(event) = events.next().await {
                match upstream_decoder.decode(event) {
                    Ok(ir_events) => {
                        for ir_event in &ir_events {
                            if let ir::IRStreamEvent::ContentBlockDelta { delta: ir::IRContentDelta::Text { text }, .. } = ir_event {
                                accumulated_text.push_str(text);
                            }
                            if let ir::IRStreamEvent::MessageDelta { usage: Some(usage), .. } = ir_event {
                                accumulated_output_tokens = Some(usage.output_tokens);
                            }
                            for frame in client_encoder.encode(ir_event) {
                                if tx.send(frame.into_bytes()).is_err() {
                                    client_disconnected = true;
                                }
                            }
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(client_encoder.error_frame(&err.client_message()).into_bytes());
                        errored = true;
                        break;
                    }
                }

                if client_disconnected {
                    break;
                }
            }

            if !errored && !client_disconnected {
                if let Some(terminator) = client_encoder.terminator() {
                    let _ = tx.send(terminator.as_bytes().to_vec());
                }
            }

            let output_tokens = accumulated_output_tokens.unwrap_or_else(|| protocol::approximate_token_count(&accumulated_text));
            let error_info = if client_disconnected {
                Some(GatewayError::ClientDisconnected.client_message())
            } else if errored {
                Some("stream_mid_flight_error".to_string())
            } else {
                None
            };

            log_repo
                .create(RequestLog {
                    request_time: 0,
                    api_key_id,
                    requested_model,
                    target_model,
                    provider_id: Some(provider_id),
                    provider_name: Some(provider_name),
                    retry_count,
                    matched_provider_count,
                    first_byte_delay_ms,
                    total_time_ms: 0,
                    input_tokens,
                    output_tokens,
                    request_headers: redacted_headers.clone(),
                    request_body: Value::Null,
                    response_status: status_code,
                    response_body: None,
                    error_info,
                    trace_id: uuid::Uuid::new_v4().to_string(),
                    is_stream: true,
                })
                .await;
        });

        let body_stream = UnboundedReceiverStream::new(rx).boxed();

        Ok((status_code, body_stream))
    }
}
