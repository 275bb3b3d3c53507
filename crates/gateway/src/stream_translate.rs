use crate::error::GatewayError;
use ir::IRStreamEvent;
use protocol::{anthropic, openai_chat, openai_responses, ProtocolTag};
use routing::ProviderProtocol;
use serde_json::Value;

fn conv_err(err: impl std::fmt::Display) -> GatewayError {
    GatewayError::ConversionError(err.to_string())
}

/// Holds whatever per-stream state an upstream protocol's decode side
/// needs (only OpenAI chat needs one, to synthesize block framing).
pub enum UpstreamStreamDecoder {
    OpenAiChat(openai_chat::ChatStreamDecoder),
    Anthropic,
}

impl UpstreamStreamDecoder {
    pub fn new(protocol: ProviderProtocol) -> Result<Self, GatewayError> {
        match protocol {
            ProviderProtocol::OpenAi => Ok(Self::OpenAiChat(openai_chat::ChatStreamDecoder::new())),
            ProviderProtocol::Anthropic => Ok(Self::Anthropic),
            ProviderProtocol::Gemini => Err(GatewayError::ConversionError("gemini upstream is not supported".into())),
        }
    }

    pub fn decode(&mut self, event: Value) -> Result<Vec<IRStreamEvent>, GatewayError> {
        match self {
            UpstreamStreamDecoder::OpenAiChat(decoder) => {
                let chunk = serde_json::from_value(event).map_err(conv_err)?;
                Ok(decoder.decode(chunk))
            }
            UpstreamStreamDecoder::Anthropic => {
                let event = serde_json::from_value(event).map_err(conv_err)?;
                Ok(anthropic::decode_stream_event(event))
            }
        }
    }
}

/// Holds whatever per-stream state a client-facing protocol's encode side
/// needs (OpenAI chat needs tool-call index assignment; Responses and
/// Anthropic are stateless here since their wire events already carry
/// stable addressing).
pub enum ClientStreamEncoder {
    OpenAiChat { id: String, model: String, created: i64, encoder: openai_chat::ChatStreamEncoder },
    OpenAiResponses(openai_responses::ResponsesStreamEncoder),
    Anthropic,
}

impl ClientStreamEncoder {
    pub fn new(tag: ProtocolTag, id: String, model: String, created: i64) -> Self {
        match tag {
            ProtocolTag::OpenAiChat => {
                ClientStreamEncoder::OpenAiChat { id, model, created, encoder: openai_chat::ChatStreamEncoder::new() }
            }
            ProtocolTag::OpenAiResponses => ClientStreamEncoder::OpenAiResponses(openai_responses::ResponsesStreamEncoder::new()),
            ProtocolTag::Anthropic => ClientStreamEncoder::Anthropic,
        }
    }

    pub fn encode(&mut self, event: &IRStreamEvent) -> Vec<String> {
        match self {
            ClientStreamEncoder::OpenAiChat { id, model, created, encoder } => {
                encoder.encode(event, id, model, *created).iter().map(openai_chat::to_sse_frame).collect()
            }
            ClientStreamEncoder::OpenAiResponses(encoder) => encoder.encode(event).iter().map(openai_responses::to_sse_frame).collect(),
            ClientStreamEncoder::Anthropic => anthropic::encode_stream_event(event).map(|e| anthropic::to_sse_frame(&e)).into_iter().collect(),
        }
    }

    /// The literal terminator frame this client protocol expects after the
    /// last translated event (`data: [DONE]` for OpenAI; Anthropic has none
    /// since `message_stop` already serves that role).
    pub fn terminator(&self) -> Option<&'static str> {
        match self {
            ClientStreamEncoder::OpenAiChat { .. } => Some(openai_chat::DONE_FRAME),
            ClientStreamEncoder::OpenAiResponses(_) => None,
            ClientStreamEncoder::Anthropic => None,
        }
    }

    /// A protocol-appropriate mid-flight error frame, for §4.G's
    /// "post-first-chunk failure" streaming semantics.
    pub fn error_frame(&self, message: &str) -> String {
        match self {
            ClientStreamEncoder::OpenAiChat { .. } => {
                format!("data: {{\"error\":{{\"message\":{:?},\"type\":\"stream_error\"}}}}\n\n", message)
            }
            ClientStreamEncoder::OpenAiResponses(_) => {
                format!("event: response.error\ndata: {{\"error\":{{\"message\":{:?}}}}}\n\n", message)
            }
            ClientStreamEncoder::Anthropic => {
                format!("event: error\ndata: {{\"type\":\"error\",\"error\":{{\"type\":\"overloaded_error\",\"message\":{:?}}}}}\n\n", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(mut decoder: UpstreamStreamDecoder, mut encoder: ClientStreamEncoder, upstream_events: Vec<Value>) -> Vec<String> {
        let mut frames = Vec::new();
        for event in upstream_events {
            for ir_event in decoder.decode(event).unwrap() {
                frames.extend(encoder.encode(&ir_event));
            }
        }
        if let Some(terminator) = encoder.terminator() {
            frames.push(terminator.to_string());
        }
        frames
    }

    /// Scenario 2: Anthropic streaming text upstream, OpenAI chat client.
    #[test]
    fn anthropic_to_openai_chat_streams_text_deltas_then_done() {
        let decoder = UpstreamStreamDecoder::new(ProviderProtocol::Anthropic).unwrap();
        let encoder = ClientStreamEncoder::new(ProtocolTag::OpenAiChat, "chatcmpl-1".into(), "gpt-4o".into(), 0);

        let upstream = vec![
            json!({"type": "message_start", "message": {"id": "msg_1", "type": "message", "role": "assistant", "content": [], "model": "claude-sonnet", "usage": {"input_tokens": 1, "output_tokens": 0}}}),
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hi"}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "!"}}),
            json!({"type": "content_block_stop", "index": 0}),
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"input_tokens": 1, "output_tokens": 2}}),
            json!({"type": "message_stop"}),
        ];

        let frames = run(decoder, encoder, upstream);

        assert!(frames.iter().any(|f| f.contains(r#""role":"assistant"#)));
        assert!(frames.iter().any(|f| f.contains(r#""content":"Hi"#)));
        assert!(frames.iter().any(|f| f.contains(r#""content":"!"#)));
        assert!(frames.iter().any(|f| f.contains(r#""finish_reason":"stop"#)));
        assert_eq!(frames.last().unwrap(), openai_chat::DONE_FRAME);
    }

    /// Scenario 6: Anthropic tool_use stream, OpenAI chat client. Checks
    /// the announce-then-fragment shape and the forced `tool_calls` finish
    /// reason.
    #[test]
    fn anthropic_tool_use_stream_becomes_indexed_openai_deltas() {
        let decoder = UpstreamStreamDecoder::new(ProviderProtocol::Anthropic).unwrap();
        let encoder = ClientStreamEncoder::new(ProtocolTag::OpenAiChat, "chatcmpl-2".into(), "gpt-4o".into(), 0);

        let upstream = vec![
            json!({"type": "message_start", "message": {"id": "msg_2", "type": "message", "role": "assistant", "content": [], "model": "claude-sonnet", "usage": {"input_tokens": 1, "output_tokens": 0}}}),
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "tool_use", "id": "toolu_A", "name": "lookup", "input": {}}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "{"}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "\"x\":1"}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "}"}}),
            json!({"type": "content_block_stop", "index": 0}),
            json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"input_tokens": 1, "output_tokens": 3}}),
            json!({"type": "message_stop"}),
        ];

        let frames = run(decoder, encoder, upstream);

        let announce = frames.iter().find(|f| f.contains(r#""id":"toolu_A"#)).expect("announce frame");
        assert!(announce.contains(r#""index":0"#));
        assert!(announce.contains(r#""type":"function"#));

        let fragments: Vec<_> = frames.iter().filter(|f| f.contains(r#""arguments""#) && !f.contains("toolu_A")).collect();
        assert_eq!(fragments.len(), 3);

        assert!(frames.iter().any(|f| f.contains(r#""finish_reason":"tool_calls"#)));
        assert_eq!(frames.last().unwrap(), openai_chat::DONE_FRAME);
    }
}
