use super::types::*;
use ir::*;

/// Anthropic's wire events already carry explicit framing (message_start,
/// content_block_start/stop), so this decode is a direct structural
/// mapping with no synthesis required.
pub fn decode_stream_event(event: AnthropicStreamEvent) -> Vec<IRStreamEvent> {
    match event {
        AnthropicStreamEvent::MessageStart { message } => vec![IRStreamEvent::MessageStart {
            id: message.id,
            model: message.model,
        }],
        AnthropicStreamEvent::ContentBlockStart { index, content_block } => vec![IRStreamEvent::ContentBlockStart {
            index,
            block: super::convert::decode_content_block(content_block),
        }],
        AnthropicStreamEvent::ContentBlockDelta { index, delta } => vec![IRStreamEvent::ContentBlockDelta {
            index,
            delta: match delta {
                AnthropicContentDelta::TextDelta { text } => IRContentDelta::Text { text },
                AnthropicContentDelta::InputJsonDelta { partial_json } => IRContentDelta::InputJson { partial_json },
                AnthropicContentDelta::ThinkingDelta { thinking } => IRContentDelta::Thinking { thinking },
                AnthropicContentDelta::SignatureDelta { signature } => IRContentDelta::Signature { signature },
            },
        }],
        AnthropicStreamEvent::ContentBlockStop { index } => vec![IRStreamEvent::ContentBlockStop { index }],
        AnthropicStreamEvent::MessageDelta { delta, usage } => vec![IRStreamEvent::MessageDelta {
            stop_reason: delta.stop_reason.map(|r| match r {
                AnthropicStopReason::EndTurn => IRStopReason::EndTurn,
                AnthropicStopReason::MaxTokens => IRStopReason::MaxTokens,
                AnthropicStopReason::StopSequence => IRStopReason::StopSequence,
                AnthropicStopReason::ToolUse => IRStopReason::ToolUse,
            }),
            usage: Some(IRUsage::new(usage.input_tokens, usage.output_tokens)),
        }],
        AnthropicStreamEvent::MessageStop => vec![IRStreamEvent::MessageStop],
        AnthropicStreamEvent::Ping => vec![IRStreamEvent::Ping],
        AnthropicStreamEvent::Error { error } => vec![IRStreamEvent::Error { message: error.message }],
    }
}

/// IR → Anthropic wire events. One IR event always becomes exactly one
/// Anthropic event; the 1:1 shape is why Anthropic was chosen as the IR's
/// stream vocabulary in the first place.
pub fn encode_stream_event(event: &IRStreamEvent) -> Option<AnthropicStreamEvent> {
    match event {
        IRStreamEvent::MessageStart { id, model } => Some(AnthropicStreamEvent::MessageStart {
            message: AnthropicStreamMessageStart {
                id: id.clone(),
                message_type: "message".into(),
                role: AnthropicRole::Assistant,
                content: vec![],
                model: model.clone(),
                usage: AnthropicUsage { input_tokens: 0, output_tokens: 0 },
            },
        }),
        IRStreamEvent::ContentBlockStart { index, block } => Some(AnthropicStreamEvent::ContentBlockStart {
            index: *index,
            content_block: super::convert::encode_content_block(block),
        }),
        IRStreamEvent::ContentBlockDelta { index, delta } => Some(AnthropicStreamEvent::ContentBlockDelta {
            index: *index,
            delta: match delta {
                IRContentDelta::Text { text } => AnthropicContentDelta::TextDelta { text: text.clone() },
                IRContentDelta::InputJson { partial_json } => AnthropicContentDelta::InputJsonDelta { partial_json: partial_json.clone() },
                IRContentDelta::Thinking { thinking } => AnthropicContentDelta::ThinkingDelta { thinking: thinking.clone() },
                IRContentDelta::Signature { signature } => AnthropicContentDelta::SignatureDelta { signature: signature.clone() },
            },
        }),
        IRStreamEvent::ContentBlockStop { index } => Some(AnthropicStreamEvent::ContentBlockStop { index: *index }),
        IRStreamEvent::MessageDelta { stop_reason, usage } => Some(AnthropicStreamEvent::MessageDelta {
            delta: AnthropicMessageDelta {
                stop_reason: stop_reason.map(|r| match r {
                    IRStopReason::EndTurn => AnthropicStopReason::EndTurn,
                    IRStopReason::MaxTokens => AnthropicStopReason::MaxTokens,
                    IRStopReason::StopSequence => AnthropicStopReason::StopSequence,
                    _ => AnthropicStopReason::ToolUse,
                }),
                stop_sequence: None,
            },
            usage: usage
                .as_ref()
                .map(|u| AnthropicUsage { input_tokens: u.input_tokens, output_tokens: u.output_tokens })
                .unwrap_or(AnthropicUsage { input_tokens: 0, output_tokens: 0 }),
        }),
        IRStreamEvent::MessageStop => Some(AnthropicStreamEvent::MessageStop),
        IRStreamEvent::Ping => Some(AnthropicStreamEvent::Ping),
        IRStreamEvent::Error { message } => Some(AnthropicStreamEvent::Error {
            error: AnthropicErrorDetails { error_type: "overloaded_error".into(), message: message.clone() },
        }),
        IRStreamEvent::Done => None,
    }
}

/// Serializes one Anthropic stream event as an SSE frame:
/// `event: <type>\ndata: <json>\n\n`.
pub fn to_sse_frame(event: &AnthropicStreamEvent) -> String {
    let event_name = match event {
        AnthropicStreamEvent::MessageStart { .. } => "message_start",
        AnthropicStreamEvent::ContentBlockStart { .. } => "content_block_start",
        AnthropicStreamEvent::ContentBlockDelta { .. } => "content_block_delta",
        AnthropicStreamEvent::ContentBlockStop { .. } => "content_block_stop",
        AnthropicStreamEvent::MessageDelta { .. } => "message_delta",
        AnthropicStreamEvent::MessageStop => "message_stop",
        AnthropicStreamEvent::Ping => "ping",
        AnthropicStreamEvent::Error { .. } => "error",
    };
    let data = serde_json::to_string(event).unwrap_or_default();
    format!("event: {event_name}\ndata: {data}\n\n")
}
