use super::types::*;
use crate::error::{CodecError, CodecResult};
use crate::options::{ANTHROPIC_DEFAULT_MAX_TOKENS, EncodeOptions, ProtocolTag};
use ir::*;

/// Anthropic → IR. A user message whose content mixes `tool_result` blocks
/// with other content is split: one IRMessage per tool_result (role
/// `tool`), plus one user message for whatever's left, matching 4.B's
/// tool-results rule.
pub fn decode_request(req: AnthropicRequest) -> CodecResult<IRRequest> {
    if req.messages.is_empty() {
        return Err(CodecError::InvalidRequest("anthropic request missing messages".into()));
    }

    let mut messages = Vec::new();
    for message in req.messages {
        let role = match message.role {
            AnthropicRole::User => IRRole::User,
            AnthropicRole::Assistant => IRRole::Assistant,
        };

        let mut remaining = Vec::new();
        for block in message.content {
            match block {
                AnthropicContent::ToolResult { tool_use_id, content, is_error } => {
                    messages.push(IRMessage::new(
                        IRRole::Tool,
                        vec![IRContentBlock::ToolResult {
                            tool_use_id,
                            content: decode_tool_result_content(content),
                            is_error,
                        }],
                    ));
                }
                other => remaining.push(decode_content_block(other)),
            }
        }

        if !remaining.is_empty() {
            messages.push(IRMessage::new(role, remaining));
        }
    }

    let tools = req
        .tools
        .unwrap_or_default()
        .into_iter()
        .map(|t| IRToolDeclaration {
            name: t.name,
            description: t.description,
            input_schema: t.input_schema,
        })
        .collect();

    Ok(IRRequest {
        model: req.model,
        messages,
        system: req.system,
        generation_config: IRGenerationConfig {
            temperature: req.temperature,
            top_p: req.top_p,
            max_tokens: Some(req.max_tokens),
            stop_sequences: req.stop_sequences,
            ..Default::default()
        },
        tools,
        tool_choice: req.tool_choice.map(decode_tool_choice),
        response_format: None,
        thinking_config: req.thinking.map(decode_thinking_config),
        stream: req.stream,
        user: req.metadata.and_then(|m| m.user_id),
        unsupported_params: Default::default(),
    })
}

fn decode_thinking_config(thinking: AnthropicThinkingConfig) -> IRThinkingConfig {
    match thinking {
        AnthropicThinkingConfig::Enabled { budget_tokens } => IRThinkingConfig { enabled: true, budget_tokens: Some(budget_tokens) },
        AnthropicThinkingConfig::Disabled => IRThinkingConfig { enabled: false, budget_tokens: None },
    }
}

pub(super) fn decode_content_block(block: AnthropicContent) -> IRContentBlock {
    match block {
        AnthropicContent::Text { text } => IRContentBlock::Text { text, citations: None },
        AnthropicContent::Image { source } => IRContentBlock::Image {
            source: IRImageSource::Base64 {
                media_type: source.media_type.clone(),
                data: source.data,
            },
            media_type: Some(source.media_type),
            detail: None,
        },
        AnthropicContent::ToolUse { id, name, input } => IRContentBlock::ToolUse {
            id,
            name,
            input,
            partial_arguments: None,
        },
        AnthropicContent::ToolResult { tool_use_id, content, is_error } => IRContentBlock::ToolResult {
            tool_use_id,
            content: decode_tool_result_content(content),
            is_error,
        },
        AnthropicContent::Thinking { thinking, signature } => {
            IRContentBlock::Thinking { thinking, signature, redacted: false, redacted_data: None }
        }
        AnthropicContent::RedactedThinking { data } => {
            IRContentBlock::Thinking { thinking: String::new(), signature: None, redacted: true, redacted_data: Some(data) }
        }
    }
}

fn decode_tool_result_content(content: AnthropicToolResultContent) -> IRToolResultContent {
    match content {
        AnthropicToolResultContent::Text(text) => IRToolResultContent::Text(text),
        AnthropicToolResultContent::Blocks(blocks) => {
            IRToolResultContent::Blocks(blocks.into_iter().map(decode_content_block).collect())
        }
    }
}

fn decode_tool_choice(choice: AnthropicToolChoice) -> IRToolChoice {
    match choice {
        AnthropicToolChoice::Auto => IRToolChoice::Auto,
        AnthropicToolChoice::Any => IRToolChoice::Required,
        AnthropicToolChoice::Tool { name } => IRToolChoice::Specific { name },
    }
}

/// IR → Anthropic. `max_tokens` is required by Anthropic; when the IR has
/// none we inject the default only if the request didn't originate from
/// Anthropic (an Anthropic-native request with no `max_tokens` is already
/// invalid and should have failed at decode time).
pub fn encode_request(req: &IRRequest, options: &EncodeOptions) -> CodecResult<AnthropicRequest> {
    let max_tokens = match req.generation_config.max_tokens {
        Some(tokens) => tokens,
        None if options.source != ProtocolTag::Anthropic => ANTHROPIC_DEFAULT_MAX_TOKENS,
        None => return Err(CodecError::Validation("anthropic target requires max_tokens".into())),
    };

    let temperature = req.generation_config.temperature.map(|t| t.clamp(0.0, 1.0));

    let mut messages = Vec::new();
    let mut pending_tool_results: Vec<AnthropicContent> = Vec::new();

    let flush_tool_results = |messages: &mut Vec<AnthropicMessage>, pending: &mut Vec<AnthropicContent>| {
        if !pending.is_empty() {
            messages.push(AnthropicMessage {
                role: AnthropicRole::User,
                content: std::mem::take(pending),
            });
        }
    };

    for message in &req.messages {
        match message.role {
            IRRole::System => continue,
            IRRole::Tool => {
                for block in &message.content {
                    if let IRContentBlock::ToolResult { tool_use_id, content, is_error } = block {
                        pending_tool_results.push(AnthropicContent::ToolResult {
                            tool_use_id: tool_use_id.clone(),
                            content: encode_tool_result_content(content),
                            is_error: *is_error,
                        });
                    }
                }
            }
            IRRole::User | IRRole::Assistant => {
                flush_tool_results(&mut messages, &mut pending_tool_results);
                let role = if message.role == IRRole::User {
                    AnthropicRole::User
                } else {
                    AnthropicRole::Assistant
                };
                messages.push(AnthropicMessage {
                    role,
                    content: message.content.iter().map(encode_content_block).collect(),
                });
            }
        }
    }
    flush_tool_results(&mut messages, &mut pending_tool_results);

    let tools = (!req.tools.is_empty()).then(|| {
        req.tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    });

    Ok(AnthropicRequest {
        model: req.model.clone(),
        messages,
        max_tokens,
        system: req.system.clone(),
        temperature,
        top_p: req.generation_config.top_p,
        stop_sequences: req.generation_config.stop_sequences.clone(),
        tools,
        tool_choice: req.tool_choice.as_ref().map(encode_tool_choice),
        stream: req.stream,
        metadata: req.user.clone().map(|user_id| AnthropicMetadata { user_id: Some(user_id) }),
        thinking: req
            .thinking_config
            .as_ref()
            .filter(|t| t.enabled)
            .map(|t| AnthropicThinkingConfig::Enabled { budget_tokens: t.budget_tokens.unwrap_or(10_000) }),
    })
}

pub(super) fn encode_content_block(block: &IRContentBlock) -> AnthropicContent {
    match block {
        IRContentBlock::Text { text, .. } => AnthropicContent::Text { text: text.clone() },
        IRContentBlock::Image { source, media_type, .. } => AnthropicContent::Image {
            source: match source {
                IRImageSource::Base64 { media_type, data } => AnthropicImageSource {
                    source_type: "base64".into(),
                    media_type: media_type.clone(),
                    data: data.clone(),
                },
                IRImageSource::Url { url } => {
                    let (media_type, data) = IRImageSource::parse_data_url(url).unwrap_or_else(|| {
                        (media_type.clone().unwrap_or_else(|| "application/octet-stream".into()), url.clone())
                    });
                    AnthropicImageSource {
                        source_type: "base64".into(),
                        media_type,
                        data,
                    }
                }
            },
        },
        IRContentBlock::ToolUse { id, name, input, .. } => AnthropicContent::ToolUse {
            id: id.clone(),
            name: name.clone(),
            input: input.clone(),
        },
        IRContentBlock::ToolResult { tool_use_id, content, is_error } => AnthropicContent::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: encode_tool_result_content(content),
            is_error: *is_error,
        },
        IRContentBlock::Thinking { thinking, signature, redacted, redacted_data } => {
            if *redacted {
                AnthropicContent::RedactedThinking { data: redacted_data.clone().unwrap_or_default() }
            } else {
                AnthropicContent::Thinking { thinking: thinking.clone(), signature: signature.clone() }
            }
        }
        IRContentBlock::Audio { .. } | IRContentBlock::Document { .. } => AnthropicContent::Text { text: String::new() },
    }
}

fn encode_tool_result_content(content: &IRToolResultContent) -> AnthropicToolResultContent {
    match content {
        IRToolResultContent::Text(text) => AnthropicToolResultContent::Text(text.clone()),
        IRToolResultContent::Blocks(blocks) => {
            AnthropicToolResultContent::Blocks(blocks.iter().map(encode_content_block).collect())
        }
    }
}

fn encode_tool_choice(choice: &IRToolChoice) -> AnthropicToolChoice {
    match choice {
        IRToolChoice::None | IRToolChoice::Auto => AnthropicToolChoice::Auto,
        IRToolChoice::Required => AnthropicToolChoice::Any,
        IRToolChoice::Specific { name } => AnthropicToolChoice::Tool { name: name.clone() },
    }
}

pub fn decode_response(resp: AnthropicResponse) -> IRResponse {
    IRResponse {
        id: resp.id,
        model: resp.model,
        content: resp.content.into_iter().map(decode_content_block).collect(),
        stop_reason: decode_stop_reason(resp.stop_reason),
        stop_sequence: resp.stop_sequence,
        usage: Some(IRUsage::new(resp.usage.input_tokens, resp.usage.output_tokens)),
        created: None,
    }
}

fn decode_stop_reason(reason: AnthropicStopReason) -> IRStopReason {
    match reason {
        AnthropicStopReason::EndTurn => IRStopReason::EndTurn,
        AnthropicStopReason::MaxTokens => IRStopReason::MaxTokens,
        AnthropicStopReason::StopSequence => IRStopReason::StopSequence,
        AnthropicStopReason::ToolUse => IRStopReason::ToolUse,
    }
}

/// IR → Anthropic response. The stop reason is recomputed from content
/// (any ToolUse block forces `tool_use`), not copied verbatim.
pub fn encode_response(resp: &IRResponse) -> AnthropicResponse {
    let stop_reason = match resp.effective_stop_reason() {
        IRStopReason::ToolUse => AnthropicStopReason::ToolUse,
        IRStopReason::MaxTokens => AnthropicStopReason::MaxTokens,
        IRStopReason::StopSequence => AnthropicStopReason::StopSequence,
        _ => AnthropicStopReason::EndTurn,
    };

    let usage = resp.usage.clone().unwrap_or_default();

    AnthropicResponse {
        id: resp.id.clone(),
        response_type: "message".into(),
        role: AnthropicRole::Assistant,
        content: resp.content.iter().map(encode_content_block).collect(),
        model: resp.model.clone(),
        stop_reason,
        stop_sequence: resp.stop_sequence.clone(),
        usage: AnthropicUsage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai_chat;

    /// Scenario 1: OpenAI chat request with a system message decodes to the
    /// IR and re-encodes as an Anthropic request with `system` split out,
    /// the system message dropped from `messages`, and the client-supplied
    /// `max_tokens` carried through untouched.
    #[test]
    fn openai_to_anthropic_unary_moves_system_out_of_messages() {
        let openai_req = openai_chat::ChatCompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![
                openai_chat::ChatMessage {
                    role: openai_chat::ChatRole::System,
                    content: Some(openai_chat::ChatContent::Text("be helpful".into())),
                    name: None,
                    tool_calls: None,
                    tool_call_id: None,
                },
                openai_chat::ChatMessage {
                    role: openai_chat::ChatRole::User,
                    content: Some(openai_chat::ChatContent::Text("hi".into())),
                    name: None,
                    tool_calls: None,
                    tool_call_id: None,
                },
            ],
            temperature: None,
            top_p: None,
            max_tokens: None,
            max_completion_tokens: Some(16),
            stop: None,
            tools: None,
            tool_choice: None,
            functions: None,
            function_call: None,
            stream: false,
            user: None,
        };

        let ir = openai_chat::decode_request(openai_req).unwrap();
        let anthropic_req = encode_request(&ir, &EncodeOptions { source: ProtocolTag::OpenAiChat }).unwrap();

        assert_eq!(anthropic_req.system.as_deref(), Some("be helpful"));
        assert_eq!(anthropic_req.messages.len(), 1);
        assert_eq!(anthropic_req.messages[0].role, AnthropicRole::User);
        assert_eq!(anthropic_req.messages[0].content, vec![AnthropicContent::Text { text: "hi".into() }]);
        assert_eq!(anthropic_req.max_tokens, 16);
    }

    #[test]
    fn encode_request_rejects_missing_max_tokens_for_anthropic_native_source() {
        let ir = IRRequest {
            model: "claude-sonnet".into(),
            messages: vec![IRMessage::text(IRRole::User, "hi")],
            system: None,
            generation_config: IRGenerationConfig::default(),
            tools: vec![],
            tool_choice: None,
            response_format: None,
            thinking_config: None,
            stream: false,
            user: None,
            unsupported_params: Default::default(),
        };

        let err = encode_request(&ir, &EncodeOptions { source: ProtocolTag::Anthropic }).unwrap_err();
        assert!(matches!(err, CodecError::Validation(_)));
    }

    #[test]
    fn encode_request_injects_default_max_tokens_for_non_anthropic_source() {
        let ir = IRRequest {
            model: "claude-sonnet".into(),
            messages: vec![IRMessage::text(IRRole::User, "hi")],
            system: None,
            generation_config: IRGenerationConfig::default(),
            tools: vec![],
            tool_choice: None,
            response_format: None,
            thinking_config: None,
            stream: false,
            user: None,
            unsupported_params: Default::default(),
        };

        let req = encode_request(&ir, &EncodeOptions { source: ProtocolTag::OpenAiChat }).unwrap();
        assert_eq!(req.max_tokens, ANTHROPIC_DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn decode_splits_tool_result_out_of_user_message() {
        let req = AnthropicRequest {
            model: "claude-sonnet".into(),
            messages: vec![AnthropicMessage {
                role: AnthropicRole::User,
                content: vec![
                    AnthropicContent::ToolResult {
                        tool_use_id: "toolu_1".into(),
                        content: AnthropicToolResultContent::Text("42".into()),
                        is_error: false,
                    },
                    AnthropicContent::Text { text: "thanks".into() },
                ],
            }],
            max_tokens: 16,
            system: None,
            temperature: None,
            top_p: None,
            stop_sequences: None,
            tools: None,
            tool_choice: None,
            stream: false,
            metadata: None,
            thinking: None,
        };

        let ir = decode_request(req).unwrap();
        assert_eq!(ir.messages.len(), 2);
        assert_eq!(ir.messages[0].role, IRRole::Tool);
        assert_eq!(ir.messages[1].role, IRRole::User);
    }

    #[test]
    fn temperature_clamps_to_zero_one_range_on_encode() {
        let ir = IRRequest {
            model: "claude-sonnet".into(),
            messages: vec![IRMessage::text(IRRole::User, "hi")],
            system: None,
            generation_config: IRGenerationConfig { temperature: Some(1.8), max_tokens: Some(16), ..Default::default() },
            tools: vec![],
            tool_choice: None,
            response_format: None,
            thinking_config: None,
            stream: false,
            user: None,
            unsupported_params: Default::default(),
        };

        let req = encode_request(&ir, &EncodeOptions { source: ProtocolTag::OpenAiChat }).unwrap();
        assert_eq!(req.temperature, Some(1.0));
    }

    #[test]
    fn decode_request_reads_enabled_thinking_config() {
        let req = AnthropicRequest {
            model: "claude-sonnet-4".into(),
            messages: vec![AnthropicMessage { role: AnthropicRole::User, content: vec![AnthropicContent::Text { text: "hi".into() }] }],
            max_tokens: 1024,
            system: None,
            temperature: None,
            top_p: None,
            stop_sequences: None,
            tools: None,
            tool_choice: None,
            stream: false,
            metadata: None,
            thinking: Some(AnthropicThinkingConfig::Enabled { budget_tokens: 4096 }),
        };

        let ir = decode_request(req).unwrap();
        let thinking = ir.thinking_config.unwrap();
        assert!(thinking.enabled);
        assert_eq!(thinking.budget_tokens, Some(4096));
    }

    /// Round trip: an Anthropic request with thinking enabled re-encodes
    /// with the same budget, and a disabled/absent config encodes no
    /// `thinking` field at all rather than an explicit `disabled`.
    #[test]
    fn encode_request_emits_thinking_only_when_enabled() {
        let mut ir = IRRequest {
            model: "claude-sonnet-4".into(),
            messages: vec![IRMessage::text(IRRole::User, "hi")],
            system: None,
            generation_config: IRGenerationConfig { max_tokens: Some(16), ..Default::default() },
            tools: vec![],
            tool_choice: None,
            response_format: None,
            thinking_config: Some(IRThinkingConfig { enabled: true, budget_tokens: Some(8192) }),
            stream: false,
            user: None,
            unsupported_params: Default::default(),
        };

        let req = encode_request(&ir, &EncodeOptions { source: ProtocolTag::Anthropic }).unwrap();
        assert_eq!(req.thinking, Some(AnthropicThinkingConfig::Enabled { budget_tokens: 8192 }));

        ir.thinking_config = None;
        let req = encode_request(&ir, &EncodeOptions { source: ProtocolTag::Anthropic }).unwrap();
        assert_eq!(req.thinking, None);
    }

    #[test]
    fn thinking_content_block_round_trips_through_ir() {
        let block = AnthropicContent::Thinking { thinking: "step one, step two".into(), signature: Some("sig_abc".into()) };
        let ir_block = decode_content_block(block.clone());
        assert_eq!(
            ir_block,
            IRContentBlock::Thinking {
                thinking: "step one, step two".into(),
                signature: Some("sig_abc".into()),
                redacted: false,
                redacted_data: None,
            }
        );
        assert_eq!(encode_content_block(&ir_block), block);
    }

    #[test]
    fn redacted_thinking_content_block_round_trips_through_ir() {
        let block = AnthropicContent::RedactedThinking { data: "opaque-blob".into() };
        let ir_block = decode_content_block(block.clone());
        assert_eq!(
            ir_block,
            IRContentBlock::Thinking { thinking: String::new(), signature: None, redacted: true, redacted_data: Some("opaque-blob".into()) }
        );
        assert_eq!(encode_content_block(&ir_block), block);
    }

    #[test]
    fn encode_response_snapshot_with_tool_use_and_text() {
        let ir = IRResponse {
            id: "msg_01abc".into(),
            model: "claude-sonnet-4-20250514".into(),
            content: vec![
                IRContentBlock::text("Let me check that."),
                IRContentBlock::ToolUse {
                    id: "toolu_1".into(),
                    name: "get_weather".into(),
                    input: serde_json::json!({"city": "Berlin"}),
                    partial_arguments: None,
                },
            ],
            stop_reason: IRStopReason::EndTurn,
            stop_sequence: None,
            usage: Some(IRUsage::new(12, 8)),
            created: None,
        };

        let response = encode_response(&ir);
        insta::assert_json_snapshot!(response, @r###"
        {
          "id": "msg_01abc",
          "type": "message",
          "role": "assistant",
          "content": [
            {
              "type": "text",
              "text": "Let me check that."
            },
            {
              "type": "tool_use",
              "id": "toolu_1",
              "name": "get_weather",
              "input": {
                "city": "Berlin"
              }
            }
          ],
          "model": "claude-sonnet-4-20250514",
          "stop_reason": "tool_use",
          "usage": {
            "input_tokens": 12,
            "output_tokens": 8
          }
        }
        "###);
    }
}
