use super::types::*;
use crate::error::CodecResult;
use crate::tokens::approximate_token_count;
use ir::*;

/// Folds the legacy `functions`/`function_call` fields into `tools`/
/// `tool_choice` before any other decoding happens, so the rest of this
/// module never has to think about the pre-2023 function-calling shape.
fn normalize_legacy_functions(mut req: ChatCompletionRequest) -> ChatCompletionRequest {
    if let Some(functions) = req.functions.take() {
        let mut tools = req.tools.unwrap_or_default();
        tools.extend(functions.into_iter().map(|f| Tool { kind: "function".into(), function: f }));
        req.tools = Some(tools);
    }
    if let Some(function_call) = req.function_call.take() {
        req.tool_choice = Some(match function_call {
            LegacyFunctionCall::Mode(mode) => ToolChoice::Mode(mode),
            LegacyFunctionCall::Named { name } => ToolChoice::Specific { function: FunctionChoice { name } },
        });
    }
    req
}

pub fn decode_request(req: ChatCompletionRequest) -> CodecResult<IRRequest> {
    let req = normalize_legacy_functions(req);

    let mut system_parts = Vec::new();
    let mut messages = Vec::new();

    for message in req.messages {
        match message.role {
            ChatRole::System => {
                if let Some(text) = content_to_text(&message.content) {
                    system_parts.push(text);
                }
            }
            ChatRole::Tool => {
                let tool_use_id = message.tool_call_id.unwrap_or_default();
                let text = content_to_text(&message.content).unwrap_or_default();
                messages.push(IRMessage::new(
                    IRRole::Tool,
                    vec![IRContentBlock::ToolResult {
                        tool_use_id,
                        content: IRToolResultContent::Text(text),
                        is_error: false,
                    }],
                ));
            }
            ChatRole::User | ChatRole::Assistant => {
                let role = if message.role == ChatRole::User { IRRole::User } else { IRRole::Assistant };
                let mut content = decode_content(message.content);
                for tool_call in message.tool_calls.unwrap_or_default() {
                    content.push(IRContentBlock::ToolUse {
                        id: tool_call.id,
                        name: tool_call.function.name,
                        input: serde_json::from_str(&tool_call.function.arguments).unwrap_or(serde_json::Value::Null),
                        partial_arguments: None,
                    });
                }
                if !content.is_empty() {
                    messages.push(IRMessage { role, content, name: message.name });
                }
            }
        }
    }

    let tools = req
        .tools
        .unwrap_or_default()
        .into_iter()
        .map(|t| IRToolDeclaration {
            name: t.function.name,
            description: t.function.description,
            input_schema: t.function.parameters,
        })
        .collect();

    Ok(IRRequest {
        model: req.model,
        messages,
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n")),
        generation_config: IRGenerationConfig {
            temperature: req.temperature,
            top_p: req.top_p,
            max_tokens: req.max_completion_tokens.or(req.max_tokens),
            stop_sequences: req.stop,
            ..Default::default()
        },
        tools,
        tool_choice: req.tool_choice.map(decode_tool_choice),
        response_format: None,
        thinking_config: None,
        stream: req.stream,
        user: req.user,
        unsupported_params: Default::default(),
    })
}

fn content_to_text(content: &Option<ChatContent>) -> Option<String> {
    match content {
        Some(ChatContent::Text(text)) => Some(text.clone()),
        Some(ChatContent::Parts(parts)) => {
            let text: String = parts
                .iter()
                .filter_map(|p| match p {
                    ChatContentPart::Text { text } => Some(text.as_str()),
                    ChatContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("");
            (!text.is_empty()).then_some(text)
        }
        None => None,
    }
}

fn decode_content(content: Option<ChatContent>) -> Vec<IRContentBlock> {
    match content {
        None => vec![],
        Some(ChatContent::Text(text)) => vec![IRContentBlock::Text { text, citations: None }],
        Some(ChatContent::Parts(parts)) => parts
            .into_iter()
            .map(|part| match part {
                ChatContentPart::Text { text } => IRContentBlock::Text { text, citations: None },
                ChatContentPart::ImageUrl { image_url } => IRContentBlock::Image {
                    source: IRImageSource::parse_data_url(&image_url.url)
                        .map(|(media_type, data)| IRImageSource::Base64 { media_type, data })
                        .unwrap_or(IRImageSource::Url { url: image_url.url }),
                    media_type: None,
                    detail: image_url.detail,
                },
            })
            .collect(),
    }
}

fn decode_tool_choice(choice: ToolChoice) -> IRToolChoice {
    match choice {
        ToolChoice::Mode(mode) if mode == "none" => IRToolChoice::None,
        ToolChoice::Mode(mode) if mode == "required" => IRToolChoice::Required,
        ToolChoice::Mode(_) => IRToolChoice::Auto,
        ToolChoice::Specific { function } => IRToolChoice::Specific { name: function.name },
    }
}

/// IR → OpenAI chat. System content, user/assistant turns, and tool
/// results are emitted in their original wire shape; tool_use blocks on
/// an assistant message collapse into that message's `tool_calls` array
/// rather than separate messages, since OpenAI chat has no content-block
/// addressing for tool calls.
pub fn encode_request(req: &IRRequest) -> CodecResult<ChatCompletionRequest> {
    let mut messages = Vec::new();

    if let Some(system) = &req.system {
        messages.push(ChatMessage {
            role: ChatRole::System,
            content: Some(ChatContent::Text(system.clone())),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        });
    }

    for message in &req.messages {
        match message.role {
            IRRole::System => {}
            IRRole::Tool => {
                for block in &message.content {
                    if let IRContentBlock::ToolResult { tool_use_id, content, .. } = block {
                        messages.push(ChatMessage {
                            role: ChatRole::Tool,
                            content: Some(ChatContent::Text(flatten_tool_result(content))),
                            name: None,
                            tool_calls: None,
                            tool_call_id: Some(tool_use_id.clone()),
                        });
                    }
                }
            }
            IRRole::User | IRRole::Assistant => {
                let role = if message.role == IRRole::User { ChatRole::User } else { ChatRole::Assistant };
                let mut parts = Vec::new();
                let mut tool_calls = Vec::new();
                for block in &message.content {
                    match block {
                        IRContentBlock::Text { text, .. } => parts.push(ChatContentPart::Text { text: text.clone() }),
                        IRContentBlock::Image { source, .. } => parts.push(ChatContentPart::ImageUrl {
                            image_url: ChatImageUrl { url: image_source_to_url(source), detail: None },
                        }),
                        IRContentBlock::ToolUse { id, name, input, .. } => tool_calls.push(ToolCall {
                            id: id.clone(),
                            kind: "function".into(),
                            function: FunctionCall { name: name.clone(), arguments: input.to_string() },
                        }),
                        _ => {}
                    }
                }
                let content = collapse_parts(parts);
                messages.push(ChatMessage {
                    role,
                    content,
                    name: message.name.clone(),
                    tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                    tool_call_id: None,
                });
            }
        }
    }

    let tools = (!req.tools.is_empty()).then(|| {
        req.tools
            .iter()
            .map(|t| Tool {
                kind: "function".into(),
                function: FunctionDefinition {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect()
    });

    Ok(ChatCompletionRequest {
        model: req.model.clone(),
        messages,
        temperature: req.generation_config.temperature,
        top_p: req.generation_config.top_p,
        max_tokens: None,
        max_completion_tokens: req.generation_config.max_tokens,
        stop: req.generation_config.stop_sequences.clone(),
        tools,
        tool_choice: req.tool_choice.as_ref().map(encode_tool_choice),
        functions: None,
        function_call: None,
        stream: req.stream,
        user: req.user.clone(),
    })
}

fn flatten_tool_result(content: &IRToolResultContent) -> String {
    content.flatten()
}

fn image_source_to_url(source: &IRImageSource) -> String {
    match source {
        IRImageSource::Url { url } => url.clone(),
        IRImageSource::Base64 { media_type, data } => format!("data:{media_type};base64,{data}"),
    }
}

fn collapse_parts(parts: Vec<ChatContentPart>) -> Option<ChatContent> {
    if parts.is_empty() {
        return None;
    }
    if let [ChatContentPart::Text { text }] = parts.as_slice() {
        return Some(ChatContent::Text(text.clone()));
    }
    Some(ChatContent::Parts(parts))
}

fn encode_tool_choice(choice: &IRToolChoice) -> ToolChoice {
    match choice {
        IRToolChoice::None => ToolChoice::Mode("none".into()),
        IRToolChoice::Auto => ToolChoice::Mode("auto".into()),
        IRToolChoice::Required => ToolChoice::Mode("required".into()),
        IRToolChoice::Specific { name } => ToolChoice::Specific { function: FunctionChoice { name: name.clone() } },
    }
}

pub fn decode_response(resp: ChatCompletionResponse) -> IRResponse {
    let choice = resp.choices.into_iter().next();
    let (content, finish_reason) = match choice {
        Some(choice) => (decode_message_content(choice.message), choice.finish_reason),
        None => (vec![], None),
    };

    IRResponse {
        id: resp.id,
        model: resp.model,
        content,
        stop_reason: decode_finish_reason(finish_reason.as_deref()),
        stop_sequence: None,
        usage: Some(IRUsage {
            input_tokens: resp.usage.prompt_tokens,
            output_tokens: resp.usage.completion_tokens,
            total_tokens: Some(resp.usage.total_tokens),
            ..Default::default()
        }),
        created: Some(resp.created),
    }
}

fn decode_message_content(message: ChatMessage) -> Vec<IRContentBlock> {
    let mut content = decode_content(message.content);
    for tool_call in message.tool_calls.unwrap_or_default() {
        content.push(IRContentBlock::ToolUse {
            id: tool_call.id,
            name: tool_call.function.name,
            input: serde_json::from_str(&tool_call.function.arguments).unwrap_or(serde_json::Value::Null),
            partial_arguments: None,
        });
    }
    content
}

fn decode_finish_reason(reason: Option<&str>) -> IRStopReason {
    match reason {
        Some("stop") => IRStopReason::EndTurn,
        Some("length") => IRStopReason::MaxTokens,
        Some("tool_calls") | Some("function_call") => IRStopReason::ToolUse,
        Some("content_filter") => IRStopReason::ContentFilter,
        _ => IRStopReason::EndTurn,
    }
}

pub fn encode_response(resp: &IRResponse) -> ChatCompletionResponse {
    let stop_reason = resp.effective_stop_reason();
    let mut parts = Vec::new();
    let mut tool_calls = Vec::new();
    for block in &resp.content {
        match block {
            IRContentBlock::Text { text, .. } => parts.push(ChatContentPart::Text { text: text.clone() }),
            IRContentBlock::ToolUse { id, name, input, .. } => tool_calls.push(ToolCall {
                id: id.clone(),
                kind: "function".into(),
                function: FunctionCall { name: name.clone(), arguments: input.to_string() },
            }),
            _ => {}
        }
    }
    let content = collapse_parts(parts);

    let usage = resp.usage.clone().unwrap_or_default();
    let prompt_tokens = usage.input_tokens;
    let completion_tokens = if usage.output_tokens > 0 {
        usage.output_tokens
    } else {
        resp.content.iter().filter_map(|c| c.as_text()).map(approximate_token_count).sum()
    };

    ChatCompletionResponse {
        id: resp.id.clone(),
        object: "chat.completion".into(),
        created: resp.created.unwrap_or(0),
        model: resp.model.clone(),
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage {
                role: ChatRole::Assistant,
                content,
                name: None,
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                tool_call_id: None,
            },
            finish_reason: Some(encode_finish_reason(stop_reason).into()),
        }],
        usage: ChatUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
    }
}

fn encode_finish_reason(reason: IRStopReason) -> &'static str {
    match reason {
        IRStopReason::EndTurn => "stop",
        IRStopReason::MaxTokens => "length",
        IRStopReason::StopSequence => "stop",
        IRStopReason::ToolUse => "tool_calls",
        IRStopReason::ContentFilter => "content_filter",
        IRStopReason::Error => "stop",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![
                ChatMessage {
                    role: ChatRole::System,
                    content: Some(ChatContent::Text("be helpful".into())),
                    name: None,
                    tool_calls: None,
                    tool_call_id: None,
                },
                ChatMessage {
                    role: ChatRole::User,
                    content: Some(ChatContent::Text("hi".into())),
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
        }
    }

    #[test]
    fn decode_request_splits_system_into_ir_field() {
        let ir = decode_request(sample_request()).unwrap();
        assert_eq!(ir.system.as_deref(), Some("be helpful"));
        assert_eq!(ir.messages.len(), 1);
        assert_eq!(ir.messages[0].role, IRRole::User);
        assert_eq!(ir.generation_config.max_tokens, Some(16));
    }

    #[test]
    fn legacy_functions_normalize_into_tools() {
        let mut req = sample_request();
        req.functions = Some(vec![FunctionDefinition {
            name: "lookup".into(),
            description: None,
            parameters: serde_json::json!({"type": "object"}),
        }]);
        req.function_call = Some(LegacyFunctionCall::Named { name: "lookup".into() });

        let ir = decode_request(req).unwrap();
        assert_eq!(ir.tools.len(), 1);
        assert_eq!(ir.tools[0].name, "lookup");
        assert_eq!(ir.tool_choice, Some(IRToolChoice::Specific { name: "lookup".into() }));
    }

    #[test]
    fn decode_tool_call_message_parses_arguments_as_json() {
        let mut req = sample_request();
        req.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content: None,
            name: None,
            tool_calls: Some(vec![ToolCall {
                id: "call_1".into(),
                kind: "function".into(),
                function: FunctionCall { name: "lookup".into(), arguments: r#"{"x":1}"#.into() },
            }]),
            tool_call_id: None,
        });

        let ir = decode_request(req).unwrap();
        let last = ir.messages.last().unwrap();
        match &last.content[0] {
            IRContentBlock::ToolUse { id, name, input, .. } => {
                assert_eq!(id, "call_1");
                assert_eq!(name, "lookup");
                assert_eq!(input, &serde_json::json!({"x": 1}));
            }
            other => panic!("expected tool_use block, got {other:?}"),
        }
    }

    #[test]
    fn tool_result_message_keeps_tool_call_id() {
        let mut req = sample_request();
        req.messages.push(ChatMessage {
            role: ChatRole::Tool,
            content: Some(ChatContent::Text("42".into())),
            name: None,
            tool_calls: None,
            tool_call_id: Some("call_1".into()),
        });

        let ir = decode_request(req).unwrap();
        let tool_message = ir.messages.last().unwrap();
        assert_eq!(tool_message.role, IRRole::Tool);
        match &tool_message.content[0] {
            IRContentBlock::ToolResult { tool_use_id, content, .. } => {
                assert_eq!(tool_use_id, "call_1");
                assert_eq!(content.flatten(), "42");
            }
            other => panic!("expected tool_result block, got {other:?}"),
        }
    }

    #[test]
    fn encode_response_forces_tool_calls_finish_reason_when_tool_use_present() {
        let resp = IRResponse {
            id: "resp_1".into(),
            model: "gpt-4o".into(),
            content: vec![IRContentBlock::ToolUse {
                id: "call_1".into(),
                name: "lookup".into(),
                input: serde_json::json!({}),
                partial_arguments: None,
            }],
            stop_reason: IRStopReason::EndTurn,
            stop_sequence: None,
            usage: None,
            created: Some(0),
        };
        let encoded = encode_response(&resp);
        assert_eq!(encoded.choices[0].finish_reason.as_deref(), Some("tool_calls"));
    }
}
