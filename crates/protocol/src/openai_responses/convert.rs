use super::types::*;
use crate::error::CodecResult;
use ir::*;

pub fn decode_request(req: ResponsesRequest) -> CodecResult<IRRequest> {
    let mut messages = Vec::new();
    let mut pending_outputs = std::collections::HashMap::new();

    for item in req.input {
        match item {
            ResponsesInputItem::Message { role, content } => {
                let ir_role = match role {
                    ResponsesRole::System => IRRole::System,
                    ResponsesRole::User => IRRole::User,
                    ResponsesRole::Assistant => IRRole::Assistant,
                };
                let blocks = content
                    .into_iter()
                    .map(|part| match part {
                        ResponsesContentPart::InputText { text } | ResponsesContentPart::OutputText { text } => {
                            IRContentBlock::text(text)
                        }
                        ResponsesContentPart::InputImage { image_url } => IRContentBlock::Image {
                            source: IRImageSource::parse_data_url(&image_url)
                                .map(|(media_type, data)| IRImageSource::Base64 { media_type, data })
                                .unwrap_or(IRImageSource::Url { url: image_url }),
                            media_type: None,
                            detail: None,
                        },
                    })
                    .collect();
                messages.push(IRMessage::new(ir_role, blocks));
            }
            ResponsesInputItem::FunctionCall { call_id, name, arguments } => {
                messages.push(IRMessage::new(
                    IRRole::Assistant,
                    vec![IRContentBlock::ToolUse {
                        id: call_id,
                        name,
                        input: serde_json::from_str(&arguments).unwrap_or(serde_json::Value::Null),
                        partial_arguments: None,
                    }],
                ));
            }
            ResponsesInputItem::FunctionCallOutput { call_id, output } => {
                pending_outputs.insert(call_id, output);
            }
        }
    }

    for (call_id, output) in pending_outputs {
        messages.push(IRMessage::new(
            IRRole::Tool,
            vec![IRContentBlock::ToolResult {
                tool_use_id: call_id,
                content: IRToolResultContent::Text(output),
                is_error: false,
            }],
        ));
    }

    let tools = req
        .tools
        .unwrap_or_default()
        .into_iter()
        .map(|t| IRToolDeclaration { name: t.name, description: t.description, input_schema: t.parameters })
        .collect();

    Ok(IRRequest {
        model: req.model,
        messages,
        system: req.instructions,
        generation_config: IRGenerationConfig {
            temperature: req.temperature,
            top_p: req.top_p,
            max_tokens: req.max_output_tokens,
            ..Default::default()
        },
        tools,
        tool_choice: None,
        response_format: None,
        thinking_config: None,
        stream: req.stream,
        user: req.user,
        unsupported_params: Default::default(),
    })
}

pub fn encode_request(req: &IRRequest) -> CodecResult<ResponsesRequest> {
    let mut input = Vec::new();

    for message in &req.messages {
        match message.role {
            IRRole::System => {}
            IRRole::Tool => {
                for block in &message.content {
                    if let IRContentBlock::ToolResult { tool_use_id, content, .. } = block {
                        input.push(ResponsesInputItem::FunctionCallOutput {
                            call_id: tool_use_id.clone(),
                            output: content.flatten(),
                        });
                    }
                }
            }
            IRRole::User | IRRole::Assistant => {
                let role = match message.role {
                    IRRole::User => ResponsesRole::User,
                    _ => ResponsesRole::Assistant,
                };
                let mut content = Vec::new();
                for block in &message.content {
                    match block {
                        IRContentBlock::Text { text, .. } => {
                            content.push(ResponsesContentPart::InputText { text: text.clone() });
                        }
                        IRContentBlock::Image { source, .. } => {
                            content.push(ResponsesContentPart::InputImage { image_url: image_source_to_url(source) });
                        }
                        IRContentBlock::ToolUse { id, name, input: args, .. } => {
                            input.push(ResponsesInputItem::FunctionCall {
                                call_id: id.clone(),
                                name: name.clone(),
                                arguments: args.to_string(),
                            });
                        }
                        _ => {}
                    }
                }
                if !content.is_empty() {
                    input.push(ResponsesInputItem::Message { role, content });
                }
            }
        }
    }

    let tools = (!req.tools.is_empty()).then(|| {
        req.tools
            .iter()
            .map(|t| ResponsesTool {
                kind: "function".into(),
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.input_schema.clone(),
            })
            .collect()
    });

    Ok(ResponsesRequest {
        model: req.model.clone(),
        input,
        instructions: req.system.clone(),
        temperature: req.generation_config.temperature,
        top_p: req.generation_config.top_p,
        max_output_tokens: req.generation_config.max_tokens,
        tools,
        tool_choice: None,
        stream: req.stream,
        user: req.user.clone(),
    })
}

fn image_source_to_url(source: &IRImageSource) -> String {
    match source {
        IRImageSource::Url { url } => url.clone(),
        IRImageSource::Base64 { media_type, data } => format!("data:{media_type};base64,{data}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_request_moves_instructions_into_ir_system_field() {
        let req = ResponsesRequest {
            model: "gpt-4o".into(),
            input: vec![ResponsesInputItem::Message {
                role: ResponsesRole::User,
                content: vec![ResponsesContentPart::InputText { text: "hi".into() }],
            }],
            instructions: Some("be terse".into()),
            temperature: None,
            top_p: None,
            max_output_tokens: None,
            tools: None,
            tool_choice: None,
            stream: false,
            user: None,
        };

        let ir = decode_request(req).unwrap();
        assert_eq!(ir.system.as_deref(), Some("be terse"));
        assert_eq!(ir.messages.len(), 1);
        assert_eq!(ir.messages[0].role, IRRole::User);
    }

    #[test]
    fn decode_request_splits_function_call_and_output_into_separate_messages() {
        let req = ResponsesRequest {
            model: "gpt-4o".into(),
            input: vec![
                ResponsesInputItem::FunctionCall { call_id: "call_1".into(), name: "lookup".into(), arguments: "{\"q\":\"rust\"}".into() },
                ResponsesInputItem::FunctionCallOutput { call_id: "call_1".into(), output: "42".into() },
            ],
            instructions: None,
            temperature: None,
            top_p: None,
            max_output_tokens: None,
            tools: None,
            tool_choice: None,
            stream: false,
            user: None,
        };

        let ir = decode_request(req).unwrap();
        assert_eq!(ir.messages.len(), 2);

        let tool_uses = ir.messages[0].tool_uses();
        assert_eq!(tool_uses.len(), 1);
        assert_eq!(tool_uses[0].0, "call_1");
        assert_eq!(tool_uses[0].1, "lookup");

        assert_eq!(ir.messages[1].role, IRRole::Tool);
        match &ir.messages[1].content[0] {
            IRContentBlock::ToolResult { tool_use_id, content, is_error } => {
                assert_eq!(tool_use_id, "call_1");
                assert_eq!(content.flatten(), "42");
                assert!(!is_error);
            }
            other => panic!("expected a tool result block, got {other:?}"),
        }
    }

    #[test]
    fn input_image_with_data_url_decodes_to_base64_source() {
        let req = ResponsesRequest {
            model: "gpt-4o".into(),
            input: vec![ResponsesInputItem::Message {
                role: ResponsesRole::User,
                content: vec![ResponsesContentPart::InputImage { image_url: "data:image/png;base64,aGk=".into() }],
            }],
            instructions: None,
            temperature: None,
            top_p: None,
            max_output_tokens: None,
            tools: None,
            tool_choice: None,
            stream: false,
            user: None,
        };

        let ir = decode_request(req).unwrap();
        match &ir.messages[0].content[0] {
            IRContentBlock::Image { source: IRImageSource::Base64 { media_type, data }, .. } => {
                assert_eq!(media_type, "image/png");
                assert_eq!(data, "aGk=");
            }
            other => panic!("expected a base64 image block, got {other:?}"),
        }
    }

    #[test]
    fn encode_request_round_trips_a_tool_use_message_back_into_a_function_call_item() {
        let ir = IRRequest {
            model: "gpt-4o".into(),
            messages: vec![IRMessage::new(
                IRRole::Assistant,
                vec![IRContentBlock::ToolUse {
                    id: "call_1".into(),
                    name: "lookup".into(),
                    input: serde_json::json!({"q": "rust"}),
                    partial_arguments: None,
                }],
            )],
            system: None,
            generation_config: IRGenerationConfig::default(),
            tools: Vec::new(),
            tool_choice: None,
            response_format: None,
            thinking_config: None,
            stream: false,
            user: None,
            unsupported_params: Default::default(),
        };

        let encoded = encode_request(&ir).unwrap();
        match &encoded.input[0] {
            ResponsesInputItem::FunctionCall { call_id, name, arguments } => {
                assert_eq!(call_id, "call_1");
                assert_eq!(name, "lookup");
                assert_eq!(arguments, "{\"q\":\"rust\"}");
            }
            other => panic!("expected a function call item, got {other:?}"),
        }
    }

    #[test]
    fn decode_response_marks_tool_use_stop_reason_when_function_call_present() {
        let resp = ResponsesResponse {
            id: "resp_1".into(),
            model: "gpt-4o".into(),
            status: "completed".into(),
            output: vec![ResponsesOutputItem::FunctionCall {
                id: "fc_1".into(),
                call_id: "call_1".into(),
                name: "lookup".into(),
                arguments: "{}".into(),
            }],
            usage: ResponsesUsage { input_tokens: 3, output_tokens: 4, total_tokens: 7 },
        };

        let ir = decode_response(resp);
        assert_eq!(ir.stop_reason, IRStopReason::ToolUse);
        assert_eq!(ir.usage.as_ref().unwrap().total_tokens, Some(7));
    }
}

pub fn decode_response(resp: ResponsesResponse) -> IRResponse {
    let mut content = Vec::new();
    for item in resp.output {
        match item {
            ResponsesOutputItem::Message { content: parts, .. } => {
                for part in parts {
                    if let ResponsesContentPart::OutputText { text } | ResponsesContentPart::InputText { text } = part {
                        content.push(IRContentBlock::text(text));
                    }
                }
            }
            ResponsesOutputItem::FunctionCall { call_id, name, arguments, .. } => {
                content.push(IRContentBlock::ToolUse {
                    id: call_id,
                    name,
                    input: serde_json::from_str(&arguments).unwrap_or(serde_json::Value::Null),
                    partial_arguments: None,
                });
            }
        }
    }

    IRResponse {
        id: resp.id,
        model: resp.model,
        stop_reason: if content.iter().any(IRContentBlock::is_tool_use) { IRStopReason::ToolUse } else { IRStopReason::EndTurn },
        content,
        stop_sequence: None,
        usage: Some(IRUsage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
            total_tokens: Some(resp.usage.total_tokens),
            ..Default::default()
        }),
        created: None,
    }
}

pub fn encode_response(resp: &IRResponse) -> ResponsesResponse {
    let mut output = Vec::new();
    let mut text_parts = Vec::new();

    for block in &resp.content {
        match block {
            IRContentBlock::Text { text, .. } => text_parts.push(ResponsesContentPart::OutputText { text: text.clone() }),
            IRContentBlock::ToolUse { id, name, input, .. } => output.push(ResponsesOutputItem::FunctionCall {
                id: format!("fc_{id}"),
                call_id: id.clone(),
                name: name.clone(),
                arguments: input.to_string(),
            }),
            _ => {}
        }
    }
    if !text_parts.is_empty() {
        output.insert(
            0,
            ResponsesOutputItem::Message { id: format!("msg_{}", resp.id), role: ResponsesRole::Assistant, content: text_parts },
        );
    }

    let usage = resp.usage.clone().unwrap_or_default();
    ResponsesResponse {
        id: resp.id.clone(),
        model: resp.model.clone(),
        status: "completed".into(),
        output,
        usage: ResponsesUsage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.total_tokens.unwrap_or(usage.input_tokens + usage.output_tokens),
        },
    }
}
