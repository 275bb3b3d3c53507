use super::types::*;
use ir::*;
use std::collections::HashMap;

/// OpenAI chat chunks address tool calls by a flat `index` rather than the
/// IR's per-block index, so the encoder tracks both: which IR block index
/// holds which tool_use id, and which wire index that id was first assigned.
#[derive(Debug, Default)]
pub struct ChatStreamEncoder {
    block_index_to_tool_id: HashMap<u32, String>,
    tool_call_indices: HashMap<String, u32>,
    next_tool_index: u32,
}

impl ChatStreamEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn tool_index_for(&mut self, tool_use_id: &str) -> u32 {
        if let Some(index) = self.tool_call_indices.get(tool_use_id) {
            return *index;
        }
        let index = self.next_tool_index;
        self.next_tool_index += 1;
        self.tool_call_indices.insert(tool_use_id.to_string(), index);
        index
    }

    /// Translates one IR stream event into zero or more chat completion
    /// chunks. `id`/`model`/`created` are threaded through from the
    /// enclosing response since OpenAI repeats them on every chunk.
    pub fn encode(&mut self, event: &IRStreamEvent, id: &str, model: &str, created: i64) -> Vec<ChatCompletionChunk> {
        let wrap = |choice: ChatChunkChoice, usage: Option<ChatUsage>| ChatCompletionChunk {
            id: id.to_string(),
            object: "chat.completion.chunk".into(),
            created,
            model: model.to_string(),
            choices: vec![choice],
            usage,
        };

        match event {
            IRStreamEvent::MessageStart { .. } => vec![wrap(
                ChatChunkChoice {
                    index: 0,
                    delta: ChatChoiceDelta { role: Some(ChatRole::Assistant), content: None, tool_calls: None },
                    finish_reason: None,
                },
                None,
            )],
            IRStreamEvent::ContentBlockStart { index, block: IRContentBlock::ToolUse { id: tool_id, name, .. } } => {
                self.block_index_to_tool_id.insert(*index, tool_id.clone());
                let wire_index = self.tool_index_for(tool_id);
                vec![wrap(
                    ChatChunkChoice {
                        index: 0,
                        delta: ChatChoiceDelta {
                            role: None,
                            content: None,
                            tool_calls: Some(vec![ToolCallDelta {
                                index: wire_index,
                                id: Some(tool_id.clone()),
                                kind: Some("function".into()),
                                function: Some(FunctionCallDelta { name: Some(name.clone()), arguments: Some(String::new()) }),
                            }]),
                        },
                        finish_reason: None,
                    },
                    None,
                )]
            }
            IRStreamEvent::ContentBlockStart { .. } => vec![],
            IRStreamEvent::ContentBlockDelta { delta: IRContentDelta::Text { text }, .. } => vec![wrap(
                ChatChunkChoice {
                    index: 0,
                    delta: ChatChoiceDelta { role: None, content: Some(text.clone()), tool_calls: None },
                    finish_reason: None,
                },
                None,
            )],
            IRStreamEvent::ContentBlockDelta { index, delta: IRContentDelta::InputJson { partial_json } } => {
                let wire_index = match self.block_index_to_tool_id.get(index) {
                    Some(tool_id) => self.tool_index_for(&tool_id.clone()),
                    None => return vec![],
                };
                vec![wrap(
                    ChatChunkChoice {
                        index: 0,
                        delta: ChatChoiceDelta {
                            role: None,
                            content: None,
                            tool_calls: Some(vec![ToolCallDelta {
                                index: wire_index,
                                id: None,
                                kind: None,
                                function: Some(FunctionCallDelta { name: None, arguments: Some(partial_json.clone()) }),
                            }]),
                        },
                        finish_reason: None,
                    },
                    None,
                )]
            }
            IRStreamEvent::ContentBlockDelta { delta: IRContentDelta::Thinking { .. } | IRContentDelta::Signature { .. }, .. } => vec![],
            IRStreamEvent::ContentBlockStop { .. } => vec![],
            IRStreamEvent::MessageDelta { stop_reason, usage } => vec![wrap(
                ChatChunkChoice {
                    index: 0,
                    delta: ChatChoiceDelta { role: None, content: None, tool_calls: None },
                    finish_reason: stop_reason.map(|r| encode_finish_reason(r).to_string()),
                },
                usage.as_ref().map(|u| ChatUsage {
                    prompt_tokens: u.input_tokens,
                    completion_tokens: u.output_tokens,
                    total_tokens: u.total_tokens.unwrap_or(u.input_tokens + u.output_tokens),
                }),
            )],
            IRStreamEvent::MessageStop | IRStreamEvent::Ping | IRStreamEvent::Done => vec![],
            IRStreamEvent::Error { message } => vec![wrap(
                ChatChunkChoice {
                    index: 0,
                    delta: ChatChoiceDelta { role: None, content: Some(message.clone()), tool_calls: None },
                    finish_reason: Some("stop".into()),
                },
                None,
            )],
        }
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

/// Serializes one chunk as an SSE `data:` frame; OpenAI's stream has no
/// named `event:` field, unlike Anthropic's.
pub fn to_sse_frame(chunk: &ChatCompletionChunk) -> String {
    format!("data: {}\n\n", serde_json::to_string(chunk).unwrap_or_default())
}

pub const DONE_FRAME: &str = "data: [DONE]\n\n";
