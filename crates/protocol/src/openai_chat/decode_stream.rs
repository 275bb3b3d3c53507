use super::types::*;
use ir::*;
use std::collections::HashMap;

/// OpenAI chat chunks carry no explicit block-start/stop framing, so the
/// decoder synthesizes it: the first delta for a given wire tool-call index
/// (or the first text delta) gets a synthesized `content_block_start`, and
/// a matching `content_block_stop` is emitted once the chunk stream ends or
/// that slot is superseded.
#[derive(Debug, Default)]
pub struct ChatStreamDecoder {
    sent_message_start: bool,
    text_block_open: bool,
    tool_blocks: HashMap<u32, String>,
    next_block_index: u32,
    text_block_index: Option<u32>,
}

impl ChatStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: ChatCompletionChunk) -> Vec<IRStreamEvent> {
        let mut events = Vec::new();

        if !self.sent_message_start {
            events.push(IRStreamEvent::MessageStart { id: chunk.id.clone(), model: chunk.model.clone() });
            self.sent_message_start = true;
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            return events;
        };

        if let Some(text) = choice.delta.content {
            if !self.text_block_open {
                let index = self.next_block_index;
                self.next_block_index += 1;
                self.text_block_index = Some(index);
                self.text_block_open = true;
                events.push(IRStreamEvent::ContentBlockStart {
                    index,
                    block: IRContentBlock::text(""),
                });
            }
            events.push(IRStreamEvent::ContentBlockDelta {
                index: self.text_block_index.unwrap(),
                delta: IRContentDelta::Text { text },
            });
        }

        for tool_call in choice.tool_calls_delta() {
            let index = match self.tool_blocks.get(&tool_call.index) {
                Some(index) => *index,
                None => {
                    let index = self.next_block_index;
                    self.next_block_index += 1;
                    self.tool_blocks.insert(tool_call.index, index);
                    index
                }
            };
            let is_new = tool_call.id.is_some();
            if is_new {
                events.push(IRStreamEvent::ContentBlockStart {
                    index,
                    block: IRContentBlock::ToolUse {
                        id: tool_call.id.clone().unwrap_or_default(),
                        name: tool_call.function.as_ref().and_then(|f| f.name.clone()).unwrap_or_default(),
                        input: serde_json::Value::Null,
                        partial_arguments: Some(String::new()),
                    },
                });
            }
            if let Some(arguments) = tool_call.function.as_ref().and_then(|f| f.arguments.clone()) {
                events.push(IRStreamEvent::ContentBlockDelta {
                    index,
                    delta: IRContentDelta::InputJson { partial_json: arguments },
                });
            }
        }

        if let Some(finish_reason) = choice.finish_reason {
            if self.text_block_open {
                events.push(IRStreamEvent::ContentBlockStop { index: self.text_block_index.unwrap() });
                self.text_block_open = false;
            }
            for index in self.tool_blocks.values() {
                events.push(IRStreamEvent::ContentBlockStop { index: *index });
            }
            events.push(IRStreamEvent::MessageDelta {
                stop_reason: Some(decode_finish_reason(&finish_reason)),
                usage: chunk.usage.map(|u| IRUsage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: Some(u.total_tokens),
                    ..Default::default()
                }),
            });
            events.push(IRStreamEvent::MessageStop);
        }

        events
    }
}

fn decode_finish_reason(reason: &str) -> IRStopReason {
    match reason {
        "length" => IRStopReason::MaxTokens,
        "tool_calls" | "function_call" => IRStopReason::ToolUse,
        "content_filter" => IRStopReason::ContentFilter,
        _ => IRStopReason::EndTurn,
    }
}

impl ChatChunkChoice {
    fn tool_calls_delta(&self) -> Vec<ToolCallDelta> {
        self.delta.tool_calls.clone().unwrap_or_default()
    }
}
