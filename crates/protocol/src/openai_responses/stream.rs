use super::types::*;
use ir::*;

/// Responses events address output items by a flat `output_index`, which
/// lines up directly with the IR's per-block index, so this translation
/// needs no id-remapping state the way the chat-completions encoder does.
#[derive(Debug, Default)]
pub struct ResponsesStreamEncoder {
    response_id: String,
    model: String,
}

impl ResponsesStreamEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, event: &IRStreamEvent) -> Vec<ResponsesStreamEvent> {
        match event {
            IRStreamEvent::MessageStart { id, model } => {
                self.response_id = id.clone();
                self.model = model.clone();
                vec![ResponsesStreamEvent::ResponseCreated {
                    response: ResponsesResponseStub { id: id.clone(), model: model.clone() },
                }]
            }
            IRStreamEvent::ContentBlockStart { index, block } => match block {
                IRContentBlock::Text { .. } => vec![ResponsesStreamEvent::ResponseOutputItemAdded {
                    output_index: *index,
                    item: ResponsesOutputItem::Message {
                        id: format!("msg_{index}"),
                        role: ResponsesRole::Assistant,
                        content: vec![],
                    },
                }],
                IRContentBlock::ToolUse { id, name, .. } => vec![ResponsesStreamEvent::ResponseOutputItemAdded {
                    output_index: *index,
                    item: ResponsesOutputItem::FunctionCall {
                        id: format!("fc_{index}"),
                        call_id: id.clone(),
                        name: name.clone(),
                        arguments: String::new(),
                    },
                }],
                _ => vec![],
            },
            IRStreamEvent::ContentBlockDelta { index, delta: IRContentDelta::Text { text } } => {
                vec![ResponsesStreamEvent::ResponseOutputTextDelta { output_index: *index, delta: text.clone() }]
            }
            IRStreamEvent::ContentBlockDelta { index, delta: IRContentDelta::InputJson { partial_json } } => {
                vec![ResponsesStreamEvent::ResponseFunctionCallArgumentsDelta { output_index: *index, delta: partial_json.clone() }]
            }
            IRStreamEvent::ContentBlockDelta { delta: IRContentDelta::Thinking { .. } | IRContentDelta::Signature { .. }, .. } => vec![],
            IRStreamEvent::ContentBlockStop { .. } => vec![],
            IRStreamEvent::MessageDelta { .. } | IRStreamEvent::MessageStop | IRStreamEvent::Ping | IRStreamEvent::Done => vec![],
            IRStreamEvent::Error { .. } => vec![],
        }
    }
}

/// Serializes one Responses event as an SSE frame, named like Anthropic's
/// but with the dotted Responses event-type vocabulary.
pub fn to_sse_frame(event: &ResponsesStreamEvent) -> String {
    let event_name = match event {
        ResponsesStreamEvent::ResponseCreated { .. } => "response.created",
        ResponsesStreamEvent::ResponseOutputItemAdded { .. } => "response.output_item.added",
        ResponsesStreamEvent::ResponseOutputTextDelta { .. } => "response.output_text.delta",
        ResponsesStreamEvent::ResponseFunctionCallArgumentsDelta { .. } => "response.function_call_arguments.delta",
        ResponsesStreamEvent::ResponseOutputItemDone { .. } => "response.output_item.done",
        ResponsesStreamEvent::ResponseCompleted { .. } => "response.completed",
    };
    let data = serde_json::to_string(event).unwrap_or_default();
    format!("event: {event_name}\ndata: {data}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_delta_encodes_to_response_output_text_delta() {
        let mut encoder = ResponsesStreamEncoder::new();
        let started = encoder.encode(&IRStreamEvent::MessageStart { id: "resp_1".into(), model: "gpt-4o".into() });
        assert!(matches!(started[0], ResponsesStreamEvent::ResponseCreated { .. }));

        let events = encoder.encode(&IRStreamEvent::ContentBlockDelta { index: 0, delta: IRContentDelta::Text { text: "hi".into() } });
        match &events[0] {
            ResponsesStreamEvent::ResponseOutputTextDelta { output_index, delta } => {
                assert_eq!(*output_index, 0);
                assert_eq!(delta, "hi");
            }
            other => panic!("expected a text delta event, got {other:?}"),
        }

        let frame = to_sse_frame(&events[0]);
        assert!(frame.starts_with("event: response.output_text.delta\n"));
    }

    #[test]
    fn tool_use_start_announces_a_function_call_output_item() {
        let mut encoder = ResponsesStreamEncoder::new();
        let events = encoder.encode(&IRStreamEvent::ContentBlockStart {
            index: 1,
            block: IRContentBlock::ToolUse { id: "call_1".into(), name: "lookup".into(), input: serde_json::Value::Null, partial_arguments: None },
        });
        match &events[0] {
            ResponsesStreamEvent::ResponseOutputItemAdded { output_index, item: ResponsesOutputItem::FunctionCall { call_id, name, .. } } => {
                assert_eq!(*output_index, 1);
                assert_eq!(call_id, "call_1");
                assert_eq!(name, "lookup");
            }
            other => panic!("expected a function call item-added event, got {other:?}"),
        }
    }

    #[test]
    fn thinking_deltas_and_pings_produce_no_events() {
        let mut encoder = ResponsesStreamEncoder::new();
        assert!(encoder.encode(&IRStreamEvent::ContentBlockDelta { index: 0, delta: IRContentDelta::Thinking { thinking: "...".into() } }).is_empty());
        assert!(encoder.encode(&IRStreamEvent::Ping).is_empty());
    }
}
