use crate::IRContentBlock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IRRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IRMessage {
    pub role: IRRole,
    pub content: Vec<IRContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IRMessage {
    pub fn new(role: IRRole, content: Vec<IRContentBlock>) -> Self {
        Self {
            role,
            content,
            name: None,
        }
    }

    pub fn text(role: IRRole, text: impl Into<String>) -> Self {
        Self::new(role, vec![IRContentBlock::text(text)])
    }

    /// Concatenates every text block, ignoring tool/image/etc. content.
    /// Used as the input to the approximate token counter and by encoders
    /// that flatten multi-block content into a single string field.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(IRContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Pulls every `ToolUse` block out of this message's content into the
    /// shape a protocol's `tool_calls` field expects. Computed on demand
    /// rather than cached, since the IR stores tool uses as content blocks.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &serde_json::Value)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                IRContentBlock::ToolUse { id, name, input, .. } => Some((id.as_str(), name.as_str(), input)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_joins_only_text_blocks() {
        let message = IRMessage::new(
            IRRole::Assistant,
            vec![
                IRContentBlock::text("Hello, "),
                IRContentBlock::ToolUse { id: "c1".to_string(), name: "f".to_string(), input: serde_json::Value::Null, partial_arguments: None },
                IRContentBlock::text("world"),
            ],
        );
        assert_eq!(message.text_content(), "Hello, world");
    }

    #[test]
    fn tool_uses_extracts_id_name_and_input() {
        let message = IRMessage::new(
            IRRole::Assistant,
            vec![IRContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "lookup".to_string(),
                input: serde_json::json!({"q": "rust"}),
                partial_arguments: None,
            }],
        );
        let uses = message.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].0, "call_1");
        assert_eq!(uses[0].1, "lookup");
        assert_eq!(uses[0].2, &serde_json::json!({"q": "rust"}));
    }

    #[test]
    fn tool_uses_is_empty_for_plain_text_message() {
        let message = IRMessage::text(IRRole::User, "hi");
        assert!(message.tool_uses().is_empty());
    }
}
