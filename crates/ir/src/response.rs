use crate::{IRContentBlock, IRUsage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IRStopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    ContentFilter,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IRResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<IRContentBlock>,
    pub stop_reason: IRStopReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<IRUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
}

impl IRResponse {
    /// `stop_reason` is recomputed at the encoder boundary, not stored
    /// redundantly: any ToolUse block in `content` forces tool_use/tool_calls
    /// regardless of what the IR carries here (see 4.B "Finish reason").
    pub fn effective_stop_reason(&self) -> IRStopReason {
        if self.content.iter().any(IRContentBlock::is_tool_use) {
            IRStopReason::ToolUse
        } else {
            self.stop_reason
        }
    }

    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(IRContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}
