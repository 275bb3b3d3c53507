use crate::{IRContentBlock, IRStopReason, IRUsage};
use serde::{Deserialize, Serialize};

/// The delta carried by a `content_block_delta` event. The `delta_type` tag
/// is what lets a downstream encoder tell a text fragment from a partial
/// tool-argument fragment without inspecting the enclosing block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "delta_type", rename_all = "snake_case")]
pub enum IRContentDelta {
    Text { text: String },
    InputJson { partial_json: String },
    Thinking { thinking: String },
    /// Anthropic's verification signature for a thinking block, streamed as
    /// its own delta once the block's reasoning text is complete.
    Signature { signature: String },
}

/// Canonical cross-protocol streaming vocabulary, modeled after Anthropic's
/// event shape since it is the only one of the three protocols that names
/// every framing transition explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IRStreamEvent {
    MessageStart {
        id: String,
        model: String,
    },
    ContentBlockStart {
        index: u32,
        block: IRContentBlock,
    },
    ContentBlockDelta {
        index: u32,
        delta: IRContentDelta,
    },
    ContentBlockStop {
        index: u32,
    },
    MessageDelta {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stop_reason: Option<IRStopReason>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<IRUsage>,
    },
    MessageStop,
    Ping,
    Error {
        message: String,
    },
    Done,
}
