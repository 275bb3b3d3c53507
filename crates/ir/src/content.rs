use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One block of message content. Unknown tags seen on the wire are skipped
/// by decoders rather than rejected; this enum only models the tags every
/// protocol in this gateway can express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IRContentBlock {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        citations: Option<Vec<Value>>,
    },
    Image {
        source: IRImageSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Audio {
        source: IRAudioSource,
    },
    Document {
        source: IRDocumentSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
        /// Raw JSON fragments accumulated so far, set only while a stream
        /// translator is still assembling this block's arguments.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partial_arguments: Option<String>,
    },
    ToolResult {
        tool_use_id: String,
        content: IRToolResultContent,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    Thinking {
        thinking: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        redacted: bool,
        /// Opaque payload of a `redacted_thinking` block; set only when
        /// `redacted` is true, in place of `thinking`/`signature`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        redacted_data: Option<String>,
    },
}

impl IRContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        IRContentBlock::Text {
            text: text.into(),
            citations: None,
        }
    }

    /// Best-effort text extraction; non-text blocks contribute nothing.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            IRContentBlock::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_tool_use(&self) -> bool {
        matches!(self, IRContentBlock::ToolUse { .. })
    }
}

/// Tool-result content is either a flat string or a nested sequence of
/// blocks (Anthropic allows the latter; this gateway collapses multi-block
/// results into a single string when it must cross into a protocol that
/// only understands flat tool output).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IRToolResultContent {
    Text(String),
    Blocks(Vec<IRContentBlock>),
}

impl IRToolResultContent {
    /// Flattens to a single string, joining block text with newlines.
    pub fn flatten(&self) -> String {
        match self {
            IRToolResultContent::Text(s) => s.clone(),
            IRToolResultContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(IRContentBlock::as_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IRImageSource {
    Url { url: String },
    Base64 { media_type: String, data: String },
}

impl IRImageSource {
    /// Splits a `data:<media_type>;base64,<payload>` URL into its parts.
    /// Returns `None` for anything else, including plain http(s) URLs.
    pub fn parse_data_url(url: &str) -> Option<(String, String)> {
        let rest = url.strip_prefix("data:")?;
        let (media_type, payload) = rest.split_once(";base64,")?;
        Some((media_type.to_string(), payload.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IRAudioSource {
    Base64 { format: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IRDocumentSource {
    Base64 { media_type: String, data: String },
    Url { url: String },
}
