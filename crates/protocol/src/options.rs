use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolTag {
    OpenAiChat,
    OpenAiResponses,
    Anthropic,
}

/// Carried alongside an `encode_request`/`encode_response` call so an
/// encoder can make source-aware decisions — e.g. Anthropic's encoder only
/// injects a default `max_tokens` when the request didn't originate from
/// Anthropic in the first place (an Anthropic-native request missing
/// `max_tokens` is a client error, not ours to paper over).
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub source: ProtocolTag,
}

pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;
