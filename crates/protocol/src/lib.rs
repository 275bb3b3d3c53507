mod error;
pub mod anthropic;
pub mod openai_chat;
pub mod openai_responses;
mod options;
mod tokens;

pub use error::{CodecError, CodecResult};
pub use options::{ANTHROPIC_DEFAULT_MAX_TOKENS, EncodeOptions, ProtocolTag};
pub use tokens::approximate_token_count;
