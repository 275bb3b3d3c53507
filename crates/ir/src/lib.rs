//! Protocol-neutral intermediate representation shared by every chat protocol
//! this gateway speaks.
//!
//! Decoders turn a wire request/response/stream-event into these types;
//! encoders turn them back into a specific protocol's wire shape. No type in
//! this crate knows which protocol it came from or is going to.

mod content;
mod message;
mod request;
mod response;
mod stream;
mod tool;
mod usage;

pub use content::{IRAudioSource, IRContentBlock, IRDocumentSource, IRImageSource};
pub use message::{IRMessage, IRRole};
pub use request::{IRGenerationConfig, IRRequest, IRResponseFormat, IRThinkingConfig};
pub use response::{IRResponse, IRStopReason};
pub use stream::{IRContentDelta, IRStreamEvent};
pub use tool::{IRToolChoice, IRToolDeclaration};
pub use usage::IRUsage;

use serde_json::{Map, Value};

/// Fields a decoder read but could not represent in the IR, preserved so an
/// encoder targeting the *same* protocol can round-trip them untouched.
pub type UnsupportedParams = Map<String, Value>;
