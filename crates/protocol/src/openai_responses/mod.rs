mod convert;
mod stream;
mod types;

pub use convert::{decode_request, decode_response, encode_request, encode_response};
pub use stream::{ResponsesStreamEncoder, to_sse_frame};
pub use types::*;
