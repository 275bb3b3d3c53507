mod convert;
mod stream;
mod types;

pub use convert::{decode_request, decode_response, encode_request, encode_response};
pub use stream::{decode_stream_event, encode_stream_event, to_sse_frame};
pub use types::*;
