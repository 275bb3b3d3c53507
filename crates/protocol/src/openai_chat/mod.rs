mod convert;
mod decode_stream;
mod stream;
mod types;

pub use convert::{decode_request, decode_response, encode_request, encode_response};
pub use decode_stream::ChatStreamDecoder;
pub use stream::{ChatStreamEncoder, to_sse_frame, DONE_FRAME};
pub use types::*;
