// Setrans: Wire Module
//
// Pure encode/decode logic for the mcstransd binary protocol. No I/O lives
// here; the transport moves the bytes this module produces and consumes.

mod codec;
mod error;

pub use codec::{
    ByteOrder, Codec, RequestKind, ResponseHeader, HEADER_LEN, MAX_RESPONSE_LEN,
    REQUEST_HEADER_LEN,
};
pub use error::WireError;
