// Setrans: Binary Frame Codec
//
// Request frame:  kind | primary_len | secondary_len | primary | secondary
// Response frame: function | body_len | return_code | body
//
// Every integer is a 4-byte word in the host's native byte order, which is
// probed once when a codec is built. Strings travel NUL-terminated.

use std::fmt;

use super::WireError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Size of the fixed response header (three 4-byte words).
pub const HEADER_LEN: usize = 12;

/// Size of the request's kind and two length words.
pub const REQUEST_HEADER_LEN: usize = 12;

/// Largest response body the client is willing to read (1 MiB).
pub const MAX_RESPONSE_LEN: usize = 1 << 20;

/// Written in native order to find out which order that is.
const BYTE_ORDER_PROBE: u16 = 0xABCD;

/// The secondary payload is unused by this client but the daemon requires it.
const SECONDARY_PAYLOAD: &[u8] = b"\0";

// ─── Request Kind ────────────────────────────────────────────────────────────

/// The daemon operations this client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    RawToTranslated,
    TranslatedToRaw,
    RawToColor,
}

impl RequestKind {
    pub const ALL: [RequestKind; 3] = [
        RequestKind::RawToTranslated,
        RequestKind::TranslatedToRaw,
        RequestKind::RawToColor,
    ];

    /// Wire value of the request. Codes 0 and 1 are daemon operations this
    /// client never sends.
    pub const fn code(self) -> u32 {
        match self {
            RequestKind::RawToTranslated => 2,
            RequestKind::TranslatedToRaw => 3,
            RequestKind::RawToColor => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RequestKind::RawToTranslated => "raw-to-translated",
            RequestKind::TranslatedToRaw => "translated-to-raw",
            RequestKind::RawToColor => "raw-to-color",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Byte Order ──────────────────────────────────────────────────────────────

/// Byte order of the 4-byte words on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Probe the host's byte order by looking at the in-memory
    /// representation of a known 16-bit value.
    pub fn native() -> Result<Self, WireError> {
        Self::from_probe(BYTE_ORDER_PROBE.to_ne_bytes())
    }

    /// Classify the two bytes `0xABCD` was laid out as.
    pub fn from_probe(bytes: [u8; 2]) -> Result<Self, WireError> {
        match bytes {
            [0xCD, 0xAB] => Ok(ByteOrder::Little),
            [0xAB, 0xCD] => Ok(ByteOrder::Big),
            other => Err(WireError::UnknownByteOrder(other)),
        }
    }

    pub fn encode_u32(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }

    pub fn decode_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        }
    }
}

// ─── Response Header ─────────────────────────────────────────────────────────

/// The fixed 12-byte header that precedes every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Echo of the request kind. Unused.
    pub function: u32,
    /// Length of the body that follows.
    pub length: u32,
    /// Daemon return code. Unused; failure is inferred from the body.
    pub return_code: u32,
}

impl ResponseHeader {
    /// Declared body length, bounded by [`MAX_RESPONSE_LEN`].
    pub fn body_len(&self) -> Result<usize, WireError> {
        let length = self.length as usize;
        if length > MAX_RESPONSE_LEN {
            return Err(WireError::ResponseTooLarge {
                length,
                max: MAX_RESPONSE_LEN,
            });
        }
        Ok(length)
    }
}

// ─── Codec ───────────────────────────────────────────────────────────────────

/// Encoder/decoder bound to one byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    order: ByteOrder,
}

impl Codec {
    pub fn new(order: ByteOrder) -> Self {
        Self { order }
    }

    /// Build a codec for the host's native byte order.
    pub fn native() -> Result<Self, WireError> {
        ByteOrder::native().map(Self::new)
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Encode one request frame into a single contiguous buffer.
    ///
    /// The label must not contain a NUL byte. The daemon stops at the first
    /// terminator, so anything after an embedded NUL is silently dropped.
    pub fn encode_request(&self, kind: RequestKind, label: &str) -> Result<Vec<u8>, WireError> {
        let too_long = || WireError::LabelTooLong {
            length: label.len(),
        };
        let primary_len = label.len().checked_add(1).ok_or_else(too_long)?;
        let primary_word = u32::try_from(primary_len).map_err(|_| too_long())?;
        let secondary_word = SECONDARY_PAYLOAD.len() as u32;

        let mut frame =
            Vec::with_capacity(REQUEST_HEADER_LEN + primary_len + SECONDARY_PAYLOAD.len());
        frame.extend_from_slice(&self.order.encode_u32(kind.code()));
        frame.extend_from_slice(&self.order.encode_u32(primary_word));
        frame.extend_from_slice(&self.order.encode_u32(secondary_word));
        frame.extend_from_slice(label.as_bytes());
        frame.push(0);
        frame.extend_from_slice(SECONDARY_PAYLOAD);
        Ok(frame)
    }

    pub fn decode_header(&self, bytes: &[u8; HEADER_LEN]) -> ResponseHeader {
        let word = |at: usize| {
            self.order
                .decode_u32([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        ResponseHeader {
            function: word(0),
            length: word(4),
            return_code: word(8),
        }
    }

    /// Turn a response body into the answer string.
    ///
    /// The answer ends at the first NUL; whatever padding follows it is
    /// ignored. A body that is empty, holds only the terminator, or is blank
    /// once trimmed means the daemon could not parse the request.
    pub fn decode_body(&self, body: &[u8]) -> Result<String, WireError> {
        if body.len() <= 1 {
            return Err(WireError::EmptyResponse);
        }

        let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
        let text = String::from_utf8(body[..end].to_vec())?;
        let answer = text.trim();
        if answer.is_empty() {
            return Err(WireError::EmptyResponse);
        }

        Ok(answer.to_string())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
