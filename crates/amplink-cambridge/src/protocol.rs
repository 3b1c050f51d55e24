//! Cambridge Audio RS-232 text-protocol encoder/decoder.
//!
//! The protocol uses carriage-return terminated ASCII lines over a 9600 8N1
//! serial link. Every command and reply is a comma-separated triplet-like
//! string starting with `#`.
//!
//! # Command format
//!
//! ```text
//! #<group>,<number>[,<data>]\r
//! ```
//!
//! - `group`: command group (`1` amplifier, `3` source).
//! - `number`: two-digit command number within the group.
//! - `data`: optional parameter (e.g. `1`/`0` for on/off, decibels).
//!
//! # Reply format
//!
//! ```text
//! #<group>,<number>,<value>\r
//! ```
//!
//! Reply groups are the command group plus one (`#1,01` is answered from
//! group `2`, `#3,01` from group `4`). Group `0` is reserved for the four
//! error replies listed in [`DeviceError`].

use bytes::{BufMut, BytesMut};

/// Command/reply terminator byte.
pub const TERMINATOR: u8 = b'\r';

/// Result of attempting to decode one reply line from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A complete line was decoded.
    Line {
        /// The line with the terminator stripped.
        payload: String,
        /// Number of bytes consumed from the input buffer (including `\r`).
        consumed: usize,
    },

    /// A terminated line was found but it is not printable ASCII.
    ///
    /// The `usize` is the number of bytes consumed from the input buffer.
    Invalid(usize),

    /// The buffer does not yet contain a complete line. More data is needed.
    Incomplete,
}

/// Encode a command into raw bytes ready for transmission.
///
/// With a parameter the frame is `mnemonic,param\r`; without one it is
/// `mnemonic\r`.
///
/// # Example
///
/// ```
/// use amplink_cambridge::protocol::encode_command;
///
/// assert_eq!(encode_command("#1,01", None), b"#1,01\r");
/// assert_eq!(encode_command("#1,08", Some("-40")), b"#1,08,-40\r");
/// ```
pub fn encode_command(mnemonic: &str, param: Option<&str>) -> Vec<u8> {
    let param_len = param.map_or(0, |p| p.len() + 1);
    let mut buf = BytesMut::with_capacity(mnemonic.len() + param_len + 1);
    buf.put_slice(mnemonic.as_bytes());
    if let Some(param) = param {
        buf.put_u8(b',');
        buf.put_slice(param.as_bytes());
    }
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Attempt to decode one reply line from a byte buffer.
///
/// Scans `buf` for a `\r` terminator. A stray `\n` (some USB adapters
/// translate line endings) is stripped from either end of the line.
///
/// # Example
///
/// ```
/// use amplink_cambridge::protocol::{decode_reply, DecodeResult};
///
/// match decode_reply(b"#2,01,1\r") {
///     DecodeResult::Line { payload, consumed } => {
///         assert_eq!(payload, "#2,01,1");
///         assert_eq!(consumed, 8);
///     }
///     _ => panic!("expected Line"),
/// }
/// ```
pub fn decode_reply(buf: &[u8]) -> DecodeResult {
    let Some(term_pos) = buf.iter().position(|&b| b == TERMINATOR) else {
        return DecodeResult::Incomplete;
    };

    let consumed = term_pos + 1;
    let body = trim_newlines(&buf[..term_pos]);

    if !body.iter().all(|b| b.is_ascii() && !b.is_ascii_control()) {
        return DecodeResult::Invalid(consumed);
    }

    DecodeResult::Line {
        // All bytes are ASCII, so this cannot lose data.
        payload: String::from_utf8_lossy(body).into_owned(),
        consumed,
    }
}

fn trim_newlines(mut body: &[u8]) -> &[u8] {
    while let [b'\n', rest @ ..] = body {
        body = rest;
    }
    while let [rest @ .., b'\n'] = body {
        body = rest;
    }
    body
}

/// An error reported by the amplifier in place of a normal reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum DeviceError {
    /// `#0,01`
    #[error("the command group is invalid")]
    UnknownGroup,
    /// `#0,02`
    #[error("the command number is invalid for this group")]
    UnknownNumber,
    /// `#0,03`
    #[error("the data is not in the expected range")]
    DataError,
    /// `#0,04`
    #[error("the command is valid but can't be actioned")]
    NotAvailable,
}

impl DeviceError {
    /// The wire sentinel for this error.
    pub fn code(&self) -> &'static str {
        match self {
            DeviceError::UnknownGroup => "#0,01",
            DeviceError::UnknownNumber => "#0,02",
            DeviceError::DataError => "#0,03",
            DeviceError::NotAvailable => "#0,04",
        }
    }

    /// Recognise an exact error sentinel.
    pub fn from_payload(payload: &str) -> Option<Self> {
        match payload {
            "#0,01" => Some(DeviceError::UnknownGroup),
            "#0,02" => Some(DeviceError::UnknownNumber),
            "#0,03" => Some(DeviceError::DataError),
            "#0,04" => Some(DeviceError::NotAvailable),
            _ => None,
        }
    }
}

/// Outcome of one command exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A reply line that is not an error sentinel.
    Payload(String),
    /// The amplifier answered with one of the error sentinels.
    DeviceError(DeviceError),
    /// Nothing usable arrived before the read timeout.
    NoReply,
}

impl Reply {
    /// Classify a decoded reply line. Error sentinels are checked first; an
    /// empty line carries no information and counts as no reply.
    pub fn classify(payload: String) -> Self {
        if payload.is_empty() {
            return Reply::NoReply;
        }
        match DeviceError::from_payload(&payload) {
            Some(err) => Reply::DeviceError(err),
            None => Reply::Payload(payload),
        }
    }

    /// The payload, if the exchange produced one.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Reply::Payload(p) => Some(p),
            _ => None,
        }
    }

    /// Consume the reply, returning the payload if there was one.
    pub fn into_payload(self) -> Option<String> {
        match self {
            Reply::Payload(p) => Some(p),
            _ => None,
        }
    }
}

/// A parsed `#<group>,<number>,<value>` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triplet<'a> {
    pub group: u8,
    pub number: u8,
    pub value: &'a str,
}

/// Split a reply into group, number and value.
///
/// Returns `None` if the line does not start with `#`, does not have three
/// fields, or the group/number fields are not decimal.
pub fn parse_triplet(payload: &str) -> Option<Triplet<'_>> {
    let body = payload.strip_prefix('#')?;
    let mut fields = body.splitn(3, ',');
    let group = fields.next()?.trim().parse().ok()?;
    let number = fields.next()?.trim().parse().ok()?;
    let value = fields.next()?.trim();
    Some(Triplet {
        group,
        number,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------
    // encode_command
    // -------------------------------------------------------------------

    #[test]
    fn encode_without_param() {
        assert_eq!(encode_command("#1,01", None), b"#1,01\r");
    }

    #[test]
    fn encode_with_param() {
        assert_eq!(encode_command("#1,02", Some("1")), b"#1,02,1\r");
    }

    #[test]
    fn encode_negative_decibels() {
        assert_eq!(encode_command("#1,08", Some("-40")), b"#1,08,-40\r");
    }

    #[test]
    fn encode_full_source_code_without_param() {
        assert_eq!(encode_command("#3,04,11", None), b"#3,04,11\r");
    }

    // -------------------------------------------------------------------
    // decode_reply
    // -------------------------------------------------------------------

    #[test]
    fn decode_complete_line() {
        assert_eq!(
            decode_reply(b"#4,01,11\r"),
            DecodeResult::Line {
                payload: "#4,01,11".into(),
                consumed: 9,
            }
        );
    }

    #[test]
    fn decode_incomplete() {
        assert_eq!(decode_reply(b""), DecodeResult::Incomplete);
        assert_eq!(decode_reply(b"#2,01"), DecodeResult::Incomplete);
    }

    #[test]
    fn decode_leaves_trailing_bytes() {
        match decode_reply(b"#2,03,1\r#2,01") {
            DecodeResult::Line { payload, consumed } => {
                assert_eq!(payload, "#2,03,1");
                assert_eq!(consumed, 8);
            }
            other => panic!("expected Line, got {other:?}"),
        }
    }

    #[test]
    fn decode_strips_line_feeds() {
        match decode_reply(b"\n#2,01,0\n\r") {
            DecodeResult::Line { payload, .. } => assert_eq!(payload, "#2,01,0"),
            other => panic!("expected Line, got {other:?}"),
        }
    }

    #[test]
    fn decode_empty_line() {
        assert_eq!(
            decode_reply(b"\r"),
            DecodeResult::Line {
                payload: String::new(),
                consumed: 1,
            }
        );
    }

    #[test]
    fn decode_rejects_non_ascii() {
        assert_eq!(decode_reply(b"#2,\xff1\r"), DecodeResult::Invalid(6));
        assert_eq!(decode_reply(b"#2\x00\r"), DecodeResult::Invalid(4));
    }

    // -------------------------------------------------------------------
    // DeviceError / Reply
    // -------------------------------------------------------------------

    #[test]
    fn device_error_codes_round_trip() {
        for err in [
            DeviceError::UnknownGroup,
            DeviceError::UnknownNumber,
            DeviceError::DataError,
            DeviceError::NotAvailable,
        ] {
            assert_eq!(DeviceError::from_payload(err.code()), Some(err));
        }
    }

    #[test]
    fn device_error_requires_exact_match() {
        assert_eq!(DeviceError::from_payload("#0,05"), None);
        assert_eq!(DeviceError::from_payload("#0,01,1"), None);
        assert_eq!(DeviceError::from_payload(" #0,01"), None);
    }

    #[test]
    fn device_error_messages() {
        assert_eq!(
            DeviceError::NotAvailable.to_string(),
            "the command is valid but can't be actioned"
        );
        assert_eq!(
            DeviceError::UnknownGroup.to_string(),
            "the command group is invalid"
        );
    }

    #[test]
    fn classify_sentinels_have_no_payload() {
        for code in ["#0,01", "#0,02", "#0,03", "#0,04"] {
            let reply = Reply::classify(code.to_string());
            assert!(matches!(reply, Reply::DeviceError(_)), "{code}");
            assert_eq!(reply.payload(), None);
        }
    }

    #[test]
    fn classify_normal_reply() {
        let reply = Reply::classify("#2,01,1".to_string());
        assert_eq!(reply.payload(), Some("#2,01,1"));
        assert_eq!(reply.into_payload(), Some("#2,01,1".to_string()));
    }

    #[test]
    fn classify_empty_is_no_reply() {
        assert_eq!(Reply::classify(String::new()), Reply::NoReply);
        assert_eq!(Reply::NoReply.into_payload(), None);
    }

    // -------------------------------------------------------------------
    // parse_triplet
    // -------------------------------------------------------------------

    #[test]
    fn triplet_power_reply() {
        assert_eq!(
            parse_triplet("#2,01,1"),
            Some(Triplet {
                group: 2,
                number: 1,
                value: "1",
            })
        );
    }

    #[test]
    fn triplet_negative_value() {
        let t = parse_triplet("#6,05,-35").unwrap();
        assert_eq!(t.value, "-35");
    }

    #[test]
    fn triplet_rejects_malformed() {
        assert_eq!(parse_triplet("2,01,1"), None);
        assert_eq!(parse_triplet("#2,01"), None);
        assert_eq!(parse_triplet("#x,01,1"), None);
        assert_eq!(parse_triplet(""), None);
    }
}
