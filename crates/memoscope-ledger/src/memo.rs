use data_encoding::{DecodeKind, HEXLOWER_PERMISSIVE, HEXUPPER};

/// Why a memo payload could not be turned into text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoDecodeError {
    #[error("memo payload is empty")]
    Empty,

    #[error("memo payload has odd hex length {0}")]
    OddLength(usize),

    #[error("memo payload has a non-hex character at offset {0}")]
    InvalidHex(usize),

    #[error("memo payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Decode a hex memo payload (optionally `0x`-prefixed, either case) to text.
pub fn decode_memo(raw: &str) -> Result<String, MemoDecodeError> {
    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    if hex.is_empty() {
        return Err(MemoDecodeError::Empty);
    }
    if hex.len() % 2 != 0 {
        return Err(MemoDecodeError::OddLength(hex.len()));
    }

    let bytes = HEXLOWER_PERMISSIVE
        .decode(hex.as_bytes())
        .map_err(|err| match err.kind {
            DecodeKind::Length => MemoDecodeError::OddLength(hex.len()),
            _ => MemoDecodeError::InvalidHex(err.position),
        })?;

    String::from_utf8(bytes).map_err(|_| MemoDecodeError::InvalidUtf8)
}

/// Encode text the way ledger clients attach memos (uppercase hex).
pub fn encode_memo(text: &str) -> String {
    HEXUPPER.encode(text.as_bytes())
}
