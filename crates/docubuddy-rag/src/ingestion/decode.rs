//! Byte-to-text decoding with configured fallbacks

use std::path::Path;

use crate::config::{DecodingConfig, TextEncoding};
use crate::error::{Error, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode `bytes` as UTF-8, then try each configured fallback in order
pub fn decode_text(path: &Path, bytes: &[u8], config: &DecodingConfig) -> Result<String> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return Ok(text.to_string());
    }

    for encoding in &config.fallbacks {
        if let Some(text) = decode_with(*encoding, bytes) {
            tracing::debug!(path = %path.display(), ?encoding, "Decoded with fallback encoding");
            return Ok(text);
        }
    }

    Err(Error::Decode {
        path: path.to_path_buf(),
    })
}

fn decode_with(encoding: TextEncoding, bytes: &[u8]) -> Option<String> {
    match encoding {
        TextEncoding::Utf16 => decode_utf16(bytes),
        TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// UTF-16 requires a byte-order mark; without one the bytes are not guessed at
fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (little_endian, body) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (true, rest),
        [0xFE, 0xFF, rest @ ..] => (false, rest),
        _ => return None,
    };
    if body.len() % 2 != 0 {
        return None;
    }

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    String::from_utf16(&units).ok()
}
