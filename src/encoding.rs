//! Byte-order-mark detection and transcoding to UTF-8
//!
//! Runs over the whole input before any tokenizing so that line numbers are
//! always counted on decoded text.

use std::borrow::Cow;

use crate::error::{ParseError, Result};

const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF16_BE: &[u8] = &[0xFE, 0xFF];

/// Encoding announced by the leading byte-order mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// No mark, bytes taken as UTF-8 (lossily)
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Inspect the leading bytes. Only an explicit mark counts; there is no sniffing.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(BOM_UTF8) {
            TextEncoding::Utf8Bom
        } else if bytes.starts_with(BOM_UTF16_LE) {
            TextEncoding::Utf16Le
        } else if bytes.starts_with(BOM_UTF16_BE) {
            TextEncoding::Utf16Be
        } else {
            TextEncoding::Utf8
        }
    }

    fn bom_len(self) -> usize {
        match self {
            TextEncoding::Utf8 => 0,
            TextEncoding::Utf8Bom => BOM_UTF8.len(),
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => 2,
        }
    }
}

/// Decode raw bytes into text, stripping any byte-order mark
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let encoding = TextEncoding::detect(bytes);
    let offset = encoding.bom_len();
    let body = &bytes[offset..];

    match encoding {
        // Without a UTF-16 mark bytes pass through; stray bytes become U+FFFD
        TextEncoding::Utf8 | TextEncoding::Utf8Bom => Ok(String::from_utf8_lossy(body)),
        TextEncoding::Utf16Le => decode_utf16(body, offset, u16::from_le_bytes).map(Cow::Owned),
        TextEncoding::Utf16Be => decode_utf16(body, offset, u16::from_be_bytes).map(Cow::Owned),
    }
}

fn decode_utf16(body: &[u8], offset: usize, unit: fn([u8; 2]) -> u16) -> Result<String> {
    if body.len() % 2 != 0 {
        return Err(ParseError::encoding(
            offset + body.len() - 1,
            "truncated UTF-16 code unit",
        ));
    }

    let units = body.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    let mut text = String::with_capacity(body.len() / 2);
    let mut unit_idx = 0;

    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(ch) => {
                text.push(ch);
                unit_idx += ch.len_utf16();
            }
            Err(e) => {
                return Err(ParseError::encoding(
                    offset + unit_idx * 2,
                    format!("unpaired surrogate 0x{:04X}", e.unpaired_surrogate()),
                ));
            }
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str) -> Vec<u8> {
        let mut bytes = BOM_UTF16_LE.to_vec();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_plain_utf8_is_borrowed() {
        let decoded = decode(b"attrs==20.3.0\n").unwrap();
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, "attrs==20.3.0\n");
    }

    #[test]
    fn test_utf16le_with_bom() {
        let bytes = utf16le("attrs==20.3.0\r\n");
        assert_eq!(TextEncoding::detect(&bytes), TextEncoding::Utf16Le);
        assert_eq!(decode(&bytes).unwrap(), "attrs==20.3.0\r\n");
    }

    #[test]
    fn test_utf16be_with_bom() {
        let mut bytes = BOM_UTF16_BE.to_vec();
        for unit in "six==1.16.0".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode(&bytes).unwrap(), "six==1.16.0");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = BOM_UTF8.to_vec();
        bytes.extend_from_slice(b"click==8.0.0");
        assert_eq!(decode(&bytes).unwrap(), "click==8.0.0");
    }

    #[test]
    fn test_truncated_utf16() {
        let mut bytes = utf16le("ab");
        bytes.push(b'c');
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::Encoding { offset: 6, .. }));
    }

    #[test]
    fn test_unpaired_surrogate() {
        let mut bytes = BOM_UTF16_LE.to_vec();
        bytes.extend_from_slice(&0x0061u16.to_le_bytes());
        bytes.extend_from_slice(&0xD800u16.to_le_bytes());
        bytes.extend_from_slice(&0x0062u16.to_le_bytes());
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::Encoding { offset: 4, .. }));
    }

    #[test]
    fn test_surrogate_pairs_decode() {
        let bytes = utf16le("emoji==\u{1F600}");
        assert_eq!(decode(&bytes).unwrap(), "emoji==\u{1F600}");
    }

    #[test]
    fn test_invalid_utf8_without_bom_passes_through() {
        let decoded = decode(b"# caf\xe9\nFlask==2.0.0\n").unwrap();
        assert_eq!(decoded, "# caf\u{FFFD}\nFlask==2.0.0\n");
        assert_eq!(decode(&[b'a', b'b', 0xC3, 0x28]).unwrap(), "ab\u{FFFD}(");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode(b"").unwrap(), "");
        assert_eq!(decode(BOM_UTF16_LE).unwrap(), "");
    }
}
