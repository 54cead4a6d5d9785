//! Character encodings a client may declare for its input files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BOM_BE: [u8; 2] = [0xFE, 0xFF];
const BOM_LE: [u8; 2] = [0xFF, 0xFE];

/// A declared character encoding.
///
/// Decoding is strict: bytes that are not valid for the encoding are
/// rejected rather than replaced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Charset {
    /// UTF-8
    #[default]
    #[serde(rename = "UTF-8")]
    Utf8,
    /// UTF-16 with an optional byte-order mark, big-endian when absent.
    /// Encoding writes a big-endian byte-order mark.
    #[serde(rename = "UTF-16")]
    Utf16,
    /// UTF-16, big-endian, no byte-order mark handling
    #[serde(rename = "UTF-16BE")]
    Utf16Be,
    /// UTF-16, little-endian, no byte-order mark handling
    #[serde(rename = "UTF-16LE")]
    Utf16Le,
    /// ISO-8859-1 (Latin-1)
    #[serde(rename = "ISO-8859-1")]
    Latin1,
    /// 7-bit US-ASCII
    #[serde(rename = "US-ASCII")]
    Ascii,
}

/// A charset label that is not one of the supported encodings.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported charset: {0}")]
pub struct UnsupportedCharset(pub String);

impl Charset {
    /// Canonical label of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Utf16 => "UTF-16",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "US-ASCII",
        }
    }

    /// Parse a wire label, treating an empty label as UTF-8.
    pub fn from_label(label: &str) -> Result<Self, UnsupportedCharset> {
        if label.trim().is_empty() {
            return Ok(Charset::Utf8);
        }
        label.parse()
    }

    /// Decode `bytes`, returning `None` if they are invalid for this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            Charset::Utf16 => {
                if let Some(rest) = bytes.strip_prefix(&BOM_BE) {
                    decode_utf16(rest, u16::from_be_bytes)
                } else if let Some(rest) = bytes.strip_prefix(&BOM_LE) {
                    decode_utf16(rest, u16::from_le_bytes)
                } else {
                    decode_utf16(bytes, u16::from_be_bytes)
                }
            }
            Charset::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
            Charset::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Charset::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            Charset::Ascii => {
                if bytes.is_ascii() {
                    Some(bytes.iter().map(|&b| char::from(b)).collect())
                } else {
                    None
                }
            }
        }
    }

    /// Encode `text`, returning `None` if it has characters the encoding
    /// cannot represent.
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Charset::Utf8 => Some(text.as_bytes().to_vec()),
            Charset::Utf16 => {
                let mut out = BOM_BE.to_vec();
                out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                Some(out)
            }
            Charset::Utf16Be => Some(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Charset::Utf16Le => Some(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            Charset::Latin1 => text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect(),
            Charset::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { Some(c as u8) } else { None })
                .collect(),
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

impl FromStr for Charset {
    type Err = UnsupportedCharset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Ok(Charset::Utf8),
            "UTF-16" | "UTF16" => Ok(Charset::Utf16),
            "UTF-16BE" | "UTF16BE" => Ok(Charset::Utf16Be),
            "UTF-16LE" | "UTF16LE" => Ok(Charset::Utf16Le),
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" => Ok(Charset::Latin1),
            "US-ASCII" | "ASCII" => Ok(Charset::Ascii),
            _ => Err(UnsupportedCharset(s.to_string())),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!("utf-8".parse::<Charset>().unwrap(), Charset::Utf8);
        assert_eq!("UTF-16".parse::<Charset>().unwrap(), Charset::Utf16);
        assert_eq!("latin1".parse::<Charset>().unwrap(), Charset::Latin1);
        assert_eq!(Charset::from_label("").unwrap(), Charset::Utf8);
        assert_eq!(
            "EBCDIC".parse::<Charset>(),
            Err(UnsupportedCharset("EBCDIC".to_string()))
        );
    }

    #[test]
    fn test_utf16_writes_big_endian_bom() {
        let bytes = Charset::Utf16.encode("ab").unwrap();
        assert_eq!(bytes, vec![0xFE, 0xFF, 0x00, b'a', 0x00, b'b']);
        assert_eq!(Charset::Utf16.decode(&bytes).unwrap(), "ab");
    }

    #[test]
    fn test_utf16_honours_little_endian_bom() {
        let bytes = [0xFF, 0xFE, b'h', 0x00, b'i', 0x00];
        assert_eq!(Charset::Utf16.decode(&bytes).unwrap(), "hi");
    }

    #[test]
    fn test_utf16_odd_length_is_rejected() {
        assert!(Charset::Utf16Le.decode(&[b'a', 0x00, b'b']).is_none());
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert!(Charset::Utf8.decode(&[0xC3, 0x28]).is_none());
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert!(Charset::Ascii.decode(&[b'a', 0xE9]).is_none());
        assert_eq!(Charset::Latin1.decode(&[b'a', 0xE9]).unwrap(), "a\u{e9}");
    }

    #[test]
    fn test_latin1_cannot_encode_wide_chars() {
        assert!(Charset::Latin1.encode("snow \u{2603}").is_none());
        assert_eq!(Charset::Latin1.encode("caf\u{e9}").unwrap(), b"caf\xE9");
    }
}
