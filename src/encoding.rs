//! Character encodings a subtitle stream can be decoded with.
//!
//! The encoding is always supplied by the caller. Nothing in here tries to
//! guess it from the content.

use std::{fmt::Display, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1, every byte maps to the code point of the same value.
    Latin1,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown encoding `{0}`")]
pub struct UnknownEncoding(pub String);

/// The bytes could not be decoded with the requested encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stream is not valid {0}")]
pub struct DecodeError(pub Encoding);

impl Encoding {
    pub const fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Latin1 => "iso-8859-1",
        }
    }

    /// The byte order mark for this encoding, if it has one.
    const fn bom(&self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            Encoding::Utf16Le => &[0xFF, 0xFE],
            Encoding::Utf16Be => &[0xFE, 0xFF],
            Encoding::Latin1 => &[],
        }
    }

    fn strip_bom<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        bytes.strip_prefix(self.bom()).unwrap_or(bytes)
    }

    fn code_units(self, bytes: &[u8]) -> impl Iterator<Item = u16> + '_ {
        let big_endian = matches!(self, Encoding::Utf16Be);
        bytes.chunks_exact(2).map(move |pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
    }

    /// Decodes `bytes`, stripping a leading byte order mark.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let bytes = self.strip_bom(bytes);
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError(*self)),
            Encoding::Utf16Le | Encoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(DecodeError(*self));
                }
                char::decode_utf16(self.code_units(bytes))
                    .collect::<Result<String, _>>()
                    .map_err(|_| DecodeError(*self))
            }
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Decodes `bytes` replacing anything invalid with U+FFFD.
    ///
    /// A trailing odd byte in UTF-16 input is also replaced.
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        let bytes = self.strip_bom(bytes);
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Le | Encoding::Utf16Be => {
                let mut buffer: String = char::decode_utf16(self.code_units(bytes))
                    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect();
                if bytes.len() % 2 != 0 {
                    buffer.push(char::REPLACEMENT_CHARACTER);
                }
                buffer
            }
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "unicode-1-1-utf-8" => Ok(Encoding::Utf8),
            "utf-16le" | "utf-16" | "utf16le" | "utf16" => Ok(Encoding::Utf16Le),
            "utf-16be" | "utf16be" => Ok(Encoding::Utf16Be),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => Ok(Encoding::Latin1),
            _ => Err(UnknownEncoding(s.to_owned())),
        }
    }
}
