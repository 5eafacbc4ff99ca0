//! Byte stream to code point decoding at read-buffer granularity.
//!
//! A read may end in the middle of a multi-byte (or multi-unit) sequence.
//! The decoder withholds such a tail and prefixes it onto the next read, so
//! the rope only ever receives complete code points.

use std::char::REPLACEMENT_CHARACTER;
use std::fmt;
use std::mem;
use std::str::{self, FromStr};

use crate::error::BufferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    Latin1,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf32Le => "UTF-32LE",
            Encoding::Utf32Be => "UTF-32BE",
            Encoding::Latin1 => "ISO-8859-1",
        };
        f.write_str(name)
    }
}

impl FromStr for Encoding {
    type Err = BufferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "utf8" => Ok(Encoding::Utf8),
            "utf16le" => Ok(Encoding::Utf16Le),
            "utf16be" => Ok(Encoding::Utf16Be),
            "utf32le" => Ok(Encoding::Utf32Le),
            "utf32be" => Ok(Encoding::Utf32Be),
            "latin1" | "iso88591" => Ok(Encoding::Latin1),
            _ => Err(BufferError::UnknownEncoding(s.to_string())),
        }
    }
}

/// Result of byte order mark detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bom {
    pub encoding: Encoding,
    pub len: usize,
}

/// Number of leading bytes needed to tell every byte order mark apart.
pub const BOM_PROBE_LEN: usize = 4;

pub fn detect_bom(bytes: &[u8]) -> Option<Bom> {
    let bom = |encoding, len| Some(Bom { encoding, len });
    match bytes {
        [0xFF, 0xFE, 0x00, 0x00, ..] => bom(Encoding::Utf32Le, 4),
        [0x00, 0x00, 0xFE, 0xFF, ..] => bom(Encoding::Utf32Be, 4),
        [0xEF, 0xBB, 0xBF, ..] => bom(Encoding::Utf8, 3),
        [0xFF, 0xFE, ..] => bom(Encoding::Utf16Le, 2),
        [0xFE, 0xFF, ..] => bom(Encoding::Utf16Be, 2),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Decoder {
    encoding: Encoding,
    carry: Vec<u8>,
}

impl Decoder {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            carry: Vec::new(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Bytes withheld from the previous call.
    pub fn pending(&self) -> &[u8] {
        &self.carry
    }

    /// Decodes `bytes` after any withheld tail. Invalid sequences become
    /// U+FFFD; an incomplete trailing sequence is kept for the next call.
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<char> {
        let mut input = mem::take(&mut self.carry);
        input.extend_from_slice(bytes);

        let mut out = Vec::with_capacity(input.len());
        let consumed = match self.encoding {
            Encoding::Utf8 => decode_utf8(&input, &mut out),
            Encoding::Utf16Le => decode_utf16(&input, u16::from_le_bytes, &mut out),
            Encoding::Utf16Be => decode_utf16(&input, u16::from_be_bytes, &mut out),
            Encoding::Utf32Le => decode_utf32(&input, u32::from_le_bytes, &mut out),
            Encoding::Utf32Be => decode_utf32(&input, u32::from_be_bytes, &mut out),
            Encoding::Latin1 => {
                out.extend(input.iter().map(|&b| char::from(b)));
                input.len()
            }
        };

        // Keep any partial sequence for the next read
        self.carry = input.split_off(consumed);
        out
    }

    /// Flushes a withheld tail at end of stream.
    pub fn finish(&mut self) -> Vec<char> {
        if self.carry.is_empty() {
            return Vec::new();
        }
        self.carry.clear();
        vec![REPLACEMENT_CHARACTER]
    }
}

fn decode_utf8(input: &[u8], out: &mut Vec<char>) -> usize {
    let mut pos = 0;
    while pos < input.len() {
        match str::from_utf8(&input[pos..]) {
            Ok(valid) => {
                out.extend(valid.chars());
                return input.len();
            }
            Err(err) => {
                let valid_len = err.valid_up_to();
                if let Ok(valid) = str::from_utf8(&input[pos..pos + valid_len]) {
                    out.extend(valid.chars());
                }
                match err.error_len() {
                    Some(invalid_len) => {
                        out.push(REPLACEMENT_CHARACTER);
                        pos += valid_len + invalid_len;
                    }
                    None => return pos + valid_len,
                }
            }
        }
    }
    pos
}

fn decode_utf16(input: &[u8], unit: fn([u8; 2]) -> u16, out: &mut Vec<char>) -> usize {
    let mut units: Vec<u16> = input
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    if units
        .last()
        .is_some_and(|&last| (0xD800..=0xDBFF).contains(&last))
    {
        // high surrogate waiting for its pair
        units.pop();
    }
    out.extend(
        char::decode_utf16(units.iter().copied())
            .map(|c| c.unwrap_or(REPLACEMENT_CHARACTER)),
    );
    units.len() * 2
}

fn decode_utf32(input: &[u8], unit: fn([u8; 4]) -> u32, out: &mut Vec<char>) -> usize {
    let mut consumed = 0;
    for quad in input.chunks_exact(4) {
        let value = unit([quad[0], quad[1], quad[2], quad[3]]);
        out.push(char::from_u32(value).unwrap_or(REPLACEMENT_CHARACTER));
        consumed += 4;
    }
    consumed
}
