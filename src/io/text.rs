//! Text codec helpers for `read_text` / `write_text`
//!
//! Encodings are looked up by WHATWG label through `encoding_rs`. The error
//! policy decides what happens to bytes that do not decode, or characters
//! the target encoding cannot represent.

use encoding_rs::{DecoderResult, EncoderResult, Encoding, UTF_16BE, UTF_16LE, UTF_8};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const DEFAULT_ENCODING: &str = "utf-8";

const NEWLINES: [&str; 4] = ["", "\n", "\r", "\r\n"];

/// How codec failures are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Errors {
    /// Fail on the first undecodable byte or unencodable character
    #[default]
    Strict,
    /// Substitute U+FFFD when decoding and `?` when encoding
    Replace,
    /// Drop the offending input
    Ignore,
}

impl FromStr for Errors {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(Errors::Strict),
            "replace" => Ok(Errors::Replace),
            "ignore" => Ok(Errors::Ignore),
            other => Err(Error::UnknownErrorPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Errors::Strict => "strict",
            Errors::Replace => "replace",
            Errors::Ignore => "ignore",
        })
    }
}

/// Codec options for text reads and writes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextOptions {
    pub encoding: Option<String>,
    pub errors: Errors,
    pub newline: Option<String>,
}

impl TextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn errors(mut self, errors: Errors) -> Self {
        self.errors = errors;
        self
    }

    pub fn newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = Some(newline.into());
        self
    }

    pub fn resolve_encoding(&self) -> Result<&'static Encoding> {
        resolve_encoding(self.encoding.as_deref())
    }
}

/// Look up an encoding label, defaulting to UTF-8
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    let label = label.unwrap_or(DEFAULT_ENCODING).trim();
    let lowered = label.to_ascii_lowercase();
    let candidates = [
        lowered.clone(),
        lowered.replace('_', "-"),
        match lowered.as_str() {
            "cp932" => "windows-31j".to_string(),
            "latin-1" | "latin_1" => "latin1".to_string(),
            _ => lowered.clone(),
        },
    ];
    candidates
        .iter()
        .find_map(|c| Encoding::for_label(c.as_bytes()))
        .ok_or_else(|| Error::UnknownEncoding(label.to_string()))
}

/// Decode `bytes` under the given error policy. No BOM sniffing happens.
pub fn decode(bytes: &[u8], encoding: &'static Encoding, errors: Errors) -> Result<String> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut out = String::with_capacity(
        decoder
            .max_utf8_buffer_length_without_replacement(bytes.len())
            .unwrap_or(bytes.len()),
    );
    let mut consumed = 0;
    loop {
        let (result, read) =
            decoder.decode_to_string_without_replacement(&bytes[consumed..], &mut out, true);
        consumed += read;
        match result {
            DecoderResult::InputEmpty => return Ok(out),
            DecoderResult::OutputFull => {
                let needed = decoder
                    .max_utf8_buffer_length_without_replacement(bytes.len() - consumed)
                    .unwrap_or(0);
                out.reserve(needed.max(16));
            }
            DecoderResult::Malformed(bad, extra) => match errors {
                Errors::Strict => {
                    return Err(Error::Decode {
                        encoding: encoding.name().to_string(),
                        position: consumed.saturating_sub(bad as usize + extra as usize),
                    })
                }
                Errors::Replace => out.push('\u{FFFD}'),
                Errors::Ignore => {}
            },
        }
    }
}

/// Encode `text` under the given error policy
pub fn encode(text: &str, encoding: &'static Encoding, errors: Errors) -> Result<Vec<u8>> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    // encoding_rs only decodes UTF-16; every char is representable, no BOM
    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    if encoding.output_encoding() != encoding {
        return Err(Error::ReadOnlyEncoding(encoding.name().to_string()));
    }

    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(
        encoder
            .max_buffer_length_from_utf8_without_replacement(text.len())
            .unwrap_or(text.len()),
    );
    let mut consumed = 0;
    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(&text[consumed..], &mut out, true);
        consumed += read;
        match result {
            EncoderResult::InputEmpty => return Ok(out),
            EncoderResult::OutputFull => {
                let needed = encoder
                    .max_buffer_length_from_utf8_without_replacement(text.len() - consumed)
                    .unwrap_or(0);
                out.reserve(needed.max(16));
            }
            EncoderResult::Unmappable(character) => match errors {
                Errors::Strict => {
                    return Err(Error::Encode {
                        encoding: encoding.name().to_string(),
                        character,
                    })
                }
                Errors::Replace => out.push(b'?'),
                Errors::Ignore => {}
            },
        }
    }
}

/// Replace every `\n` with `newline`.
///
/// The replacement is naive: an existing `\r\n` becomes `\r\r\n` when the
/// newline is `\r\n`.
pub fn translate_newlines<'a>(data: &'a str, newline: Option<&str>) -> Result<Cow<'a, str>> {
    match newline {
        None => Ok(Cow::Borrowed(data)),
        Some(nl) if NEWLINES.contains(&nl) => Ok(Cow::Owned(data.replace('\n', nl))),
        Some(nl) => Err(Error::InvalidNewline(nl.to_string())),
    }
}
