use crate::error::{Result, TallyError};
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Text encoding applied to every source of a batch.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding(&'static Encoding);

impl TextEncoding {
    pub const UTF_8: TextEncoding = TextEncoding(encoding_rs::UTF_8);
    pub const UTF_16LE: TextEncoding = TextEncoding(encoding_rs::UTF_16LE);
    pub const UTF_16BE: TextEncoding = TextEncoding(encoding_rs::UTF_16BE);
    pub const WINDOWS_1251: TextEncoding = TextEncoding(encoding_rs::WINDOWS_1251);

    /// Resolve a WHATWG encoding label (`utf-8`, `utf-16le`, `cp1251`, `koi8-r`, ...).
    pub fn for_label(label: &str) -> Result<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Self)
            .ok_or_else(|| TallyError::UnknownEncoding(label.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Strictly decode `bytes`.
    ///
    /// Returns `None` on the first malformed sequence. A byte-order mark is skipped
    /// only when it belongs to this encoding.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        let body = match Encoding::for_bom(bytes) {
            Some((bom_encoding, bom_len)) if bom_encoding == self.0 => &bytes[bom_len..],
            _ => bytes,
        };
        self.0
            .decode_without_bom_handling_and_without_replacement(body)
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::UTF_8
    }
}

impl FromStr for TextEncoding {
    type Err = TallyError;

    fn from_str(label: &str) -> Result<Self> {
        Self::for_label(label)
    }
}

impl fmt::Debug for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextEncoding").field(&self.name()).finish()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
