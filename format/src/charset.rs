//! Text encodings understood by the text codecs.
//!
//! Each [`Charset`] can encode a whole string and can decode incrementally: a [`Decoder`] is fed
//! one byte at a time and reports a code unit as soon as one is complete. For UTF-16 a unit is a
//! 16-bit value (possibly half of a surrogate pair); for every other charset a unit is already a
//! full code point. Assembling units into code points lives in [`crate::code_point`].

use crate::{error::ErrorKind, Error};
use std::fmt;

/// A text encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Charset {
    /// 7-bit US-ASCII.
    Ascii,
    /// ISO-8859-1, one byte per code point `U+0000..=U+00FF`.
    Latin1,
    #[default]
    Utf8,
    Utf16Be,
    Utf16Le,
}

impl Charset {
    /// Upper bound on the bytes one code point occupies.
    pub const fn max_bytes_per_code_point(self) -> usize {
        match self {
            Self::Ascii | Self::Latin1 => 1,
            Self::Utf8 | Self::Utf16Be | Self::Utf16Le => 4,
        }
    }

    /// Returns true if code units of this charset may be surrogate halves.
    pub(crate) const fn has_surrogates(self) -> bool {
        matches!(self, Self::Utf16Be | Self::Utf16Le)
    }

    /// Returns a fresh incremental decoder.
    pub const fn decoder(self) -> Decoder {
        Decoder {
            charset: self,
            pending: [0; 4],
            len: 0,
            need: 0,
        }
    }

    /// Encodes `text`, failing on the first character this charset cannot represent.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, Error> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Ascii | Self::Latin1 => {
                let limit = if self == Self::Ascii { 0x7F } else { 0xFF };
                text.chars()
                    .map(|ch| {
                        u8::try_from(u32::from(ch))
                            .ok()
                            .filter(|b| u32::from(*b) <= limit)
                            .ok_or_else(|| Error::from(ErrorKind::Unmappable { charset: self, ch }))
                    })
                    .collect()
            }
            Self::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Self::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        }
    }

    /// Decodes all of `bytes`.
    ///
    /// Fails if the bytes end inside a multi-byte sequence or are malformed.
    pub fn decode(self, bytes: &[u8]) -> Result<String, Error> {
        if self == Self::Utf8 {
            return std::str::from_utf8(bytes).map(str::to_owned).map_err(|e| {
                match e.error_len() {
                    None => ErrorKind::Truncated(self),
                    Some(_) => ErrorKind::Malformed {
                        charset: self,
                        offset: e.valid_up_to(),
                    },
                }
                .into()
            });
        }
        crate::code_point::decode_all(self, bytes)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascii => "US-ASCII",
            Self::Latin1 => "ISO-8859-1",
            Self::Utf8 => "UTF-8",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf16Le => "UTF-16LE",
        })
    }
}

/// The byte just pushed cannot continue (or start) a valid sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Invalid;

/// Incremental, byte-at-a-time decoder of code units.
#[derive(Clone, Debug)]
pub struct Decoder {
    charset: Charset,
    pending: [u8; 4],
    len: u8,
    need: u8,
}

impl Decoder {
    pub const fn charset(&self) -> Charset {
        self.charset
    }

    /// Returns true if bytes of an incomplete unit are buffered.
    pub const fn in_sequence(&self) -> bool {
        self.len > 0
    }

    /// Feeds one byte.
    ///
    /// Returns `Ok(Some(unit))` when the byte completes a code unit, `Ok(None)` when more bytes
    /// are needed.
    pub fn push(&mut self, byte: u8) -> Result<Option<u32>, Invalid> {
        match self.charset {
            Charset::Ascii if byte > 0x7F => Err(Invalid),
            Charset::Ascii | Charset::Latin1 => Ok(Some(u32::from(byte))),
            Charset::Utf8 => self.push_utf8(byte),
            Charset::Utf16Be | Charset::Utf16Le => {
                self.pending[usize::from(self.len)] = byte;
                self.len += 1;
                if self.len < 2 {
                    return Ok(None);
                }
                let pair = [self.pending[0], self.pending[1]];
                self.len = 0;
                let unit = if self.charset == Charset::Utf16Be {
                    u16::from_be_bytes(pair)
                } else {
                    u16::from_le_bytes(pair)
                };
                Ok(Some(u32::from(unit)))
            }
        }
    }

    fn push_utf8(&mut self, byte: u8) -> Result<Option<u32>, Invalid> {
        if self.len == 0 {
            self.need = match byte {
                0x00..=0x7F => return Ok(Some(u32::from(byte))),
                0xC2..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF4 => 4,
                _ => return Err(Invalid),
            };
        } else if byte & 0xC0 != 0x80 {
            self.len = 0;
            return Err(Invalid);
        }
        self.pending[usize::from(self.len)] = byte;
        self.len += 1;
        if self.len < self.need {
            return Ok(None);
        }

        // Overlong forms and encoded surrogates only show once the sequence is complete.
        let sequence = &self.pending[..usize::from(self.len)];
        self.len = 0;
        std::str::from_utf8(sequence)
            .ok()
            .and_then(|s| s.chars().next())
            .map(|ch| Some(u32::from(ch)))
            .ok_or(Invalid)
    }
}
