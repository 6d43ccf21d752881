//! Character string codecs.
//!
//! Three framings are provided; combine them with [`crate::variable`] to get length-prefixed
//! strings:
//!
//! - [`Text`]: exactly `n` code points, read with a [`CodePointReader`].
//! - [`RemainingText`]: everything left in the source.
//! - [`Padded`]: a fixed number of bytes, padded with a fill character.

use crate::{
    charset::Charset,
    code_point::CodePointReader,
    error::ErrorKind,
    util::{at_least, put},
    Codec, EncodeResult, Error,
};
use bytes::{Buf, BufMut};
use tracing::trace;

/// Exactly `code_points` characters in `charset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Text {
    charset: Charset,
    code_points: usize,
}

impl Text {
    /// Exactly `code_points` characters of `charset`.
    pub const fn new(charset: Charset, code_points: usize) -> Self {
        Self {
            charset,
            code_points,
        }
    }

    /// `code_points` characters of UTF-8.
    pub const fn utf8(code_points: usize) -> Self {
        Self::new(Charset::Utf8, code_points)
    }

    pub const fn charset(&self) -> Charset {
        self.charset
    }
}

impl Codec<String> for Text {
    fn encode(&self, value: &String, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let found = value.chars().count();
        if found != self.code_points {
            return Err(ErrorKind::InvalidLength {
                found,
                expected: self.code_points,
            }
            .into());
        }
        let encoded = self.charset.encode(value)?;
        let bytes = put(buf, &encoded)?;
        Ok(EncodeResult::new(found, bytes))
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<String, Error> {
        CodePointReader::new(buf, self.charset).read(self.code_points)
    }

    fn fixed_size(&self) -> Option<usize> {
        match self.charset {
            Charset::Ascii | Charset::Latin1 => Some(self.code_points),
            _ => None,
        }
    }
}

/// All remaining bytes of the source, decoded as `charset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemainingText {
    charset: Charset,
}

impl RemainingText {
    /// Every remaining byte, as text in `charset`.
    pub const fn new(charset: Charset) -> Self {
        Self { charset }
    }
}

impl Codec<String> for RemainingText {
    fn encode(&self, value: &String, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let encoded = self.charset.encode(value)?;
        let bytes = put(buf, &encoded)?;
        Ok(EncodeResult::new(value.chars().count(), bytes))
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<String, Error> {
        let len = buf.remaining();
        let bytes = buf.copy_to_bytes(len);
        self.charset.decode(&bytes)
    }
}

/// Which side of a [`Padded`] field holds the text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    /// Text first, fill after.
    #[default]
    Left,
    /// Fill first, text after.
    Right,
}

/// Text occupying exactly `len` bytes, filled out with `fill`.
///
/// Decoding strips every trailing (or, for [`Align::Right`], leading) `fill` character, so the
/// fill must not be a character the text itself can end with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Padded {
    charset: Charset,
    len: usize,
    fill: char,
    align: Align,
}

impl Padded {
    /// `len` bytes of `charset`, left aligned and filled with spaces.
    pub const fn new(charset: Charset, len: usize) -> Self {
        Self {
            charset,
            len,
            fill: ' ',
            align: Align::Left,
        }
    }

    pub const fn fill(mut self, fill: char) -> Self {
        self.fill = fill;
        self
    }

    pub const fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

impl Codec<String> for Padded {
    fn encode(&self, value: &String, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let text = self.charset.encode(value)?;
        if text.len() > self.len {
            return Err(ErrorKind::InvalidLength {
                found: text.len(),
                expected: self.len,
            }
            .into());
        }
        let fill = self.charset.encode(self.fill.encode_utf8(&mut [0; 4]))?;
        let gap = self.len - text.len();
        if fill.is_empty() || gap % fill.len() != 0 {
            return Err(ErrorKind::Config(format!(
                "fill {:?} cannot pad {gap} bytes of {}",
                self.fill, self.charset
            ))
            .into());
        }
        trace!(len = self.len, gap, "padding text");

        let padding = fill.repeat(gap / fill.len());
        let (first, second) = match self.align {
            Align::Left => (&text, &padding),
            Align::Right => (&padding, &text),
        };
        let bytes = put(buf, first)? + put(buf, second)?;
        Ok(EncodeResult::new(value.chars().count(), bytes))
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<String, Error> {
        at_least(buf, self.len)?;
        let bytes = buf.copy_to_bytes(self.len);
        let text = self.charset.decode(&bytes)?;
        let trimmed = match self.align {
            Align::Left => text.trim_end_matches(self.fill),
            Align::Right => text.trim_start_matches(self.fill),
        };
        Ok(trimmed.to_string())
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.len)
    }
}
