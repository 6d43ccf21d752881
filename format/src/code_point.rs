//! Reading an exact number of code points from a byte source.
//!
//! Text fields are frequently followed by other fields in the same buffer, so a reader must
//! never consume a byte past the last code point it returns. Two strategies provide this:
//!
//! - [`Strategy::Buffered`] is used when the whole remaining source is visible as one contiguous
//!   chunk (slices, [`bytes::Bytes`], [`bytes::BytesMut`]). It inspects a window of up to
//!   `count * 4` bytes without consuming anything, finds where the `count`-th code point ends,
//!   and then advances the source by exactly that many bytes.
//! - [`Strategy::Unbuffered`] is used for forward-only sources (e.g. chained buffers). It pulls
//!   one byte at a time into an incremental [`Decoder`] until each code point is complete.
//!
//! Both strategies consume the same bytes for the same input.

use crate::{
    charset::{Charset, Decoder},
    error::ErrorKind,
    Error,
};
use bytes::Buf;
use std::ops::Range;
use tracing::trace;

const HIGH_SURROGATES: Range<u32> = 0xD800..0xDC00;
const LOW_SURROGATES: Range<u32> = 0xDC00..0xE000;

/// How a [`CodePointReader`] avoids over-reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Speculatively decode from the visible chunk, then advance exactly.
    Buffered,
    /// Decode one byte at a time.
    Unbuffered,
}

/// Reads exact counts of code points from `buf`.
pub struct CodePointReader<'a> {
    buf: &'a mut dyn Buf,
    charset: Charset,
    strategy: Strategy,
}

impl<'a> CodePointReader<'a> {
    /// Creates a reader, choosing [`Strategy::Buffered`] if the source is contiguous.
    pub fn new(buf: &'a mut dyn Buf, charset: Charset) -> Self {
        let strategy = if buf.chunk().len() == buf.remaining() {
            Strategy::Buffered
        } else {
            Strategy::Unbuffered
        };
        trace!(%charset, ?strategy, "selected code point strategy");
        Self {
            buf,
            charset,
            strategy,
        }
    }

    /// Creates a reader with an explicit strategy.
    ///
    /// [`Strategy::Buffered`] requires a contiguous source.
    pub fn with_strategy(
        buf: &'a mut dyn Buf,
        charset: Charset,
        strategy: Strategy,
    ) -> Result<Self, Error> {
        if strategy == Strategy::Buffered && buf.chunk().len() != buf.remaining() {
            return Err(ErrorKind::Config(
                "buffered code point reading requires a contiguous source".into(),
            )
            .into());
        }
        Ok(Self {
            buf,
            charset,
            strategy,
        })
    }

    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub const fn charset(&self) -> Charset {
        self.charset
    }

    /// Reads exactly `count` code points.
    ///
    /// Fails with [`ErrorKind::EndOfStream`] if the source holds fewer, with
    /// [`ErrorKind::Truncated`] if it ends inside a code point, and with
    /// [`ErrorKind::Malformed`] if the bytes are not valid in the charset.
    pub fn read(&mut self, count: usize) -> Result<String, Error> {
        if count == 0 {
            return Ok(String::new());
        }
        match self.strategy {
            Strategy::Buffered => self.read_buffered(count),
            Strategy::Unbuffered => {
                let buf = &mut *self.buf;
                let (text, _) = decode_count(self.charset, count, || {
                    buf.has_remaining().then(|| buf.get_u8())
                })?;
                Ok(text)
            }
        }
    }

    fn read_buffered(&mut self, count: usize) -> Result<String, Error> {
        let window_len = count
            .saturating_mul(self.charset.max_bytes_per_code_point())
            .min(self.buf.remaining());
        let chunk = self.buf.chunk();
        let window = &chunk[..window_len.min(chunk.len())];

        let (text, used) = match utf8_prefix(self.charset, window, count) {
            Some(found) => found,
            None => {
                let mut bytes = window.iter().copied();
                decode_count(self.charset, count, || bytes.next())?
            }
        };
        self.buf.advance(used);
        Ok(text)
    }
}

/// Fast path: the first `count` code points of a UTF-8 window, if all of them are valid.
fn utf8_prefix(charset: Charset, window: &[u8], count: usize) -> Option<(String, usize)> {
    if charset != Charset::Utf8 {
        return None;
    }
    let valid = match std::str::from_utf8(window) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&window[..e.valid_up_to()]).ok()?,
    };
    let end = valid
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(valid.len()))
        .nth(count)?;
    Some((valid[..end].to_owned(), end))
}

/// Why a code point could not be produced.
enum Stop {
    Truncated,
    Malformed,
}

/// A byte supplier that counts what it hands out.
struct Pull<F> {
    next: F,
    pulled: usize,
}

impl<F: FnMut() -> Option<u8>> Pull<F> {
    fn new(next: F) -> Self {
        Self { next, pulled: 0 }
    }

    fn byte(&mut self) -> Option<u8> {
        let byte = (self.next)();
        if byte.is_some() {
            self.pulled += 1;
        }
        byte
    }

    fn error(&self, charset: Charset, stop: Stop) -> Error {
        match stop {
            Stop::Truncated => ErrorKind::Truncated(charset),
            Stop::Malformed => ErrorKind::Malformed {
                charset,
                offset: self.pulled.saturating_sub(1),
            },
        }
        .into()
    }
}

fn next_unit<F: FnMut() -> Option<u8>>(
    decoder: &mut Decoder,
    pull: &mut Pull<F>,
) -> Result<Option<u32>, Stop> {
    loop {
        let Some(byte) = pull.byte() else {
            return if decoder.in_sequence() {
                Err(Stop::Truncated)
            } else {
                Ok(None)
            };
        };
        if let Some(unit) = decoder.push(byte).map_err(|_| Stop::Malformed)? {
            return Ok(Some(unit));
        }
    }
}

/// Pulls bytes until one code point is complete. Returns `None` on a clean end of input.
fn next_code_point<F: FnMut() -> Option<u8>>(
    decoder: &mut Decoder,
    pull: &mut Pull<F>,
) -> Result<Option<char>, Stop> {
    let Some(unit) = next_unit(decoder, pull)? else {
        return Ok(None);
    };
    let code = if decoder.charset().has_surrogates() && HIGH_SURROGATES.contains(&unit) {
        let low = next_unit(decoder, pull)?.ok_or(Stop::Truncated)?;
        if !LOW_SURROGATES.contains(&low) {
            return Err(Stop::Malformed);
        }
        0x10000 + ((unit - HIGH_SURROGATES.start) << 10) + (low - LOW_SURROGATES.start)
    } else {
        unit
    };

    // Lone low surrogates are rejected here.
    char::from_u32(code).map(Some).ok_or(Stop::Malformed)
}

/// Decodes exactly `count` code points, returning them and the number of bytes used.
fn decode_count(
    charset: Charset,
    count: usize,
    next: impl FnMut() -> Option<u8>,
) -> Result<(String, usize), Error> {
    let mut decoder = charset.decoder();
    let mut pull = Pull::new(next);
    let mut text = String::new();
    for read in 0..count {
        match next_code_point(&mut decoder, &mut pull) {
            Ok(Some(ch)) => text.push(ch),
            Ok(None) => {
                return Err(ErrorKind::EndOfStream {
                    unit: "code points",
                    read,
                    requested: count,
                }
                .into())
            }
            Err(stop) => return Err(pull.error(charset, stop)),
        }
    }
    Ok((text, pull.pulled))
}

/// Decodes every byte of `bytes`.
pub(crate) fn decode_all(charset: Charset, bytes: &[u8]) -> Result<String, Error> {
    let mut decoder = charset.decoder();
    let mut iter = bytes.iter().copied();
    let mut pull = Pull::new(|| iter.next());
    let mut text = String::with_capacity(bytes.len());
    loop {
        match next_code_point(&mut decoder, &mut pull) {
            Ok(Some(ch)) => text.push(ch),
            Ok(None) => return Ok(text),
            Err(stop) => return Err(pull.error(charset, stop)),
        }
    }
}
