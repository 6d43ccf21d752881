//! Variable-length values framed by a length prefix.
//!
//! Two framings are supported:
//!
//! - [`ByteCountPrefixed`]: the prefix is the number of bytes the value occupies. The inner
//!   codec sees a source bounded to exactly that many bytes and must consume all of them.
//! - [`ItemCountPrefixed`]: the prefix is a logical count (code points, digits, items) and a
//!   factory builds the codec for that count.
//!
//! Prefixes read from the wire are checked against a [`RangeCfg`] before any payload is read.
//!
//! ```
//! use commonware_format::{charset::Charset, primitives::Len, text::RemainingText, variable::ByteCountPrefixed, CodecExt};
//!
//! let codec = ByteCountPrefixed::new(Len::U8, RemainingText::new(Charset::Utf8));
//! let encoded = codec.encode_to_bytes(&"hi".to_string()).unwrap();
//! assert_eq!(&encoded[..], &[0x02, b'h', b'i']);
//! assert_eq!(codec.decode_exact(encoded).unwrap(), "hi");
//! ```

use crate::{
    charset::Charset,
    digits::Digits,
    error::ErrorKind,
    list::FixedList,
    text::Text,
    util::{at_least, put},
    Codec, EncodeResult, Error, RangeCfg,
};
use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

/// A value preceded by its encoded length in bytes.
#[derive(Clone, Debug)]
pub struct ByteCountPrefixed<L, C> {
    len: L,
    codec: C,
    range: RangeCfg,
}

impl<L: Codec<usize>, C> ByteCountPrefixed<L, C> {
    /// `codec`'s bytes preceded by their number, written with `len`.
    pub fn new(len: L, codec: C) -> Self {
        Self {
            len,
            codec,
            range: RangeCfg::unbounded(),
        }
    }

    /// Rejects byte counts outside `range` (on both encode and decode).
    pub fn with_range(mut self, range: impl Into<RangeCfg>) -> Self {
        self.range = range.into();
        self
    }
}

impl<V, L: Codec<usize>, C: Codec<V>> Codec<V> for ByteCountPrefixed<L, C> {
    fn encode(&self, value: &V, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        // The length must be known before the payload is written.
        let mut scratch = BytesMut::new();
        let inner = self.codec.encode(value, &mut scratch)?;
        let len = self.range.check(scratch.len())?;
        let prefix = self.len.encode(&len, buf)?;
        put(buf, &scratch)?;
        Ok(EncodeResult::new(inner.count, prefix.bytes + inner.bytes))
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<V, Error> {
        let len = self.range.check(self.len.decode(buf)?)?;
        at_least(buf, len)?;
        trace!(len, "decoding byte-count prefixed value");
        let mut payload = buf.copy_to_bytes(len);
        let value = self.codec.decode(&mut payload)?;
        if payload.has_remaining() {
            return Err(ErrorKind::ExtraData(payload.remaining()).into());
        }
        Ok(value)
    }
}

/// A value preceded by a logical count, decoded by a codec built for that count.
///
/// `count` measures a value on encode; `factory` builds the codec for a count on both encode
/// and decode.
#[derive(Clone, Debug)]
pub struct ItemCountPrefixed<L, N, F> {
    len: L,
    count: N,
    factory: F,
    range: RangeCfg,
}

impl<L: Codec<usize>, N, F> ItemCountPrefixed<L, N, F> {
    /// A value preceded by `count(value)`, written with `len` and coded by `factory(count)`.
    pub fn new(len: L, count: N, factory: F) -> Self {
        Self {
            len,
            count,
            factory,
            range: RangeCfg::unbounded(),
        }
    }

    /// Rejects counts outside `range` (on both encode and decode).
    pub fn with_range(mut self, range: impl Into<RangeCfg>) -> Self {
        self.range = range.into();
        self
    }
}

impl<V, L, N, F, C> Codec<V> for ItemCountPrefixed<L, N, F>
where
    L: Codec<usize>,
    N: Fn(&V) -> usize + Send + Sync,
    F: Fn(usize) -> C + Send + Sync,
    C: Codec<V>,
{
    fn encode(&self, value: &V, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let count = self.range.check((self.count)(value))?;
        let prefix = self.len.encode(&count, buf)?;
        let inner = (self.factory)(count).encode(value, buf)?;
        Ok(EncodeResult::new(count, prefix.bytes + inner.bytes))
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<V, Error> {
        let count = self.range.check(self.len.decode(buf)?)?;
        trace!(count, "decoding item-count prefixed value");
        (self.factory)(count).decode(buf)
    }
}

fn code_points(value: &String) -> usize {
    value.chars().count()
}

/// Text preceded by its length in code points.
pub fn text<L: Codec<usize>>(
    len: L,
    charset: Charset,
) -> ItemCountPrefixed<L, fn(&String) -> usize, impl Fn(usize) -> Text + Send + Sync> {
    ItemCountPrefixed::new(len, code_points as fn(&String) -> usize, move |n| {
        Text::new(charset, n)
    })
}

/// Packed digits preceded by the number of digits.
///
/// The alphabet and padding of `template` are kept; its digit count is replaced by the prefix.
pub fn digits<L: Codec<usize>>(
    len: L,
    template: Digits,
) -> ItemCountPrefixed<L, fn(&String) -> usize, impl Fn(usize) -> Digits + Send + Sync> {
    ItemCountPrefixed::new(len, code_points as fn(&String) -> usize, move |n| {
        template.with_digits(n)
    })
}

/// A list preceded by its number of items.
pub fn list<V, L, C>(
    len: L,
    item: C,
) -> ItemCountPrefixed<L, fn(&Vec<V>) -> usize, impl Fn(usize) -> FixedList<C> + Send + Sync>
where
    L: Codec<usize>,
    C: Codec<V> + Clone,
{
    ItemCountPrefixed::new(len, Vec::<V>::len as fn(&Vec<V>) -> usize, move |n| {
        FixedList::new(item.clone(), n)
    })
}
