//! Core codec trait and the result every encode reports.

use crate::error::{ErrorKind, Result};
use bytes::{Buf, BufMut, BytesMut};
use std::{
    ops::{Add, AddAssign},
    sync::Arc,
};

/// What an encode produced.
///
/// `count` is whatever the codec semantically measures (code points, digits, items, fields or
/// bytes). `bytes` is always the exact number of bytes written to the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EncodeResult {
    pub count: usize,
    pub bytes: usize,
}

impl EncodeResult {
    /// Nothing written.
    pub const EMPTY: Self = Self { count: 0, bytes: 0 };

    pub const fn new(count: usize, bytes: usize) -> Self {
        Self { count, bytes }
    }

    /// A result whose logical count is its byte count.
    pub const fn bytes(bytes: usize) -> Self {
        Self {
            count: bytes,
            bytes,
        }
    }
}

impl Add for EncodeResult {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            count: self.count + rhs.count,
            bytes: self.bytes + rhs.bytes,
        }
    }
}

impl AddAssign for EncodeResult {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// A bidirectional encoding of values of type `V`.
///
/// Codecs hold only configuration fixed at construction and may be shared freely across
/// threads. They never own the sink or source they are handed.
pub trait Codec<V>: Send + Sync {
    /// Writes `value` to `buf`.
    ///
    /// Fails (rather than panicking) if `buf` cannot hold the encoding.
    fn encode(&self, value: &V, buf: &mut dyn BufMut) -> Result<EncodeResult>;

    /// Reads one value from `buf`, consuming exactly the bytes that belong to it.
    fn decode(&self, buf: &mut dyn Buf) -> Result<V>;

    /// The encoded length, if every value encodes to the same number of bytes.
    fn fixed_size(&self) -> Option<usize> {
        None
    }
}

impl<V, C: Codec<V> + ?Sized> Codec<V> for &C {
    fn encode(&self, value: &V, buf: &mut dyn BufMut) -> Result<EncodeResult> {
        (**self).encode(value, buf)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<V> {
        (**self).decode(buf)
    }

    fn fixed_size(&self) -> Option<usize> {
        (**self).fixed_size()
    }
}

impl<V, C: Codec<V> + ?Sized> Codec<V> for Box<C> {
    fn encode(&self, value: &V, buf: &mut dyn BufMut) -> Result<EncodeResult> {
        (**self).encode(value, buf)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<V> {
        (**self).decode(buf)
    }

    fn fixed_size(&self) -> Option<usize> {
        (**self).fixed_size()
    }
}

impl<V, C: Codec<V> + ?Sized> Codec<V> for Arc<C> {
    fn encode(&self, value: &V, buf: &mut dyn BufMut) -> Result<EncodeResult> {
        (**self).encode(value, buf)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<V> {
        (**self).decode(buf)
    }

    fn fixed_size(&self) -> Option<usize> {
        (**self).fixed_size()
    }
}

/// Convenience methods available on every codec.
pub trait CodecExt<V>: Codec<V> {
    /// Encodes `value` into a fresh buffer.
    ///
    /// (Provided method).
    fn encode_to_bytes(&self, value: &V) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(self.fixed_size().unwrap_or_default());
        let result = self.encode(value, &mut buf)?;
        debug_assert_eq!(result.bytes, buf.len(), "encode() misreported bytes written");
        Ok(buf)
    }

    /// Decodes a value from `buf`, ensuring the buffer is fully consumed.
    ///
    /// For codecs with a fixed size, the buffer length is checked before reading.
    ///
    /// (Provided method).
    fn decode_exact(&self, mut buf: impl Buf) -> Result<V> {
        if let Some(size) = self.fixed_size() {
            let remaining = buf.remaining();
            if remaining < size {
                return Err(ErrorKind::EndOfBuffer {
                    needed: size,
                    remaining,
                }
                .into());
            }
            if remaining > size {
                return Err(ErrorKind::ExtraData(remaining - size).into());
            }
        }

        let value = self.decode(&mut buf)?;

        let remaining = buf.remaining();
        if remaining > 0 {
            return Err(ErrorKind::ExtraData(remaining).into());
        }
        Ok(value)
    }
}

impl<V, C: Codec<V> + ?Sized> CodecExt<V> for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{U16, U8};

    #[test]
    fn test_result_sum() {
        let mut total = EncodeResult::new(1, 2);
        total += EncodeResult::bytes(3);
        assert_eq!(total, EncodeResult::new(4, 5));
        assert_eq!(EncodeResult::EMPTY + total, total);
    }

    #[test]
    fn test_insufficient_buffer() {
        let err = U16.decode_exact(&[0x01u8][..]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::EndOfBuffer {
                needed: 2,
                remaining: 1
            }
        ));
    }

    #[test]
    fn test_extra_data() {
        let err = U8.decode_exact(&[0x01u8, 0x02][..]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExtraData(1)));
    }

    #[test]
    fn test_trait_objects() {
        let boxed: Box<dyn Codec<u16>> = Box::new(U16);
        let shared: Arc<dyn Codec<u16>> = Arc::new(U16);
        let encoded = boxed.encode_to_bytes(&0x0102).unwrap();
        assert_eq!(&encoded[..], &[0x01, 0x02]);
        assert_eq!(shared.decode_exact(encoded).unwrap(), 0x0102);
        assert_eq!((&shared).fixed_size(), Some(2));
    }
}
