//! Homogeneous lists.
//!
//! [`FixedList`] reads a known number of items. [`ExhaustList`] reads until the source is
//! empty (or a maximum is reached) and is normally framed by a
//! [`ByteCountPrefixed`](crate::variable::ByteCountPrefixed) so that "empty" means "end of this
//! list" rather than "end of the message".

use crate::{error::ErrorKind, Codec, EncodeResult, Error};
use bytes::{Buf, BufMut};
use tracing::trace;

/// Exactly `count` items.
#[derive(Clone, Debug)]
pub struct FixedList<C> {
    codec: C,
    count: usize,
}

impl<C> FixedList<C> {
    /// Exactly `count` items, each written with `codec`.
    pub const fn new(codec: C, count: usize) -> Self {
        Self { codec, count }
    }

    /// Number of items in every list.
    pub const fn count(&self) -> usize {
        self.count
    }
}

impl<V, C: Codec<V>> Codec<Vec<V>> for FixedList<C> {
    fn encode(&self, value: &Vec<V>, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        if value.len() != self.count {
            return Err(ErrorKind::InvalidLength {
                found: value.len(),
                expected: self.count,
            }
            .into());
        }
        let mut bytes = 0;
        for item in value {
            bytes += self.codec.encode(item, buf)?.bytes;
        }
        Ok(EncodeResult::new(self.count, bytes))
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<Vec<V>, Error> {
        // Only items of a known nonzero width are sure to need input. Others (including an
        // empty record) may decode from nothing and report their own end of input.
        let sized = self.codec.fixed_size().is_some_and(|n| n > 0);
        // Every sized item takes at least one byte, so `remaining` bounds the allocation.
        let mut items = Vec::with_capacity(if sized {
            self.count.min(buf.remaining())
        } else {
            0
        });
        for read in 0..self.count {
            if sized && !buf.has_remaining() {
                return Err(ErrorKind::EndOfStream {
                    unit: "items",
                    read,
                    requested: self.count,
                }
                .into());
            }
            items.push(self.codec.decode(buf)?);
        }
        Ok(items)
    }

    fn fixed_size(&self) -> Option<usize> {
        self.codec.fixed_size()?.checked_mul(self.count)
    }
}

/// Items until the source is exhausted or `max` items have been read.
#[derive(Clone, Debug)]
pub struct ExhaustList<C> {
    codec: C,
    max: Option<usize>,
}

impl<C> ExhaustList<C> {
    /// Items written with `codec` until the source is exhausted.
    pub const fn new(codec: C) -> Self {
        Self { codec, max: None }
    }

    /// Stops decoding after `max` items, leaving anything else in the source.
    pub const fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }
}

impl<V, C: Codec<V>> Codec<Vec<V>> for ExhaustList<C> {
    fn encode(&self, value: &Vec<V>, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        if self.max.is_some_and(|max| value.len() > max) {
            return Err(ErrorKind::LengthOutOfRange(value.len()).into());
        }
        let mut bytes = 0;
        for item in value {
            bytes += self.codec.encode(item, buf)?.bytes;
        }
        Ok(EncodeResult::new(value.len(), bytes))
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<Vec<V>, Error> {
        let mut items = Vec::new();
        loop {
            if self.max.is_some_and(|max| items.len() >= max) {
                trace!(items = items.len(), "list reached maximum");
                break;
            }
            let before = buf.remaining();
            if before == 0 {
                break;
            }
            items.push(self.codec.decode(buf)?);
            if buf.remaining() == before {
                return Err(ErrorKind::Invalid("list", "item consumed no bytes".into()).into());
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        primitives::{Len, RemainingBytes, U16, U8},
        record::Record,
        variable::ByteCountPrefixed,
        CodecExt,
    };
    use bytes::Bytes;

    #[test]
    fn test_fixed_list() {
        let codec = FixedList::new(U16, 2);
        let mut buf = Vec::new();
        let result = codec.encode(&vec![1u16, 2], &mut buf).unwrap();
        assert_eq!(result, EncodeResult::new(2, 4));
        assert_eq!(buf, [0, 1, 0, 2]);
        assert_eq!(codec.decode_exact(&buf[..]).unwrap(), vec![1, 2]);
        assert_eq!(codec.fixed_size(), Some(4));
    }

    #[test]
    fn test_fixed_list_wrong_size() {
        let err = FixedList::new(U8, 3).encode_to_bytes(&vec![1u8]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidLength {
                found: 1,
                expected: 3
            }
        ));
    }

    #[test]
    fn test_fixed_list_short() {
        let mut buf = Bytes::from_static(&[1, 2]);
        let err = FixedList::new(U8, 3).decode(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::EndOfStream {
                unit: "items",
                read: 2,
                requested: 3
            }
        ));
    }

    #[test]
    fn test_fixed_list_huge_count() {
        // A count far larger than the input fails without allocating for it.
        let mut buf = Bytes::from_static(&[1]);
        assert!(FixedList::new(U8, usize::MAX).decode(&mut buf).is_err());
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Flags {
        extra: Option<u8>,
    }

    #[test]
    fn test_fixed_list_of_empty_records() {
        let record = Record::<Flags>::builder_default()
            .optional(
                "extra",
                U8,
                |f: &Flags| f.extra.as_ref(),
                |f, v| f.extra = Some(v),
                |f| f.extra.is_some(),
            )
            .build()
            .unwrap();
        let codec = FixedList::new(record, 2);
        let value = vec![Flags::default(), Flags::default()];
        let encoded = codec.encode_to_bytes(&value).unwrap();
        assert!(encoded.is_empty());
        assert_eq!(codec.decode_exact(encoded).unwrap(), value);
        assert_eq!(codec.decode_exact(&[0u8; 0][..]).unwrap(), value);
    }

    #[test]
    fn test_fixed_list_unsized_item_short() {
        // Items without a declared width report their own end of input.
        let codec = FixedList::new(ByteCountPrefixed::new(Len::U8, RemainingBytes), 2);
        let err = codec.decode_exact(&[1u8, 0xAA][..]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::EndOfBuffer { .. }));
    }

    #[test]
    fn test_exhaust_list() {
        let codec = ExhaustList::new(U16);
        let value = vec![7u16, 8, 9];
        let mut buf = Vec::new();
        assert_eq!(
            codec.encode(&value, &mut buf).unwrap(),
            EncodeResult::new(3, 6)
        );
        assert_eq!(codec.decode_exact(&buf[..]).unwrap(), value);
        assert_eq!(codec.decode_exact(&[0u8; 0][..]).unwrap(), Vec::<u16>::new());
    }

    #[test]
    fn test_exhaust_list_max() {
        let codec = ExhaustList::new(U8).with_max(2);
        let mut buf = Bytes::from_static(&[1, 2, 3]);
        assert_eq!(codec.decode(&mut buf).unwrap(), vec![1, 2]);
        assert_eq!(&buf[..], &[3]);

        let err = codec.encode_to_bytes(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::LengthOutOfRange(3)));
    }

    #[test]
    fn test_exhaust_list_partial_item() {
        let err = ExhaustList::new(U16).decode_exact(&[0u8, 1, 2][..]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::EndOfBuffer { .. }));
    }

    #[test]
    fn test_exhaust_list_zero_width_item() {
        let codec = ExhaustList::new(FixedList::new(U8, 0));
        let err = codec.decode_exact(&[1u8][..]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Invalid("list", _)));
    }

    #[test]
    fn test_framed_exhaust_list() {
        let codec = (ByteCountPrefixed::new(Len::U8, ExhaustList::new(U8)), U8);
        let value = (vec![4u8, 5], 6u8);
        let encoded = codec.encode_to_bytes(&value).unwrap();
        assert_eq!(&encoded[..], &[2, 4, 5, 6]);
        assert_eq!(codec.decode_exact(encoded).unwrap(), value);
    }
}
