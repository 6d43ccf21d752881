//! Adapting a codec to a different value type.

use crate::{Codec, EncodeResult, Error};
use bytes::{Buf, BufMut};
use std::{fmt, marker::PhantomData};

/// Encodes `T` by converting it to the wire type `W` handled by an inner codec.
///
/// The conversion from the wire may fail (e.g. an out-of-range enum discriminant); the
/// conversion to the wire may not.
///
/// ```
/// use commonware_format::{primitives::U8, CodecExt, Error, ErrorKind, Map};
///
/// #[derive(Debug, PartialEq)]
/// enum Color { Red, Green }
///
/// let codec = Map::new(
///     U8,
///     |c: &Color| match c { Color::Red => 0u8, Color::Green => 1 },
///     |b: u8| match b {
///         0 => Ok(Color::Red),
///         1 => Ok(Color::Green),
///         _ => Err(Error::from(ErrorKind::Invalid("Color", format!("{b}")))),
///     },
/// );
/// assert_eq!(&codec.encode_to_bytes(&Color::Green).unwrap()[..], &[1]);
/// assert!(codec.decode_exact(&[7u8][..]).is_err());
/// ```
pub struct Map<T, W, C, F, G> {
    codec: C,
    to_wire: F,
    from_wire: G,
    _marker: PhantomData<fn() -> (T, W)>,
}

impl<T, W, C, F, G> Map<T, W, C, F, G>
where
    C: Codec<W>,
    F: Fn(&T) -> W + Send + Sync,
    G: Fn(W) -> Result<T, Error> + Send + Sync,
{
    /// Codes `T` as `codec` codes the wire value `W`.
    pub fn new(codec: C, to_wire: F, from_wire: G) -> Self {
        Self {
            codec,
            to_wire,
            from_wire,
            _marker: PhantomData,
        }
    }
}

impl<T, W, C, F, G> Codec<T> for Map<T, W, C, F, G>
where
    C: Codec<W>,
    F: Fn(&T) -> W + Send + Sync,
    G: Fn(W) -> Result<T, Error> + Send + Sync,
{
    fn encode(&self, value: &T, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        self.codec.encode(&(self.to_wire)(value), buf)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<T, Error> {
        (self.from_wire)(self.codec.decode(buf)?)
    }

    fn fixed_size(&self) -> Option<usize> {
        self.codec.fixed_size()
    }
}

impl<T, W, C: fmt::Debug, F, G> fmt::Debug for Map<T, W, C, F, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map").field("codec", &self.codec).finish()
    }
}
