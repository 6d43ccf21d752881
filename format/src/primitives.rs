//! Fixed-size leaf codecs.
//!
//! # Numbers
//!
//! All fixed-size integers and floats are written big-endian to avoid host-endian ambiguity.
//! Each width has its own zero-sized codec ([`U8`], [`I32`], [`F64`], ...) reporting a `count`
//! equal to its byte size.
//!
//! # Lengths
//!
//! [`Len`] writes a `usize` (a byte count or an item count) in a chosen width. Encoding a
//! length the width cannot hold fails instead of truncating.

use crate::{
    error::ErrorKind,
    util::{at_least, has_capacity, put},
    varint, Codec, EncodeResult, Error,
};
use bytes::{Buf, BufMut, Bytes};

macro_rules! impl_number {
    ($name:ident, $type:ty, $get:ident, $put:ident) => {
        #[doc = concat!("Big-endian `", stringify!($type), "`.")]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $name;

        impl $name {
            /// Encoded size in bytes.
            pub const SIZE: usize = std::mem::size_of::<$type>();
        }

        impl Codec<$type> for $name {
            #[inline]
            fn encode(&self, value: &$type, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
                has_capacity(buf, Self::SIZE)?;
                buf.$put(*value);
                Ok(EncodeResult::bytes(Self::SIZE))
            }

            #[inline]
            fn decode(&self, buf: &mut dyn Buf) -> Result<$type, Error> {
                at_least(buf, Self::SIZE)?;
                Ok(buf.$get())
            }

            fn fixed_size(&self) -> Option<usize> {
                Some(Self::SIZE)
            }
        }
    };
}

impl_number!(U8, u8, get_u8, put_u8);
impl_number!(U16, u16, get_u16, put_u16);
impl_number!(U32, u32, get_u32, put_u32);
impl_number!(U64, u64, get_u64, put_u64);
impl_number!(U128, u128, get_u128, put_u128);
impl_number!(I8, i8, get_i8, put_i8);
impl_number!(I16, i16, get_i16, put_i16);
impl_number!(I32, i32, get_i32, put_i32);
impl_number!(I64, i64, get_i64, put_i64);
impl_number!(I128, i128, get_i128, put_i128);
impl_number!(F32, f32, get_f32, put_f32);
impl_number!(F64, f64, get_f64, put_f64);

/// A `usize` length in a fixed width or as a varint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Len {
    U8,
    U16,
    U32,
    /// LEB128, limited to values that fit in a `u32` so the format does not depend on the
    /// target's pointer width.
    Varint,
}

impl Codec<usize> for Len {
    fn encode(&self, value: &usize, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let out_of_range = || Error::from(ErrorKind::LengthOutOfRange(*value));
        match self {
            Self::U8 => U8.encode(&u8::try_from(*value).map_err(|_| out_of_range())?, buf),
            Self::U16 => U16.encode(&u16::try_from(*value).map_err(|_| out_of_range())?, buf),
            Self::U32 => U32.encode(&u32::try_from(*value).map_err(|_| out_of_range())?, buf),
            Self::Varint => {
                let value = u32::try_from(*value).map_err(|_| out_of_range())?;
                varint::write(value, buf).map(EncodeResult::bytes)
            }
        }
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<usize, Error> {
        let value = match self {
            Self::U8 => u32::from(U8.decode(buf)?),
            Self::U16 => u32::from(U16.decode(buf)?),
            Self::U32 => U32.decode(buf)?,
            Self::Varint => varint::read::<u32>(buf)?,
        };
        usize::try_from(value).map_err(|_| ErrorKind::LengthOutOfRange(usize::MAX).into())
    }

    fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::U8 => Some(U8::SIZE),
            Self::U16 => Some(U16::SIZE),
            Self::U32 => Some(U32::SIZE),
            Self::Varint => None,
        }
    }
}

/// A single byte, `0` or `1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bool;

impl Codec<bool> for Bool {
    fn encode(&self, value: &bool, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        U8.encode(&u8::from(*value), buf)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<bool, Error> {
        match U8.decode(buf)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ErrorKind::Invalid("bool", format!("byte {other:#04x}")).into()),
        }
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(1)
    }
}

/// Raw binary of exactly `len` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedBytes {
    len: usize,
}

impl FixedBytes {
    /// Exactly `len` bytes.
    pub const fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Codec<Bytes> for FixedBytes {
    fn encode(&self, value: &Bytes, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        if value.len() != self.len {
            return Err(ErrorKind::InvalidLength {
                found: value.len(),
                expected: self.len,
            }
            .into());
        }
        put(buf, value).map(EncodeResult::bytes)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<Bytes, Error> {
        at_least(buf, self.len)?;
        Ok(buf.copy_to_bytes(self.len))
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.len)
    }
}

/// Raw binary running to the end of the source.
///
/// Usually bounded by an enclosing [`crate::variable::ByteCountPrefixed`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemainingBytes;

impl Codec<Bytes> for RemainingBytes {
    fn encode(&self, value: &Bytes, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        put(buf, value).map(EncodeResult::bytes)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<Bytes, Error> {
        let len = buf.remaining();
        Ok(buf.copy_to_bytes(len))
    }
}

/// A codec that always fails.
///
/// The default for tags no codec was registered for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fail;

impl<V> Codec<V> for Fail {
    fn encode(&self, _: &V, _: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        Err(ErrorKind::Unregistered("value".into()).into())
    }

    fn decode(&self, _: &mut dyn Buf) -> Result<V, Error> {
        Err(ErrorKind::Unregistered("value".into()).into())
    }
}
