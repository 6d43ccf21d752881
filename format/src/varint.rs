//! LEB128 integers.
//!
//! The value is split into 7-bit groups, least significant first. Every byte but the last has
//! its high bit set. Signed values are ZigZag mapped first (`0, -1, 1, -2, ...` to
//! `0, 1, 2, 3, ...`) so that small magnitudes stay short.
//!
//! Decoding is strict: a group that would not fit in the target width is an error, as is a
//! byte sequence longer than the width allows.

use crate::{
    error::ErrorKind,
    util::{at_least, has_capacity},
    Codec, EncodeResult, Error,
};
use bytes::{Buf, BufMut};

const GROUP_BITS: u32 = 7;
const GROUP_MASK: u8 = 0x7F;
const MORE: u8 = 0x80;

/// An unsigned integer that can be written as a varint.
pub trait Unsigned: Copy + Into<u64> + TryFrom<u64> {
    const BITS: u32;
}

impl Unsigned for u8 {
    const BITS: u32 = u8::BITS;
}

impl Unsigned for u16 {
    const BITS: u32 = u16::BITS;
}

impl Unsigned for u32 {
    const BITS: u32 = u32::BITS;
}

impl Unsigned for u64 {
    const BITS: u32 = u64::BITS;
}

/// Number of bytes `value` occupies as a varint.
pub fn size<T: Unsigned>(value: T) -> usize {
    let value: u64 = value.into();
    let significant = (u64::BITS - value.leading_zeros()).max(1);
    significant.div_ceil(GROUP_BITS) as usize
}

/// Writes `value`, returning the number of bytes written.
pub fn write<T: Unsigned>(value: T, buf: &mut dyn BufMut) -> Result<usize, Error> {
    let len = size(value);
    has_capacity(buf, len)?;

    let mut rest: u64 = value.into();
    loop {
        let group = (rest as u8) & GROUP_MASK;
        rest >>= GROUP_BITS;
        if rest == 0 {
            buf.put_u8(group);
            return Ok(len);
        }
        buf.put_u8(group | MORE);
    }
}

/// Reads a varint that must fit in `T`.
pub fn read<T: Unsigned>(buf: &mut dyn Buf) -> Result<T, Error> {
    let overflow = || Error::from(ErrorKind::Invalid("varint", "overflow".into()));
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        if shift >= T::BITS {
            return Err(overflow());
        }
        at_least(buf, 1)?;
        let byte = buf.get_u8();
        let group = u64::from(byte & GROUP_MASK);

        // Bits of the group above the target width must be clear.
        let room = T::BITS - shift;
        if room < GROUP_BITS && group >> room != 0 {
            return Err(overflow());
        }
        value |= group << shift;

        if byte & MORE == 0 {
            return T::try_from(value).map_err(|_| overflow());
        }
        shift += GROUP_BITS;
    }
}

/// LEB128 unsigned integers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Varint;

/// ZigZag + LEB128 signed integers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignedVarint;

macro_rules! impl_varint {
    ($utype:ty, $stype:ty) => {
        impl Codec<$utype> for Varint {
            fn encode(&self, value: &$utype, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
                write(*value, buf).map(EncodeResult::bytes)
            }

            fn decode(&self, buf: &mut dyn Buf) -> Result<$utype, Error> {
                read(buf)
            }
        }

        impl Codec<$stype> for SignedVarint {
            fn encode(&self, value: &$stype, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
                const SIGN: u32 = <$stype>::BITS - 1;
                let zigzag = ((value << 1) ^ (value >> SIGN)) as $utype;
                write(zigzag, buf).map(EncodeResult::bytes)
            }

            fn decode(&self, buf: &mut dyn Buf) -> Result<$stype, Error> {
                let zigzag: $utype = read(buf)?;
                Ok(((zigzag >> 1) as $stype) ^ -((zigzag & 1) as $stype))
            }
        }
    };
}
impl_varint!(u16, i16);
impl_varint!(u32, i32);
impl_varint!(u64, i64);
