//! Digit strings packed two per byte.
//!
//! [`Digits`] encodes a string of exactly `n` decimal (BCD) or hexadecimal digits into
//! `ceil(n / 2)` bytes, high nibble first. When `n` is odd one nibble is padding; where it goes
//! (and its value) is configuration, never inferred from the data:
//!
//! ```
//! use commonware_format::{CodecExt, Digits, Padding};
//!
//! let left = Digits::bcd(3);
//! assert_eq!(&left.encode_to_bytes(&"123".to_string()).unwrap()[..], &[0x01, 0x23]);
//!
//! let right = Digits::bcd(3).padding(Padding::Right).pad_nibble(0xF);
//! assert_eq!(&right.encode_to_bytes(&"123".to_string()).unwrap()[..], &[0x12, 0x3F]);
//! ```

use crate::{
    error::ErrorKind,
    util::{at_least, put},
    Codec, EncodeResult, Error,
};
use bytes::{Buf, BufMut};

/// Which digits are allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alphabet {
    /// `0-9`; nibbles above 9 are malformed.
    Decimal,
    /// `0-9`, `A-F` (either case on encode, uppercase on decode).
    Hex,
}

impl Alphabet {
    const fn name(self) -> &'static str {
        match self {
            Self::Decimal => "bcd",
            Self::Hex => "hex",
        }
    }

    const fn radix(self) -> u32 {
        match self {
            Self::Decimal => 10,
            Self::Hex => 16,
        }
    }
}

/// Placement of the pad nibble for odd digit counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Padding {
    /// Pad nibble precedes the first digit.
    #[default]
    Left,
    /// Pad nibble follows the last digit.
    Right,
}

/// A fixed number of packed digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Digits {
    alphabet: Alphabet,
    digits: usize,
    padding: Padding,
    pad: u8,
}

impl Digits {
    /// `digits` decimal digits, left padded with a zero nibble.
    pub const fn bcd(digits: usize) -> Self {
        Self::new(Alphabet::Decimal, digits)
    }

    /// `digits` hexadecimal digits, left padded with a zero nibble.
    pub const fn hex(digits: usize) -> Self {
        Self::new(Alphabet::Hex, digits)
    }

    /// `digits` digits of `alphabet`, left padded with a zero nibble.
    pub const fn new(alphabet: Alphabet, digits: usize) -> Self {
        Self {
            alphabet,
            digits,
            padding: Padding::Left,
            pad: 0,
        }
    }

    pub const fn padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    /// Sets the pad nibble (low four bits of `nibble`).
    pub const fn pad_nibble(mut self, nibble: u8) -> Self {
        self.pad = nibble & 0x0F;
        self
    }

    /// The same alphabet and padding for `digits` digits.
    pub const fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Bytes occupied on the wire.
    pub const fn byte_len(&self) -> usize {
        self.digits.div_ceil(2)
    }

    /// Index of the pad nibble, if any.
    const fn pad_index(&self) -> Option<usize> {
        if self.digits % 2 == 0 {
            return None;
        }
        match self.padding {
            Padding::Left => Some(0),
            Padding::Right => Some(self.digits),
        }
    }

    fn invalid(&self, message: String) -> Error {
        ErrorKind::Invalid(self.alphabet.name(), message).into()
    }
}

impl Codec<String> for Digits {
    fn encode(&self, value: &String, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let found = value.chars().count();
        if found != self.digits {
            return Err(ErrorKind::InvalidLength {
                found,
                expected: self.digits,
            }
            .into());
        }

        let mut nibbles = Vec::with_capacity(self.byte_len() * 2);
        if self.pad_index() == Some(0) {
            nibbles.push(self.pad);
        }
        for ch in value.chars() {
            let nibble = ch
                .to_digit(self.alphabet.radix())
                .ok_or_else(|| self.invalid(format!("character {ch:?}")))?;
            nibbles.push(nibble as u8);
        }
        if self.pad_index() == Some(self.digits) {
            nibbles.push(self.pad);
        }

        let packed: Vec<u8> = nibbles
            .chunks_exact(2)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect();
        let bytes = put(buf, &packed)?;
        Ok(EncodeResult::new(self.digits, bytes))
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<String, Error> {
        let len = self.byte_len();
        at_least(buf, len)?;
        let pad = self.pad_index();
        let mut text = String::with_capacity(self.digits);
        for i in 0..len {
            let byte = buf.get_u8();
            for (j, nibble) in [byte >> 4, byte & 0x0F].into_iter().enumerate() {
                if pad == Some(i * 2 + j) {
                    continue;
                }
                let digit = char::from_digit(u32::from(nibble), self.alphabet.radix())
                    .ok_or_else(|| self.invalid(format!("non-decimal nibble {nibble:#x}")))?;
                text.push(digit.to_ascii_uppercase());
            }
        }
        Ok(text)
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.byte_len())
    }
}
