//! Compose bit-exact binary formats from small, reusable codecs.
//!
//! # Overview
//!
//! A [`Codec<V>`] converts values of type `V` to and from bytes. Leaf codecs handle numbers,
//! lengths, packed digits and text in several charsets; combinators build larger formats out
//! of smaller ones:
//!
//! - [`variable`]: values framed by a byte-count or item-count prefix
//! - [`list`]: fixed-count lists and lists running to the end of their frame
//! - [`record`]: ordered fields with optional presence predicates
//! - [`tagged`]: `(tag, value)` entries keyed by a tag codec
//! - [`choice`]: discriminated unions
//! - [`lazy`]: deferred resolution for recursive formats
//! - tuples of codecs and [`Map`] for adapting value types
//!
//! Codecs are immutable after construction and may be shared between threads. Encoding writes
//! into any [`bytes::BufMut`] and reports an [`EncodeResult`]; decoding reads from any
//! [`bytes::Buf`], consuming exactly the bytes that belong to the value.
//!
//! Every failure is an [`Error`] whose message names the record fields it crossed, outermost
//! first (`field [outer.inner]: ...`).
//!
//! # Example
//!
//! ```
//! use commonware_format::{
//!     charset::Charset,
//!     digits::Digits,
//!     primitives::{Len, U16},
//!     record::Record,
//!     variable, CodecExt,
//! };
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Account {
//!     branch: u16,
//!     number: String,
//!     holder: String,
//! }
//!
//! let codec = Record::<Account>::builder_default()
//!     .field("branch", U16, |a| &a.branch, |a, v| a.branch = v)
//!     .field("number", Digits::bcd(6), |a| &a.number, |a, v| a.number = v)
//!     .field(
//!         "holder",
//!         variable::text(Len::U8, Charset::Utf8),
//!         |a| &a.holder,
//!         |a, v| a.holder = v,
//!     )
//!     .build()
//!     .unwrap();
//!
//! let account = Account {
//!     branch: 42,
//!     number: "001234".into(),
//!     holder: "Zoë".into(),
//! };
//! let encoded = codec.encode_to_bytes(&account).unwrap();
//! assert_eq!(
//!     &encoded[..],
//!     &[0x00, 0x2A, 0x00, 0x12, 0x34, 0x03, b'Z', b'o', 0xC3, 0xAB]
//! );
//! assert_eq!(codec.decode_exact(encoded).unwrap(), account);
//!
//! // Failures name the field they occurred in.
//! let err = codec.decode_exact(&[0x00, 0x2A, 0x00, 0x1F, 0x34, 0x00][..]).unwrap_err();
//! assert_eq!(err.to_string(), "field [number]: invalid bcd: non-decimal nibble 0xf");
//! ```

#![doc(
    html_logo_url = "https://commonware.xyz/imgs/rustdoc_logo.svg",
    html_favicon_url = "https://commonware.xyz/favicon.ico"
)]

pub mod charset;
pub mod choice;
pub mod code_point;
pub mod codec;
pub mod config;
pub mod digits;
pub mod error;
pub mod lazy;
pub mod list;
pub mod map;
pub mod primitives;
pub mod record;
pub mod tagged;
pub mod text;
mod tuple;
pub mod util;
pub mod variable;
pub mod varint;

// Re-export main types and traits
pub use charset::Charset;
pub use code_point::{CodePointReader, Strategy};
pub use codec::{Codec, CodecExt, EncodeResult};
pub use config::RangeCfg;
pub use digits::{Digits, Padding};
pub use error::{Error, ErrorKind, Result};
pub use map::Map;
