//! Discriminated unions.
//!
//! A [`Choice`] writes a wire tag identifying the variant, followed by the variant encoded with
//! its own codec. The variant of a value is its [`Discriminated::kind`]; each kind maps to
//! exactly one tag and each tag to exactly one kind.
//!
//! ```
//! use commonware_format::{
//!     choice::{Choice, Discriminated},
//!     primitives::{U16, U8},
//!     CodecExt,
//! };
//!
//! #[derive(Debug, PartialEq)]
//! enum Shape {
//!     Circle(u8),
//!     Square(u16),
//! }
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Kind {
//!     Circle,
//!     Square,
//! }
//!
//! impl Discriminated for Shape {
//!     type Kind = Kind;
//!
//!     fn kind(&self) -> Kind {
//!         match self {
//!             Self::Circle(_) => Kind::Circle,
//!             Self::Square(_) => Kind::Square,
//!         }
//!     }
//! }
//!
//! let codec = Choice::<Shape, u8>::builder(U8)
//!     .variant(1u8, Kind::Circle, U8, Shape::Circle, |s| match s {
//!         Shape::Circle(r) => Some(r),
//!         _ => None,
//!     })
//!     .variant(2, Kind::Square, U16, Shape::Square, |s| match s {
//!         Shape::Square(w) => Some(w),
//!         _ => None,
//!     })
//!     .build()
//!     .unwrap();
//!
//! let encoded = codec.encode_to_bytes(&Shape::Square(258)).unwrap();
//! assert_eq!(&encoded[..], &[2, 1, 2]);
//! assert_eq!(codec.decode_exact(encoded).unwrap(), Shape::Square(258));
//! ```

use crate::{error::ErrorKind, Codec, EncodeResult, Error};
use bimap::BiHashMap;
use bytes::{Buf, BufMut};
use std::{collections::HashMap, fmt::Debug, hash::Hash};
use tracing::{debug, trace};

/// A value whose variant can be named without inspecting its payload.
pub trait Discriminated {
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// Adapts a codec for one variant's payload `F` into a codec for the whole union `V`.
pub struct Case<V, F, C> {
    codec: C,
    wrap: fn(F) -> V,
    unwrap: fn(&V) -> Option<&F>,
}

impl<V, F, C: Codec<F>> Case<V, F, C> {
    /// Codes the payload with `codec`, wrapping it on decode and unwrapping it on encode.
    pub fn new(codec: C, wrap: fn(F) -> V, unwrap: fn(&V) -> Option<&F>) -> Self {
        Self {
            codec,
            wrap,
            unwrap,
        }
    }
}

impl<V, F, C: Codec<F>> Codec<V> for Case<V, F, C> {
    fn encode(&self, value: &V, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let payload = (self.unwrap)(value)
            .ok_or_else(|| ErrorKind::Invalid("variant", "value is another variant".into()))?;
        self.codec.encode(payload, buf)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<V, Error> {
        self.codec.decode(buf).map(self.wrap)
    }

    fn fixed_size(&self) -> Option<usize> {
        self.codec.fixed_size()
    }
}

/// Encodes a union `V` as a tag `T` followed by the variant.
///
/// `count` in the result of an encode is the variant codec's count; `bytes` includes the tag.
pub struct Choice<V: Discriminated, T> {
    tag: Box<dyn Codec<T>>,
    tags: BiHashMap<T, V::Kind>,
    codecs: HashMap<V::Kind, Box<dyn Codec<V>>>,
}

impl<V, T> Choice<V, T>
where
    V: Discriminated + 'static,
    T: Eq + Hash + Debug + Send + Sync + 'static,
{
    /// Starts a union whose tags are written with `tag`.
    pub fn builder(tag: impl Codec<T> + 'static) -> Builder<V, T> {
        Builder {
            tag: Box::new(tag),
            variants: Vec::new(),
        }
    }

    /// The tag written for `kind`, if registered.
    pub fn tag_of(&self, kind: &V::Kind) -> Option<&T> {
        self.tags.get_by_right(kind)
    }
}

impl<V, T> Codec<V> for Choice<V, T>
where
    V: Discriminated + 'static,
    T: Eq + Hash + Debug + Send + Sync + 'static,
{
    fn encode(&self, value: &V, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let kind = value.kind();
        let (Some(tag), Some(codec)) = (self.tags.get_by_right(&kind), self.codecs.get(&kind))
        else {
            return Err(ErrorKind::Unregistered(format!("{kind:?}")).into());
        };
        let written = self.tag.encode(tag, buf)?;
        let inner = codec.encode(value, buf)?;
        Ok(EncodeResult::new(inner.count, written.bytes + inner.bytes))
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<V, Error> {
        let tag = self.tag.decode(buf)?;
        let Some(kind) = self.tags.get_by_left(&tag) else {
            return Err(ErrorKind::Unregistered(format!("tag {tag:?}")).into());
        };
        trace!(?tag, ?kind, "decoding variant");
        match self.codecs.get(kind) {
            Some(codec) => codec.decode(buf),
            None => Err(ErrorKind::Unregistered(format!("{kind:?}")).into()),
        }
    }
}

/// Collects the variants of a [`Choice`].
pub struct Builder<V: Discriminated, T> {
    tag: Box<dyn Codec<T>>,
    variants: Vec<(T, V::Kind, Box<dyn Codec<V>>)>,
}

impl<V, T> Builder<V, T>
where
    V: Discriminated + 'static,
    T: Eq + Hash + Debug + Send + Sync + 'static,
{
    /// Registers `codec` (a codec for the whole union) under `tag` and `kind`.
    pub fn register(mut self, tag: T, kind: V::Kind, codec: impl Codec<V> + 'static) -> Self {
        self.variants.push((tag, kind, Box::new(codec)));
        self
    }

    /// Registers a codec for one variant's payload, see [`Case`].
    pub fn variant<F: 'static>(
        self,
        tag: T,
        kind: V::Kind,
        codec: impl Codec<F> + 'static,
        wrap: fn(F) -> V,
        unwrap: fn(&V) -> Option<&F>,
    ) -> Self {
        self.register(tag, kind, Case::new(codec, wrap, unwrap))
    }

    /// Fails if no variant was registered, or a tag or kind was registered twice.
    pub fn build(self) -> Result<Choice<V, T>, Error> {
        if self.variants.is_empty() {
            return Err(ErrorKind::Config("choice without variants".into()).into());
        }
        let mut tags = BiHashMap::with_capacity(self.variants.len());
        let mut codecs = HashMap::with_capacity(self.variants.len());
        for (tag, kind, codec) in self.variants {
            if tags.contains_right(&kind) {
                return Err(ErrorKind::Config(format!("duplicate codec for {kind:?}")).into());
            }
            if tags.contains_left(&tag) {
                return Err(ErrorKind::Config(format!("duplicate tag {tag:?}")).into());
            }
            tags.insert(tag, kind);
            codecs.insert(kind, codec);
        }
        debug!(variants = codecs.len(), "built choice codec");
        Ok(Choice {
            tag: self.tag,
            tags,
            codecs,
        })
    }
}
