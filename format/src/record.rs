//! Ordered records: a fixed sequence of named fields.
//!
//! A [`Record`] is assembled from field definitions, each pairing a name and a codec with an
//! accessor and a mutator on the record type. Fields are encoded in declaration order. A field
//! may carry a presence predicate; a field whose predicate fails is neither written nor read.
//!
//! On encode the predicate sees the value being encoded. On decode it sees the partially
//! populated record (every earlier field already set), so presence may depend on previously
//! decoded fields.
//!
//! Failures inside a field are annotated with its name, so a failure two records deep renders
//! as `field [outer.inner]: ...`.
//!
//! ```
//! use commonware_format::{primitives::{Bool, U16}, record::Record, CodecExt};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Header {
//!     flagged: bool,
//!     code: u16,
//! }
//!
//! let codec = Record::<Header>::builder_default()
//!     .field("flagged", Bool, |h| &h.flagged, |h, v| h.flagged = v)
//!     .optional("code", U16, |h| Some(&h.code), |h, v| h.code = v, |h| h.flagged)
//!     .build()
//!     .unwrap();
//!
//! let plain = Header { flagged: false, code: 0 };
//! assert_eq!(&codec.encode_to_bytes(&plain).unwrap()[..], &[0]);
//!
//! let flagged = Header { flagged: true, code: 7 };
//! let encoded = codec.encode_to_bytes(&flagged).unwrap();
//! assert_eq!(&encoded[..], &[1, 0, 7]);
//! assert_eq!(codec.decode_exact(encoded).unwrap(), flagged);
//! ```

use crate::{error::ErrorKind, Codec, EncodeResult, Error};
use bytes::{Buf, BufMut};
use std::collections::HashSet;
use tracing::{debug, trace};

type Getter<T, F> = Box<dyn Fn(&T) -> Option<&F> + Send + Sync>;
type Setter<T, F> = Box<dyn Fn(&mut T, F) + Send + Sync>;
type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type Factory<T> = Box<dyn Fn() -> Option<T> + Send + Sync>;

/// Pins the signature of an accessor closure so its output borrows from its input.
fn getter<T, F, G>(get: G) -> G
where
    G: Fn(&T) -> Option<&F>,
{
    get
}

/// One field of a record, with its value type erased.
trait FieldCodec<T>: Send + Sync {
    fn name(&self) -> &str;

    fn present(&self, record: &T) -> bool;

    fn encode(&self, record: &T, buf: &mut dyn BufMut) -> Result<EncodeResult, Error>;

    fn decode_into(&self, record: &mut T, buf: &mut dyn Buf) -> Result<(), Error>;
}

struct Field<T, F, C> {
    name: String,
    codec: C,
    get: Getter<T, F>,
    set: Setter<T, F>,
    present: Option<Predicate<T>>,
}

impl<T, F, C: Codec<F>> FieldCodec<T> for Field<T, F, C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn present(&self, record: &T) -> bool {
        self.present.as_ref().map_or(true, |present| present(record))
    }

    fn encode(&self, record: &T, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let value = (self.get)(record).ok_or(ErrorKind::Missing("field accessor"))?;
        self.codec.encode(value, buf)
    }

    fn decode_into(&self, record: &mut T, buf: &mut dyn Buf) -> Result<(), Error> {
        let value = self.codec.decode(buf)?;
        (self.set)(record, value);
        Ok(())
    }
}

/// Encodes a `T` as a sequence of fields.
///
/// `count` in the result of an encode is the number of fields written.
pub struct Record<T> {
    factory: Factory<T>,
    fields: Vec<Box<dyn FieldCodec<T>>>,
}

impl<T: 'static> Record<T> {
    /// Starts a record whose decoded values begin as whatever `factory` yields.
    ///
    /// A factory yielding `None` fails the decode.
    pub fn builder(factory: impl Fn() -> Option<T> + Send + Sync + 'static) -> Builder<T> {
        Builder {
            factory: Box::new(factory),
            fields: Vec::new(),
        }
    }

    /// Field names, in encoding order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name())
    }
}

impl<T: Default + 'static> Record<T> {
    /// Starts a record whose decoded values begin as `T::default()`.
    pub fn builder_default() -> Builder<T> {
        Self::builder(|| Some(T::default()))
    }
}

impl<T> Codec<T> for Record<T> {
    fn encode(&self, value: &T, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let mut result = EncodeResult::EMPTY;
        for field in &self.fields {
            if !field.present(value) {
                trace!(field = field.name(), "skipping absent field");
                continue;
            }
            let written = field
                .encode(value, buf)
                .map_err(|e| e.in_field(field.name()))?;
            result += EncodeResult::new(1, written.bytes);
        }
        Ok(result)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<T, Error> {
        let mut record = (self.factory)().ok_or(ErrorKind::Missing("record factory"))?;
        for field in &self.fields {
            if !field.present(&record) {
                trace!(field = field.name(), "skipping absent field");
                continue;
            }
            field
                .decode_into(&mut record, buf)
                .map_err(|e| e.in_field(field.name()))?;
        }
        Ok(record)
    }
}

/// Collects the fields of a [`Record`].
pub struct Builder<T> {
    factory: Factory<T>,
    fields: Vec<Box<dyn FieldCodec<T>>>,
}

impl<T: 'static> Builder<T> {
    /// Adds a field that is always present.
    pub fn field<F, C>(
        self,
        name: impl Into<String>,
        codec: C,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self
    where
        F: 'static,
        C: Codec<F> + 'static,
    {
        self.push(Field {
            name: name.into(),
            codec,
            get: Box::new(getter(move |record: &T| Some(get(record)))),
            set: Box::new(set),
            present: None,
        })
    }

    /// Adds a field that is only written (and read) when `present` holds.
    ///
    /// `get` is only called for present fields; returning `None` from it fails the encode.
    pub fn optional<F, C>(
        self,
        name: impl Into<String>,
        codec: C,
        get: impl Fn(&T) -> Option<&F> + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
        present: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self
    where
        F: 'static,
        C: Codec<F> + 'static,
    {
        self.push(Field {
            name: name.into(),
            codec,
            get: Box::new(get),
            set: Box::new(set),
            present: Some(Box::new(present)),
        })
    }

    fn push(mut self, field: impl FieldCodec<T> + 'static) -> Self {
        self.fields.push(Box::new(field));
        self
    }

    /// Fails if two fields share a name.
    pub fn build(self) -> Result<Record<T>, Error> {
        let mut names = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name()) {
                return Err(
                    ErrorKind::Config(format!("duplicate field name {:?}", field.name())).into(),
                );
            }
        }
        debug!(fields = self.fields.len(), "built record codec");
        Ok(Record {
            factory: self.factory,
            fields: self.fields,
        })
    }
}
