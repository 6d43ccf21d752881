//! Tag-keyed records: a sequence of `(tag, value)` entries.
//!
//! Each entry is a tag (written with a tag codec) followed by a value written with the codec
//! registered for that tag. Entries whose tag has no registered codec go through a default
//! codec, which fails unless one is configured. The same tag may appear any number of times;
//! all of its values are kept in order.
//!
//! Decoding stops when the source is exhausted or `max_fields` entries have been read, so a
//! tagged record is normally framed by a [`ByteCountPrefixed`](crate::variable::ByteCountPrefixed)
//! or placed last.

use crate::{error::ErrorKind, primitives::Fail, Codec, EncodeResult, Error};
use bytes::{Buf, BufMut};
use indexmap::IndexMap;
use std::{collections::HashMap, fmt::Display, hash::Hash};
use tracing::{debug, trace};

/// A value made of tagged entries.
///
/// Tags are reported in first-insertion order; values of one tag in insertion order.
pub trait TaggedRecord<K, V> {
    /// Distinct tags, in the order they were first added.
    fn tags(&self) -> Vec<K>;

    /// Every value stored under `tag`, possibly none.
    fn get_all(&self, tag: &K) -> &[V];

    /// Appends `value` under `tag`.
    fn add(&mut self, tag: K, value: V) -> &mut Self;
}

/// A [`TaggedRecord`] that remembers insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagMap<K: Hash + Eq, V> {
    entries: IndexMap<K, Vec<V>>,
}

impl<K: Hash + Eq, V> TagMap<K, V> {
    /// An empty map.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Number of `(tag, value)` entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first value stored under `tag`.
    pub fn get(&self, tag: &K) -> Option<&V> {
        self.entries.get(tag)?.first()
    }

    /// Entries in encoding order: grouped by tag, tags in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries
            .iter()
            .flat_map(|(tag, values)| values.iter().map(move |value| (tag, value)))
    }
}

impl<K: Hash + Eq, V> Default for TagMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, V> TaggedRecord<K, V> for TagMap<K, V> {
    fn tags(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    fn get_all(&self, tag: &K) -> &[V] {
        self.entries.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    fn add(&mut self, tag: K, value: V) -> &mut Self {
        self.entries.entry(tag).or_default().push(value);
        self
    }
}

impl<K: Hash + Eq + Clone, V> FromIterator<(K, V)> for TagMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (tag, value) in iter {
            map.add(tag, value);
        }
        map
    }
}

/// Encodes a [`TaggedRecord`] `R` with tags `K` and values `V`.
///
/// `count` in the result of an encode is the number of entries written.
pub struct Tagged<K, V, R> {
    tag: Box<dyn Codec<K>>,
    codecs: HashMap<K, Box<dyn Codec<V>>>,
    default: Box<dyn Codec<V>>,
    max_fields: Option<usize>,
    factory: Box<dyn Fn() -> Option<R> + Send + Sync>,
}

impl<K, V, R> Tagged<K, V, R>
where
    K: Hash + Eq + Clone + Display + Send + Sync + 'static,
    V: 'static,
    R: TaggedRecord<K, V>,
{
    /// Starts a codec whose decoded records begin as whatever `factory` yields.
    pub fn builder(
        tag: impl Codec<K> + 'static,
        factory: impl Fn() -> Option<R> + Send + Sync + 'static,
    ) -> Builder<K, V, R> {
        Builder {
            tag: Box::new(tag),
            codecs: Vec::new(),
            default: Box::new(Fail),
            max_fields: None,
            factory: Box::new(factory),
        }
    }

    fn codec_for(&self, tag: &K) -> &dyn Codec<V> {
        match self.codecs.get(tag) {
            Some(codec) => &**codec,
            None => {
                trace!(%tag, "no codec registered for tag, using default");
                &*self.default
            }
        }
    }
}

impl<K, V> Tagged<K, V, TagMap<K, V>>
where
    K: Hash + Eq + Clone + Display + Send + Sync + 'static,
    V: 'static,
{
    /// Starts a codec decoding into a [`TagMap`].
    pub fn map_builder(tag: impl Codec<K> + 'static) -> Builder<K, V, TagMap<K, V>> {
        Self::builder(tag, || Some(TagMap::new()))
    }
}

impl<K, V, R> Codec<R> for Tagged<K, V, R>
where
    K: Hash + Eq + Clone + Display + Send + Sync + 'static,
    V: 'static,
    R: TaggedRecord<K, V>,
{
    fn encode(&self, value: &R, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        let tags = value.tags();
        if let Some(max) = self.max_fields {
            let entries: usize = tags.iter().map(|tag| value.get_all(tag).len()).sum();
            if entries > max {
                return Err(ErrorKind::LengthOutOfRange(entries).into());
            }
        }
        let mut result = EncodeResult::EMPTY;
        for tag in tags {
            let codec = self.codec_for(&tag);
            for item in value.get_all(&tag) {
                let written = self
                    .tag
                    .encode(&tag, buf)
                    .and_then(|t| Ok(t + codec.encode(item, buf)?))
                    .map_err(|e| e.in_field(tag.to_string()))?;
                result += EncodeResult::new(1, written.bytes);
            }
        }
        Ok(result)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<R, Error> {
        let mut record = (self.factory)().ok_or(ErrorKind::Missing("tagged record factory"))?;
        let mut fields = 0;
        while buf.has_remaining() {
            if self.max_fields.is_some_and(|max| fields >= max) {
                trace!(fields, "tagged record reached maximum");
                break;
            }
            let tag = self.tag.decode(buf)?;
            let value = self
                .codec_for(&tag)
                .decode(buf)
                .map_err(|e| e.in_field(tag.to_string()))?;
            record.add(tag, value);
            fields += 1;
        }
        Ok(record)
    }
}

/// Collects the per-tag codecs of a [`Tagged`] codec.
pub struct Builder<K, V, R> {
    tag: Box<dyn Codec<K>>,
    codecs: Vec<(K, Box<dyn Codec<V>>)>,
    default: Box<dyn Codec<V>>,
    max_fields: Option<usize>,
    factory: Box<dyn Fn() -> Option<R> + Send + Sync>,
}

impl<K, V, R> Builder<K, V, R>
where
    K: Hash + Eq + Clone + Display + Send + Sync + 'static,
    V: 'static,
    R: TaggedRecord<K, V>,
{
    /// Registers the codec for values under `tag`.
    pub fn field(mut self, tag: K, codec: impl Codec<V> + 'static) -> Self {
        self.codecs.push((tag, Box::new(codec)));
        self
    }

    /// Sets the codec for tags with no registered codec (by default, they fail).
    pub fn default_codec(mut self, codec: impl Codec<V> + 'static) -> Self {
        self.default = Box::new(codec);
        self
    }

    /// Stops decoding after `max` entries, leaving anything else in the source. Encoding a
    /// record with more entries fails.
    pub fn max_fields(mut self, max: usize) -> Self {
        self.max_fields = Some(max);
        self
    }

    /// Fails if a tag was registered twice.
    pub fn build(self) -> Result<Tagged<K, V, R>, Error> {
        let mut codecs = HashMap::with_capacity(self.codecs.len());
        for (tag, codec) in self.codecs {
            if codecs.contains_key(&tag) {
                return Err(ErrorKind::Config(format!("duplicate codec for tag {tag}")).into());
            }
            codecs.insert(tag, codec);
        }
        debug!(tags = codecs.len(), "built tagged codec");
        Ok(Tagged {
            tag: self.tag,
            codecs,
            default: self.default,
            max_fields: self.max_fields,
            factory: self.factory,
        })
    }
}
