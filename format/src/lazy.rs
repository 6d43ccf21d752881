//! Deferred codec resolution for recursive formats.
//!
//! A recursive format (a tree whose nodes contain lists of nodes) needs a codec that refers to
//! itself. [`Lazy`] holds a supplier instead of a codec and calls it on first use, caching the
//! result for every later use. Construction therefore never recurses.
//!
//! ```
//! use commonware_format::{
//!     lazy::Lazy, list::ExhaustList, primitives::{Len, U8}, variable::ByteCountPrefixed,
//!     Codec, CodecExt, Map,
//! };
//! use std::sync::{Arc, OnceLock};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Node(u8, Vec<Node>);
//!
//! fn node() -> Arc<dyn Codec<Node>> {
//!     static CODEC: OnceLock<Arc<dyn Codec<Node>>> = OnceLock::new();
//!     CODEC
//!         .get_or_init(|| {
//!             let child = Lazy::new(|| Some(node()));
//!             let children = ByteCountPrefixed::new(Len::U8, ExhaustList::new(child));
//!             let codec: Arc<dyn Codec<Node>> = Arc::new(Map::new(
//!                 (U8, children),
//!                 |n: &Node| (n.0, n.1.clone()),
//!                 |(v, c): (u8, Vec<Node>)| Ok(Node(v, c)),
//!             ));
//!             codec
//!         })
//!         .clone()
//! }
//!
//! let leaf = Node(2, Vec::new());
//! let encoded = node().encode_to_bytes(&Node(1, vec![leaf])).unwrap();
//! assert_eq!(&encoded[..], &[1, 2, 2, 0]);
//! assert_eq!(node().decode_exact(encoded).unwrap(), Node(1, vec![Node(2, Vec::new())]));
//! ```

use crate::{error::ErrorKind, Codec, EncodeResult, Error};
use bytes::{Buf, BufMut};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::debug;

type Supplier<V> = Box<dyn Fn() -> Option<Arc<dyn Codec<V>>> + Send + Sync>;

/// A codec resolved from a supplier on first use.
///
/// The supplier runs at most once, even when first uses race on several threads. A supplier
/// yielding `None` fails that use and is retried on the next.
pub struct Lazy<V> {
    supplier: Supplier<V>,
    resolved: OnceLock<Arc<dyn Codec<V>>>,
    resolving: Mutex<()>,
}

impl<V> Lazy<V> {
    /// Defers to whatever `supplier` yields on first use.
    pub fn new(supplier: impl Fn() -> Option<Arc<dyn Codec<V>>> + Send + Sync + 'static) -> Self {
        Self {
            supplier: Box::new(supplier),
            resolved: OnceLock::new(),
            resolving: Mutex::new(()),
        }
    }

    /// Returns the underlying codec, calling the supplier if this is the first use.
    pub fn resolve(&self) -> Result<&Arc<dyn Codec<V>>, Error> {
        if let Some(codec) = self.resolved.get() {
            return Ok(codec);
        }

        // Serialize first uses so the supplier runs once.
        let _guard = self
            .resolving
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(codec) = self.resolved.get() {
            return Ok(codec);
        }
        let codec = (self.supplier)().ok_or(ErrorKind::Missing("lazy codec supplier"))?;
        debug!("resolved lazy codec");
        Ok(self.resolved.get_or_init(|| codec))
    }

    /// Returns true once the supplier has produced a codec.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl<V> Codec<V> for Lazy<V> {
    fn encode(&self, value: &V, buf: &mut dyn BufMut) -> Result<EncodeResult, Error> {
        self.resolve()?.encode(value, buf)
    }

    fn decode(&self, buf: &mut dyn Buf) -> Result<V, Error> {
        self.resolve()?.decode(buf)
    }

    /// Always `None`: resolving here could recurse without end.
    fn fixed_size(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{primitives::U16, CodecExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted(calls: Arc<AtomicUsize>) -> Lazy<u16> {
        Lazy::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(Arc::new(U16) as Arc<dyn Codec<u16>>)
        })
    }

    #[test]
    fn test_resolves_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = counted(calls.clone());
        assert!(!lazy.is_resolved());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        for value in [1u16, 2, 3] {
            let encoded = lazy.encode_to_bytes(&value).unwrap();
            assert_eq!(lazy.decode_exact(encoded).unwrap(), value);
        }
        assert!(lazy.is_resolved());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_use() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = counted(calls.clone());
        std::thread::scope(|s| {
            for i in 0..8u16 {
                let lazy = &lazy;
                s.spawn(move || {
                    let encoded = lazy.encode_to_bytes(&i).unwrap();
                    assert_eq!(lazy.decode_exact(encoded).unwrap(), i);
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_supplier_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let lazy: Lazy<u16> = Lazy::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        });
        let err = lazy.encode_to_bytes(&1).unwrap_err();
        assert_eq!(err.to_string(), "lazy codec supplier yielded no instance");
        assert!(lazy.decode_exact(&[0u8, 1][..]).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!lazy.is_resolved());
    }
}
