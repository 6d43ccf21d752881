//! Self-referential formats built with lazily resolved codecs.

use commonware_format::{
    charset::Charset,
    lazy::Lazy,
    list::ExhaustList,
    primitives::{Len, U8},
    record::Record,
    variable::{self, ByteCountPrefixed},
    Codec, CodecExt, EncodeResult,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};

#[derive(Clone, Debug, Default, PartialEq)]
struct Node {
    label: String,
    children: Vec<Node>,
}

impl Node {
    fn leaf(label: &str) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }
}

static RESOLUTIONS: AtomicUsize = AtomicUsize::new(0);

/// A node is its label followed by its children, framed so the list knows where it ends.
fn node_codec() -> Arc<dyn Codec<Node>> {
    static CODEC: OnceLock<Arc<dyn Codec<Node>>> = OnceLock::new();
    CODEC
        .get_or_init(|| {
            let child = Lazy::new(|| {
                RESOLUTIONS.fetch_add(1, Ordering::SeqCst);
                Some(node_codec())
            });
            let record = Record::<Node>::builder_default()
                .field(
                    "label",
                    variable::text(Len::U8, Charset::Utf8),
                    |n: &Node| &n.label,
                    |n, v| n.label = v,
                )
                .field(
                    "children",
                    ByteCountPrefixed::new(Len::U16, ExhaustList::new(child)),
                    |n: &Node| &n.children,
                    |n, v| n.children = v,
                )
                .build()
                .expect("valid node record");
            Arc::new(record)
        })
        .clone()
}

fn tree() -> Node {
    Node {
        label: "root".into(),
        children: vec![
            Node::leaf("a"),
            Node {
                label: "b".into(),
                children: vec![Node::leaf("c")],
            },
        ],
    }
}

#[test]
fn test_tree_roundtrip() {
    let codec = node_codec();
    let value = tree();
    let mut sink = Vec::new();
    let result = codec.encode(&value, &mut sink).unwrap();
    assert_eq!(result, EncodeResult::new(2, sink.len()));

    #[rustfmt::skip]
    let expected = [
        4, b'r', b'o', b'o', b't', 0, 12,
            1, b'a', 0, 0,
            1, b'b', 0, 4,
                1, b'c', 0, 0,
    ];
    assert_eq!(sink, expected);
    assert_eq!(codec.decode_exact(&sink[..]).unwrap(), value);

    // Repeated use never resolves the child codec again.
    for _ in 0..3 {
        let encoded = codec.encode_to_bytes(&value).unwrap();
        assert_eq!(codec.decode_exact(encoded).unwrap(), value);
    }
    assert_eq!(RESOLUTIONS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_decode() {
    let encoded = node_codec().encode_to_bytes(&tree()).unwrap().freeze();
    std::thread::scope(|s| {
        for _ in 0..8 {
            let encoded = encoded.clone();
            s.spawn(move || {
                let codec = node_codec();
                assert_eq!(codec.decode_exact(encoded).unwrap(), tree());
            });
        }
    });
    assert_eq!(RESOLUTIONS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_deep_error_path() {
    // The grandchild's label claims 5 bytes but its frame ends first.
    let bytes = [1u8, b'r', 0, 6, 1, b'x', 0, 2, 5, b'y'];
    let err = node_codec().decode_exact(&bytes[..]).unwrap_err();
    assert_eq!(
        err.path(),
        ["label", "children", "children"].map(String::from)
    );
    assert!(err
        .to_string()
        .starts_with("field [children.children.label]: "));
}
