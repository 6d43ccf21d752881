//! End-to-end behavior of composed codecs.

use bytes::{Buf, Bytes};
use commonware_format::{
    charset::Charset,
    choice::{Choice, Discriminated},
    code_point::{CodePointReader, Strategy},
    digits::Digits,
    list::{ExhaustList, FixedList},
    primitives::{Bool, Len, U16, U32, U8},
    record::Record,
    tagged::{TagMap, Tagged, TaggedRecord},
    text::RemainingText,
    variable::{self, ByteCountPrefixed},
    Codec, CodecExt, EncodeResult, ErrorKind,
};
use tracing::Level;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::TRACE)
        .try_init();
}

#[test]
fn test_byte_count_prefixed_text() {
    init_tracing();
    let codec = ByteCountPrefixed::new(Len::U8, RemainingText::new(Charset::Utf8));
    let encoded = codec.encode_to_bytes(&"hi".to_string()).unwrap();
    assert_eq!(&encoded[..], &[0x02, b'h', b'i']);

    let mut buf = encoded.freeze();
    assert_eq!(codec.decode(&mut buf).unwrap(), "hi");
    assert_eq!(buf.remaining(), 0);
}

#[test]
fn test_item_count_prefixed_hex() {
    init_tracing();
    let codec = variable::digits(Len::U8, Digits::hex(0));
    let mut sink = Vec::new();
    let result = codec.encode(&"abc".to_string(), &mut sink).unwrap();
    assert_eq!(sink, [3, 0x0A, 0xBC]);
    assert_eq!(result, EncodeResult::new(3, 3));
    assert_eq!(codec.decode_exact(&[3u8, 0x0A, 0xBC][..]).unwrap(), "ABC");
}

#[test]
fn test_decode_consumes_exactly() {
    init_tracing();
    // Each codec leaves the trailing marker byte for whoever reads next.
    let marker = 0xEE;
    let cases: Vec<(Box<dyn Codec<String>>, Vec<u8>)> = vec![
        (
            Box::new(variable::text(Len::U8, Charset::Utf8)),
            vec![2, 0xC3, 0xA9, b'x'],
        ),
        (
            Box::new(ByteCountPrefixed::new(
                Len::U16,
                RemainingText::new(Charset::Latin1),
            )),
            vec![0, 2, 0xE9, b'x'],
        ),
        (Box::new(Digits::bcd(3)), vec![0x01, 0x23]),
    ];
    for (codec, mut bytes) in cases {
        bytes.push(marker);
        let mut buf = Bytes::from(bytes);
        codec.decode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[marker]);
    }
}

#[test]
fn test_empty_values_roundtrip() {
    init_tracing();
    let text = variable::text(Len::U8, Charset::Utf16Le);
    let encoded = text.encode_to_bytes(&String::new()).unwrap();
    assert_eq!(&encoded[..], &[0]);
    assert_eq!(text.decode_exact(encoded).unwrap(), "");

    let list = variable::list(Len::Varint, U32);
    let encoded = list.encode_to_bytes(&Vec::new()).unwrap();
    assert_eq!(&encoded[..], &[0]);
    assert!(list.decode_exact(encoded).unwrap().is_empty());

    let framed = ByteCountPrefixed::new(Len::U8, ExhaustList::new(U16));
    let encoded = framed.encode_to_bytes(&Vec::new()).unwrap();
    assert_eq!(framed.decode_exact(encoded).unwrap(), Vec::<u16>::new());
}

#[test]
fn test_code_point_strategies_agree() {
    init_tracing();
    let text = "a\u{e9}\u{20ac}\u{1F600}z";
    for charset in [Charset::Utf8, Charset::Utf16Be, Charset::Utf16Le] {
        let mut bytes = charset.encode(text).unwrap();
        bytes.extend_from_slice(&[0xFF, 0xFE]);

        let mut contiguous = &bytes[..];
        let mut reader = CodePointReader::new(&mut contiguous, charset);
        assert_eq!(reader.strategy(), Strategy::Buffered);
        assert_eq!(reader.read(4).unwrap(), "a\u{e9}\u{20ac}\u{1F600}");

        let (head, tail) = bytes.split_at(3);
        let mut chained = head.chain(tail);
        let mut reader = CodePointReader::new(&mut chained, charset);
        assert_eq!(reader.strategy(), Strategy::Unbuffered);
        assert_eq!(reader.read(4).unwrap(), "a\u{e9}\u{20ac}\u{1F600}");

        assert_eq!(contiguous.remaining(), chained.remaining());
    }
}

#[test]
fn test_code_point_end_of_stream() {
    init_tracing();
    let mut buf = &b"ab"[..];
    let err = CodePointReader::new(&mut buf, Charset::Ascii)
        .read(3)
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::EndOfStream {
            read: 2,
            requested: 3,
            ..
        }
    ));
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Inner {
    kind: u8,
    code: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Outer {
    id: u16,
    inner: Inner,
}

fn outer() -> Record<Outer> {
    let inner = Record::<Inner>::builder_default()
        .field("kind", U8, |i: &Inner| &i.kind, |i, v| i.kind = v)
        .field("code", Digits::bcd(4), |i: &Inner| &i.code, |i, v| i.code = v)
        .build()
        .unwrap();
    Record::<Outer>::builder_default()
        .field("id", U16, |o: &Outer| &o.id, |o, v| o.id = v)
        .field("inner", inner, |o: &Outer| &o.inner, |o, v| o.inner = v)
        .build()
        .unwrap()
}

#[test]
fn test_nested_record_roundtrip() {
    init_tracing();
    let codec = outer();
    let value = Outer {
        id: 9,
        inner: Inner {
            kind: 2,
            code: "0420".into(),
        },
    };
    let mut sink = Vec::new();
    let result = codec.encode(&value, &mut sink).unwrap();
    assert_eq!(sink, [0, 9, 2, 0x04, 0x20]);
    assert_eq!(result, EncodeResult::new(2, 5));
    assert_eq!(codec.decode_exact(&sink[..]).unwrap(), value);
}

#[test]
fn test_nested_field_path() {
    init_tracing();
    let err = outer()
        .decode_exact(&[0u8, 9, 2, 0x04, 0x2C][..])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "field [inner.code]: invalid bcd: non-decimal nibble 0xc"
    );

    let bad = Outer {
        id: 1,
        inner: Inner {
            kind: 0,
            code: "12".into(),
        },
    };
    let err = outer().encode_to_bytes(&bad).unwrap_err();
    assert_eq!(
        err.to_string(),
        "field [inner.code]: invalid length: found 2, expected 4"
    );
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Frame {
    extended: bool,
    flags: u8,
    extra: Option<u32>,
}

#[test]
fn test_presence_predicate() {
    init_tracing();
    let codec = Record::<Frame>::builder_default()
        .field("extended", Bool, |f: &Frame| &f.extended, |f, v| f.extended = v)
        .field("flags", U8, |f: &Frame| &f.flags, |f, v| f.flags = v)
        .optional(
            "extra",
            U32,
            |f: &Frame| f.extra.as_ref(),
            |f, v| f.extra = Some(v),
            |f| f.extended,
        )
        .build()
        .unwrap();

    let short = Frame {
        extended: false,
        flags: 3,
        extra: None,
    };
    let encoded = codec.encode_to_bytes(&short).unwrap();
    assert_eq!(&encoded[..], &[0, 3]);
    assert_eq!(codec.decode_exact(encoded).unwrap(), short);

    let long = Frame {
        extended: true,
        flags: 3,
        extra: Some(1),
    };
    let encoded = codec.encode_to_bytes(&long).unwrap();
    assert_eq!(&encoded[..], &[1, 3, 0, 0, 0, 1]);
    assert_eq!(codec.decode_exact(encoded).unwrap(), long);
}

#[test]
fn test_tagged_duplicates_preserved() {
    init_tracing();
    let codec = Tagged::map_builder(variable::text(Len::U8, Charset::Ascii))
        .field("code".to_string(), U8)
        .field("name".to_string(), U8)
        .build()
        .unwrap();

    let mut record = TagMap::new();
    record
        .add("code".to_string(), 1u8)
        .add("code".to_string(), 2)
        .add("code".to_string(), 3);
    let mut sink = Vec::new();
    let result = codec.encode(&record, &mut sink).unwrap();
    assert_eq!(result.count, 3);
    assert_eq!(result.bytes, sink.len());

    let decoded = codec.decode_exact(&sink[..]).unwrap();
    assert_eq!(decoded.tags(), vec!["code".to_string()]);
    assert_eq!(decoded.get_all(&"code".to_string()), &[1, 2, 3]);
}

#[test]
fn test_tagged_first_insertion_order() {
    init_tracing();
    let codec = Tagged::map_builder(U8)
        .field(1, U8)
        .field(2, U8)
        .build()
        .unwrap();
    let decoded = codec
        .decode_exact(&[2u8, 20, 1, 10, 2, 21][..])
        .unwrap();
    assert_eq!(decoded.tags(), vec![2, 1]);
    assert_eq!(
        decoded.iter().collect::<Vec<_>>(),
        vec![(&2, &20), (&2, &21), (&1, &10)]
    );
}

#[test]
fn test_tagged_partial_failure_names_tag() {
    init_tracing();
    let codec = Tagged::map_builder(U8).field(1, U16).build().unwrap();
    let err = codec.decode_exact(&[1u8, 0, 5, 4, 0][..]).unwrap_err();
    assert_eq!(err.to_string(), "field [4]: no codec registered for value");

    let mut record = TagMap::new();
    record.add(1u8, 5u16).add(4, 6);
    let err = codec.encode_to_bytes(&record).unwrap_err();
    assert_eq!(err.path(), ["4"]);
    assert_eq!(err.to_string(), "field [4]: no codec registered for value");
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Number(u32),
    Items(Vec<u8>),
    Flag(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum PayloadKind {
    Number,
    Items,
    Flag,
}

impl Discriminated for Payload {
    type Kind = PayloadKind;

    fn kind(&self) -> PayloadKind {
        match self {
            Self::Number(_) => PayloadKind::Number,
            Self::Items(_) => PayloadKind::Items,
            Self::Flag(_) => PayloadKind::Flag,
        }
    }
}

fn payload() -> Choice<Payload, u8> {
    Choice::<Payload, u8>::builder(U8)
        .variant(1, PayloadKind::Number, U32, Payload::Number, |p| match p {
            Payload::Number(n) => Some(n),
            _ => None,
        })
        .variant(
            2,
            PayloadKind::Items,
            variable::list(Len::U8, U8),
            Payload::Items,
            |p| match p {
                Payload::Items(items) => Some(items),
                _ => None,
            },
        )
        .build()
        .unwrap()
}

#[test]
fn test_choice_dispatch() {
    init_tracing();
    let codec = payload();
    let value = Payload::Items(vec![7, 8]);
    let mut sink = Vec::new();
    let result = codec.encode(&value, &mut sink).unwrap();
    assert_eq!(sink, [2, 2, 7, 8]);
    assert_eq!(result, EncodeResult::new(2, 4));
    assert_eq!(codec.decode_exact(&sink[..]).unwrap(), value);
}

#[test]
fn test_choice_unregistered() {
    init_tracing();
    let codec = payload();
    let err = codec.encode_to_bytes(&Payload::Flag(true)).unwrap_err();
    assert!(err.to_string().starts_with("no codec registered for"));

    let err = codec.decode_exact(&[3u8, 1][..]).unwrap_err();
    assert!(err.to_string().starts_with("no codec registered for"));
}

#[test]
fn test_lists_of_choices() {
    init_tracing();
    let codec = FixedList::new(payload(), 2);
    let value = vec![Payload::Number(1), Payload::Items(vec![])];
    let encoded = codec.encode_to_bytes(&value).unwrap();
    assert_eq!(&encoded[..], &[1, 0, 0, 0, 1, 2, 0]);
    assert_eq!(codec.decode_exact(encoded).unwrap(), value);
}

#[test]
fn test_fixed_sink_overflow() {
    init_tracing();
    let mut backing = [0u8; 2];
    let mut sink = &mut backing[..];
    let err = variable::text(Len::U8, Charset::Utf8)
        .encode(&"abc".to_string(), &mut sink)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::EndOfBuffer { .. }));
}
