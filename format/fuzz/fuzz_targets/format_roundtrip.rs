#![no_main]

use arbitrary::Arbitrary;
use bytes::Buf;
use commonware_format::{
    choice::{Choice, Discriminated},
    list::ExhaustList,
    primitives::{Len, U16, U32, U8},
    record::Record,
    tagged::{TagMap, Tagged},
    variable::{self, ByteCountPrefixed},
    Charset, Codec, CodecExt, CodePointReader, Digits, Strategy,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Clone, Copy, Debug)]
enum FuzzCharset {
    Ascii,
    Latin1,
    Utf8,
    Utf16Be,
    Utf16Le,
}

impl From<FuzzCharset> for Charset {
    fn from(charset: FuzzCharset) -> Self {
        match charset {
            FuzzCharset::Ascii => Charset::Ascii,
            FuzzCharset::Latin1 => Charset::Latin1,
            FuzzCharset::Utf8 => Charset::Utf8,
            FuzzCharset::Utf16Be => Charset::Utf16Be,
            FuzzCharset::Utf16Le => Charset::Utf16Le,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Transfer {
    id: u16,
    account: String,
    memo: Option<String>,
    amounts: Vec<u32>,
}

fn transfer_codec() -> Record<Transfer> {
    Record::<Transfer>::builder_default()
        .field("id", U16, |t: &Transfer| &t.id, |t, v| t.id = v)
        .field(
            "account",
            variable::digits(Len::U8, Digits::bcd(0)),
            |t: &Transfer| &t.account,
            |t, v| t.account = v,
        )
        .optional(
            "memo",
            variable::text(Len::Varint, Charset::Utf8),
            |t: &Transfer| t.memo.as_ref(),
            |t, v| t.memo = Some(v),
            |t| t.id % 2 == 1,
        )
        .field(
            "amounts",
            variable::list(Len::U8, U32),
            |t: &Transfer| &t.amounts,
            |t, v| t.amounts = v,
        )
        .build()
        .expect("valid transfer record")
}

#[derive(Arbitrary, Clone, Debug, PartialEq)]
enum Event {
    Ping(u32),
    Note(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum EventKind {
    Ping,
    Note,
}

impl Discriminated for Event {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            Self::Ping(_) => EventKind::Ping,
            Self::Note(_) => EventKind::Note,
        }
    }
}

fn event_codec() -> Choice<Event, u8> {
    Choice::<Event, u8>::builder(U8)
        .variant(1, EventKind::Ping, U32, Event::Ping, |e| match e {
            Event::Ping(v) => Some(v),
            _ => None,
        })
        .variant(
            2,
            EventKind::Note,
            variable::text(Len::U16, Charset::Utf16Le),
            Event::Note,
            |e| match e {
                Event::Note(v) => Some(v),
                _ => None,
            },
        )
        .build()
        .expect("valid event choice")
}

fn tagged_codec() -> Tagged<u8, String, TagMap<u8, String>> {
    Tagged::map_builder(U8)
        .field(1, variable::text(Len::U8, Charset::Latin1))
        .field(2, variable::digits(Len::U8, Digits::hex(0)))
        .default_codec(variable::text(Len::U8, Charset::Ascii))
        .max_fields(64)
        .build()
        .expect("valid tagged codec")
}

#[derive(Arbitrary, Debug)]
enum FuzzInput {
    // Arbitrary bytes through every composite codec
    DecodeTransfer(Vec<u8>),
    DecodeEvents(Vec<u8>),
    DecodeTagged(Vec<u8>),

    // Encoding arbitrary values
    Transfer {
        id: u16,
        digits: Vec<u8>,
        memo: String,
        amounts: Vec<u32>,
    },
    Events(Vec<Event>),
    Tagged(Vec<(u8, String)>),

    // Both code point strategies on the same bytes
    CodePoints {
        charset: FuzzCharset,
        count: u8,
        data: Vec<u8>,
        split: usize,
    },
}

/// Anything that decodes must re-encode to a value that decodes identically.
fn decode_stable<V: PartialEq + std::fmt::Debug>(codec: &dyn Codec<V>, data: &[u8]) {
    let mut buf = data;
    let Ok(value) = codec.decode(&mut buf) else {
        return;
    };
    let encoded = codec
        .encode_to_bytes(&value)
        .expect("decoded value must encode");
    let decoded = codec
        .decode_exact(encoded)
        .expect("re-encoded value must decode");
    assert_eq!(value, decoded);
}

/// Anything that encodes must decode back to itself, consuming every byte.
fn roundtrip<V: PartialEq + std::fmt::Debug>(codec: &dyn Codec<V>, value: &V) {
    let mut sink = Vec::new();
    let Ok(result) = codec.encode(value, &mut sink) else {
        return;
    };
    assert_eq!(result.bytes, sink.len());
    if let Some(size) = codec.fixed_size() {
        assert_eq!(size, sink.len());
    }
    let decoded = codec
        .decode_exact(&sink[..])
        .expect("encoded value must decode");
    assert_eq!(value, &decoded);
}

fn code_point_parity(charset: Charset, count: usize, data: &[u8], split: usize) {
    let mut contiguous = data;
    let buffered = CodePointReader::with_strategy(&mut contiguous, charset, Strategy::Buffered)
        .expect("slices are contiguous")
        .read(count);

    let (head, tail) = data.split_at(split % (data.len() + 1));
    let mut chained = head.chain(tail);
    let unbuffered = CodePointReader::with_strategy(&mut chained, charset, Strategy::Unbuffered)
        .expect("unbuffered reading accepts any source")
        .read(count);

    match (buffered, unbuffered) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a, b);
            assert_eq!(contiguous.remaining(), chained.remaining());
        }
        (Err(_), Err(_)) => {}
        (a, b) => panic!("strategies disagree: {a:?} vs {b:?}"),
    }
}

fn fuzz(input: FuzzInput) {
    match input {
        FuzzInput::DecodeTransfer(data) => decode_stable(&transfer_codec(), &data),
        FuzzInput::DecodeEvents(data) => {
            let events = ByteCountPrefixed::new(Len::U16, ExhaustList::new(event_codec()));
            decode_stable(&events, &data)
        }
        FuzzInput::DecodeTagged(data) => decode_stable(&tagged_codec(), &data),
        FuzzInput::Transfer {
            id,
            digits,
            memo,
            amounts,
        } => {
            let account = digits.iter().map(|d| char::from(b'0' + d % 10)).collect();
            let memo = (id % 2 == 1).then_some(memo);
            let transfer = Transfer {
                id,
                account,
                memo,
                amounts,
            };
            roundtrip(&transfer_codec(), &transfer)
        }
        FuzzInput::Events(events) => {
            let codec = ByteCountPrefixed::new(Len::U16, ExhaustList::new(event_codec()));
            roundtrip(&codec, &events)
        }
        FuzzInput::Tagged(entries) => {
            // Hex digits always decode in upper case.
            let record: TagMap<u8, String> = entries
                .into_iter()
                .map(|(tag, value)| match tag {
                    2 => (tag, value.to_ascii_uppercase()),
                    _ => (tag, value),
                })
                .collect();
            roundtrip(&tagged_codec(), &record)
        }
        FuzzInput::CodePoints {
            charset,
            count,
            data,
            split,
        } => code_point_parity(charset.into(), usize::from(count), &data, split),
    };
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
