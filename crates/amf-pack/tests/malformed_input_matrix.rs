use amf_pack::{
    decode_binary, decode_verbose, encode_binary, encode_verbose, ActionMessage, Amf3Decoder,
    AmfxDecoder, CodecConfig, DynamicRecord, MalformedInput, MessageBody, MessageHeader,
    RefTable, Value,
};

/// A message touching every value kind, references included.
fn rich_message() -> ActionMessage {
    let mut message = ActionMessage::new();
    let heap = message.heap_mut();
    let mut record = DynamicRecord::typed("com.example.Item");
    record.insert("name", "widget");
    record.insert("count", 3);
    record.insert("ratio", 0.25);
    record.insert("created", Value::Date(1.6e12));
    record.insert("blob", vec![1u8, 2, 3]);
    record.insert("flag", true);
    record.insert("nothing", Value::Null);
    let item = heap.alloc_record(record);
    let list = heap.alloc_collection(vec![item.clone(), Value::from("widget"), item].into());
    message.add_header(MessageHeader::new("DSId", "widget"));
    message.add_body(MessageBody::new(list).with_uris("svc.op", "/1"));
    message.add_body(MessageBody::new(i32::MAX));
    message
}

#[test]
fn every_binary_prefix_fails() {
    let bytes = encode_binary(&rich_message()).unwrap();
    assert!(decode_binary(&bytes).is_ok());
    for len in 0..bytes.len() {
        let result = decode_binary(&bytes[..len]);
        assert!(result.is_err(), "prefix of {len} bytes decoded: {result:?}");
    }
}

#[test]
fn every_verbose_prefix_fails() {
    let xml = encode_verbose(&rich_message()).unwrap();
    assert!(decode_verbose(&xml).is_ok());
    for (len, _) in xml.char_indices() {
        let result = decode_verbose(&xml[..len]);
        assert!(result.is_err(), "prefix {:?} decoded: {result:?}", &xml[..len]);
    }
}

#[test]
fn binary_errors_report_offsets() {
    // version 3, no headers, one body with empty URIs, then AVMPLUS at 14.
    let prelude = [
        0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x11,
    ];
    let with = |tail: &[u8]| [&prelude[..], tail].concat();

    let cases: Vec<(Vec<u8>, MalformedInput)> = vec![
        (
            with(&[0x0b]),
            MalformedInput::UnknownMarker {
                offset: 15,
                format: "AMF3",
                marker: 0x0b,
            },
        ),
        (
            with(&[0x06, 0x02]),
            MalformedInput::InvalidReference {
                offset: 16,
                table: RefTable::String,
                index: 1,
                len: 0,
            },
        ),
        (
            with(&[0x09, 0x00]),
            MalformedInput::InvalidReference {
                offset: 15,
                table: RefTable::Object,
                index: 0,
                len: 0,
            },
        ),
        (
            with(&[0x06, 0x05, b'a']),
            MalformedInput::UnexpectedEof {
                offset: 17,
                needed: 1,
            },
        ),
        (
            with(&[0x06, 0x03, 0xff]),
            MalformedInput::InvalidUtf8 { offset: 17 },
        ),
        (
            with(&[0x03, 0x00]),
            MalformedInput::TrailingBytes {
                offset: 16,
                count: 1,
            },
        ),
        (
            vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x00],
            MalformedInput::UnsupportedVersion { version: 1 },
        ),
    ];

    for (bytes, expected) in cases {
        let err = decode_binary(&bytes).unwrap_err();
        assert_eq!(err, expected, "{bytes:02x?}");
        assert_eq!(err.offset(), expected.offset());
    }
}

#[test]
fn duplicate_keys_are_not_overwritten() {
    let prelude = [
        0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x11,
    ];
    // Array with associative "0": 7 and dense [9]; the dense value is at 22.
    let tail: &[u8] = &[0x09, 0x03, 0x03, b'0', 0x04, 0x07, 0x01, 0x04, 0x09];
    let mixed = [&prelude[..], tail].concat();
    assert_eq!(
        decode_binary(&mixed),
        Err(MalformedInput::DuplicateKey {
            offset: 22,
            key: "0".to_owned(),
        })
    );

    let xml = r#"<amfx ver="3"><body><array length="1"><item name="0"><int>7</int></item><int>9</int></array></body></amfx>"#;
    assert!(matches!(
        decode_verbose(xml),
        Err(MalformedInput::DuplicateKey { key, .. }) if key == "0"
    ));
}

#[test]
fn binary_traits_reference_must_exist() {
    let bytes = [
        0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x11,
        0x0a, 0x05, // object, traits reference 1
    ];
    assert!(matches!(
        decode_binary(&bytes),
        Err(MalformedInput::InvalidReference {
            table: RefTable::Traits,
            index: 1,
            ..
        })
    ));
}

#[test]
fn binary_huge_counts_fail_before_allocating() {
    let bytes = [
        0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x11,
        0x09, 0xbf, 0xff, 0xff, 0xff, // array claiming 2^27 - 1 elements
    ];
    assert!(matches!(
        decode_binary(&bytes),
        Err(MalformedInput::UnexpectedEof { .. })
    ));
}

#[test]
fn nesting_limit_applies_to_both_decoders() {
    let depth = 8;
    let mut message = ActionMessage::new();
    let heap = message.heap_mut();
    let mut value = Value::Null;
    for _ in 0..depth {
        value = heap.alloc_collection(vec![value].into());
    }
    message.add_body(MessageBody::new(value));

    let tight = CodecConfig {
        max_depth: depth - 1,
        ..CodecConfig::default()
    };
    let bytes = encode_binary(&message).unwrap();
    assert!(matches!(
        Amf3Decoder::with_config(tight).decode(&bytes),
        Err(MalformedInput::DepthExceeded { limit: 7, .. })
    ));
    let xml = encode_verbose(&message).unwrap();
    assert!(matches!(
        AmfxDecoder::with_config(tight).decode(&xml),
        Err(MalformedInput::DepthExceeded { limit: 7, .. })
    ));
}

#[test]
fn verbose_structure_errors() {
    let open = r#"<amfx ver="3"><body>"#;
    let close = "</body></amfx>";
    let cases: Vec<(String, &str)> = vec![
        (format!("{open}<long>1</long>{close}"), "UnknownTag"),
        (format!("{open}<int>1.5</int>{close}"), "InvalidLiteral"),
        (format!("{open}<double>fast</double>{close}"), "InvalidLiteral"),
        (format!("{open}<double>inf</double>{close}"), "InvalidLiteral"),
        (format!("{open}<double>nan</double>{close}"), "InvalidLiteral"),
        (format!("{open}<bytearray>ABC</bytearray>{close}"), "InvalidLiteral"),
        (format!("{open}<ref/>{close}"), "MissingAttribute"),
        (format!(r#"{open}<ref id="0"/>{close}"#), "InvalidReference"),
        (format!(r#"{open}<string id="x"/>{close}"#), "InvalidLiteral"),
        (format!(r#"{open}<array length="2"><null/></array>{close}"#), "LengthMismatch"),
        (
            format!(r#"{open}<array length="1"><null/><item name="k"><null/></item></array>{close}"#),
            "Unexpected",
        ),
        (format!("{open}<object><null/></object>{close}"), "Unexpected"),
        (format!(r#"{open}<object><traits id="3"/></object>{close}"#), "InvalidReference"),
        (format!("{open}<null/><null/>{close}"), "Unexpected"),
        (
            format!(r#"{open}<object><traits><string>k</string><string>k</string></traits><null/><null/></object>{close}"#),
            "DuplicateKey",
        ),
        (format!("{open}stray{close}"), "Unexpected"),
        (format!("{open}<int>1</string>{close}"), "Xml"),
        (format!("{open}<null/>{close}<amfx ver=\"3\"/>"), "Unexpected"),
        (r#"<amfx ver="3"><body/></amfx>"#.to_owned(), "Unexpected"),
        (r#"<amfx ver="3"><null/></amfx>"#.to_owned(), "Unexpected"),
        (r#"<amfx ver="3"><header><null/></header></amfx>"#.to_owned(), "MissingAttribute"),
        (
            r#"<amfx ver="3"><header name="h" mustUnderstand="yes"><null/></header></amfx>"#
                .to_owned(),
            "InvalidLiteral",
        ),
        ("<message/>".to_owned(), "UnknownTag"),
        (String::new(), "Unexpected"),
    ];

    for (xml, expected) in cases {
        let err = decode_verbose(&xml).unwrap_err();
        let found = match &err {
            MalformedInput::Xml { .. } => "Xml",
            MalformedInput::UnknownTag { .. } => "UnknownTag",
            MalformedInput::Unexpected { .. } => "Unexpected",
            MalformedInput::MissingAttribute { .. } => "MissingAttribute",
            MalformedInput::InvalidLiteral { .. } => "InvalidLiteral",
            MalformedInput::InvalidReference { .. } => "InvalidReference",
            MalformedInput::LengthMismatch { .. } => "LengthMismatch",
            MalformedInput::DuplicateKey { .. } => "DuplicateKey",
            _ => "other",
        };
        assert_eq!(found, expected, "{xml}: {err}");
    }
}
