use amf_pack::amfx::{AmfxDecoder, AmfxEncoder};
use amf_pack::{
    decode_verbose, encode_verbose, equals, ActionMessage, Amf3Decoder, Amf3Encoder, CodecConfig,
    DynamicRecord, IntegerOverflow, MalformedInput, MessageBody, MessageHeader, OrderedCollection,
    ReferenceScope, Value,
};

const OPEN: &str = r#"<amfx ver="3" xmlns="http://www.macromedia.com/2005/amfx">"#;

fn document(body: &str) -> String {
    format!(r#"{OPEN}<body targetURI="" responseURI="">{body}</body></amfx>"#)
}

fn single_body(value: Value) -> ActionMessage {
    let mut message = ActionMessage::new();
    message.add_body(MessageBody::new(value));
    message
}

fn round_trip(message: &ActionMessage) -> ActionMessage {
    let xml = encode_verbose(message).unwrap();
    decode_verbose(&xml).unwrap_or_else(|e| panic!("{e} in {xml}"))
}

#[test]
fn amfx_scalar_document_matrix() {
    let cases: Vec<(Value, &str)> = vec![
        (Value::Null, "<null/>"),
        (Value::Boolean(true), "<true/>"),
        (Value::Boolean(false), "<false/>"),
        (Value::Integer(0), "<int>0</int>"),
        (Value::Integer(i32::MIN), "<int>-2147483648</int>"),
        (Value::Integer(i32::MAX), "<int>2147483647</int>"),
        (Value::Double(0.5), "<double>0.5</double>"),
        (Value::Double(1e300), "<double>1e300</double>"),
        (Value::Double(f64::INFINITY), "<double>Infinity</double>"),
        (Value::Double(f64::NAN), "<double>NaN</double>"),
        (Value::from("Sample Value"), "<string>Sample Value</string>"),
        (Value::from(""), "<string/>"),
        (Value::from("a&b"), "<string>a&amp;b</string>"),
        (Value::Date(0.0), "<date>0.0</date>"),
        (Value::ByteArray(vec![0xde, 0xad]), "<bytearray>DEAD</bytearray>"),
    ];

    for (value, fragment) in cases {
        let message = single_body(value.clone());
        let xml = document(fragment);
        assert_eq!(encode_verbose(&message).unwrap(), xml, "encode {value:?}");

        let decoded = decode_verbose(&xml).unwrap();
        let data = &decoded.body(0).unwrap().data;
        assert!(
            equals(message.heap(), &value, decoded.heap(), data),
            "decode {fragment} gave {data:?}"
        );
    }
}

#[test]
fn amfx_decoder_accepts_lenient_literals() {
    let cases: Vec<(&str, Value)> = vec![
        ("<int> 42 </int>", Value::Integer(42)),
        ("<double>+Infinity</double>", Value::Double(f64::INFINITY)),
        ("<double>1E3</double>", Value::Double(1000.0)),
        ("<bytearray>dead</bytearray>", Value::ByteArray(vec![0xde, 0xad])),
        ("<bytearray/>", Value::ByteArray(vec![])),
        ("<undefined/>", Value::Null),
        ("<true></true>", Value::Boolean(true)),
        ("<string><![CDATA[<x>]]></string>", Value::from("<x>")),
    ];
    for (fragment, expected) in cases {
        let decoded = decode_verbose(&document(fragment)).unwrap();
        assert_eq!(decoded.body(0).unwrap().data, expected, "{fragment}");
    }
}

#[test]
fn amfx_numeric_edge_cases_keep_value_and_sign() {
    let doubles = [
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
        0.0,
        -0.0,
        f64::MIN_POSITIVE,
        5e-324,
        f64::MAX,
        f64::MIN,
    ];
    for d in doubles {
        let decoded = round_trip(&single_body(Value::Double(d)));
        match decoded.body(0).unwrap().data {
            Value::Double(back) if d.is_nan() => assert!(back.is_nan()),
            Value::Double(back) => {
                assert_eq!(back, d);
                assert_eq!(back.is_sign_negative(), d.is_sign_negative(), "{d:?}");
            }
            ref other => panic!("{d:?} decoded as {other:?}"),
        }
    }
}

#[test]
fn amfx_scenario_b_document() {
    let mut message = ActionMessage::new();
    let heap = message.heap_mut();
    let infinities = heap.alloc_record(
        [("prop0", f64::NEG_INFINITY), ("prop1", f64::INFINITY)]
            .into_iter()
            .collect(),
    );
    let flags = heap.alloc_collection(vec![Value::from(false), Value::from(true)].into());
    message.add_body(MessageBody::new("Sample Value").with_uris("null", "/1"));
    message.add_body(MessageBody::new(infinities).with_uris("null", "/2"));
    message.add_body(MessageBody::new(flags).with_uris("null", "/3"));

    let expected = [
        OPEN,
        r#"<body targetURI="null" responseURI="/1"><string>Sample Value</string></body>"#,
        r#"<body targetURI="null" responseURI="/2"><object><traits>"#,
        "<string>prop0</string><string>prop1</string></traits>",
        "<double>-Infinity</double><double>Infinity</double></object></body>",
        r#"<body targetURI="null" responseURI="/3"><array length="2"><false/><true/></array></body>"#,
        "</amfx>",
    ]
    .concat();
    assert_eq!(encode_verbose(&message).unwrap(), expected);
}

#[test]
fn amfx_headers_and_bodies_keep_order() {
    let mut message = ActionMessage::new();
    let mut header = MessageHeader::new("Credentials", "secret");
    header.must_understand = true;
    message.add_header(header);
    message.add_header(MessageHeader::new("DSId", "nil"));
    for i in 0..3 {
        message.add_body(MessageBody::new(i).with_uris("svc.op", format!("/{i}")));
    }

    let decoded = round_trip(&message);
    let names: Vec<_> = decoded.headers().iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["Credentials", "DSId"]);
    assert!(decoded.headers()[0].must_understand);
    for (i, body) in decoded.bodies().iter().enumerate() {
        assert_eq!(body.response_uri, format!("/{i}"));
        assert_eq!(body.data, Value::Integer(i as i32));
    }
}

#[test]
fn amfx_shared_record_decodes_to_one_node() {
    let mut message = ActionMessage::new();
    let heap = message.heap_mut();
    let record = heap.alloc_record([("k", 1)].into_iter().collect());
    let list = heap.alloc_collection(vec![record.clone(), record].into());
    message.add_body(MessageBody::new(list));

    let xml = encode_verbose(&message).unwrap();
    assert_eq!(xml.matches("<object>").count(), 1);
    assert_eq!(xml.matches(r#"<ref id="1"/>"#).count(), 1);

    let decoded = decode_verbose(&xml).unwrap();
    let id = decoded.body(0).unwrap().data.node_id().unwrap();
    let items = decoded.heap().collection(id).unwrap();
    assert_eq!(items.get(0), items.get(1));
}

#[test]
fn amfx_cycles_round_trip() {
    let mut message = ActionMessage::new();
    let heap = message.heap_mut();
    let a = heap.alloc_record(DynamicRecord::typed("flex.Node"));
    let b = heap.alloc_record(DynamicRecord::typed("flex.Node"));
    heap.record_mut(a.node_id().unwrap()).unwrap().insert("next", b.clone());
    heap.record_mut(b.node_id().unwrap()).unwrap().insert("next", a.clone());
    let list = heap.alloc_collection(OrderedCollection::with_len(1));
    heap.collection_mut(list.node_id().unwrap())
        .unwrap()
        .set(0, list.clone())
        .unwrap();
    message.add_body(MessageBody::new(a.clone()));
    message.add_body(MessageBody::new(list.clone()));

    let xml = encode_verbose(&message).unwrap();
    // Both records share one traits definition.
    assert_eq!(xml.matches(r#"<traits id="0"/>"#).count(), 1);

    let decoded = round_trip(&message);
    assert!(equals(message.heap(), &a, decoded.heap(), &decoded.body(0).unwrap().data));
    let list_back = &decoded.body(1).unwrap().data;
    assert!(equals(message.heap(), &list, decoded.heap(), list_back));
    let id = list_back.node_id().unwrap();
    assert_eq!(decoded.heap().collection(id).unwrap().get(0), Some(list_back));
}

#[test]
fn amfx_empty_collection_and_record_round_trip() {
    let mut message = ActionMessage::new();
    let heap = message.heap_mut();
    let list = heap.alloc_collection(OrderedCollection::default());
    let record = heap.alloc_record(DynamicRecord::new());
    message.add_body(MessageBody::new(list.clone()));
    message.add_body(MessageBody::new(record.clone()));

    let xml = encode_verbose(&message).unwrap();
    assert!(xml.contains(r#"<array length="0"/>"#));
    assert!(xml.contains("<object><traits/></object>"));

    let decoded = round_trip(&message);
    let list_id = decoded.body(0).unwrap().data.node_id().unwrap();
    assert!(decoded.heap().collection(list_id).unwrap().is_empty());
    let record_id = decoded.body(1).unwrap().data.node_id().unwrap();
    let record_back = decoded.heap().record(record_id).unwrap();
    assert!(record_back.is_empty());
    assert_eq!(record_back.class_name(), None);
}

#[test]
fn amfx_empty_key_record_round_trips() {
    let mut message = ActionMessage::new();
    let heap = message.heap_mut();
    let mut record = DynamicRecord::typed("Pair");
    record.insert("", 1);
    record.insert("b", "two");
    let first = heap.alloc_record(record.clone());
    let second = heap.alloc_record(record);
    let list = heap.alloc_collection(vec![first, second].into());
    message.add_body(MessageBody::new(list.clone()));

    let xml = encode_verbose(&message).unwrap();
    assert!(xml.contains(r#"<traits><string/><string>b</string></traits>"#), "{xml}");
    let decoded = round_trip(&message);
    assert!(equals(
        message.heap(),
        &list,
        decoded.heap(),
        &decoded.body(0).unwrap().data
    ));
}

#[test]
fn both_codecs_agree_on_integer_overflow() {
    let mut message = ActionMessage::new();
    message.add_body(MessageBody::new(i32::MAX));
    message.add_body(MessageBody::new(i32::MIN));
    message.add_body(MessageBody::new(-2000));

    for (overflow, expected) in [
        (IntegerOverflow::Wide, Value::Integer(i32::MAX)),
        (IntegerOverflow::PromoteToDouble, Value::Double(i32::MAX as f64)),
    ] {
        let config = CodecConfig {
            integer_overflow: overflow,
            ..CodecConfig::default()
        };
        let bytes = Amf3Encoder::with_config(config).encode(&message).unwrap();
        let binary = Amf3Decoder::with_config(config).decode(&bytes).unwrap();
        let xml = AmfxEncoder::with_config(config).encode(&message).unwrap();
        let verbose = AmfxDecoder::with_config(config).decode(&xml).unwrap();

        for decoded in [&binary, &verbose] {
            assert_eq!(decoded.body(0).unwrap().data, expected, "{overflow:?}");
            assert_eq!(decoded.body(2).unwrap().data, Value::Integer(-2000));
        }
        assert_eq!(binary.body(1).unwrap().data, verbose.body(1).unwrap().data);
    }
}

#[test]
fn amfx_associative_array_becomes_record() {
    let xml = document(concat!(
        r#"<array length="2">"#,
        r#"<item name="name"><string>n</string></item>"#,
        "<int>1</int><int>2</int>",
        "</array>"
    ));
    let decoded = decode_verbose(&xml).unwrap();
    let id = decoded.body(0).unwrap().data.node_id().unwrap();
    let record = decoded.heap().record(id).unwrap();
    assert_eq!(record.keys().collect::<Vec<_>>(), ["name", "0", "1"]);
    assert_eq!(record.get("1"), Some(&Value::Integer(2)));
}

#[test]
fn amfx_reference_scope_matrix() {
    let mut message = ActionMessage::new();
    message.add_body(MessageBody::new("repeat"));
    message.add_body(MessageBody::new("repeat"));

    let shared = encode_verbose(&message).unwrap();
    assert!(shared.contains(r#"<string id="0"/>"#));

    let per_value = CodecConfig {
        reference_scope: ReferenceScope::Value,
        ..CodecConfig::default()
    };
    let separate = AmfxEncoder::with_config(per_value).encode(&message).unwrap();
    assert_eq!(separate.matches("<string>repeat</string>").count(), 2);
    let decoded = AmfxDecoder::with_config(per_value).decode(&separate).unwrap();
    assert_eq!(decoded.body(1).unwrap().data, Value::from("repeat"));

    let err = AmfxDecoder::with_config(per_value)
        .decode(&shared)
        .unwrap_err();
    assert!(matches!(err, MalformedInput::InvalidReference { index: 0, .. }));
}

#[test]
fn amfx_version_attribute_matrix() {
    let zero = r#"<amfx ver="0"><body><null/></body></amfx>"#;
    assert_eq!(decode_verbose(zero).unwrap().version, 0);

    assert_eq!(
        decode_verbose(r#"<amfx ver="2"/>"#).unwrap_err(),
        MalformedInput::UnsupportedVersion { version: 2 }
    );
    assert!(matches!(
        decode_verbose("<amfx/>").unwrap_err(),
        MalformedInput::MissingAttribute { attribute: "ver", .. }
    ));
    assert!(matches!(
        decode_verbose(r#"<amfx ver="three"/>"#).unwrap_err(),
        MalformedInput::InvalidLiteral { kind: "version", .. }
    ));
}
