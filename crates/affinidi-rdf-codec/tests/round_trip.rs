use affinidi_rdf_codec::*;

fn ex(local: &str) -> NamedNode {
    NamedNode::new(format!("http://example.org/{local}"))
}

/// One statement per object term kind, all in the default graph.
fn triples(with_quoted: bool) -> Vec<Statement> {
    let mut statements = vec![
        Statement::triple(ex("s"), ex("iri"), ex("o")),
        Statement::triple(ex("s"), ex("blank"), BlankNode::new("n1")),
        Statement::triple(BlankNode::new("n1"), ex("plain"), Literal::new("a \"quoted\"\nline\tand \\")),
        Statement::triple(ex("s"), ex("lang"), Literal::lang("bonjour", "fr")),
        Statement::triple(ex("s"), ex("typed"), Literal::typed("2024-01-01", NamedNode::new("http://www.w3.org/2001/XMLSchema#date"))),
        Statement::triple(ex("s"), ex("integer"), Literal::typed("42", NamedNode::new(xsd::INTEGER))),
        Statement::triple(ex("s"), ex("string"), Literal::typed("explicit", NamedNode::new(xsd::STRING))),
        Statement::triple(ex("s"), NamedNode::new(rdf::TYPE), ex("Thing")),
    ];
    if with_quoted {
        statements.push(Statement::triple(
            Triple::new(ex("s"), ex("p"), Literal::new("o")),
            ex("certainty"),
            Literal::typed("0.9", NamedNode::new(xsd::DECIMAL)),
        ));
        statements.push(Statement::triple(
            ex("claim"),
            ex("about"),
            Triple::new(BlankNode::new("n1"), ex("p"), ex("o")),
        ));
    }
    statements
}

fn quads() -> Vec<Statement> {
    vec![
        Statement::new(ex("s"), ex("p"), ex("o"), GraphLabel::Named(ex("g1"))),
        Statement::new(ex("s"), ex("p"), Literal::lang("hi", "en"), GraphLabel::Named(ex("g1"))),
        Statement::new(ex("t"), ex("p"), Literal::new("v"), GraphLabel::Blank(BlankNode::new("g2"))),
    ]
}

fn round_trip(statements: &[Statement], format: Format, options: &EncoderOptions) -> Vec<Statement> {
    let bytes = encode_all(statements, format, options).unwrap();
    decode_all(&bytes, format, DecoderOptions::default())
        .unwrap_or_else(|e| panic!("{format}: {e}\n{}", String::from_utf8_lossy(&bytes)))
}

fn assert_same_set(format: Format, expected: &[Statement], actual: &[Statement]) {
    assert_eq!(expected.len(), actual.len(), "{format}: {actual:?}");
    for statement in expected {
        assert!(
            actual.iter().any(|other| statement.semantically_eq(other)),
            "{format}: missing {statement}"
        );
    }
}

/// Test: every format recovers every term kind it can express.
#[test]
fn every_format_recovers_every_term_kind() {
    let options = EncoderOptions::default();
    for format in [Format::NTriples, Format::NQuads, Format::Turtle, Format::TriG] {
        let statements = triples(true);
        assert_same_set(format, &statements, &round_trip(&statements, format, &options));
    }
    for format in [Format::RdfXml, Format::JsonLd] {
        let statements = triples(false);
        assert_same_set(format, &statements, &round_trip(&statements, format, &options));
    }
}

/// Test: prefixed and pretty output reads back to the same statements.
#[test]
fn prefixed_output_round_trips() {
    let options = EncoderOptions::builder()
        .with_prefix("ex", "http://example.org/")
        .with_pretty(true)
        .build();
    for format in [Format::Turtle, Format::TriG, Format::JsonLd] {
        let statements = triples(format != Format::JsonLd);
        assert_same_set(format, &statements, &round_trip(&statements, format, &options));
    }
}

/// Test: named and blank graph labels survive the quad formats.
#[test]
fn graphs_survive_quad_formats() {
    let mut statements = triples(false);
    statements.extend(quads());
    for format in [Format::NQuads, Format::TriG, Format::JsonLd] {
        assert!(format.supports_quads());
        assert_same_set(format, &statements, &round_trip(&statements, format, &EncoderOptions::default()));
    }
}

/// Test: compact and pretty TriG both read back.
#[test]
fn trig_layouts() {
    let statements = quads();
    for pretty in [false, true] {
        let options = EncoderOptions::builder().with_pretty(pretty).build();
        assert_same_set(Format::TriG, &statements, &round_trip(&statements, Format::TriG, &options));
    }
}

/// Test: N-Triples output is byte-stable across a decode/encode cycle.
#[test]
fn ntriples_output_is_stable() {
    let statements = triples(true);
    let first = encode_all(&statements, Format::NTriples, &EncoderOptions::default()).unwrap();
    let decoded = decode_all(&first, Format::NTriples, DecoderOptions::default()).unwrap();
    let second = encode_all(&decoded, Format::NTriples, &EncoderOptions::default()).unwrap();
    assert_eq!(first, second);
}

/// Test: a statement decoded from one format encodes into every other.
#[test]
fn cross_format_conversion() {
    let turtle = "\
@prefix ex: <http://example.org/> .
ex:alice a ex:Person ;
    ex:name \"Alice\"@en ;
    ex:knows [ ex:name \"Bob\" ] .
";
    let statements = decode_all(turtle.as_bytes(), Format::Turtle, DecoderOptions::default()).unwrap();
    assert_eq!(statements.len(), 4);
    for format in Format::ALL.iter().copied().filter(|f| *f != Format::Auto) {
        let converted = round_trip(&statements, format, &EncoderOptions::default());
        assert_same_set(format, &statements, &converted);
    }
}
