use affinidi_rdf_codec::*;

fn ex(local: &str) -> NamedNode {
    NamedNode::new(format!("http://example.org/{local}"))
}

fn dataset(quads: bool) -> Vec<Statement> {
    let graph = if quads {
        GraphLabel::Named(ex("g"))
    } else {
        GraphLabel::Default
    };
    vec![
        Statement::new(ex("s"), ex("p"), ex("o"), graph.clone()),
        Statement::new(ex("s"), ex("name"), Literal::lang("Alice", "en"), graph),
        Statement::triple(ex("t"), NamedNode::new(rdf::TYPE), ex("Thing")),
    ]
}

/// Test: auto-detection recognises the output of every encoder and decodes
/// it completely.
#[test]
fn detects_encoder_output() {
    let prefixed = EncoderOptions::builder()
        .with_prefix("ex", "http://example.org/")
        .build();
    let cases = [
        (Format::Turtle, false, &prefixed),
        (Format::TriG, true, &prefixed),
        (Format::NTriples, false, &EncoderOptions::default()),
        (Format::NQuads, true, &EncoderOptions::default()),
        (Format::RdfXml, false, &EncoderOptions::default()),
        (Format::JsonLd, false, &EncoderOptions::default()),
    ];
    for (format, quads, options) in cases {
        let statements = dataset(quads);
        let bytes = encode_all(&statements, format, options).unwrap();
        let decoder = Decoder::new(bytes.as_slice(), Format::Auto, DecoderOptions::default()).unwrap();
        assert_eq!(decoder.format(), format, "{}", String::from_utf8_lossy(&bytes));
        let decoded: Vec<Statement> = decoder.collect::<Result<_>>().unwrap();
        assert_eq!(decoded.len(), statements.len(), "{format}");
    }
}

/// Test: blank or empty input cannot be classified.
#[test]
fn empty_input_is_unsupported() {
    for input in ["", "  \n\t\r\n"] {
        let err = Decoder::new(input.as_bytes(), Format::Auto, DecoderOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }
}

/// Test: a document longer than the sample is replayed in full after
/// detection.
#[test]
fn long_documents_are_replayed() {
    let input: String = (0..200)
        .map(|i| format!("<http://example.org/s{i}> <http://example.org/p> \"{i}\" .\n"))
        .collect();
    assert!(input.len() > detect::SAMPLE_SIZE);
    let statements = decode_all(input.as_bytes(), Format::Auto, DecoderOptions::default()).unwrap();
    assert_eq!(statements.len(), 200);
    assert_eq!(statements[0].subject, Term::iri("http://example.org/s0"));
}

/// Test: a leading comment block does not hide the syntax.
#[test]
fn comments_before_the_first_statement() {
    let input = "# exported dataset\n# generated nightly\n\n<http://a/s> <http://a/p> <http://a/o> <http://a/g> .\n";
    let (format, _) = detect_format(input.as_bytes()).unwrap();
    assert_eq!(format, Format::NQuads);
}

/// Test: file names and media types map to formats for callers that know
/// them up front.
#[test]
fn names_extensions_and_media_types() {
    assert_eq!(Format::from_path("data/people.ttl"), Some(Format::Turtle));
    assert_eq!(Format::from_path("dump.NQ"), Some(Format::NQuads));
    assert_eq!(Format::from_path("README"), None);
    assert_eq!(
        Format::from_media_type("application/ld+json; profile=\"http://www.w3.org/ns/json-ld#expanded\""),
        Some(Format::JsonLd)
    );
    assert_eq!(Format::from_media_type("text/xml"), Some(Format::RdfXml));
    assert_eq!("n-triples".parse::<Format>().unwrap(), Format::NTriples);
    assert_eq!(
        "text/csv".parse::<Format>().unwrap_err().kind(),
        ErrorKind::UnsupportedFormat
    );
}
