use affinidi_rdf_codec::*;

fn decode(input: &str, format: Format) -> Vec<Statement> {
    decode_all(input.as_bytes(), format, DecoderOptions::default()).unwrap()
}

/// Test: a prefixed Turtle triple expands to full IRIs in the default graph.
#[test]
fn turtle_basic() {
    let statements = decode(
        "@prefix ex: <http://example.org/> .\nex:s ex:p ex:o .\n",
        Format::Turtle,
    );
    assert_eq!(
        statements,
        vec![Statement::triple(
            NamedNode::new("http://example.org/s"),
            NamedNode::new("http://example.org/p"),
            NamedNode::new("http://example.org/o"),
        )]
    );
    assert!(!statements[0].is_quad());
}

/// Test: a collection is emitted as the referencing triple followed by the
/// rdf:first / rdf:rest chain, head first.
#[test]
fn turtle_collection() {
    let statements = decode("<a> <p> ( <o1> <o2> ) .", Format::Turtle);
    let b1 = Term::blank("b1");
    let b2 = Term::blank("b2");
    assert_eq!(
        statements,
        vec![
            Statement::triple(Term::iri("a"), NamedNode::new("p"), b1.clone()),
            Statement::triple(b1.clone(), NamedNode::new(rdf::FIRST), Term::iri("o1")),
            Statement::triple(b1, NamedNode::new(rdf::REST), b2.clone()),
            Statement::triple(b2.clone(), NamedNode::new(rdf::FIRST), Term::iri("o2")),
            Statement::triple(b2, NamedNode::new(rdf::REST), Term::iri(rdf::NIL)),
        ]
    );
}

/// Test: the fourth N-Quads term becomes the graph label.
#[test]
fn nquads_quad() {
    let statements = decode("<s> <p> <o> <g> .\n", Format::NQuads);
    assert_eq!(statements.len(), 1);
    assert!(statements[0].is_quad());
    assert_eq!(statements[0].graph, GraphLabel::Named(NamedNode::new("g")));
    assert_eq!(statements[0].object, Term::iri("o"));
}

/// Test: statements inside a TriG GRAPH block carry the block's label.
#[test]
fn trig_graph_block() {
    let statements = decode("GRAPH <g> { <s> <p> <o> . }", Format::TriG);
    assert_eq!(
        statements,
        vec![Statement::new(
            NamedNode::new("s"),
            NamedNode::new("p"),
            NamedNode::new("o"),
            GraphLabel::Named(NamedNode::new("g")),
        )]
    );
}

/// Test: a JSON-LD node object with a compact IRI id and a string value.
#[test]
fn jsonld_node() {
    let statements = decode(
        r#"{"@context":{"ex":"http://example.org/"},"@id":"ex:s","ex:p":"v"}"#,
        Format::JsonLd,
    );
    assert_eq!(statements.len(), 1);
    let statement = &statements[0];
    assert_eq!(statement.subject, Term::iri("http://example.org/s"));
    assert_eq!(statement.predicate, NamedNode::new("http://example.org/p"));
    let literal = statement.object.as_literal().unwrap();
    assert_eq!(literal.value, "v");
    assert_eq!(literal.language(), None);
    assert_eq!(literal.datatype_iri(), xsd::STRING);
    assert!(statement.graph.is_default());
}

/// Test: an N-Triples line with a quoted triple in subject position.
#[test]
fn ntriples_quoted_subject() {
    let statements = decode("<< <s> <p> <o> >> <asserted> \"true\" .", Format::NTriples);
    assert_eq!(statements.len(), 1);
    match &statements[0].subject {
        Term::QuotedTriple(triple) => {
            assert_eq!(
                **triple,
                Triple::new(NamedNode::new("s"), NamedNode::new("p"), NamedNode::new("o"))
            );
        }
        other => panic!("expected a quoted triple, got {other}"),
    }
    assert_eq!(statements[0].object, Term::Literal(Literal::new("true")));
}

/// Test: an RDF/XML description with a typed literal and a resource reference.
#[test]
fn rdfxml_description() {
    let input = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:ex="http://example.org/">
  <rdf:Description rdf:about="http://example.org/s">
    <ex:age rdf:datatype="http://www.w3.org/2001/XMLSchema#integer">42</ex:age>
    <ex:knows rdf:resource="http://example.org/o"/>
  </rdf:Description>
</rdf:RDF>"#;
    let statements = decode(input, Format::Auto);
    assert_eq!(
        statements,
        vec![
            Statement::triple(
                NamedNode::new("http://example.org/s"),
                NamedNode::new("http://example.org/age"),
                Literal::typed("42", NamedNode::new(xsd::INTEGER)),
            ),
            Statement::triple(
                NamedNode::new("http://example.org/s"),
                NamedNode::new("http://example.org/knows"),
                NamedNode::new("http://example.org/o"),
            ),
        ]
    );
}

/// Test: the statement count of a line-based document matches its
/// non-comment lines.
#[test]
fn line_count_matches_statement_count() {
    let input = "\
# header
<http://a/s1> <http://a/p> <http://a/o> .
<http://a/s2> <http://a/p> \"two\"@en .

<http://a/s3> <http://a/p> _:x <http://a/g> .
# trailer
";
    let expected = input
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .count();
    assert_eq!(decode(input, Format::NQuads).len(), expected);
}

/// Test: located errors print as `format:line:column: message`.
#[test]
fn errors_carry_their_position() {
    let input = "<http://a/s> <http://a/p> <http://a/o> .\n<http://a/s> <http://a/p> .\n";
    let err = decode_all(input.as_bytes(), Format::NTriples, DecoderOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseError);
    let position = err.position().unwrap();
    assert_eq!(position.line, 2);
    assert!(err.to_string().starts_with("ntriples:2:"), "{err}");
}

/// Test: decoding through the iterator and the push interface agree.
#[test]
fn iterator_and_push_agree() {
    let input = "@prefix ex: <http://example.org/> .\nex:a ex:p [ ex:q ex:b ], ( 1 2 ) .\n";
    let pulled: Vec<Statement> = Decoder::new(input.as_bytes(), Format::Turtle, DecoderOptions::default())
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

    let mut pushed = Vec::new();
    let mut decoder = Decoder::new(input.as_bytes(), Format::Turtle, DecoderOptions::default()).unwrap();
    decoder
        .parse_with(|statement: Statement| {
            pushed.push(statement);
            Ok(())
        })
        .unwrap();

    assert_eq!(pulled, pushed);
    assert_eq!(pulled.len(), 7);
}
