use pcml_core::{DataType, ElementDecl, IntAttr, SchemaError, Usage};
use pcml_markup::{MarkupError, load_schema, parse_declaration};

// ── helpers ──────────────────────────────────────────────────────────────────

const QSYRUSRI: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE pcml SYSTEM "pcml.dtd">
<!-- user information, format USRI0100 -->
<pcml version="4.0">
  <struct name="usri0100">
    <data name="bytesReturned"  type="int"  length="4" />
    <data name="bytesAvailable" type="int"  length="4" />
    <data name="userProfile"    type="char" length="10" />
    <data name="lastSignon"     type="char" length="13" />
  </struct>

  <program name="qsyrusri" path="/QSYS.LIB/QSYRUSRI.PGM">
    <data name="receiver" type="struct" struct="usri0100" usage="output" outputsize="receiverLength" />
    <data name="receiverLength" type="int" length="4" usage="input" init="60" />
    <data name="format" type="char" length="8" usage="input" init="USRI0100" />
    <data name="profile" type="char" length="10" usage="input" />
    <data name="errorCode" type="int" length="4" usage="input" init="0" />
  </program>
</pcml>
"#;

fn syntax_position(err: MarkupError) -> (usize, usize, String) {
    match err {
        MarkupError::Syntax {
            line,
            column,
            message,
        } => (line, column, message),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

// ── tests ────────────────────────────────────────────────────────────────────

#[test]
fn loads_a_complete_document() {
    let tree = load_schema(QSYRUSRI).expect("document should load");

    let receiver = tree.lookup("qsyrusri.receiver").expect("receiver");
    assert_eq!(tree.node(receiver).usage, Usage::Output);
    assert_eq!(
        tree.node(receiver).output_size,
        IntAttr::Reference("receiverLength".to_string())
    );
    assert_eq!(tree.node(receiver).children().len(), 4);

    let signon = tree.lookup("qsyrusri.receiver.lastSignon").expect("expanded child");
    let attrs = tree.node(signon).data().expect("data node");
    assert_eq!(attrs.data_type, DataType::Char);
    assert_eq!(attrs.length, IntAttr::Literal(13));

    let format = tree.lookup("qsyrusri.format").unwrap();
    assert_eq!(tree.node(format).data().unwrap().init.as_deref(), Some("USRI0100"));
}

#[test]
fn keeps_attribute_order_and_unescapes_values() {
    let root = parse_declaration(
        r#"<pcml><program name='p' path="/A&amp;B.PGM"><data name="x" type="char" length='1' init="&lt;&quot;&gt;"/></program></pcml>"#,
    )
    .expect("parse");

    let program = &root.children[0];
    assert_eq!(program.get("path"), Some("/A&B.PGM"));
    let data: &ElementDecl = &program.children[0];
    assert_eq!(
        data.attributes
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>(),
        vec!["name", "type", "length", "init"]
    );
    assert_eq!(data.get("init"), Some("<\">"));
}

#[test]
fn comments_may_appear_between_elements() {
    let root = parse_declaration(
        "<pcml>\n  <!-- first -->\n  <struct name=\"s\"><!-- inner --></struct>\n</pcml>\n<!-- trailer -->",
    )
    .expect("parse");
    assert_eq!(root.children.len(), 1);
    assert!(root.children[0].children.is_empty());
}

#[test]
fn reports_mismatched_closing_tag_with_position() {
    let err = parse_declaration("<pcml>\n  <struct name=\"s\">\n  </program>\n</pcml>")
        .expect_err("mismatched tags");
    let (line, column, message) = syntax_position(err);
    assert_eq!(line, 3);
    assert_eq!(column, 5);
    assert!(message.contains("</struct>"), "{message}");
}

#[test]
fn rejects_character_data() {
    let err = parse_declaration("<pcml>\n<program name=\"p\" path=\"x\">hello</program></pcml>")
        .expect_err("text content");
    let (line, _, message) = syntax_position(err);
    assert_eq!(line, 2);
    assert!(message.contains("character data"), "{message}");
}

#[test]
fn rejects_unquoted_and_duplicate_attributes() {
    assert!(matches!(
        parse_declaration("<pcml><data name=x/></pcml>"),
        Err(MarkupError::Syntax { .. })
    ));
    let err = parse_declaration(r#"<pcml name="a" name="b"/>"#).expect_err("duplicate");
    let (_, _, message) = syntax_position(err);
    assert!(message.contains("`name`"), "{message}");
}

#[test]
fn rejects_unknown_entities_and_trailing_content() {
    assert!(matches!(
        parse_declaration(r#"<pcml x="&copy;"/>"#),
        Err(MarkupError::Syntax { .. })
    ));
    assert!(matches!(
        parse_declaration("<pcml/><pcml/>"),
        Err(MarkupError::Syntax { .. })
    ));
    assert!(matches!(
        parse_declaration("<pcml>"),
        Err(MarkupError::Syntax { .. })
    ));
}

#[test]
fn schema_errors_pass_through() {
    let err = load_schema(r#"<pcml><program name="p" path="/P.PGM"><data name="x" type="char"/></program></pcml>"#)
        .expect_err("char without length");
    assert!(matches!(
        err,
        MarkupError::Schema(SchemaError::MissingAttribute { .. })
    ));
}
