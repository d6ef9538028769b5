#![allow(clippy::panic_in_result_fn)]
#![allow(clippy::panic)]

use xmlplain::{
    convert, from_xml_str, read_events_into, BuildOptions, ConvertOptions, ErrorKind, Event,
    Input, ReaderConfig,
};

#[test]
fn test_external_system_entity_refused() {
    let xml = r#"<?xml version="1.0"?>
<!DOCTYPE doc [
  <!ENTITY xxe SYSTEM "file:///etc/passwd">
]>
<doc>&xxe;</doc>"#;

    let result = from_xml_str(xml, BuildOptions::default());
    let Err(err) = result else {
        panic!("external entity must be refused");
    };
    assert!(err.is_security());
    match err.kind() {
        ErrorKind::ExternalEntity {
            name,
            public_id,
            system_id,
        } => {
            assert_eq!(name, "xxe");
            assert_eq!(public_id, &None);
            assert_eq!(system_id.as_deref(), Some("file:///etc/passwd"));
        }
        other => panic!("unexpected error kind: {other:?}"),
    }
    assert!(err.to_string().contains("file:///etc/passwd"));
}

#[test]
fn test_external_public_entity_in_attribute_refused() {
    let xml = r#"<!DOCTYPE doc [<!ENTITY ext PUBLIC "-//Corp//Ext" "http://example.com/ext.xml">]>
<doc attr="&ext;"/>"#;

    let Err(err) = from_xml_str(xml, BuildOptions::default()) else {
        panic!("external entity must be refused");
    };
    let ErrorKind::ExternalEntity {
        public_id,
        system_id,
        ..
    } = err.kind()
    else {
        panic!("unexpected error kind: {:?}", err.kind());
    };
    assert_eq!(public_id.as_deref(), Some("-//Corp//Ext"));
    assert_eq!(system_id.as_deref(), Some("http://example.com/ext.xml"));
}

#[test]
fn test_declared_but_unused_entity_is_harmless() -> Result<(), Box<dyn std::error::Error>> {
    let xml = r#"<!DOCTYPE doc [<!ENTITY xxe SYSTEM "file:///etc/passwd">]><doc>safe</doc>"#;
    let root = from_xml_str(xml, BuildOptions::default())?;
    assert_eq!(root, xmlplain::Value::element("doc", "safe"));
    Ok(())
}

#[test]
fn test_internal_entities_not_expanded() {
    let xml = r#"<!DOCTYPE doc [<!ENTITY a "aaaaaaaaaa"><!ENTITY b "&a;&a;&a;&a;">]><doc>&b;</doc>"#;
    let Err(err) = from_xml_str(xml, BuildOptions::default()) else {
        panic!("entity expansion must not happen");
    };
    assert_eq!(err.kind(), &ErrorKind::Syntax);
    assert!(!err.is_security());
}

#[test]
fn test_undefined_entity_is_syntax_error() {
    let Err(err) = from_xml_str("<doc>&nope;</doc>", BuildOptions::default()) else {
        panic!("undefined entity must fail");
    };
    assert_eq!(err.kind(), &ErrorKind::Syntax);
}

#[test]
fn test_refused_document_produces_no_events() {
    let xml = r#"<!DOCTYPE d [<!ENTITY x SYSTEM "http://example.com/">]><d><a/>&x;</d>"#;
    let mut events: Vec<Event> = Vec::new();
    let result = read_events_into(&Input::from_str(xml), &ReaderConfig::default(), &mut events);
    assert!(result.is_err());
    assert!(events.is_empty());
}

#[test]
fn test_conversion_surfaces_security_error() {
    let xml = r#"<!DOCTYPE d [<!ENTITY x SYSTEM "file:///dev/random">]><d>&x;</d>"#;
    let result = convert(xml, &ConvertOptions::default());
    assert!(result.is_err_and(|err| err.is_security()));
}
