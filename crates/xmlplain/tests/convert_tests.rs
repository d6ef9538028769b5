use xmlplain::{
    convert, convert_to_writer, events_from_yaml, ConvertOptions, ErrorKind, Event, Filter,
    Input, InputFormat, OutputFormat,
};

const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

fn options(input: InputFormat, output: OutputFormat, pretty: bool) -> ConvertOptions {
    ConvertOptions {
        input,
        output,
        pretty,
        ..ConvertOptions::default()
    }
}

#[test]
fn test_xml_yaml_xml_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let xml = "<cfg version=\"2\"><name>demo</name><port>8080</port><opt/></cfg>";
    let yaml = convert(xml, &options(InputFormat::Xml, OutputFormat::Yaml, false))?;
    let back = convert(&yaml, &options(InputFormat::Yaml, OutputFormat::Xml, false))?;
    assert_eq!(
        back,
        format!("{DECL}<cfg version=\"2\"><name>demo</name><port>8080</port><opt></opt></cfg>")
    );
    Ok(())
}

#[test]
fn test_hand_edited_yaml() -> Result<(), Box<dyn std::error::Error>> {
    let yaml = "server:\n  '@enabled': true\n  port: 8080\n  motd: |\n    hello\n    world\n";
    let xml = convert(yaml, &options(InputFormat::Yaml, OutputFormat::Xml, false))?;
    assert_eq!(
        xml,
        format!("{DECL}<server enabled=\"true\"><port>8080</port><motd>hello\nworld\n</motd></server>")
    );
    Ok(())
}

#[test]
fn test_structure_errors_from_yaml() {
    for yaml in ["- a\n- b\n", "a: 1\nb: 2\n", "'@a': x\n", "plain\n", "a:\n  '@x': [1, 2]\n"] {
        let result = convert(yaml, &options(InputFormat::Yaml, OutputFormat::Xml, false));
        let kind = result.err().map(|err| err.kind().clone());
        assert_eq!(kind, Some(ErrorKind::Structure), "{yaml:?}");
    }
}

#[test]
fn test_event_dump_from_tree_and_from_events() -> Result<(), Box<dyn std::error::Error>> {
    let xml = "<a>\n  <b>1</b>\n</a>";
    let from_tree = convert(xml, &options(InputFormat::Xml, OutputFormat::Events, true))?;
    let from_events = convert(
        xml,
        &ConvertOptions {
            filter: Filter::Event,
            ..options(InputFormat::Xml, OutputFormat::Events, false)
        },
    )?;

    // the tree was stripped, the raw events were not
    let tree_events = events_from_yaml(&from_tree)?;
    let raw_events = events_from_yaml(&from_events)?;
    assert!(!tree_events.contains(&Event::text("\n  ")));
    assert!(raw_events.contains(&Event::text("\n  ")));
    assert_eq!(tree_events.len(), 7);
    Ok(())
}

#[test]
fn test_convert_to_writer_streams_into_buffer() -> Result<(), Box<dyn std::error::Error>> {
    let input = Input::from_bytes(b"<a>x</a>").with_filename("a.xml");
    let out = convert_to_writer(
        &input,
        &options(InputFormat::Xml, OutputFormat::Yaml, false),
        Vec::<u8>::new(),
    )?;
    assert_eq!(out, b"a: x\n");
    Ok(())
}

#[test]
fn test_invalid_utf8_input() {
    let input = Input::from_bytes(b"<a>\xc3\x28</a>");
    let result = convert_to_writer(&input, &ConvertOptions::default(), Vec::<u8>::new());
    assert!(result.is_err_and(|err| err.kind() == &ErrorKind::Syntax));
}

#[test]
fn test_malformed_xml_fails_whole_conversion() {
    let result = convert("<a><b></a>", &options(InputFormat::Xml, OutputFormat::Yaml, false));
    assert!(result.is_err_and(|err| err.kind() == &ErrorKind::Syntax));
}
