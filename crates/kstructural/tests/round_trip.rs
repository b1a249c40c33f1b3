//! Exported documents read back as the documents they were exported from.

use kstructural::{Compiler, Syntax, export::OutputFormat};
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn quoted() -> impl Strategy<Value = String> {
    "[a-z ]{0,12}".prop_map(|text| format!("\"{text}\""))
}

fn words() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..4).prop_map(|words| words.join(" "))
}

fn type_attribute() -> impl Strategy<Value = String> {
    prop::option::of(word()).prop_map(|name| {
        name.map(|name| format!("[type {name}] "))
            .unwrap_or_default()
    })
}

fn inline() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => word(),
        2 => quoted(),
        1 => (type_attribute(), words()).prop_map(|(t, w)| format!("(term {t}{w})")),
        1 => (type_attribute(), quoted()).prop_map(|(t, q)| format!("(verbatim {t}{q})")),
        1 => prop::collection::vec(words(), 1..3).prop_map(|items| {
            let items: Vec<String> = items.iter().map(|w| format!("(item {w})")).collect();
            format!("(list-unordered {})", items.join(" "))
        }),
        1 => (word(), words()).prop_map(|(target, w)| {
            format!("(link-ext [target \"http://example.com/{target}\"] {w})")
        }),
    ]
}

fn inlines() -> impl Strategy<Value = String> {
    prop::collection::vec(inline(), 1..6).prop_map(|inlines| inlines.join(" "))
}

fn content() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => inlines().prop_map(|body| format!("(paragraph {body})")),
        1 => (words(), inlines()).prop_map(|(title, body)| {
            format!("(formal-item [title {title}] {body})")
        }),
    ]
}

fn contents() -> impl Strategy<Value = String> {
    prop::collection::vec(content(), 1..4).prop_map(|blocks| blocks.join("\n"))
}

fn section() -> impl Strategy<Value = String> {
    let subsection = (words(), contents())
        .prop_map(|(title, body)| format!("(subsection [title {title}] {body})"));
    let body = prop_oneof![
        2 => contents(),
        1 => prop::collection::vec(subsection, 1..3).prop_map(|s| s.join("\n")),
    ];
    (words(), type_attribute(), body)
        .prop_map(|(title, t, body)| format!("(section [title {title}] {t}{body})"))
}

fn document() -> impl Strategy<Value = String> {
    (words(), prop::collection::vec(section(), 1..4)).prop_map(|(title, sections)| {
        format!("(document [title {title}]\n{})", sections.join("\n"))
    })
}

fn export(compiler: &Compiler, source: &str, format: OutputFormat) -> String {
    let compiled = compiler.compile_str(source, Syntax::Canonical).unwrap();
    let mut files = compiler.export(&compiled, format).unwrap();
    assert_eq!(files.len(), 1);
    files.remove(0).content
}

proptest! {
    #[test]
    fn canonical_output_reads_back(source in document()) {
        let compiler = Compiler::default();
        let parsed = compiler.parse_str(&source, Syntax::Canonical).unwrap();

        let output = export(&compiler, &source, OutputFormat::Canonical);
        let reparsed = compiler.parse_str(&output, Syntax::Canonical);
        prop_assert!(reparsed.is_ok(), "failed to read back:\n{output}");
        prop_assert_eq!(reparsed.unwrap(), parsed);
    }

    #[test]
    fn imperative_output_reads_back(source in document()) {
        let compiler = Compiler::default();
        let parsed = compiler.parse_str(&source, Syntax::Canonical).unwrap();

        let output = export(&compiler, &source, OutputFormat::Imperative);
        let reparsed = compiler.parse_str(&output, Syntax::Imperative);
        prop_assert!(reparsed.is_ok(), "failed to read back:\n{output}");
        prop_assert_eq!(reparsed.unwrap(), parsed);
    }

    #[test]
    fn xml_output_is_well_formed(source in document()) {
        let compiler = Compiler::default();
        let output = export(&compiler, &source, OutputFormat::Xml);
        let reparsed = compiler.compile_str(&output, Syntax::Xml);
        prop_assert!(reparsed.is_ok(), "failed to read back:\n{output}");
    }
}
