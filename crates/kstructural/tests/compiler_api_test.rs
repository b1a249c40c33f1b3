//! Integration tests for the Compiler API

use std::{fs, path::Path};

use kstructural::{
    Compiler, KStructuralError, Syntax,
    block::{DocumentContent, SectionContent},
    config::{AppConfig, ExportConfig, ParseConfig},
    export::OutputFormat,
    number::Number,
};
use tempfile::TempDir;

const EXAMPLE: &str = r#"(document [title "T"] (section [title "S"] (paragraph "Hello")))"#;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn keep_imports(format: OutputFormat) -> Compiler {
    Compiler::new(AppConfig::new(
        ExportConfig::new(format, 2, 80, true),
        ParseConfig::default(),
    ))
}

#[test]
fn test_end_to_end_example() {
    let compiler = Compiler::default();
    let compiled = compiler
        .compile_str(EXAMPLE, Syntax::Canonical)
        .expect("Failed to compile");

    let DocumentContent::Sections(sections) = &compiled.evaluated.document.content else {
        panic!("expected sections");
    };
    let section = sections[0].meta.data();
    assert_eq!(section.number(), Some(Number::Section(1)));

    let files = compiler
        .export(&compiled, OutputFormat::Canonical)
        .expect("Failed to export");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, format!("{EXAMPLE}\n"));
}

#[test]
fn test_three_sections_are_numbered_in_order() {
    let compiler = Compiler::default();
    let compiled = compiler
        .compile_str(
            "(document [title T]
               (section [title A] (paragraph a) (formal-item [title F] x))
               (section [title B] (formal-item [title G] y))
               (section [title C] (paragraph c)))",
            Syntax::Canonical,
        )
        .unwrap();

    let DocumentContent::Sections(sections) = &compiled.evaluated.document.content else {
        panic!("expected sections");
    };
    let numbers: Vec<String> = sections
        .iter()
        .map(|section| section.meta.data().number().unwrap().to_string())
        .collect();
    assert_eq!(numbers, ["1", "2", "3"]);

    let SectionContent::Content(second) = &sections[1].content else {
        panic!("expected content");
    };
    assert_eq!(
        second[0].meta().data().number().unwrap().to_string(),
        "2.1"
    );
}

#[test]
fn test_evaluation_errors_surface_as_parse_errors() {
    let err = Compiler::default()
        .compile_str(
            "(document [title T] (section [title S] (paragraph (link [target missing] x))))",
            Syntax::Canonical,
        )
        .unwrap_err();
    let KStructuralError::Parse(err) = err else {
        panic!("expected diagnostics, got {err}");
    };
    assert_eq!(
        err.diagnostics()[0].message(),
        "Reference to nonexistent ID."
    );
}

#[test]
fn test_convert_writes_into_output_directory() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "main.sd", EXAMPLE);

    let written = Compiler::default()
        .convert(&input.path().join("main.sd"), output.path(), OutputFormat::Xml)
        .unwrap();

    assert_eq!(written, [output.path().join("main.xml")]);
    let xml = fs::read_to_string(&written[0]).unwrap();
    assert!(xml.contains("<s:paragraph>Hello</s:paragraph>"));
}

#[test]
fn test_convert_keeps_imports_as_files() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(
        input.path(),
        "main.sd",
        r#"(document [title Main] (import "parts/one.xml"))"#,
    );
    write(
        input.path(),
        "parts/one.xml",
        r#"<s:section xmlns:s="http://schemas.io7m.com/structural/3.0.0" s:title="One">
             <s:paragraph><s:verbatim>code</s:verbatim></s:paragraph>
           </s:section>"#,
    );

    let written = keep_imports(OutputFormat::Canonical)
        .convert(&input.path().join("main.sd"), output.path(), OutputFormat::Canonical)
        .unwrap();

    assert_eq!(
        written,
        [
            output.path().join("main.sd"),
            output.path().join("parts/one.sd")
        ]
    );
    let main = fs::read_to_string(&written[0]).unwrap();
    assert_eq!(main, "(document [title Main] (import \"parts/one.sd\"))\n");
    let part = fs::read_to_string(&written[1]).unwrap();
    assert!(part.starts_with("(section [title One]"));
}

#[test]
fn test_convert_keeps_includes_as_files() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(
        input.path(),
        "main.sd",
        r#"(document [title Main] (section [title S] (paragraph (verbatim (include "code.txt")))))"#,
    );
    write(input.path(), "code.txt", "fn main() {}\n");

    let written = keep_imports(OutputFormat::Imperative)
        .convert(&input.path().join("main.sd"), output.path(), OutputFormat::Imperative)
        .unwrap();

    assert_eq!(written.len(), 2);
    let main = fs::read_to_string(output.path().join("main.sdi")).unwrap();
    assert!(main.contains("(verbatim (include \"code.txt\"))"));
    let code = fs::read_to_string(output.path().join("code.txt")).unwrap();
    assert_eq!(code, "fn main() {}\n");
}

#[test]
fn test_xml_always_inlines_imports() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(
        input.path(),
        "main.sd",
        r#"(document [title Main] (import "one.sd"))"#,
    );
    write(input.path(), "one.sd", "(section [title One] (paragraph x))");

    let written = keep_imports(OutputFormat::Xml)
        .convert(&input.path().join("main.sd"), output.path(), OutputFormat::Xml)
        .unwrap();

    assert_eq!(written, [output.path().join("main.xml")]);
    let xml = fs::read_to_string(&written[0]).unwrap();
    assert!(xml.contains("s:title=\"One\""));
}

#[test]
fn test_input_outside_configured_base_is_refused() {
    let input = TempDir::new().unwrap();
    let base = TempDir::new().unwrap();
    write(input.path(), "main.sd", EXAMPLE);

    let compiler = Compiler::new(AppConfig::new(
        ExportConfig::default(),
        ParseConfig::new(Some(base.path().to_path_buf())),
    ));
    let err = compiler.compile(&input.path().join("main.sd")).unwrap_err();
    let KStructuralError::Parse(err) = err else {
        panic!("expected diagnostics, got {err}");
    };
    assert_eq!(err.diagnostics()[0].code(), Some(kstructural::ErrorCode::E106));
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Compiler::default()
        .compile(&dir.path().join("absent.sd"))
        .unwrap_err();
    assert!(matches!(err, KStructuralError::Io { .. }));
}
