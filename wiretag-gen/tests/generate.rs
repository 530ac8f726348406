//! Integration tests for wiretag-gen.

use std::fs;

use tempfile::tempdir;
use wiretag_gen::Config;

const TYPES_RS: &str = r#"
use wiretag::ProtoTagged;

#[derive(Debug, Default, Clone, PartialEq, ProtoTagged)]
pub struct Message {
    #[proto("1")]
    pub id: i64,
    #[proto("2")]
    pub text: String,
    #[proto("3")]
    pub sender: Option<User>,
    #[proto("4")]
    pub timestamp: i64,
}

#[derive(Debug, Default, Clone, PartialEq, ProtoTagged)]
pub struct User {
    #[proto("1")]
    pub id: i64,
    #[proto("2")]
    pub name: String,
}
"#;

#[test]
fn test_generate_flat_types() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("types.rs"), TYPES_RS).unwrap();

    let path = Config::new()
        .type_name("Message")
        .type_name("User")
        .generate(dir.path())
        .expect("generation failed");

    // Multiple requested types name the output after the directory.
    let stem = dir
        .path()
        .canonicalize()
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        format!("{stem}_proto.rs")
    );

    let content = fs::read_to_string(&path).expect("failed to read output");

    assert!(content.starts_with("// Code generated by wiretag-gen. DO NOT EDIT."));
    assert!(content.contains("use super::*;"));
    assert!(content.contains("static MARSHALER_POOL"));
    assert!(content.contains("impl Message"), "{content}");
    assert!(content.contains("impl User"), "{content}");
    assert!(content.contains("pub fn marshal_protobuf"), "{content}");
    assert!(content.contains("pub fn unmarshal_protobuf"), "{content}");
    // Requested order is preserved.
    assert!(content.find("impl Message").unwrap() < content.find("impl User").unwrap());
}

#[test]
fn test_single_type_output_name() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("types.rs"), TYPES_RS).unwrap();

    let path = Config::new()
        .type_name("User")
        .generate(dir.path())
        .expect("generation failed");

    assert_eq!(path.file_name().unwrap().to_string_lossy(), "user_proto.rs");
}

#[test]
fn test_explicit_output_override() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("types.rs"), TYPES_RS).unwrap();

    let output = dir.path().join("wire.rs");
    let path = Config::new()
        .type_name("User")
        .output(&output)
        .generate(dir.path())
        .expect("generation failed");

    assert_eq!(path, output);
    assert!(output.exists());
}

#[test]
fn test_deterministic_output() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("types.rs"), TYPES_RS).unwrap();

    let first = fs::read(
        Config::new()
            .type_name("Message")
            .type_name("User")
            .generate(dir.path())
            .unwrap(),
    )
    .unwrap();
    let second = fs::read(
        Config::new()
            .type_name("Message")
            .type_name("User")
            .generate(dir.path())
            .unwrap(),
    )
    .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_no_header_mode() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("types.rs"), TYPES_RS).unwrap();

    let path = Config::new()
        .type_name("User")
        .skip_header(true)
        .generate(dir.path())
        .expect("generation failed");
    let content = fs::read_to_string(path).unwrap();

    assert!(!content.contains("Code generated"));
    assert!(!content.contains("static MARSHALER_POOL"));
    assert!(!content.contains("use super::*;"));
    assert!(content.contains("impl User"));
}

#[test]
fn test_type_not_found() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("types.rs"), TYPES_RS).unwrap();

    let err = Config::new()
        .type_name("Missing")
        .generate(dir.path())
        .unwrap_err();
    assert!(err.to_string().contains("type Missing not found"), "{err}");
}

#[test]
fn test_requested_enum_is_not_a_struct() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(
        dir.path().join("types.rs"),
        "pub enum Kind { A, B }\n",
    )
    .unwrap();

    let err = Config::new()
        .type_name("Kind")
        .generate(dir.path())
        .unwrap_err();
    assert!(err.to_string().contains("is not a struct"), "{err}");
}

#[test]
fn test_test_files_are_skipped() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("types.rs"), TYPES_RS).unwrap();
    // A same-named struct in a test file must not shadow the real one, and a
    // broken test file must not fail the run.
    fs::write(dir.path().join("types_test.rs"), "this is not rust").unwrap();

    Config::new()
        .type_name("User")
        .generate(dir.path())
        .expect("generation failed");
}

#[test]
fn test_source_parse_failure_is_fatal() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("types.rs"), TYPES_RS).unwrap();
    fs::write(dir.path().join("broken.rs"), "pub struct {").unwrap();

    let err = Config::new()
        .type_name("User")
        .generate(dir.path())
        .unwrap_err();
    assert!(err.to_string().contains("failed to parse"), "{err}");
}

#[test]
fn test_oneof_and_map_generation() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(
        dir.path().join("chat.rs"),
        r#"
pub struct Chat {
    #[proto("1")]
    pub id: i64,
    #[proto("oneof,TextMessage:2,ImageMessage:3")]
    pub content: Option<Content>,
    #[proto("4")]
    pub labels: std::collections::BTreeMap<String, i64>,
}

pub struct TextMessage {
    #[proto("1")]
    pub text: String,
}

pub struct ImageMessage {
    #[proto("1")]
    pub url: String,
}
"#,
    )
    .unwrap();

    let path = Config::new()
        .type_name("Chat")
        .type_name("TextMessage")
        .type_name("ImageMessage")
        .generate(dir.path())
        .expect("generation failed");
    let content = fs::read_to_string(path).unwrap();

    assert!(content.contains("pub enum Content"), "{content}");
    assert!(content.contains("TextMessage(TextMessage)"), "{content}");
    // Oneof variants encode under their own field numbers.
    assert!(content.contains("append_message(2u32"), "{content}");
    assert!(content.contains("append_message(3u32"), "{content}");
    // Map entries use key = 1, value = 2.
    assert!(content.contains("append_message(4u32"), "{content}");
    assert!(content.contains("(1u32, key)"), "{content}");
    assert!(content.contains("insert(key, value)"), "{content}");
}

#[test]
fn test_duplicate_number_diagnostic() {
    let dir = tempdir().expect("failed to create temp dir");
    fs::write(
        dir.path().join("chat.rs"),
        r#"
pub struct Chat {
    #[proto("2")]
    pub id: i64,
    #[proto("oneof,TextMessage:2")]
    pub content: Option<Content>,
}
"#,
    )
    .unwrap();

    let err = Config::new()
        .type_name("Chat")
        .generate(dir.path())
        .unwrap_err();
    assert!(err.to_string().contains("duplicate field number"), "{err}");
}
