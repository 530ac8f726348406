//! `wiretag-gen` generates protobuf encode/decode impls for Rust structs
//! whose fields carry `#[proto("...")]` tags.
//!
//! # Example
//!
//! ```rust,no_run
//! fn main() -> Result<(), wiretag_gen::Error> {
//!     let path = wiretag_gen::Config::new()
//!         .type_name("Message")
//!         .type_name("User")
//!         .generate("src/")?;
//!     println!("generated {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! # Tag format
//!
//! `#[proto("fieldNum[,type][,options...]")]`
//!
//! The type is optional and inferred from the Rust type when omitted:
//!
//! ```text
//! String  -> string      i32 -> int32      f32 -> float
//! Vec<u8> -> bytes       i64 -> int64      f64 -> double
//! bool    -> bool        u32 -> uint32     OtherType    -> message
//! isize   -> int64       u64 -> uint64     BTreeMap<K,V> -> map
//! ```
//!
//! Options: `repeated`, `optional`, `enum`, `custom`. Non-default wire types
//! (`sint32`, `fixed64`, ...) are specified explicitly.
//!
//! Oneof fields carry their variants in the tag and declare an `Option` of
//! the emitted sum type:
//!
//! ```ignore
//! #[proto("oneof,TextMessage:1,ImageMessage:2")]
//! pub content: Option<Content>,
//! ```

mod classify;
mod descriptor;
mod emit;
mod error;
mod introspect;
mod parse;
mod tables;

pub use error::Error;

use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;

/// Configuration for one generator run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    types: Vec<String>,
    output: Option<PathBuf>,
    skip_header: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record type to process. At least one is required.
    pub fn type_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.types.push(name.into());
        self
    }

    /// Explicit output file path, replacing the default naming.
    pub fn output(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    /// Suppresses the header section (marshaler pool and oneof sum types);
    /// used when several invocations append into one output file.
    pub fn skip_header(&mut self, skip: bool) -> &mut Self {
        self.skip_header = skip;
        self
    }

    /// Runs the pipeline: enumerate sources, locate the requested types,
    /// parse and validate their metadata, emit, format, and write.
    ///
    /// Returns the path of the written file.
    pub fn generate(&self, dir: impl AsRef<Path>) -> Result<PathBuf, Error> {
        let dir = dir.as_ref();
        if self.types.is_empty() {
            return Err(Error::NoTypesRequested);
        }

        let sources = introspect::SourceSet::load(dir)?;

        let mut infos = Vec::with_capacity(self.types.len());
        for name in &self.types {
            let item = sources.find_struct(name)?;
            tracing::debug!(%name, "building descriptor");
            infos.push(parse::parse_struct(item)?);
        }

        let tokens = emit::generate(&infos, self.skip_header);
        let mut text = format_tokens(tokens)?;
        if !self.skip_header {
            text = format!("// Code generated by wiretag-gen. DO NOT EDIT.\n\n{text}");
        }

        let path = self.output_path(dir);
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Default output naming: one type yields `<lowercased-type>_proto.rs`,
    /// several yield `<dir-stem>_proto.rs`.
    fn output_path(&self, dir: &Path) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }
        if let [only] = &self.types[..] {
            return dir.join(format!("{}_proto.rs", only.to_lowercase()));
        }
        let stem = dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "types".to_string());
        dir.join(format!("{stem}_proto.rs"))
    }
}

/// Pretty-prints the emitted tokens. If they fail to parse, the raw token
/// text is dumped to a temp file so the defect can be inspected.
fn format_tokens(tokens: TokenStream) -> Result<String, Error> {
    let file = syn::parse2(tokens.clone()).map_err(|err| {
        let debug_path = std::env::temp_dir().join("wiretag_gen_debug.rs");
        let _ = fs::write(&debug_path, tokens.to_string());
        Error::Format {
            message: err.to_string(),
            debug_path,
        }
    })?;
    Ok(prettyplease::unparse(&file))
}
