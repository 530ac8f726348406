//! Source-file introspection: enumerate the target directory and locate the
//! requested struct declarations.

use std::fs;
use std::path::{Path, PathBuf};

use syn::{Field, Ident, Item, ItemStruct, LitStr};

use crate::error::Error;

/// All parsed source files of the target directory.
pub struct SourceSet {
    files: Vec<(PathBuf, syn::File)>,
}

impl SourceSet {
    /// Parses every `.rs` file directly inside `dir`, in file-name order,
    /// skipping `*_test.rs` files. Any parse failure is fatal.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".rs") || name.ends_with("_test.rs") {
                continue;
            }
            paths.push(path);
        }
        // Directory iteration order is platform-defined; sort for
        // deterministic lookups and output.
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let text = fs::read_to_string(&path)?;
            let ast = syn::parse_file(&text).map_err(|err| Error::SourceParse {
                path: path.clone(),
                message: err.to_string(),
            })?;
            files.push((path, ast));
        }

        if files.is_empty() {
            return Err(Error::NoSourceFiles {
                dir: dir.to_path_buf(),
            });
        }
        Ok(Self { files })
    }

    /// Finds the declaration of a requested type, which must be a struct.
    pub fn find_struct(&self, name: &str) -> Result<&ItemStruct, Error> {
        let mut found_other = false;
        for (_, file) in &self.files {
            for item in &file.items {
                match item {
                    Item::Struct(item) if item.ident == name => return Ok(item),
                    other => {
                        if item_ident(other).is_some_and(|ident| ident == name) {
                            found_other = true;
                        }
                    }
                }
            }
        }
        if found_other {
            Err(Error::NotAStruct {
                name: name.to_string(),
            })
        } else {
            Err(Error::TypeNotFound {
                name: name.to_string(),
            })
        }
    }
}

fn item_ident(item: &Item) -> Option<&Ident> {
    match item {
        Item::Enum(item) => Some(&item.ident),
        Item::Type(item) => Some(&item.ident),
        Item::Union(item) => Some(&item.ident),
        Item::Trait(item) => Some(&item.ident),
        _ => None,
    }
}

/// Extracts the tag string from a field's `#[proto("...")]` attribute.
///
/// Fields without the attribute are invisible to the generator.
pub fn proto_tag(field: &Field) -> Result<Option<String>, Error> {
    for attr in &field.attrs {
        if attr.path().is_ident("proto") {
            let lit: LitStr = attr.parse_args().map_err(|err| Error::BadAttribute {
                field: field
                    .ident
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                message: err.to_string(),
            })?;
            return Ok(Some(lit.value()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_proto_tag_extraction() {
        let item: ItemStruct = syn::parse_str(
            r#"
            pub struct Message {
                #[proto("1,int64")]
                pub id: i64,
                pub untagged: u32,
            }
            "#,
        )
        .unwrap();

        let syn::Fields::Named(fields) = &item.fields else {
            panic!("named fields")
        };
        let mut iter = fields.named.iter();
        assert_eq!(
            proto_tag(iter.next().unwrap()).unwrap().as_deref(),
            Some("1,int64")
        );
        assert_eq!(proto_tag(iter.next().unwrap()).unwrap(), None);
    }

    #[test]
    fn test_proto_tag_rejects_non_string() {
        let item: ItemStruct = syn::parse_str(
            r#"
            pub struct Message {
                #[proto(tag = 1)]
                pub id: i64,
            }
            "#,
        )
        .unwrap();
        let syn::Fields::Named(fields) = &item.fields else {
            panic!("named fields")
        };
        assert!(proto_tag(fields.named.iter().next().unwrap()).is_err());
    }
}
