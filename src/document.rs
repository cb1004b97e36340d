//! Schema documents.
//!
//! Definitions are collected from `components.schemas`, `$defs` and
//! `definitions`, in that order. A titled top-level schema becomes one more
//! definition under its title and is remembered as the document root.
use std::fs;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::compiler;
use crate::definition::Definition;
use crate::error::Result;
use crate::path_de;
use crate::registry::TypeRegistry;

/// Top-level keywords that make the document itself a type definition.
const ROOT_KEYWORDS: [&str; 8] = ["type", "properties", "allOf", "oneOf", "anyOf", "enum", "items", "$ref"];

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    components: Option<RawComponents>,
    #[serde(rename = "$defs", default)]
    defs: IndexMap<String, Value>,
    #[serde(default)]
    definitions: IndexMap<String, Value>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawComponents {
    #[serde(default)]
    schemas: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaDocument {
    pub title: Option<String>,
    pub definitions: IndexMap<String, Definition>,
    /// Name of the definition built from the top-level schema.
    pub root: Option<String>,
}

impl SchemaDocument {
    pub fn from_json_str(source: &str) -> Result<Self> {
        Self::from_raw(path_de::from_str_with_path(source)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_raw(path_de::from_slice_with_path(bytes)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Self::from_raw(path_de::from_value_with_path(value)?)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_slice(&bytes)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_slice(&fs::read(path)?)
    }

    pub fn compile(&self) -> Result<TypeRegistry> {
        compiler::compile(self)
    }

    fn from_raw(raw: RawDocument) -> Result<Self> {
        let RawDocument { title, components, defs, definitions, rest } = raw;
        let schemas = components.map(|c| c.schemas).unwrap_or_default();

        let mut collected = IndexMap::new();
        for (name, body) in schemas.into_iter().chain(defs).chain(definitions) {
            let definition = Definition::from_value(body).map_err(|err| err.named(&name))?;
            collected.insert(name, definition);
        }

        let mut root = None;
        if let Some(title) = &title {
            if rest.keys().any(|key| ROOT_KEYWORDS.contains(&key.as_str())) {
                let body: Map<String, Value> = rest
                    .into_iter()
                    .filter(|(key, _)| !key.starts_with('$') || key == "$ref")
                    .collect();
                collected.insert(title.clone(), Definition::from_map(body));
                root = Some(title.clone());
            }
        }

        Ok(Self { title, definitions: collected, root })
    }
}
