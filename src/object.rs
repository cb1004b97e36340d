//! Generated instances and the protocol they share: construction from keyword
//! arguments or plain data, conversion back to plain data and JSON, and a
//! bounded string form.
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::composite::CompositeType;
use crate::error::{Error, Result};
use crate::registry::TypeRegistry;
use crate::synthesizer::Arguments;
use crate::value::Value;

/// Longer string forms collapse to `Name(...)`.
pub const REPR_LIMIT: usize = 200;

// ————————————————————————————————————————————————————————————————————————————
// CLASS HANDLE
// ————————————————————————————————————————————————————————————————————————————

/// A generated type, bound to the registry it was compiled into.
#[derive(Clone)]
pub struct Class<'r> {
    registry: &'r TypeRegistry,
    ty: Arc<CompositeType>,
}

impl<'r> Class<'r> {
    pub(crate) fn new(registry: &'r TypeRegistry, ty: Arc<CompositeType>) -> Self {
        Self { registry, ty }
    }

    pub fn name(&self) -> &str {
        &self.ty.name
    }

    pub fn composite(&self) -> &CompositeType {
        &self.ty
    }

    pub fn signature(&self) -> String {
        self.ty.signature()
    }

    /// Call the initializer with attribute-named arguments.
    pub fn construct(&self, args: Arguments) -> Result<SchemaObject> {
        let mut fields = IndexMap::new();
        self.ty
            .initializer
            .initialize(self.registry, args, &mut fields, &self.ty.special_names)
            .map_err(|err| err.within_type(&self.ty.name))?;
        Ok(SchemaObject { ty: Arc::clone(&self.ty), fields })
    }

    /// Build from plain data keyed by document names.
    pub fn from_dict(&self, raw: impl Into<Value>) -> Result<SchemaObject> {
        match raw.into() {
            Value::Map(map) => self.from_map(map),
            Value::Object(obj) if self.registry.is_subtype(obj.type_name(), self.name()) => Ok(obj),
            Value::Object(obj) => self.from_map(obj.to_dict()),
            other => Err(Error::type_error(format!(
                "{}.from_dict expects an object, got {}",
                self.name(),
                other.type_label()
            ))
            .within_type(self.name())),
        }
    }

    pub fn from_map(&self, raw: IndexMap<String, Value>) -> Result<SchemaObject> {
        let keyword = raw
            .into_iter()
            .map(|(key, value)| (self.ty.internal_name(&key), value))
            .collect();
        self.construct(Arguments::from_keywords(keyword))
    }

    pub fn from_json_str(&self, source: &str) -> Result<SchemaObject> {
        let raw: serde_json::Value = serde_json::from_str(source)?;
        self.from_dict(raw)
    }

    pub fn from_json_reader<R: Read>(&self, reader: R) -> Result<SchemaObject> {
        let raw: serde_json::Value = serde_json::from_reader(reader)?;
        self.from_dict(raw)
    }

    pub fn from_json_path(&self, path: impl AsRef<Path>) -> Result<SchemaObject> {
        let file = File::open(path)?;
        self.from_json_reader(BufReader::new(file))
    }
}

impl fmt::Debug for Class<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Class").field(&self.ty.name).finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INSTANCES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone)]
pub struct SchemaObject {
    ty: Arc<CompositeType>,
    fields: IndexMap<String, Value>,
}

impl SchemaObject {
    pub fn type_name(&self) -> &str {
        &self.ty.name
    }

    pub fn composite(&self) -> &CompositeType {
        &self.ty
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Plain attribute assignment; no casting.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Attributes in assignment order.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Plain data keyed by document names, nested values converted.
    pub fn to_dict(&self) -> IndexMap<String, Value> {
        self.fields
            .iter()
            .map(|(name, value)| (self.ty.external_name(name), value.to_plain()))
            .collect()
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for (name, value) in &self.fields {
            let key = self.ty.external_name(name);
            let encoded = value.to_json().map_err(|err| err.at_field(key.as_str()))?;
            out.insert(key, encoded);
        }
        Ok(serde_json::Value::Object(out))
    }

    /// Two-space indented JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json_value()?)?)
    }

    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<()> {
        let encoded = self.to_json_value()?;
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut writer, &encoded)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_json_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let encoded = self.to_json_value()?;
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &encoded)?;
        writer.flush()?;
        Ok(())
    }
}

impl PartialEq for SchemaObject {
    fn eq(&self, other: &Self) -> bool {
        self.ty.name == other.ty.name && self.fields == other.fields
    }
}

impl fmt::Debug for SchemaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(&self.ty.name);
        for (name, value) in &self.fields {
            out.field(name, value);
        }
        out.finish()
    }
}

impl fmt::Display for SchemaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body: Vec<String> = self.fields.iter().map(|(name, value)| format!("{name}={value}")).collect();
        let full = format!("{}({})", self.ty.name, body.join(","));
        if full.chars().count() > REPR_LIMIT {
            write!(f, "{}(...)", self.ty.name)
        } else {
            f.write_str(&full)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caster::Caster;
    use crate::classify::Category;
    use crate::composite::CompositeKind;
    use crate::definition::Definition;
    use crate::handle::{NativeType, TypeHandle};
    use crate::synthesizer::{CatchAll, Property, PropertyDefault};
    use serde_json::json;

    fn registry() -> TypeRegistry {
        let mut note = CompositeType::new("Note", CompositeKind::Custom);
        note.add_property(Property {
            name: "text".into(),
            external_name: "Text".into(),
            caster: Caster::Native(NativeType::String),
            constraint: TypeHandle::Native(NativeType::String),
            default: PropertyDefault::Required,
        });
        note.add_property(Property {
            name: "rank".into(),
            external_name: "Rank".into(),
            caster: Caster::Native(NativeType::Integer),
            constraint: TypeHandle::optional(TypeHandle::Native(NativeType::Integer)),
            default: PropertyDefault::Value(Value::Null),
        });
        note.set_catch_all(Some(CatchAll {
            caster: Caster::Native(NativeType::String),
            constraint: TypeHandle::Native(NativeType::String),
        }));
        let mut registry = TypeRegistry::new();
        registry.insert_composite(note);
        registry.register(
            "Note",
            TypeHandle::Composite("Note".into()),
            Caster::Composite("Note".into()),
            Definition::default(),
            Category::Custom,
        );
        registry
    }

    #[test]
    fn from_dict_translates_and_coerces() {
        let registry = registry();
        let class = registry.class("Note").unwrap();
        let note = class.from_dict(json!({"Text": "hello", "Rank": "3", "Colour": 5})).unwrap();
        assert_eq!(note.get("text"), Some(&Value::from("hello")));
        assert_eq!(note.get("rank"), Some(&Value::Integer(3)));
        assert_eq!(note.get("colour"), Some(&Value::from("5")));
        assert_eq!(
            Value::Map(note.to_dict()).to_json().unwrap(),
            json!({"Text": "hello", "Rank": 3, "Colour": "5"})
        );
    }

    #[test]
    fn type_errors_name_field_and_type() {
        let registry = registry();
        let class = registry.class("Note").unwrap();
        let err = class.from_dict(json!({"Text": "x", "Rank": "three"})).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("$.Rank"), "{rendered}");
        assert!(rendered.contains("argument 'rank' must be of type Optional[integer]"), "{rendered}");
        assert!(rendered.contains("while constructing Note"), "{rendered}");
        assert!(class.from_dict(json!([1, 2])).is_err());
    }

    #[test]
    fn display_collapses_long_forms() {
        let registry = registry();
        let class = registry.class("Note").unwrap();
        let short = class.from_dict(json!({"Text": "hi"})).unwrap();
        assert_eq!(short.to_string(), r#"Note(text="hi",rank=null)"#);
        let long = class.from_dict(json!({"Text": "x".repeat(REPR_LIMIT)})).unwrap();
        assert_eq!(long.to_string(), "Note(...)");
    }

    #[test]
    fn json_output_is_indented_and_ordered() {
        let registry = registry();
        let note = registry.class("Note").unwrap().from_dict(json!({"Rank": 1, "Text": "t"})).unwrap();
        assert_eq!(note.to_json_string().unwrap(), "{\n  \"Text\": \"t\",\n  \"Rank\": 1\n}");
    }

    #[test]
    fn set_is_plain_assignment() {
        let registry = registry();
        let mut note = registry.class("Note").unwrap().from_dict(json!({"Text": "t"})).unwrap();
        note.set("rank", Value::Number(f64::INFINITY));
        let err = note.to_json_string().unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
        assert_eq!(err.path().unwrap().to_string(), "$.Rank");
    }
}
