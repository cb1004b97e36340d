//! Runtime descriptors for generated types.
//!
//! A [`CompositeType`] is the "class": an ordered property table, an optional
//! catch-all for undeclared keys, the initializer synthesized from both, and
//! the special-names set used at its data boundary. An [`EnumType`] is a closed
//! set of `{Id, Description}` members.
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::definition::Definition;
use crate::error::{Error, Result};
use crate::naming::{self, SpecialNames};
use crate::synthesizer::{CatchAll, Constructor, Initializer, Property};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeKind {
    Custom,
    /// `$ref` to another composite; inherits everything from `parent`.
    Passthrough { parent: String },
    /// `allOf` composition; parents are initialized in order.
    MultiInheritance { parents: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct CompositeType {
    pub name: String,
    pub kind: CompositeKind,
    pub description: Option<String>,
    pub properties: IndexMap<String, Property>,
    pub catch_all: Option<CatchAll>,
    pub initializer: Initializer,
    pub special_names: SpecialNames,
}

impl CompositeType {
    pub fn new(name: impl Into<String>, kind: CompositeKind) -> Self {
        let name = name.into();
        Self {
            initializer: Initializer::Direct(Constructor::synthesize(&name, std::iter::empty(), None)),
            name,
            kind,
            description: None,
            properties: IndexMap::new(),
            catch_all: None,
            special_names: SpecialNames::new(),
        }
    }

    /// Declare (or re-declare) a property and regenerate the initializer.
    pub fn add_property(&mut self, property: Property) {
        self.properties.insert(property.name.clone(), property);
        self.resynthesize();
    }

    pub fn set_catch_all(&mut self, catch_all: Option<CatchAll>) {
        self.catch_all = catch_all;
        self.resynthesize();
    }

    fn resynthesize(&mut self) {
        let constructor = Constructor::synthesize(&self.name, self.properties.values(), self.catch_all.as_ref());
        self.initializer = Initializer::Direct(constructor);
    }

    pub fn parents(&self) -> &[String] {
        match &self.kind {
            CompositeKind::Custom => &[],
            CompositeKind::Passthrough { parent } => std::slice::from_ref(parent),
            CompositeKind::MultiInheritance { parents } => parents,
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn signature(&self) -> String {
        self.initializer.signature().signature()
    }

    /// Document key → attribute name.
    pub fn internal_name(&self, external: &str) -> String {
        if let Some(property) = self.properties.values().find(|p| p.external_name == external) {
            return property.name.clone();
        }
        naming::pascal_to_snake(external, &self.special_names)
    }

    /// Attribute name → document key.
    pub fn external_name(&self, internal: &str) -> String {
        match self.properties.get(internal) {
            Some(property) => property.external_name.clone(),
            None => naming::snake_to_pascal(internal, &self.special_names),
        }
    }
}

// ------------------------------ Enums ------------------------------------ //

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub enum_name: String,
    /// SCREAMING_SNAKE form of the id.
    pub name: String,
    pub id: String,
    pub description: Option<String>,
    /// Set for plain literal enums (`"enum": ["a", "b"]`); such members
    /// encode back to the literal.
    pub literal: Option<Json>,
}

impl EnumMember {
    pub fn to_dict(&self) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        out.insert("Id".to_string(), Value::String(self.id.clone()));
        out.insert(
            "Description".to_string(),
            self.description.clone().map(Value::String).unwrap_or(Value::Null),
        );
        out
    }

    pub fn to_plain(&self) -> Value {
        match &self.literal {
            Some(literal) => Value::from(literal.clone()),
            None => Value::Map(self.to_dict()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub members: IndexMap<String, EnumMember>,
}

impl EnumType {
    pub fn from_definition(name: &str, definition: &Definition) -> Result<Self> {
        let values = definition
            .enum_values()
            .ok_or_else(|| Error::unidentified(&definition.to_value()).named(name))?;
        let scratch = SpecialNames::new();
        let mut members = IndexMap::new();
        for raw in values {
            let (id, description, literal) = match raw {
                Json::Object(entry) => {
                    let id = entry.get("Id").map(json_id).ok_or_else(|| Error::Unsupported {
                        context: name.to_string(),
                        detail: format!("enum member without Id: {raw}"),
                    })?;
                    let description = entry.get("Description").and_then(Json::as_str).map(str::to_string);
                    (id, description, None)
                }
                Json::Null => continue,
                other => (json_id(other), None, Some(other.clone())),
            };
            let member_name = naming::pascal_to_screaming_snake(&id, &scratch);
            members.insert(
                member_name.clone(),
                EnumMember { enum_name: name.to_string(), name: member_name, id, description, literal },
            );
        }
        Ok(Self { name: name.to_string(), members })
    }

    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.get(name)
    }

    pub fn by_id(&self, id: &str) -> Option<&EnumMember> {
        self.members.values().find(|member| member.id == id)
    }

    /// Resolve a raw value (`{"Id": ..}`, a bare id, or a member of this enum).
    pub fn lookup(&self, value: &Value) -> Option<&EnumMember> {
        match value {
            Value::Enum(member) if member.enum_name == self.name => self.member(&member.name),
            Value::Map(map) => map.get("Id").and_then(value_id).and_then(|id| self.by_id(&id)),
            other => value_id(other).and_then(|id| self.by_id(&id)),
        }
    }
}

fn json_id(raw: &Json) -> String {
    match raw {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
