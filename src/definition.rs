//! Raw schema nodes.
//!
//! A [`Definition`] is an untouched JSON object from the schema document with
//! typed accessors for the keywords the compiler understands. Definitions are
//! never mutated once read; the compiler only adds new ones.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Native JSON-Schema `type` values that classify directly.
pub const NATIVE_TYPE_NAMES: [&str; 6] = ["string", "integer", "number", "boolean", "array", "object"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definition(pub Map<String, Value>);

/// `discriminator` keyword of a keyed `oneOf`/`anyOf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(default)]
    pub mapping: Option<IndexMap<String, String>>,
}

impl Definition {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::unidentified(&other)),
        }
    }
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn reference(&self) -> Option<&str> {
        self.0.get("$ref").and_then(Value::as_str)
    }

    /// Name of the definition `$ref` points at.
    pub fn reference_name(&self) -> Option<String> {
        self.reference().map(reference_name)
    }

    pub fn all_of(&self) -> Option<&Vec<Value>> {
        self.0.get("allOf").and_then(Value::as_array)
    }

    /// `oneOf`, or `anyOf` when `oneOf` is absent.
    pub fn one_of(&self) -> Option<&Vec<Value>> {
        self.0
            .get("oneOf")
            .or_else(|| self.0.get("anyOf"))
            .and_then(Value::as_array)
    }

    /// The `type` keyword. For the `["string", "null"]` form the first
    /// non-null entry is returned.
    pub fn type_name(&self) -> Option<&str> {
        match self.0.get("type")? {
            Value::String(name) => Some(name.as_str()),
            Value::Array(names) => names.iter().filter_map(Value::as_str).find(|name| *name != "null"),
            _ => None,
        }
    }

    pub fn has_native_type(&self) -> bool {
        self.type_name().is_some_and(|name| NATIVE_TYPE_NAMES.contains(&name))
    }

    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.0.get("properties").and_then(Value::as_object)
    }

    pub fn required(&self) -> Vec<&str> {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn enum_values(&self) -> Option<&Vec<Value>> {
        self.0.get("enum").and_then(Value::as_array)
    }

    pub fn items(&self) -> Option<&Value> {
        self.0.get("items")
    }

    pub fn additional_properties(&self) -> Option<&Value> {
        self.0.get("additionalProperties")
    }

    pub fn discriminator(&self) -> Result<Option<Discriminator>> {
        match self.0.get("discriminator") {
            None => Ok(None),
            Some(raw) => serde_json::from_value(raw.clone()).map(Some).map_err(|err| Error::Unsupported {
                context: "discriminator".to_string(),
                detail: err.to_string(),
            }),
        }
    }

    pub fn format(&self) -> Option<&str> {
        self.0.get("format").and_then(Value::as_str)
    }
    pub fn pattern(&self) -> Option<&str> {
        self.0.get("pattern").and_then(Value::as_str)
    }
    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }

    /// Properties in declaration order, split into (required, optional).
    pub fn split_properties_by_required(&self) -> (Vec<(&String, &Value)>, Vec<(&String, &Value)>) {
        let required = self.required();
        let Some(properties) = self.properties() else {
            return (Vec::new(), Vec::new());
        };
        properties.iter().partition(|(name, _)| required.contains(&name.as_str()))
    }
}

/// `#/components/schemas/Foo~1Bar` → `Foo/Bar`.
pub fn reference_name(reference: &str) -> String {
    let last = reference.rsplit('/').next().unwrap_or(reference);
    last.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(value: Value) -> Definition {
        Definition::from_value(value).unwrap()
    }

    #[test]
    fn reference_forms() {
        assert_eq!(reference_name("#/$defs/Person"), "Person");
        assert_eq!(reference_name("#/components/schemas/Person"), "Person");
        assert_eq!(reference_name("#/definitions/A~1B~0C"), "A/B~C");
        assert_eq!(reference_name("Person"), "Person");
    }

    #[test]
    fn split_preserves_declaration_order() {
        let d = def(json!({
            "type": "object",
            "properties": {"Name": {"type": "string"}, "Age": {"type": "integer"}, "Email": {"type": "string"}},
            "required": ["Email", "Name"]
        }));
        let (required, optional) = d.split_properties_by_required();
        let required: Vec<_> = required.into_iter().map(|(k, _)| k.as_str()).collect();
        let optional: Vec<_> = optional.into_iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(required, ["Name", "Email"]);
        assert_eq!(optional, ["Age"]);
    }

    #[test]
    fn nullable_type_array() {
        assert_eq!(def(json!({"type": ["null", "string"]})).type_name(), Some("string"));
        assert!(!def(json!({"type": "undefinedType"})).has_native_type());
    }

    #[test]
    fn discriminator_parses_camel_case() {
        let d = def(json!({
            "oneOf": [{"$ref": "#/$defs/A"}],
            "discriminator": {"propertyName": "Kind", "mapping": {"a": "#/$defs/A"}}
        }));
        let disc = d.discriminator().unwrap().unwrap();
        assert_eq!(disc.property_name, "Kind");
        assert_eq!(disc.mapping.unwrap()["a"], "#/$defs/A");
    }

    #[test]
    fn non_object_definitions_are_rejected() {
        assert!(matches!(Definition::from_value(json!(true)), Err(Error::DefinitionUnidentified { .. })));
    }
}
