//! Structural classification of schema definitions.
use std::fmt;

use serde_json::Value;

use crate::definition::Definition;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Native,
    Enum,
    Custom,
    Passthrough,
    MultiInheritance,
    List,
    Union,
    Polymorph,
}

impl Category {
    /// Type-registration order. Every category only refers to names
    /// registered by an earlier one (or to custom stubs).
    pub const ORDER: [Category; 8] = [
        Category::Native,
        Category::Enum,
        Category::Custom,
        Category::Passthrough,
        Category::MultiInheritance,
        Category::List,
        Category::Union,
        Category::Polymorph,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Native => "native",
            Category::Enum => "enum",
            Category::Custom => "custom",
            Category::Passthrough => "passthrough",
            Category::MultiInheritance => "multi-inheritance",
            Category::List => "list",
            Category::Union => "union",
            Category::Polymorph => "polymorph",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assign `definition` to exactly one [`Category`]. First matching rule wins:
///
/// 1. `$ref` → passthrough
/// 2. `allOf` → polymorph if every element carries `if` and `then`, else
///    multi-inheritance
/// 3. `oneOf`/`anyOf` → polymorph with a `discriminator`, else union
/// 4. native `type` → custom (object), list (array) or native
/// 5. `enum` → enum
pub fn classify(definition: &Definition) -> Result<Category> {
    if definition.has("$ref") {
        return Ok(Category::Passthrough);
    }
    if let Some(parts) = definition.all_of() {
        let conditional = parts.iter().all(|part| is_condition(part));
        return Ok(if conditional { Category::Polymorph } else { Category::MultiInheritance });
    }
    if definition.one_of().is_some() {
        return Ok(if definition.has("discriminator") { Category::Polymorph } else { Category::Union });
    }
    if definition.has_native_type() {
        return Ok(match definition.type_name() {
            Some("object") => Category::Custom,
            Some("array") => Category::List,
            _ => Category::Native,
        });
    }
    if definition.enum_values().is_some() {
        return Ok(Category::Enum);
    }
    Err(Error::unidentified(&definition.to_value()))
}

/// Classify a raw JSON node, rejecting non-objects.
pub fn classify_value(value: &Value) -> Result<Category> {
    match value {
        Value::Object(map) => classify(&Definition::from_map(map.clone())),
        other => Err(Error::unidentified(other)),
    }
}

fn is_condition(part: &Value) -> bool {
    part.get("if").is_some() && part.get("then").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn category(value: Value) -> Result<Category> {
        classify_value(&value)
    }

    #[test]
    fn every_supported_shape_has_one_category() {
        let cases = [
            (json!({"$ref": "#/$defs/A", "type": "object"}), Category::Passthrough),
            (json!({"allOf": [{"$ref": "#/$defs/A"}, {"type": "object"}]}), Category::MultiInheritance),
            (
                json!({"allOf": [{"if": {"properties": {"Kind": {"const": "a"}}}, "then": {"$ref": "#/$defs/A"}}]}),
                Category::Polymorph,
            ),
            (json!({"oneOf": [{"type": "string"}, {"type": "number"}]}), Category::Union),
            (json!({"anyOf": [{"type": "string"}, {"type": "number"}]}), Category::Union),
            (
                json!({"oneOf": [{"$ref": "#/$defs/A"}], "discriminator": {"propertyName": "Kind"}}),
                Category::Polymorph,
            ),
            (json!({"type": "object"}), Category::Custom),
            (json!({"type": "array", "items": {"type": "string"}}), Category::List),
            (json!({"type": "string", "format": "date-time"}), Category::Native),
            (json!({"type": "boolean"}), Category::Native),
            (json!({"enum": [{"Id": "a", "Description": "A"}]}), Category::Enum),
        ];
        for (value, expected) in cases {
            assert_eq!(category(value.clone()).unwrap(), expected, "{value}");
        }
    }

    #[test]
    fn mixed_all_of_is_inheritance() {
        let value = json!({"allOf": [
            {"if": {"properties": {"Kind": {"const": "a"}}}, "then": {"$ref": "#/$defs/A"}},
            {"type": "object"}
        ]});
        assert_eq!(category(value).unwrap(), Category::MultiInheritance);
    }

    #[test]
    fn unknown_shapes_are_unidentified() {
        for value in [json!({"type": "undefinedType"}), json!({}), json!({"description": "x"}), json!(42)] {
            let err = category(value).unwrap_err();
            assert!(matches!(err, Error::DefinitionUnidentified { .. }), "{err}");
        }
    }

    #[test]
    fn order_is_fixed() {
        assert_eq!(Category::ORDER.first(), Some(&Category::Native));
        assert_eq!(Category::ORDER.last(), Some(&Category::Polymorph));
        assert_eq!(Category::MultiInheritance.to_string(), "multi-inheritance");
    }
}
