//! Polymorphic dispatch: pick the concrete type for a raw object.
//!
//! Two forms exist. A keyed dispatcher reads one discriminator field and
//! looks its value up in a mapping. A conditional dispatcher walks an ordered
//! list of `{field: const}` conditions and takes the first that holds.
use indexmap::IndexMap;

use crate::caster::{self, Caster};
use crate::error::{Error, Result};
use crate::registry::TypeRegistry;
use crate::value::Value;

/// A dispatch target: the registered name and the caster applied to the
/// full data once it is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub target: String,
    pub caster: Caster,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Every listed field must equal its constant.
    pub constants: IndexMap<String, Value>,
    pub branch: Branch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatcher {
    Keyed { property_name: String, mapping: IndexMap<String, Branch> },
    /// Evaluated in declaration order.
    Conditional { conditions: Vec<Condition> },
}

impl Dispatcher {
    pub fn branches(&self) -> Box<dyn Iterator<Item = &Branch> + '_> {
        match self {
            Dispatcher::Keyed { mapping, .. } => Box::new(mapping.values()),
            Dispatcher::Conditional { conditions } => Box::new(conditions.iter().map(|c| &c.branch)),
        }
    }

    /// Choose a branch without casting.
    pub fn select(&self, data: &IndexMap<String, Value>) -> Result<&Branch> {
        match self {
            Dispatcher::Keyed { property_name, mapping } => {
                let raw = data.get(property_name).ok_or_else(|| {
                    Error::key_error(format!("discriminator property '{property_name}' is missing"))
                })?;
                let key = match raw {
                    Value::String(s) => s.clone(),
                    Value::Integer(i) => i.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(Error::key_error(format!(
                            "discriminator value {other} of '{property_name}' is not a scalar"
                        ))
                        .at_field(property_name.as_str()));
                    }
                };
                mapping.get(&key).ok_or_else(|| {
                    Error::key_error(format!("no mapping for discriminator value '{key}' of '{property_name}'"))
                        .at_field(property_name.as_str())
                })
            }
            Dispatcher::Conditional { conditions } => conditions
                .iter()
                .find(|condition| {
                    condition
                        .constants
                        .iter()
                        .all(|(field, constant)| data.get(field).is_some_and(|value| same_constant(value, constant)))
                })
                .map(|condition| &condition.branch)
                .ok_or_else(|| Error::value_error("data does not match any conditions")),
        }
    }

    /// Select a branch and cast the full `data` with it.
    pub fn discriminate(&self, registry: &TypeRegistry, data: IndexMap<String, Value>) -> Result<Value> {
        let branch = self.select(&data)?;
        tracing::trace!(branch = %branch.target, "discriminated");
        caster::apply(registry, &branch.caster, Value::Map(data)).map_err(|failure| {
            failure.into_error(|value, _| {
                format!("data of type {} cannot be cast to {}", value.type_label(), branch.target)
            })
        })
    }
}

/// Equality with integers and floats compared by numeric value.
fn same_constant(value: &Value, constant: &Value) -> bool {
    match (value, constant) {
        (Value::Integer(i), Value::Number(n)) | (Value::Number(n), Value::Integer(i)) => *i as f64 == *n,
        _ => value == constant,
    }
}
