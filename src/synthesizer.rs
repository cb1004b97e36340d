//! Constructor synthesis.
//!
//! A [`Constructor`] is the parameter table of a generated type. Invoking it
//! binds keyword/positional arguments, applies defaults, coerces every value
//! through its caster and writes the results into the instance's field map.
//! Composed types use [`Initializer::Combined`], which binds once against the
//! merged table and hands each parent the arguments it declares.
use indexmap::IndexMap;

use crate::caster::{self, Caster};
use crate::error::{Error, Result};
use crate::handle::TypeHandle;
use crate::naming::{self, SpecialNames};
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Longest rendering of an offending value inside an error message.
const ERROR_VALUE_PREVIEW: usize = 120;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDefault {
    Required,
    Value(Value),
}

/// One declared property of a composite type.
#[derive(Debug, Clone)]
pub struct Property {
    /// Attribute name (snake_case unless special).
    pub name: String,
    /// Document key.
    pub external_name: String,
    pub caster: Caster,
    pub constraint: TypeHandle,
    pub default: PropertyDefault,
}

/// Accepts undeclared keys, coercing each value with `caster`.
#[derive(Debug, Clone)]
pub struct CatchAll {
    pub caster: Caster,
    pub constraint: TypeHandle,
}

#[derive(Debug, Clone)]
pub struct Constructor {
    pub owner: String,
    pub params: Vec<Property>,
    pub catch_all: Option<CatchAll>,
}

#[derive(Debug, Clone)]
pub enum Initializer {
    Direct(Constructor),
    /// Re-dispatches bound arguments to each parent's initializer, in order.
    Combined { signature: Constructor, parents: Vec<String> },
}

#[derive(Debug, Clone, Default)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keyword: IndexMap<String, Value>,
}

/// Arguments after binding: every declared parameter has a value.
#[derive(Debug, Clone, Default)]
pub struct BoundArguments {
    pub declared: IndexMap<String, Value>,
    pub extra: IndexMap<String, Value>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }
    pub fn from_keywords(keyword: IndexMap<String, Value>) -> Self {
        Self { positional: Vec::new(), keyword }
    }
}

impl Constructor {
    pub fn synthesize<'a>(
        owner: &str,
        properties: impl IntoIterator<Item = &'a Property>,
        catch_all: Option<&CatchAll>,
    ) -> Self {
        Self {
            owner: owner.to_string(),
            params: properties.into_iter().cloned().collect(),
            catch_all: catch_all.cloned(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&Property> {
        self.params.iter().find(|param| param.name == name)
    }

    pub fn accepts_extra(&self) -> bool {
        self.catch_all.is_some()
    }

    /// `Employee(name: string, age: Optional[integer] = None, **kwargs: string)`
    pub fn signature(&self) -> String {
        let mut parts = Vec::with_capacity(self.params.len() + 1);
        for param in &self.params {
            match &param.default {
                PropertyDefault::Required => parts.push(format!("{}: {}", param.name, param.constraint)),
                PropertyDefault::Value(Value::Null) => {
                    parts.push(format!("{}: {} = None", param.name, param.constraint))
                }
                PropertyDefault::Value(value) => {
                    parts.push(format!("{}: {} = {value}", param.name, param.constraint))
                }
            }
        }
        if let Some(catch_all) = &self.catch_all {
            parts.push(format!("**kwargs: {}", catch_all.constraint));
        }
        format!("{}({})", self.owner, parts.join(", "))
    }

    pub fn bind(&self, args: Arguments) -> Result<BoundArguments> {
        let Arguments { positional, keyword } = args;
        if positional.len() > self.params.len() {
            return Err(Error::type_error(format!(
                "{}() takes {} positional arguments but {} were given",
                self.owner,
                self.params.len(),
                positional.len()
            )));
        }

        let mut given: IndexMap<String, Value> = IndexMap::new();
        for (param, value) in self.params.iter().zip(positional) {
            given.insert(param.name.clone(), value);
        }

        let mut extra = IndexMap::new();
        for (name, value) in keyword {
            if self.param(&name).is_some() {
                if given.contains_key(&name) {
                    return Err(Error::type_error(format!(
                        "{}() got multiple values for argument '{name}'",
                        self.owner
                    )));
                }
                given.insert(name, value);
            } else if self.accepts_extra() {
                extra.insert(name, value);
            } else {
                return Err(Error::type_error(format!(
                    "{}() got an unexpected keyword argument '{name}'",
                    self.owner
                )));
            }
        }

        let mut declared = IndexMap::with_capacity(self.params.len());
        let mut missing = Vec::new();
        for param in &self.params {
            match (given.swap_remove(&param.name), &param.default) {
                (Some(value), _) => {
                    declared.insert(param.name.clone(), value);
                }
                (None, PropertyDefault::Value(default)) => {
                    declared.insert(param.name.clone(), default.clone());
                }
                (None, PropertyDefault::Required) => missing.push(param),
            }
        }
        if let Some(first) = missing.first() {
            let names: Vec<String> = missing.iter().map(|param| format!("'{}'", param.name)).collect();
            return Err(Error::type_error(format!(
                "{}() missing {} required argument{}: {}",
                self.owner,
                missing.len(),
                if missing.len() == 1 { "" } else { "s" },
                names.join(", ")
            ))
            .at_field(first.external_name.as_str()));
        }

        Ok(BoundArguments { declared, extra })
    }

    /// Bind, coerce, and store into `fields` under attribute names.
    pub fn invoke(
        &self,
        registry: &TypeRegistry,
        args: Arguments,
        fields: &mut IndexMap<String, Value>,
        special: &SpecialNames,
    ) -> Result<()> {
        let BoundArguments { mut declared, extra } = self.bind(args)?;
        for param in &self.params {
            let Some(value) = declared.swap_remove(&param.name) else {
                continue;
            };
            let value = coerce(registry, &param.name, &param.constraint, &param.caster, value)
                .map_err(|err| err.at_field(param.external_name.as_str()))?;
            fields.insert(param.name.clone(), value);
        }
        if let Some(catch_all) = &self.catch_all {
            for (name, value) in extra {
                let value = coerce(registry, &name, &catch_all.constraint, &catch_all.caster, value)
                    .map_err(|err| err.at_field(naming::snake_to_pascal(&name, special)))?;
                fields.insert(name, value);
            }
        }
        Ok(())
    }
}

impl Initializer {
    /// The parameter table callers bind against.
    pub fn signature(&self) -> &Constructor {
        match self {
            Initializer::Direct(constructor) => constructor,
            Initializer::Combined { signature, .. } => signature,
        }
    }

    /// Same behaviour, reported under `owner`.
    pub fn renamed(&self, owner: &str) -> Initializer {
        match self {
            Initializer::Direct(constructor) => {
                Initializer::Direct(Constructor { owner: owner.to_string(), ..constructor.clone() })
            }
            Initializer::Combined { signature, parents } => Initializer::Combined {
                signature: Constructor { owner: owner.to_string(), ..signature.clone() },
                parents: parents.clone(),
            },
        }
    }

    pub fn initialize(
        &self,
        registry: &TypeRegistry,
        args: Arguments,
        fields: &mut IndexMap<String, Value>,
        special: &SpecialNames,
    ) -> Result<()> {
        match self {
            Initializer::Direct(constructor) => constructor.invoke(registry, args, fields, special),
            Initializer::Combined { signature, parents } => {
                let bound = signature.bind(args)?;
                for parent in parents {
                    let parent_ty = registry.composite(parent)?;
                    let parent_sig = parent_ty.initializer.signature();
                    let mut parent_args = Arguments::new();
                    for (name, value) in &bound.declared {
                        if parent_sig.param(name).is_some() {
                            parent_args.keyword.insert(name.clone(), value.clone());
                        }
                    }
                    if parent_sig.accepts_extra() {
                        for (name, value) in &bound.extra {
                            parent_args.keyword.insert(name.clone(), value.clone());
                        }
                    }
                    parent_ty
                        .initializer
                        .initialize(registry, parent_args, fields, &parent_ty.special_names)?;
                }
                Ok(())
            }
        }
    }
}

/// Pass `null` and values that already satisfy `constraint`, cast everything
/// else. Presence of required properties is checked by `bind`, not here.
pub(crate) fn coerce(
    registry: &TypeRegistry,
    name: &str,
    constraint: &TypeHandle,
    caster: &Caster,
    value: Value,
) -> Result<Value> {
    if value.is_null() {
        return Ok(value);
    }
    if registry.conforms(&value, constraint) {
        return Ok(value);
    }
    caster::apply(registry, caster, value).map_err(|failure| {
        failure.into_error(|value, detail| {
            let mut shown = value.to_string();
            if shown.chars().count() > ERROR_VALUE_PREVIEW {
                shown = shown.chars().take(ERROR_VALUE_PREVIEW).collect::<String>() + "...";
            }
            let mut message = format!(
                "argument '{name}' must be of type {constraint} (value: {shown}, type: {})",
                value.type_label()
            );
            if let Some(detail) = detail {
                message.push_str(": ");
                message.push_str(&detail);
            }
            message
        })
    })
}
