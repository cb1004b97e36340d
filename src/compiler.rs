//! Schema compiler.
//!
//! Turns a [`SchemaDocument`] into a [`TypeRegistry`] in four passes:
//!
//! 1. categorize every definition;
//! 2. register a type handle and caster for each, category by category in
//!    [`Category::ORDER`]; composites start out as empty stubs;
//! 3. discover object-shaped properties and give them stub types of their
//!    own (`<Owner>_<property>`), then bind every stub's properties;
//! 4. finalize passthrough and multi-inheritance composites from their
//!    (now complete) parents.
//!
//! Anonymous sub-schemas are named after where they occur: `<Name>_Parent<i>`
//! for `allOf` members, `<Name>_Item` for array items, `<Name>_Option<i>`
//! for union and polymorph branches, `<Name>_AdditionalProperties` for
//! catch-all schemas.
use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as Json;
use tracing::{debug, info};

use crate::caster::Caster;
use crate::classify::{Category, classify};
use crate::composite::{CompositeKind, CompositeType, EnumType};
use crate::definition::{Definition, reference_name};
use crate::dispatch::{Branch, Condition, Dispatcher};
use crate::document::SchemaDocument;
use crate::error::{Error, Result};
use crate::handle::{NativeType, TypeHandle};
use crate::naming::{self, SpecialNames};
use crate::registry::TypeRegistry;
use crate::synthesizer::{CatchAll, Constructor, Initializer, Property, PropertyDefault};
use crate::value::Value;

/// Keywords that constrain a schema. A schema with none of them accepts
/// anything.
const SHAPE_KEYWORDS: [&str; 8] = ["$ref", "allOf", "oneOf", "anyOf", "type", "enum", "properties", "items"];

/// Definitions whose `pattern` marks other strings as timestamps / UUIDs.
const PATTERN_SOURCES: [(&str, NativeType); 2] = [("DateTime", NativeType::DateTime), ("Uuid", NativeType::Uuid)];

pub fn compile(document: &SchemaDocument) -> Result<TypeRegistry> {
    Compiler::new(document).run()
}

struct Compiler {
    definitions: IndexMap<String, Definition>,
    categories: IndexMap<String, Category>,
    groups: IndexMap<Category, Vec<String>>,
    patterns: Vec<(String, NativeType)>,
    registry: TypeRegistry,
    resolving: Vec<String>,
    root: Option<String>,
}

impl Compiler {
    fn new(document: &SchemaDocument) -> Self {
        let patterns = PATTERN_SOURCES
            .iter()
            .filter_map(|(source, native)| {
                let pattern = document.definitions.get(*source)?.pattern()?;
                Some((pattern.to_string(), *native))
            })
            .collect();
        Self {
            definitions: document.definitions.clone(),
            categories: IndexMap::new(),
            groups: Category::ORDER.iter().map(|category| (*category, Vec::new())).collect(),
            patterns,
            registry: TypeRegistry::new(),
            resolving: Vec::new(),
            root: document.root.clone(),
        }
    }

    fn run(mut self) -> Result<TypeRegistry> {
        self.categorize()?;

        for category in Category::ORDER {
            let names = self.group(category).to_vec();
            for name in names {
                self.register_named(&name)?;
            }
        }

        self.discover_nested()?;
        self.bind_all()?;
        self.finalize_all()?;

        self.registry.set_root(self.root.take());
        info!(types = self.registry.len(), root = ?self.registry.root(), "schema compiled");
        Ok(self.registry)
    }

    // ------------------------------ Categorize --------------------------- //

    fn categorize(&mut self) -> Result<()> {
        let mut pending = Vec::with_capacity(self.definitions.len());
        for (name, definition) in &self.definitions {
            let category = shape_category(definition).map_err(|e| e.named(name))?;
            pending.push((name.clone(), category));
        }
        for (name, category) in pending {
            self.track(&name, category);
        }
        for (category, names) in &self.groups {
            debug!(%category, count = names.len(), "categorized");
        }
        Ok(())
    }

    fn track(&mut self, name: &str, category: Category) {
        self.categories.insert(name.to_string(), category);
        self.groups.entry(category).or_default().push(name.to_string());
    }

    fn group(&self, category: Category) -> &[String] {
        self.groups.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Add a synthesized definition to the working set.
    fn adopt(&mut self, name: &str, definition: Definition, category: Category) {
        debug!(name, %category, "synthesized definition");
        self.definitions.insert(name.to_string(), definition);
        self.track(name, category);
    }

    // ------------------------------ Register ----------------------------- //

    /// Register `name` unless already registered. References to names not
    /// yet registered are followed on demand.
    fn register_named(&mut self, name: &str) -> Result<()> {
        if self.registry.contains(name) {
            return Ok(());
        }
        if self.resolving.iter().any(|pending| pending == name) {
            return Err(Error::CircularReference(name.to_string()));
        }
        let definition = self
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ClassNotFound(name.to_string()))?;
        let category = match self.categories.get(name) {
            Some(category) => *category,
            None => shape_category(&definition).map_err(|e| e.named(name))?,
        };

        self.resolving.push(name.to_string());
        let registered = self.register_definition(name, &definition, category);
        self.resolving.pop();
        registered
    }

    fn register_definition(&mut self, name: &str, definition: &Definition, category: Category) -> Result<()> {
        match category {
            Category::Native => {
                let (handle, caster) = self.native(definition, name)?;
                self.registry.register(name, handle, caster, definition.clone(), category);
            }
            Category::Enum => {
                let enum_ty = EnumType::from_definition(name, definition)?;
                self.registry.insert_enum(enum_ty);
                self.registry.register(
                    name,
                    TypeHandle::Enum(name.to_string()),
                    Caster::Enum(name.to_string()),
                    definition.clone(),
                    category,
                );
            }
            Category::Custom => self.register_composite(name, definition, CompositeKind::Custom, category),
            Category::Passthrough => self.register_passthrough(name, definition)?,
            Category::MultiInheritance => {
                let parents = self.inheritance_parents(name, definition)?;
                self.register_composite(name, definition, CompositeKind::MultiInheritance { parents }, category);
            }
            Category::List => {
                let (handle, caster) = self.list(definition, name)?;
                self.registry.register(name, handle, caster, definition.clone(), category);
            }
            Category::Union => {
                let (handle, caster) = self.union(definition, name)?;
                self.registry.register(name, handle, caster, definition.clone(), category);
            }
            Category::Polymorph => {
                let (handle, caster) = self.polymorph(definition, name)?;
                self.registry.register(name, handle, caster, definition.clone(), category);
            }
        }
        Ok(())
    }

    fn register_composite(&mut self, name: &str, definition: &Definition, kind: CompositeKind, category: Category) {
        let mut ty = CompositeType::new(name, kind);
        ty.description = definition.description().map(str::to_string);
        self.registry.insert_composite(ty);
        self.registry.register(
            name,
            TypeHandle::Composite(name.to_string()),
            Caster::Composite(name.to_string()),
            definition.clone(),
            category,
        );
    }

    /// `$ref` to a composite makes a new composite inheriting from it; any
    /// other target is aliased.
    fn register_passthrough(&mut self, name: &str, definition: &Definition) -> Result<()> {
        let target = definition
            .reference_name()
            .ok_or_else(|| Error::unidentified(&definition.to_value()).named(name))?;
        self.register_named(&target)?;
        let entry = self.registry.entry(&target)?.clone();
        match entry.handle {
            TypeHandle::Composite(parent) => {
                self.register_composite(name, definition, CompositeKind::Passthrough { parent }, Category::Passthrough)
            }
            handle => self.registry.register(name, handle, entry.caster, definition.clone(), Category::Passthrough),
        }
        Ok(())
    }

    fn inheritance_parents(&mut self, name: &str, definition: &Definition) -> Result<Vec<String>> {
        let parts = definition.all_of().cloned().unwrap_or_default();
        let mut parents = Vec::with_capacity(parts.len());
        for (ix, part) in parts.into_iter().enumerate() {
            let part = Definition::from_value(part).map_err(|e| e.named(name))?;
            let parent = match shape_category(&part).map_err(|e| e.named(name))? {
                Category::Passthrough => {
                    let (handle, _) = self.reference(&part, name)?;
                    match handle {
                        TypeHandle::Composite(parent) => parent,
                        other => {
                            return Err(Error::Unsupported {
                                context: name.to_string(),
                                detail: format!("allOf member {ix} resolves to {other}, not an object type"),
                            });
                        }
                    }
                }
                category @ (Category::Custom | Category::MultiInheritance) => {
                    let stub = format!("{name}_Parent{ix}");
                    self.anonymous(&stub, &part, category)?;
                    stub
                }
                other => {
                    return Err(Error::Unsupported {
                        context: name.to_string(),
                        detail: format!("allOf member {ix} is a {other} definition"),
                    });
                }
            };
            parents.push(parent);
        }
        Ok(parents)
    }

    // ------------------------------ Resolve ------------------------------ //

    /// Type handle and caster for an inline schema; `hint` names any type
    /// that has to be synthesized for it.
    fn resolve(&mut self, definition: &Definition, hint: &str) -> Result<(TypeHandle, Caster)> {
        if is_unconstrained(definition) {
            return Ok((TypeHandle::Any, Caster::Identity));
        }
        match shape_category(definition).map_err(|e| e.named(hint))? {
            Category::Passthrough => self.reference(definition, hint),
            Category::Native => self.native(definition, hint),
            Category::List => self.list(definition, hint),
            Category::Union => self.union(definition, hint),
            Category::Polymorph => self.polymorph(definition, hint),
            category @ (Category::Enum | Category::Custom | Category::MultiInheritance) => {
                self.anonymous(hint, definition, category)
            }
        }
    }

    fn reference(&mut self, definition: &Definition, context: &str) -> Result<(TypeHandle, Caster)> {
        let target = definition
            .reference_name()
            .ok_or_else(|| Error::unidentified(&definition.to_value()).named(context))?;
        self.register_named(&target)?;
        let entry = self.registry.entry(&target)?;
        Ok((entry.handle.clone(), entry.caster.clone()))
    }

    /// Register an inline schema under `name` (once) and return its entry.
    fn anonymous(&mut self, name: &str, definition: &Definition, category: Category) -> Result<(TypeHandle, Caster)> {
        if !self.registry.contains(name) {
            if !self.definitions.contains_key(name) {
                self.adopt(name, definition.clone(), category);
            }
            self.register_named(name)?;
        }
        let entry = self.registry.entry(name)?;
        Ok((entry.handle.clone(), entry.caster.clone()))
    }

    fn native(&self, definition: &Definition, context: &str) -> Result<(TypeHandle, Caster)> {
        let mut native = definition
            .type_name()
            .and_then(NativeType::from_schema_type)
            .ok_or_else(|| Error::unidentified(&definition.to_value()).named(context))?;
        if native == NativeType::String {
            if let Some(refined) = definition.format().and_then(NativeType::from_format) {
                native = refined;
            } else if let Some(pattern) = definition.pattern() {
                if let Some((_, refined)) = self.patterns.iter().find(|(known, _)| known == pattern) {
                    native = *refined;
                }
            }
        }
        Ok((TypeHandle::Native(native), Caster::Native(native)))
    }

    fn list(&mut self, definition: &Definition, name: &str) -> Result<(TypeHandle, Caster)> {
        let (item_handle, item_caster) = match definition.items() {
            None | Some(Json::Bool(true)) => (TypeHandle::Any, Caster::Identity),
            Some(items) => {
                let item_name = format!("{name}_Item");
                let items = Definition::from_value(items.clone()).map_err(|e| e.named(&item_name))?;
                self.resolve(&items, &item_name)?
            }
        };
        Ok((TypeHandle::List(Box::new(item_handle)), Caster::List(Box::new(item_caster))))
    }

    /// Plain union: no runtime discrimination, identity caster. A single
    /// alternative next to `{"type": "null"}` is an optional of that
    /// alternative and keeps its caster.
    fn union(&mut self, definition: &Definition, name: &str) -> Result<(TypeHandle, Caster)> {
        let alternatives = definition.one_of().cloned().unwrap_or_default();
        let mut nullable = false;
        let mut members = Vec::with_capacity(alternatives.len());
        for (ix, alternative) in alternatives.into_iter().enumerate() {
            if alternative.get("type").and_then(Json::as_str) == Some("null") {
                nullable = true;
                continue;
            }
            let option_name = format!("{name}_Option{ix}");
            let alternative = Definition::from_value(alternative).map_err(|e| e.named(&option_name))?;
            members.push(self.resolve(&alternative, &option_name)?);
        }
        if nullable && members.len() == 1 {
            let (handle, caster) = members.remove(0);
            return Ok((TypeHandle::optional(handle), caster));
        }
        let handle = TypeHandle::Union(members.into_iter().map(|(handle, _)| handle).collect());
        Ok((if nullable { TypeHandle::optional(handle) } else { handle }, Caster::Identity))
    }

    fn polymorph(&mut self, definition: &Definition, name: &str) -> Result<(TypeHandle, Caster)> {
        let (dispatcher, handles) = match definition.all_of() {
            Some(parts) => self.conditional(name, parts.clone())?,
            None => self.keyed(name, definition)?,
        };
        Ok((TypeHandle::Union(handles), Caster::Polymorph(Box::new(dispatcher))))
    }

    fn conditional(&mut self, name: &str, parts: Vec<Json>) -> Result<(Dispatcher, Vec<TypeHandle>)> {
        let mut conditions = Vec::with_capacity(parts.len());
        let mut handles = Vec::with_capacity(parts.len());
        for (ix, part) in parts.iter().enumerate() {
            let unsupported = |detail: String| Error::Unsupported { context: name.to_string(), detail };
            let fields = part
                .get("if")
                .and_then(|condition| condition.get("properties"))
                .and_then(Json::as_object)
                .ok_or_else(|| unsupported(format!("condition {ix} has no `if.properties`")))?;
            let mut constants = IndexMap::new();
            for (field, schema) in fields {
                let constant = schema
                    .get("const")
                    .or_else(|| single_enum_value(schema))
                    .ok_or_else(|| unsupported(format!("condition {ix} on `{field}` is not a constant")))?;
                constants.insert(field.clone(), Value::from(constant.clone()));
            }
            let then = part.get("then").cloned().unwrap_or(Json::Null);
            let option_name = format!("{name}_Option{ix}");
            let then = Definition::from_value(then).map_err(|e| e.named(&option_name))?;
            let (branch, handle) = self.branch(&then, &option_name)?;
            conditions.push(Condition { constants, branch });
            handles.push(handle);
        }
        Ok((Dispatcher::Conditional { conditions }, handles))
    }

    fn keyed(&mut self, name: &str, definition: &Definition) -> Result<(Dispatcher, Vec<TypeHandle>)> {
        let discriminator = definition.discriminator()?.ok_or_else(|| Error::Unsupported {
            context: name.to_string(),
            detail: "polymorph without discriminator".to_string(),
        })?;
        let targets: Vec<(String, String)> = match discriminator.mapping {
            Some(mapping) => mapping.into_iter().map(|(key, reference)| (key, reference_name(&reference))).collect(),
            None => definition
                .one_of()
                .map(|alternatives| {
                    alternatives
                        .iter()
                        .filter_map(|alternative| alternative.get("$ref").and_then(Json::as_str))
                        .map(|reference| {
                            let target = reference_name(reference);
                            (target.clone(), target)
                        })
                        .collect()
                })
                .unwrap_or_default(),
        };

        let mut mapping = IndexMap::with_capacity(targets.len());
        let mut handles = Vec::with_capacity(targets.len());
        for (key, target) in targets {
            self.register_named(&target)?;
            let entry = self.registry.entry(&target)?;
            let branch = Branch { target: branch_target(&entry.handle, &target), caster: entry.caster.clone() };
            if !handles.contains(&entry.handle) {
                handles.push(entry.handle.clone());
            }
            mapping.insert(key, branch);
        }
        Ok((Dispatcher::Keyed { property_name: discriminator.property_name, mapping }, handles))
    }

    fn branch(&mut self, definition: &Definition, hint: &str) -> Result<(Branch, TypeHandle)> {
        let (handle, caster) = self.resolve(definition, hint)?;
        let target = match definition.reference_name() {
            Some(reference) => branch_target(&handle, &reference),
            None => branch_target(&handle, hint),
        };
        Ok((Branch { target, caster }, handle))
    }

    // ------------------------------ Discover & bind ---------------------- //

    /// Object-shaped properties of custom types become custom types of their
    /// own. Stubs are appended to the custom group, so nesting is followed
    /// to any depth.
    fn discover_nested(&mut self) -> Result<()> {
        let mut ix = 0;
        while ix < self.group(Category::Custom).len() {
            let owner = self.group(Category::Custom)[ix].clone();
            ix += 1;
            let Some(properties) = self.definitions.get(&owner).and_then(Definition::properties).cloned() else {
                continue;
            };
            for (property, schema) in properties {
                let Ok(nested) = Definition::from_value(schema) else {
                    continue;
                };
                if is_unconstrained(&nested) || shape_category(&nested).ok() != Some(Category::Custom) {
                    continue;
                }
                let stub = property_hint(&owner, &property);
                if self.definitions.contains_key(&stub) {
                    continue;
                }
                debug!(owner = %owner, property = %property, stub = %stub, "discovered nested type");
                self.adopt(&stub, nested, Category::Custom);
                self.register_named(&stub)?;
            }
        }
        Ok(())
    }

    fn bind_all(&mut self) -> Result<()> {
        let mut ix = 0;
        while ix < self.group(Category::Custom).len() {
            let name = self.group(Category::Custom)[ix].clone();
            ix += 1;
            self.bind(&name)?;
        }
        debug!(count = self.group(Category::Custom).len(), "bound custom types");
        Ok(())
    }

    fn bind(&mut self, name: &str) -> Result<()> {
        let definition = self
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ClassNotFound(name.to_string()))?;
        let special = SpecialNames::new();

        let (required, optional) = definition.split_properties_by_required();
        let declared = required
            .into_iter()
            .map(|entry| (entry, true))
            .chain(optional.into_iter().map(|entry| (entry, false)));

        let mut properties = Vec::new();
        for ((external, schema), is_required) in declared {
            let internal = naming::pascal_to_snake(external, &special);
            let hint = format!("{name}_{internal}");
            let schema = Definition::from_value(schema.clone()).map_err(|e| e.named(&hint))?;
            let (handle, caster) = self.resolve(&schema, &hint)?;
            properties.push(if is_required {
                Property {
                    name: internal,
                    external_name: external.clone(),
                    caster,
                    constraint: handle,
                    default: PropertyDefault::Required,
                }
            } else {
                Property {
                    name: internal,
                    external_name: external.clone(),
                    caster,
                    constraint: TypeHandle::optional(handle),
                    default: PropertyDefault::Value(Value::Null),
                }
            });
        }

        let catch_all = match definition.additional_properties() {
            None | Some(Json::Bool(false)) => None,
            Some(Json::Bool(true)) => Some(CatchAll { caster: Caster::Identity, constraint: TypeHandle::Any }),
            Some(schema) => {
                let hint = format!("{name}_AdditionalProperties");
                let schema = Definition::from_value(schema.clone()).map_err(|e| e.named(&hint))?;
                let (constraint, caster) = self.resolve(&schema, &hint)?;
                Some(CatchAll { caster, constraint })
            }
        };

        let ty = self.registry.composite_mut(name)?;
        ty.special_names.extend_from(&special);
        for property in properties {
            ty.add_property(property);
        }
        if catch_all.is_some() {
            ty.set_catch_all(catch_all);
        }
        Ok(())
    }

    // ------------------------------ Finalize ----------------------------- //

    fn finalize_all(&mut self) -> Result<()> {
        let mut done = HashSet::new();
        let names: Vec<String> = self
            .group(Category::Passthrough)
            .iter()
            .chain(self.group(Category::MultiInheritance))
            .cloned()
            .collect();
        for name in names {
            if self.registry.composite(&name).is_ok() {
                self.finalize(&name, &mut done, &mut Vec::new())?;
            }
        }
        debug!(count = done.len(), "finalized composed types");
        Ok(())
    }

    fn finalize(&mut self, name: &str, done: &mut HashSet<String>, stack: &mut Vec<String>) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        if stack.iter().any(|pending| pending == name) {
            return Err(Error::CircularReference(name.to_string()));
        }
        let ty = Arc::clone(self.registry.composite(name)?);
        stack.push(name.to_string());
        for parent in ty.parents() {
            self.finalize(parent, done, stack)?;
        }
        stack.pop();

        match &ty.kind {
            CompositeKind::Custom => {}
            CompositeKind::Passthrough { parent } => {
                let parent_ty = Arc::clone(self.registry.composite(parent)?);
                let target = self.registry.composite_mut(name)?;
                target.properties = parent_ty.properties.clone();
                target.catch_all = parent_ty.catch_all.clone();
                target.initializer = parent_ty.initializer.renamed(name);
                target.special_names.extend_from(&parent_ty.special_names);
            }
            CompositeKind::MultiInheritance { parents } => {
                let mut properties = IndexMap::new();
                let mut catch_all = None;
                let special = SpecialNames::new();
                for parent in parents {
                    let parent_ty = self.registry.composite(parent)?;
                    for (key, property) in &parent_ty.properties {
                        properties.insert(key.clone(), property.clone());
                    }
                    if parent_ty.catch_all.is_some() {
                        catch_all = parent_ty.catch_all.clone();
                    }
                    special.extend_from(&parent_ty.special_names);
                }
                let signature = Constructor::synthesize(name, properties.values(), catch_all.as_ref());
                let target = self.registry.composite_mut(name)?;
                target.properties = properties;
                target.catch_all = catch_all;
                target.initializer = Initializer::Combined { signature, parents: parents.clone() };
                target.special_names.extend_from(&special);
            }
        }
        done.insert(name.to_string());
        Ok(())
    }
}

// ------------------------------ Helpers ---------------------------------- //

/// Classification with one allowance: `properties` without `type` is an
/// object.
fn shape_category(definition: &Definition) -> Result<Category> {
    match classify(definition) {
        Ok(category) => Ok(category),
        Err(_) if definition.properties().is_some() => Ok(Category::Custom),
        Err(err) => Err(err),
    }
}

fn is_unconstrained(definition: &Definition) -> bool {
    !SHAPE_KEYWORDS.iter().any(|keyword| definition.has(keyword))
}

fn single_enum_value(schema: &Json) -> Option<&Json> {
    match schema.get("enum")?.as_array()?.as_slice() {
        [only] => Some(only),
        _ => None,
    }
}

fn property_hint(owner: &str, property: &str) -> String {
    format!("{owner}_{}", naming::pascal_to_snake(property, &SpecialNames::new()))
}

fn branch_target(handle: &TypeHandle, fallback: &str) -> String {
    match handle {
        TypeHandle::Composite(name) | TypeHandle::Enum(name) => name.clone(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile_value(value: Json) -> Result<TypeRegistry> {
        SchemaDocument::from_value(value)?.compile()
    }

    #[test]
    fn registers_in_category_order_with_stubs() {
        let registry = compile_value(json!({"$defs": {
            "Tags": {"type": "array", "items": {"type": "object", "properties": {"Label": {"type": "string"}}}},
            "Person": {"type": "object", "properties": {
                "Name": {"type": "string"},
                "Address": {"type": "object", "properties": {"City": {"type": "string"}}}
            }},
            "Alias": {"$ref": "#/$defs/Person"},
            "Label": {"type": "string"}
        }}))
        .unwrap();
        assert_eq!(registry.lookup_category("Label").unwrap(), Category::Native);
        assert_eq!(registry.lookup_category("Alias").unwrap(), Category::Passthrough);
        assert_eq!(registry.lookup_type("Tags").unwrap().to_string(), "List[Tags_Item]");
        assert_eq!(registry.lookup_category("Person_address").unwrap(), Category::Custom);
        assert_eq!(
            registry.composite("Person").unwrap().signature(),
            "Person(name: Optional[string] = None, address: Optional[Person_address] = None)"
        );
        assert!(registry.is_subtype("Alias", "Person"));
    }

    #[test]
    fn forward_passthroughs_resolve_on_demand() {
        let registry = compile_value(json!({"$defs": {
            "A": {"$ref": "#/$defs/B"},
            "B": {"$ref": "#/$defs/C"},
            "C": {"type": "integer"}
        }}))
        .unwrap();
        assert_eq!(registry.lookup_type("A").unwrap(), &TypeHandle::Native(NativeType::Integer));
    }

    #[test]
    fn passthrough_cycles_are_reported() {
        let err = compile_value(json!({"$defs": {
            "A": {"$ref": "#/$defs/B"},
            "B": {"$ref": "#/$defs/A"}
        }}))
        .unwrap_err();
        assert!(matches!(err, Error::CircularReference(_)), "{err}");
    }

    #[test]
    fn dangling_reference_is_class_not_found() {
        let err = compile_value(json!({"$defs": {
            "Holder": {"type": "object", "properties": {"Thing": {"$ref": "#/$defs/Missing"}}}
        }}))
        .unwrap_err();
        assert!(matches!(err, Error::ClassNotFound(ref name) if name == "Missing"), "{err}");
    }

    #[test]
    fn unidentified_property_aborts() {
        let err = compile_value(json!({
            "title": "Broken",
            "type": "object",
            "properties": {"Field": {"type": "undefinedType"}}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::DefinitionUnidentified { .. }), "{err}");
    }

    #[test]
    fn pattern_mapping_types_strings() {
        let registry = compile_value(json!({"$defs": {
            "DateTime": {"type": "string", "pattern": "^\\d{4}-\\d{2}-\\d{2}T.*$"},
            "Uuid": {"type": "string", "pattern": "^[0-9a-f-]{36}$"},
            "Run": {"type": "object", "properties": {
                "Started": {"type": "string", "pattern": "^\\d{4}-\\d{2}-\\d{2}T.*$"},
                "Id": {"type": "string", "pattern": "^[0-9a-f-]{36}$"},
                "Finished": {"type": "string", "format": "date-time"}
            }}
        }}))
        .unwrap();
        assert_eq!(registry.lookup_type("DateTime").unwrap(), &TypeHandle::Native(NativeType::DateTime));
        assert_eq!(
            registry.composite("Run").unwrap().signature(),
            "Run(started: Optional[date-time] = None, id: Optional[uuid] = None, finished: Optional[date-time] = None)"
        );
    }

    #[test]
    fn nullable_union_keeps_member_caster() {
        let registry = compile_value(json!({"$defs": {
            "Mass": {"oneOf": [{"type": "number"}, {"type": "null"}]}
        }}))
        .unwrap();
        assert_eq!(registry.lookup_type("Mass").unwrap().to_string(), "Optional[number]");
        assert_eq!(registry.lookup_caster("Mass").unwrap(), &Caster::Native(NativeType::Number));
    }

    #[test]
    fn keyed_mapping_defaults_to_reference_names() {
        let registry = compile_value(json!({"$defs": {
            "Cat": {"type": "object", "properties": {"Kind": {"type": "string"}}},
            "Dog": {"type": "object", "properties": {"Kind": {"type": "string"}}},
            "Pet": {"oneOf": [{"$ref": "#/$defs/Cat"}, {"$ref": "#/$defs/Dog"}], "discriminator": {"propertyName": "Kind"}}
        }}))
        .unwrap();
        let pet = registry.discriminate("Pet", json!({"Kind": "Dog"})).unwrap();
        assert_eq!(pet.as_object().unwrap().type_name(), "Dog");
        assert_eq!(registry.lookup_type("Pet").unwrap().to_string(), "Union[Cat, Dog]");
    }
}
