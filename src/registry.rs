//! Name → (type handle, caster, raw definition, category).
//!
//! The registry is filled by the compiler and read-only afterwards. It also
//! owns the composite and enum descriptors that handles refer to by name.
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::caster::{self, Caster};
use crate::classify::Category;
use crate::composite::{CompositeType, EnumType};
use crate::definition::Definition;
use crate::error::{Error, Result};
use crate::handle::TypeHandle;
use crate::object::Class;
use crate::value::Value;

static GLOBAL: OnceCell<TypeRegistry> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub handle: TypeHandle,
    pub caster: Caster,
    pub definition: Definition,
    pub category: Category,
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: IndexMap<String, Entry>,
    composites: IndexMap<String, Arc<CompositeType>>,
    enums: IndexMap<String, Arc<EnumType>>,
    root: Option<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------ Building ----------------------------- //

    /// Insert or replace `name`. Handles refer to composites by name, so a
    /// replacement keeps every earlier reference pointing at the same type.
    pub(crate) fn register(
        &mut self,
        name: &str,
        handle: TypeHandle,
        caster: Caster,
        definition: Definition,
        category: Category,
    ) {
        tracing::trace!(name, %category, %handle, "register");
        self.entries.insert(
            name.to_string(),
            Entry { name: name.to_string(), handle, caster, definition, category },
        );
    }

    pub(crate) fn insert_composite(&mut self, ty: CompositeType) {
        self.composites.insert(ty.name.clone(), Arc::new(ty));
    }

    pub(crate) fn composite_mut(&mut self, name: &str) -> Result<&mut CompositeType> {
        self.composites
            .get_mut(name)
            .map(Arc::make_mut)
            .ok_or_else(|| Error::ClassNotFound(name.to_string()))
    }

    pub(crate) fn insert_enum(&mut self, ty: EnumType) {
        self.enums.insert(ty.name.clone(), Arc::new(ty));
    }

    pub(crate) fn set_root(&mut self, root: Option<String>) {
        self.root = root;
    }

    // ------------------------------ Lookup ------------------------------- //

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, name: &str) -> Result<&Entry> {
        self.entries.get(name).ok_or_else(|| Error::ClassNotFound(name.to_string()))
    }

    /// Entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn lookup_type(&self, name: &str) -> Result<&TypeHandle> {
        self.entry(name).map(|entry| &entry.handle)
    }

    pub fn lookup_caster(&self, name: &str) -> Result<&Caster> {
        self.entry(name).map(|entry| &entry.caster)
    }

    pub fn lookup_category(&self, name: &str) -> Result<Category> {
        self.entry(name).map(|entry| entry.category)
    }

    pub fn lookup_definition(&self, name: &str) -> Result<&Definition> {
        self.entry(name).map(|entry| &entry.definition)
    }

    pub fn composite(&self, name: &str) -> Result<&Arc<CompositeType>> {
        self.composites.get(name).ok_or_else(|| Error::ClassNotFound(name.to_string()))
    }

    pub fn enum_type(&self, name: &str) -> Result<&Arc<EnumType>> {
        self.enums.get(name).ok_or_else(|| Error::ClassNotFound(name.to_string()))
    }

    /// The titled top-level schema, if the document had one.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Generated type `name`. Aliases of composites resolve to their target.
    pub fn class(&self, name: &str) -> Result<Class<'_>> {
        let composite_name = match self.entries.get(name).map(|entry| &entry.handle) {
            Some(TypeHandle::Composite(target)) => target.as_str(),
            _ => name,
        };
        let ty = self.composite(composite_name)?;
        Ok(Class::new(self, Arc::clone(ty)))
    }

    // ------------------------------ Typing ------------------------------- //

    /// `child` is `ancestor` or (transitively) inherits from it.
    pub fn is_subtype(&self, child: &str, ancestor: &str) -> bool {
        if child == ancestor {
            return true;
        }
        let mut pending = vec![child];
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            if current == ancestor {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            if let Some(ty) = self.composites.get(current) {
                pending.extend(ty.parents().iter().map(String::as_str));
            }
        }
        false
    }

    /// Whether `value` already satisfies `handle` and needs no casting.
    pub fn conforms(&self, value: &Value, handle: &TypeHandle) -> bool {
        match handle {
            TypeHandle::Any => true,
            TypeHandle::Native(native) => caster::conforms_native(*native, value),
            TypeHandle::List(item) => match value {
                Value::List(items) => items.iter().all(|v| self.conforms(v, item)),
                _ => false,
            },
            TypeHandle::Union(members) => members.iter().any(|member| self.conforms(value, member)),
            TypeHandle::Optional(inner) => value.is_null() || self.conforms(value, inner),
            TypeHandle::Enum(name) => matches!(value, Value::Enum(member) if &member.enum_name == name),
            TypeHandle::Composite(name) => {
                matches!(value, Value::Object(obj) if self.is_subtype(obj.type_name(), name))
            }
        }
    }

    /// Apply `caster` outside of any constructor.
    pub fn cast(&self, caster: &Caster, value: Value) -> Result<Value> {
        caster::apply(self, caster, value).map_err(|failure| {
            failure.into_error(|value, detail| {
                let mut message = format!("value {value} of type {} cannot be cast to {caster}", value.type_label());
                if let Some(detail) = detail {
                    message.push_str(": ");
                    message.push_str(&detail);
                }
                message
            })
        })
    }

    /// Cast `raw` with the caster registered under `name`, whatever its
    /// category.
    pub fn instantiate(&self, name: &str, raw: impl Into<Value>) -> Result<Value> {
        let caster = self.lookup_caster(name)?;
        self.cast(caster, raw.into())
    }

    /// Run the dispatcher of polymorph `name` on `data`.
    pub fn discriminate(&self, name: &str, data: impl Into<Value>) -> Result<Value> {
        let Caster::Polymorph(dispatcher) = self.lookup_caster(name)? else {
            return Err(Error::type_error(format!("`{name}` is not a polymorph")));
        };
        match data.into() {
            Value::Map(map) => dispatcher.discriminate(self, map),
            other => Err(Error::type_error(format!(
                "{name} expects an object to discriminate, got {}",
                other.type_label()
            ))),
        }
    }

    // ------------------------------ Process-wide ------------------------- //

    /// Make this registry the process-wide one. Fails (returning the
    /// registry) if one is already installed.
    pub fn install(self) -> std::result::Result<&'static TypeRegistry, TypeRegistry> {
        GLOBAL.try_insert(self).map_err(|(_, rejected)| rejected)
    }

    pub fn global() -> Option<&'static TypeRegistry> {
        GLOBAL.get()
    }
}
