//! Runtime type compiler for JSON-Schema documents.
//!
//! A [`SchemaDocument`] compiles into a [`TypeRegistry`] of generated types.
//! Composite types are instantiated through [`Class`] handles and produce
//! [`SchemaObject`]s that convert back to plain data and JSON.
//!
//! ```no_run
//! use schema_objects::SchemaDocument;
//!
//! let registry = SchemaDocument::from_path("schema.json")?.compile()?;
//! let experiment = registry.class("Experiment")?.from_json_path("run.json")?;
//! println!("{experiment}");
//! # Ok::<(), schema_objects::Error>(())
//! ```
pub mod caster;
pub mod classify;
pub mod compiler;
pub mod composite;
pub mod definition;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod handle;
pub mod naming;
pub mod object;
pub mod path_de;
pub mod registry;
pub mod synthesizer;
pub mod value;

pub use caster::Caster;
pub use classify::Category;
pub use composite::{CompositeKind, CompositeType, EnumMember, EnumType};
pub use definition::Definition;
pub use dispatch::Dispatcher;
pub use document::SchemaDocument;
pub use error::{DataPath, Error, PathSegment, Result};
pub use handle::{NativeType, TypeHandle};
pub use object::{Class, SchemaObject};
pub use registry::TypeRegistry;
pub use synthesizer::{Arguments, Initializer};
pub use value::Value;
