// Type handles: what a registered name (or a property) is constrained to.
// Composites and enums are referenced by name, so a stub registered early and
// enriched later is still the same type.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    String,
    Integer,
    Number,
    Boolean,
    DateTime,
    Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHandle {
    Any,
    Native(NativeType),
    List(Box<TypeHandle>),
    Union(Vec<TypeHandle>),
    Optional(Box<TypeHandle>),
    Enum(String),
    Composite(String),
}

impl NativeType {
    pub fn from_schema_type(name: &str) -> Option<Self> {
        match name {
            "string" => Some(NativeType::String),
            "integer" => Some(NativeType::Integer),
            "number" => Some(NativeType::Number),
            "boolean" => Some(NativeType::Boolean),
            _ => None,
        }
    }

    /// `format` keywords that refine a string.
    pub fn from_format(format: &str) -> Option<Self> {
        match format {
            "date-time" => Some(NativeType::DateTime),
            "uuid" => Some(NativeType::Uuid),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NativeType::String => "string",
            NativeType::Integer => "integer",
            NativeType::Number => "number",
            NativeType::Boolean => "boolean",
            NativeType::DateTime => "date-time",
            NativeType::Uuid => "uuid",
        }
    }
}

impl TypeHandle {
    pub fn optional(inner: TypeHandle) -> Self {
        match inner {
            TypeHandle::Optional(_) | TypeHandle::Any => inner,
            other => TypeHandle::Optional(Box::new(other)),
        }
    }

    pub fn accepts_null(&self) -> bool {
        matches!(self, TypeHandle::Any | TypeHandle::Optional(_))
    }

    pub fn composite_name(&self) -> Option<&str> {
        match self {
            TypeHandle::Composite(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHandle::Any => f.write_str("Any"),
            TypeHandle::Native(native) => write!(f, "{native}"),
            TypeHandle::List(item) => write!(f, "List[{item}]"),
            TypeHandle::Union(members) => {
                f.write_str("Union[")?;
                for (ix, member) in members.iter().enumerate() {
                    if ix > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str("]")
            }
            TypeHandle::Optional(inner) => write!(f, "Optional[{inner}]"),
            TypeHandle::Enum(name) | TypeHandle::Composite(name) => f.write_str(name),
        }
    }
}
