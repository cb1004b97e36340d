//! Error surface shared by the compiler and the generated object protocol.
//!
//! Schema-shape problems (`DefinitionUnidentified`, `ClassNotFound`, ...) abort
//! compilation. Data-shape problems (`Type`, `Key`, `Value`) carry a
//! [`DataPath`] that grows one segment per frame while a nested `from_dict`
//! unwinds, so the outermost caller sees `$.Results[0].SampleMass`.
use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("definition {} could not be identified: {body}", .name.as_deref().unwrap_or("<anonymous>"))]
    DefinitionUnidentified { name: Option<String>, body: String },

    #[error("unsupported schema construct in `{context}`: {detail}")]
    Unsupported { context: String, detail: String },

    #[error("circular reference while resolving `{0}`")]
    CircularReference(String),

    #[error("class not found: `{0}`")]
    ClassNotFound(String),

    #[error("TypeError at {path}{}: {message}", render_within(.within))]
    Type {
        path: DataPath,
        /// Types under construction, outermost first.
        within: Vec<String>,
        message: String,
    },

    #[error("KeyError at {path}: {message}")]
    Key { path: DataPath, message: String },

    #[error("ValueError at {path}: {message}")]
    Value { path: DataPath, message: String },

    #[error("serialization error at {path}: {message}")]
    Serialization { path: DataPath, message: String },

    #[error("malformed schema document {0}")]
    Document(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn render_within(within: &[String]) -> String {
    if within.is_empty() {
        return String::new();
    }
    format!(" (while constructing {})", within.join(" > "))
}

impl Error {
    pub fn type_error(message: impl Into<String>) -> Self {
        Error::Type { path: DataPath::default(), within: Vec::new(), message: message.into() }
    }
    pub fn key_error(message: impl Into<String>) -> Self {
        Error::Key { path: DataPath::default(), message: message.into() }
    }
    pub fn value_error(message: impl Into<String>) -> Self {
        Error::Value { path: DataPath::default(), message: message.into() }
    }
    pub fn serialization(message: impl Into<String>) -> Self {
        Error::Serialization { path: DataPath::default(), message: message.into() }
    }
    pub fn unidentified(body: &serde_json::Value) -> Self {
        Error::DefinitionUnidentified { name: None, body: body.to_string() }
    }

    /// Attach a definition name to a `DefinitionUnidentified` raised by the
    /// classifier (which only sees the body).
    pub fn named(self, definition_name: &str) -> Self {
        match self {
            Error::DefinitionUnidentified { name: None, body } => Error::DefinitionUnidentified {
                name: Some(definition_name.to_string()),
                body,
            },
            other => other,
        }
    }

    pub fn at_field(self, field: impl Into<String>) -> Self {
        self.prefixed(PathSegment::Field(field.into()))
    }

    pub fn at_index(self, index: usize) -> Self {
        self.prefixed(PathSegment::Index(index))
    }

    /// Record that this error surfaced while constructing `type_name`.
    pub fn within_type(mut self, type_name: &str) -> Self {
        if let Error::Type { within, .. } = &mut self {
            if within.first().map(String::as_str) != Some(type_name) {
                within.insert(0, type_name.to_string());
            }
        }
        self
    }

    pub fn path(&self) -> Option<&DataPath> {
        match self {
            Error::Type { path, .. }
            | Error::Key { path, .. }
            | Error::Value { path, .. }
            | Error::Serialization { path, .. } => Some(path),
            _ => None,
        }
    }

    fn prefixed(mut self, segment: PathSegment) -> Self {
        match &mut self {
            Error::Type { path, .. }
            | Error::Key { path, .. }
            | Error::Value { path, .. }
            | Error::Serialization { path, .. } => path.push_front(segment),
            _ => {}
        }
        self
    }
}

// ------------------------------ Data paths -------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Location inside a data document, rooted at `$`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataPath(pub Vec<PathSegment>);

impl DataPath {
    pub fn push_front(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_accumulates_outward() {
        let err = Error::type_error("argument 'sample_mass' must be of type number")
            .at_field("SampleMass")
            .at_index(0)
            .at_field("Results");
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("$.Results[0].SampleMass"));
    }

    #[test]
    fn within_chain_is_outermost_first() {
        let err = Error::type_error("boom").within_type("Result").within_type("Experiment");
        let rendered = err.to_string();
        assert!(rendered.contains("while constructing Experiment > Result"), "{rendered}");
    }

    #[test]
    fn naming_only_touches_unidentified() {
        let err = Error::unidentified(&serde_json::json!({"type": "undefinedType"})).named("Broken");
        assert!(matches!(err, Error::DefinitionUnidentified { name: Some(ref n), .. } if n == "Broken"));
        let other = Error::ClassNotFound("X".into()).named("Broken");
        assert!(matches!(other, Error::ClassNotFound(_)));
    }
}
