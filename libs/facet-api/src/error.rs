use std::fmt;

/// Error class, independent of the message and of any path context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input or wire value has the wrong shape.
    TypeMismatch,
    /// Right shape, unacceptable content (empty set, bad date, ...).
    InvalidValue,
    /// Key not declared in a map schema.
    SchemaViolation,
    /// Required fields absent after a full traversal.
    MissingRequired,
    /// Key-derivation mask selects something it may not.
    MaskViolation,
    /// A default provider failed, or needs an async context.
    Default,
    /// Key tuple rejected.
    Key,
    /// Schema construction or typed-record validation failed.
    Schema,
    Config,
    Storage,
}

/// Error returned by every converter, key derivation and store call.
#[derive(Debug, thiserror::Error)]
pub enum FacetError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("invalid {kind} value: {message}")]
    InvalidValue { kind: &'static str, message: String },

    #[error("field '{0}' is not declared in the schema")]
    UndeclaredField(String),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("mask violation: {0}")]
    MaskViolation(String),

    #[error("default provider for '{field}' failed: {message}")]
    DefaultProvider { field: String, message: String },

    #[error("field '{0}' has an asynchronous default, use serialize_async")]
    AsyncDefault(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{path}: {source}")]
    AtPath {
        path: String,
        #[source]
        source: Box<FacetError>,
    },
}

pub type Result<T, E = FacetError> = std::result::Result<T, E>;

impl FacetError {
    pub fn type_mismatch(expected: &'static str, found: impl fmt::Display) -> Self {
        FacetError::TypeMismatch {
            expected,
            found: found.to_string(),
        }
    }

    pub fn invalid(kind: &'static str, message: impl Into<String>) -> Self {
        FacetError::InvalidValue {
            kind,
            message: message.into(),
        }
    }

    /// Classify, looking through path context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FacetError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            FacetError::InvalidValue { .. } => ErrorKind::InvalidValue,
            FacetError::UndeclaredField(_) => ErrorKind::SchemaViolation,
            FacetError::MissingRequired(_) => ErrorKind::MissingRequired,
            FacetError::MaskViolation(_) => ErrorKind::MaskViolation,
            FacetError::DefaultProvider { .. } | FacetError::AsyncDefault(_) => ErrorKind::Default,
            FacetError::InvalidKey(_) => ErrorKind::Key,
            FacetError::SchemaMismatch(_) => ErrorKind::Schema,
            FacetError::Config(_) => ErrorKind::Config,
            FacetError::Storage(_) => ErrorKind::Storage,
            FacetError::AtPath { source, .. } => source.kind(),
        }
    }

    /// The innermost error beneath any path context.
    pub fn root_cause(&self) -> &FacetError {
        let mut current = self;
        while let FacetError::AtPath { source, .. } = current {
            current = source;
        }
        current
    }

    /// Dotted field path of the failure, if one was recorded.
    pub fn path(&self) -> Option<&str> {
        match self {
            FacetError::AtPath { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Add a path segment to the error.
    ///
    /// Nested contexts collapse into one dotted path: `org` wrapped around
    /// `id` reads `org.id`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            FacetError::AtPath { path, source } => FacetError::AtPath {
                path: format!("{ctx}.{path}"),
                source,
            },
            other => FacetError::AtPath {
                path: ctx.to_string(),
                source: Box::new(other),
            },
        }
    }
}

impl From<serde_json::Error> for FacetError {
    fn from(e: serde_json::Error) -> Self {
        FacetError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_builds_dotted_path() {
        let err = FacetError::type_mismatch("string", "number")
            .with_context("id")
            .with_context("org");

        assert_eq!(err.path(), Some("org.id"));
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(
            err.to_string(),
            "org.id: type mismatch: expected string, found number"
        );
    }

    #[test]
    fn missing_required_names_every_field() {
        let err = FacetError::MissingRequired(vec!["id".into(), "email".into()]);
        assert_eq!(err.to_string(), "missing required fields: id, email");
    }
}
