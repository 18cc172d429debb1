use bincode::ErrorKind;

/// Custom Result type for rowmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for rowmap
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The same parameter name was bound twice by positional binding
    #[error("duplicate parameter {0}")]
    DuplicateParameter(String),
    /// Positional values cannot be bound against a stored procedure call
    #[error("positional parameters are not supported for stored procedure {0}")]
    PositionalProcedure(String),
    /// Number of positional values differs from the parameters found in the text
    #[error("expected {expected} positional values, got {actual}")]
    ParameterCount { expected: usize, actual: usize },
    /// A typed argument that is not a `[value, db-type]` pair
    #[error("malformed typed parameter at position {position}: {reason}")]
    MalformedTypedParameter { position: usize, reason: String },
    /// Field storage kind with no coercion path from a column value
    #[error("unsupported type {kind} for field {type_name}.{field}")]
    UnsupportedType {
        type_name: &'static str,
        field: String,
        kind: String,
    },
    /// Enum text that names no defined member
    #[error("{value} is not a member of {enum_name}")]
    UnknownEnumMember { enum_name: &'static str, value: String },
    /// Enum integer that is not a defined member (strict membership only)
    #[error("{value} is not a defined value of {enum_name}")]
    EnumOutOfRange { enum_name: &'static str, value: i64 },
    /// A raw value that cannot be coerced to the requested kind
    #[error("cannot convert {value} to {target}")]
    Conversion { value: String, target: String },
    /// A failure while mapping one column onto one field
    #[error("error mapping column {column} to {type_name}.{field}: {source}")]
    Column {
        type_name: &'static str,
        field: String,
        column: String,
        #[source]
        source: Box<Error>,
    },
    /// Destination shape that has no consistent mapping strategy
    #[error("shape error {0}")]
    Shape(String),
    /// Row iteration stopped by a cancellation request
    #[error("mapping cancelled")]
    Cancelled,
    /// Internal error (serialization, io, missing recorded results)
    #[error("internal error {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn conversion(value: impl std::fmt::Display, target: impl std::fmt::Display) -> Self {
        Error::Conversion {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    /// Strips `Column` context, returning the underlying failure
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Column { source, .. } => source.root_cause(),
            err => err,
        }
    }
}

impl From<Box<ErrorKind>> for Error {
    fn from(value: Box<ErrorKind>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Internal(value.to_string())
    }
}
