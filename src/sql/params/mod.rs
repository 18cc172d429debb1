use std::{collections::HashSet, fmt::Display, str::FromStr};

use crate::{
    config::ScanOptions,
    error::{Error, Result},
    sql::{fold_case, types::Value},
};

pub use scanner::{ParameterToken, Scanner, scan, scan_tokens};

mod scanner;

/// How the executor interprets command text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandType {
    #[default]
    Text,
    /// Text is the name of a stored procedure
    StoredProcedure,
}

/// Database type hint attached to a typed parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    AnsiString,
    Binary,
    Boolean,
    Byte,
    Date,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    Single,
    String,
    Time,
}

impl DbType {
    pub fn to_str(&self) -> &'static str {
        match self {
            DbType::AnsiString => "ansistring",
            DbType::Binary => "binary",
            DbType::Boolean => "boolean",
            DbType::Byte => "byte",
            DbType::Date => "date",
            DbType::DateTime => "datetime",
            DbType::DateTimeOffset => "datetimeoffset",
            DbType::Decimal => "decimal",
            DbType::Double => "double",
            DbType::Guid => "guid",
            DbType::Int16 => "int16",
            DbType::Int32 => "int32",
            DbType::Int64 => "int64",
            DbType::Single => "single",
            DbType::String => "string",
            DbType::Time => "time",
        }
    }
}

impl FromStr for DbType {
    type Err = Error;

    /// Parses a type name (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_lowercase().as_ref() {
            "ansistring" => DbType::AnsiString,
            "binary" => DbType::Binary,
            "boolean" | "bool" => DbType::Boolean,
            "byte" => DbType::Byte,
            "date" => DbType::Date,
            "datetime" => DbType::DateTime,
            "datetimeoffset" => DbType::DateTimeOffset,
            "decimal" => DbType::Decimal,
            "double" => DbType::Double,
            "guid" | "uuid" => DbType::Guid,
            "int16" => DbType::Int16,
            "int32" | "int" => DbType::Int32,
            "int64" | "bigint" => DbType::Int64,
            "single" => DbType::Single,
            "string" => DbType::String,
            "time" => DbType::Time,
            _ => return Err(Error::conversion(s, "db type")),
        })
    }
}

impl Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A named parameter value, optionally carrying a database type
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
    pub db_type: Option<DbType>,
}

/// One positional argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    Typed(Value, DbType),
}

impl Arg {
    /// Builds a typed argument from a loosely typed `[value, db-type name]` pair
    pub fn typed_from_parts(position: usize, parts: Value) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedTypedParameter { position, reason };
        match parts {
            Value::Array(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                let value = items.next().unwrap_or_default();
                match items.next() {
                    Some(Value::String(name)) => {
                        let db_type = name
                            .parse()
                            .map_err(|_| malformed(format!("unknown db type {}", name)))?;
                        Ok(Arg::Typed(value, db_type))
                    }
                    Some(other) => Err(malformed(format!("db type must be text, got {}", other))),
                    None => Err(malformed("missing db type".to_string())),
                }
            }
            Value::Array(items) => Err(malformed(format!(
                "expected a (value, db type) pair, got {} parts",
                items.len()
            ))),
            other => Err(malformed(format!(
                "expected a (value, db type) pair, got {}",
                other
            ))),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

/// Types whose fields can be supplied as named parameters
pub trait ToParameters {
    fn to_parameters(&self) -> Vec<(&'static str, Value)>;
}

/// Ordered parameter set; names are unique case-insensitively
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a named parameter
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.upsert(Parameter {
            name: name.into(),
            value: value.into(),
            db_type: None,
        });
        self
    }

    /// Adds or replaces a named parameter with an explicit database type
    pub fn add_typed(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        db_type: DbType,
    ) -> &mut Self {
        self.upsert(Parameter {
            name: name.into(),
            value: value.into(),
            db_type: Some(db_type),
        });
        self
    }

    /// Adds every field of `object` as a named parameter
    pub fn add_object<T: ToParameters>(&mut self, object: &T) -> &mut Self {
        for (name, value) in object.to_parameters() {
            self.add(name, value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.position(name).map(|i| &self.params[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.params
            .iter()
            .position(|p| fold_case(&p.name) == fold_case(name))
    }

    fn upsert(&mut self, param: Parameter) {
        match self.position(&param.name) {
            Some(i) => self.params[i] = param,
            None => self.params.push(param),
        }
    }
}

/// A command submitted to the executor
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub text: String,
    pub command_type: CommandType,
    pub parameters: Parameters,
}

impl Command {
    /// Creates a plain SQL text command
    pub fn text(sql: impl Into<String>) -> Self {
        Self {
            text: sql.into(),
            command_type: CommandType::Text,
            parameters: Parameters::new(),
        }
    }

    /// Creates a stored procedure call
    pub fn procedure(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            command_type: CommandType::StoredProcedure,
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Binds positional values to the parameter references in the text, in order
    pub fn bind_positional<I, A>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.bind_positional_with(values, &ScanOptions::default())
    }

    pub fn bind_positional_with<I, A>(&mut self, values: I, options: &ScanOptions) -> Result<()>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        // Procedure text carries no markers that line up with its parameters
        if self.command_type == CommandType::StoredProcedure {
            return Err(Error::PositionalProcedure(self.text.clone()));
        }

        let tokens: Vec<ParameterToken> = Scanner::with_options(&self.text, options)
            .skip_bound(self.parameters.names())
            .collect();
        let args: Vec<Arg> = values.into_iter().map(Into::into).collect();

        let names = scanner::distinct(&tokens);

        if args.len() != names.len() {
            // Values line up with references in text order, so a value
            // landing on a name already bound in this call is a duplicate
            let mut seen = HashSet::new();
            if let Some(token) = tokens
                .iter()
                .take(args.len())
                .find(|t| !seen.insert(fold_case(&t.name)))
            {
                return Err(Error::DuplicateParameter(token.name.clone()));
            }
            return Err(Error::ParameterCount {
                expected: names.len(),
                actual: args.len(),
            });
        }

        for (name, arg) in names.into_iter().zip(args) {
            let (value, db_type) = match arg {
                Arg::Value(value) => (value, None),
                Arg::Typed(value, db_type) => (value, Some(db_type)),
            };
            self.parameters.upsert(Parameter {
                name,
                value,
                db_type,
            });
        }
        tracing::trace!(command = %self.text, count = self.parameters.len(), "bound positional parameters");
        Ok(())
    }

    /// Binds loosely typed `[value, db-type]` pairs positionally
    pub fn bind_positional_typed(&mut self, values: Vec<Value>) -> Result<()> {
        let args = values
            .into_iter()
            .enumerate()
            .map(|(i, parts)| Arg::typed_from_parts(i, parts))
            .collect::<Result<Vec<_>>>()?;
        self.bind_positional(args)
    }
}
