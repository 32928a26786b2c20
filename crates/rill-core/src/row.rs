//! Canonical row representation and schema

use std::fmt;

/// Field value in a canonical [`Row`]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
        }
    }
}

/// Primitive field types supported by the row model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
}

impl FieldType {
    /// Parse a type from its name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "bool" => Some(Self::Bool),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named, typed, optionally nullable field of a [`RowSchema`]
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable,
        }
    }
}

/// Schema shared by every row a reader emits.
///
/// The compact text form is a comma-separated field list, each entry
/// `name:type` with an optional trailing `?` for nullable:
/// `"id:int,name:str?,score:float"`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSchema {
    fields: Vec<Field>,
}

impl RowSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Parse the compact text form
    pub fn parse(spec: &str) -> Result<Self, SchemaError> {
        let mut fields = Vec::new();
        for entry in spec.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (name, ty_spec) = entry
                .split_once(':')
                .ok_or_else(|| SchemaError::BadField(entry.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(SchemaError::BadField(entry.to_string()));
            }
            let ty_spec = ty_spec.trim();
            let (ty_name, nullable) = match ty_spec.strip_suffix('?') {
                Some(base) => (base, true),
                None => (ty_spec, false),
            };
            let ty = FieldType::from_name(ty_name).ok_or_else(|| SchemaError::UnknownType {
                field: name.to_string(),
                ty: ty_name.to_string(),
            })?;
            fields.push(Field::new(name, ty, nullable));
        }
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Error parsing the compact schema text form
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    Empty,
    BadField(String),
    UnknownType { field: String, ty: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "schema has no fields"),
            Self::BadField(entry) => write!(f, "bad field entry {entry:?}, expected name:type"),
            Self::UnknownType { field, ty } => {
                write!(f, "field {field:?} has unknown type {ty:?}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// One emitted record, values in schema field order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Converts one raw record from a record stream into a canonical [`Row`].
///
/// Conversion failures are mid-iteration failures for the poll cycle that
/// hit them; the reader abandons the split and propagates the error.
pub trait RowConverter {
    type Raw;

    fn convert(&self, raw: Self::Raw) -> Result<Row, ConvertError>;
}

/// Raw record does not fit the target schema
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    MissingField { field: String },
    TypeMismatch { field: String, expected: FieldType, found: String },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => {
                write!(f, "missing value for non-nullable field {field:?}")
            }
            Self::TypeMismatch { field, expected, found } => {
                write!(f, "field {field:?} expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for ConvertError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_from_name() {
        assert_eq!(FieldType::from_name("int"), Some(FieldType::Int));
        assert_eq!(FieldType::from_name("INT"), Some(FieldType::Int));
        assert_eq!(FieldType::from_name("str"), Some(FieldType::Str));
        assert_eq!(FieldType::from_name("float"), Some(FieldType::Float));
        assert_eq!(FieldType::from_name("bool"), Some(FieldType::Bool));
        assert_eq!(FieldType::from_name("decimal"), None);
    }

    #[test]
    fn parse_basic_schema() {
        let schema = RowSchema::parse("id:int,name:str,score:float,active:bool").unwrap();
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.fields()[0], Field::new("id", FieldType::Int, false));
        assert_eq!(schema.fields()[1], Field::new("name", FieldType::Str, false));
    }

    #[test]
    fn parse_nullable_marker() {
        let schema = RowSchema::parse("id:int,name:str?").unwrap();
        assert!(!schema.fields()[0].nullable);
        assert!(schema.fields()[1].nullable);
        assert_eq!(schema.fields()[1].ty, FieldType::Str);
    }

    #[test]
    fn parse_tolerates_whitespace() {
        let schema = RowSchema::parse(" id : int , name : str? ").unwrap();
        assert_eq!(schema.fields()[0].name, "id");
        assert_eq!(schema.fields()[1].name, "name");
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(RowSchema::parse(""), Err(SchemaError::Empty));
        assert_eq!(RowSchema::parse(" , ,"), Err(SchemaError::Empty));
    }

    #[test]
    fn parse_rejects_missing_type() {
        assert!(matches!(
            RowSchema::parse("id"),
            Err(SchemaError::BadField(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_type() {
        let err = RowSchema::parse("id:uuid").unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                field: "id".into(),
                ty: "uuid".into()
            }
        );
    }

    #[test]
    fn value_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::Str("x".into()).type_name(), "str");
    }

    #[test]
    fn convert_error_display() {
        let err = ConvertError::TypeMismatch {
            field: "id".into(),
            expected: FieldType::Int,
            found: "string".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("\"id\""));
        assert!(msg.contains("int"));
    }
}
