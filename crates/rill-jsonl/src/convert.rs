//! Schema-driven JSON → Row conversion

use serde_json::Value as Json;

use rill_core::{ConvertError, FieldType, Row, RowConverter, RowSchema, Value};

/// Maps flat JSON objects onto a [`RowSchema`].
///
/// An absent or explicitly-null field converts to null when the schema field
/// is nullable and is a [`ConvertError::MissingField`] otherwise. Ints are
/// accepted into float fields; no other coercions happen.
#[derive(Debug, Clone)]
pub struct JsonRowConverter {
    schema: RowSchema,
}

impl JsonRowConverter {
    pub fn new(schema: RowSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }
}

fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

impl RowConverter for JsonRowConverter {
    type Raw = Json;

    fn convert(&self, raw: Json) -> Result<Row, ConvertError> {
        let mut values = Vec::with_capacity(self.schema.len());
        for field in self.schema.fields() {
            let json = raw.get(&field.name).unwrap_or(&Json::Null);
            if json.is_null() {
                if field.nullable {
                    values.push(Value::Null);
                    continue;
                }
                return Err(ConvertError::MissingField {
                    field: field.name.clone(),
                });
            }
            let mismatch = || ConvertError::TypeMismatch {
                field: field.name.clone(),
                expected: field.ty,
                found: json_type_name(json).to_string(),
            };
            let value = match field.ty {
                FieldType::Bool => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
                FieldType::Int => Value::Int(json.as_i64().ok_or_else(mismatch)?),
                FieldType::Float => Value::Float(json.as_f64().ok_or_else(mismatch)?),
                FieldType::Str => Value::Str(json.as_str().ok_or_else(mismatch)?.to_owned()),
            };
            values.push(value);
        }
        Ok(Row::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn converter(spec: &str) -> JsonRowConverter {
        JsonRowConverter::new(RowSchema::parse(spec).unwrap())
    }

    #[test]
    fn converts_in_schema_order() {
        let cv = converter("id:int,name:str,score:float,active:bool");
        let row = cv
            .convert(json!({"name": "a", "id": 7, "active": true, "score": 0.5}))
            .unwrap();
        assert_eq!(
            row.values(),
            &[
                Value::Int(7),
                Value::Str("a".into()),
                Value::Float(0.5),
                Value::Bool(true)
            ]
        );
    }

    #[test]
    fn extra_json_fields_are_ignored() {
        let cv = converter("id:int");
        let row = cv.convert(json!({"id": 1, "unrelated": [1, 2]})).unwrap();
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn missing_nullable_becomes_null() {
        let cv = converter("id:int,name:str?");
        let row = cv.convert(json!({"id": 1})).unwrap();
        assert_eq!(row.values()[1], Value::Null);
    }

    #[test]
    fn explicit_null_matches_absent() {
        let cv = converter("id:int,name:str?");
        let row = cv.convert(json!({"id": 1, "name": null})).unwrap();
        assert_eq!(row.values()[1], Value::Null);
    }

    #[test]
    fn missing_required_field_errors() {
        let cv = converter("id:int,name:str");
        let err = cv.convert(json!({"id": 1})).unwrap_err();
        assert_eq!(err, ConvertError::MissingField { field: "name".into() });
    }

    #[test]
    fn type_mismatch_names_field_and_types() {
        let cv = converter("id:int");
        let err = cv.convert(json!({"id": "seven"})).unwrap_err();
        assert_eq!(
            err,
            ConvertError::TypeMismatch {
                field: "id".into(),
                expected: FieldType::Int,
                found: "string".into()
            }
        );
    }

    #[test]
    fn int_accepted_as_float() {
        let cv = converter("score:float");
        let row = cv.convert(json!({"score": 3})).unwrap();
        assert_eq!(row.values()[0], Value::Float(3.0));
    }

    #[test]
    fn float_rejected_as_int() {
        let cv = converter("id:int");
        assert!(cv.convert(json!({"id": 1.5})).is_err());
    }
}
