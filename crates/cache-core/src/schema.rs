use crate::error::{CacheError, Result};
use crate::types::DataType;
use arrow::datatypes::{Field as ArrowField, Schema as ArrowSchema};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    data_type: DataType,
    nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn to_arrow(&self) -> ArrowField {
        ArrowField::new(self.name.clone(), self.data_type.to_arrow(), self.nullable)
    }
}

/// Ordered (name, type) list describing a chunk's columns.
///
/// Two schemas compare equal iff their fields match pairwise by name, type
/// and nullability; `names_and_types_text` produces a canonical text form
/// with the same discrimination, so hashing the text is equivalent to
/// hashing the structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self { fields: vec![] }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| CacheError::ColumnNotFound(name.to_string()))
    }

    /// Canonical `name Type, name Type` rendering used for key hashing.
    pub fn names_and_types_text(&self) -> String {
        let mut out = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{} {}", field.name(), field.data_type().type_name());
        }
        out
    }

    pub fn to_arrow(&self) -> ArrowSchema {
        let fields: Vec<ArrowField> = self.fields.iter().map(|f| f.to_arrow()).collect();
        ArrowSchema::new(fields)
    }

    pub fn from_arrow(schema: &ArrowSchema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|f| {
                Field::new(
                    f.name(),
                    DataType::from_arrow(f.data_type()),
                    f.is_nullable(),
                )
            })
            .collect();
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_value_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("value", DataType::Utf8, true),
        ])
    }

    #[test]
    fn test_names_and_types_text() {
        let schema = id_value_schema();
        assert_eq!(schema.names_and_types_text(), "id Int64, value Utf8");
    }

    #[test]
    fn test_text_discriminates_schemas() {
        let a = id_value_schema();
        let b = Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("value", DataType::Utf8, true),
        ]);

        assert_ne!(a, b);
        assert_ne!(a.names_and_types_text(), b.names_and_types_text());
    }

    #[test]
    fn test_arrow_round_trip() {
        let schema = id_value_schema();
        let round = Schema::from_arrow(&schema.to_arrow());
        assert_eq!(schema, round);
    }

    #[test]
    fn test_index_of() {
        let schema = id_value_schema();
        assert_eq!(schema.index_of("value").unwrap(), 1);
        assert!(schema.index_of("missing").is_err());
    }
}
