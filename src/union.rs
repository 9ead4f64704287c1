//! Union branch ordering
//!
//! Avro readers expect a field's default to match the first branch of a
//! union-typed field. These helpers build nullable unions and move the
//! branch matching a default to the front.

use crate::error::Result;
use crate::schema::{Schema, SchemaKind, UnionSchema};
use crate::value::DefaultValue;

impl UnionSchema {
    /// Index of the branch a default value belongs to
    ///
    /// The value is classified once, in this order: sequence, mapping
    /// (map, else the first record), boolean, null, bytes, floating point
    /// (double, else float), integral (long, else int), text (string, else
    /// the first enum).
    pub fn branch_for_default(&self, default: &DefaultValue) -> Option<usize> {
        match default {
            DefaultValue::Array(_) => self.position(SchemaKind::Array),
            DefaultValue::Object(_) => self
                .position(SchemaKind::Map)
                .or_else(|| self.position(SchemaKind::Record)),
            DefaultValue::Boolean(_) => self.position(SchemaKind::Boolean),
            DefaultValue::Null => self.position(SchemaKind::Null),
            DefaultValue::Bytes(_) => self.position(SchemaKind::Bytes),
            DefaultValue::Number(n) if n.is_f64() => self
                .position(SchemaKind::Double)
                .or_else(|| self.position(SchemaKind::Float)),
            DefaultValue::Number(_) => self
                .position(SchemaKind::Long)
                .or_else(|| self.position(SchemaKind::Int)),
            DefaultValue::String(_) => self
                .position(SchemaKind::String)
                .or_else(|| self.position(SchemaKind::Enum)),
        }
    }
}

/// Put the union branch matching `default` first
///
/// Anything that is not a union, a missing default, or a default that
/// matches no branch leaves the schema as it was. Union props are kept.
pub fn reorder_union_for_default(schema: Schema, default: Option<&DefaultValue>) -> Schema {
    let Some(default) = default else {
        return schema;
    };
    let union = match schema {
        Schema::Union(union) => union,
        other => return other,
    };
    match union.branch_for_default(default) {
        Some(index) => Schema::Union(union.promote(index)),
        None => Schema::Union(union),
    }
}

/// Make a schema nullable as `[schema, null]`
///
/// Already-nullable schemas are returned unchanged; a union without a null
/// branch gets one appended.
pub fn union_with_null(schema: Schema) -> Result<Schema> {
    match schema {
        Schema::Union(mut union) => {
            if !union.contains(SchemaKind::Null) {
                union.push(Schema::null())?;
            }
            Ok(Schema::Union(union))
        }
        other if other.kind() == SchemaKind::Null => Ok(other),
        other => Ok(Schema::Union(UnionSchema::new(vec![other, Schema::null()])?)),
    }
}
