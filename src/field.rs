//! Field schema construction
//!
//! Turns one property descriptor into one record field: picks the value
//! schema (explicit override, fixed size, custom encoding or the type's own
//! schema), applies nullability, then settles the default and the union
//! branch order that goes with it.

use serde_json::Value;
use tracing::{trace, warn};

use crate::config::InferenceConfig;
use crate::error::Result;
use crate::model::PropertyDescriptor;
use crate::parser::parse_schema;
use crate::schema::{Field, FixedSchema, Name, Schema};
use crate::session::BuildSession;
use crate::union::{reorder_union_for_default, union_with_null};
use crate::value::DefaultValue;

/// Builds record fields from property descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldBuilder {
    add_null_defaults: bool,
}

impl FieldBuilder {
    pub fn new(add_null_defaults: bool) -> Self {
        Self { add_null_defaults }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(config.add_null_defaults)
    }

    /// Build the field for `property`
    pub fn build(
        &self,
        session: &mut BuildSession<'_>,
        property: &PropertyDescriptor,
        optional: bool,
    ) -> Result<Field> {
        session.enter(&property.name);
        let field = self.build_field(session, property, optional)?;
        session.leave();
        Ok(field)
    }

    fn build_field(
        &self,
        session: &mut BuildSession<'_>,
        property: &PropertyDescriptor,
        optional: bool,
    ) -> Result<Field> {
        let mut default = property.default.clone();

        let schema = match &property.overrides.schema {
            // Used verbatim; add_null_defaults does not apply to an explicit schema
            Some(text) => parse_schema(text, &format!("property '{}'", session.path()))?,
            None => {
                let schema = self.value_schema(session, property, optional)?;
                if default.is_none() && self.add_null_defaults && schema.is_nullable_union() {
                    default = Some(DefaultValue::Null);
                }
                if let (Some(union), Some(value)) = (schema.as_union(), default.as_ref()) {
                    if union.branch_for_default(value).is_none() {
                        warn!(property = %session.path(), "default value matches no union branch");
                    }
                }
                reorder_union_for_default(schema, default.as_ref())
            }
        };

        trace!(property = %session.path(), kind = %schema.kind(), "built field");
        let mut field = Field::new(property.name.as_str(), schema);
        field.doc = property.doc.clone();
        field.default = default;
        if let Some(meta) = &property.meta {
            field.props.insert(meta.key.clone(), Value::String(meta.value.clone()));
        }
        field.aliases.extend(property.aliases.iter().cloned());
        Ok(field)
    }

    fn value_schema(
        &self,
        session: &mut BuildSession<'_>,
        property: &PropertyDescriptor,
        optional: bool,
    ) -> Result<Schema> {
        let overrides = &property.overrides;
        let mut optional = optional;

        let schema = if let Some(fixed) = &overrides.fixed {
            let name = Name::new(fixed.name.as_str(), fixed.namespace.clone())?;
            Schema::Fixed(FixedSchema::new(name, fixed.size))
        } else if let Some(text) = &overrides.custom_encoding {
            // Custom encoders write exactly this schema; nullability would change it
            optional = false;
            parse_schema(text, &format!("property '{}'", session.path()))?
        } else {
            if session.is_custom_encoded(&property.type_id) {
                optional = false;
            }
            session.schema_for(&property.type_id)?
        };

        if optional && !session.is_primitive(&property.type_id) {
            union_with_null(schema)
        } else {
            Ok(schema)
        }
    }
}
