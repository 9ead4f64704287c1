//! Record schema builder
//!
//! One builder per record type per session. Construction decides between an
//! explicit schema override, a union of polymorphic subtypes, or a plain
//! record that accumulates fields until [`RecordSchemaBuilder::finalize`].

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::field::FieldBuilder;
use crate::model::{PropertyDescriptor, RecordDef, TypeDef};
use crate::parser::parse_schema;
use crate::schema::{is_valid_name, Field, RecordSchema, Schema, UnionSchema};
use crate::session::BuildSession;
use crate::union::union_with_null;

/// Accumulates the fields of one record type
pub struct RecordSchemaBuilder {
    type_id: String,
    schema: Schema,
    /// Set for override and polymorphic modes; property events are ignored
    overridden: bool,
    fields: Vec<Field>,
    field_builder: FieldBuilder,
}

impl RecordSchemaBuilder {
    /// Create the builder and register its schema before any field is built
    pub fn new(session: &mut BuildSession<'_>, def: &TypeDef, record: &RecordDef) -> Result<Self> {
        let (schema, overridden) = if let Some(text) = &record.schema {
            (parse_schema(text, &format!("type '{}'", def.id))?, true)
        } else if !record.subtypes.is_empty() {
            let mut branches = Vec::with_capacity(record.subtypes.len());
            for subtype in &record.subtypes {
                branches.push(session.schema_for(subtype)?);
            }
            (Schema::Union(UnionSchema::new(branches)?), true)
        } else {
            let mut schema = RecordSchema::new(def.schema_name()?);
            schema.doc = def.doc.clone();
            schema.aliases = def.aliases.clone();
            if let Some(meta) = &record.meta {
                schema.props.insert(meta.key.clone(), Value::String(meta.value.clone()));
            }
            (Schema::Record(schema), false)
        };

        debug!(type_id = %def.id, overridden, "created record builder");
        session.registry_mut().register(def.id.as_str(), schema.clone());

        Ok(Self {
            type_id: def.id.clone(),
            schema,
            overridden,
            fields: Vec::new(),
            field_builder: FieldBuilder::from_config(session.config()),
        })
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// Add a required property
    pub fn property(&mut self, session: &mut BuildSession<'_>, property: &PropertyDescriptor) -> Result<()> {
        if self.overridden {
            return Ok(());
        }
        let field = self.field_builder.build(session, property, false)?;
        self.push(field)
    }

    /// Add an optional property
    pub fn optional_property(
        &mut self,
        session: &mut BuildSession<'_>,
        property: &PropertyDescriptor,
    ) -> Result<()> {
        if self.overridden {
            return Ok(());
        }
        let field = self.field_builder.build(session, property, true)?;
        self.push(field)
    }

    /// Add a required property whose schema comes from `produce`
    ///
    /// The field carries no doc and no default.
    pub fn property_with<F>(&mut self, session: &mut BuildSession<'_>, name: &str, produce: F) -> Result<()>
    where
        F: FnOnce(&mut BuildSession<'_>) -> Result<Schema>,
    {
        if self.overridden {
            return Ok(());
        }
        session.enter(name);
        let schema = produce(session)?;
        session.leave();
        self.push(Field::new(name, schema))
    }

    /// Add an optional property whose schema comes from `produce`
    ///
    /// Unless the type is an intrinsic primitive the schema is made nullable;
    /// with no default there is nothing to reorder against.
    pub fn optional_property_with<F>(
        &mut self,
        session: &mut BuildSession<'_>,
        name: &str,
        primitive: bool,
        produce: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut BuildSession<'_>) -> Result<Schema>,
    {
        if self.overridden {
            return Ok(());
        }
        session.enter(name);
        let mut schema = produce(session)?;
        session.leave();
        if !primitive {
            schema = union_with_null(schema)?;
        }
        self.push(Field::new(name, schema))
    }

    fn push(&mut self, field: Field) -> Result<()> {
        if let Some(bad) = std::iter::once(&field.name)
            .chain(&field.aliases)
            .find(|name| !is_valid_name(name))
        {
            return Err(SchemaError::InvalidName(bad.clone()));
        }
        if self.fields.iter().any(|f| f.name == field.name) {
            let record = self
                .schema
                .name()
                .map(|n| n.fullname())
                .unwrap_or_else(|| self.type_id.clone());
            return Err(SchemaError::DuplicateField {
                record,
                field: field.name,
            });
        }
        self.fields.push(field);
        Ok(())
    }

    /// Finish the schema
    ///
    /// A plain record gets its fields (possibly none) and replaces the
    /// in-progress registry entry; an overridden schema is returned as-is.
    pub fn finalize(self, session: &mut BuildSession<'_>) -> Result<Schema> {
        let Self {
            type_id,
            mut schema,
            overridden,
            fields,
            ..
        } = self;

        if !overridden {
            if let Schema::Record(record) = &mut schema {
                record.fields = fields;
            }
            session.registry_mut().complete(&type_id, &schema);
        }
        debug!(type_id = %type_id, kind = %schema.kind(), "finalized schema");
        Ok(schema)
    }
}
