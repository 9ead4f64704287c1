//! Build sessions
//!
//! A session is one top-level schema build: it walks the object model from a
//! root type, hands record types to [`RecordSchemaBuilder`], and threads one
//! [`SchemaRegistry`] through every nested resolution. Sessions share no
//! mutable state, so independent builds may run concurrently.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::builder::RecordSchemaBuilder;
use crate::config::InferenceConfig;
use crate::error::{Result, SchemaError};
use crate::model::{ObjectModel, RecordDef, TypeDef, TypeKind};
use crate::parser::parse_schema;
use crate::registry::SchemaRegistry;
use crate::schema::{EnumSchema, Schema};

/// State of one top-level schema build
pub struct BuildSession<'m> {
    model: &'m dyn ObjectModel,
    config: InferenceConfig,
    registry: SchemaRegistry,
    /// Type and property names from the root down to the current property
    path: Vec<String>,
    /// Types being resolved, with their nesting depth
    active: HashMap<String, usize>,
}

impl<'m> BuildSession<'m> {
    /// Start a session with an empty registry
    pub fn new(model: &'m dyn ObjectModel, config: InferenceConfig) -> Self {
        Self {
            model,
            config,
            registry: SchemaRegistry::new(),
            path: Vec::new(),
            active: HashMap::new(),
        }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> SchemaRegistry {
        self.registry
    }

    pub fn type_def(&self, type_id: &str) -> Option<&'m TypeDef> {
        self.model.type_def(type_id)
    }

    /// Whether the type is an intrinsic non-nullable primitive
    pub fn is_primitive(&self, type_id: &str) -> bool {
        self.type_def(type_id).is_some_and(|def| def.primitive)
    }

    /// Whether the type writes itself with an opaque custom encoding
    pub fn is_custom_encoded(&self, type_id: &str) -> bool {
        self.type_def(type_id)
            .is_some_and(|def| matches!(def.kind, TypeKind::Custom { .. }))
    }

    /// Dotted path of the property being built (`Order.lines.product`)
    pub fn path(&self) -> String {
        self.path.join(".")
    }

    pub(crate) fn enter(&mut self, segment: &str) {
        self.path.push(segment.to_string());
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    /// Build the schema for a root type
    pub fn resolve_root(&mut self, type_id: &str) -> Result<Schema> {
        self.enter(type_id);
        let schema = self.schema_for(type_id)?;
        self.leave();
        Ok(schema)
    }

    /// Schema for a type, reusing whatever this session already built for it
    ///
    /// Records and enums register themselves before recursing. Other types
    /// are guarded while they resolve: a polymorphic base may be re-entered
    /// once from a subtype, since the second pass finds the subtypes
    /// registered; any other re-entry is a [`SchemaError::CyclicType`].
    pub fn schema_for(&mut self, type_id: &str) -> Result<Schema> {
        if let Some(existing) = self.registry.reference(type_id) {
            return Ok(existing);
        }
        let model = self.model;
        let def = model.type_def(type_id).ok_or_else(|| self.unresolved(type_id))?;

        let limit = match &def.kind {
            TypeKind::Record(record) if record.schema.is_none() && !record.subtypes.is_empty() => 2,
            _ => 1,
        };
        let depth = self.active.get(type_id).copied().unwrap_or(0);
        if depth >= limit {
            return Err(SchemaError::CyclicType {
                type_id: type_id.to_string(),
                path: self.path(),
            });
        }
        self.active.insert(type_id.to_string(), depth + 1);
        let result = self.resolve(def);
        if depth == 0 {
            self.active.remove(type_id);
        } else {
            self.active.insert(type_id.to_string(), depth);
        }
        result
    }

    fn resolve(&mut self, def: &'m TypeDef) -> Result<Schema> {
        match &def.kind {
            TypeKind::Scalar { scalar } => Ok(Schema::primitive(*scalar)),
            TypeKind::Array { items } => Ok(Schema::array(self.schema_for(items)?)),
            TypeKind::Map { values } => Ok(Schema::map(self.schema_for(values)?)),
            TypeKind::Enum { symbols, default } => {
                let mut schema = EnumSchema::new(def.schema_name()?, symbols.clone(), default.clone())?;
                schema.doc = def.doc.clone();
                schema.aliases = def.aliases.clone();
                let schema = Schema::Enum(schema);
                self.registry.register(def.id.as_str(), schema.clone());
                Ok(schema)
            }
            TypeKind::Custom { schema } => parse_schema(schema, &format!("type '{}'", def.id)),
            TypeKind::Record(record) => self.visit_record(def, record),
        }
    }

    /// Stream a record type's properties through a builder
    fn visit_record(&mut self, def: &'m TypeDef, record: &'m RecordDef) -> Result<Schema> {
        debug!(type_id = %def.id, properties = record.properties.len(), "visiting record type");
        let mut builder = RecordSchemaBuilder::new(self, def, record)?;

        for property in &record.properties {
            let type_id = property.type_id.as_str();
            if property.synthetic {
                if property.optional {
                    let primitive = self.is_primitive(type_id);
                    builder.optional_property_with(self, &property.name, primitive, |session| {
                        session.schema_for(type_id)
                    })?;
                } else {
                    builder.property_with(self, &property.name, |session| session.schema_for(type_id))?;
                }
            } else if property.optional {
                builder.optional_property(self, property)?;
            } else {
                builder.property(self, property)?;
            }
        }
        builder.finalize(self)
    }

    pub(crate) fn unresolved(&self, type_id: &str) -> SchemaError {
        SchemaError::SchemaResolution {
            type_id: type_id.to_string(),
            path: self.path(),
        }
    }
}

/// Builds schemas for root types of one object model
pub struct SchemaGenerator<'m> {
    model: &'m dyn ObjectModel,
    config: InferenceConfig,
}

impl<'m> SchemaGenerator<'m> {
    pub fn new(model: &'m dyn ObjectModel) -> Self {
        Self::with_config(model, InferenceConfig::default())
    }

    pub fn with_config(model: &'m dyn ObjectModel, config: InferenceConfig) -> Self {
        Self { model, config }
    }

    /// Build the schema for `root` in a fresh session
    pub fn generate(&self, root: &str) -> Result<Schema> {
        let mut session = BuildSession::new(self.model, self.config.clone());
        let schema = session.resolve_root(root)?;
        if self.config.validate_avro {
            validate_with_avro(&schema)?;
        }
        info!(root, types = session.registry().len(), "generated schema");
        Ok(schema)
    }
}

/// Re-parse the emitted schema with apache-avro
pub fn validate_with_avro(schema: &Schema) -> Result<()> {
    apache_avro::Schema::parse(&schema.to_json())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyDescriptor, RecordDef, TypeCatalog};
    use crate::schema::{PrimitiveType, SchemaKind};

    #[test]
    fn test_scalar_and_collection_types() {
        let catalog = TypeCatalog::with_builtins()
            .with(TypeDef::new("Names", TypeKind::Array { items: "string".into() }))
            .with(TypeDef::new("Scores", TypeKind::Map { values: "i64".into() }));
        let mut session = BuildSession::new(&catalog, InferenceConfig::default());

        assert_eq!(session.schema_for("i32").unwrap(), Schema::primitive(PrimitiveType::Int));
        assert_eq!(
            session.schema_for("Names").unwrap(),
            Schema::array(Schema::primitive(PrimitiveType::String))
        );
        assert_eq!(
            session.schema_for("Scores").unwrap(),
            Schema::map(Schema::primitive(PrimitiveType::Long))
        );
    }

    #[test]
    fn test_enum_registered_once() {
        let catalog = TypeCatalog::with_builtins().with(TypeDef::enumeration("com.acme.Color", &["RED", "BLUE"]));
        let mut session = BuildSession::new(&catalog, InferenceConfig::default());

        assert_eq!(session.schema_for("com.acme.Color").unwrap().kind(), SchemaKind::Enum);
        assert!(matches!(session.schema_for("com.acme.Color").unwrap(), Schema::Ref(_)));
        assert!(session.registry().contains("com.acme.Color"));
    }

    #[test]
    fn test_custom_type_uses_its_schema() {
        let catalog = TypeCatalog::with_builtins().with(TypeDef::new(
            "Money",
            TypeKind::Custom {
                schema: r#"{"type":"bytes","logicalType":"decimal","precision":9,"scale":2}"#.into(),
            },
        ));
        let mut session = BuildSession::new(&catalog, InferenceConfig::default());
        assert!(session.is_custom_encoded("Money"));
        let schema = session.schema_for("Money").unwrap();
        assert_eq!(schema.kind(), SchemaKind::Bytes);
        assert_eq!(schema.props().unwrap()["scale"], serde_json::json!(2));
    }

    #[test]
    fn test_unknown_type_reports_path() {
        let catalog = TypeCatalog::with_builtins().with(TypeDef::record(
            "Order",
            crate::model::RecordDef::new(vec![PropertyDescriptor::new("customer", "com.acme.Customer")]),
        ));
        let err = SchemaGenerator::new(&catalog).generate("Order").unwrap_err();
        match err {
            SchemaError::SchemaResolution { type_id, path } => {
                assert_eq!(type_id, "com.acme.Customer");
                assert_eq!(path, "Order.customer");
            }
            other => panic!("Expected SchemaResolution, got {:?}", other),
        }
    }

    #[test]
    fn test_self_containing_array_type_fails() {
        let catalog = TypeCatalog::with_builtins()
            .with(TypeDef::new("Nested", TypeKind::Array { items: "Nested".into() }))
            .with(TypeDef::record(
                "Holder",
                RecordDef::new(vec![PropertyDescriptor::new("nested", "Nested")]),
            ));
        let err = SchemaGenerator::new(&catalog).generate("Holder").unwrap_err();
        match err {
            SchemaError::CyclicType { type_id, path } => {
                assert_eq!(type_id, "Nested");
                assert_eq!(path, "Holder.nested");
            }
            other => panic!("Expected CyclicType, got {:?}", other),
        }
    }

    #[test]
    fn test_subtype_reaching_base_through_collection_fails() {
        let catalog = TypeCatalog::with_builtins()
            .with(TypeDef::record("Shape", RecordDef::default().with_subtypes(&["Shapes"])))
            .with(TypeDef::new("Shapes", TypeKind::Map { values: "Shape".into() }));
        let err = SchemaGenerator::new(&catalog).generate("Shape").unwrap_err();
        assert!(matches!(err, SchemaError::CyclicType { ref type_id, .. } if type_id == "Shapes"));
    }

    #[test]
    fn test_mutually_polymorphic_types_fail() {
        let catalog = TypeCatalog::with_builtins()
            .with(TypeDef::record("Left", RecordDef::default().with_subtypes(&["Right"])))
            .with(TypeDef::record("Right", RecordDef::default().with_subtypes(&["Left"])));
        let err = SchemaGenerator::new(&catalog).generate("Left").unwrap_err();
        assert!(matches!(err, SchemaError::CyclicType { .. }));
    }

    #[test]
    fn test_base_reentered_from_subtype_record() {
        let catalog = TypeCatalog::with_builtins()
            .with(TypeDef::record("com.acme.Shape", RecordDef::default().with_subtypes(&["com.acme.Group"])))
            .with(TypeDef::record(
                "com.acme.Group",
                RecordDef::new(vec![PropertyDescriptor::new("members", "com.acme.Shapes")]),
            ))
            .with(TypeDef::new("com.acme.Shapes", TypeKind::Array { items: "com.acme.Shape".into() }));
        let schema = SchemaGenerator::new(&catalog).generate("com.acme.Shape").unwrap();
        assert_eq!(schema.as_union().unwrap().branches().len(), 1);
    }

    #[test]
    fn test_model_enum_validated() {
        let catalog = TypeCatalog::with_builtins()
            .with(TypeDef::enumeration("com.acme.Color", &["RED", "dark-blue"]))
            .with(TypeDef::new(
                "com.acme.Size",
                TypeKind::Enum {
                    symbols: vec!["S".into(), "M".into()],
                    default: Some("XL".into()),
                },
            ));
        let mut session = BuildSession::new(&catalog, InferenceConfig::default());
        assert!(matches!(session.schema_for("com.acme.Color"), Err(SchemaError::InvalidEnum { .. })));
        assert!(matches!(session.schema_for("com.acme.Size"), Err(SchemaError::InvalidEnum { .. })));
        assert!(!session.registry().contains("com.acme.Size"));
    }

    #[test]
    fn test_sessions_start_empty() {
        let catalog = TypeCatalog::with_builtins().with(TypeDef::enumeration("Color", &["RED"]));
        let generator = SchemaGenerator::new(&catalog);
        // Each generation defines the enum in full; nothing leaks between sessions
        assert_eq!(generator.generate("Color").unwrap().kind(), SchemaKind::Enum);
        assert!(matches!(generator.generate("Color").unwrap(), Schema::Enum(_)));
    }
}
