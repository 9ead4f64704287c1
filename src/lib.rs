//! Schema Inference
//!
//! Builds Avro schemas from descriptions of an object model: record types
//! with ordered properties, optional fields, polymorphic subtypes, and the
//! per-type and per-property overrides an introspector found.
//!
//! ## Features
//!
//! - **Nested Records**: Field types resolve recursively; cyclic types end in a name reference
//! - **Optional Fields**: Optional properties become `[type, null]` unions
//! - **Polymorphism**: Types with subtypes become a union of the subtype schemas
//! - **Overrides**: Explicit schema text, fixed sizes and custom encodings replace inference
//! - **Defaults**: The union branch matching a field's default is moved first
//!
//! ## Architecture
//!
//! ```text
//! SchemaGenerator::generate(root)
//! └── BuildSession            (one SchemaRegistry per build)
//!     └── schema_for(type)    (scalar / array / map / enum / custom / record)
//!         └── RecordSchemaBuilder
//!             └── FieldBuilder ── reorder_union_for_default
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod field;
pub mod fingerprint;
pub mod model;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod session;
pub mod union;
pub mod value;

pub use builder::RecordSchemaBuilder;
pub use config::{InferConfig, InferenceConfig, OutputFormat};
pub use error::{Result, SchemaError};
pub use field::FieldBuilder;
pub use fingerprint::Fingerprint;
pub use model::{
    FieldOverrides, FixedSize, MetaProperty, ObjectModel, PropertyDescriptor, RecordDef, TypeCatalog,
    TypeDef, TypeKind,
};
pub use parser::parse_schema;
pub use registry::SchemaRegistry;
pub use schema::{Field, Name, PrimitiveType, Schema, SchemaKind, UnionSchema};
pub use session::{validate_with_avro, BuildSession, SchemaGenerator};
pub use union::{reorder_union_for_default, union_with_null};
pub use value::DefaultValue;
