//! Object model descriptions
//!
//! The introspected shape of the types a schema is built for: what kind of
//! type each one is, its properties in declaration order, and the override
//! hints an introspector found on types and properties. The inference core
//! only reads these; it never discovers them itself.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::schema::{Name, PrimitiveType};
use crate::value::DefaultValue;

/// Introspection capability the schema builders consume
pub trait ObjectModel {
    /// Describe the type with the given identity
    fn type_def(&self, id: &str) -> Option<&TypeDef>;
}

/// One type of the object model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDef {
    /// Type identity (e.g., "com.acme.Order")
    pub id: String,
    /// Schema name; defaults to the last segment of `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Schema namespace; defaults to everything before the last segment of `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Intrinsic non-nullable primitive: optional properties of this type stay unwrapped
    #[serde(default)]
    pub primitive: bool,
    #[serde(flatten)]
    pub kind: TypeKind,
}

/// How a type is turned into a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Scalar {
        scalar: PrimitiveType,
    },
    Array {
        items: String,
    },
    Map {
        values: String,
    },
    Enum {
        symbols: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Record(RecordDef),
    /// Opaque custom encoding: values are written with exactly this schema
    Custom {
        schema: String,
    },
}

/// Class-level description of a record type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordDef {
    /// Properties in declaration order
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
    /// Explicit schema text replacing the whole type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Named subtypes; a non-empty list makes the type a union of them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaProperty>,
}

/// A single key/value metadata annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaProperty {
    pub key: String,
    pub value: String,
}

/// One property of a record type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    /// Declared type identity
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default)]
    pub optional: bool,
    /// Resolved default; an explicit JSON `null` is a null default, not "no default"
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaProperty>,
    /// No annotations of its own; the schema comes straight from the type's handler
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default)]
    pub overrides: FieldOverrides,
}

/// Per-property override hints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldOverrides {
    /// Explicit schema text, used verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<FixedSize>,
    /// Schema text written by an opaque custom encoder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_encoding: Option<String>,
}

/// Fixed-size override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedSize {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub size: usize,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<DefaultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    DefaultValue::deserialize(deserializer).map(Some)
}

impl TypeDef {
    pub fn new(id: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            id: id.into(),
            name: None,
            namespace: None,
            doc: None,
            aliases: Vec::new(),
            primitive: false,
            kind,
        }
    }

    pub fn scalar(id: impl Into<String>, scalar: PrimitiveType) -> Self {
        Self::new(id, TypeKind::Scalar { scalar })
    }

    pub fn record(id: impl Into<String>, record: RecordDef) -> Self {
        Self::new(id, TypeKind::Record(record))
    }

    pub fn enumeration(id: impl Into<String>, symbols: &[&str]) -> Self {
        Self::new(
            id,
            TypeKind::Enum {
                symbols: symbols.iter().map(|s| s.to_string()).collect(),
                default: None,
            },
        )
    }

    /// Mark as an intrinsic non-nullable primitive
    pub fn primitive(mut self) -> Self {
        self.primitive = true;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Schema name derived from the type, like a class's simple and package names
    pub fn schema_name(&self) -> Result<Name> {
        let (derived_namespace, simple) = match self.id.rsplit_once('.') {
            Some((namespace, simple)) => (Some(namespace), simple),
            None => (None, self.id.as_str()),
        };
        let name = self.name.as_deref().unwrap_or(simple);
        let namespace = self.namespace.as_deref().or(derived_namespace);
        Name::new(name, namespace.map(str::to_string))
    }
}

impl RecordDef {
    pub fn new(properties: Vec<PropertyDescriptor>) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_subtypes(mut self, subtypes: &[&str]) -> Self {
        self.subtypes = subtypes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta = Some(MetaProperty {
            key: key.into(),
            value: value.into(),
        });
        self
    }
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: type_id.into(),
            optional: false,
            default: None,
            doc: None,
            aliases: Vec::new(),
            meta: None,
            synthetic: false,
            overrides: FieldOverrides::default(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta = Some(MetaProperty {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.overrides.schema = Some(schema.into());
        self
    }

    pub fn with_fixed(mut self, name: impl Into<String>, namespace: Option<&str>, size: usize) -> Self {
        self.overrides.fixed = Some(FixedSize {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            size,
        });
        self
    }

    pub fn with_custom_encoding(mut self, schema: impl Into<String>) -> Self {
        self.overrides.custom_encoding = Some(schema.into());
        self
    }
}

// =============================================================================
// Type Catalog
// =============================================================================

/// In-memory object model keyed by type identity
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeDef>,
}

/// On-disk model file: `{"types": [...]}`
#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    types: Vec<TypeDef>,
}

impl TypeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with the scalar types
    ///
    /// Avro names (`string`, `long`, ...) are nullable references; `bool`,
    /// `i32`, `i64`, `f32` and `f64` are intrinsic primitives.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for scalar in [
            PrimitiveType::Null,
            PrimitiveType::Boolean,
            PrimitiveType::Int,
            PrimitiveType::Long,
            PrimitiveType::Float,
            PrimitiveType::Double,
            PrimitiveType::Bytes,
            PrimitiveType::String,
        ] {
            catalog.insert(TypeDef::scalar(scalar.as_str(), scalar));
        }
        for (id, scalar) in [
            ("bool", PrimitiveType::Boolean),
            ("i32", PrimitiveType::Int),
            ("i64", PrimitiveType::Long),
            ("f32", PrimitiveType::Float),
            ("f64", PrimitiveType::Double),
        ] {
            catalog.insert(TypeDef::scalar(id, scalar).primitive());
        }
        catalog
    }

    /// Parse a JSON model file on top of the built-in scalars
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(content)?;
        let mut catalog = Self::with_builtins();
        for def in file.types {
            catalog.insert(def);
        }
        Ok(catalog)
    }

    /// Load a JSON model file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Add or replace a type
    pub fn insert(&mut self, def: TypeDef) -> Option<TypeDef> {
        self.types.insert(def.id.clone(), def)
    }

    pub fn with(mut self, def: TypeDef) -> Self {
        self.insert(def);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ObjectModel for TypeCatalog {
    fn type_def(&self, id: &str) -> Option<&TypeDef> {
        self.types.get(id)
    }
}
