//! Avro schema model
//!
//! The record/union/array/map/fixed/enum type algebra the builders produce,
//! plus canonical JSON emission. Schemas are plain values: once a builder
//! hands one out it is never mutated again.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::OutputFormat;
use crate::error::{Result, SchemaError};
use crate::value::DefaultValue;

/// Schema-level metadata properties (`logicalType`, meta annotations, ...)
pub type Props = BTreeMap<String, Value>;

// =============================================================================
// Kinds
// =============================================================================

/// Avro primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveType {
    /// Avro type name
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Bytes => "bytes",
            PrimitiveType::String => "string",
        }
    }

    /// Look up a primitive by its Avro type name
    pub fn from_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "null" => PrimitiveType::Null,
            "boolean" => PrimitiveType::Boolean,
            "int" => PrimitiveType::Int,
            "long" => PrimitiveType::Long,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            "bytes" => PrimitiveType::Bytes,
            "string" => PrimitiveType::String,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn kind(&self) -> SchemaKind {
        match self {
            PrimitiveType::Null => SchemaKind::Null,
            PrimitiveType::Boolean => SchemaKind::Boolean,
            PrimitiveType::Int => SchemaKind::Int,
            PrimitiveType::Long => SchemaKind::Long,
            PrimitiveType::Float => SchemaKind::Float,
            PrimitiveType::Double => SchemaKind::Double,
            PrimitiveType::Bytes => SchemaKind::Bytes,
            PrimitiveType::String => SchemaKind::String,
        }
    }
}

/// Discriminant kind of a schema (the top-level type category)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array,
    Map,
    Record,
    Enum,
    Fixed,
    Union,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Record => "record",
            SchemaKind::Enum => "enum",
            SchemaKind::Fixed => "fixed",
            SchemaKind::Union => "union",
        }
    }

    /// Named kinds are told apart inside a union by full name, not by kind
    pub fn is_named(&self) -> bool {
        matches!(self, SchemaKind::Record | SchemaKind::Enum | SchemaKind::Fixed)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Names
// =============================================================================

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("name pattern is valid"))
}

/// Whether `name` is a valid Avro simple name (also used for enum symbols)
pub fn is_valid_name(name: &str) -> bool {
    name_pattern().is_match(name)
}

/// Name of a record, enum or fixed schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub name: String,
    pub namespace: Option<String>,
}

impl Name {
    /// Create a validated name; an empty namespace means "no namespace"
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Result<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(SchemaError::InvalidName(name));
        }
        let namespace = namespace.filter(|ns| !ns.is_empty());
        if let Some(ns) = &namespace {
            if !ns.split('.').all(is_valid_name) {
                return Err(SchemaError::InvalidName(ns.clone()));
            }
        }
        Ok(Self { name, namespace })
    }

    /// Parse a dotted full name (`com.acme.Order`)
    pub fn parse(fullname: &str) -> Result<Self> {
        match fullname.rsplit_once('.') {
            Some((namespace, name)) => Self::new(name, Some(namespace.to_string())),
            None => Self::new(fullname, None),
        }
    }

    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// An Avro schema
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Primitive(PrimitiveSchema),
    Array(ArraySchema),
    Map(MapSchema),
    Record(RecordSchema),
    Enum(EnumSchema),
    Fixed(FixedSchema),
    Union(UnionSchema),
    /// Reference to a named schema defined elsewhere in the same tree
    Ref(SchemaRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSchema {
    pub kind: PrimitiveType,
    pub props: Props,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Box<Schema>,
    pub props: Props,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapSchema {
    pub values: Box<Schema>,
    pub props: Props,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: Name,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub fields: Vec<Field>,
    pub props: Props,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub name: Name,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub symbols: Vec<String>,
    pub default: Option<String>,
    pub props: Props,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    pub name: Name,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub size: usize,
    pub props: Props,
}

/// Union of branch schemas; construction enforces the branch invariant
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    branches: Vec<Schema>,
    pub props: Props,
}

/// A named schema referenced by name; `kind` is the referenced schema's kind
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRef {
    pub name: Name,
    pub kind: SchemaKind,
}

/// One field of a record schema
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub doc: Option<String>,
    pub default: Option<DefaultValue>,
    pub aliases: Vec<String>,
    pub props: Props,
}

impl Field {
    /// Create a field with no doc, default, aliases or props
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            doc: None,
            default: None,
            aliases: Vec::new(),
            props: Props::new(),
        }
    }
}

impl RecordSchema {
    /// Create an empty record
    pub fn new(name: Name) -> Self {
        Self {
            name,
            doc: None,
            aliases: Vec::new(),
            fields: Vec::new(),
            props: Props::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl EnumSchema {
    /// Create an enum; symbols must be valid, distinct names and the default one of them
    pub fn new(name: Name, symbols: Vec<String>, default: Option<String>) -> Result<Self> {
        let invalid = |message: String| SchemaError::InvalidEnum {
            name: name.fullname(),
            message,
        };
        let mut seen = HashSet::new();
        for symbol in &symbols {
            if !is_valid_name(symbol) {
                return Err(invalid(format!("invalid symbol '{}'", symbol)));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(invalid(format!("duplicate symbol '{}'", symbol)));
            }
        }
        if let Some(default) = &default {
            if !seen.contains(default.as_str()) {
                return Err(invalid(format!("default '{}' is not a symbol", default)));
            }
        }
        Ok(Self {
            name,
            doc: None,
            aliases: Vec::new(),
            symbols,
            default,
            props: Props::new(),
        })
    }
}

impl FixedSchema {
    pub fn new(name: Name, size: usize) -> Self {
        Self {
            name,
            doc: None,
            aliases: Vec::new(),
            size,
            props: Props::new(),
        }
    }
}

impl UnionSchema {
    /// Create a union, rejecting nested unions and duplicate branch kinds
    pub fn new(branches: Vec<Schema>) -> Result<Self> {
        check_branches(&branches)?;
        Ok(Self {
            branches,
            props: Props::new(),
        })
    }

    pub fn branches(&self) -> &[Schema] {
        &self.branches
    }

    pub fn into_branches(self) -> Vec<Schema> {
        self.branches
    }

    /// Index of the first branch of the given kind
    pub fn position(&self, kind: SchemaKind) -> Option<usize> {
        self.branches.iter().position(|b| b.kind() == kind)
    }

    pub fn contains(&self, kind: SchemaKind) -> bool {
        self.position(kind).is_some()
    }

    /// Append a branch, re-checking the invariant
    pub fn push(&mut self, branch: Schema) -> Result<()> {
        self.branches.push(branch);
        if let Err(err) = check_branches(&self.branches) {
            self.branches.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Move the branch at `index` to the front; other branches keep their relative order
    pub fn promote(mut self, index: usize) -> Self {
        if index > 0 && index < self.branches.len() {
            let branch = self.branches.remove(index);
            self.branches.insert(0, branch);
        }
        self
    }
}

fn check_branches(branches: &[Schema]) -> Result<()> {
    let mut kinds = HashSet::new();
    let mut names = HashSet::new();
    for branch in branches {
        match branch.name() {
            Some(name) => {
                if !names.insert(name.fullname()) {
                    return Err(SchemaError::UnionInvariant(format!(
                        "duplicate branch '{}'",
                        name
                    )));
                }
            }
            None => {
                let kind = branch.kind();
                if kind == SchemaKind::Union {
                    return Err(SchemaError::UnionInvariant(
                        "unions may not directly contain unions".to_string(),
                    ));
                }
                if !kinds.insert(kind) {
                    return Err(SchemaError::UnionInvariant(format!(
                        "duplicate '{}' branch",
                        kind
                    )));
                }
            }
        }
    }
    Ok(())
}

impl Schema {
    pub fn primitive(kind: PrimitiveType) -> Self {
        Schema::Primitive(PrimitiveSchema {
            kind,
            props: Props::new(),
        })
    }

    pub fn null() -> Self {
        Self::primitive(PrimitiveType::Null)
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(ArraySchema {
            items: Box::new(items),
            props: Props::new(),
        })
    }

    pub fn map(values: Schema) -> Self {
        Schema::Map(MapSchema {
            values: Box::new(values),
            props: Props::new(),
        })
    }

    /// Discriminant kind; a reference reports the kind of what it names
    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Primitive(p) => p.kind.kind(),
            Schema::Array(_) => SchemaKind::Array,
            Schema::Map(_) => SchemaKind::Map,
            Schema::Record(_) => SchemaKind::Record,
            Schema::Enum(_) => SchemaKind::Enum,
            Schema::Fixed(_) => SchemaKind::Fixed,
            Schema::Union(_) => SchemaKind::Union,
            Schema::Ref(r) => r.kind,
        }
    }

    /// Name of a named schema (record, enum, fixed or a reference to one)
    pub fn name(&self) -> Option<&Name> {
        match self {
            Schema::Record(r) => Some(&r.name),
            Schema::Enum(e) => Some(&e.name),
            Schema::Fixed(f) => Some(&f.name),
            Schema::Ref(r) => Some(&r.name),
            _ => None,
        }
    }

    /// Schema-level properties; references carry none
    pub fn props(&self) -> Option<&Props> {
        match self {
            Schema::Primitive(p) => Some(&p.props),
            Schema::Array(a) => Some(&a.props),
            Schema::Map(m) => Some(&m.props),
            Schema::Record(r) => Some(&r.props),
            Schema::Enum(e) => Some(&e.props),
            Schema::Fixed(f) => Some(&f.props),
            Schema::Union(u) => Some(&u.props),
            Schema::Ref(_) => None,
        }
    }

    pub fn props_mut(&mut self) -> Option<&mut Props> {
        match self {
            Schema::Primitive(p) => Some(&mut p.props),
            Schema::Array(a) => Some(&mut a.props),
            Schema::Map(m) => Some(&mut m.props),
            Schema::Record(r) => Some(&mut r.props),
            Schema::Enum(e) => Some(&mut e.props),
            Schema::Fixed(f) => Some(&mut f.props),
            Schema::Union(u) => Some(&mut u.props),
            Schema::Ref(_) => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionSchema> {
        match self {
            Schema::Union(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordSchema> {
        match self {
            Schema::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Whether this is a union with a null branch
    pub fn is_nullable_union(&self) -> bool {
        self.as_union().is_some_and(|u| u.contains(SchemaKind::Null))
    }

    /// Whether a value of this schema may be null
    pub fn is_nullable(&self) -> bool {
        self.kind() == SchemaKind::Null || self.is_nullable_union()
    }

    /// What a later use of the same type should see: a name for named schemas
    pub fn to_reference(&self) -> Schema {
        match self {
            Schema::Record(_) | Schema::Enum(_) | Schema::Fixed(_) => match self.name() {
                Some(name) => Schema::Ref(SchemaRef {
                    name: name.clone(),
                    kind: self.kind(),
                }),
                None => self.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Canonical Avro JSON for this schema
    pub fn to_json(&self) -> Value {
        Emitter::new(self).emit(self)
    }

    /// Canonical Avro JSON text
    pub fn to_json_string(&self, format: OutputFormat) -> Result<String> {
        let value = self.to_json();
        let text = match format {
            OutputFormat::Pretty => serde_json::to_string_pretty(&value)?,
            OutputFormat::Compact => serde_json::to_string(&value)?,
        };
        Ok(text)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

// =============================================================================
// Emission
// =============================================================================

/// Writes each named schema once; later occurrences become its full name.
///
/// A reference reached before its definition (possible when the in-progress
/// record was handed out during a cycle) inlines the definition found
/// elsewhere in the tree.
///
/// Avro resolves a dotless name against the enclosing namespace, so a type
/// without a namespace is defined with `"namespace": ""` inside a namespaced
/// record, and a later use there repeats the definition: no reference text
/// resolves to the null namespace from such a position.
struct Emitter<'a> {
    definitions: HashMap<String, &'a Schema>,
    emitted: HashSet<String>,
    /// Records whose fields are being written
    open: HashSet<String>,
    /// Namespace of the innermost record being written
    namespace: Option<String>,
}

impl<'a> Emitter<'a> {
    fn new(root: &'a Schema) -> Self {
        let mut emitter = Self {
            definitions: HashMap::new(),
            emitted: HashSet::new(),
            open: HashSet::new(),
            namespace: None,
        };
        emitter.collect(root);
        emitter
    }

    fn collect(&mut self, schema: &'a Schema) {
        match schema {
            Schema::Record(r) => {
                if self.definitions.contains_key(&r.name.fullname()) {
                    return;
                }
                self.definitions.insert(r.name.fullname(), schema);
                for field in &r.fields {
                    self.collect(&field.schema);
                }
            }
            Schema::Enum(e) => {
                self.definitions.entry(e.name.fullname()).or_insert(schema);
            }
            Schema::Fixed(f) => {
                self.definitions.entry(f.name.fullname()).or_insert(schema);
            }
            Schema::Array(a) => self.collect(&a.items),
            Schema::Map(m) => self.collect(&m.values),
            Schema::Union(u) => {
                for branch in u.branches() {
                    self.collect(branch);
                }
            }
            Schema::Primitive(_) | Schema::Ref(_) => {}
        }
    }

    /// Whether the full name of `name`, written here, resolves back to it
    fn resolves_by_name(&self, name: &Name) -> bool {
        name.namespace.is_some() || self.namespace.is_none()
    }

    /// Name text for an already emitted type, or `None` if it must be defined here
    fn reference(&self, name: &Name) -> Option<Value> {
        let fullname = name.fullname();
        if !self.emitted.contains(&fullname) {
            return None;
        }
        // An open record cannot be repeated; its name is the closest there is
        if self.resolves_by_name(name) || self.open.contains(&fullname) {
            Some(Value::String(fullname))
        } else {
            None
        }
    }

    fn emit(&mut self, schema: &'a Schema) -> Value {
        match schema {
            Schema::Primitive(p) => {
                if p.props.is_empty() {
                    return Value::String(p.kind.as_str().to_string());
                }
                let mut object = Map::new();
                object.insert("type".into(), Value::from(p.kind.as_str()));
                append_props(&mut object, &p.props);
                Value::Object(object)
            }
            Schema::Array(a) => {
                let mut object = Map::new();
                object.insert("type".into(), Value::from("array"));
                object.insert("items".into(), self.emit(&a.items));
                append_props(&mut object, &a.props);
                Value::Object(object)
            }
            Schema::Map(m) => {
                let mut object = Map::new();
                object.insert("type".into(), Value::from("map"));
                object.insert("values".into(), self.emit(&m.values));
                append_props(&mut object, &m.props);
                Value::Object(object)
            }
            Schema::Union(u) => Value::Array(u.branches().iter().map(|b| self.emit(b)).collect()),
            Schema::Record(r) => {
                if let Some(reference) = self.reference(&r.name) {
                    return reference;
                }
                self.emitted.insert(r.name.fullname());
                self.emit_record(r)
            }
            Schema::Enum(e) => {
                if let Some(reference) = self.reference(&e.name) {
                    return reference;
                }
                self.emitted.insert(e.name.fullname());
                let mut object = self.named_header("enum", &e.name, e.doc.as_deref(), &e.aliases);
                object.insert("symbols".into(), Value::from(e.symbols.clone()));
                if let Some(default) = &e.default {
                    object.insert("default".into(), Value::from(default.as_str()));
                }
                append_props(&mut object, &e.props);
                Value::Object(object)
            }
            Schema::Fixed(f) => {
                if let Some(reference) = self.reference(&f.name) {
                    return reference;
                }
                self.emitted.insert(f.name.fullname());
                let mut object = self.named_header("fixed", &f.name, f.doc.as_deref(), &f.aliases);
                object.insert("size".into(), Value::from(f.size));
                append_props(&mut object, &f.props);
                Value::Object(object)
            }
            Schema::Ref(r) => {
                let fullname = r.name.fullname();
                match self.definitions.get(&fullname).copied() {
                    Some(definition) => self.emit(definition),
                    None => Value::String(fullname),
                }
            }
        }
    }

    fn emit_record(&mut self, record: &'a RecordSchema) -> Value {
        let fullname = record.name.fullname();
        let mut object =
            self.named_header("record", &record.name, record.doc.as_deref(), &record.aliases);

        self.open.insert(fullname.clone());
        let enclosing = std::mem::replace(&mut self.namespace, record.name.namespace.clone());
        let fields: Vec<Value> = record.fields.iter().map(|f| self.emit_field(f)).collect();
        self.namespace = enclosing;
        self.open.remove(&fullname);

        object.insert("fields".into(), Value::Array(fields));
        append_props(&mut object, &record.props);
        Value::Object(object)
    }

    fn emit_field(&mut self, field: &'a Field) -> Value {
        let mut object = Map::new();
        object.insert("name".into(), Value::from(field.name.as_str()));
        object.insert("type".into(), self.emit(&field.schema));
        if let Some(doc) = &field.doc {
            object.insert("doc".into(), Value::from(doc.as_str()));
        }
        if let Some(default) = &field.default {
            object.insert("default".into(), default.to_json());
        }
        if !field.aliases.is_empty() {
            object.insert("aliases".into(), Value::from(field.aliases.clone()));
        }
        append_props(&mut object, &field.props);
        Value::Object(object)
    }

    fn named_header(
        &self,
        kind: &str,
        name: &Name,
        doc: Option<&str>,
        aliases: &[String],
    ) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert("type".into(), Value::from(kind));
        object.insert("name".into(), Value::from(name.name.as_str()));
        match (&name.namespace, &self.namespace) {
            (Some(ns), _) => {
                object.insert("namespace".into(), Value::from(ns.as_str()));
            }
            // Opt out of the enclosing namespace
            (None, Some(_)) => {
                object.insert("namespace".into(), Value::from(""));
            }
            (None, None) => {}
        }
        if let Some(doc) = doc {
            object.insert("doc".into(), Value::from(doc));
        }
        if !aliases.is_empty() {
            object.insert("aliases".into(), Value::from(aliases.to_vec()));
        }
        object
    }
}

// Reserved attributes win over props of the same key
fn append_props(object: &mut Map<String, Value>, props: &Props) {
    for (key, value) in props {
        object.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, fields: Vec<Field>) -> Schema {
        let mut record = RecordSchema::new(Name::parse(name).unwrap());
        record.fields = fields;
        Schema::Record(record)
    }

    #[test]
    fn test_name_parsing() {
        let name = Name::parse("com.acme.Order").unwrap();
        assert_eq!(name.name, "Order");
        assert_eq!(name.namespace.as_deref(), Some("com.acme"));
        assert_eq!(name.fullname(), "com.acme.Order");

        assert!(Name::parse("Order").unwrap().namespace.is_none());
        assert!(matches!(Name::parse("com.acme.9Lives"), Err(SchemaError::InvalidName(_))));
        assert!(matches!(Name::new("Order", Some("com..acme".into())), Err(SchemaError::InvalidName(_))));
    }

    #[test]
    fn test_enum_symbols_checked() {
        let name = || Name::parse("com.acme.Color").unwrap();
        let symbols = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let color = EnumSchema::new(name(), symbols(&["RED", "BLUE"]), Some("RED".into())).unwrap();
        assert_eq!(color.default.as_deref(), Some("RED"));
        assert!(matches!(
            EnumSchema::new(name(), symbols(&["RED", "dark-blue"]), None),
            Err(SchemaError::InvalidEnum { .. })
        ));
        assert!(matches!(
            EnumSchema::new(name(), symbols(&["RED", "RED"]), None),
            Err(SchemaError::InvalidEnum { .. })
        ));
        assert!(matches!(
            EnumSchema::new(name(), symbols(&["RED"]), Some("GREEN".into())),
            Err(SchemaError::InvalidEnum { .. })
        ));
    }

    #[test]
    fn test_union_rejects_duplicate_kinds() {
        let result = UnionSchema::new(vec![
            Schema::primitive(PrimitiveType::Long),
            Schema::null(),
            Schema::primitive(PrimitiveType::Long),
        ]);
        assert!(matches!(result, Err(SchemaError::UnionInvariant(_))));
    }

    #[test]
    fn test_union_accepts_distinct_records() {
        let union = UnionSchema::new(vec![
            record("com.acme.Cat", vec![]),
            record("com.acme.Dog", vec![]),
        ])
        .unwrap();
        assert_eq!(union.branches().len(), 2);
        assert_eq!(union.position(SchemaKind::Record), Some(0));
    }

    #[test]
    fn test_union_rejects_nested_union() {
        let inner = Schema::Union(UnionSchema::new(vec![Schema::null()]).unwrap());
        assert!(UnionSchema::new(vec![inner]).is_err());
    }

    #[test]
    fn test_promote_keeps_relative_order() {
        let union = UnionSchema::new(vec![
            Schema::null(),
            Schema::primitive(PrimitiveType::String),
            Schema::primitive(PrimitiveType::Long),
        ])
        .unwrap()
        .promote(2);
        let kinds: Vec<_> = union.branches().iter().map(Schema::kind).collect();
        assert_eq!(kinds, vec![SchemaKind::Long, SchemaKind::Null, SchemaKind::String]);
    }

    #[test]
    fn test_emit_record_with_field_details() {
        let mut field = Field::new(
            "count",
            Schema::Union(
                UnionSchema::new(vec![Schema::primitive(PrimitiveType::Long), Schema::null()]).unwrap(),
            ),
        );
        field.doc = Some("How many".into());
        field.default = Some(DefaultValue::from(5i64));
        field.aliases.push("cnt".into());
        field.props.insert("unit".into(), json!("items"));

        let schema = record("com.acme.Tally", vec![field]);
        assert_eq!(
            schema.to_json(),
            json!({
                "type": "record",
                "name": "Tally",
                "namespace": "com.acme",
                "fields": [{
                    "name": "count",
                    "type": ["long", "null"],
                    "doc": "How many",
                    "default": 5,
                    "aliases": ["cnt"],
                    "unit": "items"
                }]
            })
        );
    }

    #[test]
    fn test_emit_named_type_once() {
        let point = record("Point", vec![Field::new("x", Schema::primitive(PrimitiveType::Int))]);
        let schema = record(
            "Segment",
            vec![Field::new("from", point.clone()), Field::new("to", point.to_reference())],
        );
        let json = schema.to_json();
        assert_eq!(json["fields"][0]["type"]["type"], json!("record"));
        assert_eq!(json["fields"][1]["type"], json!("Point"));
    }

    #[test]
    fn test_emit_reference_before_definition_inlines() {
        let point = record("Point", vec![Field::new("x", Schema::primitive(PrimitiveType::Int))]);
        let schema = record(
            "Segment",
            vec![Field::new("from", point.to_reference()), Field::new("to", point)],
        );
        let json = schema.to_json();
        assert_eq!(json["fields"][0]["type"]["name"], json!("Point"));
        assert_eq!(json["fields"][1]["type"], json!("Point"));
    }

    #[test]
    fn test_emit_keeps_null_namespace_inside_namespaced_record() {
        let point = record("Point", vec![Field::new("x", Schema::primitive(PrimitiveType::Int))]);
        let schema = record(
            "com.acme.Segment",
            vec![Field::new("from", point.clone()), Field::new("to", point.to_reference())],
        );
        let json = schema.to_json();
        assert_eq!(json["fields"][0]["type"]["namespace"], json!(""));
        // A bare "Point" here would mean com.acme.Point
        assert_eq!(json["fields"][1]["type"]["name"], json!("Point"));
        assert_eq!(json["fields"][1]["type"]["namespace"], json!(""));

        let canonical = apache_avro::Schema::parse(&json).unwrap().canonical_form();
        assert!(canonical.contains(r#""name":"Point""#));
        assert!(!canonical.contains("com.acme.Point"));
    }

    #[test]
    fn test_emit_namespaced_reference_inside_other_namespace() {
        let point = record("geo.Point", vec![Field::new("x", Schema::primitive(PrimitiveType::Int))]);
        let schema = record(
            "com.acme.Segment",
            vec![Field::new("from", point.clone()), Field::new("to", point.to_reference())],
        );
        let json = schema.to_json();
        assert_eq!(json["fields"][0]["type"]["namespace"], json!("geo"));
        assert_eq!(json["fields"][1]["type"], json!("geo.Point"));
        assert!(apache_avro::Schema::parse(&json).is_ok());
    }

    #[test]
    fn test_primitive_props_emit_object_form() {
        let mut schema = Schema::primitive(PrimitiveType::Long);
        schema
            .props_mut()
            .unwrap()
            .insert("logicalType".into(), json!("timestamp-millis"));
        assert_eq!(schema.to_json(), json!({"type": "long", "logicalType": "timestamp-millis"}));
        assert_eq!(Schema::null().to_json(), json!("null"));
    }

    #[test]
    fn test_to_reference_only_for_named() {
        let point = record("Point", vec![]);
        assert!(matches!(point.to_reference(), Schema::Ref(SchemaRef { kind: SchemaKind::Record, .. })));
        let long = Schema::primitive(PrimitiveType::Long);
        assert_eq!(long.to_reference(), long);
    }
}
