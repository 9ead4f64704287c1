//! Override schema parser
//!
//! Turns explicit schema text (from a type or property annotation, or a
//! custom encoder) into the schema model. Errors name the type or property
//! the text came from.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::schema::{
    is_valid_name, ArraySchema, EnumSchema, Field, FixedSchema, MapSchema, Name, PrimitiveSchema,
    PrimitiveType, Props, RecordSchema, Schema, SchemaKind, SchemaRef, UnionSchema,
};
use crate::value::DefaultValue;

const RECORD_ATTRIBUTES: &[&str] = &["type", "name", "namespace", "doc", "aliases", "fields"];
const FIELD_ATTRIBUTES: &[&str] = &["name", "type", "doc", "default", "aliases", "order"];
const ENUM_ATTRIBUTES: &[&str] = &["type", "name", "namespace", "doc", "aliases", "symbols", "default"];
const FIXED_ATTRIBUTES: &[&str] = &["type", "name", "namespace", "doc", "aliases", "size"];

/// Parse schema text; `target` names where the text came from (for errors)
pub fn parse_schema(text: &str, target: &str) -> Result<Schema> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SchemaError::override_parse(target, format!("malformed JSON: {}", e)))?;
    parse_schema_value(&value, target)
}

/// Parse an already-decoded JSON schema
pub fn parse_schema_value(value: &Value, target: &str) -> Result<Schema> {
    SchemaParser {
        target,
        defined: HashMap::new(),
    }
    .parse(value, None)
}

struct SchemaParser<'t> {
    target: &'t str,
    /// Named types seen so far, by full name
    defined: HashMap<String, SchemaKind>,
}

impl SchemaParser<'_> {
    fn error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::override_parse(self.target, message)
    }

    fn parse(&mut self, value: &Value, namespace: Option<&str>) -> Result<Schema> {
        match value {
            Value::String(name) => self.parse_type_name(name, namespace),
            Value::Array(branches) => {
                let branches = branches
                    .iter()
                    .map(|b| self.parse(b, namespace))
                    .collect::<Result<Vec<_>>>()?;
                let union = UnionSchema::new(branches).map_err(|e| self.error(e.to_string()))?;
                Ok(Schema::Union(union))
            }
            Value::Object(object) => self.parse_object(object, namespace),
            other => Err(self.error(format!("not a schema: {}", other))),
        }
    }

    fn parse_type_name(&self, name: &str, namespace: Option<&str>) -> Result<Schema> {
        if let Some(primitive) = PrimitiveType::from_name(name) {
            return Ok(Schema::primitive(primitive));
        }
        let mut candidates = Vec::with_capacity(2);
        if let (false, Some(ns)) = (name.contains('.'), namespace) {
            candidates.push(format!("{}.{}", ns, name));
        }
        candidates.push(name.to_string());

        for fullname in candidates {
            if let Some(kind) = self.defined.get(&fullname) {
                let name = Name::parse(&fullname).map_err(|e| self.error(e.to_string()))?;
                return Ok(Schema::Ref(SchemaRef { name, kind: *kind }));
            }
        }
        Err(self.error(format!("unknown type '{}'", name)))
    }

    fn parse_object(&mut self, object: &Map<String, Value>, namespace: Option<&str>) -> Result<Schema> {
        let type_name = match object.get("type") {
            Some(Value::String(type_name)) => type_name.as_str(),
            Some(other) => return Err(self.error(format!("'type' must be a string, got {}", other))),
            None => return Err(self.error("missing 'type'")),
        };

        match type_name {
            "record" | "error" => self.parse_record(object, namespace),
            "enum" => self.parse_enum(object, namespace),
            "fixed" => self.parse_fixed(object, namespace),
            "array" => {
                let items = object
                    .get("items")
                    .ok_or_else(|| self.error("array schema missing 'items'"))?;
                Ok(Schema::Array(ArraySchema {
                    items: Box::new(self.parse(items, namespace)?),
                    props: extra_props(object, &["type", "items"]),
                }))
            }
            "map" => {
                let values = object
                    .get("values")
                    .ok_or_else(|| self.error("map schema missing 'values'"))?;
                Ok(Schema::Map(MapSchema {
                    values: Box::new(self.parse(values, namespace)?),
                    props: extra_props(object, &["type", "values"]),
                }))
            }
            other => match PrimitiveType::from_name(other) {
                Some(kind) => Ok(Schema::Primitive(PrimitiveSchema {
                    kind,
                    props: extra_props(object, &["type"]),
                })),
                None => self.parse_type_name(other, namespace),
            },
        }
    }

    fn parse_name(&self, object: &Map<String, Value>, namespace: Option<&str>) -> Result<Name> {
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| self.error("named schema missing 'name'"))?;
        let name = if name.contains('.') {
            Name::parse(name)
        } else {
            let namespace = object
                .get("namespace")
                .and_then(Value::as_str)
                .or(namespace)
                .map(str::to_string);
            Name::new(name, namespace)
        };
        name.map_err(|e| self.error(e.to_string()))
    }

    fn define(&mut self, name: &Name, kind: SchemaKind) -> Result<()> {
        let fullname = name.fullname();
        if self.defined.insert(fullname.clone(), kind).is_some() {
            return Err(self.error(format!("'{}' is defined twice", fullname)));
        }
        Ok(())
    }

    fn parse_record(&mut self, object: &Map<String, Value>, namespace: Option<&str>) -> Result<Schema> {
        let name = self.parse_name(object, namespace)?;
        // Known before its fields, so fields may refer back to it
        self.define(&name, SchemaKind::Record)?;

        let fields = object
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| self.error(format!("record '{}' missing 'fields'", name)))?;

        let mut record = RecordSchema::new(name.clone());
        record.doc = string_attr(object, "doc");
        record.aliases = self.string_list(object, "aliases")?;
        record.props = extra_props(object, RECORD_ATTRIBUTES);

        let mut seen = HashSet::new();
        for field in fields {
            let field = self.parse_field(field, name.namespace.as_deref())?;
            if !seen.insert(field.name.clone()) {
                return Err(self.error(format!("duplicate field '{}' in record '{}'", field.name, name)));
            }
            record.fields.push(field);
        }
        Ok(Schema::Record(record))
    }

    fn parse_field(&mut self, value: &Value, namespace: Option<&str>) -> Result<Field> {
        let object = value
            .as_object()
            .ok_or_else(|| self.error(format!("field must be an object, got {}", value)))?;
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| self.error("field missing 'name'"))?;
        if !is_valid_name(name) {
            return Err(self.error(format!("invalid field name '{}'", name)));
        }
        let schema = object
            .get("type")
            .ok_or_else(|| self.error(format!("field '{}' missing 'type'", name)))?;

        let mut field = Field::new(name, self.parse(schema, namespace)?);
        field.doc = string_attr(object, "doc");
        field.default = object.get("default").cloned().map(DefaultValue::from);
        field.aliases = self.string_list(object, "aliases")?;
        field.props = extra_props(object, FIELD_ATTRIBUTES);
        Ok(field)
    }

    fn parse_enum(&mut self, object: &Map<String, Value>, namespace: Option<&str>) -> Result<Schema> {
        let name = self.parse_name(object, namespace)?;
        if object.get("symbols").and_then(Value::as_array).is_none() {
            return Err(self.error(format!("enum '{}' missing 'symbols'", name)));
        }
        let symbols = self.string_list(object, "symbols")?;
        let mut schema = EnumSchema::new(name.clone(), symbols, string_attr(object, "default"))
            .map_err(|e| self.error(e.to_string()))?;
        self.define(&name, SchemaKind::Enum)?;

        schema.doc = string_attr(object, "doc");
        schema.aliases = self.string_list(object, "aliases")?;
        schema.props = extra_props(object, ENUM_ATTRIBUTES);
        Ok(Schema::Enum(schema))
    }

    fn parse_fixed(&mut self, object: &Map<String, Value>, namespace: Option<&str>) -> Result<Schema> {
        let name = self.parse_name(object, namespace)?;
        let size = object
            .get("size")
            .and_then(Value::as_u64)
            .ok_or_else(|| self.error(format!("fixed '{}' missing a non-negative 'size'", name)))?;
        self.define(&name, SchemaKind::Fixed)?;

        let mut fixed = FixedSchema::new(name, size as usize);
        fixed.doc = string_attr(object, "doc");
        fixed.aliases = self.string_list(object, "aliases")?;
        fixed.props = extra_props(object, FIXED_ATTRIBUTES);
        Ok(Schema::Fixed(fixed))
    }

    fn string_list(&self, object: &Map<String, Value>, key: &str) -> Result<Vec<String>> {
        let Some(value) = object.get(key) else {
            return Ok(Vec::new());
        };
        value
            .as_array()
            .and_then(|items| items.iter().map(|v| v.as_str().map(str::to_string)).collect())
            .ok_or_else(|| self.error(format!("'{}' must be an array of strings", key)))
    }
}

fn string_attr(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn extra_props(object: &Map<String, Value>, reserved: &[&str]) -> Props {
    object
        .iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_primitive_forms() {
        assert_eq!(parse_schema(r#""string""#, "t").unwrap(), Schema::primitive(PrimitiveType::String));
        assert_eq!(
            parse_schema(r#"{"type":"string"}"#, "t").unwrap(),
            Schema::primitive(PrimitiveType::String)
        );

        let logical = parse_schema(r#"{"type":"long","logicalType":"timestamp-millis"}"#, "t").unwrap();
        assert_eq!(logical.kind(), SchemaKind::Long);
        assert_eq!(logical.props().unwrap()["logicalType"], json!("timestamp-millis"));
    }

    #[test]
    fn test_parse_record_with_self_reference() {
        let schema = parse_schema(
            r#"{
                "type": "record",
                "name": "Node",
                "namespace": "com.acme",
                "doc": "A list node",
                "fields": [
                    {"name": "value", "type": "int", "default": 0},
                    {"name": "next", "type": ["null", "Node"], "default": null, "aliases": ["tail"]}
                ]
            }"#,
            "type 'com.acme.Node'",
        )
        .unwrap();

        let record = schema.as_record().unwrap();
        assert_eq!(record.name.fullname(), "com.acme.Node");
        assert_eq!(record.doc.as_deref(), Some("A list node"));
        assert_eq!(record.fields.len(), 2);

        let next = record.field("next").unwrap();
        assert_eq!(next.default, Some(DefaultValue::Null));
        assert_eq!(next.aliases, vec!["tail".to_string()]);
        match &next.schema.as_union().unwrap().branches()[1] {
            Schema::Ref(r) => assert_eq!(r.name.fullname(), "com.acme.Node"),
            other => panic!("Expected Ref, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_enum_fixed_array_map() {
        let schema = parse_schema(
            r#"{
                "type": "record", "name": "Blob", "fields": [
                    {"name": "color", "type": {"type": "enum", "name": "Color", "symbols": ["RED", "GREEN"]}},
                    {"name": "hash", "type": {"type": "fixed", "name": "Md5", "size": 16}},
                    {"name": "tags", "type": {"type": "array", "items": "string"}},
                    {"name": "attrs", "type": {"type": "map", "values": "Color"}}
                ]
            }"#,
            "t",
        )
        .unwrap();
        let record = schema.as_record().unwrap();
        let kinds: Vec<_> = record.fields.iter().map(|f| f.schema.kind()).collect();
        assert_eq!(
            kinds,
            vec![SchemaKind::Enum, SchemaKind::Fixed, SchemaKind::Array, SchemaKind::Map]
        );
    }

    #[test]
    fn test_field_props_are_kept() {
        let schema = parse_schema(
            r#"{"type":"record","name":"R","owner":"billing","fields":[{"name":"a","type":"int","unit":"ms"}]}"#,
            "t",
        )
        .unwrap();
        let record = schema.as_record().unwrap();
        assert_eq!(record.props["owner"], json!("billing"));
        assert_eq!(record.fields[0].props["unit"], json!("ms"));
    }

    #[test]
    fn test_parse_errors_name_target() {
        let err = parse_schema("{not json", "property 'Order.id'").unwrap_err();
        assert!(matches!(err, SchemaError::SchemaOverrideParse { .. }));
        assert!(err.to_string().contains("Order.id"));

        assert!(parse_schema(r#""strng""#, "t").is_err());
        assert!(parse_schema(r#"{"type":"record","name":"R"}"#, "t").is_err());
        assert!(parse_schema(r#"{"type":"fixed","name":"F"}"#, "t").is_err());
        assert!(parse_schema(r#"["int","int"]"#, "t").is_err());
        assert!(parse_schema(r#"{"type":"enum","name":"E","symbols":["A","A"]}"#, "t").is_err());
        let err = parse_schema(r#"{"type":"enum","name":"E","symbols":["A"],"default":"B"}"#, "t").unwrap_err();
        assert!(matches!(err, SchemaError::SchemaOverrideParse { .. }));
        assert!(parse_schema(
            r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"},{"name":"a","type":"long"}]}"#,
            "t"
        )
        .is_err());
    }
}
