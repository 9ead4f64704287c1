//! Schema fingerprints

use sha2::{Digest, Sha256};
use std::fmt;

use crate::schema::Schema;

/// SHA256 fingerprint of a schema's compact canonical JSON
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a schema
    pub fn of(schema: &Schema) -> Self {
        Self::from_bytes(schema.to_json().to_string().as_bytes())
    }

    /// Compute a fingerprint from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `schema` has this fingerprint
    pub fn matches(&self, schema: &Schema) -> bool {
        *self == Self::of(schema)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;
    use crate::schema::PrimitiveType;

    #[test]
    fn test_fingerprint_consistency() {
        let schema = parse_schema(r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#, "t").unwrap();
        assert_eq!(Fingerprint::of(&schema), Fingerprint::of(&schema.clone()));
        assert_eq!(Fingerprint::of(&schema).as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_different_schemas() {
        let int = Schema::primitive(PrimitiveType::Int);
        let long = Schema::primitive(PrimitiveType::Long);
        assert_ne!(Fingerprint::of(&int), Fingerprint::of(&long));
    }

    #[test]
    fn test_fingerprint_verification() {
        let schema = Schema::primitive(PrimitiveType::String);
        let fingerprint = Fingerprint::of(&schema);
        assert!(fingerprint.matches(&schema));
        assert!(!fingerprint.matches(&Schema::null()));
    }
}
