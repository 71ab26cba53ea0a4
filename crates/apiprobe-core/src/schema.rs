//! JSON Schema validation of response payloads

use crate::classify::ClassifiedError;
use crate::error::{Error, Result};
use jsonschema::Validator;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON pointer to the offending value ("" for the document root)
    pub path: String,
    /// Last segment of `path`, or "$" for the root
    pub field: String,
    /// Human readable description
    pub message: String,
}

impl SchemaViolation {
    /// Convert into a schema-kind error
    pub fn into_error(self) -> ClassifiedError {
        ClassifiedError::schema_violation(&self.path, &self.field, self.message)
    }
}

/// A compiled JSON schema
#[derive(Debug)]
pub struct JsonSchema {
    validator: Validator,
}

impl JsonSchema {
    /// Compile a schema from a parsed JSON value
    pub fn from_value(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| Error::schema_compile(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Compile a schema from JSON text
    pub fn from_json_str(schema: &str) -> Result<Self> {
        Self::from_bytes(schema.as_bytes())
    }

    /// Compile a schema from JSON bytes
    pub fn from_bytes(schema: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(schema)?;
        Self::from_value(&value)
    }

    /// Load and compile a schema file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading schema from file: {:?}", path);
        let content = std::fs::read(path)?;
        Self::from_bytes(&content)
    }

    /// Validate a JSON value, returning every violation
    pub fn validate(&self, instance: &Value) -> Vec<SchemaViolation> {
        self.validator
            .iter_errors(instance)
            .map(|e| {
                let path = e.instance_path().to_string();
                SchemaViolation {
                    field: field_name(&path),
                    message: e.to_string(),
                    path,
                }
            })
            .collect()
    }

    /// Validate a raw body; a body that is not JSON is a single root violation
    pub fn validate_bytes(&self, body: &[u8]) -> Vec<SchemaViolation> {
        match serde_json::from_slice::<Value>(body) {
            Ok(instance) => self.validate(&instance),
            Err(e) => vec![SchemaViolation {
                path: String::new(),
                field: "$".to_string(),
                message: format!("body is not valid JSON: {e}"),
            }],
        }
    }
}

fn field_name(path: &str) -> String {
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.replace("~1", "/").replace("~0", "~"),
        _ => "$".to_string(),
    }
}
