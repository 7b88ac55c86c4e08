use ahash::AHashSet;
use anyhow::{bail, Result};

use crate::types::FieldValue;

/// One declared output field and the default used when a record has no
/// matching tabular row.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub default: FieldValue,
}

impl FieldSpec {
    /// Count/sum field, default 0.
    pub fn int(name: &str) -> Self {
        Self { name: name.to_string(), default: FieldValue::Int(0) }
    }

    /// Average/rate field, default 0.0.
    pub fn float(name: &str) -> Self {
        Self { name: name.to_string(), default: FieldValue::Float(0.0) }
    }

    /// Name/label field, default empty string.
    pub fn str(name: &str) -> Self {
        Self { name: name.to_string(), default: FieldValue::Str(String::new()) }
    }
}

/// The set of fields the join copies from a matched row onto each record.
///
/// Validated once, at pipeline construction; per-record column presence
/// checks are replaced by this schema.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    specs: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn new(specs: Vec<FieldSpec>) -> Result<Self> {
        let mut seen = AHashSet::new();
        for spec in &specs {
            if spec.name.is_empty() {
                bail!("schema field names cannot be empty");
            }
            if !seen.insert(spec.name.as_str()) {
                bail!("duplicate field in schema: {}", spec.name);
            }
            if matches!(spec.default, FieldValue::Null) {
                bail!("field '{}' needs a concrete default", spec.name);
            }
        }
        Ok(Self { specs })
    }

    #[inline] pub fn specs(&self) -> &[FieldSpec] { &self.specs }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|spec| spec.name == name)
    }
}
