//! Chip register metadata, keyed by `PERIPHERAL.REGISTER.FIELD`.
//!
//! The table is static lookup data: it is parsed once (usually from a
//! `.regmap.toml` file), validated, wrapped in an `Arc` and shared by every
//! model built for the part. Nothing in the engine mutates it.
//!
//! ```toml
//! part = "reference-A0"
//!
//! [fields."MODEM.CTRL0.MODFORMAT"]
//! address = 0x4008_6000
//! bit-offset = 4
//! bit-width = 3
//! access = "read-write"
//! reset = 0
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Register field access mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

/// Placement and reset value of one register field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldInfo {
    /// Byte address of the containing 32-bit register.
    pub address: u32,
    pub bit_offset: u8,
    pub bit_width: u8,
    #[serde(default)]
    pub access: AccessMode,
    #[serde(default)]
    pub reset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldInfo {
    /// Largest value the field can hold.
    pub fn max_value(&self) -> u64 {
        if self.bit_width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bit_width) - 1
        }
    }

    /// Bit mask of the field inside its register.
    pub fn mask(&self) -> u64 {
        self.max_value() << self.bit_offset
    }
}

/// A validation issue found in a register map.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    pub message: String,
}

/// Immutable register metadata for one part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMap {
    pub part: String,
    #[serde(default)]
    fields: IndexMap<String, FieldInfo>,
}

/// `MODEM.CTRL0.MODFORMAT` -> `MODEM_CTRL0_MODFORMAT`.
pub fn field_key_to_var_name(key: &str) -> String {
    key.replace('.', "_")
}

impl RegisterMap {
    pub fn new(part: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field, replacing any previous entry with the same key.
    pub fn with_field(mut self, key: impl Into<String>, info: FieldInfo) -> Self {
        self.fields.insert(key.into(), info);
        self
    }

    /// Load a register map from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::RegisterMapNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a register map from TOML; any validation error is fatal.
    pub fn from_toml_str(content: &str) -> Result<Self, ModelError> {
        let map: RegisterMap = toml::from_str(content)?;
        if let Err(issues) = map.validate() {
            let errors: Vec<String> = issues
                .into_iter()
                .filter(|i| i.severity == "error")
                .map(|i| i.message)
                .collect();
            if !errors.is_empty() {
                return Err(ModelError::InvalidRegisterMap {
                    detail: errors.join("; "),
                });
            }
        }
        Ok(map)
    }

    pub fn get(&self, key: &str) -> Option<&FieldInfo> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldInfo)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate the table for structural correctness.
    ///
    /// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
    pub fn validate(&self) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        for (key, info) in &self.fields {
            // 1. Keys are PERIPHERAL.REGISTER.FIELD
            let segments: Vec<&str> = key.split('.').collect();
            if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
                issues.push(ValidationIssue {
                    severity: "error",
                    message: format!("field key '{key}' is not PERIPHERAL.REGISTER.FIELD"),
                });
            }

            // 2. Width is non-zero and the field fits a 32-bit register
            if info.bit_width == 0 {
                issues.push(ValidationIssue {
                    severity: "error",
                    message: format!("field '{key}' has zero bit width"),
                });
            } else if u32::from(info.bit_offset) + u32::from(info.bit_width) > 32 {
                issues.push(ValidationIssue {
                    severity: "error",
                    message: format!(
                        "field '{key}' (offset {}, width {}) does not fit a 32-bit register",
                        info.bit_offset, info.bit_width
                    ),
                });
            }

            // 3. Reset value fits the field
            if info.bit_width > 0 && info.bit_width < 64 && info.reset > info.max_value() {
                issues.push(ValidationIssue {
                    severity: "error",
                    message: format!(
                        "field '{key}' reset value {} exceeds {}-bit width",
                        info.reset, info.bit_width
                    ),
                });
            }

            // 4. Registers are word aligned
            if info.address % 4 != 0 {
                issues.push(ValidationIssue {
                    severity: "warning",
                    message: format!("field '{key}' register address 0x{:08X} is not word aligned", info.address),
                });
            }
        }

        // 5. Fields sharing a register don't overlap
        let entries: Vec<(&String, &FieldInfo)> = self.fields.iter().collect();
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let (ka, a) = entries[i];
                let (kb, b) = entries[j];
                if a.address == b.address && a.bit_width > 0 && b.bit_width > 0 && a.mask() & b.mask() != 0 {
                    issues.push(ValidationIssue {
                        severity: "error",
                        message: format!("fields '{ka}' and '{kb}' overlap at 0x{:08X}", a.address),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
part = "test-A0"

[fields."MODEM.CTRL0.MODFORMAT"]
address = 0x40086000
bit-offset = 4
bit-width = 3
reset = 0

[fields."MODEM.CTRL0.DUALCORROPTDIS"]
address = 0x40086000
bit-offset = 7
bit-width = 1
access = "read-only"
reset = 1
"#;

    fn field(address: u32, bit_offset: u8, bit_width: u8) -> FieldInfo {
        FieldInfo {
            address,
            bit_offset,
            bit_width,
            access: AccessMode::ReadWrite,
            reset: 0,
            description: None,
        }
    }

    #[test]
    fn parse_sample_in_order() {
        let map = RegisterMap::from_toml_str(SAMPLE).unwrap();
        assert_eq!(map.part, "test-A0");
        assert_eq!(map.len(), 2);
        let keys: Vec<&str> = map.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["MODEM.CTRL0.MODFORMAT", "MODEM.CTRL0.DUALCORROPTDIS"]);
        let f = map.get("MODEM.CTRL0.DUALCORROPTDIS").unwrap();
        assert_eq!(f.access, AccessMode::ReadOnly);
        assert_eq!(f.reset, 1);
    }

    #[test]
    fn mask_and_max() {
        let f = field(0, 4, 3);
        assert_eq!(f.max_value(), 7);
        assert_eq!(f.mask(), 0b111_0000);
    }

    #[test]
    fn overlapping_fields_rejected() {
        let map = RegisterMap::new("bad")
            .with_field("A.B.C", field(0x100, 0, 4))
            .with_field("A.B.D", field(0x100, 3, 2));
        let issues = map.validate().unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("overlap")));
    }

    #[test]
    fn field_past_word_rejected() {
        let map = RegisterMap::new("bad").with_field("A.B.C", field(0x100, 30, 4));
        assert!(map.validate().is_err());
    }

    #[test]
    fn malformed_key_rejected_on_parse() {
        let toml_str = r#"
part = "bad"
[fields."MODEM.CTRL0"]
address = 0
bit-offset = 0
bit-width = 1
"#;
        let err = RegisterMap::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRegisterMap { .. }));
    }

    #[test]
    fn unaligned_address_is_only_a_warning() {
        let toml_str = r#"
part = "warn"
[fields."A.B.C"]
address = 0x102
bit-offset = 0
bit-width = 1
"#;
        assert!(RegisterMap::from_toml_str(toml_str).is_ok());
    }

    #[test]
    fn load_missing_file() {
        let err = RegisterMap::load(Path::new("/nonexistent/part.regmap.toml")).unwrap_err();
        assert!(matches!(err, ModelError::RegisterMapNotFound { .. }));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.regmap.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let map = RegisterMap::load(&path).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn var_name_mapping() {
        assert_eq!(field_key_to_var_name("MODEM.CTRL0.MODFORMAT"), "MODEM_CTRL0_MODFORMAT");
    }
}
