//! RF band lookup table.
//!
//! Parsed once from TOML, validated, and shared read-only (behind an `Arc`)
//! by every unit that needs to know which band a frequency falls in.

use serde::{Deserialize, Serialize};

use crate::error::{PartsError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Band {
    pub name: String,
    pub min_hz: i64,
    pub max_hz: i64,
    /// Divider between the VCO and the RF frequency.
    pub lo_div: i64,
}

impl Band {
    pub fn contains(&self, freq_hz: i64) -> bool {
        (self.min_hz..=self.max_hz).contains(&freq_hz)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandTable {
    #[serde(rename = "band", default)]
    bands: Vec<Band>,
}

impl BandTable {
    /// Parse and validate a band table.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: BandTable = toml::from_str(content)?;
        table.validate()?;
        Ok(table)
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// The band containing `freq_hz`, if any.
    pub fn find(&self, freq_hz: i64) -> Option<&Band> {
        self.bands.iter().find(|b| b.contains(freq_hz))
    }

    fn validate(&self) -> Result<()> {
        for band in &self.bands {
            if band.min_hz >= band.max_hz {
                return Err(PartsError::InvalidBandTable(format!(
                    "band '{}' is empty ({}..{} Hz)",
                    band.name, band.min_hz, band.max_hz
                )));
            }
            if band.lo_div <= 0 {
                return Err(PartsError::InvalidBandTable(format!(
                    "band '{}' has LO divider {}",
                    band.name, band.lo_div
                )));
            }
        }
        for (i, a) in self.bands.iter().enumerate() {
            for b in &self.bands[i + 1..] {
                if a.min_hz <= b.max_hz && b.min_hz <= a.max_hz {
                    return Err(PartsError::InvalidBandTable(format!(
                        "bands '{}' and '{}' overlap",
                        a.name, b.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_table_parses() {
        let table = BandTable::from_toml_str(include_str!("../data/reference-bands.toml")).unwrap();
        assert_eq!(table.bands().len(), 4);
        assert_eq!(table.find(915_000_000).map(|b| b.lo_div), Some(2));
        assert_eq!(table.find(2_405_000_000).map(|b| b.name.as_str()), Some("2.4GHz"));
        assert!(table.find(1_500_000_000).is_none());
    }

    #[test]
    fn overlapping_bands_rejected() {
        let toml_str = r#"
[[band]]
name = "a"
min-hz = 100
max-hz = 200
lo-div = 1

[[band]]
name = "b"
min-hz = 150
max-hz = 300
lo-div = 1
"#;
        let err = BandTable::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, PartsError::InvalidBandTable(ref m) if m.contains("overlap")));
    }

    #[test]
    fn zero_divider_rejected() {
        let toml_str = "[[band]]\nname = \"a\"\nmin-hz = 1\nmax-hz = 2\nlo-div = 0\n";
        assert!(BandTable::from_toml_str(toml_str).is_err());
    }
}
