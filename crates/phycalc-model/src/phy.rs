//! PHY records: named radio configuration variants stored in a model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::value::Value;

/// Name fragment that marks a production alias of a design PHY.
pub const PRODUCTION_MARKER: &str = "_prod";

/// Index of a PHY inside its owning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhyHandle(pub usize);

impl PhyHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable identifier derived from the PHY name alone.
///
/// Formatted like a UUID (8-4-4-4-12 hex groups) so that downstream tables
/// keyed by GUID keep working, but it is a truncated SHA-256 of the name and
/// not random.
pub fn phy_guid(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"phy:");
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest[..16].iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// A named radio configuration variant.
///
/// Inputs are bindings of profile-input variables; overrides force values on
/// outputs. Both keep insertion order so later bindings of the same key
/// replace earlier ones in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phy {
    pub name: String,
    pub group: String,
    pub readable_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_to: Option<String>,
    #[serde(default)]
    pub inputs: IndexMap<String, Value>,
    #[serde(default)]
    pub overrides: IndexMap<String, Value>,
    pub guid: String,
    #[serde(default)]
    pub frozen: bool,
}

impl Phy {
    pub fn new(name: impl Into<String>, profile: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            guid: phy_guid(&name),
            readable_name: name.clone(),
            group: String::new(),
            description: String::new(),
            tags: Vec::new(),
            profile: profile.into(),
            points_to: None,
            inputs: IndexMap::new(),
            overrides: IndexMap::new(),
            name,
            frozen: false,
        }
    }

    pub fn is_production(&self) -> bool {
        self.name.contains(PRODUCTION_MARKER)
    }

    /// For a production PHY, the design PHY it aliases: its own name with
    /// the marker removed.
    pub fn design_name(&self) -> Option<String> {
        self.is_production()
            .then(|| self.name.replacen(PRODUCTION_MARKER, "", 1))
    }

    /// Bind a profile input. A later binding of the same input wins.
    pub fn set_input(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    /// Force an output value for this PHY.
    pub fn set_override(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.overrides.insert(name.into(), value.into());
        self
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guid_is_stable_and_name_derived() {
        let a = phy_guid("PHY_Base_2FSK_100kbps");
        let b = phy_guid("PHY_Base_2FSK_100kbps");
        let c = phy_guid("PHY_IEEE802154_2p4GHz");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 36);
        assert_eq!(a.matches('-').count(), 4);
    }

    #[test]
    fn later_input_binding_replaces_earlier() {
        let mut phy = Phy::new("PHY_Test", "Base");
        phy.set_input("bitrate", 100_000i64)
            .set_input("deviation", 50_000i64)
            .set_input("bitrate", 250_000i64);
        let keys: Vec<&str> = phy.inputs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["bitrate", "deviation"]);
        assert_eq!(phy.inputs["bitrate"], Value::Int(250_000));
    }

    #[test]
    fn production_marker_detection() {
        assert!(Phy::new("PHY_Zigbee_prod", "Base").is_production());
        assert!(!Phy::new("PHY_Zigbee", "Base").is_production());
        assert_eq!(
            Phy::new("PHY_Zigbee_prod", "Base").design_name().as_deref(),
            Some("PHY_Zigbee")
        );
        assert!(Phy::new("PHY_Zigbee", "Base").design_name().is_none());
    }

    #[test]
    fn tags_are_deduplicated() {
        let mut phy = Phy::new("PHY_Test", "Base");
        phy.add_tag("zigbee").add_tag("zigbee").add_tag("2.4GHz");
        assert_eq!(phy.tags, vec!["zigbee", "2.4GHz"]);
    }
}
