//! Enum definitions referenced by enumerated variables.

use serde::{Deserialize, Serialize};

/// A single `{name, value, description}` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: i64, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            description: description.into(),
        }
    }
}

/// An ordered member table. Members are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    members: Vec<EnumMember>,
}

impl EnumDef {
    pub(crate) fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            members: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, member: EnumMember) {
        self.members.push(member);
    }

    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_by_value(&self, value: i64) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value == value)
    }

    pub fn contains_value(&self, value: i64) -> bool {
        self.member_by_value(value).is_some()
    }

    /// Resolve either a member name or a decimal member value.
    pub fn resolve(&self, token: &str) -> Option<i64> {
        if let Some(m) = self.member(token) {
            return Some(m.value);
        }
        token
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|v| self.contains_value(*v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modulation() -> EnumDef {
        let mut e = EnumDef::new("ModulationEnum", "Modulation format");
        e.push(EnumMember::new("FSK2", 0, "2-FSK"));
        e.push(EnumMember::new("FSK4", 1, "4-FSK"));
        e.push(EnumMember::new("OQPSK", 4, "O-QPSK"));
        e
    }

    #[test]
    fn lookup_by_name_and_value() {
        let e = modulation();
        assert_eq!(e.member("FSK4").map(|m| m.value), Some(1));
        assert_eq!(e.member_by_value(4).map(|m| m.name.as_str()), Some("OQPSK"));
        assert!(e.member("ASK").is_none());
    }

    #[test]
    fn resolve_accepts_names_and_numbers() {
        let e = modulation();
        assert_eq!(e.resolve("OQPSK"), Some(4));
        assert_eq!(e.resolve("1"), Some(1));
        assert_eq!(e.resolve("7"), None);
        assert_eq!(e.resolve("bogus"), None);
    }
}
