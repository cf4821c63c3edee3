//! Panel member value objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A label naming an area of expertise (e.g. `pharmacology`).
///
/// Tags are normalized to trimmed lower case so that lookups are
/// insensitive to how callers spell them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpertiseTag(String);

impl ExpertiseTag {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExpertiseTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExpertiseTag {
    fn from(s: &str) -> Self {
        ExpertiseTag::new(s)
    }
}

impl From<String> for ExpertiseTag {
    fn from(s: String) -> Self {
        ExpertiseTag::new(s)
    }
}

/// One virtual expert on a panel.
///
/// Built once with the `with_*` methods and never mutated afterwards;
/// all fields are read through accessors.
///
/// # Example
///
/// ```
/// use panel_domain::panel::PanelMember;
///
/// let member = PanelMember::new("cardio-1", "Dr. Vega", "Cardiologist", "You are a cardiologist.")
///     .with_expertise("cardiology")
///     .with_expertise("Clinical_Medicine");
///
/// assert!(member.covers(&"clinical_medicine".into()));
/// assert_eq!(member.expertise().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelMember {
    id: String,
    name: String,
    role: String,
    expertise: BTreeSet<ExpertiseTag>,
    persona: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
}

impl PanelMember {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            expertise: BTreeSet::new(),
            persona: persona.into(),
            avatar: None,
        }
    }

    pub fn with_expertise(mut self, tag: impl Into<ExpertiseTag>) -> Self {
        self.expertise.insert(tag.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn expertise(&self) -> &BTreeSet<ExpertiseTag> {
        &self.expertise
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Whether this member carries the given expertise tag
    pub fn covers(&self, tag: &ExpertiseTag) -> bool {
        self.expertise.contains(tag)
    }

    /// "Name (Role)" label used in transcripts and reports
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_normalization() {
        assert_eq!(ExpertiseTag::new("  Pharmacology "), ExpertiseTag::new("pharmacology"));
        assert_eq!(ExpertiseTag::from("Legal").as_str(), "legal");
    }

    #[test]
    fn test_member_builder() {
        let member = PanelMember::new("m1", "Ada", "Engineer", "persona")
            .with_expertise("software_engineering")
            .with_avatar("ada.png");

        assert_eq!(member.id(), "m1");
        assert_eq!(member.label(), "Ada (Engineer)");
        assert_eq!(member.avatar(), Some("ada.png"));
        assert!(member.covers(&ExpertiseTag::new("software_engineering")));
        assert!(!member.covers(&ExpertiseTag::new("legal")));
    }

    #[test]
    fn test_tag_serializes_as_plain_string() {
        let json = serde_json::to_string(&ExpertiseTag::new("ethics")).unwrap();
        assert_eq!(json, "\"ethics\"");
    }
}
