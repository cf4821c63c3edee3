//! Panel templates (static archetype catalog)

use super::member::ExpertiseTag;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Key of the template chosen when no other template scores higher
pub const DEFAULT_TEMPLATE_KEY: &str = "general";

/// Deliberation format a template is built around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelFormat {
    Debate,
    Roundtable,
    Interview,
    Brainstorm,
    Advisory,
}

impl PanelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelFormat::Debate => "debate",
            PanelFormat::Roundtable => "roundtable",
            PanelFormat::Interview => "interview",
            PanelFormat::Brainstorm => "brainstorm",
            PanelFormat::Advisory => "advisory",
        }
    }
}

impl std::fmt::Display for PanelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PanelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debate" => Ok(PanelFormat::Debate),
            "roundtable" => Ok(PanelFormat::Roundtable),
            "interview" => Ok(PanelFormat::Interview),
            "brainstorm" => Ok(PanelFormat::Brainstorm),
            "advisory" => Ok(PanelFormat::Advisory),
            other => Err(format!("Unknown panel format: {}", other)),
        }
    }
}

/// A named panel archetype (read-only catalog entry)
///
/// Required expertise is always seated when the template wins routing;
/// optional expertise is seated only when the question signals it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelTemplate {
    pub name: String,
    pub format: PanelFormat,
    pub description: String,
    pub min_members: usize,
    pub max_members: usize,
    #[serde(default)]
    pub required_expertise: Vec<ExpertiseTag>,
    #[serde(default)]
    pub optional_expertise: Vec<ExpertiseTag>,
}

impl PanelTemplate {
    pub fn new(
        name: impl Into<String>,
        format: PanelFormat,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            format,
            description: description.into(),
            min_members: 2,
            max_members: 5,
            required_expertise: Vec::new(),
            optional_expertise: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, min_members: usize, max_members: usize) -> Self {
        self.min_members = min_members;
        self.max_members = max_members;
        self
    }

    pub fn with_required(mut self, tags: &[&str]) -> Self {
        self.required_expertise = tags.iter().map(|t| ExpertiseTag::new(t)).collect();
        self
    }

    pub fn with_optional(mut self, tags: &[&str]) -> Self {
        self.optional_expertise = tags.iter().map(|t| ExpertiseTag::new(t)).collect();
        self
    }

    pub fn is_required(&self, tag: &ExpertiseTag) -> bool {
        self.required_expertise.contains(tag)
    }

    pub fn is_optional(&self, tag: &ExpertiseTag) -> bool {
        self.optional_expertise.contains(tag)
    }

    /// Check the member bounds and tag lists for consistency.
    pub fn validate(&self, key: &str) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidTemplate {
            key: key.to_string(),
            reason,
        };

        if self.min_members == 0 {
            return Err(invalid("min_members must be at least 1".to_string()));
        }
        if self.min_members > self.max_members {
            return Err(invalid(format!(
                "min_members ({}) exceeds max_members ({})",
                self.min_members, self.max_members
            )));
        }
        if self.required_expertise.len() > self.max_members {
            return Err(invalid(format!(
                "{} required tags cannot fit in {} seats",
                self.required_expertise.len(),
                self.max_members
            )));
        }
        if let Some(tag) = self
            .required_expertise
            .iter()
            .find(|t| self.optional_expertise.contains(t))
        {
            return Err(invalid(format!(
                "tag '{}' is both required and optional",
                tag
            )));
        }
        Ok(())
    }
}

/// The built-in template catalog
pub fn default_templates() -> Vec<(&'static str, PanelTemplate)> {
    vec![
        (
            DEFAULT_TEMPLATE_KEY,
            PanelTemplate::new(
                "General Roundtable",
                PanelFormat::Roundtable,
                "Broad multidisciplinary discussion for questions without a clear specialty",
            )
            .with_bounds(3, 5)
            .with_optional(&[
                "research_methods",
                "risk_management",
                "ethics",
                "economics",
                "software_engineering",
                "public_policy",
            ]),
        ),
        (
            "clinical_advisory",
            PanelTemplate::new(
                "Clinical Advisory Board",
                PanelFormat::Advisory,
                "Clinicians and pharmacologists advising on treatments, medications and patient risk",
            )
            .with_bounds(3, 6)
            .with_required(&["clinical_medicine", "pharmacology"])
            .with_optional(&[
                "cardiology",
                "endocrinology",
                "biostatistics",
                "medical_ethics",
                "regulatory_affairs",
            ]),
        ),
        (
            "technical_review",
            PanelTemplate::new(
                "Technical Design Review",
                PanelFormat::Roundtable,
                "Engineers reviewing architecture, security and operability of a system",
            )
            .with_bounds(3, 5)
            .with_required(&["software_engineering", "security"])
            .with_optional(&["devops", "data_science", "ux_design"]),
        ),
        (
            "business_strategy",
            PanelTemplate::new(
                "Strategy Debate",
                PanelFormat::Debate,
                "Opposing business perspectives on markets, growth and investment decisions",
            )
            .with_bounds(3, 5)
            .with_required(&["business_strategy", "finance"])
            .with_optional(&["marketing", "economics", "operations", "legal", "risk_management"]),
        ),
        (
            "research_brainstorm",
            PanelTemplate::new(
                "Research Brainstorm",
                PanelFormat::Brainstorm,
                "Open-ended idea generation for study design and research directions",
            )
            .with_bounds(3, 6)
            .with_required(&["research_methods"])
            .with_optional(&[
                "data_science",
                "biostatistics",
                "environmental_science",
                "sociology",
                "ethics",
            ]),
        ),
        (
            "policy_debate",
            PanelTemplate::new(
                "Policy Debate",
                PanelFormat::Debate,
                "Structured debate on public policy trade-offs",
            )
            .with_bounds(2, 5)
            .with_required(&["public_policy", "economics"])
            .with_optional(&["legal", "ethics", "sociology", "environmental_science"]),
        ),
        (
            "legal_consultation",
            PanelTemplate::new(
                "Legal Consultation",
                PanelFormat::Interview,
                "Question-and-answer consultation with legal and compliance specialists",
            )
            .with_bounds(2, 4)
            .with_required(&["legal"])
            .with_optional(&["regulatory_affairs", "finance", "ethics"]),
        ),
    ]
}
