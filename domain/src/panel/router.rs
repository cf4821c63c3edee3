//! Panel router: question → template + ranked expertise list
//!
//! Routing is a pure function of the question, the caller's hints and the
//! template catalog. It never fails: questions without a usable signal fall
//! back to the default template.

use super::expertise::detect_expertise;
use super::member::{ExpertiseTag, PanelMember};
use super::template::{DEFAULT_TEMPLATE_KEY, PanelTemplate, default_templates};
use crate::core::error::DomainError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of routing a question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    /// Catalog key of the winning template
    pub template_key: String,
    pub template: PanelTemplate,
    /// Ranked expertise list, at most `template.max_members` long
    pub expertise: Vec<ExpertiseTag>,
    /// Raw expertise signals detected in the question
    pub signals: BTreeMap<ExpertiseTag, f64>,
    /// Template score that won routing
    pub score: f64,
}

/// Maps questions onto panel templates
///
/// # Example
///
/// ```
/// use panel_domain::panel::PanelRouter;
///
/// let router = PanelRouter::default();
/// let decision = router.route("What are the cardiovascular risks of diabetes medication X?", None, None);
///
/// assert_eq!(decision.template_key, "clinical_advisory");
/// assert_eq!(decision.expertise[0].as_str(), "clinical_medicine");
/// assert_eq!(decision.expertise[1].as_str(), "pharmacology");
/// ```
#[derive(Debug, Clone)]
pub struct PanelRouter {
    templates: BTreeMap<String, PanelTemplate>,
}

impl Default for PanelRouter {
    fn default() -> Self {
        Self {
            templates: default_templates()
                .into_iter()
                .map(|(key, template)| (key.to_string(), template))
                .collect(),
        }
    }
}

impl PanelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a question to the best-fit template and expertise list.
    ///
    /// `context` is accepted for interface symmetry; only the question text
    /// is scanned for expertise signals.
    pub fn route(
        &self,
        question: &str,
        _context: Option<&str>,
        available_experts: Option<&[PanelMember]>,
    ) -> RoutingDecision {
        let signals = detect_expertise(question);
        let (key, template, score) = self.best_template(&signals);
        let expertise = Self::rank_expertise(template, &signals, available_experts);

        RoutingDecision {
            template_key: key.to_string(),
            template: template.clone(),
            expertise,
            signals,
            score,
        }
    }

    /// Route against a caller-chosen template instead of the best-scoring one.
    ///
    /// Returns `None` when the key is not in the catalog.
    pub fn route_with_template(
        &self,
        key: &str,
        question: &str,
        available_experts: Option<&[PanelMember]>,
    ) -> Option<RoutingDecision> {
        let template = self.templates.get(key)?;
        let signals = detect_expertise(question);
        let score = Self::score_template(template, &signals);
        let expertise = Self::rank_expertise(template, &signals, available_experts);

        Some(RoutingDecision {
            template_key: key.to_string(),
            template: template.clone(),
            expertise,
            signals,
            score,
        })
    }

    /// All registered templates, ordered by key
    pub fn list_templates(&self) -> Vec<(&str, &PanelTemplate)> {
        self.templates
            .iter()
            .map(|(key, template)| (key.as_str(), template))
            .collect()
    }

    pub fn template(&self, key: &str) -> Option<&PanelTemplate> {
        self.templates.get(key)
    }

    /// Add or replace a catalog entry. Returns the template previously
    /// stored under `key`, if any.
    pub fn register_template(
        &mut self,
        key: impl Into<String>,
        template: PanelTemplate,
    ) -> Result<Option<PanelTemplate>, DomainError> {
        let key = key.into();
        template.validate(&key)?;
        Ok(self.templates.insert(key, template))
    }

    /// Required hits weigh double, optional hits single.
    fn score_template(template: &PanelTemplate, signals: &BTreeMap<ExpertiseTag, f64>) -> f64 {
        let required: f64 = template
            .required_expertise
            .iter()
            .filter_map(|tag| signals.get(tag))
            .sum();
        let optional: f64 = template
            .optional_expertise
            .iter()
            .filter_map(|tag| signals.get(tag))
            .sum();
        required * 2.0 + optional
    }

    /// Highest-scoring template; the default template wins all ties with it.
    fn best_template(
        &self,
        signals: &BTreeMap<ExpertiseTag, f64>,
    ) -> (&str, &PanelTemplate, f64) {
        // Seeded by `Default` and only ever replaced, never removed.
        let default = &self.templates[DEFAULT_TEMPLATE_KEY];
        let mut best = (
            DEFAULT_TEMPLATE_KEY,
            default,
            Self::score_template(default, signals),
        );

        for (key, template) in &self.templates {
            let score = Self::score_template(template, signals);
            if score > best.2 {
                best = (key.as_str(), template, score);
            }
        }
        best
    }

    /// Required tags first, then detected optional tags by descending signal,
    /// capped at `max_members`, then filtered by availability.
    fn rank_expertise(
        template: &PanelTemplate,
        signals: &BTreeMap<ExpertiseTag, f64>,
        available_experts: Option<&[PanelMember]>,
    ) -> Vec<ExpertiseTag> {
        let mut expertise: Vec<ExpertiseTag> = template
            .required_expertise
            .iter()
            .take(template.max_members)
            .cloned()
            .collect();

        let mut detected_optional: Vec<(&ExpertiseTag, f64)> = template
            .optional_expertise
            .iter()
            .filter_map(|tag| signals.get(tag).map(|score| (tag, *score)))
            .collect();
        detected_optional.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        for (tag, _) in detected_optional {
            if expertise.len() >= template.max_members {
                break;
            }
            if !expertise.contains(tag) {
                expertise.push(tag.clone());
            }
        }

        if let Some(available) = available_experts {
            expertise.retain(|tag| available.iter().any(|m| m.covers(tag)));
        }

        expertise
    }
}
