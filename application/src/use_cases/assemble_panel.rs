//! Assemble Panel use case
//!
//! Turns a question into a runnable [`PanelConfiguration`]: routes it, pads
//! the expertise list to the template's minimum and seats one member per
//! expertise tag.

use crate::config::DeliberationParams;
use panel_domain::{
    DomainError, ExpertiseTag, PanelConfiguration, PanelMember, PanelRouter, PanelTemplate,
    Question, RosterFit, RoutingDecision, persona_for,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while assembling a panel
#[derive(Error, Debug)]
pub enum AssemblePanelError {
    #[error("Unknown panel template: {0}")]
    UnknownTemplate(String),

    #[error("Invalid panel configuration: {0}")]
    InvalidConfiguration(#[from] DomainError),
}

/// Input for assembling a panel
#[derive(Debug, Clone)]
pub struct AssemblePanelInput {
    pub question: Question,
    /// Restricts seating to these experts when present
    pub available_experts: Option<Vec<PanelMember>>,
    /// Use this template instead of the routed one
    pub template_key: Option<String>,
}

impl AssemblePanelInput {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            available_experts: None,
            template_key: None,
        }
    }

    pub fn with_available_experts(mut self, experts: Vec<PanelMember>) -> Self {
        self.available_experts = Some(experts);
        self
    }

    pub fn with_template(mut self, key: impl Into<String>) -> Self {
        self.template_key = Some(key.into());
        self
    }
}

/// A routed and validated panel, ready to be opened as a session
#[derive(Debug, Clone)]
pub struct AssembledPanel {
    pub routing: RoutingDecision,
    pub config: PanelConfiguration,
}

pub struct AssemblePanelUseCase {
    router: PanelRouter,
    params: DeliberationParams,
}

impl AssemblePanelUseCase {
    pub fn new(router: PanelRouter) -> Self {
        Self {
            router,
            params: DeliberationParams::default(),
        }
    }

    pub fn with_params(mut self, params: DeliberationParams) -> Self {
        self.params = params;
        self
    }

    pub fn router(&self) -> &PanelRouter {
        &self.router
    }

    pub fn assemble(&self, input: AssemblePanelInput) -> Result<AssembledPanel, AssemblePanelError> {
        let question = &input.question;
        let available = input.available_experts.as_deref();

        let mut routing = match &input.template_key {
            Some(key) => self
                .router
                .route_with_template(key, question.content(), available)
                .ok_or_else(|| AssemblePanelError::UnknownTemplate(key.clone()))?,
            None => self
                .router
                .route(question.content(), question.context(), available),
        };
        pad_expertise(&mut routing.expertise, &routing.template, available);
        debug!(
            template = %routing.template_key,
            expertise = ?routing.expertise,
            "Routed question"
        );

        let members = match available {
            Some(experts) => seat_available(&routing.expertise, experts, &routing.template),
            None => routing.expertise.iter().map(persona_for).collect(),
        };

        let config = PanelConfiguration::new(question.as_topic(), members)
            .with_max_rounds(self.params.max_rounds)
            .with_rebuttals(self.params.enable_rebuttals)
            .with_consensus(self.params.require_consensus)
            .with_time_budget(self.params.time_budget)
            .with_template_key(routing.template_key.clone());
        config.validate()?;

        match config.roster_fit(&routing.template) {
            RosterFit::Within => {}
            RosterFit::BelowMinimum { min, actual } => {
                warn!(
                    template = %routing.template_key,
                    "Panel seats {} members, template asks for at least {}",
                    actual,
                    min
                );
            }
            RosterFit::AboveMaximum { max, actual } => {
                return Err(DomainError::RosterTooLarge { max, actual }.into());
            }
        }

        Ok(AssembledPanel { routing, config })
    }
}

/// Extend `expertise` up to the template minimum with unused optional tags,
/// then unused required tags, in declared order. Never exceeds the maximum.
/// With an expert list, only tags someone can cover are considered.
fn pad_expertise(
    expertise: &mut Vec<ExpertiseTag>,
    template: &PanelTemplate,
    available: Option<&[PanelMember]>,
) {
    let target = template.min_members.min(template.max_members);
    let candidates = template
        .optional_expertise
        .iter()
        .chain(template.required_expertise.iter());

    for tag in candidates {
        if expertise.len() >= target {
            break;
        }
        if expertise.contains(tag) {
            continue;
        }
        if let Some(experts) = available
            && !experts.iter().any(|m| m.covers(tag))
        {
            continue;
        }
        expertise.push(tag.clone());
    }
}

/// First unseated expert covering each tag, then any remaining experts
/// until the template minimum is reached.
fn seat_available(
    expertise: &[ExpertiseTag],
    experts: &[PanelMember],
    template: &PanelTemplate,
) -> Vec<PanelMember> {
    let mut seated: Vec<PanelMember> = Vec::new();

    for tag in expertise {
        if seated.len() >= template.max_members {
            break;
        }
        if let Some(expert) = experts
            .iter()
            .find(|m| m.covers(tag) && !seated.iter().any(|s| s.id() == m.id()))
        {
            seated.push(expert.clone());
        }
    }

    for expert in experts {
        if seated.len() >= template.min_members.min(template.max_members) {
            break;
        }
        if !seated.iter().any(|s| s.id() == expert.id()) {
            seated.push(expert.clone());
        }
    }

    seated
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLINICAL_QUESTION: &str = "What are the cardiovascular risks of diabetes medication X?";
    const VAGUE_QUESTION: &str = "Zxqv blorp wibble?";

    fn use_case() -> AssemblePanelUseCase {
        AssemblePanelUseCase::new(PanelRouter::default())
    }

    fn expert(id: &str, tag: &str) -> PanelMember {
        PanelMember::new(id, id, "Expert", "persona").with_expertise(tag)
    }

    fn ids(config: &PanelConfiguration) -> Vec<&str> {
        config.members.iter().map(|m| m.id()).collect()
    }

    #[test]
    fn test_clinical_question_seats_generated_personas() {
        let input = AssemblePanelInput::new(Question::new(CLINICAL_QUESTION).unwrap());
        let panel = use_case().assemble(input).unwrap();

        assert_eq!(panel.routing.template_key, "clinical_advisory");
        assert_eq!(panel.config.template_key.as_deref(), Some("clinical_advisory"));
        assert_eq!(
            ids(&panel.config),
            vec![
                "clinical_medicine-expert",
                "pharmacology-expert",
                "endocrinology-expert",
                "cardiology-expert"
            ]
        );
        assert_eq!(panel.config.topic, CLINICAL_QUESTION);
    }

    #[test]
    fn test_vague_question_pads_default_template() {
        let input = AssemblePanelInput::new(Question::new(VAGUE_QUESTION).unwrap());
        let panel = use_case().assemble(input).unwrap();

        assert_eq!(panel.routing.template_key, "general");
        let tags: Vec<&str> = panel.routing.expertise.iter().map(|t| t.as_str()).collect();
        assert_eq!(tags, vec!["research_methods", "risk_management", "ethics"]);
        assert_eq!(panel.config.members.len(), 3);
    }

    #[test]
    fn test_explicit_template_replaces_routing() {
        let input =
            AssemblePanelInput::new(Question::new(VAGUE_QUESTION).unwrap()).with_template("legal_consultation");
        let panel = use_case().assemble(input).unwrap();

        assert_eq!(panel.routing.template_key, "legal_consultation");
        assert_eq!(
            ids(&panel.config),
            vec!["legal-expert", "regulatory_affairs-expert"]
        );
    }

    #[test]
    fn test_unknown_template() {
        let input = AssemblePanelInput::new(Question::new(VAGUE_QUESTION).unwrap()).with_template("nope");
        let result = use_case().assemble(input);
        assert!(matches!(result, Err(AssemblePanelError::UnknownTemplate(k)) if k == "nope"));
    }

    #[test]
    fn test_available_experts_are_seated_and_topped_up() {
        let experts = vec![
            expert("econ", "economics"),
            expert("doc", "clinical_medicine"),
            expert("pharm", "pharmacology"),
        ];
        let input = AssemblePanelInput::new(Question::new(CLINICAL_QUESTION).unwrap())
            .with_available_experts(experts);
        let panel = use_case().assemble(input).unwrap();

        let tags: Vec<&str> = panel.routing.expertise.iter().map(|t| t.as_str()).collect();
        assert_eq!(tags, vec!["clinical_medicine", "pharmacology"]);
        assert_eq!(ids(&panel.config), vec!["doc", "pharm", "econ"]);
    }

    #[test]
    fn test_small_roster_is_allowed_below_minimum() {
        let input = AssemblePanelInput::new(Question::new(CLINICAL_QUESTION).unwrap())
            .with_available_experts(vec![expert("doc", "clinical_medicine")]);
        let panel = use_case().assemble(input).unwrap();
        assert_eq!(ids(&panel.config), vec!["doc"]);
    }

    #[test]
    fn test_no_matching_experts_is_rejected() {
        let input = AssemblePanelInput::new(Question::new(CLINICAL_QUESTION).unwrap())
            .with_available_experts(Vec::new());
        let result = use_case().assemble(input);
        assert!(matches!(
            result,
            Err(AssemblePanelError::InvalidConfiguration(DomainError::EmptyRoster))
        ));
    }

    #[test]
    fn test_params_flow_into_configuration() {
        let params = DeliberationParams::default()
            .with_max_rounds(3)
            .with_rebuttals(false);
        let input = AssemblePanelInput::new(
            Question::new(CLINICAL_QUESTION)
                .unwrap()
                .with_context("Patient is 70"),
        );
        let panel = use_case().with_params(params).assemble(input).unwrap();

        assert_eq!(panel.config.max_rounds, 3);
        assert!(!panel.config.enable_rebuttals);
        assert!(panel.config.require_consensus);
        assert!(panel.config.topic.ends_with("Context: Patient is 70"));
    }

    #[test]
    fn test_zero_rounds_is_rejected() {
        let input = AssemblePanelInput::new(Question::new(CLINICAL_QUESTION).unwrap());
        let result = use_case()
            .with_params(DeliberationParams::default().with_max_rounds(0))
            .assemble(input);
        assert!(matches!(
            result,
            Err(AssemblePanelError::InvalidConfiguration(
                DomainError::NoDiscussionRounds
            ))
        ));
    }
}
