//! Console output formatter for panel results

use crate::output::formatter::OutputFormatter;
use crate::output::report::PanelReport;
use colored::Colorize;
use panel_domain::{
    ConsensusLevel, ConsensusResult, PanelSession, PanelTemplate, RoutingDecision,
};

/// Formats panel sessions for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Full transcript followed by the consensus report
    pub fn format_full(session: &PanelSession) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Expert Panel Transcript"));
        output.push('\n');
        output.push_str(&Self::preamble(session));

        let mut current_label = String::new();
        for entry in session.transcript() {
            let label = entry.utterance.phase_label();
            let section = match entry.utterance.round {
                Some(_) => label.clone(),
                None => entry.utterance.phase.display_name().to_string(),
            };
            if section != current_label {
                output.push_str(&Self::section_header(&Self::title_case(&section)));
                current_label = section;
            }
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} ──", entry.member.label()).yellow().bold(),
                entry.utterance.content.trim()
            ));
        }

        if let Some(consensus) = session.consensus() {
            output.push_str(&Self::section_header("Consensus"));
            output.push_str(&Self::consensus_block(consensus));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Consensus report only (concise output)
    pub fn format_summary(session: &PanelSession) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n\n", "=== Expert Panel Summary ===".cyan().bold()));
        output.push_str(&Self::preamble(session));

        match session.consensus() {
            Some(consensus) => output.push_str(&Self::consensus_block(consensus)),
            None => output.push_str(&format!(
                "{}\n",
                "Consensus building was skipped for this panel.".dimmed()
            )),
        }
        output
    }

    /// Format as JSON
    pub fn format_json(session: &PanelSession) -> String {
        serde_json::to_string_pretty(&PanelReport::from_session(session))
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// Routing decision (`--route-only`)
    pub fn format_routing(decision: &RoutingDecision) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} ({}, {})\n",
            "Template:".cyan().bold(),
            decision.template.name,
            decision.template_key,
            decision.template.format
        ));
        output.push_str(&format!(
            "{} {}-{} members\n",
            "Bounds:".cyan().bold(),
            decision.template.min_members,
            decision.template.max_members
        ));
        output.push_str(&format!("{} {:.3}\n", "Score:".cyan().bold(), decision.score));

        output.push_str(&format!("\n{}\n", "Expertise:".cyan().bold()));
        if decision.expertise.is_empty() {
            output.push_str(&format!("  {}\n", "(none detected)".dimmed()));
        }
        for (rank, tag) in decision.expertise.iter().enumerate() {
            let kind = if decision.template.is_required(tag) {
                "required"
            } else {
                "optional"
            };
            let signal = decision
                .signals
                .get(tag)
                .map(|s| format!(" signal {:.2}", s))
                .unwrap_or_default();
            output.push_str(&format!(
                "  {}. {} ({}{})\n",
                rank + 1,
                tag,
                kind,
                signal
            ));
        }
        output
    }

    /// Template catalog (`--list-templates`)
    pub fn format_templates(templates: &[(&str, &PanelTemplate)]) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", "Panel templates:".cyan().bold()));
        for (key, template) in templates {
            output.push_str(&format!(
                "\n  {} {} [{}, {}-{} members]\n    {}\n",
                key.bold(),
                template.name,
                template.format,
                template.min_members,
                template.max_members,
                template.description.dimmed()
            ));
            if !template.required_expertise.is_empty() {
                output.push_str(&format!(
                    "    required: {}\n",
                    Self::join_tags(&template.required_expertise)
                ));
            }
            if !template.optional_expertise.is_empty() {
                output.push_str(&format!(
                    "    optional: {}\n",
                    Self::join_tags(&template.optional_expertise)
                ));
            }
        }
        output
    }

    fn preamble(session: &PanelSession) -> String {
        let config = session.config();
        let mut output = format!("{} {}\n\n", "Question:".cyan().bold(), config.topic);
        if let Some(template) = &config.template_key {
            output.push_str(&format!("{} {}\n", "Template:".cyan().bold(), template));
        }
        let members: Vec<String> = config.members.iter().map(|m| m.label()).collect();
        output.push_str(&format!(
            "{} {}\n\n",
            "Panel:".cyan().bold(),
            members.join(", ")
        ));
        output
    }

    fn consensus_block(consensus: &ConsensusResult) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} ({:.0}%)   {} {:.0}%\n",
            "Consensus:".bold(),
            Self::level_label(consensus.level),
            consensus.composite * 100.0,
            "Analysis confidence:".dimmed(),
            consensus.confidence * 100.0
        ));
        let scores = &consensus.scores;
        output.push_str(&format!(
            "  similarity {:.2} | claims {:.2} | recommendations {:.2} | evidence {:.2}\n",
            scores.semantic_similarity,
            scores.claim_overlap,
            scores.recommendation_alignment,
            scores.evidence_overlap
        ));
        if consensus.is_degraded() {
            output.push_str(&format!(
                "  {}\n",
                "(estimated from self-reported confidence; detailed analysis unavailable)"
                    .yellow()
            ));
        }

        output.push_str(&format!(
            "\n{}\n{}\n",
            "Recommendation:".green().bold(),
            consensus.recommendation.trim()
        ));

        Self::push_list(&mut output, "Areas of Agreement:", &consensus.agreement_points);
        Self::push_list(&mut output, "Points of Divergence:", &consensus.divergent_points);
        Self::push_list(&mut output, "Key Themes:", &consensus.key_themes);

        if consensus.has_dissent() {
            output.push_str(&format!("\n{}\n", "Dissenting Opinions:".red().bold()));
            for (member, position) in &consensus.dissenting_opinions {
                output.push_str(&format!("  * {}: {}\n", member.bold(), position));
            }
        }
        output
    }

    fn push_list(output: &mut String, title: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        output.push_str(&format!("\n{}\n", title.cyan().bold()));
        for item in items {
            output.push_str(&format!("  * {}\n", item));
        }
    }

    fn level_label(level: ConsensusLevel) -> colored::ColoredString {
        let label = level.as_str().to_uppercase();
        match level {
            ConsensusLevel::High => label.green().bold(),
            ConsensusLevel::Medium => label.yellow().bold(),
            ConsensusLevel::Low => label.red().bold(),
        }
    }

    fn join_tags(tags: &[panel_domain::ExpertiseTag]) -> String {
        tags.iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn title_case(text: &str) -> String {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_full(&self, session: &PanelSession) -> String {
        Self::format_full(session)
    }

    fn format_summary(&self, session: &PanelSession) -> String {
        Self::format_summary(session)
    }

    fn format_json(&self, session: &PanelSession) -> String {
        Self::format_json(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_domain::{
        ConsensusScores, ConsensusSource, MemberResponse, OutputFormat, PanelConfiguration,
        PanelMember, PanelPhase, PanelRouter, SessionId,
    };

    fn finished_session() -> PanelSession {
        colored::control::set_override(false);
        let config = PanelConfiguration::new(
            "Should the city build a tram?",
            vec![
                PanelMember::new("econ", "Dr. Econ", "Economist", "persona"),
                PanelMember::new("plan", "Dr. Plan", "Urban planner", "persona"),
            ],
        )
        .with_max_rounds(1)
        .with_rebuttals(false)
        .with_template_key("policy_debate");
        let mut session = PanelSession::new(SessionId::new("s-1"), config).unwrap();

        session.advance_to(PanelPhase::OpeningStatements).unwrap();
        session.record("econ", "Too expensive.\nConfidence: 0.4").unwrap();
        session.record("plan", "Worth it.\nConfidence: 0.9").unwrap();
        session.advance_to(PanelPhase::Discussion).unwrap();
        session.begin_round().unwrap();
        session.record("econ", "Still costly.").unwrap();
        session.record("plan", "Long-term gains.").unwrap();
        session.advance_to(PanelPhase::ConsensusBuilding).unwrap();

        let responses = vec![
            MemberResponse::new("econ", "Dr. Econ", "Too expensive.").with_confidence(0.4),
            MemberResponse::new("plan", "Dr. Plan", "Worth it.").with_confidence(0.9),
        ];
        let result = ConsensusResult::from_scores(
            ConsensusScores::uniform(0.6),
            &responses,
            ConsensusSource::Weighted,
        )
        .with_recommendation("Build in phases.")
        .with_agreement_points(vec!["Congestion is a problem".to_string()]);
        session.set_consensus(result);
        session.advance_to(PanelPhase::Closing).unwrap();
        session.complete().unwrap();
        session
    }

    #[test]
    fn test_summary_contains_consensus_and_dissent() {
        let output = ConsoleFormatter::format_summary(&finished_session());

        assert!(output.contains("Should the city build a tram?"));
        assert!(output.contains("MEDIUM (60%)"));
        assert!(output.contains("Build in phases."));
        assert!(output.contains("Congestion is a problem"));
        assert!(output.contains("Dissenting Opinions:"));
        assert!(output.contains("Dr. Econ"));
        assert!(!output.contains("Long-term gains."));
    }

    #[test]
    fn test_full_contains_transcript_sections() {
        let output = ConsoleFormatter::format_full(&finished_session());

        assert!(output.contains("Opening Statements"));
        assert!(output.contains("Discussion round 1"));
        assert!(output.contains("── Dr. Plan (Urban planner) ──"));
        assert!(output.contains("Long-term gains."));
        assert!(output.contains("Consensus"));
    }

    #[test]
    fn test_json_report() {
        let session = finished_session();
        let json = ConsoleFormatter.render(&session, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["session_id"], "s-1");
        assert_eq!(value["template"], "policy_debate");
        assert_eq!(value["members"][0]["id"], "econ");
        assert_eq!(value["transcript"].as_array().unwrap().len(), 4);
        assert_eq!(value["transcript"][2]["phase"], "discussion");
        assert_eq!(value["transcript"][2]["round"], 1);
        assert_eq!(value["consensus"]["level"], "medium");
    }

    #[test]
    fn test_routing_and_templates() {
        colored::control::set_override(false);
        let router = PanelRouter::default();
        let decision = router.route(
            "What are the cardiovascular risks of diabetes medication X?",
            None,
            None,
        );
        let output = ConsoleFormatter::format_routing(&decision);
        assert!(output.contains("clinical_advisory"));
        assert!(output.contains("1. clinical_medicine (required"));

        let output = ConsoleFormatter::format_templates(&router.list_templates());
        assert!(output.contains("general"));
        assert!(output.contains("legal_consultation"));
    }
}
