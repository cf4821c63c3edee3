//! Prompts spoken to panel members

use crate::panel::member::PanelMember;
use crate::session::entities::TranscriptEntry;

/// Templates for each speaking phase
pub struct PanelPromptTemplate;

impl PanelPromptTemplate {
    /// Instruction context for one member: persona plus reply conventions
    /// the consensus engine relies on.
    pub fn member_system(member: &PanelMember) -> String {
        format!(
            r#"{persona}

You are {name}, serving as {role} on an expert panel.
Stay within your expertise and say so when a point falls outside it.
Be concise: a few focused paragraphs, no preamble.

End every contribution with these lines:
Sources: <comma-separated sources you relied on, or "none">
Confidence: <a number between 0 and 1 for how confident you are in your position>"#,
            persona = member.persona(),
            name = member.name(),
            role = member.role(),
        )
    }

    pub fn opening(topic: &str) -> String {
        format!(
            r#"The panel has been convened on the following question:

{topic}

Give your opening statement: your position, the key reasons for it, and the main risks or uncertainties you see."#
        )
    }

    pub fn discussion(
        topic: &str,
        transcript: &[TranscriptEntry<'_>],
        round: u32,
        max_rounds: u32,
    ) -> String {
        format!(
            r#"Question before the panel:

{topic}

Discussion so far:
{history}

This is discussion round {round} of {max_rounds}. Respond to the other panelists by name: build on points you agree with, challenge points you find weak, and refine your own position where the discussion has changed your view."#,
            history = Self::format_transcript(transcript),
        )
    }

    pub fn rebuttal(topic: &str, transcript: &[TranscriptEntry<'_>]) -> String {
        format!(
            r#"Question before the panel:

{topic}

Full discussion:
{history}

Give your rebuttal. Answer the strongest objection raised against your position, concede anything you now accept, and restate your final recommendation."#,
            history = Self::format_transcript(transcript),
        )
    }

    /// One line per utterance: `speaker (phase): content`
    pub fn format_transcript(transcript: &[TranscriptEntry<'_>]) -> String {
        if transcript.is_empty() {
            return "(nobody has spoken yet)".to_string();
        }
        transcript
            .iter()
            .map(|entry| {
                format!(
                    "{} ({}): {}",
                    entry.member.name(),
                    entry.utterance.phase_label(),
                    entry.utterance.content.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::phase::PanelPhase;
    use crate::session::entities::Utterance;

    #[test]
    fn test_member_system_includes_persona_and_conventions() {
        let member = PanelMember::new("cardiology-expert", "Dr. Heart", "Cardiologist", "You study hearts.");
        let prompt = PanelPromptTemplate::member_system(&member);
        assert!(prompt.starts_with("You study hearts."));
        assert!(prompt.contains("Dr. Heart"));
        assert!(prompt.contains("Confidence:"));
        assert!(prompt.contains("Sources:"));
    }

    #[test]
    fn test_opening_carries_only_topic() {
        let prompt = PanelPromptTemplate::opening("Is X safe?");
        assert!(prompt.contains("Is X safe?"));
        assert!(!prompt.contains("Discussion so far"));
    }

    #[test]
    fn test_transcript_format() {
        let member = PanelMember::new("a", "Alice", "Analyst", "p");
        let opening = Utterance {
            phase: PanelPhase::OpeningStatements,
            round: None,
            sequence: 0,
            content: "  Yes.  ".to_string(),
        };
        let reply = Utterance {
            phase: PanelPhase::Discussion,
            round: Some(1),
            sequence: 1,
            content: "Still yes.".to_string(),
        };
        let transcript = vec![
            TranscriptEntry {
                member: &member,
                utterance: &opening,
            },
            TranscriptEntry {
                member: &member,
                utterance: &reply,
            },
        ];
        assert_eq!(
            PanelPromptTemplate::format_transcript(&transcript),
            "Alice (opening statements): Yes.\n\nAlice (discussion round 1): Still yes."
        );

        let prompt = PanelPromptTemplate::discussion("Q", &transcript, 1, 2);
        assert!(prompt.contains("round 1 of 2"));
        assert!(prompt.contains("Alice (opening statements): Yes."));
    }
}
