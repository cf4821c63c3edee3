//! Panel phase state machine
//!
//! Phases only ever move forward. Which phases are visited depends on
//! [`PhaseFlags`]; the transition function is [`PanelPhase::next`].
//!
//! ```text
//! Init ─► OpeningStatements ─► Discussion ─┬─► Rebuttals ─┬─► ConsensusBuilding ─┬─► Closing
//!                              (× rounds)  └──────────────┴──────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// Phase of a panel session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelPhase {
    Init,
    /// Every member introduces a position on the topic
    OpeningStatements,
    /// Members react to the transcript so far, once per round
    Discussion,
    /// Members answer the strongest objections raised against them
    Rebuttals,
    /// The consensus engine scores the finished transcript
    ConsensusBuilding,
    Closing,
}

/// Optional phases enabled for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseFlags {
    pub rebuttals: bool,
    pub consensus: bool,
}

impl PhaseFlags {
    pub fn new(rebuttals: bool, consensus: bool) -> Self {
        Self {
            rebuttals,
            consensus,
        }
    }
}

impl PanelPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelPhase::Init => "init",
            PanelPhase::OpeningStatements => "opening_statements",
            PanelPhase::Discussion => "discussion",
            PanelPhase::Rebuttals => "rebuttals",
            PanelPhase::ConsensusBuilding => "consensus_building",
            PanelPhase::Closing => "closing",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PanelPhase::Init => "Init",
            PanelPhase::OpeningStatements => "Opening Statements",
            PanelPhase::Discussion => "Discussion",
            PanelPhase::Rebuttals => "Rebuttals",
            PanelPhase::ConsensusBuilding => "Consensus Building",
            PanelPhase::Closing => "Closing",
        }
    }

    /// The phase that follows this one, or `None` after `Closing`.
    pub fn next(self, flags: PhaseFlags) -> Option<PanelPhase> {
        match self {
            PanelPhase::Init => Some(PanelPhase::OpeningStatements),
            PanelPhase::OpeningStatements => Some(PanelPhase::Discussion),
            PanelPhase::Discussion if flags.rebuttals => Some(PanelPhase::Rebuttals),
            PanelPhase::Discussion | PanelPhase::Rebuttals if flags.consensus => {
                Some(PanelPhase::ConsensusBuilding)
            }
            PanelPhase::Discussion | PanelPhase::Rebuttals | PanelPhase::ConsensusBuilding => {
                Some(PanelPhase::Closing)
            }
            PanelPhase::Closing => None,
        }
    }

    /// Whether members produce utterances during this phase
    pub fn is_speaking_phase(&self) -> bool {
        matches!(
            self,
            PanelPhase::OpeningStatements | PanelPhase::Discussion | PanelPhase::Rebuttals
        )
    }

    /// Event name used for utterances produced in this phase
    pub fn utterance_label(&self) -> Option<&'static str> {
        match self {
            PanelPhase::OpeningStatements => Some("statement"),
            PanelPhase::Discussion => Some("discussion"),
            PanelPhase::Rebuttals => Some("rebuttal"),
            _ => None,
        }
    }
}

impl std::fmt::Display for PanelPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Every phase a session with these flags passes through, in order.
pub fn phase_plan(flags: PhaseFlags) -> Vec<PanelPhase> {
    std::iter::successors(Some(PanelPhase::Init), |phase| phase.next(flags)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PanelPhase; 6] = [
        PanelPhase::Init,
        PanelPhase::OpeningStatements,
        PanelPhase::Discussion,
        PanelPhase::Rebuttals,
        PanelPhase::ConsensusBuilding,
        PanelPhase::Closing,
    ];

    #[test]
    fn test_full_plan() {
        assert_eq!(phase_plan(PhaseFlags::new(true, true)), ALL.to_vec());
    }

    #[test]
    fn test_plan_skips_disabled_phases() {
        assert_eq!(
            phase_plan(PhaseFlags::new(false, true)),
            vec![
                PanelPhase::Init,
                PanelPhase::OpeningStatements,
                PanelPhase::Discussion,
                PanelPhase::ConsensusBuilding,
                PanelPhase::Closing,
            ]
        );
        assert_eq!(
            phase_plan(PhaseFlags::new(true, false)),
            vec![
                PanelPhase::Init,
                PanelPhase::OpeningStatements,
                PanelPhase::Discussion,
                PanelPhase::Rebuttals,
                PanelPhase::Closing,
            ]
        );
        assert_eq!(
            phase_plan(PhaseFlags::default()),
            vec![
                PanelPhase::Init,
                PanelPhase::OpeningStatements,
                PanelPhase::Discussion,
                PanelPhase::Closing,
            ]
        );
    }

    #[test]
    fn test_transitions_never_go_backwards() {
        for rebuttals in [false, true] {
            for consensus in [false, true] {
                let flags = PhaseFlags::new(rebuttals, consensus);
                for phase in ALL {
                    if let Some(next) = phase.next(flags) {
                        assert!(next > phase, "{phase:?} -> {next:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_speaking_phases() {
        let speaking: Vec<_> = ALL.into_iter().filter(|p| p.is_speaking_phase()).collect();
        assert_eq!(
            speaking,
            vec![
                PanelPhase::OpeningStatements,
                PanelPhase::Discussion,
                PanelPhase::Rebuttals
            ]
        );
        assert_eq!(PanelPhase::Rebuttals.utterance_label(), Some("rebuttal"));
        assert_eq!(PanelPhase::Closing.utterance_label(), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&PanelPhase::ConsensusBuilding).unwrap();
        assert_eq!(json, "\"consensus_building\"");
        assert_eq!(PanelPhase::OpeningStatements.as_str(), "opening_statements");
    }
}
