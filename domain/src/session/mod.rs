//! Session domain: one deliberation from first statement to completion
//!
//! - [`phase`]: the forward-only phase state machine
//! - [`entities`]: the mutable session and its append-only utterances
//! - [`event`]: the chronological event stream a session emits

pub mod entities;
pub mod event;
pub mod phase;

pub use entities::{PanelSession, SessionId, TranscriptEntry, Utterance};
pub use event::PanelEvent;
pub use phase::{PanelPhase, PhaseFlags, phase_plan};
