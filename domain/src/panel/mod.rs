//! Panel domain
//!
//! Everything needed to decide *who* sits on a panel:
//!
//! - [`member::PanelMember`]: one virtual expert (persona + expertise tags)
//! - [`template::PanelTemplate`]: a named panel archetype with member bounds
//! - [`expertise`]: the static keyword index and persona catalog
//! - [`router::PanelRouter`]: question → template + ranked expertise list
//! - [`config::PanelConfiguration`]: the roster and flags for one session
//!
//! ```text
//! question ──► detect_expertise ──► score templates ──► expertise list
//!                (keyword index)      (catalog)          (bounded, filtered)
//! ```

pub mod config;
pub mod expertise;
pub mod member;
pub mod router;
pub mod template;

pub use config::{PanelConfiguration, RosterFit};
pub use expertise::{ExpertiseProfile, detect_expertise, persona_for, profile};
pub use member::{ExpertiseTag, PanelMember};
pub use router::{PanelRouter, RoutingDecision};
pub use template::{DEFAULT_TEMPLATE_KEY, PanelFormat, PanelTemplate, default_templates};
