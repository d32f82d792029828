pub mod action;
pub mod ai;
pub mod config;
pub mod error;
pub mod form;
pub mod gateway;
pub mod plan;
pub mod prompts;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use action::{Action, ActionKind, ActionRequest, ActionResult, Overlay, OverlayState};
pub use ai::GeminiClient;
pub use config::Config;
pub use error::AuraError;
pub use form::{Category, FormState, UNKNOWN_OPTION};
pub use gateway::{Gateway, GeminiGateway};
pub use plan::{
    ActionParams, ActionStep, ChatStep, ContributionPlan, EmailDraft, Event, Opportunity, Organization, PlanDraft,
    PlanItem, ProjectPlan, TopicSummary,
};
pub use session::{Call, Completion, Effect, Outcome, Phase, Reply, Screen, Session, Ticket, TransitionError};
pub use state::{Author, ChatMessage};
