//! Follow-up actions attached to plan items
//!
//! Actions run outside the session: they read the plan item and profile but
//! never touch the transcript, the plan or the screen.

use std::str::FromStr;
use tracing::debug;

use crate::error::AuraError;
use crate::gateway::Gateway;
use crate::plan::{EmailDraft, Event, Organization, PlanItem, ProjectPlan, TopicSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    FindOrganizations,
    DraftEmail,
    LearnMore,
    FindEvents,
    DraftPlan,
}

impl ActionKind {
    pub fn all() -> [ActionKind; 5] {
        [
            ActionKind::FindOrganizations,
            ActionKind::DraftEmail,
            ActionKind::LearnMore,
            ActionKind::FindEvents,
            ActionKind::DraftPlan,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::FindOrganizations => "find_organizations",
            ActionKind::DraftEmail => "draft_email",
            ActionKind::LearnMore => "learn_more",
            ActionKind::FindEvents => "find_events",
            ActionKind::DraftPlan => "draft_plan",
        }
    }

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::FindOrganizations => "団体を探す",
            ActionKind::DraftEmail => "連絡メールを作成する",
            ActionKind::LearnMore => "詳しく学ぶ",
            ActionKind::FindEvents => "イベントを探す",
            ActionKind::DraftPlan => "計画を立てる",
        }
    }
}

impl FromStr for ActionKind {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::all()
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AuraError::UnsupportedAction(s.to_string()))
    }
}

/// A fully-resolved action, ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FindOrganizations { query: String },
    DraftEmail { profile: String, organization: String },
    LearnMore { topic: String },
    FindEvents { query: String },
    DraftPlan { idea: String },
}

impl Action {
    pub fn new(kind: ActionKind, query: &str, profile: &str) -> Self {
        let query = query.to_string();
        match kind {
            ActionKind::FindOrganizations => Action::FindOrganizations { query },
            ActionKind::DraftEmail => Action::DraftEmail {
                profile: profile.to_string(),
                organization: query,
            },
            ActionKind::LearnMore => Action::LearnMore { topic: query },
            ActionKind::FindEvents => Action::FindEvents { query },
            ActionKind::DraftPlan => Action::DraftPlan { idea: query },
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::FindOrganizations { .. } => ActionKind::FindOrganizations,
            Action::DraftEmail { .. } => ActionKind::DraftEmail,
            Action::LearnMore { .. } => ActionKind::LearnMore,
            Action::FindEvents { .. } => ActionKind::FindEvents,
            Action::DraftPlan { .. } => ActionKind::DraftPlan,
        }
    }

    pub async fn run(&self, gateway: &dyn Gateway) -> Result<ActionResult, AuraError> {
        debug!(kind = self.kind().as_str(), "Action::run: called");
        match self {
            Action::FindOrganizations { query } => gateway.find_organizations(query).await.map(ActionResult::Organizations),
            Action::DraftEmail { profile, organization } => gateway
                .generate_contact_email(profile, organization)
                .await
                .map(|text| ActionResult::Email(EmailDraft::parse(&text))),
            Action::LearnMore { topic } => gateway.learn_more_about_topic(topic).await.map(ActionResult::Topic),
            Action::FindEvents { query } => gateway.find_events(query).await.map(ActionResult::Events),
            Action::DraftPlan { idea } => gateway.draft_project_plan(idea).await.map(ActionResult::ProjectPlan),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Organizations(Vec<Organization>),
    Email(EmailDraft),
    Topic(TopicSummary),
    Events(Vec<Event>),
    ProjectPlan(ProjectPlan),
}

/// What the user asked for by pressing an item's action button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// Overlay title, taken from the plan item
    pub title: String,
    pub action: Action,
}

impl ActionRequest {
    /// `None` when the item has no button; an error when its action type is unknown
    pub fn from_item(item: &dyn PlanItem, profile: &str) -> Option<Result<Self, AuraError>> {
        let (action_type, params) = match (item.action_type(), item.action_params()) {
            (Some(t), Some(p)) => (t, p),
            _ => return None,
        };
        Some(action_type.parse::<ActionKind>().map(|kind| Self {
            title: item.title().to_string(),
            action: Action::new(kind, &params.query, profile),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayState {
    Loading,
    Ready(ActionResult),
    Failed(String),
}

/// Transient panel showing one action's progress and outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub title: String,
    pub state: OverlayState,
}

impl Overlay {
    pub fn loading(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state: OverlayState::Loading,
        }
    }

    pub fn failed(title: impl Into<String>, error: &AuraError) -> Self {
        Self {
            title: title.into(),
            state: OverlayState::Failed(error.user_message()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == OverlayState::Loading
    }

    pub fn finish(&mut self, result: Result<ActionResult, AuraError>) {
        self.state = match result {
            Ok(result) => OverlayState::Ready(result),
            Err(e) => OverlayState::Failed(e.user_message()),
        };
    }
}
