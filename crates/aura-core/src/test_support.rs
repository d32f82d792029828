//! Shared fixtures for unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::AuraError;
use crate::gateway::Gateway;
use crate::plan::{
    ActionParams, ActionStep, ChatStep, Event, Opportunity, Organization, PlanDraft, ProjectPlan, TopicSummary,
};
use crate::state::ChatMessage;

pub(crate) fn sample_draft() -> PlanDraft {
    PlanDraft {
        plan_title: "デザインで地域を元気に".to_string(),
        summary: "あなたのデザイン力が地域の魅力発信に繋がります。".to_string(),
        suggested_opportunities: vec![
            Opportunity {
                title: "NPOの広報物デザイン".to_string(),
                description: "チラシやWebバナーを制作".to_string(),
                required_skills: vec!["デザイン".to_string()],
                impact_statement: Some("支援者が増える".to_string()),
                action_type: Some("find_organizations".to_string()),
                action_params: Some(ActionParams {
                    query: "地域活性化 NPO デザイン".to_string(),
                }),
            },
            Opportunity {
                title: "地域イベントのポスター".to_string(),
                description: "商店街のお祭りを告知".to_string(),
                required_skills: vec![],
                impact_statement: None,
                action_type: None,
                action_params: None,
            },
        ],
        first_steps: vec![
            ActionStep {
                title: "団体を調べる".to_string(),
                description: "活動内容を比較".to_string(),
                action_type: Some("learn_more".to_string()),
                action_params: Some(ActionParams {
                    query: "プロボノ".to_string(),
                }),
            },
            ActionStep {
                title: "問い合わせる".to_string(),
                description: "メールを送る".to_string(),
                action_type: Some("draft_email".to_string()),
                action_params: Some(ActionParams {
                    query: "まちづくりNPO".to_string(),
                }),
            },
            ActionStep {
                title: "振り返る".to_string(),
                description: "一週間後に記録".to_string(),
                action_type: Some("draft_plan".to_string()),
                action_params: None,
            },
        ],
        moodboard_prompt: "neighbors painting a mural together".to_string(),
    }
}

pub(crate) fn question(text: &str) -> ChatStep {
    ChatStep {
        question: text.to_string(),
        options: vec!["はい".to_string(), "いいえ".to_string(), "まだ決めていない".to_string()],
        is_final: false,
    }
}

pub(crate) fn final_step() -> ChatStep {
    ChatStep {
        question: "そろそろプランを作成しませんか？".to_string(),
        options: vec![
            "はい、お願いします！".to_string(),
            "楽しみです！".to_string(),
            "プランを見せてください".to_string(),
        ],
        is_final: true,
    }
}

pub(crate) fn sample_images() -> Vec<String> {
    (1..=4).map(|i| format!("data:image/jpeg;base64,IMG{}", i)).collect()
}

/// In-memory gateway answering from a script and recording every call
pub(crate) struct ScriptedGateway {
    steps: Mutex<VecDeque<Result<ChatStep, AuraError>>>,
    plan: Mutex<Result<PlanDraft, AuraError>>,
    images: Mutex<Result<Vec<String>, AuraError>>,
    fail_actions: bool,
    calls: Mutex<Vec<&'static str>>,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            plan: Mutex::new(Ok(sample_draft())),
            images: Mutex::new(Ok(sample_images())),
            fail_actions: false,
            calls: Mutex::new(Vec::new()),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    /// Queue the answer of the next `next_chat_step` call
    pub(crate) fn step(self, step: Result<ChatStep, AuraError>) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    pub(crate) fn plan(self, plan: Result<PlanDraft, AuraError>) -> Self {
        *self.plan.lock().unwrap() = plan;
        self
    }

    pub(crate) fn images(self, images: Result<Vec<String>, AuraError>) -> Self {
        *self.images.lock().unwrap() = images;
        self
    }

    pub(crate) fn failing_actions(mut self) -> Self {
        self.fail_actions = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Transcripts passed to `next_chat_step` and `generate_contribution_plan`
    pub(crate) fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.transcripts.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn action<T>(&self, name: &'static str, value: T, error: AuraError) -> Result<T, AuraError> {
        self.record(name);
        if self.fail_actions {
            Err(error)
        } else {
            Ok(value)
        }
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn next_chat_step(&self, transcript: &[ChatMessage]) -> Result<ChatStep, AuraError> {
        self.record("next_chat_step");
        self.transcripts.lock().unwrap().push(transcript.to_vec());
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(question("ほかに教えてください")))
    }

    async fn generate_contribution_plan(&self, transcript: &[ChatMessage]) -> Result<PlanDraft, AuraError> {
        self.record("generate_contribution_plan");
        self.transcripts.lock().unwrap().push(transcript.to_vec());
        self.plan.lock().unwrap().clone()
    }

    async fn generate_images_for_plan(&self, _moodboard_prompt: &str) -> Result<Vec<String>, AuraError> {
        self.record("generate_images_for_plan");
        self.images.lock().unwrap().clone()
    }

    async fn find_organizations(&self, query: &str) -> Result<Vec<Organization>, AuraError> {
        let org = Organization {
            name: format!("{}の会", query),
            description: "地域の団体".to_string(),
            url: "https://example.org".to_string(),
        };
        self.action("find_organizations", vec![org], AuraError::OrganizationLookup)
    }

    async fn generate_contact_email(&self, _profile: &str, _organization: &str) -> Result<String, AuraError> {
        let text = "件名：参加のお問い合わせ\n\nはじめまして。".to_string();
        self.action("generate_contact_email", text, AuraError::EmailDraft)
    }

    async fn learn_more_about_topic(&self, topic: &str) -> Result<TopicSummary, AuraError> {
        let summary = TopicSummary {
            summary: format!("{}とは", topic),
            keywords: vec!["参加".to_string()],
        };
        self.action("learn_more_about_topic", summary, AuraError::TopicLookup)
    }

    async fn find_events(&self, query: &str) -> Result<Vec<Event>, AuraError> {
        let event = Event {
            name: format!("{}ワークショップ", query),
            date: "毎月第一土曜".to_string(),
            url: "https://example.org/events".to_string(),
        };
        self.action("find_events", vec![event], AuraError::EventLookup)
    }

    async fn draft_project_plan(&self, idea: &str) -> Result<ProjectPlan, AuraError> {
        let plan = ProjectPlan {
            title: idea.to_string(),
            steps: vec!["仲間を集める".to_string(), "場所を決める".to_string()],
        };
        self.action("draft_project_plan", plan, AuraError::ProjectPlan)
    }
}
