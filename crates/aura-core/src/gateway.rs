//! LLM gateway: one method per remote operation
//!
//! The [`Gateway`] trait is the only seam between the wizard and the remote
//! model. [`GeminiGateway`] is the production implementation; tests drive the
//! session against scripted stand-ins.
//!
//! Every failure is logged here with its technical detail and returned as the
//! operation's [`AuraError`]. Nothing is retried or cached.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::ai::{ApiError, ContentRequest, GeminiClient, ImageRequest, Turn};
use crate::config::Config;
use crate::error::AuraError;
use crate::plan::{
    ChatStep, Event, Organization, PlanDraft, ProjectPlan, TopicSummary, MAX_KEYWORDS, MAX_LOOKUP_RESULTS,
    MAX_PROJECT_STEPS, MOODBOARD_IMAGE_COUNT,
};
use crate::prompts;
use crate::state::{flatten_transcript, ChatMessage};

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Ask for the next question given the whole transcript so far
    async fn next_chat_step(&self, transcript: &[ChatMessage]) -> Result<ChatStep, AuraError>;

    /// Turn a finished conversation into a plan (images not included)
    async fn generate_contribution_plan(&self, transcript: &[ChatMessage]) -> Result<PlanDraft, AuraError>;

    /// Render the mood board, returning image data URIs
    async fn generate_images_for_plan(&self, moodboard_prompt: &str) -> Result<Vec<String>, AuraError>;

    async fn find_organizations(&self, query: &str) -> Result<Vec<Organization>, AuraError>;

    /// Raw email text, subject embedded as a `件名：` line
    async fn generate_contact_email(&self, profile: &str, organization: &str) -> Result<String, AuraError>;

    async fn learn_more_about_topic(&self, topic: &str) -> Result<TopicSummary, AuraError>;

    async fn find_events(&self, query: &str) -> Result<Vec<Event>, AuraError>;

    async fn draft_project_plan(&self, idea: &str) -> Result<ProjectPlan, AuraError>;
}

/// Gateway backed by the Gemini text and image models
#[derive(Clone)]
pub struct GeminiGateway {
    client: GeminiClient,
    chat_model: String,
    image_model: String,
}

/// Internal failure: either transport or a payload that broke its contract
#[derive(Debug)]
enum CallFailure {
    Api(ApiError),
    Contract(String),
}

impl From<ApiError> for CallFailure {
    fn from(e: ApiError) -> Self {
        CallFailure::Api(e)
    }
}

impl std::fmt::Display for CallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallFailure::Api(e) => write!(f, "{}", e),
            CallFailure::Contract(reason) => write!(f, "contract violation: {}", reason),
        }
    }
}

/// Log the technical detail and swap in the domain error
fn fail<T>(operation: &str, result: Result<T, CallFailure>, domain: AuraError) -> Result<T, AuraError> {
    result.map_err(|e| {
        error!(operation, error = %e, "gateway call failed");
        domain
    })
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    Ok(serde_json::from_str(text.trim())?)
}

impl GeminiGateway {
    pub fn new(client: GeminiClient, chat_model: &str, image_model: &str) -> Self {
        Self {
            client,
            chat_model: chat_model.to_string(),
            image_model: image_model.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            GeminiClient::new(&config.base_url, &config.api_key),
            &config.chat_model,
            &config.image_model,
        )
    }

    /// Run a single-prompt structured call and parse the JSON answer
    async fn structured<T: DeserializeOwned>(
        &self,
        prompt: String,
        schema: serde_json::Value,
    ) -> Result<T, CallFailure> {
        let mut request = ContentRequest::prompt(&self.chat_model, prompt);
        request.response_schema = Some(schema);
        let text = self.client.generate_content(&request).await?;
        Ok(parse_json(&text)?)
    }

    async fn chat_step(&self, transcript: &[ChatMessage]) -> Result<ChatStep, CallFailure> {
        let request = ContentRequest {
            model: self.chat_model.clone(),
            turns: transcript
                .iter()
                .map(|m| Turn::new(m.author.api_role(), m.text.clone()))
                .collect(),
            system_instruction: Some(prompts::CHAT_SYSTEM_INSTRUCTION.to_string()),
            temperature: Some(prompts::CHAT_TEMPERATURE),
            response_schema: Some(prompts::chat_step_schema()),
        };
        let text = self.client.generate_content(&request).await?;
        let step: ChatStep = parse_json(&text)?;
        step.validate().map_err(CallFailure::Contract)?;
        Ok(step)
    }

    async fn plan(&self, transcript: &[ChatMessage]) -> Result<PlanDraft, CallFailure> {
        let request = ContentRequest {
            model: self.chat_model.clone(),
            turns: vec![Turn::new("user", prompts::plan_prompt(&flatten_transcript(transcript)))],
            system_instruction: Some(prompts::PLAN_SYSTEM_INSTRUCTION.to_string()),
            temperature: None,
            response_schema: Some(prompts::contribution_plan_schema()),
        };
        let text = self.client.generate_content(&request).await?;
        let draft: PlanDraft = parse_json(&text)?;
        draft.validate().map_err(CallFailure::Contract)?;
        Ok(draft)
    }

    async fn images(&self, moodboard_prompt: &str) -> Result<Vec<String>, CallFailure> {
        let request = ImageRequest {
            model: self.image_model.clone(),
            prompt: prompts::moodboard_prompt(moodboard_prompt),
            count: MOODBOARD_IMAGE_COUNT,
            aspect_ratio: "1:1".to_string(),
            mime_type: "image/jpeg".to_string(),
        };
        let images = self.client.generate_images(&request).await?;
        if images.len() != MOODBOARD_IMAGE_COUNT {
            return Err(CallFailure::Contract(format!(
                "got {} images, expected {}",
                images.len(),
                MOODBOARD_IMAGE_COUNT
            )));
        }
        Ok(images)
    }

    async fn email(&self, profile: &str, organization: &str) -> Result<String, CallFailure> {
        let mut request = ContentRequest::prompt(&self.chat_model, prompts::contact_email_prompt(profile, organization));
        request.temperature = Some(prompts::EMAIL_TEMPERATURE);
        Ok(self.client.generate_content(&request).await?)
    }
}

/// Keep at most `max` entries, noting when the model overshot
fn cap<T>(operation: &str, mut items: Vec<T>, max: usize) -> Vec<T> {
    if items.len() > max {
        warn!(operation, returned = items.len(), max, "truncating oversized result");
        items.truncate(max);
    }
    items
}

#[async_trait]
impl Gateway for GeminiGateway {
    async fn next_chat_step(&self, transcript: &[ChatMessage]) -> Result<ChatStep, AuraError> {
        debug!(messages = transcript.len(), "next_chat_step: called");
        fail("next_chat_step", self.chat_step(transcript).await, AuraError::ChatStep)
    }

    async fn generate_contribution_plan(&self, transcript: &[ChatMessage]) -> Result<PlanDraft, AuraError> {
        debug!(messages = transcript.len(), "generate_contribution_plan: called");
        fail(
            "generate_contribution_plan",
            self.plan(transcript).await,
            AuraError::PlanGeneration,
        )
    }

    async fn generate_images_for_plan(&self, moodboard_prompt: &str) -> Result<Vec<String>, AuraError> {
        debug!("generate_images_for_plan: called");
        fail(
            "generate_images_for_plan",
            self.images(moodboard_prompt).await,
            AuraError::ImageGeneration,
        )
    }

    async fn find_organizations(&self, query: &str) -> Result<Vec<Organization>, AuraError> {
        debug!(%query, "find_organizations: called");
        let result = self
            .structured::<Vec<Organization>>(prompts::organizations_prompt(query), prompts::organizations_schema())
            .await;
        fail("find_organizations", result, AuraError::OrganizationLookup)
            .map(|orgs| cap("find_organizations", orgs, MAX_LOOKUP_RESULTS))
    }

    async fn generate_contact_email(&self, profile: &str, organization: &str) -> Result<String, AuraError> {
        debug!(%organization, "generate_contact_email: called");
        fail(
            "generate_contact_email",
            self.email(profile, organization).await,
            AuraError::EmailDraft,
        )
    }

    async fn learn_more_about_topic(&self, topic: &str) -> Result<TopicSummary, AuraError> {
        debug!(%topic, "learn_more_about_topic: called");
        let result = self
            .structured::<TopicSummary>(prompts::learn_more_prompt(topic), prompts::topic_summary_schema())
            .await;
        fail("learn_more_about_topic", result, AuraError::TopicLookup).map(|mut summary| {
            summary.keywords = cap("learn_more_about_topic", summary.keywords, MAX_KEYWORDS);
            summary
        })
    }

    async fn find_events(&self, query: &str) -> Result<Vec<Event>, AuraError> {
        debug!(%query, "find_events: called");
        let result = self
            .structured::<Vec<Event>>(prompts::events_prompt(query), prompts::events_schema())
            .await;
        fail("find_events", result, AuraError::EventLookup).map(|events| cap("find_events", events, MAX_LOOKUP_RESULTS))
    }

    async fn draft_project_plan(&self, idea: &str) -> Result<ProjectPlan, AuraError> {
        debug!(%idea, "draft_project_plan: called");
        let result = self
            .structured::<ProjectPlan>(prompts::project_plan_prompt(idea), prompts::project_plan_schema())
            .await;
        fail("draft_project_plan", result, AuraError::ProjectPlan).map(|mut plan| {
            plan.steps = cap("draft_project_plan", plan.steps, MAX_PROJECT_STEPS);
            plan
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_truncates() {
        assert_eq!(cap("t", vec![1, 2, 3, 4], 3), vec![1, 2, 3]);
        assert_eq!(cap("t", vec![1], 3), vec![1]);
    }

    #[test]
    fn test_parse_json_trims_whitespace() {
        let step: ChatStep = parse_json("\n {\"question\":\"q\",\"options\":[\"a\",\"b\",\"c\"],\"isFinal\":true} \n").unwrap();
        assert!(step.is_final);
        assert!(parse_json::<ChatStep>("not json").is_err());
    }

    #[test]
    fn test_fail_maps_to_domain_error() {
        let result: Result<(), CallFailure> = Err(CallFailure::Contract("bad".to_string()));
        assert_eq!(fail("op", result, AuraError::EventLookup), Err(AuraError::EventLookup));
    }
}
