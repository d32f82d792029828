//! Model-produced payloads: chat steps, the contribution plan and the
//! auxiliary lookup results.
//!
//! Field names follow the JSON the model is asked to emit (camelCase), so the
//! schemas in [`crate::prompts`] and these types must change together.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Options the model must offer on every chat step
pub const CHAT_OPTION_COUNT: usize = 3;
pub const MIN_OPPORTUNITIES: usize = 2;
pub const MAX_OPPORTUNITIES: usize = 3;
pub const FIRST_STEP_COUNT: usize = 3;
pub const MOODBOARD_IMAGE_COUNT: usize = 4;
pub const MAX_LOOKUP_RESULTS: usize = 3;
pub const MAX_KEYWORDS: usize = 5;
pub const MAX_PROJECT_STEPS: usize = 5;

/// One turn of the scripted dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStep {
    pub question: String,
    pub options: Vec<String>,
    pub is_final: bool,
}

impl ChatStep {
    /// Check the step against the chat contract, returning the reason on mismatch
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("chat step has an empty question".to_string());
        }
        if self.options.len() != CHAT_OPTION_COUNT {
            return Err(format!(
                "chat step has {} options, expected {}",
                self.options.len(),
                CHAT_OPTION_COUNT
            ));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err("chat step has an empty option".to_string());
        }
        Ok(())
    }
}

/// Query payload attached to an actionable plan item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParams {
    pub query: String,
}

/// Anything in a plan that may carry a follow-up action button
pub trait PlanItem {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    fn action_type(&self) -> Option<&str>;
    fn action_params(&self) -> Option<&ActionParams>;

    /// A button is offered only when both halves of the action are present
    fn has_action(&self) -> bool {
        self.action_type().is_some() && self.action_params().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub impact_statement: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_params: Option<ActionParams>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_params: Option<ActionParams>,
}

impl PlanItem for Opportunity {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn action_type(&self) -> Option<&str> {
        self.action_type.as_deref()
    }

    fn action_params(&self) -> Option<&ActionParams> {
        self.action_params.as_ref()
    }
}

impl PlanItem for ActionStep {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn action_type(&self) -> Option<&str> {
        self.action_type.as_deref()
    }

    fn action_params(&self) -> Option<&ActionParams> {
        self.action_params.as_ref()
    }
}

/// The plan as generated, before mood-board images are attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDraft {
    pub plan_title: String,
    pub summary: String,
    pub suggested_opportunities: Vec<Opportunity>,
    pub first_steps: Vec<ActionStep>,
    pub moodboard_prompt: String,
}

impl PlanDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.plan_title.trim().is_empty() {
            return Err("plan has an empty title".to_string());
        }
        let opportunities = self.suggested_opportunities.len();
        if !(MIN_OPPORTUNITIES..=MAX_OPPORTUNITIES).contains(&opportunities) {
            return Err(format!(
                "plan has {} opportunities, expected {}..={}",
                opportunities, MIN_OPPORTUNITIES, MAX_OPPORTUNITIES
            ));
        }
        if self.first_steps.len() != FIRST_STEP_COUNT {
            return Err(format!(
                "plan has {} first steps, expected {}",
                self.first_steps.len(),
                FIRST_STEP_COUNT
            ));
        }
        if self.moodboard_prompt.trim().is_empty() {
            return Err("plan has an empty moodboard prompt".to_string());
        }
        Ok(())
    }

    pub fn with_images(self, images: Vec<String>) -> ContributionPlan {
        ContributionPlan {
            plan_title: self.plan_title,
            summary: self.summary,
            suggested_opportunities: self.suggested_opportunities,
            first_steps: self.first_steps,
            moodboard_prompt: self.moodboard_prompt,
            images,
        }
    }
}

/// The finished plan shown on the results screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionPlan {
    pub plan_title: String,
    pub summary: String,
    pub suggested_opportunities: Vec<Opportunity>,
    pub first_steps: Vec<ActionStep>,
    pub moodboard_prompt: String,
    /// `data:image/jpeg;base64,...` URIs
    pub images: Vec<String>,
}

impl ContributionPlan {
    /// Opportunities then first steps, in display order
    pub fn items(&self) -> Vec<&dyn PlanItem> {
        self.suggested_opportunities
            .iter()
            .map(|o| o as &dyn PlanItem)
            .chain(self.first_steps.iter().map(|s| s as &dyn PlanItem))
            .collect()
    }

    /// Standalone page showing the mood board, since a terminal can't
    pub fn moodboard_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", escape_html(&self.plan_title)));
        html.push_str("<style>body{font-family:sans-serif;max-width:960px;margin:2rem auto}");
        html.push_str(".grid{display:grid;grid-template-columns:1fr 1fr;gap:1rem}img{width:100%;border-radius:8px}</style>\n");
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", escape_html(&self.plan_title)));
        html.push_str(&format!("<p>{}</p>\n", escape_html(&self.summary)));
        html.push_str("<div class=\"grid\">\n");
        for (i, src) in self.images.iter().enumerate() {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"Mood board image {}\">\n",
                escape_html(src),
                i + 1
            ));
        }
        html.push_str("</div>\n</body>\n</html>\n");
        html
    }

    /// Write the mood board page into `dir`, returning the file path
    pub fn write_moodboard(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join("moodboard.html");
        fs::write(&path, self.moodboard_html())?;
        Ok(path)
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub date: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub summary: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPlan {
    pub title: String,
    pub steps: Vec<String>,
}

/// A contact email split into its subject line and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    pub subject: Option<String>,
    pub body: String,
}

fn subject_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*件名\s*[：:]\s*(.+?)\s*$").expect("valid subject regex"))
}

impl EmailDraft {
    /// Split the model's `件名：...` line off the rest of the text
    pub fn parse(text: &str) -> Self {
        match subject_regex().captures(text) {
            Some(caps) => {
                let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
                let subject = caps.get(1).map(|m| m.as_str().to_string());
                Self {
                    subject,
                    body: text[whole..].trim().to_string(),
                }
            }
            None => Self {
                subject: None,
                body: text.trim().to_string(),
            },
        }
    }
}
