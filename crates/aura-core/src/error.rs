//! Domain error types
//!
//! Every variant displays as the short user-facing message shown in the UI.
//! Technical detail is logged where the failure is caught, not carried here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuraError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("AIとの対話中にエラーが発生しました。")]
    ChatStep,

    #[error("貢献プランの作成中にエラーが発生しました。")]
    PlanGeneration,

    #[error("画像の生成中にエラーが発生しました。")]
    ImageGeneration,

    #[error("団体の検索中にエラーが発生しました。")]
    OrganizationLookup,

    #[error("メールの作成中にエラーが発生しました。")]
    EmailDraft,

    #[error("トピックの学習中にエラーが発生しました。")]
    TopicLookup,

    #[error("イベントの検索中にエラーが発生しました。")]
    EventLookup,

    #[error("計画の作成中にエラーが発生しました。")]
    ProjectPlan,

    #[error("未対応のアクションです。")]
    UnsupportedAction(String),
}

/// Fallback shown when a failure carries no message of its own
pub const UNKNOWN_ERROR_MESSAGE: &str = "不明なエラーが発生しました。";

impl AuraError {
    /// Message to put in front of the user
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}
