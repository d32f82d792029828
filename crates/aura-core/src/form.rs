//! Profile form state and the fixed option catalogs

use serde::{Deserialize, Serialize};

/// The "nothing in particular / not sure" choice present in every category
pub const UNKNOWN_OPTION: &str = "特にない・わからない";

pub const SKILL_OPTIONS: [&str; 13] = [
    "プログラミング",
    "デザイン",
    "マーケティング",
    "文章作成",
    "語学",
    "教育・教えること",
    "企画・運営",
    "分析・リサーチ",
    "料理・お菓子作り",
    "DIY・ものづくり",
    "写真・動画撮影",
    "コミュニケーション",
    UNKNOWN_OPTION,
];

pub const INTEREST_OPTIONS: [&str; 13] = [
    "子ども・教育",
    "環境・自然保護",
    "地域活性化",
    "国際協力",
    "動物愛護",
    "文化・アート",
    "スポーツ",
    "高齢者支援",
    "障がい者支援",
    "防災・災害支援",
    "テクノロジー",
    "健康・医療",
    UNKNOWN_OPTION,
];

pub const STYLE_OPTIONS: [&str; 9] = [
    "単発・1日からOK",
    "週1〜数時間で",
    "週末中心に",
    "オンラインで好きな時間に",
    "プロジェクト単位で（短期集中）",
    "長期的にじっくり",
    "スキルを活かしたい",
    "チームで活動したい",
    UNKNOWN_OPTION,
];

/// Appended to the profile to open the conversation
const KICKOFF_PROMPT: &str = "これらの情報をもとに、私にできそうな社会貢献について質問を始めてください。";

/// A multi-select section of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Skills,
    Interests,
    Styles,
}

impl Category {
    pub fn all() -> [Category; 3] {
        [Category::Skills, Category::Interests, Category::Styles]
    }

    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Category::Skills => &SKILL_OPTIONS,
            Category::Interests => &INTEREST_OPTIONS,
            Category::Styles => &STYLE_OPTIONS,
        }
    }

    /// Section heading on the form
    pub fn title(&self) -> &'static str {
        match self {
            Category::Skills => "あなたのスキル",
            Category::Interests => "関心のある分野",
            Category::Styles => "希望する活動スタイル",
        }
    }

    /// Label used for this category in the profile text
    pub fn profile_label(&self) -> &'static str {
        match self {
            Category::Skills => "スキル",
            Category::Interests => "興味・関心",
            Category::Styles => "希望する活動スタイル",
        }
    }
}

/// What the user filled into the profile form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub styles: Vec<String>,
    pub free_text: String,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self, category: Category) -> &[String] {
        match category {
            Category::Skills => &self.skills,
            Category::Interests => &self.interests,
            Category::Styles => &self.styles,
        }
    }

    fn selected_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Skills => &mut self.skills,
            Category::Interests => &mut self.interests,
            Category::Styles => &mut self.styles,
        }
    }

    pub fn is_selected(&self, category: Category, value: &str) -> bool {
        self.selected(category).iter().any(|v| v == value)
    }

    /// Toggle one option. The unknown option excludes every sibling in its category.
    pub fn toggle(&mut self, category: Category, value: &str) {
        let values = self.selected_mut(category);

        if value == UNKNOWN_OPTION {
            let was_selected = values.iter().any(|v| v == UNKNOWN_OPTION);
            values.clear();
            if !was_selected {
                values.push(UNKNOWN_OPTION.to_string());
            }
            return;
        }

        values.retain(|v| v != UNKNOWN_OPTION);
        if let Some(pos) = values.iter().position(|v| v == value) {
            values.remove(pos);
        } else {
            values.push(value.to_string());
        }
    }

    /// At least one field has content
    pub fn is_submittable(&self) -> bool {
        Category::all().iter().any(|c| !self.selected(*c).is_empty()) || !self.free_text.trim().is_empty()
    }

    /// Freeze the form into the profile block sent to the model and reused for email drafts
    pub fn profile_text(&self) -> String {
        let mut profile = String::from("私の情報です。\n");
        for category in Category::all() {
            let values = self.selected(category);
            if !values.is_empty() {
                profile.push_str(&format!("- {}: {}\n", category.profile_label(), values.join(", ")));
            }
        }
        let free_text = self.free_text.trim();
        if !free_text.is_empty() {
            profile.push_str(&format!("- その他: {}\n", free_text));
        }
        profile
    }
}

/// First user message of a conversation
pub fn opening_message(profile: &str) -> String {
    format!("{}{}", profile, KICKOFF_PROMPT)
}
