//! Prompt and response-schema catalog
//!
//! Static instruction texts and output schemas, one set per gateway operation.
//! Schemas use the generation API's OpenAPI subset (upper-case type names).

use serde_json::{json, Value};

pub const CHAT_TEMPERATURE: f32 = 0.8;
pub const EMAIL_TEMPERATURE: f32 = 0.7;

pub const CHAT_SYSTEM_INSTRUCTION: &str = r#"
You are 'Aura', a friendly and encouraging AI navigator for social contribution.
Your goal is to help the user discover how their skills and interests can make a positive impact.
You MUST respond in a specific JSON format.
The JSON object must have three keys: "question" (a single, concise, inspiring question in Japanese), "options" (an array of three short, distinct answer choices in Japanese), and "isFinal" (a boolean).
Ask only ONE question at a time.
When "isFinal" is false, one of the three options MUST be a neutral choice like "わからない", "特にない", or "まだ決めていない", allowing the user to express uncertainty.
After your third question, you MUST set "isFinal" to true and provide a concluding message in the "question" field, with options that lead to generating the plan.
Keep your questions and options concise and inspiring.

Example response after the first question:
{
  "question": "素晴らしいスキルですね！そのスキルを、どんな人たちのために使ってみたいですか？",
  "options": ["子どもたち", "地域の人々", "まだ決めていない"],
  "isFinal": false
}

Example final response:
{
  "question": "ありがとうございます！素晴らしいお話が聞けました。そろそろ、あなただけの貢献プランを作成しませんか？",
  "options": ["はい、お願いします！", "楽しみです！", "プランを見せてください"],
  "isFinal": true
}
"#;

pub const PLAN_SYSTEM_INSTRUCTION: &str = r#"
You are a Social Impact Strategist. Based on the provided conversation, generate a concrete and inspiring contribution plan in Japanese.
The plan must be in a structured JSON format.
- For 'suggestedOpportunities', you MUST include an action. Primarily use 'find_organizations', but you can also use 'find_events' or 'learn_more' if more appropriate.
- For 'firstSteps', propose a variety of actionable steps using different actionTypes: 'find_organizations', 'learn_more', 'find_events', 'draft_plan', or 'draft_email'. These steps should guide the user from interest to action.
- Ensure all actionParams.query are relevant and specific in Japanese.
"#;

/// Wraps the plan's mood-board theme for the image model
const MOODBOARD_PREAMBLE: &str = "Create a set of 4 beautiful, aesthetic, and inspiring images for a mood board, \
representing community, collaboration, and positive social change. \
The style should be hopeful, clean, and modern. Theme: ";

pub fn plan_prompt(conversation: &str) -> String {
    format!("以下の会話を分析して、貢献計画を作成してください。\n\n{}", conversation)
}

pub fn moodboard_prompt(theme: &str) -> String {
    format!("{}{}", MOODBOARD_PREAMBLE, theme)
}

pub fn organizations_prompt(query: &str) -> String {
    format!(
        "「{}」に関連する日本のNPOやボランティア団体を3つ探し、以下のJSON形式でリストアップしてください。\
各団体について、公式サイトのURLも必ず含めてください。\n\n\
[\n  {{\n    \"name\": \"団体名\",\n    \"description\": \"活動内容の簡単な説明\",\n    \"url\": \"公式サイトのURL\"\n  }}\n]",
        query
    )
}

pub fn contact_email_prompt(profile: &str, organization: &str) -> String {
    format!(
        "以下のユーザープロフィールと団体名に基づき、ボランティアや貢献活動への参加を問い合わせる、丁寧で熱意の伝わるメールを作成してください。\n\n\
# ユーザープロフィール\n{}\n\n\
# 団体名\n{}\n\n\
メールは、自己紹介、貢献したい理由、自身のスキルがどう役立つか、具体的な活動について尋ねる内容を含めてください。\
件名も生成してください。件名は「件名：...」の形式で、本文はそれ以降に記述してください。",
        profile, organization
    )
}

pub fn learn_more_prompt(topic: &str) -> String {
    format!(
        "「{}」というトピックについて、初心者にも分かりやすく要点をまとめてください。関連するキーワードも3〜5個挙げてください。\
以下のJSON形式で回答してください。\n\n\
{{\n  \"summary\": \"トピックの要約\",\n  \"keywords\": [\"キーワード1\", \"キーワード2\", \"キーワード3\"]\n}}",
        topic
    )
}

pub fn events_prompt(query: &str) -> String {
    format!(
        "「{}」に関連する日本のオンラインまたはオフラインのイベントやワークショップを3つ探し、以下のJSON形式でリストアップしてください。\
各イベントについて、公式サイトのURLも必ず含めてください。\n\n\
[\n  {{\n    \"name\": \"イベント名\",\n    \"date\": \"開催日時や期間\",\n    \"url\": \"公式サイトや詳細ページのURL\"\n  }}\n]",
        query
    )
}

pub fn project_plan_prompt(idea: &str) -> String {
    format!(
        "「{}」というアイデアを実現するための、簡単なプロジェクト計画案を作成してください。具体的なステップを3〜5個挙げてください。\
以下のJSON形式で回答してください。\n\n\
{{\n  \"title\": \"プロジェクトのタイトル\",\n  \"steps\": [\"ステップ1の内容\", \"ステップ2の内容\", \"ステップ3の内容\"]\n}}",
        idea
    )
}

pub fn chat_step_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": { "type": "STRING" },
            "options": { "type": "ARRAY", "items": { "type": "STRING" } },
            "isFinal": { "type": "BOOLEAN" }
        },
        "required": ["question", "options", "isFinal"]
    })
}

fn action_params_schema(description: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "query": { "type": "STRING", "description": description }
        },
        "required": ["query"]
    })
}

pub fn contribution_plan_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "planTitle": {
                "type": "STRING",
                "description": "ユーザーの貢献活動を表す、キャッチーで感動的なタイトル。"
            },
            "summary": {
                "type": "STRING",
                "description": "ユーザーのスキルと情熱がどのように社会貢献に繋がるかを1〜2文で要約。"
            },
            "suggestedOpportunities": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING", "description": "具体的なボランティアやプロジェクトの機会の名称。" },
                        "description": { "type": "STRING", "description": "その活動内容の詳細な説明。" },
                        "requiredSkills": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "この活動にマッチするユーザーのスキルリスト。"
                        },
                        "impactStatement": { "type": "STRING", "description": "この貢献がもたらす社会的インパクトについての短い説明。" },
                        "actionType": {
                            "type": "STRING",
                            "enum": ["find_organizations", "find_events", "learn_more"],
                            "description": "この機会に関連するアクション種別。"
                        },
                        "actionParams": action_params_schema("アクションのための検索クエリやトピック。")
                    },
                    "required": ["title", "description", "requiredSkills", "impactStatement", "actionType", "actionParams"]
                },
                "description": "ユーザーにマッチする具体的な貢献の機会を2〜3個提案。"
            },
            "firstSteps": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING", "description": "実行すべき最初のステップのタイトル。" },
                        "description": { "type": "STRING", "description": "そのステップの具体的な内容。" },
                        "actionType": {
                            "type": "STRING",
                            "enum": ["find_organizations", "draft_email", "learn_more", "find_events", "draft_plan"],
                            "description": "ステップに対応するアクションの種別。アクションがない場合は省略。"
                        },
                        "actionParams": action_params_schema("アクションに必要なパラメータ。検索クエリ、トピック、アイデアなど。")
                    },
                    "required": ["title", "description"]
                },
                "description": "貢献を始めるための具体的な最初のステップを3つ提案。可能であれば、多様なアクションを紐付けること。"
            },
            "moodboardPrompt": {
                "type": "STRING",
                "description": "生成するムードボードの画像のコンセプトを説明する、英語の詳細なプロンプト。コミュニティ、協力、ポジティブな変化をテーマにすること。"
            }
        },
        "required": ["planTitle", "summary", "suggestedOpportunities", "firstSteps", "moodboardPrompt"]
    })
}

pub fn organizations_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "description": { "type": "STRING" },
                "url": { "type": "STRING" }
            },
            "required": ["name", "description", "url"]
        }
    })
}

pub fn topic_summary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "keywords": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["summary", "keywords"]
    })
}

pub fn events_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "date": { "type": "STRING" },
                "url": { "type": "STRING" }
            },
            "required": ["name", "date", "url"]
        }
    })
}

pub fn project_plan_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "steps": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["title", "steps"]
    })
}
