use ratatui::widgets::ListState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use aura_core::{
    ActionRequest, ActionResult, AuraError, Call, Category, Completion, FormState, Gateway, Overlay, PlanItem,
    Reply, Screen, Session,
};

/// Form section index of the free-text box, after the three option groups
pub const FREE_TEXT_SECTION: usize = 3;

/// Shown in turn while the plan is being built
pub const PROCESSING_MESSAGES: [&str; 4] = [
    "あなたの可能性を分析しています...",
    "スキルと社会のニーズを繋いでいます...",
    "最適なマッチングを探しています...",
    "インパクトの種を見つけています...",
];

/// Ticks each processing message stays up
const PROCESSING_MESSAGE_TICKS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: Session,
    pub chat_model: String,
    gateway: Arc<dyn Gateway>,
    export_dir: PathBuf,

    // Form state
    pub form: FormState,
    pub form_section: usize,
    pub form_state: ListState,
    pub free_text_cursor: usize,

    // Chat state
    pub chat_input: String,
    pub chat_cursor: usize,
    pub option_state: ListState,

    // Results state
    pub item_state: ListState,
    pub overlay: Option<Overlay>,
    pub overlay_scroll: u16,

    /// One-line feedback in the footer
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8,
    pub tick_count: u32,

    // Background calls
    pub pipeline_task: Option<JoinHandle<Completion>>,
    pub action_task: Option<JoinHandle<Result<ActionResult, AuraError>>>,
}

impl App {
    pub fn new(gateway: Arc<dyn Gateway>, chat_model: &str, export_dir: PathBuf) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            session: Session::new(),
            chat_model: chat_model.to_string(),
            gateway,
            export_dir,
            form: FormState::new(),
            form_section: 0,
            form_state: ListState::default().with_selected(Some(0)),
            free_text_cursor: 0,
            chat_input: String::new(),
            chat_cursor: 0,
            option_state: ListState::default(),
            item_state: ListState::default(),
            overlay: None,
            overlay_scroll: 0,
            status: None,
            animation_frame: 0,
            tick_count: 0,
            pipeline_task: None,
            action_task: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.session.screen()
    }

    fn dispatch(&mut self, call: Call) {
        let gateway = Arc::clone(&self.gateway);
        self.pipeline_task = Some(tokio::spawn(async move { call.run(gateway.as_ref()).await }));
    }

    fn reject(&mut self, message: String) {
        warn!("{}", message);
        self.status = Some(message);
    }

    // Form

    /// Category of the focused section, `None` on the free-text box
    pub fn current_category(&self) -> Option<Category> {
        Category::all().get(self.form_section).copied()
    }

    pub fn form_next_section(&mut self) {
        self.form_section = (self.form_section + 1) % (FREE_TEXT_SECTION + 1);
        self.form_state.select(Some(0));
    }

    pub fn form_prev_section(&mut self) {
        self.form_section = (self.form_section + FREE_TEXT_SECTION) % (FREE_TEXT_SECTION + 1);
        self.form_state.select(Some(0));
    }

    pub fn form_nav_down(&mut self) {
        if let Some(category) = self.current_category() {
            let len = category.options().len();
            let i = self.form_state.selected().map_or(0, |i| (i + 1).min(len - 1));
            self.form_state.select(Some(i));
        }
    }

    pub fn form_nav_up(&mut self) {
        let i = self.form_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.form_state.select(Some(i));
    }

    pub fn form_toggle(&mut self) {
        let Some(category) = self.current_category() else {
            return;
        };
        if let Some(value) = self.form_state.selected().and_then(|i| category.options().get(i)) {
            self.form.toggle(category, value);
        }
    }

    pub fn submit_form(&mut self) {
        match self.session.submit(self.form.clone()) {
            Ok(call) => {
                info!("Starting conversation");
                self.status = None;
                self.chat_input.clear();
                self.chat_cursor = 0;
                self.option_state.select(None);
                self.dispatch(call);
            }
            Err(e) => self.reject(format!("送信できません: {}", e)),
        }
    }

    // Chat

    /// Options plus the trailing free-text entry
    pub fn chat_choice_count(&self) -> usize {
        self.session.current_step().map_or(0, |step| step.options.len() + 1)
    }

    pub fn can_reply(&self) -> bool {
        self.session.current_step().is_some() && !self.session.is_thinking()
    }

    pub fn chat_nav_down(&mut self) {
        let count = self.chat_choice_count();
        if count > 0 {
            let i = self.option_state.selected().map_or(0, |i| (i + 1).min(count - 1));
            self.option_state.select(Some(i));
        }
    }

    pub fn chat_nav_up(&mut self) {
        let i = self.option_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.option_state.select(Some(i));
    }

    /// Pick the highlighted option, or open the free-text input on the last entry
    pub fn chat_select(&mut self) {
        let Some(selected) = self.option_state.selected() else {
            return;
        };
        if selected + 1 == self.chat_choice_count() {
            self.start_free_text();
        } else {
            self.reply(Reply::Choice(selected));
        }
    }

    pub fn start_free_text(&mut self) {
        if self.can_reply() {
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn send_chat_text(&mut self) {
        let text = std::mem::take(&mut self.chat_input);
        self.chat_cursor = 0;
        self.input_mode = InputMode::Normal;
        self.reply(Reply::Text(text));
    }

    pub fn reply(&mut self, reply: Reply) {
        match self.session.reply(reply) {
            Ok(call) => {
                self.status = None;
                self.option_state.select(None);
                self.dispatch(call);
            }
            Err(e) => self.reject(format!("回答できません: {}", e)),
        }
    }

    /// Back to the form with the previous answers filled in
    pub fn go_back(&mut self) {
        match self.session.go_back() {
            Ok(()) => {
                self.form = self.session.form_draft().clone();
                self.input_mode = InputMode::Normal;
                self.chat_input.clear();
                self.chat_cursor = 0;
                self.status = None;
            }
            Err(e) => self.reject(e.to_string()),
        }
    }

    pub fn reset(&mut self) {
        match self.session.reset() {
            Ok(()) => {
                self.form = FormState::new();
                self.form_section = 0;
                self.form_state.select(Some(0));
                self.free_text_cursor = 0;
                self.item_state.select(None);
                self.close_overlay();
                self.status = None;
            }
            Err(e) => self.reject(e.to_string()),
        }
    }

    // Results

    pub fn item_count(&self) -> usize {
        self.session.plan().map_or(0, |plan| plan.items().len())
    }

    pub fn items_nav_down(&mut self) {
        let count = self.item_count();
        if count > 0 {
            let i = self.item_state.selected().map_or(0, |i| (i + 1).min(count - 1));
            self.item_state.select(Some(i));
        }
    }

    pub fn items_nav_up(&mut self) {
        let i = self.item_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.item_state.select(Some(i));
    }

    /// Launch the highlighted item's follow-up action in an overlay
    pub fn run_selected_action(&mut self) {
        if self.overlay.is_some() {
            return;
        }
        let Some(plan) = self.session.plan() else {
            return;
        };
        let items = plan.items();
        let Some(item) = self.item_state.selected().and_then(|i| items.get(i).copied()) else {
            return;
        };

        match ActionRequest::from_item(item, self.session.profile()) {
            None => {
                self.status = Some(format!("「{}」にはアクションがありません", item.title()));
            }
            Some(Err(e)) => {
                warn!(error = ?e, "Plan item has an unusable action");
                self.overlay = Some(Overlay::failed(item.title(), &e));
            }
            Some(Ok(request)) => {
                info!(kind = request.action.kind().as_str(), "Running follow-up action");
                self.overlay = Some(Overlay::loading(request.title));
                self.overlay_scroll = 0;
                let gateway = Arc::clone(&self.gateway);
                let action = request.action;
                self.action_task = Some(tokio::spawn(async move { action.run(gateway.as_ref()).await }));
            }
        }
    }

    /// Dismiss the overlay; a result still in flight is dropped
    pub fn close_overlay(&mut self) {
        self.overlay = None;
        self.action_task = None;
        self.overlay_scroll = 0;
    }

    pub fn save_moodboard(&mut self) {
        let Some(plan) = self.session.plan() else {
            return;
        };
        self.status = Some(match plan.write_moodboard(&self.export_dir) {
            Ok(path) => {
                info!(path = %path.display(), "Saved mood board");
                format!("ムードボードを保存しました: {}", path.display())
            }
            Err(e) => {
                error!(error = %e, "Failed to save mood board");
                format!("ムードボードを保存できませんでした: {}", e)
            }
        });
    }

    // Background calls

    /// Collect finished background calls (called on every tick)
    pub async fn poll_tasks(&mut self) {
        if self.pipeline_task.as_ref().map_or(false, |task| task.is_finished()) {
            if let Some(task) = self.pipeline_task.take() {
                match task.await {
                    Ok(completion) => {
                        if self.session.complete(completion) {
                            self.on_session_advanced();
                        }
                    }
                    Err(e) => error!(error = %e, "Pipeline task failed"),
                }
            }
        }

        if self.action_task.as_ref().map_or(false, |task| task.is_finished()) {
            if let Some(task) = self.action_task.take() {
                match task.await {
                    Ok(result) => {
                        if let Some(overlay) = self.overlay.as_mut() {
                            overlay.finish(result);
                        }
                    }
                    Err(e) => error!(error = %e, "Action task failed"),
                }
            }
        }
    }

    fn on_session_advanced(&mut self) {
        match self.screen() {
            Screen::Chatting => self.option_state.select(Some(0)),
            Screen::Results => self.item_state.select(Some(0)),
            _ => {}
        }
    }

    // Animation

    pub fn is_busy(&self) -> bool {
        self.session.is_thinking() || self.overlay.as_ref().map_or(false, |o| o.is_loading())
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self.screen() == Screen::Processing {
            self.tick_count = self.tick_count.wrapping_add(1);
        } else {
            self.tick_count = 0;
        }
    }

    pub fn processing_message(&self) -> &'static str {
        let i = (self.tick_count / PROCESSING_MESSAGE_TICKS) as usize % PROCESSING_MESSAGES.len();
        PROCESSING_MESSAGES[i]
    }
}
