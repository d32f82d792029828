//! Conversation and plan state machine
//!
//! Transitions never await. Each accepted event returns a [`Call`] describing
//! the remote work to do; the driver runs it against a [`Gateway`] and feeds
//! the resulting [`Completion`] back through [`Session::complete`].

use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AuraError;
use crate::form::{opening_message, FormState};
use crate::gateway::Gateway;
use crate::plan::{ChatStep, ContributionPlan};
use crate::state::{Author, ChatMessage};

/// Non-final questions allowed before the next step is forced final
pub const MAX_QUESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Initial,
    Chatting,
    Processing,
    Results,
    Error,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Initial => "initial",
            Screen::Chatting => "chatting",
            Screen::Processing => "processing",
            Screen::Results => "results",
            Screen::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Initial,
    Chatting {
        transcript: Vec<ChatMessage>,
        /// Step awaiting an answer; `None` while the next one is being fetched
        step: Option<ChatStep>,
    },
    Processing {
        transcript: Vec<ChatMessage>,
    },
    Results {
        plan: ContributionPlan,
    },
    Error {
        message: String,
    },
}

impl Phase {
    pub fn screen(&self) -> Screen {
        match self {
            Phase::Initial => Screen::Initial,
            Phase::Chatting { .. } => Screen::Chatting,
            Phase::Processing { .. } => Screen::Processing,
            Phase::Results { .. } => Screen::Results,
            Phase::Error { .. } => Screen::Error,
        }
    }
}

/// The user's answer to the current step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Index into the step's options
    Choice(usize),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("the form is empty")]
    EmptyForm,

    #[error("a request is already in flight")]
    Busy,

    #[error("cannot {event} while {screen}")]
    InvalidState { event: &'static str, screen: Screen },

    #[error("no option at index {0}")]
    NoSuchOption(usize),

    #[error("the reply is empty")]
    EmptyReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    NextStep { transcript: Vec<ChatMessage> },
    /// Plan first, then the mood board for it
    Finalize { transcript: Vec<ChatMessage> },
}

/// Remote work requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub ticket: Ticket,
    pub effect: Effect,
}

impl Call {
    pub async fn run(self, gateway: &dyn Gateway) -> Completion {
        let outcome = match self.effect {
            Effect::NextStep { transcript } => Outcome::Step(gateway.next_chat_step(&transcript).await),
            Effect::Finalize { transcript } => Outcome::Plan(build_plan(gateway, &transcript).await),
        };
        Completion {
            ticket: self.ticket,
            outcome,
        }
    }
}

async fn build_plan(gateway: &dyn Gateway, transcript: &[ChatMessage]) -> Result<ContributionPlan, AuraError> {
    let draft = gateway.generate_contribution_plan(transcript).await?;
    let images = gateway.generate_images_for_plan(&draft.moodboard_prompt).await?;
    Ok(draft.with_images(images))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Step(Result<ChatStep, AuraError>),
    Plan(Result<ContributionPlan, AuraError>),
}

/// Result of a [`Call`], to be fed back into the session that issued it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    phase: Phase,
    /// Last submitted form, restored when the user goes back
    form: FormState,
    profile: String,
    pending: Option<Ticket>,
    next_ticket: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Initial,
            form: FormState::default(),
            profile: String::new(),
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn screen(&self) -> Screen {
        self.phase.screen()
    }

    pub fn is_thinking(&self) -> bool {
        self.pending.is_some()
    }

    pub fn form_draft(&self) -> &FormState {
        &self.form
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        match &self.phase {
            Phase::Chatting { transcript, .. } | Phase::Processing { transcript } => transcript,
            _ => &[],
        }
    }

    pub fn current_step(&self) -> Option<&ChatStep> {
        match &self.phase {
            Phase::Chatting { step, .. } => step.as_ref(),
            _ => None,
        }
    }

    /// Picking an option now builds the plan
    pub fn finalize_ready(&self) -> bool {
        self.current_step().map_or(false, |step| step.is_final)
    }

    pub fn plan(&self) -> Option<&ContributionPlan> {
        match &self.phase {
            Phase::Results { plan } => Some(plan),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error { message } => Some(message),
            _ => None,
        }
    }

    fn issue(&mut self, effect: Effect) -> Call {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(ticket);
        Call { ticket, effect }
    }

    fn invalid(&self, event: &'static str) -> TransitionError {
        TransitionError::InvalidState {
            event,
            screen: self.screen(),
        }
    }

    /// Start the conversation from a filled-in form
    pub fn submit(&mut self, form: FormState) -> Result<Call, TransitionError> {
        if self.screen() != Screen::Initial {
            return Err(self.invalid("submit"));
        }
        if self.is_thinking() {
            return Err(TransitionError::Busy);
        }
        if !form.is_submittable() {
            return Err(TransitionError::EmptyForm);
        }

        self.profile = form.profile_text();
        self.form = form;
        let transcript = vec![ChatMessage::user(opening_message(&self.profile))];
        debug!("submit: starting conversation");

        self.phase = Phase::Chatting {
            transcript: transcript.clone(),
            step: None,
        };
        Ok(self.issue(Effect::NextStep { transcript }))
    }

    /// Answer the current step. Choosing an option on a final step builds the plan.
    pub fn reply(&mut self, reply: Reply) -> Result<Call, TransitionError> {
        if self.is_thinking() {
            return Err(TransitionError::Busy);
        }
        let invalid = self.invalid("reply");
        let (transcript, step) = match &mut self.phase {
            Phase::Chatting {
                transcript,
                step: Some(step),
            } => (transcript, step),
            _ => return Err(invalid),
        };

        let (text, finalize) = match reply {
            Reply::Choice(index) => {
                let option = step.options.get(index).ok_or(TransitionError::NoSuchOption(index))?;
                (option.clone(), step.is_final)
            }
            Reply::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(TransitionError::EmptyReply);
                }
                (text.to_string(), false)
            }
        };

        transcript.push(ChatMessage::user(text));
        let transcript = transcript.clone();
        debug!(finalize, messages = transcript.len(), "reply: accepted");

        if finalize {
            self.phase = Phase::Processing {
                transcript: transcript.clone(),
            };
            Ok(self.issue(Effect::Finalize { transcript }))
        } else {
            self.phase = Phase::Chatting {
                transcript: transcript.clone(),
                step: None,
            };
            Ok(self.issue(Effect::NextStep { transcript }))
        }
    }

    /// Abandon the conversation and return to the form, keeping what was entered
    pub fn go_back(&mut self) -> Result<(), TransitionError> {
        if self.screen() != Screen::Chatting {
            return Err(self.invalid("go back"));
        }
        debug!("go_back: discarding conversation");
        self.phase = Phase::Initial;
        self.pending = None;
        Ok(())
    }

    /// Clear everything and return to an empty form
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        if !matches!(self.screen(), Screen::Results | Screen::Error) {
            return Err(self.invalid("reset"));
        }
        debug!("reset: clearing session");
        *self = Session {
            next_ticket: self.next_ticket,
            ..Session::new()
        };
        Ok(())
    }

    /// Apply a finished call. Returns false when the completion is stale and was dropped.
    pub fn complete(&mut self, completion: Completion) -> bool {
        if self.pending != Some(completion.ticket) {
            warn!(ticket = completion.ticket.0, "complete: dropping stale completion");
            return false;
        }
        self.pending = None;

        match completion.outcome {
            Outcome::Step(Ok(mut next)) => match &mut self.phase {
                Phase::Chatting { transcript, step } => {
                    let asked = transcript.iter().filter(|m| m.author == Author::Agent).count();
                    if !next.is_final && asked >= MAX_QUESTIONS {
                        warn!(asked, "complete: question limit reached, treating step as final");
                        next.is_final = true;
                    }
                    transcript.push(ChatMessage::agent(next.question.clone()));
                    *step = Some(next);
                }
                _ => {
                    warn!(screen = %self.screen(), "complete: chat step arrived outside a conversation");
                    return false;
                }
            },
            Outcome::Plan(Ok(plan)) => {
                debug!(title = %plan.plan_title, "complete: plan ready");
                self.phase = Phase::Results { plan };
            }
            Outcome::Step(Err(e)) | Outcome::Plan(Err(e)) => {
                self.phase = Phase::Error {
                    message: e.user_message(),
                };
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionRequest, ActionResult};
    use crate::test_support::{final_step, question, sample_draft, sample_images, ScriptedGateway};

    fn skills_form() -> FormState {
        FormState {
            skills: vec!["プログラミング".to_string()],
            ..FormState::default()
        }
    }

    async fn drive(session: &mut Session, call: Call, gateway: &ScriptedGateway) -> bool {
        let completion = call.run(gateway).await;
        session.complete(completion)
    }

    /// Session sitting on a final step, after one non-final question
    async fn at_final_step(gateway: &ScriptedGateway) -> Session {
        let mut session = Session::new();
        let call = session.submit(skills_form()).unwrap();
        drive(&mut session, call, gateway).await;
        let call = session.reply(Reply::Choice(0)).unwrap();
        drive(&mut session, call, gateway).await;
        assert!(session.finalize_ready());
        session
    }

    #[test]
    fn test_empty_form_is_rejected() {
        let mut session = Session::new();
        assert_eq!(session.submit(FormState::default()), Err(TransitionError::EmptyForm));
        assert_eq!(session, Session::new());
    }

    #[tokio::test]
    async fn test_submit_sends_profile_only() {
        let gateway = ScriptedGateway::new().step(Ok(question("誰のために？")));
        let mut session = Session::new();

        let call = session.submit(skills_form()).unwrap();
        assert_eq!(session.screen(), Screen::Chatting);
        assert!(session.is_thinking());
        assert!(drive(&mut session, call, &gateway).await);

        let sent = &gateway.transcripts()[0];
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].author, Author::User);
        assert!(sent[0].text.contains("スキル: プログラミング"));
        assert!(!sent[0].text.contains("興味・関心"));

        assert!(!session.is_thinking());
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1].text, "誰のために？");
        assert!(!session.finalize_ready());
    }

    #[tokio::test]
    async fn test_question_cap_forces_final() {
        let gateway = ScriptedGateway::new()
            .step(Ok(question("一つ目")))
            .step(Ok(question("二つ目")))
            .step(Ok(question("三つ目")))
            .step(Ok(question("四つ目")));
        let mut session = Session::new();

        let call = session.submit(skills_form()).unwrap();
        drive(&mut session, call, &gateway).await;
        for _ in 0..3 {
            assert!(!session.finalize_ready());
            let call = session.reply(Reply::Choice(1)).unwrap();
            drive(&mut session, call, &gateway).await;
        }

        let agent_turns = session.transcript().iter().filter(|m| m.author == Author::Agent).count();
        assert_eq!(agent_turns, 4);
        assert!(session.finalize_ready());
        assert_eq!(session.current_step().unwrap().question, "四つ目");
    }

    #[tokio::test]
    async fn test_go_back_keeps_form() {
        let gateway = ScriptedGateway::new();
        let mut session = Session::new();
        let call = session.submit(skills_form()).unwrap();
        drive(&mut session, call, &gateway).await;

        session.go_back().unwrap();
        assert_eq!(session.screen(), Screen::Initial);
        assert_eq!(session.form_draft(), &skills_form());
        assert!(session.transcript().is_empty());
        assert!(session.current_step().is_none());
    }

    #[tokio::test]
    async fn test_stale_completion_after_go_back() {
        let gateway = ScriptedGateway::new().step(Ok(question("遅れて届く")));
        let mut session = Session::new();
        let call = session.submit(skills_form()).unwrap();

        session.go_back().unwrap();
        assert!(!session.is_thinking());
        assert!(!drive(&mut session, call, &gateway).await);
        assert_eq!(session.screen(), Screen::Initial);

        // a fresh submit is not confused by the old ticket
        let call = session.submit(skills_form()).unwrap();
        assert!(drive(&mut session, call, &gateway).await);
        assert_eq!(session.screen(), Screen::Chatting);
    }

    #[tokio::test]
    async fn test_finalize_builds_plan_then_images() {
        let gateway = ScriptedGateway::new().step(Ok(question("誰のために？"))).step(Ok(final_step()));
        let mut session = at_final_step(&gateway).await;

        let call = session.reply(Reply::Choice(2)).unwrap();
        assert_eq!(session.screen(), Screen::Processing);
        assert!(drive(&mut session, call, &gateway).await);

        assert_eq!(
            gateway.calls(),
            vec![
                "next_chat_step",
                "next_chat_step",
                "generate_contribution_plan",
                "generate_images_for_plan"
            ]
        );
        let plan = session.plan().unwrap();
        assert_eq!(plan.images.len(), 4);
        assert_eq!(plan.first_steps.len(), 3);
        assert_eq!(plan.suggested_opportunities.len(), 2);

        // the final choice is part of what the plan was built from
        let used = gateway.transcripts().pop().unwrap();
        assert_eq!(used.last().unwrap().text, "プランを見せてください");
    }

    #[tokio::test]
    async fn test_free_text_on_final_step_keeps_chatting() {
        let gateway = ScriptedGateway::new().step(Ok(question("誰のために？"))).step(Ok(final_step()));
        let mut session = at_final_step(&gateway).await;

        let call = session.reply(Reply::Text("  もう少し話したい ".to_string())).unwrap();
        assert_eq!(call.effect, Effect::NextStep { transcript: session.transcript().to_vec() });
        assert_eq!(session.transcript().last().unwrap().text, "もう少し話したい");
        assert_eq!(session.screen(), Screen::Chatting);
    }

    #[tokio::test]
    async fn test_chat_failure_then_reset() {
        let gateway = ScriptedGateway::new().step(Err(AuraError::ChatStep));
        let mut session = Session::new();
        let call = session.submit(skills_form()).unwrap();
        drive(&mut session, call, &gateway).await;

        assert_eq!(session.screen(), Screen::Error);
        assert_eq!(session.error_message(), Some("AIとの対話中にエラーが発生しました。"));

        session.reset().unwrap();
        assert_eq!(session.screen(), Screen::Initial);
        assert!(session.transcript().is_empty());
        assert!(session.plan().is_none());
        assert_eq!(session.form_draft(), &FormState::default());
        assert!(session.profile().is_empty());
    }

    #[tokio::test]
    async fn test_plan_failure_skips_images() {
        let gateway = ScriptedGateway::new()
            .step(Ok(question("誰のために？")))
            .step(Ok(final_step()))
            .plan(Err(AuraError::PlanGeneration));
        let mut session = at_final_step(&gateway).await;

        let call = session.reply(Reply::Choice(0)).unwrap();
        drive(&mut session, call, &gateway).await;

        assert_eq!(session.error_message(), Some("貢献プランの作成中にエラーが発生しました。"));
        assert!(!gateway.calls().contains(&"generate_images_for_plan"));
    }

    #[tokio::test]
    async fn test_image_failure_is_an_error() {
        let gateway = ScriptedGateway::new()
            .step(Ok(question("誰のために？")))
            .step(Ok(final_step()))
            .images(Err(AuraError::ImageGeneration));
        let mut session = at_final_step(&gateway).await;

        let call = session.reply(Reply::Choice(0)).unwrap();
        drive(&mut session, call, &gateway).await;
        assert_eq!(session.screen(), Screen::Error);
        assert!(session.plan().is_none());
    }

    #[tokio::test]
    async fn test_rejected_replies_leave_session_unchanged() {
        let gateway = ScriptedGateway::new();
        let mut session = Session::new();
        let call = session.submit(skills_form()).unwrap();
        assert_eq!(session.reply(Reply::Choice(0)), Err(TransitionError::Busy));

        drive(&mut session, call, &gateway).await;
        let before = session.clone();
        assert_eq!(session.reply(Reply::Choice(3)), Err(TransitionError::NoSuchOption(3)));
        assert_eq!(session.reply(Reply::Text("   ".to_string())), Err(TransitionError::EmptyReply));
        assert_eq!(session, before);
    }

    #[test]
    fn test_wrong_screen_events() {
        let mut session = Session::new();
        assert!(matches!(session.go_back(), Err(TransitionError::InvalidState { .. })));
        assert!(matches!(session.reset(), Err(TransitionError::InvalidState { .. })));
        assert_eq!(
            session.reply(Reply::Choice(0)),
            Err(TransitionError::InvalidState {
                event: "reply",
                screen: Screen::Initial
            })
        );
    }

    #[tokio::test]
    async fn test_actions_do_not_touch_session() {
        let gateway = ScriptedGateway::new().step(Ok(question("誰のために？"))).step(Ok(final_step()));
        let mut session = at_final_step(&gateway).await;
        let call = session.reply(Reply::Choice(0)).unwrap();
        drive(&mut session, call, &gateway).await;

        let before = session.clone();
        let plan = session.plan().unwrap().clone();
        for item in plan.items() {
            if let Some(Ok(request)) = ActionRequest::from_item(item, session.profile()) {
                let result = request.action.run(&gateway).await.unwrap();
                if let ActionResult::Email(draft) = result {
                    assert!(draft.subject.is_some());
                }
            }
        }
        assert_eq!(session, before);
        assert_eq!(session.plan(), Some(&sample_draft().with_images(sample_images())));
    }
}
