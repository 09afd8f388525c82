//! Application state tying the session controller, the editor and the draft store
//! together. Like the controller, `App` performs no IO of its own beyond the local
//! draft database: anything that needs the network comes back out as a [`Request`].

use chrono::{DateTime, Duration, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::api::{CodeRequest, RunReport};
use crate::config::Config;
use crate::drafts::DraftStore;
use crate::editor::{CodeEditor, EditorBuffer, EditorEvent};
use crate::language::{starter_code, Language};
use crate::notify::{Level, Notifications};
use crate::runtime::{AppEvent, CodeAction, CodeOutcome};
use crate::session::{
    Command, Interaction, NavigationError, ProblemRef, SessionController, SessionStatus,
};

/// Work the event loop has to hand to a background thread (or the OS)
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Session(Command),
    Code {
        action: CodeAction,
        problem_id: String,
        request: CodeRequest,
    },
    OpenBrowser(String),
}

/// Result panel state for the current problem
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running(CodeAction),
    Finished {
        action: CodeAction,
        report: RunReport,
    },
    Failed {
        action: CodeAction,
        message: String,
    },
}

#[derive(Debug)]
pub struct App {
    pub controller: SessionController,
    pub editor: CodeEditor,
    pub buffer: EditorBuffer,
    pub run_state: RunState,
    pub show_help: bool,
    pub should_quit: bool,
    config: Config,
    drafts: Option<DraftStore>,
    /// problem the buffer currently belongs to
    loaded_problem: Option<String>,
    now: DateTime<Utc>,
}

impl App {
    pub fn new(
        session_id: impl Into<String>,
        config: Config,
        drafts: Option<DraftStore>,
        now: DateTime<Utc>,
    ) -> Self {
        let ttl = Duration::seconds(config.notification_secs.max(1) as i64);
        let controller =
            SessionController::new(session_id).with_notifications(Notifications::with_ttl(ttl));

        Self {
            controller,
            editor: CodeEditor::new().with_read_only(true),
            buffer: EditorBuffer::new(String::new(), config.default_language),
            run_state: RunState::Idle,
            show_help: false,
            should_quit: false,
            config,
            drafts,
            loaded_problem: None,
            now,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Time of the most recent event, used for rendering the clocks
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn current_problem(&self) -> Option<&ProblemRef> {
        self.controller
            .session()
            .and_then(|s| s.items.get(self.controller.cursor()))
            .map(|item| &item.problem)
    }

    pub fn handle_event(&mut self, event: AppEvent, now: DateTime<Utc>) -> Option<Request> {
        self.now = now;
        let request = match event {
            AppEvent::Key(key) => self.on_key(key, now),
            AppEvent::Resize => None,
            AppEvent::Tick => self.controller.tick(now).map(Request::Session),
            AppEvent::Loaded(result) => self
                .controller
                .load_finished(result, now)
                .map(Request::Session),
            AppEvent::Session(outcome) => {
                self.controller.apply(outcome, now).map(Request::Session)
            }
            AppEvent::Code(outcome) => {
                self.on_code_outcome(outcome, now);
                None
            }
        };
        self.sync_buffer();
        request
    }

    pub fn on_key(&mut self, key: KeyEvent, now: DateTime<Utc>) -> Option<Request> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        if let Interaction::AwaitingConfirmation(_) = self.controller.interaction() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    return self.controller.confirm().map(Request::Session);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.controller.cancel(),
                _ => {}
            }
            return None;
        }

        if self.show_help {
            self.show_help = false;
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::F(1) => {
                self.show_help = true;
                None
            }
            KeyCode::Char('n') if ctrl => {
                let result = self.controller.next_item();
                self.navigation(result, now)
            }
            KeyCode::Char('p') if ctrl => {
                let result = self.controller.previous_item();
                self.navigation(result, now)
            }
            KeyCode::Char('r') if ctrl => self.code_request(CodeAction::Run, now),
            KeyCode::Char('s') if ctrl => self.code_request(CodeAction::Submit, now),
            KeyCode::Char('f') if ctrl => self.controller.request_finish(now).map(Request::Session),
            KeyCode::Char('a') if ctrl => {
                self.controller.request_abandon();
                None
            }
            KeyCode::Char('o') if ctrl => self.open_problem(),
            KeyCode::Enter if self.controller.status() == Some(SessionStatus::Pending) => {
                self.controller.request_start().map(Request::Session)
            }
            KeyCode::Char('q') if self.controller.is_terminal() => {
                self.should_quit = true;
                None
            }
            _ => {
                self.on_editor_key(key);
                None
            }
        }
    }

    fn on_editor_key(&mut self, key: KeyEvent) {
        match self.editor.handle_key(&self.buffer, key) {
            Some(EditorEvent::Changed(buffer)) => {
                self.buffer = buffer;
                self.save_draft();
            }
            Some(EditorEvent::LanguageChanged(language)) => self.switch_language(language),
            None => {}
        }
    }

    fn navigation(
        &mut self,
        result: Result<Option<Command>, NavigationError>,
        now: DateTime<Utc>,
    ) -> Option<Request> {
        match result {
            Ok(command) => command.map(Request::Session),
            Err(err) => {
                debug!(%err, "navigation rejected");
                self.controller.notify(Level::Info, err.to_string(), now);
                None
            }
        }
    }

    fn code_request(&mut self, action: CodeAction, now: DateTime<Utc>) -> Option<Request> {
        if self.controller.status() != Some(SessionStatus::InProgress) {
            self.controller
                .notify(Level::Info, "The session is not running", now);
            return None;
        }
        if matches!(self.run_state, RunState::Running(_)) {
            self.controller
                .notify(Level::Info, "Still waiting for the previous result", now);
            return None;
        }
        let problem_id = self.loaded_problem.clone()?;

        self.run_state = RunState::Running(action);
        Some(Request::Code {
            action,
            problem_id,
            request: CodeRequest::new(&self.buffer, Some(self.controller.session_id())),
        })
    }

    fn on_code_outcome(&mut self, outcome: CodeOutcome, now: DateTime<Utc>) {
        if self.loaded_problem.as_deref() != Some(outcome.problem_id.as_str()) {
            debug!(problem = %outcome.problem_id, "dropping result for a problem no longer shown");
            if matches!(self.run_state, RunState::Running(_)) {
                self.run_state = RunState::Idle;
            }
            return;
        }

        let CodeOutcome {
            action,
            problem_id,
            result,
        } = outcome;

        self.run_state = match result {
            Ok(report) => {
                if action == CodeAction::Submit && report.is_accepted() {
                    info!(problem = %problem_id, "submission accepted");
                    self.controller.mark_solved(&problem_id);
                    self.controller.notify(Level::Success, "Accepted", now);
                }
                RunState::Finished { action, report }
            }
            Err(err) => {
                warn!(problem = %problem_id, ?action, %err, "code request failed");
                self.controller
                    .notify(Level::Error, format!("Could not reach the judge: {err}"), now);
                RunState::Failed {
                    action,
                    message: err.to_string(),
                }
            }
        };
    }

    fn open_problem(&self) -> Option<Request> {
        let problem = self.current_problem()?;
        let key = problem.slug.as_deref().unwrap_or(&problem.id);
        Some(Request::OpenBrowser(self.config.problem_url(key)))
    }

    fn switch_language(&mut self, language: Language) {
        let Some(problem_id) = self.loaded_problem.clone() else {
            self.buffer = EditorBuffer::new(starter_code(language), language);
            return;
        };
        self.save_draft();
        self.buffer = self.load_buffer(&problem_id, language);
        self.editor.reset();
    }

    /// Swap the buffer when the cursor moved to another problem, and keep the editor
    /// writable only while the session runs
    fn sync_buffer(&mut self) {
        let current = self.current_problem().map(|p| p.id.clone());
        if current != self.loaded_problem {
            if let Some(problem_id) = &current {
                let language = self
                    .drafts
                    .as_ref()
                    .and_then(|store| store.last_language(problem_id).ok().flatten())
                    .unwrap_or(self.buffer.language);
                self.buffer = self.load_buffer(problem_id, language);
                debug!(problem = %problem_id, %language, "editor buffer swapped");
            }
            self.loaded_problem = current;
            self.editor.reset();
            self.run_state = RunState::Idle;
        }

        let writable = self.controller.status() == Some(SessionStatus::InProgress);
        self.editor.set_read_only(!writable);
    }

    fn load_buffer(&self, problem_id: &str, language: Language) -> EditorBuffer {
        let saved = self.drafts.as_ref().and_then(|store| {
            store
                .load(problem_id, language)
                .map_err(|err| warn!(%err, "failed to load draft"))
                .ok()
                .flatten()
        });
        match saved {
            Some(draft) => EditorBuffer::new(draft.code, language),
            None => EditorBuffer::new(starter_code(language), language),
        }
    }

    fn save_draft(&self) {
        let (Some(store), Some(problem_id)) = (&self.drafts, &self.loaded_problem) else {
            return;
        };
        if let Err(err) = store.save(problem_id, &self.buffer) {
            warn!(%err, problem = %problem_id, "failed to save draft");
        }
    }
}
