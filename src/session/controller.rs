//! Timed session state machine.
//!
//! The controller never talks to the network. Operations that need the backend return
//! a [`Command`]; the caller runs it and hands the [`CommandOutcome`] back to
//! [`SessionController::apply`]. The countdown is re-derived from the wall clock on
//! every [`SessionController::tick`], independent of any command in flight.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::timer::{remaining_secs, UrgencyBand};
use super::{SessionStatus, TimedSession};
use crate::api::ApiError;
use crate::notify::{Level, Notifications};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    FinishEarly,
    Abandon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum CommandKind {
    Start,
    Switch,
    Complete,
    Abandon,
}

/// A backend call the controller wants made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// `from_order`/`to_order` are the 1-based item orders
    Switch {
        from_order: u32,
        to_order: u32,
        to_index: usize,
    },
    Complete,
    Abandon,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Start => CommandKind::Start,
            Command::Switch { .. } => CommandKind::Switch,
            Command::Complete => CommandKind::Complete,
            Command::Abandon => CommandKind::Abandon,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Started(TimedSession),
    Switched { to_index: usize },
    Completed(TimedSession),
    Abandoned(TimedSession),
    Failed { kind: CommandKind, message: String },
}

/// What the user is currently allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Idle,
    AwaitingConfirmation(ConfirmAction),
    InFlight(CommandKind),
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Loading,
    NotFound { reason: String },
    Ready(TimedSession),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("already at the first problem")]
    BeforeFirst,
    #[error("problem {index} is out of range (session has {count})")]
    PastEnd { index: usize, count: usize },
    #[error("problems can only be switched while the session is running")]
    Locked,
    #[error("another action is still in progress")]
    Busy,
}

#[derive(Debug)]
pub struct SessionController {
    session_id: String,
    view: View,
    cursor: usize,
    interaction: Interaction,
    remaining: Option<u64>,
    auto_complete_fired: bool,
    notifications: Notifications,
}

impl SessionController {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            view: View::Loading,
            cursor: 0,
            interaction: Interaction::Idle,
            remaining: None,
            auto_complete_fired: false,
            notifications: Notifications::default(),
        }
    }

    pub fn with_notifications(mut self, notifications: Notifications) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn session(&self) -> Option<&TimedSession> {
        match &self.view {
            View::Ready(session) => Some(session),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<SessionStatus> {
        self.session().map(|s| s.status)
    }

    /// Zero-based index of the problem on screen
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    /// Seconds left as of the last tick; `None` until the session has started
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    pub fn urgency(&self) -> Option<UrgencyBand> {
        let session = self.session()?;
        Some(UrgencyBand::classify(self.remaining?, session.budget_secs()))
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notify(&mut self, level: Level, message: impl Into<String>, now: DateTime<Utc>) {
        self.notifications.push(level, message, now);
    }

    pub fn is_terminal(&self) -> bool {
        match &self.view {
            View::Ready(session) => session.status.is_terminal(),
            View::NotFound { .. } => true,
            View::Loading => false,
        }
    }

    /// Result of the initial (or a repeated) fetch. Recomputes the countdown right away,
    /// which may already call for completion.
    pub fn load_finished(
        &mut self,
        result: Result<TimedSession, ApiError>,
        now: DateTime<Utc>,
    ) -> Option<Command> {
        match result {
            Ok(mut session) => {
                session.sort_items();
                info!(
                    session = %session.id,
                    status = %session.status,
                    problems = session.items.len(),
                    "session loaded"
                );
                self.cursor = self.cursor.min(session.items.len().saturating_sub(1));
                self.view = View::Ready(session);
                self.tick(now)
            }
            Err(err) => {
                warn!(session = %self.session_id, %err, "session could not be loaded");
                self.view = View::NotFound {
                    reason: err.to_string(),
                };
                self.remaining = None;
                self.interaction = Interaction::Idle;
                None
            }
        }
    }

    /// Re-derive the countdown. Returns `Command::Complete` the first time a running
    /// session is seen at zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Command> {
        self.notifications.prune(now);

        let View::Ready(session) = &self.view else {
            return None;
        };
        let Some(started_at) = session.started_at else {
            self.remaining = None;
            return None;
        };

        let remaining = remaining_secs(started_at, session.config.time_limit, now);
        self.remaining = Some(remaining);

        if session.status != SessionStatus::InProgress || remaining > 0 || self.auto_complete_fired
        {
            return None;
        }

        self.auto_complete_fired = true;
        info!(session = %self.session_id, "time is up, completing session");

        match self.interaction {
            // user already asked to finish
            Interaction::InFlight(CommandKind::Complete) => None,
            _ => {
                self.interaction = Interaction::InFlight(CommandKind::Complete);
                Some(Command::Complete)
            }
        }
    }

    fn running(&self) -> bool {
        self.status() == Some(SessionStatus::InProgress)
    }

    pub fn request_start(&mut self) -> Option<Command> {
        if self.status() != Some(SessionStatus::Pending) || self.interaction != Interaction::Idle
        {
            return None;
        }
        self.interaction = Interaction::InFlight(CommandKind::Start);
        Some(Command::Start)
    }

    /// Finishing with time left needs confirmation; at zero it goes straight through
    pub fn request_finish(&mut self, now: DateTime<Utc>) -> Option<Command> {
        if !self.running() || self.interaction != Interaction::Idle {
            return None;
        }
        let remaining = self
            .session()
            .and_then(|s| s.started_at.map(|at| remaining_secs(at, s.config.time_limit, now)))
            .unwrap_or(0);

        if remaining > 0 {
            self.interaction = Interaction::AwaitingConfirmation(ConfirmAction::FinishEarly);
            None
        } else {
            self.interaction = Interaction::InFlight(CommandKind::Complete);
            Some(Command::Complete)
        }
    }

    pub fn request_abandon(&mut self) {
        if self.running() && self.interaction == Interaction::Idle {
            self.interaction = Interaction::AwaitingConfirmation(ConfirmAction::Abandon);
        }
    }

    /// Proceed with the action awaiting confirmation
    pub fn confirm(&mut self) -> Option<Command> {
        let Interaction::AwaitingConfirmation(action) = self.interaction else {
            return None;
        };
        let command = match action {
            ConfirmAction::FinishEarly => Command::Complete,
            ConfirmAction::Abandon => Command::Abandon,
        };
        self.interaction = Interaction::InFlight(command.kind());
        Some(command)
    }

    /// Decline the pending confirmation; nothing is sent
    pub fn cancel(&mut self) {
        if let Interaction::AwaitingConfirmation(action) = self.interaction {
            debug!(?action, "confirmation declined");
            self.interaction = Interaction::Idle;
        }
    }

    pub fn switch_to(&mut self, index: usize) -> Result<Option<Command>, NavigationError> {
        let Some(session) = self.session() else {
            return Err(NavigationError::Locked);
        };
        if session.status != SessionStatus::InProgress {
            return Err(NavigationError::Locked);
        }
        let count = session.items.len();
        if index >= count {
            return Err(NavigationError::PastEnd { index, count });
        }
        if index == self.cursor {
            return Ok(None);
        }
        if self.interaction != Interaction::Idle {
            return Err(NavigationError::Busy);
        }

        let command = Command::Switch {
            from_order: session.items[self.cursor].order,
            to_order: session.items[index].order,
            to_index: index,
        };
        self.interaction = Interaction::InFlight(CommandKind::Switch);
        Ok(Some(command))
    }

    pub fn next_item(&mut self) -> Result<Option<Command>, NavigationError> {
        self.switch_to(self.cursor + 1)
    }

    pub fn previous_item(&mut self) -> Result<Option<Command>, NavigationError> {
        match self.cursor.checked_sub(1) {
            Some(index) => self.switch_to(index),
            None => Err(NavigationError::BeforeFirst),
        }
    }

    /// Reflect an accepted submission until the next refresh from the backend
    pub fn mark_solved(&mut self, problem_id: &str) {
        if let View::Ready(session) = &mut self.view {
            if session.status != SessionStatus::InProgress {
                return;
            }
            for item in session.items.iter_mut().filter(|i| i.problem.id == problem_id) {
                item.solved = true;
            }
        }
    }

    /// Feed back the result of a command. Failures leave the session, cursor and
    /// countdown as they were and only raise a notification.
    pub fn apply(&mut self, outcome: CommandOutcome, now: DateTime<Utc>) -> Option<Command> {
        let kind = match &outcome {
            CommandOutcome::Started(_) => CommandKind::Start,
            CommandOutcome::Switched { .. } => CommandKind::Switch,
            CommandOutcome::Completed(_) => CommandKind::Complete,
            CommandOutcome::Abandoned(_) => CommandKind::Abandon,
            CommandOutcome::Failed { kind, .. } => *kind,
        };
        if self.interaction == Interaction::InFlight(kind) {
            self.interaction = Interaction::Idle;
        }

        match outcome {
            CommandOutcome::Started(session) => {
                self.replace_session(session);
                self.notify(Level::Info, "Session started. Good luck!", now);
            }
            CommandOutcome::Switched { to_index } => {
                let count = self.session().map_or(0, |s| s.items.len());
                if to_index < count {
                    debug!(from = self.cursor, to = to_index, "switched problem");
                    self.cursor = to_index;
                }
            }
            CommandOutcome::Completed(session) => {
                self.replace_session(session);
                self.notify(Level::Success, "Session completed", now);
            }
            CommandOutcome::Abandoned(session) => {
                self.replace_session(session);
                self.notify(Level::Info, "Session abandoned", now);
            }
            CommandOutcome::Failed { kind, message } => {
                warn!(session = %self.session_id, %kind, %message, "session action failed");
                self.notify(Level::Error, format!("{kind} failed: {message}"), now);
            }
        }

        self.tick(now)
    }

    /// Swap in a fresh record, keeping status monotonic and the start time immutable
    fn replace_session(&mut self, mut next: TimedSession) {
        let View::Ready(current) = &self.view else {
            next.sort_items();
            self.view = View::Ready(next);
            return;
        };

        if current.status != next.status && !current.status.can_transition_to(next.status) {
            warn!(
                from = %current.status,
                to = %next.status,
                "ignoring backwards status change"
            );
            return;
        }
        if let (Some(kept), Some(incoming)) = (current.started_at, next.started_at) {
            if kept != incoming {
                warn!(%kept, %incoming, "start time is immutable, keeping the original");
                next.started_at = Some(kept);
            }
        }
        if current.status != next.status {
            info!(from = %current.status, to = %next.status, "session status changed");
        }

        next.sort_items();
        self.cursor = self.cursor.min(next.items.len().saturating_sub(1));
        self.view = View::Ready(next);
    }
}
