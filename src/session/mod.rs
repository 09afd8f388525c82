pub mod controller;
pub mod timer;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use controller::{
    Command, CommandKind, CommandOutcome, ConfirmAction, Interaction, NavigationError,
    SessionController, View,
};
pub use timer::{remaining_secs, UrgencyBand};

/// Lifecycle of a mock-interview session.
///
/// `Pending -> InProgress -> {Completed | Expired | Abandoned}`; nothing leaves a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
    Expired,
    Abandoned,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Expired | SessionStatus::Abandoned
        )
    }

    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (InProgress, Completed | Expired | Abandoned)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRef {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionItem {
    pub problem: ProblemRef,
    pub order: u32,
    #[serde(default)]
    pub solved: bool,
    /// seconds
    #[serde(default)]
    pub time_spent: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub problem_count: u32,
    /// minutes
    pub time_limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Score {
    pub solved: u32,
    pub total: u32,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedSession {
    #[serde(alias = "_id")]
    pub id: String,
    pub status: SessionStatus,
    pub items: Vec<SessionItem>,
    pub config: SessionConfig,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<Score>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session has no problems")]
    Empty,
    #[error("problem order {found} found where {expected} was expected")]
    OrderGap { expected: u32, found: u32 },
    #[error("session is {0} but has no start time")]
    MissingStart(SessionStatus),
}

impl TimedSession {
    pub fn budget_secs(&self) -> u64 {
        self.config.time_limit as u64 * 60
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.started_at
            .map(|started| started + Duration::minutes(self.config.time_limit as i64))
    }

    pub fn solved_count(&self) -> usize {
        self.items.iter().filter(|item| item.solved).count()
    }

    /// Items must be non-empty with orders `1..=n` once sorted; running sessions need a
    /// start time.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.items.is_empty() {
            return Err(SessionError::Empty);
        }
        let mut orders: Vec<u32> = self.items.iter().map(|item| item.order).collect();
        orders.sort_unstable();
        for (expected, found) in (1u32..).zip(orders) {
            if expected != found {
                return Err(SessionError::OrderGap { expected, found });
            }
        }
        if self.status == SessionStatus::InProgress && self.started_at.is_none() {
            return Err(SessionError::MissingStart(self.status));
        }
        Ok(())
    }

    /// Items ordered by their 1-based `order`
    pub fn sort_items(&mut self) {
        self.items.sort_by_key(|item| item.order);
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_status_transitions_are_one_directional() {
        use SessionStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Expired));
        assert!(InProgress.can_transition_to(Abandoned));
        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Abandoned.can_transition_to(Completed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Expired.is_terminal());
        assert!(SessionStatus::Abandoned.is_terminal());
    }

    #[test]
    fn test_deserialize_backend_record() {
        let json = r#"{
            "_id": "65f0c",
            "status": "in_progress",
            "items": [
                {"problem": {"_id": "a", "title": "Two Sum", "difficulty": "easy"}, "order": 1, "solved": true, "timeSpent": 120},
                {"problem": {"_id": "b", "title": "LRU Cache"}, "order": 2}
            ],
            "config": {"problemCount": 2, "timeLimit": 45},
            "startedAt": "2026-10-19T10:00:00Z"
        }"#;
        let session: TimedSession = serde_json::from_str(json).unwrap();

        assert_eq!(session.id, "65f0c");
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.items[0].time_spent, 120);
        assert!(!session.items[1].solved);
        assert_eq!(session.config.time_limit, 45);
        assert_eq!(session.budget_secs(), 2700);
        assert_eq!(
            session.deadline().unwrap().to_rfc3339(),
            "2026-10-19T10:45:00+00:00"
        );
        assert_eq!(session.score, None);
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_and_gaps() {
        let mut s = session(SessionStatus::Pending, None, 30, 0);
        assert_eq!(s.validate(), Err(SessionError::Empty));

        s.items = vec![item(1), item(3)];
        assert_eq!(
            s.validate(),
            Err(SessionError::OrderGap {
                expected: 2,
                found: 3
            })
        );

        s.items = vec![item(2), item(1)];
        assert!(s.validate().is_ok());
        s.sort_items();
        assert_eq!(s.items[0].order, 1);
    }

    #[test]
    fn test_validate_requires_start_time_when_running() {
        let s = session(SessionStatus::InProgress, None, 30, 1);
        assert_eq!(
            s.validate(),
            Err(SessionError::MissingStart(SessionStatus::InProgress))
        );
    }

    #[test]
    fn test_status_display_matches_wire_format() {
        assert_eq!(SessionStatus::InProgress.to_string(), "in_progress");
    }
}
