use std::sync::mpsc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use mockprep::app::{App, Request};
use mockprep::config::Config;
use mockprep::editor::EditorBuffer;
use mockprep::language::Language;
use mockprep::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use mockprep::session::{Command, CommandOutcome, SessionStatus, TimedSession};

fn running_session(started_minutes_ago: i64, minutes: u32) -> TimedSession {
    let started = Utc::now() - ChronoDuration::minutes(started_minutes_ago);
    serde_json::from_value(serde_json::json!({
        "id": "headless",
        "status": "in_progress",
        "startedAt": started.to_rfc3339(),
        "items": [
            {"problem": {"id": "a", "title": "Valid Parentheses"}, "order": 1},
            {"problem": {"id": "b", "title": "Top K Frequent"}, "order": 2}
        ],
        "config": {"problemCount": 2, "timeLimit": minutes}
    }))
    .unwrap()
}

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

// Headless integration using the internal runtime + App without a TTY.
// Verifies that typed keys reach the editor through Runner/TestEventSource.
#[test]
fn headless_typing_flow_edits_buffer() {
    let mut app = App::new("headless", Config::default(), None, Utc::now());

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let mut runner = Runner::new(es, ticker);

    tx.send(AppEvent::Loaded(Ok(running_session(1, 30)))).unwrap();

    // Drive until the session is loaded, then clear the starter code
    for _ in 0..100u32 {
        let event = runner.step();
        app.handle_event(event, Utc::now());
        if app.controller.session().is_some() {
            break;
        }
    }
    assert_eq!(app.current_problem().unwrap().id, "a");
    app.buffer = EditorBuffer::new("", Language::JavaScript);

    for c in "if (x) {".chars() {
        tx.send(key(KeyCode::Char(c))).unwrap();
    }
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Tab)).unwrap();
    tx.send(key(KeyCode::Char('y'))).unwrap();

    for _ in 0..200u32 {
        let event = runner.step();
        app.handle_event(event, Utc::now());
        if app.buffer.text.ends_with('y') {
            break;
        }
    }

    assert_eq!(app.buffer.text, "if (x) {\n  y");
    assert!(!app.should_quit);
}

#[test]
fn headless_ticks_complete_an_expired_session() {
    let mut app = App::new("headless", Config::default(), None, Utc::now());

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let mut runner = Runner::new(es, ticker);

    // loaded with one second to spare
    let mut session = running_session(0, 1);
    session.started_at = Some(Utc::now() - ChronoDuration::seconds(59));
    tx.send(AppEvent::Loaded(Ok(session.clone()))).unwrap();

    let mut requests = Vec::new();
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        let event = runner.step();
        if let Some(request) = app.handle_event(event, Utc::now()) {
            requests.push(request);
        }
        if !requests.is_empty() {
            break;
        }
    }
    assert_eq!(requests, vec![Request::Session(Command::Complete)]);
    assert_eq!(app.controller.remaining(), Some(0));

    // further ticks never ask again
    for _ in 0..20 {
        assert_eq!(app.handle_event(AppEvent::Tick, Utc::now()), None);
    }

    session.status = SessionStatus::Expired;
    app.handle_event(
        AppEvent::Session(CommandOutcome::Completed(session)),
        Utc::now(),
    );
    assert!(app.controller.is_terminal());
    assert!(app.editor.is_read_only());
}

#[test]
fn headless_escape_quits() {
    let mut app = App::new("headless", Config::default(), None, Utc::now());
    app.handle_event(key(KeyCode::Esc), Utc::now());
    assert!(app.should_quit);
}
