pub mod screen;

use itertools::Itertools;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, RunState};
use crate::language::Language;
use crate::notify::Level;
use crate::runtime::{describe, CodeAction};
use crate::session::timer::{elapsed_secs, format_clock};
use crate::session::{ConfirmAction, Interaction, UrgencyBand};

pub const KEY_HINTS: &str =
    "^N/^P problem  ^R run  ^S submit  F2 language  ^F finish  ^A abandon  ^O open  F1 help";

const HELP_LINES: [(&str, &str); 12] = [
    ("Ctrl-N / Ctrl-P", "next / previous problem"),
    ("Ctrl-R", "run against sample tests"),
    ("Ctrl-S", "submit solution"),
    ("F2", "cycle editor language"),
    ("Tab", "indent two spaces"),
    ("PgUp / PgDn", "page the caret"),
    ("Ctrl-Up / Ctrl-Down", "scroll editor"),
    ("Ctrl-F", "finish the session"),
    ("Ctrl-A", "abandon the session"),
    ("Ctrl-O", "open problem in browser"),
    ("Enter", "start a pending session"),
    ("Esc / Ctrl-C", "quit"),
];

/// Render the screen for the app's current state plus any overlay
pub fn draw(app: &mut App, f: &mut Frame) {
    screen::current_screen(app).render(app, f);

    if let Interaction::AwaitingConfirmation(action) = app.controller.interaction() {
        render_confirm_dialog(action, f);
    } else if app.show_help {
        render_help(f);
    }
}

pub fn urgency_style(band: UrgencyBand) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match band {
        UrgencyBand::Neutral => bold.fg(Color::Green),
        UrgencyBand::Warning => bold.fg(Color::Yellow),
        UrgencyBand::Critical => bold.fg(Color::Red).add_modifier(Modifier::SLOW_BLINK),
    }
}

fn level_style(level: Level) -> Style {
    match level {
        Level::Info => Style::default().fg(Color::Cyan),
        Level::Success => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Level::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

/// `⏱ mm:ss left` colored by urgency, followed by the elapsed stopwatch
pub fn clock_line(app: &App) -> Line<'static> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let Some(session) = app.controller.session() else {
        return Line::default();
    };

    let mut spans = vec![Span::styled(
        format!("Mock interview · {} problems", session.items.len()),
        Style::default().add_modifier(Modifier::BOLD),
    )];

    if let (Some(remaining), Some(band)) = (app.controller.remaining(), app.controller.urgency()) {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            format!("⏱ {} left", format_clock(remaining)),
            urgency_style(band),
        ));
    }
    if let Some(started_at) = session.started_at {
        let elapsed = elapsed_secs(started_at, app.now()).min(session.budget_secs());
        spans.push(Span::styled(
            format!("   elapsed {}", format_clock(elapsed)),
            dim,
        ));
    }
    if let Interaction::InFlight(kind) = app.controller.interaction() {
        spans.push(Span::styled(format!("   {}…", describe(kind)), dim));
    }

    Line::from(spans)
}

/// One tab per session item, solved ones checked
pub fn problem_tabs(app: &App) -> Line<'static> {
    let Some(session) = app.controller.session() else {
        return Line::default();
    };
    let cursor = app.controller.cursor();

    let mut spans = Vec::with_capacity(session.items.len() * 2);
    for (idx, item) in session.items.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
        }
        let mark = if item.solved { " ✓" } else { "" };
        let label = format!("{}. {}{}", item.order, item.problem.title, mark);
        let style = if idx == cursor {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if item.solved {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        spans.push(Span::styled(label, style));
    }
    Line::from(spans)
}

pub fn language_tabs(current: Language) -> String {
    Language::ALL
        .iter()
        .map(|language| {
            if *language == current {
                format!("[{}]", language.label())
            } else {
                language.label().to_string()
            }
        })
        .join(" ")
}

pub fn results_panel(run_state: &RunState) -> Paragraph<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let title = |action: CodeAction| match action {
        CodeAction::Run => " Run ",
        CodeAction::Submit => " Submission ",
    };

    let (block_title, lines): (&str, Vec<Line>) = match run_state {
        RunState::Idle => (
            " Results ",
            vec![Line::styled(
                "Ctrl-R to run, Ctrl-S to submit",
                Style::default().add_modifier(Modifier::DIM),
            )],
        ),
        RunState::Running(action) => (
            title(*action),
            vec![Line::styled("Waiting for the judge…", Style::default().fg(Color::Yellow))],
        ),
        RunState::Failed { action, message } => (
            title(*action),
            vec![Line::styled(message.clone(), Style::default().fg(Color::Red))],
        ),
        RunState::Finished { action, report } => {
            let status_style = if report.is_accepted() {
                bold.fg(Color::Green)
            } else {
                bold.fg(Color::Red)
            };
            let mut lines = vec![
                Line::styled(
                    if report.status.is_empty() {
                        "Finished".to_string()
                    } else {
                        report.status.clone()
                    },
                    status_style,
                ),
                Line::raw(format!("{}/{} tests passed", report.passed, report.total)),
            ];
            let usage = [
                report.runtime_ms.map(|ms| format!("{ms:.0} ms")),
                report.memory_kb.map(|kb| format!("{kb:.0} KB")),
            ]
            .into_iter()
            .flatten()
            .join(" · ");
            if !usage.is_empty() {
                lines.push(Line::raw(usage));
            }
            if let Some(error) = &report.error {
                lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)));
            }
            for (idx, case) in report.results.iter().enumerate().filter(|(_, c)| !c.passed) {
                lines.push(Line::default());
                lines.push(Line::styled(format!("Case {} failed", idx + 1), bold));
                lines.push(Line::raw(format!("input:    {}", case.input)));
                lines.push(Line::raw(format!("expected: {}", case.expected)));
                lines.push(Line::raw(format!("actual:   {}", case.actual)));
            }
            (title(*action), lines)
        }
    };

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(block_title))
}

/// Latest notification if there is one, otherwise the key hints
pub fn footer_line(app: &App) -> Line<'static> {
    match app.controller.notifications().latest() {
        Some(notification) => Line::styled(
            notification.message.clone(),
            level_style(notification.level),
        ),
        None => Line::styled(KEY_HINTS, Style::default().add_modifier(Modifier::DIM)),
    }
}

fn render_confirm_dialog(action: ConfirmAction, f: &mut Frame) {
    let (title, question) = match action {
        ConfirmAction::FinishEarly => (
            " Finish early? ",
            "There is still time left. Finish the session now?",
        ),
        ConfirmAction::Abandon => (
            " Abandon session? ",
            "Abandoning ends the session without a score.",
        ),
    };
    let lines = vec![
        Line::raw(question),
        Line::default(),
        Line::styled(
            "[y] confirm    [n] cancel",
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    let width = question.width() as u16 + 4;
    let area = centered_rect(width, lines.len() as u16 + 2, f.area());

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(title),
            ),
        area,
    );
}

fn render_help(f: &mut Frame) {
    let key_width = HELP_LINES.iter().map(|(k, _)| k.width()).max().unwrap_or(0);
    let lines: Vec<Line> = HELP_LINES
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(
                    format!("{key:<key_width$}  "),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(*what),
            ])
        })
        .collect();
    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 4;
    let area = centered_rect(width, lines.len() as u16 + 2, f.area());

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Keys ")),
        area,
    );
}

/// `width` x `height` rect centered in `area`, clipped to it
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(area.width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);
    horizontal[1]
}
