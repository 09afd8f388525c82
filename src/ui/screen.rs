use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::editor::EditorView;
use crate::session::timer::format_clock;
use crate::session::{SessionStatus, TimedSession, View};
use crate::ui::{clock_line, footer_line, language_tabs, problem_tabs, results_panel};

/// A UI Screen boundary: responsible for rendering one state of the app
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

pub struct LoadingScreen;

impl Screen for LoadingScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        let message = Paragraph::new(Span::styled(
            format!("Loading session {}…", app.controller.session_id()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
        f.render_widget(message, vertical_center(f.area(), 1));
    }
}

pub struct NotFoundScreen {
    reason: String,
}

impl Screen for NotFoundScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        let lines = vec![
            Line::styled(
                "Session not found",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Line::raw(format!(
                "{} could not be loaded: {}",
                app.controller.session_id(),
                self.reason
            )),
            Line::default(),
            Line::styled("press q to quit", Style::default().add_modifier(Modifier::DIM)),
        ];
        let height = lines.len() as u16;
        f.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            vertical_center(f.area(), height),
        );
    }
}

pub struct PendingScreen;

impl Screen for PendingScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        let Some(session) = app.controller.session() else {
            return;
        };
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::styled("Mock interview", bold),
            Line::raw(format!(
                "{} problems · {} minutes",
                session.items.len(),
                session.config.time_limit
            )),
            Line::default(),
        ];
        lines.extend(session.items.iter().map(|item| {
            let difficulty = item.problem.difficulty.as_deref().unwrap_or("");
            Line::from(vec![
                Span::raw(format!("{}. {}", item.order, item.problem.title)),
                Span::styled(
                    format!("  {difficulty}"),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ])
        }));
        lines.push(Line::default());
        lines.push(Line::styled(
            "Press Enter to start the clock",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(f.area());

        let height = lines.len() as u16;
        f.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            vertical_center(chunks[0], height),
        );
        f.render_widget(Paragraph::new(footer_line(app)), chunks[1]);
    }
}

/// The running session: header, problem tabs, editor and results side by side
pub struct SessionScreen;

impl Screen for SessionScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // clock
                Constraint::Length(1), // problem tabs
                Constraint::Min(3),    // editor + results
                Constraint::Length(1), // footer
            ])
            .split(f.area());

        f.render_widget(Paragraph::new(clock_line(app)), chunks[0]);
        f.render_widget(Paragraph::new(problem_tabs(app)), chunks[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[2]);

        render_editor(app, f, body[0]);
        f.render_widget(results_panel(&app.run_state), body[1]);
        f.render_widget(Paragraph::new(footer_line(app)), chunks[3]);
    }
}

/// Final state: outcome, score and a read-only look at the code
pub struct SummaryScreen;

impl Screen for SummaryScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        let Some(session) = app.controller.session() else {
            return;
        };
        let summary = summary_lines(session);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(summary.len() as u16 + 2),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(f.area());

        let summary_block = Block::default().borders(Borders::ALL).title(" Summary ");
        f.render_widget(Paragraph::new(summary).block(summary_block), chunks[0]);
        f.render_widget(Paragraph::new(problem_tabs(app)), chunks[1]);
        render_editor(app, f, chunks[2]);
        f.render_widget(
            Paragraph::new(footer_line(app)).style(Style::default().add_modifier(Modifier::DIM)),
            chunks[3],
        );
    }
}

fn summary_lines(session: &TimedSession) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let (headline, color) = match session.status {
        SessionStatus::Completed => ("Session completed", Color::Green),
        SessionStatus::Expired => ("Time is up", Color::Yellow),
        SessionStatus::Abandoned => ("Session abandoned", Color::Red),
        SessionStatus::Pending | SessionStatus::InProgress => ("Session", Color::White),
    };

    let mut lines = vec![Line::styled(headline, bold.fg(color))];

    let solved = session.solved_count();
    let mut score = format!("{solved}/{} solved", session.items.len());
    if let Some(s) = &session.score {
        score.push_str(&format!(" · {:.0} points", s.points));
    }
    lines.push(Line::raw(score));

    if let (Some(started), Some(deadline)) = (session.started_at, session.deadline()) {
        lines.push(Line::styled(
            format!(
                "started {} · budget {}",
                started.format("%Y-%m-%d %H:%M UTC"),
                format_clock((deadline - started).num_seconds().max(0) as u64)
            ),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    for item in &session.items {
        let (mark, style) = if item.solved {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("✗", Style::default().fg(Color::Red))
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{mark} "), style),
            Span::raw(format!("{}. {}", item.order, item.problem.title)),
        ]));
    }
    lines
}

fn render_editor(app: &mut App, f: &mut Frame, area: Rect) {
    let title = match app.current_problem() {
        Some(problem) => format!(
            " {} · {}{} ",
            problem.title,
            language_tabs(app.buffer.language),
            if app.editor.is_read_only() {
                " · read-only"
            } else {
                ""
            }
        ),
        None => format!(" {} ", language_tabs(app.buffer.language)),
    };
    let view = EditorView::new(&app.buffer)
        .block(Block::default().borders(Borders::ALL).title(title))
        .focused(!app.show_help);
    f.render_stateful_widget(view, area, &mut app.editor);
}

fn vertical_center(area: Rect, height: u16) -> Rect {
    let top = area.height.saturating_sub(height) / 2;
    Rect::new(area.x, area.y + top, area.width, height.min(area.height))
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(app: &App) -> Box<dyn Screen> {
    match app.controller.view() {
        View::Loading => Box::new(LoadingScreen),
        View::NotFound { reason } => Box::new(NotFoundScreen {
            reason: reason.clone(),
        }),
        View::Ready(session) => match session.status {
            SessionStatus::Pending => Box::new(PendingScreen),
            SessionStatus::InProgress => Box::new(SessionScreen),
            SessionStatus::Completed | SessionStatus::Expired | SessionStatus::Abandoned => {
                Box::new(SummaryScreen)
            }
        },
    }
}
