use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, StatefulWidget, Widget},
};

use super::{CodeEditor, EditorBuffer, ScrollState};
use crate::highlight::{tokenize, Category, Token};

const GUTTER_MIN_DIGITS: usize = 3;

pub fn category_style(category: Category) -> Style {
    match category {
        Category::Comment => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        Category::String => Style::default().fg(Color::Green),
        Category::Keyword => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        Category::Number => Style::default().fg(Color::Yellow),
        Category::Function => Style::default().fg(Color::Cyan),
    }
}

/// Highlighted, scroll-synchronized rendering of an [`EditorBuffer`].
///
/// The gutter and the text layer are drawn from the same [`ScrollState`], so line
/// numbers always line up with the code beside them.
pub struct EditorView<'a> {
    buffer: &'a EditorBuffer,
    block: Option<Block<'a>>,
    focused: bool,
}

impl<'a> EditorView<'a> {
    pub fn new(buffer: &'a EditorBuffer) -> Self {
        Self {
            buffer,
            block: None,
            focused: true,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn gutter_width(&self) -> u16 {
        let digits = self.buffer.line_count().to_string().len().max(GUTTER_MIN_DIGITS);
        (digits + 1) as u16
    }
}

impl StatefulWidget for EditorView<'_> {
    type State = CodeEditor;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        let gutter_width = self.gutter_width().min(inner.width);
        let gutter = Rect::new(inner.x, inner.y, gutter_width, inner.height);
        let text_area = Rect::new(
            inner.x + gutter_width,
            inner.y,
            inner.width - gutter_width,
            inner.height,
        );

        state.set_viewport(
            self.buffer,
            text_area.width as usize,
            text_area.height as usize,
        );
        let scroll = state.scroll();

        render_gutter(self.buffer, scroll, gutter, buf);
        render_text(self.buffer, scroll, text_area, buf);

        if self.focused && !state.is_read_only() {
            if let Some(position) = caret_position(self.buffer, state, text_area) {
                buf[position].set_style(Style::default().add_modifier(Modifier::REVERSED));
            }
        }
    }
}

/// Screen cell of the caret, if it is inside `text_area`
pub fn caret_position(buffer: &EditorBuffer, editor: &CodeEditor, text_area: Rect) -> Option<Position> {
    let caret = editor.caret(buffer);
    let (line, _) = editor.caret_line_col(buffer);
    let line_start = buffer.text[..caret].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = unicode_width::UnicodeWidthStr::width(&buffer.text[line_start..caret]);
    let scroll = editor.scroll();

    let row = line.checked_sub(scroll.top)?;
    let col = col.checked_sub(scroll.left)?;
    if row >= text_area.height as usize || col >= text_area.width as usize {
        return None;
    }
    Some(Position::new(
        text_area.x + col as u16,
        text_area.y + row as u16,
    ))
}

fn render_gutter(buffer: &EditorBuffer, scroll: ScrollState, area: Rect, buf: &mut Buffer) {
    let total = buffer.line_count();
    let number_width = (area.width as usize).saturating_sub(1);
    let lines: Vec<Line> = (scroll.top..total)
        .take(area.height as usize)
        .map(|idx| {
            Line::from(Span::styled(
                format!("{:>number_width$} ", idx + 1),
                Style::default().fg(Color::DarkGray),
            ))
        })
        .collect();

    Paragraph::new(lines).render(area, buf);
}

fn render_text(buffer: &EditorBuffer, scroll: ScrollState, area: Rect, buf: &mut Buffer) {
    let text = &buffer.text;
    let tokens = tokenize(text, buffer.language);

    let mut lines = Vec::with_capacity(area.height as usize);
    let mut offset = 0;
    for (idx, raw_line) in text.split('\n').enumerate() {
        let start = offset;
        offset += raw_line.len() + 1;
        if idx < scroll.top {
            continue;
        }
        if lines.len() >= area.height as usize {
            break;
        }
        lines.push(styled_line(text, start..start + raw_line.len(), &tokens));
    }

    Paragraph::new(lines)
        .scroll((0, scroll.left.min(u16::MAX as usize) as u16))
        .render(area, buf);
}

/// Split one source line into spans, styling the parts covered by tokens
fn styled_line<'t>(text: &'t str, line: std::ops::Range<usize>, tokens: &[Token]) -> Line<'t> {
    let first = tokens.partition_point(|t| t.range.end <= line.start);
    let mut spans = Vec::new();
    let mut cursor = line.start;

    for token in tokens[first..].iter().take_while(|t| t.range.start < line.end) {
        let start = token.range.start.max(line.start);
        let end = token.range.end.min(line.end);
        if cursor < start {
            spans.push(Span::raw(&text[cursor..start]));
        }
        spans.push(Span::styled(&text[start..end], category_style(token.category)));
        cursor = end;
    }
    if cursor < line.end {
        spans.push(Span::raw(&text[cursor..line.end]));
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_renders_gutter_and_code() {
        let buffer = EditorBuffer::new("let x = 1;\nreturn x;", Language::JavaScript);
        let mut editor = CodeEditor::new();

        let mut terminal = Terminal::new(TestBackend::new(30, 4)).unwrap();
        terminal
            .draw(|f| f.render_stateful_widget(EditorView::new(&buffer), f.area(), &mut editor))
            .unwrap();

        assert!(row_text(&terminal, 0).starts_with("  1 let x = 1;"));
        assert!(row_text(&terminal, 1).starts_with("  2 return x;"));
    }

    #[test]
    fn test_keyword_cells_are_styled() {
        let buffer = EditorBuffer::new("let x", Language::JavaScript);
        let mut editor = CodeEditor::new();

        let mut terminal = Terminal::new(TestBackend::new(20, 2)).unwrap();
        terminal
            .draw(|f| {
                f.render_stateful_widget(
                    EditorView::new(&buffer).focused(false),
                    f.area(),
                    &mut editor,
                )
            })
            .unwrap();

        let cell = &terminal.backend().buffer()[(4, 0)];
        assert_eq!(cell.symbol(), "l");
        assert_eq!(cell.fg, Color::Magenta);
    }

    #[test]
    fn test_gutter_scrolls_with_text() {
        let text = (1..=10).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let buffer = EditorBuffer::new(text, Language::Java);
        let mut editor = CodeEditor::new();

        let mut terminal = Terminal::new(TestBackend::new(20, 3)).unwrap();
        terminal
            .draw(|f| f.render_stateful_widget(EditorView::new(&buffer), f.area(), &mut editor))
            .unwrap();
        for _ in 0..6 {
            editor.handle_key(&buffer, KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        }
        terminal
            .draw(|f| f.render_stateful_widget(EditorView::new(&buffer), f.area(), &mut editor))
            .unwrap();

        assert_eq!(editor.scroll().top, 4);
        for row in 0..3u16 {
            let line_no = 5 + row as usize;
            assert!(
                row_text(&terminal, row).starts_with(&format!("{line_no:>3} line{line_no}")),
                "row {row} misaligned: {:?}",
                row_text(&terminal, row)
            );
        }
    }

    #[test]
    fn test_free_scroll_survives_next_frame() {
        let text = (1..=20).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let buffer = EditorBuffer::new(text, Language::JavaScript);
        let mut editor = CodeEditor::new();

        let mut terminal = Terminal::new(TestBackend::new(20, 5)).unwrap();
        terminal
            .draw(|f| f.render_stateful_widget(EditorView::new(&buffer), f.area(), &mut editor))
            .unwrap();
        editor.scroll_lines(&buffer, 10);
        terminal
            .draw(|f| f.render_stateful_widget(EditorView::new(&buffer), f.area(), &mut editor))
            .unwrap();

        assert_eq!(editor.scroll().top, 10);
        assert!(row_text(&terminal, 0).starts_with(" 11 line11"));
        assert_eq!(editor.caret(&buffer), 0);
    }

    #[test]
    fn test_caret_position_accounts_for_scroll() {
        let buffer = EditorBuffer::new("abc\ndef", Language::Cpp);
        let mut editor = CodeEditor::new();
        editor.set_caret(&buffer, 6);
        let area = Rect::new(4, 0, 10, 5);
        assert_eq!(caret_position(&buffer, &editor, area), Some(Position::new(6, 1)));
    }

    #[test]
    fn test_styled_line_splits_multiline_tokens() {
        let text = "/* a\nb */ x";
        let tokens = tokenize(text, Language::Cpp);
        let line = styled_line(text, 5..text.len(), &tokens);
        assert_eq!(line.spans[0].content, "b */");
        assert_eq!(line.spans[1].content, " x");
    }
}
