//! Controlled code editor.
//!
//! The embedding caller owns the [`EditorBuffer`]. [`CodeEditor`] only owns the caret,
//! the scroll offsets and the viewport size; every edit is reported back as a fresh
//! buffer through [`EditorEvent::Changed`] and the caller decides whether to adopt it.

pub mod view;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::language::Language;

pub use view::EditorView;

/// Inserted in place of a tab keypress
pub const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditorBuffer {
    pub text: String,
    pub language: Language,
}

impl EditorBuffer {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

/// Callbacks the editor raises towards its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    Changed(EditorBuffer),
    LanguageChanged(Language),
}

/// Offsets shared by the text layer and the line-number gutter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    /// first visible line
    pub top: usize,
    /// first visible display column
    pub left: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Default)]
pub struct CodeEditor {
    caret: usize,
    preferred_col: Option<usize>,
    scroll: ScrollState,
    viewport: Viewport,
    read_only: bool,
}

impl CodeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn scroll(&self) -> ScrollState {
        self.scroll
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Caret byte offset, clamped to the buffer the caller currently holds
    pub fn caret(&self, buffer: &EditorBuffer) -> usize {
        clamp_offset(&buffer.text, self.caret)
    }

    pub fn set_caret(&mut self, buffer: &EditorBuffer, offset: usize) {
        self.caret = clamp_offset(&buffer.text, offset);
        self.preferred_col = None;
        self.follow_caret(&buffer.text);
    }

    /// Zero-based (line, char column) of the caret
    pub fn caret_line_col(&self, buffer: &EditorBuffer) -> (usize, usize) {
        let caret = self.caret(buffer);
        let text = &buffer.text;
        let line = text[..caret].matches('\n').count();
        let col = text[line_start(text, caret)..caret].chars().count();
        (line, col)
    }

    /// Reset caret and scroll, e.g. when a different buffer is swapped in
    pub fn reset(&mut self) {
        self.caret = 0;
        self.preferred_col = None;
        self.scroll = ScrollState::default();
    }

    /// Record the visible text area.
    ///
    /// A resize pulls the caret back into view; otherwise the offsets are only clamped,
    /// so a free scroll survives the next frame.
    pub fn set_viewport(&mut self, buffer: &EditorBuffer, width: usize, height: usize) {
        let viewport = Viewport { width, height };
        if viewport != self.viewport {
            self.viewport = viewport;
            self.follow_caret(&buffer.text);
        }
        self.scroll.top = self.scroll.top.min(buffer.line_count().saturating_sub(1));
    }

    /// Scroll by whole lines without moving the caret
    pub fn scroll_lines(&mut self, buffer: &EditorBuffer, delta: isize) {
        let max_top = buffer.line_count().saturating_sub(1);
        self.scroll.top = self.scroll.top.saturating_add_signed(delta).min(max_top);
    }

    pub fn handle_key(&mut self, buffer: &EditorBuffer, key: KeyEvent) -> Option<EditorEvent> {
        if key.modifiers == KeyModifiers::CONTROL {
            match key.code {
                KeyCode::Up => self.scroll_lines(buffer, -1),
                KeyCode::Down => self.scroll_lines(buffer, 1),
                _ => {}
            }
            return None;
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }

        let text = &buffer.text;
        let caret = self.caret(buffer);

        match key.code {
            KeyCode::F(2) => {
                let next = buffer.language.next();
                debug!(from = %buffer.language, to = %next, "editor language switch");
                return Some(EditorEvent::LanguageChanged(next));
            }
            KeyCode::Char(c) => return self.insert(buffer, caret, &c.to_string()),
            KeyCode::Tab => return self.insert(buffer, caret, INDENT),
            // swallowed so focus never leaves the editor
            KeyCode::BackTab => return None,
            KeyCode::Enter => {
                let start = line_start(text, caret);
                let indent: String = text[start..caret]
                    .chars()
                    .take_while(|c| *c == ' ' || *c == '\t')
                    .collect();
                return self.insert(buffer, caret, &format!("\n{indent}"));
            }
            KeyCode::Backspace => {
                let prev = prev_boundary(text, caret)?;
                return self.replace(buffer, prev..caret, "");
            }
            KeyCode::Delete => {
                let next = next_boundary(text, caret)?;
                return self.replace(buffer, caret..next, "");
            }
            KeyCode::Left => {
                self.caret = prev_boundary(text, caret).unwrap_or(caret);
                self.preferred_col = None;
            }
            KeyCode::Right => {
                self.caret = next_boundary(text, caret).unwrap_or(caret);
                self.preferred_col = None;
            }
            KeyCode::Home => {
                self.caret = line_start(text, caret);
                self.preferred_col = None;
            }
            KeyCode::End => {
                self.caret = line_end(text, caret);
                self.preferred_col = None;
            }
            KeyCode::Up => self.move_vertically(text, caret, -1),
            KeyCode::Down => self.move_vertically(text, caret, 1),
            KeyCode::PageUp => {
                let page = self.viewport.height.max(1) as isize;
                self.move_vertically(text, caret, -page);
            }
            KeyCode::PageDown => {
                let page = self.viewport.height.max(1) as isize;
                self.move_vertically(text, caret, page);
            }
            _ => return None,
        }

        self.follow_caret(text);
        None
    }

    fn insert(&mut self, buffer: &EditorBuffer, caret: usize, s: &str) -> Option<EditorEvent> {
        self.replace(buffer, caret..caret, s)
    }

    fn replace(
        &mut self,
        buffer: &EditorBuffer,
        range: std::ops::Range<usize>,
        s: &str,
    ) -> Option<EditorEvent> {
        if self.read_only {
            return None;
        }

        let mut text = String::with_capacity(buffer.text.len() + s.len());
        text.push_str(&buffer.text[..range.start]);
        text.push_str(s);
        text.push_str(&buffer.text[range.end..]);

        self.caret = range.start + s.len();
        self.preferred_col = None;
        self.follow_caret(&text);

        Some(EditorEvent::Changed(EditorBuffer {
            text,
            language: buffer.language,
        }))
    }

    fn move_vertically(&mut self, text: &str, caret: usize, lines: isize) {
        let start = line_start(text, caret);
        let col = *self
            .preferred_col
            .get_or_insert_with(|| text[start..caret].chars().count());

        let mut target_start = start;
        if lines < 0 {
            for _ in 0..lines.unsigned_abs() {
                if target_start == 0 {
                    break;
                }
                target_start = line_start(text, target_start - 1);
            }
        } else {
            for _ in 0..lines {
                let end = line_end(text, target_start);
                if end == text.len() {
                    break;
                }
                target_start = end + 1;
            }
        }

        let target_end = line_end(text, target_start);
        self.caret = text[target_start..target_end]
            .char_indices()
            .nth(col)
            .map(|(i, _)| target_start + i)
            .unwrap_or(target_end);
    }

    /// Adjust scroll offsets so the caret stays inside the viewport
    fn follow_caret(&mut self, text: &str) {
        let caret = clamp_offset(text, self.caret);
        let line = text[..caret].matches('\n').count();
        let col = unicode_width::UnicodeWidthStr::width(&text[line_start(text, caret)..caret]);

        let Viewport { width, height } = self.viewport;
        if height > 0 {
            if line < self.scroll.top {
                self.scroll.top = line;
            } else if line >= self.scroll.top + height {
                self.scroll.top = line + 1 - height;
            }
        }
        if width > 0 {
            if col < self.scroll.left {
                self.scroll.left = col;
            } else if col >= self.scroll.left + width {
                self.scroll.left = col + 1 - width;
            }
        }
    }
}

fn clamp_offset(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(text: &str, offset: usize) -> usize {
    text[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(text.len())
}

fn prev_boundary(text: &str, offset: usize) -> Option<usize> {
    text[..offset].char_indices().next_back().map(|(i, _)| i)
}

fn next_boundary(text: &str, offset: usize) -> Option<usize> {
    text[offset..].chars().next().map(|c| offset + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn apply(editor: &mut CodeEditor, buffer: &mut EditorBuffer, code: KeyCode) {
        if let Some(EditorEvent::Changed(next)) = editor.handle_key(buffer, key(code)) {
            *buffer = next;
        }
    }

    #[test]
    fn test_typing_emits_full_replacement_buffer() {
        let buffer = EditorBuffer::new("ab", Language::JavaScript);
        let mut editor = CodeEditor::new();
        editor.set_caret(&buffer, 1);

        let event = editor.handle_key(&buffer, key(KeyCode::Char('x')));
        assert_eq!(
            event,
            Some(EditorEvent::Changed(EditorBuffer::new(
                "axb",
                Language::JavaScript
            )))
        );
        // input buffer untouched
        assert_eq!(buffer.text, "ab");
    }

    #[test]
    fn test_tab_inserts_two_spaces_and_advances_caret() {
        let mut buffer = EditorBuffer::new("x", Language::Java);
        let mut editor = CodeEditor::new();

        apply(&mut editor, &mut buffer, KeyCode::Tab);
        assert_eq!(buffer.text, "  x");
        assert_eq!(editor.caret(&buffer), 2);
    }

    #[test]
    fn test_backtab_is_swallowed() {
        let buffer = EditorBuffer::new("x", Language::Java);
        let mut editor = CodeEditor::new();
        assert_eq!(editor.handle_key(&buffer, key(KeyCode::BackTab)), None);
        assert_eq!(editor.caret(&buffer), 0);
    }

    #[test]
    fn test_enter_keeps_indentation() {
        let mut buffer = EditorBuffer::new("    foo();", Language::Cpp);
        let mut editor = CodeEditor::new();
        editor.set_caret(&buffer, buffer.text.len());

        apply(&mut editor, &mut buffer, KeyCode::Enter);
        assert_eq!(buffer.text, "    foo();\n    ");
        assert_eq!(editor.caret_line_col(&buffer), (1, 4));
    }

    #[test]
    fn test_backspace_and_delete_respect_char_boundaries() {
        let mut buffer = EditorBuffer::new("aéb", Language::JavaScript);
        let mut editor = CodeEditor::new();
        editor.set_caret(&buffer, 3); // after 'é'

        apply(&mut editor, &mut buffer, KeyCode::Backspace);
        assert_eq!(buffer.text, "ab");
        assert_eq!(editor.caret(&buffer), 1);

        apply(&mut editor, &mut buffer, KeyCode::Delete);
        assert_eq!(buffer.text, "a");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let buffer = EditorBuffer::new("abc", Language::JavaScript);
        let mut editor = CodeEditor::new();
        assert_eq!(editor.handle_key(&buffer, key(KeyCode::Backspace)), None);
    }

    #[test]
    fn test_read_only_blocks_edits_but_allows_navigation() {
        let buffer = EditorBuffer::new("abc\ndef", Language::JavaScript);
        let mut editor = CodeEditor::new().with_read_only(true);

        assert_eq!(editor.handle_key(&buffer, key(KeyCode::Char('x'))), None);
        assert_eq!(editor.handle_key(&buffer, key(KeyCode::Tab)), None);
        editor.handle_key(&buffer, key(KeyCode::Down));
        assert_eq!(editor.caret_line_col(&buffer), (1, 0));
    }

    #[test]
    fn test_language_switch_event() {
        let buffer = EditorBuffer::new("", Language::JavaScript);
        let mut editor = CodeEditor::new();
        assert_matches!(
            editor.handle_key(&buffer, key(KeyCode::F(2))),
            Some(EditorEvent::LanguageChanged(Language::Java))
        );
    }

    #[test]
    fn test_control_chords_are_left_to_the_caller() {
        let buffer = EditorBuffer::new("", Language::JavaScript);
        let mut editor = CodeEditor::new();
        let chord = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(editor.handle_key(&buffer, chord), None);
    }

    #[test]
    fn test_vertical_movement_keeps_preferred_column() {
        let buffer = EditorBuffer::new("abcdef\nab\nabcdef", Language::JavaScript);
        let mut editor = CodeEditor::new();
        editor.set_caret(&buffer, 5);

        editor.handle_key(&buffer, key(KeyCode::Down));
        assert_eq!(editor.caret_line_col(&buffer), (1, 2));
        editor.handle_key(&buffer, key(KeyCode::Down));
        assert_eq!(editor.caret_line_col(&buffer), (2, 5));
        editor.handle_key(&buffer, key(KeyCode::Up));
        editor.handle_key(&buffer, key(KeyCode::Up));
        assert_eq!(editor.caret_line_col(&buffer), (0, 5));
    }

    #[test]
    fn test_home_end() {
        let buffer = EditorBuffer::new("one\ntwo three", Language::JavaScript);
        let mut editor = CodeEditor::new();
        editor.set_caret(&buffer, 6);
        editor.handle_key(&buffer, key(KeyCode::End));
        assert_eq!(editor.caret(&buffer), buffer.text.len());
        editor.handle_key(&buffer, key(KeyCode::Home));
        assert_eq!(editor.caret(&buffer), 4);
    }

    #[test]
    fn test_caret_is_clamped_to_a_shorter_caller_buffer() {
        let long = EditorBuffer::new("hello world", Language::JavaScript);
        let short = EditorBuffer::new("hi", Language::JavaScript);
        let mut editor = CodeEditor::new();
        editor.set_caret(&long, 11);
        assert_eq!(editor.caret(&short), 2);
    }

    #[test]
    fn test_scroll_follows_caret_vertically() {
        let text = (0..20).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let buffer = EditorBuffer::new(text, Language::JavaScript);
        let mut editor = CodeEditor::new();
        editor.set_viewport(&buffer, 40, 5);

        for _ in 0..7 {
            editor.handle_key(&buffer, key(KeyCode::Down));
        }
        assert_eq!(editor.caret_line_col(&buffer).0, 7);
        assert_eq!(editor.scroll().top, 3);

        editor.handle_key(&buffer, key(KeyCode::PageUp));
        assert_eq!(editor.caret_line_col(&buffer).0, 2);
        assert_eq!(editor.scroll().top, 2);
    }

    #[test]
    fn test_scroll_follows_caret_horizontally() {
        let buffer = EditorBuffer::new("x".repeat(30), Language::JavaScript);
        let mut editor = CodeEditor::new();
        editor.set_viewport(&buffer, 10, 5);
        editor.handle_key(&buffer, key(KeyCode::End));
        assert_eq!(editor.scroll().left, 21);
        editor.handle_key(&buffer, key(KeyCode::Home));
        assert_eq!(editor.scroll().left, 0);
    }

    #[test]
    fn test_ctrl_arrows_scroll_without_moving_caret() {
        let buffer = EditorBuffer::new("a\nb\nc\nd", Language::Java);
        let mut editor = CodeEditor::new().with_read_only(true);
        let ctrl_down = KeyEvent::new(KeyCode::Down, KeyModifiers::CONTROL);

        assert_eq!(editor.handle_key(&buffer, ctrl_down), None);
        assert_eq!(editor.handle_key(&buffer, ctrl_down), None);
        assert_eq!(editor.scroll().top, 2);
        assert_eq!(editor.caret(&buffer), 0);

        editor.handle_key(&buffer, KeyEvent::new(KeyCode::Up, KeyModifiers::CONTROL));
        assert_eq!(editor.scroll().top, 1);
    }

    #[test]
    fn test_scroll_lines_is_bounded() {
        let buffer = EditorBuffer::new("a\nb\nc", Language::JavaScript);
        let mut editor = CodeEditor::new();
        editor.scroll_lines(&buffer, 10);
        assert_eq!(editor.scroll().top, 2);
        editor.scroll_lines(&buffer, -10);
        assert_eq!(editor.scroll().top, 0);
    }
}
