//! Regex-driven syntax highlighting.
//!
//! Highlighting never fails: every pass works on the original text, records the
//! ranges it claims, and later passes skip anything already claimed. The markup is
//! produced in one left-to-right copy where every segment is HTML-escaped.

pub mod patterns;

use std::ops::Range;

pub use patterns::{pattern_set, Category, PatternSet};

use crate::language::Language;

/// A classified byte range of the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub range: Range<usize>,
    pub category: Category,
}

/// Sorted, non-overlapping set of claimed ranges
#[derive(Debug, Default)]
struct Claims {
    tokens: Vec<Token>,
}

impl Claims {
    /// Claim `range` unless any part of it is already claimed
    fn claim(&mut self, range: Range<usize>, category: Category) -> bool {
        if range.is_empty() {
            return false;
        }
        // first claimed token that ends after our start
        let idx = self
            .tokens
            .partition_point(|t| t.range.end <= range.start);
        if let Some(next) = self.tokens.get(idx) {
            if next.range.start < range.end {
                return false;
            }
        }
        self.tokens.insert(idx, Token { range, category });
        true
    }

    fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

/// Classify `text` into non-overlapping tokens ordered by position.
///
/// Comments and strings are resolved first, then keywords, numbers and finally
/// function names.
pub fn tokenize(text: &str, language: Language) -> Vec<Token> {
    let set = pattern_set(language);
    let mut claims = Claims::default();

    if let Some(regex) = &set.comment_or_string {
        for caps in regex.captures_iter(text) {
            if let Some(m) = caps.name("comment") {
                claims.claim(m.range(), Category::Comment);
            } else if let Some(m) = caps.name("string") {
                claims.claim(m.range(), Category::String);
            }
        }
    }

    if let Some(regex) = &set.keyword {
        for m in regex.find_iter(text) {
            // `\b` treats `$` as a boundary, so `$new` would otherwise match
            if touches_identifier(text, m.range()) {
                continue;
            }
            claims.claim(m.range(), Category::Keyword);
        }
    }

    if let Some(regex) = &set.number {
        for m in regex.find_iter(text) {
            claims.claim(m.range(), Category::Number);
        }
    }

    if let Some(regex) = &set.function {
        for caps in regex.captures_iter(text) {
            let Some(name) = caps.get(1) else {
                continue;
            };
            // `1abc(` or `a.b1c(` must not start a match mid-identifier
            let preceded_by_ident = text[..name.start()]
                .chars()
                .next_back()
                .is_some_and(is_identifier_char);
            if preceded_by_ident || set.is_keyword(name.as_str()) {
                continue;
            }
            claims.claim(name.range(), Category::Function);
        }
    }

    claims.into_tokens()
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn touches_identifier(text: &str, range: Range<usize>) -> bool {
    text[..range.start].chars().next_back().is_some_and(is_identifier_char)
        || text[range.end..].chars().next().is_some_and(is_identifier_char)
}

/// Escape the characters that would otherwise be read as markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Render `text` as display-only markup with `<span class="token …">` wrappers
pub fn highlight_html(text: &str, language: Language) -> String {
    let tokens = tokenize(text, language);
    let mut out = String::with_capacity(text.len() + tokens.len() * 32);
    let mut cursor = 0;

    for token in &tokens {
        push_escaped(&mut out, &text[cursor..token.range.start]);
        out.push_str("<span class=\"token ");
        out.push_str(token.category.class_name());
        out.push_str("\">");
        push_escaped(&mut out, &text[token.range.clone()]);
        out.push_str("</span>");
        cursor = token.range.end;
    }
    push_escaped(&mut out, &text[cursor..]);

    out
}
