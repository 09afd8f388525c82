use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;
use tracing::warn;

use crate::language::Language;

/// Syntax categories the highlighter can emit, in resolution priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Comment,
    String,
    Keyword,
    Number,
    Function,
}

impl Category {
    /// CSS class suffix used in the markup output
    pub fn class_name(&self) -> &'static str {
        match self {
            Category::Comment => "comment",
            Category::String => "string",
            Category::Keyword => "keyword",
            Category::Number => "number",
            Category::Function => "function",
        }
    }
}

const LINE_AND_BLOCK_COMMENT: &str = r"//[^\n]*|/\*(?s:.*?)(?:\*/|$)";

const DOUBLE_QUOTED: &str = r#""(?:\\.|[^"\\\n])*""#;
const SINGLE_QUOTED: &str = r"'(?:\\.|[^'\\\n])*'";
const BACKTICK_QUOTED: &str = r"`(?:\\.|[^`\\])*`";

const NUMBER: &str = r"\b\d+(?:\.\d+)?\b";

// Name is captured separately so trailing whitespace and the paren stay unstyled.
const FUNCTION_CALL: &str = r"([A-Za-z_$][\w$]*)\s*\(";

const JAVASCRIPT_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "false", "finally", "for",
    "function", "if", "import", "in", "instanceof", "let", "new", "null", "of", "return",
    "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var",
    "void", "while", "with", "yield",
];

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "default", "do", "double", "else", "enum", "extends", "false",
    "final", "finally", "float", "for", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
    "throw", "throws", "transient", "true", "try", "var", "void", "volatile", "while",
];

const CPP_KEYWORDS: &[&str] = &[
    "auto", "bool", "break", "case", "catch", "char", "class", "const", "constexpr",
    "continue", "default", "define", "delete", "do", "double", "else", "enum", "explicit",
    "extern", "false", "float", "for", "friend", "if", "include", "inline", "int", "long",
    "namespace", "new", "noexcept", "nullptr", "operator", "private", "protected", "public",
    "return", "short", "signed", "sizeof", "static", "struct", "switch", "template", "this",
    "throw", "true", "try", "typedef", "typename", "union", "unsigned", "using", "virtual",
    "void", "volatile", "while",
];

/// Compiled matching rules for one language.
///
/// Comments and strings share one alternation so a single left-to-right scan decides
/// which of the two claims a region first. Any rule that fails to compile is `None` and
/// simply contributes no markup.
#[derive(Debug)]
pub struct PatternSet {
    pub language: Language,
    pub comment_or_string: Option<Regex>,
    pub keyword: Option<Regex>,
    pub number: Option<Regex>,
    pub function: Option<Regex>,
    pub keywords: &'static [&'static str],
}

impl PatternSet {
    fn build(language: Language) -> Self {
        let (strings, keywords) = match language {
            Language::JavaScript => (
                vec![DOUBLE_QUOTED, SINGLE_QUOTED, BACKTICK_QUOTED],
                JAVASCRIPT_KEYWORDS,
            ),
            Language::Java => (vec![DOUBLE_QUOTED, SINGLE_QUOTED], JAVA_KEYWORDS),
            Language::Cpp => (vec![DOUBLE_QUOTED, SINGLE_QUOTED], CPP_KEYWORDS),
        };

        let comment_or_string = format!(
            "(?P<comment>{LINE_AND_BLOCK_COMMENT})|(?P<string>{})",
            strings.join("|")
        );
        let keyword = format!(
            r"\b(?:{})\b",
            keywords.iter().map(|word| regex::escape(word)).join("|")
        );

        Self {
            language,
            comment_or_string: compile(language, Category::String, &comment_or_string),
            keyword: compile(language, Category::Keyword, &keyword),
            number: compile(language, Category::Number, NUMBER),
            function: compile(language, Category::Function, FUNCTION_CALL),
            keywords,
        }
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(&word)
    }
}

fn compile(language: Language, category: Category, pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(%language, category = category.class_name(), %err, "highlight rule disabled");
            None
        }
    }
}

/// Resolve the pattern set for a language, compiling it on first use
pub fn pattern_set(language: Language) -> &'static PatternSet {
    static JAVASCRIPT: OnceLock<PatternSet> = OnceLock::new();
    static JAVA: OnceLock<PatternSet> = OnceLock::new();
    static CPP: OnceLock<PatternSet> = OnceLock::new();

    let cell = match language {
        Language::JavaScript => &JAVASCRIPT,
        Language::Java => &JAVA,
        Language::Cpp => &CPP,
    };
    cell.get_or_init(|| PatternSet::build(language))
}
