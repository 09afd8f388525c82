pub mod templates;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use templates::starter_code;

/// Languages the editor can highlight and the backend can run
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    #[value(name = "javascript")]
    JavaScript,
    Java,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::JavaScript, Language::Java, Language::Cpp];

    /// Label shown on the editor's language tabs
    pub fn label(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Language::JavaScript => "js",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Next language in tab order, wrapping around
    pub fn next(&self) -> Language {
        match self {
            Language::JavaScript => Language::Java,
            Language::Java => Language::Cpp,
            Language::Cpp => Language::JavaScript,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_display_matches_wire_name() {
        assert_eq!(Language::JavaScript.to_string(), "javascript");
        assert_eq!(Language::Java.to_string(), "java");
        assert_eq!(Language::Cpp.to_string(), "cpp");
    }

    #[test]
    fn test_language_value_enum_names() {
        assert_eq!(
            Language::from_str("javascript", true).unwrap(),
            Language::JavaScript
        );
        assert_eq!(Language::from_str("cpp", true).unwrap(), Language::Cpp);
        assert!(Language::from_str("cobol", true).is_err());
    }

    #[test]
    fn test_language_serde_lowercase() {
        let json = serde_json::to_string(&Language::JavaScript).unwrap();
        assert_eq!(json, "\"javascript\"");
        let lang: Language = serde_json::from_str("\"java\"").unwrap();
        assert_eq!(lang, Language::Java);
    }

    #[test]
    fn test_next_cycles_through_all() {
        let mut lang = Language::default();
        for expected in [Language::Java, Language::Cpp, Language::JavaScript] {
            lang = lang.next();
            assert_eq!(lang, expected);
        }
    }

    #[test]
    fn test_labels_and_extensions() {
        assert_eq!(Language::Cpp.label(), "C++");
        assert_eq!(Language::Java.extension(), "java");
        assert_eq!(Language::ALL.len(), 3);
    }
}
