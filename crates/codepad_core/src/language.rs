//! Language identifiers and pipeline dispatch

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Declared language of a source buffer.
///
/// The set is closed: every identifier the editor can declare has a variant,
/// whether or not it has a local execution pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    JavaScript,
    TypeScript,
    Html,
    Python,
    Cpp,
    Java,
}

impl LanguageId {
    pub const ALL: [LanguageId; 6] = [
        LanguageId::JavaScript,
        LanguageId::TypeScript,
        LanguageId::Python,
        LanguageId::Cpp,
        LanguageId::Java,
        LanguageId::Html,
    ];

    /// Canonical identifier, as accepted by [`FromStr`].
    pub fn id(self) -> &'static str {
        match self {
            LanguageId::JavaScript => "javascript",
            LanguageId::TypeScript => "typescript",
            LanguageId::Html => "html",
            LanguageId::Python => "python",
            LanguageId::Cpp => "cpp",
            LanguageId::Java => "java",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            LanguageId::JavaScript => "JavaScript",
            LanguageId::TypeScript => "TypeScript",
            LanguageId::Html => "HTML/CSS",
            LanguageId::Python => "Python",
            LanguageId::Cpp => "C++",
            LanguageId::Java => "Java",
        }
    }

    /// Extension used when a program buffer is saved on its own.
    pub fn file_extension(self) -> &'static str {
        match self {
            LanguageId::JavaScript => "js",
            LanguageId::TypeScript => "ts",
            LanguageId::Html => "html",
            LanguageId::Python => "py",
            LanguageId::Cpp => "cpp",
            LanguageId::Java => "java",
        }
    }

    /// Reverse of [`LanguageId::file_extension`], with the common aliases.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(LanguageId::JavaScript),
            "ts" | "mts" | "cts" => Some(LanguageId::TypeScript),
            "html" | "htm" => Some(LanguageId::Html),
            "py" => Some(LanguageId::Python),
            "cpp" | "cc" | "cxx" | "hpp" => Some(LanguageId::Cpp),
            "java" => Some(LanguageId::Java),
            _ => None,
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Identifier that does not name any declared language.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown language identifier '{0}'")]
pub struct UnknownLanguage(pub String);

impl FromStr for LanguageId {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(LanguageId::JavaScript),
            "typescript" | "ts" => Ok(LanguageId::TypeScript),
            "html" | "html/css" => Ok(LanguageId::Html),
            "python" | "py" => Ok(LanguageId::Python),
            "cpp" | "c++" | "cxx" => Ok(LanguageId::Cpp),
            "java" => Ok(LanguageId::Java),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

/// Steps a language goes through before producing a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pipeline {
    /// Evaluate the program buffer as-is.
    Direct,
    /// Transpile the program buffer, then evaluate the output.
    Transpile,
    /// Merge structure, style and behavior into one document.
    Markup,
    /// No local pipeline; reported back to the caller.
    Unsupported,
}

impl Pipeline {
    pub fn is_supported(self) -> bool {
        !matches!(self, Pipeline::Unsupported)
    }
}

/// Map a declared language to its pipeline.
pub fn resolve(language: LanguageId) -> Pipeline {
    match language {
        LanguageId::JavaScript => Pipeline::Direct,
        LanguageId::TypeScript => Pipeline::Transpile,
        LanguageId::Html => Pipeline::Markup,
        LanguageId::Python | LanguageId::Cpp | LanguageId::Java => Pipeline::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_covers_every_language() {
        assert_eq!(resolve(LanguageId::JavaScript), Pipeline::Direct);
        assert_eq!(resolve(LanguageId::TypeScript), Pipeline::Transpile);
        assert_eq!(resolve(LanguageId::Html), Pipeline::Markup);
        for language in [LanguageId::Python, LanguageId::Cpp, LanguageId::Java] {
            assert_eq!(resolve(language), Pipeline::Unsupported);
            assert!(!resolve(language).is_supported());
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("js".parse::<LanguageId>(), Ok(LanguageId::JavaScript));
        assert_eq!(" TypeScript ".parse::<LanguageId>(), Ok(LanguageId::TypeScript));
        assert_eq!("c++".parse::<LanguageId>(), Ok(LanguageId::Cpp));
        assert_eq!(
            "cobol".parse::<LanguageId>(),
            Err(UnknownLanguage("cobol".to_string()))
        );
    }

    #[test]
    fn test_id_round_trips_through_parse() {
        for language in LanguageId::ALL {
            assert_eq!(language.id().parse::<LanguageId>(), Ok(language));
            assert_eq!(
                LanguageId::from_extension(language.file_extension()),
                Some(language)
            );
        }
    }
}
