use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::DomainError;

/// Display name → code table offered to the user.
///
/// Fixed for the lifetime of the process; codes are unique.
pub const LANGUAGE_TABLE: &[(&str, &str)] = &[
    ("Arabic", "ar"),
    ("Chinese", "zh"),
    ("Dutch", "nl"),
    ("English", "en"),
    ("Esperanto", "eo"),
    ("Filipino", "tl"),
    ("French", "fr"),
    ("German", "de"),
    ("Hindi", "hi"),
    ("Italian", "it"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Portuguese", "pt"),
    ("Russian", "ru"),
    ("Spanish", "es"),
    ("Swedish", "sv"),
    ("Ukrainian", "uk"),
    ("Polish", "pl"),
    ("Czech", "cs"),
    ("Finnish", "fi"),
    ("Turkish", "tr"),
];

/// Language code → offline speech model name.
///
/// Languages without an entry cannot be captured by voice.
pub const SPEECH_MODEL_OVERRIDES: &[(&str, &str)] = &[
    ("en", "small.en"),
    ("ar", "small"),
    ("zh", "small"),
    ("de", "small"),
    ("es", "small"),
    ("fr", "small"),
    ("hi", "small"),
    ("it", "small"),
    ("ja", "small"),
    ("ko", "small"),
    ("nl", "small"),
    ("pt", "small"),
    ("ru", "small"),
    ("sv", "small"),
    ("uk", "small"),
    ("tl", "small"),
];

/// Short language identifier such as `"en"` or `"hi"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Wrap a raw code without consulting the language table.
    ///
    /// Package metadata may name languages outside the table.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Resolve a display name ("Hindi") or a code ("hi") against the table.
    /// Both are matched without regard to ASCII case; the result is the
    /// table's canonical lowercase code.
    pub fn lookup(input: &str) -> Result<Self, DomainError> {
        let input = input.trim();
        LANGUAGE_TABLE
            .iter()
            .find(|(name, code)| {
                name.eq_ignore_ascii_case(input) || code.eq_ignore_ascii_case(input)
            })
            .map(|(_, code)| Self::new(*code))
            .ok_or_else(|| {
                DomainError::InvalidRequest(format!("Unsupported language '{}'", input))
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name from the table, if this code is part of it.
    pub fn display_name(&self) -> Option<&'static str> {
        LANGUAGE_TABLE
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(name, _)| *name)
    }

    pub fn is_supported(&self) -> bool {
        self.display_name().is_some()
    }

    /// Offline speech model configured for this language.
    pub fn speech_model(&self) -> Option<&'static str> {
        SPEECH_MODEL_OVERRIDES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, model)| *model)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
