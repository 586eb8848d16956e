//! Response languages offered by the dashboard's language selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OmicError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Telugu,
    Tamil,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Telugu, Language::Tamil];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Telugu  => "Telugu",
            Language::Tamil   => "Tamil",
        }
    }

    /// ISO 639-1 code sent to the translation service.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Telugu  => "te",
            Language::Tamil   => "ta",
        }
    }

    /// English answers are shown as produced and never translated.
    pub fn is_default(&self) -> bool {
        *self == Language::default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = OmicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Language::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s) || l.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| OmicError::UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_is_default() {
        assert_eq!(Language::default(), Language::English);
        assert!(Language::English.is_default());
        assert!(!Language::Tamil.is_default());
    }

    #[test]
    fn test_parse_by_name_or_code() {
        assert_eq!("telugu".parse::<Language>().unwrap(), Language::Telugu);
        assert_eq!("ta".parse::<Language>().unwrap(), Language::Tamil);
        assert_eq!(" English ".parse::<Language>().unwrap(), Language::English);
    }

    #[test]
    fn test_unknown_language_rejected() {
        let err = "Klingon".parse::<Language>().unwrap_err();
        assert!(matches!(err, OmicError::UnknownLanguage(ref s) if s == "Klingon"));
    }
}
