/// Two-language text used by every displayed field
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported content languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ar,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// The fallback language for display
    pub fn other(self) -> Language {
        match self {
            Language::En => Language::Ar,
            Language::Ar => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

/// Text in English and Arabic; either side may be empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub ar: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// English-only text
    pub fn en(en: impl Into<String>) -> Self {
        Self::new(en, String::new())
    }

    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.en,
            Language::Ar => &self.ar,
        }
    }

    pub fn set(&mut self, lang: Language, value: impl Into<String>) {
        match lang {
            Language::En => self.en = value.into(),
            Language::Ar => self.ar = value.into(),
        }
    }

    /// Text in `preferred`, falling back to the other language when blank
    pub fn display(&self, preferred: Language) -> &str {
        let text = self.get(preferred);
        if text.trim().is_empty() {
            self.get(preferred.other())
        } else {
            text
        }
    }

    /// True when neither language has text
    pub fn is_empty(&self) -> bool {
        self.en.trim().is_empty() && self.ar.trim().is_empty()
    }
}
