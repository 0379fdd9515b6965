use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fa,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl Language {
    /// Order exposed to the host page.
    pub const ALL: [Language; 2] = [Language::Fa, Language::En];

    /// Fallback when nothing else is known.
    pub const PRIMARY: Language = Language::En;

    pub const SECONDARY: Language = Language::Fa;

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fa => "fa",
        }
    }

    /// Exact match on a stored code; anything else is not a language.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::En),
            "fa" => Some(Language::Fa),
            _ => None,
        }
    }

    /// Browser negotiation only ever selects the secondary language; a
    /// primary-language tag is the default anyway.
    pub fn from_browser_tag(tag: &str) -> Option<Self> {
        let prefix = Self::SECONDARY.code();
        if tag.to_ascii_lowercase().starts_with(prefix) {
            Some(Self::SECONDARY)
        } else {
            None
        }
    }

    pub fn other(self) -> Self {
        match self {
            Language::En => Language::Fa,
            Language::Fa => Language::En,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Language::En => Direction::Ltr,
            Language::Fa => Direction::Rtl,
        }
    }

    pub fn is_rtl(self) -> bool {
        self.direction() == Direction::Rtl
    }

    pub fn abbrev(self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Fa => "FA",
        }
    }

    /// Accessible label of the toggle while `self` is active.
    pub fn toggle_label(self) -> &'static str {
        match self {
            Language::En => "Switch language to فارسی",
            Language::Fa => "تغییر زبان به English",
        }
    }

    pub fn loading_text(self) -> &'static str {
        match self {
            Language::En => "Loading...",
            Language::Fa => "در حال بارگذاری...",
        }
    }
}
