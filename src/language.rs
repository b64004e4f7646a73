use serde::{Deserialize, Serialize};

/// Language an explanation is requested (and spoken) in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
}

pub const ALL_LANGUAGES: [Language; 2] = [Language::English, Language::Hindi];

impl Language {
    /// Short code sent to the backend and used as the voice prefix.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
        }
    }

    /// BCP 47 tag for the utterance.
    pub fn speech_tag(self) -> &'static str {
        match self {
            Language::English => "en-IN",
            Language::Hindi => "hi-IN",
        }
    }

    /// Primary subtag of the speech tag, matched against voice languages.
    pub fn tag_prefix(self) -> &'static str {
        self.speech_tag()
            .split('-')
            .next()
            .unwrap_or_else(|| self.code())
    }

    pub fn from_code(code: &str) -> Option<Self> {
        ALL_LANGUAGES
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
