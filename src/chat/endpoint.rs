use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::chat::ExplanationRequest;

/// Shape of the backend the tutor talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ApiVariant {
    /// `POST {base}/api/chat` with `{ "prompt" }`.
    #[default]
    ChatEndpoint,
    /// `POST {base}` with `{ "prompt", "lang", "topic", "subject" }`.
    BaseUrl,
}

impl ApiVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiVariant::ChatEndpoint => "chat-endpoint",
            ApiVariant::BaseUrl => "base-url",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub base: String,
    pub variant: ApiVariant,
}

impl Endpoint {
    pub fn new(base: impl Into<String>, variant: ApiVariant) -> Self {
        Self {
            base: base.into(),
            variant,
        }
    }

    pub fn url(&self) -> String {
        let base = self.base.trim_end_matches('/');
        match self.variant {
            ApiVariant::ChatEndpoint => format!("{base}/api/chat"),
            ApiVariant::BaseUrl => base.to_string(),
        }
    }

    pub fn body(&self, request: &ExplanationRequest) -> Value {
        match self.variant {
            ApiVariant::ChatEndpoint => json!({ "prompt": request.prompt }),
            ApiVariant::BaseUrl => json!({
                "prompt": request.prompt,
                "lang": request.language.code(),
                "topic": request.topic,
                "subject": request.subject,
            }),
        }
    }
}
