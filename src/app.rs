use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::chat::{
    ChatTransport, Endpoint, ExplainError, ExplanationRequest, Outcome, RequestLifecycle,
    prompt, spawn_request,
};
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::event::AppEvent;
use crate::language::{ALL_LANGUAGES, Language};
use crate::navigator::{NavError, NavState, View};
use crate::render::markup::html_to_text;
use crate::render::{MathRenderer, PlainMath, escape_html, render_formatting};
use crate::speech::Speaker;
use crate::syllabus::Syllabus;
use crate::ui::theme::Theme;

pub const ABORTED_MESSAGE: &str = "Request aborted.";

/// What the response area currently shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseState {
    Idle,
    Pending {
        topic: String,
        language: Language,
        /// An earlier request was cancelled to make room for this one.
        superseded: bool,
    },
    Rendered {
        html: String,
    },
    Aborted,
    Failed {
        message: String,
    },
}

impl ResponseState {
    /// Markup for the response area.
    pub fn html(&self) -> String {
        match self {
            ResponseState::Idle => String::new(),
            ResponseState::Pending {
                topic,
                language,
                superseded,
            } => {
                let pending = prompt::pending_message(topic, *language);
                let line = format!("<p><em>{}</em></p>", escape_html(&pending));
                if *superseded {
                    format!("<p><em>{ABORTED_MESSAGE}</em></p>{line}")
                } else {
                    line
                }
            }
            ResponseState::Rendered { html } => html.clone(),
            ResponseState::Aborted => format!("<em>{ABORTED_MESSAGE}</em>"),
            ResponseState::Failed { message } => {
                format!("<em class=\"error\">Error: {}</em>", escape_html(message))
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseState::Failed { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

/// Language picker overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LanguageModal {
    pub selected: usize,
}

impl LanguageModal {
    pub fn language(&self) -> Language {
        ALL_LANGUAGES[self.selected % ALL_LANGUAGES.len()]
    }
}

/// Collaborators the app talks to. Bundled so tests can swap each one.
pub struct Services {
    pub transport: Arc<dyn ChatTransport>,
    pub speaker: Speaker,
    pub clipboard: Box<dyn Clipboard>,
    pub events: Sender<AppEvent>,
}

pub struct App {
    pub syllabus: Syllabus,
    pub nav: NavState,
    pub theme: &'static Theme,
    pub config: Config,
    pub response: ResponseState,
    pub language_modal: Option<LanguageModal>,
    pub notice: Option<Notice>,
    /// First visible line of the response area.
    pub scroll: u16,
    pub should_quit: bool,
    lifecycle: RequestLifecycle,
    endpoint: Endpoint,
    math: Option<Box<dyn MathRenderer>>,
    services: Services,
}

impl App {
    pub fn new(syllabus: Syllabus, config: Config, theme: &'static Theme, services: Services) -> Self {
        let math: Option<Box<dyn MathRenderer>> = if config.math_rendering {
            Some(Box::new(PlainMath))
        } else {
            None
        };
        Self {
            nav: NavState::new(config.default_language),
            endpoint: config.endpoint(),
            syllabus,
            theme,
            config,
            response: ResponseState::Idle,
            language_modal: None,
            notice: None,
            scroll: 0,
            should_quit: false,
            lifecycle: RequestLifecycle::new(),
            math,
            services,
        }
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.lifecycle.in_flight()
    }

    /// Activates the highlighted row of whichever list is showing.
    pub fn open_selected(&mut self) {
        let selected = self.nav.selected;
        let result = match self.nav.view() {
            View::Home => match self.syllabus.subjects().get(selected) {
                Some(subject) => {
                    let name = subject.name.clone();
                    self.nav.open_subject(&self.syllabus, &name)
                }
                None => Ok(()),
            },
            View::Units => self.nav.open_unit(&self.syllabus, selected),
            View::Topics => self
                .nav
                .select_topic_at(&self.syllabus, selected)
                .map(|_| self.show_language_modal()),
        };
        if let Err(err) = result {
            self.report_nav_error(err);
        }
    }

    /// Direct jump used by the number keys; out-of-range indices are reported,
    /// not clamped.
    pub fn open_unit(&mut self, index: usize) {
        if let Err(err) = self.nav.open_unit(&self.syllabus, index) {
            self.report_nav_error(err);
        }
    }

    pub fn select_topic(&mut self, topic: &str) {
        self.nav.select_topic(topic);
        self.show_language_modal();
    }

    fn report_nav_error(&mut self, err: NavError) {
        tracing::warn!(%err, "navigation rejected");
        self.set_notice(err.to_string(), NoticeKind::Warning);
    }

    pub fn back(&mut self) {
        match self.nav.view() {
            View::Home => {}
            View::Units => self.nav.back_to_subjects(),
            View::Topics => self.nav.back_to_units(),
        }
    }

    pub fn show_language_modal(&mut self) {
        let selected = ALL_LANGUAGES
            .iter()
            .position(|&l| l == self.nav.language)
            .unwrap_or(0);
        self.language_modal = Some(LanguageModal { selected });
    }

    pub fn hide_language_modal(&mut self) {
        self.language_modal = None;
    }

    /// Escape inside the language picker: close it and stop everything.
    pub fn dismiss_language_modal(&mut self) {
        self.hide_language_modal();
        self.abort();
    }

    pub fn modal_next(&mut self) {
        if let Some(modal) = self.language_modal.as_mut() {
            modal.selected = (modal.selected + 1) % ALL_LANGUAGES.len();
        }
    }

    pub fn modal_prev(&mut self) {
        if let Some(modal) = self.language_modal.as_mut() {
            modal.selected = (modal.selected + ALL_LANGUAGES.len() - 1) % ALL_LANGUAGES.len();
        }
    }

    /// Records the session language and immediately asks about the current topic.
    pub fn choose_language(&mut self, language: Language) -> Result<u64, ExplainError> {
        self.nav.language = language;
        self.hide_language_modal();
        self.request_explanation()
    }

    /// Issues the request for the current topic in the session language.
    ///
    /// Any outstanding request and any speech are cancelled first. The result
    /// arrives later as [`AppEvent::Explanation`].
    pub fn request_explanation(&mut self) -> Result<u64, ExplainError> {
        let Some(topic) = self.nav.current_topic().map(str::to_string) else {
            self.set_notice(ExplainError::NoTopicSelected.to_string(), NoticeKind::Warning);
            return Err(ExplainError::NoTopicSelected);
        };
        let subject = self
            .nav
            .current_subject(&self.syllabus)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let language = self.nav.language;

        self.services.speaker.cancel();
        let ticket = self.lifecycle.begin();
        if let Some(old) = ticket.superseded {
            tracing::warn!(id = old, "request superseded and aborted");
        }

        self.scroll = 0;
        self.response = ResponseState::Pending {
            topic: topic.clone(),
            language,
            superseded: ticket.superseded.is_some(),
        };

        tracing::info!(id = ticket.id, %topic, %language, "requesting explanation");
        let request = ExplanationRequest::new(ticket.id, &topic, &subject, language);
        let events = self.services.events.clone();
        spawn_request(
            Arc::clone(&self.services.transport),
            self.endpoint.clone(),
            request,
            ticket.token,
            move |id, outcome| {
                // The loop may already be gone on shutdown.
                let _ = events.send(AppEvent::Explanation { id, outcome });
            },
        );
        Ok(ticket.id)
    }

    /// Applies a worker's result. Returns false when it was stale and dropped.
    pub fn apply_outcome(&mut self, id: u64, outcome: Outcome) -> bool {
        if !self.lifecycle.complete(id) {
            tracing::debug!(id, "dropping stale explanation result");
            return false;
        }
        self.scroll = 0;
        match outcome {
            Outcome::Success { text } => {
                let html = render_formatting(&text, self.math.as_deref());
                tracing::info!(id, chars = text.len(), "explanation received");
                if let Err(err) = self.services.speaker.speak(&html, self.nav.language) {
                    tracing::warn!(%err, "speech failed");
                }
                self.response = ResponseState::Rendered { html };
            }
            Outcome::Aborted => {
                self.response = ResponseState::Aborted;
            }
            Outcome::Failed(err) => {
                tracing::error!(id, %err, "explanation request failed");
                self.response = ResponseState::Failed {
                    message: err.to_string(),
                };
            }
        }
        true
    }

    /// Escape key and the stop action: silence speech and abort the request.
    pub fn abort(&mut self) {
        self.services.speaker.cancel();
        if let Some(id) = self.lifecycle.cancel() {
            tracing::info!(id, "request aborted by user");
            self.response = ResponseState::Aborted;
        }
    }

    pub fn copy_response(&mut self) {
        let text = html_to_text(&self.response.html());
        match self.services.clipboard.copy_text(&text) {
            Ok(()) => self.set_notice("Copied", NoticeKind::Info),
            Err(err) => {
                tracing::warn!(%err, "copy failed");
                self.set_notice("Unable to copy", NoticeKind::Warning);
            }
        }
    }

    /// Back to a fresh home screen, as if the program had just started.
    pub fn restart(&mut self) {
        self.services.speaker.cancel();
        self.lifecycle.cancel();
        self.nav.restart();
        self.response = ResponseState::Idle;
        self.scroll = 0;
        self.language_modal = None;
        self.notice = None;
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn set_notice(&mut self, message: impl Into<String>, kind: NoticeKind) {
        self.notice = Some(Notice {
            message: message.into(),
            kind,
        });
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}
