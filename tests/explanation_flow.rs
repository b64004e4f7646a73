use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use syllabot::app::{ABORTED_MESSAGE, App, NoticeKind, ResponseState, Services};
use syllabot::chat::{ApiVariant, ChatTransport, Outcome, RawResponse, TransportError};
use syllabot::clipboard::{Clipboard, ClipboardError};
use syllabot::config::Config;
use syllabot::event::AppEvent;
use syllabot::language::Language;
use syllabot::navigator::View;
use syllabot::speech::{SpeechEngine, SpeechError, Speaker, Utterance, Voice};
use syllabot::syllabus::Syllabus;
use syllabot::ui::theme::Theme;

const SYLLABUS: &str = r#"
[[subjects]]
name = "Transportation Engineering"
description = "Roads and railways"

[[subjects.units]]
title = "Highway geometry"
topics = ["Camber", "Super elevation", "Sight distance"]

[[subjects.units]]
title = "Pavements"
topics = ["Flexible pavement", "Rigid pavement"]

[[subjects]]
name = "Soil Mechanics and Foundation"
description = "Soils"

[[subjects.units]]
title = "Compaction"
topics = ["Proctor test"]
"#;

type Reply = Box<dyn Fn(&Value) -> Result<RawResponse, TransportError> + Send + Sync>;

/// Records every POST and holds each one until the test releases it.
struct GatedTransport {
    calls: Mutex<Vec<(String, Value)>>,
    gate: Mutex<Receiver<()>>,
    reply: Reply,
}

impl ChatTransport for GatedTransport {
    fn post_json(&self, url: &str, body: &Value) -> Result<RawResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        let _ = self.gate.lock().unwrap().recv();
        (self.reply)(body)
    }
}

/// Echoes the topic back so each reply can be traced to its request. The
/// apostrophe, ampersand and math span all go through escaping.
fn echo_topic(body: &Value) -> Result<RawResponse, TransportError> {
    let topic = body["topic"].as_str().unwrap_or("?");
    Ok(RawResponse {
        status: 200,
        status_text: "OK".to_string(),
        body: Some(
            serde_json::json!({ "text": format!("It's **{topic}** & $a*b^2$") }).to_string(),
        ),
    })
}

fn echo_html(topic: &str) -> String {
    format!(
        "<p>It&#039;s <strong>{topic}</strong> &amp; <code class=\"math\">a&#42;b\u{00b2}</code></p>"
    )
}

#[derive(Clone, Default)]
struct SpeechLog(Arc<Mutex<Vec<String>>>);

impl SpeechLog {
    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct RecordingSpeech(SpeechLog);

impl SpeechEngine for RecordingSpeech {
    fn voices(&self) -> Vec<Voice> {
        vec![
            Voice {
                name: "english".to_string(),
                lang: "en-GB".to_string(),
            },
            Voice {
                name: "hindi".to_string(),
                lang: "hi".to_string(),
            },
        ]
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError> {
        let voice = utterance.voice.as_ref().map_or("-", |v| v.name.as_str());
        self.0
            .0
            .lock()
            .unwrap()
            .push(format!("speak {} {voice}: {}", utterance.lang, utterance.text));
        Ok(())
    }

    fn cancel(&mut self) {
        self.0.0.lock().unwrap().push("cancel".to_string());
    }
}

#[derive(Clone, Default)]
struct MemoryClipboard(Arc<Mutex<Option<String>>>);

impl Clipboard for MemoryClipboard {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        *self.0.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

struct Harness {
    app: App,
    transport: Arc<GatedTransport>,
    release: Sender<()>,
    events: Receiver<AppEvent>,
    speech: SpeechLog,
    clipboard: MemoryClipboard,
}

impl Harness {
    fn new(reply: Reply) -> Self {
        let (release, gate) = mpsc::channel();
        let transport = Arc::new(GatedTransport {
            calls: Mutex::new(Vec::new()),
            gate: Mutex::new(gate),
            reply,
        });
        let (tx, events) = mpsc::channel();
        let speech = SpeechLog::default();
        let clipboard = MemoryClipboard::default();
        let services = Services {
            transport: transport.clone(),
            speaker: Speaker::new(Box::new(RecordingSpeech(speech.clone())), 0.95, 1.0),
            clipboard: Box::new(clipboard.clone()),
            events: tx,
        };
        let config = Config {
            api_base: "http://backend.test".to_string(),
            api_variant: ApiVariant::BaseUrl,
            ..Config::default()
        };
        let theme: &'static Theme = Box::leak(Box::new(Theme::default()));
        let syllabus = Syllabus::from_toml_str(SYLLABUS).unwrap();
        Self {
            app: App::new(syllabus, config, theme, services),
            transport,
            release,
            events,
            speech,
            clipboard,
        }
    }

    fn echo() -> Self {
        Self::new(Box::new(echo_topic))
    }

    /// Home → first subject → unit `unit` → topic `topic`; leaves the modal open.
    fn pick_topic(&mut self, unit: usize, topic: usize) {
        self.app.nav.restart();
        self.app.open_selected();
        self.app.open_unit(unit);
        self.app.nav.selected = topic;
        self.app.open_selected();
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.transport.calls.lock().unwrap().clone()
    }

    /// Lets one blocked POST return and waits for its completion event.
    fn finish_one(&self) -> (u64, Outcome) {
        self.release.send(()).unwrap();
        self.next_completion()
    }

    fn next_completion(&self) -> (u64, Outcome) {
        loop {
            match self.events.recv_timeout(Duration::from_secs(5)) {
                Ok(AppEvent::Explanation { id, outcome }) => return (id, outcome),
                Ok(_) => continue,
                Err(err) => panic!("no completion event: {err}"),
            }
        }
    }
}

#[test]
fn no_topic_means_no_request() {
    let mut h = Harness::echo();
    let err = h.app.request_explanation().unwrap_err();
    assert_eq!(err.to_string(), "No topic selected");
    assert!(h.calls().is_empty());
    let notice = h.app.notice.clone().unwrap();
    assert_eq!(notice.message, "No topic selected");
    assert_eq!(notice.kind, NoticeKind::Warning);
    assert_eq!(h.app.response, ResponseState::Idle);
}

#[test]
fn navigation_shows_units_and_topics_in_order() {
    let mut h = Harness::echo();
    h.app.open_selected();
    assert_eq!(h.app.nav.view(), View::Units);
    assert_eq!(
        h.app.nav.breadcrumb(&h.app.syllabus),
        "Transportation Engineering"
    );
    let units: Vec<&str> = h
        .app
        .nav
        .current_subject(&h.app.syllabus)
        .unwrap()
        .units
        .iter()
        .map(|u| u.title.as_str())
        .collect();
    assert_eq!(units, vec!["Highway geometry", "Pavements"]);

    h.app.open_unit(1);
    assert_eq!(h.app.nav.view(), View::Topics);
    let topics = &h.app.nav.current_unit(&h.app.syllabus).unwrap().topics;
    assert_eq!(topics, &vec!["Flexible pavement", "Rigid pavement"]);
}

#[test]
fn out_of_range_unit_leaves_state_alone() {
    let mut h = Harness::echo();
    h.app.open_selected();
    h.app.open_unit(7);
    assert_eq!(h.app.nav.view(), View::Units);
    assert!(h.app.notice.is_some());
}

#[test]
fn topic_then_language_sends_one_request() {
    let mut h = Harness::echo();
    h.pick_topic(0, 1);
    assert!(h.app.language_modal.is_some());
    assert!(h.calls().is_empty());

    let id = h.app.choose_language(Language::Hindi).unwrap();
    assert!(h.app.language_modal.is_none());
    assert!(matches!(h.app.response, ResponseState::Pending { superseded: false, .. }));

    let (done, outcome) = h.finish_one();
    assert_eq!(done, id);
    assert!(h.app.apply_outcome(done, outcome));

    let calls = h.calls();
    assert_eq!(calls.len(), 1);
    let (url, body) = &calls[0];
    assert_eq!(url, "http://backend.test");
    assert_eq!(body["lang"], "hi");
    assert_eq!(body["topic"], "Super elevation");
    assert_eq!(body["subject"], "Transportation Engineering");
    assert!(body["prompt"].as_str().unwrap().contains("Super elevation"));

    assert_eq!(
        h.app.response,
        ResponseState::Rendered {
            html: echo_html("Super elevation")
        }
    );
    let spoken = h.speech.entries();
    assert_eq!(
        spoken.last().unwrap(),
        "speak hi-IN hindi: It's Super elevation & a*b\u{00b2}"
    );
    assert_eq!(h.app.nav.language, Language::Hindi);
}

#[test]
fn newer_request_supersedes_older() {
    let mut h = Harness::echo();
    h.pick_topic(0, 0);
    let first = h.app.choose_language(Language::English).unwrap();
    h.pick_topic(0, 2);
    let spoken_before = h.speech.entries().len();
    let second = h.app.choose_language(Language::English).unwrap();
    assert_ne!(first, second);
    assert_eq!(h.speech.entries()[spoken_before..], ["cancel".to_string()]);

    assert!(h.app.response.html().starts_with("<p><em>Request aborted.</em></p>"));
    assert_eq!(h.app.in_flight(), Some(second));

    h.release.send(()).unwrap();
    h.release.send(()).unwrap();
    let a = h.next_completion();
    let b = h.next_completion();

    let mut applied = Vec::new();
    for (id, outcome) in [a, b] {
        if h.app.apply_outcome(id, outcome) {
            applied.push(id);
        }
    }
    assert_eq!(applied, vec![second]);
    assert_eq!(h.app.response.html(), echo_html("Sight distance"));

    // Only the surviving request is spoken, after the cancel it issued.
    let spoken = h.speech.entries();
    let speaks: Vec<usize> = (0..spoken.len())
        .filter(|&i| spoken[i].starts_with("speak"))
        .collect();
    assert_eq!(speaks, vec![spoken.len() - 1]);
    assert_eq!(spoken[spoken_before], "cancel");
    assert!(spoken_before < speaks[0]);
    assert_eq!(
        spoken[speaks[0]],
        "speak en-IN english: It's Sight distance & a*b\u{00b2}"
    );
    // The first worker may see its cancellation before it ever posts.
    let calls = h.calls();
    assert!(!calls.is_empty() && calls.len() <= 2);
    assert_eq!(calls.last().unwrap().1["topic"], "Sight distance");
}

#[test]
fn server_error_is_shown_with_status() {
    let mut h = Harness::new(Box::new(|_| {
        Ok(RawResponse {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            body: Some("<down>".to_string()),
        })
    }));
    h.pick_topic(1, 0);
    h.app.choose_language(Language::English).unwrap();
    let (id, outcome) = h.finish_one();
    assert!(h.app.apply_outcome(id, outcome));

    assert!(h.app.response.is_error());
    let html = h.app.response.html();
    assert!(html.contains("503"));
    assert!(html.contains("&lt;down&gt;"));
    assert!(!html.contains("<down>"));
}

#[test]
fn network_error_is_shown() {
    let mut h = Harness::new(Box::new(|_| {
        Err(TransportError::Network("connection refused".to_string()))
    }));
    h.pick_topic(0, 0);
    h.app.choose_language(Language::English).unwrap();
    let (id, outcome) = h.finish_one();
    assert!(h.app.apply_outcome(id, outcome));
    assert_eq!(
        h.app.response.html(),
        "<em class=\"error\">Error: connection refused</em>"
    );
}

#[test]
fn abort_shows_message_and_silences_speech() {
    let mut h = Harness::echo();
    h.pick_topic(0, 0);
    let id = h.app.choose_language(Language::English).unwrap();

    h.app.abort();
    assert_eq!(h.app.response, ResponseState::Aborted);
    assert!(h.app.response.html().contains(ABORTED_MESSAGE));
    assert_eq!(h.speech.entries().last().unwrap(), "cancel");
    assert_eq!(h.app.in_flight(), None);

    let (done, outcome) = h.finish_one();
    assert_eq!(done, id);
    assert_eq!(outcome, Outcome::Aborted);
    assert!(!h.app.apply_outcome(done, outcome));
    assert_eq!(h.app.response, ResponseState::Aborted);
}

#[test]
fn escape_in_language_picker_aborts_request() {
    let mut h = Harness::echo();
    h.pick_topic(0, 0);
    let id = h.app.choose_language(Language::English).unwrap();

    // Re-open the picker for the same topic, then back out of it.
    h.app.show_language_modal();
    let spoken_before = h.speech.entries().len();
    h.app.dismiss_language_modal();

    assert!(h.app.language_modal.is_none());
    assert_eq!(h.app.response, ResponseState::Aborted);
    assert_eq!(h.app.response.html(), format!("<em>{ABORTED_MESSAGE}</em>"));
    assert_eq!(h.speech.entries()[spoken_before..], ["cancel".to_string()]);
    assert_eq!(h.app.in_flight(), None);

    let (done, outcome) = h.finish_one();
    assert_eq!(done, id);
    assert!(!h.app.apply_outcome(done, outcome));
    assert!(!h.speech.entries().iter().any(|e| e.starts_with("speak")));
}

#[test]
fn markdown_reply_is_rendered_without_raw_markers() {
    let mut h = Harness::new(Box::new(|_| {
        Ok(RawResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: Some(r#"{"text":"**A** and *b* $x^2$"}"#.to_string()),
        })
    }));
    h.pick_topic(0, 0);
    h.app.choose_language(Language::English).unwrap();
    let (id, outcome) = h.finish_one();
    assert!(h.app.apply_outcome(id, outcome));

    let html = h.app.response.html();
    assert!(html.contains("<strong>A</strong>"));
    assert!(html.contains("<em>b</em>"));
    assert!(!html.contains('$'));
    assert!(!html.contains('*'));
}

#[test]
fn empty_reply_falls_back_to_placeholder() {
    let mut h = Harness::new(Box::new(|_| {
        Ok(RawResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: Some("{}".to_string()),
        })
    }));
    h.pick_topic(0, 0);
    h.app.choose_language(Language::English).unwrap();
    let (id, outcome) = h.finish_one();
    assert!(h.app.apply_outcome(id, outcome));
    assert_eq!(h.app.response.html(), "<p>No response from server</p>");
}

#[test]
fn copy_puts_plain_text_on_clipboard() {
    let mut h = Harness::echo();
    h.pick_topic(0, 0);
    h.app.choose_language(Language::English).unwrap();
    let (id, outcome) = h.finish_one();
    h.app.apply_outcome(id, outcome);

    h.app.copy_response();
    assert_eq!(
        h.clipboard.0.lock().unwrap().as_deref(),
        Some("It's Camber & a*b\u{00b2}")
    );
    assert_eq!(h.app.notice.as_ref().unwrap().message, "Copied");
}

#[test]
fn restart_returns_home_and_keeps_language() {
    let mut h = Harness::echo();
    h.pick_topic(0, 0);
    h.app.choose_language(Language::Hindi).unwrap();
    h.app.restart();

    assert_eq!(h.app.nav.view(), View::Home);
    assert_eq!(h.app.response, ResponseState::Idle);
    assert_eq!(h.app.in_flight(), None);
    assert_eq!(h.app.nav.language, Language::Hindi);

    let (id, outcome) = h.finish_one();
    assert!(!h.app.apply_outcome(id, outcome));
}
