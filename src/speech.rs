use std::process::{Child, Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::language::Language;
use crate::render::decode_text;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[^>]+(>|$)").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("failed to start speech engine: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47-ish tag as reported by the engine, e.g. `en-gb` or `hi`.
    pub lang: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub voice: Option<Voice>,
}

/// Platform text-to-speech capability.
pub trait SpeechEngine: Send {
    fn voices(&self) -> Vec<Voice>;
    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError>;
    fn cancel(&mut self);
}

/// Used when speech is disabled or no engine is installed.
pub struct NullSpeech;

impl SpeechEngine for NullSpeech {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&mut self, _utterance: &Utterance) -> Result<(), SpeechError> {
        Ok(())
    }

    fn cancel(&mut self) {}
}

/// Strips tags, collapses whitespace runs and decodes entities, so neither
/// tags nor escapes are read aloud.
pub fn to_plain_text(text: &str) -> String {
    let stripped = TAG.replace_all(text, "");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");
    decode_text(collapsed.trim())
}

/// First voice whose language starts with the language's primary subtag,
/// else the first voice at all.
pub fn pick_voice(voices: &[Voice], language: Language) -> Option<Voice> {
    let prefix = language.tag_prefix();
    voices
        .iter()
        .find(|v| v.lang.to_ascii_lowercase().starts_with(prefix))
        .or_else(|| voices.first())
        .cloned()
}

/// Keeps at most one utterance playing.
pub struct Speaker {
    engine: Box<dyn SpeechEngine>,
    pub rate: f32,
    pub pitch: f32,
}

impl Speaker {
    pub fn new(engine: Box<dyn SpeechEngine>, rate: f32, pitch: f32) -> Self {
        Self {
            engine,
            rate,
            pitch,
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(NullSpeech), 0.95, 1.0)
    }

    /// Cancels whatever is playing, then speaks the plain-text form of `text`.
    pub fn speak(&mut self, text: &str, language: Language) -> Result<Utterance, SpeechError> {
        self.engine.cancel();
        let voices = self.engine.voices();
        let utterance = Utterance {
            text: to_plain_text(text),
            lang: language.speech_tag().to_string(),
            rate: self.rate,
            pitch: self.pitch,
            voice: pick_voice(&voices, language),
        };
        self.engine.speak(&utterance)?;
        Ok(utterance)
    }

    pub fn cancel(&mut self) {
        self.engine.cancel();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Program {
    EspeakNg,
    Say,
}

/// Speaks through a child process (`espeak-ng` or macOS `say`). Cancelling
/// kills the child.
pub struct CommandSpeech {
    program: Program,
    voices: Vec<Voice>,
    child: Option<Child>,
}

impl CommandSpeech {
    /// Probes for an installed engine. `None` if nothing usable is found.
    pub fn detect() -> Option<Self> {
        let program = if cfg!(target_os = "macos") {
            Program::Say
        } else {
            Program::EspeakNg
        };
        let listing = match program {
            Program::EspeakNg => Command::new("espeak-ng").arg("--voices").output(),
            Program::Say => Command::new("say").args(["-v", "?"]).output(),
        };
        let output = match listing {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                tracing::warn!(status = %output.status, "speech engine voice listing failed");
                return None;
            }
            Err(err) => {
                tracing::info!(%err, "no speech engine found, speech disabled");
                return None;
            }
        };
        let text = String::from_utf8_lossy(&output.stdout);
        let voices = match program {
            Program::EspeakNg => parse_espeak_voices(&text),
            Program::Say => parse_say_voices(&text),
        };
        tracing::debug!(count = voices.len(), ?program, "speech engine detected");
        Some(Self {
            program,
            voices,
            child: None,
        })
    }

    fn command(&self, utterance: &Utterance) -> Command {
        let words_per_minute = (175.0 * utterance.rate).round() as u32;
        match self.program {
            Program::EspeakNg => {
                let mut cmd = Command::new("espeak-ng");
                let voice = utterance
                    .voice
                    .as_ref()
                    .map(|v| v.lang.clone())
                    .unwrap_or_else(|| utterance.lang.to_ascii_lowercase());
                let pitch = (50.0 * utterance.pitch).clamp(0.0, 99.0).round() as u32;
                cmd.arg("-v")
                    .arg(voice)
                    .arg("-s")
                    .arg(words_per_minute.to_string())
                    .arg("-p")
                    .arg(pitch.to_string())
                    .arg("--")
                    .arg(&utterance.text);
                cmd
            }
            Program::Say => {
                let mut cmd = Command::new("say");
                if let Some(voice) = &utterance.voice {
                    cmd.arg("-v").arg(&voice.name);
                }
                cmd.arg("-r")
                    .arg(words_per_minute.to_string())
                    .arg("--")
                    .arg(&utterance.text);
                cmd
            }
        }
    }
}

impl SpeechEngine for CommandSpeech {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError> {
        self.cancel();
        if utterance.text.is_empty() {
            return Ok(());
        }
        let child = self
            .command(utterance)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        self.child = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// `espeak-ng --voices`: `Pty Language Age/Gender VoiceName File Other`.
fn parse_espeak_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            match cols.as_slice() {
                [_pty, lang, _gender, name, ..] => Some(Voice {
                    name: (*name).to_string(),
                    lang: (*lang).to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// `say -v ?`: `Name  xx_YY  # sample sentence`. Names may contain spaces.
fn parse_say_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim();
            let (name, lang) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Voice {
                name: name.to_string(),
                lang: lang.replace('_', "-"),
            })
        })
        .collect()
}
