use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Embed)]
#[folder = "assets/syllabus/"]
struct SyllabusAssets;

const BUNDLED_SYLLABUS: &str = "default.toml";

#[derive(Debug, Error)]
pub enum SyllabusError {
    #[error("failed to parse syllabus: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read syllabus file: {0}")]
    Io(#[from] std::io::Error),
    #[error("bundled syllabus asset is missing or not UTF-8")]
    MissingBundle,
    #[error("syllabus has no subjects")]
    Empty,
    #[error("subject \"{0}\" has no units")]
    NoUnits(String),
    #[error("subject \"{0}\" is declared more than once")]
    DuplicateSubject(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub title: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl Unit {
    /// Short teaser shown on a unit card: the first three topics.
    pub fn preview(&self) -> String {
        self.topics
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" \u{2022} ")
    }

    /// All topics on one line, used as the unit description.
    pub fn summary(&self) -> String {
        self.topics.join(", ")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub description: String,
    pub units: Vec<Unit>,
}

/// Static subject -> unit -> topic hierarchy. Subjects keep declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllabus {
    subjects: Vec<Subject>,
}

impl Syllabus {
    /// User file in the config dir wins over the bundled syllabus.
    pub fn load() -> Result<Self, SyllabusError> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_path = config_dir.join("syllabot").join("syllabus.toml");
            if user_path.exists() {
                match Self::from_file(&user_path) {
                    Ok(syllabus) => return Ok(syllabus),
                    Err(err) => {
                        tracing::warn!(path = %user_path.display(), %err, "ignoring user syllabus");
                    }
                }
            }
        }
        Self::bundled()
    }

    pub fn bundled() -> Result<Self, SyllabusError> {
        let file = SyllabusAssets::get(BUNDLED_SYLLABUS).ok_or(SyllabusError::MissingBundle)?;
        let content =
            std::str::from_utf8(file.data.as_ref()).map_err(|_| SyllabusError::MissingBundle)?;
        Self::from_toml_str(content)
    }

    pub fn from_file(path: &Path) -> Result<Self, SyllabusError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SyllabusError> {
        let syllabus: Syllabus = toml::from_str(content)?;
        syllabus.validate()?;
        Ok(syllabus)
    }

    pub fn from_subjects(subjects: Vec<Subject>) -> Result<Self, SyllabusError> {
        let syllabus = Self { subjects };
        syllabus.validate()?;
        Ok(syllabus)
    }

    fn validate(&self) -> Result<(), SyllabusError> {
        if self.subjects.is_empty() {
            return Err(SyllabusError::Empty);
        }
        let mut seen = HashSet::new();
        for subject in &self.subjects {
            if !seen.insert(subject.name.as_str()) {
                return Err(SyllabusError::DuplicateSubject(subject.name.clone()));
            }
            if subject.units.is_empty() {
                return Err(SyllabusError::NoUnits(subject.name.clone()));
            }
        }
        Ok(())
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}
