use thiserror::Error;

use crate::language::Language;
use crate::syllabus::{Subject, Syllabus, Unit};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Home,
    Units,
    Topics,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("unknown subject \"{0}\"")]
    UnknownSubject(String),
    #[error("no subject is open")]
    NoSubject,
    #[error("unit index {index} out of range (subject has {len} units)")]
    UnitOutOfRange { index: usize, len: usize },
    #[error("topic index {index} out of range (unit has {len} topics)")]
    TopicOutOfRange { index: usize, len: usize },
}

/// Pointers into the syllabus plus the session language.
///
/// Only one view is ever active. `unit` is only set while the Units or Topics
/// view is showing and always indexes the open subject's unit list.
#[derive(Clone, Debug)]
pub struct NavState {
    view: View,
    subject: Option<usize>,
    unit: Option<usize>,
    topic: Option<String>,
    pub language: Language,
    /// Highlighted row in the active list. Reset whenever the list is replaced.
    pub selected: usize,
}

impl NavState {
    pub fn new(language: Language) -> Self {
        Self {
            view: View::Home,
            subject: None,
            unit: None,
            topic: None,
            language,
            selected: 0,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn current_subject<'s>(&self, syllabus: &'s Syllabus) -> Option<&'s Subject> {
        self.subject.and_then(|idx| syllabus.subjects().get(idx))
    }

    pub fn current_unit<'s>(&self, syllabus: &'s Syllabus) -> Option<&'s Unit> {
        let subject = self.current_subject(syllabus)?;
        self.unit.and_then(|idx| subject.units.get(idx))
    }

    pub fn current_topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn breadcrumb<'s>(&self, syllabus: &'s Syllabus) -> &'s str {
        match self.view {
            View::Home => "Home",
            View::Units => self
                .current_subject(syllabus)
                .map(|s| s.name.as_str())
                .unwrap_or("Units"),
            View::Topics => "Topics",
        }
    }

    pub fn open_subject(&mut self, syllabus: &Syllabus, name: &str) -> Result<(), NavError> {
        let idx = syllabus
            .subjects()
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| NavError::UnknownSubject(name.to_string()))?;
        self.subject = Some(idx);
        self.unit = None;
        self.topic = None;
        self.show(View::Units);
        tracing::debug!(subject = name, "opened subject");
        Ok(())
    }

    /// Fails without touching state when `index` is past the unit list.
    pub fn open_unit(&mut self, syllabus: &Syllabus, index: usize) -> Result<(), NavError> {
        let subject = self.current_subject(syllabus).ok_or(NavError::NoSubject)?;
        let len = subject.units.len();
        if index >= len {
            return Err(NavError::UnitOutOfRange { index, len });
        }
        self.unit = Some(index);
        self.topic = None;
        self.show(View::Topics);
        tracing::debug!(subject = %subject.name, unit = %subject.units[index].title, "opened unit");
        Ok(())
    }

    /// Records the topic. The caller follows up with the language prompt.
    pub fn select_topic(&mut self, topic: &str) {
        self.topic = Some(topic.to_string());
    }

    pub fn select_topic_at(&mut self, syllabus: &Syllabus, index: usize) -> Result<String, NavError> {
        let unit = self.current_unit(syllabus).ok_or(NavError::NoSubject)?;
        let topic = unit
            .topics
            .get(index)
            .cloned()
            .ok_or(NavError::TopicOutOfRange {
                index,
                len: unit.topics.len(),
            })?;
        self.select_topic(&topic);
        Ok(topic)
    }

    pub fn back_to_subjects(&mut self) {
        self.subject = None;
        self.unit = None;
        self.topic = None;
        self.show(View::Home);
    }

    pub fn back_to_units(&mut self) {
        if self.subject.is_none() {
            self.back_to_subjects();
            return;
        }
        self.unit = None;
        self.topic = None;
        self.show(View::Units);
    }

    /// Equivalent of reloading the page: everything but the language resets.
    pub fn restart(&mut self) {
        self.back_to_subjects();
    }

    /// Number of rows in the active list.
    pub fn list_len(&self, syllabus: &Syllabus) -> usize {
        match self.view {
            View::Home => syllabus.len(),
            View::Units => self
                .current_subject(syllabus)
                .map_or(0, |s| s.units.len()),
            View::Topics => self.current_unit(syllabus).map_or(0, |u| u.topics.len()),
        }
    }

    pub fn select_next(&mut self, syllabus: &Syllabus) {
        let len = self.list_len(syllabus);
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn select_prev(&mut self, syllabus: &Syllabus) {
        let len = self.list_len(syllabus);
        if len == 0 {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = len - 1;
        }
    }

    fn show(&mut self, view: View) {
        self.view = view;
        self.selected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syllabus() -> Syllabus {
        Syllabus::from_toml_str(
            r#"
[[subjects]]
name = "Alpha"
description = "First"
[[subjects.units]]
title = "A1"
topics = ["a1-t1", "a1-t2"]
[[subjects.units]]
title = "A2"
topics = ["a2-t1", "a2-t2", "a2-t3"]

[[subjects]]
name = "Beta"
description = "Second"
[[subjects.units]]
title = "B1"
topics = ["b1-t1"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_starts_at_home() {
        let syl = syllabus();
        let nav = NavState::new(Language::English);
        assert_eq!(nav.view(), View::Home);
        assert_eq!(nav.breadcrumb(&syl), "Home");
        assert_eq!(nav.list_len(&syl), 2);
    }

    #[test]
    fn test_open_subject_lists_units_in_order() {
        let syl = syllabus();
        for subject in syl.subjects() {
            let mut nav = NavState::new(Language::English);
            nav.open_subject(&syl, &subject.name).unwrap();
            assert_eq!(nav.view(), View::Units);
            assert_eq!(nav.breadcrumb(&syl), subject.name);
            let shown: Vec<&str> = nav
                .current_subject(&syl)
                .unwrap()
                .units
                .iter()
                .map(|u| u.title.as_str())
                .collect();
            let declared: Vec<&str> = subject.units.iter().map(|u| u.title.as_str()).collect();
            assert_eq!(shown, declared);
            assert_eq!(nav.list_len(&syl), subject.units.len());
        }
    }

    #[test]
    fn test_open_unknown_subject_keeps_state() {
        let syl = syllabus();
        let mut nav = NavState::new(Language::English);
        let err = nav.open_subject(&syl, "Gamma").unwrap_err();
        assert_eq!(err, NavError::UnknownSubject("Gamma".to_string()));
        assert_eq!(nav.view(), View::Home);
    }

    #[test]
    fn test_open_unit_lists_topics_in_order() {
        let syl = syllabus();
        let mut nav = NavState::new(Language::English);
        nav.open_subject(&syl, "Alpha").unwrap();
        nav.open_unit(&syl, 1).unwrap();
        assert_eq!(nav.view(), View::Topics);
        assert_eq!(nav.breadcrumb(&syl), "Topics");
        assert_eq!(
            nav.current_unit(&syl).unwrap().topics,
            vec!["a2-t1", "a2-t2", "a2-t3"]
        );
    }

    #[test]
    fn test_open_unit_out_of_range_is_rejected() {
        let syl = syllabus();
        let mut nav = NavState::new(Language::English);
        nav.open_subject(&syl, "Alpha").unwrap();
        let err = nav.open_unit(&syl, 2).unwrap_err();
        assert_eq!(err, NavError::UnitOutOfRange { index: 2, len: 2 });
        assert_eq!(nav.view(), View::Units);
        assert!(nav.current_unit(&syl).is_none());
    }

    #[test]
    fn test_open_unit_without_subject() {
        let syl = syllabus();
        let mut nav = NavState::new(Language::English);
        assert_eq!(nav.open_unit(&syl, 0), Err(NavError::NoSubject));
    }

    #[test]
    fn test_unit_always_belongs_to_current_subject() {
        let syl = syllabus();
        let mut nav = NavState::new(Language::English);
        nav.open_subject(&syl, "Alpha").unwrap();
        nav.open_unit(&syl, 1).unwrap();
        nav.open_subject(&syl, "Beta").unwrap();
        assert!(nav.current_unit(&syl).is_none());
        nav.open_unit(&syl, 0).unwrap();
        assert_eq!(nav.current_unit(&syl).unwrap().title, "B1");
    }

    #[test]
    fn test_select_topic_at() {
        let syl = syllabus();
        let mut nav = NavState::new(Language::Hindi);
        nav.open_subject(&syl, "Alpha").unwrap();
        nav.open_unit(&syl, 0).unwrap();
        let topic = nav.select_topic_at(&syl, 1).unwrap();
        assert_eq!(topic, "a1-t2");
        assert_eq!(nav.current_topic(), Some("a1-t2"));
        assert_eq!(
            nav.select_topic_at(&syl, 5),
            Err(NavError::TopicOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_back_navigation() {
        let syl = syllabus();
        let mut nav = NavState::new(Language::English);
        nav.open_subject(&syl, "Alpha").unwrap();
        nav.open_unit(&syl, 0).unwrap();
        nav.back_to_units();
        assert_eq!(nav.view(), View::Units);
        assert!(nav.current_unit(&syl).is_none());
        assert_eq!(nav.current_subject(&syl).unwrap().name, "Alpha");
        nav.back_to_subjects();
        assert_eq!(nav.view(), View::Home);
        assert!(nav.current_subject(&syl).is_none());
    }

    #[test]
    fn test_restart_keeps_language() {
        let syl = syllabus();
        let mut nav = NavState::new(Language::Hindi);
        nav.open_subject(&syl, "Beta").unwrap();
        nav.open_unit(&syl, 0).unwrap();
        nav.select_topic("b1-t1");
        nav.restart();
        assert_eq!(nav.view(), View::Home);
        assert_eq!(nav.current_topic(), None);
        assert_eq!(nav.language, Language::Hindi);
    }

    #[test]
    fn test_selection_wraps_and_resets() {
        let syl = syllabus();
        let mut nav = NavState::new(Language::English);
        nav.select_prev(&syl);
        assert_eq!(nav.selected, 1);
        nav.select_next(&syl);
        assert_eq!(nav.selected, 0);
        nav.select_next(&syl);
        nav.open_subject(&syl, "Alpha").unwrap();
        assert_eq!(nav.selected, 0);
    }
}
