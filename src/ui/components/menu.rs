use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::navigator::{NavState, View};
use crate::syllabus::Syllabus;
use crate::ui::theme::Theme;

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
}

/// Selectable list with a heading, used for subjects, units and topics.
pub struct Menu<'a> {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub theme: &'a Theme,
}

fn numbered_key(i: usize) -> String {
    if i < 9 {
        format!("{}", i + 1)
    } else {
        " ".to_string()
    }
}

impl<'a> Menu<'a> {
    /// Builds the list for whatever view `nav` is on, straight from the syllabus.
    pub fn for_view(syllabus: &Syllabus, nav: &NavState, theme: &'a Theme) -> Self {
        let (title, subtitle, items) = match nav.view() {
            View::Home => (
                "Subjects".to_string(),
                "Pick a subject to see its units".to_string(),
                syllabus
                    .subjects()
                    .iter()
                    .enumerate()
                    .map(|(i, s)| MenuItem {
                        key: numbered_key(i),
                        label: s.name.clone(),
                        description: s.description.clone(),
                    })
                    .collect(),
            ),
            View::Units => match nav.current_subject(syllabus) {
                Some(subject) => (
                    subject.name.clone(),
                    subject.description.clone(),
                    subject
                        .units
                        .iter()
                        .enumerate()
                        .map(|(i, u)| MenuItem {
                            key: numbered_key(i),
                            label: u.title.clone(),
                            description: u.preview(),
                        })
                        .collect(),
                ),
                None => (String::new(), String::new(), Vec::new()),
            },
            View::Topics => match nav.current_unit(syllabus) {
                Some(unit) => (
                    unit.title.clone(),
                    unit.summary(),
                    unit.topics
                        .iter()
                        .enumerate()
                        .map(|(i, t)| MenuItem {
                            key: format!("{}", i + 1),
                            label: t.clone(),
                            description: String::new(),
                        })
                        .collect(),
                ),
                None => (String::new(), String::new(), Vec::new()),
            },
        };
        Self {
            title,
            subtitle,
            items,
            selected: nav.selected,
            theme,
        }
    }

    fn row_height(&self) -> u16 {
        if self.items.iter().any(|i| !i.description.is_empty()) {
            2
        } else {
            1
        }
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(inner);

        Paragraph::new(Line::from(Span::styled(
            &*self.subtitle,
            Style::default().fg(colors.text_muted()),
        )))
        .wrap(Wrap { trim: true })
        .render(layout[0], buf);

        // Keep the selected row on screen when the list is taller than the area.
        let row_height = self.row_height();
        let visible = (layout[1].height / row_height).max(1) as usize;
        let first = self.selected.saturating_sub(visible.saturating_sub(1));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.items
                    .iter()
                    .skip(first)
                    .take(visible)
                    .map(|_| Constraint::Length(row_height))
                    .collect::<Vec<_>>(),
            )
            .split(layout[1]);

        for (row, (i, item)) in self.items.iter().enumerate().skip(first).take(visible).enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let label_text = format!(" {indicator} [{key}] {label}", key = item.key, label = item.label);
            let mut lines = vec![Line::from(Span::styled(
                label_text,
                Style::default()
                    .fg(if is_selected {
                        colors.accent()
                    } else {
                        colors.fg()
                    })
                    .add_modifier(if is_selected {
                        Modifier::BOLD
                    } else {
                        Modifier::empty()
                    }),
            ))];
            if row_height > 1 {
                lines.push(Line::from(Span::styled(
                    format!("       {}", item.description),
                    Style::default().fg(colors.text_muted()),
                )));
            }

            let style = if is_selected {
                Style::default().bg(colors.selection_bg())
            } else {
                Style::default()
            };
            if row < rows.len() {
                Paragraph::new(lines).style(style).render(rows[row], buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn syllabus() -> Syllabus {
        Syllabus::from_toml_str(
            r#"
[[subjects]]
name = "Alpha"
description = "First"
[[subjects.units]]
title = "A1"
topics = ["t1", "t2", "t3", "t4"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_items_follow_view() {
        let syl = syllabus();
        let theme = Theme::default();
        let mut nav = NavState::new(Language::English);

        let menu = Menu::for_view(&syl, &nav, &theme);
        assert_eq!(menu.title, "Subjects");
        assert_eq!(menu.items[0].label, "Alpha");
        assert_eq!(menu.items[0].key, "1");

        nav.open_subject(&syl, "Alpha").unwrap();
        let menu = Menu::for_view(&syl, &nav, &theme);
        assert_eq!(menu.title, "Alpha");
        assert_eq!(menu.items[0].label, "A1");
        assert_eq!(menu.items[0].description, "t1 \u{2022} t2 \u{2022} t3");

        nav.open_unit(&syl, 0).unwrap();
        let menu = Menu::for_view(&syl, &nav, &theme);
        assert_eq!(menu.subtitle, "t1, t2, t3, t4");
        let labels: Vec<&str> = menu.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["t1", "t2", "t3", "t4"]);
        assert_eq!(menu.row_height(), 1);
    }

    #[test]
    fn test_render_marks_selection() {
        let syl = syllabus();
        let theme = Theme::default();
        let mut nav = NavState::new(Language::English);
        nav.open_subject(&syl, "Alpha").unwrap();
        nav.open_unit(&syl, 0).unwrap();
        nav.selected = 2;
        let menu = Menu::for_view(&syl, &nav, &theme);

        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        (&menu).render(area, &mut buf);

        let text: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("> [3] t3"));
        assert!(text.contains("  [1] t1"));
    }
}
