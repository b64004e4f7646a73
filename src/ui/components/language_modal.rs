use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::app::LanguageModal;
use crate::language::ALL_LANGUAGES;
use crate::ui::theme::Theme;

pub struct LanguagePicker<'a> {
    pub modal: LanguageModal,
    pub topic: &'a str,
    pub theme: &'a Theme,
}

impl LanguagePicker<'_> {
    /// Rows needed inside the popup, borders included.
    pub fn height() -> u16 {
        ALL_LANGUAGES.len() as u16 + 5
    }
}

impl Widget for LanguagePicker<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);

        let block = Block::bordered()
            .title(" Choose language ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));

        let mut lines = vec![
            Line::from(Span::styled(
                self.topic.to_string(),
                Style::default()
                    .fg(colors.fg())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];
        for (i, language) in ALL_LANGUAGES.iter().enumerate() {
            let is_selected = i == self.modal.selected;
            let indicator = if is_selected { ">" } else { " " };
            let key = language.code().chars().next().unwrap_or(' ');
            let style = if is_selected {
                Style::default()
                    .fg(colors.accent())
                    .bg(colors.selection_bg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            lines.push(Line::from(Span::styled(
                format!(" {indicator} [{key}] {}", language.display_name()),
                style,
            )));
        }
        lines.push(Line::from(Span::styled(
            " [Enter] ask  [Esc] cancel",
            Style::default().fg(colors.text_muted()),
        )));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
