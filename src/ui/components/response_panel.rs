use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::app::ResponseState;
use crate::render::markup::{MarkupStyle, html_to_lines};
use crate::ui::theme::Theme;

/// Shows the rendered explanation (or pending/abort/error line).
pub struct ResponsePanel<'a> {
    pub response: &'a ResponseState,
    pub theme: &'a Theme,
    pub scroll: u16,
}

impl<'a> ResponsePanel<'a> {
    pub fn new(response: &'a ResponseState, theme: &'a Theme, scroll: u16) -> Self {
        Self {
            response,
            theme,
            scroll,
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        if matches!(self.response, ResponseState::Idle) {
            return vec![Line::from(Span::styled(
                "Pick a topic and a language to get an explanation.",
                Style::default().fg(colors.text_muted()),
            ))];
        }

        let base = if self.response.is_error() {
            Style::default().fg(colors.error())
        } else if matches!(self.response, ResponseState::Pending { .. }) {
            Style::default().fg(colors.text_muted())
        } else {
            Style::default().fg(colors.fg())
        };
        let style = MarkupStyle {
            base,
            code: Style::default()
                .fg(colors.code())
                .add_modifier(Modifier::BOLD),
        };
        html_to_lines(&self.response.html(), style)
    }
}

impl Widget for ResponsePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Explanation ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(area, buf);
    }
}
