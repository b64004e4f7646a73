use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Wide,   // ≥100 cols: list and response side by side
    Narrow, // list stacked above the response
}

impl LayoutTier {
    pub fn from_area(area: Rect) -> Self {
        if area.width >= 100 {
            LayoutTier::Wide
        } else {
            LayoutTier::Narrow
        }
    }
}

pub struct AppLayout {
    pub header: Rect,
    pub list: Rect,
    pub response: Rect,
    pub footer: Rect,
    pub tier: LayoutTier,
}

impl AppLayout {
    pub fn new(area: Rect, footer_lines: u16) -> Self {
        let tier = LayoutTier::from_area(area);

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(footer_lines.max(1)),
            ])
            .split(area);

        let direction = match tier {
            LayoutTier::Wide => Direction::Horizontal,
            LayoutTier::Narrow => Direction::Vertical,
        };
        let body = Layout::default()
            .direction(direction)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(vertical[1]);

        Self {
            header: vertical[0],
            list: body[0],
            response: body[1],
            footer: vertical[2],
            tier,
        }
    }
}

/// Greedily packs key hints into as few lines as fit in `width`.
pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = "  ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints {
        if hint.is_empty() {
            continue;
        }
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
            has_hint = true;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
            has_hint = true;
        }
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let left = area.x.saturating_add(area.width.saturating_sub(w) / 2);
    let top = area.y.saturating_add(area.height.saturating_sub(h) / 2);
    Rect::new(left, top, w, h)
}
