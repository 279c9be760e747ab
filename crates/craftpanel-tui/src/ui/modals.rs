//! Modal dialog widgets.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use craftpanel_ops::OperationProgress;

use crate::app::input::InputState;
use crate::theme::Theme;
use crate::ui::truncate_start;

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = (area.width.saturating_sub(width)) / 2 + area.x;
    let y = (area.height.saturating_sub(height)) / 2 + area.y;
    Rect::new(x, y, width, height)
}

/// Text input modal for rename, upload and console prompts.
pub struct InputModal<'a> {
    theme: &'a Theme,
    input: &'a InputState,
    title: &'a str,
    prompt: &'a str,
}

impl<'a> InputModal<'a> {
    pub fn new(theme: &'a Theme, input: &'a InputState, title: &'a str, prompt: &'a str) -> Self {
        Self {
            theme,
            input,
            title,
            prompt,
        }
    }
}

impl Widget for InputModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = if self.input.error().is_some() { 9 } else { 7 };
        let popup_area = centered(area, 60, height);

        Clear.render(popup_area, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(self.theme.info)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(self.theme.border);

        let inner = block.inner(popup_area);
        block.render(popup_area, buf);

        let mut lines = vec![
            Line::styled(self.prompt, self.theme.help_desc),
            Line::raw(""),
        ];

        // Scroll the field so the cursor stays visible.
        let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
        let chars: Vec<char> = self.input.buffer().chars().collect();
        let cursor = self.input.cursor();
        let max_visible = (inner.width as usize).saturating_sub(4).max(1);
        let start = cursor.saturating_sub(max_visible - 1);
        let end = (start + max_visible).min(chars.len());

        let before: String = chars[start..cursor].iter().collect();
        let under = chars.get(cursor).map(|c| c.to_string()).unwrap_or_else(|| " ".into());
        let after: String = chars
            .get(cursor + 1..end.max(cursor + 1))
            .map(|rest| rest.iter().collect())
            .unwrap_or_default();

        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::raw(before),
            Span::styled(under, cursor_style),
            Span::raw(after),
        ]));

        if let Some(error) = self.input.error() {
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                format!("  {error}"),
                Style::default().fg(self.theme.error),
            ));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled(" Enter ", self.theme.help_key),
            Span::raw("Confirm  "),
            Span::styled(" Esc ", self.theme.help_key),
            Span::raw("Cancel"),
        ]));

        Paragraph::new(lines).render(inner, buf);
    }
}

/// Yes/no confirmation dialog.
pub struct ConfirmModal<'a> {
    theme: &'a Theme,
    title: &'a str,
    message: &'a str,
}

impl<'a> ConfirmModal<'a> {
    pub fn new(theme: &'a Theme, title: &'a str, message: &'a str) -> Self {
        Self {
            theme,
            title,
            message,
        }
    }
}

impl Widget for ConfirmModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered(area, 50, 7);

        Clear.render(popup_area, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.warning));

        let inner = block.inner(popup_area);
        block.render(popup_area, buf);

        let lines = vec![
            Line::raw(""),
            Line::from(format!("  {}", self.message)),
            Line::raw(""),
            Line::from(vec![
                Span::raw("  "),
                Span::styled(" y ", self.theme.help_key),
                Span::raw("Yes  "),
                Span::styled(" n/Esc ", self.theme.help_key),
                Span::raw("No"),
            ]),
        ];

        Paragraph::new(lines).render(inner, buf);
    }
}

/// Progress dialog for a batch move.
pub struct BatchProgressModal<'a> {
    theme: &'a Theme,
    progress: &'a OperationProgress,
}

impl<'a> BatchProgressModal<'a> {
    pub fn new(theme: &'a Theme, progress: &'a OperationProgress) -> Self {
        Self { theme, progress }
    }
}

impl Widget for BatchProgressModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered(area, 55, 9);

        Clear.render(popup_area, buf);

        let block = Block::default()
            .title(" Moving... ")
            .title_style(
                Style::default()
                    .fg(self.theme.info)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.info));

        let inner = block.inner(popup_area);
        block.render(popup_area, buf);

        let pct = self.progress.percentage().clamp(0.0, 100.0) as usize;
        let bar_width = (inner.width as usize).saturating_sub(10);
        let filled = pct * bar_width / 100;

        let mut lines = vec![
            Line::raw(""),
            Line::from(vec![
                Span::raw("  ["),
                Span::styled(
                    "\u{2588}".repeat(filled),
                    Style::default().fg(self.theme.info),
                ),
                Span::styled(
                    "\u{2591}".repeat(bar_width - filled),
                    Style::default().fg(self.theme.muted),
                ),
                Span::raw(format!("] {pct}%")),
            ]),
            Line::raw(""),
            Line::from(vec![
                Span::styled("  Items:    ", self.theme.help_desc),
                Span::raw(format!(
                    "{}/{}",
                    self.progress.items_completed, self.progress.items_total
                )),
            ]),
        ];

        if !self.progress.errors.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("  Errors:   ", Style::default().fg(self.theme.error)),
                Span::styled(
                    self.progress.errors.len().to_string(),
                    Style::default().fg(self.theme.error),
                ),
            ]));
        }

        if let Some(current) = &self.progress.current {
            let max_len = (inner.width as usize).saturating_sub(4);
            lines.push(Line::styled(
                format!("  {}", truncate_start(&current.to_wire(), max_len)),
                Style::default().fg(self.theme.muted),
            ));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
