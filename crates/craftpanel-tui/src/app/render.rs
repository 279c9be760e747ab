//! Application rendering.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Tabs, Widget};
use strum::IntoEnumIterator;

use craftpanel_core::{LogChannel, RemotePath};
use craftpanel_session::{ClipboardMode, ControlIntent, LinkState, NoticeLevel, Session};

use crate::theme::Theme;
use crate::ui::modals::{BatchProgressModal, ConfirmModal, InputModal};
use crate::ui::{HelpOverlay, format_size, truncate_start};

use super::input::InputState;
use super::state::{AppMode, FileEntry, View, file_entries};

/// Most notice lines shown at once; longer summaries are cut.
const MAX_NOTICE_LINES: usize = 5;

/// Render context containing all the state needed for rendering.
pub struct RenderContext<'a> {
    pub mode: AppMode,
    pub view: View,
    pub theme: &'a Theme,
    pub session: &'a Session,
    pub base_url: &'a str,
    pub cursor: usize,
    pub log_scroll: usize,
    pub input_state: Option<&'a InputState>,
}

/// Operator-facing form of a remote path, rooted at `/`.
fn absolute(path: &RemotePath) -> String {
    if path.is_root() {
        "/".to_string()
    } else {
        format!("/{path}")
    }
}

/// Main render function for the application.
pub fn render_app(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    buf.set_style(area, Style::default().fg(ctx.theme.foreground));

    let notice_height = ctx
        .session
        .notice()
        .map(|n| n.text.lines().count().clamp(1, MAX_NOTICE_LINES))
        .unwrap_or(1) as u16;
    let gauge_height = u16::from(ctx.session.uploads().is_active());

    // Layout: header, tabs, content, status, upload gauge, footer
    let [header, tabs_area, content, status, gauge, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(notice_height),
        Constraint::Length(gauge_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(ctx, header, buf);
    render_tabs(ctx, tabs_area, buf);

    match ctx.view {
        View::Files => render_files(ctx, content, buf),
        View::Console => render_log(ctx, LogChannel::Console, content, buf),
        View::Backup => render_log(ctx, LogChannel::Backup, content, buf),
    }

    render_status(ctx, status, buf);
    if gauge_height > 0 {
        render_upload_gauge(ctx, gauge, buf);
    }
    render_footer(ctx, footer, buf);

    if let Some(progress) = ctx.session.batch_progress() {
        BatchProgressModal::new(ctx.theme, progress).render(area, buf);
    }

    // Render overlays
    match ctx.mode {
        AppMode::Help => HelpOverlay::new(ctx.theme).render(area, buf),
        AppMode::ConfirmBackup => {
            ConfirmModal::new(ctx.theme, "Backup", "Run a server backup now?").render(area, buf);
        }
        AppMode::Renaming => {
            if let Some(input) = ctx.input_state {
                let prompt = format!("New name for {}:", input.original().unwrap_or_default());
                InputModal::new(ctx.theme, input, "Rename", &prompt).render(area, buf);
            }
        }
        AppMode::Uploading => {
            if let Some(input) = ctx.input_state {
                let prompt = format!(
                    "Local files to upload into {} (space separated):",
                    absolute(ctx.session.current_path())
                );
                InputModal::new(ctx.theme, input, "Upload", &prompt).render(area, buf);
            }
        }
        AppMode::Command => {
            if let Some(input) = ctx.input_state {
                InputModal::new(ctx.theme, input, "Console", "Command to send to the server:")
                    .render(area, buf);
            }
        }
        AppMode::Normal | AppMode::Quit => {}
    }
}

fn render_header(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let reconciler = ctx.session.reconciler();
    let lifecycle = ctx.session.lifecycle();

    let title = Span::styled(" craftpanel ", ctx.theme.title);
    let host = Span::styled(format!(" {} ", ctx.base_url), ctx.theme.header);

    let (link_text, link_color) = match reconciler.link() {
        LinkState::Online => ("● live".to_string(), ctx.theme.success),
        LinkState::Connecting => ("○ connecting".to_string(), ctx.theme.warning),
        LinkState::Offline => ("○ offline".to_string(), ctx.theme.muted),
        LinkState::Lost { reason } => (
            match reason {
                Some(reason) => format!("✕ lost ({reason}) - L to reconnect"),
                None => "✕ lost - L to reconnect".to_string(),
            },
            ctx.theme.error,
        ),
    };

    let (state_text, state_color) = match (lifecycle.pending(), lifecycle.running()) {
        (Some(ControlIntent::Start), _) => ("starting...", ctx.theme.warning),
        (Some(ControlIntent::Stop), _) => ("stopping...", ctx.theme.warning),
        (None, Some(true)) => ("running", ctx.theme.success),
        (None, Some(false)) => ("stopped", ctx.theme.error),
        (None, None) => ("unknown", ctx.theme.muted),
    };

    let mut spans = vec![
        title,
        host,
        Span::styled(format!(" {link_text} "), Style::default().fg(link_color)),
        Span::styled(" server: ", ctx.theme.help_desc),
        Span::styled(
            state_text,
            Style::default().fg(state_color).add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some(uptime) = reconciler.uptime_display() {
        spans.push(Span::styled("  up ", ctx.theme.help_desc));
        spans.push(Span::raw(uptime));
    }
    if lifecycle.backup_busy() {
        spans.push(Span::styled(
            "  backup running",
            Style::default().fg(ctx.theme.warning),
        ));
    }

    Paragraph::new(Line::from(spans))
        .style(ctx.theme.header)
        .render(area, buf);
}

fn render_tabs(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let titles: Vec<String> = View::iter().map(|v| format!(" {v} ")).collect();

    Tabs::new(titles)
        .select(ctx.view as usize)
        .style(ctx.theme.footer)
        .highlight_style(ctx.theme.selected)
        .render(area, buf);
}

fn render_files(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let browser = ctx.session.browser();

    // Breadcrumb title: "/ minecraft / plugins"
    let mut title = vec![Span::styled(" /", ctx.theme.breadcrumb)];
    for crumb in ctx.session.current_path().breadcrumbs() {
        title.push(Span::styled(" ", ctx.theme.breadcrumb));
        title.push(Span::styled(crumb.label, ctx.theme.title));
        title.push(Span::styled(" /", ctx.theme.breadcrumb));
    }
    if let Some(pending) = browser.pending() {
        title.push(Span::styled(
            format!("  loading {}...", absolute(pending)),
            Style::default().fg(ctx.theme.muted),
        ));
    }
    title.push(Span::raw(" "));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(ctx.theme.border)
        .title(Line::from(title));

    let inner = block.inner(area);
    block.render(area, buf);

    let Some(view) = browser.view() else {
        Paragraph::new(Line::styled(
            "  Waiting for the first listing...",
            Style::default().fg(ctx.theme.muted),
        ))
        .render(inner, buf);
        return;
    };

    let entries = file_entries(view);
    if entries.is_empty() {
        Paragraph::new(Line::styled(
            "  (empty directory)",
            Style::default().fg(ctx.theme.muted),
        ))
        .render(inner, buf);
        return;
    }

    let height = inner.height as usize;
    let offset = ctx.cursor.saturating_sub(height.saturating_sub(1));
    let selection = ctx.session.selection();
    let clipboard = ctx.session.clipboard();

    let lines: Vec<Line> = entries
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(index, entry)| {
            let mut line = match entry {
                FileEntry::Shortcut(path) => Line::from(vec![
                    Span::raw("    "),
                    Span::styled(format!("» {path}"), ctx.theme.shortcut),
                ]),
                FileEntry::Up(_) => Line::from(vec![
                    Span::raw("    "),
                    Span::styled("..", ctx.theme.directory),
                ]),
                FileEntry::Row(row) => {
                    let (mark, mark_style) = if clipboard.contains(&row.path) {
                        ("[~]", ctx.theme.staged)
                    } else if selection.contains(&row.path) {
                        ("[x]", ctx.theme.marked)
                    } else {
                        ("[ ]", Style::default().fg(ctx.theme.muted))
                    };
                    let (name, style) = if row.is_dir {
                        (format!("{}/", row.name), ctx.theme.directory)
                    } else {
                        (row.name.clone(), ctx.theme.file)
                    };
                    let style = if clipboard.contains(&row.path) {
                        ctx.theme.staged
                    } else {
                        style
                    };
                    Line::from(vec![
                        Span::styled(mark, mark_style),
                        Span::raw(" "),
                        Span::styled(name, style),
                    ])
                }
            };
            if index == ctx.cursor {
                line = line.style(ctx.theme.selected);
            }
            line
        })
        .collect();

    Paragraph::new(lines).render(inner, buf);
}

fn render_log(ctx: &RenderContext, channel: LogChannel, area: Rect, buf: &mut Buffer) {
    let stream = ctx.session.reconciler().stream(channel);

    let mut title = vec![Span::styled(format!(" {channel} log "), ctx.theme.title)];
    if !stream.history_replayed() {
        title.push(Span::styled(
            "(waiting for history) ",
            Style::default().fg(ctx.theme.muted),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(ctx.theme.border)
        .title(Line::from(title));

    let inner = block.inner(area);
    block.render(area, buf);

    let lines: Vec<&str> = stream.lines().collect();
    let height = inner.height as usize;
    let max_scroll = lines.len().saturating_sub(height);
    let scroll = ctx.log_scroll.min(max_scroll);
    let start = lines.len().saturating_sub(height + scroll);

    let visible: Vec<Line> = lines[start..]
        .iter()
        .take(height)
        .map(|line| Line::raw(*line))
        .collect();

    Paragraph::new(visible).render(inner, buf);
}

fn render_status(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let session = ctx.session;

    let lines: Vec<Line> = if let Some(notice) = session.notice() {
        let color = match notice.level {
            NoticeLevel::Info => ctx.theme.info,
            NoticeLevel::Success => ctx.theme.success,
            NoticeLevel::Error => ctx.theme.error,
        };
        notice
            .text
            .lines()
            .take(MAX_NOTICE_LINES)
            .map(|line| Line::styled(format!(" {line}"), Style::default().fg(color)))
            .collect()
    } else {
        let clipboard = session.clipboard();
        let text = match clipboard.mode() {
            ClipboardMode::Staged => format!(
                " {} item(s) staged for move. Navigate to the destination and press p.",
                clipboard.len()
            ),
            ClipboardMode::Pasting => format!(" Moving {} item(s)...", clipboard.len()),
            ClipboardMode::Idle if !session.selection().is_empty() => {
                format!(" {} selected", session.selection().len())
            }
            ClipboardMode::Idle => String::new(),
        };
        vec![Line::styled(text, Style::default().fg(ctx.theme.muted))]
    };

    Paragraph::new(lines).render(area, buf);
}

fn render_upload_gauge(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let Some(job) = ctx.session.uploads().active() else {
        return;
    };

    let ratio = job.progress().clamp(0.0, 1.0);
    let names = truncate_start(&job.file_names.join(", "), 40);
    let label = format!(
        "{names} -> {} {:.0}% of {}",
        absolute(&job.destination),
        ratio * 100.0,
        format_size(job.bytes_total)
    );

    Gauge::default()
        .gauge_style(ctx.theme.progress_bar)
        .ratio(ratio)
        .label(label)
        .render(area, buf);
}

fn render_footer(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let session = ctx.session;
    let lifecycle = session.lifecycle();

    let mut keys: Vec<(&str, &str)> = match ctx.view {
        View::Files => {
            let mut v = vec![("j/k", "Nav"), ("Enter", "Open")];
            match session.clipboard().mode() {
                ClipboardMode::Staged => {
                    v.push(("p", "Paste"));
                    v.push(("Esc", "Cancel"));
                }
                ClipboardMode::Pasting => {}
                ClipboardMode::Idle => {
                    v.push(("Spc", "Sel"));
                    if !session.selection().is_empty() {
                        v.push(("x", "Cut"));
                        v.push(("Esc", "Unsel"));
                    }
                }
            }
            if session.can_rename() {
                v.push(("r", "Rename"));
            }
            if !session.uploads().is_active() {
                v.push(("u", "Upload"));
            }
            v.push(("R", "Refresh"));
            v
        }
        View::Console => vec![("c", "Cmd"), ("j/k", "Scroll")],
        View::Backup => {
            let mut v = vec![("j/k", "Scroll")];
            if !lifecycle.backup_busy() {
                v.push(("b", "Backup"));
            }
            v
        }
    };

    if lifecycle.is_enabled(ControlIntent::Start) {
        keys.push(("s", "Start"));
    }
    if lifecycle.is_enabled(ControlIntent::Stop) {
        keys.push(("S", "Stop"));
    }
    keys.extend([("Tab", "View"), ("?", "Help"), ("q", "Quit")]);

    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(format!(" {key} "), ctx.theme.help_key),
                Span::styled(format!("{desc} "), ctx.theme.help_desc),
            ]
        })
        .collect();

    Paragraph::new(Line::from(spans))
        .style(ctx.theme.footer)
        .render(area, buf);
}
