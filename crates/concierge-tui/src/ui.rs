use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use concierge_core::{AudienceLens, ChatRole, NetworkTier, WidgetState};
use crate::app::App;

const PANEL_WIDTH: u16 = 52;
const PANEL_HEIGHT: u16 = 22;

/// Render one line of lightweight markdown: `**bold**` spans and `-`/`*` bullets.
/// Unbalanced markers are shown literally.
fn markdown_line(text: &str) -> Line<'static> {
    let (bullet, body) = match text.strip_prefix("- ").or_else(|| text.strip_prefix("* ")) {
        Some(rest) => (Some("• "), rest),
        None => (None, text),
    };

    let mut spans: Vec<Span<'static>> = Vec::new();
    if let Some(bullet) = bullet {
        spans.push(Span::styled(bullet, Style::default().fg(Color::Cyan)));
    }

    let segments: Vec<&str> = body.split("**").collect();
    if segments.len() % 2 == 0 {
        spans.push(Span::raw(body.to_string()));
    } else {
        for (i, segment) in segments.into_iter().enumerate() {
            if segment.is_empty() {
                continue;
            }
            if i % 2 == 1 {
                spans.push(Span::styled(
                    segment.to_string(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw(segment.to_string()));
            }
        }
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_page(app, frame, body_area);
    render_footer(app, frame, footer_area);

    match app.widget.state() {
        WidgetState::Closed => render_chat_trigger(frame, body_area),
        WidgetState::Open => {
            let panel = bottom_right(body_area, PANEL_WIDTH, PANEL_HEIGHT);
            render_chat_panel(app, frame, panel);
        }
        WidgetState::Maximized => render_chat_panel(app, frame, inset(body_area, 2, 1)),
    }

    if app.show_console {
        let console_area = if app.console.is_maximized() { area } else { inset(area, 4, 2) };
        render_console(app, frame, console_area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mode = app.mode();
    let title = Line::from(vec![
        Span::styled(" Nabasa Amos · Portfolio ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" Lens: {} ", mode.lens.display_name()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(" Network: {} ", mode.tier.label()),
            Style::default().fg(tier_color(mode.tier)),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn tier_color(tier: NetworkTier) -> Color {
    match tier {
        NetworkTier::Fast => Color::Green,
        NetworkTier::Slow => Color::Yellow,
        NetworkTier::Offline => Color::Magenta,
    }
}

fn render_page(app: &App, frame: &mut Frame, area: Rect) {
    let mode = app.mode();
    let tagline = match mode.lens {
        AudienceLens::Recruiter => "Shipping resilient products with measurable impact.",
        AudienceLens::Engineer => "Edge-first systems, privacy by construction, honest benchmarks.",
        AudienceLens::Resilience => "Built for 2G, offline-first, and constrained devices.",
    };

    let lines = vec![
        Line::default(),
        Line::from(Span::styled("  Software Engineer", Style::default().bold())),
        Line::from(Span::styled(format!("  {}", tagline), Style::default().fg(Color::Gray))),
        Line::default(),
        Line::from("  Projects: Prism AI · RefugeLink · RentalTrack · PyCodeCommenter"),
        Line::default(),
        Line::from(Span::styled(
            format!("  Resilience Lab: simulating {}", mode.tier.display_name()),
            Style::default().fg(tier_color(mode.tier)),
        )),
    ];

    let page = Paragraph::new(lines)
        .block(Block::default().borders(Borders::NONE))
        .wrap(Wrap { trim: false });
    frame.render_widget(page, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = if app.show_console {
        " Enter: run  Ctrl+F: fullscreen  Esc/`: close console "
    } else if app.widget.is_open() && app.widget.is_input_focused() {
        " Enter: send  Ctrl+F: maximize  Tab: leave input  PgUp/PgDn: scroll  Esc: close "
    } else {
        " c: chat  i: type  m: maximize  l: lens  t: network  `: console  q: quit "
    };

    let footer = Paragraph::new(Line::from(Span::styled(hints, Style::default().fg(Color::Gray))))
        .style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_chat_trigger(frame: &mut Frame, area: Rect) {
    let label = " 🤖 Concierge (c) ";
    let trigger = bottom_right(area, 20, 3);
    frame.render_widget(Clear, trigger);
    frame.render_widget(
        Paragraph::new(label)
            .style(Style::default().fg(Color::White).bg(Color::Cyan))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan))),
        trigger,
    );
}

fn render_chat_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);

    let banner = app.widget.banner();
    let banner_height = if banner.is_some() { 4 } else { 0 };

    let [chat_area, banner_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(banner_height),
        Constraint::Length(3),
    ])
    .areas(area);

    let inner_width = chat_area.width.saturating_sub(2);
    let inner_height = chat_area.height.saturating_sub(2);

    let size_hint = if app.widget.is_maximized() { "compress" } else { "expand" };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Amos's Concierge · {} ", app.provider_label))
        .title_bottom(Line::from(format!(" Ctrl+F/m: {} · Esc: close ", size_hint)).right_aligned());

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in app.widget.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(msg.content.clone()));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Concierge:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.widget.is_loading() {
        lines.push(Line::from(Span::styled(
            "Concierge:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Amos's AI is thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let text = Text::from(lines);

    // Auto-scroll works from the height the wrapped text really takes
    let rendered = Paragraph::new(text.clone())
        .wrap(Wrap { trim: true })
        .line_count(inner_width);
    app.widget.set_viewport(inner_width, inner_height);
    app.widget.set_rendered_lines(u16::try_from(rendered).unwrap_or(u16::MAX));

    let chat = Paragraph::new(text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.widget.scroll(), 0));
    frame.render_widget(chat, chat_area);

    if let Some(banner) = banner {
        let banner_widget = Paragraph::new(banner)
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red)));
        frame.render_widget(banner_widget, banner_area);
    }

    render_chat_input(app, frame, input_area);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let widget = &app.widget;
    let focused = widget.is_input_focused();

    let (title, border_color) = if widget.banner().is_some() {
        (" Input disabled ", Color::Red)
    } else if widget.is_loading() {
        (" Waiting for reply... ", Color::DarkGray)
    } else if focused {
        (" Ask a quick question... ", Color::Yellow)
    } else {
        (" Ask (i to type) ", Color::DarkGray)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll to keep the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = widget.cursor();
    let scroll_offset = if inner_width == 0 {
        0
    } else {
        cursor_pos.saturating_sub(inner_width.saturating_sub(1))
    };

    let visible_text: String = widget
        .input()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    if widget.is_input_enabled() && focused && !app.show_console {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_console(app: &App, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);

    let [history_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let visible = history_area.height.saturating_sub(2) as usize;
    let lines = app.console.lines();
    let start = lines.len().saturating_sub(visible);
    let history: Vec<Line> = lines[start..]
        .iter()
        .map(|line| {
            if line.starts_with('>') {
                Line::from(Span::styled(line.clone(), Style::default().fg(Color::Cyan).bold()))
            } else {
                Line::from(Span::styled(line.clone(), Style::default().fg(Color::Gray)))
            }
        })
        .collect();

    let history_widget = Paragraph::new(history).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Concierge-OS Console ")
            .title_bottom(Line::from(" Ctrl+F: fullscreen · ESC to exit ").right_aligned()),
    );
    frame.render_widget(history_widget, history_area);

    let prompt = Paragraph::new(format!("> {}", app.console_input))
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(prompt, input_area);

    let cursor_x = (app.console_input.chars().count() as u16).saturating_add(3);
    frame.set_cursor_position((
        (input_area.x + cursor_x).min(input_area.right().saturating_sub(2)),
        input_area.y + 1,
    ));
}

/// A `width` x `height` rect anchored to the bottom-right corner of `area`
fn bottom_right(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + area.width - width,
        area.y + area.height - height,
        width,
        height,
    )
}

fn inset(area: Rect, horizontal: u16, vertical: u16) -> Rect {
    let width = area.width.saturating_sub(horizontal * 2);
    let height = area.height.saturating_sub(vertical * 2);
    Rect::new(
        area.x + horizontal.min(area.width / 2),
        area.y + vertical.min(area.height / 2),
        width,
        height,
    )
}
