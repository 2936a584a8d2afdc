use chrono::Local;
use parley_core::{Alert, AlertLevel, Message};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, MAX_INPUT_CHARS};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, input, footer
    let [header_area, body_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if app.initializing {
        render_loading(frame, body_area);
    } else {
        render_chat(app, frame, body_area);
    }

    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if let Some(alert) = app.current_alert() {
        render_alert(alert, frame, area);
    } else if app.show_clear_confirm {
        render_clear_confirm(frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Chat Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("● Online", Style::default().fg(Color::Green)),
        Span::raw(" "),
        Span::styled(
            format!("{} ({})", app.endpoint.display_name(), app.client.base_url()),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let [_, middle, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(block.inner(area));

    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new("Loading chat...")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        middle,
    );
}

fn message_lines(msg: &Message) -> Vec<Line<'static>> {
    let (label, color) = if msg.is_user {
        ("You:", Color::Cyan)
    } else {
        ("Bot:", Color::Yellow)
    };
    let time = msg.timestamp.with_timezone(&Local).format("%H:%M").to_string();

    let mut lines = vec![Line::from(vec![
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(time, Style::default().fg(Color::DarkGray)),
    ])];
    for line in msg.text.lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::default());
    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    app.apply_pending_scroll();

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Messages ({}) ", app.messages.len()));

    let mut lines: Vec<Line> = app.messages.iter().flat_map(message_lines).collect();

    if app.sending {
        lines.push(Line::from(Span::styled(
            "Bot:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.input_enabled();
    let border_color = if enabled { Color::Yellow } else { Color::DarkGray };
    let input_text = app.conversation.input();
    let char_count = input_text.chars().count();

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ")
        .title_bottom(
            Line::from(format!(" {}/{} ", char_count, MAX_INPUT_CHARS)).alignment(Alignment::Right),
        );

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if input_text.is_empty() {
        Paragraph::new("Type your message...").style(Style::default().fg(Color::DarkGray))
    } else {
        // One glyph per line break keeps the cursor column in step
        let visible_text: String = input_text
            .chars()
            .map(|c| if c == '\n' { '↵' } else { c })
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);

    if enabled && app.current_alert().is_none() && !app.show_clear_confirm {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.current_alert().is_some() {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" dismiss ", label_style),
        ]
    } else if app.show_clear_confirm {
        vec![
            Span::styled(" y ", key_style),
            Span::styled(" clear ", label_style),
            Span::styled(" n ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else {
        let send_label = if app.sending { " sending... " } else { " send " };
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(send_label, label_style),
            Span::styled(" Alt-Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Ctrl-L ", key_style),
            Span::styled(" clear ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ]
    };

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Centered popup rectangle, clamped to the frame
fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(2));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn render_alert(alert: &Alert, frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 60, 7);
    frame.render_widget(Clear, popup_area);

    let color = match alert.level {
        AlertLevel::Error => Color::Red,
        AlertLevel::Warning => Color::Yellow,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", alert.title))
        .title_bottom(Line::from(" Enter to dismiss ").alignment(Alignment::Right));

    let body = Paragraph::new(alert.body.as_str())
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(body, popup_area);
}

fn render_clear_confirm(frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 50, 6);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Clear Chat ");

    let text = Text::from(vec![
        Line::from("Are you sure you want to clear all messages?"),
        Line::default(),
        Line::from(vec![
            Span::styled(" y ", Style::default().bg(Color::DarkGray).fg(Color::White)),
            Span::raw(" clear  "),
            Span::styled(" n ", Style::default().bg(Color::DarkGray).fg(Color::White)),
            Span::raw(" cancel"),
        ]),
    ]);

    let body = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(body, popup_area);
}
