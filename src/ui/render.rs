use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::{
    app::App,
    ui::{
        format_duration,
        notifications::NotificationLevel,
        theme::get_theme,
    },
};

const ROUNDED_BORDER: border::Set = border::ROUNDED;

fn block_with_title(title: &'_ str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(ROUNDED_BORDER)
        .title(title)
}

pub fn render(f: &mut Frame, app: &App) {
    let theme = get_theme();
    let area = f.area();

    let background = Block::default().style(Style::default().bg(theme.bg));
    f.render_widget(background, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(5),
            Constraint::Length(3),
        ])
        .split(area);

    draw_header(f, chunks[0]);
    draw_status(f, chunks[1], app);
    draw_playback_controls(f, chunks[2], app);
    draw_footer(f, chunks[3]);
    draw_notifications(f, area, app);
}

fn draw_header(f: &mut Frame, area: Rect) {
    let theme = get_theme();
    let header = Paragraph::new(".NET Rocks!")
        .style(theme.title_style())
        .block(block_with_title(" 🎧 ").border_style(theme.border_style()))
        .centered();
    f.render_widget(header, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let theme = get_theme();
    let block = block_with_title(" ● Now Playing ").border_style(theme.border_style());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let is_playing = app.view_model.is_playing();
    let status = app.view_model.current_status();

    let state_span = if is_playing {
        Span::styled("Playing", Style::new().fg(theme.playing).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("Stopped", Style::new().fg(theme.idle).add_modifier(Modifier::BOLD))
    };

    let status_line = if app.is_downloading() {
        Line::from(vec![
            Span::styled(format!("{} ", app.spinner.frame()), Style::new().fg(theme.accent)),
            Span::styled(status, theme.value_style()),
        ])
    } else if status.is_empty() {
        Line::from(Span::styled("idle", theme.label_style()))
    } else {
        Line::from(Span::styled(status, theme.value_style()))
    };

    let lines = vec![
        Line::from(vec![Span::styled("State:  ", theme.label_style()), state_span]),
        Line::from(Span::styled("Status: ", theme.label_style())),
        status_line,
        Line::from(""),
        Line::from(vec![
            Span::styled("Source: ", theme.label_style()),
            Span::styled(app.view_model.media_url().to_string(), theme.label_style()),
        ]),
    ];

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

fn draw_playback_controls(f: &mut Frame, area: Rect, app: &App) {
    let theme = get_theme();
    let block = block_with_title(" ● Playback Controls ").border_style(theme.border_style());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let controls = Paragraph::new("▶ Play   ■ Stop")
        .alignment(Alignment::Center)
        .style(theme.header_style());
    f.render_widget(controls, chunks[0]);

    let (position, duration) = app.progress();
    draw_progress_bar(f, chunks[2], position, duration, app.view_model.is_playing());
}

fn draw_progress_bar(
    f: &mut Frame,
    area: Rect,
    position: Duration,
    duration: Duration,
    playing: bool,
) {
    let theme = get_theme();
    let progress_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(8),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(format_duration(position))
            .alignment(Alignment::Right)
            .style(theme.value_style()),
        progress_chunks[0],
    );

    let progress = if duration.is_zero() {
        0.0
    } else {
        (position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
    };

    let slider_width = progress_chunks[2].width as usize;
    let filled = ((progress * slider_width as f64) as usize).min(slider_width);

    let slider_spans = vec![
        Span::styled("━".repeat(filled), Style::new().fg(theme.state_color(playing))),
        Span::styled(
            "─".repeat(slider_width - filled),
            Style::new().fg(theme.fg_dim),
        ),
    ];
    f.render_widget(Paragraph::new(Line::from(slider_spans)), progress_chunks[2]);

    f.render_widget(
        Paragraph::new(format_duration(duration))
            .alignment(Alignment::Left)
            .style(theme.value_style()),
        progress_chunks[4],
    );
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let theme = get_theme();
    let keybinds = "p/Enter: Play | s: Stop | Space: Toggle | q: Quit";

    f.render_widget(
        Paragraph::new(keybinds)
            .style(theme.label_style())
            .block(block_with_title("").border_style(theme.border_style())),
        area,
    );
}

fn draw_notifications(f: &mut Frame, area: Rect, app: &App) {
    let theme = get_theme();
    let width = area.width.min(60);

    for (i, notification) in app.notifications.active_notifications().iter().enumerate() {
        let y = area.y + 1 + (i as u16) * 3;
        if y + 3 > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x + area.width.saturating_sub(width + 1),
            y,
            width,
            height: 3,
        };

        let color = match notification.level {
            NotificationLevel::Info => theme.info,
            NotificationLevel::Error => theme.error,
        };

        f.render_widget(Clear, rect);
        f.render_widget(
            Paragraph::new(notification.text.as_str())
                .style(theme.value_style())
                .block(
                    block_with_title(notification.level.prefix())
                        .border_style(Style::new().fg(color))
                        .title_style(Style::new().fg(color).add_modifier(Modifier::BOLD)),
                ),
            rect,
        );
    }
}
