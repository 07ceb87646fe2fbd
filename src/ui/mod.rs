// UI module for rendering the TUI.
// Contains widgets for tabs, project cards, and the README modal.

mod cards;
mod modal;
mod tabs;

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let portfolio = app.portfolio();

    tabs::draw_tabs(frame, app, &portfolio.username, chunks[0]);

    match app.active_tab {
        Tab::Pinned => cards::render_pinned(
            frame,
            &app.pinned,
            &mut app.pinned_list,
            &portfolio.cards,
            chunks[1],
        ),
        Tab::Showcase => cards::render_showcase(
            frame,
            &app.showcase,
            &app.carousel,
            &portfolio.cards,
            chunks[1],
        ),
        Tab::Projects => cards::render_projects(
            frame,
            &app.projects,
            &mut app.projects_list,
            &portfolio.cards,
            chunks[1],
        ),
    }

    draw_status_bar(frame, app, chunks[2]);

    // Overlays, rendered last
    modal::draw_readme_modal(frame, &app.readme, app.readme_scroll);
    if app.show_help {
        draw_help_overlay(frame);
    }
}

/// Draw the status bar with context-sensitive key hints.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut hints = match app.active_tab {
        Tab::Showcase => vec![
            Span::raw(" ←→ "),
            Span::styled("Rotate", Style::default().fg(Color::DarkGray)),
            Span::raw("  1-9 "),
            Span::styled("Jump", Style::default().fg(Color::DarkGray)),
        ],
        Tab::Projects => vec![
            Span::raw(" ↑↓ "),
            Span::styled("Navigate", Style::default().fg(Color::DarkGray)),
            Span::raw("  f/F "),
            Span::styled("Filter", Style::default().fg(Color::DarkGray)),
            Span::raw("  m "),
            Span::styled("More", Style::default().fg(Color::DarkGray)),
        ],
        Tab::Pinned => vec![
            Span::raw(" ↑↓ "),
            Span::styled("Navigate", Style::default().fg(Color::DarkGray)),
        ],
    };
    hints.extend([
        Span::raw("  ↵ "),
        Span::styled("README", Style::default().fg(Color::DarkGray)),
        Span::raw("  Tab "),
        Span::styled("Switch", Style::default().fg(Color::DarkGray)),
        Span::raw("  r "),
        Span::styled("Refresh", Style::default().fg(Color::DarkGray)),
        Span::raw("  ? "),
        Span::styled("Help", Style::default().fg(Color::DarkGray)),
        Span::raw("  q "),
        Span::styled("Quit", Style::default().fg(Color::DarkGray)),
    ]);

    if let Some(rate) = app.portfolio().transport.rate_limit() {
        let rate_color = if rate.remaining < 10 {
            Color::Red
        } else if rate.remaining < 30 {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        hints.push(Span::styled(
            format!("  API: {}/{}", rate.remaining, rate.limit),
            Style::default().fg(rate_color),
        ));
    }

    let status = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(status, area);
}

/// Draw the help overlay with all keyboard shortcuts.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = 50;
    let popup_height = 18;
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(
        popup_x,
        popup_y,
        popup_width.min(area.width),
        popup_height.min(area.height),
    );

    frame.render_widget(Clear, popup_area);

    let key = |keys: &'static str, action: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<14}", keys), Style::default().fg(Color::Cyan)),
            Span::raw(action),
        ])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        key("↑/↓ or j/k", "Navigate list / scroll README"),
        key("←/→ or h/l", "Rotate showcase"),
        key("1-9", "Jump to showcase card"),
        key("f / F", "Next / previous category"),
        key("m", "Load more projects"),
        key("Enter", "Open README"),
        key("Esc", "Close README / help"),
        key("Tab", "Switch tabs"),
        key("r", "Refresh current tab"),
        key("?", "Toggle this help"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help "),
        )
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help, popup_area);
}
