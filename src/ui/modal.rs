// README modal.
// Overlays the current view with a repository README or its fallback.

use ratatui::{prelude::*, widgets::*};

use crate::github::ReadmeState;

/// A rect covering `percent_x` by `percent_y` of `area`, centered.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Draw the README modal on top of the current view. Does nothing when closed.
pub fn draw_readme_modal(frame: &mut Frame, readme: &ReadmeState, scroll: u16) {
    let modal_area = centered_rect(85, 85, frame.area());

    let (title, body, border) = match readme {
        ReadmeState::Idle => return,
        ReadmeState::Loading { repo_url } => (
            " README ".to_string(),
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    "⏳ Loading README...",
                    Style::default().fg(Color::Yellow),
                )),
                Line::from(Span::styled(
                    repo_url.clone(),
                    Style::default().fg(Color::DarkGray),
                )),
            ],
            Color::Cyan,
        ),
        ReadmeState::Rendered(view) => (
            format!(" {} ", view.title),
            view.markdown.lines().map(markdown_line).collect(),
            Color::Cyan,
        ),
        ReadmeState::Error(fallback) => (
            " README ".to_string(),
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("❌ {}", fallback.message),
                    Style::default().fg(Color::Red),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::raw("View it on GitHub: "),
                    Span::styled(
                        fallback.repo_url.clone(),
                        Style::default()
                            .fg(Color::Blue)
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                ]),
            ],
            Color::Red,
        ),
    };

    frame.render_widget(Clear, modal_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);
    let centered = !matches!(readme, ReadmeState::Rendered(_));
    let paragraph = Paragraph::new(body)
        .block(block)
        .wrap(Wrap { trim: false })
        .alignment(if centered {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, chunks[0]);

    let hints = Line::from(vec![
        Span::raw(" ↑↓ "),
        Span::styled("Scroll", Style::default().fg(Color::DarkGray)),
        Span::raw("  PgUp/Dn "),
        Span::styled("Page", Style::default().fg(Color::DarkGray)),
        Span::raw("  Esc "),
        Span::styled("Close", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(
        Paragraph::new(hints).style(Style::default().bg(Color::Black)),
        chunks[1],
    );
}

/// Light styling for headings, list bullets and code fences.
fn markdown_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();
    let style = if trimmed.starts_with('#') {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else if trimmed.starts_with("```") {
        Style::default().fg(Color::DarkGray)
    } else if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
        Style::default().fg(Color::White)
    } else if trimmed.starts_with('>') {
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC)
    } else {
        Style::default()
    };
    Line::from(Span::styled(line.to_string(), style))
}
