// Project card rendering.
// Pinned list, showcase carousel, and filterable project gallery.

use chrono::Utc;
use ratatui::{prelude::*, widgets::*};

use crate::github::{Repository, RepositoryWithLanguages};
use crate::state::LoadingState;
use crate::view::{CardOptions, CardPosition, Carousel, GalleryState, RenderableCard};

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}

/// Text lines for one card. `full` adds topics, homepage and update time.
pub fn card_lines(card: &RenderableCard, full: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::raw(format!("{} ", card.icon)),
        Span::styled(
            card.name.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  ★ {}  ⑂ {}", card.stars, card.forks),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    if let Some(description) = &card.description {
        lines.push(Line::from(format!("  {}", description)));
    }

    if !card.badges.is_empty() {
        let mut spans = vec![Span::raw("  ")];
        for badge in &card.badges {
            spans.push(Span::styled(
                format!("[{} {}] ", badge.icon, badge.name),
                Style::default().fg(Color::Green),
            ));
        }
        lines.push(Line::from(spans));
    }

    if full {
        if !card.topics.is_empty() {
            let topics: Vec<String> = card.topics.iter().map(|t| format!("#{}", t)).collect();
            lines.push(Line::from(Span::styled(
                format!("  {}", topics.join(" ")),
                Style::default().fg(Color::Magenta),
            )));
        }
        if let Some(homepage) = &card.homepage {
            lines.push(Line::from(Span::styled(
                format!("  ↗ {}", homepage),
                Style::default().fg(Color::Blue),
            )));
        }
        if let Some(updated) = &card.updated {
            lines.push(Line::from(Span::styled(
                format!("  Updated {}", updated),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    lines
}

fn repo_items(repos: &[&Repository], options: &CardOptions) -> Vec<ListItem<'static>> {
    let now = Utc::now();
    repos
        .iter()
        .map(|repo| {
            let card = RenderableCard::build(repo, &[], options, now);
            let mut lines = card_lines(&card, true);
            lines.push(Line::from(""));
            ListItem::new(lines)
        })
        .collect()
}

fn highlighted(list: List<'static>) -> List<'static> {
    list.highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ")
}

/// Render the pinned repositories list.
pub fn render_pinned(
    frame: &mut Frame,
    pinned: &LoadingState<Vec<Repository>>,
    list_state: &mut ListState,
    options: &CardOptions,
    area: Rect,
) {
    match pinned {
        LoadingState::Idle => render_empty(frame, area, "Press r to load"),
        LoadingState::Loading => render_loading(frame, area, "Loading pinned repositories"),
        LoadingState::Loaded(repos) => {
            if repos.is_empty() {
                render_empty(frame, area, "No pinned repositories");
                return;
            }
            let refs: Vec<&Repository> = repos.iter().collect();
            let list = highlighted(
                List::new(repo_items(&refs, options))
                    .block(Block::default().borders(Borders::ALL).title(" Pinned ")),
            );
            frame.render_stateful_widget(list, area, list_state);
        }
    }
}

fn position_style(position: CardPosition) -> (Style, u16) {
    match position {
        CardPosition::Active => (
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            0,
        ),
        CardPosition::NearLeft | CardPosition::NearRight => (Style::default().fg(Color::White), 2),
        CardPosition::FarLeft | CardPosition::FarRight => (Style::default().fg(Color::DarkGray), 4),
        CardPosition::Hidden => (Style::default(), 0),
    }
}

fn slot(position: CardPosition) -> Option<usize> {
    match position {
        CardPosition::FarLeft => Some(0),
        CardPosition::NearLeft => Some(1),
        CardPosition::Active => Some(2),
        CardPosition::NearRight => Some(3),
        CardPosition::FarRight => Some(4),
        CardPosition::Hidden => None,
    }
}

/// Render the showcase carousel: five slots, the active card centered.
pub fn render_showcase(
    frame: &mut Frame,
    showcase: &LoadingState<Vec<RepositoryWithLanguages>>,
    carousel: &Carousel,
    options: &CardOptions,
    area: Rect,
) {
    let projects = match showcase {
        LoadingState::Idle => return render_empty(frame, area, "Press r to load"),
        LoadingState::Loading => return render_loading(frame, area, "Loading projects"),
        LoadingState::Loaded(projects) => projects,
    };
    if carousel.is_empty() {
        return render_empty(frame, area, "No projects found.");
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 9),
            Constraint::Ratio(2, 9),
            Constraint::Ratio(3, 9),
            Constraint::Ratio(2, 9),
            Constraint::Ratio(1, 9),
        ])
        .split(chunks[0]);

    let now = Utc::now();
    for (index, position) in carousel.display_order() {
        let (Some(column), Some(project)) = (slot(position), projects.get(index)) else {
            continue;
        };
        let (style, inset) = position_style(position);
        let card = RenderableCard::build(&project.repo, &project.languages, options, now);
        let full = position == CardPosition::Active;

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(format!(" {} ", index + 1));
        let widget = Paragraph::new(card_lines(&card, full))
            .block(block)
            .wrap(Wrap { trim: true })
            .style(if full { Style::default() } else { style });

        let area = slots[column].inner(Margin {
            horizontal: 0,
            vertical: inset,
        });
        frame.render_widget(widget, area);
    }

    // Indicator dots
    let current = carousel.current().unwrap_or(0);
    let dots: Vec<Span> = (0..carousel.len())
        .map(|i| {
            if i == current {
                Span::styled("● ", Style::default().fg(Color::Yellow))
            } else {
                Span::styled("○ ", Style::default().fg(Color::DarkGray))
            }
        })
        .collect();
    frame.render_widget(
        Paragraph::new(Line::from(dots)).alignment(Alignment::Center),
        chunks[1],
    );
}

/// Render the project gallery with its category bar and load-more hint.
pub fn render_projects(
    frame: &mut Frame,
    projects: &LoadingState<GalleryState>,
    list_state: &mut ListState,
    options: &CardOptions,
    area: Rect,
) {
    let gallery = match projects {
        LoadingState::Idle => return render_empty(frame, area, "Press r to load"),
        LoadingState::Loading => return render_loading(frame, area, "Loading projects"),
        LoadingState::Loaded(gallery) => gallery,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Category bar
            Constraint::Min(1),    // Cards
            Constraint::Length(1), // Load more
        ])
        .split(area);

    let mut categories = vec![Span::raw(" ")];
    for category in gallery.categories() {
        let style = if category == gallery.active_filter() {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        categories.push(Span::styled(format!(" {} ", category), style));
        categories.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(categories)), chunks[0]);

    let visible = gallery.visible();
    if visible.is_empty() {
        render_empty(frame, chunks[1], "No projects in this category");
    } else {
        let title = format!(
            " Projects [{}/{}] ",
            visible.len(),
            gallery.filtered().len()
        );
        let list = highlighted(
            List::new(repo_items(&visible, options))
                .block(Block::default().borders(Borders::ALL).title(title)),
        );
        frame.render_stateful_widget(list, chunks[1], list_state);
    }

    if gallery.has_more() {
        frame.render_widget(
            Paragraph::new("▼ Load more (m)")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Cyan)),
            chunks[2],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::card::TechBadge;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn card() -> RenderableCard {
        RenderableCard {
            name: "folio".to_string(),
            html_url: "https://github.com/o/folio".to_string(),
            icon: "📁".to_string(),
            description: Some("A portfolio".to_string()),
            badges: vec![TechBadge {
                icon: "🦀".to_string(),
                name: "Rust".to_string(),
            }],
            topics: vec!["tui".to_string()],
            stars: 3,
            forks: 1,
            homepage: Some("https://example.com".to_string()),
            updated: Some("Today".to_string()),
        }
    }

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_compact_card() {
        let lines = text(&card_lines(&card(), false));
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("folio"));
        assert!(lines[0].contains("★ 3"));
        assert!(lines[2].contains("🦀 Rust"));
    }

    #[test]
    fn test_full_card() {
        let lines = text(&card_lines(&card(), true));
        assert_eq!(lines.len(), 6);
        assert!(lines[3].contains("#tui"));
        assert!(lines[4].contains("https://example.com"));
        assert!(lines[5].contains("Updated Today"));
    }

    #[test]
    fn test_card_without_optional_fields() {
        let mut card = card();
        card.description = None;
        card.badges.clear();
        card.topics.clear();
        card.homepage = None;
        card.updated = None;
        assert_eq!(card_lines(&card, true).len(), 1);
    }

    #[test]
    fn test_failed_showcase_load_renders_empty_state() {
        let mut terminal = Terminal::new(TestBackend::new(40, 3)).unwrap();
        let showcase: LoadingState<Vec<RepositoryWithLanguages>> = LoadingState::Loaded(Vec::new());

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_showcase(frame, &showcase, &Carousel::new(0), &CardOptions::default(), area);
            })
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("No projects found."));
    }
}
