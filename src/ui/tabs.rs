// Tab bar rendering.
// Shows the account name and a loading marker on tabs still fetching.

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};

fn is_loading(app: &App, tab: Tab) -> bool {
    match tab {
        Tab::Pinned => app.pinned.is_loading(),
        Tab::Showcase => app.showcase.is_loading(),
        Tab::Projects => app.projects.is_loading(),
    }
}

/// Draw the tab bar at the top of the screen.
pub fn draw_tabs(frame: &mut Frame, app: &App, username: &str, area: Rect) {
    let tab_titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| {
            let title = if is_loading(app, *tab) {
                format!("{} …", tab.title())
            } else {
                tab.title().to_string()
            };

            let style = if *tab == app.active_tab {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            Line::from(Span::styled(title, style))
        })
        .collect();

    let selected_index = Tab::ALL
        .iter()
        .position(|t| *t == app.active_tab)
        .unwrap_or(0);

    let tabs_widget = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" folio · {} ", username))
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .select(selected_index)
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw(" │ "));

    frame.render_widget(tabs_widget, area);
}
