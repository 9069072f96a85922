mod ballot;
mod layout;
mod notice;
mod status_bar;
mod theme;

use crate::app::state::AppState;
use crate::election::model::Snapshot;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, state: &AppState, snapshot: &Snapshot) {
    let area = frame.area();
    let app_layout = layout::compute_layout(area);

    render_header(frame, app_layout.header);
    ballot::render(frame, app_layout.ballot, state, snapshot);
    status_bar::render_account(frame, app_layout.account, snapshot);
    status_bar::render(frame, app_layout.status_bar, state, snapshot);
    notice::render(frame, state);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled("Voting on the Blockchain", theme::Theme::title())),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(title, area);
}
