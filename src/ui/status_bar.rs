use crate::app::state::AppState;
use crate::election::model::Snapshot;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, snapshot: &Snapshot) {
    let status = format!(" {} ", state.status_line(snapshot));
    let remaining = (area.width as usize).saturating_sub(status.chars().count());
    let line = Line::from(vec![
        Span::styled(status, Theme::status_bar()),
        Span::styled(" ".repeat(remaining), Theme::status_bar()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

pub fn render_account(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let account = snapshot
        .account_label()
        .unwrap_or_else(|| "(not connected)".to_string());
    let line = Line::from(vec![
        Span::styled(" Account: ", Theme::muted()),
        Span::styled(account, Theme::account()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
