use crate::app::state::AppState;
use crate::election::error::ElectionError;
use crate::ui::layout::centered;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub fn render(frame: &mut Frame, state: &AppState) {
    let Some(entry) = &state.notice else {
        return;
    };

    let title = title(&entry.notice.error);
    let (style, hint) = if entry.is_fatal() {
        (Theme::error_notice(), "Restart the client to try again.  q: quit")
    } else {
        (Theme::warning_notice(), "Esc/Enter: dismiss")
    };

    let area = centered(frame.area(), 60, 8);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(title)
        .title_style(style.add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_type(Theme::border_type())
        .border_style(style);

    let text = vec![
        Line::from(vec![
            Span::styled(format!("[{}] ", entry.raised_at), Theme::muted()),
            Span::styled(entry.notice.error.to_string(), style),
        ]),
        Line::default(),
        Line::from(Span::styled(hint, Theme::muted())),
    ];
    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn title(error: &ElectionError) -> &'static str {
    match error {
        ElectionError::NoProviderAvailable => " No provider ",
        ElectionError::NoAccountSelected => " No account ",
        ElectionError::DeploymentNotFound { .. } => " Contract not deployed ",
        ElectionError::ReadFailure { .. } => " Read failed ",
        ElectionError::VoteRejected { .. } => " Transaction rejected ",
    }
}
