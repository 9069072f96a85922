use crate::app::state::AppState;
use crate::election::model::{Phase, Snapshot};
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const VOTE_LABEL: &str = "[ Vote ]";

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, snapshot: &Snapshot) {
    let block = Block::default()
        .title(" Candidates on the blockchain ")
        .title_style(Theme::title())
        .borders(Borders::ALL)
        .border_type(Theme::border_type())
        .border_style(Theme::border());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = match snapshot.phase {
        Phase::Loading => vec![
            Line::default(),
            Line::from(Span::styled(
                format!("  {} Loading...", state.spinner()),
                Theme::loading(),
            ))
            .alignment(Alignment::Center),
        ],
        Phase::Voted => vec![
            Line::default(),
            Line::from(Span::styled("You have already voted!", Theme::voted()))
                .alignment(Alignment::Center),
        ],
        Phase::Ready if snapshot.candidates.is_empty() => vec![
            Line::default(),
            Line::from(Span::styled("No candidates registered.", Theme::muted()))
                .alignment(Alignment::Center),
        ],
        Phase::Ready => candidate_lines(state, snapshot, inner.width as usize),
    };

    frame.render_widget(Paragraph::new(lines), inner);
}

fn candidate_lines(state: &AppState, snapshot: &Snapshot, width: usize) -> Vec<Line<'static>> {
    let id_width = snapshot
        .candidates
        .last()
        .map(|c| c.id.to_string().len())
        .unwrap_or(1);
    // " #id  name ... [ Vote ] "
    let name_width = width.saturating_sub(id_width + VOTE_LABEL.len() + 6);

    snapshot
        .candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let selected = idx == state.selected;
            let name = fit(&candidate.name, name_width);
            let name_style = if selected {
                Theme::candidate_selected()
            } else {
                Theme::candidate()
            };
            let mut spans = vec![
                Span::styled(format!(" #{:>w$} ", candidate.id, w = id_width), Theme::candidate_id()),
                Span::styled(format!(" {} ", name), name_style),
            ];
            if selected {
                spans.push(Span::styled(VOTE_LABEL, Theme::vote_button()));
            }
            Line::from(spans)
        })
        .collect()
}

/// Truncate or pad `text` to exactly `width` display columns.
fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    if used < text.width() && width > 0 && out.pop().is_some() {
        out.push('…');
        used = out.width();
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}
