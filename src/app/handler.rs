use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::state::AppState;
use crate::election::model::{Phase, Snapshot};
use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Translate a presentation event into actions. Election events are routed
/// to the election client by the main loop and never reach this function.
pub fn handle_event(state: &mut AppState, snapshot: &Snapshot, event: AppEvent) -> Vec<Action> {
    match event {
        AppEvent::Terminal(CEvent::Key(key)) => handle_key(state, snapshot, key),
        AppEvent::Terminal(CEvent::Resize(_, _)) => {
            state.dirty = true;
            vec![]
        }
        AppEvent::Terminal(_) => vec![],
        AppEvent::Election(_) => vec![],
        AppEvent::Tick => {
            state.tick_count = state.tick_count.wrapping_add(1);
            // only the loading spinner animates
            if snapshot.phase == Phase::Loading {
                state.dirty = true;
            }
            vec![]
        }
    }
}

fn handle_key(state: &mut AppState, snapshot: &Snapshot, key: KeyEvent) -> Vec<Action> {
    if key.kind != KeyEventKind::Press {
        return vec![];
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return vec![Action::Quit];
    }
    if key.code == KeyCode::Char('q') {
        return vec![Action::Quit];
    }

    // An open notice captures the keyboard until it is dismissed
    if state.notice.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            state.dismiss_notice();
        }
        return vec![];
    }

    let count = snapshot.candidates.len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => state.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => state.select_next(count),
        KeyCode::Home => state.select_first(),
        KeyCode::End => state.select_last(count),
        KeyCode::Enter | KeyCode::Char(' ') => {
            if !snapshot.can_vote() {
                return vec![];
            }
            if let Some(candidate) = state.selected_candidate(snapshot) {
                return vec![Action::CastVote {
                    candidate_id: candidate.id,
                }];
            }
        }
        _ => {}
    }
    vec![]
}
