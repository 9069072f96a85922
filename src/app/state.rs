use crate::config::model::UiConfig;
use crate::election::client::{Notice, Severity};
use crate::election::model::{Candidate, Phase, Snapshot};
use chrono::Local;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug, Clone)]
pub struct NoticeEntry {
    pub notice: Notice,
    pub raised_at: String,
}

impl NoticeEntry {
    pub fn is_fatal(&self) -> bool {
        self.notice.severity == Severity::Fatal
    }
}

/// Presentation state. The election snapshot itself is owned by the
/// election client and only read from here.
pub struct AppState {
    pub config: UiConfig,
    pub selected: usize,
    pub notice: Option<NoticeEntry>,
    pub should_quit: bool,
    pub dirty: bool,
    pub status_message: Option<String>,
    pub tick_count: u64,
}

impl AppState {
    pub fn new(config: UiConfig) -> Self {
        Self {
            config,
            selected: 0,
            notice: None,
            should_quit: false,
            dirty: true,
            status_message: None,
            tick_count: 0,
        }
    }

    /// Show a notice. A fatal notice already on screen is never replaced by
    /// a dismissible one.
    pub fn raise(&mut self, notice: Notice) {
        if self.notice.as_ref().is_some_and(|n| n.is_fatal()) && notice.severity != Severity::Fatal {
            return;
        }
        self.notice = Some(NoticeEntry {
            notice,
            raised_at: Local::now().format(&self.config.timestamp_format).to_string(),
        });
        self.dirty = true;
    }

    /// Close the current notice if it is dismissible.
    pub fn dismiss_notice(&mut self) -> bool {
        match &self.notice {
            Some(entry) if !entry.is_fatal() => {
                self.notice = None;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub fn select_next(&mut self, count: usize) {
        if count > 0 && self.selected + 1 < count {
            self.selected += 1;
            self.dirty = true;
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.dirty = true;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.dirty = true;
    }

    pub fn select_last(&mut self, count: usize) {
        self.selected = count.saturating_sub(1);
        self.dirty = true;
    }

    pub fn clamp_selection(&mut self, count: usize) {
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }

    pub fn selected_candidate<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a Candidate> {
        snapshot.candidates.get(self.selected)
    }

    pub fn spinner(&self) -> char {
        SPINNER[(self.tick_count % SPINNER.len() as u64) as usize]
    }

    pub fn status_line(&self, snapshot: &Snapshot) -> String {
        if let Some(ref msg) = self.status_message {
            return msg.clone();
        }
        if self.notice.as_ref().is_some_and(|n| n.is_fatal()) {
            return "Session halted | q: quit".to_string();
        }
        match snapshot.phase {
            Phase::Loading => format!("{} Waiting for the blockchain...", self.spinner()),
            Phase::Ready => format!(
                "Candidates: {} | ↑/↓: select  Enter: vote  q: quit",
                snapshot.candidates.len()
            ),
            Phase::Voted => "Vote recorded | q: quit".to_string(),
        }
    }
}
