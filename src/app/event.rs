use crate::election::client::ElectionEvent;
use crossterm::event::Event as CrosstermEvent;

#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input event
    Terminal(CrosstermEvent),

    /// Completed election operation or provider notification
    Election(ElectionEvent),

    /// Tick for UI refresh
    Tick,
}
