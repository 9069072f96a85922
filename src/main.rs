mod app;
mod config;
mod election;
mod logging;
mod ui;

use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::handler;
use crate::app::state::AppState;
use crate::election::client::ElectionClient;
use crate::election::ethereum::EthersGateway;
use crate::election::locator::ContractLocator;
use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::prelude::*;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Install panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    // Load config
    let cfg = config::load_config()?;
    if let Some(path) = logging::init_logging(&cfg.logging)? {
        info!(log = %path.display(), "chainvote starting");
    }

    // Deployment registry must be readable before the UI takes the terminal
    let locator = ContractLocator::from_artifact_file(&cfg.contract.artifact, &cfg.contract.methods)?;
    info!(
        contract = locator.contract_name(),
        networks = ?locator.networks().collect::<Vec<_>>(),
        "deployment registry loaded"
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, cfg, locator).await;

    // Restore terminal
    restore_terminal()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cfg: config::AppConfig,
    locator: ContractLocator,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let mut state = AppState::new(cfg.ui.clone());
    let gateway = Arc::new(EthersGateway::from_config(&cfg.provider));
    let mut client = ElectionClient::new(gateway, Arc::new(locator), event_tx.clone());

    // Spawn terminal input task
    let term_tx = event_tx.clone();
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        loop {
            match reader.next().await {
                Some(Ok(event)) => {
                    if term_tx.send(AppEvent::Terminal(event)).is_err() {
                        break;
                    }
                }
                Some(Err(_)) => break,
                None => break,
            }
        }
    });

    // Spawn tick task
    let tick_tx = event_tx.clone();
    let tick_rate = std::time::Duration::from_millis(cfg.ui.tick_rate_ms.max(16));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_rate);
        loop {
            interval.tick().await;
            if tick_tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });

    client.mount();

    // Initial render
    terminal.draw(|f| ui::render(f, &state, client.snapshot()))?;

    // Main event loop
    loop {
        let event = event_rx.recv().await;
        let Some(event) = event else { break };

        let actions = match event {
            AppEvent::Election(election_event) => {
                state.status_message = None;
                if let Some(notice) = client.handle(election_event) {
                    state.raise(notice);
                }
                state.clamp_selection(client.snapshot().candidates.len());
                state.dirty = true;
                Vec::new()
            }
            other => handler::handle_event(&mut state, client.snapshot(), other),
        };

        // Process actions
        for action in actions {
            match action {
                Action::CastVote { candidate_id } => {
                    if client.vote(candidate_id) {
                        state.status_message =
                            Some(format!("Submitting vote for candidate #{}...", candidate_id));
                        state.dirty = true;
                    }
                }
                Action::Quit => {
                    state.should_quit = true;
                }
            }
        }

        if state.should_quit {
            client.teardown();
            break;
        }

        // Conditional render (only if dirty)
        if state.dirty {
            terminal.draw(|f| ui::render(f, &state, client.snapshot()))?;
            state.dirty = false;
        }
    }

    info!(
        network_id = ?client.network_id(),
        halted = client.is_halted(),
        "chainvote exiting"
    );
    Ok(())
}
