//! Election session orchestrator.
//!
//! [`ElectionClient`] owns the reconciled [`Snapshot`] and drives every
//! transition of the voting state machine:
//!
//! ```text
//! mount ──► Loading ──load ok──► Ready ◄──vote failed── Loading ◄──vote── Ready
//!              │                   │                       │
//!              │ load failed       └─flag=true─► Voted ◄───┘ re-read flag=true
//!              ▼
//!           halted (fatal notice)
//! ```
//!
//! All I/O runs on spawned tasks that post an [`ElectionEvent`] back to the
//! app loop. Each operation is tagged with the session sequence number at the
//! time it started; completions carrying an older number are dropped so a slow
//! vote can never overwrite a newer account re-read, or the other way round.

use crate::app::event::AppEvent;
use crate::election::contract::ElectionContract;
use crate::election::error::{ElectionError, Result};
use crate::election::gateway::{ProviderGateway, ProviderKind, Subscription};
use crate::election::locator::ContractLocator;
use crate::election::model::{Phase, Snapshot, VoterRecord};
use crate::election::reader::{self, ElectionRead};
use ethers_core::types::Address;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Ends the session; the user has to restart the client.
    Fatal,
    /// Informational; the session continues and the user may retry.
    Dismissible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub error: ElectionError,
}

impl Notice {
    pub fn fatal(error: ElectionError) -> Self {
        Self { severity: Severity::Fatal, error }
    }

    pub fn dismissible(error: ElectionError) -> Self {
        Self { severity: Severity::Dismissible, error }
    }
}

#[derive(Debug)]
pub struct LoadedSession {
    pub kind: ProviderKind,
    pub network_id: u64,
    pub contract_address: Address,
    pub account: Address,
    pub contract: Arc<dyn ElectionContract>,
    pub read: ElectionRead,
}

#[derive(Debug)]
pub enum ElectionEvent {
    SessionLoaded { seq: u64, result: Result<LoadedSession> },
    AccountsChanged(Option<Address>),
    NetworkChanged(u64),
    VoterRecordRead { seq: u64, result: Result<VoterRecord> },
    VoteFinished { seq: u64, result: Result<VoterRecord> },
}

pub struct ElectionClient {
    gateway: Arc<dyn ProviderGateway>,
    locator: Arc<ContractLocator>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    snapshot: Snapshot,
    contract: Option<Arc<dyn ElectionContract>>,
    network_id: Option<u64>,
    seq: u64,
    halted: bool,
    subscriptions: Vec<Subscription>,
}

impl ElectionClient {
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        locator: Arc<ContractLocator>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            gateway,
            locator,
            event_tx,
            snapshot: Snapshot::loading(),
            contract: None,
            network_id: None,
            seq: 0,
            halted: false,
            subscriptions: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn network_id(&self) -> Option<u64> {
        self.network_id
    }

    /// Start a fresh session: connect, resolve the deployment and read the
    /// whole ballot. Any earlier session state and subscriptions are dropped.
    pub fn mount(&mut self) {
        self.release_subscriptions();
        self.snapshot = Snapshot::loading();
        self.contract = None;
        self.network_id = None;
        self.halted = false;

        let seq = self.next_seq();
        info!(seq, "loading election session");
        let gateway = Arc::clone(&self.gateway);
        let locator = Arc::clone(&self.locator);
        self.spawn(async move {
            let result = load_session(gateway.as_ref(), &locator).await;
            ElectionEvent::SessionLoaded { seq, result }
        });
    }

    /// Cast a vote from the current account. Only accepted in [`Phase::Ready`];
    /// the id is passed through to the contract unchecked.
    pub fn vote(&mut self, candidate_id: u64) -> bool {
        if self.halted || !self.snapshot.can_vote() {
            debug!(candidate_id, phase = ?self.snapshot.phase, "vote ignored");
            return false;
        }
        let (Some(contract), Some(account)) = (self.contract.clone(), self.snapshot.account) else {
            return false;
        };

        self.snapshot.phase = Phase::Loading;
        let seq = self.next_seq();
        info!(seq, candidate_id, account = ?account, "casting vote");
        self.spawn(async move {
            let result = cast_vote(contract.as_ref(), candidate_id, account).await;
            ElectionEvent::VoteFinished { seq, result }
        });
        true
    }

    /// Apply a completed operation or provider event. Returns a notice when
    /// the user has to be told about a failure.
    pub fn handle(&mut self, event: ElectionEvent) -> Option<Notice> {
        match event {
            ElectionEvent::SessionLoaded { seq, result } => {
                if self.is_stale(seq, "session load") {
                    return None;
                }
                match result {
                    Ok(session) => {
                        self.install(session);
                        None
                    }
                    Err(e) => Some(self.halt(e)),
                }
            }
            ElectionEvent::AccountsChanged(account) => self.account_changed(account),
            ElectionEvent::NetworkChanged(network_id) => {
                if self.halted || self.network_id == Some(network_id) {
                    return None;
                }
                info!(
                    from = ?self.network_id,
                    to = network_id,
                    "network changed, restarting session"
                );
                self.mount();
                None
            }
            ElectionEvent::VoterRecordRead { seq, result } => {
                if self.is_stale(seq, "voter record read") {
                    return None;
                }
                match result {
                    Ok(record) => {
                        self.apply_record(record);
                        None
                    }
                    Err(e) => Some(self.halt(e)),
                }
            }
            ElectionEvent::VoteFinished { seq, result } => {
                if self.is_stale(seq, "vote") {
                    // the snapshot belongs to a newer operation, but the user
                    // still hears about the failed transaction
                    return match result {
                        Ok(_) => None,
                        Err(e) => {
                            warn!(seq, error = %e, "superseded vote failed");
                            Some(Notice::dismissible(e))
                        }
                    };
                }
                match result {
                    Ok(record) => {
                        self.apply_record(record);
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "vote failed");
                        self.snapshot.phase = Phase::Ready;
                        Some(Notice::dismissible(e))
                    }
                }
            }
        }
    }

    /// Release provider subscriptions at the end of the session.
    pub fn teardown(&mut self) {
        self.release_subscriptions();
    }

    fn account_changed(&mut self, account: Option<Address>) -> Option<Notice> {
        if self.halted {
            return None;
        }
        let contract = self.contract.clone()?;
        let Some(account) = account else {
            return Some(self.halt(ElectionError::NoAccountSelected));
        };

        // The previous account and its flag stay in place until the new
        // flag arrives; they are swapped together.
        self.snapshot.phase = Phase::Loading;
        let seq = self.next_seq();
        info!(seq, account = ?account, "active account changed");
        self.spawn(async move {
            let result = contract.voter_record(account).await;
            ElectionEvent::VoterRecordRead { seq, result }
        });
        None
    }

    fn install(&mut self, session: LoadedSession) {
        info!(
            provider = ?session.kind,
            network_id = session.network_id,
            contract = ?session.contract_address,
            candidates = session.read.candidates.len(),
            voted = session.read.voted_flag,
            "election session ready"
        );
        self.contract = Some(session.contract);
        self.network_id = Some(session.network_id);
        self.snapshot = Snapshot {
            phase: Phase::from_voted_flag(session.read.voted_flag),
            candidates: session.read.candidates,
            account: Some(session.account),
            voted_flag: session.read.voted_flag,
        };
        // watchers start from what was loaded, so a switch made while the
        // ballot was being read is still reported
        self.subscribe(session.account, session.network_id);
    }

    fn apply_record(&mut self, record: VoterRecord) {
        debug!(account = ?record.account, voted = record.has_voted, "voter record updated");
        self.snapshot.account = Some(record.account);
        self.snapshot.voted_flag = record.has_voted;
        self.snapshot.phase = Phase::from_voted_flag(record.has_voted);
    }

    fn halt(&mut self, error: ElectionError) -> Notice {
        warn!(error = %error, "election session halted");
        self.halted = true;
        self.snapshot.phase = Phase::Loading;
        self.release_subscriptions();
        Notice::fatal(error)
    }

    fn subscribe(&mut self, account: Address, network_id: u64) {
        let tx = self.event_tx.clone();
        let accounts = self.gateway.on_accounts_changed(
            Some(account),
            Box::new(move |account| {
                let _ = tx.send(AppEvent::Election(ElectionEvent::AccountsChanged(account)));
            }),
        );
        let tx = self.event_tx.clone();
        let network = self.gateway.on_network_changed(
            network_id,
            Box::new(move |network_id| {
                let _ = tx.send(AppEvent::Election(ElectionEvent::NetworkChanged(network_id)));
            }),
        );
        self.subscriptions.push(accounts);
        self.subscriptions.push(network);
    }

    fn release_subscriptions(&mut self) {
        if !self.subscriptions.is_empty() {
            let active = self.subscriptions.iter().filter(|s| s.is_active()).count();
            debug!(count = self.subscriptions.len(), active, "releasing provider subscriptions");
        }
        for sub in self.subscriptions.drain(..) {
            sub.unsubscribe();
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn is_stale(&self, seq: u64, operation: &str) -> bool {
        let stale = seq != self.seq;
        if stale {
            debug!(seq, current = self.seq, operation, "discarding stale completion");
        }
        stale
    }

    fn spawn<F>(&self, operation: F)
    where
        F: Future<Output = ElectionEvent> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = operation.await;
            let _ = tx.send(AppEvent::Election(event));
        });
    }
}

impl Drop for ElectionClient {
    fn drop(&mut self) {
        self.release_subscriptions();
    }
}

async fn load_session(
    gateway: &dyn ProviderGateway,
    locator: &ContractLocator,
) -> Result<LoadedSession> {
    let kind = gateway.connect().await?;
    let account = gateway.active_account().await?;
    let network_id = gateway.network_id().await?;
    let deployment = locator.resolve(network_id)?;
    let contract = gateway.contract(&deployment)?;
    let read = reader::load_all(contract.as_ref(), account).await?;
    Ok(LoadedSession {
        kind,
        network_id: deployment.network_id,
        contract_address: deployment.address,
        account,
        contract,
        read,
    })
}

/// Send the vote, then re-read the flag from the contract rather than
/// assuming the vote was recorded.
async fn cast_vote(
    contract: &dyn ElectionContract,
    candidate_id: u64,
    account: Address,
) -> Result<VoterRecord> {
    contract.send_vote(candidate_id, account).await?;
    contract.voter_record(account).await
}
