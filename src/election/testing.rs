//! In-memory provider and contract fakes for exercising the election core.

use crate::election::contract::ElectionContract;
use crate::election::error::{ElectionError, Result};
use crate::election::gateway::{AccountsHandler, NetworkHandler, ProviderGateway, ProviderKind, Subscription};
use crate::election::locator::Deployment;
use crate::election::model::{Candidate, VoterRecord};
use async_trait::async_trait;
use ethers_core::types::Address;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn voter() -> Address {
    Address::from_low_u64_be(0xa11ce)
}

pub fn other_voter() -> Address {
    Address::from_low_u64_be(0xb0b)
}

pub fn alice_and_bob() -> Vec<Candidate> {
    vec![
        Candidate { id: 1, name: "Alice".into() },
        Candidate { id: 2, name: "Bob".into() },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    CandidateCount,
    Candidate(u64),
    VoterRecord(Address),
    SendVote { candidate_id: u64, from: Address },
}

#[derive(Debug, Default)]
struct ContractScript {
    candidates: Vec<Candidate>,
    voted: HashMap<Address, bool>,
    fail_count: bool,
    fail_candidate: Option<u64>,
    fail_voter: bool,
    reject_vote: Option<String>,
    ignore_votes: bool,
    calls: Vec<ContractCall>,
}

#[derive(Debug, Default)]
pub struct ScriptedContract {
    script: Mutex<ContractScript>,
}

impl ScriptedContract {
    pub fn with_candidates(candidates: Vec<Candidate>) -> Self {
        let contract = Self::default();
        contract.script.lock().unwrap().candidates = candidates;
        contract
    }

    pub fn set_voted(&self, account: Address, voted: bool) {
        self.script.lock().unwrap().voted.insert(account, voted);
    }

    pub fn fail_count(&self) {
        self.script.lock().unwrap().fail_count = true;
    }

    pub fn fail_candidate(&self, id: u64) {
        self.script.lock().unwrap().fail_candidate = Some(id);
    }

    pub fn fail_voter_reads(&self, fail: bool) {
        self.script.lock().unwrap().fail_voter = fail;
    }

    pub fn reject_votes(&self, reason: &str) {
        self.script.lock().unwrap().reject_vote = Some(reason.to_string());
    }

    /// Accept vote transactions without recording them.
    pub fn ignore_votes(&self) {
        self.script.lock().unwrap().ignore_votes = true;
    }

    pub fn calls(&self) -> Vec<ContractCall> {
        self.script.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl ElectionContract for ScriptedContract {
    async fn candidate_count(&self) -> Result<u64> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ContractCall::CandidateCount);
        if script.fail_count {
            return Err(ElectionError::read("connection reset"));
        }
        Ok(script.candidates.len() as u64)
    }

    async fn candidate(&self, id: u64) -> Result<Candidate> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ContractCall::Candidate(id));
        if script.fail_candidate == Some(id) {
            return Err(ElectionError::read(format!("candidate {} unavailable", id)));
        }
        script
            .candidates
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ElectionError::read(format!("candidate {} does not exist", id)))
    }

    async fn voter_record(&self, account: Address) -> Result<VoterRecord> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ContractCall::VoterRecord(account));
        if script.fail_voter {
            return Err(ElectionError::read("execution reverted"));
        }
        Ok(VoterRecord {
            account,
            has_voted: script.voted.get(&account).copied().unwrap_or(false),
        })
    }

    async fn send_vote(&self, candidate_id: u64, from: Address) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ContractCall::SendVote { candidate_id, from });
        if let Some(reason) = &script.reject_vote {
            return Err(ElectionError::rejected(reason));
        }
        if !script.ignore_votes {
            script.voted.insert(from, true);
        }
        Ok(())
    }
}

pub struct ScriptedGateway {
    pub contract: Arc<ScriptedContract>,
    connect: Mutex<Result<ProviderKind>>,
    accounts: Mutex<Vec<Address>>,
    network_id: Mutex<u64>,
    accounts_handler: Mutex<Option<AccountsHandler>>,
    network_handler: Mutex<Option<NetworkHandler>>,
    watched_from: Mutex<(Option<Address>, Option<u64>)>,
}

impl ScriptedGateway {
    pub fn new(network_id: u64, contract: ScriptedContract) -> Self {
        Self {
            contract: Arc::new(contract),
            connect: Mutex::new(Ok(ProviderKind::Modern)),
            accounts: Mutex::new(vec![voter()]),
            network_id: Mutex::new(network_id),
            accounts_handler: Mutex::new(None),
            network_handler: Mutex::new(None),
            watched_from: Mutex::new((None, None)),
        }
    }

    pub fn fail_connect(&self, err: ElectionError) {
        *self.connect.lock().unwrap() = Err(err);
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    pub fn set_network_id(&self, network_id: u64) {
        *self.network_id.lock().unwrap() = network_id;
    }

    pub fn is_watching(&self) -> bool {
        self.accounts_handler.lock().unwrap().is_some()
            && self.network_handler.lock().unwrap().is_some()
    }

    /// Account and network id the watchers were started from.
    pub fn watched_from(&self) -> (Option<Address>, Option<u64>) {
        *self.watched_from.lock().unwrap()
    }

    /// Deliver an account change to the registered handler, as a wallet would.
    pub fn emit_account(&self, account: Option<Address>) {
        if let Some(handler) = self.accounts_handler.lock().unwrap().as_ref() {
            handler(account);
        }
    }

    pub fn emit_network(&self, network_id: u64) {
        self.set_network_id(network_id);
        if let Some(handler) = self.network_handler.lock().unwrap().as_ref() {
            handler(network_id);
        }
    }
}

#[async_trait]
impl ProviderGateway for ScriptedGateway {
    async fn connect(&self) -> Result<ProviderKind> {
        self.connect.lock().unwrap().clone()
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn network_id(&self) -> Result<u64> {
        Ok(*self.network_id.lock().unwrap())
    }

    fn contract(&self, _deployment: &Deployment) -> Result<Arc<dyn ElectionContract>> {
        Ok(self.contract.clone())
    }

    fn on_accounts_changed(&self, current: Option<Address>, handler: AccountsHandler) -> Subscription {
        self.watched_from.lock().unwrap().0 = current;
        *self.accounts_handler.lock().unwrap() = Some(handler);
        Subscription::inert()
    }

    fn on_network_changed(&self, current: u64, handler: NetworkHandler) -> Subscription {
        self.watched_from.lock().unwrap().1 = Some(current);
        *self.network_handler.lock().unwrap() = Some(handler);
        Subscription::inert()
    }
}
