//! Session data model: candidates, voter records and the reconciled snapshot.

use ethers_core::types::Address;
use ethers_core::utils::to_checksum;

/// A ballot option as stored by the contract. Ids are 1-based and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: u64,
    pub name: String,
}

/// Whether `account` has already cast its vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoterRecord {
    pub account: Address,
    pub has_voted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No trustworthy snapshot yet; interaction is disabled.
    Loading,
    /// Candidates loaded and the current account may vote.
    Ready,
    /// The current account has voted.
    Voted,
}

impl Phase {
    pub fn from_voted_flag(voted: bool) -> Self {
        if voted {
            Phase::Voted
        } else {
            Phase::Ready
        }
    }
}

/// Read-only view of the session handed to the presentation layer.
///
/// `account` and `voted_flag` are always replaced together so the flag shown
/// belongs to the account shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub phase: Phase,
    pub candidates: Vec<Candidate>,
    pub account: Option<Address>,
    pub voted_flag: bool,
}

impl Snapshot {
    pub fn loading() -> Self {
        Self {
            phase: Phase::Loading,
            candidates: Vec::new(),
            account: None,
            voted_flag: false,
        }
    }

    pub fn can_vote(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Checksummed form of the active account, for display.
    pub fn account_label(&self) -> Option<String> {
        self.account.map(|a| to_checksum(&a, None))
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::loading()
    }
}
