//! Consistent read of the ballot for one account.

use crate::election::contract::ElectionContract;
use crate::election::error::Result;
use crate::election::model::Candidate;
use ethers_core::types::Address;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionRead {
    pub candidates: Vec<Candidate>,
    pub voted_flag: bool,
}

/// Read the candidate count, every candidate from id 1 to the count in id
/// order, then `account`'s voted-flag. The first failing read aborts the
/// whole sequence; no partial candidate list is ever returned.
pub async fn load_all(contract: &dyn ElectionContract, account: Address) -> Result<ElectionRead> {
    let count = contract.candidate_count().await?;
    debug!(count, "reading candidates");

    let mut candidates = Vec::with_capacity(count.min(1024) as usize);
    for id in 1..=count {
        candidates.push(contract.candidate(id).await?);
    }

    let record = contract.voter_record(account).await?;
    Ok(ElectionRead {
        candidates,
        voted_flag: record.has_voted,
    })
}
