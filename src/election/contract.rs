use crate::election::error::Result;
use crate::election::model::{Candidate, VoterRecord};
use async_trait::async_trait;
use ethers_core::types::Address;
use std::fmt::Debug;

/// The fixed method surface of a deployed election contract.
///
/// Reads fail with [`ElectionError::ReadFailure`](crate::election::error::ElectionError::ReadFailure),
/// the state-changing call with `VoteRejected`.
#[async_trait]
pub trait ElectionContract: Debug + Send + Sync {
    async fn candidate_count(&self) -> Result<u64>;

    async fn candidate(&self, id: u64) -> Result<Candidate>;

    async fn voter_record(&self, account: Address) -> Result<VoterRecord>;

    /// Submit a vote for `candidate_id` signed by `from`, returning once the
    /// transaction is mined.
    async fn send_vote(&self, candidate_id: u64, from: Address) -> Result<()>;
}
