//! JSON-RPC binding of the provider and contract capabilities, built on
//! `ethers-providers`.
//!
//! The gateway discovers its endpoint from `WEB3_PROVIDER_URI` or the config
//! file, authorizes with `eth_requestAccounts` when the endpoint supports it
//! and falls back to legacy (no authorization) mode when it does not. Account
//! and network changes are observed by polling.

use crate::config::model::ProviderConfig;
use crate::election::contract::ElectionContract;
use crate::election::error::{ElectionError, Result};
use crate::election::gateway::{AccountsHandler, NetworkHandler, ProviderGateway, ProviderKind, Subscription};
use crate::election::locator::Deployment;
use crate::election::model::{Candidate, VoterRecord};
use async_trait::async_trait;
use ethers_core::abi::Token;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, TransactionRequest, U256, U64};
use ethers_providers::{Http, JsonRpcClient, Middleware, Provider, ProviderError, RpcError};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub const PROVIDER_URL_ENV: &str = "WEB3_PROVIDER_URI";

const METHOD_NOT_FOUND: i64 = -32601;
const USER_REJECTED_REQUEST: i64 = 4001;

#[derive(Debug)]
pub struct EthersGateway<P> {
    provider: Option<Arc<Provider<P>>>,
    poll_interval: Duration,
}

impl EthersGateway<Http> {
    /// Build an HTTP gateway. A missing or unparsable endpoint is not an error
    /// here; it surfaces as `NoProviderAvailable` when the session connects.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let poll_interval = Duration::from_millis(config.poll_interval_ms.max(50));
        let endpoint = std::env::var(PROVIDER_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| config.url.clone());

        let provider = endpoint.and_then(|url| match Provider::<Http>::try_from(url.as_str()) {
            Ok(provider) => {
                info!(endpoint = %url, "using JSON-RPC provider");
                Some(provider.interval(poll_interval))
            }
            Err(e) => {
                warn!(endpoint = %url, error = %e, "invalid provider endpoint");
                None
            }
        });
        Self::new(provider, poll_interval)
    }
}

impl<P: JsonRpcClient + 'static> EthersGateway<P> {
    pub fn new(provider: Option<Provider<P>>, poll_interval: Duration) -> Self {
        Self {
            provider: provider.map(Arc::new),
            poll_interval,
        }
    }

    fn provider(&self) -> Result<&Arc<Provider<P>>> {
        self.provider.as_ref().ok_or(ElectionError::NoProviderAvailable)
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> ProviderGateway for EthersGateway<P> {
    async fn connect(&self) -> Result<ProviderKind> {
        let provider = self.provider()?;
        match provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
        {
            Ok(accounts) => {
                debug!(accounts = accounts.len(), "provider authorized");
                Ok(ProviderKind::Modern)
            }
            Err(e) => match rpc_error_code(&e) {
                Some(METHOD_NOT_FOUND) => {
                    provider.get_net_version().await.map_err(|e| {
                        warn!(error = %e, "legacy provider unreachable");
                        ElectionError::NoProviderAvailable
                    })?;
                    info!("provider has no authorization step, using legacy mode");
                    Ok(ProviderKind::Legacy)
                }
                Some(USER_REJECTED_REQUEST) => Err(ElectionError::NoAccountSelected),
                _ => {
                    warn!(error = %e, "provider unreachable");
                    Err(ElectionError::NoProviderAvailable)
                }
            },
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.provider()?
            .get_accounts()
            .await
            .map_err(ElectionError::read)
    }

    async fn network_id(&self) -> Result<u64> {
        let version = self
            .provider()?
            .get_net_version()
            .await
            .map_err(ElectionError::read)?;
        parse_network_id(&version).map_err(ElectionError::read)
    }

    fn contract(&self, deployment: &Deployment) -> Result<Arc<dyn ElectionContract>> {
        let provider = Arc::clone(self.provider()?);
        Ok(Arc::new(EthersElection::new(provider, deployment.clone())))
    }

    fn on_accounts_changed(&self, current: Option<Address>, handler: AccountsHandler) -> Subscription {
        let Some(provider) = self.provider.clone() else {
            return Subscription::inert();
        };
        watch(
            self.poll_interval,
            "accounts",
            current,
            move || {
                let provider = Arc::clone(&provider);
                async move {
                    let accounts = provider.get_accounts().await?;
                    Ok::<_, ProviderError>(accounts.first().copied())
                }
            },
            handler,
        )
    }

    fn on_network_changed(&self, current: u64, handler: NetworkHandler) -> Subscription {
        let Some(provider) = self.provider.clone() else {
            return Subscription::inert();
        };
        watch(
            self.poll_interval,
            "network",
            current,
            move || {
                let provider = Arc::clone(&provider);
                async move {
                    let version = provider.get_net_version().await?;
                    parse_network_id(&version).map_err(ProviderError::CustomError)
                }
            },
            handler,
        )
    }
}

/// Poll `poll` every `every` and hand each value that differs from the
/// previous one to `notify`, starting from `initial`.
fn watch<T, F, Fut, N>(
    every: Duration,
    what: &'static str,
    initial: T,
    mut poll: F,
    notify: N,
) -> Subscription
where
    T: PartialEq + Copy + Debug + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<T, ProviderError>> + Send,
    N: Fn(T) + Send + 'static,
{
    Subscription::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = initial;
        debug!(what, value = ?last, "watcher started");
        loop {
            ticker.tick().await;
            let current = match poll().await {
                Ok(value) => value,
                Err(e) => {
                    warn!(what, error = %e, "watch poll failed");
                    continue;
                }
            };
            if current != last {
                debug!(what, value = ?current, "change detected");
                last = current;
                notify(current);
            }
        }
    })
}

fn rpc_error_code(err: &ProviderError) -> Option<i64> {
    err.as_error_response().map(|e| e.code)
}

fn parse_network_id(version: &str) -> std::result::Result<u64, String> {
    version
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid network id '{}'", version))
}

/// A deployed election contract reached through `eth_call` and
/// `eth_sendTransaction`.
#[derive(Debug)]
pub struct EthersElection<P> {
    provider: Arc<Provider<P>>,
    deployment: Deployment,
}

impl<P: JsonRpcClient + 'static> EthersElection<P> {
    pub fn new(provider: Arc<Provider<P>>, deployment: Deployment) -> Self {
        Self { provider, deployment }
    }

    async fn read(&self, method: &str, args: &[Token]) -> Result<Vec<Token>> {
        let interface = &self.deployment.interface;
        let data = interface.encode(method, args).map_err(ElectionError::read)?;
        let tx: TypedTransaction = TransactionRequest::new()
            .to(self.deployment.address)
            .data(data)
            .into();
        let output = self
            .provider
            .call(&tx, None)
            .await
            .map_err(ElectionError::read)?;
        interface.decode(method, &output).map_err(ElectionError::read)
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> ElectionContract for EthersElection<P> {
    async fn candidate_count(&self) -> Result<u64> {
        let method = &self.deployment.interface.methods.candidate_count;
        match self.read(method, &[]).await?.as_slice() {
            [Token::Uint(count), ..] => to_u64(*count, "candidate count"),
            other => Err(unexpected_shape(method, other)),
        }
    }

    async fn candidate(&self, id: u64) -> Result<Candidate> {
        let method = &self.deployment.interface.methods.candidate;
        let tokens = self.read(method, &[Token::Uint(id.into())]).await?;
        match tokens.as_slice() {
            // trailing fields such as a vote tally are not part of the ballot
            [Token::Uint(raw_id), Token::String(name), ..] => {
                let stored_id = to_u64(*raw_id, "candidate id")?;
                if stored_id == 0 {
                    return Err(ElectionError::read(format!("candidate {} does not exist", id)));
                }
                Ok(Candidate {
                    id: stored_id,
                    name: name.clone(),
                })
            }
            other => Err(unexpected_shape(method, other)),
        }
    }

    async fn voter_record(&self, account: Address) -> Result<VoterRecord> {
        let method = &self.deployment.interface.methods.voter;
        match self.read(method, &[Token::Address(account)]).await?.as_slice() {
            [Token::Bool(has_voted), ..] => Ok(VoterRecord {
                account,
                has_voted: *has_voted,
            }),
            other => Err(unexpected_shape(method, other)),
        }
    }

    async fn send_vote(&self, candidate_id: u64, from: Address) -> Result<()> {
        let interface = &self.deployment.interface;
        let data = interface
            .encode(&interface.methods.vote, &[Token::Uint(candidate_id.into())])
            .map_err(ElectionError::rejected)?;
        let tx = TransactionRequest::new()
            .from(from)
            .to(self.deployment.address)
            .data(data);

        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(ElectionError::rejected)?;
        let tx_hash = pending.tx_hash();
        debug!(
            tx = ?tx_hash,
            candidate_id,
            network_id = self.deployment.network_id,
            "vote transaction submitted"
        );

        let receipt = pending
            .await
            .map_err(ElectionError::rejected)?
            .ok_or_else(|| ElectionError::rejected(format!("transaction {:?} was dropped", tx_hash)))?;
        if receipt.status == Some(U64::zero()) {
            return Err(ElectionError::rejected(format!(
                "transaction {:?} reverted",
                tx_hash
            )));
        }
        info!(tx = ?tx_hash, block = ?receipt.block_number, candidate_id, "vote mined");
        Ok(())
    }
}

fn to_u64(value: U256, what: &str) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(ElectionError::read(format!("{} {} is out of range", what, value)));
    }
    Ok(value.as_u64())
}

fn unexpected_shape(method: &str, tokens: &[Token]) -> ElectionError {
    ElectionError::read(format!("unexpected output from {}: {:?}", method, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::locator::tests::locator;
    use crate::election::testing::{other_voter, voter};
    use ethers_core::abi;
    use ethers_core::types::{Bytes, Transaction, TransactionReceipt, H256};
    use ethers_providers::{JsonRpcError, MockProvider, MockResponse};
    use tokio::sync::mpsc;

    fn mocked_gateway() -> (EthersGateway<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        (EthersGateway::new(Some(provider), Duration::from_millis(10)), mock)
    }

    fn mocked_election() -> (EthersElection<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        let provider = provider.interval(Duration::from_millis(5));
        let deployment = locator().resolve(5777).unwrap();
        (EthersElection::new(Arc::new(provider), deployment), mock)
    }

    fn rpc_error(mock: &MockProvider, code: i64, message: &str) {
        mock.push_response(MockResponse::Error(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        }));
    }

    /// Queue the replies `send_transaction` needs before `eth_sendTransaction`.
    /// The mock answers the most recently queued reply first.
    fn fill_replies(mock: &MockProvider) {
        mock.push::<U256, _>(U256::from(21_000u64)).unwrap(); // eth_estimateGas
        mock.push::<U256, _>(U256::from(1u64)).unwrap(); // eth_gasPrice
    }

    fn mined(status: u64) -> (Transaction, TransactionReceipt) {
        let tx = Transaction {
            block_number: Some(U64::from(3)),
            ..Transaction::default()
        };
        let receipt = TransactionReceipt {
            block_number: Some(U64::from(3)),
            status: Some(U64::from(status)),
            ..TransactionReceipt::default()
        };
        (tx, receipt)
    }

    async fn next_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("watcher did not report a change")
            .expect("watcher channel closed")
    }

    fn returns(mock: &MockProvider, tokens: &[Token]) {
        mock.push::<Bytes, _>(Bytes::from(abi::encode(tokens))).unwrap();
    }

    #[tokio::test]
    async fn test_decodes_candidate_count() {
        let (election, mock) = mocked_election();
        returns(&mock, &[Token::Uint(2u64.into())]);
        assert_eq!(election.candidate_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_candidate_ignores_vote_tally() {
        let (election, mock) = mocked_election();
        returns(
            &mock,
            &[
                Token::Uint(2u64.into()),
                Token::String("Bob".into()),
                Token::Uint(7u64.into()),
            ],
        );
        assert_eq!(
            election.candidate(2).await.unwrap(),
            Candidate { id: 2, name: "Bob".into() }
        );
    }

    #[tokio::test]
    async fn test_missing_candidate_is_read_failure() {
        let (election, mock) = mocked_election();
        returns(
            &mock,
            &[
                Token::Uint(U256::zero()),
                Token::String(String::new()),
                Token::Uint(U256::zero()),
            ],
        );
        assert!(matches!(
            election.candidate(9).await,
            Err(ElectionError::ReadFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_call_output_is_read_failure() {
        let (election, mock) = mocked_election();
        mock.push::<Bytes, _>(Bytes::default()).unwrap();
        assert!(matches!(
            election.candidate_count().await,
            Err(ElectionError::ReadFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_oversized_count_is_read_failure() {
        let (election, mock) = mocked_election();
        returns(&mock, &[Token::Uint(U256::MAX)]);
        assert!(matches!(
            election.candidate_count().await,
            Err(ElectionError::ReadFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_decodes_voter_record() {
        let (election, mock) = mocked_election();
        returns(&mock, &[Token::Bool(true)]);
        assert_eq!(
            election.voter_record(voter()).await.unwrap(),
            VoterRecord { account: voter(), has_voted: true }
        );
    }

    #[tokio::test]
    async fn test_provider_errors_are_read_failures() {
        // no response queued
        let (election, _mock) = mocked_election();
        assert!(matches!(
            election.voter_record(voter()).await,
            Err(ElectionError::ReadFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_modern_provider() {
        let (gateway, mock) = mocked_gateway();
        mock.push::<Vec<Address>, _>(vec![voter()]).unwrap();
        assert_eq!(gateway.connect().await.unwrap(), ProviderKind::Modern);
    }

    #[tokio::test]
    async fn test_active_account_is_first() {
        let (gateway, mock) = mocked_gateway();
        mock.push::<Vec<Address>, _>(vec![voter(), Address::zero()]).unwrap();
        assert_eq!(gateway.active_account().await.unwrap(), voter());
    }

    #[tokio::test]
    async fn test_no_accounts_exposed() {
        let (gateway, mock) = mocked_gateway();
        mock.push::<Vec<Address>, _>(Vec::new()).unwrap();
        assert_eq!(
            gateway.active_account().await.unwrap_err(),
            ElectionError::NoAccountSelected
        );
    }

    #[tokio::test]
    async fn test_network_id_parsed() {
        let (gateway, mock) = mocked_gateway();
        mock.push::<String, _>("5777".to_string()).unwrap();
        assert_eq!(gateway.network_id().await.unwrap(), 5777);

        mock.push::<String, _>("ganache".to_string()).unwrap();
        assert!(matches!(
            gateway.network_id().await,
            Err(ElectionError::ReadFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_gateway_without_endpoint() {
        let gateway = EthersGateway::<MockProvider>::new(None, Duration::from_secs(1));
        assert_eq!(gateway.connect().await.unwrap_err(), ElectionError::NoProviderAvailable);
        assert_eq!(gateway.accounts().await.unwrap_err(), ElectionError::NoProviderAvailable);
        assert!(gateway.contract(&locator().resolve(5777).unwrap()).is_err());
        assert!(!gateway.on_accounts_changed(Some(voter()), Box::new(|_| {})).is_active());
    }

    #[tokio::test]
    async fn test_connect_falls_back_to_legacy() {
        let (gateway, mock) = mocked_gateway();
        mock.push::<String, _>("5777".to_string()).unwrap();
        rpc_error(&mock, METHOD_NOT_FOUND, "Method eth_requestAccounts not supported");

        assert_eq!(gateway.connect().await.unwrap(), ProviderKind::Legacy);
    }

    #[tokio::test]
    async fn test_legacy_check_failure_means_no_provider() {
        let (gateway, mock) = mocked_gateway();
        // net_version gets no reply
        rpc_error(&mock, METHOD_NOT_FOUND, "Method eth_requestAccounts not supported");

        assert_eq!(gateway.connect().await.unwrap_err(), ElectionError::NoProviderAvailable);
    }

    #[tokio::test]
    async fn test_connect_refused_by_user() {
        let (gateway, mock) = mocked_gateway();
        rpc_error(&mock, USER_REJECTED_REQUEST, "User rejected the request.");

        assert_eq!(gateway.connect().await.unwrap_err(), ElectionError::NoAccountSelected);
    }

    #[tokio::test]
    async fn test_connect_transport_failure() {
        let (gateway, _mock) = mocked_gateway();
        assert_eq!(gateway.connect().await.unwrap_err(), ElectionError::NoProviderAvailable);

        let (gateway, mock) = mocked_gateway();
        rpc_error(&mock, -32000, "header not found");
        assert_eq!(gateway.connect().await.unwrap_err(), ElectionError::NoProviderAvailable);
    }

    #[tokio::test]
    async fn test_vote_mined() {
        let (election, mock) = mocked_election();
        let (tx, receipt) = mined(1);
        mock.push::<TransactionReceipt, _>(receipt).unwrap();
        mock.push::<Option<Transaction>, _>(Some(tx)).unwrap();
        mock.push::<H256, _>(H256::from_low_u64_be(7)).unwrap(); // eth_sendTransaction
        fill_replies(&mock);

        election.send_vote(2, voter()).await.unwrap();
    }

    #[tokio::test]
    async fn test_vote_refused_by_signer() {
        let (election, mock) = mocked_election();
        rpc_error(&mock, USER_REJECTED_REQUEST, "User denied transaction signature.");
        fill_replies(&mock);

        let err = election.send_vote(1, voter()).await.unwrap_err();
        assert!(matches!(
            err,
            ElectionError::VoteRejected { ref cause } if cause.contains("User denied")
        ));
    }

    #[tokio::test]
    async fn test_reverted_vote_is_rejected() {
        let (election, mock) = mocked_election();
        let (tx, receipt) = mined(0);
        mock.push::<TransactionReceipt, _>(receipt).unwrap();
        mock.push::<Option<Transaction>, _>(Some(tx)).unwrap();
        mock.push::<H256, _>(H256::from_low_u64_be(7)).unwrap();
        fill_replies(&mock);

        let err = election.send_vote(1, voter()).await.unwrap_err();
        assert!(matches!(
            err,
            ElectionError::VoteRejected { ref cause } if cause.contains("reverted")
        ));
    }

    #[tokio::test]
    async fn test_dropped_vote_is_rejected() {
        let (election, mock) = mocked_election();
        // first lookup plus three retries
        for _ in 0..4 {
            mock.push::<Option<Transaction>, _>(None).unwrap();
        }
        mock.push::<H256, _>(H256::from_low_u64_be(7)).unwrap();
        fill_replies(&mock);

        let err = election.send_vote(1, voter()).await.unwrap_err();
        assert!(matches!(
            err,
            ElectionError::VoteRejected { ref cause } if cause.contains("dropped")
        ));
    }

    #[tokio::test]
    async fn test_network_watcher_reports_change() {
        let (gateway, mock) = mocked_gateway();
        mock.push::<String, _>("1337".to_string()).unwrap();
        mock.push::<String, _>("5777".to_string()).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = gateway.on_network_changed(
            5777,
            Box::new(move |id| {
                let _ = tx.send(id);
            }),
        );

        assert_eq!(next_within(&mut rx).await, 1337);
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_account_switch_before_first_poll_is_reported() {
        let (gateway, mock) = mocked_gateway();
        for _ in 0..3 {
            mock.push::<Vec<Address>, _>(vec![other_voter()]).unwrap();
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = gateway.on_accounts_changed(
            Some(voter()),
            Box::new(move |account| {
                let _ = tx.send(account);
            }),
        );

        assert_eq!(next_within(&mut rx).await, Some(other_voter()));
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_accounts_watcher_reports_locked_wallet() {
        let (gateway, mock) = mocked_gateway();
        mock.push::<Vec<Address>, _>(Vec::new()).unwrap();
        mock.push::<Vec<Address>, _>(vec![voter()]).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = gateway.on_accounts_changed(
            Some(voter()),
            Box::new(move |account| {
                let _ = tx.send(account);
            }),
        );

        assert_eq!(next_within(&mut rx).await, None);
        sub.unsubscribe();
    }

    #[test]
    fn test_parse_network_id() {
        assert_eq!(parse_network_id("5777"), Ok(5777));
        assert_eq!(parse_network_id(" 1\n"), Ok(1));
        assert!(parse_network_id("0x1").is_err());
    }
}
