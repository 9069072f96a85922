//! Wallet/network capability consumed by the election client.

use crate::election::contract::ElectionContract;
use crate::election::error::{ElectionError, Result};
use crate::election::locator::Deployment;
use async_trait::async_trait;
use ethers_core::types::Address;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub type AccountsHandler = Box<dyn Fn(Option<Address>) + Send + Sync + 'static>;
pub type NetworkHandler = Box<dyn Fn(u64) + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Requires an explicit authorization request before any read.
    Modern,
    /// Exposes its accounts without an authorization step.
    Legacy,
}

#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Authorize against the provider. May trigger a wallet permission prompt.
    async fn connect(&self) -> Result<ProviderKind>;

    /// Accounts exposed by the provider; the first one is active.
    async fn accounts(&self) -> Result<Vec<Address>>;

    async fn network_id(&self) -> Result<u64>;

    /// Bind the contract capability for a resolved deployment.
    fn contract(&self, deployment: &Deployment) -> Result<Arc<dyn ElectionContract>>;

    /// Invoke `handler` with the new active account each time it differs
    /// from the last one seen, starting from `current`. Changes are delivered
    /// in order, one at a time, and never replayed.
    fn on_accounts_changed(&self, current: Option<Address>, handler: AccountsHandler) -> Subscription;

    fn on_network_changed(&self, current: u64, handler: NetworkHandler) -> Subscription;

    async fn active_account(&self) -> Result<Address> {
        self.accounts()
            .await?
            .first()
            .copied()
            .ok_or(ElectionError::NoAccountSelected)
    }
}

/// Lifetime of a provider event subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn spawn<F>(watcher: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: Some(tokio::spawn(watcher)),
        }
    }

    /// A subscription with nothing behind it, for providers that never emit.
    pub fn inert() -> Self {
        Self { task: None }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
