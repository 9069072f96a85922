//! Election-state synchronization and voting protocol.
//!
//! Leaf-first: [`gateway`] (wallet/network capability), [`locator`]
//! (deployment registry), [`contract`] and [`reader`] (consistent ballot
//! reads), and [`client`], which owns the session snapshot and the voting
//! state machine. [`ethereum`] binds the capabilities to a JSON-RPC node.

pub mod client;
pub mod contract;
pub mod error;
pub mod ethereum;
pub mod gateway;
pub mod locator;
pub mod model;
pub mod reader;

#[cfg(test)]
pub(crate) mod testing;
