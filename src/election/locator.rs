//! Static deployment registry.
//!
//! Deployments come from a Truffle build artifact: the contract ABI plus a
//! `networks` map from network id to deployed address. Resolution is a pure
//! lookup and performs no network I/O.

use crate::config::model::ContractMethods;
use crate::election::error::ElectionError;
use anyhow::{Context, Result};
use ethers_core::abi::{Abi, Token};
use ethers_core::types::{Address, Bytes};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Artifact {
    #[serde(default, rename = "contractName")]
    contract_name: Option<String>,
    abi: Abi,
    #[serde(default)]
    networks: HashMap<String, NetworkEntry>,
}

#[derive(Debug, Deserialize)]
struct NetworkEntry {
    address: Address,
}

/// ABI and the names of the methods the client calls on it.
#[derive(Debug)]
pub struct ContractInterface {
    pub name: String,
    pub abi: Abi,
    pub methods: ContractMethods,
}

impl ContractInterface {
    pub fn encode(&self, method: &str, args: &[Token]) -> Result<Bytes, ethers_core::abi::Error> {
        let data = self.abi.function(method)?.encode_input(args)?;
        Ok(data.into())
    }

    pub fn decode(&self, method: &str, output: &[u8]) -> Result<Vec<Token>, ethers_core::abi::Error> {
        self.abi.function(method)?.decode_output(output)
    }
}

/// Address and interface of the contract on one network.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub network_id: u64,
    pub address: Address,
    pub interface: Arc<ContractInterface>,
}

#[derive(Debug)]
pub struct ContractLocator {
    deployments: BTreeMap<u64, Address>,
    interface: Arc<ContractInterface>,
}

impl ContractLocator {
    pub fn from_artifact_file(path: &Path, methods: &ContractMethods) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract artifact {}", path.display()))?;
        Self::from_artifact_json(&contents, methods)
            .with_context(|| format!("Invalid contract artifact {}", path.display()))
    }

    pub fn from_artifact_json(json: &str, methods: &ContractMethods) -> Result<Self> {
        let artifact: Artifact =
            serde_json::from_str(json).context("Failed to parse contract artifact")?;

        for name in methods.all() {
            artifact
                .abi
                .function(name)
                .with_context(|| format!("Contract ABI has no method named '{}'", name))?;
        }

        let mut deployments = BTreeMap::new();
        for (key, entry) in artifact.networks {
            match key.parse::<u64>() {
                Ok(network_id) => {
                    deployments.insert(network_id, entry.address);
                }
                Err(_) => tracing::warn!(network = %key, "skipping non-numeric network id in artifact"),
            }
        }

        let interface = ContractInterface {
            name: artifact.contract_name.unwrap_or_else(|| "Election".to_string()),
            abi: artifact.abi,
            methods: methods.clone(),
        };

        Ok(Self {
            deployments,
            interface: Arc::new(interface),
        })
    }

    pub fn resolve(&self, network_id: u64) -> Result<Deployment, ElectionError> {
        let address = self
            .deployments
            .get(&network_id)
            .copied()
            .ok_or(ElectionError::DeploymentNotFound { network_id })?;
        Ok(Deployment {
            network_id,
            address,
            interface: Arc::clone(&self.interface),
        })
    }

    pub fn networks(&self) -> impl Iterator<Item = u64> + '_ {
        self.deployments.keys().copied()
    }

    pub fn contract_name(&self) -> &str {
        &self.interface.name
    }
}
