//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a sensible default so the client works against a local
//! Ganache node and a Truffle build directory out of the box.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// JSON-RPC endpoint of the wallet or node. `WEB3_PROVIDER_URI` takes
/// precedence over `url` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_url")]
    pub url: Option<String>,
    /// How often account and network changes are polled for.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: default_provider_url(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Where the election contract's deployment artifact lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Truffle build artifact holding the ABI and per-network addresses.
    #[serde(default = "default_artifact")]
    pub artifact: PathBuf,
    #[serde(default)]
    pub methods: ContractMethods,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            artifact: default_artifact(),
            methods: ContractMethods::default(),
        }
    }
}

/// Names of the contract methods the client calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMethods {
    #[serde(default = "default_candidate_count_method")]
    pub candidate_count: String,
    #[serde(default = "default_candidate_method")]
    pub candidate: String,
    #[serde(default = "default_voter_method")]
    pub voter: String,
    #[serde(default = "default_vote_method")]
    pub vote: String,
}

impl ContractMethods {
    pub fn all(&self) -> [&str; 4] {
        [&self.candidate_count, &self.candidate, &self.voter, &self.vote]
    }
}

impl Default for ContractMethods {
    fn default() -> Self {
        Self {
            candidate_count: default_candidate_count_method(),
            candidate: default_candidate_method(),
            voter: default_voter_method(),
            vote: default_vote_method(),
        }
    }
}

/// UI appearance and behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            tick_rate_ms: default_tick_rate(),
        }
    }
}

/// Diagnostic log settings. Logs go to a daily file since the terminal
/// belongs to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_dir: default_log_dir(),
            level: default_log_level(),
        }
    }
}

fn default_provider_url() -> Option<String> {
    Some("http://127.0.0.1:7545".to_string())
}
fn default_poll_interval() -> u64 {
    1000
}
fn default_artifact() -> PathBuf {
    PathBuf::from("build/contracts/Eleicao.json")
}
fn default_candidate_count_method() -> String {
    "contagemDeCandidatos".to_string()
}
fn default_candidate_method() -> String {
    "candidatos".to_string()
}
fn default_voter_method() -> String {
    "eleitores".to_string()
}
fn default_vote_method() -> String {
    "votar".to_string()
}
fn default_true() -> bool {
    true
}
fn default_timestamp_format() -> String {
    "%H:%M:%S".to_string()
}
fn default_tick_rate() -> u64 {
    250
}
fn default_log_dir() -> String {
    "~/.local/share/chainvote/logs".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
