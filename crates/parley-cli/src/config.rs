//! Parley CLI Configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [router.channels]
//! event_buffer_size = 64
//!
//! [[accounts]]
//! jid = "alice@example.org"
//! hide_status_updates = false
//!
//! [[accounts.peers]]
//! jid = "bob@example.org"
//! encrypted = true
//! verified = true
//!
//! [console]
//! subscription_policy = "dismiss"
//! ```

use std::collections::HashSet;
use std::path::Path;

use parley_core::{AccountId, Jid, PeerSecurity, RosterEntry, RouterConfig};
use parley_runtime::SubscriptionResponse;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub router: RouterConfig,
    pub accounts: Vec<AccountConfig>,
    pub console: ConsoleConfig,
}

/// One account and the scripted state its session reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub jid: Jid,
    #[serde(default)]
    pub hide_status_updates: bool,
    /// Security state of peers; unlisted peers are unencrypted
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
    /// Contact list returned when the session reports a roster
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    pub jid: Jid,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub subscription_policy: SubscriptionPolicy,
}

/// How the console answers subscription requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPolicy {
    Approve,
    Deny,
    #[default]
    Dismiss,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl AppConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.router.validate()?;
        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.id()) {
                return Err(CliError::Config(format!(
                    "account {} is configured twice",
                    account.jid
                )));
            }
        }
        Ok(())
    }

    pub fn account(&self, id: &AccountId) -> Option<&AccountConfig> {
        self.accounts.iter().find(|a| &a.id() == id)
    }
}

impl AccountConfig {
    pub fn new(jid: impl Into<String>) -> Self {
        Self {
            jid: Jid::new(jid),
            hide_status_updates: false,
            peers: Vec::new(),
            roster: Vec::new(),
        }
    }

    pub fn id(&self) -> AccountId {
        AccountId::from(&self.jid)
    }

    pub fn security_for(&self, peer: &Jid) -> PeerSecurity {
        let peer = peer.bare();
        self.peers
            .iter()
            .find(|p| p.jid.bare() == peer)
            .map(|p| PeerSecurity {
                encrypted: p.encrypted,
                verified: p.verified,
            })
            .unwrap_or_default()
    }
}

impl From<SubscriptionPolicy> for SubscriptionResponse {
    fn from(policy: SubscriptionPolicy) -> Self {
        match policy {
            SubscriptionPolicy::Approve => SubscriptionResponse::Approve,
            SubscriptionPolicy::Deny => SubscriptionResponse::Deny,
            SubscriptionPolicy::Dismiss => SubscriptionResponse::Dismissed,
        }
    }
}
