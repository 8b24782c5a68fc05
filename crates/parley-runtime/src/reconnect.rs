//! Reconnection scheduling
//!
//! After a lost connection the account reconnects once, after a random delay
//! inside the configured window so that accounts dropped together do not all
//! retry at the same instant. The returned [`AbortHandle`] is owned by the
//! account.

use std::sync::Arc;
use std::time::Duration;

use parley_core::{AccountId, ReconnectConfig};
use rand::Rng;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, error, info};

use crate::ui::AccountConnector;

/// Pick a delay uniformly from the configured window
pub fn jittered_delay(config: &ReconnectConfig) -> Duration {
    let min = config.min_delay_ms.min(config.max_delay_ms);
    let max = config.max_delay_ms.max(min);
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}

pub struct Reconnector {
    config: ReconnectConfig,
    connector: Arc<dyn AccountConnector>,
    runtime: Handle,
    scheduled: u64,
}

impl Reconnector {
    pub fn new(
        config: ReconnectConfig,
        connector: Arc<dyn AccountConnector>,
        runtime: Handle,
    ) -> Self {
        Self {
            config,
            connector,
            runtime,
            scheduled: 0,
        }
    }

    /// Spawn one delayed reconnection attempt for `account`
    pub fn schedule(&mut self, account: AccountId) -> AbortHandle {
        let delay = jittered_delay(&self.config);
        let connector = self.connector.clone();
        self.scheduled += 1;
        info!("Reconnecting {} in {}ms", account, delay.as_millis());

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Reconnect timer fired for {}", account);
            if let Err(e) = connector.reconnect(account.clone()).await {
                error!("Reconnect of {} failed: {}", account, e);
            }
        });
        task.abort_handle()
    }

    /// Attempts scheduled so far
    pub fn scheduled(&self) -> u64 {
        self.scheduled
    }

    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }
}

impl std::fmt::Debug for Reconnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconnector")
            .field("config", &self.config)
            .field("scheduled", &self.scheduled)
            .finish()
    }
}
