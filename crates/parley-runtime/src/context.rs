//! UI context
//!
//! Everything the handlers mutate lives here. The context is owned by the UI
//! loop and only ever touched from it.

use std::collections::BTreeMap;

use parley_core::{EventCategory, SessionRef};
use tracing::warn;

use crate::account::AccountRegistry;
use crate::reconnect::Reconnector;
use crate::ui::UiSurface;

/// Counts of handler jobs run on the UI context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerStats {
    executed: BTreeMap<EventCategory, u64>,
    /// Events dropped because their session had no live account
    pub unresolved: u64,
}

impl HandlerStats {
    pub fn record(&mut self, category: EventCategory) {
        *self.executed.entry(category).or_insert(0) += 1;
    }

    /// Log and count an event whose session resolves to no account
    pub fn record_unresolved(&mut self, session: &SessionRef, event: &str) {
        warn!(
            "No account for session {} (alive: {}), dropping {} event",
            session.id(),
            session.is_alive(),
            event
        );
        self.unresolved += 1;
    }

    pub fn executed(&self, category: EventCategory) -> u64 {
        self.executed.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.executed.values().sum()
    }

    pub fn by_category(&self) -> impl Iterator<Item = (EventCategory, u64)> + '_ {
        self.executed.iter().map(|(category, count)| (*category, *count))
    }
}

pub struct UiContext {
    pub accounts: AccountRegistry,
    pub surface: Box<dyn UiSurface>,
    pub reconnector: Reconnector,
    pub stats: HandlerStats,
}

impl UiContext {
    pub fn new(
        accounts: AccountRegistry,
        surface: Box<dyn UiSurface>,
        reconnector: Reconnector,
    ) -> Self {
        Self {
            accounts,
            surface,
            reconnector,
            stats: HandlerStats::default(),
        }
    }
}

impl std::fmt::Debug for UiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiContext")
            .field("accounts", &self.accounts)
            .field("reconnector", &self.reconnector)
            .field("stats", &self.stats)
            .finish()
    }
}
