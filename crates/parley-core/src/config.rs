//! Router Configuration
//!
//! Configuration structures for the event router, in one place so the CLI can
//! load them from a file and tests can pick a preset.

use serde::{Deserialize, Serialize};

use crate::errors::{ParleyError, ParleyResult};

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Buffer sizes for the event queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Capacity of the session → dispatcher queue. Producers wait for room
    /// rather than dropping events.
    pub event_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 128, // Presence floods after roster fetch are bursty
        }
    }
}

// ----------------------------------------------------------------------------
// Reconnect Configuration
// ----------------------------------------------------------------------------

/// Jitter window for reconnecting after a lost connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            max_delay_ms: 7_500,
        }
    }
}

impl ReconnectConfig {
    /// A fixed delay, no jitter
    pub fn fixed(delay_ms: u64) -> Self {
        Self {
            min_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
        }
    }
}

// ----------------------------------------------------------------------------
// Router Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for an event router
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub channels: ChannelConfig,
    pub reconnect: ReconnectConfig,
}

impl RouterConfig {
    /// Small buffers and near-immediate reconnects
    pub fn testing() -> Self {
        Self {
            channels: ChannelConfig {
                event_buffer_size: 16,
            },
            reconnect: ReconnectConfig::fixed(5),
        }
    }

    pub fn validate(&self) -> ParleyResult<()> {
        if self.channels.event_buffer_size == 0 {
            return Err(ParleyError::config_error(
                "event_buffer_size must be greater than zero",
            ));
        }
        if self.reconnect.min_delay_ms > self.reconnect.max_delay_ms {
            return Err(ParleyError::config_error(format!(
                "reconnect min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.reconnect.min_delay_ms, self.reconnect.max_delay_ms
            )));
        }
        Ok(())
    }
}
