/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Session configuration.
//!
//! This module provides timing options for relink sessions.

use std::time::Duration;

/// Configuration for a relink session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Outbound idle window after which a heartbeat is sent.
    pub heartbeat_interval: Duration,
    /// Maximum inbound silence before the connection is presumed dead.
    pub receive_timeout: Duration,
    /// Delay before a scheduled reconnect attempt.
    pub reconnect_delay: Duration,
    /// Whether frames that fail header validation still reset the liveness
    /// window. Off by default: only a validated frame proves the peer is
    /// speaking the protocol.
    pub liveness_on_invalid_frames: bool,
}

impl SessionConfig {
    /// Creates a configuration with default timings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(10_000),
            receive_timeout: Duration::from_millis(60_000),
            reconnect_delay: Duration::from_millis(2_000),
            liveness_on_invalid_frames: false,
        }
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the receive timeout.
    #[must_use]
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Sets the reconnect delay.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets whether invalid frames count as proof of liveness.
    #[must_use]
    pub const fn with_liveness_on_invalid_frames(mut self, enabled: bool) -> Self {
        self.liveness_on_invalid_frames = enabled;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
