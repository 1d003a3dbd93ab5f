/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Core types for the relink session layer.
//!
//! This module provides fundamental types used throughout relink:
//! - [`CommandId`]: Application-level command identifier carried in frame headers
//! - [`SubscriberId`]: Identity token for listener registrations
//! - [`ConnectKind`]: Distinguishes a fresh connect from a scheduled retry
//! - [`Endpoint`]: A remembered host/port pair
//! - [`CloseEvent`]: Close code and reason reported by the transport

use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-level command identifier.
///
/// Every framed message carries a command identifier used to correlate
/// responses with pending requests and to select listeners. Identifiers
/// greater than zero denote commands whose responses are awaited; values of
/// zero or below mark fire-and-forget traffic (heartbeats, notifications).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CommandId(i32);

impl CommandId {
    /// Command identifier for traffic that expects no response.
    pub const NONE: Self = Self(0);

    /// Creates a new command identifier.
    #[inline]
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw identifier value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Whether a request tagged with this command awaits a matching response.
    #[inline]
    #[must_use]
    pub const fn awaits_response(self) -> bool {
        self.0 > 0
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<i32> for CommandId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<CommandId> for i32 {
    fn from(cmd: CommandId) -> Self {
        cmd.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity token for the component behind a listener registration.
///
/// The registry deduplicates and removes handlers by identity: the callback
/// pointer plus this token. A registration without a token matches any token
/// with the same callback (wildcard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Creates a new subscriber identity token.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw token value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber#{}", self.0)
    }
}

/// Kind of connection attempt.
///
/// Only a `Normal` connect updates the session's remembered endpoint; a
/// `Reconnect` attempt reuses whatever was last recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectKind {
    /// A fresh, caller-initiated connection.
    #[default]
    Normal,
    /// A retry scheduled by the reconnection controller.
    Reconnect,
}

impl fmt::Display for ConnectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Reconnect => write!(f, "reconnect"),
        }
    }
}

/// A host/port pair targeted by a connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
}

impl Endpoint {
    /// Creates a new endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Close code and reason reported when a connection terminates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseEvent {
    /// Numeric close code, if the transport reported one.
    pub code: Option<u16>,
    /// Human-readable close reason, if the transport reported one.
    pub reason: Option<String>,
}

impl CloseEvent {
    /// Creates a close event with a code and reason.
    #[must_use]
    pub fn new(code: Option<u16>, reason: Option<String>) -> Self {
        Self { code, reason }
    }
}

impl fmt::Display for CloseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.reason) {
            (Some(code), Some(reason)) => write!(f, "code={code}, reason={reason}"),
            (Some(code), None) => write!(f, "code={code}"),
            (None, Some(reason)) => write!(f, "reason={reason}"),
            (None, None) => write!(f, "no close detail"),
        }
    }
}
