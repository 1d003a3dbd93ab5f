/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Listener registry.
//!
//! Maps response command identifiers to ordered lists of handler
//! registrations. Identity is the callback pointer plus the optional
//! subscriber token; a probe without a token matches any registration with
//! the same callback.

use relink_core::{CommandId, ResponseCallback, SubscriberId};
use std::collections::HashMap;
use std::sync::Arc;

/// One listener registration.
#[derive(Clone)]
pub(crate) struct ResponseHandler {
    pub target: Option<SubscriberId>,
    pub callback: ResponseCallback,
}

impl ResponseHandler {
    pub(crate) fn new(callback: ResponseCallback, target: Option<SubscriberId>) -> Self {
        Self { target, callback }
    }

    /// Identity match: same callback pointer, and either no probe token or
    /// an equal one.
    fn is_same(&self, callback: &ResponseCallback, target: Option<SubscriberId>) -> bool {
        Arc::ptr_eq(&self.callback, callback) && (target.is_none() || self.target == target)
    }
}

impl std::fmt::Debug for ResponseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseHandler")
            .field("target", &self.target)
            .finish()
    }
}

/// Command-keyed registry of response handlers.
#[derive(Debug, Default)]
pub(crate) struct ListenerRegistry {
    listeners: HashMap<CommandId, Vec<ResponseHandler>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    /// Replaces the whole handler list for `cmd` with a single registration.
    ///
    /// Returns whether an existing list was displaced.
    pub(crate) fn set(&mut self, cmd: CommandId, handler: ResponseHandler) -> bool {
        self.listeners.insert(cmd, vec![handler]).is_some()
    }

    /// Appends a registration unless an identity-equal one already exists.
    ///
    /// Returns whether the handler was newly added.
    pub(crate) fn add(&mut self, cmd: CommandId, handler: ResponseHandler) -> bool {
        let handlers = self.listeners.entry(cmd).or_default();
        if handlers
            .iter()
            .any(|h| h.is_same(&handler.callback, handler.target))
        {
            return false;
        }
        handlers.push(handler);
        true
    }

    /// Removes the first identity-equal registration for `cmd`, if present.
    pub(crate) fn remove(
        &mut self,
        cmd: CommandId,
        callback: &ResponseCallback,
        target: Option<SubscriberId>,
    ) {
        if let Some(handlers) = self.listeners.get_mut(&cmd)
            && let Some(index) = handlers.iter().position(|h| h.is_same(callback, target))
        {
            handlers.remove(index);
        }
    }

    /// Returns the handlers registered for `cmd`, in registration order.
    pub(crate) fn handlers_for(&self, cmd: CommandId) -> Vec<ResponseHandler> {
        self.listeners.get(&cmd).cloned().unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }

    #[cfg(test)]
    pub(crate) fn count_for(&self, cmd: CommandId) -> usize {
        self.listeners.get(&cmd).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback() -> ResponseCallback {
        Arc::new(|_cmd, _payload| {})
    }

    #[test]
    fn test_set_replaces_whole_list() {
        let mut registry = ListenerRegistry::new();
        let cmd = CommandId::new(5);

        assert!(!registry.set(cmd, ResponseHandler::new(callback(), None)));
        registry.add(cmd, ResponseHandler::new(callback(), None));
        assert_eq!(registry.count_for(cmd), 2);

        assert!(registry.set(cmd, ResponseHandler::new(callback(), None)));
        assert_eq!(registry.count_for(cmd), 1);
    }

    #[test]
    fn test_add_deduplicates_by_identity() {
        let mut registry = ListenerRegistry::new();
        let cmd = CommandId::new(5);
        let cb = callback();
        let target = Some(SubscriberId::new(9));

        assert!(registry.add(cmd, ResponseHandler::new(Arc::clone(&cb), target)));
        assert!(!registry.add(cmd, ResponseHandler::new(Arc::clone(&cb), target)));
        assert_eq!(registry.count_for(cmd), 1);

        // Same callback under a different token is a distinct registration.
        assert!(registry.add(
            cmd,
            ResponseHandler::new(Arc::clone(&cb), Some(SubscriberId::new(10)))
        ));
        assert_eq!(registry.count_for(cmd), 2);
    }

    #[test]
    fn test_absent_target_is_wildcard() {
        let mut registry = ListenerRegistry::new();
        let cmd = CommandId::new(3);
        let cb = callback();

        registry.add(
            cmd,
            ResponseHandler::new(Arc::clone(&cb), Some(SubscriberId::new(1))),
        );

        // Probe without a token matches the tokened registration.
        assert!(!registry.add(cmd, ResponseHandler::new(Arc::clone(&cb), None)));

        registry.remove(cmd, &cb, None);
        assert_eq!(registry.count_for(cmd), 0);
    }

    #[test]
    fn test_remove_requires_matching_identity() {
        let mut registry = ListenerRegistry::new();
        let cmd = CommandId::new(3);
        let cb = callback();
        let other = callback();

        registry.add(cmd, ResponseHandler::new(Arc::clone(&cb), None));
        registry.remove(cmd, &other, None);
        assert_eq!(registry.count_for(cmd), 1);

        registry.remove(cmd, &cb, None);
        assert_eq!(registry.count_for(cmd), 0);
    }

    #[test]
    fn test_handlers_for_preserves_registration_order() {
        let mut registry = ListenerRegistry::new();
        let cmd = CommandId::new(2);
        let first = callback();
        let second = callback();

        registry.add(cmd, ResponseHandler::new(Arc::clone(&first), None));
        registry.add(cmd, ResponseHandler::new(Arc::clone(&second), None));

        let handlers = registry.handlers_for(cmd);
        assert_eq!(handlers.len(), 2);
        assert!(Arc::ptr_eq(&handlers[0].callback, &first));
        assert!(Arc::ptr_eq(&handlers[1].callback, &second));
    }
}
