//! Lifecycle hook registry.
//!
//! A per-facade table of callbacks fired before/after open, close and query
//! operations. Registrations are identified by [`HookId`] subscription
//! handles, so unhooking is precise and independent registrations of the
//! same closure never collide.
//!
//! Callbacks run synchronously on the calling thread, in registration
//! order, before control returns to the facade operation that fired them.
//! They are trusted code: a callback returning `Err` propagates, aborting
//! the remaining callbacks and the enclosing operation.

use crate::error::Result;
use std::collections::HashMap;

/// Callback signature: `(action, data)` where `data` is the SQL text for
/// query events and `None` for open/close events.
pub type HookFn = Box<dyn FnMut(&str, Option<&str>) -> Result<()>>;

/// Subscription handle returned by [`HookRegistry::hook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Whether a hook fires before or after its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fires before the action
    Pre,
    /// Fires after the action succeeded
    Post,
}

impl Phase {
    /// The event-name prefix for this phase.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Post => "post",
        }
    }
}

/// Process-local (per-facade) table of named event subscriptions.
#[derive(Default)]
pub struct HookRegistry {
    next_id: u64,
    events: HashMap<String, Vec<(HookId, HookFn)>>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `event` (e.g. `"pre_query"`).
    ///
    /// Every registration is independent; registering the same closure
    /// twice fires it twice.
    pub fn hook(
        &mut self,
        event: &str,
        callback: impl FnMut(&str, Option<&str>) -> Result<()> + 'static,
    ) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        self.events
            .entry(event.to_string())
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    /// Remove one registration from whichever event holds it.
    /// No-op if the handle is absent.
    pub fn unhook(&mut self, id: HookId) {
        for callbacks in self.events.values_mut() {
            callbacks.retain(|(existing, _)| *existing != id);
        }
    }

    /// Remove every callback registered under `event`.
    /// No-op if the event is absent.
    pub fn unhook_event(&mut self, event: &str) {
        self.events.remove(event);
    }

    /// Remove all hooks from all events.
    pub fn unhook_all(&mut self) {
        self.events.clear();
    }

    /// Number of callbacks registered under `event`.
    pub fn count(&self, event: &str) -> usize {
        self.events.get(event).map_or(0, Vec::len)
    }

    /// Fire the `{phase}_{action}` event, invoking each callback with
    /// `(action, data)` in registration order.
    pub fn trigger(&mut self, phase: Phase, action: &str, data: Option<&str>) -> Result<()> {
        let event = format!("{}_{}", phase.as_str(), action);
        if let Some(callbacks) = self.events.get_mut(&event) {
            tracing::trace!(event = %event, count = callbacks.len(), "firing hooks");
            for (_, callback) in callbacks.iter_mut() {
                callback(action, data)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &str) -> impl FnMut(&str, Option<&str>) -> Result<()> + 'static {
        let log = Rc::clone(log);
        let tag = tag.to_string();
        move |action, data| {
            log.borrow_mut()
                .push(format!("{tag}:{action}:{}", data.unwrap_or("-")));
            Ok(())
        }
    }

    #[test]
    fn fires_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry.hook("post_query", recorder(&log, "first"));
        registry.hook("post_query", recorder(&log, "second"));

        registry
            .trigger(Phase::Post, "query", Some("SELECT 1"))
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["first:query:SELECT 1", "second:query:SELECT 1"]
        );
    }

    #[test]
    fn unknown_event_is_noop() {
        let mut registry = HookRegistry::new();
        registry.trigger(Phase::Pre, "open", None).unwrap();
        registry.unhook_event("pre_open");
        registry.unhook(HookId(99));
    }

    #[test]
    fn unhook_by_id_is_precise() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        let first = registry.hook("pre_query", recorder(&log, "first"));
        registry.hook("pre_query", recorder(&log, "second"));

        registry.unhook(first);
        registry.trigger(Phase::Pre, "query", Some("x")).unwrap();

        assert_eq!(*log.borrow(), vec!["second:query:x"]);
    }

    #[test]
    fn unhook_event_leaves_other_events() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry.hook("post_query", recorder(&log, "post"));
        registry.hook("pre_query", recorder(&log, "pre"));

        registry.unhook_event("post_query");
        assert_eq!(registry.count("post_query"), 0);
        assert_eq!(registry.count("pre_query"), 1);

        registry.trigger(Phase::Post, "query", Some("x")).unwrap();
        registry.trigger(Phase::Pre, "query", Some("x")).unwrap();
        assert_eq!(*log.borrow(), vec!["pre:query:x"]);
    }

    #[test]
    fn unhook_all_clears_everything() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry.hook("pre_open", recorder(&log, "a"));
        registry.hook("post_close", recorder(&log, "b"));

        registry.unhook_all();
        registry.trigger(Phase::Pre, "open", None).unwrap();
        registry.trigger(Phase::Post, "close", None).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn failing_callback_aborts_remaining() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry.hook("pre_query", |_, _| Err(Error::internal("boom")));
        registry.hook("pre_query", recorder(&log, "never"));

        let err = registry.trigger(Phase::Pre, "query", Some("x")).unwrap_err();
        assert_eq!(err.message(), "boom");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn same_closure_registered_twice_fires_twice() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        let a = registry.hook("post_open", recorder(&log, "x"));
        let b = registry.hook("post_open", recorder(&log, "x"));
        assert_ne!(a, b);

        registry.trigger(Phase::Post, "open", None).unwrap();
        assert_eq!(log.borrow().len(), 2);
    }
}
