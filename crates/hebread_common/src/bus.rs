//! In-process event bus.
//!
//! Registry of event name -> ordered handler list with synchronous dispatch.
//! Each handler runs in isolation: an `Err` or a panic in one subscriber is
//! logged and delivery continues with the next one.
//!
//! ```text
//! +----------------+  emit   +----------+  on()  +---------------------+
//! | MasteryEngine  | ------> | EventBus | -----> | celebrate/highlight |
//! +----------------+         +----------+        +---------------------+
//! ```

use crate::state::LetterRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Names of the events the core originates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    LetterProgress,
    BadgeUnlocked,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::LetterProgress => "letterProgress",
            EventName::BadgeUnlocked => "badgeUnlocked",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoreEvent {
    LetterProgress {
        letter_id: String,
        record: LetterRecord,
    },
    BadgeUnlocked {
        name: String,
    },
}

impl CoreEvent {
    pub fn name(&self) -> EventName {
        match self {
            CoreEvent::LetterProgress { .. } => EventName::LetterProgress,
            CoreEvent::BadgeUnlocked { .. } => EventName::BadgeUnlocked,
        }
    }
}

/// Handle returned by `on`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Handler = Arc<dyn Fn(&CoreEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<EventName, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `name`; it stays active until `off`
    pub fn on<F>(&self, name: EventName, handler: F) -> SubscriptionId
    where
        F: Fn(&CoreEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.entry(name).or_default().push((id, Arc::new(handler)));
        }
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let Ok(mut handlers) = self.handlers.lock() else {
            return false;
        };
        for list in handlers.values_mut() {
            if let Some(pos) = list.iter().position(|(sid, _)| *sid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Dispatch `event` to every current subscriber, in registration order.
    /// Returns how many handlers completed without error.
    pub fn emit(&self, event: &CoreEvent) -> usize {
        let name = event.name();
        // Snapshot so handlers may subscribe/unsubscribe while we dispatch
        let snapshot: Vec<(SubscriptionId, Handler)> = match self.handlers.lock() {
            Ok(handlers) => handlers.get(&name).cloned().unwrap_or_default(),
            Err(_) => {
                warn!(event = %name, "[bus] handler registry poisoned, dropping event");
                return 0;
            }
        };

        let mut delivered = 0;
        for (id, handler) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| (*handler)(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(event = %name, subscriber = id.0, "[bus] handler failed: {:#}", e)
                }
                Err(_) => warn!(event = %name, subscriber = id.0, "[bus] handler panicked"),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers
            .lock()
            .map(|h| h.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(name: &str) -> CoreEvent {
        CoreEvent::BadgeUnlocked {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(EventName::LetterProgress.as_str(), "letterProgress");
        assert_eq!(EventName::BadgeUnlocked.to_string(), "badgeUnlocked");
        assert_eq!(badge("x").name(), EventName::BadgeUnlocked);
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            bus.on(EventName::BadgeUnlocked, move |_| {
                seen.lock().unwrap().push(tag);
                Ok(())
            });
        }
        assert_eq!(bus.emit(&badge("x")), 3);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_only_matching_name_receives() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));
        let h = Arc::clone(&hits);
        bus.on(EventName::LetterProgress, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(bus.emit(&badge("x")), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failing_handlers_are_isolated() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));

        bus.on(EventName::BadgeUnlocked, |_| anyhow::bail!("subscriber error"));
        bus.on(EventName::BadgeUnlocked, |_| panic!("subscriber panic"));
        let h = Arc::clone(&hits);
        bus.on(EventName::BadgeUnlocked, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(bus.emit(&badge("x")), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off_unsubscribes() {
        let bus = EventBus::new();
        let id = bus.on(EventName::BadgeUnlocked, |_| Ok(()));
        assert_eq!(bus.subscriber_count(), 1);
        assert!(bus.off(id));
        assert!(!bus.off(id));
        assert_eq!(bus.emit(&badge("x")), 0);
    }

    #[test]
    fn test_handler_may_subscribe_during_dispatch() {
        let bus = Arc::new(EventBus::new());
        let inner = Arc::clone(&bus);
        bus.on(EventName::BadgeUnlocked, move |_| {
            inner.on(EventName::BadgeUnlocked, |_| Ok(()));
            Ok(())
        });
        assert_eq!(bus.emit(&badge("x")), 1);
        assert_eq!(bus.subscriber_count(), 2);
    }
}
