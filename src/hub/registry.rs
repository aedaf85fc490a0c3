//! Subscriber Registry
//!
//! Membership set of attached subscribers, keyed by identity. Holding a
//! subscriber here never keeps its stream open or closes it; the owning
//! connection decides that.

use std::collections::HashMap;

use super::subscriber::{Subscriber, SubscriberId};

/// Set of currently attached subscribers
#[derive(Default)]
pub struct SubscriberRegistry {
    members: HashMap<SubscriberId, Subscriber>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber
    ///
    /// Returns `false` if a subscriber with the same identity was already
    /// registered, in which case nothing changes.
    pub fn register(&mut self, subscriber: Subscriber) -> bool {
        if self.members.contains_key(subscriber.id()) {
            return false;
        }
        self.members.insert(*subscriber.id(), subscriber);
        true
    }

    /// Remove a subscriber, returning it if it was present
    pub fn unregister(&mut self, id: &SubscriberId) -> Option<Subscriber> {
        self.members.remove(id)
    }

    /// Apply `action` to every subscriber registered at call time
    ///
    /// Iterates over a snapshot, so the registry may be changed between
    /// visits without skipping or repeating anyone.
    pub fn for_each<F>(&self, mut action: F)
    where
        F: FnMut(&Subscriber),
    {
        for subscriber in self.snapshot() {
            action(&subscriber);
        }
    }

    /// Clone of the current membership
    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.members.values().cloned().collect()
    }

    /// Remove and return every subscriber
    pub fn drain(&mut self) -> Vec<Subscriber> {
        self.members.drain().map(|(_, s)| s).collect()
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::sink::ChannelSink;

    fn subscriber() -> Subscriber {
        let (sink, _rx) = ChannelSink::new(4);
        Subscriber::new(sink)
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = SubscriberRegistry::new();
        let sub = subscriber();

        assert!(registry.register(sub.clone()));
        assert!(!registry.register(sub.clone()));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(sub.id()));
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut registry = SubscriberRegistry::new();
        let sub = subscriber();
        registry.register(sub.clone());

        assert!(registry.unregister(sub.id()).is_some());
        assert!(registry.unregister(sub.id()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_identity_not_fields() {
        let mut registry = SubscriberRegistry::new();
        registry.register(subscriber());
        registry.register(subscriber());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_for_each_visits_snapshot() {
        let mut registry = SubscriberRegistry::new();
        let subs: Vec<_> = (0..3).map(|_| subscriber()).collect();
        for sub in &subs {
            registry.register(sub.clone());
        }

        let mut visited = Vec::new();
        registry.for_each(|s| visited.push(*s.id()));
        visited.sort_by_key(|id| id.to_string());

        let mut expected: Vec<_> = subs.iter().map(|s| *s.id()).collect();
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_mutation_after_snapshot() {
        let mut registry = SubscriberRegistry::new();
        let subs: Vec<_> = (0..3).map(|_| subscriber()).collect();
        for sub in &subs {
            registry.register(sub.clone());
        }

        // Unregister members while walking a snapshot of them
        let mut visited = 0;
        for sub in registry.snapshot() {
            visited += 1;
            registry.unregister(sub.id());
        }

        assert_eq!(visited, 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drain() {
        let mut registry = SubscriberRegistry::new();
        registry.register(subscriber());
        registry.register(subscriber());

        assert_eq!(registry.drain().len(), 2);
        assert!(registry.is_empty());
    }
}
