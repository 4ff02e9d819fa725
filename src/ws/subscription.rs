//! Per-connection subscription manager.
//!
//! Tracks which event topics a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::BTreeSet;

/// Topics a client may subscribe to, matching [`crate::domain::EngineEvent::topic`].
pub const TOPICS: [&str; 4] = ["match", "changes", "pool", "synergies"];

/// Manages the set of topic subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed topics. If `subscribe_all` is true, this set is ignored.
    topics: BTreeSet<&'static str>,
    /// Whether the client subscribes to every topic (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds topics to the subscription set. `"*"` enables the wildcard.
    ///
    /// Returns the names that were not recognised.
    pub fn subscribe<'a>(&mut self, names: &'a [String]) -> Vec<&'a str> {
        let mut unknown = Vec::new();
        for name in names {
            if name == "*" {
                self.subscribe_all = true;
            } else if let Some(topic) = canonical(name) {
                self.topics.insert(topic);
            } else {
                unknown.push(name.as_str());
            }
        }
        unknown
    }

    /// Removes topics from the subscription set. `"*"` clears everything.
    pub fn unsubscribe(&mut self, names: &[String]) {
        for name in names {
            if name == "*" {
                self.subscribe_all = false;
                self.topics.clear();
            } else if let Some(topic) = canonical(name) {
                self.topics.remove(topic);
            }
        }
    }

    /// Returns `true` if events of the given topic should be forwarded.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        self.subscribe_all || self.topics.contains(topic)
    }

    /// Explicitly subscribed topics.
    #[must_use]
    pub fn topics(&self) -> Vec<&'static str> {
        self.topics.iter().copied().collect()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

fn canonical(name: &str) -> Option<&'static str> {
    TOPICS.iter().copied().find(|t| t.eq_ignore_ascii_case(name))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches("pool"));
    }

    #[test]
    fn subscribe_specific_topic() {
        let mut mgr = SubscriptionManager::new();
        let requested = names(&["Pool", "board"]);
        let unknown = mgr.subscribe(&requested);
        assert_eq!(unknown, vec!["board"]);
        assert!(mgr.matches("pool"));
        assert!(!mgr.matches("changes"));
        assert_eq!(mgr.topics(), vec!["pool"]);
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&names(&["*"]));
        assert!(TOPICS.iter().all(|t| mgr.matches(t)));
    }

    #[test]
    fn unsubscribe_removes_topic() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&names(&["changes", "match"]));
        mgr.unsubscribe(&names(&["changes"]));
        assert!(!mgr.matches("changes"));
        assert!(mgr.matches("match"));

        mgr.subscribe(&names(&["*"]));
        mgr.unsubscribe(&names(&["*"]));
        assert!(!mgr.matches("match"));
        assert!(!mgr.is_subscribed_all());
    }
}
