//! Live poll registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::poll::{Poll, PollId};

/// A registered poll plus the watcher generations current at registration.
pub(crate) struct Registered {
    pub(crate) poll: Arc<Poll>,
    /// Indexed like the coordinator's watcher list.
    pub(crate) generations: Vec<u64>,
}

impl Registered {
    /// Whether a change at `generation` of watcher `index` happened after
    /// this poll was registered.
    pub(crate) fn precedes(&self, index: usize, generation: u64) -> bool {
        self.generations.get(index).map_or(true, |seen| *seen < generation)
    }
}

/// Set of outstanding polls. Always accessed under the coordinator's mutex.
#[derive(Default)]
pub(crate) struct PollRegistry {
    polls: HashMap<PollId, Registered>,
}

impl PollRegistry {
    pub(crate) fn insert(&mut self, poll: Arc<Poll>, generations: Vec<u64>) {
        self.polls.insert(poll.id(), Registered { poll, generations });
    }

    pub(crate) fn remove(&mut self, id: PollId) -> bool {
        self.polls.remove(&id).is_some()
    }

    pub(crate) fn contains(&self, id: PollId) -> bool {
        self.polls.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.polls.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Registered> {
        self.polls.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_precedes() {
        let poll = Poll::create(Vec::new(), Duration::from_secs(1), CancellationToken::new());
        let entry = Registered {
            poll,
            generations: vec![3, 0],
        };
        assert!(!entry.precedes(0, 3));
        assert!(entry.precedes(0, 4));
        assert!(entry.precedes(1, 1));
        // A watcher unknown at registration time counts as newer.
        assert!(entry.precedes(2, 0));
    }

    #[tokio::test]
    async fn test_insert_remove() {
        let mut registry = PollRegistry::default();
        let poll = Poll::create(Vec::new(), Duration::from_secs(1), CancellationToken::new());
        let id = poll.id();
        registry.insert(poll, vec![0]);
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.len(), 0);
    }
}
