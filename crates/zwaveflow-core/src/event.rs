/*!
 * Typed listener registries.
 *
 * A `ListenerSet` owns a list of listeners of one trait object type and
 * notifies them in registration order. Components that emit notifications
 * hold their own set instead of going through a process-wide bus.
 */
use std::fmt;

use tracing::trace;

/// Handle returned by [`ListenerSet::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// An ordered set of listeners
pub struct ListenerSet<L: ?Sized> {
    next_id: u64,
    listeners: Vec<(ListenerId, Box<L>)>,
}

impl<L: ?Sized> ListenerSet<L> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a listener, returning a handle for later removal
    pub fn register(&mut self, listener: Box<L>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        trace!("Registered listener {:?}", id);
        id
    }

    /// Remove a listener, handing it back to the caller
    pub fn unregister(&mut self, id: ListenerId) -> Option<Box<L>> {
        let position = self.listeners.iter().position(|(lid, _)| *lid == id)?;
        trace!("Unregistered listener {:?}", id);
        Some(self.listeners.remove(position).1)
    }

    /// Call `f` on every listener in registration order
    ///
    /// Returns the number of listeners notified.
    pub fn notify<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&mut L),
    {
        for (_, listener) in self.listeners.iter_mut() {
            f(listener.as_mut());
        }
        self.listeners.len()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for ListenerSet<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    trait Counter: Send {
        fn bump(&mut self, by: u32);
    }

    struct Shared(Arc<Mutex<Vec<(&'static str, u32)>>>, &'static str);

    impl Counter for Shared {
        fn bump(&mut self, by: u32) {
            self.0.lock().unwrap().push((self.1, by));
        }
    }

    #[test]
    fn test_notify_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut set: ListenerSet<dyn Counter> = ListenerSet::new();
        set.register(Box::new(Shared(log.clone(), "a")));
        set.register(Box::new(Shared(log.clone(), "b")));

        assert_eq!(set.notify(|l| l.bump(3)), 2);
        assert_eq!(*log.lock().unwrap(), vec![("a", 3), ("b", 3)]);
    }

    #[test]
    fn test_unregister() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut set: ListenerSet<dyn Counter> = ListenerSet::default();
        let a = set.register(Box::new(Shared(log.clone(), "a")));
        set.register(Box::new(Shared(log.clone(), "b")));

        assert!(set.unregister(a).is_some());
        assert!(set.unregister(a).is_none());
        assert_eq!(set.len(), 1);

        set.notify(|l| l.bump(1));
        assert_eq!(*log.lock().unwrap(), vec![("b", 1)]);
    }

    #[test]
    fn test_empty_set() {
        let mut set: ListenerSet<dyn Counter> = ListenerSet::new();
        assert!(set.is_empty());
        assert_eq!(set.notify(|l| l.bump(1)), 0);
        assert_eq!(format!("{:?}", set), "ListenerSet { listeners: 0 }");
    }
}
