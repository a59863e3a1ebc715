//! Single-value observable cells.
//!
//! Each cell keeps its current value and notifies subscribers on every
//! publish. A subscriber that attaches late immediately sees the last
//! published value, which is what UI observers re-attaching after a
//! configuration change rely on.

use std::fmt;
use tokio::sync::watch;

/// Broadcast-on-change value cell with current-value retention
pub struct Observable<T> {
    sender: watch::Sender<Option<T>>,
}

impl<T> Observable<T>
where
    T: Clone,
{
    /// Create a cell with no value yet
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Create a cell holding an initial value
    pub fn with_value(value: T) -> Self {
        let (sender, _) = watch::channel(Some(value));
        Self { sender }
    }

    /// Current value, if one was ever published
    pub fn get(&self) -> Option<T> {
        self.sender.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Publish a value, notifying every subscriber
    pub fn set(&self, value: T) {
        self.sender.send_replace(Some(value));
    }

    /// Publish `value` only when the cell is still empty.
    /// Returns whether the value was published.
    pub fn set_if_unset(&self, value: T) -> bool {
        self.sender.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(value);
                true
            } else {
                false
            }
        })
    }

    /// Publish `value` only when `predicate` accepts the current value.
    /// The check and the publish happen under the same borrow.
    pub fn set_if<F>(&self, value: T, predicate: F) -> bool
    where
        F: FnOnce(Option<&T>) -> bool,
    {
        self.sender.send_if_modified(|current| {
            if predicate(current.as_ref()) {
                *current = Some(value);
                true
            } else {
                false
            }
        })
    }

    /// Re-notify subscribers with the value already held.
    /// Does nothing when the cell is empty.
    pub fn republish(&self) -> bool {
        self.sender.send_if_modified(|current| current.is_some())
    }

    /// Subscribe to changes; the receiver starts at the current value
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observable").field(&*self.sender.borrow()).finish()
    }
}
