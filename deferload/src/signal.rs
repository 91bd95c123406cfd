//! Reactive state cells backed by `tokio::sync::watch`.
//!
//! The loading components expose their state as read-only signals: a reader
//! either polls the current value synchronously with [`Signal::get`] or
//! awaits changes on a subscribed [`watch::Receiver`]. The contract is that
//! state changes are visible to readers after the owning operation
//! completes; the propagation mechanism itself is an implementation detail.
//!
//! # Example
//!
//! ```
//! use deferload::signal::Signal;
//!
//! let signal = Signal::new(false);
//! assert!(!signal.get());
//!
//! signal.set(true);
//! assert!(signal.get());
//! ```

use tokio::sync::watch;

/// A writable state cell whose readers observe the latest value.
///
/// Writers call [`set`](Signal::set); readers either poll [`get`](Signal::get)
/// or hold a [`watch::Receiver`] from [`subscribe`](Signal::subscribe) and
/// await `changed()`. The cell keeps its own receiver alive so writes never
/// fail, even with no external subscribers.
#[derive(Debug)]
pub struct Signal<T> {
    tx: watch::Sender<T>,
    // Held so the channel stays open with zero external subscribers.
    _rx: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Creates a signal holding the given initial value.
    pub fn new(initial: T) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self { tx, _rx: rx }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replaces the current value, notifying subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Returns a receiver that observes every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
