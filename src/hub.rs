//! Single-threaded event dispatch with explicit subscriptions.
//!
//! [`EventHub`] plays the role of the compositor stage's captured-event
//! signal: every [`SwipeEvent`] is offered to subscribers in subscription
//! order until one of them returns [`Propagation::Stop`].
//!
//! Subscribing yields a [`Subscription`] handle.  Dropping the handle or
//! calling [`Subscription::release`] detaches the handler; releasing twice is
//! a no-op.  A handler released while an event is being dispatched is not
//! called for the remainder of that dispatch.

use crate::event::{Propagation, SwipeEvent};
use log::{debug, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Handler = Rc<RefCell<dyn FnMut(&SwipeEvent) -> Propagation>>;

struct Slot {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct Slots {
    next_id: u64,
    entries: Vec<Slot>,
}

impl Slots {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|s| s.id == id)
    }
}

/// Fan-out point between an event source and its recognizers.
#[derive(Default)]
pub struct EventHub {
    slots: Rc<RefCell<Slots>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` behind every existing subscriber.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&SwipeEvent) -> Propagation + 'static,
    {
        let mut slots = self.slots.borrow_mut();
        let id = slots.next_id;
        slots.next_id += 1;
        let handler: Handler = Rc::new(RefCell::new(handler));
        slots.entries.push(Slot { id, handler });
        debug!("subscription {} attached", id);
        Subscription {
            id,
            slots: Rc::downgrade(&self.slots),
            released: false,
        }
    }

    /// Offer `event` to each subscriber in order.
    ///
    /// Returns [`Propagation::Stop`] as soon as a subscriber consumes the
    /// event, otherwise [`Propagation::Propagate`].
    pub fn dispatch(&self, event: &SwipeEvent) -> Propagation {
        let snapshot: Vec<(u64, Handler)> = self
            .slots
            .borrow()
            .entries
            .iter()
            .map(|s| (s.id, s.handler.clone()))
            .collect();

        for (id, handler) in snapshot {
            if !self.slots.borrow().contains(id) {
                continue;
            }
            let result = match handler.try_borrow_mut() {
                Ok(mut h) => (&mut *h)(event),
                Err(_) => {
                    warn!("subscription {} re-entered during dispatch, skipping", id);
                    continue;
                }
            };
            if result.is_stop() {
                return Propagation::Stop;
            }
        }
        Propagation::Propagate
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.slots.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to one hub registration.  Detaches on release or drop.
pub struct Subscription {
    id: u64,
    slots: Weak<RefCell<Slots>>,
    released: bool,
}

impl Subscription {
    /// Detach from the hub.  Returns `true` only on the first call.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        if let Some(slots) = self.slots.upgrade() {
            slots.borrow_mut().entries.retain(|s| s.id != self.id);
            debug!("subscription {} released", self.id);
        }
        true
    }

    pub fn is_active(&self) -> bool {
        !self.released && self.slots.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

//  Tests
