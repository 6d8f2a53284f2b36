//! Win notification owned by a single director instance.

use std::fmt;

use wave_director_core::{Event, WinCause};

/// Handle returned by [`OutcomeSignal::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u32);

impl ListenerId {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

type Listener = Box<dyn FnMut(WinCause)>;

/// Registry of win listeners plus the fired-once latch.
#[derive(Default)]
pub struct OutcomeSignal {
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u32,
    won: bool,
}

impl OutcomeSignal {
    /// Registers a listener invoked every time the signal fires.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(WinCause) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener = self.next_listener.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` when the handle is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(candidate, _)| *candidate != id);
        self.listeners.len() != before
    }

    /// Reports whether the match has been won.
    #[must_use]
    pub const fn has_fired(&self) -> bool {
        self.won
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Fires for a natural win. Does nothing once the signal has fired.
    pub(crate) fn fire_once(&mut self, cause: WinCause, out_events: &mut Vec<Event>) -> bool {
        if self.won {
            return false;
        }
        self.fire(cause, out_events);
        true
    }

    /// Fires unconditionally.
    pub(crate) fn fire(&mut self, cause: WinCause, out_events: &mut Vec<Event>) {
        self.won = true;
        for (_, listener) in &mut self.listeners {
            listener(cause);
        }
        out_events.push(Event::GameWon { cause });
    }
}

impl fmt::Debug for OutcomeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeSignal")
            .field("listeners", &self.listeners.len())
            .field("won", &self.won)
            .finish()
    }
}
