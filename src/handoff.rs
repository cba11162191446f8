//! The handoff signal: a binary {owned, released} primitive plus a one-slot
//! mailbox for the replacement stream.
//!
//! This replaces a binary semaphore with a `Mutex` + `Condvar`
//! rendezvous (`pause` releases without blocking, `resume` blocks on
//! released→owned) and a separate mailbox the owning loop drains on its own
//! schedule — a message, not a raw pointer swap, removing the transient
//! window in which two loops could observe different streams for the same
//! connection.

use std::net::TcpStream;
use std::sync::{Condvar, Mutex};

use crate::stream::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandoffState {
    Owned,
    Released,
}

pub struct HandoffSlot {
    state: Mutex<HandoffState>,
    cond: Condvar,
    mailbox: Mutex<Option<Stream<TcpStream>>>,
}

impl HandoffSlot {
    pub fn new() -> Self {
        HandoffSlot {
            state: Mutex::new(HandoffState::Owned),
            cond: Condvar::new(),
            mailbox: Mutex::new(None),
        }
    }

    /// owned → released, non-blocking. Called by the owning event loop when
    /// it processes a `pause` instruction.
    pub fn pause(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = HandoffState::Released;
        self.cond.notify_all();
    }

    /// Blocks until the slot is `Released`, then deposits `new_stream` in
    /// the mailbox and flips the slot back to `Owned`. Called by the
    /// handoff coordinator handling a `resume` handshake; the new socket
    /// cannot proceed until the prior loop reaches a `pause`.
    pub fn resume(&self, new_stream: Stream<TcpStream>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        while *state == HandoffState::Owned {
            state = self.cond.wait(state).unwrap_or_else(|e| e.into_inner());
        }
        *state = HandoffState::Owned;
        drop(state);

        let mut mailbox = self.mailbox.lock().unwrap_or_else(|e| e.into_inner());
        *mailbox = Some(new_stream);
    }

    /// Drains a pending stream swap, if any. Called by the owning loop at
    /// the top of every iteration.
    pub fn take_pending(&self) -> Option<Stream<TcpStream>> {
        let mut mailbox = self.mailbox.lock().unwrap_or_else(|e| e.into_inner());
        mailbox.take()
    }
}

impl Default for HandoffSlot {
    fn default() -> Self {
        Self::new()
    }
}
