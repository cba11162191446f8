//! A registered connection's identity and handoff state.
//!
//! Deliberately thin: the backend driver and its state live on the event
//! loop's stack, not here, so a connection's registry entry carries nothing
//! the loop doesn't already own a strong reference to.

use std::sync::Arc;

use uuid::Uuid;

use crate::handoff::HandoffSlot;

pub struct Connection {
    pub id: Uuid,
    pub handoff: HandoffSlot,
}

impl Connection {
    pub fn new() -> Arc<Self> {
        Arc::new(Connection {
            id: Uuid::new_v4(),
            handoff: HandoffSlot::new(),
        })
    }
}
