//! Generation tickets for screen fetches.
//!
//! Each fetch carries a [`FetchTicket`]. Issuing a new ticket for a screen,
//! or leaving that screen, makes every older ticket stale, and responses
//! holding a stale ticket are dropped before they touch the model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKey {
    ActiveOrders,
    OrderDetail,
    Unit,
    Apartments,
    Building,
    Cleaners,
    Cleaner,
    CleanerDropOff,
    CleanerPickups,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchTicket {
    pub screen: ScreenKey,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct FetchTracker {
    current: HashMap<ScreenKey, u64>,
    next: u64,
}

impl FetchTracker {
    /// Starts a new fetch round for `screen`, superseding earlier ones.
    pub fn issue(&mut self, screen: ScreenKey) -> FetchTicket {
        self.next += 1;
        self.current.insert(screen, self.next);
        FetchTicket {
            screen,
            generation: self.next,
        }
    }

    #[must_use]
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.current.get(&ticket.screen) == Some(&ticket.generation)
    }

    /// Returns whether a response may be applied, logging the ones dropped.
    pub fn accept(&self, ticket: FetchTicket, what: &'static str) -> bool {
        let current = self.is_current(ticket);
        if !current {
            debug!(
                screen = ?ticket.screen,
                generation = ticket.generation,
                response = what,
                "dropping stale response"
            );
        }
        current
    }

    /// Leaving `screen` makes its outstanding tickets stale.
    pub fn invalidate(&mut self, screen: ScreenKey) {
        self.current.remove(&screen);
    }

    pub fn invalidate_all(&mut self) {
        self.current.clear();
    }
}
