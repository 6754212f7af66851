//! Clock abstraction so callers and tests control "now".

use crate::model::calendar::Instant;
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        chrono::Local::now().naive_local()
    }
}

/// Manually driven clock.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<Instant>,
}

impl FixedClock {
    pub fn new(now: Instant) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: Instant) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
