//! `requests_sent`/`requests_answered` — one pair shared by every
//! collaborator that talks to the index server (subscribe, history fetch,
//! tx fetch), mirroring the original's single pair of instance counters on
//! `SynchronizerBase` rather than one pair per component (§3, §9).

use std::cell::Cell;

#[derive(Default)]
pub struct Counters {
    sent: Cell<u64>,
    answered: Cell<u64>,
}

impl Counters {
    pub fn inc_sent(&self) {
        self.sent.set(self.sent.get() + 1);
    }

    pub fn inc_answered(&self) {
        self.answered.set(self.answered.get() + 1);
    }

    pub fn reset(&self) {
        self.sent.set(0);
        self.answered.set(0);
    }

    pub fn snapshot(&self) -> (u64, u64) {
        (self.sent.get(), self.answered.get())
    }
}
