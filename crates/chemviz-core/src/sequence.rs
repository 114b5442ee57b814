//! Per-operation request sequencing.
//!
//! Every issued request gets a ticket with a monotonically increasing number
//! for its kind. A response is applied only while its ticket is still the
//! latest for that kind, so a slow response never overwrites a newer one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Login,
    History,
    Upload,
    Report,
}

/// Proof that a request was issued; redeemed when its response arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    kind: RequestKind,
    seq: u64,
}

impl RequestTicket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: HashMap<RequestKind, u64>,
    counter: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, kind: RequestKind) -> RequestTicket {
        self.counter += 1;
        self.latest.insert(kind, self.counter);
        RequestTicket {
            kind,
            seq: self.counter,
        }
    }

    /// Whether `ticket` is the most recent one issued for its kind.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.get(&ticket.kind) == Some(&ticket.seq)
    }

    /// Makes every outstanding ticket stale.
    pub fn invalidate_all(&mut self) {
        self.latest.clear();
    }

    /// Number of tickets issued so far across all kinds.
    pub fn issued(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_ticket_wins() {
        let mut sequencer = RequestSequencer::new();
        let first = sequencer.issue(RequestKind::History);
        let second = sequencer.issue(RequestKind::History);

        assert!(!sequencer.is_current(&first));
        assert!(sequencer.is_current(&second));
    }

    #[test]
    fn kinds_are_independent() {
        let mut sequencer = RequestSequencer::new();
        let history = sequencer.issue(RequestKind::History);
        let upload = sequencer.issue(RequestKind::Upload);

        assert!(sequencer.is_current(&history));
        assert!(sequencer.is_current(&upload));
        assert!(upload.seq() > history.seq());
        assert_eq!(sequencer.issued(), 2);
    }

    #[test]
    fn invalidate_all_stales_outstanding_tickets() {
        let mut sequencer = RequestSequencer::new();
        let ticket = sequencer.issue(RequestKind::Report);
        sequencer.invalidate_all();

        assert!(!sequencer.is_current(&ticket));

        // Numbers keep increasing after invalidation.
        let next = sequencer.issue(RequestKind::Report);
        assert!(next.seq() > ticket.seq());
        assert!(sequencer.is_current(&next));
        assert_eq!(sequencer.issued(), 2);
    }
}
