use std::sync::atomic::{AtomicU64, Ordering};

/// A generation counter. Work started under an older generation must not overwrite state owned by a newer one.
#[derive(Debug, Default)]
pub struct Epoch {
    current: AtomicU64,
}

/// The generation a piece of work was started under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochTicket(u64);

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return its ticket. Every ticket issued before this call becomes stale.
    pub fn advance(&self) -> EpochTicket {
        EpochTicket(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: EpochTicket) -> bool {
        self.current.load(Ordering::Acquire) == ticket.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn older_tickets_go_stale() {
        let epoch = Epoch::new();
        let first = epoch.advance();
        assert!(epoch.is_current(first));
        let second = epoch.advance();
        assert!(!epoch.is_current(first));
        assert!(epoch.is_current(second));
    }
}
