use std::sync::atomic::{AtomicU8, Ordering};

const OPEN: u8 = 0;
const ENTERED: u8 = 1;
const ABANDONED: u8 = 2;

/// Decides, once, whether a gated transaction runs or is abandoned.
///
/// The transaction calls [`enter`](Self::enter) after taking the write lock;
/// a caller that stops waiting calls [`abandon`](Self::abandon). Whichever
/// comes first wins, so a caller that successfully abandoned knows nothing
/// was written, and a caller that lost the race must wait for the real
/// outcome.
#[derive(Debug)]
pub struct CommitGate {
    operation: &'static str,
    state: AtomicU8,
}

impl CommitGate {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            state: AtomicU8::new(OPEN),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Returns `false` if the caller already abandoned the transaction.
    pub fn enter(&self) -> bool {
        match self
            .state
            .compare_exchange(OPEN, ENTERED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(state) => state == ENTERED,
        }
    }

    /// Returns `false` if the transaction has already entered.
    pub fn abandon(&self) -> bool {
        match self
            .state
            .compare_exchange(OPEN, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(state) => state == ABANDONED,
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.state.load(Ordering::Acquire) == ABANDONED
    }
}
