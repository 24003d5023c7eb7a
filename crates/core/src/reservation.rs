use serde::{Deserialize, Serialize};

/// Outcome of an atomic stock reservation.
///
/// Insufficient stock is a business outcome, not an error: the caller gets
/// the current level back and nothing was mutated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reservation {
    /// The full quantity was decremented.
    Reserved { remaining: i64 },
    /// Stock was below the requested quantity; no change was made.
    Insufficient { remaining: i64 },
}

impl Reservation {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Reservation::Reserved { .. })
    }

    /// Stock level after the attempt (unchanged when insufficient).
    pub fn remaining(&self) -> i64 {
        match self {
            Reservation::Reserved { remaining } | Reservation::Insufficient { remaining } => {
                *remaining
            }
        }
    }
}
