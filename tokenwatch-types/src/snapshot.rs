//! The [`Snapshot`] produced by one Scheduler tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::token::Token;

/// An ordered, immutable list of canonical [`Token`]s.
///
/// Sorted by `volume_24h` descending and truncated to `max_tokens` by the
/// Merger before the Scheduler writes it. Replaced wholesale on each
/// successful tick; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tokens in publication order.
    pub tokens: Vec<Token>,
    /// Instant this snapshot was produced.
    pub produced_at: DateTime<Utc>,
}

impl Snapshot {
    /// Wrap a pre-sorted, pre-truncated token list produced at `produced_at`.
    #[must_use]
    pub fn new(tokens: Vec<Token>, produced_at: DateTime<Utc>) -> Self {
        Self {
            tokens,
            produced_at,
        }
    }

    /// Case-insensitive lookup by address.
    #[must_use]
    pub fn find(&self, address: &str) -> Option<&Token> {
        let needle = address.to_lowercase();
        self.tokens.iter().find(|t| t.address == needle)
    }

    /// Number of tokens in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether this snapshot carries no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
