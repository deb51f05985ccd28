//! # Event Log
//!
//! Append-only, block-stamped event log kept by each contract. Off-chain
//! scanners replay it in bounded block ranges (see `block_range_chunks`).

use crate::ledger::TxContext;
use crate::primitives::{BlockNumber, Timestamp};
use serde::{Deserialize, Serialize};

/// One emitted event with its position in the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent<E> {
    /// Block the event was emitted in.
    pub block_number: BlockNumber,
    /// Block timestamp.
    pub timestamp: Timestamp,
    /// Position in this log (monotonic).
    pub log_index: u64,
    /// Payload.
    pub event: E,
}

/// Append-only event log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLog<E> {
    entries: Vec<LoggedEvent<E>>,
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: Clone> EventLog<E> {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` stamped with the executing block.
    pub fn emit(&mut self, ctx: &TxContext, event: E) {
        let log_index = self.entries.len() as u64;
        self.entries.push(LoggedEvent {
            block_number: ctx.block_number,
            timestamp: ctx.timestamp,
            log_index,
            event,
        });
    }

    /// All events in emission order.
    #[must_use]
    pub fn all(&self) -> &[LoggedEvent<E>] {
        &self.entries
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent event.
    #[must_use]
    pub fn last(&self) -> Option<&E> {
        self.entries.last().map(|entry| &entry.event)
    }

    /// Events with `from <= block_number <= to`.
    #[must_use]
    pub fn in_block_range(&self, from: BlockNumber, to: BlockNumber) -> Vec<LoggedEvent<E>> {
        self.entries
            .iter()
            .filter(|entry| entry.block_number >= from && entry.block_number <= to)
            .cloned()
            .collect()
    }
}

/// Splits `[from, to]` into inclusive chunks of at most `max_span` blocks.
///
/// A `max_span` of zero is treated as one.
pub fn block_range_chunks(
    from: BlockNumber,
    to: BlockNumber,
    max_span: u64,
) -> impl Iterator<Item = (BlockNumber, BlockNumber)> {
    let span = max_span.max(1);
    let mut next = Some(from).filter(|start| *start <= to);
    std::iter::from_fn(move || {
        let start = next?;
        let end = start.saturating_add(span - 1).min(to);
        next = if end < to { Some(end + 1) } else { None };
        Some((start, end))
    })
}
