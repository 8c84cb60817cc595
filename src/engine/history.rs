//! Bounded most-recent-first log of resolved rounds.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::Chips;
use crate::rules::Outcome;

/// Immutable record of one resolved round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub period: u64,
    pub outcome: Outcome,
    pub resolved_at: DateTime<Utc>,
    pub total_wagered: Chips,
    pub total_paid_out: Chips,
    pub bets: usize,
}

/// Bounded history, newest first. The round state machine is the only
/// writer; everything else reads copies.
#[derive(Debug)]
pub struct HistoryLog {
    records: VecDeque<HistoryRecord>,
    depth: usize,
}

impl HistoryLog {
    pub fn new(depth: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(depth + 1),
            depth,
        }
    }

    /// Insert the newest record, dropping anything beyond the depth
    pub fn push(&mut self, record: HistoryRecord) {
        self.records.push_front(record);
        self.records.truncate(self.depth);
    }

    /// All retained records, newest first
    pub fn recent(&self) -> Vec<HistoryRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&HistoryRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
