//! Bounded game log and gold/reputation ledgers.
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::{GAME_LOG_CAP, LEDGER_CAP};

/// One player-visible event. `key` is a stable message identifier for the
/// view layer; `detail` carries the formatted particulars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at_ms: u64,
    pub key: String,
    pub detail: String,
}

/// Append-only event log, oldest entries dropped past the cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameLog {
    entries: VecDeque<LogEntry>,
}

impl GameLog {
    pub fn push(&mut self, at_ms: u64, key: &str, detail: impl Into<String>) {
        if self.entries.len() == GAME_LOG_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            at_ms,
            key: key.to_string(),
            detail: detail.into(),
        });
    }

    #[must_use]
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }
}

/// A signed movement on a tracked quantity (gold or reputation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub at_ms: u64,
    pub amount: i64,
    pub reason: String,
}

/// Append-only history of signed amounts, bounded like the game log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ledger {
    entries: VecDeque<LedgerEntry>,
}

impl Ledger {
    pub fn record(&mut self, at_ms: u64, amount: i64, reason: impl Into<String>) {
        if self.entries.len() == LEDGER_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(LedgerEntry {
            at_ms,
            amount,
            reason: reason.into(),
        });
    }

    #[must_use]
    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Net movement across the retained window.
    #[must_use]
    pub fn net(&self) -> i64 {
        self.entries.iter().map(|e| e.amount).sum()
    }
}
