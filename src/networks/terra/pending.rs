//! Deferred transaction result tracking
//!
//! `sync`-mode broadcasts only confirm mempool admission; whether the
//! messages executed is learned by querying the transaction a few blocks
//! later.

use super::lcd::TxLog;
use serde_json::Value;
use std::collections::VecDeque;

/// Most recent history entries retained per transaction kind
pub const HISTORY_RETAIN: usize = 3;

/// Broadcast transaction awaiting its deferred result query
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingTx {
    /// Height at which to query the result
    pub query_height: u64,

    /// Hash assigned by the broadcast
    pub tx_hash: String,
}

/// FIFO queue of broadcast transactions awaiting result queries
#[derive(Debug, Default)]
pub struct PendingQueue(VecDeque<PendingTx>);

impl PendingQueue {
    /// Enqueue a broadcast transaction for a result query at `query_height`
    pub fn push(&mut self, query_height: u64, tx_hash: String) {
        self.0.push_back(PendingTx {
            query_height,
            tx_hash,
        });
    }

    /// Pop the head entry if its query height has been reached.
    ///
    /// Only the head is examined: at most one deferred query per kind per
    /// tick, which throttles catch-up load after an outage.
    pub fn pop_due(&mut self, height: u64) -> Option<PendingTx> {
        if self.0.front()?.query_height <= height {
            self.0.pop_front()
        } else {
            None
        }
    }

    /// Put a popped entry back at the head (query failed, retry next tick)
    pub fn requeue(&mut self, pending: PendingTx) {
        self.0.push_front(pending);
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Is the queue empty?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome record of a broadcast transaction
#[derive(Clone, Debug)]
pub struct TxHistoryEntry {
    /// Transaction hash; empty if the broadcast itself failed
    pub tx_hash: String,

    /// Messages included in the transaction
    pub msgs: Vec<Value>,

    /// Height the transaction was broadcast at
    pub sent_height: u64,

    /// Whether every message succeeded; `None` until the result is known
    pub result: Option<bool>,

    /// `(msg_index, log)` for each failed message
    pub failed_logs: Vec<(u64, String)>,
}

/// Bounded record of recently broadcast transactions, oldest evicted first
#[derive(Debug, Default)]
pub struct TxHistory(VecDeque<TxHistoryEntry>);

impl TxHistory {
    /// Record a newly broadcast transaction
    pub fn record_sent(&mut self, tx_hash: String, msgs: Vec<Value>, sent_height: u64) {
        self.insert(TxHistoryEntry {
            tx_hash,
            msgs,
            sent_height,
            result: None,
            failed_logs: vec![],
        });
    }

    /// Record a broadcast that failed in transport before a hash was assigned
    pub fn record_failed_broadcast(&mut self, msgs: Vec<Value>, sent_height: u64, log: String) {
        self.insert(TxHistoryEntry {
            tx_hash: String::new(),
            msgs,
            sent_height,
            result: Some(false),
            failed_logs: vec![(0, log)],
        });
    }

    /// Attach the queried execution result to the entry for `tx_hash`
    pub fn record_result(&mut self, tx_hash: &str, logs: &[TxLog]) {
        if let Some(entry) = self.0.iter_mut().find(|entry| entry.tx_hash == tx_hash) {
            entry.result = Some(logs.iter().all(|log| log.success));
            entry.failed_logs = logs
                .iter()
                .filter(|log| !log.success)
                .map(|log| (log.msg_index, log.log.clone()))
                .collect();
        }
    }

    /// Recorded entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &TxHistoryEntry> {
        self.0.iter()
    }

    fn insert(&mut self, entry: TxHistoryEntry) {
        self.0.push_back(entry);

        while self.0.len() > HISTORY_RETAIN {
            self.0.pop_front();
        }
    }
}
