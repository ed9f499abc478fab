//! Append-only history of completed work sessions
//!
//! The ledger persists three keys:
//! - `pomodorosCompleted`: number of recorded sessions (integer string)
//! - `focusTime`: total minutes across all sessions (integer string)
//! - `sessions`: JSON array of `{date, duration, type}` records, oldest first
//!
//! The counters are a cache over the record list. Every write goes to the
//! store as a single batch before the in-memory view changes, so a failed write
//! leaves both the store and the in-memory state as they were.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::PersistenceError,
    storage::{KeyValueStore, WriteOp},
};

pub const COMPLETED_KEY: &str = "pomodorosCompleted";
pub const FOCUS_KEY: &str = "focusTime";
pub const SESSIONS_KEY: &str = "sessions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Work,
}

/// A finished work interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "date")]
    pub completed_at: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    #[serde(rename = "type")]
    pub kind: SessionKind,
}

impl SessionRecord {
    pub fn work(duration_minutes: u32, completed_at: DateTime<Utc>) -> Self {
        Self {
            completed_at,
            duration_minutes,
            kind: SessionKind::Work,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.completed_at - Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub pomodoros_completed: u64,
    pub focus_minutes: u64,
}

impl LedgerTotals {
    /// Totals as they follow from a record list
    pub fn from_records(records: &[SessionRecord]) -> Self {
        Self {
            pomodoros_completed: records.len() as u64,
            focus_minutes: records
                .iter()
                .map(|r| u64::from(r.duration_minutes))
                .sum(),
        }
    }
}

/// Most-recent-first view over a snapshot of the history.
///
/// Iterating does not touch the ledger, so the view can be walked any number
/// of times and stays valid while the ledger moves on.
#[derive(Debug, Clone)]
pub struct RecentHistory {
    records: Arc<Vec<SessionRecord>>,
    limit: usize,
}

impl RecentHistory {
    pub fn iter(&self) -> impl Iterator<Item = &SessionRecord> + '_ {
        self.records.iter().rev().take(self.limit)
    }

    pub fn len(&self) -> usize {
        self.records.len().min(self.limit)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for &'a RecentHistory {
    type Item = &'a SessionRecord;
    type IntoIter = std::iter::Take<std::iter::Rev<std::slice::Iter<'a, SessionRecord>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter().rev().take(self.limit)
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    records: Arc<Vec<SessionRecord>>,
    totals: LedgerTotals,
}

#[derive(Debug)]
pub struct SessionLedger {
    store: Arc<dyn KeyValueStore>,
    inner: RwLock<LedgerInner>,
}

impl SessionLedger {
    /// Load the ledger from `store`.
    ///
    /// An unreadable history is treated as empty. The counters are recomputed
    /// from the history; stored counters that disagree are reported and ignored.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self, PersistenceError> {
        let records = match store.get(SESSIONS_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<SessionRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Session history is unreadable ({}), starting with an empty history", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let totals = LedgerTotals::from_records(&records);
        let stored_completed = read_counter(store.as_ref(), COMPLETED_KEY)?;
        let stored_focus = read_counter(store.as_ref(), FOCUS_KEY)?;

        if stored_completed != Some(totals.pomodoros_completed)
            && !(stored_completed.is_none() && records.is_empty())
        {
            warn!(
                "Stored {} ({:?}) disagrees with history ({}), using history",
                COMPLETED_KEY, stored_completed, totals.pomodoros_completed
            );
        }
        if stored_focus != Some(totals.focus_minutes)
            && !(stored_focus.is_none() && records.is_empty())
        {
            warn!(
                "Stored {} ({:?}) disagrees with history ({}), using history",
                FOCUS_KEY, stored_focus, totals.focus_minutes
            );
        }

        info!(
            "Session ledger loaded: {} sessions, {} focus minutes",
            totals.pomodoros_completed, totals.focus_minutes
        );

        Ok(Self {
            store,
            inner: RwLock::new(LedgerInner {
                records: Arc::new(records),
                totals,
            }),
        })
    }

    /// Record a completed work session of `duration_minutes`
    pub fn append(&self, duration_minutes: u32) -> Result<SessionRecord, PersistenceError> {
        self.append_at(duration_minutes, Utc::now())
    }

    /// Record a completed work session that finished at `completed_at`
    pub fn append_at(
        &self,
        duration_minutes: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<SessionRecord, PersistenceError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let record = SessionRecord::work(duration_minutes, completed_at);
        let mut records = Vec::with_capacity(inner.records.len() + 1);
        records.extend(inner.records.iter().cloned());
        records.push(record.clone());

        let totals = LedgerTotals {
            pomodoros_completed: inner.totals.pomodoros_completed + 1,
            focus_minutes: inner.totals.focus_minutes + u64::from(duration_minutes),
        };

        let batch = [
            WriteOp::put(COMPLETED_KEY, totals.pomodoros_completed.to_string()),
            WriteOp::put(FOCUS_KEY, totals.focus_minutes.to_string()),
            WriteOp::put(SESSIONS_KEY, serde_json::to_string(&records)?),
        ];
        self.store.apply(&batch)?;

        inner.records = Arc::new(records);
        inner.totals = totals;
        debug!(
            "Recorded {}min session, totals now {} / {}min",
            duration_minutes, totals.pomodoros_completed, totals.focus_minutes
        );

        Ok(record)
    }

    /// The `n` most recent sessions, newest first
    pub fn recent_history(&self, n: usize) -> RecentHistory {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        RecentHistory {
            records: Arc::clone(&inner.records),
            limit: n,
        }
    }

    pub fn totals(&self) -> LedgerTotals {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .totals
    }

    /// Drop every record and zero the counters
    pub fn clear(&self) -> Result<(), PersistenceError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        self.store.apply(&[
            WriteOp::delete(COMPLETED_KEY),
            WriteOp::delete(FOCUS_KEY),
            WriteOp::delete(SESSIONS_KEY),
        ])?;

        *inner = LedgerInner::default();
        info!("Session statistics cleared");
        Ok(())
    }
}

fn read_counter(store: &dyn KeyValueStore, key: &str) -> Result<Option<u64>, PersistenceError> {
    Ok(store.get(key)?.and_then(|raw| match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Stored {} is not a number ({}): {:?}", key, e, raw);
            None
        }
    }))
}
