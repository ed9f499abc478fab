use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use pomodoro_server::{
    state::{session_ledger::SESSIONS_KEY, LedgerTotals, SessionLedger, SessionRecord},
    storage::{FileStore, KeyValueStore, WriteOp},
};

fn history(ledger: &SessionLedger) -> Vec<SessionRecord> {
    ledger.recent_history(usize::MAX).iter().cloned().collect()
}

fn round_trip(size: usize) {
    let dir = tempfile::tempdir().unwrap();
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

    let (totals, records) = {
        let ledger = SessionLedger::open(Arc::new(FileStore::open(dir.path()).unwrap())).unwrap();
        for i in 0..size {
            let minutes = 25 + (i % 20) as u32;
            ledger
                .append_at(minutes, base + Duration::minutes(30 * i as i64))
                .unwrap();
        }
        (ledger.totals(), history(&ledger))
    };

    let reloaded = SessionLedger::open(Arc::new(FileStore::open(dir.path()).unwrap())).unwrap();
    assert_eq!(reloaded.totals(), totals, "size {}", size);
    assert_eq!(history(&reloaded), records, "size {}", size);
    assert_eq!(totals, LedgerTotals::from_records(&records));
    assert_eq!(totals.pomodoros_completed, size as u64);
}

#[test]
fn test_round_trip_empty() {
    round_trip(0);
}

#[test]
fn test_round_trip_single() {
    round_trip(1);
}

#[test]
fn test_round_trip_thousand() {
    round_trip(1000);
}

#[test]
fn test_clear_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ledger = SessionLedger::open(Arc::new(FileStore::open(dir.path()).unwrap())).unwrap();
        for _ in 0..3 {
            ledger.append(25).unwrap();
        }
        ledger.clear().unwrap();
    }

    let reloaded = SessionLedger::open(Arc::new(FileStore::open(dir.path()).unwrap())).unwrap();
    assert_eq!(reloaded.totals(), LedgerTotals::default());
    assert!(reloaded.recent_history(10).is_empty());
}

#[test]
fn test_corrupt_history_key_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileStore::open(dir.path()).unwrap();
        store
            .apply(&[
                WriteOp::put("pomodorosCompleted", "2"),
                WriteOp::put("focusTime", "50"),
                WriteOp::put(SESSIONS_KEY, "not a list"),
            ])
            .unwrap();
    }

    let ledger = SessionLedger::open(Arc::new(FileStore::open(dir.path()).unwrap())).unwrap();
    assert_eq!(ledger.totals(), LedgerTotals::default());

    // The ledger keeps working and rewrites a consistent state.
    ledger.append(25).unwrap();
    let reloaded = SessionLedger::open(Arc::new(FileStore::open(dir.path()).unwrap())).unwrap();
    assert_eq!(reloaded.totals().pomodoros_completed, 1);
}

#[test]
fn test_history_written_by_browser_client_loads() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileStore::open(dir.path()).unwrap();
        store
            .apply(&[
                WriteOp::put("pomodorosCompleted", "1"),
                WriteOp::put("focusTime", "25"),
                WriteOp::put(
                    SESSIONS_KEY,
                    r#"[{"date":"2024-05-02T14:03:11.512Z","duration":25,"type":"work"}]"#,
                ),
            ])
            .unwrap();
    }

    let ledger = SessionLedger::open(Arc::new(FileStore::open(dir.path()).unwrap())).unwrap();
    let records = history(&ledger);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].duration_minutes, 25);
    assert_eq!(
        records[0].completed_at,
        Utc.with_ymd_and_hms(2024, 5, 2, 14, 3, 11).unwrap() + Duration::milliseconds(512)
    );
}

#[test]
fn test_concurrent_appends_keep_counters_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(SessionLedger::open(Arc::new(FileStore::open(dir.path()).unwrap())).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || {
                for _ in 0..10 {
                    ledger.append(25).unwrap();
                    let _ = ledger.totals();
                }
            })
        })
        .collect();
    let clearer = {
        let ledger = Arc::clone(&ledger);
        std::thread::spawn(move || ledger.clear().unwrap())
    };

    for handle in handles {
        handle.join().unwrap();
    }
    clearer.join().unwrap();

    let records = history(&ledger);
    assert_eq!(ledger.totals(), LedgerTotals::from_records(&records));

    let reloaded = SessionLedger::open(Arc::new(FileStore::open(dir.path()).unwrap())).unwrap();
    assert_eq!(reloaded.totals(), ledger.totals());
}
