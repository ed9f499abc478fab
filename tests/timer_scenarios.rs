use std::{sync::Arc, time::Duration};

use pomodoro_server::{
    device::{DeviceBridge, DeviceCommand},
    state::{AlertSink, AppState, IntervalConfig, Phase, TimerEvent},
    storage::MemoryStore,
    ConfigError,
};
use tokio::sync::broadcast::error::TryRecvError;

#[derive(Debug)]
struct Silent;

impl AlertSink for Silent {
    fn ring(&self, _entered: Phase) {}
}

fn state() -> AppState {
    AppState::new(
        3001,
        "127.0.0.1".to_string(),
        Arc::new(MemoryStore::new()),
        IntervalConfig::default(),
        Arc::new(Silent),
        DeviceBridge::disabled(),
    )
    .unwrap()
}

#[test]
fn test_full_work_interval_flips_to_break() {
    let state = state();
    state.start_timer();
    for _ in 0..1500 {
        state.engine.tick();
    }

    let snapshot = state.engine.snapshot();
    assert_eq!(snapshot.mode, Phase::Break);
    assert_eq!(snapshot.remaining_seconds, u64::from(snapshot.break_minutes) * 60);
    assert_eq!(snapshot.remaining_seconds, 300);

    let totals = state.ledger.totals();
    assert_eq!(totals.pomodoros_completed, 1);
    assert_eq!(totals.focus_minutes, 25);
}

#[test]
fn test_rejected_config_while_stopped() {
    let state = state();
    let err = state.set_work_minutes(20).unwrap_err();

    assert!(matches!(err, ConfigError::InvalidDuration(_)));
    assert_eq!(state.config.current(), IntervalConfig::default());
    assert_eq!(state.engine.snapshot().remaining_seconds, 1500);
}

#[test]
fn test_config_change_while_running_work() {
    let state = state();
    state.start_timer();
    for _ in 0..60 {
        state.engine.tick();
    }
    let before = state.engine.snapshot().remaining_seconds;

    let config = state.set_work_minutes(30).unwrap();
    assert_eq!((config.work_minutes(), config.break_minutes()), (30, 6));

    let snapshot = state.engine.snapshot();
    assert_eq!(snapshot.remaining_seconds, before);
    assert_eq!(snapshot.mode, Phase::Work);

    assert_eq!(state.reset_timer().remaining_seconds, 1800);
}

#[test]
fn test_one_completion_event_per_work_interval() {
    let state = state();
    let mut rx = state.engine.subscribe();
    state.start_timer();

    // Three work intervals and three breaks.
    let mut previous = state.engine.snapshot();
    for _ in 0..(3 * (1500 + 300)) {
        let snapshot = state.engine.tick();
        if snapshot.mode == previous.mode {
            assert_eq!(snapshot.remaining_seconds, previous.remaining_seconds - 1);
        } else {
            let full = match snapshot.mode {
                Phase::Work => 1500,
                Phase::Break => 300,
            };
            assert_eq!(snapshot.remaining_seconds, full);
        }
        previous = snapshot;
    }

    let mut completions = 0;
    let mut to_break = 0;
    let mut to_work = 0;
    loop {
        match rx.try_recv() {
            Ok(TimerEvent::WorkCompleted { work_minutes }) => {
                assert_eq!(work_minutes, 25);
                completions += 1;
            }
            Ok(TimerEvent::PhaseChanged { to: Phase::Break, .. }) => to_break += 1,
            Ok(TimerEvent::PhaseChanged { to: Phase::Work, .. }) => to_work += 1,
            Err(TryRecvError::Empty) => break,
            Err(e) => panic!("unexpected receive error: {:?}", e),
        }
    }

    assert_eq!((completions, to_break, to_work), (3, 3, 3));
    assert_eq!(state.ledger.totals().pomodoros_completed, 3);
    assert_eq!(state.engine.snapshot().cycles_completed, 3);
}

#[test]
fn test_device_start_command_clamps_and_starts() {
    let state = state();
    let command: DeviceCommand = "START:10:2".parse().unwrap();

    let snapshot = state.handle_device_command(&command);
    assert!(snapshot.is_running);
    assert_eq!(snapshot.work_minutes, 25);
    assert_eq!(snapshot.remaining_seconds, 1500);

    state.stop_timer();
    state.reset_timer();
    let snapshot = state.handle_device_command(&"START:45:9".parse().unwrap());
    assert_eq!(snapshot.work_minutes, 45);
    assert_eq!(snapshot.break_minutes, 9);
    assert_eq!(snapshot.remaining_seconds, 2700);
}

#[tokio::test(start_paused = true)]
async fn test_alarm_bell_reminds_until_acknowledged() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counting(AtomicUsize);

    impl AlertSink for Counting {
        fn ring(&self, _entered: Phase) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let sink = Arc::new(Counting::default());
    let state = Arc::new(
        AppState::new(
            3001,
            "127.0.0.1".to_string(),
            Arc::new(MemoryStore::new()),
            IntervalConfig::default(),
            sink.clone(),
            DeviceBridge::disabled(),
        )
        .unwrap(),
    );
    tokio::spawn(pomodoro_server::tasks::alarm_bell_task(
        Arc::clone(&state),
        Duration::from_secs(10),
    ));

    state.alarm.raise(Phase::Break);
    assert_eq!(sink.0.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(sink.0.load(Ordering::SeqCst), 3);

    state.acknowledge_alarm();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(sink.0.load(Ordering::SeqCst), 3);
}
