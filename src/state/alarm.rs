//! Phase-change alarm

use std::{
    fmt::Debug,
    io::Write,
    sync::{Arc, Mutex, PoisonError},
};

use tracing::{info, warn};

use super::{Phase, TimerEvent};

/// Something that can make the alarm noticeable
pub trait AlertSink: Send + Sync + Debug {
    fn ring(&self, entered: Phase);
}

/// Rings the terminal bell and logs a reminder
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AlertSink for TerminalBell {
    fn ring(&self, entered: Phase) {
        match entered {
            Phase::Break => warn!("Alarm: work interval finished, time for a break"),
            Phase::Work => warn!("Alarm: break is over, back to work"),
        }
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

/// Raises an alert on every phase change and keeps it up until acknowledged
#[derive(Debug)]
pub struct AlarmNotifier {
    ringing: Mutex<Option<Phase>>,
    sink: Arc<dyn AlertSink>,
}

impl AlarmNotifier {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self {
            ringing: Mutex::new(None),
            sink,
        }
    }

    /// React to an engine event; only phase changes raise the alarm
    pub fn handle_event(&self, event: &TimerEvent) {
        if let TimerEvent::PhaseChanged { to, .. } = event {
            self.raise(*to);
        }
    }

    /// Start (or restart) the alert for the phase just entered
    pub fn raise(&self, entered: Phase) {
        *self.ringing.lock().unwrap_or_else(PoisonError::into_inner) = Some(entered);
        self.sink.ring(entered);
    }

    /// Ring again if the alert has not been acknowledged yet
    pub fn remind(&self) {
        if let Some(entered) = self.ringing_for() {
            self.sink.ring(entered);
        }
    }

    /// Silence the alert. Returns whether it was active.
    pub fn acknowledge(&self) -> bool {
        let was_active = self
            .ringing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if was_active {
            info!("Alarm acknowledged");
        }
        was_active
    }

    pub fn is_active(&self) -> bool {
        self.ringing_for().is_some()
    }

    /// Phase whose start is being announced, while the alert is active
    pub fn ringing_for(&self) -> Option<Phase> {
        *self.ringing.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AlarmNotifier {
    fn default() -> Self {
        Self::new(Arc::new(TerminalBell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSink(AtomicUsize);

    impl AlertSink for CountingSink {
        fn ring(&self, _entered: Phase) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_phase_change_raises_until_acknowledged() {
        let sink = Arc::new(CountingSink::default());
        let alarm = AlarmNotifier::new(sink.clone());

        alarm.handle_event(&TimerEvent::WorkCompleted { work_minutes: 25 });
        assert!(!alarm.is_active());

        alarm.handle_event(&TimerEvent::PhaseChanged {
            from: Phase::Work,
            to: Phase::Break,
        });
        assert_eq!(alarm.ringing_for(), Some(Phase::Break));
        alarm.remind();
        assert_eq!(sink.0.load(Ordering::SeqCst), 2);

        assert!(alarm.acknowledge());
        assert!(!alarm.acknowledge());
        alarm.remind();
        assert_eq!(sink.0.load(Ordering::SeqCst), 2);
    }
}
