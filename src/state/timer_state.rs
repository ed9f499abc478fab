//! Countdown state and the phase transition rules

use serde::{Deserialize, Serialize};

use super::IntervalConfig;

/// Interval type the countdown is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn other(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    /// Full length of this phase under `config`, in seconds
    pub fn duration_seconds(self, config: &IntervalConfig) -> u64 {
        let minutes = match self {
            Phase::Work => config.work_minutes(),
            Phase::Break => config.break_minutes(),
        };
        u64::from(minutes) * 60
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }
}

/// Notifications published by the timer engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TimerEvent {
    /// A work interval ran to completion
    #[serde(rename_all = "camelCase")]
    WorkCompleted { work_minutes: u32 },
    /// The countdown flipped to the other phase
    PhaseChanged { from: Phase, to: Phase },
}

/// One phase boundary crossed by the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    /// Work length in effect when the boundary was crossed
    pub work_minutes: u32,
}

impl Transition {
    /// True when a work interval just finished
    pub fn completes_work(&self) -> bool {
        self.from == Phase::Work
    }
}

/// Countdown state owned by the timer engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub mode: Phase,
    pub remaining_seconds: u64,
    pub is_running: bool,
    /// Work intervals finished since the process started
    pub cycles_completed: u64,
}

impl TimerState {
    /// Stopped at the start of a work interval
    pub fn new(config: &IntervalConfig) -> Self {
        Self {
            mode: Phase::Work,
            remaining_seconds: Phase::Work.duration_seconds(config),
            is_running: false,
            cycles_completed: 0,
        }
    }

    /// Refill the countdown for the current mode
    pub fn refill(&mut self, config: &IntervalConfig) {
        self.remaining_seconds = self.mode.duration_seconds(config);
    }

    /// Advance by one second. The boundary is crossed when the countdown would
    /// reach zero, so zero is never left behind as a visible value.
    pub fn tick(&mut self, config: &IntervalConfig) -> Option<Transition> {
        if self.remaining_seconds <= 1 {
            Some(self.flip(config))
        } else {
            self.remaining_seconds -= 1;
            None
        }
    }

    /// Advance by `seconds`, crossing as many boundaries as the elapsed time
    /// covers. Iterations are bounded by the number of boundaries crossed.
    pub fn advance(&mut self, mut seconds: u64, config: &IntervalConfig) -> Vec<Transition> {
        let mut transitions = Vec::new();
        while seconds > 0 {
            let to_boundary = self.remaining_seconds.max(1);
            if seconds >= to_boundary {
                seconds -= to_boundary;
                transitions.push(self.flip(config));
            } else {
                self.remaining_seconds -= seconds;
                seconds = 0;
            }
        }
        transitions
    }

    fn flip(&mut self, config: &IntervalConfig) -> Transition {
        let from = self.mode;
        self.mode = from.other();
        self.refill(config);
        if from == Phase::Work {
            self.cycles_completed += 1;
        }
        Transition {
            from,
            to: self.mode,
            work_minutes: config.work_minutes(),
        }
    }
}

/// Read-only view of the timer handed to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub mode: Phase,
    pub remaining_seconds: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub is_running: bool,
    pub alarm_active: bool,
    pub cycles_completed: u64,
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl TimerSnapshot {
    pub fn new(state: &TimerState, config: &IntervalConfig, alarm_active: bool) -> Self {
        Self {
            mode: state.mode,
            remaining_seconds: state.remaining_seconds,
            minutes: state.remaining_seconds / 60,
            seconds: state.remaining_seconds % 60,
            is_running: state.is_running,
            alarm_active,
            cycles_completed: state.cycles_completed,
            work_minutes: config.work_minutes(),
            break_minutes: config.break_minutes(),
        }
    }

    /// `MM:SS` countdown display
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }
}
