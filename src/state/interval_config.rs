//! Interval configuration and the store that owns it

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::info;

use crate::error::ConfigError;

/// Shortest work interval accepted, in minutes
pub const MIN_WORK_MINUTES: u32 = 25;

/// Work and break lengths in minutes. The break length is always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalConfig {
    work_minutes: u32,
    break_minutes: u32,
}

impl IntervalConfig {
    /// Build a config for the given work length, rejecting anything under the floor
    pub fn new(work_minutes: u32) -> Result<Self, ConfigError> {
        if work_minutes < MIN_WORK_MINUTES {
            return Err(ConfigError::InvalidDuration(format!(
                "work minutes must be at least {}, got {}",
                MIN_WORK_MINUTES, work_minutes
            )));
        }
        Ok(Self {
            work_minutes,
            break_minutes: break_minutes_for(work_minutes),
        })
    }

    /// Build a config with the work length raised to the floor if needed
    pub fn clamped(work_minutes: u32) -> Self {
        let work_minutes = work_minutes.max(MIN_WORK_MINUTES);
        Self {
            work_minutes,
            break_minutes: break_minutes_for(work_minutes),
        }
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self::clamped(MIN_WORK_MINUTES)
    }
}

/// `max(1, round(work * 0.2))`. For integers `work / 5` is never exactly
/// halfway between two integers, so `(work + 2) / 5` rounds the same way.
pub fn break_minutes_for(work_minutes: u32) -> u32 {
    (work_minutes.saturating_add(2) / 5).max(1)
}

/// Validate a loosely typed work length (HTTP body, remote config) into whole minutes
pub fn parse_work_minutes(value: &Value) -> Result<u32, ConfigError> {
    let number = match value {
        Value::Number(n) => n,
        other => {
            return Err(ConfigError::InvalidDuration(format!(
                "work minutes must be a number, got {}",
                other
            )))
        }
    };

    if let Some(minutes) = number.as_u64() {
        return u32::try_from(minutes)
            .map_err(|_| ConfigError::InvalidDuration(format!("work minutes {} is too large", minutes)));
    }

    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
        Some(f) if f.fract() != 0.0 => Err(ConfigError::InvalidDuration(format!(
            "work minutes must be a whole number, got {}",
            f
        ))),
        _ => Err(ConfigError::InvalidDuration(format!(
            "work minutes must be at least {}, got {}",
            MIN_WORK_MINUTES, number
        ))),
    }
}

/// Owner of the current [`IntervalConfig`]. Accepted changes are published on a
/// watch channel that the timer engine observes.
#[derive(Debug)]
pub struct ConfigStore {
    tx: watch::Sender<IntervalConfig>,
}

impl ConfigStore {
    pub fn new(initial: IntervalConfig) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Current work and break lengths
    pub fn current(&self) -> IntervalConfig {
        *self.tx.borrow()
    }

    /// Set the work length; the break length follows. Invalid values leave the
    /// config untouched.
    pub fn set_work_minutes(&self, work_minutes: u32) -> Result<IntervalConfig, ConfigError> {
        Ok(self.replace(IntervalConfig::new(work_minutes)?))
    }

    /// Install an already validated config. Subscribers are only notified if
    /// it differs from the current one.
    pub fn replace(&self, next: IntervalConfig) -> IntervalConfig {
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });

        if changed {
            info!(
                "Interval config updated: work={}min, break={}min",
                next.work_minutes(),
                next.break_minutes()
            );
        }
        next
    }

    /// Receiver that is notified on every accepted change
    pub fn subscribe(&self) -> watch::Receiver<IntervalConfig> {
        self.tx.subscribe()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(IntervalConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_break_is_fifth_of_work_rounded() {
        for work in MIN_WORK_MINUTES..=600 {
            let expected = ((work as f64 * 0.2).round() as u32).max(1);
            assert_eq!(break_minutes_for(work), expected, "work={}", work);
        }
        assert_eq!(IntervalConfig::new(30).unwrap().break_minutes(), 6);
        assert_eq!(IntervalConfig::new(27).unwrap().break_minutes(), 5);
        assert_eq!(IntervalConfig::new(28).unwrap().break_minutes(), 6);
    }

    #[test]
    fn test_rejected_value_keeps_prior_config() {
        let store = ConfigStore::default();
        let err = store.set_work_minutes(20).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidDuration(_)));
        assert_eq!(store.current(), IntervalConfig::new(25).unwrap());
    }

    #[test]
    fn test_accepted_value_notifies_subscribers() {
        let store = ConfigStore::default();
        let mut rx = store.subscribe();

        store.set_work_minutes(30).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().break_minutes(), 6);

        // Same value again is not a change.
        store.set_work_minutes(30).unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_parse_work_minutes() {
        assert_eq!(parse_work_minutes(&json!(45)).unwrap(), 45);
        assert_eq!(parse_work_minutes(&json!(45.0)).unwrap(), 45);
        assert!(parse_work_minutes(&json!(30.5)).is_err());
        assert!(parse_work_minutes(&json!(-3)).is_err());
        assert!(parse_work_minutes(&json!("30")).is_err());
        assert!(parse_work_minutes(&Value::Null).is_err());
    }

    #[test]
    fn test_replace_with_clamped_config() {
        let store = ConfigStore::default();
        let mut rx = store.subscribe();

        let config = store.replace(IntervalConfig::clamped(10));
        assert_eq!(config, IntervalConfig::default());
        assert!(!rx.has_changed().unwrap());

        store.replace(IntervalConfig::clamped(45));
        assert!(rx.has_changed().unwrap());
        assert_eq!(store.current().break_minutes(), 9);
    }

    #[test]
    fn test_clamped_raises_to_floor() {
        assert_eq!(IntervalConfig::clamped(10).work_minutes(), 25);
        assert_eq!(IntervalConfig::clamped(40).work_minutes(), 40);
    }
}
