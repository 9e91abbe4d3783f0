use std::env;
use std::time::Duration;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LEDGER_TIMEOUT_SECS: u64 = 10;

/// Timeouts applied to every collaborator call a reminder session makes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReminderSettings {
    pub fetch_timeout: Duration,
    pub ledger_timeout: Duration,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            ledger_timeout: Duration::from_secs(DEFAULT_LEDGER_TIMEOUT_SECS),
        }
    }
}

impl ReminderSettings {
    /// Read `STUDY_FETCH_TIMEOUT_SECS` and `STUDY_LEDGER_TIMEOUT_SECS`,
    /// falling back to defaults for missing, zero, or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: u64| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
                .map_or(Duration::from_secs(default), Duration::from_secs)
        };
        Self {
            fetch_timeout: secs("STUDY_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS),
            ledger_timeout: secs("STUDY_LEDGER_TIMEOUT_SECS", DEFAULT_LEDGER_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_and_falls_back() {
        let settings = ReminderSettings::from_lookup(|key| match key {
            "STUDY_FETCH_TIMEOUT_SECS" => Some("15".into()),
            "STUDY_LEDGER_TIMEOUT_SECS" => Some("0".into()),
            _ => None,
        });
        assert_eq!(settings.fetch_timeout, Duration::from_secs(15));
        assert_eq!(settings.ledger_timeout, Duration::from_secs(10));
    }

    #[test]
    fn garbage_values_use_defaults() {
        let settings = ReminderSettings::from_lookup(|_| Some("soon".into()));
        assert_eq!(settings, ReminderSettings::default());
    }
}
