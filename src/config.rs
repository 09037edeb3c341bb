use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::grades::{Aggregator, AveragePolicy, CategoryWeights};
use crate::mapping::DEFAULT_MATCH_THRESHOLD;
use crate::models::PeriodRange;
use crate::period::PeriodCalendar;

pub const DEFAULT_EMAIL_DOMAIN: &str = "vanguardacademy.net";

/// Gradebook settings as written on disk. Every field is optional.
///
/// ```json
/// {
///   "calendar": [
///     {"period": "1SW", "start": "2025-08-13", "end": "2025-09-19"}
///   ],
///   "policy": "weighted",
///   "weights": {"daily": 0.8, "assessment": 0.2},
///   "match_threshold": 0.8,
///   "email_domain": "vanguardacademy.net"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradebookConfig {
    pub calendar: Option<Vec<PeriodRange>>,
    pub policy: AveragePolicy,
    pub weights: CategoryWeights,
    pub match_threshold: f64,
    pub email_domain: String,
}

impl Default for GradebookConfig {
    fn default() -> Self {
        Self {
            calendar: None,
            policy: AveragePolicy::default(),
            weights: CategoryWeights::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

/// Validated settings ready for use.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub calendar: PeriodCalendar,
    pub aggregator: Aggregator,
    pub match_threshold: f64,
    pub email_domain: String,
}

impl GradebookConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded gradebook config");
        Ok(config)
    }

    pub fn validate(self) -> Result<Settings, ConfigError> {
        let calendar = match self.calendar {
            Some(ranges) => PeriodCalendar::new(ranges)?,
            None => PeriodCalendar::default(),
        };
        let weights = self.weights.validate()?;

        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(ConfigError::InvalidThreshold(self.match_threshold));
        }

        Ok(Settings {
            calendar,
            aggregator: Aggregator::new(self.policy, weights),
            match_threshold: self.match_threshold,
            email_domain: self.email_domain,
        })
    }
}

impl Settings {
    /// Loads `path` when given, otherwise uses the built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => GradebookConfig::load(path)?.validate(),
            None => GradebookConfig::default().validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalendarError;
    use crate::models::SixWeeksPeriod;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn defaults_use_built_in_calendar_and_weights() {
        let settings = Settings::resolve(None).unwrap();
        assert_eq!(settings.calendar, PeriodCalendar::default());
        assert_eq!(settings.aggregator, Aggregator::default());
        assert_eq!(settings.match_threshold, 0.8);
        assert_eq!(settings.email_domain, "vanguardacademy.net");
    }

    #[test]
    fn partial_config_overrides_only_given_fields() {
        let config: GradebookConfig = serde_json::from_str(
            r#"{
                "calendar": [
                    {"period": "1SW", "start": "2025-08-13", "end": "2025-09-19"},
                    {"period": "2SW", "start": "2025-09-22", "end": "2025-10-31"}
                ],
                "policy": "flat"
            }"#,
        )
        .unwrap();

        let settings = config.validate().unwrap();
        assert_eq!(settings.aggregator.policy, AveragePolicy::FlatMean);
        assert_eq!(settings.calendar.ranges().len(), 2);
        assert_eq!(
            settings.calendar.resolve(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()),
            SixWeeksPeriod::First
        );
    }

    #[test]
    fn rejects_bad_weights_threshold_and_calendar() {
        let config = GradebookConfig {
            weights: CategoryWeights {
                daily: 0.5,
                assessment: 0.2,
            },
            ..GradebookConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWeights { .. })));

        let config = GradebookConfig {
            match_threshold: 1.5,
            ..GradebookConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold(_))));

        let config = GradebookConfig {
            calendar: Some(Vec::new()),
            ..GradebookConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Calendar(CalendarError::Empty))
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let result = serde_json::from_str::<GradebookConfig>(r#"{"polcy": "flat"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"weights": {{"daily": 0.7, "assessment": 0.3}}}}"#).unwrap();

        let settings = Settings::resolve(Some(file.path())).unwrap();
        assert_eq!(settings.aggregator.weights.daily, 0.7);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            GradebookConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
