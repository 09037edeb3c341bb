use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ParseError};
use crate::models::{Category, GradeBreakdown, GradeRecord, GradeRow, SixWeeksPeriod, StudentAverage};
use crate::period::PeriodCalendar;

/// Parses the leading integer of `text`, the way score cells were always
/// read: leading whitespace and a sign are allowed, anything after the
/// digits is ignored, and text with no leading digits counts as zero.
pub fn parse_score(text: Option<&str>) -> i64 {
    let Some(text) = text else {
        return 0;
    };

    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, byte| {
            acc.saturating_mul(10).saturating_add(i64::from(byte - b'0'))
        });

    if negative {
        -value
    } else {
        value
    }
}

/// Raw score plus bonus, clamped to `0..=100`.
pub fn effective_score(raw_score: Option<&str>, bonus_score: Option<&str>) -> u8 {
    let total = parse_score(raw_score).saturating_add(parse_score(bonus_score));
    total.clamp(0, 100) as u8
}

impl GradeRecord {
    pub fn effective_score(&self) -> u8 {
        effective_score(self.raw_score.as_deref(), self.bonus_score.as_deref())
    }
}

/// Rounds half-up to one decimal place.
pub fn round_tenth(value: f64) -> f64 {
    // 1e-9 absorbs binary error such as 84.94999999 for a true 84.95
    ((value * 10.0) + 0.5 + 1e-9).floor() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AveragePolicy {
    /// Category means combined with [`CategoryWeights`]; an empty category
    /// counts as a mean of zero.
    #[default]
    WeightedByCategory,
    /// Plain mean over every record, ignoring categories.
    FlatMean,
}

impl fmt::Display for AveragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AveragePolicy::WeightedByCategory => f.write_str("weighted"),
            AveragePolicy::FlatMean => f.write_str("flat"),
        }
    }
}

impl FromStr for AveragePolicy {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weighted" | "weighted-by-category" => Ok(AveragePolicy::WeightedByCategory),
            "flat" | "flat-mean" => Ok(AveragePolicy::FlatMean),
            _ => Err(ParseError::Policy(value.to_string())),
        }
    }
}

impl TryFrom<String> for AveragePolicy {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AveragePolicy> for String {
    fn from(policy: AveragePolicy) -> Self {
        policy.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub daily: f64,
    pub assessment: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            daily: 0.8,
            assessment: 0.2,
        }
    }
}

impl CategoryWeights {
    pub fn new(daily: f64, assessment: f64) -> Result<Self, ConfigError> {
        let valid = daily.is_finite()
            && assessment.is_finite()
            && daily >= 0.0
            && assessment >= 0.0
            && ((daily + assessment) - 1.0).abs() <= 1e-6;

        if valid {
            Ok(Self { daily, assessment })
        } else {
            Err(ConfigError::InvalidWeights { daily, assessment })
        }
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        Self::new(self.daily, self.assessment)
    }
}

fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregator {
    pub policy: AveragePolicy,
    pub weights: CategoryWeights,
}

impl Aggregator {
    pub fn new(policy: AveragePolicy, weights: CategoryWeights) -> Self {
        Self { policy, weights }
    }

    pub fn flat() -> Self {
        Self::new(AveragePolicy::FlatMean, CategoryWeights::default())
    }

    pub fn breakdown(&self, records: &[GradeRecord]) -> GradeBreakdown {
        // integer sums keep the result independent of record order
        let mut daily = (0u64, 0usize);
        let mut assessment = (0u64, 0usize);

        for record in records {
            let bucket = match record.category {
                Category::Daily => &mut daily,
                Category::Assessment => &mut assessment,
            };
            bucket.0 += u64::from(record.effective_score());
            bucket.1 += 1;
        }

        let daily_mean = mean(daily.0, daily.1);
        let assessment_mean = mean(assessment.0, assessment.1);

        let average = match self.policy {
            AveragePolicy::WeightedByCategory => {
                self.weights.daily * daily_mean + self.weights.assessment * assessment_mean
            }
            AveragePolicy::FlatMean => mean(daily.0 + assessment.0, daily.1 + assessment.1),
        };

        GradeBreakdown {
            daily_mean,
            assessment_mean,
            daily_count: daily.1,
            assessment_count: assessment.1,
            average: round_tenth(average).clamp(0.0, 100.0),
        }
    }

    pub fn average(&self, records: &[GradeRecord]) -> f64 {
        self.breakdown(records).average
    }
}

/// 80% daily, 20% assessment.
pub fn weighted_average(records: &[GradeRecord]) -> f64 {
    Aggregator::default().average(records)
}

pub fn flat_average(records: &[GradeRecord]) -> f64 {
    Aggregator::flat().average(records)
}

/// Averages every student separately for each six-weeks period their
/// assignments fall in.
pub fn student_averages(
    rows: &[GradeRow],
    calendar: &PeriodCalendar,
    aggregator: &Aggregator,
) -> Vec<StudentAverage> {
    let mut groups: HashMap<(i64, SixWeeksPeriod), (&GradeRow, Vec<GradeRecord>)> =
        HashMap::new();

    for row in rows {
        let period = calendar.resolve(row.due_date);
        let entry = groups
            .entry((row.student_id, period))
            .or_insert_with(|| (row, Vec::new()));
        entry.1.push(row.to_record());
    }

    let mut averages: Vec<StudentAverage> = groups
        .into_iter()
        .map(|((student_id, period), (first, records))| StudentAverage {
            student_id,
            student_name: first.student_name.clone(),
            class_period: first.class_period.clone(),
            six_weeks_period: period,
            breakdown: aggregator.breakdown(&records),
        })
        .collect();

    averages.sort_by(|a, b| {
        a.class_period
            .cmp(&b.class_period)
            .then_with(|| a.student_name.cmp(&b.student_name))
            .then_with(|| a.student_id.cmp(&b.student_id))
            .then_with(|| a.six_weeks_period.cmp(&b.six_weeks_period))
    });
    averages
}

/// Colour band used on seating charts and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GradeBand {
    Excelling,
    Proficient,
    Developing,
    Struggling,
}

impl GradeBand {
    pub fn from_average(average: f64) -> Self {
        match average {
            a if a >= 90.0 => GradeBand::Excelling,
            a if a >= 80.0 => GradeBand::Proficient,
            a if a >= 70.0 => GradeBand::Developing,
            _ => GradeBand::Struggling,
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GradeBand::Excelling => "excelling",
            GradeBand::Proficient => "proficient",
            GradeBand::Developing => "developing",
            GradeBand::Struggling => "struggling",
        };
        f.write_str(label)
    }
}

/// STAAR performance level for a scale percentage.
pub fn staar_level(score: f64) -> &'static str {
    match score {
        s if s >= 83.0 => "Masters",
        s if s >= 59.0 => "Meets",
        s if s >= 50.0 => "High Approaches",
        s if s >= 43.0 => "Approaches",
        s if s >= 30.0 => "High DNM",
        _ => "Did Not Meet",
    }
}
