use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ParseError;

/// Weight bucket an assignment counts toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    Daily,
    Assessment,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Daily => "Daily",
            Category::Assessment => "Assessment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Category::Daily),
            "assessment" => Ok(Category::Assessment),
            _ => Err(ParseError::Category(value.to_string())),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One of the six grading windows of an academic year, `1SW` through `6SW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum SixWeeksPeriod {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
}

impl SixWeeksPeriod {
    pub const ALL: [SixWeeksPeriod; 6] = [
        SixWeeksPeriod::First,
        SixWeeksPeriod::Second,
        SixWeeksPeriod::Third,
        SixWeeksPeriod::Fourth,
        SixWeeksPeriod::Fifth,
        SixWeeksPeriod::Sixth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SixWeeksPeriod::First => "1SW",
            SixWeeksPeriod::Second => "2SW",
            SixWeeksPeriod::Third => "3SW",
            SixWeeksPeriod::Fourth => "4SW",
            SixWeeksPeriod::Fifth => "5SW",
            SixWeeksPeriod::Sixth => "6SW",
        }
    }
}

impl fmt::Display for SixWeeksPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SixWeeksPeriod {
    type Err = ParseError;

    /// Accepts `3SW`, `3sw` or a bare `3`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().to_ascii_uppercase();
        let digits = trimmed.strip_suffix("SW").unwrap_or(&trimmed);
        SixWeeksPeriod::ALL
            .iter()
            .copied()
            .find(|period| period.as_str().starts_with(digits) && digits.len() == 1)
            .ok_or_else(|| ParseError::Period(value.to_string()))
    }
}

impl TryFrom<String> for SixWeeksPeriod {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for SixWeeksPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inclusive `[start, end]` date range for one six-weeks period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub period: SixWeeksPeriod,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One assignment's recorded performance for one student, as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRecord {
    pub raw_score: Option<String>,
    pub bonus_score: Option<String>,
    pub category: Category,
}

impl GradeRecord {
    pub fn new(raw_score: &str, bonus_score: &str, category: Category) -> Self {
        Self {
            raw_score: Some(raw_score.to_string()),
            bonus_score: Some(bonus_score.to_string()),
            category,
        }
    }
}

/// A gradebook export row: one student's grade on one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GradeRow {
    pub student_id: i64,
    pub student_name: String,
    pub class_period: String,
    pub assignment: String,
    pub due_date: NaiveDate,
    pub category: Category,
    pub grade: Option<String>,
    pub extra: Option<String>,
}

impl GradeRow {
    pub fn to_record(&self) -> GradeRecord {
        GradeRecord {
            raw_score: self.grade.clone(),
            bonus_score: self.extra.clone(),
            category: self.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub due_date: NaiveDate,
    pub category: Category,
    pub google_classroom_id: Option<String>,
    pub google_course_id: Option<String>,
}

/// An assignment with its recomputed six-weeks period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedAssignment {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub six_weeks_period: SixWeeksPeriod,
    pub in_range: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocalStudent {
    pub id: i64,
    pub name: String,
    pub class_period: String,
}

/// A roster entry as Google Classroom reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassroomStudent {
    pub user_id: String,
    pub full_name: String,
    pub given_name: String,
    pub family_name: String,
    pub email_address: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentMatch {
    pub student_id: i64,
    pub class_period: String,
    pub google_id: String,
    pub google_email: String,
    pub google_name: String,
    pub similarity: f64,
}

/// Per-bucket means and the final average for one set of grade records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GradeBreakdown {
    pub daily_mean: f64,
    pub assessment_mean: f64,
    pub daily_count: usize,
    pub assessment_count: usize,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentAverage {
    pub student_id: i64,
    pub student_name: String,
    pub class_period: String,
    pub six_weeks_period: SixWeeksPeriod,
    pub breakdown: GradeBreakdown,
}
