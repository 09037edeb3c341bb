//! Gradebook core: six-weeks period resolution, grade averaging and
//! Google Classroom roster matching.

pub mod config;
pub mod error;
pub mod grades;
pub mod logging;
pub mod mapping;
pub mod models;
pub mod notify;
pub mod period;
pub mod report;
pub mod roster;
pub mod sync;

pub use grades::{effective_score, flat_average, weighted_average, Aggregator, AveragePolicy};
pub use models::{Category, GradeRecord, SixWeeksPeriod};
pub use period::{current_period, resolve_period, PeriodCalendar};
