use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::grades::GradeBand;
use crate::models::{SixWeeksPeriod, StudentAverage};
use crate::period::PeriodCalendar;

#[derive(Debug, Clone, PartialEq)]
pub struct BandSummary {
    pub band: GradeBand,
    pub count: usize,
    pub avg_average: f64,
}

pub fn summarize_by_band(averages: &[StudentAverage]) -> Vec<BandSummary> {
    let mut map: HashMap<GradeBand, (usize, f64)> = HashMap::new();

    for average in averages {
        let band = GradeBand::from_average(average.breakdown.average);
        let entry = map.entry(band).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += average.breakdown.average;
    }

    let mut summaries: Vec<BandSummary> = map
        .into_iter()
        .map(|(band, (count, total))| BandSummary {
            band,
            count,
            avg_average: if count == 0 { 0.0 } else { total / count as f64 },
        })
        .collect();

    summaries.sort_by_key(|summary| summary.band);
    summaries
}

pub fn build_report(
    title: Option<&str>,
    calendar: &PeriodCalendar,
    averages: &[StudentAverage],
    as_of: NaiveDate,
) -> String {
    let summaries = summarize_by_band(averages);

    let mut output = String::new();
    let label = title.unwrap_or("all classes");

    let _ = writeln!(output, "# Six Weeks Grade Report");
    let _ = writeln!(
        output,
        "Generated for {} on {} (current period {})",
        label,
        as_of,
        calendar.resolve(as_of)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Band Distribution");

    if summaries.is_empty() {
        let _ = writeln!(output, "No grades recorded.");
    } else {
        for summary in &summaries {
            let _ = writeln!(
                output,
                "- {}: {} students (mean average {:.1})",
                summary.band, summary.count, summary.avg_average
            );
        }
    }

    let mut by_period: BTreeMap<SixWeeksPeriod, Vec<&StudentAverage>> = BTreeMap::new();
    for average in averages {
        by_period
            .entry(average.six_weeks_period)
            .or_default()
            .push(average);
    }

    for (period, students) in by_period {
        let _ = writeln!(output);
        match calendar.bounds(period) {
            Some(range) => {
                let _ = writeln!(output, "## {} ({} to {})", period, range.start, range.end);
            }
            None => {
                let _ = writeln!(output, "## {}", period);
            }
        }

        for student in students {
            let breakdown = &student.breakdown;
            let _ = writeln!(
                output,
                "- {} ({}): {:.1} [{}] daily {:.1} across {}, assessment {:.1} across {}",
                student.student_name,
                student.class_period,
                breakdown.average,
                GradeBand::from_average(breakdown.average),
                breakdown.daily_mean,
                breakdown.daily_count,
                breakdown.assessment_mean,
                breakdown.assessment_count
            );
        }
    }

    output
}

#[derive(Serialize)]
struct ExportRow<'a> {
    student_id: i64,
    student_name: &'a str,
    class_period: &'a str,
    six_weeks_period: SixWeeksPeriod,
    daily_mean: f64,
    daily_count: usize,
    assessment_mean: f64,
    assessment_count: usize,
    average: f64,
    band: String,
}

/// Writes one CSV row per student and period, with headers.
pub fn write_averages_csv(path: &Path, averages: &[StudentAverage]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    for average in averages {
        let breakdown = &average.breakdown;
        writer.serialize(ExportRow {
            student_id: average.student_id,
            student_name: &average.student_name,
            class_period: &average.class_period,
            six_weeks_period: average.six_weeks_period,
            daily_mean: breakdown.daily_mean,
            daily_count: breakdown.daily_count,
            assessment_mean: breakdown.assessment_mean,
            assessment_count: breakdown.assessment_count,
            average: breakdown.average,
            band: GradeBand::from_average(breakdown.average).to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}
