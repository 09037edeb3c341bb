use chrono::NaiveDate;
use sixweeks_gradebook::grades::student_averages;
use sixweeks_gradebook::notify::MemoryNotifier;
use sixweeks_gradebook::roster::{load_grade_rows, parse_classroom_students};
use sixweeks_gradebook::{
    effective_score, flat_average, mapping, resolve_period, weighted_average, Aggregator,
    Category, GradeRecord, PeriodCalendar, SixWeeksPeriod,
};
use std::io::Write;

#[test]
fn worked_example_averages() {
    let records = vec![
        GradeRecord::new("90", "0", Category::Daily),
        GradeRecord::new("100", "5", Category::Daily),
        GradeRecord::new("70", "0", Category::Assessment),
    ];

    assert_eq!(weighted_average(&records), 90.0);
    assert_eq!(flat_average(&records), 86.7);
    assert_eq!(effective_score(Some(""), Some("")), 0);
    assert_eq!(effective_score(Some("95"), Some("10")), 100);
}

#[test]
fn out_of_calendar_dates_never_fail() {
    let before = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let gap = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
    assert_eq!(resolve_period(before), SixWeeksPeriod::Sixth);
    assert_eq!(resolve_period(gap), SixWeeksPeriod::Sixth);
}

#[test]
fn gradebook_export_to_period_averages() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "student_id,student_name,class_period,assignment,due_date,category,grade,extra"
    )
    .unwrap();
    writeln!(file, "1,Avery Lee,1st,Unit rates,2024-09-03,Daily,90,0").unwrap();
    writeln!(file, "1,Avery Lee,1st,Proportions,2024-09-10,Daily,100,5").unwrap();
    writeln!(file, "1,Avery Lee,1st,Quiz 1,2024-09-12,Assessment,70,").unwrap();
    writeln!(file, "1,Avery Lee,1st,Slope,2024-11-12,Daily,absent,").unwrap();

    let rows = load_grade_rows(file.path()).unwrap();
    let averages = student_averages(&rows, &PeriodCalendar::default(), &Aggregator::default());

    assert_eq!(averages.len(), 2);
    assert_eq!(averages[0].six_weeks_period, SixWeeksPeriod::First);
    assert_eq!(averages[0].breakdown.average, 90.0);
    assert_eq!(averages[1].six_weeks_period, SixWeeksPeriod::Third);
    assert_eq!(averages[1].breakdown.average, 0.0);
}

#[test]
fn roster_matching_from_saved_classroom_response() {
    let classroom = parse_classroom_students(
        r#"{"students": [
            {"userId": "u1", "profile": {"name": {"fullName": "Kiara Patel"}, "emailAddress": "kiara.patel204@school.test"}},
            {"userId": "u2", "profile": {"name": {"fullName": "Jules Moreno"}, "emailAddress": "jules.moreno118@school.test"}}
        ]}"#,
    )
    .unwrap();
    let local = vec![sixweeks_gradebook::models::LocalStudent {
        id: 42,
        name: "Patel, Kiara".to_string(),
        class_period: "5th".to_string(),
    }];
    let notifier = MemoryNotifier::default();

    let outcome = mapping::match_students(&classroom, &local, 0.5, &notifier);

    // "patel kiara" vs "kiara patel" is not close enough even at 0.5
    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.unmatched[0].student_id, 42);
    assert_eq!(notifier.notices().len(), 1);
}
