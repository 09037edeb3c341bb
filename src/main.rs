use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;

use sixweeks_gradebook::config::Settings;
use sixweeks_gradebook::grades::{self, staar_level, AveragePolicy, GradeBand};
use sixweeks_gradebook::mapping;
use sixweeks_gradebook::models::SixWeeksPeriod;
use sixweeks_gradebook::notify::TracingNotifier;
use sixweeks_gradebook::{logging, report, roster, sync};

#[derive(Parser)]
#[command(name = "sixweeks-gradebook")]
#[command(about = "Six-weeks gradebook averages and Google Classroom roster matching", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, env = "GRADEBOOK_CONFIG")]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the six-weeks period for a date (today by default)
    Period {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print how every range was checked, as JSON
        #[arg(long)]
        explain: bool,
    },
    /// List the configured grading calendar
    Calendar,
    /// Compute one assignment's effective score
    Score {
        #[arg(long)]
        raw: Option<String>,
        #[arg(long)]
        bonus: Option<String>,
    },
    /// Average each student's grades per six-weeks period
    Average {
        #[arg(long)]
        grades: PathBuf,
        #[arg(long)]
        policy: Option<AveragePolicy>,
        #[arg(long)]
        student: Option<i64>,
        #[arg(long)]
        period: Option<SixWeeksPeriod>,
        #[arg(long)]
        json: bool,
    },
    /// Recompute assignment periods from due dates
    Tag {
        #[arg(long)]
        assignments: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        grades: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export per-period averages as CSV
    Export {
        #[arg(long)]
        grades: PathBuf,
        #[arg(long, default_value = "averages.csv")]
        out: PathBuf,
    },
    /// Match local students to a saved Classroom roster
    Match {
        #[arg(long)]
        students: PathBuf,
        #[arg(long)]
        roster: PathBuf,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build a student's school email address, or split one apart
    Email {
        #[arg(long, conflicts_with_all = ["first", "last", "id"])]
        parse: Option<String>,
        #[arg(long, required_unless_present = "parse")]
        first: Option<String>,
        #[arg(long, required_unless_present = "parse")]
        last: Option<String>,
        #[arg(long, required_unless_present = "parse")]
        id: Option<String>,
    },
    /// Build Classroom submission updates without sending them
    SyncPlan {
        #[arg(long)]
        grades: PathBuf,
        #[arg(long)]
        assignments: PathBuf,
        #[arg(long)]
        students: PathBuf,
        #[arg(long)]
        roster: PathBuf,
        /// Set assigned grades instead of drafts
        #[arg(long)]
        publish: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn emit_json<T: serde::Serialize>(value: &T, out: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Written to {}.", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.log_json)?;

    let mut settings =
        Settings::resolve(cli.config.as_deref()).context("invalid gradebook configuration")?;
    let notifier = TracingNotifier;

    match cli.command {
        Commands::Period { date, explain } => {
            if explain {
                let date = date.unwrap_or_else(|| Local::now().date_naive());
                emit_json(&settings.calendar.explain(date), None)?;
            } else {
                let period = match date {
                    Some(date) => settings.calendar.resolve(date),
                    None => settings.calendar.current(),
                };
                println!("{period}");
            }
        }
        Commands::Calendar => {
            for range in settings.calendar.ranges() {
                println!("{} {} to {}", range.period, range.start, range.end);
            }
            println!("Dates outside these ranges resolve to {}.", settings.calendar.fallback());
        }
        Commands::Score { raw, bonus } => {
            println!(
                "{}",
                grades::effective_score(raw.as_deref(), bonus.as_deref())
            );
        }
        Commands::Average {
            grades: path,
            policy,
            student,
            period,
            json,
        } => {
            if let Some(policy) = policy {
                settings.aggregator.policy = policy;
            }
            let rows = roster::load_grade_rows(&path)?;
            let averages: Vec<_> =
                grades::student_averages(&rows, &settings.calendar, &settings.aggregator)
                    .into_iter()
                    .filter(|a| student.map_or(true, |id| a.student_id == id))
                    .filter(|a| period.map_or(true, |p| a.six_weeks_period == p))
                    .collect();

            if json {
                emit_json(&averages, None)?;
                return Ok(());
            }

            if averages.is_empty() {
                println!("No grades found for this selection.");
                return Ok(());
            }

            println!("Averages ({} policy):", settings.aggregator.policy);
            for average in &averages {
                let value = average.breakdown.average;
                println!(
                    "- {} ({}, {}) {:.1} [{}, STAAR {}]",
                    average.student_name,
                    average.class_period,
                    average.six_weeks_period,
                    value,
                    GradeBand::from_average(value),
                    staar_level(value)
                );
            }
        }
        Commands::Tag { assignments, out } => {
            let assignments = roster::load_assignments(&assignments)?;
            let tagged = settings.calendar.tag_assignments(&assignments, &notifier);
            emit_json(&tagged, out.as_deref())?;
        }
        Commands::Report {
            grades: path,
            title,
            as_of,
            out,
        } => {
            let rows = roster::load_grade_rows(&path)?;
            let averages =
                grades::student_averages(&rows, &settings.calendar, &settings.aggregator);
            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            let markdown =
                report::build_report(title.as_deref(), &settings.calendar, &averages, as_of);
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { grades: path, out } => {
            let rows = roster::load_grade_rows(&path)?;
            let averages =
                grades::student_averages(&rows, &settings.calendar, &settings.aggregator);
            report::write_averages_csv(&out, &averages)?;
            println!("Exported {} averages to {}.", averages.len(), out.display());
        }
        Commands::Match {
            students,
            roster: roster_path,
            threshold,
            out,
        } => {
            let local = roster::load_local_students(&students)?;
            let classroom = roster::load_classroom_students(&roster_path)?;
            let threshold = threshold.unwrap_or(settings.match_threshold);
            let outcome = mapping::match_students(&classroom, &local, threshold, &notifier);
            info!(
                matched = outcome.matches.len(),
                unmatched = outcome.unmatched.len(),
                "student matching finished"
            );
            emit_json(&outcome, out.as_deref())?;
        }
        Commands::Email {
            parse,
            first,
            last,
            id,
        } => match parse {
            Some(email) => {
                let parsed = mapping::parse_student_email(&email)
                    .with_context(|| format!("{email} is not a first.last### address"))?;
                println!(
                    "{} {} (student id {})",
                    parsed.first_name, parsed.last_name, parsed.student_id
                );
            }
            None => {
                let email = mapping::format_student_email(
                    first.as_deref().unwrap_or_default(),
                    last.as_deref().unwrap_or_default(),
                    id.as_deref().unwrap_or_default(),
                    &settings.email_domain,
                );
                println!("{email}");
            }
        },
        Commands::SyncPlan {
            grades: path,
            assignments,
            students,
            roster: roster_path,
            publish,
            out,
        } => {
            let rows = roster::load_grade_rows(&path)?;
            let assignments = roster::load_assignments(&assignments)?;
            let local = roster::load_local_students(&students)?;
            let classroom = roster::load_classroom_students(&roster_path)?;
            let outcome =
                mapping::match_students(&classroom, &local, settings.match_threshold, &notifier);
            let plan = sync::plan_grade_sync(
                &rows,
                &assignments,
                &outcome.matches,
                sync::SyncOptions { publish },
                &notifier,
            );
            emit_json(&plan, out.as_deref())?;
        }
    }

    Ok(())
}
