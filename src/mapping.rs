//! Matching local roster entries to Google Classroom accounts by name.

use serde::Serialize;
use tracing::{debug, info};

use crate::models::{ClassroomStudent, LocalStudent, StudentMatch};
use crate::notify::{Notice, Notifier};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.8;

const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Lowercases, strips punctuation and collapses whitespace.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized edit-distance similarity in `0.0..=1.0`, counted over chars;
/// two empty names are identical.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedStudent {
    pub student_id: i64,
    pub name: String,
    pub class_period: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MappingOutcome {
    pub matches: Vec<StudentMatch>,
    pub unmatched: Vec<UnmatchedStudent>,
}

fn best_match<'a>(
    local_name: &str,
    classroom: &'a [ClassroomStudent],
    threshold: f64,
) -> Option<(&'a ClassroomStudent, f64)> {
    let mut best: Option<(&ClassroomStudent, f64)> = None;

    for candidate in classroom {
        let score = name_similarity(local_name, &normalize_name(&candidate.full_name));
        let highest = best.map(|(_, s)| s).unwrap_or(0.0);
        if score > highest && score > threshold {
            best = Some((candidate, score));
        }
    }

    best
}

/// Pairs each local student with the most similar Classroom student whose
/// similarity is strictly above `threshold`. One Classroom account may match
/// several local students.
pub fn match_students(
    classroom: &[ClassroomStudent],
    local: &[LocalStudent],
    threshold: f64,
    notifier: &dyn Notifier,
) -> MappingOutcome {
    info!(
        classroom = classroom.len(),
        local = local.len(),
        threshold,
        "matching students"
    );

    let mut outcome = MappingOutcome::default();

    for student in local {
        let normalized = normalize_name(&student.name);
        match best_match(&normalized, classroom, threshold) {
            Some((found, similarity)) => {
                debug!(
                    local = %student.name,
                    google = %found.full_name,
                    google_id = %found.user_id,
                    similarity,
                    "matched student"
                );
                outcome.matches.push(StudentMatch {
                    student_id: student.id,
                    class_period: student.class_period.clone(),
                    google_id: found.user_id.clone(),
                    google_email: found.email_address.clone(),
                    google_name: found.full_name.clone(),
                    similarity,
                });
            }
            None => {
                notifier.notify(&Notice::warning(
                    "No Classroom match",
                    format!("{} ({}) has no matching Classroom student", student.name, student.class_period),
                ));
                outcome.unmatched.push(UnmatchedStudent {
                    student_id: student.id,
                    name: student.name.clone(),
                    class_period: student.class_period.clone(),
                });
            }
        }
    }

    outcome
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentEmail {
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
}

/// Splits `first.last123@domain` into its name parts and three-character id.
pub fn parse_student_email(email: &str) -> Option<StudentEmail> {
    let local_part = email.split('@').next()?;
    let (first_name, last_with_id) = local_part.split_once('.')?;
    let chars: Vec<char> = last_with_id.chars().collect();
    if first_name.is_empty() || chars.len() <= 3 {
        return None;
    }

    let split = chars.len() - 3;
    Some(StudentEmail {
        first_name: first_name.to_string(),
        last_name: chars[..split].iter().collect(),
        student_id: chars[split..].iter().collect(),
    })
}

/// Builds a school address; only the first word of a multi-part last name
/// is used.
pub fn format_student_email(first_name: &str, last_name: &str, student_id: &str, domain: &str) -> String {
    let primary_last = last_name.split_whitespace().next().unwrap_or_default();
    format!(
        "{}.{}{}@{}",
        first_name.to_lowercase(),
        primary_last.to_lowercase(),
        student_id,
        domain
    )
}
