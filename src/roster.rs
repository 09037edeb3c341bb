//! Loaders that turn gradebook exports into validated records.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::RosterError;
use crate::models::{Assignment, ClassroomStudent, GradeRow, LocalStudent};

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, RosterError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| RosterError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<T>().enumerate() {
        let row = result.map_err(|source| RosterError::Row {
            path: path.to_path_buf(),
            row: index as u64 + 1,
            source,
        })?;
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), "loaded csv");
    Ok(rows)
}

/// Columns: `student_id,student_name,class_period,assignment,due_date,category,grade,extra`.
pub fn load_grade_rows(path: &Path) -> Result<Vec<GradeRow>, RosterError> {
    read_csv(path)
}

/// Columns: `name,due_date,category,google_classroom_id,google_course_id`.
pub fn load_assignments(path: &Path) -> Result<Vec<Assignment>, RosterError> {
    read_csv(path)
}

/// Columns: `id,name,class_period`.
pub fn load_local_students(path: &Path) -> Result<Vec<LocalStudent>, RosterError> {
    read_csv(path)
}

#[derive(Deserialize)]
struct RosterPage {
    #[serde(default)]
    students: Vec<RosterEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterEntry {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    profile: RosterProfile,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RosterProfile {
    #[serde(default)]
    name: RosterName,
    #[serde(default)]
    email_address: String,
    photo_url: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RosterName {
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    family_name: String,
    #[serde(default)]
    full_name: String,
}

/// Parses a saved `courses.students.list` response body.
pub fn parse_classroom_students(json: &str) -> Result<Vec<ClassroomStudent>, serde_json::Error> {
    let page: RosterPage = serde_json::from_str(json)?;
    Ok(page
        .students
        .into_iter()
        .map(|entry| ClassroomStudent {
            user_id: entry.user_id,
            full_name: entry.profile.name.full_name,
            given_name: entry.profile.name.given_name,
            family_name: entry.profile.name.family_name,
            email_address: entry.profile.email_address,
            photo_url: entry.profile.photo_url,
        })
        .collect())
}

pub fn load_classroom_students(path: &Path) -> Result<Vec<ClassroomStudent>, RosterError> {
    let content = std::fs::read_to_string(path).map_err(|source| RosterError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let students = parse_classroom_students(&content).map_err(|source| RosterError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), students = students.len(), "loaded classroom roster");
    Ok(students)
}
