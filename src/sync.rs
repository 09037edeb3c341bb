//! Plans Google Classroom submission updates from local grades.
//!
//! Only the request payloads are built here; sending them belongs to the
//! Classroom client.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::models::{Assignment, GradeRow, StudentMatch};
use crate::notify::{Notice, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateMask {
    #[serde(rename = "assignedGrade")]
    AssignedGrade,
    #[serde(rename = "draftGrade")]
    DraftGrade,
}

/// Body of a `courses.courseWork.studentSubmissions.patch` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPatch {
    pub course_id: String,
    pub course_work_id: String,
    pub user_id: String,
    pub update_mask: UpdateMask,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_grade: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_grade: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnknownAssignment,
    AssignmentNotLinked,
    StudentNotMapped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedGrade {
    pub student_id: i64,
    pub assignment: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SyncPlan {
    pub patches: Vec<SubmissionPatch>,
    pub skipped: Vec<SkippedGrade>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    /// Return grades to students instead of leaving drafts.
    pub publish: bool,
}

/// Assignments are joined by name; when a name repeats, the first one is
/// used and the repeat is reported to `notifier`.
pub fn plan_grade_sync(
    rows: &[GradeRow],
    assignments: &[Assignment],
    matches: &[StudentMatch],
    options: SyncOptions,
    notifier: &dyn Notifier,
) -> SyncPlan {
    let mut by_name: HashMap<&str, &Assignment> = HashMap::new();
    for assignment in assignments {
        match by_name.entry(assignment.name.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(assignment);
            }
            Entry::Occupied(_) => {
                notifier.notify(&Notice::warning(
                    "Duplicate assignment name",
                    format!(
                        "{} appears more than once; grades sync to the first one (due {})",
                        assignment.name, assignment.due_date
                    ),
                ));
            }
        }
    }
    let by_student: HashMap<i64, &StudentMatch> = matches
        .iter()
        .map(|found| (found.student_id, found))
        .collect();

    let mut plan = SyncPlan::default();

    for row in rows {
        let skip = |reason| SkippedGrade {
            student_id: row.student_id,
            assignment: row.assignment.clone(),
            reason,
        };

        let Some(assignment) = by_name.get(row.assignment.as_str()) else {
            plan.skipped.push(skip(SkipReason::UnknownAssignment));
            continue;
        };
        let (Some(course_id), Some(course_work_id)) = (
            assignment.google_course_id.as_ref(),
            assignment.google_classroom_id.as_ref(),
        ) else {
            plan.skipped.push(skip(SkipReason::AssignmentNotLinked));
            continue;
        };
        let Some(student) = by_student.get(&row.student_id) else {
            plan.skipped.push(skip(SkipReason::StudentNotMapped));
            continue;
        };

        let score = row.to_record().effective_score();
        let (update_mask, assigned_grade, draft_grade) = if options.publish {
            (UpdateMask::AssignedGrade, Some(score), None)
        } else {
            (UpdateMask::DraftGrade, None, Some(score))
        };

        plan.patches.push(SubmissionPatch {
            course_id: course_id.clone(),
            course_work_id: course_work_id.clone(),
            user_id: student.google_id.clone(),
            update_mask,
            assigned_grade,
            draft_grade,
        });
    }

    info!(
        patches = plan.patches.len(),
        skipped = plan.skipped.len(),
        publish = options.publish,
        "planned grade sync"
    );

    if !plan.skipped.is_empty() {
        notifier.notify(&Notice::warning(
            "Grades left out of sync",
            format!(
                "{} of {} grades could not be linked to Classroom",
                plan.skipped.len(),
                rows.len()
            ),
        ));
    }

    plan
}
