use crate::data::{Exam, RawStudent, RollNumber, Student};
use crate::error::{RosterIssue, SeatingError, SeatingResult};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const MIN_SEMESTER: u8 = 1;
pub const MAX_SEMESTER: u8 = 8;

/// How the loader reacts to bad rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadMode {
    /// Stop at the first offending row.
    FailFast,
    /// Check every row and report all issues together.
    #[default]
    CollectAll,
}

/// Students keyed by roll number, in the order they were supplied.
#[derive(Debug, Clone, Default)]
pub struct ValidatedRoster {
    students: Vec<Student>,
    index: HashMap<RollNumber, usize>,
}

impl ValidatedRoster {
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn get(&self, roll_number: &str) -> Option<&Student> {
        self.index.get(roll_number).map(|&i| &self.students[i])
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Students the exam admits, in roster order.
    pub fn eligible_for(&self, exam: &Exam) -> Vec<Student> {
        self.students
            .iter()
            .filter(|s| exam.admits(s))
            .cloned()
            .collect()
    }

    pub fn department_counts(&self) -> BTreeMap<String, usize> {
        self.students
            .iter()
            .map(|s| s.department.clone())
            .counts()
            .into_iter()
            .collect()
    }
}

/// Validates raw rows into a roster. Pure: nothing outside the return value changes.
pub fn load(rows: &[RawStudent], mode: LoadMode) -> SeatingResult<ValidatedRoster> {
    let mut roster = ValidatedRoster::default();
    let mut issues = Vec::new();

    for (i, raw) in rows.iter().enumerate() {
        let row = i + 1;
        match validate_row(row, raw, &roster.index) {
            Ok(student) => {
                roster
                    .index
                    .insert(student.roll_number.clone(), roster.students.len());
                roster.students.push(student);
            }
            Err(issue) => {
                debug!("Rejected roster {}", issue);
                if mode == LoadMode::FailFast {
                    return Err(SeatingError::Roster(issue));
                }
                issues.push(issue);
            }
        }
    }

    if !issues.is_empty() {
        info!(
            "Roster load rejected {} of {} rows.",
            issues.len(),
            rows.len()
        );
        return Err(SeatingError::RosterBatch(issues));
    }

    info!("Loaded roster with {} students.", roster.len());
    Ok(roster)
}

fn validate_row(
    row: usize,
    raw: &RawStudent,
    seen: &HashMap<RollNumber, usize>,
) -> Result<Student, RosterIssue> {
    let roll_number = raw.roll_number.trim();
    if roll_number.is_empty() {
        return Err(RosterIssue::EmptyRollNumber { row });
    }
    if seen.contains_key(roll_number) {
        return Err(RosterIssue::DuplicateRollNumber {
            row,
            roll_number: roll_number.to_string(),
        });
    }

    let name = raw.name.trim();
    if name.is_empty() {
        return Err(RosterIssue::EmptyField {
            row,
            roll_number: roll_number.to_string(),
            field: "name",
        });
    }

    let department = raw.department.trim();
    if department.is_empty() {
        return Err(RosterIssue::EmptyField {
            row,
            roll_number: roll_number.to_string(),
            field: "department",
        });
    }

    let semester = raw
        .semester
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|s| (MIN_SEMESTER..=MAX_SEMESTER).contains(s))
        .ok_or_else(|| RosterIssue::InvalidSemester {
            row,
            roll_number: roll_number.to_string(),
            value: raw.semester.clone(),
        })?;

    let section = raw
        .section
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(Student {
        roll_number: roll_number.to_string(),
        name: name.to_string(),
        department: department.to_string(),
        semester,
        section,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(roll: &str, dept: &str, semester: &str) -> RawStudent {
        RawStudent {
            roll_number: roll.to_string(),
            name: format!("Student {roll}"),
            department: dept.to_string(),
            semester: semester.to_string(),
            section: None,
        }
    }

    #[test]
    fn test_load_preserves_insertion_order() {
        let rows = vec![raw("CS003", "CS", "5"), raw("CS001", "CS", "5"), raw("EC002", "EC", "3")];
        let roster = load(&rows, LoadMode::FailFast).unwrap();
        let rolls: Vec<_> = roster.students().iter().map(|s| s.roll_number.as_str()).collect();
        assert_eq!(rolls, ["CS003", "CS001", "EC002"]);
        assert_eq!(roster.get("EC002").unwrap().semester, 3);
        assert!(roster.get("ME001").is_none());
    }

    #[test]
    fn test_load_trims_fields() {
        let mut row = raw("  CS001 ", " CS ", " 4 ");
        row.section = Some("  ".to_string());
        let roster = load(&[row], LoadMode::FailFast).unwrap();
        let student = roster.get("CS001").unwrap();
        assert_eq!(student.department, "CS");
        assert_eq!(student.semester, 4);
        assert_eq!(student.section, None);
    }

    #[test]
    fn test_fail_fast_stops_at_first_issue() {
        let rows = vec![raw("CS001", "CS", "5"), raw("CS001", "CS", "5"), raw("CS002", "CS", "9")];
        let err = load(&rows, LoadMode::FailFast).unwrap_err();
        assert_eq!(
            err,
            SeatingError::Roster(RosterIssue::DuplicateRollNumber {
                row: 2,
                roll_number: "CS001".into()
            })
        );
        assert_eq!(err.kind(), "DuplicateRollNumberError");
    }

    #[test]
    fn test_collect_all_reports_every_row() {
        let rows = vec![
            raw("CS001", "CS", "5"),
            raw("CS001", "CS", "5"),
            raw("CS002", "CS", "0"),
            raw("CS003", "", "2"),
            raw("", "EC", "2"),
            raw("CS004", "CS", "eight"),
        ];
        let SeatingError::RosterBatch(issues) = load(&rows, LoadMode::CollectAll).unwrap_err() else {
            panic!("expected a batch report");
        };
        let kinds: Vec<_> = issues.iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            [
                "DuplicateRollNumberError",
                "InvalidSemesterError",
                "ValidationError",
                "ValidationError",
                "InvalidSemesterError",
            ]
        );
    }

    #[test]
    fn test_semester_bounds() {
        assert!(load(&[raw("A", "CS", "1")], LoadMode::FailFast).is_ok());
        assert!(load(&[raw("A", "CS", "8")], LoadMode::FailFast).is_ok());
        assert!(load(&[raw("A", "CS", "9")], LoadMode::FailFast).is_err());
        assert!(load(&[raw("A", "CS", "-1")], LoadMode::FailFast).is_err());
    }

    #[test]
    fn test_eligibility_filters() {
        let rows = vec![raw("CS001", "CS", "5"), raw("EC001", "EC", "5"), raw("CS101", "CS", "3")];
        let roster = load(&rows, LoadMode::FailFast).unwrap();
        let exam = Exam {
            exam_id: "mid1".into(),
            name: "Mid Semester 1".into(),
            date: "2024-12-10".into(),
            departments: vec!["CS".into()],
            semesters: vec![5],
        };
        let eligible = roster.eligible_for(&exam);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].roll_number, "CS001");
        assert_eq!(roster.department_counts()["CS"], 2);
    }
}
