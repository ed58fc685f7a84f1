//! Teacher, assistant and student records plus their raw-input drafts.
//!
//! # Responsibility
//! - Define the typed records persisted one-to-one as table rows.
//! - Parse and validate raw form input into records.
//!
//! # Invariants
//! - `id` and `name` are never blank on a valid record.
//! - `salary` is finite.
//! - Categorical fields are always canonical enum values.

use crate::model::category::{Category, Department, Speciality, Subject};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Raised before any store access when input cannot become a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    BlankField(&'static str),
    #[error("{field} must be {expected}, got `{value}`")]
    NonNumeric {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// The three record kinds, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PersonKind {
    Teacher,
    Assistant,
    Student,
}

impl PersonKind {
    pub const ALL: [Self; 3] = [Self::Teacher, Self::Assistant, Self::Student];

    pub fn label(self) -> &'static str {
        match self {
            Self::Teacher => "Teacher",
            Self::Assistant => "Assistant",
            Self::Student => "Student",
        }
    }

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Assistant => "assistant",
            Self::Student => "student",
        }
    }
}

impl Display for PersonKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Salaried staff data shared by teachers and assistants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub salary: f64,
    pub department: Department,
}

impl Employee {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        salary: f64,
        department: Department,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            salary,
            department,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("ID", &self.id)?;
        require("Name", &self.name)?;
        if !self.salary.is_finite() {
            return Err(ValidationError::NonNumeric {
                field: "Salary",
                expected: "numeric",
                value: self.salary.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    #[serde(flatten)]
    pub employee: Employee,
    pub subject: Subject,
}

impl Teacher {
    pub fn new(employee: Employee, subject: Subject) -> Self {
        Self { employee, subject }
    }

    pub fn id(&self) -> &str {
        &self.employee.id
    }

    pub fn name(&self) -> &str {
        &self.employee.name
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.employee.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    #[serde(flatten)]
    pub employee: Employee,
}

impl Assistant {
    pub fn new(employee: Employee) -> Self {
        Self { employee }
    }

    pub fn id(&self) -> &str {
        &self.employee.id
    }

    pub fn name(&self) -> &str {
        &self.employee.name
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.employee.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub grade: i64,
    pub speciality: Speciality,
}

impl Student {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        grade: i64,
        speciality: Speciality,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            grade,
            speciality,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("ID", &self.id)?;
        require("Name", &self.name)?;
        Ok(())
    }
}

/// Any one record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Person {
    Teacher(Teacher),
    Assistant(Assistant),
    Student(Student),
}

impl Person {
    pub fn kind(&self) -> PersonKind {
        match self {
            Self::Teacher(_) => PersonKind::Teacher,
            Self::Assistant(_) => PersonKind::Assistant,
            Self::Student(_) => PersonKind::Student,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Teacher(t) => t.id(),
            Self::Assistant(a) => a.id(),
            Self::Student(s) => &s.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Teacher(t) => t.name(),
            Self::Assistant(a) => a.name(),
            Self::Student(s) => &s.name,
        }
    }

    /// Text form of the record, as an edit form would show it.
    pub fn to_draft(&self) -> PersonDraft {
        match self {
            Self::Teacher(t) => PersonDraft::Teacher(TeacherDraft {
                id: t.employee.id.clone(),
                name: t.employee.name.clone(),
                salary: t.employee.salary.to_string(),
                department: t.employee.department.label().to_string(),
                subject: t.subject.label().to_string(),
            }),
            Self::Assistant(a) => PersonDraft::Assistant(AssistantDraft {
                id: a.employee.id.clone(),
                name: a.employee.name.clone(),
                salary: a.employee.salary.to_string(),
                department: a.employee.department.label().to_string(),
            }),
            Self::Student(s) => PersonDraft::Student(StudentDraft {
                id: s.id.clone(),
                name: s.name.clone(),
                grade: s.grade.to_string(),
                speciality: s.speciality.label().to_string(),
            }),
        }
    }
}

/// Parses a salary typed with either `.` or `,` as decimal separator.
pub fn parse_salary(raw: &str) -> Result<f64, ValidationError> {
    let normalized = raw.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ValidationError::NonNumeric {
            field: "Salary",
            expected: "numeric",
            value: raw.to_string(),
        })
}

/// Parses a grade as a strict integer.
pub fn parse_grade(raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NonNumeric {
            field: "Grade",
            expected: "integer",
            value: raw.to_string(),
        })
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::BlankField(field))
    } else {
        Ok(())
    }
}

/// Raw teacher form input; every field is text as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherDraft {
    pub id: String,
    pub name: String,
    pub salary: String,
    pub department: String,
    pub subject: String,
}

impl TeacherDraft {
    pub fn to_record(&self) -> Result<Teacher, ValidationError> {
        let employee = employee_from_parts(&self.id, &self.name, &self.salary, &self.department)?;
        Ok(Teacher::new(employee, Subject::normalize(&self.subject)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantDraft {
    pub id: String,
    pub name: String,
    pub salary: String,
    pub department: String,
}

impl AssistantDraft {
    pub fn to_record(&self) -> Result<Assistant, ValidationError> {
        let employee = employee_from_parts(&self.id, &self.name, &self.salary, &self.department)?;
        Ok(Assistant::new(employee))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentDraft {
    pub id: String,
    pub name: String,
    pub grade: String,
    pub speciality: String,
}

impl StudentDraft {
    pub fn to_record(&self) -> Result<Student, ValidationError> {
        require("ID", &self.id)?;
        require("Name", &self.name)?;
        require("Grade", &self.grade)?;
        Ok(Student::new(
            self.id.trim(),
            self.name.as_str(),
            parse_grade(&self.grade)?,
            Speciality::normalize(&self.speciality),
        ))
    }
}

fn employee_from_parts(
    id: &str,
    name: &str,
    salary: &str,
    department: &str,
) -> Result<Employee, ValidationError> {
    require("ID", id)?;
    require("Name", name)?;
    require("Salary", salary)?;
    Ok(Employee::new(
        id.trim(),
        name,
        parse_salary(salary)?,
        Department::normalize(department),
    ))
}

/// Raw input for any record kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PersonDraft {
    Teacher(TeacherDraft),
    Assistant(AssistantDraft),
    Student(StudentDraft),
}

impl PersonDraft {
    pub fn kind(&self) -> PersonKind {
        match self {
            Self::Teacher(_) => PersonKind::Teacher,
            Self::Assistant(_) => PersonKind::Assistant,
            Self::Student(_) => PersonKind::Student,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Teacher(d) => &d.id,
            Self::Assistant(d) => &d.id,
            Self::Student(d) => &d.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Teacher(d) => &d.name,
            Self::Assistant(d) => &d.name,
            Self::Student(d) => &d.name,
        }
    }

    /// Replaces a blank id with `fallback`.
    pub fn with_default_id(mut self, fallback: &str) -> Self {
        let slot = match &mut self {
            Self::Teacher(d) => &mut d.id,
            Self::Assistant(d) => &mut d.id,
            Self::Student(d) => &mut d.id,
        };
        if slot.trim().is_empty() {
            *slot = fallback.to_string();
        }
        self
    }

    /// Fills blank fields from `base` when both drafts are the same kind.
    pub fn fill_blanks_from(mut self, base: &PersonDraft) -> Self {
        match (&mut self, base) {
            (Self::Teacher(d), Self::Teacher(b)) => {
                keep_or_fill(&mut d.id, &b.id);
                keep_or_fill(&mut d.name, &b.name);
                keep_or_fill(&mut d.salary, &b.salary);
                keep_or_fill(&mut d.department, &b.department);
                keep_or_fill(&mut d.subject, &b.subject);
            }
            (Self::Assistant(d), Self::Assistant(b)) => {
                keep_or_fill(&mut d.id, &b.id);
                keep_or_fill(&mut d.name, &b.name);
                keep_or_fill(&mut d.salary, &b.salary);
                keep_or_fill(&mut d.department, &b.department);
            }
            (Self::Student(d), Self::Student(b)) => {
                keep_or_fill(&mut d.id, &b.id);
                keep_or_fill(&mut d.name, &b.name);
                keep_or_fill(&mut d.grade, &b.grade);
                keep_or_fill(&mut d.speciality, &b.speciality);
            }
            _ => {}
        }
        self
    }

    pub fn to_record(&self) -> Result<Person, ValidationError> {
        Ok(match self {
            Self::Teacher(d) => Person::Teacher(d.to_record()?),
            Self::Assistant(d) => Person::Assistant(d.to_record()?),
            Self::Student(d) => Person::Student(d.to_record()?),
        })
    }
}

fn keep_or_fill(slot: &mut String, base: &str) {
    if slot.trim().is_empty() {
        *slot = base.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_grade, parse_salary, AssistantDraft, Employee, Person, PersonDraft, StudentDraft,
        Teacher, TeacherDraft, ValidationError,
    };
    use crate::model::category::{Department, Speciality, Subject};

    #[test]
    fn salary_accepts_comma_or_dot() {
        assert_eq!(parse_salary("1500").unwrap(), 1500.0);
        assert_eq!(parse_salary(" 1500,50 ").unwrap(), 1500.5);
        assert_eq!(parse_salary("1500.25").unwrap(), 1500.25);
    }

    #[test]
    fn salary_rejects_text_and_non_finite_values() {
        for raw in ["abc", "", "inf", "NaN", "1,2,3"] {
            let err = parse_salary(raw).unwrap_err();
            assert!(matches!(err, ValidationError::NonNumeric { field: "Salary", .. }));
        }
    }

    #[test]
    fn grade_is_strict_integer() {
        assert_eq!(parse_grade(" 9 ").unwrap(), 9);
        assert!(parse_grade("9.5").is_err());
        assert!(parse_grade("nine").is_err());
    }

    #[test]
    fn teacher_draft_normalizes_categories() {
        let draft = TeacherDraft {
            id: "T1".into(),
            name: "Alice".into(),
            salary: "1000,5".into(),
            department: "eng".into(),
            subject: "".into(),
        };
        let teacher = draft.to_record().unwrap();
        assert_eq!(teacher.employee.salary, 1000.5);
        assert_eq!(teacher.employee.department, Department::Engineering);
        assert_eq!(teacher.subject, Subject::Unknown);
    }

    #[test]
    fn blank_required_fields_are_reported_before_parsing() {
        let draft = AssistantDraft {
            id: " ".into(),
            name: "Bob".into(),
            salary: "oops".into(),
            department: "hr".into(),
        };
        assert_eq!(
            draft.to_record().unwrap_err(),
            ValidationError::BlankField("ID")
        );

        let student = StudentDraft {
            id: "S1".into(),
            name: "Eve".into(),
            grade: "".into(),
            speciality: "cs".into(),
        };
        assert_eq!(
            student.to_record().unwrap_err(),
            ValidationError::BlankField("Grade")
        );
    }

    #[test]
    fn person_draft_keeps_original_id_when_blank() {
        let draft = PersonDraft::Student(StudentDraft {
            id: "".into(),
            name: "Eve".into(),
            grade: "7".into(),
            speciality: "math".into(),
        })
        .with_default_id("S-1");
        let record = draft.to_record().unwrap();
        assert_eq!(record.id(), "S-1");
        assert!(matches!(
            record,
            super::Person::Student(ref s) if s.speciality == Speciality::Mathematics
        ));
    }

    #[test]
    fn employee_validation_rejects_non_finite_salary() {
        let employee = Employee::new("E1", "Zed", f64::NAN, Department::Finance);
        assert!(employee.validate().is_err());
    }

    #[test]
    fn draft_deserializes_with_missing_fields() {
        let draft: PersonDraft =
            serde_json::from_str(r#"{"kind":"Assistant","id":"A1","name":"Ann","salary":"900"}"#)
                .unwrap();
        let record = draft.to_record().unwrap();
        assert_eq!(record.kind(), super::PersonKind::Assistant);
    }

    #[test]
    fn partial_edit_keeps_existing_values() {
        let existing = Person::Teacher(Teacher::new(
            Employee::new("T1", "Alice", 1200.0, Department::Finance),
            Subject::Physics,
        ));
        let edit = PersonDraft::Teacher(TeacherDraft {
            salary: "1300".into(),
            ..TeacherDraft::default()
        })
        .fill_blanks_from(&existing.to_draft());

        let Person::Teacher(updated) = edit.to_record().unwrap() else {
            panic!("expected teacher");
        };
        assert_eq!(updated.id(), "T1");
        assert_eq!(updated.name(), "Alice");
        assert_eq!(updated.employee.salary, 1300.0);
        assert_eq!(updated.employee.department, Department::Finance);
        assert_eq!(updated.subject, Subject::Physics);
    }
}
