//! School repository contract and store-backed implementation.
//!
//! # Responsibility
//! - CRUD for teachers, assistants and students over the gateway.
//! - Defensive re-normalization of persisted rows at startup.
//!
//! # Invariants
//! - `add_*` / `update_*` validate before touching the store.
//! - `delete_*` is idempotent and succeeds when nothing matched.
//! - Lists are ordered by `name ASC, id ASC` using the store collation.

use super::stats::{self, CategoryAverage, CategoryCount};
use super::{RepoError, RepoResult};
use crate::db::{Database, DbValue, Row};
use crate::model::category::{Category, Department, Speciality, Subject};
use crate::model::person::{
    parse_grade, parse_salary, Assistant, Employee, PersonKind, Student, Teacher,
};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

const TEACHER_SELECT_SQL: &str = "SELECT id, name, salary, department, subject FROM teacher";
const ASSISTANT_SELECT_SQL: &str = "SELECT id, name, salary, department FROM assistant";
const STUDENT_SELECT_SQL: &str = "SELECT id, name, grade, speciality FROM student";

const TEACHER_UPDATE_SQL: &str = "UPDATE teacher
     SET id = ?1, name = ?2, salary = ?3, department = ?4, subject = ?5
     WHERE id = ?6";
const ASSISTANT_UPDATE_SQL: &str = "UPDATE assistant
     SET id = ?1, name = ?2, salary = ?3, department = ?4
     WHERE id = ?5";
const STUDENT_UPDATE_SQL: &str = "UPDATE student
     SET id = ?1, name = ?2, grade = ?3, speciality = ?4
     WHERE id = ?5";

/// Outcome of [`SchoolRepository::normalize_db_values`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// Rows read across all three tables.
    pub scanned: usize,
    /// Rows whose stored values changed.
    pub rewritten: usize,
    /// Rows that could not be repaired and were left untouched.
    pub failed: usize,
}

/// Data access contract for the school roster.
pub trait SchoolRepository {
    fn add_teacher(&self, teacher: &Teacher) -> RepoResult<()>;
    fn update_teacher(&self, teacher: &Teacher) -> RepoResult<()>;
    fn update_teacher_by_id(&self, old_id: &str, teacher: &Teacher) -> RepoResult<()>;
    fn delete_teacher(&self, id: &str) -> RepoResult<()>;
    fn get_teacher(&self, id: &str) -> RepoResult<Option<Teacher>>;
    fn list_teachers(&self) -> RepoResult<Vec<Teacher>>;

    fn add_assistant(&self, assistant: &Assistant) -> RepoResult<()>;
    fn update_assistant(&self, assistant: &Assistant) -> RepoResult<()>;
    fn update_assistant_by_id(&self, old_id: &str, assistant: &Assistant) -> RepoResult<()>;
    fn delete_assistant(&self, id: &str) -> RepoResult<()>;
    fn get_assistant(&self, id: &str) -> RepoResult<Option<Assistant>>;
    fn list_assistants(&self) -> RepoResult<Vec<Assistant>>;

    fn add_student(&self, student: &Student) -> RepoResult<()>;
    fn update_student(&self, student: &Student) -> RepoResult<()>;
    fn update_student_by_id(&self, old_id: &str, student: &Student) -> RepoResult<()>;
    fn delete_student(&self, id: &str) -> RepoResult<()>;
    fn get_student(&self, id: &str) -> RepoResult<Option<Student>>;
    fn list_students(&self) -> RepoResult<Vec<Student>>;

    /// Row counts in fixed order: teacher, assistant, student.
    fn counts_by_role(&self) -> RepoResult<Vec<(PersonKind, i64)>>;
    /// Sorted by count descending, then speciality ascending.
    fn students_by_speciality(&self) -> RepoResult<Vec<CategoryCount>>;
    /// Teachers and assistants together; average descending, department ascending.
    fn avg_salary_by_department(&self) -> RepoResult<Vec<CategoryAverage>>;
    /// Sorted by count descending, then subject ascending.
    fn teachers_by_subject(&self) -> RepoResult<Vec<CategoryCount>>;
    fn salaries_series(&self) -> RepoResult<Vec<f64>>;
    fn student_grades_series(&self) -> RepoResult<Vec<i64>>;
    fn salary_by_department_groups(&self) -> RepoResult<BTreeMap<String, Vec<f64>>>;

    /// Rewrites every row through the current validation rules.
    ///
    /// Per-row failures are logged and counted, never returned.
    fn normalize_db_values(&self) -> RepoResult<NormalizeReport>;
}

/// Repository over a shared [`Database`] gateway.
pub struct StoreSchoolRepository<'db> {
    db: &'db Database,
}

impl<'db> StoreSchoolRepository<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    fn expect_changed(&self, changed: usize, kind: PersonKind, id: &str) -> RepoResult<()> {
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn fetch_one<T>(
        &self,
        select_sql: &str,
        id: &str,
        decode: fn(&Row) -> RepoResult<T>,
    ) -> RepoResult<Option<T>> {
        let rows = self
            .db
            .query(&format!("{select_sql} WHERE id = ?1"), &[id.into()])?;
        rows.first().map(decode).transpose()
    }

    fn fetch_all<T>(&self, select_sql: &str, decode: fn(&Row) -> RepoResult<T>) -> RepoResult<Vec<T>> {
        let rows = self
            .db
            .query(&format!("{select_sql} ORDER BY name ASC, id ASC"), &[])?;
        rows.iter().map(decode).collect()
    }

    fn normalize_table(
        &self,
        select_sql: &str,
        update_sql: &str,
        kind: PersonKind,
        repair: fn(&Row) -> RepoResult<Option<Vec<DbValue>>>,
        report: &mut NormalizeReport,
    ) -> RepoResult<()> {
        for row in self.db.query(select_sql, &[])? {
            report.scanned += 1;
            let stored_id = row.first().map(DbValue::to_text).unwrap_or_default();
            let outcome = repair(&row).and_then(|repaired| match repaired {
                Some(mut params) => {
                    params.push(DbValue::Text(stored_id.clone()));
                    self.db.execute(update_sql, &params)?;
                    Ok(true)
                }
                None => Ok(false),
            });
            match outcome {
                Ok(true) => report.rewritten += 1,
                Ok(false) => {}
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        "event=normalize module=repo status=error table={} id={} error={}",
                        kind.table(),
                        stored_id,
                        err
                    );
                }
            }
        }
        Ok(())
    }
}

impl SchoolRepository for StoreSchoolRepository<'_> {
    fn add_teacher(&self, teacher: &Teacher) -> RepoResult<()> {
        teacher.validate()?;
        self.db.execute(
            "INSERT INTO teacher (id, name, salary, department, subject)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            &teacher_params(teacher),
        )?;
        Ok(())
    }

    fn update_teacher(&self, teacher: &Teacher) -> RepoResult<()> {
        self.update_teacher_by_id(teacher.id(), teacher)
    }

    fn update_teacher_by_id(&self, old_id: &str, teacher: &Teacher) -> RepoResult<()> {
        teacher.validate()?;
        let mut params = teacher_params(teacher);
        params.push(old_id.into());
        let changed = self.db.execute(TEACHER_UPDATE_SQL, &params)?;
        self.expect_changed(changed, PersonKind::Teacher, old_id)
    }

    fn delete_teacher(&self, id: &str) -> RepoResult<()> {
        self.db
            .execute("DELETE FROM teacher WHERE id = ?1", &[id.into()])?;
        Ok(())
    }

    fn get_teacher(&self, id: &str) -> RepoResult<Option<Teacher>> {
        self.fetch_one(TEACHER_SELECT_SQL, id, decode_teacher)
    }

    fn list_teachers(&self) -> RepoResult<Vec<Teacher>> {
        self.fetch_all(TEACHER_SELECT_SQL, decode_teacher)
    }

    fn add_assistant(&self, assistant: &Assistant) -> RepoResult<()> {
        assistant.validate()?;
        self.db.execute(
            "INSERT INTO assistant (id, name, salary, department)
             VALUES (?1, ?2, ?3, ?4)",
            &employee_params(&assistant.employee),
        )?;
        Ok(())
    }

    fn update_assistant(&self, assistant: &Assistant) -> RepoResult<()> {
        self.update_assistant_by_id(assistant.id(), assistant)
    }

    fn update_assistant_by_id(&self, old_id: &str, assistant: &Assistant) -> RepoResult<()> {
        assistant.validate()?;
        let mut params = employee_params(&assistant.employee);
        params.push(old_id.into());
        let changed = self.db.execute(ASSISTANT_UPDATE_SQL, &params)?;
        self.expect_changed(changed, PersonKind::Assistant, old_id)
    }

    fn delete_assistant(&self, id: &str) -> RepoResult<()> {
        self.db
            .execute("DELETE FROM assistant WHERE id = ?1", &[id.into()])?;
        Ok(())
    }

    fn get_assistant(&self, id: &str) -> RepoResult<Option<Assistant>> {
        self.fetch_one(ASSISTANT_SELECT_SQL, id, decode_assistant)
    }

    fn list_assistants(&self) -> RepoResult<Vec<Assistant>> {
        self.fetch_all(ASSISTANT_SELECT_SQL, decode_assistant)
    }

    fn add_student(&self, student: &Student) -> RepoResult<()> {
        student.validate()?;
        self.db.execute(
            "INSERT INTO student (id, name, grade, speciality)
             VALUES (?1, ?2, ?3, ?4)",
            &student_params(student),
        )?;
        Ok(())
    }

    fn update_student(&self, student: &Student) -> RepoResult<()> {
        self.update_student_by_id(&student.id, student)
    }

    fn update_student_by_id(&self, old_id: &str, student: &Student) -> RepoResult<()> {
        student.validate()?;
        let mut params = student_params(student);
        params.push(old_id.into());
        let changed = self.db.execute(STUDENT_UPDATE_SQL, &params)?;
        self.expect_changed(changed, PersonKind::Student, old_id)
    }

    fn delete_student(&self, id: &str) -> RepoResult<()> {
        self.db
            .execute("DELETE FROM student WHERE id = ?1", &[id.into()])?;
        Ok(())
    }

    fn get_student(&self, id: &str) -> RepoResult<Option<Student>> {
        self.fetch_one(STUDENT_SELECT_SQL, id, decode_student)
    }

    fn list_students(&self) -> RepoResult<Vec<Student>> {
        self.fetch_all(STUDENT_SELECT_SQL, decode_student)
    }

    fn counts_by_role(&self) -> RepoResult<Vec<(PersonKind, i64)>> {
        stats::counts_by_role(self.db)
    }

    fn students_by_speciality(&self) -> RepoResult<Vec<CategoryCount>> {
        stats::students_by_speciality(self.db)
    }

    fn avg_salary_by_department(&self) -> RepoResult<Vec<CategoryAverage>> {
        stats::avg_salary_by_department(self.db)
    }

    fn teachers_by_subject(&self) -> RepoResult<Vec<CategoryCount>> {
        stats::teachers_by_subject(self.db)
    }

    fn salaries_series(&self) -> RepoResult<Vec<f64>> {
        stats::salaries_series(self.db)
    }

    fn student_grades_series(&self) -> RepoResult<Vec<i64>> {
        stats::student_grades_series(self.db)
    }

    fn salary_by_department_groups(&self) -> RepoResult<BTreeMap<String, Vec<f64>>> {
        stats::salary_by_department_groups(self.db)
    }

    fn normalize_db_values(&self) -> RepoResult<NormalizeReport> {
        let mut report = NormalizeReport::default();
        self.normalize_table(
            TEACHER_SELECT_SQL,
            TEACHER_UPDATE_SQL,
            PersonKind::Teacher,
            repair_teacher,
            &mut report,
        )?;
        self.normalize_table(
            ASSISTANT_SELECT_SQL,
            ASSISTANT_UPDATE_SQL,
            PersonKind::Assistant,
            repair_assistant,
            &mut report,
        )?;
        self.normalize_table(
            STUDENT_SELECT_SQL,
            STUDENT_UPDATE_SQL,
            PersonKind::Student,
            repair_student,
            &mut report,
        )?;

        info!(
            "event=normalize module=repo status=ok scanned={} rewritten={} failed={}",
            report.scanned, report.rewritten, report.failed
        );
        Ok(report)
    }
}

fn employee_params(employee: &Employee) -> Vec<DbValue> {
    vec![
        employee.id.as_str().into(),
        employee.name.as_str().into(),
        employee.salary.into(),
        employee.department.label().into(),
    ]
}

fn teacher_params(teacher: &Teacher) -> Vec<DbValue> {
    let mut params = employee_params(&teacher.employee);
    params.push(teacher.subject.label().into());
    params
}

fn student_params(student: &Student) -> Vec<DbValue> {
    vec![
        student.id.as_str().into(),
        student.name.as_str().into(),
        student.grade.into(),
        student.speciality.label().into(),
    ]
}

fn column<'r>(row: &'r Row, index: usize, name: &str) -> RepoResult<&'r DbValue> {
    row.get(index)
        .ok_or_else(|| RepoError::InvalidData(format!("missing column `{name}`")))
}

fn text_column(row: &Row, index: usize, name: &str) -> RepoResult<String> {
    let value = column(row, index, name)?;
    if value.is_null() {
        return Err(RepoError::InvalidData(format!("null value in `{name}`")));
    }
    Ok(value.to_text())
}

/// Reads a salary stored as a number, or as legacy text such as `"1,5"`.
fn salary_column(row: &Row, index: usize) -> RepoResult<f64> {
    match column(row, index, "salary")? {
        DbValue::Text(raw) => Ok(parse_salary(raw)?),
        other => other
            .as_f64()
            .map_err(|err| RepoError::InvalidData(format!("salary: {err}"))),
    }
}

fn grade_column(row: &Row, index: usize) -> RepoResult<i64> {
    match column(row, index, "grade")? {
        DbValue::Text(raw) => Ok(parse_grade(raw)?),
        other => other
            .as_i64()
            .map_err(|err| RepoError::InvalidData(format!("grade: {err}"))),
    }
}

fn decode_employee(row: &Row) -> RepoResult<Employee> {
    Ok(Employee::new(
        text_column(row, 0, "id")?,
        text_column(row, 1, "name")?,
        salary_column(row, 2)?,
        Department::normalize(&text_column(row, 3, "department")?),
    ))
}

fn decode_teacher(row: &Row) -> RepoResult<Teacher> {
    Ok(Teacher::new(
        decode_employee(row)?,
        Subject::normalize(&text_column(row, 4, "subject")?),
    ))
}

fn decode_assistant(row: &Row) -> RepoResult<Assistant> {
    Ok(Assistant::new(decode_employee(row)?))
}

fn decode_student(row: &Row) -> RepoResult<Student> {
    Ok(Student::new(
        text_column(row, 0, "id")?,
        text_column(row, 1, "name")?,
        grade_column(row, 2)?,
        Speciality::normalize(&text_column(row, 3, "speciality")?),
    ))
}

fn stored_text_is(row: &Row, index: usize, expected: &str) -> bool {
    matches!(row.get(index), Some(DbValue::Text(stored)) if stored == expected)
}

fn stored_real_is(row: &Row, index: usize, expected: f64) -> bool {
    matches!(row.get(index), Some(DbValue::Real(stored)) if *stored == expected)
}

fn stored_integer_is(row: &Row, index: usize, expected: i64) -> bool {
    matches!(row.get(index), Some(DbValue::Integer(stored)) if *stored == expected)
}

fn employee_is_canonical(row: &Row, employee: &Employee) -> bool {
    stored_real_is(row, 2, employee.salary)
        && stored_text_is(row, 3, employee.department.label())
}

/// Returns update parameters (without the trailing key) when the row differs
/// from its canonical form.
fn repair_teacher(row: &Row) -> RepoResult<Option<Vec<DbValue>>> {
    let teacher = decode_teacher(row)?;
    teacher.validate()?;
    if employee_is_canonical(row, &teacher.employee)
        && stored_text_is(row, 4, teacher.subject.label())
    {
        return Ok(None);
    }
    Ok(Some(teacher_params(&teacher)))
}

fn repair_assistant(row: &Row) -> RepoResult<Option<Vec<DbValue>>> {
    let assistant = decode_assistant(row)?;
    assistant.validate()?;
    if employee_is_canonical(row, &assistant.employee) {
        return Ok(None);
    }
    Ok(Some(employee_params(&assistant.employee)))
}

fn repair_student(row: &Row) -> RepoResult<Option<Vec<DbValue>>> {
    let student = decode_student(row)?;
    student.validate()?;
    if stored_integer_is(row, 2, student.grade)
        && stored_text_is(row, 3, student.speciality.label())
    {
        return Ok(None);
    }
    Ok(Some(student_params(&student)))
}

#[cfg(test)]
mod tests {
    use super::{repair_student, repair_teacher, salary_column};
    use crate::db::DbValue;

    fn teacher_row(salary: DbValue, department: &str, subject: &str) -> Vec<DbValue> {
        vec![
            "T1".into(),
            "Ana".into(),
            salary,
            department.into(),
            subject.into(),
        ]
    }

    #[test]
    fn canonical_rows_need_no_repair() {
        let row = teacher_row(DbValue::Real(1200.0), "Finance", "Physics");
        assert!(repair_teacher(&row).unwrap().is_none());
    }

    #[test]
    fn legacy_text_salary_and_alias_category_are_repaired() {
        let row = teacher_row(DbValue::Text("1200,5".into()), "fin", "phys");
        let params = repair_teacher(&row).unwrap().expect("row should be rewritten");
        assert_eq!(params[2], DbValue::Real(1200.5));
        assert_eq!(params[3], DbValue::Text("Finance".into()));
        assert_eq!(params[4], DbValue::Text("Physics".into()));
    }

    #[test]
    fn unparseable_salary_is_reported() {
        let row = teacher_row(DbValue::Text("lots".into()), "Finance", "Physics");
        assert!(salary_column(&row, 2).is_err());
        assert!(repair_teacher(&row).is_err());
    }

    #[test]
    fn student_grade_text_is_repaired() {
        let row = vec![
            "S1".into(),
            "Ion".into(),
            DbValue::Text(" 8 ".into()),
            "cs".into(),
        ];
        let params = repair_student(&row).unwrap().expect("row should be rewritten");
        assert_eq!(params[2], DbValue::Integer(8));
        assert_eq!(params[3], DbValue::Text("Computer Science".into()));
    }
}
