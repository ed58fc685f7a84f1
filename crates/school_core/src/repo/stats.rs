//! Read-only aggregate projections used by chart views.
//!
//! All grouping and ordering happens in SQL; results come back already
//! sorted by the documented keys.

use super::{RepoError, RepoResult};
use crate::db::{Database, DbValue, Row};
use crate::model::person::PersonKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Union of teacher and assistant salaries, keyed by department.
const EMPLOYEE_SALARIES_SQL: &str = "SELECT department, salary FROM teacher
     UNION ALL
     SELECT department, salary FROM assistant";

/// Number of rows sharing one categorical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Mean salary of one department.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverage {
    pub category: String,
    pub average: f64,
}

pub(crate) fn counts_by_role(db: &Database) -> RepoResult<Vec<(PersonKind, i64)>> {
    PersonKind::ALL
        .iter()
        .map(|kind| -> RepoResult<(PersonKind, i64)> {
            let count = db
                .scalar(&format!("SELECT COUNT(*) FROM {}", kind.table()), &[])?
                .map(|value| value.as_i64())
                .transpose()?
                .unwrap_or(0);
            Ok((*kind, count))
        })
        .collect()
}

pub(crate) fn students_by_speciality(db: &Database) -> RepoResult<Vec<CategoryCount>> {
    grouped_counts(
        db,
        "SELECT speciality, COUNT(*) FROM student
         GROUP BY speciality
         ORDER BY COUNT(*) DESC, speciality ASC",
    )
}

pub(crate) fn teachers_by_subject(db: &Database) -> RepoResult<Vec<CategoryCount>> {
    grouped_counts(
        db,
        "SELECT subject, COUNT(*) FROM teacher
         GROUP BY subject
         ORDER BY COUNT(*) DESC, subject ASC",
    )
}

pub(crate) fn avg_salary_by_department(db: &Database) -> RepoResult<Vec<CategoryAverage>> {
    let rows = db.query(
        &format!(
            "SELECT department, AVG(salary) AS avg_salary FROM ({EMPLOYEE_SALARIES_SQL}) AS staff
             GROUP BY department
             ORDER BY avg_salary DESC, department ASC"
        ),
        &[],
    )?;
    rows.iter()
        .map(|row| -> RepoResult<CategoryAverage> {
            Ok(CategoryAverage {
                category: label_at(row)?,
                average: number_at(row, 1)?,
            })
        })
        .collect()
}

pub(crate) fn salaries_series(db: &Database) -> RepoResult<Vec<f64>> {
    let rows = db.query(
        "SELECT salary FROM teacher UNION ALL SELECT salary FROM assistant",
        &[],
    )?;
    rows.iter().map(|row| number_at(row, 0)).collect()
}

pub(crate) fn student_grades_series(db: &Database) -> RepoResult<Vec<i64>> {
    let rows = db.query("SELECT grade FROM student", &[])?;
    rows.iter()
        .map(|row| -> RepoResult<i64> {
            value_at(row, 0)?
                .as_i64()
                .map_err(|err| RepoError::InvalidData(format!("grade: {err}")))
        })
        .collect()
}

pub(crate) fn salary_by_department_groups(
    db: &Database,
) -> RepoResult<BTreeMap<String, Vec<f64>>> {
    let rows = db.query(
        &format!("SELECT department, salary FROM ({EMPLOYEE_SALARIES_SQL}) AS staff ORDER BY department"),
        &[],
    )?;
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in &rows {
        groups
            .entry(label_at(row)?)
            .or_default()
            .push(number_at(row, 1)?);
    }
    Ok(groups)
}

fn grouped_counts(db: &Database, sql: &str) -> RepoResult<Vec<CategoryCount>> {
    let rows = db.query(sql, &[])?;
    rows.iter()
        .map(|row| -> RepoResult<CategoryCount> {
            Ok(CategoryCount {
                category: label_at(row)?,
                count: value_at(row, 1)?
                    .as_i64()
                    .map_err(|err| RepoError::InvalidData(format!("count: {err}")))?,
            })
        })
        .collect()
}

fn value_at(row: &Row, index: usize) -> RepoResult<&DbValue> {
    row.get(index)
        .ok_or_else(|| RepoError::InvalidData(format!("missing aggregate column {index}")))
}

fn label_at(row: &Row) -> RepoResult<String> {
    Ok(value_at(row, 0)?.to_text())
}

fn number_at(row: &Row, index: usize) -> RepoResult<f64> {
    value_at(row, index)?
        .as_f64()
        .map_err(|err| RepoError::InvalidData(format!("aggregate value: {err}")))
}
