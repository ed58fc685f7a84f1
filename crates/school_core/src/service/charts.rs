//! Chart payloads assembled from repository aggregates.
//!
//! Rendering is left to the caller; this module only shapes the data.

use crate::repo::school_repo::SchoolRepository;
use crate::repo::RepoResult;
use serde::Serialize;

/// Charts offered by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChartKind {
    RolesDistribution,
    StudentsBySpeciality,
    AvgSalaryByDepartment,
    TeachersBySubject,
    StudentGradesSeries,
    AllSalariesSeries,
    SalaryByDepartmentGroups,
}

impl ChartKind {
    pub const ALL: [Self; 7] = [
        Self::RolesDistribution,
        Self::StudentsBySpeciality,
        Self::AvgSalaryByDepartment,
        Self::TeachersBySubject,
        Self::StudentGradesSeries,
        Self::AllSalariesSeries,
        Self::SalaryByDepartmentGroups,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::RolesDistribution => "Roles Distribution",
            Self::StudentsBySpeciality => "Students by Speciality",
            Self::AvgSalaryByDepartment => "Avg Salary by Department",
            Self::TeachersBySubject => "Teachers by Subject",
            Self::StudentGradesSeries => "Student Grades (Series)",
            Self::AllSalariesSeries => "All Salaries (Series)",
            Self::SalaryByDepartmentGroups => "Salary by Department (Groups)",
        }
    }

    /// Case-insensitive label lookup; unknown labels fall back to roles.
    pub fn parse(label: &str) -> Self {
        let key = label.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.label().to_lowercase() == key)
            .unwrap_or(Self::RolesDistribution)
    }

    fn title(self) -> &'static str {
        match self {
            Self::RolesDistribution => "Roles distribution",
            Self::StudentsBySpeciality => "Students by speciality",
            Self::AvgSalaryByDepartment => "Average salary by department",
            Self::TeachersBySubject => "Teachers by subject",
            Self::StudentGradesSeries => "Student grades",
            Self::AllSalariesSeries => "Salaries",
            Self::SalaryByDepartmentGroups => "Salaries by department",
        }
    }

    fn y_label(self) -> &'static str {
        match self {
            Self::RolesDistribution | Self::StudentsBySpeciality | Self::TeachersBySubject => {
                "Count"
            }
            Self::AvgSalaryByDepartment => "Average salary",
            Self::StudentGradesSeries => "Grade",
            Self::AllSalariesSeries | Self::SalaryByDepartmentGroups => "Salary",
        }
    }

    /// Payload of the right shape with no data, used when a read fails.
    pub fn empty_payload(self) -> ChartPayload {
        let title = self.title().to_string();
        let y_label = self.y_label().to_string();
        match self {
            Self::StudentGradesSeries | Self::AllSalariesSeries => ChartPayload::Series {
                title,
                y_label,
                series: Vec::new(),
            },
            Self::SalaryByDepartmentGroups => ChartPayload::Groups {
                title,
                y_label,
                groups: Vec::new(),
            },
            _ => ChartPayload::Categorical {
                title,
                y_label,
                labels: Vec::new(),
                values: Vec::new(),
            },
        }
    }
}

/// Render-ready data for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartPayload {
    Categorical {
        title: String,
        y_label: String,
        labels: Vec<String>,
        values: Vec<f64>,
    },
    Series {
        title: String,
        y_label: String,
        series: Vec<f64>,
    },
    Groups {
        title: String,
        y_label: String,
        groups: Vec<(String, Vec<f64>)>,
    },
}

impl ChartPayload {
    /// Whether the payload carries no data points.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Categorical { labels, .. } => labels.is_empty(),
            Self::Series { series, .. } => series.is_empty(),
            Self::Groups { groups, .. } => groups.is_empty(),
        }
    }
}

pub(crate) fn build_payload<R: SchoolRepository>(
    repo: &R,
    kind: ChartKind,
) -> RepoResult<ChartPayload> {
    let title = kind.title().to_string();
    let y_label = kind.y_label().to_string();

    let categorical = |pairs: Vec<(String, f64)>| {
        let (labels, values) = pairs.into_iter().unzip();
        ChartPayload::Categorical {
            title: title.clone(),
            y_label: y_label.clone(),
            labels,
            values,
        }
    };

    let payload = match kind {
        ChartKind::RolesDistribution => categorical(
            repo.counts_by_role()?
                .into_iter()
                .map(|(role, count)| (role.label().to_string(), count as f64))
                .collect(),
        ),
        ChartKind::StudentsBySpeciality => categorical(
            repo.students_by_speciality()?
                .into_iter()
                .map(|row| (row.category, row.count as f64))
                .collect(),
        ),
        ChartKind::AvgSalaryByDepartment => categorical(
            repo.avg_salary_by_department()?
                .into_iter()
                .map(|row| (row.category, row.average))
                .collect(),
        ),
        ChartKind::TeachersBySubject => categorical(
            repo.teachers_by_subject()?
                .into_iter()
                .map(|row| (row.category, row.count as f64))
                .collect(),
        ),
        ChartKind::StudentGradesSeries => ChartPayload::Series {
            title,
            y_label,
            series: repo
                .student_grades_series()?
                .into_iter()
                .map(|grade| grade as f64)
                .collect(),
        },
        ChartKind::AllSalariesSeries => ChartPayload::Series {
            title,
            y_label,
            series: repo.salaries_series()?,
        },
        ChartKind::SalaryByDepartmentGroups => ChartPayload::Groups {
            title,
            y_label,
            groups: repo.salary_by_department_groups()?.into_iter().collect(),
        },
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::{ChartKind, ChartPayload};

    #[test]
    fn parse_is_case_insensitive_with_roles_fallback() {
        assert_eq!(
            ChartKind::parse("teachers BY subject"),
            ChartKind::TeachersBySubject
        );
        assert_eq!(ChartKind::parse("pie"), ChartKind::RolesDistribution);
    }

    #[test]
    fn empty_payloads_match_chart_shape() {
        assert!(matches!(
            ChartKind::AllSalariesSeries.empty_payload(),
            ChartPayload::Series { .. }
        ));
        assert!(matches!(
            ChartKind::SalaryByDepartmentGroups.empty_payload(),
            ChartPayload::Groups { .. }
        ));
        assert!(ChartKind::TeachersBySubject.empty_payload().is_empty());
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let json = serde_json::to_value(ChartKind::AllSalariesSeries.empty_payload()).unwrap();
        assert_eq!(json["type"], "series");
        assert_eq!(json["y_label"], "Salary");
    }
}
