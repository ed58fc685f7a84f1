//! School records use-case service.
//!
//! # Responsibility
//! - Turn repository results into user-facing [`ActionOutcome`] messages.
//! - Provide sorted snapshots, chart payloads and a text dump for views.
//! - Run the startup sequence: normalize stored values, then seed an empty store.
//!
//! # Invariants
//! - Write operations never panic or bubble errors; failures become `ok=false`.
//! - Read operations degrade to empty results when the store fails.
//! - Seeding only happens when all three tables are empty.

use crate::model::category::Category;
use crate::model::person::{
    Assistant, AssistantDraft, Person, PersonDraft, PersonKind, Student, StudentDraft, Teacher,
    TeacherDraft,
};
use crate::repo::school_repo::{NormalizeReport, SchoolRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::charts::{build_payload, ChartKind, ChartPayload};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Write as _;

/// Result of one user action, ready to show in a status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub ok: bool,
    pub message: String,
}

impl ActionOutcome {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Ordering applied to snapshot lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    Name,
    Grade,
    Salary,
}

impl SortMode {
    pub const ALL: [Self; 3] = [Self::Name, Self::Grade, Self::Salary];

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Grade => "Grade",
            Self::Salary => "Salary",
        }
    }

    /// Case-insensitive; anything unrecognized sorts by name.
    pub fn parse(label: &str) -> Self {
        let key = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.label().eq_ignore_ascii_case(key))
            .unwrap_or_default()
    }
}

/// All records at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub teachers: Vec<Teacher>,
    pub assistants: Vec<Assistant>,
    pub students: Vec<Student>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.teachers.len() + self.assistants.len() + self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Initial records used to populate an empty store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub teachers: Vec<TeacherDraft>,
    pub assistants: Vec<AssistantDraft>,
    pub students: Vec<StudentDraft>,
}

impl SeedData {
    /// Drafts in insertion order: teachers, assistants, then students.
    pub fn drafts(&self) -> impl Iterator<Item = PersonDraft> + '_ {
        self.teachers
            .iter()
            .cloned()
            .map(PersonDraft::Teacher)
            .chain(self.assistants.iter().cloned().map(PersonDraft::Assistant))
            .chain(self.students.iter().cloned().map(PersonDraft::Student))
    }
}

/// What the startup sequence did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StartupReport {
    /// `None` when normalization failed and was skipped.
    pub normalized: Option<NormalizeReport>,
    pub seeded: usize,
    pub seed_failures: usize,
}

/// Use-case facade over a [`SchoolRepository`].
pub struct SchoolService<R: SchoolRepository> {
    repo: R,
}

impl<R: SchoolRepository> SchoolService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Validates and inserts one record.
    pub fn add_person(&self, draft: &PersonDraft) -> ActionOutcome {
        let kind = draft.kind();
        match self.insert(draft) {
            Ok(()) => {
                info!("event=person_add module=service status=ok kind={kind}");
                ActionOutcome::success(format!("Added {kind}: {}", draft.name().trim()))
            }
            Err(err) => {
                warn!("event=person_add module=service status=error kind={kind} error={err}");
                ActionOutcome::failure(format!("Error adding {kind}: {err}"))
            }
        }
    }

    /// Looks one record up; store failures read as absent.
    pub fn find_by_id(&self, kind: PersonKind, id: &str) -> Option<Person> {
        match self.fetch(kind, id) {
            Ok(found) => found,
            Err(err) => {
                warn!(
                    "event=person_get module=service status=error kind={kind} id={id} error={err}"
                );
                None
            }
        }
    }

    pub fn delete_by_id(&self, kind: PersonKind, id: &str) -> ActionOutcome {
        if self.find_by_id(kind, id).is_none() {
            return ActionOutcome::failure(format!("{kind} id={id} not found"));
        }
        let result = match kind {
            PersonKind::Teacher => self.repo.delete_teacher(id),
            PersonKind::Assistant => self.repo.delete_assistant(id),
            PersonKind::Student => self.repo.delete_student(id),
        };
        match result {
            Ok(()) => {
                info!("event=person_delete module=service status=ok kind={kind} id={id}");
                ActionOutcome::success(format!("Deleted {kind} id={id}"))
            }
            Err(err) => ActionOutcome::failure(format!("Error deleting {kind} id={id}: {err}")),
        }
    }

    /// Deletes the first record, in name order, whose name matches exactly.
    pub fn delete_by_name(&self, kind: PersonKind, name: &str) -> ActionOutcome {
        let target = match self.list(kind) {
            Ok(people) => people.into_iter().find(|person| person.name() == name),
            Err(err) => {
                return ActionOutcome::failure(format!("Error deleting {kind} '{name}': {err}"))
            }
        };
        match target {
            Some(person) => self.delete_by_id(kind, person.id()),
            None => ActionOutcome::failure(format!("{kind} '{name}' not found")),
        }
    }

    /// Updates the record stored under `id`; the id itself never changes.
    ///
    /// Blank draft fields keep the stored value.
    pub fn edit_by_id(&self, kind: PersonKind, id: &str, draft: &PersonDraft) -> ActionOutcome {
        if draft.kind() != kind {
            return ActionOutcome::failure(format!("Invalid person type: {}", draft.kind()));
        }
        let Some(existing) = self.find_by_id(kind, id) else {
            return ActionOutcome::failure(format!("{kind} id={id} not found"));
        };
        let merged = pin_id(draft.clone().fill_blanks_from(&existing.to_draft()), id);
        let result = merged
            .to_record()
            .map_err(RepoError::from)
            .and_then(|record| match &record {
                Person::Teacher(t) => self.repo.update_teacher(t),
                Person::Assistant(a) => self.repo.update_assistant(a),
                Person::Student(s) => self.repo.update_student(s),
            });
        match result {
            Ok(()) => {
                info!("event=person_edit module=service status=ok kind={kind} id={id}");
                ActionOutcome::success(format!("Edited {kind} id={id}"))
            }
            Err(err) => ActionOutcome::failure(format!("Error editing {kind} id={id}: {err}")),
        }
    }

    /// Saves a form keyed by `original_id`, allowing the id to change.
    ///
    /// Returns the outcome and the id the record is now stored under.
    pub fn apply_changes(
        &self,
        kind: PersonKind,
        original_id: &str,
        draft: &PersonDraft,
    ) -> (ActionOutcome, String) {
        if draft.kind() != kind {
            return (
                ActionOutcome::failure(format!("Invalid person type: {}", draft.kind())),
                original_id.to_string(),
            );
        }
        let draft = draft.clone().with_default_id(original_id);
        let result = draft
            .to_record()
            .map_err(RepoError::from)
            .and_then(|record| -> RepoResult<Person> {
                match &record {
                    Person::Teacher(t) => self.repo.update_teacher_by_id(original_id, t)?,
                    Person::Assistant(a) => self.repo.update_assistant_by_id(original_id, a)?,
                    Person::Student(s) => self.repo.update_student_by_id(original_id, s)?,
                }
                Ok(record)
            });
        match result {
            Ok(record) => {
                info!(
                    "event=person_save module=service status=ok kind={kind} old_id={original_id} id={}",
                    record.id()
                );
                (
                    ActionOutcome::success(format!("Saved {kind}: {}", record.name())),
                    record.id().to_string(),
                )
            }
            Err(err) => (
                ActionOutcome::failure(format!("Error saving {kind}: {err}")),
                original_id.to_string(),
            ),
        }
    }

    /// All records ordered by `sort`.
    pub fn snapshot(&self, sort: SortMode) -> Snapshot {
        let mut snapshot = match self.load_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("event=snapshot module=service status=error error={err}");
                return Snapshot::default();
            }
        };

        snapshot
            .teachers
            .sort_by(|a, b| by_name(a.name(), b.name()));
        snapshot
            .assistants
            .sort_by(|a, b| by_name(a.name(), b.name()));
        snapshot.students.sort_by(|a, b| by_name(&a.name, &b.name));

        match sort {
            SortMode::Name => {}
            SortMode::Grade => snapshot.students.sort_by(|a, b| b.grade.cmp(&a.grade)),
            SortMode::Salary => {
                snapshot
                    .teachers
                    .sort_by(|a, b| by_salary_desc(a.employee.salary, b.employee.salary));
                snapshot
                    .assistants
                    .sort_by(|a, b| by_salary_desc(a.employee.salary, b.employee.salary));
            }
        }
        snapshot
    }

    pub fn chart_payload(&self, kind: ChartKind) -> ChartPayload {
        build_payload(&self.repo, kind).unwrap_or_else(|err| {
            warn!(
                "event=chart module=service status=error chart={:?} error={err}",
                kind
            );
            kind.empty_payload()
        })
    }

    /// Plain-text listing of every table, in stored order.
    pub fn dump_all(&self) -> String {
        let snapshot = self.load_snapshot().unwrap_or_else(|err| {
            warn!("event=dump module=service status=error error={err}");
            Snapshot::default()
        });

        let mut out = String::new();
        let _ = writeln!(out, "=== Teachers ===");
        for t in &snapshot.teachers {
            let _ = writeln!(
                out,
                "{} | {} | {} | {} | {}",
                t.employee.id,
                t.employee.name,
                t.employee.salary,
                t.employee.department.label(),
                t.subject.label()
            );
        }
        let _ = writeln!(out, "\n=== Assistants ===");
        for a in &snapshot.assistants {
            let _ = writeln!(
                out,
                "{} | {} | {} | {}",
                a.employee.id,
                a.employee.name,
                a.employee.salary,
                a.employee.department.label()
            );
        }
        let _ = writeln!(out, "\n=== Students ===");
        for s in &snapshot.students {
            let _ = writeln!(
                out,
                "{} | {} | {} | {}",
                s.id,
                s.name,
                s.grade,
                s.speciality.label()
            );
        }
        out
    }

    /// Normalizes stored values, then seeds an empty store from `seed`.
    pub fn startup(&self, seed: Option<&SeedData>) -> StartupReport {
        let mut report = StartupReport::default();

        match self.repo.normalize_db_values() {
            Ok(normalized) => report.normalized = Some(normalized),
            Err(err) => warn!("event=startup module=service step=normalize status=error error={err}"),
        }

        if let Some(seed) = seed {
            match self.is_empty() {
                Ok(true) => {
                    for draft in seed.drafts() {
                        match self.insert(&draft) {
                            Ok(()) => report.seeded += 1,
                            Err(err) => {
                                report.seed_failures += 1;
                                warn!(
                                    "event=seed module=service status=error kind={} id={} error={err}",
                                    draft.kind(),
                                    draft.id()
                                );
                            }
                        }
                    }
                    info!(
                        "event=seed module=service status=ok seeded={} failed={}",
                        report.seeded,
                        report.seed_failures
                    );
                }
                Ok(false) => info!("event=seed module=service status=skipped reason=not_empty"),
                Err(err) => warn!("event=seed module=service status=error error={err}"),
            }
        }

        info!(
            "event=startup module=service status=ok normalized={} seeded={}",
            report.normalized.is_some(),
            report.seeded
        );
        report
    }

    fn insert(&self, draft: &PersonDraft) -> RepoResult<()> {
        match draft.to_record()? {
            Person::Teacher(t) => self.repo.add_teacher(&t),
            Person::Assistant(a) => self.repo.add_assistant(&a),
            Person::Student(s) => self.repo.add_student(&s),
        }
    }

    fn fetch(&self, kind: PersonKind, id: &str) -> RepoResult<Option<Person>> {
        Ok(match kind {
            PersonKind::Teacher => self.repo.get_teacher(id)?.map(Person::Teacher),
            PersonKind::Assistant => self.repo.get_assistant(id)?.map(Person::Assistant),
            PersonKind::Student => self.repo.get_student(id)?.map(Person::Student),
        })
    }

    fn list(&self, kind: PersonKind) -> RepoResult<Vec<Person>> {
        Ok(match kind {
            PersonKind::Teacher => self
                .repo
                .list_teachers()?
                .into_iter()
                .map(Person::Teacher)
                .collect(),
            PersonKind::Assistant => self
                .repo
                .list_assistants()?
                .into_iter()
                .map(Person::Assistant)
                .collect(),
            PersonKind::Student => self
                .repo
                .list_students()?
                .into_iter()
                .map(Person::Student)
                .collect(),
        })
    }

    fn load_snapshot(&self) -> RepoResult<Snapshot> {
        Ok(Snapshot {
            teachers: self.repo.list_teachers()?,
            assistants: self.repo.list_assistants()?,
            students: self.repo.list_students()?,
        })
    }

    fn is_empty(&self) -> RepoResult<bool> {
        Ok(self
            .repo
            .counts_by_role()?
            .iter()
            .all(|(_, count)| *count == 0))
    }
}

fn pin_id(draft: PersonDraft, id: &str) -> PersonDraft {
    match draft {
        PersonDraft::Teacher(d) => PersonDraft::Teacher(TeacherDraft {
            id: id.to_string(),
            ..d
        }),
        PersonDraft::Assistant(d) => PersonDraft::Assistant(AssistantDraft {
            id: id.to_string(),
            ..d
        }),
        PersonDraft::Student(d) => PersonDraft::Student(StudentDraft {
            id: id.to_string(),
            ..d
        }),
    }
}

fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn by_salary_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::{SeedData, SortMode};
    use crate::model::person::{PersonKind, StudentDraft, TeacherDraft};

    #[test]
    fn sort_mode_parse_falls_back_to_name() {
        assert_eq!(SortMode::parse("salary"), SortMode::Salary);
        assert_eq!(SortMode::parse(" GRADE "), SortMode::Grade);
        assert_eq!(SortMode::parse("age"), SortMode::Name);
    }

    #[test]
    fn seed_drafts_keep_kind_order() {
        let seed = SeedData {
            teachers: vec![TeacherDraft {
                id: "T1".into(),
                ..TeacherDraft::default()
            }],
            assistants: Vec::new(),
            students: vec![StudentDraft {
                id: "S1".into(),
                ..StudentDraft::default()
            }],
        };
        let kinds: Vec<PersonKind> = seed.drafts().map(|d| d.kind()).collect();
        assert_eq!(kinds, vec![PersonKind::Teacher, PersonKind::Student]);
    }

    #[test]
    fn seed_data_reads_partial_json() {
        let seed: SeedData =
            serde_json::from_str(r#"{"students":[{"id":"S1","name":"Eve","grade":"8"}]}"#)
                .unwrap();
        assert!(seed.teachers.is_empty());
        assert_eq!(seed.students[0].grade, "8");
    }
}
