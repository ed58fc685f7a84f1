use school_core::db::Database;
use school_core::{
    Assistant, CategoryAverage, CategoryCount, Department, Employee, PersonKind,
    SchoolRepository, Speciality, StoreSchoolRepository, Student, Subject, Teacher,
};

fn seed(repo: &StoreSchoolRepository<'_>) {
    let teachers = [
        ("T1", 1000.0, Department::Engineering, Subject::Physics),
        ("T2", 2000.0, Department::Engineering, Subject::Mathematics),
        ("T3", 800.0, Department::Finance, Subject::Physics),
    ];
    for (id, salary, department, subject) in teachers {
        repo.add_teacher(&Teacher::new(
            Employee::new(id, format!("Teacher {id}"), salary, department),
            subject,
        ))
        .unwrap();
    }
    repo.add_assistant(&Assistant::new(Employee::new(
        "A1",
        "Assistant A1",
        1200.0,
        Department::Engineering,
    )))
    .unwrap();

    let specialities = [
        Speciality::Mathematics,
        Speciality::ComputerScience,
        Speciality::Physics,
        Speciality::Mathematics,
        Speciality::ComputerScience,
        Speciality::Mathematics,
        Speciality::ComputerScience,
    ];
    for (n, speciality) in specialities.into_iter().enumerate() {
        repo.add_student(&Student::new(
            format!("S{n}"),
            format!("Student {n}"),
            n as i64 + 4,
            speciality,
        ))
        .unwrap();
    }
}

#[test]
fn counts_by_role_reports_every_kind() {
    let db = Database::open_in_memory().unwrap();
    let repo = StoreSchoolRepository::new(&db);
    seed(&repo);

    assert_eq!(
        repo.counts_by_role().unwrap(),
        vec![
            (PersonKind::Teacher, 3),
            (PersonKind::Assistant, 1),
            (PersonKind::Student, 7),
        ]
    );
}

#[test]
fn counts_by_role_on_empty_store_are_zero() {
    let db = Database::open_in_memory().unwrap();
    let repo = StoreSchoolRepository::new(&db);

    assert!(repo
        .counts_by_role()
        .unwrap()
        .iter()
        .all(|(_, count)| *count == 0));
}

#[test]
fn speciality_ties_are_broken_alphabetically() {
    let db = Database::open_in_memory().unwrap();
    let repo = StoreSchoolRepository::new(&db);
    seed(&repo);

    let count = |category: &str, count: i64| CategoryCount {
        category: category.to_string(),
        count,
    };
    assert_eq!(
        repo.students_by_speciality().unwrap(),
        vec![
            count("Computer Science", 3),
            count("Mathematics", 3),
            count("Physics", 1),
        ]
    );
}

#[test]
fn teachers_by_subject_orders_by_count() {
    let db = Database::open_in_memory().unwrap();
    let repo = StoreSchoolRepository::new(&db);
    seed(&repo);

    let subjects: Vec<(String, i64)> = repo
        .teachers_by_subject()
        .unwrap()
        .into_iter()
        .map(|row| (row.category, row.count))
        .collect();
    assert_eq!(
        subjects,
        vec![("Physics".to_string(), 2), ("Mathematics".to_string(), 1)]
    );
}

#[test]
fn average_salary_pools_teachers_and_assistants() {
    let db = Database::open_in_memory().unwrap();
    let repo = StoreSchoolRepository::new(&db);
    seed(&repo);

    assert_eq!(
        repo.avg_salary_by_department().unwrap(),
        vec![
            CategoryAverage {
                category: "Engineering".to_string(),
                average: 1400.0,
            },
            CategoryAverage {
                category: "Finance".to_string(),
                average: 800.0,
            },
        ]
    );
}

#[test]
fn series_contain_every_value() {
    let db = Database::open_in_memory().unwrap();
    let repo = StoreSchoolRepository::new(&db);
    seed(&repo);

    let mut salaries = repo.salaries_series().unwrap();
    salaries.sort_by(f64::total_cmp);
    assert_eq!(salaries, vec![800.0, 1000.0, 1200.0, 2000.0]);

    let mut grades = repo.student_grades_series().unwrap();
    grades.sort_unstable();
    assert_eq!(grades, (4..=10).collect::<Vec<i64>>());
}

#[test]
fn salary_groups_are_keyed_by_department() {
    let db = Database::open_in_memory().unwrap();
    let repo = StoreSchoolRepository::new(&db);
    seed(&repo);

    let groups = repo.salary_by_department_groups().unwrap();
    assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["Engineering", "Finance"]);

    let mut engineering = groups["Engineering"].clone();
    engineering.sort_by(f64::total_cmp);
    assert_eq!(engineering, vec![1000.0, 1200.0, 2000.0]);
    assert_eq!(groups["Finance"], vec![800.0]);
}
