//! Persistence gateway against SQLite
//!
//! Most tests use a single-connection in-memory database; the file-backed
//! tests cover first-run creation in a temporary root folder.

use std::time::Duration;
use tempfile::TempDir;
use uj_common::db::{init_database, init_memory_database};
use uj_common::form::{FormController, SubmitOutcome};
use uj_common::model::{
    GradeFields, GroupFields, StudentFields, SubjectFields, TeacherFields,
};
use uj_common::{Error, Gateway, Grade, Group, SqliteGateway, Student, Subject, Teacher};
use uuid::Uuid;

async fn gateway() -> SqliteGateway {
    SqliteGateway::new(init_memory_database().await.unwrap())
}

async fn add_group(gw: &SqliteGateway, code: i64, name: &str) -> Uuid {
    Gateway::<Group>::create(
        gw,
        &GroupFields {
            speciality_code: code,
            speciality_name: name.to_string(),
        },
    )
    .await
    .unwrap()
}

async fn add_student(gw: &SqliteGateway, first: &str, last: &str, group_id: Uuid) -> Result<Uuid, Error> {
    Gateway::<Student>::create(
        gw,
        &StudentFields {
            first_name: first.to_string(),
            last_name: last.to_string(),
            group_id,
        },
    )
    .await
}

async fn add_teacher(gw: &SqliteGateway, first: &str, last: &str) -> Uuid {
    Gateway::<Teacher>::create(
        gw,
        &TeacherFields {
            first_name: first.to_string(),
            last_name: last.to_string(),
        },
    )
    .await
    .unwrap()
}

async fn add_subject(gw: &SqliteGateway, name: &str) -> Uuid {
    Gateway::<Subject>::create(gw, &SubjectFields { name: name.to_string() })
        .await
        .unwrap()
}

fn grade_fields(student_id: Uuid, teacher_id: Uuid, subject_id: Uuid, grade: i64) -> GradeFields {
    GradeFields {
        student_id,
        teacher_id,
        subject_id,
        grade,
        note: None,
    }
}

/// Single connection pool: the pragma sticks for the rest of the test
async fn disable_foreign_keys(gw: &SqliteGateway) {
    sqlx::query("PRAGMA foreign_keys = OFF")
        .execute(gw.pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_group_crud() {
    let gw = gateway().await;

    let id = add_group(&gw, 7, "Mathematics").await;
    let groups: Vec<Group> = Gateway::<Group>::list(&gw).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, id);
    assert_eq!(groups[0].speciality_code, 7);
    assert_eq!(groups[0].display_code(), "007");
    assert_eq!(groups[0].created_at, groups[0].updated_at);

    tokio::time::sleep(Duration::from_millis(5)).await;
    Gateway::<Group>::update(
        &gw,
        id,
        &GroupFields {
            speciality_code: 113,
            speciality_name: "Applied Mathematics".to_string(),
        },
    )
    .await
    .unwrap();

    let groups = Gateway::<Group>::list(&gw).await.unwrap();
    assert_eq!(groups[0].speciality_code, 113);
    assert_eq!(groups[0].speciality_name, "Applied Mathematics");
    assert!(groups[0].updated_at > groups[0].created_at);

    Gateway::<Group>::delete(&gw, id).await.unwrap();
    assert!(Gateway::<Group>::list(&gw).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_ordering() {
    let gw = gateway().await;

    add_group(&gw, 2, "Physics").await;
    add_group(&gw, 1, "Biology").await;
    let names: Vec<String> = Gateway::<Group>::list(&gw)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.speciality_name)
        .collect();
    assert_eq!(names, vec!["Biology", "Physics"]);

    add_teacher(&gw, "Ivan", "Franko").await;
    add_teacher(&gw, "Mykhailo", "Hrushevsky").await;
    add_teacher(&gw, "Volodymyr", "Antonovych").await;
    let names: Vec<String> = Gateway::<Teacher>::list(&gw)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.last_name)
        .collect();
    assert_eq!(names, vec!["Antonovych", "Franko", "Hrushevsky"]);

    add_subject(&gw, "Literature").await;
    add_subject(&gw, "Algebra").await;
    let names: Vec<String> = Gateway::<Subject>::list(&gw)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Algebra", "Literature"]);
}

#[tokio::test]
async fn test_student_lists_with_current_group() {
    let gw = gateway().await;
    let group_id = add_group(&gw, 121, "Philology").await;
    add_student(&gw, "Taras", "Shevchenko", group_id).await.unwrap();
    add_student(&gw, "Lesya", "Ukrainka", group_id).await.unwrap();
    add_student(&gw, "Ivan", "Kotliarevsky", group_id).await.unwrap();

    let students = Gateway::<Student>::list(&gw).await.unwrap();
    let names: Vec<&str> = students.iter().map(|s| s.last_name.as_str()).collect();
    assert_eq!(names, vec!["Kotliarevsky", "Shevchenko", "Ukrainka"]);

    let group = students[0].group.as_ref().unwrap();
    assert_eq!(group.id, group_id);
    assert_eq!(group.speciality_code, 121);
    assert_eq!(group.speciality_name, "Philology");

    // Group edits show up on the next student listing
    Gateway::<Group>::update(
        &gw,
        group_id,
        &GroupFields {
            speciality_code: 121,
            speciality_name: "Ukrainian Philology".to_string(),
        },
    )
    .await
    .unwrap();
    let students = Gateway::<Student>::list(&gw).await.unwrap();
    assert_eq!(
        students[0].group.as_ref().unwrap().speciality_name,
        "Ukrainian Philology"
    );
}

#[tokio::test]
async fn test_dangling_group_lists_as_null() {
    let gw = gateway().await;
    disable_foreign_keys(&gw).await;

    let missing = Uuid::new_v4();
    add_student(&gw, "Hryhorii", "Skovoroda", missing).await.unwrap();

    let students = Gateway::<Student>::list(&gw).await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].group_id, missing);
    assert!(students[0].group.is_none());
}

#[tokio::test]
async fn test_unknown_group_rejected_with_foreign_keys() {
    let gw = gateway().await;
    let result = add_student(&gw, "Hryhorii", "Skovoroda", Uuid::new_v4()).await;
    assert!(matches!(result, Err(Error::Database(_))));
}

#[tokio::test]
async fn test_referenced_group_cannot_be_deleted() {
    let gw = gateway().await;
    let group_id = add_group(&gw, 121, "Philology").await;
    add_student(&gw, "Taras", "Shevchenko", group_id).await.unwrap();

    let result = Gateway::<Group>::delete(&gw, group_id).await;
    assert!(matches!(result, Err(Error::Database(_))));
    assert_eq!(Gateway::<Group>::list(&gw).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_grades_join_and_order_newest_first() {
    let gw = gateway().await;
    let group_id = add_group(&gw, 121, "Philology").await;
    let student_id = add_student(&gw, "Taras", "Shevchenko", group_id).await.unwrap();
    let teacher_id = add_teacher(&gw, "Ivan", "Franko").await;
    let subject_id = add_subject(&gw, "Literature").await;

    let first = Gateway::<Grade>::create(&gw, &grade_fields(student_id, teacher_id, subject_id, 70))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let mut fields = grade_fields(student_id, teacher_id, subject_id, 100);
    fields.note = Some("excellent essay".to_string());
    let second = Gateway::<Grade>::create(&gw, &fields).await.unwrap();

    let grades = Gateway::<Grade>::list(&gw).await.unwrap();
    assert_eq!(grades.iter().map(|g| g.id).collect::<Vec<_>>(), vec![second, first]);

    let newest = &grades[0];
    assert_eq!(newest.grade, 100);
    assert_eq!(newest.note.as_deref(), Some("excellent essay"));
    assert_eq!(newest.student.as_ref().unwrap().full_name(), "Shevchenko Taras");
    assert_eq!(newest.teacher.as_ref().unwrap().full_name(), "Franko Ivan");
    assert_eq!(newest.subject.as_ref().unwrap().name, "Literature");
    assert_eq!(grades[1].note, None);
}

#[tokio::test]
async fn test_grade_relations_dangle_independently() {
    let gw = gateway().await;
    let group_id = add_group(&gw, 121, "Philology").await;
    let student_id = add_student(&gw, "Taras", "Shevchenko", group_id).await.unwrap();
    let subject_id = add_subject(&gw, "Literature").await;

    disable_foreign_keys(&gw).await;
    Gateway::<Grade>::create(&gw, &grade_fields(student_id, Uuid::new_v4(), subject_id, 55))
        .await
        .unwrap();

    let grades = Gateway::<Grade>::list(&gw).await.unwrap();
    assert!(grades[0].student.is_some());
    assert!(grades[0].teacher.is_none());
    assert!(grades[0].subject.is_some());
}

#[tokio::test]
async fn test_grade_range_enforced_by_schema() {
    let gw = gateway().await;
    let group_id = add_group(&gw, 121, "Philology").await;
    let student_id = add_student(&gw, "Taras", "Shevchenko", group_id).await.unwrap();
    let teacher_id = add_teacher(&gw, "Ivan", "Franko").await;
    let subject_id = add_subject(&gw, "Literature").await;

    let result =
        Gateway::<Grade>::create(&gw, &grade_fields(student_id, teacher_id, subject_id, 101)).await;
    assert!(matches!(result, Err(Error::Database(_))));
}

#[tokio::test]
async fn test_update_after_delete_leaves_record_deleted() {
    let gw = gateway().await;
    let id = add_subject(&gw, "Astronomy").await;

    // One client deletes while another still has the edit form open
    Gateway::<Subject>::delete(&gw, id).await.unwrap();
    let result = Gateway::<Subject>::update(
        &gw,
        id,
        &SubjectFields {
            name: "Astrophysics".to_string(),
        },
    )
    .await;

    assert!(result.is_ok(), "Update of a missing record still succeeds");
    assert!(Gateway::<Subject>::list(&gw).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_of_missing_id_succeeds() {
    let gw = gateway().await;
    assert!(Gateway::<Teacher>::delete(&gw, Uuid::new_v4()).await.is_ok());
}

#[tokio::test]
async fn test_form_controller_over_sqlite() {
    let gw = gateway().await;
    let mut controller: FormController<'_, Group, SqliteGateway> = FormController::new(&gw);

    controller.open_create();
    {
        let form = controller.form_mut().unwrap();
        form.speciality_code = "12".to_string();
        form.speciality_name = "Law".to_string();
    }
    assert_eq!(controller.submit().await, SubmitOutcome::Invalid);
    assert!(Gateway::<Group>::list(&gw).await.unwrap().is_empty());

    controller.form_mut().unwrap().speciality_code = "081".to_string();
    assert!(matches!(controller.submit().await, SubmitOutcome::Saved { reloaded: true, .. }));
    assert_eq!(controller.records().len(), 1);
    assert_eq!(controller.records()[0].speciality_code, 81);

    // Edit form shows the code padded back to three digits
    let record = controller.records()[0].clone();
    controller.open_edit(record);
    assert_eq!(controller.form_mut().unwrap().speciality_code, "081");
}

#[tokio::test]
async fn test_file_database_created_on_first_run() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("ujournal.db");

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists());

    let gw = SqliteGateway::new(pool);
    add_subject(&gw, "Geography").await;
    gw.pool().close().await;

    // Reopening keeps existing data
    let gw = SqliteGateway::new(init_database(&db_path).await.unwrap());
    let subjects = Gateway::<Subject>::list(&gw).await.unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].name, "Geography");
}
