//! Table views of the five entities
//!
//! Column headers, order and derived cells exactly as each page lists them.

use crate::model::{Grade, Group, Student, Subject, Teacher};
use crate::table::{Column, TableView};

pub fn group_table() -> TableView<Group> {
    TableView::new(
        "Groups",
        vec![
            Column::derived("Speciality Code", |g: &Group| g.display_code()),
            Column::field("Speciality Name", "speciality_name"),
        ],
    )
}

pub fn student_table() -> TableView<Student> {
    TableView::new(
        "Students",
        vec![
            Column::field("Last Name", "last_name"),
            Column::field("First Name", "first_name"),
            Column::derived("Group", |s: &Student| {
                s.group
                    .as_ref()
                    .map(|g| g.speciality_name.clone())
                    .unwrap_or_default()
            }),
        ],
    )
}

pub fn teacher_table() -> TableView<Teacher> {
    TableView::new(
        "Teachers",
        vec![
            Column::field("Last Name", "last_name"),
            Column::field("First Name", "first_name"),
        ],
    )
}

pub fn subject_table() -> TableView<Subject> {
    TableView::new("Subjects", vec![Column::field("Subject Name", "name")])
}

pub fn grade_table() -> TableView<Grade> {
    TableView::new(
        "Grades",
        vec![
            Column::derived("Student", |g: &Grade| {
                g.student.as_ref().map(|p| p.full_name()).unwrap_or_default()
            }),
            Column::derived("Teacher", |g: &Grade| {
                g.teacher.as_ref().map(|p| p.full_name()).unwrap_or_default()
            }),
            Column::derived("Subject", |g: &Grade| {
                g.subject.as_ref().map(|s| s.name.clone()).unwrap_or_default()
            }),
            Column::field("Grade", "grade"),
            Column::field("Note", "note"),
            Column::derived("Date", |g: &Grade| g.created_at.format("%Y-%m-%d").to_string()),
        ],
    )
}
