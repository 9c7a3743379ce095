//! Entity models
//!
//! The five journal entities as they are listed by the gateway. Student and
//! Grade carry joined display objects that are looked up at read time and
//! are `None` when the stored reference no longer resolves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{FormSchema, GradeForm, GroupForm, StudentForm, SubjectForm, TeacherForm};
use crate::table::TableView;
use crate::views;

/// Common surface of the five entity types
///
/// Ties a listed record type to its validated payload, its text form and
/// the names used on the wire and in exports.
pub trait Entity: Serialize + Clone + std::fmt::Debug + Send + Sync + Unpin + 'static {
    /// Validated payload accepted by create and update
    type Fields: Clone + std::fmt::Debug + Send + Sync;

    /// Raw text form that validates into [`Entity::Fields`]
    type Form: FormSchema<Entity = Self>;

    /// Resource segment used in REST paths (`/groups`)
    const RESOURCE: &'static str;

    /// Display name of the entity's table view, also the export file stem
    const TITLE: &'static str;

    /// Singular label used in response messages ("Group updated successfully")
    const LABEL: &'static str;

    fn id(&self) -> Uuid;

    /// Table view listing records of this entity
    fn table() -> TableView<Self>;
}

/// Group (speciality)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    /// 0-999, displayed zero-padded to three digits
    pub speciality_code: i64,
    pub speciality_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated group payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFields {
    pub speciality_code: i64,
    pub speciality_name: String,
}

impl Group {
    /// Speciality code as shown to users: always three digits
    pub fn display_code(&self) -> String {
        format_speciality_code(self.speciality_code)
    }
}

/// Zero-pad a speciality code to three characters
pub fn format_speciality_code(code: i64) -> String {
    format!("{:03}", code)
}

impl Entity for Group {
    type Fields = GroupFields;
    type Form = GroupForm;
    const RESOURCE: &'static str = "groups";
    const TITLE: &'static str = "Groups";
    const LABEL: &'static str = "Group";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table() -> TableView<Self> {
        views::group_table()
    }
}

/// Teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated teacher payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherFields {
    pub first_name: String,
    pub last_name: String,
}

impl Entity for Teacher {
    type Fields = TeacherFields;
    type Form = TeacherForm;
    const RESOURCE: &'static str = "teachers";
    const TITLE: &'static str = "Teachers";
    const LABEL: &'static str = "Teacher";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table() -> TableView<Self> {
        views::teacher_table()
    }
}

/// Subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated subject payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectFields {
    pub name: String,
}

impl Entity for Subject {
    type Fields = SubjectFields;
    type Form = SubjectForm;
    const RESOURCE: &'static str = "subjects";
    const TITLE: &'static str = "Subjects";
    const LABEL: &'static str = "Subject";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table() -> TableView<Self> {
        views::subject_table()
    }
}

/// Joined group display fields attached to a listed student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: Uuid,
    pub speciality_code: i64,
    pub speciality_name: String,
}

/// Student, listed with its group joined at read time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` when `group_id` does not resolve
    pub group: Option<GroupRef>,
}

/// Validated student payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentFields {
    pub first_name: String,
    pub last_name: String,
    pub group_id: Uuid,
}

impl Entity for Student {
    type Fields = StudentFields;
    type Form = StudentForm;
    const RESOURCE: &'static str = "students";
    const TITLE: &'static str = "Students";
    const LABEL: &'static str = "Student";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table() -> TableView<Self> {
        views::student_table()
    }
}

/// Joined person display fields (student or teacher) attached to a grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

impl PersonRef {
    /// "Last First", the order the journal lists people in
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

/// Joined subject display fields attached to a grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRef {
    pub id: Uuid,
    pub name: String,
}

/// Grade, listed with student, teacher and subject joined at read time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    /// Score in [0, 100]
    pub grade: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub student: Option<PersonRef>,
    pub teacher: Option<PersonRef>,
    pub subject: Option<SubjectRef>,
}

/// Validated grade payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeFields {
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub grade: i64,
    pub note: Option<String>,
}

impl Entity for Grade {
    type Fields = GradeFields;
    type Form = GradeForm;
    const RESOURCE: &'static str = "grades";
    const TITLE: &'static str = "Grades";
    const LABEL: &'static str = "Grade";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table() -> TableView<Self> {
        views::grade_table()
    }
}
