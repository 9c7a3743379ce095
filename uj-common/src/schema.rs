//! Record schemas and validation
//!
//! Each entity has a form type holding raw text exactly as entered. A form
//! validates into the entity's typed payload or into a field-keyed set of
//! error messages, never both. Validation is pure: no I/O, no clock.
//!
//! Only the first violated rule per field is reported.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::model::{
    format_speciality_code, Entity, Grade, GradeFields, Group, GroupFields, Student,
    StudentFields, Subject, SubjectFields, Teacher, TeacherFields,
};

/// Minimum length, in characters, of every name field
pub const MIN_NAME_LEN: usize = 2;

/// Inclusive bounds of a grade score
pub const GRADE_MIN: i64 = 0;
pub const GRADE_MAX: i64 = 100;

/// Field-keyed validation messages (first failure per field)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field` unless one is already recorded
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Raw text form for one entity type
pub trait FormSchema:
    Default + Clone + fmt::Debug + PartialEq + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    type Entity: Entity;

    /// Validate and coerce the raw input
    fn validate(&self) -> Result<<Self::Entity as Entity>::Fields, ValidationErrors>;

    /// Text representation of an existing record, as loaded into an edit form
    fn from_record(record: &Self::Entity) -> Self;
}

// ========================================
// Field rules
// ========================================

fn check_name(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) -> String {
    if value.chars().count() < MIN_NAME_LEN {
        errors.add(
            field,
            format!("{} must be at least {} characters", label, MIN_NAME_LEN),
        );
    }
    value.to_string()
}

fn check_speciality_code(errors: &mut ValidationErrors, value: &str) -> i64 {
    if value.len() == 3 && value.bytes().all(|b| b.is_ascii_digit()) {
        // Three ASCII digits always fit
        value.parse().unwrap_or_default()
    } else {
        errors.add("speciality_code", "Speciality code must be exactly 3 digits");
        0
    }
}

fn check_grade(errors: &mut ValidationErrors, value: &str) -> i64 {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        errors.add("grade", "Grade must be a number");
        return 0;
    }
    // Digit strings too long for u64 are out of range as well
    match value.parse::<u64>() {
        Ok(n) if n <= GRADE_MAX as u64 => n as i64,
        _ => {
            errors.add(
                "grade",
                format!("Grade must be between {} and {}", GRADE_MIN, GRADE_MAX),
            );
            0
        }
    }
}

fn check_reference(errors: &mut ValidationErrors, field: &str, entity: &str, value: &str) -> Uuid {
    if value.is_empty() {
        errors.add(field, format!("Please select a {}", entity));
        return Uuid::nil();
    }
    match Uuid::parse_str(value) {
        Ok(id) => id,
        Err(_) => {
            errors.add(field, format!("Please select a valid {}", entity));
            Uuid::nil()
        }
    }
}

/// Read a form field as text whether the client sent a string or a number
///
/// `null` and missing fields read as the empty string.
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected text or number, got {}",
            other
        ))),
    }
}

/// Read a speciality code as text, zero-padding a JSON integer (`7` reads
/// as `"007"`)
///
/// Integers outside 0..=999 and non-integers keep their plain text and fail
/// the three-digit rule.
fn speciality_code_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(code) if code <= 999 => Ok(format_speciality_code(code as i64)),
            _ => Ok(n.to_string()),
        },
        Some(other) => Err(D::Error::custom(format!(
            "expected a speciality code, got {}",
            other
        ))),
    }
}

// ========================================
// Forms
// ========================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupForm {
    #[serde(default, deserialize_with = "speciality_code_text")]
    pub speciality_code: String,
    #[serde(default, deserialize_with = "text")]
    pub speciality_name: String,
}

impl FormSchema for GroupForm {
    type Entity = Group;

    fn validate(&self) -> Result<GroupFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let speciality_code = check_speciality_code(&mut errors, &self.speciality_code);
        let speciality_name = check_name(
            &mut errors,
            "speciality_name",
            "Speciality name",
            &self.speciality_name,
        );
        errors.into_result(|| GroupFields {
            speciality_code,
            speciality_name,
        })
    }

    fn from_record(record: &Group) -> Self {
        Self {
            speciality_code: format_speciality_code(record.speciality_code),
            speciality_name: record.speciality_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherForm {
    #[serde(default, deserialize_with = "text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "text")]
    pub last_name: String,
}

impl FormSchema for TeacherForm {
    type Entity = Teacher;

    fn validate(&self) -> Result<TeacherFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let first_name = check_name(&mut errors, "first_name", "First name", &self.first_name);
        let last_name = check_name(&mut errors, "last_name", "Last name", &self.last_name);
        errors.into_result(|| TeacherFields {
            first_name,
            last_name,
        })
    }

    fn from_record(record: &Teacher) -> Self {
        Self {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectForm {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
}

impl FormSchema for SubjectForm {
    type Entity = Subject;

    fn validate(&self) -> Result<SubjectFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = check_name(&mut errors, "name", "Subject name", &self.name);
        errors.into_result(|| SubjectFields { name })
    }

    fn from_record(record: &Subject) -> Self {
        Self {
            name: record.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentForm {
    #[serde(default, deserialize_with = "text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "text")]
    pub group_id: String,
}

impl FormSchema for StudentForm {
    type Entity = Student;

    fn validate(&self) -> Result<StudentFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let first_name = check_name(&mut errors, "first_name", "First name", &self.first_name);
        let last_name = check_name(&mut errors, "last_name", "Last name", &self.last_name);
        let group_id = check_reference(&mut errors, "group_id", "group", &self.group_id);
        errors.into_result(|| StudentFields {
            first_name,
            last_name,
            group_id,
        })
    }

    fn from_record(record: &Student) -> Self {
        Self {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            group_id: record.group_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeForm {
    #[serde(default, deserialize_with = "text")]
    pub student_id: String,
    #[serde(default, deserialize_with = "text")]
    pub teacher_id: String,
    #[serde(default, deserialize_with = "text")]
    pub subject_id: String,
    #[serde(default, deserialize_with = "text")]
    pub grade: String,
    #[serde(default, deserialize_with = "text")]
    pub note: String,
}

impl FormSchema for GradeForm {
    type Entity = Grade;

    fn validate(&self) -> Result<GradeFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let student_id = check_reference(&mut errors, "student_id", "student", &self.student_id);
        let teacher_id = check_reference(&mut errors, "teacher_id", "teacher", &self.teacher_id);
        let subject_id = check_reference(&mut errors, "subject_id", "subject", &self.subject_id);
        let grade = check_grade(&mut errors, &self.grade);
        let note = if self.note.is_empty() {
            None
        } else {
            Some(self.note.clone())
        };
        errors.into_result(|| GradeFields {
            student_id,
            teacher_id,
            subject_id,
            grade,
            note,
        })
    }

    fn from_record(record: &Grade) -> Self {
        Self {
            student_id: record.student_id.to_string(),
            teacher_id: record.teacher_id.to_string(),
            subject_id: record.subject_id.to_string(),
            grade: record.grade.to_string(),
            note: record.note.clone().unwrap_or_default(),
        }
    }
}
