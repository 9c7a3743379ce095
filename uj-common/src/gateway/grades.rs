//! Grade persistence
//!
//! Listing joins student, teacher and subject display fields, newest grade
//! first. Each relation is `None` independently when its reference dangles.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::{note_untouched, now_timestamp, parse_id, parse_timestamp, Gateway, SqliteGateway};
use crate::model::{Grade, GradeFields, PersonRef, SubjectRef};
use crate::Result;

fn person_from_row(row: &SqliteRow, prefix: &str) -> Result<Option<PersonRef>> {
    match row.try_get::<Option<String>, _>(format!("{}_ref_id", prefix).as_str())? {
        Some(id) => Ok(Some(PersonRef {
            id: parse_id(&id)?,
            first_name: row.try_get(format!("{}_first_name", prefix).as_str())?,
            last_name: row.try_get(format!("{}_last_name", prefix).as_str())?,
        })),
        None => Ok(None),
    }
}

fn grade_from_row(row: &SqliteRow) -> Result<Grade> {
    let subject = match row.try_get::<Option<String>, _>("subject_ref_id")? {
        Some(id) => Some(SubjectRef {
            id: parse_id(&id)?,
            name: row.try_get("subject_name")?,
        }),
        None => None,
    };

    Ok(Grade {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        student_id: parse_id(&row.try_get::<String, _>("student_id")?)?,
        teacher_id: parse_id(&row.try_get::<String, _>("teacher_id")?)?,
        subject_id: parse_id(&row.try_get::<String, _>("subject_id")?)?,
        grade: row.try_get("grade")?,
        note: row.try_get("note")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
        student: person_from_row(row, "student")?,
        teacher: person_from_row(row, "teacher")?,
        subject,
    })
}

impl Gateway<Grade> for SqliteGateway {
    async fn list(&self) -> Result<Vec<Grade>> {
        let rows = sqlx::query(
            r#"
            SELECT gr.id, gr.student_id, gr.teacher_id, gr.subject_id, gr.grade, gr.note,
                   gr.created_at, gr.updated_at,
                   st.id AS student_ref_id,
                   st.first_name AS student_first_name,
                   st.last_name AS student_last_name,
                   t.id AS teacher_ref_id,
                   t.first_name AS teacher_first_name,
                   t.last_name AS teacher_last_name,
                   sb.id AS subject_ref_id,
                   sb.name AS subject_name
            FROM grades gr
            LEFT JOIN students st ON gr.student_id = st.id
            LEFT JOIN teachers t ON gr.teacher_id = t.id
            LEFT JOIN subjects sb ON gr.subject_id = sb.id
            ORDER BY gr.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(grade_from_row).collect()
    }

    async fn create(&self, fields: &GradeFields) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO grades (
                id, student_id, teacher_id, subject_id, grade, note, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(fields.student_id.to_string())
        .bind(fields.teacher_id.to_string())
        .bind(fields.subject_id.to_string())
        .bind(fields.grade)
        .bind(&fields.note)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!("Created grade {} for student {}", id, fields.student_id);
        Ok(id)
    }

    async fn update(&self, id: Uuid, fields: &GradeFields) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE grades
            SET student_id = ?, teacher_id = ?, subject_id = ?, grade = ?, note = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.student_id.to_string())
        .bind(fields.teacher_id.to_string())
        .bind(fields.subject_id.to_string())
        .bind(fields.grade)
        .bind(&fields.note)
        .bind(now_timestamp())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        note_untouched(&result, "Grade", "update", id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM grades WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        note_untouched(&result, "Grade", "delete", id);
        Ok(())
    }
}
