//! Student persistence
//!
//! Listing LEFT JOINs the student's group; a dangling `group_id` lists with
//! `group: None`.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::{note_untouched, now_timestamp, parse_id, parse_timestamp, Gateway, SqliteGateway};
use crate::model::{GroupRef, Student, StudentFields};
use crate::Result;

fn student_from_row(row: &SqliteRow) -> Result<Student> {
    let group = match row.try_get::<Option<String>, _>("group_ref_id")? {
        Some(group_id) => Some(GroupRef {
            id: parse_id(&group_id)?,
            speciality_code: row.try_get("group_speciality_code")?,
            speciality_name: row.try_get("group_speciality_name")?,
        }),
        None => None,
    };

    Ok(Student {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        group_id: parse_id(&row.try_get::<String, _>("group_id")?)?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
        group,
    })
}

impl Gateway<Student> for SqliteGateway {
    async fn list(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.first_name, s.last_name, s.group_id, s.created_at, s.updated_at,
                   g.id AS group_ref_id,
                   g.speciality_code AS group_speciality_code,
                   g.speciality_name AS group_speciality_name
            FROM students s
            LEFT JOIN "groups" g ON s.group_id = g.id
            ORDER BY s.last_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(student_from_row).collect()
    }

    async fn create(&self, fields: &StudentFields) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO students (id, first_name, last_name, group_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(fields.group_id.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!("Created student {} in group {}", id, fields.group_id);
        Ok(id)
    }

    async fn update(&self, id: Uuid, fields: &StudentFields) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE students
            SET first_name = ?, last_name = ?, group_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(fields.group_id.to_string())
        .bind(now_timestamp())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        note_untouched(&result, "Student", "update", id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        note_untouched(&result, "Student", "delete", id);
        Ok(())
    }
}
