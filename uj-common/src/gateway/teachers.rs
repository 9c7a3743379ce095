//! Teacher persistence

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::{note_untouched, now_timestamp, parse_id, parse_timestamp, Gateway, SqliteGateway};
use crate::model::{Teacher, TeacherFields};
use crate::Result;

fn teacher_from_row(row: &SqliteRow) -> Result<Teacher> {
    Ok(Teacher {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}

impl Gateway<Teacher> for SqliteGateway {
    async fn list(&self) -> Result<Vec<Teacher>> {
        let rows = sqlx::query(
            r#"
            SELECT id, first_name, last_name, created_at, updated_at
            FROM teachers
            ORDER BY last_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(teacher_from_row).collect()
    }

    async fn create(&self, fields: &TeacherFields) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO teachers (id, first_name, last_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!("Created teacher {}", id);
        Ok(id)
    }

    async fn update(&self, id: Uuid, fields: &TeacherFields) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE teachers
            SET first_name = ?, last_name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(now_timestamp())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        note_untouched(&result, "Teacher", "update", id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM teachers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        note_untouched(&result, "Teacher", "delete", id);
        Ok(())
    }
}
