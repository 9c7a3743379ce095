//! Subject persistence

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::{note_untouched, now_timestamp, parse_id, parse_timestamp, Gateway, SqliteGateway};
use crate::model::{Subject, SubjectFields};
use crate::Result;

fn subject_from_row(row: &SqliteRow) -> Result<Subject> {
    Ok(Subject {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        name: row.try_get("name")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}

impl Gateway<Subject> for SqliteGateway {
    async fn list(&self) -> Result<Vec<Subject>> {
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM subjects ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(subject_from_row).collect()
    }

    async fn create(&self, fields: &SubjectFields) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = now_timestamp();

        sqlx::query(
            "INSERT INTO subjects (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&fields.name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!("Created subject {}", id);
        Ok(id)
    }

    async fn update(&self, id: Uuid, fields: &SubjectFields) -> Result<()> {
        let result = sqlx::query("UPDATE subjects SET name = ?, updated_at = ? WHERE id = ?")
            .bind(&fields.name)
            .bind(now_timestamp())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        note_untouched(&result, "Subject", "update", id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        note_untouched(&result, "Subject", "delete", id);
        Ok(())
    }
}
