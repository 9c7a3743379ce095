//! Group persistence

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::{note_untouched, now_timestamp, parse_id, parse_timestamp, Gateway, SqliteGateway};
use crate::model::{Group, GroupFields};
use crate::Result;

fn group_from_row(row: &SqliteRow) -> Result<Group> {
    Ok(Group {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        speciality_code: row.try_get("speciality_code")?,
        speciality_name: row.try_get("speciality_name")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}

impl Gateway<Group> for SqliteGateway {
    async fn list(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query(
            r#"
            SELECT id, speciality_code, speciality_name, created_at, updated_at
            FROM "groups"
            ORDER BY speciality_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(group_from_row).collect()
    }

    async fn create(&self, fields: &GroupFields) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO "groups" (id, speciality_code, speciality_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(fields.speciality_code)
        .bind(&fields.speciality_name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!("Created group {} ({:03})", id, fields.speciality_code);
        Ok(id)
    }

    async fn update(&self, id: Uuid, fields: &GroupFields) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE "groups"
            SET speciality_code = ?, speciality_name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.speciality_code)
        .bind(&fields.speciality_name)
        .bind(now_timestamp())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        note_untouched(&result, "Group", "update", id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM "groups" WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        note_untouched(&result, "Group", "delete", id);
        Ok(())
    }
}
