//! Table export downloads
//!
//! GET /{entity}/export.csv and /{entity}/export.pdf serve the entity's
//! table view as an attachment named after the table title.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use uj_common::export::{resolve_font, to_csv, to_pdf, ExportFormat, PdfStyle};
use uj_common::table::RenderedTable;
use uj_common::{Entity, Gateway, SqliteGateway};

use super::ApiError;
use crate::AppState;

/// List all records of `E` and render its table view
async fn rendered_table<E>(state: &AppState) -> Result<RenderedTable, ApiError>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    let records = Gateway::<E>::list(&state.gateway)
        .await
        .map_err(|e| ApiError::failed("fetch", E::RESOURCE, e))?;
    E::table()
        .render(&records)
        .map_err(|e| ApiError::failed("render", E::RESOURCE, e))
}

fn attachment(format: ExportFormat, title: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name(title)),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /{entity}/export.csv
pub async fn export_csv<E>(State(state): State<AppState>) -> Result<Response, ApiError>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    let table = rendered_table::<E>(&state).await?;
    let csv = to_csv(&table);
    Ok(attachment(ExportFormat::Csv, &table.title, csv.into_bytes()))
}

/// GET /{entity}/export.pdf
pub async fn export_pdf<E>(State(state): State<AppState>) -> Result<Response, ApiError>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    let table = rendered_table::<E>(&state).await?;
    let font = resolve_font(state.pdf_font.as_deref())
        .map_err(|e| ApiError::failed("export", E::RESOURCE, e))?;
    let style = PdfStyle::new(font);

    let title = table.title.clone();
    // Rendering is CPU-bound; keep it off the async workers
    let pdf = tokio::task::spawn_blocking(move || to_pdf(&table, &style))
        .await
        .map_err(|e| ApiError::failed("export", E::RESOURCE, e))?
        .map_err(|e| ApiError::failed("export", E::RESOURCE, e))?;

    Ok(attachment(ExportFormat::Pdf, &title, pdf))
}
