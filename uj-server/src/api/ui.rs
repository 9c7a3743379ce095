//! UI serving routes
//!
//! Server-rendered HTML: an index linking the five tables and one page
//! per entity showing its table view with export links and Edit/Delete
//! actions per row. The add/edit/delete pages live in [`super::forms`].

use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Router,
};
use tracing::debug;
use uj_common::table::{RenderedTable, RowAction, TableView, ACTIONS_HEADER};
use uj_common::{Entity, Gateway, Grade, Group, SqliteGateway, Student, Subject, Teacher};
use uuid::Uuid;

use super::ApiError;
use crate::AppState;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse}\
th{background:#4b5563;color:#fff}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left}\
tr:nth-child(even) td{background:#f5f5f5}\
td.actions{text-align:right;white-space:nowrap}\
td.actions a{margin-left:.75em}\
label{font-weight:bold}\
input,select,textarea{min-width:20em}\
.error{color:#dc2626}";

/// (resource, title) of every entity page, in menu order
const PAGES: [(&str, &str); 5] = [
    (Group::RESOURCE, Group::TITLE),
    (Student::RESOURCE, Student::TITLE),
    (Teacher::RESOURCE, Teacher::TITLE),
    (Subject::RESOURCE, Subject::TITLE),
    (Grade::RESOURCE, Grade::TITLE),
];

pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(serve_index))
        .route("/ui/:entity", get(serve_entity_page))
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub(crate) fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// GET /
pub async fn serve_index() -> Html<String> {
    let mut body = String::from("<h1>University Journal</h1>\n<ul>\n");
    for (resource, title) in PAGES {
        body.push_str(&format!("<li><a href=\"/ui/{}\">{}</a></li>\n", resource, title));
    }
    body.push_str("</ul>\n");
    Html(page("University Journal", &body))
}

/// Table page URL of entity `E`
pub(crate) fn table_url<E: Entity>() -> String {
    format!("/ui/{}", E::RESOURCE)
}

/// Table view of `E` offering Edit and Delete on every row
pub(crate) fn actions_view<E: Entity>() -> TableView<E> {
    E::table()
        .on_edit(|record: &E| debug!("Editing {} {}", E::LABEL, record.id()))
        .on_delete(|record: &E| debug!("Deleting {} {}", E::LABEL, record.id()))
}

fn action_link(resource: &str, id: Uuid, action: RowAction) -> String {
    match action {
        RowAction::Edit => format!("<a href=\"/ui/{}/{}/edit\">Edit</a>", resource, id),
        RowAction::Delete => format!("<a href=\"/ui/{}/{}/delete\">Delete</a>", resource, id),
    }
}

/// `ids` holds the record id of each row, in row order
fn table_page(resource: &str, label: &str, table: &RenderedTable, ids: &[Uuid]) -> String {
    let mut body = format!(
        "<p><a href=\"/\">Home</a></p>\n<h1>{title}</h1>\n\
         <p><a href=\"/ui/{resource}/new\">Add {label}</a> | \
         <a href=\"/{resource}/export.csv\">Export CSV</a> | \
         <a href=\"/{resource}/export.pdf\">Export PDF</a></p>\n<table>\n<thead><tr>",
        title = escape_html(&table.title),
    );
    for header in &table.headers {
        body.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    if table.has_actions() {
        body.push_str(&format!("<th>{}</th>", ACTIONS_HEADER));
    }
    body.push_str("</tr></thead>\n<tbody>\n");

    if table.rows.is_empty() {
        let columns = table.headers.len() + usize::from(table.has_actions());
        body.push_str(&format!(
            "<tr><td colspan=\"{}\">No records</td></tr>\n",
            columns.max(1)
        ));
    }
    for (row, id) in table.rows.iter().zip(ids) {
        body.push_str("<tr>");
        for cell in row {
            body.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        if table.has_actions() {
            let links: Vec<String> = table
                .actions
                .iter()
                .map(|action| action_link(resource, *id, *action))
                .collect();
            body.push_str(&format!("<td class=\"actions\">{}</td>", links.join("")));
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</tbody>\n</table>\n");

    page(&table.title, &body)
}

async fn entity_page<E>(state: &AppState) -> Result<Html<String>, ApiError>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    let records = Gateway::<E>::list(&state.gateway)
        .await
        .map_err(|e| ApiError::failed("fetch", E::RESOURCE, e))?;
    let table = actions_view::<E>()
        .render(&records)
        .map_err(|e| ApiError::failed("render", E::RESOURCE, e))?;
    let ids: Vec<Uuid> = records.iter().map(Entity::id).collect();
    Ok(Html(table_page(E::RESOURCE, E::LABEL, &table, &ids)))
}

/// GET /ui/:entity
pub async fn serve_entity_page(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Html<String>, ApiError> {
    match entity.as_str() {
        Group::RESOURCE => entity_page::<Group>(&state).await,
        Student::RESOURCE => entity_page::<Student>(&state).await,
        Teacher::RESOURCE => entity_page::<Teacher>(&state).await,
        Subject::RESOURCE => entity_page::<Subject>(&state).await,
        Grade::RESOURCE => entity_page::<Grade>(&state).await,
        _ => Err(ApiError::NotFound(entity)),
    }
}
