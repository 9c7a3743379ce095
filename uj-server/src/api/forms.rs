//! HTML add/edit/delete pages
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | /ui/:entity/new | empty form |
//! | POST | /ui/:entity/new | 303 to the table, or the form with errors (422) |
//! | GET | /ui/:entity/:id/edit | form prefilled from the record |
//! | POST | /ui/:entity/:id/edit | as POST new |
//! | GET | /ui/:entity/:id/delete | confirmation page |
//! | POST | /ui/:entity/:id/delete | deletes when `confirm=yes`, then 303 |
//!
//! Every page drives a [`FormController`] over the shared gateway, so the
//! browser gets exactly the validation and persistence the controller
//! implements.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use uj_common::form::{DeleteOutcome, FormController, FormMode, FormState, SubmitOutcome};
use uj_common::{Entity, Gateway, Grade, Group, SqliteGateway, Student, Subject, Teacher};
use uuid::Uuid;

use super::records::parse_id;
use super::ui::{actions_view, escape_html, page, table_url};
use super::ApiError;
use crate::AppState;

type Controller<'g, E> = FormController<'g, E, SqliteGateway>;

/// Records offered by a `<select>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choices {
    Groups,
    Students,
    Teachers,
    Subjects,
}

impl Choices {
    fn placeholder(self) -> &'static str {
        match self {
            Choices::Groups => "Select a group",
            Choices::Students => "Select a student",
            Choices::Teachers => "Select a teacher",
            Choices::Subjects => "Select a subject",
        }
    }

    /// (id, display text) of every selectable record, in list order
    async fn load(self, gateway: &SqliteGateway) -> Result<Vec<(Uuid, String)>, ApiError> {
        let options: Vec<(Uuid, String)> = match self {
            Choices::Groups => Gateway::<Group>::list(gateway)
                .await
                .map(|groups| {
                    groups
                        .into_iter()
                        .map(|g| (g.id, g.speciality_name))
                        .collect()
                })
                .map_err(|e| ApiError::failed("fetch", Group::RESOURCE, e))?,
            Choices::Students => Gateway::<Student>::list(gateway)
                .await
                .map(|students| {
                    students
                        .into_iter()
                        .map(|s| (s.id, format!("{} {}", s.last_name, s.first_name)))
                        .collect()
                })
                .map_err(|e| ApiError::failed("fetch", Student::RESOURCE, e))?,
            Choices::Teachers => Gateway::<Teacher>::list(gateway)
                .await
                .map(|teachers| {
                    teachers
                        .into_iter()
                        .map(|t| (t.id, format!("{} {}", t.last_name, t.first_name)))
                        .collect()
                })
                .map_err(|e| ApiError::failed("fetch", Teacher::RESOURCE, e))?,
            Choices::Subjects => Gateway::<Subject>::list(gateway)
                .await
                .map(|subjects| subjects.into_iter().map(|s| (s.id, s.name)).collect())
                .map_err(|e| ApiError::failed("fetch", Subject::RESOURCE, e))?,
        };
        Ok(options)
    }
}

/// Input control of one form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Text { placeholder: Option<&'static str> },
    Number { min: i64, max: i64 },
    TextArea,
    Select(Choices),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Form field key, also the key of its validation message
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
}

const fn text(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        widget: Widget::Text { placeholder: None },
    }
}

const fn select(name: &'static str, label: &'static str, choices: Choices) -> FieldSpec {
    FieldSpec {
        name,
        label,
        widget: Widget::Select(choices),
    }
}

/// Input fields of an entity's HTML form, in display order
pub trait FormLayout: Entity {
    const FIELDS: &'static [FieldSpec];
}

impl FormLayout for Group {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec {
            name: "speciality_code",
            label: "Speciality Code",
            widget: Widget::Text {
                placeholder: Some("123"),
            },
        },
        text("speciality_name", "Speciality Name"),
    ];
}

impl FormLayout for Teacher {
    const FIELDS: &'static [FieldSpec] = &[
        text("first_name", "First Name"),
        text("last_name", "Last Name"),
    ];
}

impl FormLayout for Subject {
    const FIELDS: &'static [FieldSpec] = &[text("name", "Subject Name")];
}

impl FormLayout for Student {
    const FIELDS: &'static [FieldSpec] = &[
        text("first_name", "First Name"),
        text("last_name", "Last Name"),
        select("group_id", "Group", Choices::Groups),
    ];
}

impl FormLayout for Grade {
    const FIELDS: &'static [FieldSpec] = &[
        select("student_id", "Student", Choices::Students),
        select("teacher_id", "Teacher", Choices::Teachers),
        select("subject_id", "Subject", Choices::Subjects),
        FieldSpec {
            name: "grade",
            label: "Grade (0-100)",
            widget: Widget::Number { min: 0, max: 100 },
        },
        FieldSpec {
            name: "note",
            label: "Note",
            widget: Widget::TextArea,
        },
    ];
}

/// Dispatch `/ui/:entity/...` to the handler instantiated for that entity
macro_rules! by_entity {
    ($entity:expr, $handler:ident($($arg:expr),*)) => {
        match $entity.as_str() {
            Group::RESOURCE => $handler::<Group>($($arg),*).await,
            Student::RESOURCE => $handler::<Student>($($arg),*).await,
            Teacher::RESOURCE => $handler::<Teacher>($($arg),*).await,
            Subject::RESOURCE => $handler::<Subject>($($arg),*).await,
            Grade::RESOURCE => $handler::<Grade>($($arg),*).await,
            _ => Err(ApiError::NotFound($entity)),
        }
    };
}

pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/ui/:entity/new", get(serve_new).post(submit_new))
        .route("/ui/:entity/:id/edit", get(serve_edit).post(submit_edit))
        .route("/ui/:entity/:id/delete", get(serve_delete).post(submit_delete))
}

/// Body of the delete confirmation form
#[derive(Debug, Default, Deserialize)]
pub struct DeleteConfirmation {
    #[serde(default)]
    pub confirm: String,
}

impl DeleteConfirmation {
    fn confirmed(&self) -> bool {
        self.confirm == "yes"
    }
}

fn posted<T>(payload: Result<Form<T>, FormRejection>) -> Result<T, ApiError> {
    payload
        .map(|Form(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// Load the controller's records and find `id` among them
async fn find_record<E>(controller: &mut Controller<'_, E>, id: Uuid) -> Result<E, ApiError>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    controller
        .load()
        .await
        .map_err(|e| ApiError::failed("fetch", E::RESOURCE, e))?;
    controller
        .records()
        .iter()
        .find(|record| record.id() == id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("{} {}", E::LABEL, id)))
}

fn redirect_to_table<E: Entity>() -> Response {
    Redirect::to(&table_url::<E>()).into_response()
}

/// Select options keyed by field name, for every select in `E`'s layout
async fn load_choices<E: FormLayout>(
    state: &AppState,
) -> Result<Vec<(&'static str, Vec<(Uuid, String)>)>, ApiError> {
    let mut loaded = Vec::new();
    for field in E::FIELDS {
        if let Widget::Select(choices) = field.widget {
            loaded.push((field.name, choices.load(&state.gateway).await?));
        }
    }
    Ok(loaded)
}

fn render_field(
    field: &FieldSpec,
    value: &str,
    error: Option<&str>,
    options: &[(Uuid, String)],
) -> String {
    let name = field.name;
    let value = escape_html(value);
    let control = match field.widget {
        Widget::Text { placeholder } => {
            let placeholder = placeholder
                .map(|p| format!(" placeholder=\"{}\"", escape_html(p)))
                .unwrap_or_default();
            format!(
                "<input type=\"text\" id=\"{name}\" name=\"{name}\" value=\"{value}\"{placeholder}>"
            )
        }
        Widget::Number { min, max } => format!(
            "<input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" \
             value=\"{value}\">"
        ),
        Widget::TextArea => {
            format!("<textarea id=\"{name}\" name=\"{name}\" rows=\"3\">{value}</textarea>")
        }
        Widget::Select(choices) => {
            let mut select = format!(
                "<select id=\"{name}\" name=\"{name}\">\n<option value=\"\">{}</option>\n",
                choices.placeholder()
            );
            for (id, text) in options {
                let selected = if id.to_string() == value { " selected" } else { "" };
                select.push_str(&format!(
                    "<option value=\"{id}\"{selected}>{}</option>\n",
                    escape_html(text)
                ));
            }
            select.push_str("</select>");
            select
        }
    };

    let mut html = format!(
        "<p><label for=\"{name}\">{}</label><br>\n{control}",
        escape_html(field.label)
    );
    if let Some(message) = error {
        html.push_str(&format!(
            "<br>\n<span class=\"error\" id=\"{name}-error\">{}</span>",
            escape_html(message)
        ));
    }
    html.push_str("</p>\n");
    html
}

/// Render the controller's open form
///
/// The failure of a rejected save is shown as a generic message; its cause
/// is already in the log.
async fn form_page<E>(
    state: &AppState,
    controller: &Controller<'_, E>,
    status: StatusCode,
) -> Result<Response, ApiError>
where
    E: FormLayout,
    SqliteGateway: Gateway<E>,
{
    let FormState::Open {
        mode,
        form,
        errors,
        failure,
    } = controller.state()
    else {
        return Err(ApiError::Failed(format!("No open {} form", E::LABEL)));
    };

    let (heading, action, button) = match mode {
        FormMode::Create => (
            format!("Add {}", E::LABEL),
            format!("/ui/{}/new", E::RESOURCE),
            "Create",
        ),
        FormMode::Edit(record) => (
            format!("Edit {}", E::LABEL),
            format!("/ui/{}/{}/edit", E::RESOURCE, record.id()),
            "Update",
        ),
    };

    let values = serde_json::to_value(form)
        .map_err(|e| ApiError::failed("render", E::RESOURCE, e))?;
    let choices = load_choices::<E>(state).await?;

    let mut body = format!(
        "<p><a href=\"{table}\">{title}</a></p>\n<h1>{heading}</h1>\n",
        table = table_url::<E>(),
        title = E::TITLE,
    );
    if failure.is_some() {
        body.push_str(&format!(
            "<p class=\"error\">Failed to save {}</p>\n",
            E::LABEL.to_lowercase()
        ));
    }
    body.push_str(&format!("<form method=\"post\" action=\"{}\">\n", action));
    for field in E::FIELDS {
        let value = values.get(field.name).and_then(Value::as_str).unwrap_or("");
        let options = choices
            .iter()
            .find(|(name, _)| *name == field.name)
            .map(|(_, options)| options.as_slice())
            .unwrap_or(&[]);
        body.push_str(&render_field(field, value, errors.get(field.name), options));
    }
    body.push_str(&format!(
        "<p><button type=\"submit\">{}</button> <a href=\"{}\">Cancel</a></p>\n</form>\n",
        button,
        table_url::<E>()
    ));

    Ok((status, Html(page(&heading, &body))).into_response())
}

/// Take the posted fields into the open form and submit it
async fn submit<E>(
    state: &AppState,
    mut controller: Controller<'_, E>,
    fields: E::Form,
) -> Result<Response, ApiError>
where
    E: FormLayout,
    SqliteGateway: Gateway<E>,
{
    if let Some(form) = controller.form_mut() {
        *form = fields;
    }

    match controller.submit().await {
        SubmitOutcome::Saved { id, reloaded } => {
            info!("Saved {} {} from form", E::LABEL, id);
            debug!("{} list reloaded after save: {}", E::RESOURCE, reloaded);
            Ok(redirect_to_table::<E>())
        }
        SubmitOutcome::Invalid => {
            form_page(state, &controller, StatusCode::UNPROCESSABLE_ENTITY).await
        }
        SubmitOutcome::Failed => {
            form_page(state, &controller, StatusCode::INTERNAL_SERVER_ERROR).await
        }
        SubmitOutcome::NotOpen => Err(ApiError::Failed(format!("No open {} form", E::LABEL))),
    }
}

async fn new_form<E>(state: &AppState) -> Result<Response, ApiError>
where
    E: FormLayout,
    SqliteGateway: Gateway<E>,
{
    let mut controller = Controller::<E>::new(&state.gateway);
    controller.open_create();
    form_page(state, &controller, StatusCode::OK).await
}

async fn create_from_form<E>(
    state: &AppState,
    payload: Result<Form<Value>, FormRejection>,
) -> Result<Response, ApiError>
where
    E: FormLayout,
    SqliteGateway: Gateway<E>,
{
    let fields = form_fields::<E>(payload)?;
    let mut controller = Controller::<E>::new(&state.gateway);
    controller.open_create();
    submit(state, controller, fields).await
}

async fn edit_form<E>(state: &AppState, raw_id: String) -> Result<Response, ApiError>
where
    E: FormLayout,
    SqliteGateway: Gateway<E>,
{
    let id = parse_id(&raw_id)?;
    let mut controller = Controller::<E>::new(&state.gateway);
    let record = find_record(&mut controller, id).await?;
    actions_view::<E>().edit(&record);
    controller.open_edit(record);
    form_page(state, &controller, StatusCode::OK).await
}

async fn update_from_form<E>(
    state: &AppState,
    raw_id: String,
    payload: Result<Form<Value>, FormRejection>,
) -> Result<Response, ApiError>
where
    E: FormLayout,
    SqliteGateway: Gateway<E>,
{
    let id = parse_id(&raw_id)?;
    let fields = form_fields::<E>(payload)?;
    let mut controller = Controller::<E>::new(&state.gateway);
    let record = find_record(&mut controller, id).await?;
    controller.open_edit(record);
    submit(state, controller, fields).await
}

async fn delete_page<E>(state: &AppState, raw_id: String) -> Result<Response, ApiError>
where
    E: FormLayout,
    SqliteGateway: Gateway<E>,
{
    let id = parse_id(&raw_id)?;
    let mut controller = Controller::<E>::new(&state.gateway);
    let record = find_record(&mut controller, id).await?;

    let view = actions_view::<E>();
    view.delete(&record);
    let rendered = view
        .render(std::slice::from_ref(&record))
        .map_err(|e| ApiError::failed("render", E::RESOURCE, e))?;

    let heading = format!("Delete {}", E::LABEL);
    let mut body = format!(
        "<h1>{heading}</h1>\n<p>Are you sure you want to delete this {}?</p>\n<ul>\n",
        E::LABEL.to_lowercase()
    );
    for row in &rendered.rows {
        for (header, cell) in rendered.headers.iter().zip(row) {
            body.push_str(&format!(
                "<li>{}: {}</li>\n",
                escape_html(header),
                escape_html(cell)
            ));
        }
    }
    body.push_str(&format!(
        "</ul>\n<form method=\"post\" action=\"/ui/{}/{}/delete\">\n\
         <input type=\"hidden\" name=\"confirm\" value=\"yes\">\n\
         <p><button type=\"submit\">Delete</button> <a href=\"{}\">Cancel</a></p>\n</form>\n",
        E::RESOURCE,
        id,
        table_url::<E>()
    ));

    Ok(Html(page(&heading, &body)).into_response())
}

async fn delete_from_form<E>(
    state: &AppState,
    raw_id: String,
    payload: Result<Form<DeleteConfirmation>, FormRejection>,
) -> Result<Response, ApiError>
where
    E: FormLayout,
    SqliteGateway: Gateway<E>,
{
    let id = parse_id(&raw_id)?;
    let confirmation = posted(payload)?;
    let mut controller = Controller::<E>::new(&state.gateway);
    let record = find_record(&mut controller, id).await?;

    let outcome = controller
        .delete(&record, |_| confirmation.confirmed())
        .await
        .map_err(|e| ApiError::failed("delete", E::RESOURCE, e))?;
    match outcome {
        DeleteOutcome::Declined => debug!("Delete of {} {} not confirmed", E::LABEL, id),
        DeleteOutcome::Deleted { reloaded } => {
            info!("Deleted {} {} from form", E::LABEL, id);
            debug!("{} list reloaded after delete: {}", E::RESOURCE, reloaded);
        }
    }
    Ok(redirect_to_table::<E>())
}

/// Decode a urlencoded body into `E`'s form
///
/// The body is read as a loose map first because the entity is only known
/// after the path is matched.
fn form_fields<E: Entity>(payload: Result<Form<Value>, FormRejection>) -> Result<E::Form, ApiError> {
    let value = posted(payload)?;
    serde_json::from_value(value).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// GET /ui/:entity/new
pub async fn serve_new(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Response, ApiError> {
    by_entity!(entity, new_form(&state))
}

/// POST /ui/:entity/new
pub async fn submit_new(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    payload: Result<Form<Value>, FormRejection>,
) -> Result<Response, ApiError> {
    by_entity!(entity, create_from_form(&state, payload))
}

/// GET /ui/:entity/:id/edit
pub async fn serve_edit(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    by_entity!(entity, edit_form(&state, id))
}

/// POST /ui/:entity/:id/edit
pub async fn submit_edit(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    payload: Result<Form<Value>, FormRejection>,
) -> Result<Response, ApiError> {
    by_entity!(entity, update_from_form(&state, id, payload))
}

/// GET /ui/:entity/:id/delete
pub async fn serve_delete(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    by_entity!(entity, delete_page(&state, id))
}

/// POST /ui/:entity/:id/delete
pub async fn submit_delete(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    payload: Result<Form<DeleteConfirmation>, FormRejection>,
) -> Result<Response, ApiError> {
    by_entity!(entity, delete_from_form(&state, id, payload))
}
