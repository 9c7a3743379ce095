//! Generic table view
//!
//! A [`TableView`] renders any serializable record list through an ordered
//! list of columns. Columns read either a named field of the record's
//! serialized form or a derived value computed from the record. The
//! rendered output is what the exports serialize, so CSV and PDF always
//! match what is displayed.

use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

/// Header of the action column added when edit or delete is available
pub const ACTIONS_HEADER: &str = "Actions";

type Derive<T> = Box<dyn Fn(&T) -> String + Send + Sync>;
type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// How a column obtains its cell text
pub enum Accessor<T> {
    /// Top-level key of the record's serialized form
    Field(&'static str),
    /// Display text computed from the record
    Derived(Derive<T>),
}

/// One table column: header label plus accessor
pub struct Column<T> {
    header: String,
    accessor: Accessor<T>,
}

impl<T> Column<T> {
    pub fn field(header: impl Into<String>, key: &'static str) -> Self {
        Self {
            header: header.into(),
            accessor: Accessor::Field(key),
        }
    }

    pub fn derived<F>(header: impl Into<String>, derive: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            header: header.into(),
            accessor: Accessor::Derived(Box::new(derive)),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn accessor(&self) -> &Accessor<T> {
        &self.accessor
    }

    fn cell(&self, record: &T, serialized: Option<&Value>) -> String {
        match &self.accessor {
            Accessor::Field(key) => serialized
                .and_then(|v| v.get(*key))
                .map(display_value)
                .unwrap_or_default(),
            Accessor::Derived(derive) => derive(record),
        }
    }
}

/// Display text of one serialized field
///
/// Strings as-is, numbers in decimal, null as empty text.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Per-row action offered by the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAction {
    Edit,
    Delete,
}

/// Rendered table: exactly the text a reader sees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTable {
    pub title: String,
    pub headers: Vec<String>,
    /// One row per record in list order, one cell per column
    pub rows: Vec<Vec<String>>,
    /// Actions offered on every row; empty when the view has no callbacks
    pub actions: Vec<RowAction>,
}

impl RenderedTable {
    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// Table view over records of type `T`
pub struct TableView<T> {
    title: String,
    columns: Vec<Column<T>>,
    on_edit: Option<Callback<T>>,
    on_delete: Option<Callback<T>>,
}

impl<T: Serialize> TableView<T> {
    pub fn new(title: impl Into<String>, columns: Vec<Column<T>>) -> Self {
        Self {
            title: title.into(),
            columns,
            on_edit: None,
            on_delete: None,
        }
    }

    /// Offer an edit action on every row
    pub fn on_edit<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_edit = Some(Box::new(callback));
        self
    }

    /// Offer a delete action on every row
    pub fn on_delete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_delete = Some(Box::new(callback));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.clone()).collect()
    }

    pub fn actions(&self) -> Vec<RowAction> {
        let mut actions = Vec::new();
        if self.on_edit.is_some() {
            actions.push(RowAction::Edit);
        }
        if self.on_delete.is_some() {
            actions.push(RowAction::Delete);
        }
        actions
    }

    /// Render `records` in list order
    pub fn render(&self, records: &[T]) -> Result<RenderedTable> {
        let needs_fields = self
            .columns
            .iter()
            .any(|c| matches!(c.accessor, Accessor::Field(_)));

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let serialized = if needs_fields {
                Some(serde_json::to_value(record).map_err(|e| {
                    Error::Internal(format!("Failed to serialize {} row: {}", self.title, e))
                })?)
            } else {
                None
            };

            rows.push(
                self.columns
                    .iter()
                    .map(|c| c.cell(record, serialized.as_ref()))
                    .collect(),
            );
        }

        Ok(RenderedTable {
            title: self.title.clone(),
            headers: self.headers(),
            rows,
            actions: self.actions(),
        })
    }

    /// Trigger the edit callback; returns false when none is supplied
    pub fn edit(&self, record: &T) -> bool {
        match &self.on_edit {
            Some(callback) => {
                callback(record);
                true
            }
            None => false,
        }
    }

    /// Trigger the delete callback; returns false when none is supplied
    pub fn delete(&self, record: &T) -> bool {
        match &self.on_delete {
            Some(callback) => {
                callback(record);
                true
            }
            None => false,
        }
    }
}
