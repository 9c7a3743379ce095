//! Entity form controller
//!
//! Drives the create/edit workflow for one entity type: holds the listed
//! records, an open or closed form, and the field errors of the last
//! submit. Persistence goes through any [`Gateway`] so the workflow can be
//! exercised without a database.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateway::Gateway;
use crate::model::Entity;
use crate::schema::{FormSchema, ValidationErrors};
use crate::Result;

/// What an open form will do on submit
#[derive(Debug, Clone, PartialEq)]
pub enum FormMode<E> {
    Create,
    /// Update of this record
    Edit(E),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormState<E: Entity> {
    Closed,
    Open {
        mode: FormMode<E>,
        form: E::Form,
        /// Field errors of the last rejected submit
        errors: ValidationErrors,
        /// Persistence failure of the last submit
        failure: Option<String>,
    },
}

/// Result of [`FormController::submit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Record persisted and form closed; `reloaded` is false when the
    /// follow-up listing failed and `records()` still holds the old list
    Saved { id: Uuid, reloaded: bool },
    /// Validation failed; form stays open with field errors
    Invalid,
    /// Gateway call failed; form stays open with the failure
    Failed,
    /// No form was open
    NotOpen,
}

/// Result of [`FormController::delete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Confirmation declined; nothing was deleted
    Declined,
    /// Record deleted; `reloaded` as in [`SubmitOutcome::Saved`]
    Deleted { reloaded: bool },
}

pub struct FormController<'g, E: Entity, G: Gateway<E>> {
    gateway: &'g G,
    records: Vec<E>,
    state: FormState<E>,
}

impl<'g, E: Entity, G: Gateway<E>> FormController<'g, E, G> {
    pub fn new(gateway: &'g G) -> Self {
        Self {
            gateway,
            records: Vec::new(),
            state: FormState::Closed,
        }
    }

    pub fn records(&self) -> &[E] {
        &self.records
    }

    pub fn state(&self) -> &FormState<E> {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, FormState::Open { .. })
    }

    /// Editable form fields while open
    pub fn form_mut(&mut self) -> Option<&mut E::Form> {
        match &mut self.state {
            FormState::Open { form, .. } => Some(form),
            FormState::Closed => None,
        }
    }

    /// Field errors of the last rejected submit (empty when closed)
    pub fn errors(&self) -> Option<&ValidationErrors> {
        match &self.state {
            FormState::Open { errors, .. } => Some(errors),
            FormState::Closed => None,
        }
    }

    /// Replace the record list with a fresh gateway listing
    ///
    /// On failure the previous list is kept.
    pub async fn load(&mut self) -> Result<()> {
        match self.gateway.list().await {
            Ok(records) => {
                debug!("Loaded {} {}", records.len(), E::RESOURCE);
                self.records = records;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load {}: {}", E::RESOURCE, e);
                Err(e)
            }
        }
    }

    pub fn open_create(&mut self) {
        self.state = FormState::Open {
            mode: FormMode::Create,
            form: E::Form::default(),
            errors: ValidationErrors::new(),
            failure: None,
        };
    }

    pub fn open_edit(&mut self, record: E) {
        self.state = FormState::Open {
            form: E::Form::from_record(&record),
            mode: FormMode::Edit(record),
            errors: ValidationErrors::new(),
            failure: None,
        };
    }

    /// Cancel: discard the form and its errors
    pub fn close(&mut self) {
        self.state = FormState::Closed;
    }

    /// Validate and persist the open form
    pub async fn submit(&mut self) -> SubmitOutcome {
        let gateway = self.gateway;

        let result = {
            let FormState::Open {
                mode,
                form,
                errors,
                failure,
            } = &mut self.state
            else {
                return SubmitOutcome::NotOpen;
            };

            let fields = match form.validate() {
                Ok(fields) => fields,
                Err(invalid) => {
                    debug!("{} form rejected: {}", E::LABEL, invalid);
                    *errors = invalid;
                    *failure = None;
                    return SubmitOutcome::Invalid;
                }
            };
            *errors = ValidationErrors::new();

            match mode {
                FormMode::Create => gateway.create(&fields).await,
                FormMode::Edit(record) => {
                    let id = record.id();
                    gateway.update(id, &fields).await.map(|_| id)
                }
            }
        };

        match result {
            Ok(id) => {
                self.state = FormState::Closed;
                let reloaded = self.load().await.is_ok();
                SubmitOutcome::Saved { id, reloaded }
            }
            Err(e) => {
                warn!("Failed to save {}: {}", E::LABEL, e);
                if let FormState::Open { failure, .. } = &mut self.state {
                    *failure = Some(e.to_string());
                }
                SubmitOutcome::Failed
            }
        }
    }

    /// Delete `record` after `confirm` approves it
    ///
    /// Independent of the form state. A failed delete is returned as the
    /// error; a failed reload after a successful delete is not.
    pub async fn delete<F>(&mut self, record: &E, confirm: F) -> Result<DeleteOutcome>
    where
        F: FnOnce(&E) -> bool,
    {
        if !confirm(record) {
            return Ok(DeleteOutcome::Declined);
        }

        if let Err(e) = self.gateway.delete(record.id()).await {
            warn!("Failed to delete {} {}: {}", E::LABEL, record.id(), e);
            return Err(e);
        }

        let reloaded = self.load().await.is_ok();
        Ok(DeleteOutcome::Deleted { reloaded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Subject, SubjectFields};
    use crate::Error;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        List,
        Create(String),
        Update(Uuid, String),
        Delete(Uuid),
    }

    /// In-memory subject store that records every call
    #[derive(Default)]
    struct RecordingGateway {
        calls: Mutex<Vec<Call>>,
        subjects: Mutex<Vec<Subject>>,
        fail_writes: bool,
        fail_list: AtomicBool,
    }

    impl RecordingGateway {
        fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn write_calls(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|c| *c != Call::List)
                .collect()
        }

        fn check(&self) -> Result<()> {
            if self.fail_writes {
                Err(Error::Internal("disk full".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl Gateway<Subject> for RecordingGateway {
        async fn list(&self) -> Result<Vec<Subject>> {
            self.calls.lock().unwrap().push(Call::List);
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(Error::Internal("database locked".to_string()));
            }
            Ok(self.subjects.lock().unwrap().clone())
        }

        async fn create(&self, fields: &SubjectFields) -> Result<Uuid> {
            self.calls.lock().unwrap().push(Call::Create(fields.name.clone()));
            self.check()?;
            let now = Utc::now();
            let id = Uuid::new_v4();
            self.subjects.lock().unwrap().push(Subject {
                id,
                name: fields.name.clone(),
                created_at: now,
                updated_at: now,
            });
            Ok(id)
        }

        async fn update(&self, id: Uuid, fields: &SubjectFields) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(id, fields.name.clone()));
            self.check()?;
            for subject in self.subjects.lock().unwrap().iter_mut() {
                if subject.id == id {
                    subject.name = fields.name.clone();
                }
            }
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Delete(id));
            self.check()?;
            self.subjects.lock().unwrap().retain(|s| s.id != id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_short_name_never_reaches_gateway() {
        let gateway = RecordingGateway::default();
        let mut controller = FormController::new(&gateway);

        controller.open_create();
        controller.form_mut().unwrap().name = "M".to_string();

        assert_eq!(controller.submit().await, SubmitOutcome::Invalid);
        assert!(controller.is_open());
        assert_eq!(
            controller.errors().unwrap().get("name"),
            Some("Subject name must be at least 2 characters")
        );
        assert!(gateway.calls().is_empty(), "No persistence call expected");
    }

    #[tokio::test]
    async fn test_create_saves_reloads_and_closes() {
        let gateway = RecordingGateway::default();
        let mut controller = FormController::new(&gateway);

        controller.open_create();
        controller.form_mut().unwrap().name = "Physics".to_string();

        let outcome = controller.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Saved { reloaded: true, .. }));
        assert!(!controller.is_open());
        assert_eq!(gateway.calls(), vec![Call::Create("Physics".to_string()), Call::List]);
        assert_eq!(controller.records().len(), 1);
        assert_eq!(controller.records()[0].name, "Physics");
    }

    #[tokio::test]
    async fn test_edit_prefills_and_updates_by_id() {
        let gateway = RecordingGateway::default();
        let mut controller = FormController::new(&gateway);

        controller.open_create();
        controller.form_mut().unwrap().name = "Phisics".to_string();
        controller.submit().await;
        let record = controller.records()[0].clone();

        controller.open_edit(record.clone());
        assert_eq!(controller.form_mut().unwrap().name, "Phisics");
        controller.form_mut().unwrap().name = "Physics".to_string();

        assert_eq!(
            controller.submit().await,
            SubmitOutcome::Saved {
                id: record.id,
                reloaded: true
            }
        );
        assert!(gateway
            .write_calls()
            .contains(&Call::Update(record.id, "Physics".to_string())));
        assert_eq!(controller.records()[0].name, "Physics");
    }

    #[tokio::test]
    async fn test_failed_write_keeps_form_open() {
        let gateway = RecordingGateway::failing();
        let mut controller = FormController::new(&gateway);

        controller.open_create();
        controller.form_mut().unwrap().name = "Physics".to_string();

        assert_eq!(controller.submit().await, SubmitOutcome::Failed);
        assert!(controller.is_open());
        match controller.state() {
            FormState::Open { failure, form, .. } => {
                assert!(failure.as_deref().unwrap().contains("disk full"));
                assert_eq!(form.name, "Physics");
            }
            FormState::Closed => panic!("Form should stay open"),
        }
        // One attempt, no retry, no reload
        assert_eq!(gateway.calls(), vec![Call::Create("Physics".to_string())]);
    }

    #[tokio::test]
    async fn test_close_discards_form() {
        let gateway = RecordingGateway::default();
        let mut controller = FormController::new(&gateway);

        controller.open_create();
        controller.form_mut().unwrap().name = "X".to_string();
        controller.submit().await;
        controller.close();

        assert_eq!(controller.state(), &FormState::Closed);
        assert!(controller.form_mut().is_none());
        assert_eq!(controller.submit().await, SubmitOutcome::NotOpen);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let gateway = RecordingGateway::default();
        let mut controller = FormController::new(&gateway);

        controller.open_create();
        controller.form_mut().unwrap().name = "Chemistry".to_string();
        controller.submit().await;
        let record = controller.records()[0].clone();

        assert_eq!(
            controller.delete(&record, |_| false).await.unwrap(),
            DeleteOutcome::Declined
        );
        assert!(!gateway.write_calls().contains(&Call::Delete(record.id)));
        assert_eq!(controller.records().len(), 1);

        assert_eq!(
            controller.delete(&record, |_| true).await.unwrap(),
            DeleteOutcome::Deleted { reloaded: true }
        );
        assert!(gateway.write_calls().contains(&Call::Delete(record.id)));
        assert!(controller.records().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reload_after_save_is_reported() {
        let gateway = RecordingGateway::default();
        let mut controller = FormController::new(&gateway);

        controller.open_create();
        controller.form_mut().unwrap().name = "Biology".to_string();
        controller.submit().await;
        assert_eq!(controller.records().len(), 1);

        gateway.fail_list.store(true, Ordering::SeqCst);
        controller.open_create();
        controller.form_mut().unwrap().name = "Geology".to_string();

        let outcome = controller.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Saved { reloaded: false, .. }));
        assert!(!controller.is_open(), "Save stands even when reload fails");
        // Stale list kept
        assert_eq!(controller.records().len(), 1);
        assert_eq!(controller.records()[0].name, "Biology");
        assert_eq!(gateway.subjects.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_reload_after_delete_is_reported() {
        let gateway = RecordingGateway::default();
        let mut controller = FormController::new(&gateway);

        controller.open_create();
        controller.form_mut().unwrap().name = "Chemistry".to_string();
        controller.submit().await;
        let record = controller.records()[0].clone();

        gateway.fail_list.store(true, Ordering::SeqCst);
        assert_eq!(
            controller.delete(&record, |_| true).await.unwrap(),
            DeleteOutcome::Deleted { reloaded: false }
        );
        assert!(gateway.subjects.lock().unwrap().is_empty());
        assert_eq!(controller.records().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_is_an_error() {
        let gateway = RecordingGateway::failing();
        let mut controller = FormController::new(&gateway);
        let now = Utc::now();
        let record = Subject {
            id: Uuid::new_v4(),
            name: "Chemistry".to_string(),
            created_at: now,
            updated_at: now,
        };

        assert!(controller.delete(&record, |_| true).await.is_err());
        assert_eq!(gateway.calls(), vec![Call::Delete(record.id)]);
    }
}
