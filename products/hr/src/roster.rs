//! User intents against the roster: add, two-phase edit, confirmed delete,
//! filter and search changes.

use std::time::Duration;

use platform_db::KeyValueStore;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    error::{RosterError, RosterResult, StoreError},
    export,
    model::{Employee, EmployeeDraft, EmployeeId, SKILLS},
    notify::{DEFAULT_DISMISS_AFTER, Notification, Notifier},
    query::{self, CategoryFilter, RosterStats},
    store::{DEFAULT_STORAGE_KEY, LoadOutcome, RecordStore},
    validation::{DEFAULT_NAME_MIN_LEN, FieldError, FieldErrorBoard, FormKind, FormSchema},
};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this employee?";

const MSG_INVALID_FORM: &str = "Please correct the errors in the form.";
const MSG_ADDED: &str = "Employee added successfully!";
const MSG_UPDATED: &str = "Employee details updated!";
const MSG_DELETED: &str = "Employee deleted.";
const MSG_SAVE_FAILED: &str = "Could not save changes. Please try again.";

/// Yes/no gate in front of destructive commands.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Employee),
    Declined,
    NotFound,
}

#[derive(Clone, Debug)]
pub struct RosterSettings {
    pub storage_key: String,
    pub dismiss_after: Duration,
    pub name_min_len: usize,
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            dismiss_after: DEFAULT_DISMISS_AFTER,
            name_min_len: DEFAULT_NAME_MIN_LEN,
        }
    }
}

/// Transient edit-form state for the record being edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EditForm {
    pub id: EmployeeId,
    pub draft: EmployeeDraft,
}

impl EditForm {
    fn open(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            draft: EmployeeDraft::from(employee),
        }
    }

    /// Checkbox state for each offered skill.
    pub fn skill_options(&self) -> Vec<(&'static str, bool)> {
        SKILLS
            .iter()
            .map(|skill| (*skill, self.draft.skills.iter().any(|s| s == skill)))
            .collect()
    }
}

pub struct Roster<S> {
    store: RecordStore<S>,
    schema: FormSchema,
    filter: CategoryFilter,
    search: String,
    editing: Option<EditForm>,
    errors: FieldErrorBoard,
    notifier: Notifier,
}

impl<S: KeyValueStore> Roster<S> {
    pub async fn open(
        storage: S,
        settings: RosterSettings,
    ) -> Result<(Self, LoadOutcome), StoreError> {
        let (store, outcome) = RecordStore::open(storage, settings.storage_key.clone()).await?;
        Ok((Self::with_store(store, &settings), outcome))
    }

    pub fn with_store(store: RecordStore<S>, settings: &RosterSettings) -> Self {
        Self {
            store,
            schema: FormSchema::employee(settings.name_min_len),
            filter: CategoryFilter::default(),
            search: String::new(),
            editing: None,
            errors: FieldErrorBoard::default(),
            notifier: Notifier::new(settings.dismiss_after),
        }
    }

    /// Current filtered and searched view, in list order.
    pub fn view(&self) -> Vec<Employee> {
        let view: Vec<Employee> = query::apply(self.store.snapshot(), &self.filter, &self.search)
            .into_iter()
            .cloned()
            .collect();
        debug!(filter = %self.filter, shown = view.len(), "view recomputed");
        view
    }

    pub fn stats(&self) -> RosterStats {
        RosterStats::compute(self.store.snapshot())
    }

    pub fn employees(&self) -> &[Employee] {
        self.store.snapshot()
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn editing(&self) -> Option<&EditForm> {
        self.editing.as_ref()
    }

    pub fn field_errors(&self) -> &FieldErrorBoard {
        &self.errors
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notifier.current()
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    /// CSV over the full list, ignoring the current view.
    pub fn export_csv(&self) -> String {
        export::export_csv(self.store.snapshot())
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) -> Vec<Employee> {
        self.filter = filter;
        self.view()
    }

    pub fn set_search(&mut self, term: impl Into<String>) -> Vec<Employee> {
        self.search = term.into();
        self.view()
    }

    /// Loss-of-focus validation of a single field.
    pub fn blur(&mut self, form: FormKind, field: &str, value: &str) -> Option<FieldError> {
        let outcome = self.schema.check_field(field, value);
        let err = outcome.as_ref().err().cloned();
        self.errors.record(form, field, outcome);
        err
    }

    pub async fn add(&mut self, draft: &EmployeeDraft) -> RosterResult<Employee> {
        let fields = match self.schema.validate(draft) {
            Ok(fields) => fields,
            Err(errors) => {
                self.errors.replace(FormKind::Create, &errors);
                self.notifier.error(MSG_INVALID_FORM);
                return Err(RosterError::Validation(errors));
            }
        };
        let employee = self.store.add(fields).await.inspect_err(|_| {
            self.notifier.error(MSG_SAVE_FAILED);
        })?;
        self.errors.clear(FormKind::Create);
        self.notifier.success(MSG_ADDED);
        Ok(employee)
    }

    pub async fn delete(
        &mut self,
        id: EmployeeId,
        confirm: &impl Confirm,
    ) -> RosterResult<DeleteOutcome> {
        if !confirm.confirm(DELETE_PROMPT) {
            debug!(id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }
        let removed = self.store.delete(id).await.inspect_err(|_| {
            self.notifier.error(MSG_SAVE_FAILED);
        })?;
        let Some(employee) = removed else {
            return Ok(DeleteOutcome::NotFound);
        };
        if self.editing.as_ref().is_some_and(|form| form.id == id) {
            self.close_edit();
        }
        self.notifier.error(MSG_DELETED);
        Ok(DeleteOutcome::Deleted(employee))
    }

    /// Phase one of an edit: load the record into the edit form.
    pub fn open_edit(&mut self, id: EmployeeId) -> Option<&EditForm> {
        let Some(employee) = self.store.get(id) else {
            warn!(id, "edit requested for unknown employee");
            return None;
        };
        self.editing = Some(EditForm::open(employee));
        self.errors.clear(FormKind::Edit);
        self.editing.as_ref()
    }

    /// Phase two: validate and write the edit form back. `Ok(None)` when the
    /// record disappeared while the form was open.
    pub async fn submit_edit(&mut self, draft: &EmployeeDraft) -> RosterResult<Option<Employee>> {
        let Some(id) = self.editing.as_ref().map(|form| form.id) else {
            return Err(RosterError::NotEditing);
        };
        let fields = match self.schema.validate(draft) {
            Ok(fields) => fields,
            Err(errors) => {
                self.errors.replace(FormKind::Edit, &errors);
                self.notifier.error(MSG_INVALID_FORM);
                return Err(RosterError::Validation(errors));
            }
        };
        let updated = self.store.update(id, fields).await.inspect_err(|_| {
            self.notifier.error(MSG_SAVE_FAILED);
        })?;
        self.close_edit();
        if updated.is_some() {
            self.notifier.success(MSG_UPDATED);
        }
        Ok(updated)
    }

    pub fn cancel_edit(&mut self) {
        self.close_edit();
    }

    pub async fn reset_to_seed(&mut self) -> RosterResult<()> {
        self.close_edit();
        self.store.reset_to_seed().await?;
        Ok(())
    }

    fn close_edit(&mut self) {
        self.editing = None;
        self.errors.clear(FormKind::Edit);
    }
}
