//! HR vertical slice: the employee roster.
//!
//! [`RecordStore`] owns the authoritative list and keeps it persisted under a
//! single namespaced key. [`query`] derives the filtered view and the summary
//! statistics, [`Roster`] turns user intents into validated store mutations,
//! and [`export`] renders the CSV report.

pub mod error;
pub mod export;
pub mod model;
pub mod notify;
pub mod query;
pub mod roster;
pub mod store;
pub mod validation;

pub use error::{RosterError, RosterResult, StoreError};
pub use export::{EXPORT_CONTENT_TYPE, EXPORT_FILE_NAME, export_csv, export_table};
pub use model::{
    DEPARTMENTS, Employee, EmployeeDraft, EmployeeFields, EmployeeId, SKILLS, seed_employees,
};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use query::{CategoryFilter, RosterStats};
pub use roster::{Confirm, DELETE_PROMPT, DeleteOutcome, EditForm, Roster, RosterSettings};
pub use store::{DEFAULT_STORAGE_KEY, LoadOutcome, RecordStore};
pub use validation::{
    FieldError, FieldErrorBoard, FieldRule, FormKind, FormSchema, ValidationErrors,
};
