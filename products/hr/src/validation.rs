//! Per-field form rules and the error board the forms render from.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DEPARTMENTS, EmployeeDraft, EmployeeFields};

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

pub const DEFAULT_NAME_MIN_LEN: usize = 2;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("This field is required.")]
    Required,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Must be at least {min} characters.")]
    TooShort { min: usize },
    #[error("Please select a valid option.")]
    NotAnOption,
}

/// Which form a field belongs to. The create and edit forms keep separate
/// error state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Create,
    Edit,
}

#[derive(Clone, Debug)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub email: bool,
    pub min_len: Option<usize>,
    pub choices: Option<&'static [&'static str]>,
}

impl FieldRule {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            required: false,
            email: false,
            min_len: None,
            choices: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn email(mut self) -> Self {
        self.email = true;
        self
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    pub fn one_of(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Checks run in order and the first failure wins.
    pub fn check(&self, raw: &str) -> Result<(), FieldError> {
        let value = raw.trim();
        if self.required && value.is_empty() {
            return Err(FieldError::Required);
        }
        if self.email && !EMAIL_SHAPE.is_match(value) {
            return Err(FieldError::InvalidEmail);
        }
        if let Some(min) = self.min_len {
            if value.chars().count() < min {
                return Err(FieldError::TooShort { min });
            }
        }
        if let Some(choices) = self.choices {
            if !choices.contains(&value) {
                return Err(FieldError::NotAnOption);
            }
        }
        Ok(())
    }
}

/// Failing fields of one submission, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, FieldError>,
}

impl ValidationErrors {
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.fields.iter().map(|(field, err)| (field.as_str(), err))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.fields.keys().map(String::as_str).collect::<Vec<_>>();
        write!(f, "invalid fields: {}", names.join(", "))
    }
}

#[derive(Clone, Debug)]
pub struct FormSchema {
    rules: Vec<FieldRule>,
}

impl Default for FormSchema {
    fn default() -> Self {
        Self::employee(DEFAULT_NAME_MIN_LEN)
    }
}

impl FormSchema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// The add/edit employee form.
    pub fn employee(name_min_len: usize) -> Self {
        Self::new(vec![
            FieldRule::new("name").required().min_len(name_min_len),
            FieldRule::new("email").required().email(),
            FieldRule::new("department").required().one_of(DEPARTMENTS),
        ])
    }

    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|rule| rule.field == field)
    }

    /// Unknown fields carry no rule and always pass.
    pub fn check_field(&self, field: &str, raw: &str) -> Result<(), FieldError> {
        match self.rule(field) {
            Some(rule) => rule.check(raw),
            None => Ok(()),
        }
    }

    /// Full-form submission: every rule runs so every failing field is
    /// reported at once.
    pub fn validate(&self, draft: &EmployeeDraft) -> Result<EmployeeFields, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for rule in &self.rules {
            let raw = draft.field(rule.field).unwrap_or_default();
            if let Err(err) = rule.check(raw) {
                errors.fields.insert(rule.field.to_string(), err);
            }
        }
        if errors.is_empty() {
            Ok(EmployeeFields::normalized(draft))
        } else {
            Err(errors)
        }
    }
}

/// Latest error per form field. An entry disappears as soon as its field
/// validates.
#[derive(Clone, Debug, Default)]
pub struct FieldErrorBoard {
    entries: BTreeMap<(FormKind, String), FieldError>,
}

impl FieldErrorBoard {
    pub fn record(&mut self, form: FormKind, field: &str, outcome: Result<(), FieldError>) {
        let key = (form, field.to_string());
        match outcome {
            Ok(()) => {
                self.entries.remove(&key);
            }
            Err(err) => {
                self.entries.insert(key, err);
            }
        }
    }

    /// Replace a form's errors with the outcome of a full submission.
    pub fn replace(&mut self, form: FormKind, errors: &ValidationErrors) {
        self.clear(form);
        for (field, err) in errors.iter() {
            self.entries.insert((form, field.to_string()), err.clone());
        }
    }

    pub fn clear(&mut self, form: FormKind) {
        self.entries.retain(|(kind, _), _| *kind != form);
    }

    pub fn get(&self, form: FormKind, field: &str) -> Option<&FieldError> {
        self.entries.get(&(form, field.to_string()))
    }

    pub fn for_form(&self, form: FormKind) -> Vec<(&str, &FieldError)> {
        self.entries
            .iter()
            .filter(|((kind, _), _)| *kind == form)
            .map(|((_, field), err)| (field.as_str(), err))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str, department: &str) -> EmployeeDraft {
        EmployeeDraft {
            name: name.into(),
            email: email.into(),
            department: department.into(),
            skills: vec!["SQL".into()],
            certified: false,
        }
    }

    #[test]
    fn required_wins_over_other_checks() {
        let rule = FieldRule::new("email").required().email();
        assert_eq!(rule.check("   "), Err(FieldError::Required));
        assert_eq!(rule.check("nobody"), Err(FieldError::InvalidEmail));
        assert_eq!(rule.check(" dana@technova.com "), Ok(()));
    }

    #[test]
    fn email_shape_needs_at_and_dot() {
        let rule = FieldRule::new("email").email();
        assert!(rule.check("a@b.c").is_ok());
        assert!(rule.check("a@b").is_err());
        assert!(rule.check("@b.c").is_err());
        assert!(rule.check("a@.c").is_err());
    }

    #[test]
    fn min_len_counts_trimmed_characters() {
        let rule = FieldRule::new("name").required().min_len(3);
        assert_eq!(rule.check(" ab "), Err(FieldError::TooShort { min: 3 }));
        assert_eq!(
            FieldError::TooShort { min: 3 }.to_string(),
            "Must be at least 3 characters."
        );
        assert!(rule.check("Åsa").is_ok());
    }

    #[test]
    fn department_must_be_a_known_option() {
        let schema = FormSchema::default();
        assert_eq!(
            schema.check_field("department", "Legal"),
            Err(FieldError::NotAnOption)
        );
        assert!(schema.check_field("department", "Sales").is_ok());
        assert!(schema.check_field("nickname", "").is_ok());
    }

    #[test]
    fn validate_reports_every_failing_field() {
        let schema = FormSchema::default();
        let errors = schema.validate(&draft("", "nope", "HR")).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name"), Some(&FieldError::Required));
        assert_eq!(errors.get("email"), Some(&FieldError::InvalidEmail));
        assert_eq!(errors.to_string(), "invalid fields: email, name");
    }

    #[test]
    fn validate_returns_trimmed_fields() {
        let fields = FormSchema::default()
            .validate(&draft(" Dana ", "dana@technova.com ", "HR"))
            .unwrap();
        assert_eq!(fields.name, "Dana");
        assert_eq!(fields.email, "dana@technova.com");
    }

    #[test]
    fn board_clears_fields_once_valid() {
        let mut board = FieldErrorBoard::default();
        board.record(FormKind::Create, "name", Err(FieldError::Required));
        board.record(FormKind::Edit, "name", Err(FieldError::Required));
        assert_eq!(board.for_form(FormKind::Create).len(), 1);

        board.record(FormKind::Create, "name", Ok(()));
        assert!(board.get(FormKind::Create, "name").is_none());
        assert_eq!(
            board.get(FormKind::Edit, "name"),
            Some(&FieldError::Required)
        );

        board.clear(FormKind::Edit);
        assert!(board.is_empty());
    }
}
