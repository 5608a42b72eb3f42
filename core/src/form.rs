//! Interactive form state: values, touched fields and live errors.
//!
//! A field is validated on blur, and after that on every change. Submitting
//! touches everything and validates the whole form in one pass.

use std::collections::BTreeSet;

use crate::types::NewUser;
use crate::validation::{validate_field, Field, UserForm, ValidationErrors};

/// What a front-end should show next to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    /// Not touched yet; show nothing.
    Pending,
    /// Touched and failing; show the message.
    Invalid(String),
    /// Touched, passing and non-blank.
    Valid,
    /// Touched, passing, but blank (only reachable for optional fields).
    Empty,
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: UserForm,
    touched: BTreeSet<Field>,
    errors: ValidationErrors,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &UserForm {
        &self.values
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }

    /// Record a new value. Only touched fields are re-validated.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.set(field, value);
        if self.is_touched(field) {
            self.revalidate(field);
        }
    }

    /// Mark a field touched and validate it. Returns whether it passed.
    pub fn blur(&mut self, field: Field) -> bool {
        self.touched.insert(field);
        self.revalidate(field)
    }

    /// Touch and validate everything. On success the form is reset and the
    /// cleaned payload returned; on failure values are kept.
    pub fn submit(&mut self) -> Result<NewUser, ValidationErrors> {
        self.touched.extend(Field::ALL);
        match self.values.to_new_user() {
            Ok(user) => {
                self.reset();
                Ok(user)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    /// True when no field has an error and every required field has text.
    pub fn can_submit(&self) -> bool {
        self.errors.is_empty()
            && Field::ALL
                .iter()
                .filter(|f| f.is_required())
                .all(|f| !self.values.get(*f).trim().is_empty())
    }

    pub fn status(&self, field: Field) -> FieldStatus {
        if !self.is_touched(field) {
            return FieldStatus::Pending;
        }
        if let Some(err) = self.errors.get(field) {
            return FieldStatus::Invalid(err.to_string());
        }
        if self.values.get(field).trim().is_empty() {
            FieldStatus::Empty
        } else {
            FieldStatus::Valid
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn revalidate(&mut self, field: Field) -> bool {
        match validate_field(field, self.values.get(field)) {
            Ok(()) => {
                self.errors.remove(field);
                true
            }
            Err(err) => {
                self.errors.insert(field, err);
                false
            }
        }
    }
}
