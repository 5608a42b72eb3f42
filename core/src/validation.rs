//! Field validation for the user form.
//!
//! Every rule is a pure function of one field's current text; there are no
//! cross-field rules. The first failing rule of a field is the one reported,
//! so a `ValidationErrors` set holds at most one message per field.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::NewUser;

/// Minimum trimmed length of a name.
pub const NAME_MIN_CHARS: usize = 2;
/// Maximum trimmed length of a city.
pub const CITY_MAX_CHARS: usize = 50;
/// Inclusive lower bound for an age.
pub const AGE_MIN: i64 = 1;
/// Inclusive upper bound for an age.
pub const AGE_MAX: i64 = 120;

/// A form field identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Age,
    City,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Age, Field::City];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Age => "age",
            Field::City => "city",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, Field::City)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Field::Name),
            "email" => Ok(Field::Email),
            "age" => Ok(Field::Age),
            "city" => Ok(Field::City),
            _ => Err(UnknownField(s.to_string())),
        }
    }
}

/// A violated rule. The `Display` text is the user-facing message.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(Field),
    #[error("name must not be purely numeric")]
    NameNumeric,
    #[error("name must be at least {} characters", NAME_MIN_CHARS)]
    NameTooShort,
    #[error("email format is invalid")]
    EmailFormat,
    #[error("age must be a whole number")]
    AgeNotInteger,
    #[error("age must be between {} and {}", AGE_MIN, AGE_MAX)]
    AgeOutOfRange,
    #[error("city must be at most {} characters", CITY_MAX_CHARS)]
    CityTooLong,
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
}

pub fn validate_name(value: &str) -> Result<(), FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required(Field::Name));
    }
    // Checked before length so a lone digit reports the numeric rule.
    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::NameNumeric);
    }
    if trimmed.chars().count() < NAME_MIN_CHARS {
        return Err(FieldError::NameTooShort);
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required(Field::Email));
    }
    if !email_regex().is_match(trimmed) {
        return Err(FieldError::EmailFormat);
    }
    Ok(())
}

/// Parse and range-check an age, returning the parsed value.
pub fn parse_age(value: &str) -> Result<i64, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required(Field::Age));
    }
    let digits = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::AgeNotInteger);
    }
    // Well-formed but overflowing integers are simply out of range.
    let age = trimmed.parse::<i64>().map_err(|_| FieldError::AgeOutOfRange)?;
    check_age(age)?;
    Ok(age)
}

pub fn check_age(age: i64) -> Result<(), FieldError> {
    if (AGE_MIN..=AGE_MAX).contains(&age) {
        Ok(())
    } else {
        Err(FieldError::AgeOutOfRange)
    }
}

pub fn validate_age(value: &str) -> Result<(), FieldError> {
    parse_age(value).map(|_| ())
}

pub fn validate_city(value: &str) -> Result<(), FieldError> {
    if value.trim().chars().count() > CITY_MAX_CHARS {
        return Err(FieldError::CityTooLong);
    }
    Ok(())
}

/// Validate a single field's current text.
pub fn validate_field(field: Field, value: &str) -> Result<(), FieldError> {
    match field {
        Field::Name => validate_name(value),
        Field::Email => validate_email(value),
        Field::Age => validate_age(value),
        Field::City => validate_city(value),
    }
}

/// Raw text of the four form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub age: String,
    pub city: String,
}

impl UserForm {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Age => &self.age,
            Field::City => &self.city,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Age => self.age = value,
            Field::City => self.city = value,
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        validate_form(self)
    }

    /// Validate and produce the cleaned create payload.
    pub fn to_new_user(&self) -> Result<NewUser, ValidationErrors> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let age = parse_age(&self.age).map_err(|e| ValidationErrors::single(Field::Age, e))?;
        let city = self.city.trim();
        Ok(NewUser {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            age,
            city: (!city.is_empty()).then(|| city.to_string()),
        })
    }
}

impl From<&NewUser> for UserForm {
    fn from(user: &NewUser) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age.to_string(),
            city: user.city.clone().unwrap_or_default(),
        }
    }
}

/// Per-field violations from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: Field, error: FieldError) -> Self {
        let mut errors = Self::new();
        errors.insert(field, error);
        errors
    }

    pub fn insert(&mut self, field: Field, error: FieldError) {
        self.errors.insert(field, error);
    }

    pub fn remove(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.errors.iter().map(|(field, err)| (*field, err))
    }

    /// Every violation, comma-joined in field order.
    pub fn message(&self) -> String {
        self.errors
            .values()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Validate every field of a form. Valid iff the returned set is empty.
pub fn validate_form(form: &UserForm) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for field in Field::ALL {
        if let Err(err) = validate_field(field, form.get(field)) {
            errors.insert(field, err);
        }
    }
    errors
}

/// Re-apply the form rules to an already-typed payload.
pub fn validate_new_user(user: &NewUser) -> ValidationErrors {
    validate_form(&UserForm::from(user))
}
